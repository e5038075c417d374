// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

pub mod cli;
pub mod control;
pub mod controller;
pub mod coordinator;
pub mod daemon;
pub mod detector;
pub mod env;
pub mod error;
pub mod process;
pub mod shutdown;
pub mod version;
pub mod xmlrpc;

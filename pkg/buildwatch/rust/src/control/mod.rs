// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Port to the remote process-control API.

mod supervisor;


pub use supervisor::SupervisorClient;

use crate::error::RemoteFault;
use crate::process::ProcessDescriptor;
use async_trait::async_trait;

/// Operations a restart needs from the process-control plane. Every call can
/// fail on its own; callers decide per process how to recover.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProcessControl: Send + Sync {
    async fn list_all_processes(&self) -> Result<Vec<ProcessDescriptor>, RemoteFault>;

    /// Request a stop. With `wait == false` this returns as soon as the request is accepted.
    async fn stop_process(&self, name: &str, wait: bool) -> Result<(), RemoteFault>;

    /// Request a start. With `wait == false` this returns as soon as the request is accepted.
    async fn start_process(&self, name: &str, wait: bool) -> Result<(), RemoteFault>;

    async fn get_process_info(&self, name: &str) -> Result<ProcessDescriptor, RemoteFault>;
}

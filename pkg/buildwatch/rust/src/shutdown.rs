// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::coordinator::RestartCoordinator;
use crate::detector::ChangeDetector;
use anyhow::{Context, Result};
use log::info;
use tokio::signal::unix::{Signal, SignalKind, signal};

/// SIGTERM/SIGINT listener. Register before doing any work so an early
/// signal is not lost.
pub struct TerminationSignals {
    sigterm: Signal,
    sigint: Signal,
}

impl TerminationSignals {
    pub fn register() -> Result<Self> {
        Ok(Self {
            sigterm: signal(SignalKind::terminate()).context("Failed to setup SIGTERM handler")?,
            sigint: signal(SignalKind::interrupt()).context("Failed to setup SIGINT handler")?,
        })
    }

    /// Wait for the next termination signal and return its name.
    pub async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.sigterm.recv() => "SIGTERM",
            _ = self.sigint.recv() => "SIGINT",
        }
    }
}

/// Stop watching, then let a restart already in progress finish.
pub async fn shutdown(detector: &mut ChangeDetector, coordinator: &RestartCoordinator) {
    detector.stop();
    coordinator.shutdown().await;
    info!("shutdown complete");
}

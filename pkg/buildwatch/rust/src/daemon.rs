// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::cli::Args;
use crate::control::{ProcessControl, SupervisorClient};
use crate::controller::{ControllerOptions, ProcessController};
use crate::coordinator::{DEFAULT_DEBOUNCE, RestartCoordinator};
use crate::detector::ChangeDetector;
use crate::env::SupervisorConfig;
use crate::shutdown::{self, TerminationSignals};
use crate::version::VersionGate;
use anyhow::{Context, Result};
use log::{debug, info};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Run until a termination signal. The restart target must already have been
/// validated against `args.is_enabled()`.
pub async fn run(args: Args, mut signals: TerminationSignals) -> Result<()> {
    if !args.is_enabled() {
        info!("restarts disabled, waiting for termination signal");
        let sig = signals.recv().await;
        info!("received {sig}");
        return Ok(());
    }

    let config = SupervisorConfig::from_env().context("invalid supervisor configuration")?;
    info!("using supervisord at {}", config.server_url);
    let control: Arc<dyn ProcessControl> = Arc::new(SupervisorClient::new(config));

    let target = args.restart_target();
    let gate = VersionGate::open(args.marker_path());
    let controller = ProcessController::new(
        control,
        gate,
        target.clone(),
        ControllerOptions {
            running_only: args.running_only,
            stop_timeout: args.stop_timeout(),
            ..ControllerOptions::default()
        },
    );
    let coordinator = RestartCoordinator::new(controller, DEFAULT_DEBOUNCE);

    let (mut detector, events) = ChangeDetector::new(&args.watch_dir, &args.marker);
    detector
        .start()
        .with_context(|| format!("failed to watch {}", args.watch_dir.display()))?;
    info!("restarting {target} when {} changes", args.marker);

    watch(&mut detector, events, &coordinator, async move {
        let sig = signals.recv().await;
        info!("received {sig}");
    })
    .await;
    Ok(())
}

/// Feed change notifications to the coordinator until `stop` resolves, then
/// shut down cleanly.
pub async fn watch<F>(
    detector: &mut ChangeDetector,
    mut events: mpsc::UnboundedReceiver<PathBuf>,
    coordinator: &RestartCoordinator,
    stop: F,
) where
    F: Future<Output = ()>,
{
    tokio::pin!(stop);
    loop {
        tokio::select! {
            _ = &mut stop => break,
            event = events.recv() => match event {
                Some(path) => {
                    debug!("change detected: {}", path.display());
                    // Handles are tracked by the coordinator, not awaited here.
                    let _ = coordinator.notify();
                }
                None => break,
            },
        }
    }
    shutdown::shutdown(detector, coordinator).await;
}

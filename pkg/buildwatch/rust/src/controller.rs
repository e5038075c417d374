// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::control::ProcessControl;
use crate::process::{ProcessDescriptor, ProcessState, RestartTarget};
use crate::version::VersionGate;
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::time::{Duration, Instant, sleep};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct ControllerOptions {
    /// Only restart processes that are RUNNING, leaving STARTING ones alone.
    pub running_only: bool,
    /// Never restart the process with this pid (our own).
    pub own_pid: u32,
    pub poll_interval: Duration,
    /// How long a stopped process may take to reach STOPPED before it is abandoned.
    pub stop_timeout: Duration,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            running_only: false,
            own_pid: std::process::id(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
        }
    }
}

/// What one restart transaction did.
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionOutcome {
    /// The version marker did not change; the API was not contacted.
    Unchanged,
    /// The process list could not be fetched.
    ListFailed,
    /// Nothing matched the restart target; the marker was not committed.
    NoTargets,
    Restarted {
        targeted: Vec<String>,
        stop_faults: Vec<String>,
        started: Vec<String>,
        start_faults: Vec<String>,
        abandoned: Vec<String>,
    },
}

/// Runs restart transactions: stop every targeted process, wait for each to
/// reach STOPPED, start it again.
pub struct ProcessController {
    control: Arc<dyn ProcessControl>,
    gate: VersionGate,
    target: RestartTarget,
    options: ControllerOptions,
}

impl ProcessController {
    pub fn new(
        control: Arc<dyn ProcessControl>,
        gate: VersionGate,
        target: RestartTarget,
        options: ControllerOptions,
    ) -> Self {
        Self {
            control,
            gate,
            target,
            options,
        }
    }

    pub fn gate(&self) -> &VersionGate {
        &self.gate
    }

    fn is_target(&self, process: &ProcessDescriptor) -> bool {
        let restartable = match process.state {
            ProcessState::Running => true,
            ProcessState::Starting => !self.options.running_only,
            _ => false,
        };
        restartable && process.pid != self.options.own_pid && self.target.matches(process)
    }

    pub async fn run_transaction(&mut self) -> TransactionOutcome {
        let marker = self.gate.current_marker();
        if !self.gate.has_changed(&marker) {
            info!("version unchanged ({marker:?}), nothing to restart");
            return TransactionOutcome::Unchanged;
        }
        info!(
            "version changed from {:?} to {marker:?}",
            self.gate.last_known()
        );

        let processes = match self.control.list_all_processes().await {
            Ok(processes) => processes,
            Err(e) => {
                warn!("failed to list processes: {e}");
                return TransactionOutcome::ListFailed;
            }
        };

        let targeted: Vec<String> = processes
            .iter()
            .filter(|p| self.is_target(p))
            .map(ProcessDescriptor::qualified_name)
            .collect();
        if targeted.is_empty() {
            info!("no process matches {}, nothing to restart", self.target);
            return TransactionOutcome::NoTargets;
        }

        let mut stop_faults = Vec::new();
        let mut pending = Vec::with_capacity(targeted.len());
        for name in &targeted {
            info!("[{name}] stopping");
            match self.control.stop_process(name, false).await {
                Ok(()) => pending.push(name.clone()),
                Err(e) => {
                    warn!("[{name}] failed to stop, it will not be started: {e}");
                    stop_faults.push(name.clone());
                }
            }
        }

        let mut started = Vec::new();
        let mut start_faults = Vec::new();
        let mut abandoned = Vec::new();
        let deadline = Instant::now() + self.options.stop_timeout;
        while !pending.is_empty() {
            let mut still_pending = Vec::with_capacity(pending.len());
            for name in pending {
                let info = match self.control.get_process_info(&name).await {
                    Ok(info) => info,
                    Err(e) => {
                        warn!("[{name}] failed to get process info, it will not be started: {e}");
                        abandoned.push(name);
                        continue;
                    }
                };
                if info.state != ProcessState::Stopped {
                    debug!("[{name}] waiting for STOPPED (currently {})", info.state);
                    still_pending.push(name);
                    continue;
                }

                info!("[{name}] starting");
                match self.control.start_process(&name, false).await {
                    Ok(()) => started.push(name),
                    Err(e) => {
                        warn!("[{name}] failed to start: {e}");
                        start_faults.push(name);
                    }
                }
            }
            pending = still_pending;

            if pending.is_empty() {
                break;
            }
            if Instant::now() >= deadline {
                for name in pending.drain(..) {
                    warn!(
                        "[{name}] did not stop within {}s, it will not be started",
                        self.options.stop_timeout.as_secs()
                    );
                    abandoned.push(name);
                }
                break;
            }
            sleep(self.options.poll_interval).await;
        }

        // At least one process was targeted; start faults do not hold back the commit.
        self.gate.commit(&marker);
        info!("Updated current version to {marker:?}");

        TransactionOutcome::Restarted {
            targeted,
            stop_faults,
            started,
            start_faults,
            abandoned,
        }
    }
}

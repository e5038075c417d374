// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Collapses bursts of change notifications into serialized restart transactions.
//!
//! Every notification runs on its own task. The first one of a burst takes the
//! gate lock without blocking and sleeps for the debounce interval; the others
//! fail to take it and are dropped. The winner then queues on the transaction
//! lock, releases the gate so the next burst can begin, and runs the restart.

use crate::controller::{ProcessController, TransactionOutcome};
use log::{debug, info};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Duration, sleep};
use tokio_util::task::TaskTracker;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq)]
pub enum NotificationOutcome {
    /// Another notification of the same burst holds the gate.
    Absorbed,
    /// Shutdown began before this notification reached the transaction lock.
    Skipped,
    Transaction(TransactionOutcome),
}

struct Inner {
    gate: Mutex<()>,
    /// Held for the whole transaction. Owning the controller here makes its
    /// API client and version marker reachable only by the lock holder.
    transaction: Mutex<ProcessController>,
    debounce: Duration,
    closed: AtomicBool,
}

impl Inner {
    async fn handle_notification(&self) -> NotificationOutcome {
        let Ok(gate) = self.gate.try_lock() else {
            debug!("change absorbed into the current burst");
            return NotificationOutcome::Absorbed;
        };

        sleep(self.debounce).await;

        let mut controller = self.transaction.lock().await;
        drop(gate);

        if self.closed.load(Ordering::SeqCst) {
            info!("shutting down, not starting a restart");
            return NotificationOutcome::Skipped;
        }
        NotificationOutcome::Transaction(controller.run_transaction().await)
    }
}

pub struct RestartCoordinator {
    inner: Arc<Inner>,
    tracker: TaskTracker,
}

impl RestartCoordinator {
    pub fn new(controller: ProcessController, debounce: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                gate: Mutex::new(()),
                transaction: Mutex::new(controller),
                debounce,
                closed: AtomicBool::new(false),
            }),
            tracker: TaskTracker::new(),
        }
    }

    /// Handle one raw change notification without blocking the caller.
    /// Returns `None` once shutdown has begun.
    pub fn notify(&self) -> Option<JoinHandle<NotificationOutcome>> {
        if self.inner.closed.load(Ordering::SeqCst) {
            return None;
        }
        let inner = Arc::clone(&self.inner);
        Some(
            self.tracker
                .spawn(async move { inner.handle_notification().await }),
        )
    }

    /// Refuse new notifications and wait for in-flight work to finish. A
    /// transaction that already started runs to completion.
    pub async fn shutdown(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        self.tracker.close();
        if !self.tracker.is_empty() {
            info!(
                "waiting for {} pending notification(s) to finish",
                self.tracker.len()
            );
        }
        self.tracker.wait().await;
    }
}

// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::error::DetectorError;
use log::{debug, info, warn};
use notify::event::AccessKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// Forwards filesystem changes under a directory whose path ends with a
/// suffix (case-insensitive). Delivery is neither ordered nor deduplicated.
pub struct ChangeDetector {
    root: PathBuf,
    suffix: String,
    tx: mpsc::UnboundedSender<PathBuf>,
    watcher: Option<RecommendedWatcher>,
}

impl ChangeDetector {
    pub fn new(
        root: impl Into<PathBuf>,
        suffix: &str,
    ) -> (Self, mpsc::UnboundedReceiver<PathBuf>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let detector = Self {
            root: root.into(),
            suffix: suffix.to_lowercase(),
            tx,
            watcher: None,
        };
        (detector, rx)
    }

    pub fn is_running(&self) -> bool {
        self.watcher.is_some()
    }

    pub fn start(&mut self) -> Result<(), DetectorError> {
        if self.watcher.is_some() {
            return Ok(());
        }
        if !self.root.is_dir() {
            return Err(DetectorError::MissingDirectory(self.root.clone()));
        }

        let tx = self.tx.clone();
        let suffix = self.suffix.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            match res {
                Ok(event) => {
                    if !is_mutation(&event.kind) {
                        return;
                    }
                    for path in event.paths {
                        if matches_suffix(&path, &suffix) {
                            debug!("{:?} on {}", event.kind, path.display());
                            // The receiver is gone once the daemon stops listening.
                            let _ = tx.send(path);
                        }
                    }
                }
                Err(e) => warn!("filesystem watch error: {e}"),
            }
        })
        .map_err(|source| self.watch_error(source))?;

        watcher
            .watch(&self.root, RecursiveMode::Recursive)
            .map_err(|source| self.watch_error(source))?;

        info!(
            "watching {} for changes to *{}",
            self.root.display(),
            self.suffix
        );
        self.watcher = Some(watcher);
        Ok(())
    }

    /// Stop delivering notifications. Events already queued stay in the channel.
    pub fn stop(&mut self) {
        if let Some(mut watcher) = self.watcher.take() {
            if let Err(e) = watcher.unwatch(&self.root) {
                debug!("unwatch {}: {e}", self.root.display());
            }
            info!("stopped watching {}", self.root.display());
        }
    }

    fn watch_error(&self, source: notify::Error) -> DetectorError {
        DetectorError::Watch {
            path: self.root.clone(),
            source,
        }
    }
}

impl Drop for ChangeDetector {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Reads and opens are not changes. `Access(Close(Write))` is.
fn is_mutation(kind: &EventKind) -> bool {
    !matches!(
        kind,
        EventKind::Access(AccessKind::Read | AccessKind::Open(_) | AccessKind::Any)
    )
}

fn matches_suffix(path: &Path, suffix: &str) -> bool {
    path.to_string_lossy().to_lowercase().ends_with(suffix)
}

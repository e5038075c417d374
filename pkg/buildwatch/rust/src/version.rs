// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use log::{info, warn};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Tracks the deployed version marker and tells real version changes apart
/// from filesystem noise.
#[derive(Debug)]
pub struct VersionGate {
    path: PathBuf,
    last_known: String,
}

impl VersionGate {
    /// Seed the last-known marker from what is on disk right now.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let mut gate = Self::with_last_known(path, "");
        gate.last_known = gate.current_marker();
        info!(
            "current version at {}: {:?}",
            gate.path.display(),
            gate.last_known
        );
        gate
    }

    pub fn with_last_known(path: impl Into<PathBuf>, last_known: &str) -> Self {
        Self {
            path: path.into(),
            last_known: last_known.trim().to_string(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn last_known(&self) -> &str {
        &self.last_known
    }

    /// Read the marker file. A missing file is "nothing deployed yet" and reads as empty.
    pub fn current_marker(&self) -> String {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents.trim().to_string(),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("version marker {} not found", self.path.display());
                String::new()
            }
            Err(e) => {
                warn!(
                    "failed to read version marker {}: {e}",
                    self.path.display()
                );
                String::new()
            }
        }
    }

    pub fn has_changed(&self, candidate: &str) -> bool {
        candidate.trim() != self.last_known
    }

    pub fn commit(&mut self, marker: &str) {
        self.last_known = marker.trim().to_string();
    }
}

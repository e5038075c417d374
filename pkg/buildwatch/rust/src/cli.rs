// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::process::RestartTarget;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_MARKER: &str = "build.txt";

/// Restart supervisord programs once per deployment when a version marker changes.
#[derive(Debug, Parser)]
#[command(name = "buildwatch", version)]
pub struct Args {
    /// Directory to watch (recursively).
    pub watch_dir: PathBuf,

    /// Name of the version marker file inside the watched directory.
    #[arg(default_value = DEFAULT_MARKER)]
    pub marker: String,

    /// Programs to restart, by name or `group:name`.
    #[arg(short, long = "program", value_name = "NAME")]
    pub programs: Vec<String>,

    /// Restart every program of this group. May be repeated.
    #[arg(short, long = "group", value_name = "GROUP")]
    pub groups: Vec<String>,

    /// Restart any child process of supervisord.
    #[arg(short, long)]
    pub any: bool,

    /// Only restart processes that are RUNNING, not STARTING.
    #[arg(long)]
    pub running_only: bool,

    /// Watch and restart (the default).
    #[arg(long, overrides_with = "disabled")]
    pub enabled: bool,

    /// Do nothing but wait for a termination signal.
    #[arg(long, overrides_with = "enabled")]
    pub disabled: bool,

    /// Seconds to wait for a stopped process to reach STOPPED before giving up on it.
    #[arg(long, value_name = "SECS", default_value_t = 60)]
    pub stop_timeout: u64,

    #[arg(long, default_value = "info")]
    pub log_level: log::Level,
}

impl Args {
    pub fn is_enabled(&self) -> bool {
        !self.disabled
    }

    pub fn restart_target(&self) -> RestartTarget {
        RestartTarget::new(self.programs.clone(), self.groups.clone(), self.any)
    }

    pub fn marker_path(&self) -> PathBuf {
        self.watch_dir.join(&self.marker)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout)
    }
}

// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Process states as reported by supervisord's `statename`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Stopped,
    Starting,
    Running,
    Backoff,
    Stopping,
    Exited,
    Fatal,
    Unknown,
}

impl ProcessState {
    pub fn as_str(self) -> &'static str {
        match self {
            ProcessState::Stopped => "STOPPED",
            ProcessState::Starting => "STARTING",
            ProcessState::Running => "RUNNING",
            ProcessState::Backoff => "BACKOFF",
            ProcessState::Stopping => "STOPPING",
            ProcessState::Exited => "EXITED",
            ProcessState::Fatal => "FATAL",
            ProcessState::Unknown => "UNKNOWN",
        }
    }
}

impl FromStr for ProcessState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STOPPED" => Ok(ProcessState::Stopped),
            "STARTING" => Ok(ProcessState::Starting),
            "RUNNING" => Ok(ProcessState::Running),
            "BACKOFF" => Ok(ProcessState::Backoff),
            "STOPPING" => Ok(ProcessState::Stopping),
            "EXITED" => Ok(ProcessState::Exited),
            "FATAL" => Ok(ProcessState::Fatal),
            "UNKNOWN" => Ok(ProcessState::Unknown),
            other => Err(format!("unknown process state: {other}")),
        }
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A managed process as seen by the process-control API at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessDescriptor {
    pub group: String,
    pub name: String,
    pub pid: u32,
    pub state: ProcessState,
}

impl ProcessDescriptor {
    pub fn new(group: &str, name: &str, pid: u32, state: ProcessState) -> Self {
        Self {
            group: group.to_string(),
            name: name.to_string(),
            pid,
            state,
        }
    }

    /// `group:name`, the identifier supervisord accepts for stop/start.
    pub fn qualified_name(&self) -> String {
        format!("{}:{}", self.group, self.name)
    }
}

/// Which managed processes a restart acts on. Fixed at startup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestartTarget {
    programs: BTreeSet<String>,
    groups: BTreeSet<String>,
    any: bool,
}

impl RestartTarget {
    pub fn new(
        programs: impl IntoIterator<Item = String>,
        groups: impl IntoIterator<Item = String>,
        any: bool,
    ) -> Self {
        Self {
            programs: programs.into_iter().collect(),
            groups: groups.into_iter().collect(),
            any,
        }
    }

    pub fn any() -> Self {
        Self::new([], [], true)
    }

    /// True when nothing could ever match.
    pub fn is_empty(&self) -> bool {
        !self.any && self.programs.is_empty() && self.groups.is_empty()
    }

    pub fn matches(&self, process: &ProcessDescriptor) -> bool {
        self.any
            || self.programs.contains(&process.name)
            || self.programs.contains(&process.qualified_name())
            || self.groups.contains(&process.group)
    }
}

impl fmt::Display for RestartTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.any {
            return write!(f, "any child process");
        }
        let mut parts = Vec::new();
        if !self.programs.is_empty() {
            let names: Vec<&str> = self.programs.iter().map(String::as_str).collect();
            parts.push(format!("programs [{}]", names.join(", ")));
        }
        if !self.groups.is_empty() {
            let names: Vec<&str> = self.groups.iter().map(String::as_str).collect();
            parts.push(format!("groups [{}]", names.join(", ")));
        }
        write!(f, "{}", parts.join(" and "))
    }
}

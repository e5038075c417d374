// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::error::ConfigError;
use std::fmt;
use std::path::PathBuf;

pub const SERVER_URL_VAR: &str = "SUPERVISOR_SERVER_URL";
pub const USERNAME_VAR: &str = "SUPERVISOR_USERNAME";
pub const PASSWORD_VAR: &str = "SUPERVISOR_PASSWORD";

/// Where supervisord's XML-RPC interface listens.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerUrl {
    /// `host:port` of an `http://` url.
    Tcp(String),
    Unix(PathBuf),
}

impl ServerUrl {
    pub fn parse(url: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidServerUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        };

        if let Some(path) = url.strip_prefix("unix://") {
            if path.is_empty() {
                return Err(invalid("missing socket path"));
            }
            return Ok(ServerUrl::Unix(PathBuf::from(path)));
        }

        let uri: http::Uri = url.parse().map_err(|_| invalid("not a valid url"))?;
        if uri.scheme_str() != Some("http") {
            return Err(invalid("scheme must be http:// or unix://"));
        }
        let authority = uri.authority().ok_or_else(|| invalid("missing host"))?;
        let port = authority.port_u16().unwrap_or(80);
        Ok(ServerUrl::Tcp(format!("{}:{port}", authority.host())))
    }

    /// Value for the HTTP `Host` header.
    pub fn host(&self) -> &str {
        match self {
            ServerUrl::Tcp(addr) => addr,
            ServerUrl::Unix(_) => "localhost",
        }
    }
}

impl fmt::Display for ServerUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerUrl::Tcp(addr) => write!(f, "http://{addr}"),
            ServerUrl::Unix(path) => write!(f, "unix://{}", path.display()),
        }
    }
}

/// Connection parameters for supervisord, as it exports them to its children.
#[derive(Debug, Clone, PartialEq)]
pub struct SupervisorConfig {
    pub server_url: ServerUrl,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl SupervisorConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = std::env::var(SERVER_URL_VAR)
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingEnv(SERVER_URL_VAR))?;
        Ok(Self {
            server_url: ServerUrl::parse(&url)?,
            username: std::env::var(USERNAME_VAR).ok().filter(|v| !v.is_empty()),
            password: std::env::var(PASSWORD_VAR).ok(),
        })
    }
}

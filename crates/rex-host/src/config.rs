use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use rex_protocol::DEFAULT_PORT;

use crate::error::HostError;

pub const ENV_BIND: &str = "REX_BIND";
pub const ENV_WORKDIR: &str = "REX_WORKDIR";

#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Address the transport server listens on.
    pub bind: SocketAddr,
    /// Initial working directory for filesystem commands. Defaults to the
    /// process cwd at startup.
    pub workdir: Option<PathBuf>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            workdir: None,
        }
    }
}

impl HostConfig {
    /// Defaults overridden by `REX_BIND` and `REX_WORKDIR` when set.
    pub fn from_env() -> Result<Self, HostError> {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var(ENV_BIND) {
            config.bind = parse_bind(&raw)?;
        }
        if let Ok(raw) = std::env::var(ENV_WORKDIR) {
            config.workdir = Some(PathBuf::from(raw));
        }
        Ok(config)
    }

    /// Resolve the configured working directory to an absolute, canonical
    /// directory path.
    pub fn initial_workdir(&self) -> Result<PathBuf, HostError> {
        let raw = match &self.workdir {
            Some(path) => path.clone(),
            None => std::env::current_dir().map_err(|source| HostError::Workdir {
                path: PathBuf::from("."),
                source,
            })?,
        };
        let canonical = std::fs::canonicalize(&raw).map_err(|source| HostError::Workdir {
            path: raw.clone(),
            source,
        })?;
        if !canonical.is_dir() {
            return Err(HostError::Workdir {
                path: raw,
                source: std::io::Error::new(std::io::ErrorKind::NotADirectory, "not a directory"),
            });
        }
        Ok(canonical)
    }
}

/// Accepts either a full socket address or a bare port (bound on loopback).
pub fn parse_bind(raw: &str) -> Result<SocketAddr, HostError> {
    let raw = raw.trim();
    if let Ok(port) = raw.parse::<u16>() {
        return Ok(SocketAddr::from((Ipv4Addr::LOCALHOST, port)));
    }
    raw.parse::<SocketAddr>()
        .map_err(|e| HostError::Config(format!("bind address '{raw}': {e}")))
}

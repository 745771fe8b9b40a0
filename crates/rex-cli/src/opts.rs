//! Global CLI options and host configuration flags.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use rex_host::HostConfig;
use rex_host::config::parse_bind;
use tracing_subscriber::EnvFilter;

/// Options for commands that talk to a running host.
#[derive(Args, Debug, Clone)]
pub struct ClientOpts {
    /// Host base URL (env: REX_URL)
    #[arg(long, global = true, env = "REX_URL", default_value_t = rex_client::default_url())]
    pub url: String,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Listen address, `host:port` or a bare port [default: REX_BIND or 127.0.0.1:8080]
    #[arg(long)]
    pub bind: Option<String>,

    /// Initial working directory for filesystem commands [default: REX_WORKDIR or cwd]
    #[arg(long)]
    pub workdir: Option<PathBuf>,
}

impl ServeArgs {
    /// Environment defaults with command-line flags applied on top.
    pub fn host_config(&self) -> Result<HostConfig> {
        let mut config = HostConfig::from_env().context("read host config from env")?;
        if let Some(raw) = &self.bind {
            let bind: SocketAddr = parse_bind(raw).context("parse --bind")?;
            config.bind = bind;
        }
        if let Some(workdir) = &self.workdir {
            config.workdir = Some(workdir.clone());
        }
        Ok(config)
    }
}

/// Log to stderr so command output on stdout stays clean. `RUST_LOG`
/// overrides `default_filter`.
pub fn setup_logging(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

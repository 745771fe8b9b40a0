//! `rex serve` command.

use anyhow::{Context, Result};

use crate::opts::{ServeArgs, setup_logging};

pub async fn cmd_serve(args: &ServeArgs) -> Result<()> {
    setup_logging("info");
    let config = args.host_config()?;
    let server = rex_host::spawn_server(&config)
        .await
        .context("start command host")?;
    server
        .run_until(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!("listen for ctrl-c: {err}");
            }
        })
        .await
        .context("command host stopped")?;
    Ok(())
}

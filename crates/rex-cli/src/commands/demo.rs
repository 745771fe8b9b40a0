//! `rex demo` command: host and REPL in one process.

use anyhow::{Context, Result};
use rex_client::CommandClient;
use tokio::io::BufReader;

use crate::opts::{ServeArgs, setup_logging};
use crate::repl::Repl;

pub async fn cmd_demo(args: &ServeArgs) -> Result<()> {
    setup_logging("warn");
    let config = args.host_config()?;
    let server = rex_host::spawn_server(&config)
        .await
        .context("start command host")?;
    let client = CommandClient::new(server.url());
    let repl = Repl::new(client, BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .run()
        .await
        .context("repl i/o");
    server.shutdown().await.context("stop command host")?;
    repl?;
    Ok(())
}

//! `rex repl` command.

use anyhow::{Context, Result};
use rex_client::CommandClient;
use tokio::io::BufReader;

use crate::opts::{ClientOpts, setup_logging};
use crate::repl::Repl;

pub async fn cmd_repl(opts: &ClientOpts) -> Result<()> {
    setup_logging("warn");
    let client = CommandClient::new(opts.url.clone());
    Repl::new(client, BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .run()
        .await
        .context("repl i/o")?;
    Ok(())
}

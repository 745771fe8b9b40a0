//! `rex call` command.

use anyhow::{Context, Result};
use clap::Args;
use rex_client::CommandClient;

use crate::opts::{ClientOpts, setup_logging};

#[derive(Args, Debug)]
pub struct CallArgs {
    /// Command name registered on the host
    pub method: String,

    /// Positional arguments passed to the command
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

pub async fn cmd_call(opts: &ClientOpts, args: &CallArgs) -> Result<()> {
    setup_logging("warn");
    let client = CommandClient::new(opts.url.clone());
    let reply = client
        .call(&args.method, &args.args)
        .await
        .with_context(|| format!("Failed to run {}", args.method))?;
    println!("{}", reply.body);
    Ok(())
}

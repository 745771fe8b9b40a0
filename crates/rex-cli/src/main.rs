mod commands;
mod opts;
mod repl;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::call::CallArgs;
use opts::{ClientOpts, ServeArgs};

#[derive(Parser, Debug)]
#[command(name = "rex", version, about = "Remote command execution")]
struct Cli {
    #[command(flatten)]
    opts: ClientOpts,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read commands from stdin and run them on the host (default)
    Repl,

    /// Run the command host in the foreground
    Serve(ServeArgs),

    /// Run a single command and print the raw reply
    Call(CallArgs),

    /// Start a host in-process and attach a REPL to it
    Demo(ServeArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let opts = &cli.opts;

    match cli.command.unwrap_or(Command::Repl) {
        Command::Repl => commands::repl::cmd_repl(opts).await,
        Command::Serve(args) => commands::serve::cmd_serve(&args).await,
        Command::Call(args) => commands::call::cmd_call(opts, &args).await,
        Command::Demo(args) => commands::demo::cmd_demo(&args).await,
    }
}

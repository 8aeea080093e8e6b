use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use crate::args::Args;
use crate::commands::PsyncCommand;

/// The main CLI structure that defines the command-line interface
#[derive(Parser)]
#[command(name = "psync")]
#[command(version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: PsyncCommand,

    #[command(flatten)]
    pub args: Args,
}

/// Parse CLI arguments and execute the chosen command
pub async fn run(args: Vec<String>) -> Result<ExitCode> {
    let cli = Cli::try_parse_from(args).unwrap_or_else(|e| {
        e.exit();
    });

    let exit = cli.command.execute(&cli.args).await?;
    Ok(exit.report(cli.args.global.quiet))
}

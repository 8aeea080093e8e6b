mod replay;

use anyhow::Result;
use clap::Subcommand;

use crate::args::Args;
use crate::exit::Exit;

#[derive(Debug, Subcommand)]
pub enum PsyncCommand {
    /// Replay a scripted editor session and print where every document ended up
    Replay(self::replay::Replay),
}

impl PsyncCommand {
    pub async fn execute(&self, args: &Args) -> Result<Exit> {
        match self {
            PsyncCommand::Replay(replay) => replay.execute(args).await,
        }
    }
}

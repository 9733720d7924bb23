use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "activity-capture")]
#[command(about = "Record the screen, webcam and audio whenever the active window changes")]
#[command(version)]
#[command(subcommand_required = false)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Record until Ctrl+C (the default when no command is given)
    Record {
        /// JSON capture configuration; defaults are used when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Summarize time spent per window and application
    Analyze {
        /// Activity log to read (default: activity_log.csv)
        log: Option<PathBuf>,
    },
}

impl Cli {
    pub fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Record { config: None })
    }
}

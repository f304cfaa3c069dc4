use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "voicetally",
    about = "Voice activity statistics for Discord guilds"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Per-user activity report with live totals
    Stats {
        #[arg(long)]
        guild: u64,
        #[arg(long)]
        user: u64,
    },
    /// Guild-wide ranking for one activity
    Rank {
        #[arg(long)]
        guild: u64,
        #[arg(long)]
        activity: String,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Day-bucketed series for the heatmap renderer
    Heatmap {
        #[arg(long)]
        guild: u64,
        #[arg(long)]
        user: Option<u64>,
        #[arg(long)]
        activity: String,
        #[arg(long)]
        days: Option<u32>,
    },
    /// Feed a JSON-lines file of voice events through the ingestion worker
    Replay {
        #[arg(long)]
        file: PathBuf,
    },
    /// Read or change configuration values
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Show store totals and open-session counts
    Status,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    Set { key: String, value: String },
    Get { key: String },
}

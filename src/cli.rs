// src/cli.rs — CLI definition (clap derive)

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "apsis", about = "LLM-guided design optimization loop", version)]
pub struct Cli {
    /// Config file path (defaults to ./apsis.toml when present)
    #[arg(long)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Drive a full optimization run against the configured oracle
    Run {
        /// Override the iteration ceiling
        #[arg(short, long)]
        iterations: Option<u32>,

        /// End the run as FAILED on the first oracle schema violation
        #[arg(long)]
        strict: bool,
    },
    /// Re-render the dashboard for a recorded run directory
    Report {
        /// A run directory written by a previous `apsis run`
        run_dir: String,
    },
}

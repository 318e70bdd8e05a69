use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// RentalHub service wiring diagnostics
#[derive(Parser, Debug)]
#[command(name = "rentalhub", version)]
#[command(about = "Inspect and check the RentalHub service registry")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (defaults to <config dir>/rentalhub/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter, overrides the configured level
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List every registered service
    Services,
    /// Validate the wiring and construct every controller
    Check,
    /// Print the dependency graph in DOT format
    Graph {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the effective configuration
    Config,
}

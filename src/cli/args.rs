//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Generate images, videos, sounds and full video commercials with AI services
#[derive(Parser, Debug)]
#[command(name = "adforge")]
#[command(version, about = "AI commercial ad generator", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Config file path
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Interactive menu (default)
    Menu,
    /// Build a commercial from a written brief and exit
    Commercial {
        /// Path to the brief text file
        #[arg(long, short)]
        brief: PathBuf,

        /// Base name for every generated artifact
        #[arg(long, short)]
        name: String,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Create default config file
    Init,
}

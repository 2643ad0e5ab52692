//! Command-line interface definitions using clap

use clap::{Parser, Subcommand};

/// Talentenraad - backend of the parents' association website
#[derive(Parser)]
#[command(name = "talentenraad")]
#[command(version)]
#[command(about = "Backend service for the Talentenraad website", long_about = None)]
pub struct Cli {
    /// Configuration file (default: config.toml)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Export or import database contents
    Data {
        #[command(subcommand)]
        action: DataCommands,
    },
}

/// Configuration management commands
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print a sample configuration, or write it to a file
    Generate {
        /// Output path (default: stdout)
        output_path: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Offline data transfer commands
#[derive(Subcommand)]
pub enum DataCommands {
    /// Export all tables to a JSON file
    Export {
        /// Output file path
        file_path: String,
    },

    /// Import a JSON export
    Import {
        /// Input file path
        file_path: String,

        /// Overwrite existing rows instead of skipping them
        #[arg(long)]
        overwrite: bool,
    },
}

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mediasplit")]
#[command(author, version, about = "Split media files into size-bounded chunks")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server and retention sweeper
    Start {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Split a local file and print the segment URLs
    Split {
        /// Media file to split
        #[arg(required = true)]
        file: PathBuf,

        /// Target chunk size in megabytes
        #[arg(short, long)]
        size: Option<i64>,
    },

    /// Probe a media file and show the segment plan
    Probe {
        /// File to probe
        #[arg(required = true)]
        file: PathBuf,

        /// Target chunk size in megabytes for the plan
        #[arg(short, long)]
        size: Option<i64>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete stored files older than the retention window
    Sweep,

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses --config if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

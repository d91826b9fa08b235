use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "firesize")]
#[command(author, version, about = "On-the-fly image resizing proxy backed by ImageMagick")]
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
    /// Start the HTTP server
    Start {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Fetch and transform a single image without starting the server
    Process {
        /// Source image URL
        #[arg(required = true)]
        url: String,

        /// Resize geometry, e.g. 300x200, 300x or x200^
        #[arg(short, long)]
        size: Option<String>,

        /// Output format (defaults to the source extension)
        #[arg(short, long)]
        format: Option<String>,

        /// Gravity used when cropping a filled resize
        #[arg(short, long)]
        gravity: Option<String>,

        /// Output quality (1-100)
        #[arg(short, long)]
        quality: Option<u8>,

        /// Where to write the result
        #[arg(short, long, required = true)]
        output: PathBuf,
    },

    /// Check that identify and convert are available
    CheckTools {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

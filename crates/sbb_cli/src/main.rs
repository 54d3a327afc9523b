//! SBB CLI
//!
//! Command-line tools for budgeted stream recording.
//!
//! # Commands
//!
//! - `record` - Run a frame stream through the recorder into an output directory
//! - `inspect` - Summarize the segment records of an output directory

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// SBB command-line recording tools.
#[derive(Parser)]
#[command(name = "sbb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a frame stream under a storage budget
    Record {
        /// Path to the parameter file
        #[arg(short, long, default_value = "params.json")]
        params: PathBuf,

        /// Path to the frame file (JSON array of frames)
        #[arg(long)]
        frames: PathBuf,

        /// Output directory (recreated on every run)
        #[arg(short, long, default_value = "sbb_output")]
        output: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Summarize the records of an output directory
    Inspect {
        /// Output directory
        #[arg(short, long, default_value = "sbb_output")]
        output: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Record {
            params,
            frames,
            output,
            format,
        } => {
            commands::record::run(&params, &frames, &output, &format)?;
        }
        Commands::Inspect { output, format } => {
            commands::inspect::run(&output, &format)?;
        }
        Commands::Version => {
            println!("SBB CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("SBB Core v{}", sbb_core::VERSION);
        }
    }

    Ok(())
}

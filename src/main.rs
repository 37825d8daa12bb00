// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use scanner::{AppResult, ScanMode};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "scanner")]
#[command(about = "Scan barcodes and QR codes from a stream of frames")]
#[command(version = env!("GIT_VERSION"))]
struct Cli {
    /// Configuration file (default: ~/.config/scanner/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scanning session and print the scanned codes
    Scan {
        /// Symbol family to accept (BARCODE or QR)
        #[arg(short, long)]
        mode: Option<ScanMode>,

        /// Recorded detection batches (JSON Lines) to replay
        #[arg(long, conflicts_with = "images", required_unless_present = "images")]
        replay: Option<PathBuf>,

        /// Image file or directory of images to run the QR detector on
        #[arg(long)]
        images: Option<PathBuf>,

        /// Stop after this many seconds
        #[arg(short, long)]
        duration: Option<u64>,

        /// Restart the input from the beginning when it runs out
        #[arg(long = "loop")]
        looping: bool,

        /// Write the last overlay frame as SVG
        #[arg(long)]
        overlay_svg: Option<PathBuf>,

        /// Write the result as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run the QR detector on one image and print the observations
    Detect {
        /// Image file
        image: PathBuf,
    },

    /// Show the effective configuration
    Config,
}

fn main() -> AppResult<()> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=scanner=trace, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Scan {
            mode,
            replay,
            images,
            duration,
            looping,
            overlay_svg,
            output,
        } => cli::scan(
            &config,
            cli::ScanOptions {
                mode,
                replay,
                images,
                duration,
                looping,
                overlay_svg,
                output,
            },
        ),
        Commands::Detect { image } => cli::detect(&config, &image),
        Commands::Config => cli::show_config(&config, cli.config.as_deref()),
    }
}

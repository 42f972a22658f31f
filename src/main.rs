// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "gesture-capture")]
#[command(about = "Gesture-triggered webcam photo capture")]
#[command(version = env!("GIT_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available cameras
    List,

    /// Take a plain photo (no gesture trigger)
    Photo {
        /// Camera index to use (from 'gesture-capture list')
        #[arg(short, long, default_value = "0")]
        camera: usize,

        /// Output file path (default: ~/Pictures/gesture-capture/photo_TIMESTAMP.jpg)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run a gesture capture session: hold up index, middle, and ring
    /// fingers to trigger a countdown capture
    Capture {
        /// Camera index to use (from 'gesture-capture list')
        #[arg(short, long, default_value = "0")]
        camera: usize,

        /// Hand-landmark detector sidecar command (e.g. "python3 landmarker.py")
        #[arg(short, long)]
        detector: String,

        /// Output file path (default: ~/Pictures/gesture-capture/photo_TIMESTAMP.jpg)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Countdown length in seconds (default from config)
        #[arg(long)]
        countdown: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=gesture_capture=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let args = Cli::parse();

    match args.command {
        Commands::List => cli::list_cameras(),
        Commands::Photo { camera, output } => cli::take_photo(camera, output).await,
        Commands::Capture {
            camera,
            detector,
            output,
            countdown,
        } => cli::capture_gesture(camera, detector, output, countdown).await,
    }
}

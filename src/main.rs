// SPDX-License-Identifier: GPL-3.0-only

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "intervalcam")]
#[command(about = "Unattended interval camera with a flash countdown signal")]
#[command(version = env!("GIT_VERSION"))]
struct Cli {
    /// Config file (default: ~/.config/intervalcam/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Overrides for the configured capture setup
#[derive(Args, Debug, Default)]
pub struct CaptureArgs {
    /// V4L2 device to capture from (e.g. /dev/video0)
    #[arg(short = 'd', long, conflicts_with = "image")]
    device: Option<PathBuf>,

    /// Use a still image file as the camera
    #[arg(short, long)]
    image: Option<PathBuf>,

    /// Directory photos are saved to (default: ~/Pictures/intervalcam)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Save PNG instead of JPEG
    #[arg(long)]
    png: bool,

    /// Never drive the flash LEDs
    #[arg(long)]
    no_flash: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture on a fixed interval until Ctrl+C (Enter takes a countdown photo)
    Run {
        /// Minutes between captures (default from config: 2)
        #[arg(short = 'n', long)]
        interval: Option<String>,

        /// Seed the countdown lottery for reproducible runs
        #[arg(long)]
        seed: Option<u64>,

        #[command(flatten)]
        capture: CaptureArgs,
    },

    /// Take one photo immediately
    Shot {
        #[command(flatten)]
        capture: CaptureArgs,
    },

    /// Run the flash countdown, then take one photo (Ctrl+C aborts)
    Countdown {
        #[command(flatten)]
        capture: CaptureArgs,
    },

    /// List controllable flash LEDs
    Flash,

    /// Print the effective configuration
    Config {
        /// Minutes between captures
        #[arg(short = 'n', long)]
        interval: Option<String>,

        #[command(flatten)]
        capture: CaptureArgs,

        /// Write the effective configuration back to the config file
        #[arg(long)]
        save: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=intervalcam=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn,intervalcam=info")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Run {
            interval,
            seed,
            capture,
        } => {
            let config = cli::effective_config(config_path, interval.as_deref(), &capture)?;
            cli::run_schedule(config, seed)?;
        }
        Commands::Shot { capture } => {
            let config = cli::effective_config(config_path, None, &capture)?;
            cli::take_photo(config, false)?;
        }
        Commands::Countdown { capture } => {
            let config = cli::effective_config(config_path, None, &capture)?;
            cli::take_photo(config, true)?;
        }
        Commands::Flash => cli::list_flash(),
        Commands::Config {
            interval,
            capture,
            save,
        } => {
            let config = cli::effective_config(config_path, interval.as_deref(), &capture)?;
            cli::show_config(&config, config_path, save)?;
        }
    }

    Ok(())
}

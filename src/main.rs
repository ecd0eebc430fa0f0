// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use dayafterday::config::Settings;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "dayafterday")]
#[command(about = "Take a picture every day and line it up with the previous one")]
#[command(version = env!("GIT_VERSION"))]
#[command(subcommand_required = false)]
struct Cli {
    /// Snapshot directory (default: ~/Documents/DayAfterDay)
    #[arg(short, long, global = true)]
    dir: Option<PathBuf>,

    /// Camera index (from 'dayafterday list') or device path
    #[arg(long, global = true)]
    device: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List available cameras
    List,

    /// Take a single picture and exit
    Photo,

    /// Print saved pictures, newest first
    History,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=dayafterday=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let settings = Settings::new(cli.dir, cli.device.as_deref());

    match cli.command {
        Some(Commands::List) => cli::list_cameras(),
        Some(Commands::Photo) => cli::take_photo(&settings),
        Some(Commands::History) => cli::print_history(&settings),
        None => dayafterday::app::run(&settings),
    }
}

//! edlink CLI - upload ROM images to EverDrive flash cartridges.
//!
//! ## Features
//!
//! - Upload a local image to a path on the cartridge filesystem
//! - List available serial ports, with USB bridge classification
//! - Serial port auto-detection when only one candidate is present
//! - Environment variable support
//!
//! Environment variables:
//!   EDLINK_PORT - Default serial port
//!   EDLINK_BAUD - Default baud rate (default: 9600)

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::debug;
use std::path::PathBuf;

mod commands;

/// edlink - upload ROM images to EverDrive flash cartridges over serial.
#[derive(Parser)]
#[command(name = "edlink")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Serial port to use (auto-detected if not specified).
    #[arg(short, long, global = true, env = "EDLINK_PORT")]
    port: Option<String>,

    /// Baud rate for the session.
    #[arg(short, long, global = true, default_value = "9600", env = "EDLINK_BAUD")]
    baud: u32,

    /// Verbose output level (-v, -vv for increasing detail).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (suppress non-essential output).
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Upload a ROM image to the cartridge.
    Upload {
        /// Local image file to upload.
        source: PathBuf,

        /// Destination path on the cartridge (e.g. "games/rom.nes").
        destination: String,
    },

    /// List available serial ports.
    ListPorts {
        /// Output the port list as JSON to stdout.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_target(cli.verbose >= 2)
        .format_timestamp(None)
        .init();

    debug!("edlink v{}", env!("CARGO_PKG_VERSION"));

    match &cli.command {
        Commands::Upload {
            source,
            destination,
        } => commands::cmd_upload(&cli, source, destination),
        Commands::ListPorts { json } => commands::cmd_list_ports(*json),
    }
}

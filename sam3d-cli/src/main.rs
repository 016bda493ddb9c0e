//! SAM3D CLI — checkpoint verification for SAM3D model artifacts.
//!
//! `sam3d verify` exits 0 when the checkpoints pass and 1 otherwise.

mod commands;

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// SAM3D: locate and verify model checkpoints
#[derive(Parser, Debug)]
#[command(name = "sam3d", version, about, long_about = None)]
struct Cli {
    /// Workspace directory (searched for .sam3d/config.toml)
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Verify that all required checkpoint files are present
    Verify {
        /// Path to the checkpoints directory [default: checkpoints]
        #[arg(long)]
        checkpoints_dir: Option<PathBuf>,
        /// Print the discovery result as JSON instead of the text report
        #[arg(long)]
        json: bool,
        /// Skip walking the tree for its total size
        #[arg(long)]
        skip_size: bool,
    },
    /// List the files in the checkpoints directory
    Inspect {
        /// Path to the checkpoints directory [default: checkpoints]
        #[arg(long)]
        checkpoints_dir: Option<PathBuf>,
        /// Number of files to list
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let _guard = init_tracing(cli.verbose, cli.quiet);

    // Resolve workspace
    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let passed = commands::handle_command(cli.command, &workspace)?;
    Ok(if passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

/// Human-readable stderr layer plus a daily JSON log file.
fn init_tracing(verbose: u8, quiet: bool) -> WorkerGuard {
    let filter = match verbose {
        0 if quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(EnvFilter::new(filter));

    let log_dir = directories::ProjectDirs::from("dev", "sam3d", "sam3d")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "sam3d.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    guard
}

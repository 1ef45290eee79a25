// ABOUTME: CLI entry point for mysql-backup-monitor
// ABOUTME: Parses commands, loads the env file and routes to handlers

use clap::{Parser, Subcommand};
use mysql_backup_monitor::commands;
use mysql_backup_monitor::config::load_dump_config;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "mysql-backup-monitor")]
#[command(about = "Full MySQL dumps with table exclusion and live progress", long_about = None)]
struct Cli {
    /// Env file with DB_HOST, DB_USERNAME, DB_PASSWORD, DB_DATABASE, DB_IGNORE_TABLES
    #[arg(long, global = true, default_value = ".env")]
    env_file: PathBuf,
    /// Log debug output unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the expected dump size per table without dumping
    Estimate,
    /// Dump the database with mysqldump and report progress
    Dump {
        /// Directory for the asa_<timestamp>.sql output file
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
        /// Milliseconds between progress checks
        #[arg(long, default_value_t = 1000, value_parser = clap::value_parser!(u64).range(1..))]
        poll_interval_ms: u64,
        /// Do not draw a progress bar
        #[arg(long)]
        no_progress: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging - default to INFO (DEBUG with --verbose) if RUST_LOG not set
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_dump_config(&cli.env_file)?;

    match cli.command {
        Commands::Estimate => {
            commands::estimate(&config).await?;
        }
        Commands::Dump {
            output_dir,
            poll_interval_ms,
            no_progress,
        } => {
            let options = commands::DumpOptions {
                output_dir,
                poll_interval: Duration::from_millis(poll_interval_ms),
                show_progress: !no_progress,
            };
            commands::dump(&config, &options).await?;
        }
    }

    Ok(())
}

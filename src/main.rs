//! graced: a demo daemon wired through grace-shutdown.
//!
//! Runs simulated work, then exits through the shutdown orchestrator.
//! Press Ctrl+C once to start cleanup, twice to force exit.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use grace_shutdown::config::{load_config, Settings};
use grace_shutdown::observability::logging::init_logging;
use grace_shutdown::{is_closing, register, run_until_idle, Cleanup, Fault};

#[derive(Parser, Debug)]
#[command(name = "graced")]
#[command(about = "Demo daemon with graceful shutdown", long_about = None)]
struct Cli {
    /// TOML config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override shutdown.delay_ms.
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Await cleanup without a deadline.
    #[arg(long)]
    no_timeout: bool,

    /// How long the simulated work runs before the process goes idle.
    #[arg(long, default_value_t = 5_000)]
    work_ms: u64,

    /// How long the simulated cleanup takes.
    #[arg(long, default_value_t = 500)]
    cleanup_ms: u64,

    /// Make the cleanup report an error.
    #[arg(long)]
    fail_cleanup: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => load_config(path)?,
        None => Settings::default(),
    };
    if let Some(delay_ms) = cli.delay_ms {
        settings.shutdown.delay_ms = delay_ms;
    }
    if cli.no_timeout {
        settings.shutdown.timeout = false;
    }

    init_logging(&settings.logging)?;
    tracing::info!(pid = std::process::id(), "graced starting");

    let cleanup_ms = cli.cleanup_ms;
    let fail = cli.fail_cleanup;
    let _handle = register(
        settings.shutdown.to_shutdown_config(),
        Cleanup::from_async(move |trigger| async move {
            tracing::info!(%trigger, cleanup_ms, "Cleaning up");
            tokio::time::sleep(Duration::from_millis(cleanup_ms)).await;
            if fail {
                return Err(Fault::msg("simulated cleanup failure"));
            }
            tracing::info!("Cleanup finished");
            Ok(())
        }),
    )?;

    let work_ms = cli.work_ms;
    run_until_idle(async move {
        let mut ticker = tokio::time::interval(Duration::from_millis(250));
        let deadline = tokio::time::Instant::now() + Duration::from_millis(work_ms);
        while !is_closing() && tokio::time::Instant::now() < deadline {
            ticker.tick().await;
            tracing::debug!("Working");
        }
        tracing::info!("Work drained");
    })
    .await;

    Ok(())
}

//! Anti-cheat server entry point.
//!
//! Loads `.env` and the layered configuration, opens the file-backed tables
//! and keeps the sweepers running until Ctrl-C.
mod dirs;

use anticheat_runtime::{AntiCheatConfig, Repositories, Runtime};
use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _guard = setup_logging()?;

    let config = AntiCheatConfig::load().context("Failed to load anti-cheat configuration")?;
    let data_dir = config.data_dir.clone().unwrap_or_else(dirs::data_dir);
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

    tracing::info!("Data directory: {}", data_dir.display());
    tracing::info!(
        "Enabled: {}, IP ban mode: {}, window anchor: {}",
        config.enabled,
        config.ip_ban_mode,
        config.counter_window_anchor
    );

    let repositories = Repositories::file(&data_dir)
        .with_context(|| format!("Failed to open repositories in {}", data_dir.display()))?;

    let runtime = Runtime::builder()
        .config(config)
        .repositories(repositories)
        .build()
        .await?;

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    tracing::info!("Shutdown requested");

    runtime.shutdown().await?;
    Ok(())
}

/// Logs to stderr and to a daily-rolling file. The returned guard flushes
/// the file writer on drop.
fn setup_logging() -> Result<WorkerGuard> {
    let log_dir = dirs::log_dir();
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "anticheat.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    tracing::info!("Log directory: {}", log_dir.display());
    Ok(guard)
}

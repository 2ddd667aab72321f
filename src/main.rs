use std::path::Path;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli;
use cli::Cli;
use raidionics_catalog::config::Settings;

/// Main entry point for the rads command-line tool
///
/// Loads the layered settings, sets up file logging and runs the requested
/// subcommand against the local model catalog.
///
/// # Errors
/// Returns an error if the settings cannot be loaded, the manifest directory
/// cannot be read, a model lookup fails, or the backend configuration cannot
/// be written
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load settings first
    let settings = match &cli.config_dir {
        Some(dir) => Settings::from_dir(dir)?,
        None => Settings::new()?,
    };

    let log_path = settings.logging.file.as_deref().unwrap_or_else(|| Path::new("logs"));
    std::fs::create_dir_all(log_path)?;

    let file_appender = tracing_appender::rolling::RollingFileAppender::new(
        tracing_appender::rolling::Rotation::DAILY,
        log_path,
        "rads",
    );
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.logging.level.to_lowercase()));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        // Disable ANSI colors for cleaner log files
        .with_ansi(false)
        .with_line_number(true)
        .with_file(true)
        .with_thread_ids(true)
        .with_target(false)
        .with_env_filter(filter)
        .init();

    info!("rads starting up");
    info!("Log directory: {}", std::fs::canonicalize(log_path)?.display());
    info!("Manifest directory: {}", settings.models.directory.display());

    cli::run(cli.command, &settings).await
}

use boatengine::config::AppConfig;
use env_logger::{Builder, WriteStyle};
use log::error;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration first (without logging)
    let loaded = match std::env::args().nth(1) {
        Some(path) => AppConfig::from_file(path),
        None => AppConfig::new(),
    };
    let config = loaded.unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        // Fall back to default configuration
        AppConfig::default()
    });

    // Initialise logger with a configured log level
    Builder::new()
        .filter_level(config.get_log_level())
        .write_style(WriteStyle::Always)
        .format_timestamp_secs()
        .init();

    if let Err(e) = boatengine::run(config).await {
        error!("Application error: {}", e);
        return Err(e);
    }
    Ok(())
}

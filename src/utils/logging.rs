use crate::models::config::LoggingConfig;
use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    // Create logs directory
    std::fs::create_dir_all(&config.directory)?;

    let file_appender = tracing_appender::rolling::daily(&config.directory, &config.file_prefix);

    // stdout is reserved for command output
    let subscriber = tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("{},reqwest=warn,hyper=warn", config.level))),
        )
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .json(),
        );

    subscriber.try_init()?;

    info!("Logging initialized");
    Ok(())
}

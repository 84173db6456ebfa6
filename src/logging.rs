use crate::config::{AppConfig, LogFormat};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer, fmt::time::ChronoUtc, layer::SubscriberExt, util::SubscriberInitExt,
};

const LOG_FILE_PREFIX: &str = "gateway.log";

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `logging.level`. The returned guard flushes the file
/// writer on drop and must be held until shutdown.
pub fn init(config: &AppConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let default_level = config.logging.level.as_deref().unwrap_or("info");
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))?;

    let format = config.logging.format.unwrap_or(if config.is_production() {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    });

    let stdout_layer = match format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_timer(ChronoUtc::rfc_3339())
            .with_current_span(false)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .with_timer(ChronoUtc::rfc_3339())
            .with_target(true)
            .boxed(),
    };

    let (file_layer, guard) = match &config.logging.directory {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_timer(ChronoUtc::rfc_3339())
                .with_writer(writer)
                .with_ansi(false)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}

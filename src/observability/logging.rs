use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{ConfigError, LogFormat, LogLevel};

/// Initialize structured logging to stdout.
///
/// - `LogFormat::Json`: flattened JSON, one event per line.
/// - `LogFormat::Text`: human-readable output.
///
/// Uses `RUST_LOG` if set, otherwise the given `level`. Fails with
/// `ConfigError::Logging` if a global subscriber is already installed.
pub fn init_logging(level: LogLevel, format: LogFormat) -> Result<(), ConfigError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = match format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_target(true)
                    .with_ansi(false),
            )
            .try_init(),
        LogFormat::Text => registry.with(fmt::layer().with_target(true)).try_init(),
    };

    result.map_err(|e| ConfigError::Logging(e.to_string()))
}

use gift_exchange_config::Config;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::error::AppError;

const DEFAULT_LOG_LEVEL: &str = "info,gift_exchange_optimizer=info,gift_exchange_backend=info";

/// `RUST_LOG` wins over `log_filter` from the config, which wins over the default.
pub fn log_filter(config: &Config) -> Result<EnvFilter, AppError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    Ok(EnvFilter::try_new(
        config.log_filter.as_deref().unwrap_or(DEFAULT_LOG_LEVEL),
    )?)
}

/// Installs the global subscriber. Logs go to stderr so stdout stays free for results.
pub fn setup_logging(config: &Config) -> Result<(), AppError> {
    let stderr_log = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(stderr_log.with_filter(log_filter(config)?))
        .try_init()?;
    Ok(())
}

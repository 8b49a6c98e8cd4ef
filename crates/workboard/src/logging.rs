//! Process-wide log output.
//!
//! Library code logs through the `log` facade and opens `tracing` spans
//! around gateway and identity calls. [`init_logging`] routes both into one
//! `tracing-subscriber` registry.

use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

use crate::config::LoggingConfig;

/// Env var consulted before `RUST_LOG`.
pub const LOG_ENV_VAR: &str = "WORKBOARD_LOG";

fn build_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR)
        .or_else(|_| EnvFilter::try_from_default_env())
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global subscriber and the `log` bridge.
///
/// Calling this twice is harmless: the second call logs a warning and
/// leaves the first subscriber in place.
pub fn init_logging(config: &LoggingConfig) {
    let subscriber = tracing_subscriber::registry()
        .with(build_filter(config))
        .with(config.json.then(|| fmt::layer().json()))
        .with((!config.json).then(fmt::layer));

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        log::warn!("tracing subscriber already installed: {}", e);
        return;
    }
    if let Err(e) = tracing_log::LogTracer::init() {
        tracing::warn!("log bridge already installed: {}", e);
    }
}

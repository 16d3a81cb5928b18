//! Console logging for the simulator daemon.
//!
//! Configurable via the RUST_LOG environment variable; the config file's
//! `log_level` is used when RUST_LOG is unset, then `info`.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Default filter directive
pub const DEFAULT_LEVEL: &str = "info";

/// Install the global subscriber.
///
/// An unparsable `fallback` directive falls back to [`DEFAULT_LEVEL`].
pub fn init_logging(fallback: Option<&str>) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        fallback
            .and_then(|directive| EnvFilter::try_new(directive).ok())
            .unwrap_or_else(|| EnvFilter::new(DEFAULT_LEVEL))
    });

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_ansi(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .init();
}

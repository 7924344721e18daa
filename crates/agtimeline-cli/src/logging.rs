use tracing_subscriber::EnvFilter;

use crate::types::LogLevel;

/// Install the stderr subscriber once per process.
///
/// An explicit `--log-level` wins over `RUST_LOG`; without either only
/// warnings and errors are shown.
pub fn init_logging(level: Option<LogLevel>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level.to_string()),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    // A second call (e.g. from tests running `run` twice) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

//! Tracing subscriber setup for the `isaric` binary.

use tracing_subscriber::EnvFilter;

/// Filter used when neither `RUST_LOG` nor the configuration gives a usable
/// one.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Choose the log filter: `-v` forces debug, else `RUST_LOG`, else the
/// configured level, else [`DEFAULT_LOG_LEVEL`].
pub fn env_filter(verbose: bool, configured: &str) -> EnvFilter {
    if verbose {
        return EnvFilter::new("debug");
    }
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    EnvFilter::try_new(configured).unwrap_or_else(|e| {
        eprintln!("Ignoring invalid log level {configured:?}: {e}");
        EnvFilter::new(DEFAULT_LOG_LEVEL)
    })
}

/// Install the global subscriber, writing to stderr so command output on
/// stdout stays clean.
pub fn init_logging(verbose: bool, configured: &str) {
    let result = tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose, configured))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
    if let Err(e) = result {
        eprintln!("Logging already initialised: {e}");
    }
}

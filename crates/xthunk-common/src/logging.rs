use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding the tracing filter directive.
pub const LOG_ENV: &str = "XTHUNK_LOG";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize structured logging with environment filter.
/// Set XTHUNK_LOG=debug (or trace, info, warn, error) for verbosity control.
///
/// Safe to call more than once; only the first call installs a subscriber.
/// The host library calls this from `InitVulkan`, and the CLI calls it at
/// startup, so whichever runs first wins.
pub fn init_logging() {
    let _ = fmt()
        .with_env_filter(env_filter())
        .with_target(true)
        .with_thread_ids(true)
        .try_init();
}

/// Logging for test binaries: output goes through the libtest capture.
pub fn try_init_test_logging() {
    let _ = fmt()
        .with_env_filter(env_filter())
        .with_test_writer()
        .try_init();
}

//! Test fixtures and environment helpers.

use std::sync::Once;

static INIT_LOGGING: Once = Once::new();

/// Install a test-friendly tracing subscriber once per process.
///
/// Respects `RUST_LOG`; repeated calls are no-ops so suites can call this
/// from every test without fighting over the global subscriber.
pub fn init_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_logging_is_idempotent() {
        init_logging();
        init_logging();
    }
}

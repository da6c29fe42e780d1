//! Logging initialization

use tracing_subscriber::EnvFilter;

/// Initialize tracing with the given base level; `RUST_LOG` still wins when
/// set.
pub fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

use tracing_subscriber::EnvFilter;

use crate::constants::DEFAULT_LOG_FILTER;

// ============================================================================
// Tracing
// ============================================================================

// Log to stdout with the filter from RUST_LOG, or DEFAULT_LOG_FILTER when it is
// unset. A second call is a no-op.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

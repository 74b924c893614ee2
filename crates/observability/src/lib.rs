//! Tracing and logging setup shared by the binaries.

/// Set up logging for a binary. `PHARMASTOCK_LOG_FORMAT=pretty` switches
/// from JSON lines to human-readable output.
pub fn init() {
    let format = std::env::var(crate::tracing::LOG_FORMAT_ENV)
        .map(|v| crate::tracing::LogFormat::parse(&v))
        .unwrap_or_default();
    crate::tracing::init(format);
}

/// Tracing configuration (filters, layers).
pub mod tracing;

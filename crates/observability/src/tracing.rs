//! Subscriber setup. Levels come from `RUST_LOG`, falling back to `info`.

use tracing_subscriber::EnvFilter;

pub const LOG_FORMAT_ENV: &str = "PHARMASTOCK_LOG_FORMAT";

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human-readable, for terminals.
    Pretty,
}

impl LogFormat {
    /// Unknown values fall back to JSON.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

/// Install the global subscriber. Only the first call in a process wins.
pub fn init(format: LogFormat) {
    let levels = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt = tracing_subscriber::fmt().with_env_filter(levels).with_target(false);

    let installed = match format {
        LogFormat::Json => fmt.json().flatten_event(true).try_init(),
        LogFormat::Pretty => fmt.pretty().try_init(),
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

//! Process configuration read from `PHARMASTOCK_*` environment variables.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

const DEFAULT_DATA_FILE: &str = "pharmastock-data.json";
const DEFAULT_PERSIST_DEBOUNCE_MS: u64 = 500;
const DEFAULT_NEAR_EXPIRY_DAYS: i64 = 30;
const DEFAULT_CRITICAL_EXPIRY_DAYS: i64 = 7;
const DEFAULT_RETURN_WINDOW_DAYS: i64 = 7;

pub const ENV_DATA_FILE: &str = "PHARMASTOCK_DATA_FILE";
pub const ENV_PERSIST_DEBOUNCE_MS: &str = "PHARMASTOCK_PERSIST_DEBOUNCE_MS";
pub const ENV_NEAR_EXPIRY_DAYS: &str = "PHARMASTOCK_NEAR_EXPIRY_DAYS";
pub const ENV_CRITICAL_EXPIRY_DAYS: &str = "PHARMASTOCK_CRITICAL_EXPIRY_DAYS";
pub const ENV_RETURN_WINDOW_DAYS: &str = "PHARMASTOCK_RETURN_WINDOW_DAYS";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0}")]
    Inconsistent(String),
}

/// Runtime settings for the pharmacy engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PharmacyConfig {
    /// Snapshot file (JSON).
    pub data_file: PathBuf,
    /// Idle time before a pending snapshot is written.
    pub persist_debounce: Duration,
    pub near_expiry_days: i64,
    pub critical_expiry_days: i64,
    pub return_window_days: i64,
}

impl Default for PharmacyConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            persist_debounce: Duration::from_millis(DEFAULT_PERSIST_DEBOUNCE_MS),
            near_expiry_days: DEFAULT_NEAR_EXPIRY_DAYS,
            critical_expiry_days: DEFAULT_CRITICAL_EXPIRY_DAYS,
            return_window_days: DEFAULT_RETURN_WINDOW_DAYS,
        }
    }
}

impl PharmacyConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup.
    ///
    /// Unset keys fall back to their defaults; set but malformed keys are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let mut defaulted = Vec::new();
        let mut get = |key: &'static str| {
            let value = lookup(key).filter(|v| !v.trim().is_empty());
            if value.is_none() {
                defaulted.push(key);
            }
            value
        };

        let data_file = get(ENV_DATA_FILE)
            .map(PathBuf::from)
            .unwrap_or(defaults.data_file);
        let persist_debounce = match get(ENV_PERSIST_DEBOUNCE_MS) {
            Some(raw) => Duration::from_millis(parse::<u64>(ENV_PERSIST_DEBOUNCE_MS, &raw)?),
            None => defaults.persist_debounce,
        };
        let near_expiry_days = days(ENV_NEAR_EXPIRY_DAYS, get(ENV_NEAR_EXPIRY_DAYS), defaults.near_expiry_days)?;
        let critical_expiry_days = days(
            ENV_CRITICAL_EXPIRY_DAYS,
            get(ENV_CRITICAL_EXPIRY_DAYS),
            defaults.critical_expiry_days,
        )?;
        let return_window_days = days(
            ENV_RETURN_WINDOW_DAYS,
            get(ENV_RETURN_WINDOW_DAYS),
            defaults.return_window_days,
        )?;

        if critical_expiry_days > near_expiry_days {
            return Err(ConfigError::Inconsistent(format!(
                "{ENV_CRITICAL_EXPIRY_DAYS} ({critical_expiry_days}) exceeds {ENV_NEAR_EXPIRY_DAYS} ({near_expiry_days})"
            )));
        }
        if !defaulted.is_empty() {
            tracing::warn!(keys = ?defaulted, "configuration keys not set, using defaults");
        }

        Ok(Self {
            data_file,
            persist_debounce,
            near_expiry_days,
            critical_expiry_days,
            return_window_days,
        })
    }
}

fn parse<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
        key,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

fn days(key: &'static str, raw: Option<String>, default: i64) -> Result<i64, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    let value = parse::<i64>(key, &raw)?;
    if value < 0 {
        return Err(ConfigError::Invalid {
            key,
            value: raw,
            reason: "must not be negative".to_string(),
        });
    }
    Ok(value)
}

//! History service configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use mrp_core::retention::{DEFAULT_LIST_LIMIT, DEFAULT_UNDO_TTL_HOURS, MAX_LIST_LIMIT};

/// Default period of the undo expiry sweep: 1 hour.
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 3600;

/// Retention windows and list limits shared by both logs and the sweep.
#[derive(Debug, Clone)]
pub struct HistoryConfig {
    /// Lifetime of an undo entry.
    pub undo_ttl: chrono::Duration,
    /// How often the expiry sweep runs.
    pub sweep_interval: Duration,
    /// List limit used when the caller passes none.
    pub default_limit: i64,
    /// Upper bound applied to every caller-supplied list limit.
    pub max_limit: i64,
    /// Change records older than this are pruned by the sweep. `None`
    /// keeps them forever.
    pub change_retention: Option<chrono::Duration>,
}

impl HistoryConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                         | Default |
    /// |---------------------------------|---------|
    /// | `UNDO_TTL_HOURS`                | `24`    |
    /// | `UNDO_SWEEP_INTERVAL_SECS`      | `3600`  |
    /// | `HISTORY_DEFAULT_LIMIT`         | `50`    |
    /// | `HISTORY_MAX_LIMIT`             | `500`   |
    /// | `CHANGE_HISTORY_RETENTION_DAYS` | unset   |
    ///
    /// Unparseable or non-positive values are logged and replaced by the
    /// default.
    pub fn from_env() -> Self {
        let ttl_hours: i64 = env_positive("UNDO_TTL_HOURS", DEFAULT_UNDO_TTL_HOURS);
        let sweep_secs: u64 = env_positive("UNDO_SWEEP_INTERVAL_SECS", DEFAULT_SWEEP_INTERVAL_SECS);
        let max_limit: i64 = env_positive("HISTORY_MAX_LIMIT", MAX_LIST_LIMIT);
        let default_limit: i64 =
            env_positive("HISTORY_DEFAULT_LIMIT", DEFAULT_LIST_LIMIT).min(max_limit);
        let retention_days: Option<i64> = env_optional("CHANGE_HISTORY_RETENTION_DAYS");

        Self {
            undo_ttl: chrono::Duration::hours(ttl_hours),
            sweep_interval: Duration::from_secs(sweep_secs),
            default_limit,
            max_limit,
            change_retention: retention_days.map(chrono::Duration::days),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            undo_ttl: chrono::Duration::hours(DEFAULT_UNDO_TTL_HOURS),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            default_limit: DEFAULT_LIST_LIMIT,
            max_limit: MAX_LIST_LIMIT,
            change_retention: None,
        }
    }
}

/// Read a positive number from `key`, falling back to `default`.
fn env_positive<T>(key: &str, default: T) -> T
where
    T: FromStr + PartialOrd + Default + Copy + std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => match parse_positive(&raw) {
            Some(value) => value,
            None => {
                tracing::warn!(key, value = %raw, %default, "Invalid config value, using default");
                default
            }
        },
        Err(_) => default,
    }
}

/// Read an optional positive number from `key`. Invalid values disable the
/// setting.
fn env_optional<T>(key: &str) -> Option<T>
where
    T: FromStr + PartialOrd + Default + Copy,
{
    let raw = std::env::var(key).ok()?;
    let parsed = parse_positive(&raw);
    if parsed.is_none() {
        tracing::warn!(key, value = %raw, "Invalid config value, ignoring");
    }
    parsed
}

fn parse_positive<T>(raw: &str) -> Option<T>
where
    T: FromStr + PartialOrd + Default,
{
    raw.trim().parse::<T>().ok().filter(|v| *v > T::default())
}

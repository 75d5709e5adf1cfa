//! Runtime configuration.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `MARKETWATCH_WATCHLIST` | `watchlist.csv` | Persisted watchlist path |
//! | `MARKETWATCH_EXPORT_DIR` | `.` | Directory receiving exports |
//! | `MARKETWATCH_DEFAULT_SYMBOL` | `AAPL` | Fallback watchlist entry |
//! | `MARKETWATCH_TIMEOUT_MS` | `10000` | Upper bound for one fetch |
//! | `MARKETWATCH_VIEW_TTL_SECS` | `0` | View memoization TTL, `0` disables |
//! | `MARKETWATCH_AUTOSAVE` | `true` | Persist on every add/remove |

use std::path::PathBuf;
use std::time::Duration;

use crate::http_client::DEFAULT_REQUEST_TIMEOUT;
use crate::watchlist::DEFAULT_SYMBOL;
use crate::{ConfigError, Symbol};

pub const ENV_WATCHLIST: &str = "MARKETWATCH_WATCHLIST";
pub const ENV_EXPORT_DIR: &str = "MARKETWATCH_EXPORT_DIR";
pub const ENV_DEFAULT_SYMBOL: &str = "MARKETWATCH_DEFAULT_SYMBOL";
pub const ENV_TIMEOUT_MS: &str = "MARKETWATCH_TIMEOUT_MS";
pub const ENV_VIEW_TTL_SECS: &str = "MARKETWATCH_VIEW_TTL_SECS";
pub const ENV_AUTOSAVE: &str = "MARKETWATCH_AUTOSAVE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    pub watchlist_path: PathBuf,
    pub export_dir: PathBuf,
    pub default_symbol: Symbol,
    pub request_timeout: Duration,
    pub view_ttl: Duration,
    pub autosave: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            watchlist_path: PathBuf::from("watchlist.csv"),
            export_dir: PathBuf::from("."),
            default_symbol: Symbol::from_trusted(DEFAULT_SYMBOL),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            view_ttl: Duration::ZERO,
            autosave: true,
        }
    }
}

impl DashboardConfig {
    /// Defaults overlaid with `MARKETWATCH_*` process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`DashboardConfig::from_env`] with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(path) = get(ENV_WATCHLIST) {
            config.watchlist_path = PathBuf::from(path);
        }
        if let Some(dir) = get(ENV_EXPORT_DIR) {
            config.export_dir = PathBuf::from(dir);
        }
        if let Some(raw) = get(ENV_DEFAULT_SYMBOL) {
            config.default_symbol =
                Symbol::parse(&raw).map_err(|source| ConfigError::InvalidSymbol {
                    var: ENV_DEFAULT_SYMBOL,
                    source,
                })?;
        }
        if let Some(raw) = get(ENV_TIMEOUT_MS) {
            let millis = parse_u64(ENV_TIMEOUT_MS, &raw)?;
            if millis == 0 {
                return Err(ConfigError::InvalidValue {
                    var: ENV_TIMEOUT_MS,
                    expected: "a positive number of milliseconds",
                    value: raw,
                });
            }
            config.request_timeout = Duration::from_millis(millis);
        }
        if let Some(raw) = get(ENV_VIEW_TTL_SECS) {
            config.view_ttl = Duration::from_secs(parse_u64(ENV_VIEW_TTL_SECS, &raw)?);
        }
        if let Some(raw) = get(ENV_AUTOSAVE) {
            config.autosave = parse_bool(ENV_AUTOSAVE, &raw)?;
        }

        Ok(config)
    }
}

fn parse_u64(var: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::InvalidValue {
            var,
            expected: "an unsigned integer",
            value: raw.to_owned(),
        })
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var,
            expected: "a boolean",
            value: raw.to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = DashboardConfig::from_lookup(|_| None).expect("defaults");
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.default_symbol.as_str(), "AAPL");
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert!(config.view_ttl.is_zero());
        assert!(config.autosave);
    }

    #[test]
    fn overlays_environment_values() {
        let config = DashboardConfig::from_lookup(lookup(&[
            (ENV_WATCHLIST, "/tmp/list.csv"),
            (ENV_DEFAULT_SYMBOL, "spy"),
            (ENV_TIMEOUT_MS, "2500"),
            (ENV_VIEW_TTL_SECS, "30"),
            (ENV_AUTOSAVE, "off"),
        ]))
        .expect("valid config");

        assert_eq!(config.watchlist_path, PathBuf::from("/tmp/list.csv"));
        assert_eq!(config.default_symbol.as_str(), "SPY");
        assert_eq!(config.request_timeout, Duration::from_millis(2500));
        assert_eq!(config.view_ttl, Duration::from_secs(30));
        assert!(!config.autosave);
    }

    #[test]
    fn rejects_zero_timeout_and_bad_bool() {
        assert!(matches!(
            DashboardConfig::from_lookup(lookup(&[(ENV_TIMEOUT_MS, "0")])),
            Err(ConfigError::InvalidValue { var: ENV_TIMEOUT_MS, .. })
        ));
        assert!(matches!(
            DashboardConfig::from_lookup(lookup(&[(ENV_AUTOSAVE, "maybe")])),
            Err(ConfigError::InvalidValue { var: ENV_AUTOSAVE, .. })
        ));
    }

    #[test]
    fn rejects_invalid_default_symbol() {
        assert!(matches!(
            DashboardConfig::from_lookup(lookup(&[(ENV_DEFAULT_SYMBOL, "$$$")])),
            Err(ConfigError::InvalidSymbol { .. })
        ));
    }
}

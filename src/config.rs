//! Runtime configuration, read from the environment at startup

use std::env;
use std::time::Duration;

use crate::error::ConfigError;
use crate::jobs::protocol_sync::Backoff;
use crate::services::staleness::DEFAULT_REFRESH_INTERVAL_SECS;

/// Environment variable for the Postgres connection string
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";

/// Environment variable for the catalog service root
pub const ENV_CATALOG_BASE_URL: &str = "CATALOG_BASE_URL";

/// Environment variable for the catalog HTTP timeout
pub const ENV_CATALOG_TIMEOUT: &str = "CATALOG_TIMEOUT_SECS";

/// Environment variable for the per-protocol staleness interval
pub const ENV_REFRESH_INTERVAL: &str = "SYNC_REFRESH_INTERVAL_SECS";

/// Environment variable for the pause between detail fetches
pub const ENV_REQUEST_DELAY: &str = "SYNC_REQUEST_DELAY_MS";

/// Environment variables for the failed-sweep backoff
pub const ENV_RETRY_BASE: &str = "SYNC_RETRY_BASE_MS";
pub const ENV_RETRY_MAX: &str = "SYNC_RETRY_MAX_MS";

/// Environment variable for the schedule; unset means run once and exit
pub const ENV_SWEEP_INTERVAL: &str = "SYNC_SWEEP_INTERVAL_SECS";

pub const DEFAULT_CATALOG_BASE_URL: &str = "https://api.llama.fi";
pub const DEFAULT_CATALOG_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_REQUEST_DELAY_MS: u64 = 120;
pub const DEFAULT_RETRY_BASE_MS: u64 = 1000;
pub const DEFAULT_RETRY_MAX_MS: u64 = 300_000; // 5 minutes

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub database_url: String,
    pub catalog_base_url: String,
    pub catalog_timeout: Duration,
    pub refresh_interval_secs: i64,
    pub request_delay: Duration,
    pub backoff: Backoff,
    /// `None` runs a single complete cycle (cron mode)
    pub sweep_interval: Option<Duration>,
}

impl SyncConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the config from any name -> value lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup(ENV_DATABASE_URL)
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing(ENV_DATABASE_URL))?;

        let catalog_base_url = lookup(ENV_CATALOG_BASE_URL)
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_CATALOG_BASE_URL.to_string());

        let timeout_secs: u64 =
            parse_or(&lookup, ENV_CATALOG_TIMEOUT, DEFAULT_CATALOG_TIMEOUT_SECS)?;
        let refresh_interval_secs: i64 =
            parse_or(&lookup, ENV_REFRESH_INTERVAL, DEFAULT_REFRESH_INTERVAL_SECS)?;
        if refresh_interval_secs < 0 {
            return Err(ConfigError::Invalid {
                name: ENV_REFRESH_INTERVAL,
                value: refresh_interval_secs.to_string(),
            });
        }
        let delay_ms: u64 = parse_or(&lookup, ENV_REQUEST_DELAY, DEFAULT_REQUEST_DELAY_MS)?;
        let retry_base_ms: u64 = parse_or(&lookup, ENV_RETRY_BASE, DEFAULT_RETRY_BASE_MS)?;
        let retry_max_ms: u64 = parse_or(&lookup, ENV_RETRY_MAX, DEFAULT_RETRY_MAX_MS)?;

        let sweep_interval = match lookup(ENV_SWEEP_INTERVAL) {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                    name: ENV_SWEEP_INTERVAL,
                    value: raw.clone(),
                })?;
                if secs == 0 {
                    return Err(ConfigError::Invalid {
                        name: ENV_SWEEP_INTERVAL,
                        value: raw,
                    });
                }
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(Self {
            database_url,
            catalog_base_url,
            catalog_timeout: Duration::from_secs(timeout_secs),
            refresh_interval_secs,
            request_delay: Duration::from_millis(delay_ms),
            backoff: Backoff::new(
                Duration::from_millis(retry_base_ms),
                Duration::from_millis(retry_max_ms),
            ),
            sweep_interval,
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = SyncConfig::from_lookup(lookup_from(&[(
            ENV_DATABASE_URL,
            "postgres://localhost/protocols",
        )]))
        .unwrap();

        assert_eq!(config.catalog_base_url, DEFAULT_CATALOG_BASE_URL);
        assert_eq!(config.refresh_interval_secs, 86400);
        assert_eq!(config.request_delay, Duration::from_millis(120));
        assert_eq!(config.catalog_timeout, Duration::from_secs(60));
        assert!(config.sweep_interval.is_none());
    }

    #[test]
    fn test_missing_database_url() {
        let err = SyncConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(ENV_DATABASE_URL)));
    }

    #[test]
    fn test_overrides_and_trailing_slash() {
        let config = SyncConfig::from_lookup(lookup_from(&[
            (ENV_DATABASE_URL, "postgres://localhost/protocols"),
            (ENV_CATALOG_BASE_URL, "http://127.0.0.1:8080/"),
            (ENV_REFRESH_INTERVAL, "3600"),
            (ENV_REQUEST_DELAY, "0"),
            (ENV_SWEEP_INTERVAL, "900"),
        ]))
        .unwrap();

        assert_eq!(config.catalog_base_url, "http://127.0.0.1:8080");
        assert_eq!(config.refresh_interval_secs, 3600);
        assert_eq!(config.request_delay, Duration::ZERO);
        assert_eq!(config.sweep_interval, Some(Duration::from_secs(900)));
    }

    #[test]
    fn test_invalid_number_rejected() {
        let err = SyncConfig::from_lookup(lookup_from(&[
            (ENV_DATABASE_URL, "postgres://localhost/protocols"),
            (ENV_REQUEST_DELAY, "fast"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains(ENV_REQUEST_DELAY));

        let err = SyncConfig::from_lookup(lookup_from(&[
            (ENV_DATABASE_URL, "postgres://localhost/protocols"),
            (ENV_SWEEP_INTERVAL, "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }
}

//! Server configuration loaded from the environment.
//!
//! Every variable is optional:
//!
//! ```text
//! NEARBY_PORT                   8080
//! NEARBY_DATABASE_PATH          nearby.db
//! NEARBY_MAX_RADIUS_METERS      10000
//! NEARBY_DEFAULT_RADIUS_METERS  5000
//! NEARBY_FRESHNESS_MINUTES      30
//! NEARBY_MAX_RESULTS            50
//! NEARBY_DEFAULT_TIER           approximate
//! ```

use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;
use tracing::{info, warn};

use crate::nearby::NearbyConfig;
use crate::sharing::SharingTier;

/// Error returned for an unparseable environment value.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable is set but its value is not acceptable.
    #[error("Invalid {key} value {value:?}: {reason}")]
    InvalidValue {
        /// Variable name
        key: &'static str,
        /// Raw value
        value: String,
        /// Why it was rejected
        reason: String,
    },
}

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Port the HTTP server binds on all interfaces.
    pub port: u16,
    /// SQLite database file.
    pub database_path: PathBuf,
    /// Query policy.
    pub nearby: NearbyConfig,
}

impl Config {
    /// Loads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if a variable is set to a value
    /// that does not parse or is out of range.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads the configuration through `lookup`, which returns the value of a
    /// variable if it is set.
    ///
    /// # Errors
    ///
    /// See [`from_env`](Self::from_env).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = NearbyConfig::default();

        let nearby = NearbyConfig {
            max_radius_meters: load_positive(
                &lookup,
                "NEARBY_MAX_RADIUS_METERS",
                defaults.max_radius_meters,
            )?,
            default_radius_meters: load_positive(
                &lookup,
                "NEARBY_DEFAULT_RADIUS_METERS",
                defaults.default_radius_meters,
            )?,
            freshness_window_minutes: load_positive(
                &lookup,
                "NEARBY_FRESHNESS_MINUTES",
                defaults.freshness_window_minutes,
            )?,
            max_results: load_positive(&lookup, "NEARBY_MAX_RESULTS", defaults.max_results)?,
            default_tier: load_tier(&lookup, defaults.default_tier)?,
        };

        Ok(Self {
            port: try_load(&lookup, "NEARBY_PORT", 8080)?,
            database_path: lookup("NEARBY_DATABASE_PATH").map_or_else(
                || {
                    info!("NEARBY_DATABASE_PATH not set, using default: nearby.db");
                    PathBuf::from("nearby.db")
                },
                PathBuf::from,
            ),
            nearby,
        })
    }
}

fn try_load<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    let Some(value) = lookup(key) else {
        info!("{key} not set, using default: {default}");
        return Ok(default);
    };

    match value.trim().parse() {
        Ok(parsed) => Ok(parsed),
        Err(e) => {
            warn!("Invalid {key} value: {e}");
            Err(ConfigError::InvalidValue {
                key,
                value,
                reason: e.to_string(),
            })
        }
    }
}

fn load_positive<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr + Display + PartialOrd + Default,
    T::Err: Display,
{
    let value = try_load(lookup, key, default)?;
    if value > T::default() {
        Ok(value)
    } else {
        warn!("Invalid {key} value: must be positive");
        Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            reason: "must be positive".to_string(),
        })
    }
}

fn load_tier(
    lookup: &impl Fn(&str) -> Option<String>,
    default: SharingTier,
) -> Result<SharingTier, ConfigError> {
    const KEY: &str = "NEARBY_DEFAULT_TIER";

    let Some(value) = lookup(KEY) else {
        info!("{KEY} not set, using default: {default}");
        return Ok(default);
    };

    match SharingTier::parse(value.trim()) {
        Some(tier @ (SharingTier::Approximate | SharingTier::Hidden)) => Ok(tier),
        Some(_) => Err(ConfigError::InvalidValue {
            key: KEY,
            value,
            reason: "default tier must be approximate or hidden".to_string(),
        }),
        None => Err(ConfigError::InvalidValue {
            key: KEY,
            value,
            reason: "unknown sharing tier".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.database_path, PathBuf::from("nearby.db"));
        assert_eq!(config.nearby, NearbyConfig::default());
    }

    #[test]
    fn values_are_read() {
        let config = load(&[
            ("NEARBY_PORT", "9000"),
            ("NEARBY_DATABASE_PATH", "/var/lib/nearby/data.db"),
            ("NEARBY_MAX_RADIUS_METERS", "20000"),
            ("NEARBY_DEFAULT_RADIUS_METERS", " 1500 "),
            ("NEARBY_FRESHNESS_MINUTES", "15"),
            ("NEARBY_MAX_RESULTS", "5"),
            ("NEARBY_DEFAULT_TIER", "hidden"),
        ])
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.database_path, PathBuf::from("/var/lib/nearby/data.db"));
        assert_eq!(config.nearby.max_radius_meters, 20_000);
        assert_eq!(config.nearby.default_radius_meters, 1_500);
        assert_eq!(config.nearby.freshness_window_minutes, 15);
        assert_eq!(config.nearby.max_results, 5);
        assert_eq!(config.nearby.default_tier, SharingTier::Hidden);
    }

    #[test]
    fn unparseable_number_is_rejected() {
        let err = load(&[("NEARBY_PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().starts_with("Invalid NEARBY_PORT value"));
    }

    #[test]
    fn zero_limits_are_rejected() {
        assert!(load(&[("NEARBY_MAX_RADIUS_METERS", "0")]).is_err());
        assert!(load(&[("NEARBY_MAX_RESULTS", "0")]).is_err());
        assert!(load(&[("NEARBY_FRESHNESS_MINUTES", "-5")]).is_err());
    }

    #[test]
    fn default_tier_must_be_private() {
        assert!(load(&[("NEARBY_DEFAULT_TIER", "detailed")]).is_err());
        assert!(load(&[("NEARBY_DEFAULT_TIER", "blocked")]).is_err());
        assert!(load(&[("NEARBY_DEFAULT_TIER", "public")]).is_err());
        assert_eq!(
            load(&[("NEARBY_DEFAULT_TIER", "approximate")])
                .unwrap()
                .nearby
                .default_tier,
            SharingTier::Approximate
        );
    }
}

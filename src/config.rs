use std::env;
use std::time::Duration;

use thiserror::Error;

const DEV_JWT_SECRET: &str = "mergington-dev-secret-change-me";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Runtime settings, read from the environment (and `.env`) once at start-up.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
    pub static_dir: String,
    pub seed_activities: bool,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    pub notify_webhook_url: Option<String>,
    pub notify_interval: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://mergington.db".to_string(),
            database_max_connections: 5,
            host: "127.0.0.1".to_string(),
            port: 8000,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl_minutes: 30,
            static_dir: "static".to_string(),
            seed_activities: true,
            admin_email: None,
            admin_password: None,
            notify_webhook_url: None,
            notify_interval: Duration::from_secs(30),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let jwt_secret = match get("JWT_SECRET") {
            Some(secret) => secret,
            None => {
                tracing::warn!("JWT_SECRET not set; using the development secret");
                defaults.jwt_secret
            }
        };

        Ok(Self {
            database_url: get("DATABASE_URL").unwrap_or(defaults.database_url),
            database_max_connections: parse_or(
                "DATABASE_MAX_CONNECTIONS",
                get("DATABASE_MAX_CONNECTIONS"),
                defaults.database_max_connections,
            )?,
            host: get("HOST").unwrap_or(defaults.host),
            port: parse_or("PORT", get("PORT"), defaults.port)?,
            jwt_secret,
            token_ttl_minutes: parse_or(
                "ACCESS_TOKEN_EXPIRE_MINUTES",
                get("ACCESS_TOKEN_EXPIRE_MINUTES"),
                defaults.token_ttl_minutes,
            )?,
            static_dir: get("STATIC_DIR").unwrap_or(defaults.static_dir),
            seed_activities: parse_bool_or(
                "SEED_ACTIVITIES",
                get("SEED_ACTIVITIES"),
                defaults.seed_activities,
            )?,
            admin_email: get("ADMIN_EMAIL"),
            admin_password: get("ADMIN_PASSWORD"),
            notify_webhook_url: get("NOTIFY_WEBHOOK_URL"),
            notify_interval: Duration::from_secs(parse_or(
                "NOTIFY_INTERVAL_SECS",
                get("NOTIFY_INTERVAL_SECS"),
                defaults.notify_interval.as_secs(),
            )?),
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

fn parse_bool_or(
    key: &'static str,
    raw: Option<String>,
    default: bool,
) -> Result<bool, ConfigError> {
    match raw.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None => Ok(default),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(_) => Err(ConfigError::Invalid {
            key,
            value: raw.unwrap_or_default(),
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
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let cfg = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.port, 8000);
        assert_eq!(cfg.token_ttl_minutes, 30);
        assert!(cfg.seed_activities);
        assert!(cfg.notify_webhook_url.is_none());
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("PORT", "9100"),
            ("SEED_ACTIVITIES", "off"),
            ("NOTIFY_WEBHOOK_URL", "http://hooks.local/n"),
            ("NOTIFY_INTERVAL_SECS", "5"),
            ("ADMIN_EMAIL", "  "),
        ]))
        .unwrap();
        assert_eq!(cfg.port, 9100);
        assert!(!cfg.seed_activities);
        assert_eq!(cfg.notify_webhook_url.as_deref(), Some("http://hooks.local/n"));
        assert_eq!(cfg.notify_interval, Duration::from_secs(5));
        assert!(cfg.admin_email.is_none());
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        let err = AppConfig::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: "PORT",
                value: "eighty".to_string()
            }
        );
    }

    #[test]
    fn malformed_booleans_are_rejected() {
        assert!(AppConfig::from_lookup(lookup(&[("SEED_ACTIVITIES", "maybe")])).is_err());
    }
}

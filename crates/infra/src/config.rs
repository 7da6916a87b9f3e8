//! Configuration loading and representation.
//!
//! Values come from the process environment. Parsing goes through a lookup
//! function so tests never touch real env vars.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::command_dispatcher::DispatchSettings;
use crate::store::StoreBackend;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_LOCAL_DB_PATH: &str = "./database/conferences.json";
pub const DEV_JWT_SECRET: &str = "boxoffice-dev-secret";
const DEFAULT_STORE_TIMEOUT_MS: u64 = 5000;
const DEFAULT_CONFLICT_RETRIES: u32 = 3;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be set when {reason}")]
    Missing { var: &'static str, reason: String },

    #[error("invalid value '{value}' for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    /// True when `JWT_SECRET` was absent and the development secret is in use.
    pub jwt_secret_is_default: bool,
    pub store: StoreBackend,
    pub dispatch: DispatchSettings,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_raw = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.parse::<SocketAddr>().map_err(|e| ConfigError::Invalid {
            var: "BIND_ADDR",
            value: bind_raw.clone(),
            reason: e.to_string(),
        })?;

        let (jwt_secret, jwt_secret_is_default) = match get("JWT_SECRET") {
            Some(secret) => (secret, false),
            None => (DEV_JWT_SECRET.to_string(), true),
        };

        let store = match get("STORE_BACKEND").as_deref().unwrap_or("memory") {
            "memory" => StoreBackend::Memory,
            "file" => StoreBackend::File(PathBuf::from(
                get("LOCAL_DB_PATH").unwrap_or_else(|| DEFAULT_LOCAL_DB_PATH.to_string()),
            )),
            "postgres" => StoreBackend::Postgres {
                url: get("DATABASE_URL").ok_or(ConfigError::Missing {
                    var: "DATABASE_URL",
                    reason: "STORE_BACKEND=postgres".to_string(),
                })?,
            },
            other => {
                return Err(ConfigError::Invalid {
                    var: "STORE_BACKEND",
                    value: other.to_string(),
                    reason: "expected one of memory, file, postgres".to_string(),
                });
            }
        };

        let store_timeout_ms = parse_number(&get, "STORE_TIMEOUT_MS", DEFAULT_STORE_TIMEOUT_MS)?;
        if store_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                var: "STORE_TIMEOUT_MS",
                value: "0".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        let conflict_retries = parse_number(&get, "CONFLICT_RETRIES", DEFAULT_CONFLICT_RETRIES)?;

        Ok(Self {
            bind_addr,
            jwt_secret,
            jwt_secret_is_default,
            store,
            dispatch: DispatchSettings {
                store_timeout: Duration::from_millis(store_timeout_ms),
                conflict_retries,
            },
        })
    }
}

fn parse_number<T>(
    get: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get(var) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind_addr, DEFAULT_BIND_ADDR.parse().unwrap());
        assert_eq!(cfg.store, StoreBackend::Memory);
        assert!(cfg.jwt_secret_is_default);
        assert_eq!(cfg.dispatch, DispatchSettings::default());
    }

    #[test]
    fn file_backend_uses_local_db_path() {
        let cfg = config(&[("STORE_BACKEND", "file")]).unwrap();
        assert_eq!(cfg.store, StoreBackend::File(DEFAULT_LOCAL_DB_PATH.into()));

        let cfg = config(&[("STORE_BACKEND", "file"), ("LOCAL_DB_PATH", "/tmp/c.json")]).unwrap();
        assert_eq!(cfg.store, StoreBackend::File("/tmp/c.json".into()));
    }

    #[test]
    fn postgres_backend_requires_url() {
        assert!(matches!(
            config(&[("STORE_BACKEND", "postgres")]),
            Err(ConfigError::Missing { var: "DATABASE_URL", .. })
        ));

        let cfg = config(&[
            ("STORE_BACKEND", "postgres"),
            ("DATABASE_URL", "postgres://localhost/boxoffice"),
        ])
        .unwrap();
        assert_eq!(cfg.store.kind(), "postgres");
    }

    #[test]
    fn invalid_values_are_reported() {
        assert!(matches!(
            config(&[("STORE_BACKEND", "mongo")]),
            Err(ConfigError::Invalid { var: "STORE_BACKEND", .. })
        ));
        assert!(matches!(
            config(&[("STORE_TIMEOUT_MS", "soon")]),
            Err(ConfigError::Invalid { var: "STORE_TIMEOUT_MS", .. })
        ));
        assert!(matches!(
            config(&[("STORE_TIMEOUT_MS", "0")]),
            Err(ConfigError::Invalid { var: "STORE_TIMEOUT_MS", .. })
        ));
        assert!(matches!(
            config(&[("BIND_ADDR", "nowhere")]),
            Err(ConfigError::Invalid { var: "BIND_ADDR", .. })
        ));
    }

    #[test]
    fn explicit_secret_and_tuning_are_used() {
        let cfg = config(&[
            ("JWT_SECRET", "s3cret"),
            ("STORE_TIMEOUT_MS", "250"),
            ("CONFLICT_RETRIES", "0"),
        ])
        .unwrap();
        assert_eq!(cfg.jwt_secret, "s3cret");
        assert!(!cfg.jwt_secret_is_default);
        assert_eq!(cfg.dispatch.store_timeout, Duration::from_millis(250));
        assert_eq!(cfg.dispatch.conflict_retries, 0);
    }
}

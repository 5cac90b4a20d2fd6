//! Server settings read from the environment.

use std::{env, net::SocketAddr, str::FromStr};

use tracing::info;

use super::error::ConfigError;
use crate::{ResponderConfig, DEFAULT_WINDOW_MS};

const BIND_VAR: &str = "WINDOWGATE_BIND";
const WINDOW_VAR: &str = "WINDOWGATE_WINDOW_MS";
const MAX_KEYS_VAR: &str = "WINDOWGATE_MAX_KEYS";
const SHARD_IDLE_VAR: &str = "WINDOWGATE_SHARD_IDLE_MS";

const DEFAULT_BIND: &str = "0.0.0.0:8080";
const DEFAULT_SHARD_IDLE_MS: u64 = 300_000;

/// Settings for the `windowgate-server` binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Listen address (`WINDOWGATE_BIND`, default `0.0.0.0:8080`).
    pub bind: SocketAddr,
    /// Responder settings (`WINDOWGATE_WINDOW_MS`, default 30000).
    pub responder: ResponderConfig,
    /// Key budget for sharded responders (`WINDOWGATE_MAX_KEYS`).
    pub max_keys: usize,
    /// Idle threshold for sharded responders (`WINDOWGATE_SHARD_IDLE_MS`,
    /// must be non-zero). Also used as the cleanup interval.
    pub shard_idle_ms: u64,
}

impl ServerConfig {
    /// Loads settings from the process environment.
    ///
    /// # Errors
    ///
    /// Fails if a variable is set but cannot be parsed, or if the resulting
    /// responder configuration is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads settings through an arbitrary lookup function.
    ///
    /// # Errors
    ///
    /// Same as [`from_env`](Self::from_env).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind = load(&lookup, BIND_VAR, DEFAULT_BIND)?;
        let window_ms = load(&lookup, WINDOW_VAR, &DEFAULT_WINDOW_MS.to_string())?;
        let max_keys = load(&lookup, MAX_KEYS_VAR, &crate::DEFAULT_MAX_KEYS.to_string())?;
        let shard_idle_ms: u64 = load(&lookup, SHARD_IDLE_VAR, &DEFAULT_SHARD_IDLE_MS.to_string())?;

        if shard_idle_ms == 0 {
            return Err(ConfigError::InvalidVar {
                key: SHARD_IDLE_VAR,
                value: shard_idle_ms.to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        let responder = ResponderConfig::new(window_ms);
        responder.validate().map_err(ConfigError::InvalidResponder)?;

        Ok(Self {
            bind,
            responder,
            max_keys,
            shard_idle_ms,
        })
    }
}

fn load<T, F>(lookup: &F, key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        });

    raw.parse().map_err(|e: T::Err| ConfigError::InvalidVar {
        key,
        value: raw.clone(),
        reason: e.to_string(),
    })
}

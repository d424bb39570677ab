//! Configuration Module
//!
//! Cache construction parameters and server configuration loaded from
//! environment variables.

use std::env;
use std::str::FromStr;

use serde::Deserialize;

use crate::cache::{DEFAULT_MAXSIZE, DEFAULT_TTL};

// == Cache Config ==
/// Construction parameters for an [`LruCache`](crate::cache::LruCache).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Capacity bound
    pub maxsize: usize,
    /// TTL in seconds; zero or negative disables expiration
    pub ttl: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            maxsize: DEFAULT_MAXSIZE,
            ttl: DEFAULT_TTL,
        }
    }
}

// == Server Config ==
/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the cache can hold
    pub max_entries: usize,
    /// Cache TTL in seconds, -1 or 0 disables expiration
    pub cache_ttl: i64,
    /// HTTP server port
    pub server_port: u16,
    /// Whether the remote store link starts active
    pub remote_enabled: bool,
    /// Interval in seconds between sweeps of expired remote entries
    pub remote_purge_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ENTRIES` - Maximum cache entries (default: 10)
    /// - `CACHE_TTL` - TTL in seconds (default: -1, no expiration)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `REMOTE_ENABLED` - Start with the remote link up (default: true)
    /// - `REMOTE_PURGE_INTERVAL` - Remote sweep frequency in seconds (default: 1)
    ///
    /// Unset or unparsable variables fall back to their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: env_or("MAX_ENTRIES", defaults.max_entries),
            cache_ttl: env_or("CACHE_TTL", defaults.cache_ttl),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            remote_enabled: env_or("REMOTE_ENABLED", defaults.remote_enabled),
            remote_purge_interval: env_or("REMOTE_PURGE_INTERVAL", defaults.remote_purge_interval),
        }
    }

    /// Cache parameters carried by this config.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            maxsize: self.max_entries,
            ttl: self.cache_ttl,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAXSIZE,
            cache_ttl: DEFAULT_TTL,
            server_port: 3000,
            remote_enabled: true,
            remote_purge_interval: 1,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.max_entries, 10);
        assert_eq!(config.cache_ttl, -1);
        assert_eq!(config.server_port, 3000);
        assert!(config.remote_enabled);
        assert_eq!(config.remote_purge_interval, 1);
    }

    #[test]
    fn test_config_from_env_defaults() {
        env::remove_var("MAX_ENTRIES");
        env::remove_var("CACHE_TTL");
        env::remove_var("SERVER_PORT");
        env::remove_var("REMOTE_ENABLED");
        env::remove_var("REMOTE_PURGE_INTERVAL");

        let config = Config::from_env();
        assert_eq!(config.max_entries, 10);
        assert_eq!(config.cache_ttl, -1);
        assert_eq!(config.server_port, 3000);
        assert!(config.remote_enabled);
    }

    #[test]
    fn test_cache_config_from_server_config() {
        let config = Config {
            max_entries: 2,
            cache_ttl: 30,
            ..Config::default()
        };
        assert_eq!(config.cache_config(), CacheConfig { maxsize: 2, ttl: 30 });
    }

    #[test]
    fn test_cache_config_deserialize_with_defaults() {
        let config: CacheConfig = serde_json::from_str(r#"{"ttl": 5}"#).unwrap();
        assert_eq!(config.maxsize, 10);
        assert_eq!(config.ttl, 5);
    }
}

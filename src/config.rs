//! Configuration Module
//!
//! Handles loading the store connection and TTL settings from environment variables.

use std::env;

use crate::contract::DEFAULT_TTL;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Store host name
    pub host: String,
    /// Store port
    pub port: u16,
    /// Logical database index
    pub db: u32,
    /// TTL in seconds applied by writes that do not pass an explicit TTL
    pub default_ttl: u64,
    /// In-memory store sweep interval in seconds
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_HOST` - Store host (default: localhost)
    /// - `CACHE_PORT` - Store port (default: 6379)
    /// - `CACHE_DB` - Logical database (default: 0)
    /// - `CACHE_DEFAULT_TTL` - Default TTL in seconds (default: 86400)
    /// - `CACHE_CLEANUP_INTERVAL` - Sweep frequency in seconds (default: 1)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env::var("CACHE_HOST")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.host),
            port: env::var("CACHE_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            db: env::var("CACHE_DB")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.db),
            default_ttl: env::var("CACHE_DEFAULT_TTL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.default_ttl),
            cleanup_interval: env::var("CACHE_CLEANUP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cleanup_interval),
        }
    }

    /// Connection URL understood by the `redis` client.
    pub fn redis_url(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
            db: 0,
            default_ttl: DEFAULT_TTL,
            cleanup_interval: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 6379);
        assert_eq!(config.db, 0);
        assert_eq!(config.default_ttl, 86400);
        assert_eq!(config.cleanup_interval, 1);
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("CACHE_HOST");
        env::remove_var("CACHE_PORT");
        env::remove_var("CACHE_DB");
        env::remove_var("CACHE_DEFAULT_TTL");
        env::remove_var("CACHE_CLEANUP_INTERVAL");

        let config = Config::from_env();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 6379);
        assert_eq!(config.db, 0);
        assert_eq!(config.default_ttl, 86400);
        assert_eq!(config.cleanup_interval, 1);
    }

    #[test]
    fn test_redis_url() {
        let config = Config {
            host: "cache.internal".to_string(),
            port: 6380,
            db: 3,
            ..Config::default()
        };
        assert_eq!(config.redis_url(), "redis://cache.internal:6380/3");
    }
}

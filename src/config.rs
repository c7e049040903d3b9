//! Environment configuration. Values outside their allowed ranges are fatal
//! at startup; unparseable values fall back to the defaults before
//! validation.

use anyhow::{bail, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub port: u16,
    pub sync_interval_seconds: u64,
    pub rate_limit_per_minute: u32,
    pub cache_ttl_seconds: u64,
    pub log_level: String,
    pub log_encoding: String,
}

impl Config {
    pub fn from_env() -> Result<Config> {
        let config = Config {
            database_path: env_or("DATABASE_PATH", "data/content_search.db"),
            port: env_parse("PORT", 8080),
            sync_interval_seconds: env_parse("SYNC_INTERVAL", 3600),
            rate_limit_per_minute: env_parse("RATE_LIMIT_PER_MINUTE", 60),
            cache_ttl_seconds: env_parse("CACHE_TTL_SECONDS", 60),
            log_level: env_or("LOG_LEVEL", "info"),
            log_encoding: env_or("LOG_ENCODING", "json"),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sync_interval_seconds < 60 {
            bail!("SYNC_INTERVAL must be at least 60 seconds");
        }
        if self.rate_limit_per_minute < 1 || self.rate_limit_per_minute > 1000 {
            bail!("RATE_LIMIT_PER_MINUTE must be between 1 and 1000");
        }
        if self.cache_ttl_seconds < 1 || self.cache_ttl_seconds > 3600 {
            bail!("CACHE_TTL_SECONDS must be between 1 and 3600");
        }
        if !matches!(self.log_level.as_str(), "debug" | "info" | "warn" | "error") {
            bail!("LOG_LEVEL must be one of debug, info, warn, error");
        }
        if !matches!(self.log_encoding.as_str(), "json" | "console") {
            bail!("LOG_ENCODING must be json or console");
        }
        Ok(())
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            database_path: "data/test.db".to_string(),
            port: 8080,
            sync_interval_seconds: 3600,
            rate_limit_per_minute: 60,
            cache_ttl_seconds: 60,
            log_level: "info".to_string(),
            log_encoding: "json".to_string(),
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_sync_interval_minimum() {
        let mut config = base_config();
        config.sync_interval_seconds = 59;
        assert!(config.validate().is_err());

        config.sync_interval_seconds = 60;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cache_ttl_bounds() {
        let mut config = base_config();
        config.cache_ttl_seconds = 0;
        assert!(config.validate().is_err());

        config.cache_ttl_seconds = 3601;
        assert!(config.validate().is_err());

        config.cache_ttl_seconds = 3600;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rate_limit_bounds() {
        let mut config = base_config();
        config.rate_limit_per_minute = 0;
        assert!(config.validate().is_err());

        config.rate_limit_per_minute = 1001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_settings_whitelists() {
        let mut config = base_config();
        config.log_level = "trace".to_string();
        assert!(config.validate().is_err());

        config.log_level = "warn".to_string();
        config.log_encoding = "pretty".to_string();
        assert!(config.validate().is_err());

        config.log_encoding = "console".to_string();
        assert!(config.validate().is_ok());
    }
}

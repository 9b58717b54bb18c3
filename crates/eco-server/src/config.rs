//! Server configuration from environment.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_ROAD_PROVIDER_URL: &str = "https://router.project-osrm.org/route/v1/driving";
pub const DEFAULT_AQI_PROVIDER_URL: &str = "https://air-quality-api.open-meteo.com/v1/air-quality";

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub road_provider_url: String,
    pub aqi_provider_url: String,
    pub road_timeout_ms: u64,
    pub aqi_timeout_ms: u64,
    pub health_timeout_ms: u64,
    /// TTL for responses whose departure is within three hours.
    pub route_cache_ttl_s: u64,
    /// TTL for responses departing further out.
    pub low_volatility_cache_ttl_s: u64,
    pub aqi_cache_ttl_s: u64,
    /// Road geometry with a larger gap between consecutive points is rejected.
    pub road_max_jump_m: f64,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must not be empty")]
    EmptyUrl(&'static str),
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 8000,
            road_provider_url: DEFAULT_ROAD_PROVIDER_URL.to_string(),
            aqi_provider_url: DEFAULT_AQI_PROVIDER_URL.to_string(),
            road_timeout_ms: 6_500,
            aqi_timeout_ms: 1_800,
            health_timeout_ms: 3_000,
            route_cache_ttl_s: 300,
            low_volatility_cache_ttl_s: 900,
            aqi_cache_ttl_s: 300,
            road_max_jump_m: 5_000.0,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env_parse("ECO_PORT", defaults.server_port),
            road_provider_url: env::var("ECO_ROAD_PROVIDER_URL")
                .unwrap_or(defaults.road_provider_url),
            aqi_provider_url: env::var("ECO_AQI_PROVIDER_URL")
                .unwrap_or(defaults.aqi_provider_url),
            road_timeout_ms: env_parse("ECO_ROAD_TIMEOUT_MS", defaults.road_timeout_ms),
            aqi_timeout_ms: env_parse("ECO_AQI_TIMEOUT_MS", defaults.aqi_timeout_ms),
            health_timeout_ms: env_parse("ECO_HEALTH_TIMEOUT_MS", defaults.health_timeout_ms),
            route_cache_ttl_s: env_parse("ECO_ROUTE_CACHE_TTL_S", defaults.route_cache_ttl_s),
            low_volatility_cache_ttl_s: env_parse(
                "ECO_LOW_VOLATILITY_CACHE_TTL_S",
                defaults.low_volatility_cache_ttl_s,
            ),
            aqi_cache_ttl_s: env_parse("ECO_AQI_CACHE_TTL_S", defaults.aqi_cache_ttl_s),
            road_max_jump_m: env_parse("ECO_ROAD_MAX_JUMP_M", defaults.road_max_jump_m),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.road_provider_url.trim().is_empty() {
            return Err(ConfigError::EmptyUrl("ECO_ROAD_PROVIDER_URL"));
        }
        if self.aqi_provider_url.trim().is_empty() {
            return Err(ConfigError::EmptyUrl("ECO_AQI_PROVIDER_URL"));
        }
        let positive = [
            ("ECO_ROAD_TIMEOUT_MS", self.road_timeout_ms),
            ("ECO_AQI_TIMEOUT_MS", self.aqi_timeout_ms),
            ("ECO_HEALTH_TIMEOUT_MS", self.health_timeout_ms),
            ("ECO_ROUTE_CACHE_TTL_S", self.route_cache_ttl_s),
            ("ECO_LOW_VOLATILITY_CACHE_TTL_S", self.low_volatility_cache_ttl_s),
            ("ECO_AQI_CACHE_TTL_S", self.aqi_cache_ttl_s),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(ConfigError::Zero(name));
            }
        }
        if self.road_max_jump_m.is_nan() || self.road_max_jump_m <= 0.0 {
            return Err(ConfigError::Zero("ECO_ROAD_MAX_JUMP_M"));
        }
        Ok(())
    }

    pub fn road_timeout(&self) -> Duration {
        Duration::from_millis(self.road_timeout_ms)
    }

    pub fn aqi_timeout(&self) -> Duration {
        Duration::from_millis(self.aqi_timeout_ms)
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_millis(self.health_timeout_ms)
    }
}

fn env_parse<T>(name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid {}={:?}, using {:?}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.road_timeout(), Duration::from_millis(6_500));
        assert_eq!(config.aqi_timeout(), Duration::from_millis(1_800));
    }

    #[test]
    fn validate_rejects_zero_and_empty() {
        let mut config = Config {
            aqi_timeout_ms: 0,
            ..Config::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::Zero("ECO_AQI_TIMEOUT_MS")));

        config.aqi_timeout_ms = 1_800;
        config.road_provider_url = "  ".to_string();
        assert_eq!(
            config.validate(),
            Err(ConfigError::EmptyUrl("ECO_ROAD_PROVIDER_URL"))
        );
    }

    #[test]
    fn env_parse_falls_back_on_garbage() {
        std::env::set_var("ECO_TEST_PARSE_GARBAGE", "not-a-number");
        assert_eq!(env_parse("ECO_TEST_PARSE_GARBAGE", 42u64), 42);
        std::env::set_var("ECO_TEST_PARSE_VALID", " 17 ");
        assert_eq!(env_parse("ECO_TEST_PARSE_VALID", 42u64), 17);
        assert_eq!(env_parse("ECO_TEST_PARSE_MISSING", 5u16), 5);
    }
}

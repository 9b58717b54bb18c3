//! Point air-quality client (Open-Meteo compatible) and the cached lookup
//! used while sampling routes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use eco_core::Coordinate;
use reqwest::Client;
use serde::Deserialize;

use crate::cache::TtlCache;
use crate::config::Config;

const PROBE_POINT: Coordinate = Coordinate::new(43.2380, 76.9456);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AqiResult {
    Ok(f64),
    Unavailable,
}

#[async_trait]
pub trait AirQualityProvider: Send + Sync {
    /// Current air-quality index at `point`.
    async fn current_aqi(&self, point: Coordinate) -> AqiResult;

    /// Minimal request used by the health check.
    async fn probe(&self) -> bool;
}

pub struct OpenMeteoClient {
    client: Client,
    base_url: String,
    timeout: Duration,
    probe_timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct OpenMeteoResponse {
    current: Option<OpenMeteoCurrent>,
}

#[derive(Debug, Deserialize)]
struct OpenMeteoCurrent {
    european_aqi: Option<f64>,
}

impl OpenMeteoClient {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            base_url: config.aqi_provider_url.clone(),
            timeout: config.aqi_timeout(),
            probe_timeout: config.health_timeout(),
        }
    }

    async fn fetch(
        &self,
        point: Coordinate,
        current: &str,
        timeout: Duration,
    ) -> Result<Option<f64>, String> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("latitude", point.lat.to_string()),
                ("longitude", point.lng.to_string()),
                ("current", current.to_string()),
            ])
            .timeout(timeout)
            .send()
            .await
            .map_err(|err| err.to_string())?;
        if !response.status().is_success() {
            return Err(format!("AQI provider HTTP {}", response.status()));
        }
        let payload: OpenMeteoResponse = response.json().await.map_err(|err| err.to_string())?;
        Ok(payload
            .current
            .and_then(|current| current.european_aqi)
            .filter(|value| value.is_finite()))
    }
}

#[async_trait]
impl AirQualityProvider for OpenMeteoClient {
    async fn current_aqi(&self, point: Coordinate) -> AqiResult {
        match self.fetch(point, "european_aqi,pm2_5", self.timeout).await {
            Ok(Some(value)) => AqiResult::Ok(value),
            Ok(None) => {
                tracing::debug!("AQI provider has no index for ({:.4}, {:.4})", point.lat, point.lng);
                AqiResult::Unavailable
            }
            Err(err) => {
                tracing::warn!("AQI provider unavailable: {}", err);
                AqiResult::Unavailable
            }
        }
    }

    async fn probe(&self) -> bool {
        match self.fetch(PROBE_POINT, "european_aqi", self.probe_timeout).await {
            Ok(value) => value.is_some(),
            Err(err) => {
                tracing::warn!("AQI provider probe failed: {}", err);
                false
            }
        }
    }
}

/// Air-quality lookups through the point cache.
///
/// Coordinates are rounded to two decimals for the cache key, so nearby
/// samples share one request. Only successful lookups are cached.
pub struct AirQualityLookup {
    provider: Arc<dyn AirQualityProvider>,
    cache: TtlCache<f64>,
    ttl: Duration,
}

impl AirQualityLookup {
    pub fn new(provider: Arc<dyn AirQualityProvider>, cache: TtlCache<f64>, ttl: Duration) -> Self {
        Self {
            provider,
            cache,
            ttl,
        }
    }

    pub fn cache_key(point: Coordinate, slot: &str) -> String {
        format!("{:.2}:{:.2}:{}", point.lat, point.lng, slot)
    }

    pub async fn aqi_at(&self, point: Coordinate, slot: &str) -> AqiResult {
        let key = Self::cache_key(point, slot);
        if let Some(value) = self.cache.get(&key) {
            return AqiResult::Ok(value);
        }

        let lock = self.cache.lock_for(&key);
        let _guard = lock.lock().await;
        if let Some(value) = self.cache.get(&key) {
            return AqiResult::Ok(value);
        }

        let result = self.provider.current_aqi(point).await;
        if let AqiResult::Ok(value) = result {
            self.cache.set(key, value, self.ttl);
        }
        result
    }

    pub fn cached_points(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: AtomicUsize,
        value: AqiResult,
    }

    #[async_trait]
    impl AirQualityProvider for CountingProvider {
        async fn current_aqi(&self, _point: Coordinate) -> AqiResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.value
        }

        async fn probe(&self) -> bool {
            true
        }
    }

    fn lookup(value: AqiResult) -> (AirQualityLookup, Arc<CountingProvider>) {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
            value,
        });
        let cache = TtlCache::new(Arc::new(SystemClock));
        (
            AirQualityLookup::new(provider.clone(), cache, Duration::from_secs(300)),
            provider,
        )
    }

    #[test]
    fn cache_key_quantizes_coordinates() {
        let a = AirQualityLookup::cache_key(Coordinate::new(43.2381, 76.9456), "slot");
        let b = AirQualityLookup::cache_key(Coordinate::new(43.2449, 76.9499), "slot");
        assert_eq!(a, "43.24:76.95:slot");
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn nearby_points_share_one_request() {
        let (lookup, provider) = lookup(AqiResult::Ok(72.0));
        let slot = "2026-10-18T08:00:00Z";
        assert_eq!(lookup.aqi_at(Coordinate::new(43.2381, 76.9456), slot).await, AqiResult::Ok(72.0));
        assert_eq!(lookup.aqi_at(Coordinate::new(43.2390, 76.9460), slot).await, AqiResult::Ok(72.0));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(lookup.cached_points(), 1);

        lookup.aqi_at(Coordinate::new(43.2381, 76.9456), "2026-10-18T08:05:00Z").await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let (lookup, provider) = lookup(AqiResult::Unavailable);
        let point = Coordinate::new(43.2381, 76.9456);
        assert_eq!(lookup.aqi_at(point, "s").await, AqiResult::Unavailable);
        assert_eq!(lookup.aqi_at(point, "s").await, AqiResult::Unavailable);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        assert_eq!(lookup.cached_points(), 0);
    }

    #[test]
    fn parses_current_index() {
        let payload: OpenMeteoResponse =
            serde_json::from_str(r#"{"current": {"time": "2026-10-18T08:00", "european_aqi": 41, "pm2_5": 9.1}}"#)
                .unwrap();
        assert_eq!(payload.current.and_then(|c| c.european_aqi), Some(41.0));

        let missing: OpenMeteoResponse = serde_json::from_str(r#"{"current": {"pm2_5": 9.1}}"#).unwrap();
        assert!(missing.current.and_then(|c| c.european_aqi).is_none());
    }
}

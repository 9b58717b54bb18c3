//! Upstream provider health.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::clock::Clock;
use crate::providers::{AirQualityProvider, RoadProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Degraded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    Up,
    Down,
}

impl From<bool> for Availability {
    fn from(up: bool) -> Self {
        if up {
            Availability::Up
        } else {
            Availability::Down
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderHealth {
    pub road: Availability,
    pub aqi: Availability,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub providers: ProviderHealth,
    pub timestamp: DateTime<Utc>,
}

/// Probe both providers concurrently. Uses the raw clients so the caches
/// are never read or written.
pub async fn check_providers(
    road: &dyn RoadProvider,
    air: &dyn AirQualityProvider,
    clock: &dyn Clock,
) -> HealthReport {
    let (road_up, aqi_up) = tokio::join!(road.probe(), air.probe());
    let status = if road_up && aqi_up {
        HealthStatus::Ok
    } else {
        tracing::warn!("Provider health degraded: road={} aqi={}", road_up, aqi_up);
        HealthStatus::Degraded
    };
    HealthReport {
        status,
        providers: ProviderHealth {
            road: road_up.into(),
            aqi: aqi_up.into(),
        },
        timestamp: clock.now(),
    }
}

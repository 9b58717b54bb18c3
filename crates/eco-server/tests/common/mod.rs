//! Fake providers and router wiring shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eco_core::candidates::build_candidates;
use eco_core::geo::{polyline_length_m, resample_polyline};
use eco_core::{Coordinate, RawRoute, RouteSource};
use eco_server::cache::TtlCache;
use eco_server::clock::ManualClock;
use eco_server::config::Config;
use eco_server::engine::{CacheTtls, EcoRouter};
use eco_server::providers::{AirQualityLookup, AirQualityProvider, AqiResult, RoadProvider, RoadRouteResult};

pub const ALMATY_START: Coordinate = Coordinate::new(43.2380, 76.9456);
pub const ALMATY_END: Coordinate = Coordinate::new(43.2022, 76.8933);

pub fn at(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .unwrap()
        .with_timezone(&Utc)
}

/// Road provider that answers each candidate with a densified copy of its
/// waypoints and a fixed duration chosen by candidate position.
pub struct ScriptedRoads {
    durations: Vec<f64>,
    available: bool,
    delay: Duration,
    pub calls: AtomicUsize,
}

impl ScriptedRoads {
    pub fn new(durations: &[f64]) -> Self {
        Self {
            durations: durations.to_vec(),
            available: true,
            delay: Duration::from_millis(20),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn down() -> Self {
        Self {
            available: false,
            ..Self::new(&[])
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RoadProvider for ScriptedRoads {
    async fn route(&self, waypoints: &[Coordinate]) -> RoadRouteResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        if !self.available || waypoints.len() < 2 {
            return RoadRouteResult::Unavailable;
        }

        let start = waypoints[0];
        let end = waypoints[waypoints.len() - 1];
        let position = build_candidates(start, end)
            .iter()
            .position(|candidate| candidate.as_slice() == waypoints)
            .unwrap_or(0);
        let polyline = resample_polyline(waypoints, 150.0);
        RoadRouteResult::Ok(RawRoute {
            distance_m: polyline_length_m(&polyline),
            duration_s: self.durations.get(position).copied().unwrap_or(1_500.0),
            polyline,
            source: RouteSource::Road,
            steps: Vec::new(),
        })
    }

    async fn probe(&self) -> bool {
        self.available
    }
}

/// Air-quality provider with a single fixed reading everywhere.
pub struct FixedAir {
    value: Option<f64>,
    pub calls: AtomicUsize,
}

impl FixedAir {
    pub fn new(value: f64) -> Self {
        Self {
            value: Some(value),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn down() -> Self {
        Self {
            value: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AirQualityProvider for FixedAir {
    async fn current_aqi(&self, _point: Coordinate) -> AqiResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(2)).await;
        match self.value {
            Some(value) => AqiResult::Ok(value),
            None => AqiResult::Unavailable,
        }
    }

    async fn probe(&self) -> bool {
        self.value.is_some()
    }
}

pub struct Harness {
    pub router: Arc<EcoRouter>,
    pub road: Arc<ScriptedRoads>,
    pub air: Arc<FixedAir>,
    pub clock: Arc<ManualClock>,
}

pub fn harness(road: ScriptedRoads, air: FixedAir, now: DateTime<Utc>) -> Harness {
    let config = Config::default();
    let road = Arc::new(road);
    let air = Arc::new(air);
    let clock = Arc::new(ManualClock::new(now));
    let lookup = AirQualityLookup::new(
        air.clone(),
        TtlCache::new(clock.clone()),
        Duration::from_secs(config.aqi_cache_ttl_s),
    );
    let router = EcoRouter::new(
        road.clone(),
        Arc::new(lookup),
        TtlCache::new(clock.clone()),
        clock.clone(),
        CacheTtls::from_config(&config),
    );
    Harness {
        router: Arc::new(router),
        road,
        air,
        clock,
    }
}

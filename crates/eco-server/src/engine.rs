//! Eco-routing orchestration: candidate fetch, environmental metrics,
//! scoring, response caching and degraded-mode fallback.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use eco_core::candidates::{build_candidates, dedupe_routes, estimated_routes};
use eco_core::geo::geohash;
use eco_core::metrics::{route_metrics, sample_points};
use eco_core::scoring::build_response;
use eco_core::{Coordinate, RawRoute, RouteMetrics, RoutingMode, RoutingRequest, RoutingResponse};
use futures::future::join_all;

use crate::cache::TtlCache;
use crate::clock::Clock;
use crate::config::Config;
use crate::providers::{AirQualityLookup, AqiResult, RoadProvider, RoadRouteResult};

const CACHE_KEY_GEOHASH_PRECISION: usize = 7;
const TIME_SLOT_SECONDS: i64 = 300;
/// Departures further out than this are cached with the low-volatility TTL.
const NEAR_TERM_HORIZON_HOURS: i64 = 3;

#[derive(Debug, Clone, Copy)]
pub struct CacheTtls {
    pub near_term: Duration,
    pub low_volatility: Duration,
}

impl CacheTtls {
    pub fn from_config(config: &Config) -> Self {
        Self {
            near_term: Duration::from_secs(config.route_cache_ttl_s),
            low_volatility: Duration::from_secs(config.low_volatility_cache_ttl_s),
        }
    }
}

pub struct EcoRouter {
    road: Arc<dyn RoadProvider>,
    air: Arc<AirQualityLookup>,
    cache: TtlCache<RoutingResponse>,
    clock: Arc<dyn Clock>,
    ttls: CacheTtls,
}

/// Start of the five-minute slot containing `at`, as RFC 3339 UTC.
pub fn time_slot(at: DateTime<Utc>) -> String {
    let secs = at.timestamp();
    let floored = secs - secs.rem_euclid(TIME_SLOT_SECONDS);
    DateTime::<Utc>::from_timestamp(floored, 0)
        .unwrap_or(at)
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl EcoRouter {
    pub fn new(
        road: Arc<dyn RoadProvider>,
        air: Arc<AirQualityLookup>,
        cache: TtlCache<RoutingResponse>,
        clock: Arc<dyn Clock>,
        ttls: CacheTtls,
    ) -> Self {
        Self {
            road,
            air,
            cache,
            clock,
            ttls,
        }
    }

    fn departure(&self, request: &RoutingRequest) -> DateTime<Utc> {
        request.departure_time.unwrap_or_else(|| self.clock.now())
    }

    pub fn cache_key(&self, request: &RoutingRequest) -> String {
        format!(
            "{}:{}:{}:{}",
            geohash(request.start, CACHE_KEY_GEOHASH_PRECISION),
            geohash(request.end, CACHE_KEY_GEOHASH_PRECISION),
            request.profile,
            time_slot(self.departure(request)),
        )
    }

    /// TTL for a freshly computed response.
    pub fn ttl_for(&self, departure: Option<DateTime<Utc>>) -> Duration {
        let Some(departure) = departure else {
            return self.ttls.near_term;
        };
        let lead = departure - self.clock.now();
        if lead <= chrono::Duration::hours(NEAR_TERM_HORIZON_HOURS) {
            self.ttls.near_term
        } else {
            self.ttls.low_volatility
        }
    }

    /// Ranked routes for `request`, served from cache when possible.
    ///
    /// The request must already be validated.
    pub async fn route(&self, request: &RoutingRequest) -> RoutingResponse {
        let key = self.cache_key(request);
        if let Some(cached) = self.cache.get(&key) {
            tracing::debug!("Route cache hit for {}", key);
            return cached;
        }

        let lock = self.cache.lock_for(&key);
        let _guard = lock.lock().await;
        if let Some(cached) = self.cache.get(&key) {
            tracing::debug!("Route cache filled while waiting for {}", key);
            return cached;
        }

        tracing::info!("Computing eco routes for {} ({})", key, request.profile);
        let slot = time_slot(self.departure(request));
        let response = self.compose(request, &slot).await;
        self.cache
            .set(key, response.clone(), self.ttl_for(request.departure_time));
        response
    }

    async fn compose(&self, request: &RoutingRequest, slot: &str) -> RoutingResponse {
        let road_routes = self.fetch_road_routes(request.start, request.end).await;
        let (mode, raw_routes) = if road_routes.is_empty() {
            tracing::warn!("Road provider unavailable for every candidate, using estimated routes");
            (RoutingMode::Estimated, estimated_routes(request.start, request.end))
        } else {
            (RoutingMode::Road, road_routes)
        };

        let metrics = join_all(raw_routes.iter().map(|route| self.measure(route, slot))).await;
        let degraded = metrics.iter().filter(|m| m.degraded).count();
        if degraded > 0 {
            tracing::warn!(
                "Air quality unavailable for {}/{} routes",
                degraded,
                metrics.len()
            );
        }

        let scored: Vec<(RawRoute, RouteMetrics)> = raw_routes.into_iter().zip(metrics).collect();
        build_response(scored, mode, request.profile)
    }

    /// Request every candidate concurrently and keep distinct shapes in
    /// candidate order.
    async fn fetch_road_routes(&self, start: Coordinate, end: Coordinate) -> Vec<RawRoute> {
        let candidates = build_candidates(start, end);
        let results = join_all(candidates.iter().map(|waypoints| self.road.route(waypoints))).await;
        let routes = results.into_iter().filter_map(|result| match result {
            RoadRouteResult::Ok(route) => Some(route),
            RoadRouteResult::Unavailable => None,
        });
        let kept = dedupe_routes(routes);
        tracing::debug!("{} candidates, {} distinct road routes", candidates.len(), kept.len());
        kept
    }

    /// Sample air quality along `route`. Gives up as soon as the first
    /// lookup fails without any earlier success.
    async fn measure(&self, route: &RawRoute, slot: &str) -> RouteMetrics {
        let sampled = sample_points(&route.polyline);
        let mut values = Vec::with_capacity(sampled.len());
        for point in &sampled {
            match self.air.aqi_at(*point, slot).await {
                AqiResult::Ok(value) => values.push(value),
                AqiResult::Unavailable if values.is_empty() => break,
                AqiResult::Unavailable => {}
            }
        }
        route_metrics(route, &sampled, &values)
    }

    pub fn cached_responses(&self) -> usize {
        self.cache.len()
    }
}

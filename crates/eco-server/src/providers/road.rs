//! Turn-by-turn road routing client (OSRM-compatible).

use std::time::Duration;

use async_trait::async_trait;
use eco_core::geo::{max_jump_m, polyline_length_m};
use eco_core::instructions::{describe_maneuver, format_distance};
use eco_core::{Coordinate, RawRoute, RouteSource, RouteStep};
use reqwest::Client;
use serde::Deserialize;

use crate::config::Config;

/// Steps kept from a provider response.
const MAX_STEPS: usize = 8;

/// Two fixed points in Almaty used for the health probe.
const PROBE_WAYPOINTS: [Coordinate; 2] = [
    Coordinate::new(43.2380, 76.9456),
    Coordinate::new(43.2022, 76.8933),
];

#[derive(Debug, Clone, PartialEq)]
pub enum RoadRouteResult {
    Ok(RawRoute),
    Unavailable,
}

#[async_trait]
pub trait RoadProvider: Send + Sync {
    /// Route through `waypoints` in order (at least two points).
    async fn route(&self, waypoints: &[Coordinate]) -> RoadRouteResult;

    /// Minimal request used by the health check.
    async fn probe(&self) -> bool;
}

pub struct OsrmClient {
    client: Client,
    base_url: String,
    timeout: Duration,
    probe_timeout: Duration,
    max_jump_m: f64,
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    geometry: Option<OsrmGeometry>,
    distance: Option<f64>,
    duration: Option<f64>,
    #[serde(default)]
    legs: Vec<OsrmLeg>,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    /// GeoJSON order: `[lng, lat]`.
    #[serde(default)]
    coordinates: Vec<Vec<f64>>,
}

#[derive(Debug, Deserialize)]
struct OsrmLeg {
    #[serde(default)]
    steps: Vec<OsrmStep>,
}

#[derive(Debug, Deserialize)]
struct OsrmStep {
    name: Option<String>,
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
    #[serde(default)]
    maneuver: OsrmManeuver,
}

#[derive(Debug, Default, Deserialize)]
struct OsrmManeuver {
    #[serde(rename = "type")]
    kind: Option<String>,
    modifier: Option<String>,
}

impl OsrmClient {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            base_url: config.road_provider_url.trim_end_matches('/').to_string(),
            timeout: config.road_timeout(),
            probe_timeout: config.health_timeout(),
            max_jump_m: config.road_max_jump_m,
        }
    }

    fn route_url(&self, waypoints: &[Coordinate], query: &str) -> String {
        let coords = waypoints
            .iter()
            .map(|p| format!("{:.6},{:.6}", p.lng, p.lat))
            .collect::<Vec<_>>()
            .join(";");
        format!("{}/{}?{}", self.base_url, coords, query)
    }

    async fn fetch(&self, url: String, timeout: Duration) -> Result<OsrmResponse, String> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|err| err.to_string())?;
        if !response.status().is_success() {
            return Err(format!("road provider HTTP {}", response.status()));
        }
        response
            .json::<OsrmResponse>()
            .await
            .map_err(|err| err.to_string())
    }
}

#[async_trait]
impl RoadProvider for OsrmClient {
    async fn route(&self, waypoints: &[Coordinate]) -> RoadRouteResult {
        if waypoints.len() < 2 {
            return RoadRouteResult::Unavailable;
        }
        let url = self.route_url(
            waypoints,
            "overview=full&geometries=geojson&alternatives=false&steps=true",
        );
        tracing::debug!("Road provider request with {} waypoints", waypoints.len());

        let payload = match self.fetch(url, self.timeout).await {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!("Road provider unavailable: {}", err);
                return RoadRouteResult::Unavailable;
            }
        };

        match parse_route(payload, self.max_jump_m) {
            Some(route) => RoadRouteResult::Ok(route),
            None => {
                tracing::warn!("Road provider returned an unusable route");
                RoadRouteResult::Unavailable
            }
        }
    }

    async fn probe(&self) -> bool {
        let url = self.route_url(&PROBE_WAYPOINTS, "overview=false&steps=false");
        match self.fetch(url, self.probe_timeout).await {
            Ok(payload) => payload.code.as_deref() == Some("Ok"),
            Err(err) => {
                tracing::warn!("Road provider probe failed: {}", err);
                false
            }
        }
    }
}

fn parse_route(payload: OsrmResponse, max_jump: f64) -> Option<RawRoute> {
    if payload.code.as_deref() != Some("Ok") {
        return None;
    }
    let route = payload.routes.into_iter().next()?;
    let polyline: Vec<Coordinate> = route
        .geometry
        .map(|geometry| geometry.coordinates)
        .unwrap_or_default()
        .into_iter()
        .filter(|pair| pair.len() >= 2)
        .map(|pair| Coordinate::new(pair[1], pair[0]))
        .collect();
    if polyline.len() < 2 {
        return None;
    }
    let jump = max_jump_m(&polyline);
    if jump > max_jump {
        tracing::warn!("Rejecting road geometry with a {:.0} m gap", jump);
        return None;
    }

    let steps = route
        .legs
        .iter()
        .flat_map(|leg| leg.steps.iter())
        .take(MAX_STEPS)
        .map(|step| RouteStep {
            instruction: describe_maneuver(
                step.maneuver.kind.as_deref(),
                step.maneuver.modifier.as_deref(),
                step.name.as_deref(),
            ),
            distance_m: step.distance.round() as i64,
            duration_s: step.duration.round() as i64,
            distance_text: format_distance(step.distance),
        })
        .collect();

    Some(RawRoute {
        distance_m: route
            .distance
            .unwrap_or_else(|| polyline_length_m(&polyline)),
        duration_s: route.duration.unwrap_or(0.0),
        polyline,
        source: RouteSource::Road,
        steps,
    })
}

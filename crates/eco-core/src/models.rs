//! Core data models for eco-aware routing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A WGS84 latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinateError {
    #[error("coordinate is not finite ({lat}, {lng})")]
    NotFinite { lat: f64, lng: f64 },
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

impl Coordinate {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Reject NaN/infinite values and anything outside the WGS84 ranges.
    pub fn validate(&self) -> Result<(), CoordinateError> {
        if !self.lat.is_finite() || !self.lng.is_finite() {
            return Err(CoordinateError::NotFinite {
                lat: self.lat,
                lng: self.lng,
            });
        }
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(CoordinateError::LatitudeOutOfRange(self.lat));
        }
        if !(-180.0..=180.0).contains(&self.lng) {
            return Err(CoordinateError::LongitudeOutOfRange(self.lng));
        }
        Ok(())
    }

    pub fn as_pair(&self) -> [f64; 2] {
        [self.lat, self.lng]
    }
}

/// Routing preference selected by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Profile {
    #[serde(rename = "time-first", alias = "traffic")]
    TimeFirst,
    #[default]
    #[serde(rename = "balanced")]
    Balanced,
    #[serde(rename = "air-first", alias = "air")]
    AirFirst,
}

impl Profile {
    pub const ALL: [Profile; 3] = [Profile::TimeFirst, Profile::Balanced, Profile::AirFirst];

    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::TimeFirst => "time-first",
            Profile::Balanced => "balanced",
            Profile::AirFirst => "air-first",
        }
    }

    /// Composite score weights; each triple sums to 1.0.
    pub fn weights(&self) -> ProfileWeights {
        match self {
            Profile::TimeFirst => ProfileWeights {
                time: 0.70,
                aqi: 0.20,
                co2: 0.10,
            },
            Profile::Balanced => ProfileWeights {
                time: 0.45,
                aqi: 0.35,
                co2: 0.20,
            },
            Profile::AirFirst => ProfileWeights {
                time: 0.20,
                aqi: 0.60,
                co2: 0.20,
            },
        }
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown profile {0:?} (expected time-first, balanced or air-first)")]
pub struct UnknownProfile(pub String);

impl std::str::FromStr for Profile {
    type Err = UnknownProfile;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "time-first" | "traffic" => Ok(Profile::TimeFirst),
            "balanced" => Ok(Profile::Balanced),
            "air-first" | "air" => Ok(Profile::AirFirst),
            _ => Err(UnknownProfile(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileWeights {
    pub time: f64,
    pub aqi: f64,
    pub co2: f64,
}

/// An eco-routing query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingRequest {
    pub start: Coordinate,
    pub end: Coordinate,
    #[serde(default)]
    pub profile: Profile,
    /// Defaults to "now" when absent.
    #[serde(default)]
    pub departure_time: Option<DateTime<Utc>>,
}

impl RoutingRequest {
    pub fn new(start: Coordinate, end: Coordinate, profile: Profile) -> Self {
        Self {
            start,
            end,
            profile,
            departure_time: None,
        }
    }

    pub fn validate(&self) -> Result<(), CoordinateError> {
        self.start.validate()?;
        self.end.validate()
    }
}

/// Where a route's geometry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteSource {
    /// Returned by the turn-by-turn road provider.
    Road,
    /// Synthesized locally because the road provider was unavailable.
    Estimated,
}

/// Overall response mode; mirrors the source of every route in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutingMode {
    Road,
    Estimated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthRisk {
    Low,
    Moderate,
    High,
    VeryHigh,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteRole {
    Recommended,
    Alternative,
}

/// One human-readable navigation instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStep {
    pub instruction: String,
    pub distance_m: i64,
    pub duration_s: i64,
    pub distance_text: String,
}

/// A candidate route before any environmental enrichment.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRoute {
    pub polyline: Vec<Coordinate>,
    pub distance_m: f64,
    pub duration_s: f64,
    pub source: RouteSource,
    pub steps: Vec<RouteStep>,
}

/// Environmental metrics derived for a single route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteMetrics {
    pub avg_traffic: i32,
    pub avg_aqi: i32,
    /// Time-weighted AQI exposure in AQI·seconds.
    pub aqi_exposure: f64,
    pub co2_g: f64,
    pub aqi_profile: Vec<i32>,
    /// No air-quality sample could be obtained for this route.
    pub degraded: bool,
}

/// Differences relative to the minimum-duration route of the same response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareFastest {
    pub delta_time_s: i64,
    pub delta_aqi_exposure: i64,
    pub delta_co2_g: i64,
}

/// A scored route as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRoute {
    pub id: String,
    #[serde(rename = "type")]
    pub role: RouteRole,
    pub source: RouteSource,
    pub mode: RoutingMode,
    pub polyline: Vec<[f64; 2]>,
    pub distance_m: i64,
    pub eta_s: i64,
    pub avg_traffic: i32,
    pub avg_aqi: i32,
    pub aqi_exposure: f64,
    pub co2_g: f64,
    pub eco_score: i32,
    pub compare_fastest: CompareFastest,
    pub health_risk: HealthRisk,
    pub explanation: String,
    pub degraded: bool,
    pub aqi_profile: Vec<i32>,
    pub steps: Vec<RouteStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingResponse {
    pub status: String,
    pub mode: RoutingMode,
    /// True only when every route is degraded.
    pub degraded: bool,
    pub routes: Vec<EnrichedRoute>,
}

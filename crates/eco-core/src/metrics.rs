//! Traffic, emission and air-quality exposure estimates for a route.

use crate::geo::{haversine_m, resample_polyline};
use crate::models::{Coordinate, HealthRisk, RawRoute, RouteMetrics};

/// Spacing used when resampling a polyline for air-quality lookups.
pub const AQI_SAMPLE_STEP_M: f64 = 220.0;
/// Maximum number of air-quality lookups per route (plus the forced endpoint).
pub const MAX_AQI_SAMPLES: usize = 6;
const AQI_PROFILE_LIMIT: usize = 120;

const FREE_FLOW_SPEED_KMH: f64 = 52.0;
const TRAFFIC_BASE: f64 = 22.0;
const TRAFFIC_RATIO_GAIN: f64 = 88.0;
const TURN_PENALTY_MAX: f64 = 18.0;
const POINTS_PER_TURN_PENALTY: f64 = 45.0;
pub const TRAFFIC_MIN: i32 = 8;
pub const TRAFFIC_MAX: i32 = 96;

const BASE_CO2_G_PER_KM: f64 = 168.0;
const STOP_GO_DIVISOR: f64 = 150.0;

/// Upper bounds (exclusive) for the low, moderate and high risk bands.
pub const HEALTH_RISK_LOW: f64 = 50.0;
pub const HEALTH_RISK_MODERATE: f64 = 100.0;
pub const HEALTH_RISK_HIGH: f64 = 150.0;

/// Representative points of `polyline` to query air quality at.
pub fn sample_points(polyline: &[Coordinate]) -> Vec<Coordinate> {
    let sampled = resample_polyline(polyline, AQI_SAMPLE_STEP_M);
    if sampled.len() <= MAX_AQI_SAMPLES {
        return sampled;
    }
    let stride = sampled.len().div_ceil(MAX_AQI_SAMPLES);
    let mut thinned: Vec<Coordinate> = sampled.iter().step_by(stride).copied().collect();
    if let Some(last) = polyline.last() {
        if thinned.last() != Some(last) {
            thinned.push(*last);
        }
    }
    thinned
}

/// Congestion index in [8, 96] from the slowdown versus free flow and the
/// polyline density (a proxy for how often the route turns).
pub fn estimate_traffic(distance_m: f64, duration_s: f64, polyline_points: usize) -> i32 {
    let free_flow_s = (distance_m / 1000.0) / FREE_FLOW_SPEED_KMH * 3600.0;
    let ratio = duration_s / free_flow_s.max(1.0);
    let turn_penalty = (polyline_points as f64 / POINTS_PER_TURN_PENALTY).min(TURN_PENALTY_MAX);
    let raw = TRAFFIC_BASE + (ratio - 1.0) * TRAFFIC_RATIO_GAIN + turn_penalty;
    (raw.round() as i32).clamp(TRAFFIC_MIN, TRAFFIC_MAX)
}

/// Grams of CO2, with a stop-and-go multiplier that grows with congestion.
pub fn estimate_co2_g(distance_m: f64, traffic: i32) -> f64 {
    let distance_km = (distance_m / 1000.0).max(0.0);
    let stop_go = 1.0 + traffic as f64 / STOP_GO_DIVISOR;
    (distance_km * BASE_CO2_G_PER_KM * stop_go).max(0.0)
}

/// Time-weighted AQI exposure (AQI·seconds) along the sampled points.
///
/// Each sampled segment receives a share of `duration_s` proportional to its
/// length and is charged the AQI of the matching sample (the last sample is
/// reused when fewer values than segments are available).
pub fn exposure(sampled: &[Coordinate], aqi_values: &[f64], duration_s: f64) -> f64 {
    if sampled.len() < 2 || aqi_values.is_empty() {
        return 0.0;
    }
    let segments: Vec<f64> = sampled
        .windows(2)
        .map(|pair| haversine_m(pair[0], pair[1]))
        .collect();
    let total: f64 = segments.iter().sum();
    if total <= 0.0 {
        return mean(aqi_values) * duration_s;
    }
    segments
        .iter()
        .enumerate()
        .map(|(idx, seg)| {
            let aqi = aqi_values[idx.min(aqi_values.len() - 1)];
            aqi * duration_s * (seg / total)
        })
        .sum()
}

pub fn health_risk(avg_aqi: f64, degraded: bool) -> HealthRisk {
    if degraded {
        HealthRisk::Unknown
    } else if avg_aqi < HEALTH_RISK_LOW {
        HealthRisk::Low
    } else if avg_aqi < HEALTH_RISK_MODERATE {
        HealthRisk::Moderate
    } else if avg_aqi < HEALTH_RISK_HIGH {
        HealthRisk::High
    } else {
        HealthRisk::VeryHigh
    }
}

/// Assemble the metrics for `route` from the AQI values obtained at `sampled`.
///
/// An empty `aqi_values` marks the route as degraded: exposure is zero and
/// the average AQI is reported as zero.
pub fn route_metrics(route: &RawRoute, sampled: &[Coordinate], aqi_values: &[f64]) -> RouteMetrics {
    let degraded = aqi_values.is_empty();
    let avg_aqi = if degraded { 0.0 } else { mean(aqi_values) };
    let aqi_exposure = exposure(sampled, aqi_values, route.duration_s);
    let avg_traffic = estimate_traffic(route.distance_m, route.duration_s, route.polyline.len());
    let co2_g = estimate_co2_g(route.distance_m, avg_traffic);

    RouteMetrics {
        avg_traffic,
        avg_aqi: avg_aqi.round() as i32,
        aqi_exposure: aqi_exposure.round(),
        co2_g: co2_g.round(),
        aqi_profile: aqi_values
            .iter()
            .take(AQI_PROFILE_LIMIT)
            .map(|v| v.round() as i32)
            .collect(),
        degraded,
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

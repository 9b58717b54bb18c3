//! Candidate waypoint generation, shape deduplication and estimated fallback routes.

use std::collections::HashSet;

use crate::geo::{haversine_m, interpolate, perpendicular_offset, polyline_length_m};
use crate::instructions::format_distance;
use crate::models::{Coordinate, RawRoute, RouteSource, RouteStep};

const DETOUR_OFFSET_RATIO: f64 = 0.16;
const MIN_DETOUR_OFFSET_M: f64 = 450.0;
const MAX_DETOUR_OFFSET_M: f64 = 1500.0;
/// Trips longer than this get the extra quarter-point detours.
const LONG_TRIP_M: f64 = 11_000.0;
const QUARTER_FRACTION: f64 = 0.35;
const THREE_QUARTER_FRACTION: f64 = 0.7;
const ALT_VIA_SCALE: f64 = 0.8;
const QUARTER_OFFSET_SCALE: f64 = 0.5;

/// Upper bound on distinct road routes kept per request.
pub const MAX_ROUTES: usize = 5;
const SHAPE_HASH_SAMPLES: usize = 12;

pub const ESTIMATED_VARIANTS: usize = 3;
const ESTIMATED_OFFSET_STEP_M: f64 = 700.0;
const ESTIMATED_BASE_SPEED_KMH: f64 = 38.0;
const ESTIMATED_SPEED_DECREMENT_KMH: f64 = 2.5;
const ESTIMATED_MIN_SPEED_KMH: f64 = 18.0;

/// Perpendicular detour distance, proportional to trip length.
pub fn detour_offset_m(start: Coordinate, end: Coordinate) -> f64 {
    (haversine_m(start, end) * DETOUR_OFFSET_RATIO).clamp(MIN_DETOUR_OFFSET_M, MAX_DETOUR_OFFSET_M)
}

/// Build the waypoint sequences to request from the road provider.
///
/// Always returns the direct pair followed by a left and a right midpoint
/// detour; trips beyond 11 km get two more four-point candidates.
pub fn build_candidates(start: Coordinate, end: Coordinate) -> Vec<Vec<Coordinate>> {
    let trip_m = haversine_m(start, end);
    let offset = detour_offset_m(start, end);

    let via_left = perpendicular_offset(start, end, offset);
    let via_right = perpendicular_offset(start, end, -offset);
    let mut candidates = vec![
        vec![start, end],
        vec![start, via_left, end],
        vec![start, via_right, end],
    ];

    if trip_m > LONG_TRIP_M {
        let via_alt = perpendicular_offset(start, end, -offset * ALT_VIA_SCALE);
        let quarter = interpolate(start, end, QUARTER_FRACTION);
        let three_quarter = interpolate(start, end, THREE_QUARTER_FRACTION);
        let q1 = perpendicular_offset(quarter, three_quarter, offset * QUARTER_OFFSET_SCALE);
        let q2 = perpendicular_offset(quarter, three_quarter, -offset * QUARTER_OFFSET_SCALE);
        candidates.push(vec![start, q1, via_left, end]);
        candidates.push(vec![start, q2, via_alt, end]);
    }

    candidates
}

/// Coarse fingerprint of a polyline's shape.
///
/// Roughly twelve evenly spaced points (plus the final point) rounded to four
/// decimals. Returns an empty string for degenerate polylines.
pub fn shape_hash(polyline: &[Coordinate]) -> String {
    if polyline.len() < 2 {
        return String::new();
    }
    let step = (polyline.len() / SHAPE_HASH_SAMPLES).max(1);
    let mut sampled: Vec<Coordinate> = polyline.iter().step_by(step).copied().collect();
    let last = polyline[polyline.len() - 1];
    if sampled.last() != Some(&last) {
        sampled.push(last);
    }
    sampled
        .iter()
        .map(|p| format!("{:.4},{:.4}", p.lat, p.lng))
        .collect::<Vec<_>>()
        .join("|")
}

/// Drop routes whose shape hash was already seen, keeping first occurrences.
pub fn dedupe_routes<I>(routes: I) -> Vec<RawRoute>
where
    I: IntoIterator<Item = RawRoute>,
{
    let mut seen = HashSet::new();
    let mut kept = Vec::new();
    for route in routes {
        let hash = shape_hash(&route.polyline);
        if hash.is_empty() || !seen.insert(hash) {
            continue;
        }
        kept.push(route);
        if kept.len() >= MAX_ROUTES {
            break;
        }
    }
    kept
}

/// Synthesize a straight-line route through an offset midpoint.
pub fn estimated_route(start: Coordinate, end: Coordinate, variant: usize) -> RawRoute {
    let offset = (variant as f64 - 1.0) * ESTIMATED_OFFSET_STEP_M;
    let via = perpendicular_offset(start, end, offset);
    let polyline = vec![start, via, end];
    let distance_m = polyline_length_m(&polyline);
    let speed_kmh = (ESTIMATED_BASE_SPEED_KMH - variant as f64 * ESTIMATED_SPEED_DECREMENT_KMH)
        .max(ESTIMATED_MIN_SPEED_KMH);
    let duration_s = (distance_m / 1000.0) / speed_kmh * 3600.0;

    let leg_duration = (duration_s / 2.0).round() as i64;
    let first_leg = haversine_m(start, via);
    let second_leg = haversine_m(via, end);
    let steps = vec![
        RouteStep {
            instruction: "Start route".to_string(),
            distance_m: first_leg.round() as i64,
            duration_s: leg_duration,
            distance_text: format_distance(first_leg),
        },
        RouteStep {
            instruction: "Continue to destination".to_string(),
            distance_m: second_leg.round() as i64,
            duration_s: leg_duration,
            distance_text: format_distance(second_leg),
        },
        RouteStep {
            instruction: "Arrive at destination".to_string(),
            distance_m: 0,
            duration_s: 0,
            distance_text: format_distance(0.0),
        },
    ];

    RawRoute {
        polyline,
        distance_m,
        duration_s,
        source: RouteSource::Estimated,
        steps,
    }
}

/// Fallback route set used when the road provider fails for every candidate.
///
/// Rounded durations are forced apart by whole seconds when the geometry
/// happens to make two variants tie.
pub fn estimated_routes(start: Coordinate, end: Coordinate) -> Vec<RawRoute> {
    let mut routes: Vec<RawRoute> = (0..ESTIMATED_VARIANTS)
        .map(|variant| estimated_route(start, end, variant))
        .collect();

    let mut used: HashSet<i64> = HashSet::new();
    for route in &mut routes {
        let mut rounded = route.duration_s.round() as i64;
        while !used.insert(rounded) {
            rounded += 1;
        }
        if rounded != route.duration_s.round() as i64 {
            route.duration_s = rounded as f64;
        }
    }
    routes
}

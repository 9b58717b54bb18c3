//! Spatial math for route geometry and cache-key quantization.

use crate::models::Coordinate;

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Flat-earth scale used for local offsets (meters per degree of latitude).
const METERS_PER_DEG: f64 = 111_320.0;
const MIN_COS_LAT: f64 = 0.1;

const GEOHASH_BASE32: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// Great-circle distance between two coordinates in meters.
pub fn haversine_m(a: Coordinate, b: Coordinate) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let dphi = (b.lat - a.lat).to_radians();
    let dlambda = (b.lng - a.lng).to_radians();
    let h = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).sqrt())
}

pub fn polyline_length_m(points: &[Coordinate]) -> f64 {
    points
        .windows(2)
        .map(|pair| haversine_m(pair[0], pair[1]))
        .sum()
}

/// Largest distance between consecutive points; large values mean broken geometry.
pub fn max_jump_m(points: &[Coordinate]) -> f64 {
    points
        .windows(2)
        .map(|pair| haversine_m(pair[0], pair[1]))
        .fold(0.0, f64::max)
}

/// Linear interpolation between two coordinates (`fraction` in [0, 1]).
pub fn interpolate(start: Coordinate, end: Coordinate, fraction: f64) -> Coordinate {
    Coordinate::new(
        start.lat + (end.lat - start.lat) * fraction,
        start.lng + (end.lng - start.lng) * fraction,
    )
}

/// Resample a polyline every `step_m` meters of travelled distance.
///
/// The first and last points are always kept. A polyline shorter than one
/// step collapses to its two endpoints.
pub fn resample_polyline(points: &[Coordinate], step_m: f64) -> Vec<Coordinate> {
    if points.len() < 2 || step_m <= 0.0 {
        return points.to_vec();
    }

    let mut cumulative = Vec::with_capacity(points.len());
    cumulative.push(0.0);
    for pair in points.windows(2) {
        let last = cumulative.last().copied().unwrap_or(0.0);
        cumulative.push(last + haversine_m(pair[0], pair[1]));
    }

    let total = cumulative[cumulative.len() - 1];
    if total <= step_m {
        return vec![points[0], points[points.len() - 1]];
    }

    let mut targets = vec![0.0];
    let mut cursor = step_m;
    while cursor < total {
        targets.push(cursor);
        cursor += step_m;
    }
    targets.push(total);

    let mut sampled = Vec::with_capacity(targets.len());
    let mut segment_idx = 1;
    for target in targets {
        while segment_idx < cumulative.len() && cumulative[segment_idx] < target {
            segment_idx += 1;
        }
        if segment_idx >= cumulative.len() {
            sampled.push(points[points.len() - 1]);
            continue;
        }
        let prev_dist = cumulative[segment_idx - 1];
        let next_dist = cumulative[segment_idx];
        if next_dist <= prev_dist {
            sampled.push(points[segment_idx]);
            continue;
        }
        let ratio = (target - prev_dist) / (next_dist - prev_dist);
        sampled.push(interpolate(points[segment_idx - 1], points[segment_idx], ratio));
    }
    sampled
}

/// Midpoint of `start`→`end`, shifted `offset_m` meters perpendicular to it.
///
/// Positive offsets go to the left of the direction of travel. Uses a local
/// equirectangular projection, which is accurate enough for detours of a few
/// kilometers.
pub fn perpendicular_offset(start: Coordinate, end: Coordinate, offset_m: f64) -> Coordinate {
    let mid = interpolate(start, end, 0.5);
    let cos_lat = mid.lat.to_radians().cos().max(MIN_COS_LAT);

    let vx = (end.lng - start.lng) * METERS_PER_DEG * cos_lat;
    let vy = (end.lat - start.lat) * METERS_PER_DEG;
    let norm = vx.hypot(vy);
    if norm < 1.0 {
        return mid;
    }

    let px = -vy / norm;
    let py = vx / norm;
    Coordinate::new(
        mid.lat + py * offset_m / METERS_PER_DEG,
        mid.lng + px * offset_m / (METERS_PER_DEG * cos_lat),
    )
}

/// Standard base-32 geohash of `coord` with `precision` characters.
pub fn geohash(coord: Coordinate, precision: usize) -> String {
    let mut lat_range = (-90.0_f64, 90.0_f64);
    let mut lng_range = (-180.0_f64, 180.0_f64);
    let mut hash = String::with_capacity(precision);
    let mut even = true;
    let mut bit = 0;
    let mut ch = 0usize;

    while hash.len() < precision {
        if even {
            let mid = (lng_range.0 + lng_range.1) / 2.0;
            if coord.lng > mid {
                ch |= 1 << (4 - bit);
                lng_range.0 = mid;
            } else {
                lng_range.1 = mid;
            }
        } else {
            let mid = (lat_range.0 + lat_range.1) / 2.0;
            if coord.lat > mid {
                ch |= 1 << (4 - bit);
                lat_range.0 = mid;
            } else {
                lat_range.1 = mid;
            }
        }
        even = !even;
        if bit < 4 {
            bit += 1;
        } else {
            hash.push(GEOHASH_BASE32[ch] as char);
            bit = 0;
            ch = 0;
        }
    }
    hash
}

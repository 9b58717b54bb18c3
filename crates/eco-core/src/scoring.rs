//! Composite scoring and ranking of enriched routes.

use crate::metrics::health_risk;
use crate::models::{
    CompareFastest, EnrichedRoute, HealthRisk, Profile, ProfileWeights, RawRoute, RouteMetrics,
    RouteRole, RoutingMode, RoutingResponse,
};

const ECO_SCORE_BASELINE: f64 = 82.0;
const ECO_SCORE_SLOPE: f64 = 95.0;

/// Weighted sum of time, exposure and CO2, each normalized against the
/// fastest route. A degraded route gets a neutral exposure term of 1.0.
pub fn composite_score(route: &EnrichedRoute, fastest: &EnrichedRoute, weights: ProfileWeights) -> f64 {
    let time_norm = route.eta_s as f64 / (fastest.eta_s as f64).max(1.0);
    let co2_norm = route.co2_g / fastest.co2_g.max(1.0);
    let aqi_norm = if route.degraded {
        1.0
    } else {
        route.aqi_exposure / fastest.aqi_exposure.max(1.0)
    };
    weights.time * time_norm + weights.aqi * aqi_norm + weights.co2 * co2_norm
}

/// Display score in [1, 99]; 82 means "as good as the fastest route".
pub fn eco_score(composite: f64) -> i32 {
    let score = ECO_SCORE_BASELINE - (composite - 1.0) * ECO_SCORE_SLOPE;
    (score.round() as i32).clamp(1, 99)
}

pub fn explanation(route: &EnrichedRoute, role: RouteRole) -> String {
    let mode_phrase = match route.mode {
        RoutingMode::Road => "Road-verified",
        RoutingMode::Estimated => "Estimated",
    };
    match role {
        RouteRole::Recommended if route.degraded => {
            format!("{mode_phrase} eco route selected while AQI feed is degraded")
        }
        RouteRole::Recommended if route.compare_fastest.delta_time_s > 0 => {
            format!("{mode_phrase} cleanest route with moderate delay")
        }
        RouteRole::Recommended => format!("{mode_phrase} clean route with no additional delay"),
        RouteRole::Alternative if route.compare_fastest.delta_time_s < 0 => {
            "Fastest baseline option with higher environmental exposure".to_string()
        }
        RouteRole::Alternative => "Alternative road option with different eco/time trade-off".to_string(),
    }
}

/// Turn raw routes and their metrics into ranked, labeled routes.
///
/// Routes are numbered `r1..rN` in input order, compared against the first
/// route with the smallest duration, then stably sorted by composite score so
/// ties keep input order. The first route is the recommendation.
pub fn rank_routes(
    routes: Vec<(RawRoute, RouteMetrics)>,
    mode: RoutingMode,
    profile: Profile,
) -> Vec<EnrichedRoute> {
    let mut enriched: Vec<EnrichedRoute> = routes
        .into_iter()
        .enumerate()
        .map(|(idx, (raw, metrics))| enrich(idx, raw, metrics, mode))
        .collect();

    let Some(fastest) = fastest_index(&enriched).map(|idx| enriched[idx].clone()) else {
        return enriched;
    };

    let weights = profile.weights();
    for route in &mut enriched {
        route.compare_fastest = CompareFastest {
            delta_time_s: route.eta_s - fastest.eta_s,
            delta_aqi_exposure: if route.degraded {
                0
            } else {
                (route.aqi_exposure - fastest.aqi_exposure) as i64
            },
            delta_co2_g: (route.co2_g - fastest.co2_g) as i64,
        };
    }

    let mut scored: Vec<(f64, EnrichedRoute)> = enriched
        .into_iter()
        .map(|route| (composite_score(&route, &fastest, weights), route))
        .collect();
    scored.sort_by(|a, b| a.0.total_cmp(&b.0));

    scored
        .into_iter()
        .enumerate()
        .map(|(rank, (composite, mut route))| {
            route.role = if rank == 0 {
                RouteRole::Recommended
            } else {
                RouteRole::Alternative
            };
            route.eco_score = eco_score(composite);
            route.explanation = explanation(&route, route.role);
            route
        })
        .collect()
}

/// Rank the routes and wrap them in a response envelope.
pub fn build_response(
    routes: Vec<(RawRoute, RouteMetrics)>,
    mode: RoutingMode,
    profile: Profile,
) -> RoutingResponse {
    let routes = rank_routes(routes, mode, profile);
    let degraded = !routes.is_empty() && routes.iter().all(|route| route.degraded);
    RoutingResponse {
        status: "ok".to_string(),
        mode,
        degraded,
        routes,
    }
}

fn fastest_index(routes: &[EnrichedRoute]) -> Option<usize> {
    routes
        .iter()
        .enumerate()
        .min_by_key(|(idx, route)| (route.eta_s, *idx))
        .map(|(idx, _)| idx)
}

fn enrich(idx: usize, raw: RawRoute, metrics: RouteMetrics, mode: RoutingMode) -> EnrichedRoute {
    let health = if metrics.degraded {
        HealthRisk::Unknown
    } else {
        health_risk(metrics.avg_aqi as f64, false)
    };
    EnrichedRoute {
        id: format!("r{}", idx + 1),
        role: RouteRole::Alternative,
        source: raw.source,
        mode,
        polyline: raw.polyline.iter().map(|p| p.as_pair()).collect(),
        distance_m: raw.distance_m.round() as i64,
        eta_s: raw.duration_s.round() as i64,
        avg_traffic: metrics.avg_traffic,
        avg_aqi: metrics.avg_aqi,
        aqi_exposure: metrics.aqi_exposure,
        co2_g: metrics.co2_g,
        eco_score: 0,
        compare_fastest: CompareFastest::default(),
        health_risk: health,
        explanation: String::new(),
        degraded: metrics.degraded,
        aqi_profile: metrics.aqi_profile,
        steps: raw.steps,
    }
}

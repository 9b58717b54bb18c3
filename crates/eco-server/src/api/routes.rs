//! REST API routes.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use eco_core::metrics::{HEALTH_RISK_HIGH, HEALTH_RISK_LOW, HEALTH_RISK_MODERATE};
use eco_core::{Profile, RoutingRequest};
use serde_json::{json, Map, Value};

use crate::health::{check_providers, HealthReport};
use crate::state::AppState;

/// Feature switches advertised to clients.
const FEATURE_FLAGS: [(&str, bool); 3] = [
    ("ECO_ROUTING_V2", true),
    ("AQI_EXPOSURE_SCORING", true),
    ("ROAD_CANDIDATE_DEDUP", true),
];

pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/routing/eco", post(eco_route))
        .route("/routing/config", get(routing_config))
        .route("/routing/health", get(routing_health))
}

async fn eco_route(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RoutingRequest>,
) -> Response {
    if let Err(err) = request.validate() {
        tracing::debug!("Rejecting routing request: {}", err);
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": err.to_string(),
                "hint": "lat must be within [-90, 90], lng within [-180, 180]"
            })),
        )
            .into_response();
    }

    let response = state.router().route(&request).await;
    Json(response).into_response()
}

async fn routing_config(State(state): State<Arc<AppState>>) -> Json<Value> {
    let config = state.config();
    let profiles: Map<String, Value> = Profile::ALL
        .iter()
        .map(|profile| {
            let weights = profile.weights();
            (
                profile.as_str().to_string(),
                json!({ "time": weights.time, "aqi": weights.aqi, "co2": weights.co2 }),
            )
        })
        .collect();
    let feature_flags: Map<String, Value> = FEATURE_FLAGS
        .iter()
        .map(|(name, enabled)| (name.to_string(), Value::Bool(*enabled)))
        .collect();

    Json(json!({
        "status": "ok",
        "profiles": profiles,
        "thresholds": {
            "low": HEALTH_RISK_LOW,
            "moderate": HEALTH_RISK_MODERATE,
            "high": HEALTH_RISK_HIGH
        },
        "ttl_seconds": {
            "near_real_time": config.route_cache_ttl_s,
            "low_volatility": config.low_volatility_cache_ttl_s,
            "aqi_cache": config.aqi_cache_ttl_s
        },
        "timeouts_ms": {
            "road": config.road_timeout_ms,
            "aqi": config.aqi_timeout_ms,
            "health": config.health_timeout_ms
        },
        "feature_flags": feature_flags
    }))
}

async fn routing_health(State(state): State<Arc<AppState>>) -> Json<HealthReport> {
    Json(check_providers(state.road(), state.air(), state.clock()).await)
}

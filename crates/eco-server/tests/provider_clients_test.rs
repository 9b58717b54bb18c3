//! HTTP provider clients against a local stand-in server.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use eco_core::Coordinate;
use eco_server::config::Config;
use eco_server::providers::{
    AirQualityProvider, AqiResult, OpenMeteoClient, OsrmClient, RoadProvider, RoadRouteResult,
};
use serde_json::json;

const START: Coordinate = Coordinate::new(43.2380, 76.9456);
const END: Coordinate = Coordinate::new(43.2022, 76.8933);

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn config_for(addr: SocketAddr) -> Config {
    Config {
        road_provider_url: format!("http://{}/route/v1/driving", addr),
        aqi_provider_url: format!("http://{}/v1/air-quality", addr),
        road_timeout_ms: 300,
        aqi_timeout_ms: 300,
        health_timeout_ms: 300,
        ..Config::default()
    }
}

fn clients(addr: SocketAddr) -> (OsrmClient, OpenMeteoClient) {
    let config = config_for(addr);
    let http = reqwest::Client::new();
    (
        OsrmClient::new(http.clone(), &config),
        OpenMeteoClient::new(http, &config),
    )
}

/// Answers full route requests with a fixed three-point route and the
/// lightweight probe with a bare `Ok`.
async fn osrm_ok(
    Path(coords): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    if query.get("overview").map(String::as_str) == Some("false") {
        return Json(json!({"code": "Ok", "routes": []}));
    }
    let full = query.get("overview").map(String::as_str) == Some("full")
        && query.get("geometries").map(String::as_str) == Some("geojson")
        && query.get("steps").map(String::as_str) == Some("true");
    if !full || coords.split(';').count() < 2 {
        return Json(json!({"code": "InvalidQuery"}));
    }
    Json(json!({
        "code": "Ok",
        "routes": [{
            "distance": 6120.0,
            "duration": 1180.0,
            "geometry": {"type": "LineString", "coordinates": [
                [76.9456, 43.2380], [76.9200, 43.2200], [76.8933, 43.2022]
            ]},
            "legs": [{"steps": [
                {"name": "Abay Avenue", "distance": 3200.0, "duration": 600.0,
                 "maneuver": {"type": "depart"}},
                {"name": "", "distance": 0.0, "duration": 0.0,
                 "maneuver": {"type": "arrive"}}
            ]}]
        }]
    }))
}

async fn open_meteo_ok(Query(query): Query<HashMap<String, String>>) -> impl IntoResponse {
    let has_point = query.contains_key("latitude") && query.contains_key("longitude");
    let wants_aqi = query
        .get("current")
        .is_some_and(|current| current.split(',').any(|field| field == "european_aqi"));
    if !has_point || !wants_aqi {
        return Json(json!({"error": true}));
    }
    Json(json!({"current": {"time": "2026-10-18T08:00", "european_aqi": 41, "pm2_5": 9.4}}))
}

#[tokio::test]
async fn road_client_parses_provider_route() {
    let addr = serve(Router::new().route("/route/v1/driving/:coords", get(osrm_ok))).await;
    let (road, _) = clients(addr);

    let RoadRouteResult::Ok(route) = road.route(&[START, END]).await else {
        panic!("expected a road route");
    };
    assert_eq!(route.polyline.len(), 3);
    assert_eq!(route.polyline[0], START);
    assert_eq!(route.distance_m, 6120.0);
    assert_eq!(route.duration_s, 1180.0);
    assert_eq!(route.steps[0].instruction, "Start on Abay Avenue");
    assert_eq!(route.steps[1].instruction, "Arrive at destination");
    assert!(road.probe().await);
}

#[tokio::test]
async fn road_client_treats_errors_as_unavailable() {
    let app = Router::new()
        .route(
            "/route/v1/driving/:coords",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        );
    let addr = serve(app).await;
    let (road, _) = clients(addr);
    assert_eq!(road.route(&[START, END]).await, RoadRouteResult::Unavailable);
    assert!(!road.probe().await);

    let app = Router::new().route(
        "/route/v1/driving/:coords",
        get(|| async { Json(json!({"code": "NoRoute", "routes": []})) }),
    );
    let addr = serve(app).await;
    let (road, _) = clients(addr);
    assert_eq!(road.route(&[START, END]).await, RoadRouteResult::Unavailable);
    assert!(!road.probe().await);
}

#[tokio::test]
async fn road_client_times_out() {
    let app = Router::new().route(
        "/route/v1/driving/:coords",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Json(json!({"code": "Ok", "routes": []}))
        }),
    );
    let addr = serve(app).await;
    let (road, _) = clients(addr);
    assert_eq!(road.route(&[START, END]).await, RoadRouteResult::Unavailable);
}

#[tokio::test]
async fn unreachable_provider_is_unavailable() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (road, air) = clients(addr);
    assert_eq!(road.route(&[START, END]).await, RoadRouteResult::Unavailable);
    assert_eq!(air.current_aqi(START).await, AqiResult::Unavailable);
}

#[tokio::test]
async fn air_client_reads_current_index() {
    let addr = serve(Router::new().route("/v1/air-quality", get(open_meteo_ok))).await;
    let (_, air) = clients(addr);
    assert_eq!(air.current_aqi(START).await, AqiResult::Ok(41.0));
    assert!(air.probe().await);
}

#[tokio::test]
async fn air_client_treats_errors_as_unavailable() {
    let app = Router::new().route(
        "/v1/air-quality",
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "busy") }),
    );
    let addr = serve(app).await;
    let (_, air) = clients(addr);
    assert_eq!(air.current_aqi(START).await, AqiResult::Unavailable);
    assert!(!air.probe().await);

    let app = Router::new().route(
        "/v1/air-quality",
        get(|| async { Json(json!({"current": {"pm2_5": 12.0}})) }),
    );
    let addr = serve(app).await;
    let (_, air) = clients(addr);
    assert_eq!(air.current_aqi(START).await, AqiResult::Unavailable);
    assert!(!air.probe().await);

    let app = Router::new().route(
        "/v1/air-quality",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Json(json!({"current": {"european_aqi": 20}}))
        }),
    );
    let addr = serve(app).await;
    let (_, air) = clients(addr);
    assert_eq!(air.current_aqi(START).await, AqiResult::Unavailable);
}

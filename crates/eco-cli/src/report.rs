//! Plain-text rendering of routing responses.

use eco_core::{EnrichedRoute, RouteRole, RoutingResponse};

pub fn format_duration(seconds: i64) -> String {
    let minutes = (seconds.max(0) + 30) / 60;
    if minutes >= 60 {
        format!("{} h {:02} min", minutes / 60, minutes % 60)
    } else {
        format!("{} min", minutes)
    }
}

pub fn format_distance(meters: i64) -> String {
    if meters >= 1000 {
        format!("{:.1} km", meters as f64 / 1000.0)
    } else {
        format!("{} m", meters)
    }
}

pub fn route_line(route: &EnrichedRoute) -> String {
    let marker = match route.role {
        RouteRole::Recommended => '*',
        RouteRole::Alternative => ' ',
    };
    format!(
        "{} {:<3} {:>10} {:>8}  exposure {:>7.0}  CO2 {:>6.0} g  eco {:>2}  {}",
        marker,
        route.id,
        format_duration(route.eta_s),
        format_distance(route.distance_m),
        route.aqi_exposure,
        route.co2_g,
        route.eco_score,
        route.explanation,
    )
}

/// Summary header followed by one line per route.
pub fn render(response: &RoutingResponse) -> String {
    let mode = match response.mode {
        eco_core::RoutingMode::Road => "road",
        eco_core::RoutingMode::Estimated => "estimated",
    };
    let mut out = format!(
        "mode: {}{}\n",
        mode,
        if response.degraded {
            " (air quality unavailable)"
        } else {
            ""
        }
    );
    for route in &response.routes {
        out.push_str(&route_line(route));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_round_to_minutes() {
        assert_eq!(format_duration(1180), "20 min");
        assert_eq!(format_duration(29), "0 min");
        assert_eq!(format_duration(3_900), "1 h 05 min");
    }

    #[test]
    fn distances_switch_to_kilometers() {
        assert_eq!(format_distance(850), "850 m");
        assert_eq!(format_distance(6120), "6.1 km");
    }

    #[test]
    fn renders_response_from_json() {
        let response: RoutingResponse = serde_json::from_value(serde_json::json!({
            "status": "ok",
            "mode": "estimated",
            "degraded": true,
            "routes": [{
                "id": "r1", "type": "recommended", "source": "estimated", "mode": "estimated",
                "polyline": [[43.238, 76.9456], [43.2022, 76.8933]],
                "distance_m": 6120, "eta_s": 1180, "avg_traffic": 40, "avg_aqi": 0,
                "aqi_exposure": 0.0, "co2_g": 1010.0, "eco_score": 55,
                "compare_fastest": {"delta_time_s": 0, "delta_aqi_exposure": 0, "delta_co2_g": 0},
                "health_risk": "unknown", "explanation": "Fastest estimated route",
                "degraded": true, "aqi_profile": [], "steps": []
            }]
        }))
        .unwrap();

        let text = render(&response);
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("mode: estimated (air quality unavailable)"));
        let line = lines.next().unwrap();
        assert!(line.starts_with("* r1"));
        assert!(line.contains("20 min"));
        assert!(line.contains("6.1 km"));
        assert!(line.ends_with("Fastest estimated route"));
    }
}

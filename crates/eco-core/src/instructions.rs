//! Turn-by-turn instruction text.

/// Render a distance for display (`"850 m"`, `"1.2 km"`).
pub fn format_distance(distance_m: f64) -> String {
    if distance_m >= 1000.0 {
        format!("{:.1} km", distance_m / 1000.0)
    } else {
        format!("{} m", distance_m.round() as i64)
    }
}

/// Translate a provider maneuver into a short instruction.
///
/// `kind` and `modifier` use the OSRM maneuver vocabulary; empty strings are
/// treated the same as missing values.
pub fn describe_maneuver(kind: Option<&str>, modifier: Option<&str>, name: Option<&str>) -> String {
    let kind = kind
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or("continue")
        .to_lowercase();
    let modifier = modifier
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_lowercase);
    let name = name.map(str::trim).filter(|value| !value.is_empty());

    match kind.as_str() {
        "depart" | "new name" => match name {
            Some(name) => format!("Start on {name}"),
            None => "Start route".to_string(),
        },
        "arrive" => "Arrive at destination".to_string(),
        "roundabout" | "rotary" => match name {
            Some(name) => format!("Take roundabout to {name}"),
            None => "Take the roundabout".to_string(),
        },
        "merge" | "on ramp" | "off ramp" => directed("Merge", modifier.as_deref(), name),
        "turn" => directed("Turn", modifier.as_deref(), name),
        "fork" => match modifier {
            Some(modifier) => format!("Keep {modifier} at fork"),
            None => "Keep at fork".to_string(),
        },
        _ => match name {
            Some(name) => format!("Continue on {name}"),
            None => "Continue".to_string(),
        },
    }
}

fn directed(verb: &str, modifier: Option<&str>, name: Option<&str>) -> String {
    match (modifier, name) {
        (Some(modifier), Some(name)) => format!("{verb} {modifier} onto {name}"),
        (Some(modifier), None) => format!("{verb} {modifier}"),
        (None, Some(name)) => format!("{verb} onto {name}"),
        (None, None) => verb.to_string(),
    }
}

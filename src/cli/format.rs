//! Output formatting for CLI display.

use crate::geo::{format_eta, route_length_meters};
use crate::host::Guidance;
use crate::model::{Route, Stop};
use crate::walk::WalkState;

/// One line of `stroll routes`: id, stop count, length, walking time, name.
///
/// Walking time comes from the per-stop hints when the route has them,
/// otherwise from the length at `speed_mps`.
pub(super) fn format_route_line(route: &Route, speed_mps: f64) -> String {
    let length_m = if route.line.len() >= 2 {
        route_length_meters(&route.line)
    } else {
        let coordinates: Vec<_> = route.stops.iter().map(|s| s.coordinate).collect();
        route_length_meters(&coordinates)
    };

    let hinted: u32 = route.stops.iter().filter_map(|s| s.walk_from_prev_min).sum();
    let walk = if hinted > 0 {
        format!("{hinted} min")
    } else {
        format_eta(length_m / speed_mps)
    };

    let stops = match route.stops.len() {
        1 => "1 stop".to_string(),
        n => format!("{n} stops"),
    };
    let mut line = format!(
        "{}  [{stops}, {:.1} km, {}]  {}",
        route.id,
        length_m / 1000.0,
        if walk.is_empty() { "-" } else { &walk },
        route.name
    );
    if let Some(city) = &route.city {
        line.push_str(&format!(", {city}"));
    }
    line
}

/// A stop as shown in arrival lines: title, plus the location label if any.
pub(super) fn format_stop(stop: &Stop) -> String {
    match &stop.location {
        Some(location) => format!("{} ({location})", stop.title),
        None => stop.title.clone(),
    }
}

/// A redraw frame as a single line.
pub(super) fn format_guidance(route: &Route, guidance: &Guidance) -> String {
    let target = &route.stops[guidance.target_index];
    let eta = match format_eta(guidance.eta_to_target_secs) {
        e if e.is_empty() => "here".to_string(),
        e => e,
    };
    // Whole degrees in [0, 360): 359.6 reads as 0, not 360.
    let bearing = guidance.bearing_deg.round().rem_euclid(360.0);
    let mut line = format!(
        "{} ({}/{})  {}m at {bearing:.0}°  {eta}",
        target.title,
        guidance.target_index + 1,
        route.stops.len(),
        guidance.distance_m,
    );
    let to_end = format_eta(guidance.eta_to_end_secs);
    if !to_end.is_empty() {
        line.push_str(&format!(", {to_end} to end"));
    }
    line
}

pub(super) fn format_state(state: WalkState) -> String {
    match state {
        WalkState::Idle => "off".to_string(),
        WalkState::Seeking => "seeking".to_string(),
        WalkState::Tracking { distance_m, .. } => format!("tracking ({distance_m}m)"),
        WalkState::Paused => "paused".to_string(),
        WalkState::Blocked(e) => format!("blocked ({e})"),
    }
}

/// Closing line of `stroll walk`.
pub(super) fn format_summary(
    route: &Route,
    active_index: usize,
    arrivals: usize,
    state: WalkState,
) -> String {
    let active = &route.stops[active_index];
    let noun = if arrivals == 1 { "arrival" } else { "arrivals" };
    format!(
        "{}: stop {}/{} '{}', {arrivals} {noun}, walk {}",
        route.id,
        active_index + 1,
        route.stops.len(),
        active.title,
        format_state(state)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::Coordinate;
    use crate::position::PositionError;

    fn stop(id: &str, lat: f64, walk_from_prev_min: Option<u32>) -> Stop {
        Stop {
            id: id.into(),
            title: id.to_uppercase(),
            coordinate: Coordinate::new(lat, -157.85),
            location: None,
            walk_from_prev_min,
        }
    }

    fn route(hints: bool) -> Route {
        Route {
            id: "downtown".into(),
            name: "Downtown Heritage".into(),
            description: None,
            city: None,
            stops: vec![
                stop("palace", 21.300, None),
                stop("statue", 21.310, hints.then_some(12)),
            ],
            line: vec![],
        }
    }

    #[test]
    fn route_line_falls_back_to_stop_legs() {
        // 0.01° of latitude is ~1.1 km, ~13 min at 1.4 m/s.
        assert_eq!(
            format_route_line(&route(false), 1.4),
            "downtown  [2 stops, 1.1 km, 13 min]  Downtown Heritage"
        );
    }

    #[test]
    fn route_line_prefers_walk_hints() {
        assert_eq!(
            format_route_line(&route(true), 1.4),
            "downtown  [2 stops, 1.1 km, 12 min]  Downtown Heritage"
        );
    }

    #[test]
    fn route_line_names_city() {
        let mut r = route(false);
        r.city = Some("Honolulu".into());
        assert!(format_route_line(&r, 1.4).ends_with("Downtown Heritage, Honolulu"));
    }

    #[test]
    fn single_stop_route_has_no_walk() {
        let mut r = route(false);
        r.stops.truncate(1);
        assert_eq!(
            format_route_line(&r, 1.4),
            "downtown  [1 stop, 0.0 km, -]  Downtown Heritage"
        );
    }

    #[test]
    fn stop_shows_location_when_known() {
        let mut s = stop("palace", 21.3, None);
        assert_eq!(format_stop(&s), "PALACE");
        s.location = Some("King St".into());
        assert_eq!(format_stop(&s), "PALACE (King St)");
    }

    #[test]
    fn guidance_line() {
        let guidance = Guidance {
            position: Coordinate::new(21.3, -157.85),
            active_index: 0,
            target_index: 1,
            distance_m: 84,
            bearing_deg: 0.2,
            eta_to_target_secs: 60.0,
            eta_to_end_secs: 0.0,
            off_route_m: f64::INFINITY,
        };
        assert_eq!(
            format_guidance(&route(false), &guidance),
            "STATUE (2/2)  84m at 0°  1 min"
        );

        let arrived = Guidance {
            distance_m: 0,
            eta_to_target_secs: 0.0,
            eta_to_end_secs: 130.0,
            ..guidance
        };
        assert_eq!(
            format_guidance(&route(false), &arrived),
            "STATUE (2/2)  0m at 0°  here, 2 min to end"
        );
    }

    #[test]
    fn guidance_bearing_wraps_below_360() {
        let guidance = Guidance {
            position: Coordinate::new(21.3, -157.85),
            active_index: 0,
            target_index: 1,
            distance_m: 84,
            bearing_deg: 359.6,
            eta_to_target_secs: 60.0,
            eta_to_end_secs: 0.0,
            off_route_m: f64::INFINITY,
        };
        assert_eq!(
            format_guidance(&route(false), &guidance),
            "STATUE (2/2)  84m at 0°  1 min"
        );

        let east = Guidance {
            bearing_deg: 89.6,
            ..guidance
        };
        assert!(format_guidance(&route(false), &east).contains("at 90°"));
    }

    #[test]
    fn summary_line() {
        assert_eq!(
            format_summary(&route(false), 1, 1, WalkState::Idle),
            "downtown: stop 2/2 'STATUE', 1 arrival, walk off"
        );
        assert_eq!(
            format_summary(
                &route(false),
                0,
                0,
                WalkState::Blocked(PositionError::PermissionDenied)
            ),
            "downtown: stop 1/2 'PALACE', 0 arrivals, walk blocked (location permission denied)"
        );
    }
}

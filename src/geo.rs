//! Geo math for city-scale walks.
//!
//! Distances use a spherical earth. Polyline distances use a local flat
//! projection, which holds for spans of a few kilometers.

use crate::model::{Coordinate, Stop};

/// Mean earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Average walking pace, about 5 km/h.
pub const DEFAULT_WALK_MPS: f64 = 1.4;

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum GeoError {
    #[error("walking speed must be a positive number of m/s, got {0}")]
    InvalidSpeed(f64),
}

/// Great-circle (haversine) distance in meters.
pub fn distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// Initial compass bearing from `a` to `b`, in `[0, 360)`.
pub fn bearing_degrees(a: Coordinate, b: Coordinate) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let d_lng = (b.lng - a.lng).to_radians();
    let y = d_lng.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lng.cos();
    let bearing = y.atan2(x).to_degrees().rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs.
    if bearing >= 360.0 { 0.0 } else { bearing }
}

/// Minimum distance in meters from `point` to any segment of `polyline`.
///
/// Returns infinity when the polyline has fewer than two vertices.
pub fn point_to_polyline_distance(point: Coordinate, polyline: &[Coordinate]) -> f64 {
    if polyline.len() < 2 {
        return f64::INFINITY;
    }

    let anchor = polyline[0];
    let p = project(point, anchor);
    polyline
        .windows(2)
        .map(|w| distance_to_segment(p, project(w[0], anchor), project(w[1], anchor)))
        .fold(f64::INFINITY, f64::min)
}

/// Seconds to cover `distance_m` at `speed_mps`.
pub fn eta_seconds(distance_m: f64, speed_mps: f64) -> Result<f64, GeoError> {
    if !speed_mps.is_finite() || speed_mps <= 0.0 {
        return Err(GeoError::InvalidSpeed(speed_mps));
    }
    Ok(distance_m / speed_mps)
}

/// Short human ETA: `"42s"` under a minute, otherwise `"7 min"`.
///
/// Empty for a non-positive or non-finite duration.
pub fn format_eta(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return String::new();
    }
    let secs = seconds.round();
    if secs < 60.0 {
        format!("{secs:.0}s")
    } else {
        format!("{:.0} min", (secs / 60.0).round())
    }
}

/// Total length of a polyline in meters.
pub fn route_length_meters(polyline: &[Coordinate]) -> f64 {
    polyline
        .windows(2)
        .map(|w| distance_meters(w[0], w[1]))
        .sum()
}

/// Distance left on a tour: to the upcoming stop, then stop to stop to the end.
pub fn remaining_meters(from: Coordinate, stops: &[Stop], active_index: usize) -> f64 {
    let Some(last) = stops.len().checked_sub(1) else {
        return 0.0;
    };
    let next = (active_index + 1).min(last);
    let to_next = distance_meters(from, stops[next].coordinate);
    let legs: f64 = stops[next..]
        .windows(2)
        .map(|w| distance_meters(w[0].coordinate, w[1].coordinate))
        .sum();
    to_next + legs
}

/// Equirectangular projection to meters around `anchor`.
fn project(c: Coordinate, anchor: Coordinate) -> (f64, f64) {
    let mean_lat = ((c.lat + anchor.lat) / 2.0).to_radians();
    let x = (c.lng - anchor.lng).to_radians() * mean_lat.cos() * EARTH_RADIUS_M;
    let y = (c.lat - anchor.lat).to_radians() * EARTH_RADIUS_M;
    (x, y)
}

fn distance_to_segment(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return (p.0 - a.0).hypot(p.1 - a.1);
    }
    let t = (((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len_sq).clamp(0.0, 1.0);
    let (cx, cy) = (a.0 + t * dx, a.1 + t * dy);
    (p.0 - cx).hypot(p.1 - cy)
}

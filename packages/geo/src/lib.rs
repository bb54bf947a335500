#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Distance and travel-time estimation for crew dispatch.
//!
//! Pure geometry: great-circle distance via the haversine formula, a
//! ceiling-based ETA under an assumed average urban crew speed, and a
//! quadratic Bezier curve used to draw an approximate road path between a
//! crew and a report. The curve is presentation only — distance and ETA are
//! always computed from the great-circle value, never from the curve.
//!
//! Inputs are WGS84 degrees. Out-of-range coordinates (|lat| > 90,
//! |lon| > 180) are the caller's responsibility; behavior is undefined
//! beyond the inputs being finite.

use rand::Rng as _;

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Assumed average crew travel speed in city traffic, km/h.
pub const AVERAGE_CREW_SPEED_KMH: f64 = 25.0;

/// Number of segments in a generated route curve (21 points).
const ROUTE_STEPS: usize = 20;

/// Maximum midpoint jitter applied by [`illustrative_route`], in degrees.
const ROUTE_JITTER_DEG: f64 = 0.005;

/// Great-circle distance in kilometers between two coordinates, in degrees.
///
/// Identical inputs yield exactly 0.0, never NaN.
#[must_use]
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    // Floating-point error can push `a` a hair past 1.0 for antipodal points.
    let a = a.clamp(0.0, 1.0);

    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Estimated travel time in whole minutes at [`AVERAGE_CREW_SPEED_KMH`].
#[must_use]
pub fn eta_minutes(distance_km: f64) -> u32 {
    eta_minutes_at(distance_km, AVERAGE_CREW_SPEED_KMH)
}

/// Estimated travel time in whole minutes at an explicit average speed.
///
/// Rounds up so the estimate is never optimistic, except that a zero (or
/// non-positive) distance is exactly 0 minutes rather than 1.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn eta_minutes_at(distance_km: f64, speed_kmh: f64) -> u32 {
    if distance_km <= 0.0 {
        return 0;
    }
    let minutes = (distance_km / speed_kmh * 60.0).ceil();
    if minutes.is_finite() && minutes >= 0.0 {
        minutes as u32
    } else {
        u32::MAX
    }
}

/// A `[lat, lon]` pair in degrees.
pub type LatLon = [f64; 2];

/// Samples a quadratic Bezier curve from `start` to `end` through an
/// explicit control midpoint.
///
/// The first point equals `start` and the last equals `end` exactly.
#[must_use]
pub fn route_curve(start: LatLon, end: LatLon, midpoint: LatLon) -> Vec<LatLon> {
    let mut points = Vec::with_capacity(ROUTE_STEPS + 1);
    #[allow(clippy::cast_precision_loss)]
    for i in 0..=ROUTE_STEPS {
        let t = i as f64 / ROUTE_STEPS as f64;
        let lat = (1.0 - t) * (1.0 - t) * start[0]
            + 2.0 * (1.0 - t) * t * midpoint[0]
            + t * t * end[0];
        let lon = (1.0 - t) * (1.0 - t) * start[1]
            + 2.0 * (1.0 - t) * t * midpoint[1]
            + t * t * end[1];
        points.push([lat, lon]);
    }
    points
}

/// Builds a display route from `start` to `end` with a randomly jittered
/// midpoint, so overlapping routes stay visually distinct.
///
/// The jitter only shapes the drawn curve; it does not feed into
/// [`distance_km`] or [`eta_minutes`].
#[must_use]
pub fn illustrative_route(start: LatLon, end: LatLon) -> Vec<LatLon> {
    let mut rng = rand::rng();
    let midpoint = [
        f64::midpoint(start[0], end[0]) + rng.random_range(-ROUTE_JITTER_DEG..=ROUTE_JITTER_DEG),
        f64::midpoint(start[1], end[1]) + rng.random_range(-ROUTE_JITTER_DEG..=ROUTE_JITTER_DEG),
    ];
    route_curve(start, end, midpoint)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PUNE: LatLon = [18.5204, 73.8567];
    const MUMBAI: LatLon = [19.0760, 72.8777];

    #[test]
    fn distance_is_symmetric() {
        let d1 = distance_km(PUNE[0], PUNE[1], MUMBAI[0], MUMBAI[1]);
        let d2 = distance_km(MUMBAI[0], MUMBAI[1], PUNE[0], PUNE[1]);
        assert!((d1 - d2).abs() < 1e-12);
    }

    #[test]
    fn distance_of_identical_points_is_exactly_zero() {
        assert_eq!(distance_km(PUNE[0], PUNE[1], PUNE[0], PUNE[1]), 0.0);
        assert_eq!(distance_km(0.0, 0.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn pune_mumbai_distance_plausible() {
        // Great-circle distance is roughly 120 km.
        let d = distance_km(PUNE[0], PUNE[1], MUMBAI[0], MUMBAI[1]);
        assert!((100.0..140.0).contains(&d), "got {d} km");
    }

    #[test]
    fn eta_is_monotonic_in_distance() {
        let distances = [0.0, 0.1, 0.5, 1.0, 2.4, 2.5, 10.0, 100.0];
        for pair in distances.windows(2) {
            assert!(eta_minutes(pair[0]) <= eta_minutes(pair[1]));
        }
    }

    #[test]
    fn eta_rounds_up() {
        // 1 km at 25 km/h is 2.4 minutes; a pessimistic estimate says 3.
        assert_eq!(eta_minutes(1.0), 3);
        // Exact multiples do not round.
        assert_eq!(eta_minutes(2.5), 6);
    }

    #[test]
    fn eta_of_zero_distance_is_zero() {
        assert_eq!(eta_minutes(0.0), 0);
        assert_eq!(eta_minutes(-1.0), 0);
    }

    #[test]
    fn route_curve_endpoints_match_inputs() {
        let mid = [
            f64::midpoint(PUNE[0], MUMBAI[0]),
            f64::midpoint(PUNE[1], MUMBAI[1]),
        ];
        let curve = route_curve(PUNE, MUMBAI, mid);
        assert_eq!(curve.len(), 21);
        assert_eq!(curve[0], PUNE);
        assert_eq!(curve[20], MUMBAI);
    }

    #[test]
    fn illustrative_route_endpoints_match_despite_jitter() {
        let curve = illustrative_route(PUNE, MUMBAI);
        assert_eq!(curve[0], PUNE);
        assert_eq!(*curve.last().unwrap(), MUMBAI);
    }
}

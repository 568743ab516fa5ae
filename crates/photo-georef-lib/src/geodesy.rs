//! Geodesic distance and azimuth on the WGS84 ellipsoid
//!
//! Thin wrappers over `geo`'s Karney geodesic implementation. All functions are pure
//! and take coordinates in `(lon, lat)` degree order, matching `geo::Point`.
//!
//! Azimuths use one convention everywhere: degrees clockwise from north in `[0, 360)`.

use geo::{Bearing, Distance, Geodesic, Point};

/// Geodesic distance in meters between two `(lon, lat)` positions
#[inline]
pub fn distance(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    Geodesic.distance(Point::new(lon1, lat1), Point::new(lon2, lat2))
}

/// Forward azimuth in degrees `[0, 360)` of the geodesic from the first position to the second
#[inline]
pub fn forward_azimuth(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    normalize_azimuth(Geodesic.bearing(Point::new(lon1, lat1), Point::new(lon2, lat2)))
}

/// Map any angle in degrees onto `[0, 360)`
#[inline]
pub fn normalize_azimuth(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid of a tiny negative value rounds up to exactly 360
    if wrapped >= 360.0 { 0.0 } else { wrapped.abs() }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Smallest absolute difference between two azimuths, in degrees
    fn angle_diff(a: f64, b: f64) -> f64 {
        let d = (a - b).rem_euclid(360.0);
        d.min(360.0 - d)
    }

    #[test]
    fn test_distance_one_degree_on_equator() {
        // WGS84 equatorial circumference / 360
        let d = distance(0.0, 0.0, 1.0, 0.0);
        assert!((d - 111_319.49).abs() < 0.01, "got {d}");
    }

    #[test]
    fn test_distance_is_symmetric_and_zero_for_same_point() {
        let d1 = distance(16.48, 49.22, 16.49, 49.23);
        let d2 = distance(16.49, 49.23, 16.48, 49.22);
        assert!((d1 - d2).abs() < 1e-6);
        assert!(distance(16.48, 49.22, 16.48, 49.22).abs() < 1e-9);
    }

    #[test]
    fn test_cardinal_azimuths() {
        assert!(angle_diff(forward_azimuth(0.0, 0.0, 0.0, 1.0), 0.0) < 1e-6);
        assert!((forward_azimuth(0.0, 0.0, 1.0, 0.0) - 90.0).abs() < 1e-6);
        assert!((forward_azimuth(0.0, 1.0, 0.0, 0.0) - 180.0).abs() < 1e-6);
        assert!((forward_azimuth(1.0, 0.0, 0.0, 0.0) - 270.0).abs() < 1e-6);
    }

    #[test]
    fn test_azimuth_range() {
        let headings = [
            forward_azimuth(16.49, 49.22, 16.48, 49.21),
            forward_azimuth(16.48, 49.21, 16.49, 49.22),
            forward_azimuth(-70.0, -33.0, -71.0, -34.0),
        ];
        for heading in headings {
            assert!((0.0..360.0).contains(&heading), "{heading} out of range");
        }
        // South-west is reported as a positive bearing, not a negative one
        assert!(headings[0] > 180.0 && headings[0] < 270.0);
    }

    #[test]
    fn test_normalize_azimuth() {
        assert_eq!(normalize_azimuth(-135.0), 225.0);
        assert_eq!(normalize_azimuth(360.0), 0.0);
        assert_eq!(normalize_azimuth(-1e-20), 0.0);
        assert_eq!(normalize_azimuth(90.0), 90.0);
        assert_eq!(normalize_azimuth(-180.0), 180.0);
    }
}

//! Track point storage

/// A single recorded GPS fix
///
/// Coordinates are WGS84 degrees, the timestamp is UTC epoch seconds
/// (fractional seconds preserved).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrackPoint {
    pub lat: f64,
    pub lon: f64,
    pub timestamp: f64,
}

impl TrackPoint {
    #[inline]
    pub const fn new(lat: f64, lon: f64, timestamp: f64) -> Self {
        Self {
            lat,
            lon,
            timestamp,
        }
    }

    /// The fix as a `geo` point (x = longitude, y = latitude)
    #[inline]
    pub fn to_geo(&self) -> geo::Point<f64> {
        geo::Point::new(self.lon, self.lat)
    }
}

//! GeoReferencer - position and heading lookup by timestamp
//!
//! A query walks the collection in stored order for the first segment covering the
//! effective timestamp, then the first pair of points enclosing it. The position is
//! linearly interpolated in (lat, lon) between that pair; the heading comes from a
//! window widened around the pair until it spans enough distance or time to be stable.

use crate::{Result, Segment, SegmentCollection, SegmentCollectionBuilder, TrackPoint, geodesy};

use std::path::Path;

/// Heading smoothing parameters
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Points closer than this many meters to the photo position widen the heading window.
    /// Default: 4
    pub target_distance: f64,
    /// Points further than this many seconds from the photo time never widen the window.
    /// Default: 10
    pub max_time_delta: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_distance: 4.0,
            max_time_delta: 10.0,
        }
    }
}

/// Result of georeferencing one timestamp
///
/// Either no segment covered the timestamp, or every measurement is present. Serialized
/// untagged, so `NoCoverage` becomes `{"timestamp": ..}` and `Located` the full record.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(untagged)
)]
pub enum PhotoPosition {
    Located {
        /// Effective (UTC epoch) timestamp that was resolved
        timestamp: f64,
        lat: f64,
        lon: f64,
        /// Smoothed direction of travel, degrees clockwise from north in `[0, 360)`
        heading: f64,
        /// Geodesic distance in meters between the two bracketing track points
        track_points_dist: f64,
        /// Seconds between the two bracketing track points
        track_points_time_delta: f64,
        /// Provenance labels of the matched segment
        sources: Vec<String>,
    },
    NoCoverage {
        timestamp: f64,
    },
}

impl PhotoPosition {
    #[inline]
    pub fn timestamp(&self) -> f64 {
        match self {
            Self::Located { timestamp, .. } | Self::NoCoverage { timestamp } => *timestamp,
        }
    }

    #[inline]
    pub fn is_located(&self) -> bool {
        matches!(self, Self::Located { .. })
    }

    /// `(lat, lon)` when located
    #[inline]
    pub fn lat_lon(&self) -> Option<(f64, f64)> {
        match self {
            Self::Located { lat, lon, .. } => Some((*lat, *lon)),
            Self::NoCoverage { .. } => None,
        }
    }
}

/// Linearly interpolate `(lat, lon)` at `timestamp` between two points
///
/// A zero-duration pair resolves to `p1`'s coordinates whatever the timestamp.
pub fn interpolate_latlon(timestamp: f64, p1: &TrackPoint, p2: &TrackPoint) -> (f64, f64) {
    let q = if p1.timestamp == p2.timestamp {
        0.0
    } else {
        (timestamp - p1.timestamp) / (p2.timestamp - p1.timestamp)
    };
    let lat = p1.lat + (p2.lat - p1.lat) * q;
    let lon = p1.lon + (p2.lon - p1.lon) * q;
    (lat, lon)
}

/// Resolves photo timestamps against an immutable segment collection
///
/// Read-only after construction, so one instance can serve concurrent queries.
#[derive(Debug, Clone)]
pub struct GeoReferencer {
    segments: SegmentCollection,
    config: Config,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl GeoReferencer {
    pub fn new(segments: SegmentCollection, config: Config) -> Self {
        Self { segments, config }
    }

    /// Load and assemble GPX files, then build a referencer over them
    pub fn from_files<P: AsRef<Path> + Sync>(paths: &[P], config: Config) -> Result<Self> {
        let mut builder = SegmentCollectionBuilder::new();
        builder.load_from_files(paths)?;
        Ok(Self::new(builder.build(), config))
    }

    #[inline]
    pub fn segments(&self) -> &SegmentCollection {
        &self.segments
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolve the position at `timestamp + time_offset`
    ///
    /// Returns [`PhotoPosition::NoCoverage`] when no segment contains the effective
    /// timestamp; that is a normal outcome, not an error.
    pub fn resolve(&self, timestamp: f64, time_offset: f64) -> PhotoPosition {
        #[cfg(feature = "profiling")]
        profiling::scope!("referencer::resolve");

        let timestamp = timestamp + time_offset;
        let Some((segment, i)) = self.segments.find_covering(timestamp).and_then(|segment| {
            segment
                .enclosing_pair(timestamp)
                .map(|index| (segment, index))
        }) else {
            return PhotoPosition::NoCoverage { timestamp };
        };

        let points = segment.points();
        let (p1, p2) = (&points[i], &points[i + 1]);
        let track_points_dist = geodesy::distance(p1.lon, p1.lat, p2.lon, p2.lat);
        let track_points_time_delta = p2.timestamp - p1.timestamp;

        let (lat, lon) = interpolate_latlon(timestamp, p1, p2);
        let position = TrackPoint::new(lat, lon, timestamp);
        let heading = self.smoothed_heading(segment, i, &position);

        PhotoPosition::Located {
            timestamp,
            lat,
            lon,
            heading,
            track_points_dist,
            track_points_time_delta,
            sources: segment.sources().to_vec(),
        }
    }

    /// Heading from the first to the last point of the smoothing window
    fn smoothed_heading(&self, segment: &Segment, i: usize, position: &TrackPoint) -> f64 {
        let (lo, hi) = self.smoothing_window(segment, i, position);
        let points = segment.points();
        let (from, to) = (&points[lo], &points[hi]);
        geodesy::forward_azimuth(from.lon, from.lat, to.lon, to.lat)
    }

    /// Widen `(i, i + 1)` outwards while the boundary point stays within both
    /// `target_distance` and `max_time_delta` of `position`
    ///
    /// Each side is tested against the original boundary point, so both walks are
    /// monotonic and bounded by the segment length.
    fn smoothing_window(&self, segment: &Segment, i: usize, position: &TrackPoint) -> (usize, usize) {
        let points = segment.points();
        let in_range = |point: &TrackPoint| {
            geodesy::distance(position.lon, position.lat, point.lon, point.lat)
                < self.config.target_distance
                && (point.timestamp - position.timestamp).abs() <= self.config.max_time_delta
        };

        let mut lo = i;
        while lo > 0 && in_range(&points[lo]) {
            lo -= 1;
        }
        let mut hi = i + 1;
        let last = points.len() - 1;
        while hi < last && in_range(&points[hi]) {
            hi += 1;
        }
        (lo, hi)
    }
}

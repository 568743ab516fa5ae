//! Photo Georeference Library - Geotagging photos from GPX track logs
//!
//! This library assigns coordinates and a direction of travel to photographs by matching
//! their capture time against recorded GPS tracks. Tracks are assembled once into an
//! immutable, time-sorted segment collection; each query then interpolates a position
//! inside the enclosing pair of track points and smooths the heading over nearby points.
//!
//! # Architecture
//!
//! - **[`TrackPoint`]**: Immutable `(lat, lon, timestamp)` fix
//! - **[`Segment`]**: Time-ordered run of fixes with provenance labels
//! - **[`gpx`]**: Strict GPX ingestion producing per-`<trkseg>` point sequences
//! - **[`SegmentCollectionBuilder`]**: Sorts real segments and bridges the gaps between them
//! - **[`geodesy`]**: Ellipsoidal (WGS84) distance and azimuth
//! - **[`GeoReferencer`]**: Position/heading resolver over a finished [`SegmentCollection`]
//! - **[`batch`]**: Per-image orchestration with a pluggable [`TimestampSource`]
//!
//! # Example
//!
//! ```
//! use photo_georef_lib::{Config, GeoReferencer, SegmentCollectionBuilder, TrackPoint};
//!
//! # fn main() -> photo_georef_lib::Result<()> {
//! let mut builder = SegmentCollectionBuilder::new();
//! builder.add_point_sequences(
//!     "walk.gpx",
//!     vec![vec![
//!         TrackPoint::new(49.0, 16.0, 100.0),
//!         TrackPoint::new(49.001, 16.0, 200.0),
//!     ]],
//! )?;
//! let referencer = GeoReferencer::new(builder.build(), Config::default());
//!
//! let position = referencer.resolve(150.0, 0.0);
//! assert!(position.is_located());
//! # Ok(())
//! # }
//! ```
//!
//! # Performance Characteristics
//!
//! - **Build Time**: O(S log S) for S segments, GPX files parsed in parallel
//! - **Query Time**: O(S + P) linear scans (S=segments, P=points in the matched segment)
//! - **Memory**: O(N) for N track points, shared read-only between concurrent queries

pub mod batch;
mod collection;
pub mod geodesy;
pub mod gpx;
mod point;
mod referencer;
mod segment;

// Public API exports
pub use batch::{ExifTool, PositionMap, TimestampSource, calculate_offset};
pub use collection::{CollectionInfo, SegmentCollection, SegmentCollectionBuilder};
pub use point::TrackPoint;
pub use referencer::{Config, GeoReferencer, PhotoPosition, interpolate_latlon};
pub use segment::Segment;

/// Error types for track ingestion and photo georeferencing
///
/// Point indices are zero-based and count `<trkpt>` elements across the whole GPX
/// document, so they stay unambiguous in files with several segments.
#[derive(Debug, thiserror::Error)]
pub enum GeoRefError {
    #[error("{file}: malformed GPX document: {reason}")]
    MalformedDocument { file: String, reason: String },

    #[error("{file}: track point #{index} has malformed timestamp {value:?}")]
    MalformedTimestamp {
        file: String,
        index: usize,
        value: String,
    },

    #[error("{file}: track point #{index} has no timestamp")]
    MissingTimestamp { file: String, index: usize },

    #[error("{file}: track point #{index} has invalid coordinates: {reason}")]
    InvalidCoordinate {
        file: String,
        index: usize,
        reason: String,
    },

    #[error("{file}: points time out of order (point #{index}, {delta} seconds)")]
    TimeOrderViolation {
        file: String,
        index: usize,
        delta: f64,
    },

    #[error("A segment needs at least 2 points, got {count}")]
    TooFewPoints { count: usize },

    #[error("{file}: IO error: {err}")]
    Io { file: String, err: std::io::Error },

    #[error("{image}: cannot read capture time: {reason}")]
    ExifTimestamp { image: String, reason: String },
}

pub type Result<T> = std::result::Result<T, GeoRefError>;

//! Track segments: time-ordered runs of fixes with provenance

use crate::{GeoRefError, Result, TrackPoint};

/// A time-ordered run of at least two track points
///
/// Real segments come straight from one GPX `<trkseg>` and carry that file's label.
/// Virtual segments are two-point bridges across a recording gap (see [`Segment::bridge`])
/// and carry the labels of both parents. The two kinds are only distinguished by how
/// they were produced.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Segment {
    /// Provenance labels, never empty
    sources: Vec<String>,
    /// Points sorted by non-decreasing timestamp
    points: Vec<TrackPoint>,
}

/// Verify that timestamps never decrease along `points`
///
/// The reported index is the zero-based position of the first point that is
/// earlier than its predecessor, offset by `first_index`.
pub(crate) fn check_time_order(
    label: &str,
    points: &[TrackPoint],
    first_index: usize,
) -> Result<()> {
    for (i, pair) in points.windows(2).enumerate() {
        let delta = pair[1].timestamp - pair[0].timestamp;
        if delta < 0.0 {
            return Err(GeoRefError::TimeOrderViolation {
                file: label.to_string(),
                index: first_index + i + 1,
                delta,
            });
        }
    }
    Ok(())
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Segment {
    /// Create a real segment recorded in `source`
    ///
    /// Fails with [`GeoRefError::TooFewPoints`] for fewer than two points and with
    /// [`GeoRefError::TimeOrderViolation`] if the timestamps decrease anywhere.
    pub fn new(source: impl Into<String>, points: Vec<TrackPoint>) -> Result<Self> {
        let source = source.into();
        if points.len() < 2 {
            return Err(GeoRefError::TooFewPoints {
                count: points.len(),
            });
        }
        check_time_order(&source, &points, 0)?;
        Ok(Self {
            sources: vec![source],
            points,
        })
    }

    /// Bridge the gap between `prev` and `next` with a two-point virtual segment
    ///
    /// Returns `None` unless `next` starts strictly after `prev` ends, so a bridge
    /// never has a zero or negative duration.
    pub fn bridge(prev: &Segment, next: &Segment) -> Option<Self> {
        let start = *prev.last();
        let end = *next.first();
        if end.timestamp <= start.timestamp {
            return None;
        }
        let mut sources = Vec::with_capacity(prev.sources.len() + next.sources.len());
        sources.extend(prev.sources.iter().cloned());
        sources.extend(next.sources.iter().cloned());
        Some(Self {
            sources,
            points: vec![start, end],
        })
    }

    #[inline]
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    #[inline]
    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    #[inline]
    pub fn first(&self) -> &TrackPoint {
        // Non-empty by construction
        &self.points[0]
    }

    #[inline]
    pub fn last(&self) -> &TrackPoint {
        &self.points[self.points.len() - 1]
    }

    #[inline]
    pub fn start_time(&self) -> f64 {
        self.first().timestamp
    }

    #[inline]
    pub fn end_time(&self) -> f64 {
        self.last().timestamp
    }

    /// Check whether `timestamp` lies within `[start_time, end_time]`
    #[inline]
    pub fn covers(&self, timestamp: f64) -> bool {
        self.start_time() <= timestamp && timestamp <= self.end_time()
    }

    /// Index `i` of the first pair `(points[i], points[i + 1])` enclosing `timestamp`
    ///
    /// A timestamp shared by two adjacent pairs resolves to the lower index.
    pub fn enclosing_pair(&self, timestamp: f64) -> Option<usize> {
        self.points
            .windows(2)
            .position(|pair| pair[0].timestamp <= timestamp && timestamp <= pair[1].timestamp)
    }

    /// Number of points in the segment (always at least 2)
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always `false`; provided for API symmetry with `len`
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

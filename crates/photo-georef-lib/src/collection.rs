//! Segment assembly - turning parsed tracks into the immutable collection queried by the resolver
//!
//! Real segments from every source are sorted by start time (stable, so ties keep input
//! order). One linear pass then bridges each adjacent pair with a virtual segment; the
//! bridges are appended after all real segments and are never bridged themselves.

use crate::{Result, Segment, TrackPoint, gpx};

use rayon::prelude::*;
use std::path::Path;

/// Information about the segment collection
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CollectionInfo {
    /// Number of segments read from track files
    pub real_segments: usize,
    /// Number of synthesized gap bridges
    pub virtual_segments: usize,
    /// Total number of points in real segments
    pub total_points: usize,
    /// Earliest and latest timestamp covered, `None` when empty
    pub time_range: Option<(f64, f64)>,
}

/// Accumulates real segments before the collection is finalized
///
/// Consumed by [`SegmentCollectionBuilder::build`], so a finished [`SegmentCollection`]
/// can never be mutated.
#[derive(Debug, Default)]
pub struct SegmentCollectionBuilder {
    segments: Vec<Segment>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl SegmentCollectionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the point sequences parsed from one source
    ///
    /// Sequences with fewer than two points cannot define an interval and are skipped.
    pub fn add_point_sequences(
        &mut self,
        label: &str,
        sequences: Vec<Vec<TrackPoint>>,
    ) -> Result<()> {
        for points in sequences {
            if points.len() < 2 {
                tracing::debug!("{label}: skipping segment with {} point(s)", points.len());
                continue;
            }
            self.segments.push(Segment::new(label, points)?);
        }
        Ok(())
    }

    /// Add a single ready-made segment
    pub fn add_segment(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    /// Parse an in-memory GPX document and add its segments
    pub fn add_gpx_str(&mut self, label: &str, xml: &str) -> Result<()> {
        let sequences = gpx::read_str(xml, label)?;
        self.add_point_sequences(label, sequences)
    }

    /// Parse a GPX file and add its segments, labelled with the file path
    pub fn add_file(&mut self, path: &Path) -> Result<()> {
        let sequences = gpx::read_file(path)?;
        self.add_point_sequences(&path.display().to_string(), sequences)
    }

    /// Load GPX files in parallel
    ///
    /// Files are parsed concurrently but added in the given order, so start-time ties
    /// still resolve by input order. The first failing file aborts the load.
    pub fn load_from_files<P: AsRef<Path> + Sync>(&mut self, paths: &[P]) -> Result<()> {
        #[cfg(feature = "profiling")]
        profiling::scope!("collection::load_from_files");

        let parsed: Vec<(String, Vec<Vec<TrackPoint>>)> = paths
            .par_iter()
            .map(|path| {
                let path = path.as_ref();
                Ok((path.display().to_string(), gpx::read_file(path)?))
            })
            .collect::<Result<_>>()?;

        for (label, sequences) in parsed {
            self.add_point_sequences(&label, sequences)?;
        }
        Ok(())
    }

    /// Sort the real segments, bridge the gaps and freeze the result
    pub fn build(mut self) -> SegmentCollection {
        #[cfg(feature = "profiling")]
        profiling::scope!("collection::build");

        // sort_by is stable
        self.segments
            .sort_by(|a, b| a.start_time().total_cmp(&b.start_time()));
        let real_count = self.segments.len();

        let bridges: Vec<Segment> = self
            .segments
            .windows(2)
            .filter_map(|pair| Segment::bridge(&pair[0], &pair[1]))
            .collect();
        tracing::debug!(
            "Bridged {} of {} gaps between {real_count} segments",
            bridges.len(),
            real_count.saturating_sub(1)
        );

        self.segments.extend(bridges);
        SegmentCollection {
            segments: self.segments,
            real_count,
        }
    }
}

/// Immutable, query-ready set of real and virtual segments
///
/// Stored order: real segments by start time, then virtual segments in generation order.
#[derive(Debug, Clone, Default)]
pub struct SegmentCollection {
    segments: Vec<Segment>,
    real_count: usize,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl SegmentCollection {
    /// All segments in stored order
    #[inline]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Segments read from track files, sorted by start time
    #[inline]
    pub fn real_segments(&self) -> &[Segment] {
        &self.segments[..self.real_count]
    }

    /// Gap bridges in generation order
    #[inline]
    pub fn virtual_segments(&self) -> &[Segment] {
        &self.segments[self.real_count..]
    }

    /// First segment in stored order whose time range contains `timestamp`
    #[inline]
    pub fn find_covering(&self, timestamp: f64) -> Option<&Segment> {
        self.segments.iter().find(|s| s.covers(timestamp))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Summarize the collection
    pub fn info(&self) -> CollectionInfo {
        let real = self.real_segments();
        // Real segments are sorted by start, but a long early segment may end last
        let time_range = real.first().map(|first| {
            let end = real
                .iter()
                .map(Segment::end_time)
                .fold(f64::NEG_INFINITY, f64::max);
            (first.start_time(), end)
        });
        CollectionInfo {
            real_segments: self.real_count,
            virtual_segments: self.segments.len() - self.real_count,
            total_points: real.iter().map(Segment::len).sum(),
            time_range,
        }
    }
}

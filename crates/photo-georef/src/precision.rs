//! Trust levels for resolved positions, judged from the bracketing track points

use photo_georef_lib::{PhotoPosition, PositionMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    /// Track points close in both space and time
    Precise,
    /// Usable, but the track points are far apart
    Approximate,
    /// Track points too far apart for the interpolation to mean anything
    Unreliable,
    /// No track covers the capture time
    Missing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrecisionThresholds {
    pub precise_max_distance: f64,
    pub precise_max_time_delta: f64,
    pub approx_max_distance: f64,
    pub force_precise: bool,
}

impl Default for PrecisionThresholds {
    fn default() -> Self {
        Self {
            precise_max_distance: 50.0,
            precise_max_time_delta: 60.0,
            approx_max_distance: 30_000.0,
            force_precise: false,
        }
    }
}

impl PrecisionThresholds {
    pub fn classify(&self, position: &PhotoPosition) -> Precision {
        match position {
            PhotoPosition::NoCoverage { .. } => Precision::Missing,
            PhotoPosition::Located {
                track_points_dist,
                track_points_time_delta,
                ..
            } => {
                if *track_points_dist > self.approx_max_distance {
                    Precision::Unreliable
                } else if self.force_precise
                    || (*track_points_dist <= self.precise_max_distance
                        && *track_points_time_delta <= self.precise_max_time_delta)
                {
                    Precision::Precise
                } else {
                    Precision::Approximate
                }
            }
        }
    }
}

/// Number of images at each precision level
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrecisionSummary {
    pub precise: usize,
    pub approximate: usize,
    pub unreliable: usize,
    pub missing: usize,
}

/// Log a line for every image that is not precisely located and tally the levels
pub fn report(positions: &PositionMap, thresholds: &PrecisionThresholds) -> PrecisionSummary {
    let mut summary = PrecisionSummary::default();
    for (image, position) in positions.iter() {
        match (thresholds.classify(position), position) {
            (Precision::Precise, _) => {
                summary.precise += 1;
                tracing::debug!("{image}: precise");
            }
            (
                Precision::Approximate,
                PhotoPosition::Located {
                    track_points_dist,
                    track_points_time_delta,
                    ..
                },
            ) => {
                summary.approximate += 1;
                tracing::warn!(
                    "{image}: approximate coordinates, track points {track_points_dist:.1} m and {track_points_time_delta} s apart"
                );
            }
            (
                Precision::Unreliable,
                PhotoPosition::Located {
                    track_points_dist, ..
                },
            ) => {
                summary.unreliable += 1;
                tracing::warn!(
                    "{image}: track points {track_points_dist:.0} m apart, coordinates unreliable"
                );
            }
            _ => {
                summary.missing += 1;
                tracing::warn!(
                    "{image}: no track covers {}",
                    position.timestamp()
                );
            }
        }
    }
    tracing::info!(
        "{} precise, {} approximate, {} unreliable, {} missing",
        summary.precise,
        summary.approximate,
        summary.unreliable,
        summary.missing
    );
    summary
}

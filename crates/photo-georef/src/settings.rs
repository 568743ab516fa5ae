use crate::precision::PrecisionThresholds;
use chrono::{Datelike, Local, Offset, TimeZone};
use clap::Parser;
use photo_georef_lib::Config;
use std::path::PathBuf;

/// Standard-time UTC offset of this machine in hours, daylight saving excluded
fn default_timezone() -> f64 {
    standard_offset_seconds(&Local, Local::now().year()) as f64 / 3600.0
}

/// The smaller of the January and July offsets of `tz`
///
/// Daylight saving only adds to the offset, in either hemisphere.
fn standard_offset_seconds<Tz: TimeZone>(tz: &Tz, year: i32) -> i32 {
    [1, 7]
        .into_iter()
        .filter_map(|month| tz.with_ymd_and_hms(year, month, 1, 12, 0, 0).earliest())
        .map(|datetime| datetime.offset().fix().local_minus_utc())
        .min()
        .unwrap_or(0)
}

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Photo Georef - Geotag photos from the GPX tracks recorded while taking them
pub struct Settings {
    /// Images to georeference
    #[clap(long, value_name = "FILE", num_args = 1.., required = true)]
    pub images: Vec<String>,

    /// GPX track files
    #[clap(long, value_name = "FILE", num_args = 1.., required = true)]
    pub tracks: Vec<PathBuf>,

    /// Camera clock time zone in hours (fractions allowed), defaults to this machine's standard time
    #[clap(short = 'z', long, default_value_t = default_timezone(), allow_negative_numbers = true)]
    pub timezone: f64,

    /// Camera time minus GPS time, in seconds
    #[clap(short, long, default_value = "0", allow_negative_numbers = true)]
    pub offset: i64,

    /// Track points closer than this (meters) widen the heading window
    #[clap(long, default_value = "4.0")]
    pub target_distance: f64,

    /// Track points further than this (seconds) never widen the heading window
    #[clap(long, default_value = "10.0")]
    pub max_time_delta: f64,

    /// Maximum distance (meters) between bracketing track points for a precise fix
    #[clap(long, default_value = "50.0")]
    pub precise_max_distance: f64,

    /// Maximum time (seconds) between bracketing track points for a precise fix
    #[clap(long, default_value = "60.0")]
    pub precise_max_time_delta: f64,

    /// Bracketing track points further apart than this (meters) make a fix unreliable
    #[clap(long, default_value = "30000.0")]
    pub approx_max_distance: f64,

    /// Report every usable fix as precise
    #[clap(short, long, default_value = "false")]
    pub force_precise: bool,

    /// Write the loaded track segments as JSON to this file
    #[clap(long, value_name = "FILE")]
    pub dump_tracks: Option<PathBuf>,

    /// Write results to this file instead of stdout
    #[clap(long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Resolve images one at a time instead of in parallel
    #[clap(long, default_value = "false")]
    pub sequential: bool,

    /// Log debug details
    #[clap(short, long, default_value = "false")]
    pub verbose: bool,
}

impl Settings {
    /// Heading smoothing parameters for the resolver
    pub fn georef_config(&self) -> Config {
        Config {
            target_distance: self.target_distance,
            max_time_delta: self.max_time_delta,
        }
    }

    pub fn precision_thresholds(&self) -> PrecisionThresholds {
        PrecisionThresholds {
            precise_max_distance: self.precise_max_distance,
            precise_max_time_delta: self.precise_max_time_delta,
            approx_max_distance: self.approx_max_distance,
            force_precise: self.force_precise,
        }
    }
}

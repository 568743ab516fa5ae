//! Batch orchestration - georeferencing a set of images
//!
//! Capture times come from a [`TimestampSource`] as raw EXIF strings; the production
//! source shells out to `exiftool`, tests substitute an in-memory one. Camera timestamps
//! are local wall-clock time, so they are parsed here and shifted by [`calculate_offset`]
//! before the lookup.

use crate::{Config, GeoRefError, GeoReferencer, PhotoPosition, Result};

use chrono::NaiveDateTime;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Offset in seconds that turns a camera-local timestamp into GPS (UTC) time
///
/// `camera_time_zone_hours` is the camera clock's UTC offset (fractional hours allowed),
/// `camera_minus_gps_seconds` the measured clock skew against true GPS time.
#[inline]
pub fn calculate_offset(camera_time_zone_hours: f64, camera_minus_gps_seconds: i64) -> f64 {
    -camera_time_zone_hours * 3600.0 + camera_minus_gps_seconds as f64
}

/// Parse an EXIF `YYYY:MM:DD HH:MM:SS` value as if it were UTC
///
/// The result is the local wall-clock time expressed as epoch seconds; the offset from
/// [`calculate_offset`] moves it to true UTC.
pub fn parse_exif_datetime(value: &str) -> Option<f64> {
    NaiveDateTime::parse_from_str(value.trim(), "%Y:%m:%d %H:%M:%S")
        .ok()
        .map(|dt| dt.and_utc().timestamp() as f64)
}

/// Capability to read an image's capture time
pub trait TimestampSource: Sync {
    /// Camera-local capture time of `image` as `YYYY:MM:DD HH:MM:SS`
    fn capture_time(&self, image: &str) -> Result<String>;
}

/// Reads `DateTimeOriginal` by running the `exiftool` command
#[derive(Debug, Clone)]
pub struct ExifTool {
    program: PathBuf,
}

impl Default for ExifTool {
    fn default() -> Self {
        Self {
            program: PathBuf::from("exiftool"),
        }
    }
}

impl ExifTool {
    /// Use a specific `exiftool` executable
    pub fn with_program(program: impl AsRef<Path>) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
        }
    }

    /// Extract `DateTimeOriginal` from `exiftool -j` output
    fn parse_output(image: &str, stdout: &[u8]) -> Result<String> {
        let error = |reason: String| GeoRefError::ExifTimestamp {
            image: image.to_string(),
            reason,
        };
        let json: serde_json::Value =
            serde_json::from_slice(stdout).map_err(|e| error(format!("invalid exiftool output: {e}")))?;
        json.get(0)
            .and_then(|record| record.get("DateTimeOriginal"))
            .and_then(serde_json::Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| error("no DateTimeOriginal tag".to_string()))
    }
}

impl TimestampSource for ExifTool {
    fn capture_time(&self, image: &str) -> Result<String> {
        let output = Command::new(&self.program)
            .args(["-j", "-DateTimeOriginal"])
            .arg(image)
            .output()
            .map_err(|e| GeoRefError::ExifTimestamp {
                image: image.to_string(),
                reason: format!("cannot run {}: {e}", self.program.display()),
            })?;
        if !output.status.success() {
            return Err(GeoRefError::ExifTimestamp {
                image: image.to_string(),
                reason: format!(
                    "{} exited with {}: {}",
                    self.program.display(),
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        Self::parse_output(image, &output.stdout)
    }
}

/// Ordered mapping from image identifier to its position
///
/// Entries keep insertion order; inserting an existing identifier replaces its value
/// in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionMap {
    entries: Vec<(String, PhotoPosition)>,
    /// Image identifier -> position in `entries`
    index: HashMap<String, usize>,
}

impl PositionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, image: String, position: PhotoPosition) {
        match self.index.get(&image) {
            Some(&slot) => self.entries[slot].1 = position,
            None => {
                self.index.insert(image.clone(), self.entries.len());
                self.entries.push((image, position));
            }
        }
    }

    pub fn get(&self, image: &str) -> Option<&PhotoPosition> {
        self.index.get(image).map(|&slot| &self.entries[slot].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PhotoPosition)> {
        self.entries
            .iter()
            .map(|(name, position)| (name.as_str(), position))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for PositionMap {
    type Item = (String, PhotoPosition);
    type IntoIter = std::vec::IntoIter<(String, PhotoPosition)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl FromIterator<(String, PhotoPosition)> for PositionMap {
    fn from_iter<I: IntoIterator<Item = (String, PhotoPosition)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (image, position) in iter {
            map.insert(image, position);
        }
        map
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for PositionMap {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (image, position) in &self.entries {
            map.serialize_entry(image, position)?;
        }
        map.end()
    }
}

fn resolve_image<S: TimestampSource + ?Sized>(
    image: &str,
    time_offset: f64,
    referencer: &GeoReferencer,
    source: &S,
) -> Result<(String, PhotoPosition)> {
    let raw = source.capture_time(image)?;
    let timestamp = parse_exif_datetime(&raw).ok_or_else(|| GeoRefError::ExifTimestamp {
        image: image.to_string(),
        reason: format!("malformed capture time {raw:?}"),
    })?;
    let position = referencer.resolve(timestamp, time_offset);
    tracing::debug!("{image}: local time {timestamp} resolved to {position:?}");
    Ok((image.to_string(), position))
}

/// Georeference `images` one after another
///
/// The first image whose capture time cannot be read aborts the batch.
pub fn resolve_batch<I, S>(
    images: &[I],
    time_offset: f64,
    referencer: &GeoReferencer,
    source: &S,
) -> Result<PositionMap>
where
    I: AsRef<str>,
    S: TimestampSource + ?Sized,
{
    images
        .iter()
        .map(|image| resolve_image(image.as_ref(), time_offset, referencer, source))
        .collect()
}

/// Georeference `images` on the rayon thread pool
///
/// Produces exactly the same map as [`resolve_batch`], including entry order.
pub fn resolve_batch_parallel<I, S>(
    images: &[I],
    time_offset: f64,
    referencer: &GeoReferencer,
    source: &S,
) -> Result<PositionMap>
where
    I: AsRef<str> + Sync,
    S: TimestampSource + ?Sized,
{
    #[cfg(feature = "profiling")]
    profiling::scope!("batch::resolve_batch_parallel");

    let resolved: Vec<(String, PhotoPosition)> = images
        .par_iter()
        .map(|image| resolve_image(image.as_ref(), time_offset, referencer, source))
        .collect::<Result<_>>()?;
    Ok(resolved.into_iter().collect())
}

/// Load `tracks`, then georeference `images` against them
pub fn georeference_images<I, P, S>(
    images: &[I],
    tracks: &[P],
    time_offset: f64,
    config: Config,
    source: &S,
) -> Result<PositionMap>
where
    I: AsRef<str> + Sync,
    P: AsRef<Path> + Sync,
    S: TimestampSource + ?Sized,
{
    let referencer = GeoReferencer::from_files(tracks, config)?;
    resolve_batch_parallel(images, time_offset, &referencer, source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SegmentCollectionBuilder, TrackPoint};

    /// Capture times looked up from memory instead of image files
    struct MemorySource(HashMap<&'static str, &'static str>);

    impl TimestampSource for MemorySource {
        fn capture_time(&self, image: &str) -> Result<String> {
            self.0
                .get(image)
                .map(|value| value.to_string())
                .ok_or_else(|| GeoRefError::ExifTimestamp {
                    image: image.to_string(),
                    reason: "not found".to_string(),
                })
        }
    }

    fn create_test_source() -> MemorySource {
        MemorySource(HashMap::from([
            ("a.jpg", "2021:10:31 15:17:54"),
            ("b.jpg", "2021:10:31 15:18:04"),
            ("c.jpg", "2021:10:31 18:00:00"),
            ("blank.jpg", "    :  :     :  :  "),
        ]))
    }

    fn create_test_referencer() -> GeoReferencer {
        // 2021-10-31T14:17:50Z .. 14:18:10Z, 1 second apart
        let start = 1635689870.0;
        let points = (0..=20)
            .map(|i| TrackPoint::new(49.2236 + i as f64 * 4e-6, 16.4897, start + i as f64))
            .collect();
        let mut builder = SegmentCollectionBuilder::new();
        builder.add_point_sequences("current.gpx", vec![points]).unwrap();
        GeoReferencer::new(builder.build(), Config::default())
    }

    #[test]
    fn test_calculate_offset() {
        let cases = [
            (0.0, 0, 0.0),
            (1.0, 0, -3600.0),
            (2.0, 0, -7200.0),
            (-2.0, 0, 7200.0),
            (0.0, 10, 10.0),
            (0.0, -10, -10.0),
            (3.0, 10, -10790.0),
            (-3.0, 10, 10810.0),
            (1.25, -10, -4510.0),
        ];
        for (zone, skew, expected) in cases {
            assert_eq!(calculate_offset(zone, skew), expected, "zone={zone} skew={skew}");
        }
    }

    #[test]
    fn test_parse_exif_datetime() {
        assert_eq!(parse_exif_datetime("2021:10:31 15:17:54"), Some(1635693474.0));
        assert_eq!(parse_exif_datetime("2021-10-31 15:17:54"), None);
        assert_eq!(parse_exif_datetime("    :  :     :  :  "), None);
    }

    #[test]
    fn test_exiftool_output_parsing() {
        let stdout = br#"[{"SourceFile": "photo.jpg", "DateTimeOriginal": "2021:10:31 15:17:54"}]"#;
        assert_eq!(
            ExifTool::parse_output("photo.jpg", stdout).unwrap(),
            "2021:10:31 15:17:54"
        );

        let missing = br#"[{"SourceFile": "photo.jpg"}]"#;
        assert!(matches!(
            ExifTool::parse_output("photo.jpg", missing),
            Err(GeoRefError::ExifTimestamp { .. })
        ));
        assert!(ExifTool::parse_output("photo.jpg", b"not json").is_err());
    }

    #[test]
    fn test_exiftool_missing_program() {
        let tool = ExifTool::with_program("/nonexistent/exiftool");
        assert!(matches!(
            tool.capture_time("photo.jpg"),
            Err(GeoRefError::ExifTimestamp { .. })
        ));
    }

    #[test]
    fn test_resolve_batch_in_input_order() {
        let referencer = create_test_referencer();
        let source = create_test_source();
        let offset = calculate_offset(1.0, 0);

        let positions = resolve_batch(&["c.jpg", "a.jpg", "b.jpg"], offset, &referencer, &source).unwrap();

        let names: Vec<&str> = positions.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["c.jpg", "a.jpg", "b.jpg"]);

        let a = positions.get("a.jpg").unwrap();
        assert!(a.is_located());
        assert_eq!(a.timestamp(), 1635689874.0);
        // Outside the recording
        assert_eq!(
            positions.get("c.jpg"),
            Some(&PhotoPosition::NoCoverage { timestamp: 1635699600.0 })
        );
    }

    #[test]
    fn test_resolve_batch_repeated_image_overwrites_in_place() {
        let referencer = create_test_referencer();
        let source = create_test_source();

        let positions =
            resolve_batch(&["a.jpg", "b.jpg", "a.jpg"], -3600.0, &referencer, &source).unwrap();
        assert_eq!(positions.len(), 2);
        let names: Vec<&str> = positions.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["a.jpg", "b.jpg"]);
    }

    #[test]
    fn test_resolve_batch_parallel_matches_sequential() {
        let referencer = create_test_referencer();
        let source = create_test_source();
        let images = ["a.jpg", "b.jpg", "c.jpg", "a.jpg"];

        let sequential = resolve_batch(&images, -3600.0, &referencer, &source).unwrap();
        let parallel = resolve_batch_parallel(&images, -3600.0, &referencer, &source).unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_resolve_batch_propagates_extraction_errors() {
        let referencer = create_test_referencer();
        let source = create_test_source();

        let result = resolve_batch(&["a.jpg", "missing.jpg"], 0.0, &referencer, &source);
        assert!(matches!(
            result,
            Err(GeoRefError::ExifTimestamp { image, .. }) if image == "missing.jpg"
        ));
    }

    #[test]
    fn test_resolve_batch_rejects_malformed_capture_time() {
        let referencer = create_test_referencer();
        let source = create_test_source();

        let result = resolve_batch(&["a.jpg", "blank.jpg"], 0.0, &referencer, &source);
        match result {
            Err(GeoRefError::ExifTimestamp { image, reason }) => {
                assert_eq!(image, "blank.jpg");
                assert!(reason.contains("malformed capture time"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_position_map_lookup_after_overwrite() {
        let mut map = PositionMap::new();
        for i in 0..100 {
            map.insert(format!("{i}.jpg"), PhotoPosition::NoCoverage { timestamp: i as f64 });
        }
        map.insert("42.jpg".to_string(), PhotoPosition::NoCoverage { timestamp: -1.0 });

        assert_eq!(map.len(), 100);
        assert_eq!(map.get("42.jpg").map(PhotoPosition::timestamp), Some(-1.0));
        assert_eq!(map.get("43.jpg").map(PhotoPosition::timestamp), Some(43.0));
        assert_eq!(map.get("100.jpg"), None);
        assert_eq!(map.iter().nth(42).map(|(name, _)| name), Some("42.jpg"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_position_map_serializes_in_insertion_order() {
        let mut map = PositionMap::new();
        map.insert("z.jpg".to_string(), PhotoPosition::NoCoverage { timestamp: 1.0 });
        map.insert("a.jpg".to_string(), PhotoPosition::NoCoverage { timestamp: 2.0 });

        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"z.jpg":{"timestamp":1.0},"a.jpg":{"timestamp":2.0}}"#);
    }
}

//! GPX ingestion
//!
//! Reads `<trk>/<trkseg>/<trkpt lat= lon=><time>` structures into one point sequence per
//! `<trkseg>`, in document order across all tracks. Only coordinates and timestamps are
//! consumed; every other GPX element is ignored. Timestamps must be UTC in the exact form
//! `YYYY-MM-DDTHH:MM:SS[.fraction]Z`.
//!
//! Empty segments are dropped here. Single-point segments are returned as-is: deciding
//! that a lone fix cannot define an interval belongs to segment assembly.
//!
//! Point indices in errors count every `<trkpt>` of the document, not of its segment.

use crate::segment::check_time_order;
use crate::{GeoRefError, Result, TrackPoint};
use chrono::NaiveDateTime;
use std::io::Read;
use std::path::Path;

/// Parse a GPX timestamp into UTC epoch seconds
///
/// Accepts exactly `YYYY-MM-DDTHH:MM:SS[.fraction]Z`. Anything else (timezone offsets,
/// a space instead of `T`, missing digits, an empty fraction) returns `None`.
pub fn parse_time(value: &str) -> Option<f64> {
    let bytes = value.as_bytes();
    if bytes.len() < 20 || bytes[bytes.len() - 1] != b'Z' {
        return None;
    }
    // Fixed-width date and time, then an optional fraction, then 'Z'
    const SHAPE: &[u8; 19] = b"dddd-dd-ddTdd:dd:dd";
    for (byte, expected) in bytes[..19].iter().zip(SHAPE) {
        let ok = match expected {
            b'd' => byte.is_ascii_digit(),
            literal => byte == literal,
        };
        if !ok {
            return None;
        }
    }
    let fraction = &value[19..value.len() - 1];
    let fraction_seconds = if fraction.is_empty() {
        0.0
    } else {
        let digits = fraction.strip_prefix('.')?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        format!("0.{digits}").parse::<f64>().ok()?
    };

    let datetime = NaiveDateTime::parse_from_str(&value[..19], "%Y-%m-%dT%H:%M:%S").ok()?;
    Some(datetime.and_utc().timestamp() as f64 + fraction_seconds)
}

fn parse_coordinate(
    trkpt: &roxmltree::Node,
    name: &str,
    limit: f64,
    label: &str,
    index: usize,
) -> Result<f64> {
    let invalid = |reason: String| GeoRefError::InvalidCoordinate {
        file: label.to_string(),
        index,
        reason,
    };
    let raw = trkpt
        .attribute(name)
        .ok_or_else(|| invalid(format!("missing {name} attribute")))?;
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| invalid(format!("{name}={raw:?} is not a number")))?;
    if !value.is_finite() || value.abs() > limit {
        return Err(invalid(format!("{name}={value} is out of range")));
    }
    Ok(value)
}

fn parse_track_point(trkpt: &roxmltree::Node, label: &str, index: usize) -> Result<TrackPoint> {
    let lat = parse_coordinate(trkpt, "lat", 90.0, label, index)?;
    let lon = parse_coordinate(trkpt, "lon", 180.0, label, index)?;

    let time = trkpt
        .descendants()
        .find(|n| n.has_tag_name("time"))
        .ok_or_else(|| GeoRefError::MissingTimestamp {
            file: label.to_string(),
            index,
        })?;
    let text = time.text().map(str::trim).unwrap_or_default();
    let timestamp = parse_time(text).ok_or_else(|| GeoRefError::MalformedTimestamp {
        file: label.to_string(),
        index,
        value: text.to_string(),
    })?;

    Ok(TrackPoint::new(lat, lon, timestamp))
}

/// `first_index` is the document-wide index of the segment's first point
fn parse_track_segment(
    trkseg: roxmltree::Node,
    label: &str,
    first_index: usize,
) -> Result<Vec<TrackPoint>> {
    let points = trkseg
        .descendants()
        .filter(|n| n.has_tag_name("trkpt"))
        .enumerate()
        .map(|(i, trkpt)| parse_track_point(&trkpt, label, first_index + i))
        .collect::<Result<Vec<_>>>()?;
    check_time_order(label, &points, first_index)?;
    Ok(points)
}

/// Parse a GPX document held in memory
///
/// `label` identifies the source in errors (usually the file path).
pub fn read_str(xml: &str, label: &str) -> Result<Vec<Vec<TrackPoint>>> {
    #[cfg(feature = "profiling")]
    profiling::scope!("gpx::read_str");

    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };
    let doc = roxmltree::Document::parse_with_options(xml, options).map_err(|e| {
        GeoRefError::MalformedDocument {
            file: label.to_string(),
            reason: e.to_string(),
        }
    })?;

    let mut segments = Vec::new();
    let mut next_index = 0;
    for trk in doc.descendants().filter(|n| n.has_tag_name("trk")) {
        for trkseg in trk.descendants().filter(|n| n.has_tag_name("trkseg")) {
            let points = parse_track_segment(trkseg, label, next_index)?;
            next_index += points.len();
            if points.is_empty() {
                tracing::debug!("{label}: skipping empty track segment");
                continue;
            }
            segments.push(points);
        }
    }
    Ok(segments)
}

/// Parse a GPX document from any reader
pub fn read<R: Read>(mut reader: R, label: &str) -> Result<Vec<Vec<TrackPoint>>> {
    let mut xml = String::new();
    reader
        .read_to_string(&mut xml)
        .map_err(|err| match err.kind() {
            std::io::ErrorKind::InvalidData => GeoRefError::MalformedDocument {
                file: label.to_string(),
                reason: "document is not valid UTF-8".to_string(),
            },
            _ => GeoRefError::Io {
                file: label.to_string(),
                err,
            },
        })?;
    read_str(&xml, label)
}

/// Parse a GPX file, labelling errors and segments with its path
pub fn read_file(path: &Path) -> Result<Vec<Vec<TrackPoint>>> {
    let label = path.display().to_string();
    let file = std::fs::File::open(path).map_err(|err| GeoRefError::Io {
        file: label.clone(),
        err,
    })?;
    read(std::io::BufReader::new(file), &label)
}

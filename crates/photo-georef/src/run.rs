use crate::precision;
use crate::settings::Settings;
use anyhow::Context;
use photo_georef_lib::batch::{resolve_batch, resolve_batch_parallel};
use photo_georef_lib::{ExifTool, GeoReferencer, PositionMap, calculate_offset};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Load the tracks, georeference every image and write the results
pub fn run(settings: &Settings) -> anyhow::Result<PositionMap> {
    let referencer = GeoReferencer::from_files(&settings.tracks, settings.georef_config())
        .context("failed to load tracks")?;

    let info = referencer.segments().info();
    tracing::info!(
        "Loaded {} track files: {} segments, {} gaps bridged, {} points",
        settings.tracks.len(),
        info.real_segments,
        info.virtual_segments,
        info.total_points
    );
    if let Some((start, end)) = info.time_range {
        tracing::debug!("Tracks cover {start} to {end}");
    }

    if let Some(path) = &settings.dump_tracks {
        let mut writer = create(path)?;
        serde_json::to_writer_pretty(&mut writer, referencer.segments().real_segments())
            .with_context(|| format!("failed to write {}", path.display()))?;
        writer.flush()?;
        tracing::info!("Track segments written to {}", path.display());
    }

    let offset = calculate_offset(settings.timezone, settings.offset);
    tracing::debug!(
        "Camera time zone {} h, skew {} s: offset {offset} s",
        settings.timezone,
        settings.offset
    );

    let exiftool = ExifTool::default();
    let positions = if settings.sequential {
        resolve_batch(&settings.images, offset, &referencer, &exiftool)
    } else {
        resolve_batch_parallel(&settings.images, offset, &referencer, &exiftool)
    }
    .context("failed to georeference images")?;

    precision::report(&positions, &settings.precision_thresholds());

    match &settings.output {
        Some(path) => {
            write_positions(create(path)?, &positions)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!("Results written to {}", path.display());
        }
        None => write_positions(std::io::stdout().lock(), &positions)?,
    }

    Ok(positions)
}

fn create(path: &Path) -> anyhow::Result<BufWriter<File>> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

fn write_positions<W: Write>(mut writer: W, positions: &PositionMap) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut writer, positions)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

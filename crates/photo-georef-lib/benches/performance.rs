//! Performance benchmarks for photo-georef-lib
//!
//! Run with: cargo bench --package photo-georef-lib

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use photo_georef_lib::{Config, GeoReferencer, SegmentCollectionBuilder, TrackPoint};

/// Generate a 1 Hz walking track with a little lateral noise
fn generate_track(num_points: usize, start: f64, base_lat: f64, base_lon: f64) -> Vec<TrackPoint> {
    (0..num_points)
        .map(|i| {
            let t = i as f64;
            let lat = base_lat + t * 4e-6 + (t * 0.7).sin() * 2e-6;
            let lon = base_lon + t * 4e-6 + (t * 0.3).cos() * 2e-6;
            TrackPoint::new(lat, lon, start + t)
        })
        .collect()
}

/// Generate daily recordings separated by overnight gaps
fn generate_builder(num_tracks: usize, points_per_track: usize) -> SegmentCollectionBuilder {
    let mut builder = SegmentCollectionBuilder::new();
    for i in 0..num_tracks {
        let start = 1_600_000_000.0 + i as f64 * 86_400.0;
        let points = generate_track(points_per_track, start, 49.2 + i as f64 * 0.01, 16.5);
        builder
            .add_point_sequences(&format!("day-{i}.gpx"), vec![points])
            .unwrap();
    }
    builder
}

// ============================================================================
// Core Benchmarks - Key performance indicators
// ============================================================================

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");

    for num_tracks in [1, 10, 50] {
        let referencer = GeoReferencer::new(generate_builder(num_tracks, 3_600).build(), Config::default());
        // Middle of the last recording: worst case for the linear scans
        let timestamp = 1_600_000_000.0 + (num_tracks - 1) as f64 * 86_400.0 + 1_800.5;

        group.bench_with_input(
            BenchmarkId::new("last_track_middle", num_tracks),
            &timestamp,
            |b, &timestamp| {
                b.iter(|| referencer.resolve(black_box(timestamp), 0.0));
            },
        );
    }

    let referencer = GeoReferencer::new(generate_builder(10, 3_600).build(), Config::default());
    group.bench_function("gap_10_tracks", |b| {
        b.iter(|| referencer.resolve(black_box(1_600_040_000.0), 0.0));
    });
    group.bench_function("no_coverage_10_tracks", |b| {
        b.iter(|| referencer.resolve(black_box(1.0), 0.0));
    });

    group.finish();
}

fn bench_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("construction");
    group.sample_size(20);

    let num_tracks = 100;
    let points_per_track = 3_600;
    group.throughput(Throughput::Elements((num_tracks * points_per_track) as u64));
    group.bench_function("build_100x3600", |b| {
        b.iter(|| generate_builder(num_tracks, points_per_track).build());
    });

    group.finish();
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group!(benches, bench_resolve, bench_construction);

criterion_main!(benches);

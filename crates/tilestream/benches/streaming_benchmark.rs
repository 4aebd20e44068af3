//! Benchmark for the streaming scheduler.
//!
//! TARGET: a synchronous tick for a moving viewpoint stays inside the
//! default 15 ms frame budget
//!
//! Run with: cargo bench --package tilestream --bench streaming_benchmark

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use tilestream::{StreamingConfig, StreamingScheduler, Viewpoint};
use tilestream_shared::{IVec3, Quat, Vec3};
use tilestream_wfc::{ClusterCoord, Direction, Tile, TileCatalog, Tilemap, TilemapConfig};

const GRASS: Tile = Tile::new(1, 0);
const ROAD: Tile = Tile::new(2, 0);
const WATER: Tile = Tile::new(3, 0);

fn catalog() -> Arc<TileCatalog> {
    let mut catalog = TileCatalog::new(Vec3::new(2.0, 1.0, 2.0));
    catalog.add_tile(GRASS, 4.0);
    catalog.add_tile(ROAD, 1.0);
    catalog.add_tile(WATER, 2.0);
    for direction in Direction::HORIZONTAL {
        catalog.allow(GRASS, direction, GRASS, 1.0);
        catalog.allow_pair(GRASS, direction, ROAD, 1.0);
        catalog.allow_pair(GRASS, direction, WATER, 0.5);
        catalog.allow(ROAD, direction, ROAD, 2.0);
        catalog.allow(WATER, direction, WATER, 1.0);
    }
    Arc::new(catalog)
}

fn tilemap(seed: u64) -> Tilemap {
    let config = TilemapConfig {
        seed,
        fillers: vec![GRASS],
        ..TilemapConfig::default()
    };
    Tilemap::new(catalog(), &config).expect("valid config")
}

fn streaming_config() -> StreamingConfig {
    StreamingConfig {
        multithreaded: false,
        max_generation_distance: 32.0,
        fade_out_distance: 16.0,
        ..StreamingConfig::default()
    }
}

fn view_at(z: f32) -> Viewpoint {
    Viewpoint::perspective(Vec3::new(0.0, 2.0, z), Quat::IDENTITY, 60.0, 16.0 / 9.0)
}

fn benchmark_region_for(c: &mut Criterion) {
    let map = tilemap(1);
    let scheduler = StreamingScheduler::new(streaming_config(), &map).expect("valid config");
    let view = view_at(0.0);

    c.bench_function("region_for_frustum", |b| {
        b.iter(|| black_box(scheduler.region_for(black_box(&view), 32.0)));
    });
}

fn benchmark_full_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_pass");
    group.sample_size(10);

    group.bench_function("fresh_map_radius_32", |b| {
        let mut seed = 0u64;
        b.iter_batched(
            || {
                seed += 1;
                let map = tilemap(seed);
                let scheduler =
                    StreamingScheduler::new(streaming_config(), &map).expect("valid config");
                (map, scheduler)
            },
            |(mut map, scheduler)| {
                black_box(scheduler.run_pass(&mut map, &view_at(0.0), None, || false))
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn benchmark_walking_tick(c: &mut Criterion) {
    let mut map = tilemap(7);
    let scheduler = StreamingScheduler::new(streaming_config(), &map).expect("valid config");
    // warm start: the area around the origin is already generated
    let _ = scheduler.run_pass(&mut map, &view_at(0.0), None, || false);

    c.bench_function("tick_walking_viewpoint", |b| {
        let mut z = 0.0_f32;
        b.iter(|| {
            z += 0.5;
            black_box(scheduler.tick(&mut map, &view_at(z)))
        });
    });
}

fn benchmark_eviction(c: &mut Criterion) {
    let scheduler = StreamingScheduler::new(streaming_config(), &tilemap(1)).expect("valid config");
    let view = view_at(0.0);

    c.bench_function("evict_256_clusters_behind", |b| {
        b.iter_batched(
            || {
                let mut map = tilemap(1);
                for x in -8..8 {
                    for z in -20..-4 {
                        map.get_or_create_cluster(ClusterCoord(IVec3::new(x, 0, z)));
                    }
                }
                map
            },
            |mut map| black_box(scheduler.evict(&mut map, &view)),
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(
    benches,
    benchmark_region_for,
    benchmark_full_pass,
    benchmark_walking_tick,
    benchmark_eviction,
);
criterion_main!(benches);

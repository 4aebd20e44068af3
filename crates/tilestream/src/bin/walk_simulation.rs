//! # Walk Simulation
//!
//! Headless streaming run: a viewpoint walks forward across the map, turning
//! now and then, while the streamer generates ahead and evicts behind.
//!
//! Usage: `walk_simulation [config.toml]`
//!
//! Without a config file the defaults are used (threaded mode).

use std::sync::Arc;
use std::time::{Duration, Instant};

use tilestream::{Presenter, StreamingScheduler, TileStreamer, Viewpoint, WfcConfig};
use tilestream_shared::{Quat, Vec3};
use tilestream_wfc::{ClusterKey, Direction, Tile, TileCatalog, TileRequest, Tilemap};

const FRAMES: u32 = 600;
const FRAME_TIME: Duration = Duration::from_millis(16);
const WALK_SPEED: f32 = 0.5;

const GRASS: Tile = Tile::new(1, 0);
const ROAD: Tile = Tile::new(2, 0);
const ROAD_TURNED: Tile = Tile::new(2, 1);
const WATER: Tile = Tile::new(3, 0);
const SHORE: Tile = Tile::new(4, 0);

/// Counts what would be on screen.
#[derive(Default)]
struct CountingPresenter {
    live_clusters: usize,
    live_tiles: usize,
    peak_tiles: usize,
    logs: usize,
}

impl Presenter for CountingPresenter {
    type ClusterHandle = ClusterKey;
    type TileHandle = Tile;

    fn create_cluster(&mut self, key: ClusterKey) -> ClusterKey {
        self.live_clusters += 1;
        key
    }

    fn destroy_cluster(&mut self, _handle: ClusterKey) {
        self.live_clusters -= 1;
    }

    fn create_tile(&mut self, request: &TileRequest, _cluster: &ClusterKey) -> Tile {
        self.live_tiles += 1;
        self.peak_tiles = self.peak_tiles.max(self.live_tiles);
        request.tile
    }

    fn destroy_tile(&mut self, _handle: Tile) {
        self.live_tiles -= 1;
    }

    fn log(&mut self, _message: &str) {
        self.logs += 1;
    }
}

fn terrain_catalog() -> TileCatalog {
    let mut catalog = TileCatalog::new(Vec3::new(2.0, 1.0, 2.0));
    catalog.add_tile(GRASS, 4.0);
    catalog.add_tile(ROAD, 1.0);
    catalog.add_tile(ROAD_TURNED, 1.0);
    catalog.add_tile(WATER, 2.0);
    catalog.add_tile(SHORE, 1.0);

    for direction in Direction::HORIZONTAL {
        for tile in [GRASS, ROAD, ROAD_TURNED, SHORE] {
            catalog.allow(GRASS, direction, tile, 1.0);
            catalog.allow(tile, direction, GRASS, 1.0);
        }
        catalog.allow(WATER, direction, WATER, 1.0);
        catalog.allow_pair(WATER, direction, SHORE, 0.5);
        catalog.allow(SHORE, direction, SHORE, 1.0);
    }
    catalog.allow_pair(ROAD, Direction::PosX, ROAD, 2.0);
    catalog.allow_pair(ROAD_TURNED, Direction::PosZ, ROAD_TURNED, 2.0);
    catalog
}

fn main() {
    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║         TILESTREAM - WALK SIMULATION                             ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();

    let config = match std::env::args().nth(1) {
        Some(path) => match WfcConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load {path}: {e}");
                std::process::exit(1);
            }
        },
        None => WfcConfig::default(),
    };

    println!("┌─ CONFIGURATION ─────────────────────────────────────────────────┐");
    println!("│ Seed:               {}", config.tilemap.seed);
    println!("│ Cluster Size:       {:?}", config.tilemap.cluster_size);
    println!("│ Max Depth:          {}", config.tilemap.max_depth);
    println!("│ Threaded:           {}", config.streaming.multithreaded);
    println!("│ Generation Radius:  {}", config.streaming.max_generation_distance);
    println!("│ Fade-out Distance:  {}", config.streaming.fade_out_distance);
    println!("└──────────────────────────────────────────────────────────────────┘");
    println!();

    let tilemap = match Tilemap::new(Arc::new(terrain_catalog()), &config.tilemap) {
        Ok(tilemap) => tilemap,
        Err(e) => {
            eprintln!("Invalid tilemap config: {e}");
            std::process::exit(1);
        }
    };
    let scheduler = match StreamingScheduler::new(config.streaming.clone(), &tilemap) {
        Ok(scheduler) => scheduler,
        Err(e) => {
            eprintln!("Invalid streaming config: {e}");
            std::process::exit(1);
        }
    };
    let mut streamer = match TileStreamer::new(tilemap, scheduler, CountingPresenter::default()) {
        Ok(streamer) => streamer,
        Err(e) => {
            eprintln!("Failed to start streamer: {e}");
            std::process::exit(1);
        }
    };

    println!("Walking {FRAMES} frames...");
    let start = Instant::now();
    let mut position = Vec3::new(0.0, 2.0, 0.0);
    let mut yaw = 0.0_f32;
    let mut updated_frames = 0u32;
    let mut evicted = 0usize;
    let mut worst_frame = Duration::ZERO;

    for frame in 0..FRAMES {
        if frame % 150 == 149 {
            yaw += 90.0;
        }
        let rotation = Quat::from_yaw(yaw);
        position = position + rotation.forward() * WALK_SPEED;
        let view = Viewpoint::perspective(position, rotation, 60.0, 16.0 / 9.0);

        let frame_start = Instant::now();
        let report = streamer.update(&view);
        worst_frame = worst_frame.max(frame_start.elapsed());
        if report.updated {
            updated_frames += 1;
        }
        evicted += report.evicted;

        if streamer.is_threaded() {
            std::thread::sleep(FRAME_TIME);
        }
    }
    let elapsed = start.elapsed();
    let streamer_threaded = streamer.is_threaded();

    let (tilemap, presenter) = match streamer.shutdown() {
        Ok(parts) => parts,
        Err(e) => {
            eprintln!("Shutdown failed: {e}");
            std::process::exit(1);
        }
    };
    let stats = tilemap.stats();

    println!();
    println!("┌─ RESULTS ───────────────────────────────────────────────────────┐");
    println!("│ Real Time:          {:.2} seconds", elapsed.as_secs_f64());
    println!("│ Worst Frame:        {:.2} ms", worst_frame.as_secs_f64() * 1000.0);
    println!("│ Frames Updated:     {updated_frames}/{FRAMES}");
    println!("│ Tiles Observed:     {}", stats.tiles_observed);
    println!("│ Conflicts Repaired: {}", stats.conflicts_repaired);
    println!("│ Conflicts Left:     {}", stats.conflicts_unresolved);
    println!("│ Clusters Created:   {}", stats.clusters_created);
    println!("│ Clusters Removed:   {}", stats.clusters_removed);
    if !streamer_threaded {
        println!("│ Evicted (sync):     {evicted}");
    }
    println!("│ Live Clusters:      {}", presenter.live_clusters);
    println!("│ Live Tiles:         {} (peak {})", presenter.live_tiles, presenter.peak_tiles);
    println!("│ Log Lines:          {}", presenter.logs);
    println!("└──────────────────────────────────────────────────────────────────┘");

    let consistent = presenter.live_clusters == tilemap.store().len();
    println!();
    if consistent {
        println!("✓ Presenter matches the map ({} clusters)", presenter.live_clusters);
    } else {
        println!(
            "✗ Presenter holds {} clusters, map holds {}",
            presenter.live_clusters,
            tilemap.store().len()
        );
    }
}

//! # Solver Integration Tests
//!
//! Draw fairness, boundary seeding, conflict repair, determinism,
//! persistence round-trips and the depth bound, through the public API only.

use std::sync::Arc;

use parking_lot::Mutex;
use tilestream_shared::{IVec3, Vec3};
use tilestream_wfc::{
    Cell, ClusterCoord, ClusterKey, Direction, GenResult, RawTilemap, Tile, TileCatalog,
    TileRegion, Tilemap, TilemapConfig, WeightedCandidateSet, WfcObserver,
};

const A: Tile = Tile::new(1, 0);
const B: Tile = Tile::new(2, 0);
const C: Tile = Tile::new(3, 0);

/// A and B alternate along X and never stack along Z.
fn x_only_catalog() -> TileCatalog {
    let mut catalog = TileCatalog::new(Vec3::new(2.0, 2.0, 2.0));
    catalog.add_tile(A, 1.0);
    catalog.add_tile(B, 1.0);
    catalog.allow_pair(A, Direction::PosX, B, 1.0);
    catalog.allow_pair(B, Direction::PosX, A, 1.0);
    catalog
}

/// Three tiles: A and B alternate along X, anything goes along Z, C is a
/// rare wildcard that fits next to everything.
fn corridor_catalog() -> TileCatalog {
    let mut catalog = x_only_catalog();
    catalog.add_tile(C, 0.25);
    for x in [A, B, C] {
        for y in [A, B, C] {
            catalog.allow(x, Direction::PosZ, y, 1.0);
            catalog.allow(x, Direction::NegZ, y, 1.0);
        }
        catalog.allow_pair(C, Direction::PosX, x, 1.0);
        catalog.allow_pair(x, Direction::PosX, C, 1.0);
    }
    catalog
}

fn line_config(seed: u64, cluster_size: IVec3) -> TilemapConfig {
    TilemapConfig {
        seed,
        min_map_limit: IVec3::new(-64, 0, 0),
        max_map_limit: IVec3::new(64, 0, 0),
        cluster_size,
        ..TilemapConfig::default()
    }
}

#[derive(Default)]
struct Events {
    conflicts: Vec<IVec3>,
    hops: Vec<(IVec3, IVec3, u32)>,
    created: Vec<(IVec3, Tile)>,
    clusters: Vec<ClusterCoord>,
    completes: usize,
}

struct SharedObserver(Arc<Mutex<Events>>);

impl WfcObserver for SharedObserver {
    fn on_tile_created(
        &mut self,
        world: IVec3,
        _cluster: ClusterKey,
        _local: IVec3,
        tile: Tile,
        _candidates: Option<&WeightedCandidateSet<Tile>>,
    ) {
        self.0.lock().created.push((world, tile));
    }

    fn on_propagate(
        &mut self,
        from: IVec3,
        to: IVec3,
        _allowed: &WeightedCandidateSet<Tile>,
        depth: u32,
    ) {
        self.0.lock().hops.push((from, to, depth));
    }

    fn on_conflict(&mut self, world: IVec3) {
        self.0.lock().conflicts.push(world);
    }

    fn on_region_complete(&mut self) {
        self.0.lock().completes += 1;
    }

    fn on_cluster_created(&mut self, coord: ClusterCoord) {
        self.0.lock().clusters.push(coord);
    }
}

/// Test: a two-tile catalog draws each tile about half the time.
#[test]
fn test_scenario_a_fair_draw() {
    let catalog = Arc::new(x_only_catalog());
    let trials = 2_000u32;
    let mut a_count = 0u32;

    for seed in 0..u64::from(trials) {
        let mut map = Tilemap::new(Arc::clone(&catalog), &line_config(seed, IVec3::ONE))
            .expect("valid config");
        let result = map.generate_step(&TileRegion::cell(IVec3::ZERO));
        assert_eq!(result, GenResult::Ok);
        match map.tile_at(IVec3::ZERO) {
            Some(tile) if tile == A => a_count += 1,
            Some(tile) => assert_eq!(tile, B),
            None => panic!("selected cell was not observed"),
        }
    }

    let ratio = f64::from(a_count) / f64::from(trials);
    println!("P(A) over {trials} seeds: {ratio:.3}");
    assert!((0.45..=0.55).contains(&ratio), "draw is biased: {ratio}");
}

/// Test: a new cluster is seeded from its observed neighbor.
#[test]
fn test_scenario_b_boundary_seeding() {
    let catalog = Arc::new(x_only_catalog());
    let config = TilemapConfig {
        max_depth: 1,
        ..line_config(3, IVec3::ONE)
    };
    let mut map = Tilemap::new(Arc::clone(&catalog), &config).expect("valid config");

    map.observe(IVec3::ZERO, A);
    assert_eq!(map.current_clusters(), vec![ClusterCoord::new(0, 0, 0)], "depth 1 stays local");

    let second = map.get_or_create_cluster(ClusterCoord::new(1, 0, 0));
    let seeded = second
        .cell(0)
        .and_then(Cell::candidates)
        .cloned()
        .expect("seeded cell stays unobserved");

    let a = catalog.find_unique_id(A).expect("A registered");
    assert_eq!(&seeded, catalog.adjacent(a, Direction::PosX));
    assert_eq!(seeded.elements().collect::<Vec<_>>(), vec![B]);
}

/// Test: a deep observation walks across cluster seams and alternates.
#[test]
fn test_observation_crosses_clusters() {
    let catalog = Arc::new(x_only_catalog());
    let mut map = Tilemap::new(catalog, &line_config(9, IVec3::new(2, 1, 1)))
        .expect("valid config");

    assert_eq!(map.observe(IVec3::ZERO, A), GenResult::Ok);
    for x in -6..=6i32 {
        let expected = if x.rem_euclid(2) == 0 { A } else { B };
        let cell = map.cell(IVec3::new(x, 0, 0)).expect("cluster created by propagation");
        let remaining: Vec<_> = match cell.observed() {
            Some(tile) => vec![tile],
            None => cell.candidates().map(|s| s.elements().collect()).unwrap_or_default(),
        };
        assert_eq!(remaining, vec![expected], "x = {x}");
    }
}

/// Test: an empty allowed set with filler [B] repairs the cell as B.
#[test]
fn test_scenario_c_conflict_repair() {
    let events = Arc::new(Mutex::new(Events::default()));
    let config = TilemapConfig {
        fillers: vec![B],
        ..line_config(5, IVec3::new(4, 1, 1))
    };
    let mut map = Tilemap::new(Arc::new(x_only_catalog()), &config)
        .expect("valid config")
        .with_observer(Box::new(SharedObserver(Arc::clone(&events))));

    let world = IVec3::new(1, 0, 0);
    let result = map.propagate(world, WeightedCandidateSet::new(), false, 4);

    assert_eq!(result, GenResult::Ok, "repaired conflicts are not failures");
    assert_eq!(map.tile_at(world), Some(B));
    let events = events.lock();
    assert_eq!(events.conflicts, vec![world], "exactly one conflict event");
    assert!(events.created.contains(&(world, B)));
    assert_eq!(map.stats().conflicts_repaired, 1);
}

/// Test: without fillers a conflict is reported and the cell is emptied.
#[test]
fn test_unrepaired_conflict_reports() {
    let mut map = Tilemap::new(Arc::new(x_only_catalog()), &line_config(5, IVec3::ONE))
        .expect("valid config");
    let result = map.propagate(IVec3::ZERO, WeightedCandidateSet::new(), false, 2);
    assert_eq!(result, GenResult::Conflict);
    assert_eq!(map.tile_at(IVec3::ZERO), Some(Tile::EMPTY));

    // The emptied cell no longer counts as generation work.
    assert_eq!(map.generate_step(&TileRegion::cell(IVec3::ZERO)), GenResult::Complete);
}

/// Test: same seed, same catalog, same region => same map.
#[test]
fn test_determinism() {
    let catalog = Arc::new(corridor_catalog().with_fillers(&[C]));
    let config = TilemapConfig {
        seed: 77,
        fillers: vec![C],
        cluster_size: IVec3::new(4, 1, 4),
        ..TilemapConfig::default()
    };
    let region = TileRegion::new(IVec3::new(-6, 0, -6), IVec3::new(9, 0, 9));

    let run = || {
        let mut map = Tilemap::new(Arc::clone(&catalog), &config).expect("valid config");
        assert_eq!(map.generate_region(&region), GenResult::Complete);
        map.export_raw(region.min, region.size())
    };

    let first = run();
    let second = run();
    assert_eq!(first, second);
    assert!(first.tiles.iter().all(|t| !t.is_empty()), "fillers leave no holes");
}

/// Test: export -> encode -> decode -> import reproduces the grid.
#[test]
fn test_raw_roundtrip() {
    let catalog = Arc::new(corridor_catalog().with_fillers(&[C]));
    let config = TilemapConfig {
        seed: 11,
        fillers: vec![C],
        cluster_size: IVec3::new(3, 1, 3),
        ..TilemapConfig::default()
    };
    let region = TileRegion::new(IVec3::new(0, 0, 0), IVec3::new(7, 0, 5));

    let mut source = Tilemap::new(Arc::clone(&catalog), &config).expect("valid config");
    source.generate_region(&region);
    let saved = source.export_raw(region.min, region.size());

    let loaded = RawTilemap::decode(&saved.encode()).expect("own output decodes");
    let mut target = Tilemap::new(catalog, &config).expect("valid config");
    target.import_raw(&loaded, region.min);

    for world in region.iter() {
        assert_eq!(target.tile_at(world), source.tile_at(world), "mismatch at {world:?}");
    }
    assert_eq!(target.export_raw(region.min, region.size()), saved);
}

/// Test: selection stays inside region and limits; None only when done.
#[test]
fn test_entropy_select_bounds() {
    let catalog = Arc::new(corridor_catalog().with_fillers(&[C]));
    let config = TilemapConfig {
        seed: 4,
        fillers: vec![C],
        min_map_limit: IVec3::new(0, 0, 0),
        max_map_limit: IVec3::new(20, 0, 20),
        cluster_size: IVec3::new(4, 1, 4),
        ..TilemapConfig::default()
    };
    let mut map = Tilemap::new(catalog, &config).expect("valid config");
    let region = TileRegion::new(IVec3::new(-3, -2, -3), IVec3::new(2, 2, 3));
    let inside = region.intersect(&map.limits()).expect("overlaps limits");

    let mut steps = 0;
    while let Some(world) = map.entropy_select(&region) {
        assert!(inside.contains(world), "{world:?} outside {inside:?}");
        map.observe_cell(world);
        steps += 1;
        assert!(steps <= inside.volume(), "selection must terminate");
    }
    for world in inside.iter() {
        assert!(map.cell(world).is_some_and(Cell::is_observed), "{world:?} left unobserved");
    }

    let outside = TileRegion::new(IVec3::new(-10, 0, -10), IVec3::new(-1, 0, -1));
    assert_eq!(map.entropy_select(&outside), None);
}

/// Test: candidate weights only ever shrink.
#[test]
fn test_weights_non_increasing() {
    let catalog = Arc::new(corridor_catalog());
    let config = TilemapConfig {
        seed: 21,
        cluster_size: IVec3::new(4, 1, 4),
        ..TilemapConfig::default()
    };
    let mut map = Tilemap::new(catalog, &config).expect("valid config");
    let region = TileRegion::new(IVec3::new(0, 0, 0), IVec3::new(7, 0, 7));
    map.entropy_select(&region);

    let sums = |map: &Tilemap| -> Vec<Option<f32>> {
        region
            .iter()
            .map(|w| map.cell(w).and_then(Cell::candidates).map(WeightedCandidateSet::total_weight))
            .collect()
    };

    let mut previous = sums(&map);
    for _ in 0..40 {
        if map.generate_step(&region) == GenResult::Complete {
            break;
        }
        let current = sums(&map);
        for (before, after) in previous.iter().zip(&current) {
            if let (Some(before), Some(after)) = (before, after) {
                assert!(after <= before, "weight grew from {before} to {after}");
            }
        }
        previous = current;
    }
}

/// Test: no hop ever travels further than the configured depth.
#[test]
fn test_max_depth_bound() {
    let events = Arc::new(Mutex::new(Events::default()));
    // one cluster holds the whole ripple, so no boundary seeding is involved
    let config = TilemapConfig {
        seed: 8,
        max_depth: 4,
        cluster_size: IVec3::new(16, 1, 16),
        ..TilemapConfig::default()
    };
    let mut map = Tilemap::new(Arc::new(corridor_catalog()), &config)
        .expect("valid config")
        .with_observer(Box::new(SharedObserver(Arc::clone(&events))));

    let origin = IVec3::new(8, 0, 8);
    map.observe(origin, A);

    let events = events.lock();
    assert!(!events.hops.is_empty());
    for &(_, to, depth) in &events.hops {
        assert!(depth < 4);
        assert!(
            (to - origin).manhattan() + depth <= 4,
            "hop to {to:?} with {depth} left exceeds depth 4"
        );
        assert_eq!(to.y, origin.y, "no vertical propagation");
    }
    assert_eq!(map.current_clusters().len(), 1);
    println!("{} hops", events.hops.len());
}

/// Test: every cluster holds exactly size.x * size.y * size.z cells.
#[test]
fn test_cluster_cell_counts() {
    let config = TilemapConfig {
        seed: 2,
        cluster_size: IVec3::new(5, 2, 3),
        max_map_limit: IVec3::new(10_000, 1, 10_000),
        fillers: vec![C],
        ..TilemapConfig::default()
    };
    let mut map = Tilemap::new(Arc::new(corridor_catalog().with_fillers(&[C])), &config)
        .expect("valid config");
    map.generate_region(&TileRegion::new(IVec3::new(-4, 0, -4), IVec3::new(4, 1, 4)));

    assert!(map.store().len() > 1);
    for cluster in map.store().iter() {
        assert_eq!(cluster.cell_count(), 5 * 2 * 3);
    }
}

/// Test: the observer sees region completion.
#[test]
fn test_region_complete_event() {
    let events = Arc::new(Mutex::new(Events::default()));
    let mut map = Tilemap::new(Arc::new(x_only_catalog()), &line_config(1, IVec3::new(4, 1, 1)))
        .expect("valid config")
        .with_observer(Box::new(SharedObserver(Arc::clone(&events))));

    let region = TileRegion::new(IVec3::new(0, 0, 0), IVec3::new(3, 0, 0));
    assert_eq!(map.generate_region(&region), GenResult::Complete);
    let events = events.lock();
    assert_eq!(events.completes, 1);
    assert_eq!(events.clusters.len(), map.current_clusters().len(), "one event per cluster");
    // the first draw pins the row, the rest are single-candidate observations
    assert_eq!(map.stats().tiles_observed, 4);
}

/// A and B alternate along both X and Z.
fn checker_catalog() -> TileCatalog {
    let mut catalog = TileCatalog::new(Vec3::new(2.0, 2.0, 2.0));
    catalog.add_tile(A, 1.0);
    catalog.add_tile(B, 1.0);
    for direction in [Direction::PosX, Direction::PosZ] {
        catalog.allow_pair(A, direction, B, 1.0);
        catalog.allow_pair(B, direction, A, 1.0);
    }
    catalog
}

/// Observes A at the origin of a 16x16 area split into clusters of
/// `cluster_size`, all created up front. Returns the reported hops and the
/// final state of every cell.
fn walk_with_clusters(cluster_size: IVec3) -> (Vec<(IVec3, IVec3, u32)>, Vec<Option<Cell>>) {
    let config = TilemapConfig {
        seed: 2,
        max_depth: 6,
        min_map_limit: IVec3::new(-8, 0, -8),
        max_map_limit: IVec3::new(7, 0, 7),
        cluster_size,
        ..TilemapConfig::default()
    };
    let mut map = Tilemap::new(Arc::new(checker_catalog()), &config).expect("valid config");
    let area = map.limits();
    for world in area.iter() {
        map.get_or_create_cluster(ClusterCoord::from_world(world, cluster_size));
    }

    let events = Arc::new(Mutex::new(Events::default()));
    map.set_observer(Some(Box::new(SharedObserver(Arc::clone(&events)))));
    assert_eq!(map.observe(IVec3::ZERO, A), GenResult::Ok);

    let cells = area.iter().map(|world| map.cell(world).cloned()).collect();
    let hops = std::mem::take(&mut events.lock().hops);
    (hops, cells)
}

/// Test: cluster borders do not change the order constraints travel in.
#[test]
fn test_walk_order_ignores_cluster_size() {
    let (large_hops, large_cells) = walk_with_clusters(IVec3::new(16, 1, 16));
    let (small_hops, small_cells) = walk_with_clusters(IVec3::new(2, 1, 2));

    assert!(large_hops.len() > 20, "walk too shallow: {} hops", large_hops.len());
    assert_eq!(large_hops, small_hops);
    assert_eq!(large_cells, small_cells);

    // depth-first: the first hops run straight along +X until depth runs out
    let x = |x| IVec3::new(x, 0, 0);
    assert_eq!(
        &large_hops[..6],
        &[
            (x(0), x(1), 5),
            (x(1), x(2), 4),
            (x(2), x(3), 3),
            (x(3), x(4), 2),
            (x(4), x(5), 1),
            (x(5), x(6), 0),
        ]
    );
}

/// Test: a hop that arrives with no depth left is still reported.
#[test]
fn test_zero_depth_hops_are_reported() {
    let events = Arc::new(Mutex::new(Events::default()));
    let config = TilemapConfig {
        max_depth: 2,
        ..line_config(4, IVec3::new(8, 1, 1))
    };
    let mut map = Tilemap::new(Arc::new(x_only_catalog()), &config)
        .expect("valid config")
        .with_observer(Box::new(SharedObserver(Arc::clone(&events))));

    map.observe(IVec3::ZERO, A);

    let events = events.lock();
    let x = |x| IVec3::new(x, 0, 0);
    assert_eq!(
        events.hops,
        vec![
            (x(0), x(1), 1),
            (x(1), x(2), 0),
            (x(1), x(0), 0),
            (x(0), x(-1), 1),
            (x(-1), x(0), 0),
            (x(-1), x(-2), 0),
        ]
    );
    assert_eq!(
        map.cell(x(2)).and_then(Cell::candidates).map(WeightedCandidateSet::len),
        Some(2),
        "a zero-depth hop relaxes nothing"
    );
}

/// Test: a conflict raised while seeding a new cluster is reported by the
/// generation step that created it.
#[test]
fn test_seeding_conflict_reported() {
    // nothing may follow A along +X
    let mut catalog = TileCatalog::new(Vec3::new(2.0, 2.0, 2.0));
    catalog.add_tile(A, 1.0);
    catalog.add_tile(B, 1.0);
    catalog.allow_pair(B, Direction::PosX, A, 1.0);

    let events = Arc::new(Mutex::new(Events::default()));
    let config = TilemapConfig {
        max_depth: 1,
        ..line_config(6, IVec3::new(4, 1, 1))
    };
    let mut map = Tilemap::new(Arc::new(catalog), &config)
        .expect("valid config")
        .with_observer(Box::new(SharedObserver(Arc::clone(&events))));

    assert_eq!(map.observe(IVec3::new(3, 0, 0), A), GenResult::Ok);
    assert_eq!(map.current_clusters(), vec![ClusterCoord::new(0, 0, 0)]);

    let edge = IVec3::new(4, 0, 0);
    assert_eq!(map.generate_step(&TileRegion::cell(edge)), GenResult::Conflict);
    assert_eq!(map.tile_at(edge), Some(Tile::EMPTY));
    assert_eq!(map.stats().conflicts_unresolved, 1);
    assert_eq!(events.lock().conflicts, vec![edge]);

    // reported once
    assert_eq!(map.generate_step(&TileRegion::cell(edge)), GenResult::Complete);
}

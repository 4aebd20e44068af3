//! # Tilemap
//!
//! The owned WFC state: catalog handle, cluster store, map limits, filler
//! policy, RNG and the two outbound seams (materialization sink, observer).
//!
//! This module covers cluster lifecycle and materialization. The generation
//! step itself lives in [`crate::propagation`].

use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tilestream_shared::constants::{
    DEFAULT_CLUSTER_SIZE, DEFAULT_MAX_DEPTH, DEFAULT_MAX_MAP_LIMIT, DEFAULT_MIN_MAP_LIMIT,
    MAX_CLUSTER_CELLS,
};
use tilestream_shared::{IVec3, Quat};

use crate::candidates::WeightedCandidateSet;
use crate::catalog::TileCatalog;
use crate::cluster::{Cell, Cluster, ClusterCoord};
use crate::error::ConfigError;
use crate::events::{MaterializationSink, NullSink, TileKey, TileRequest, WfcObserver};
use crate::propagation::{GenResult, Hop};
use crate::raw::RawTilemap;
use crate::tile::{Direction, Tile, TileRegion};

/// Solver configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TilemapConfig {
    /// RNG seed. Same seed + catalog + calls = same map.
    pub seed: u64,
    /// Maximum neighbor hops per constraint update.
    pub max_depth: u32,
    /// Inclusive lower map limit.
    pub min_map_limit: IVec3,
    /// Inclusive upper map limit.
    pub max_map_limit: IVec3,
    /// Cluster extent in cells.
    pub cluster_size: IVec3,
    /// Tiles used to repair conflicts. Empty disables repair.
    pub fillers: Vec<Tile>,
}

impl Default for TilemapConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            max_depth: DEFAULT_MAX_DEPTH,
            min_map_limit: IVec3::new(
                DEFAULT_MIN_MAP_LIMIT[0],
                DEFAULT_MIN_MAP_LIMIT[1],
                DEFAULT_MIN_MAP_LIMIT[2],
            ),
            max_map_limit: IVec3::new(
                DEFAULT_MAX_MAP_LIMIT[0],
                DEFAULT_MAX_MAP_LIMIT[1],
                DEFAULT_MAX_MAP_LIMIT[2],
            ),
            cluster_size: IVec3::new(
                DEFAULT_CLUSTER_SIZE[0],
                DEFAULT_CLUSTER_SIZE[1],
                DEFAULT_CLUSTER_SIZE[2],
            ),
            fillers: Vec::new(),
        }
    }
}

impl TilemapConfig {
    /// Map limits as a region.
    #[must_use]
    pub fn limits(&self) -> TileRegion {
        TileRegion {
            min: self.min_map_limit,
            max: self.max_map_limit,
        }
    }

    /// Checks cluster size (positive, at most [`MAX_CLUSTER_CELLS`] cells)
    /// and limit ordering.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = self.cluster_size;
        if s.x < 1 || s.y < 1 || s.z < 1 {
            return Err(ConfigError::InvalidClusterSize(s));
        }
        let cells = s.x.checked_mul(s.y).and_then(|layer| layer.checked_mul(s.z));
        if cells.map_or(true, |n| n > MAX_CLUSTER_CELLS) {
            return Err(ConfigError::ClusterTooLarge {
                size: s,
                limit: MAX_CLUSTER_CELLS,
            });
        }
        let (min, max) = (self.min_map_limit, self.max_map_limit);
        if min.x > max.x || min.y > max.y || min.z > max.z {
            return Err(ConfigError::InvertedMapLimits { min, max });
        }
        Ok(())
    }
}

/// Running counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TilemapStats {
    /// Clusters allocated.
    pub clusters_created: u64,
    /// Clusters removed.
    pub clusters_removed: u64,
    /// Cells observed by a draw or a forced observation.
    pub tiles_observed: u64,
    /// Conflicts repaired with a filler.
    pub conflicts_repaired: u64,
    /// Conflicts left unresolved.
    pub conflicts_unresolved: u64,
}

/// Owned WFC state.
pub struct Tilemap {
    pub(crate) catalog: Arc<TileCatalog>,
    pub(crate) template: WeightedCandidateSet<Tile>,
    pub(crate) store: crate::store::TilemapStore,
    pub(crate) limits: TileRegion,
    pub(crate) max_depth: u32,
    pub(crate) fillers: Vec<Tile>,
    pub(crate) rng: ChaCha8Rng,
    pub(crate) sink: Box<dyn MaterializationSink + Send>,
    pub(crate) observer: Option<Box<dyn WfcObserver + Send>>,
    pub(crate) stats: TilemapStats,
    pub(crate) next_tile_key: u64,
    /// A seeding walk left a conflict unresolved since the last generation
    /// call returned.
    pub(crate) seed_conflict: bool,
}

impl std::fmt::Debug for Tilemap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tilemap")
            .field("clusters", &self.store.len())
            .field("limits", &self.limits)
            .field("max_depth", &self.max_depth)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl Tilemap {
    /// Creates an empty tilemap. Requests go to a [`NullSink`] until
    /// [`Self::set_sink`] is called.
    ///
    /// Filler tiles are expected to be registered in the catalog already
    /// (see [`TileCatalog::with_fillers`]).
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the configuration is invalid.
    pub fn new(catalog: Arc<TileCatalog>, config: &TilemapConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let template = catalog.unique_tiles().clone();
        tracing::info!(
            "Tilemap ready: {} unique tiles, cluster {:?}, depth {}, seed {}",
            catalog.len(),
            config.cluster_size,
            config.max_depth,
            config.seed
        );
        Ok(Self {
            catalog,
            template,
            store: crate::store::TilemapStore::new(config.cluster_size),
            limits: config.limits(),
            max_depth: config.max_depth,
            fillers: config.fillers.clone(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            sink: Box::new(NullSink),
            observer: None,
            stats: TilemapStats::default(),
            next_tile_key: 0,
            seed_conflict: false,
        })
    }

    /// Builder form of [`Self::set_sink`].
    #[must_use]
    pub fn with_sink(mut self, sink: Box<dyn MaterializationSink + Send>) -> Self {
        self.sink = sink;
        self
    }

    /// Builder form of [`Self::set_observer`].
    #[must_use]
    pub fn with_observer(mut self, observer: Box<dyn WfcObserver + Send>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Replaces the materialization sink, returning the previous one.
    pub fn set_sink(
        &mut self,
        sink: Box<dyn MaterializationSink + Send>,
    ) -> Box<dyn MaterializationSink + Send> {
        std::mem::replace(&mut self.sink, sink)
    }

    /// Installs (or removes) the diagnostic observer.
    pub fn set_observer(&mut self, observer: Option<Box<dyn WfcObserver + Send>>) {
        self.observer = observer;
    }

    /// Shared catalog.
    #[must_use]
    pub fn catalog(&self) -> &Arc<TileCatalog> {
        &self.catalog
    }

    /// Global inclusive map limits.
    #[must_use]
    pub const fn limits(&self) -> TileRegion {
        self.limits
    }

    /// Propagation depth used by observations and seeding.
    #[must_use]
    pub const fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Cluster extent in cells.
    #[must_use]
    pub const fn cluster_size(&self) -> IVec3 {
        self.store.cluster_size()
    }

    /// Counters since creation.
    #[must_use]
    pub const fn stats(&self) -> TilemapStats {
        self.stats
    }

    /// Read access to the cluster directory.
    #[must_use]
    pub const fn store(&self) -> &crate::store::TilemapStore {
        &self.store
    }

    /// Cluster at `coord`, if it exists.
    #[must_use]
    pub fn cluster(&self, coord: ClusterCoord) -> Option<&Cluster> {
        self.store.get(coord)
    }

    /// Sorted snapshot of live cluster coordinates.
    #[must_use]
    pub fn current_clusters(&self) -> Vec<ClusterCoord> {
        self.store.current_clusters()
    }

    /// Cell at a tile coordinate, without creating anything.
    #[must_use]
    pub fn cell(&self, world: IVec3) -> Option<&Cell> {
        let (coord, local) = self.store.locate(world);
        self.store.get(coord).and_then(|c| c.cell_at(local))
    }

    /// Observed tile at a tile coordinate.
    #[must_use]
    pub fn tile_at(&self, world: IVec3) -> Option<Tile> {
        self.cell(world).and_then(Cell::observed)
    }

    // =========================================================================
    // CLUSTER LIFECYCLE
    // =========================================================================

    /// Cluster at `coord`, creating and seeding it if absent.
    ///
    /// A new cluster starts with full catalog candidates, then every
    /// boundary cell facing an existing horizontal neighbor is relaxed
    /// against that neighbor's adjacent cell. Missing neighbors impose no
    /// constraint. A conflict seeding leaves unresolved is reported by the
    /// next generation call ([`Self::generate_step`], [`Self::observe_cell`],
    /// [`Self::observe`] or [`Self::propagate`]) as [`GenResult::Conflict`].
    pub fn get_or_create_cluster(&mut self, coord: ClusterCoord) -> &mut Cluster {
        if !self.store.contains(coord) {
            self.create_cluster(coord);
        }
        self.store.get_or_insert(coord, &self.template)
    }

    fn create_cluster(&mut self, coord: ClusterCoord) {
        self.allocate_cluster(coord);
        self.seed_cluster(coord);
    }

    /// Inserts an unseeded cluster and requests its container.
    pub(crate) fn allocate_cluster(&mut self, coord: ClusterCoord) {
        let key = self.store.get_or_insert(coord, &self.template).key();
        self.stats.clusters_created += 1;
        self.sink.create_cluster(key);
        tracing::debug!("Cluster created at {:?}", coord.0);
    }

    /// Relaxes a fresh cluster's boundary against its existing neighbors.
    pub(crate) fn seed_cluster(&mut self, coord: ClusterCoord) {
        // seeding never creates further clusters
        for hop in self.seed_hops(coord) {
            if self.propagate_from(hop, false) == GenResult::Conflict {
                self.seed_conflict = true;
            }
        }

        if let Some(observer) = self.observer.as_mut() {
            observer.on_cluster_created(coord);
        }
    }

    /// Boundary constraints a new cluster inherits from existing neighbors.
    fn seed_hops(&self, coord: ClusterCoord) -> Vec<Hop> {
        let size = self.store.cluster_size();
        let origin = coord.world_origin(size);
        let mut hops = Vec::new();

        for direction in Direction::HORIZONTAL {
            let Some(neighbor) = self.store.get(coord.offset(direction)) else {
                continue;
            };
            // face of the new cluster toward `direction`, and the touching
            // face of the neighbor
            let (fixed_axis, new_edge, neighbor_edge) = match direction {
                Direction::PosX => (0, size.x - 1, 0),
                Direction::NegX => (0, 0, size.x - 1),
                Direction::PosZ => (2, size.z - 1, 0),
                Direction::NegZ => (2, 0, size.z - 1),
                Direction::PosY | Direction::NegY => continue,
            };
            let span = if fixed_axis == 0 { size.z } else { size.x };
            for y in 0..size.y {
                for t in 0..span {
                    let (new_local, neighbor_local) = if fixed_axis == 0 {
                        (IVec3::new(new_edge, y, t), IVec3::new(neighbor_edge, y, t))
                    } else {
                        (IVec3::new(t, y, new_edge), IVec3::new(t, y, neighbor_edge))
                    };
                    let Some(cell) = neighbor.cell_at(neighbor_local) else {
                        continue;
                    };
                    let world = origin + new_local;
                    if !self.limits.contains(world) {
                        continue;
                    }
                    let Some(allowed) = self.catalog.expand(cell.sources(), direction.opposite())
                    else {
                        continue;
                    };
                    hops.push(Hop {
                        from: neighbor.world_origin() + neighbor_local,
                        to: world,
                        direction: Some(direction.opposite()),
                        allowed,
                        force: false,
                        depth: self.max_depth,
                    });
                }
            }
        }
        hops
    }

    /// Removes a non-persistent cluster, requesting destruction of its
    /// visuals. Returns `false` for a missing or persistent cluster.
    pub fn remove_cluster(&mut self, coord: ClusterCoord) -> bool {
        match self.store.get(coord) {
            Some(cluster) if !cluster.is_persistent() => {}
            Some(_) => {
                tracing::debug!("Refusing to remove persistent cluster {:?}", coord.0);
                return false;
            }
            None => return false,
        }
        let Some(mut cluster) = self.store.remove(coord) else {
            return false;
        };
        cluster.clear(self.sink.as_mut());
        self.stats.clusters_removed += 1;
        tracing::debug!("Cluster removed at {:?}", coord.0);
        true
    }

    /// Marks a cluster as exempt from eviction, creating it if needed.
    pub fn set_persistent(&mut self, coord: ClusterCoord, persistent: bool) {
        self.get_or_create_cluster(coord).set_persistent(persistent);
    }

    // =========================================================================
    // MATERIALIZATION
    // =========================================================================

    /// Reports a freshly observed cell and requests its visual.
    pub(crate) fn finish_observation(
        &mut self,
        coord: ClusterCoord,
        index: usize,
        prior: Option<&WeightedCandidateSet<Tile>>,
    ) {
        let Some(cluster) = self.store.get(coord) else {
            return;
        };
        let local = cluster.local_coords(index);
        let world = cluster.world_origin() + local;
        let key = cluster.key();
        let Some(tile) = cluster.cell(index).and_then(Cell::observed) else {
            return;
        };
        if let Some(observer) = self.observer.as_mut() {
            observer.on_tile_created(world, key, local, tile, prior);
        }
        self.materialize(coord, index);
    }

    /// Requests a visual for an observed cell, replacing any previous one.
    /// Empty tiles get no visual.
    pub(crate) fn materialize(&mut self, coord: ClusterCoord, index: usize) {
        let Some(cluster) = self.store.get_mut(coord) else {
            return;
        };
        let Some(tile) = cluster.cell(index).and_then(Cell::observed) else {
            return;
        };
        if let Some(old) = cluster.set_visual(index, None) {
            self.sink.destroy_tile(old);
        }
        if tile.is_empty() {
            return;
        }

        let key = TileKey(self.next_tile_key);
        self.next_tile_key += 1;
        cluster.set_visual(index, Some(key));

        let world = cluster.world_origin() + cluster.local_coords(index);
        let request = TileRequest {
            key,
            cluster: cluster.key(),
            world,
            local_position: TileRequest::local_position_of(world, self.catalog.grid_size()),
            local_rotation: Quat::from_yaw(tile.yaw_degrees()),
            tile,
        };
        self.sink.create_tile(request);
    }

    // =========================================================================
    // RAW TILEMAPS
    // =========================================================================

    /// Stamps a stored map into the store as observed cells, with `origin`
    /// as the tile coordinate of the map's `(0, 0, 0)`. Cells outside the
    /// map limits are skipped. Nothing propagates: stored maps are complete.
    pub fn import_raw(&mut self, raw: &RawTilemap, origin: IVec3) {
        for (index, &tile) in raw.tiles.iter().enumerate() {
            let world = origin + raw.position(index);
            if !self.limits.contains(world) {
                continue;
            }
            let (coord, local) = self.store.locate(world);
            let cluster = self.get_or_create_cluster(coord);
            let Some(cell_index) = cluster.local_index(local) else {
                continue;
            };
            cluster.set_observed(cell_index, tile);
            self.finish_observation(coord, cell_index, None);
        }
        tracing::info!(
            "Imported raw tilemap {:?} at {:?}",
            raw.map_size,
            origin
        );
    }

    /// Copies `size` cells starting at `origin` into a raw map. Unobserved
    /// and missing cells are written as [`Tile::EMPTY`]. Creates nothing.
    #[must_use]
    pub fn export_raw(&self, origin: IVec3, size: IVec3) -> RawTilemap {
        let mut raw = RawTilemap::new(self.catalog.grid_size(), size);
        for index in 0..raw.tiles.len() {
            let world = origin + raw.position(index);
            raw.tiles[index] = self.tile_at(world).unwrap_or(Tile::EMPTY);
        }
        raw
    }
}

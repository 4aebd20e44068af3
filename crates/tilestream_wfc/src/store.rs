//! Sparse cluster directory.
//!
//! Owns every [`Cluster`]. Callers hold [`ClusterCoord`]s and borrow a
//! cluster only for the duration of one operation. Seeding of new clusters
//! needs the propagation engine, so creation with seeding lives on
//! [`crate::Tilemap`]; this type only allocates, looks up and drops.

use std::collections::HashMap;

use tilestream_shared::IVec3;

use crate::candidates::WeightedCandidateSet;
use crate::cluster::{Cluster, ClusterCoord};
use crate::events::ClusterKey;
use crate::tile::Tile;

/// Directory of clusters keyed by cluster coordinate.
#[derive(Debug)]
pub struct TilemapStore {
    clusters: HashMap<ClusterCoord, Cluster>,
    cluster_size: IVec3,
    next_serial: u64,
}

impl TilemapStore {
    /// Empty store. Size axes below 1 are raised to 1.
    #[must_use]
    pub fn new(cluster_size: IVec3) -> Self {
        Self {
            clusters: HashMap::new(),
            cluster_size: cluster_size.max(IVec3::ONE),
            next_serial: 0,
        }
    }

    /// Extent of every cluster in cells.
    #[must_use]
    pub const fn cluster_size(&self) -> IVec3 {
        self.cluster_size
    }

    /// Number of live clusters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// Whether no cluster exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Whether a cluster exists at `coord`.
    #[must_use]
    pub fn contains(&self, coord: ClusterCoord) -> bool {
        self.clusters.contains_key(&coord)
    }

    /// Cluster at `coord`.
    #[must_use]
    pub fn get(&self, coord: ClusterCoord) -> Option<&Cluster> {
        self.clusters.get(&coord)
    }

    /// Mutable cluster at `coord`.
    pub fn get_mut(&mut self, coord: ClusterCoord) -> Option<&mut Cluster> {
        self.clusters.get_mut(&coord)
    }

    /// Cluster at `coord`, allocating a fresh unseeded one if absent.
    pub fn get_or_insert(
        &mut self,
        coord: ClusterCoord,
        template: &WeightedCandidateSet<Tile>,
    ) -> &mut Cluster {
        let size = self.cluster_size;
        let next_serial = &mut self.next_serial;
        self.clusters.entry(coord).or_insert_with(|| {
            let key = ClusterKey {
                coord,
                serial: *next_serial,
            };
            *next_serial += 1;
            Cluster::new(key, template, size)
        })
    }

    /// Detaches the cluster at `coord`.
    pub fn remove(&mut self, coord: ClusterCoord) -> Option<Cluster> {
        self.clusters.remove(&coord)
    }

    /// Sorted snapshot of every live cluster coordinate.
    #[must_use]
    pub fn current_clusters(&self) -> Vec<ClusterCoord> {
        let mut coords: Vec<_> = self.clusters.keys().copied().collect();
        coords.sort_unstable();
        coords
    }

    /// Every live cluster, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Cluster> + '_ {
        self.clusters.values()
    }

    /// Splits a tile coordinate into its cluster and local coordinate.
    #[must_use]
    pub const fn locate(&self, world: IVec3) -> (ClusterCoord, IVec3) {
        (
            ClusterCoord::from_world(world, self.cluster_size),
            world.rem_euclid(self.cluster_size),
        )
    }
}

//! # Lifecycle Events
//!
//! Two seams leave the solver:
//!
//! - [`MaterializationSink`]: requests to create or destroy the visible
//!   representation of tiles and clusters. The solver never touches
//!   presentation state; it only names things by key.
//! - [`WfcObserver`]: optional diagnostic callbacks fired synchronously at
//!   fixed points of a generation step.

use tilestream_shared::{IVec3, Quat, Vec3};

use crate::candidates::WeightedCandidateSet;
use crate::cluster::ClusterCoord;
use crate::tile::Tile;

// =============================================================================
// KEYS
// =============================================================================

/// Solver-assigned identity of one materialized tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey(pub u64);

/// Solver-assigned identity of one cluster instance.
///
/// The serial differs every time a coordinate is (re)created, so requests for
/// an evicted cluster never alias its replacement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClusterKey {
    /// Cluster coordinate.
    pub coord: ClusterCoord,
    /// Creation serial.
    pub serial: u64,
}

// =============================================================================
// REQUESTS
// =============================================================================

/// Request to materialize one observed tile.
#[derive(Clone, Debug, PartialEq)]
pub struct TileRequest {
    /// Key used by the matching destroy request.
    pub key: TileKey,
    /// Owning cluster.
    pub cluster: ClusterKey,
    /// Tile coordinate.
    pub world: IVec3,
    /// Position in the map container's local space.
    pub local_position: Vec3,
    /// Rotation in the map container's local space.
    pub local_rotation: Quat,
    /// Tile to show.
    pub tile: Tile,
}

impl TileRequest {
    /// Local-space position of a tile coordinate: centered on X and Z,
    /// floor-aligned on Y.
    #[must_use]
    pub fn local_position_of(world: IVec3, grid_size: Vec3) -> Vec3 {
        let p = world.as_vec3();
        Vec3::new(
            (p.x + 0.5) * grid_size.x,
            p.y * grid_size.y,
            (p.z + 0.5) * grid_size.z,
        )
    }
}

/// Receiver of materialization requests.
pub trait MaterializationSink {
    /// A cluster was allocated.
    fn create_cluster(&mut self, key: ClusterKey);

    /// A cluster was removed. Its tiles' destroy requests precede this.
    fn destroy_cluster(&mut self, key: ClusterKey);

    /// A tile was observed and should become visible.
    fn create_tile(&mut self, request: TileRequest);

    /// A previously created tile should disappear.
    fn destroy_tile(&mut self, key: TileKey);

    /// Human-readable message for the logging collaborator.
    fn log(&mut self, message: String) {
        tracing::info!("{message}");
    }
}

/// Sink that discards every request. Headless generation and benches.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl MaterializationSink for NullSink {
    fn create_cluster(&mut self, _key: ClusterKey) {}
    fn destroy_cluster(&mut self, _key: ClusterKey) {}
    fn create_tile(&mut self, _request: TileRequest) {}
    fn destroy_tile(&mut self, _key: TileKey) {}
    fn log(&mut self, _message: String) {}
}

// =============================================================================
// OBSERVER
// =============================================================================

/// Diagnostic callbacks. Every method defaults to a no-op.
#[allow(unused_variables)]
pub trait WfcObserver {
    /// Entropy selection picked `world`.
    fn on_tile_selected(&mut self, world: IVec3) {}

    /// A cell became observed. `candidates` is the set it was drawn from,
    /// `None` for forced observations and conflict repairs.
    fn on_tile_created(
        &mut self,
        world: IVec3,
        cluster: ClusterKey,
        local: IVec3,
        tile: Tile,
        candidates: Option<&WeightedCandidateSet<Tile>>,
    ) {
    }

    /// A constraint moved from `from` to `to` with `depth` hops left.
    fn on_propagate(
        &mut self,
        from: IVec3,
        to: IVec3,
        allowed: &WeightedCandidateSet<Tile>,
        depth: u32,
    ) {
    }

    /// The cell at `world` ran out of candidates.
    fn on_conflict(&mut self, world: IVec3) {}

    /// A generation step found no unobserved cell in its region.
    fn on_region_complete(&mut self) {}

    /// A cluster was allocated and seeded from its neighbors.
    fn on_cluster_created(&mut self, coord: ClusterCoord) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_position_centers_xz() {
        let p = TileRequest::local_position_of(IVec3::new(2, 1, -1), Vec3::new(4.0, 3.0, 2.0));
        assert_eq!(p, Vec3::new(10.0, 3.0, -1.0));
    }
}

//! # Clusters
//!
//! A cluster is a fixed-size block of cells, the unit of lazy creation,
//! streaming and eviction. Cells live in a flat array indexed
//! `x + y * size.x + z * size.x * size.y`.
//!
//! Each cell is either **unobserved** (it still carries a weighted candidate
//! set) or **observed** (a single tile, terminal for the cell's lifetime in
//! this cluster). The enum makes "exactly one of the two" structural.
//!
//! [`Cluster::propagate`] runs the tilemap's depth-first constraint walk
//! restricted to one cluster. Hops that leave the cluster are handed to
//! [`PropagationHooks::on_edge_cross`] instead of being entered.

use tilestream_shared::IVec3;

use crate::candidates::WeightedCandidateSet;
use crate::catalog::TileCatalog;
use crate::events::{ClusterKey, MaterializationSink, TileKey};
use crate::propagation::{walk, Hop, PropagationGrid};
use crate::tile::{Direction, Tile, TileRegion};

/// Integer cluster coordinate (tile coordinate divided by cluster size).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClusterCoord(pub IVec3);

impl ClusterCoord {
    /// Creates a cluster coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self(IVec3::new(x, y, z))
    }

    /// Cluster containing a tile coordinate.
    #[inline]
    #[must_use]
    pub const fn from_world(world: IVec3, cluster_size: IVec3) -> Self {
        Self(world.div_euclid(cluster_size))
    }

    /// Neighboring cluster in `direction`.
    #[must_use]
    pub fn offset(self, direction: Direction) -> Self {
        Self(self.0 + direction.offset())
    }

    /// Tile coordinate of this cluster's local origin.
    #[must_use]
    pub const fn world_origin(self, cluster_size: IVec3) -> IVec3 {
        self.0.mul_elem(cluster_size)
    }
}

/// State of one cell.
#[derive(Clone, Debug, PartialEq)]
pub enum CellState {
    /// Still undecided.
    Unobserved(WeightedCandidateSet<Tile>),
    /// Collapsed to a single tile.
    Observed(Tile),
}

/// One cell: its state plus the key of its materialized visual, if any.
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    state: CellState,
    visual: Option<TileKey>,
}

impl Cell {
    /// State of the cell.
    #[must_use]
    pub const fn state(&self) -> &CellState {
        &self.state
    }

    /// Whether the cell has collapsed.
    #[must_use]
    pub const fn is_observed(&self) -> bool {
        matches!(self.state, CellState::Observed(_))
    }

    /// Observed tile, if any.
    #[must_use]
    pub const fn observed(&self) -> Option<Tile> {
        match self.state {
            CellState::Observed(tile) => Some(tile),
            CellState::Unobserved(_) => None,
        }
    }

    /// Remaining candidates of an unobserved cell.
    #[must_use]
    pub const fn candidates(&self) -> Option<&WeightedCandidateSet<Tile>> {
        match &self.state {
            CellState::Unobserved(set) => Some(set),
            CellState::Observed(_) => None,
        }
    }

    /// Key of the materialized visual.
    #[must_use]
    pub const fn visual(&self) -> Option<TileKey> {
        self.visual
    }

    /// Tiles this cell still stands for: the observed tile, or every
    /// remaining candidate.
    #[must_use]
    pub fn sources(&self) -> Vec<Tile> {
        match &self.state {
            CellState::Observed(tile) => vec![*tile],
            CellState::Unobserved(set) => set.elements().collect(),
        }
    }
}

/// A hop that leaves the cluster.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeCrossing {
    /// Tile coordinate the constraint comes from.
    pub from: IVec3,
    /// Tile coordinate outside this cluster.
    pub to: IVec3,
    /// Direction of travel.
    pub direction: Direction,
    /// Allowed set for the target cell.
    pub allowed: WeightedCandidateSet<Tile>,
    /// Hops left at the target cell.
    pub depth: u32,
}

/// Read-only inputs of a propagation pass.
#[derive(Clone, Copy)]
pub struct PropagationContext<'a> {
    /// Adjacency source.
    pub catalog: &'a TileCatalog,
    /// Global inclusive map limits. No hop leaves them.
    pub limits: &'a TileRegion,
}

/// Callbacks a propagation pass reports through.
pub trait PropagationHooks {
    /// A constraint moves from `from` to `to`, arriving with `depth` hops left.
    fn on_propagate(
        &mut self,
        from: IVec3,
        to: IVec3,
        allowed: &WeightedCandidateSet<Tile>,
        depth: u32,
    );

    /// The cell at `world` ran out of candidates. Return a filler tile to
    /// repair it, or `None` to leave the conflict unresolved.
    fn on_conflict(&mut self, world: IVec3) -> Option<Tile>;

    /// A hop left the cluster.
    fn on_edge_cross(&mut self, crossing: EdgeCrossing);
}

/// What a propagation pass did inside one cluster.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PropagationReport {
    /// Cells whose candidates were relaxed (or visited with force).
    pub visited: u32,
    /// Cell indices repaired with a filler tile. They need materializing.
    pub repaired: Vec<usize>,
    /// Conflicts left unresolved (no filler available).
    pub unresolved: u32,
}

/// What relaxing one cell did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CellOutcome {
    /// Nothing changed that neighbors need to hear about.
    Stop,
    /// Pass the cell's constraint on.
    Continue,
    /// Ran out of candidates and took a filler tile.
    Repaired,
    /// Ran out of candidates and no filler was available.
    Unresolved,
}

/// One cluster as a propagation grid, for [`Cluster::propagate`].
struct ClusterGrid<'a> {
    cluster: &'a mut Cluster,
    origin: IVec3,
    ctx: PropagationContext<'a>,
    hooks: &'a mut dyn PropagationHooks,
    report: PropagationReport,
}

impl PropagationGrid for ClusterGrid<'_> {
    fn enter(&mut self, hop: Hop) -> bool {
        let Some(index) = self.cluster.local_index(hop.to - self.origin) else {
            if let Some(direction) = hop.direction {
                self.hooks.on_edge_cross(EdgeCrossing {
                    from: hop.from,
                    to: hop.to,
                    direction,
                    allowed: hop.allowed,
                    depth: hop.depth,
                });
            }
            return false;
        };
        self.report.visited += 1;

        let hooks = &mut *self.hooks;
        let mut resolve = |world: IVec3| hooks.on_conflict(world);
        let outcome = self.cluster.relax_cell(index, &hop.allowed, hop.force, &mut resolve);
        match outcome {
            CellOutcome::Continue => true,
            CellOutcome::Stop => false,
            CellOutcome::Repaired => {
                self.report.repaired.push(index);
                false
            }
            CellOutcome::Unresolved => {
                self.report.unresolved += 1;
                false
            }
        }
    }

    fn constraint(
        &self,
        from: IVec3,
        to: IVec3,
        direction: Direction,
    ) -> Option<WeightedCandidateSet<Tile>> {
        if !self.ctx.limits.contains(to) {
            return None;
        }
        let cell = self.cluster.cell_at(from - self.origin)?;
        self.ctx.catalog.expand(cell.sources(), direction)
    }

    fn on_propagate(
        &mut self,
        from: IVec3,
        to: IVec3,
        allowed: &WeightedCandidateSet<Tile>,
        depth: u32,
    ) {
        self.hooks.on_propagate(from, to, allowed, depth);
    }
}

/// A fixed-size block of cells.
#[derive(Clone, Debug)]
pub struct Cluster {
    key: ClusterKey,
    size: IVec3,
    cells: Vec<Cell>,
    persistent: bool,
}

impl Cluster {
    /// New cluster whose every cell starts unobserved with a copy of
    /// `template`. Size axes below 1 are raised to 1.
    #[must_use]
    pub fn new(key: ClusterKey, template: &WeightedCandidateSet<Tile>, size: IVec3) -> Self {
        let size = size.max(IVec3::ONE);
        let cells = (0..size.volume())
            .map(|_| Cell {
                state: CellState::Unobserved(template.clone()),
                visual: None,
            })
            .collect();
        Self {
            key,
            size,
            cells,
            persistent: false,
        }
    }

    /// Identity of this cluster instance.
    #[must_use]
    pub const fn key(&self) -> ClusterKey {
        self.key
    }

    /// Cluster coordinate.
    #[must_use]
    pub const fn coord(&self) -> ClusterCoord {
        self.key.coord
    }

    /// Extent in cells.
    #[must_use]
    pub const fn size(&self) -> IVec3 {
        self.size
    }

    /// Tile coordinate of local `(0, 0, 0)`.
    #[must_use]
    pub const fn world_origin(&self) -> IVec3 {
        self.key.coord.world_origin(self.size)
    }

    /// Number of cells (`size.x * size.y * size.z`).
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Whether eviction skips this cluster.
    #[must_use]
    pub const fn is_persistent(&self) -> bool {
        self.persistent
    }

    /// Marks the cluster as exempt from eviction (or not).
    pub fn set_persistent(&mut self, persistent: bool) {
        self.persistent = persistent;
    }

    /// Whether a local coordinate lies inside the cluster.
    #[inline]
    #[must_use]
    pub const fn contains_local(&self, local: IVec3) -> bool {
        local.x >= 0
            && local.y >= 0
            && local.z >= 0
            && local.x < self.size.x
            && local.y < self.size.y
            && local.z < self.size.z
    }

    /// Flat index of a local coordinate.
    #[inline]
    #[must_use]
    pub fn local_index(&self, local: IVec3) -> Option<usize> {
        if !self.contains_local(local) {
            return None;
        }
        let s = self.size;
        usize::try_from(local.x + local.y * s.x + local.z * s.x * s.y).ok()
    }

    /// Local coordinate of a flat index.
    #[must_use]
    pub fn local_coords(&self, index: usize) -> IVec3 {
        let s = self.size;
        let i = i32::try_from(index).unwrap_or(i32::MAX);
        let layer = s.x * s.y;
        IVec3::new(i % s.x, (i % layer) / s.x, i / layer)
    }

    /// Cell by flat index.
    #[must_use]
    pub fn cell(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    /// Cell by local coordinate.
    #[must_use]
    pub fn cell_at(&self, local: IVec3) -> Option<&Cell> {
        self.local_index(local).and_then(|i| self.cells.get(i))
    }

    /// All cells in index order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> + '_ {
        self.cells.iter()
    }

    /// Number of unobserved cells.
    #[must_use]
    pub fn unobserved_count(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_observed()).count()
    }

    /// Collapses a cell to `tile`, discarding its candidates.
    pub fn set_observed(&mut self, index: usize, tile: Tile) {
        if let Some(cell) = self.cells.get_mut(index) {
            cell.state = CellState::Observed(tile);
        }
    }

    /// Replaces the candidates of a cell, making it unobserved again.
    pub fn set_candidates(&mut self, index: usize, set: WeightedCandidateSet<Tile>) {
        if let Some(cell) = self.cells.get_mut(index) {
            cell.state = CellState::Unobserved(set);
        }
    }

    /// Swaps the visual key of a cell, returning the previous one.
    pub fn set_visual(&mut self, index: usize, visual: Option<TileKey>) -> Option<TileKey> {
        self.cells
            .get_mut(index)
            .and_then(|cell| std::mem::replace(&mut cell.visual, visual))
    }

    /// Requests destruction of every materialized tile, then of the cluster.
    pub fn clear(&mut self, sink: &mut dyn MaterializationSink) {
        for cell in &mut self.cells {
            if let Some(key) = cell.visual.take() {
                sink.destroy_tile(key);
            }
        }
        sink.destroy_cluster(self.key);
    }

    /// Relaxes one cell against `allowed`.
    ///
    /// - An unobserved cell keeps only candidates present in the allowed set,
    ///   each capped at the allowed weight. It passes the constraint on only
    ///   if a candidate was removed (or `force` is set).
    /// - An observed cell passes its tile on only when `force` is set (the
    ///   origin of a fresh observation).
    /// - A cell left with no candidates is a conflict: `resolve` may supply
    ///   a filler, otherwise the cell collapses to [`Tile::EMPTY`]. Either
    ///   way nothing propagates from it.
    pub(crate) fn relax_cell(
        &mut self,
        index: usize,
        allowed: &WeightedCandidateSet<Tile>,
        force: bool,
        resolve: &mut dyn FnMut(IVec3) -> Option<Tile>,
    ) -> CellOutcome {
        let world = self.world_origin() + self.local_coords(index);
        let Some(cell) = self.cells.get_mut(index) else {
            return CellOutcome::Stop;
        };
        match &mut cell.state {
            CellState::Unobserved(set) => {
                let changed = set.relax(allowed);
                if !set.is_empty() {
                    return if changed || force {
                        CellOutcome::Continue
                    } else {
                        CellOutcome::Stop
                    };
                }
            }
            CellState::Observed(_) if force => return CellOutcome::Continue,
            CellState::Observed(_) => return CellOutcome::Stop,
        }

        match resolve(world) {
            Some(filler) => {
                cell.state = CellState::Observed(filler);
                CellOutcome::Repaired
            }
            None => {
                cell.state = CellState::Observed(Tile::EMPTY);
                CellOutcome::Unresolved
            }
        }
    }

    /// Relaxes the cell at `local` against `allowed` and ripples the change
    /// through this cluster, at most `depth` hops deep, with the same rules
    /// and visiting order as [`crate::Tilemap::propagate`].
    ///
    /// Only X and Z neighbors are visited. Conflicts go through
    /// [`PropagationHooks::on_conflict`].
    pub fn propagate(
        &mut self,
        local: IVec3,
        allowed: WeightedCandidateSet<Tile>,
        force: bool,
        depth: u32,
        ctx: &PropagationContext<'_>,
        hooks: &mut dyn PropagationHooks,
    ) -> PropagationReport {
        let origin = self.world_origin();
        let mut grid = ClusterGrid {
            cluster: self,
            origin,
            ctx: *ctx,
            hooks,
            report: PropagationReport::default(),
        };
        walk(&mut grid, Hop::start(origin + local, allowed, force, depth));
        grid.report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilestream_shared::Vec3;

    const A: Tile = Tile::new(1, 0);
    const B: Tile = Tile::new(2, 0);

    struct Recorder {
        hops: Vec<(IVec3, IVec3, u32)>,
        crossings: Vec<EdgeCrossing>,
        conflicts: Vec<IVec3>,
        filler: Option<Tile>,
    }

    impl Recorder {
        fn new(filler: Option<Tile>) -> Self {
            Self {
                hops: Vec::new(),
                crossings: Vec::new(),
                conflicts: Vec::new(),
                filler,
            }
        }
    }

    impl PropagationHooks for Recorder {
        fn on_propagate(
            &mut self,
            from: IVec3,
            to: IVec3,
            _allowed: &WeightedCandidateSet<Tile>,
            depth: u32,
        ) {
            self.hops.push((from, to, depth));
        }

        fn on_conflict(&mut self, world: IVec3) -> Option<Tile> {
            self.conflicts.push(world);
            self.filler
        }

        fn on_edge_cross(&mut self, crossing: EdgeCrossing) {
            self.crossings.push(crossing);
        }
    }

    /// A and B alternate along X; along Z anything goes.
    fn checker_catalog() -> TileCatalog {
        let mut catalog = TileCatalog::new(Vec3::ONE);
        catalog.add_tile(A, 1.0);
        catalog.add_tile(B, 1.0);
        catalog.allow_pair(A, Direction::PosX, B, 1.0);
        catalog.allow_pair(B, Direction::PosX, A, 1.0);
        for (x, y) in [(A, A), (A, B), (B, A), (B, B)] {
            catalog.allow(x, Direction::PosZ, y, 1.0);
            catalog.allow(x, Direction::NegZ, y, 1.0);
        }
        catalog
    }

    fn key(x: i32, z: i32) -> ClusterKey {
        ClusterKey {
            coord: ClusterCoord::new(x, 0, z),
            serial: 0,
        }
    }

    fn single(tile: Tile) -> WeightedCandidateSet<Tile> {
        [(tile, 1.0)].into_iter().collect()
    }

    #[test]
    fn test_cluster_layout() {
        let catalog = checker_catalog();
        let cluster = Cluster::new(key(0, 0), catalog.unique_tiles(), IVec3::new(4, 2, 3));
        assert_eq!(cluster.cell_count(), 4 * 2 * 3);
        assert_eq!(cluster.local_index(IVec3::new(1, 1, 1)), Some(1 + 4 + 8));
        for i in 0..cluster.cell_count() {
            assert_eq!(cluster.local_index(cluster.local_coords(i)), Some(i));
            let cell = cluster.cell(i).expect("index in range");
            assert_eq!(cell.candidates(), Some(catalog.unique_tiles()));
            assert!(!cell.is_observed());
        }
        assert_eq!(cluster.local_index(IVec3::new(4, 0, 0)), None);
    }

    #[test]
    fn test_world_origin_negative() {
        let cluster = Cluster::new(key(-1, 2), &WeightedCandidateSet::new(), IVec3::new(8, 1, 8));
        assert_eq!(cluster.world_origin(), IVec3::new(-8, 0, 16));
        assert_eq!(
            ClusterCoord::from_world(IVec3::new(-1, 0, 16), IVec3::new(8, 1, 8)),
            ClusterCoord::new(-1, 0, 2)
        );
    }

    #[test]
    fn test_forced_observation_ripples_along_x() {
        let catalog = checker_catalog();
        let limits = TileRegion::new(IVec3::new(-100, 0, -100), IVec3::new(100, 0, 100));
        let ctx = PropagationContext {
            catalog: &catalog,
            limits: &limits,
        };
        let mut cluster = Cluster::new(key(0, 0), catalog.unique_tiles(), IVec3::new(4, 1, 1));
        cluster.set_observed(0, A);

        let mut hooks = Recorder::new(None);
        let report = cluster.propagate(IVec3::ZERO, single(A), true, 10, &ctx, &mut hooks);

        let row: Vec<_> = (1..4)
            .map(|x| {
                cluster
                    .cell_at(IVec3::new(x, 0, 0))
                    .and_then(Cell::candidates)
                    .map(|s| s.elements().collect::<Vec<_>>())
            })
            .collect();
        assert_eq!(row, vec![Some(vec![B]), Some(vec![A]), Some(vec![B])]);
        assert_eq!(report.unresolved, 0);
        assert!(hooks.conflicts.is_empty());

        // -X from the origin and +X from the last cell leave the cluster;
        // Z neighbors are outside the 1-deep cluster as well.
        assert!(hooks.crossings.iter().any(|c| c.to == IVec3::new(-1, 0, 0)));
        assert!(hooks.crossings.iter().any(|c| c.to == IVec3::new(4, 0, 0)));
        assert!(hooks.crossings.iter().all(|c| c.depth < 10));
    }

    #[test]
    fn test_depth_bounds_hops() {
        let catalog = checker_catalog();
        let limits = TileRegion::new(IVec3::new(-100, 0, -100), IVec3::new(100, 0, 100));
        let ctx = PropagationContext {
            catalog: &catalog,
            limits: &limits,
        };
        let mut cluster = Cluster::new(key(0, 0), catalog.unique_tiles(), IVec3::new(8, 1, 1));
        cluster.set_observed(0, A);

        let mut hooks = Recorder::new(None);
        cluster.propagate(IVec3::ZERO, single(A), true, 3, &ctx, &mut hooks);

        // depth 3: origin, then two more cells are relaxed
        assert!(cluster.cell_at(IVec3::new(2, 0, 0)).and_then(Cell::candidates).is_some_and(|s| s.len() == 1));
        assert_eq!(
            cluster.cell_at(IVec3::new(3, 0, 0)).and_then(Cell::candidates),
            Some(catalog.unique_tiles()),
            "cell beyond the depth bound must be untouched"
        );
        assert!(hooks.hops.iter().all(|&(_, to, depth)| to.manhattan() + depth <= 3));
        assert!(
            hooks.hops.contains(&(IVec3::new(2, 0, 0), IVec3::new(3, 0, 0), 0)),
            "the last hop is reported even though it relaxes nothing"
        );
    }

    #[test]
    fn test_hops_follow_recursive_order() {
        let catalog = checker_catalog();
        let limits = TileRegion::new(IVec3::new(-100, 0, 0), IVec3::new(100, 0, 0));
        let ctx = PropagationContext {
            catalog: &catalog,
            limits: &limits,
        };
        let mut cluster = Cluster::new(key(0, 0), catalog.unique_tiles(), IVec3::new(8, 1, 1));
        cluster.set_observed(0, A);

        let mut hooks = Recorder::new(None);
        cluster.propagate(IVec3::ZERO, single(A), true, 3, &ctx, &mut hooks);

        let x = |x| IVec3::new(x, 0, 0);
        // each branch is exhausted before the next direction of its parent
        assert_eq!(
            hooks.hops,
            vec![
                (x(0), x(1), 2),
                (x(1), x(2), 1),
                (x(2), x(3), 0),
                (x(2), x(1), 0),
                (x(1), x(0), 1),
                (x(0), x(-1), 2),
            ]
        );
        assert_eq!(hooks.crossings.len(), 1);
        assert_eq!(hooks.crossings[0].to, x(-1));
        assert_eq!(hooks.crossings[0].direction, Direction::NegX);
    }

    #[test]
    fn test_limits_block_hops() {
        let catalog = checker_catalog();
        let limits = TileRegion::new(IVec3::new(0, 0, 0), IVec3::new(1, 0, 0));
        let ctx = PropagationContext {
            catalog: &catalog,
            limits: &limits,
        };
        let mut cluster = Cluster::new(key(0, 0), catalog.unique_tiles(), IVec3::new(4, 1, 1));
        cluster.set_observed(0, A);

        let mut hooks = Recorder::new(None);
        cluster.propagate(IVec3::ZERO, single(A), true, 10, &ctx, &mut hooks);

        assert!(hooks.crossings.is_empty());
        assert!(hooks.hops.iter().all(|&(_, to, _)| limits.contains(to)));
        assert_eq!(
            cluster.cell_at(IVec3::new(2, 0, 0)).and_then(Cell::candidates),
            Some(catalog.unique_tiles())
        );
    }

    #[test]
    fn test_conflict_with_and_without_filler() {
        let catalog = checker_catalog();
        let limits = TileRegion::new(IVec3::new(-100, 0, -100), IVec3::new(100, 0, 100));
        let ctx = PropagationContext {
            catalog: &catalog,
            limits: &limits,
        };

        let mut cluster = Cluster::new(key(0, 0), catalog.unique_tiles(), IVec3::new(2, 1, 1));
        let mut hooks = Recorder::new(Some(B));
        let report =
            cluster.propagate(IVec3::ZERO, WeightedCandidateSet::new(), false, 5, &ctx, &mut hooks);
        assert_eq!(report.repaired, vec![0]);
        assert_eq!(hooks.conflicts, vec![IVec3::ZERO]);
        assert_eq!(cluster.cell(0).and_then(Cell::observed), Some(B));
        assert!(hooks.hops.is_empty(), "a repaired cell does not propagate");

        let mut cluster = Cluster::new(key(0, 0), catalog.unique_tiles(), IVec3::new(2, 1, 1));
        let mut hooks = Recorder::new(None);
        let report =
            cluster.propagate(IVec3::ZERO, WeightedCandidateSet::new(), false, 5, &ctx, &mut hooks);
        assert_eq!(report.unresolved, 1);
        assert_eq!(cluster.cell(0).and_then(Cell::observed), Some(Tile::EMPTY));
    }

    #[test]
    fn test_clear_requests_destruction() {
        #[derive(Default)]
        struct Log(Vec<String>);
        impl MaterializationSink for Log {
            fn create_cluster(&mut self, _key: ClusterKey) {}
            fn destroy_cluster(&mut self, key: ClusterKey) {
                self.0.push(format!("cluster {:?}", key.coord));
            }
            fn create_tile(&mut self, _request: crate::events::TileRequest) {}
            fn destroy_tile(&mut self, key: TileKey) {
                self.0.push(format!("tile {}", key.0));
            }
        }

        let mut cluster = Cluster::new(key(1, 0), &WeightedCandidateSet::new(), IVec3::new(2, 1, 1));
        cluster.set_observed(1, A);
        assert_eq!(cluster.set_visual(1, Some(TileKey(9))), None);

        let mut log = Log::default();
        cluster.clear(&mut log);
        assert_eq!(log.0, vec!["tile 9".to_string(), format!("cluster {:?}", ClusterCoord::new(1, 0, 0))]);
        assert_eq!(cluster.cell(1).and_then(Cell::visual), None);
    }
}

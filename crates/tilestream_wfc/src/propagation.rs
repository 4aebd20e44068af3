//! # Propagation Engine
//!
//! One generation step over a search region:
//!
//! 1. **Entropy select**: the unobserved cell with the fewest remaining
//!    candidates inside the region (and the map limits), random tie-break.
//! 2. **Observe**: weighted draw from its candidates.
//! 3. **Propagate**: ripple the new tile's adjacency constraints outward,
//!    at most `max_depth` hops, crossing into neighboring clusters without
//!    breaking the walk. Clusters the walk creates are seeded from their
//!    neighbors once it is done.
//!
//! The walk is depth-first over tile coordinates with one explicit stack of
//! `(cell, next direction)` frames. Each frame visits `+X, -X, +Z, -Z` in
//! turn and descends before trying the next direction, so the visiting
//! order matches a recursive walk and does not depend on cluster size.
//! Every hop is reported, including hops that arrive with zero depth left;
//! those relax nothing.
//!
//! Contradictions are repaired, not undone: a cell that runs out of
//! candidates becomes a random filler tile, or the empty tile if no filler
//! is configured (reported as [`GenResult::Conflict`]).

use rand::Rng;
use tilestream_shared::IVec3;

use crate::candidates::WeightedCandidateSet;
use crate::cluster::{Cell, CellOutcome, ClusterCoord};
use crate::tile::{Direction, Tile, TileRegion};
use crate::tilemap::Tilemap;

/// Outcome of a generation step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenResult {
    /// Work was done.
    Ok,
    /// A conflict could not be repaired. Mutations so far are kept.
    Conflict,
    /// No unobserved cell left in the region.
    Complete,
}

/// A constraint arriving at a tile coordinate.
pub(crate) struct Hop {
    /// Cell the constraint comes from. Equal to `to` for a starting hop.
    pub(crate) from: IVec3,
    pub(crate) to: IVec3,
    /// Direction of travel. `None` for a starting hop.
    pub(crate) direction: Option<Direction>,
    pub(crate) allowed: WeightedCandidateSet<Tile>,
    pub(crate) force: bool,
    /// Hops left at `to`.
    pub(crate) depth: u32,
}

impl Hop {
    /// Starting hop at `world`.
    pub(crate) fn start(
        world: IVec3,
        allowed: WeightedCandidateSet<Tile>,
        force: bool,
        depth: u32,
    ) -> Self {
        Self {
            from: world,
            to: world,
            direction: None,
            allowed,
            force,
            depth,
        }
    }
}

/// Cell storage a propagation walk runs over.
pub(crate) trait PropagationGrid {
    /// Applies `hop` to its target cell. Returns `true` when the walk should
    /// continue from there.
    fn enter(&mut self, hop: Hop) -> bool;

    /// Allowed set `from` imposes on `to`, its neighbor in `direction`.
    /// `None` stops the hop before it is reported.
    fn constraint(
        &self,
        from: IVec3,
        to: IVec3,
        direction: Direction,
    ) -> Option<WeightedCandidateSet<Tile>>;

    /// A constraint moves from `from` to `to`, arriving with `depth` hops left.
    fn on_propagate(
        &mut self,
        from: IVec3,
        to: IVec3,
        allowed: &WeightedCandidateSet<Tile>,
        depth: u32,
    );
}

struct Visit {
    world: IVec3,
    depth: u32,
    next: usize,
}

/// Depth-first constraint walk from `start`.
///
/// A hop arriving with zero depth is reported but never entered. The
/// neighbor constraint is computed when its direction comes up, so it sees
/// whatever the deeper hops did to the source cell in the meantime.
pub(crate) fn walk<G: PropagationGrid + ?Sized>(grid: &mut G, start: Hop) {
    if start.depth == 0 {
        return;
    }
    let (world, depth) = (start.to, start.depth);
    if !grid.enter(start) {
        return;
    }
    let mut stack = vec![Visit {
        world,
        depth,
        next: 0,
    }];

    while let Some(visit) = stack.last_mut() {
        let Some(&direction) = Direction::HORIZONTAL.get(visit.next) else {
            stack.pop();
            continue;
        };
        visit.next += 1;
        let from = visit.world;
        let depth = visit.depth.saturating_sub(1);

        let to = from + direction.offset();
        let Some(allowed) = grid.constraint(from, to, direction) else {
            continue;
        };
        grid.on_propagate(from, to, &allowed, depth);
        if depth == 0 {
            continue;
        }
        let hop = Hop {
            from,
            to,
            direction: Some(direction),
            allowed,
            force: false,
            depth,
        };
        if grid.enter(hop) {
            stack.push(Visit {
                world: to,
                depth,
                next: 0,
            });
        }
    }
}

/// The whole tilemap as a propagation grid.
struct MapGrid<'a> {
    map: &'a mut Tilemap,
    /// Whether hops into absent clusters create them.
    create_missing: bool,
    /// Clusters created by this walk, seeded once it is done.
    created: Vec<ClusterCoord>,
    result: GenResult,
}

impl PropagationGrid for MapGrid<'_> {
    fn enter(&mut self, hop: Hop) -> bool {
        let map = &mut *self.map;
        if !map.limits.contains(hop.to) {
            return false;
        }
        let (coord, local) = map.store.locate(hop.to);
        if !map.store.contains(coord) {
            if !self.create_missing {
                return false;
            }
            map.allocate_cluster(coord);
            self.created.push(coord);
        }

        let (index, outcome) = {
            let Tilemap {
                store,
                rng,
                fillers,
                observer,
                stats,
                ..
            } = &mut *map;
            let Some(cluster) = store.get_mut(coord) else {
                return false;
            };
            let Some(index) = cluster.local_index(local) else {
                return false;
            };
            let mut resolve = |world: IVec3| {
                if let Some(observer) = observer.as_mut() {
                    observer.on_conflict(world);
                }
                if fillers.is_empty() {
                    stats.conflicts_unresolved += 1;
                    tracing::warn!("Unresolved conflict at {:?}", world);
                    return None;
                }
                let filler = fillers[rng.gen_range(0..fillers.len())];
                stats.conflicts_repaired += 1;
                tracing::debug!("Conflict at {:?} repaired with {:?}", world, filler);
                Some(filler)
            };
            let outcome = cluster.relax_cell(index, &hop.allowed, hop.force, &mut resolve);
            (index, outcome)
        };

        match outcome {
            CellOutcome::Continue => true,
            CellOutcome::Stop => false,
            CellOutcome::Repaired => {
                map.finish_observation(coord, index, None);
                false
            }
            CellOutcome::Unresolved => {
                map.sink.log(format!(
                    "generation conflict near {:?}: no filler tile configured",
                    hop.to
                ));
                self.result = GenResult::Conflict;
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
        if !self.map.limits.contains(to) {
            return None;
        }
        let cell = self.map.cell(from)?;
        self.map.catalog.expand(cell.sources(), direction)
    }

    fn on_propagate(
        &mut self,
        from: IVec3,
        to: IVec3,
        allowed: &WeightedCandidateSet<Tile>,
        depth: u32,
    ) {
        if let Some(observer) = self.map.observer.as_mut() {
            observer.on_propagate(from, to, allowed, depth);
        }
    }
}

impl Tilemap {
    /// Runs one walk from `start` over the whole map.
    ///
    /// With `create_missing`, hops into absent clusters create them;
    /// otherwise those hops are dropped. Created clusters are seeded from
    /// their neighbors after the walk, so the walk visits the same cells in
    /// the same order whatever the cluster size.
    pub(crate) fn propagate_from(&mut self, start: Hop, create_missing: bool) -> GenResult {
        let mut grid = MapGrid {
            map: self,
            create_missing,
            created: Vec::new(),
            result: GenResult::Ok,
        };
        walk(&mut grid, start);
        let MapGrid { created, result, .. } = grid;
        for coord in created {
            self.seed_cluster(coord);
        }
        result
    }

    /// Folds a pending seeding conflict into `result`.
    fn settle(&mut self, result: GenResult) -> GenResult {
        if std::mem::take(&mut self.seed_conflict) {
            GenResult::Conflict
        } else {
            result
        }
    }

    /// Unobserved cell with the fewest candidates inside `region` and the map
    /// limits; ties broken uniformly at random. `None` when every cell there
    /// is observed.
    ///
    /// Clusters overlapping the region are created as the scan reaches them.
    pub fn entropy_select(&mut self, region: &TileRegion) -> Option<IVec3> {
        let region = region.intersect(&self.limits)?;
        let mut best = usize::MAX;
        let mut ties: Vec<IVec3> = Vec::new();

        for world in region.iter() {
            let (coord, local) = self.store.locate(world);
            let cluster = self.get_or_create_cluster(coord);
            let Some(count) = cluster
                .cell_at(local)
                .and_then(Cell::candidates)
                .map(WeightedCandidateSet::len)
            else {
                continue;
            };
            if count < best {
                best = count;
                ties.clear();
                ties.push(world);
            } else if count == best {
                ties.push(world);
            }
        }

        if ties.is_empty() {
            return None;
        }
        let pick = self.rng.gen_range(0..ties.len());
        Some(ties[pick])
    }

    /// Collapses the unobserved cell at `world` by a weighted draw from its
    /// candidates, then propagates from it.
    ///
    /// An already observed cell is left alone. A cell whose candidates cannot
    /// be drawn from (all weights zero) collapses to [`Tile::EMPTY`].
    pub fn observe_cell(&mut self, world: IVec3) -> GenResult {
        if !self.limits.contains(world) {
            return self.settle(GenResult::Ok);
        }
        let (coord, local) = self.store.locate(world);
        let cluster = self.get_or_create_cluster(coord);
        let prior = cluster.cell_at(local).and_then(Cell::candidates).cloned();
        let Some(prior) = prior else {
            return self.settle(GenResult::Ok);
        };

        let tile = prior.get(&mut self.rng).unwrap_or_else(|| {
            tracing::debug!("No drawable candidate at {:?}", world);
            Tile::EMPTY
        });
        self.collapse(world, tile, Some(&prior))
    }

    /// Forces the cell at `world` to `tile`, whatever its state, and
    /// propagates from it. Used to stamp fixed tiles (spawn areas) into the
    /// map before or during streaming.
    pub fn observe(&mut self, world: IVec3, tile: Tile) -> GenResult {
        if !self.limits.contains(world) {
            tracing::warn!("Ignoring observation outside map limits at {:?}", world);
            return self.settle(GenResult::Ok);
        }
        let (coord, local) = self.store.locate(world);
        let cluster = self.get_or_create_cluster(coord);
        let prior = cluster.cell_at(local).and_then(Cell::candidates).cloned();
        self.collapse(world, tile, prior.as_ref())
    }

    fn collapse(
        &mut self,
        world: IVec3,
        tile: Tile,
        prior: Option<&WeightedCandidateSet<Tile>>,
    ) -> GenResult {
        let (coord, local) = self.store.locate(world);
        let cluster = self.get_or_create_cluster(coord);
        let Some(index) = cluster.local_index(local) else {
            return self.settle(GenResult::Ok);
        };
        cluster.set_observed(index, tile);
        self.stats.tiles_observed += 1;
        self.finish_observation(coord, index, prior);

        let origin: WeightedCandidateSet<Tile> = [(tile, 1.0)].into_iter().collect();
        let depth = self.max_depth;
        self.propagate(world, origin, true, depth)
    }

    /// Relaxes the cell at `world` against `allowed` and ripples the result
    /// up to `depth` hops, creating neighbor clusters as needed.
    ///
    /// Returns [`GenResult::Conflict`] when this walk, or the seeding of a
    /// cluster created since the last generation call, left a conflict
    /// unresolved.
    pub fn propagate(
        &mut self,
        world: IVec3,
        allowed: WeightedCandidateSet<Tile>,
        force: bool,
        depth: u32,
    ) -> GenResult {
        let result = self.propagate_from(Hop::start(world, allowed, force, depth), true);
        self.settle(result)
    }

    /// One select, observe, propagate step.
    pub fn generate_step(&mut self, region: &TileRegion) -> GenResult {
        let Some(world) = self.entropy_select(region) else {
            if let Some(observer) = self.observer.as_mut() {
                observer.on_region_complete();
            }
            return self.settle(GenResult::Complete);
        };
        if let Some(observer) = self.observer.as_mut() {
            observer.on_tile_selected(world);
        }
        self.observe_cell(world)
    }

    /// Steps until the region is complete or a conflict goes unresolved.
    pub fn generate_region(&mut self, region: &TileRegion) -> GenResult {
        loop {
            match self.generate_step(region) {
                GenResult::Ok => {}
                other => return other,
            }
        }
    }
}

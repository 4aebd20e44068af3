//! # Streaming Scheduler
//!
//! Viewpoint-driven generation and eviction over a [`Tilemap`].
//!
//! ```text
//! distance = inc                          inc = ceil(min(2, max / 10))
//! while distance <= max:
//!     region = frustum AABB at distance, in tiles, clamped to map limits
//!     up to `steps_per_radius` times:
//!         generate_step(region)
//!         Complete  -> distance += inc, next radius
//!         budget    -> stop
//!         reset     -> stop (threaded only)
//! evict: non-persistent, farther than fade-out, and behind the viewpoint
//! ```
//!
//! The scheduler owns no map state; the same instance drives the
//! synchronous path on the caller's thread and the worker loop.

use std::time::{Duration, Instant};

use tilestream_shared::{IVec3, Transform, Vec3};
use tilestream_wfc::{ClusterCoord, GenResult, TileRegion, Tilemap};

use crate::config::StreamingConfig;
use crate::error::{ConfigError, SchedulerResult};
use crate::viewpoint::Viewpoint;

/// What one generation pass did.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PassReport {
    /// `generate_step` calls made.
    pub steps: u32,
    /// Steps that observed a cell (including unresolved conflicts).
    pub generated: u32,
    /// Steps that ended in an unresolved conflict.
    pub conflicts: u32,
    /// Radius at which the pass stopped.
    pub final_distance: f32,
    /// Wall-clock time spent.
    pub elapsed: Duration,
    /// Stopped because the time budget ran out.
    pub budget_exhausted: bool,
    /// Stopped because the abort signal fired.
    pub aborted: bool,
}

impl PassReport {
    /// Whether the map changed during the pass.
    #[must_use]
    pub const fn updated(&self) -> bool {
        self.generated > 0
    }
}

/// Drives generation and eviction for one tilemap from a viewpoint.
#[derive(Clone, Debug)]
pub struct StreamingScheduler {
    config: StreamingConfig,
    container: Transform,
    grid_size: Vec3,
    cluster_size: IVec3,
    limits: TileRegion,
}

impl StreamingScheduler {
    /// Scheduler for `tilemap`, whose container sits at the world origin.
    ///
    /// # Errors
    ///
    /// [`crate::SchedulerError::Config`] when `config` fails validation. A zero
    /// step count or budget would otherwise leave a pass unbounded.
    pub fn new(config: StreamingConfig, tilemap: &Tilemap) -> SchedulerResult<Self> {
        config.validate().map_err(ConfigError::from)?;
        Ok(Self {
            config,
            container: Transform::IDENTITY,
            grid_size: tilemap.catalog().grid_size(),
            cluster_size: tilemap.cluster_size(),
            limits: tilemap.limits(),
        })
    }

    /// Places the map container in world space.
    #[must_use]
    pub const fn with_container(mut self, container: Transform) -> Self {
        self.container = container;
        self
    }

    /// Configuration.
    #[must_use]
    pub const fn config(&self) -> &StreamingConfig {
        &self.config
    }

    /// World transform of the map container.
    #[must_use]
    pub const fn container(&self) -> Transform {
        self.container
    }

    /// Radius of the first ring and the step between rings.
    #[must_use]
    pub fn distance_increment(&self) -> f32 {
        (self.config.max_generation_distance * 0.1).min(2.0).ceil().max(1.0)
    }

    /// Tile coordinate containing a world-space point.
    #[must_use]
    pub fn world_to_tile(&self, world: Vec3) -> IVec3 {
        let local = self.container.inverse_transform_point(world);
        (local - self.config.tile_origin)
            .div_elem(self.grid_size)
            .floor_to_ivec3()
    }

    /// Container-local center of a cluster.
    #[must_use]
    pub fn cluster_center(&self, coord: ClusterCoord) -> Vec3 {
        let c = coord.0.as_vec3() + Vec3::ONE * 0.5;
        self.config.tile_origin + c.mul_elem(self.grid_size).mul_elem(self.cluster_size.as_vec3())
    }

    /// Tiles covered by the viewpoint's frustum cut at `distance`, clamped
    /// to the map limits. `None` when the frustum misses the map entirely.
    ///
    /// The tile holding the far corner is excluded (`start..end`), except on
    /// axes the bounds do not span, which keep their single layer.
    #[must_use]
    pub fn region_for(&self, viewpoint: &Viewpoint, distance: f32) -> Option<TileRegion> {
        let (min, max) = viewpoint.frustum_bounds(distance);
        let start = self.world_to_tile(min);
        let end = self.world_to_tile(max);
        TileRegion::new(start, (end - IVec3::ONE).max(start)).intersect(&self.limits)
    }

    /// One radius-expansion pass.
    ///
    /// Stops when the radius passes the maximum, when `budget` is spent,
    /// or when `should_abort` returns true. Both are checked at the start of
    /// every radius and after each step; `should_abort` is only polled once
    /// the pass has run for the configured reset interval.
    pub fn run_pass<F>(
        &self,
        tilemap: &mut Tilemap,
        viewpoint: &Viewpoint,
        budget: Option<Duration>,
        mut should_abort: F,
    ) -> PassReport
    where
        F: FnMut() -> bool,
    {
        let start = Instant::now();
        let reset_check = Duration::from_millis(self.config.reset_check_interval_ms);
        let increment = self.distance_increment();
        let mut report = PassReport::default();
        let mut distance = increment;

        'radius: while distance <= self.config.max_generation_distance {
            let elapsed = start.elapsed();
            if budget.is_some_and(|b| elapsed > b) {
                report.budget_exhausted = true;
                break;
            }
            if report.steps > 0 && elapsed >= reset_check && should_abort() {
                report.aborted = true;
                break;
            }

            let Some(region) = self.region_for(viewpoint, distance) else {
                distance += increment;
                continue;
            };

            for _ in 0..self.config.steps_per_radius {
                report.steps += 1;
                match tilemap.generate_step(&region) {
                    GenResult::Ok => report.generated += 1,
                    GenResult::Conflict => {
                        report.generated += 1;
                        report.conflicts += 1;
                    }
                    GenResult::Complete => {
                        distance += increment;
                        continue 'radius;
                    }
                }

                let elapsed = start.elapsed();
                if budget.is_some_and(|b| elapsed > b) {
                    report.budget_exhausted = true;
                    break 'radius;
                }
                if elapsed >= reset_check && should_abort() {
                    report.aborted = true;
                    break 'radius;
                }
            }
        }

        report.final_distance = distance;
        report.elapsed = start.elapsed();
        report
    }

    /// Removes every non-persistent cluster that is farther than the
    /// fade-out distance and lies behind the viewpoint. Returns the removed
    /// coordinates in ascending order.
    pub fn evict(&self, tilemap: &mut Tilemap, viewpoint: &Viewpoint) -> Vec<ClusterCoord> {
        let eye = self.container.inverse_transform_point(viewpoint.position);
        let facing = self
            .container
            .inverse_transform_direction(viewpoint.forward())
            .flatten()
            .normalize_or_zero();

        let mut removed = Vec::new();
        for coord in tilemap.current_clusters() {
            if tilemap.cluster(coord).map_or(true, |c| c.is_persistent()) {
                continue;
            }
            let to_center = self.cluster_center(coord) - eye;
            let distance = to_center.length();
            if distance <= self.config.fade_out_distance {
                continue;
            }
            let behind = (to_center * (1.0 / distance)).dot(facing);
            if behind < self.config.eviction_facing_threshold && tilemap.remove_cluster(coord) {
                removed.push(coord);
            }
        }

        if !removed.is_empty() {
            tracing::debug!("Evicted {} clusters", removed.len());
        }
        removed
    }

    /// Synchronous update: one budgeted pass, then eviction.
    pub fn tick(
        &self,
        tilemap: &mut Tilemap,
        viewpoint: &Viewpoint,
    ) -> (PassReport, Vec<ClusterCoord>) {
        let budget = Duration::from_millis(self.config.max_time_per_frame_ms);
        let report = self.run_pass(tilemap, viewpoint, Some(budget), || false);
        let evicted = self.evict(tilemap, viewpoint);
        (report, evicted)
    }
}

//! # Format & Generation Constants
//!
//! Values that both sides of the worker boundary must agree on. The format
//! tags are baked into every stored tilemap and catalog; changing them breaks
//! existing data.

// =============================================================================
// BINARY FORMATS
// =============================================================================

/// Leading tag of a raw tilemap stream.
pub const TILEMAP_FORMAT_TAG: u32 = 0x000D_1060;

/// Leading tag of a tile catalog (unique tiles + adjacency) stream.
pub const CATALOG_FORMAT_TAG: u32 = 0x000D_1061;

/// Number of axis directions stored per unique tile.
pub const DIRECTION_COUNT: usize = 6;

// =============================================================================
// GENERATION DEFAULTS
// =============================================================================

/// Default propagation depth (neighbor hops per constraint update).
pub const DEFAULT_MAX_DEPTH: u32 = 25;

/// Default cluster extent in cells.
pub const DEFAULT_CLUSTER_SIZE: [i32; 3] = [8, 1, 8];

/// Upper bound on cells per cluster. Keeps flat cell indices within `i32`.
pub const MAX_CLUSTER_CELLS: i32 = 1 << 24;

/// Default inclusive lower map limit.
pub const DEFAULT_MIN_MAP_LIMIT: [i32; 3] = [-10_000, 0, -10_000];

/// Default inclusive upper map limit. A single layer in Y.
pub const DEFAULT_MAX_MAP_LIMIT: [i32; 3] = [10_000, 0, 10_000];

/// Base weight given to filler tiles registered into a catalog.
pub const FILLER_WEIGHT: f32 = 0.001;

// =============================================================================
// STREAMING DEFAULTS
// =============================================================================

/// Radius (world units) up to which tiles are generated around the viewpoint.
pub const DEFAULT_MAX_GENERATION_DISTANCE: f32 = 50.0;

/// Distance beyond which clusters behind the viewpoint are evicted.
pub const DEFAULT_FADE_OUT_DISTANCE: f32 = 10.0;

/// Wall-clock budget of one synchronous scheduler call.
pub const DEFAULT_MAX_TIME_PER_FRAME_MS: u64 = 15;

/// Generation steps attempted per radius before re-checking the budget.
pub const DEFAULT_STEPS_PER_RADIUS: u32 = 5;

/// Dot product below which a cluster counts as "behind" the viewpoint.
pub const DEFAULT_EVICTION_FACING_THRESHOLD: f32 = -0.25;

/// Viewpoint translation that restarts radius expansion.
pub const DEFAULT_RESET_DISTANCE: f32 = 10.0;

/// Viewpoint rotation (degrees) that restarts radius expansion.
pub const DEFAULT_RESET_ANGLE_DEGREES: f32 = 15.0;

/// Elapsed time after which the worker starts polling the reset signal.
pub const DEFAULT_RESET_CHECK_INTERVAL_MS: u64 = 5;

/// Worker sleep after a pass that neither generated nor evicted anything.
pub const DEFAULT_IDLE_SLEEP_MS: u64 = 2;

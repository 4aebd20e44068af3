//! # Tilestream WFC
//!
//! Incremental Wave-Function-Collapse over an unbounded, clustered 3D grid.
//!
//! ## Design Principles
//!
//! 1. **Bounded work per step**: propagation stops after `max_depth` hops,
//!    so one step costs the same on a fresh map and on a huge one.
//! 2. **Repair, don't backtrack**: contradictions become filler tiles.
//! 3. **Lazy clusters**: a cluster exists once something touches it, and is
//!    seeded from its existing neighbors so chunk seams stay consistent.
//! 4. **Deterministic**: one seeded ChaCha8 stream drives every random choice.
//!
//! ## Core Components
//!
//! - [`WeightedCandidateSet`]: ordered weighted candidates with weighted draw
//! - [`TileCatalog`]: unique tiles and per-direction adjacency
//! - [`Cluster`]: fixed-size block of cells, intra-cluster propagation
//! - [`TilemapStore`]: sparse cluster directory
//! - [`Tilemap`]: entropy selection, observation, cross-cluster propagation
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tilestream_wfc::{TileCatalog, Tilemap, TilemapConfig, TileRegion};
//!
//! let catalog = Arc::new(TileCatalog::load(&bytes)?);
//! let mut map = Tilemap::new(catalog, &TilemapConfig::default())?;
//! let region = TileRegion::new(IVec3::new(-8, 0, -8), IVec3::new(8, 0, 8));
//! map.generate_region(&region);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]
#![allow(clippy::module_name_repetitions)]

pub mod candidates;
pub mod catalog;
pub mod cluster;
pub mod codec;
pub mod error;
pub mod events;
pub mod propagation;
pub mod raw;
pub mod store;
pub mod tile;
pub mod tilemap;

pub use candidates::{WeightedCandidateSet, WEIGHT_EPSILON};
pub use catalog::TileCatalog;
pub use cluster::{
    Cell, CellState, Cluster, ClusterCoord, EdgeCrossing, PropagationContext, PropagationHooks,
    PropagationReport,
};
pub use error::{ConfigError, LoadError, LoadResult};
pub use events::{
    ClusterKey, MaterializationSink, NullSink, TileKey, TileRequest, WfcObserver,
};
pub use propagation::GenResult;
pub use raw::RawTilemap;
pub use store::TilemapStore;
pub use tile::{Direction, Tile, TileRegion};
pub use tilemap::{Tilemap, TilemapConfig, TilemapStats};

//! # Tilestream Shared
//!
//! Common types used by both the generation worker and the presentation
//! consumer.
//!
//! ## RULE
//!
//! This crate must NEVER depend on:
//! - threading or channel crates
//! - file or network I/O
//! - anything presentation-specific
//!
//! If you need those, put them in `tilestream`.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod math;

pub use constants::{CATALOG_FORMAT_TAG, DIRECTION_COUNT, FILLER_WEIGHT, TILEMAP_FORMAT_TAG};
pub use math::{IVec3, Quat, Transform, Vec3};

//! Tiles, axis directions and tile-space regions.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};
use tilestream_shared::IVec3;

/// A tile identity: visual kind plus one of four yaw rotations.
#[repr(C)]
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Pod, Zeroable, Serialize,
    Deserialize,
)]
pub struct Tile {
    /// Visual kind. `0` means "no tile".
    pub tile_id: u8,
    /// Quarter turns around +Y (0..=3).
    pub rotation: u8,
}

impl Tile {
    /// The empty tile. Never materialized.
    pub const EMPTY: Self = Self::new(0, 0);

    /// Creates a tile.
    #[inline]
    #[must_use]
    pub const fn new(tile_id: u8, rotation: u8) -> Self {
        Self { tile_id, rotation }
    }

    /// Whether this is the "no tile" kind.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.tile_id == 0
    }

    /// Yaw in degrees for this tile's rotation.
    #[inline]
    #[must_use]
    pub fn yaw_degrees(self) -> f32 {
        90.0 * f32::from(self.rotation)
    }
}

/// Axis direction. The discriminant is the on-disk adjacency slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Direction {
    /// +X
    PosX = 0,
    /// +Y
    PosY = 1,
    /// +Z
    PosZ = 2,
    /// -X
    NegX = 3,
    /// -Y
    NegY = 4,
    /// -Z
    NegZ = 5,
}

impl Direction {
    /// All six directions in storage order.
    pub const ALL: [Self; 6] = [
        Self::PosX,
        Self::PosY,
        Self::PosZ,
        Self::NegX,
        Self::NegY,
        Self::NegZ,
    ];

    /// Directions constraint propagation walks, in visiting order.
    /// Y is deliberately absent: maps are generated layer by layer.
    pub const HORIZONTAL: [Self; 4] = [Self::PosX, Self::NegX, Self::PosZ, Self::NegZ];

    /// Adjacency slot index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Unit offset in tile space.
    #[must_use]
    pub const fn offset(self) -> IVec3 {
        match self {
            Self::PosX => IVec3::new(1, 0, 0),
            Self::PosY => IVec3::new(0, 1, 0),
            Self::PosZ => IVec3::new(0, 0, 1),
            Self::NegX => IVec3::new(-1, 0, 0),
            Self::NegY => IVec3::new(0, -1, 0),
            Self::NegZ => IVec3::new(0, 0, -1),
        }
    }

    /// The opposite direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::PosX => Self::NegX,
            Self::PosY => Self::NegY,
            Self::PosZ => Self::NegZ,
            Self::NegX => Self::PosX,
            Self::NegY => Self::PosY,
            Self::NegZ => Self::PosZ,
        }
    }
}

/// Inclusive axis-aligned box in tile coordinates.
///
/// Used both for generation regions and for the global map limits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileRegion {
    /// Lowest corner (inclusive).
    pub min: IVec3,
    /// Highest corner (inclusive).
    pub max: IVec3,
}

impl TileRegion {
    /// Box spanning two corners in any order.
    #[must_use]
    pub fn new(a: IVec3, b: IVec3) -> Self {
        Self { min: a.min(b), max: a.max(b) }
    }

    /// Box of `size` cells starting at `origin`. `None` for an empty size.
    #[must_use]
    pub fn from_origin_size(origin: IVec3, size: IVec3) -> Option<Self> {
        if size.x <= 0 || size.y <= 0 || size.z <= 0 {
            return None;
        }
        Some(Self {
            min: origin,
            max: origin + size - IVec3::ONE,
        })
    }

    /// Single-cell box.
    #[must_use]
    pub const fn cell(pos: IVec3) -> Self {
        Self { min: pos, max: pos }
    }

    /// Whether `pos` lies inside the box.
    #[inline]
    #[must_use]
    pub const fn contains(&self, pos: IVec3) -> bool {
        pos.within(self.min, self.max)
    }

    /// Overlap of two boxes, `None` if disjoint.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let min = self.min.max(other.min);
        let max = self.max.min(other.max);
        (min.x <= max.x && min.y <= max.y && min.z <= max.z).then_some(Self { min, max })
    }

    /// Extent in cells per axis.
    #[must_use]
    pub fn size(&self) -> IVec3 {
        self.max - self.min + IVec3::ONE
    }

    /// Number of cells.
    #[must_use]
    pub fn volume(&self) -> usize {
        self.size().volume()
    }

    /// Every cell, x fastest, then y, then z.
    pub fn iter(&self) -> impl Iterator<Item = IVec3> {
        let Self { min, max } = *self;
        (min.z..=max.z).flat_map(move |z| {
            (min.y..=max.y).flat_map(move |y| (min.x..=max.x).map(move |x| IVec3::new(x, y, z)))
        })
    }
}

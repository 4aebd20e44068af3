//! Raw tilemap streams (`0x0D1060`).
//!
//! A fully observed block of tiles, as produced by an authoring tool or by
//! [`crate::Tilemap::export_raw`]:
//!
//! ```text
//! u32   tag
//! f32x3 grid spacing
//! i32x3 map size
//! size.x * size.y * size.z x { u8 tileId, u8 rotation }
//! ```
//!
//! Records are stored in `x + y * size.x + z * size.x * size.y` order.

use tilestream_shared::{IVec3, Vec3, TILEMAP_FORMAT_TAG};

use crate::codec::{ByteReader, ByteWriter};
use crate::error::{LoadError, LoadResult};
use crate::tile::Tile;

/// Bytes in one `{tileId, rotation}` record.
const TILE_RECORD: usize = 2;

/// A dense block of observed tiles.
#[derive(Clone, Debug, PartialEq)]
pub struct RawTilemap {
    /// Grid spacing in world units.
    pub grid_size: Vec3,
    /// Extent in cells.
    pub map_size: IVec3,
    /// Tiles in `x + y*sx + z*sx*sy` order.
    pub tiles: Vec<Tile>,
}

impl RawTilemap {
    /// Map of `map_size` filled with [`Tile::EMPTY`]. Negative axes count as 0.
    #[must_use]
    pub fn new(grid_size: Vec3, map_size: IVec3) -> Self {
        let map_size = map_size.max(IVec3::ZERO);
        Self {
            grid_size,
            map_size,
            tiles: vec![Tile::EMPTY; map_size.volume()],
        }
    }

    /// Flat index of a local position.
    #[must_use]
    pub fn index(&self, pos: IVec3) -> Option<usize> {
        if !pos.within(IVec3::ZERO, self.map_size - IVec3::ONE) {
            return None;
        }
        let IVec3 { x, y, z } = pos;
        let s = self.map_size;
        usize::try_from(x + y * s.x + z * s.x * s.y).ok()
    }

    /// Local position of a flat index.
    #[must_use]
    pub fn position(&self, index: usize) -> IVec3 {
        let s = self.map_size;
        let i = i32::try_from(index).unwrap_or(i32::MAX);
        let layer = s.x * s.y;
        IVec3::new(i % s.x, (i % layer) / s.x, i / layer)
    }

    /// Tile at a local position.
    #[must_use]
    pub fn get(&self, pos: IVec3) -> Option<Tile> {
        self.index(pos).map(|i| self.tiles[i])
    }

    /// Overwrites the tile at a local position. Out-of-range writes are ignored.
    pub fn set(&mut self, pos: IVec3, tile: Tile) {
        if let Some(i) = self.index(pos) {
            self.tiles[i] = tile;
        }
    }

    /// Decodes a raw tilemap stream.
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`] on a wrong tag, a negative size or a stream too
    /// short for the declared size.
    pub fn decode(bytes: &[u8]) -> LoadResult<Self> {
        let mut reader = ByteReader::new(bytes);
        reader.expect_tag(TILEMAP_FORMAT_TAG)?;
        let grid_size = reader.read_vec3()?;
        let map_size = reader.read_ivec3()?;
        for (what, axis) in [("map size x", map_size.x), ("map size y", map_size.y), ("map size z", map_size.z)] {
            if axis < 0 {
                return Err(LoadError::InvalidCount {
                    what,
                    count: i64::from(axis),
                });
            }
        }

        let count = map_size.volume();
        if count.saturating_mul(TILE_RECORD) > reader.remaining() {
            return Err(LoadError::Truncated {
                offset: reader.position(),
                needed: count.saturating_mul(TILE_RECORD),
            });
        }

        let mut tiles = Vec::with_capacity(count);
        for _ in 0..count {
            tiles.push(reader.read_tile()?);
        }

        Ok(Self {
            grid_size,
            map_size,
            tiles,
        })
    }

    /// Encodes into the stream format.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut writer = ByteWriter::with_capacity(28 + self.tiles.len() * TILE_RECORD);
        writer.write_u32(TILEMAP_FORMAT_TAG);
        writer.write_vec3(self.grid_size);
        writer.write_ivec3(self.map_size);
        for &tile in &self.tiles {
            writer.write_tile(tile);
        }
        writer.into_bytes()
    }
}

//! Little-endian primitive encoding shared by the catalog and tilemap formats.

use tilestream_shared::{IVec3, Vec3};

use crate::error::{LoadError, LoadResult};
use crate::tile::Tile;

/// Growable little-endian writer.
#[derive(Debug, Default)]
pub struct ByteWriter {
    buffer: Vec<u8>,
}

impl ByteWriter {
    /// Writer with a preallocated buffer.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Writes a u8.
    pub fn write_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    /// Writes a u32 (little-endian).
    pub fn write_u32(&mut self, value: u32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes an i32 (little-endian).
    pub fn write_i32(&mut self, value: i32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes an f32 (little-endian).
    pub fn write_f32(&mut self, value: f32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a length as i32, saturating at `i32::MAX`.
    pub fn write_count(&mut self, count: usize) {
        self.write_i32(i32::try_from(count).unwrap_or(i32::MAX));
    }

    /// Writes three f32s.
    pub fn write_vec3(&mut self, v: Vec3) {
        self.write_f32(v.x);
        self.write_f32(v.y);
        self.write_f32(v.z);
    }

    /// Writes three i32s.
    pub fn write_ivec3(&mut self, v: IVec3) {
        self.write_i32(v.x);
        self.write_i32(v.y);
        self.write_i32(v.z);
    }

    /// Writes a `{tileId, rotation}` record.
    pub fn write_tile(&mut self, tile: Tile) {
        self.write_u8(tile.tile_id);
        self.write_u8(tile.rotation);
    }

    /// Finishes and returns the bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

/// Cursor over a borrowed byte slice.
pub struct ByteReader<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> ByteReader<'a> {
    /// Reader positioned at the start of `buffer`.
    #[must_use]
    pub const fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, position: 0 }
    }

    /// Bytes left to read.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    /// Current offset.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    fn take<const N: usize>(&mut self) -> LoadResult<[u8; N]> {
        let end = self.position.checked_add(N).filter(|&end| end <= self.buffer.len());
        let Some(end) = end else {
            return Err(LoadError::Truncated {
                offset: self.position,
                needed: N,
            });
        };
        let mut out = [0u8; N];
        out.copy_from_slice(&self.buffer[self.position..end]);
        self.position = end;
        Ok(out)
    }

    /// Reads a u8.
    pub fn read_u8(&mut self) -> LoadResult<u8> {
        Ok(self.take::<1>()?[0])
    }

    /// Reads a u32.
    pub fn read_u32(&mut self) -> LoadResult<u32> {
        Ok(u32::from_le_bytes(self.take()?))
    }

    /// Reads an i32.
    pub fn read_i32(&mut self) -> LoadResult<i32> {
        Ok(i32::from_le_bytes(self.take()?))
    }

    /// Reads an f32.
    pub fn read_f32(&mut self) -> LoadResult<f32> {
        Ok(f32::from_le_bytes(self.take()?))
    }

    /// Reads three f32s.
    pub fn read_vec3(&mut self) -> LoadResult<Vec3> {
        Ok(Vec3::new(self.read_f32()?, self.read_f32()?, self.read_f32()?))
    }

    /// Reads three i32s.
    pub fn read_ivec3(&mut self) -> LoadResult<IVec3> {
        Ok(IVec3::new(self.read_i32()?, self.read_i32()?, self.read_i32()?))
    }

    /// Reads a `{tileId, rotation}` record.
    pub fn read_tile(&mut self) -> LoadResult<Tile> {
        Ok(Tile::new(self.read_u8()?, self.read_u8()?))
    }

    /// Checks the leading format tag.
    pub fn expect_tag(&mut self, expected: u32) -> LoadResult<()> {
        let found = self.read_u32()?;
        if found == expected {
            Ok(())
        } else {
            Err(LoadError::BadFormatTag { expected, found })
        }
    }

    /// Reads an i32 count of records that are `record_size` bytes each.
    ///
    /// Rejects negative counts and counts the rest of the stream cannot hold,
    /// so a corrupt header never triggers a huge allocation.
    pub fn read_count(&mut self, what: &'static str, record_size: usize) -> LoadResult<usize> {
        let raw = self.read_i32()?;
        let count = usize::try_from(raw).map_err(|_| LoadError::InvalidCount {
            what,
            count: i64::from(raw),
        })?;
        if count.saturating_mul(record_size) > self.remaining() {
            return Err(LoadError::Truncated {
                offset: self.position,
                needed: count.saturating_mul(record_size),
            });
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitives_little_endian() {
        let mut w = ByteWriter::default();
        w.write_u32(0x000D_1060);
        w.write_i32(-2);
        w.write_f32(1.5);
        let bytes = w.into_bytes();
        assert_eq!(&bytes[0..4], &[0x60, 0x10, 0x0D, 0x00]);

        let mut r = ByteReader::new(&bytes);
        assert_eq!(r.read_u32(), Ok(0x000D_1060));
        assert_eq!(r.read_i32(), Ok(-2));
        assert_eq!(r.read_f32(), Ok(1.5));
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn test_truncated_read() {
        let mut r = ByteReader::new(&[1, 2]);
        assert_eq!(
            r.read_u32(),
            Err(LoadError::Truncated { offset: 0, needed: 4 })
        );
    }

    #[test]
    fn test_count_guards() {
        let mut w = ByteWriter::default();
        w.write_i32(-1);
        let bytes = w.into_bytes();
        assert!(matches!(
            ByteReader::new(&bytes).read_count("unique tile", 6),
            Err(LoadError::InvalidCount { count: -1, .. })
        ));

        let mut w = ByteWriter::default();
        w.write_i32(1000);
        let bytes = w.into_bytes();
        assert!(matches!(
            ByteReader::new(&bytes).read_count("unique tile", 6),
            Err(LoadError::Truncated { .. })
        ));
    }
}

//! # Tile Catalog
//!
//! The loaded-once table of unique tiles and their per-direction adjacency.
//!
//! ## Stream layout (`0x0D1061`, little-endian)
//!
//! ```text
//! u32   tag
//! f32x3 grid spacing
//! i32   unique tile count N
//! N  x  { u8 tileId, u8 rotation, f32 weight }
//! i32   adjacency count (== N)
//! N  x  6 x { i32 count M, M x { u8 tileId, u8 rotation, f32 weight } }
//! ```
//!
//! Directions are stored in `+X, +Y, +Z, -X, -Y, -Z` order. A tile's
//! *unique id* is its index in the unique table, not its `tile_id`.
//!
//! The catalog is built (or loaded) once, then shared read-only behind an
//! `Arc` by every tilemap that uses it.

use tilestream_shared::{Vec3, CATALOG_FORMAT_TAG, DIRECTION_COUNT, FILLER_WEIGHT};

use crate::candidates::WeightedCandidateSet;
use crate::codec::{ByteReader, ByteWriter};
use crate::error::{LoadError, LoadResult};
use crate::tile::{Direction, Tile};

/// Bytes in one `{tileId, rotation, weight}` record.
const WEIGHTED_TILE_RECORD: usize = 6;

static NO_ADJACENCY: WeightedCandidateSet<Tile> = WeightedCandidateSet::new();

type AdjacencyRow = [WeightedCandidateSet<Tile>; DIRECTION_COUNT];

/// Unique tiles with base weights and per-direction adjacency lists.
#[derive(Clone, Debug, PartialEq)]
pub struct TileCatalog {
    grid_size: Vec3,
    unique: WeightedCandidateSet<Tile>,
    adjacency: Vec<AdjacencyRow>,
}

impl TileCatalog {
    /// Empty catalog with the given grid spacing.
    #[must_use]
    pub fn new(grid_size: Vec3) -> Self {
        Self {
            grid_size,
            unique: WeightedCandidateSet::new(),
            adjacency: Vec::new(),
        }
    }

    /// Decodes a catalog stream.
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`] on a wrong tag, a truncated stream, a negative
    /// count, or an adjacency table that does not match the unique table.
    pub fn load(bytes: &[u8]) -> LoadResult<Self> {
        let mut reader = ByteReader::new(bytes);
        reader.expect_tag(CATALOG_FORMAT_TAG)?;
        let grid_size = reader.read_vec3()?;

        let unique_count = reader.read_count("unique tile", WEIGHTED_TILE_RECORD)?;
        let mut unique = WeightedCandidateSet::with_capacity(unique_count);
        for _ in 0..unique_count {
            let tile = reader.read_tile()?;
            let weight = reader.read_f32()?;
            unique.add(tile, weight);
        }
        // duplicates collapse in `add`; the adjacency table is indexed by record
        if unique.len() != unique_count {
            return Err(LoadError::InvalidCount {
                what: "distinct unique tile",
                count: i64::try_from(unique.len()).unwrap_or(i64::MAX),
            });
        }

        let adjacency_count = reader.read_count("adjacency", DIRECTION_COUNT * 4)?;
        if adjacency_count != unique_count {
            return Err(LoadError::AdjacencyMismatch {
                unique: unique_count,
                adjacency: adjacency_count,
            });
        }

        let mut adjacency = Vec::with_capacity(adjacency_count);
        for _ in 0..adjacency_count {
            let mut row = AdjacencyRow::default();
            for slot in &mut row {
                let entries = reader.read_count("adjacency entry", WEIGHTED_TILE_RECORD)?;
                let mut set = WeightedCandidateSet::with_capacity(entries);
                for _ in 0..entries {
                    let tile = reader.read_tile()?;
                    let weight = reader.read_f32()?;
                    set.add(tile, weight);
                }
                *slot = set;
            }
            adjacency.push(row);
        }

        tracing::debug!(
            "Loaded tile catalog: {} unique tiles, grid {:?}",
            unique.len(),
            grid_size
        );

        Ok(Self {
            grid_size,
            unique,
            adjacency,
        })
    }

    /// Encodes the catalog into its stream format.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut writer = ByteWriter::with_capacity(32 + self.unique.len() * 64);
        writer.write_u32(CATALOG_FORMAT_TAG);
        writer.write_vec3(self.grid_size);

        writer.write_count(self.unique.len());
        for (tile, weight) in self.unique.iter() {
            writer.write_tile(*tile);
            writer.write_f32(weight);
        }

        writer.write_count(self.adjacency.len());
        for row in &self.adjacency {
            for set in row {
                writer.write_count(set.len());
                for (tile, weight) in set.iter() {
                    writer.write_tile(*tile);
                    writer.write_f32(weight);
                }
            }
        }
        writer.into_bytes()
    }

    /// Registers a unique tile, returning its unique id. Adding a tile that
    /// already exists merges the weight and returns the existing id.
    pub fn add_tile(&mut self, tile: Tile, weight: f32) -> usize {
        if let Some(id) = self.find_unique_id(tile) {
            self.unique.add(tile, weight);
            return id;
        }
        self.unique.add(tile, weight);
        self.adjacency.push(AdjacencyRow::default());
        self.unique.len() - 1
    }

    /// Allows `to` next to `from` in `direction` (one-way).
    /// Unknown `from` tiles are ignored.
    pub fn allow(&mut self, from: Tile, direction: Direction, to: Tile, weight: f32) {
        if let Some(id) = self.find_unique_id(from) {
            self.adjacency[id][direction.index()].add(to, weight);
        }
    }

    /// Allows `a -> b` in `direction` and `b -> a` in the opposite direction.
    pub fn allow_pair(&mut self, a: Tile, direction: Direction, b: Tile, weight: f32) {
        self.allow(a, direction, b, weight);
        self.allow(b, direction.opposite(), a, weight);
    }

    /// Appends every filler tile missing from the table with weight
    /// [`FILLER_WEIGHT`] and makes the full unique table its adjacency in all
    /// six directions.
    #[must_use]
    pub fn with_fillers(mut self, fillers: &[Tile]) -> Self {
        let mut added = Vec::new();
        for &filler in fillers {
            if self.find_unique_id(filler).is_none() {
                added.push(self.add_tile(filler, FILLER_WEIGHT));
            }
        }
        for id in added {
            let row: AdjacencyRow = std::array::from_fn(|_| self.unique.clone());
            self.adjacency[id] = row;
        }
        self
    }

    /// Grid spacing in world units.
    #[must_use]
    pub const fn grid_size(&self) -> Vec3 {
        self.grid_size
    }

    /// Unique tiles with base weights. New cells start from a copy of this.
    #[must_use]
    pub const fn unique_tiles(&self) -> &WeightedCandidateSet<Tile> {
        &self.unique
    }

    /// Number of unique tiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.unique.len()
    }

    /// Whether the catalog has no tiles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.unique.is_empty()
    }

    /// Unique id of `tile`.
    #[must_use]
    pub fn find_unique_id(&self, tile: Tile) -> Option<usize> {
        self.unique.index_of(&tile)
    }

    /// Tiles allowed next to unique tile `unique_id` in `direction`.
    /// An unknown id has no neighbors.
    #[must_use]
    pub fn adjacent(&self, unique_id: usize, direction: Direction) -> &WeightedCandidateSet<Tile> {
        self.adjacency
            .get(unique_id)
            .map_or(&NO_ADJACENCY, |row| &row[direction.index()])
    }

    /// Min-merged union of the adjacency lists of `sources` in `direction`.
    ///
    /// Returns `None` when no source tile is in the catalog; such a cell
    /// imposes no constraint on its neighbor.
    pub fn expand<I>(&self, sources: I, direction: Direction) -> Option<WeightedCandidateSet<Tile>>
    where
        I: IntoIterator<Item = Tile>,
    {
        let mut allowed = WeightedCandidateSet::new();
        let mut known = false;
        for tile in sources {
            if let Some(id) = self.find_unique_id(tile) {
                known = true;
                allowed.merge_min(self.adjacent(id, direction));
            }
        }
        known.then_some(allowed)
    }
}

//! Error types for the WFC solver.

use thiserror::Error;
use tilestream_shared::IVec3;

/// Failures while decoding a catalog or raw tilemap stream.
///
/// Every variant belongs to the *malformed data* category: the load call
/// fails as a whole and nothing has been constructed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// Stream does not start with the expected format tag.
    #[error("bad format tag: expected {expected:#08x}, found {found:#08x}")]
    BadFormatTag {
        /// Tag this decoder accepts.
        expected: u32,
        /// Tag found in the stream.
        found: u32,
    },

    /// Stream ended before a complete record could be read.
    #[error("truncated stream: needed {needed} bytes at offset {offset}")]
    Truncated {
        /// Byte offset of the failed read.
        offset: usize,
        /// Bytes the read required.
        needed: usize,
    },

    /// A count or size field is negative or does not fit the stream.
    #[error("invalid {what} count: {count}")]
    InvalidCount {
        /// Which field was invalid.
        what: &'static str,
        /// Raw value read from the stream.
        count: i64,
    },

    /// Adjacency table length differs from the unique tile table.
    #[error("adjacency table has {adjacency} entries for {unique} unique tiles")]
    AdjacencyMismatch {
        /// Unique tile count.
        unique: usize,
        /// Adjacency entry count.
        adjacency: usize,
    },
}

impl LoadError {
    /// Whether this error is a malformed-data failure. Always true today;
    /// kept so callers can match on the category instead of the variant.
    #[must_use]
    pub const fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::BadFormatTag { .. }
                | Self::Truncated { .. }
                | Self::InvalidCount { .. }
                | Self::AdjacencyMismatch { .. }
        )
    }
}

/// Result type for load operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Semantic configuration failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Cluster extent must be positive on every axis.
    #[error("invalid cluster size {0:?}: every axis must be >= 1")]
    InvalidClusterSize(IVec3),

    /// Cluster volume above the cell limit.
    #[error("cluster size {size:?} exceeds {limit} cells")]
    ClusterTooLarge {
        /// Requested extent.
        size: IVec3,
        /// Maximum cell count.
        limit: i32,
    },

    /// Map limits with `min > max` on some axis.
    #[error("inverted map limits: min {min:?} max {max:?}")]
    InvertedMapLimits {
        /// Lower limit.
        min: IVec3,
        /// Upper limit.
        max: IVec3,
    },

    /// A distance or duration that must be positive.
    #[error("{name} must be positive, got {value}")]
    NonPositive {
        /// Field name.
        name: &'static str,
        /// Offending value.
        value: f64,
    },
}

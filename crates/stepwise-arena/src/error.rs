//! Arena-specific error types.

use std::error::Error;
use std::fmt;

/// Errors from pool configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// `chunk_capacity` was zero.
    ZeroChunkCapacity,
    /// `chunk_capacity` exceeded the supported maximum.
    ChunkCapacityTooLarge {
        /// Requested elements per chunk.
        requested: usize,
        /// Largest accepted value.
        limit: usize,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroChunkCapacity => write!(f, "chunk capacity must be non-zero"),
            Self::ChunkCapacityTooLarge { requested, limit } => {
                write!(f, "chunk capacity {requested} exceeds limit {limit}")
            }
        }
    }
}

impl Error for ArenaError {}

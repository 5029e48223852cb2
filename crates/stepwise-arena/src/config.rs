//! Pool configuration parameters.

use crate::error::ArenaError;

/// Configuration for a [`ChunkPool`](crate::ChunkPool).
///
/// Validated at construction; immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of elements per chunk.
    ///
    /// Default: 256. Must be non-zero and at most
    /// [`MAX_CHUNK_CAPACITY`](Self::MAX_CHUNK_CAPACITY).
    pub chunk_capacity: usize,

    /// Upper bound on chunks kept on the free list.
    ///
    /// Chunks released beyond this are dropped. Default: 1024.
    pub max_retained_chunks: usize,
}

impl PoolConfig {
    /// Default elements per chunk.
    pub const DEFAULT_CHUNK_CAPACITY: usize = 256;

    /// Default free-list bound.
    pub const DEFAULT_MAX_RETAINED_CHUNKS: usize = 1024;

    /// Largest accepted chunk capacity.
    pub const MAX_CHUNK_CAPACITY: usize = 1 << 20;

    /// Check the parameters.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if self.chunk_capacity == 0 {
            return Err(ArenaError::ZeroChunkCapacity);
        }
        if self.chunk_capacity > Self::MAX_CHUNK_CAPACITY {
            return Err(ArenaError::ChunkCapacityTooLarge {
                requested: self.chunk_capacity,
                limit: Self::MAX_CHUNK_CAPACITY,
            });
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            chunk_capacity: Self::DEFAULT_CHUNK_CAPACITY,
            max_retained_chunks: Self::DEFAULT_MAX_RETAINED_CHUNKS,
        }
    }
}

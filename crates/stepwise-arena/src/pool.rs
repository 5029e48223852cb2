//! Free-list pool of fixed-capacity chunks.

use crate::config::PoolConfig;
use crate::error::ArenaError;

/// Counters describing pool traffic since construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Total chunks handed out.
    pub acquired: u64,
    /// Of those, how many came from the free list.
    pub reused: u64,
    /// Of those, how many were freshly allocated.
    pub fresh: u64,
    /// Chunks returned and kept on the free list.
    pub released: u64,
    /// Chunks returned but dropped (free list full or undersized).
    pub dropped: u64,
}

/// A per-worker pool of `Vec<T>` chunks of a fixed capacity.
///
/// Returned chunks are cleared and kept for reuse, so a worker in steady
/// state stops allocating trajectory storage after the first few events.
#[derive(Debug)]
pub struct ChunkPool<T> {
    free: Vec<Vec<T>>,
    chunk_capacity: usize,
    max_retained: usize,
    stats: PoolStats,
}

impl<T> ChunkPool<T> {
    /// Create an empty pool.
    pub fn new(config: &PoolConfig) -> Result<Self, ArenaError> {
        config.validate()?;
        Ok(Self {
            free: Vec::new(),
            chunk_capacity: config.chunk_capacity,
            max_retained: config.max_retained_chunks,
            stats: PoolStats::default(),
        })
    }

    /// Elements per chunk.
    pub fn chunk_capacity(&self) -> usize {
        self.chunk_capacity
    }

    /// Chunks currently on the free list.
    pub fn free_chunks(&self) -> usize {
        self.free.len()
    }

    /// Traffic counters.
    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    /// Take an empty chunk with at least `chunk_capacity` capacity.
    pub fn acquire(&mut self) -> Vec<T> {
        self.stats.acquired += 1;
        match self.free.pop() {
            Some(chunk) => {
                self.stats.reused += 1;
                chunk
            }
            None => {
                self.stats.fresh += 1;
                Vec::with_capacity(self.chunk_capacity)
            }
        }
    }

    /// Return a chunk to the pool. Its contents are dropped.
    pub fn release(&mut self, mut chunk: Vec<T>) {
        chunk.clear();
        if chunk.capacity() < self.chunk_capacity || self.free.len() >= self.max_retained {
            self.stats.dropped += 1;
            return;
        }
        self.stats.released += 1;
        self.free.push(chunk);
    }

    /// Drop every retained chunk.
    pub fn shrink(&mut self) {
        self.free.clear();
    }
}

//! Append-only sequence stored in pool-served chunks.

use crate::pool::ChunkPool;

/// An append-only sequence backed by fixed-capacity chunks.
///
/// Pushing never reallocates or moves existing elements: when the last
/// chunk is full a new one is taken from the pool. A `ChunkedVec` must
/// always be used with the same pool (the chunk capacity is fixed on the
/// first push).
#[derive(Debug)]
pub struct ChunkedVec<T> {
    chunks: Vec<Vec<T>>,
    chunk_capacity: usize,
    len: usize,
}

impl<T> Default for ChunkedVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ChunkedVec<T> {
    /// An empty sequence. Does not allocate.
    pub fn new() -> Self {
        Self {
            chunks: Vec::new(),
            chunk_capacity: 0,
            len: 0,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of chunks held.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Append one element.
    pub fn push(&mut self, value: T, pool: &mut ChunkPool<T>) {
        let needs_chunk = match self.chunks.last() {
            Some(last) => last.len() >= self.chunk_capacity,
            None => true,
        };
        if needs_chunk {
            self.chunk_capacity = pool.chunk_capacity();
            self.chunks.push(pool.acquire());
        }
        if let Some(last) = self.chunks.last_mut() {
            last.push(value);
            self.len += 1;
        }
    }

    /// Element at `index`.
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.len {
            return None;
        }
        let chunk = index / self.chunk_capacity;
        let offset = index % self.chunk_capacity;
        self.chunks.get(chunk).and_then(|c| c.get(offset))
    }

    /// First element.
    pub fn first(&self) -> Option<&T> {
        self.chunks.first().and_then(|c| c.first())
    }

    /// Last element.
    pub fn last(&self) -> Option<&T> {
        self.chunks.last().and_then(|c| c.last())
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.chunks.iter().flat_map(|c| c.iter())
    }

    /// Move all of `other`'s elements after the first `skip` onto the end
    /// of `self`. `other`'s chunks are returned to `pool`.
    pub fn append_from(&mut self, mut other: ChunkedVec<T>, skip: usize, pool: &mut ChunkPool<T>) {
        let mut skipped = 0;
        for mut chunk in other.chunks.drain(..) {
            for value in chunk.drain(..) {
                if skipped < skip {
                    skipped += 1;
                    continue;
                }
                self.push(value, pool);
            }
            pool.release(chunk);
        }
    }

    /// Return every chunk to `pool`, leaving `self` empty.
    pub fn release_into(&mut self, pool: &mut ChunkPool<T>) {
        for chunk in self.chunks.drain(..) {
            pool.release(chunk);
        }
        self.len = 0;
    }
}

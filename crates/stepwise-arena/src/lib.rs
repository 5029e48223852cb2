//! Per-worker chunk pools for trajectory storage.
//!
//! Trajectory points are stored in fixed-capacity chunks served from a
//! [`ChunkPool`] owned by one worker. A [`ChunkedVec`] grows by
//! acquiring a fresh chunk when its last one is full, so pushing never
//! moves existing elements. When a trajectory is no longer needed its
//! chunks go back to the pool in bulk and are reused by later tracks.
//!
//! ```text
//! ChunkPool<T> (one per worker)
//! ├── free list: Vec<Vec<T>>  (cleared, capacity retained)
//! └── PoolStats
//!
//! ChunkedVec<T> (one per trajectory)
//! └── chunks: Vec<Vec<T>>     (each capacity == chunk_capacity)
//! ```
//!
//! Pools are deliberately not `Sync`-shared: each worker owns its own.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod chunked;
pub mod config;
pub mod error;
pub mod pool;

pub use chunked::ChunkedVec;
pub use config::PoolConfig;
pub use error::ArenaError;
pub use pool::{ChunkPool, PoolStats};

//! Hand-off queue for secondaries produced during stepping.

use stepwise_core::{EffectId, Track, TrackId};

/// FIFO of secondaries produced since the last drain.
///
/// The relay also allocates track ids for the current event, in creation
/// order starting at 1. Secondaries are never dropped except through
/// [`discard`](Self::discard), which the caller uses when the parent
/// ended as `KillTrackAndSecondaries`.
#[derive(Debug)]
pub struct SecondaryRelay {
    queue: Vec<Track>,
    next_id: u64,
    produced: u64,
    discarded: u64,
}

/// Relay state captured before a step, used to undo a failed step.
#[derive(Clone, Copy, Debug)]
pub(crate) struct RelayMark {
    len: usize,
    next_id: u64,
    produced: u64,
}

impl Default for SecondaryRelay {
    fn default() -> Self {
        Self::new()
    }
}

impl SecondaryRelay {
    /// An empty relay whose next id is 1.
    pub fn new() -> Self {
        Self {
            queue: Vec::new(),
            next_id: 1,
            produced: 0,
            discarded: 0,
        }
    }

    /// Hand off a secondary. Assigns its identity and returns its id.
    pub fn push(&mut self, mut track: Track, parent: TrackId, creator: EffectId) -> TrackId {
        let id = self.allocate_id();
        track.assign_identity(id, parent, Some(creator));
        self.queue.push(track);
        self.produced += 1;
        id
    }

    /// Allocate the next track id without queueing anything.
    pub fn allocate_id(&mut self) -> TrackId {
        let id = TrackId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Restart id allocation at 1 (start of a new event).
    pub fn reset_ids(&mut self) {
        self.next_id = 1;
    }

    /// Remove and return every queued secondary in creation order.
    pub fn drain(&mut self) -> std::vec::Drain<'_, Track> {
        self.queue.drain(..)
    }

    /// Drop every queued secondary. Returns how many were dropped.
    pub fn discard(&mut self) -> usize {
        let n = self.queue.len();
        if n > 0 {
            tracing::warn!(count = n, "discarding secondaries of a killed track");
        }
        self.queue.clear();
        self.discarded += n as u64;
        n
    }

    /// Number of queued secondaries.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Queued secondaries, oldest first.
    pub fn pending(&self) -> &[Track] {
        &self.queue
    }

    /// Total secondaries ever pushed.
    pub fn produced(&self) -> u64 {
        self.produced
    }

    /// Total secondaries ever discarded.
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    pub(crate) fn mark(&self) -> RelayMark {
        RelayMark {
            len: self.queue.len(),
            next_id: self.next_id,
            produced: self.produced,
        }
    }

    pub(crate) fn rollback(&mut self, mark: RelayMark) {
        self.queue.truncate(mark.len);
        self.next_id = mark.next_id;
        self.produced = mark.produced;
    }
}

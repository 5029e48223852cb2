//! Event-level collection of finished trajectories.

use indexmap::IndexMap;
use stepwise_core::TrackId;

use crate::trajectory::{Trajectory, TrajectoryRecorder};

/// Finished trajectories of one event, in completion order.
///
/// A track processed in several passes (suspended, then resumed) ends up
/// as one trajectory: later passes are merged into the first.
#[derive(Debug, Default)]
pub struct TrajectoryContainer {
    trajectories: Vec<Trajectory>,
    index: IndexMap<TrackId, usize>,
}

impl TrajectoryContainer {
    /// An empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a trajectory, merging it into an earlier one of the same track.
    pub fn insert_or_merge(&mut self, trajectory: Trajectory, recorder: &mut TrajectoryRecorder) {
        match self.index.get(&trajectory.track_id()) {
            Some(&slot) => recorder.merge(&mut self.trajectories[slot], trajectory),
            None => {
                self.index
                    .insert(trajectory.track_id(), self.trajectories.len());
                self.trajectories.push(trajectory);
            }
        }
    }

    /// Trajectory of a given track.
    pub fn get(&self, id: TrackId) -> Option<&Trajectory> {
        self.index.get(&id).map(|&slot| &self.trajectories[slot])
    }

    /// Number of trajectories.
    pub fn len(&self) -> usize {
        self.trajectories.len()
    }

    /// Whether there are none.
    pub fn is_empty(&self) -> bool {
        self.trajectories.is_empty()
    }

    /// Trajectories in completion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Trajectory> {
        self.trajectories.iter()
    }

    /// Return all point storage to `recorder`'s pool.
    pub fn recycle_into(self, recorder: &mut TrajectoryRecorder) {
        for trajectory in self.trajectories {
            recorder.recycle(trajectory);
        }
    }
}

impl IntoIterator for TrajectoryContainer {
    type Item = Trajectory;
    type IntoIter = std::vec::IntoIter<Trajectory>;

    fn into_iter(self) -> Self::IntoIter {
        self.trajectories.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trajectory::RecordingMode;
    use stepwise_arena::PoolConfig;
    use stepwise_core::{ParticleKind, Step, Track};

    fn recorded(rec: &mut TrajectoryRecorder, id: u64, steps: usize) -> Trajectory {
        let mut t = Track::new(ParticleKind::PROTON, 5.0, [0.0; 3], [1.0, 0.0, 0.0]);
        t.assign_identity(TrackId(id), TrackId::NONE, None);
        rec.begin(&t, RecordingMode::Positions);
        let mut step = Step::new();
        for _ in 0..steps {
            step.reset_from(&t, 0.0);
            rec.append(&step);
        }
        rec.finish().unwrap()
    }

    #[test]
    fn same_track_is_merged() {
        let mut rec = TrajectoryRecorder::new(&PoolConfig::default()).unwrap();
        let mut c = TrajectoryContainer::new();
        let first = recorded(&mut rec, 1, 3);
        let other = recorded(&mut rec, 2, 1);
        let again = recorded(&mut rec, 1, 2);
        c.insert_or_merge(first, &mut rec);
        c.insert_or_merge(other, &mut rec);
        c.insert_or_merge(again, &mut rec);

        assert_eq!(c.len(), 2);
        assert_eq!(c.get(TrackId(1)).unwrap().point_count(), 4 + 3 - 1);
        assert_eq!(c.get(TrackId(2)).unwrap().point_count(), 2);
        let order: Vec<TrackId> = c.iter().map(Trajectory::track_id).collect();
        assert_eq!(order, vec![TrackId(1), TrackId(2)]);
        c.recycle_into(&mut rec);
        assert!(rec.pool_stats().released > 0);
    }
}

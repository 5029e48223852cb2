//! Recorded particle paths and the per-worker recorder.

use stepwise_arena::{ArenaError, ChunkPool, ChunkedVec, PoolConfig, PoolStats};
use stepwise_core::{
    EffectId, ParticleKind, Step, StepPoint, StepStatus, ThreeVector, Track, TrackId, VolumeId,
};

/// What a trajectory records per point. Chosen per track before its
/// first step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RecordingMode {
    /// Nothing is recorded for the track.
    Off,
    /// Positions only.
    #[default]
    Positions,
    /// Positions plus [`PointAttributes`].
    Rich,
}

/// Extra per-point state kept in [`RecordingMode::Rich`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointAttributes {
    /// Event time in ns.
    pub global_time: f64,
    /// Kinetic energy in MeV.
    pub kinetic_energy: f64,
    /// Energy deposited by the step ending here, in MeV.
    pub energy_deposit: f64,
    /// What limited the step ending here.
    pub status: StepStatus,
    /// Effect credited with the step ending here.
    pub defined_by: Option<EffectId>,
    /// Volume containing the point.
    pub volume: Option<VolumeId>,
}

/// One recorded point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrajectoryPoint {
    /// Position in mm.
    pub position: ThreeVector,
    /// Present only in [`RecordingMode::Rich`].
    pub attributes: Option<PointAttributes>,
}

impl TrajectoryPoint {
    fn from_step_point(point: &StepPoint, deposit: f64, mode: RecordingMode) -> Self {
        let attributes = (mode == RecordingMode::Rich).then_some(PointAttributes {
            global_time: point.global_time,
            kinetic_energy: point.kinetic_energy,
            energy_deposit: deposit,
            status: point.status,
            defined_by: point.defined_by,
            volume: point.volume,
        });
        Self {
            position: point.position,
            attributes,
        }
    }
}

/// The recorded path of one track plus its static identity.
///
/// Outlives the track. Point storage comes from the recorder's chunk pool
/// and should be handed back through [`TrajectoryRecorder::recycle`].
#[derive(Debug)]
pub struct Trajectory {
    track_id: TrackId,
    parent_id: TrackId,
    kind: ParticleKind,
    charge: f64,
    initial_momentum: ThreeVector,
    mode: RecordingMode,
    points: ChunkedVec<TrajectoryPoint>,
}

impl Trajectory {
    fn new(track: &Track, mode: RecordingMode) -> Self {
        Self {
            track_id: track.id(),
            parent_id: track.parent_id(),
            kind: track.kind(),
            charge: track.kind().charge,
            initial_momentum: track.initial_momentum(),
            mode,
            points: ChunkedVec::new(),
        }
    }

    /// Id of the recorded track.
    pub fn track_id(&self) -> TrackId {
        self.track_id
    }

    /// Id of its parent.
    pub fn parent_id(&self) -> TrackId {
        self.parent_id
    }

    /// Particle species.
    pub fn kind(&self) -> ParticleKind {
        self.kind
    }

    /// Static charge of the species.
    pub fn charge(&self) -> f64 {
        self.charge
    }

    /// Momentum at creation, MeV/c.
    pub fn initial_momentum(&self) -> ThreeVector {
        self.initial_momentum
    }

    /// Recording mode used.
    pub fn mode(&self) -> RecordingMode {
        self.mode
    }

    /// Number of recorded points.
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Point at `index`.
    pub fn point(&self, index: usize) -> Option<&TrajectoryPoint> {
        self.points.get(index)
    }

    /// Last recorded point.
    pub fn last_point(&self) -> Option<&TrajectoryPoint> {
        self.points.last()
    }

    /// Points in recording order.
    pub fn points(&self) -> impl Iterator<Item = &TrajectoryPoint> + '_ {
        self.points.iter()
    }

    /// Append a point.
    pub fn append_point(&mut self, point: TrajectoryPoint, pool: &mut ChunkPool<TrajectoryPoint>) {
        self.points.push(point, pool);
    }

    /// Append the continuation `other` of this track.
    ///
    /// `other`'s first point duplicates this trajectory's last point and
    /// is skipped; the result holds `self + other - 1` points. When `self`
    /// is empty every point of `other` is kept.
    pub fn merge(&mut self, other: Trajectory, pool: &mut ChunkPool<TrajectoryPoint>) {
        let skip = usize::from(!self.points.is_empty());
        self.points.append_from(other.points, skip, pool);
    }

    fn release_into(mut self, pool: &mut ChunkPool<TrajectoryPoint>) {
        self.points.release_into(pool);
    }
}

/// Builds the trajectory of the track currently being driven.
///
/// Owns the worker's chunk pool. Appending is O(1) amortised and
/// allocation-free once the pool is warm.
#[derive(Debug)]
pub struct TrajectoryRecorder {
    pool: ChunkPool<TrajectoryPoint>,
    current: Option<Trajectory>,
}

impl TrajectoryRecorder {
    /// Create a recorder with its own pool.
    pub fn new(config: &PoolConfig) -> Result<Self, ArenaError> {
        Ok(Self {
            pool: ChunkPool::new(config)?,
            current: None,
        })
    }

    /// Start recording `track` in `mode`, taking its current state as the
    /// initial point. With [`RecordingMode::Off`] nothing is recorded
    /// until the next `begin`.
    pub fn begin(&mut self, track: &Track, mode: RecordingMode) {
        if let Some(stale) = self.current.take() {
            stale.release_into(&mut self.pool);
        }
        if mode == RecordingMode::Off {
            return;
        }
        let mut trajectory = Trajectory::new(track, mode);
        let initial = TrajectoryPoint::from_step_point(&StepPoint::from_track(track, 0.0), 0.0, mode);
        trajectory.append_point(initial, &mut self.pool);
        self.current = Some(trajectory);
    }

    /// Whether a trajectory is being recorded.
    pub fn is_recording(&self) -> bool {
        self.current.is_some()
    }

    /// Record the post point of a completed step.
    pub fn append(&mut self, step: &Step) {
        if let Some(trajectory) = self.current.as_mut() {
            let point =
                TrajectoryPoint::from_step_point(step.post(), step.energy_deposit(), trajectory.mode);
            trajectory.append_point(point, &mut self.pool);
        }
    }

    /// Points recorded so far for the current track.
    pub fn current_point_count(&self) -> usize {
        self.current.as_ref().map_or(0, Trajectory::point_count)
    }

    /// Stop recording and hand over the trajectory, if any.
    pub fn finish(&mut self) -> Option<Trajectory> {
        self.current.take()
    }

    /// Merge a continuation into an earlier trajectory of the same track.
    pub fn merge(&mut self, into: &mut Trajectory, other: Trajectory) {
        into.merge(other, &mut self.pool);
    }

    /// Return a trajectory's storage to the pool.
    pub fn recycle(&mut self, trajectory: Trajectory) {
        trajectory.release_into(&mut self.pool);
    }

    /// Pool traffic counters.
    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder(chunk: usize) -> TrajectoryRecorder {
        TrajectoryRecorder::new(&PoolConfig {
            chunk_capacity: chunk,
            max_retained_chunks: 16,
        })
        .unwrap()
    }

    fn track() -> Track {
        let mut t = Track::new(ParticleKind::ELECTRON, 2.0, [0.0; 3], [0.0, 0.0, 1.0]);
        t.assign_identity(TrackId(1), TrackId::NONE, None);
        t
    }

    fn step_to(track: &Track, z: f64) -> Step {
        let mut step = Step::new();
        step.reset_from(track, 0.0);
        step.post_mut().position = [0.0, 0.0, z];
        step
    }

    #[test]
    fn initial_point_plus_one_per_step() {
        let mut rec = recorder(2);
        let t = track();
        rec.begin(&t, RecordingMode::Positions);
        for z in 1..=5 {
            rec.append(&step_to(&t, z as f64));
        }
        let traj = rec.finish().unwrap();
        assert_eq!(traj.point_count(), 6);
        assert_eq!(traj.point(0).unwrap().position, [0.0; 3]);
        assert_eq!(traj.last_point().unwrap().position, [0.0, 0.0, 5.0]);
        assert!(traj.point(3).unwrap().attributes.is_none());
    }

    #[test]
    fn off_records_nothing() {
        let mut rec = recorder(4);
        let t = track();
        rec.begin(&t, RecordingMode::Off);
        rec.append(&step_to(&t, 1.0));
        assert!(!rec.is_recording());
        assert!(rec.finish().is_none());
    }

    #[test]
    fn rich_mode_keeps_attributes() {
        let mut rec = recorder(4);
        let t = track();
        rec.begin(&t, RecordingMode::Rich);
        let mut step = step_to(&t, 1.0);
        step.post_mut().status = StepStatus::GeomBoundary;
        rec.append(&step);
        let traj = rec.finish().unwrap();
        let attrs = traj.point(1).unwrap().attributes.unwrap();
        assert_eq!(attrs.status, StepStatus::GeomBoundary);
        assert_eq!(attrs.kinetic_energy, 2.0);
    }

    #[test]
    fn merge_drops_duplicate_joint() {
        let mut rec = recorder(3);
        let t = track();
        rec.begin(&t, RecordingMode::Positions);
        for z in 1..=3 {
            rec.append(&step_to(&t, z as f64));
        }
        let mut a = rec.finish().unwrap();

        let mut resumed = track();
        resumed.position = [0.0, 0.0, 3.0];
        rec.begin(&resumed, RecordingMode::Positions);
        for z in 4..=5 {
            rec.append(&step_to(&resumed, z as f64));
        }
        let b = rec.finish().unwrap();

        let (na, nb) = (a.point_count(), b.point_count());
        rec.merge(&mut a, b);
        assert_eq!(a.point_count(), na + nb - 1);
        let zs: Vec<f64> = a.points().map(|p| p.position[2]).collect();
        assert_eq!(zs, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn recycled_chunks_are_reused() {
        let mut rec = recorder(2);
        let t = track();
        rec.begin(&t, RecordingMode::Positions);
        rec.append(&step_to(&t, 1.0));
        rec.append(&step_to(&t, 2.0));
        let traj = rec.finish().unwrap();
        rec.recycle(traj);

        rec.begin(&t, RecordingMode::Positions);
        rec.append(&step_to(&t, 1.0));
        assert!(rec.pool_stats().reused >= 1);
    }
}

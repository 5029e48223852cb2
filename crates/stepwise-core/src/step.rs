//! The per-step record: pre/post points, length, deposit, secondaries.

use std::fmt;

use smallvec::SmallVec;

use crate::delta::StateDelta;
use crate::error::StepError;
use crate::id::{EffectId, TrackId, VolumeId};
use crate::three::{self, ThreeVector};
use crate::track::{Track, TrackStatus};

/// The three capability categories an effect can act in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActionCategory {
    /// Acts on a track with zero kinetic energy; proposes a time.
    AtRest,
    /// Acts continuously along every step; proposes a length.
    AlongStep,
    /// Acts at a discrete point at the end of a step; proposes a length.
    PostStep,
}

impl fmt::Display for ActionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AtRest => write!(f, "at-rest"),
            Self::AlongStep => write!(f, "along-step"),
            Self::PostStep => write!(f, "post-step"),
        }
    }
}

/// What limited a step, as reported on its post point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum StepStatus {
    /// Not yet determined (pre points and fresh steps).
    #[default]
    Undefined,
    /// The step left the world volume.
    WorldBoundary,
    /// The step ended on a volume boundary.
    GeomBoundary,
    /// An at-rest effect fired.
    AtRestLimited,
    /// A continuous effect limited the length.
    AlongStepLimited,
    /// A discrete effect limited the length.
    PostStepLimited,
}

/// Snapshot of track state at one end of a step.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StepPoint {
    /// Position in mm.
    pub position: ThreeVector,
    /// Unit direction.
    pub direction: ThreeVector,
    /// Kinetic energy in MeV.
    pub kinetic_energy: f64,
    /// Charge in units of e.
    pub charge: f64,
    /// Event time in ns.
    pub global_time: f64,
    /// Track-local time in ns.
    pub local_time: f64,
    /// Proper time in ns.
    pub proper_time: f64,
    /// Volume containing the point.
    pub volume: Option<VolumeId>,
    /// Isotropic distance to the nearest boundary known at this point.
    pub safety: f64,
    /// What limited the step ending here.
    pub status: StepStatus,
    /// Effect credited with defining this point.
    pub defined_by: Option<EffectId>,
}

impl StepPoint {
    /// Capture the current state of `track`.
    pub fn from_track(track: &Track, safety: f64) -> Self {
        Self {
            position: track.position,
            direction: track.direction,
            kinetic_energy: track.kinetic_energy,
            charge: track.charge,
            global_time: track.global_time,
            local_time: track.local_time,
            proper_time: track.proper_time,
            volume: track.volume(),
            safety,
            status: StepStatus::Undefined,
            defined_by: None,
        }
    }
}

/// One atomic advance of a track.
///
/// A single `Step` is owned by the driver and reset in place at the start
/// of every step via [`reset_from`](Step::reset_from). Effects mutate the
/// post point through [`apply_delta`](Step::apply_delta); the track itself
/// is only updated once the whole step has succeeded.
#[derive(Clone, Debug, Default)]
pub struct Step {
    track_id: TrackId,
    number: u64,
    pre: StepPoint,
    post: StepPoint,
    length: f64,
    energy_deposit: f64,
    secondaries: SmallVec<[TrackId; 4]>,
    status: TrackStatus,
}

impl Step {
    /// An empty step buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset this buffer for the next step of `track`.
    ///
    /// Both points are set to the track's current state, the step number
    /// to one past the track's counter, and all accumulators to zero.
    /// The secondary list keeps its capacity.
    pub fn reset_from(&mut self, track: &Track, safety: f64) {
        self.track_id = track.id();
        self.number = track.step_number() + 1;
        self.pre = StepPoint::from_track(track, safety);
        self.post = self.pre;
        self.length = 0.0;
        self.energy_deposit = 0.0;
        self.secondaries.clear();
        self.status = track.status();
    }

    /// Track this step belongs to.
    pub fn track_id(&self) -> TrackId {
        self.track_id
    }

    /// 1-based step number within the track.
    pub fn number(&self) -> u64 {
        self.number
    }

    /// State at the start of the step.
    pub fn pre(&self) -> &StepPoint {
        &self.pre
    }

    /// State at the end of the step.
    pub fn post(&self) -> &StepPoint {
        &self.post
    }

    /// Mutable access to the end state.
    pub fn post_mut(&mut self) -> &mut StepPoint {
        &mut self.post
    }

    /// Length actually taken, in mm.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Set the length taken.
    pub fn set_length(&mut self, length: f64) {
        self.length = length;
    }

    /// Total energy deposited along the step, in MeV.
    pub fn energy_deposit(&self) -> f64 {
        self.energy_deposit
    }

    /// Ids of the secondaries produced during this step, in creation order.
    pub fn secondaries(&self) -> &[TrackId] {
        &self.secondaries
    }

    /// Note a secondary produced during this step.
    pub fn record_secondary(&mut self, id: TrackId) {
        self.secondaries.push(id);
    }

    /// Pending track status, committed to the track when the step succeeds.
    pub fn status(&self) -> TrackStatus {
        self.status
    }

    /// Whether the pending status is still alive.
    pub fn is_alive(&self) -> bool {
        self.status.is_alive()
    }

    /// Move the pending status forward.
    ///
    /// # Errors
    ///
    /// [`StepError::StatusRegression`] if the move is backwards.
    pub fn transition(&mut self, next: TrackStatus) -> Result<(), StepError> {
        if !self.status.can_transition_to(next) {
            return Err(StepError::StatusRegression {
                track_id: self.track_id,
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Merge one effect's output into the post point.
    ///
    /// Later calls see the result of earlier ones. Kinetic energy is
    /// clamped at zero. Secondaries are left in the delta for the caller
    /// to hand off.
    ///
    /// Once the step is killed, a request for a weaker end state is
    /// ignored and the stronger status kept.
    ///
    /// # Errors
    ///
    /// [`StepError::StatusRegression`] if the delta asks for `Alive` after
    /// the step left it, or moves a stopped step backwards.
    pub fn apply_delta(&mut self, delta: &StateDelta) -> Result<(), StepError> {
        if let Some(ke) = delta.kinetic_energy {
            self.post.kinetic_energy = ke.max(0.0);
        }
        if let Some(dir) = delta.direction.and_then(three::unit) {
            self.post.direction = dir;
        }
        if let Some(pos) = delta.position {
            self.post.position = pos;
        }
        if let Some(q) = delta.charge {
            self.post.charge = q;
        }
        self.post.global_time += delta.time_advance;
        self.post.local_time += delta.time_advance;
        self.post.proper_time += delta.proper_time_advance;
        self.energy_deposit += delta.energy_deposit;
        match delta.status {
            Some(status) if self.status.is_killed() && status != TrackStatus::Alive => {
                if self.status.can_transition_to(status) {
                    self.status = status;
                }
            }
            Some(status) => self.transition(status)?,
            None => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::ParticleKind;

    fn track() -> Track {
        let mut t = Track::new(ParticleKind::PROTON, 10.0, [0.0; 3], [1.0, 0.0, 0.0]);
        t.assign_identity(TrackId(3), TrackId::NONE, None);
        t
    }

    #[test]
    fn reset_numbers_next_step() {
        let t = track();
        let mut step = Step::new();
        step.record_secondary(TrackId(9));
        step.reset_from(&t, 1.5);
        assert_eq!(step.number(), 1);
        assert_eq!(step.track_id(), TrackId(3));
        assert!(step.secondaries().is_empty());
        assert_eq!(step.pre().safety, 1.5);
        assert_eq!(step.pre(), step.post());
    }

    #[test]
    fn deltas_accumulate() {
        let t = track();
        let mut step = Step::new();
        step.reset_from(&t, 0.0);

        let mut d = StateDelta::default();
        d.set_kinetic_energy(7.0);
        d.deposit(3.0);
        step.apply_delta(&d).unwrap();

        d.clear();
        d.set_kinetic_energy(-1.0);
        d.deposit(7.0);
        d.time_advance = 0.5;
        step.apply_delta(&d).unwrap();

        assert_eq!(step.post().kinetic_energy, 0.0);
        assert_eq!(step.energy_deposit(), 10.0);
        assert_eq!(step.post().global_time, 0.5);
        assert_eq!(step.pre().kinetic_energy, 10.0);
    }

    #[test]
    fn killed_step_cannot_come_back_alive() {
        let t = track();
        let mut step = Step::new();
        step.reset_from(&t, 0.0);
        step.transition(TrackStatus::StopAndKill).unwrap();
        let mut d = StateDelta::default();
        d.status = Some(TrackStatus::Alive);
        assert!(matches!(
            step.apply_delta(&d),
            Err(StepError::StatusRegression { .. })
        ));
    }

    #[test]
    fn weaker_end_state_keeps_the_stronger_one() {
        let t = track();
        let mut step = Step::new();
        step.reset_from(&t, 0.0);
        let mut d = StateDelta::default();
        d.status = Some(TrackStatus::KillTrackAndSecondaries);
        step.apply_delta(&d).unwrap();

        d.clear();
        d.kill();
        step.apply_delta(&d).unwrap();
        assert_eq!(step.status(), TrackStatus::KillTrackAndSecondaries);

        d.clear();
        d.status = Some(TrackStatus::StopButAlive);
        step.apply_delta(&d).unwrap();
        assert_eq!(step.status(), TrackStatus::KillTrackAndSecondaries);
        assert_eq!(step.post().kinetic_energy, 0.0);
    }

    #[test]
    fn stopped_step_can_still_be_killed() {
        let t = track();
        let mut step = Step::new();
        step.reset_from(&t, 0.0);
        step.transition(TrackStatus::StopButAlive).unwrap();
        let mut d = StateDelta::default();
        d.kill();
        step.apply_delta(&d).unwrap();
        assert_eq!(step.status(), TrackStatus::StopAndKill);
    }

    #[test]
    fn commit_copies_post_into_track() {
        let mut t = track();
        let mut step = Step::new();
        step.reset_from(&t, 0.0);
        step.post_mut().position = [4.0, 0.0, 0.0];
        step.set_length(4.0);
        t.commit_step(&step).unwrap();
        assert_eq!(t.position, [4.0, 0.0, 0.0]);
        assert_eq!(t.track_length(), 4.0);
        assert_eq!(t.step_number(), 1);
    }
}

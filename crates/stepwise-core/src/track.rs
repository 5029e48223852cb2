//! The mutable per-particle [`Track`] record and its status machine.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::StepError;
use crate::id::{EffectId, TrackId, VolumeId};
use crate::particle::ParticleKind;
use crate::step::Step;
use crate::three::{self, ThreeVector};

/// Lifecycle status of a track.
///
/// Transitions only move forward through the ranks below; no status
/// returns to [`Alive`](TrackStatus::Alive) within a pass.
///
/// | Rank | Status |
/// |------|--------|
/// | 0 | `Alive` |
/// | 1 | `StopButAlive`, `PostponeToNextEvent` |
/// | 2 | `StopAndKill` |
/// | 3 | `KillTrackAndSecondaries` |
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TrackStatus {
    /// Still being transported.
    #[default]
    Alive,
    /// Stopped for this pass; the caller may re-queue it.
    StopButAlive,
    /// Finished; secondaries survive.
    StopAndKill,
    /// Finished; the secondaries it produced must be discarded.
    KillTrackAndSecondaries,
    /// Deferred to the next event.
    PostponeToNextEvent,
}

impl TrackStatus {
    /// Whether the track is still being transported.
    pub fn is_alive(self) -> bool {
        self == Self::Alive
    }

    /// Whether the track has been killed (with or without secondaries).
    pub fn is_killed(self) -> bool {
        matches!(self, Self::StopAndKill | Self::KillTrackAndSecondaries)
    }

    fn rank(self) -> u8 {
        match self {
            Self::Alive => 0,
            Self::StopButAlive | Self::PostponeToNextEvent => 1,
            Self::StopAndKill => 2,
            Self::KillTrackAndSecondaries => 3,
        }
    }

    /// Whether moving from `self` to `next` respects forward-only ordering.
    ///
    /// Staying put is always allowed. Moving between the two rank-1
    /// statuses is allowed; everything else must strictly increase rank.
    pub fn can_transition_to(self, next: TrackStatus) -> bool {
        if self == next {
            return true;
        }
        let (from, to) = (self.rank(), next.rank());
        to > from || (from == 1 && to == 1)
    }
}

/// Opaque user payload attached to a track by an observer.
///
/// Shared rather than owned so that tracks stay cheap to clone and
/// [`Send`] across worker hand-off.
#[derive(Clone)]
pub struct UserData(pub Arc<dyn Any + Send + Sync>);

impl UserData {
    /// Wrap a value.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Borrow the payload as `T`, if it has that type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for UserData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UserData(..)")
    }
}

/// Mutable state of one particle being transported.
///
/// Kinematic fields are public so that sources and effects can build
/// tracks directly. Identity, counters and status are private: identity
/// is assigned once by the engine, counters advance only through
/// [`commit_step`](Track::commit_step), and status changes go through
/// [`set_status`](Track::set_status) which enforces forward-only ordering.
#[derive(Clone, Debug)]
pub struct Track {
    id: TrackId,
    parent_id: TrackId,
    creator: Option<EffectId>,
    kind: ParticleKind,
    /// Position in mm.
    pub position: ThreeVector,
    /// Unit momentum direction.
    pub direction: ThreeVector,
    /// Kinetic energy in MeV.
    pub kinetic_energy: f64,
    /// Dynamic charge in units of e (initialised from the kind).
    pub charge: f64,
    /// Time since the start of the event, in ns.
    pub global_time: f64,
    /// Time since the track was created, in ns.
    pub local_time: f64,
    /// Proper time of the particle, in ns.
    pub proper_time: f64,
    volume: Option<VolumeId>,
    track_length: f64,
    step_number: u64,
    status: TrackStatus,
    vertex_kinetic_energy: f64,
    vertex_direction: ThreeVector,
    vertex_position: ThreeVector,
    user_data: Option<UserData>,
}

impl Track {
    /// Create a new, unassigned, alive track.
    ///
    /// `direction` is normalised; a zero direction defaults to +z.
    /// Negative kinetic energies are clamped to zero.
    pub fn new(
        kind: ParticleKind,
        kinetic_energy: f64,
        position: ThreeVector,
        direction: ThreeVector,
    ) -> Self {
        let direction = three::unit(direction).unwrap_or([0.0, 0.0, 1.0]);
        let kinetic_energy = kinetic_energy.max(0.0);
        Self {
            id: TrackId::NONE,
            parent_id: TrackId::NONE,
            creator: None,
            kind,
            position,
            direction,
            kinetic_energy,
            charge: kind.charge,
            global_time: 0.0,
            local_time: 0.0,
            proper_time: 0.0,
            volume: None,
            track_length: 0.0,
            step_number: 0,
            status: TrackStatus::Alive,
            vertex_kinetic_energy: kinetic_energy,
            vertex_direction: direction,
            vertex_position: position,
            user_data: None,
        }
    }

    /// Set the creation time (builder style).
    pub fn with_global_time(mut self, t: f64) -> Self {
        self.global_time = t;
        self
    }

    /// Pre-locate the track in a volume (builder style).
    pub fn with_volume(mut self, volume: VolumeId) -> Self {
        self.volume = Some(volume);
        self
    }

    /// Assign identity. Called once by the engine when the track is
    /// accepted into an event.
    pub fn assign_identity(&mut self, id: TrackId, parent_id: TrackId, creator: Option<EffectId>) {
        self.id = id;
        self.parent_id = parent_id;
        self.creator = creator;
    }

    /// Unique id within the event ([`TrackId::NONE`] until assigned).
    pub fn id(&self) -> TrackId {
        self.id
    }

    /// Id of the parent track ([`TrackId::NONE`] for primaries).
    pub fn parent_id(&self) -> TrackId {
        self.parent_id
    }

    /// Effect that produced this track, `None` for primaries.
    pub fn creator(&self) -> Option<EffectId> {
        self.creator
    }

    /// Particle species.
    pub fn kind(&self) -> ParticleKind {
        self.kind
    }

    /// Current volume, if located.
    pub fn volume(&self) -> Option<VolumeId> {
        self.volume
    }

    /// Set the current volume.
    pub fn set_volume(&mut self, volume: Option<VolumeId>) {
        self.volume = volume;
    }

    /// Cumulative path length in mm.
    pub fn track_length(&self) -> f64 {
        self.track_length
    }

    /// Number of completed steps.
    pub fn step_number(&self) -> u64 {
        self.step_number
    }

    /// Current status.
    pub fn status(&self) -> TrackStatus {
        self.status
    }

    /// Whether the kinetic energy is zero.
    pub fn is_at_rest(&self) -> bool {
        self.kinetic_energy <= 0.0
    }

    /// Speed in mm/ns.
    pub fn velocity(&self) -> f64 {
        self.kind.velocity(self.kinetic_energy)
    }

    /// Momentum vector in MeV/c.
    pub fn momentum(&self) -> ThreeVector {
        three::scale(self.direction, self.kind.momentum(self.kinetic_energy))
    }

    /// Momentum vector at creation, in MeV/c.
    pub fn initial_momentum(&self) -> ThreeVector {
        three::scale(
            self.vertex_direction,
            self.kind.momentum(self.vertex_kinetic_energy),
        )
    }

    /// Position at creation.
    pub fn vertex_position(&self) -> ThreeVector {
        self.vertex_position
    }

    /// Attached user data, if any.
    pub fn user_data(&self) -> Option<&UserData> {
        self.user_data.as_ref()
    }

    /// Attach (or clear) user data.
    pub fn set_user_data(&mut self, data: Option<UserData>) {
        self.user_data = data;
    }

    /// Move the status forward.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::StatusRegression`] if `next` would move the
    /// track backwards (see [`TrackStatus::can_transition_to`]).
    pub fn set_status(&mut self, next: TrackStatus) -> Result<(), StepError> {
        if !self.status.can_transition_to(next) {
            return Err(StepError::StatusRegression {
                track_id: self.id,
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Re-queue a suspended or postponed track for another pass.
    ///
    /// # Errors
    ///
    /// Killed tracks cannot be resumed; returns
    /// [`StepError::StatusRegression`].
    pub fn resume(&mut self) -> Result<(), StepError> {
        match self.status {
            TrackStatus::StopButAlive | TrackStatus::PostponeToNextEvent => {
                self.status = TrackStatus::Alive;
                Ok(())
            }
            TrackStatus::Alive => Ok(()),
            from => Err(StepError::StatusRegression {
                track_id: self.id,
                from,
                to: TrackStatus::Alive,
            }),
        }
    }

    /// Copy a completed step's post-point state into the track.
    ///
    /// Advances the step counter and path length, and applies the step's
    /// pending status.
    pub fn commit_step(&mut self, step: &Step) -> Result<(), StepError> {
        self.set_status(step.status())?;
        let post = step.post();
        self.position = post.position;
        self.direction = post.direction;
        self.kinetic_energy = post.kinetic_energy;
        self.charge = post.charge;
        self.global_time = post.global_time;
        self.local_time = post.local_time;
        self.proper_time = post.proper_time;
        self.volume = post.volume;
        self.track_length += step.length();
        self.step_number = step.number();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn electron() -> Track {
        Track::new(ParticleKind::ELECTRON, 1.0, [0.0; 3], [0.0, 0.0, 2.0])
    }

    #[test]
    fn new_track_is_alive_and_unassigned() {
        let t = electron();
        assert!(t.status().is_alive());
        assert!(t.id().is_none());
        assert_eq!(t.direction, [0.0, 0.0, 1.0]);
        assert_eq!(t.charge, -1.0);
        assert_eq!(t.step_number(), 0);
    }

    #[test]
    fn zero_direction_defaults_to_z() {
        let t = Track::new(ParticleKind::GAMMA, 1.0, [0.0; 3], [0.0; 3]);
        assert_eq!(t.direction, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn killed_track_cannot_be_resurrected() {
        let mut t = electron();
        t.set_status(TrackStatus::StopAndKill).unwrap();
        assert!(matches!(
            t.set_status(TrackStatus::Alive),
            Err(StepError::StatusRegression { .. })
        ));
        assert!(t.resume().is_err());
        assert_eq!(t.status(), TrackStatus::StopAndKill);
    }

    #[test]
    fn kill_can_escalate_to_kill_with_secondaries() {
        let mut t = electron();
        t.set_status(TrackStatus::StopAndKill).unwrap();
        t.set_status(TrackStatus::KillTrackAndSecondaries).unwrap();
        assert!(t.set_status(TrackStatus::StopAndKill).is_err());
    }

    #[test]
    fn suspended_track_can_resume() {
        let mut t = electron();
        t.set_status(TrackStatus::StopButAlive).unwrap();
        t.set_status(TrackStatus::PostponeToNextEvent).unwrap();
        t.resume().unwrap();
        assert!(t.status().is_alive());
    }

    #[test]
    fn initial_momentum_is_frozen_at_creation() {
        let mut t = electron();
        let p0 = t.initial_momentum();
        t.kinetic_energy = 0.2;
        t.direction = [1.0, 0.0, 0.0];
        assert_eq!(t.initial_momentum(), p0);
        assert!(t.momentum()[0] > 0.0);
    }

    #[test]
    fn user_data_downcasts() {
        let mut t = electron();
        t.set_user_data(Some(UserData::new(17u32)));
        assert_eq!(t.user_data().and_then(|d| d.downcast_ref::<u32>()), Some(&17));
        assert!(t.user_data().and_then(|d| d.downcast_ref::<i64>()).is_none());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn any_status() -> impl Strategy<Value = TrackStatus> {
        prop_oneof![
            Just(TrackStatus::Alive),
            Just(TrackStatus::StopButAlive),
            Just(TrackStatus::StopAndKill),
            Just(TrackStatus::KillTrackAndSecondaries),
            Just(TrackStatus::PostponeToNextEvent),
        ]
    }

    proptest! {
        #[test]
        fn status_never_returns_to_alive(requests in prop::collection::vec(any_status(), 1..20)) {
            let mut t = Track::new(ParticleKind::MUON_MINUS, 5.0, [0.0; 3], [0.0, 0.0, 1.0]);
            let mut left_alive = false;
            for next in requests {
                let _ = t.set_status(next);
                if !t.status().is_alive() {
                    left_alive = true;
                }
                if left_alive {
                    prop_assert!(!t.status().is_alive());
                }
            }
        }
    }
}

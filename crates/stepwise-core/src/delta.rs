//! The state update produced by one effect's apply call.

use crate::three::ThreeVector;
use crate::track::{Track, TrackStatus};

/// Pending change to the post-step point, written by one apply call.
///
/// The applier owns a single `StateDelta` and clears it before every call,
/// so effects always start from "no change". Absolute values are `None`
/// when untouched; advances and deposits are additive.
#[derive(Debug, Default)]
pub struct StateDelta {
    /// New kinetic energy, MeV.
    pub kinetic_energy: Option<f64>,
    /// New direction (normalised on merge).
    pub direction: Option<ThreeVector>,
    /// New position, mm.
    pub position: Option<ThreeVector>,
    /// Global and local time advance, ns.
    pub time_advance: f64,
    /// Proper time advance, ns.
    pub proper_time_advance: f64,
    /// New dynamic charge.
    pub charge: Option<f64>,
    /// Energy deposited locally, MeV.
    pub energy_deposit: f64,
    /// Requested status change.
    pub status: Option<TrackStatus>,
    /// Tracks produced by this call. Ownership moves to the secondary
    /// relay as soon as the call returns.
    pub secondaries: Vec<Track>,
}

impl StateDelta {
    /// Reset to "no change", keeping the secondary buffer's capacity.
    pub fn clear(&mut self) {
        self.kinetic_energy = None;
        self.direction = None;
        self.position = None;
        self.time_advance = 0.0;
        self.proper_time_advance = 0.0;
        self.charge = None;
        self.energy_deposit = 0.0;
        self.status = None;
        self.secondaries.clear();
    }

    /// Set the post-step kinetic energy.
    pub fn set_kinetic_energy(&mut self, ke: f64) {
        self.kinetic_energy = Some(ke);
    }

    /// Set the post-step direction.
    pub fn set_direction(&mut self, dir: ThreeVector) {
        self.direction = Some(dir);
    }

    /// Add to the local energy deposit.
    pub fn deposit(&mut self, energy: f64) {
        self.energy_deposit += energy;
    }

    /// Stop and kill the track, with zero remaining energy.
    pub fn kill(&mut self) {
        self.kinetic_energy = Some(0.0);
        self.status = Some(TrackStatus::StopAndKill);
    }

    /// Queue a produced secondary.
    pub fn add_secondary(&mut self, track: Track) {
        self.secondaries.push(track);
    }

    /// Number of queued secondaries.
    pub fn secondary_count(&self) -> usize {
        self.secondaries.len()
    }
}

//! Per-track and per-event counters.
//!
//! [`TrackMetrics`] is filled by the driver while a track is stepped and
//! returned with its outcome. [`EventMetrics`] aggregates the tracks of
//! one event.

use indexmap::IndexMap;
use stepwise_core::Step;

use crate::arbiter::StepReason;

/// Timing and step counters for one track.
///
/// Durations are in microseconds.
#[derive(Clone, Debug, Default)]
pub struct TrackMetrics {
    /// Wall-clock time spent in `process_one_track`, in microseconds.
    pub total_us: u64,
    /// Steps taken.
    pub steps: u64,
    /// Steps resolved in the at-rest branch.
    pub at_rest_steps: u64,
    /// Steps limited by a continuous effect.
    pub continuous_limited: u64,
    /// Steps limited by a discrete effect.
    pub discrete_limited: u64,
    /// Steps limited by a volume boundary.
    pub boundary_limited: u64,
    /// Secondaries produced by every apply call.
    pub secondaries_produced: u64,
    /// Energy deposited along the track, in MeV.
    pub energy_deposit: f64,
    /// Number of steps credited to each effect, keyed by effect name.
    pub effect_wins: IndexMap<String, u64>,
}

impl TrackMetrics {
    /// Account one completed step.
    pub fn record_step(&mut self, reason: StepReason, winner: Option<&str>, step: &Step) {
        self.steps += 1;
        match reason {
            StepReason::AtRest => self.at_rest_steps += 1,
            StepReason::Continuous => self.continuous_limited += 1,
            StepReason::Discrete => self.discrete_limited += 1,
            StepReason::Boundary => self.boundary_limited += 1,
        }
        self.secondaries_produced += step.secondaries().len() as u64;
        self.energy_deposit += step.energy_deposit();
        if let Some(name) = winner {
            match self.effect_wins.get_mut(name) {
                Some(count) => *count += 1,
                None => {
                    self.effect_wins.insert(name.to_string(), 1);
                }
            }
        }
    }
}

/// Counters for one event.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventMetrics {
    /// Wall-clock time for the whole event, in microseconds.
    pub total_us: u64,
    /// Tracks processed (a resumed track counts once per pass).
    pub tracks: u64,
    /// Steps taken across all tracks.
    pub steps: u64,
    /// Secondaries produced.
    pub secondaries_produced: u64,
    /// Secondaries discarded because their parent was killed with them.
    pub secondaries_discarded: u64,
    /// Tracks deferred to the next event.
    pub postponed: u64,
    /// Tracks still suspended after their extra pass.
    pub suspended: u64,
    /// Energy deposited, in MeV.
    pub energy_deposit: f64,
}

impl EventMetrics {
    /// Fold one finished track into the totals.
    pub fn absorb(&mut self, track: &TrackMetrics) {
        self.tracks += 1;
        self.steps += track.steps;
        self.secondaries_produced += track.secondaries_produced;
        self.energy_deposit += track.energy_deposit;
    }

    /// Fold another event's totals into these.
    pub fn merge(&mut self, other: &EventMetrics) {
        self.total_us += other.total_us;
        self.tracks += other.tracks;
        self.steps += other.steps;
        self.secondaries_produced += other.secondaries_produced;
        self.secondaries_discarded += other.secondaries_discarded;
        self.postponed += other.postponed;
        self.suspended += other.suspended;
        self.energy_deposit += other.energy_deposit;
    }
}

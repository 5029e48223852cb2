//! Test utilities and mock types for Stepwise development.
//!
//! Provides mock [`Navigator`]s, fixture effects with fixed proposals
//! (see [`fixtures`]), recording observers (see [`observers`]), and small
//! track constructors.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;
pub mod observers;

use std::sync::{Arc, Mutex};

use stepwise_core::{
    GeomStep, NavigationError, Navigator, ParticleKind, ThreeVector, Track, VolumeId,
};

pub use fixtures::{FailingEffect, FixedAlongStep, FixedAtRest, FixedPostStep};
pub use observers::{AbortAfter, Control, ControlAfter, ObserverEvent, ObserverLog, RecordingObserver};

// ── ApplyLog ───────────────────────────────────────────────────────

/// Shared, ordered log of apply calls, written as `"<name>:<category>"`.
///
/// Clones share the same log, so a test keeps one clone and hands the
/// others to fixture effects.
#[derive(Clone, Debug, Default)]
pub struct ApplyLog(Arc<Mutex<Vec<String>>>);

impl ApplyLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: String) {
        if let Ok(mut log) = self.0.lock() {
            log.push(entry);
        }
    }

    /// Snapshot of every entry so far.
    pub fn entries(&self) -> Vec<String> {
        self.0.lock().map(|log| log.clone()).unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut log) = self.0.lock() {
            log.clear();
        }
    }
}

// ── Navigators ─────────────────────────────────────────────────────

/// Navigator with a constant boundary distance.
///
/// Every position is inside `VolumeId(0)` unless
/// [`outside_world`](Self::outside_world) is set.
#[derive(Clone, Debug)]
pub struct MockNavigator {
    pub distance: f64,
    pub safety: f64,
    pub volume: Option<VolumeId>,
    pub fail: bool,
}

impl MockNavigator {
    pub fn new(distance: f64) -> Self {
        Self {
            distance,
            safety: 0.0,
            volume: Some(VolumeId(0)),
            fail: false,
        }
    }

    pub fn with_safety(mut self, safety: f64) -> Self {
        self.safety = safety;
        self
    }

    /// Every position is outside the world.
    pub fn outside_world(mut self) -> Self {
        self.volume = None;
        self
    }

    /// `compute_step` always fails.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

impl Navigator for MockNavigator {
    fn compute_step(
        &mut self,
        _position: ThreeVector,
        _direction: ThreeVector,
        _max_step: f64,
    ) -> Result<GeomStep, NavigationError> {
        if self.fail {
            return Err(NavigationError::new("mock navigator failure"));
        }
        Ok(GeomStep {
            distance: self.distance,
            safety: self.safety,
        })
    }

    fn locate(&mut self, _position: ThreeVector, _direction: ThreeVector) -> Option<VolumeId> {
        self.volume
    }
}

/// Navigator replaying scripted distances and locations.
///
/// Each `compute_step` returns the next distance and each `locate` the
/// next location; once a script runs out its last entry repeats.
#[derive(Clone, Debug)]
pub struct ScriptedNavigator {
    distances: Vec<f64>,
    locations: Vec<Option<VolumeId>>,
    next_distance: usize,
    next_location: usize,
    queried: Arc<Mutex<Vec<f64>>>,
}

impl ScriptedNavigator {
    pub fn new(distances: Vec<f64>) -> Self {
        Self {
            distances,
            locations: vec![Some(VolumeId(0))],
            next_distance: 0,
            next_location: 0,
            queried: Arc::default(),
        }
    }

    pub fn with_locations(mut self, locations: Vec<Option<VolumeId>>) -> Self {
        self.locations = locations;
        self
    }

    /// Shared list of the `max_step` values the navigator was asked for.
    pub fn queried(&self) -> Arc<Mutex<Vec<f64>>> {
        Arc::clone(&self.queried)
    }
}

fn replay<T: Copy>(script: &[T], cursor: &mut usize) -> Option<T> {
    let value = script.get(*cursor).or_else(|| script.last()).copied();
    *cursor += 1;
    value
}

impl Navigator for ScriptedNavigator {
    fn compute_step(
        &mut self,
        _position: ThreeVector,
        _direction: ThreeVector,
        max_step: f64,
    ) -> Result<GeomStep, NavigationError> {
        if let Ok(mut q) = self.queried.lock() {
            q.push(max_step);
        }
        let distance = replay(&self.distances, &mut self.next_distance)
            .ok_or_else(|| NavigationError::new("empty distance script"))?;
        Ok(GeomStep {
            distance,
            safety: 0.0,
        })
    }

    fn locate(&mut self, _position: ThreeVector, _direction: ThreeVector) -> Option<VolumeId> {
        replay(&self.locations, &mut self.next_location).flatten()
    }
}

// ── Tracks ─────────────────────────────────────────────────────────

/// A primary of `kind` at the origin moving along +z.
pub fn primary(kind: ParticleKind, kinetic_energy: f64) -> Track {
    Track::new(kind, kinetic_energy, [0.0; 3], [0.0, 0.0, 1.0])
}

pub fn electron(kinetic_energy: f64) -> Track {
    primary(ParticleKind::ELECTRON, kinetic_energy)
}

pub fn gamma(kinetic_energy: f64) -> Track {
    primary(ParticleKind::GAMMA, kinetic_energy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_navigator_repeats_last_entry() {
        let mut nav = ScriptedNavigator::new(vec![1.0, 2.0])
            .with_locations(vec![Some(VolumeId(0)), None]);
        let d: Vec<f64> = (0..3)
            .map(|_| nav.compute_step([0.0; 3], [0.0, 0.0, 1.0], 9.0).unwrap().distance)
            .collect();
        assert_eq!(d, vec![1.0, 2.0, 2.0]);
        assert_eq!(nav.locate([0.0; 3], [0.0; 3]), Some(VolumeId(0)));
        assert_eq!(nav.locate([0.0; 3], [0.0; 3]), None);
        assert_eq!(nav.locate([0.0; 3], [0.0; 3]), None);
        assert_eq!(*nav.queried().lock().unwrap(), vec![9.0; 3]);
    }

    #[test]
    fn apply_log_is_shared() {
        let log = ApplyLog::new();
        let other = log.clone();
        other.push("a:post".into());
        assert_eq!(log.entries(), vec!["a:post"]);
        log.clear();
        assert!(other.entries().is_empty());
    }
}

//! Contexts handed to effects during arbitration and application.

use stepwise_core::{StateDelta, Step, Track};

/// Read-only inputs to a `propose` call.
pub struct ProposeContext<'a> {
    track: &'a Track,
    previous_step_length: f64,
    safety: f64,
}

impl<'a> ProposeContext<'a> {
    /// Construct a propose context.
    ///
    /// Called by the engine; tests may construct one directly.
    pub fn new(track: &'a Track, previous_step_length: f64, safety: f64) -> Self {
        Self {
            track,
            previous_step_length,
            safety,
        }
    }

    /// The track as of the start of this step.
    pub fn track(&self) -> &Track {
        self.track
    }

    /// Length of the previous step (0 on the first step).
    pub fn previous_step_length(&self) -> f64 {
        self.previous_step_length
    }

    /// Isotropic distance to the nearest boundary at the pre-step point.
    pub fn safety(&self) -> f64 {
        self.safety
    }
}

/// Inputs and output buffer of an `apply` call.
///
/// `step()` reflects every delta merged earlier in the same step, so an
/// effect sees the post-point state left by the effects applied before it.
/// The delta arrives cleared.
pub struct ApplyContext<'a> {
    track: &'a Track,
    step: &'a Step,
    delta: &'a mut StateDelta,
}

impl<'a> ApplyContext<'a> {
    /// Construct an apply context.
    pub fn new(track: &'a Track, step: &'a Step, delta: &'a mut StateDelta) -> Self {
        Self { track, step, delta }
    }

    /// The track as of the start of this step.
    pub fn track(&self) -> &Track {
        self.track
    }

    /// The step so far.
    pub fn step(&self) -> &Step {
        self.step
    }

    /// Output buffer for this call.
    pub fn delta(&mut self) -> &mut StateDelta {
        self.delta
    }
}

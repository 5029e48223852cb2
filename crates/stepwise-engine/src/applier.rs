//! Executes an arbitrated step against the effect registry.

use stepwise_core::{
    ActionCategory, EffectError, EffectId, StateDelta, Step, StepError, StepStatus, Track,
    TrackStatus,
};
use stepwise_effect::{ApplyContext, EffectRegistry, Forcing};

use crate::arbiter::{StepDecision, StepReason};
use crate::relay::SecondaryRelay;
use crate::transport::Transportation;

/// Applies one [`StepDecision`] to the step buffer.
///
/// Application order for a moving step:
///
/// 1. transportation moves the post point;
/// 2. every along-step effect, in registration order, even if an earlier
///    one killed the track;
/// 3. the discrete winner, if the step is discrete-limited and the track
///    is still alive;
/// 4. forced post-step effects: `Forced` only while alive,
///    `StronglyForced` always.
///
/// A live track left without kinetic energy after phase 2 or phase 4 is
/// brought to rest, and killed when no at-rest effect is registered.
///
/// Each effect sees the post point left by the effects before it. The
/// applier owns one [`StateDelta`] that is cleared before every call.
#[derive(Debug, Default)]
pub struct StepApplier {
    delta: StateDelta,
}

impl StepApplier {
    /// Create an applier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `decision` to `step`, handing produced secondaries to `relay`.
    ///
    /// `step` must have been reset from `track`. On error the step is left
    /// partially applied and must not be committed.
    pub fn apply(
        &mut self,
        decision: &StepDecision,
        registry: &mut EffectRegistry,
        transport: &mut Transportation,
        relay: &mut SecondaryRelay,
        track: &Track,
        step: &mut Step,
    ) -> Result<(), StepError> {
        match decision.reason {
            StepReason::AtRest => self.apply_at_rest(decision, registry, relay, track, step),
            _ => self.apply_moving(decision, registry, transport, relay, track, step),
        }
    }

    fn apply_at_rest(
        &mut self,
        decision: &StepDecision,
        registry: &mut EffectRegistry,
        relay: &mut SecondaryRelay,
        track: &Track,
        step: &mut Step,
    ) -> Result<(), StepError> {
        step.set_length(0.0);
        let dt = decision.at_rest_time;
        let post = step.post_mut();
        if dt.is_finite() && dt > 0.0 {
            post.global_time += dt;
            post.local_time += dt;
            post.proper_time += dt;
        }
        post.status = StepStatus::AtRestLimited;
        post.defined_by = decision.winner;

        match decision.winner {
            Some(id) => self.apply_single(ActionCategory::AtRest, id, registry, relay, track, step)?,
            None => step.transition(TrackStatus::StopAndKill)?,
        }
        self.apply_forced(ActionCategory::AtRest, decision, true, registry, relay, track, step)?;

        // A particle at rest cannot take another step.
        if step.is_alive() {
            step.transition(TrackStatus::StopAndKill)?;
        }
        Ok(())
    }

    fn apply_moving(
        &mut self,
        decision: &StepDecision,
        registry: &mut EffectRegistry,
        transport: &mut Transportation,
        relay: &mut SecondaryRelay,
        track: &Track,
        step: &mut Step,
    ) -> Result<(), StepError> {
        step.set_length(decision.length);
        let post = step.post_mut();
        post.status = match decision.reason {
            StepReason::Boundary => StepStatus::GeomBoundary,
            StepReason::Discrete => StepStatus::PostStepLimited,
            _ => StepStatus::AlongStepLimited,
        };
        post.defined_by = decision.winner;

        let safety = decision.geometry.map_or(0.0, |g| g.safety);
        transport.apply(track, step, safety, decision.reason == StepReason::Boundary)?;

        registry.try_for_each_along_step(|id, name, action| -> Result<(), StepError> {
            self.call(track, step, |ctx| action.apply(ctx))
                .map_err(|reason| {
                    apply_failed(name, ActionCategory::AlongStep, track, step, reason)
                })?;
            self.merge(relay, track, step, id)
        })?;

        let exhausted = settle_exhaustion(registry, step)?;

        let mut winner_ran = false;
        if decision.reason == StepReason::Discrete && step.is_alive() && !exhausted {
            if let Some(id) = decision.winner {
                self.apply_single(ActionCategory::PostStep, id, registry, relay, track, step)?;
                winner_ran = true;
            }
        }
        self.apply_forced(
            ActionCategory::PostStep,
            decision,
            winner_ran,
            registry,
            relay,
            track,
            step,
        )?;

        // Post-step effects can also take the last of the energy.
        settle_exhaustion(registry, step)?;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn apply_forced(
        &mut self,
        category: ActionCategory,
        decision: &StepDecision,
        skip_winner: bool,
        registry: &mut EffectRegistry,
        relay: &mut SecondaryRelay,
        track: &Track,
        step: &mut Step,
    ) -> Result<(), StepError> {
        for &(id, forcing) in &decision.forced {
            if skip_winner && decision.winner == Some(id) {
                continue;
            }
            if forcing == Forcing::StronglyForced || step.is_alive() {
                self.apply_single(category, id, registry, relay, track, step)?;
            }
        }
        Ok(())
    }

    fn apply_single(
        &mut self,
        category: ActionCategory,
        id: EffectId,
        registry: &mut EffectRegistry,
        relay: &mut SecondaryRelay,
        track: &Track,
        step: &mut Step,
    ) -> Result<(), StepError> {
        let called = match category {
            ActionCategory::AtRest => registry
                .at_rest_mut(id)
                .map(|action| self.call(track, step, |ctx| action.apply(ctx))),
            ActionCategory::AlongStep => registry
                .along_step_mut(id)
                .map(|action| self.call(track, step, |ctx| action.apply(ctx))),
            ActionCategory::PostStep => registry
                .post_step_mut(id)
                .map(|action| self.call(track, step, |ctx| action.apply(ctx))),
        };
        let Some(called) = called else {
            return Ok(());
        };
        called.map_err(|reason| apply_failed(registry.name(id), category, track, step, reason))?;
        self.merge(relay, track, step, id)
    }

    fn call(
        &mut self,
        track: &Track,
        step: &Step,
        f: impl FnOnce(&mut ApplyContext<'_>) -> Result<(), EffectError>,
    ) -> Result<(), EffectError> {
        self.delta.clear();
        let mut ctx = ApplyContext::new(track, step, &mut self.delta);
        f(&mut ctx)
    }

    fn merge(
        &mut self,
        relay: &mut SecondaryRelay,
        track: &Track,
        step: &mut Step,
        creator: EffectId,
    ) -> Result<(), StepError> {
        step.apply_delta(&self.delta)?;
        for secondary in self.delta.secondaries.drain(..) {
            let id = relay.push(secondary, track.id(), creator);
            step.record_secondary(id);
        }
        Ok(())
    }
}

/// Clamp a live track with no kinetic energy left to rest. Without at-rest
/// effects it has nowhere to go and is killed. Returns whether it was
/// exhausted.
fn settle_exhaustion(registry: &EffectRegistry, step: &mut Step) -> Result<bool, StepError> {
    if !step.is_alive() || step.post().kinetic_energy > 0.0 {
        return Ok(false);
    }
    step.post_mut().kinetic_energy = 0.0;
    if !registry.has_at_rest() {
        step.transition(TrackStatus::StopAndKill)?;
    }
    Ok(true)
}

fn apply_failed(
    effect: &str,
    category: ActionCategory,
    track: &Track,
    step: &Step,
    reason: EffectError,
) -> StepError {
    StepError::ApplyFailed {
        effect: effect.to_string(),
        category,
        track_id: track.id(),
        step_number: step.number(),
        reason,
    }
}

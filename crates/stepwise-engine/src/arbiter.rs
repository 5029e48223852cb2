//! Per-step selection of the limiting effect.
//!
//! # Tie-break rules
//!
//! - Within one category the first-registered effect wins a tie.
//! - Between categories the discrete minimum wins a tie with the
//!   continuous minimum.
//! - The boundary wins only when strictly shorter than both minima; the
//!   navigator is queried with `max_step = min(continuous, discrete)`.

use smallvec::SmallVec;
use stepwise_core::{ActionCategory, EffectError, EffectId, GeomStep, StepError, Track};
use stepwise_effect::{EffectRegistry, Forcing, ProposeContext, Selection};

use crate::transport::Transportation;

/// Which kind of limit won arbitration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StepReason {
    /// The track was at rest; an at-rest effect (or none) fires.
    AtRest,
    /// A continuous effect set the length.
    Continuous,
    /// A discrete effect set the length.
    Discrete,
    /// A volume boundary set the length.
    Boundary,
}

/// Outcome of arbitrating one step.
#[derive(Clone, Debug, PartialEq)]
pub struct StepDecision {
    /// Which kind of limit won.
    pub reason: StepReason,
    /// Step length to take, mm. Zero for at-rest steps.
    pub length: f64,
    /// Time until the at-rest winner fires, ns. Zero unless at rest.
    pub at_rest_time: f64,
    /// Credited effect. [`Transportation::ID`] for boundary steps, `None`
    /// when a non-candidate continuous limit won or no at-rest effect
    /// will ever fire.
    pub winner: Option<EffectId>,
    /// Smallest continuous proposal.
    pub continuous_min: f64,
    /// Smallest discrete proposal.
    pub discrete_min: f64,
    /// Navigator reply, absent for at-rest steps.
    pub geometry: Option<GeomStep>,
    /// Forced post-step (or at-rest) effects, in registration order.
    pub forced: SmallVec<[(EffectId, Forcing); 4]>,
}

impl StepDecision {
    fn at_rest(time: f64, winner: Option<EffectId>, forced: SmallVec<[(EffectId, Forcing); 4]>) -> Self {
        Self {
            reason: StepReason::AtRest,
            length: 0.0,
            at_rest_time: time,
            winner,
            continuous_min: f64::INFINITY,
            discrete_min: f64::INFINITY,
            geometry: None,
            forced,
        }
    }
}

/// Chooses the step length and limiting effect for each step.
///
/// Stateless: all per-track state lives in the effects and the track.
#[derive(Clone, Copy, Debug, Default)]
pub struct StepArbiter;

impl StepArbiter {
    /// Create an arbiter.
    pub fn new() -> Self {
        Self
    }

    /// Arbitrate the next step of `track`.
    ///
    /// `previous_step_length` and `safety` come from the previous step's
    /// post point (both zero on the first step).
    ///
    /// # Errors
    ///
    /// Any proposal failure, NaN or negative proposal, navigator failure,
    /// or an at-rest track without at-rest effects is fatal for the step.
    pub fn decide(
        &self,
        registry: &mut EffectRegistry,
        transport: &mut Transportation,
        track: &Track,
        previous_step_length: f64,
        safety: f64,
    ) -> Result<StepDecision, StepError> {
        let step_number = track.step_number() + 1;
        let ctx = ProposeContext::new(track, previous_step_length, safety);

        if track.is_at_rest() {
            return decide_at_rest(registry, &ctx, step_number);
        }

        // Continuous proposals.
        let mut continuous_min = f64::INFINITY;
        let mut continuous_winner = None;
        registry.try_for_each_along_step(|id, name, action| -> Result<(), StepError> {
            let proposal = action.propose(&ctx).map_err(|reason| {
                proposal_failed(name, ActionCategory::AlongStep, track, step_number, reason)
            })?;
            check_proposal(proposal.length, name, ActionCategory::AlongStep, track, step_number)?;
            if proposal.length < continuous_min {
                continuous_min = proposal.length;
                continuous_winner = match proposal.selection {
                    Selection::Candidate => Some(id),
                    Selection::NotCandidate => None,
                };
            }
            Ok(())
        })?;

        // Discrete proposals, minimised independently.
        let mut discrete_min = f64::INFINITY;
        let mut discrete_winner = None;
        let mut forced = SmallVec::new();
        registry.try_for_each_post_step(|id, name, action| -> Result<(), StepError> {
            let proposal = action.propose(&ctx).map_err(|reason| {
                proposal_failed(name, ActionCategory::PostStep, track, step_number, reason)
            })?;
            check_proposal(proposal.length, name, ActionCategory::PostStep, track, step_number)?;
            if proposal.forcing != Forcing::NotForced {
                forced.push((id, proposal.forcing));
            }
            if proposal.length < discrete_min {
                discrete_min = proposal.length;
                discrete_winner = Some(id);
            }
            Ok(())
        })?;

        // Geometry, bounded by the tighter effect limit.
        let max_step = continuous_min.min(discrete_min);
        let geometry = transport.compute_step(track, max_step, step_number)?;

        let (reason, length, winner) = if geometry.distance < max_step {
            (
                StepReason::Boundary,
                geometry.distance,
                Some(Transportation::ID),
            )
        } else if discrete_min <= continuous_min {
            (StepReason::Discrete, discrete_min, discrete_winner)
        } else {
            (StepReason::Continuous, continuous_min, continuous_winner)
        };

        Ok(StepDecision {
            reason,
            length,
            at_rest_time: 0.0,
            winner,
            continuous_min,
            discrete_min,
            geometry: Some(geometry),
            forced,
        })
    }
}

fn decide_at_rest(
    registry: &mut EffectRegistry,
    ctx: &ProposeContext<'_>,
    step_number: u64,
) -> Result<StepDecision, StepError> {
    let track = ctx.track();
    if !registry.has_at_rest() {
        return Err(StepError::NoAtRestEffect {
            track_id: track.id(),
        });
    }
    let mut min = f64::INFINITY;
    let mut winner = None;
    let mut forced = SmallVec::new();
    registry.try_for_each_at_rest(|id, name, action| -> Result<(), StepError> {
        let proposal = action.propose(ctx).map_err(|reason| {
            proposal_failed(name, ActionCategory::AtRest, track, step_number, reason)
        })?;
        check_proposal(proposal.time, name, ActionCategory::AtRest, track, step_number)?;
        if proposal.forcing != Forcing::NotForced {
            forced.push((id, proposal.forcing));
        }
        if proposal.time < min {
            min = proposal.time;
            winner = Some(id);
        }
        Ok(())
    })?;
    let time = if min.is_finite() { min } else { 0.0 };
    Ok(StepDecision::at_rest(time, winner, forced))
}

fn check_proposal(
    value: f64,
    effect: &str,
    category: ActionCategory,
    track: &Track,
    step_number: u64,
) -> Result<(), StepError> {
    if value.is_nan() || value < 0.0 {
        return Err(StepError::InvalidProposal {
            effect: effect.to_string(),
            category,
            track_id: track.id(),
            step_number,
            value,
        });
    }
    Ok(())
}

fn proposal_failed(
    effect: &str,
    category: ActionCategory,
    track: &Track,
    step_number: u64,
    reason: EffectError,
) -> StepError {
    StepError::ProposalFailed {
        effect: effect.to_string(),
        category,
        track_id: track.id(),
        step_number,
        reason,
    }
}

//! User step-length limit.

use stepwise_core::EffectError;
use stepwise_effect::{
    ApplyContext, Capabilities, Effect, PostStepAction, PostStepProposal, ProposeContext,
};

/// Discrete effect that caps every step at `max_step` mm and changes
/// nothing when it wins.
#[derive(Clone, Debug)]
pub struct StepLimiter {
    name: String,
    max_step: f64,
}

impl StepLimiter {
    /// Limiter named `"step_limiter"`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `max_step` is NaN or not positive.
    pub fn new(max_step: f64) -> Result<Self, String> {
        Self::named("step_limiter", max_step)
    }

    /// Limiter with a custom name, for engines that register several.
    pub fn named(name: impl Into<String>, max_step: f64) -> Result<Self, String> {
        if max_step.is_nan() || max_step <= 0.0 {
            return Err(format!("max_step must be > 0, got {max_step}"));
        }
        Ok(Self {
            name: name.into(),
            max_step,
        })
    }

    /// The cap in mm.
    pub fn max_step(&self) -> f64 {
        self.max_step
    }
}

impl PostStepAction for StepLimiter {
    fn propose(&mut self, _ctx: &ProposeContext<'_>) -> Result<PostStepProposal, EffectError> {
        Ok(PostStepProposal::new(self.max_step))
    }

    fn apply(&mut self, _ctx: &mut ApplyContext<'_>) -> Result<(), EffectError> {
        Ok(())
    }
}

impl Effect for StepLimiter {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::POST_STEP
    }

    fn post_step(&mut self) -> Option<&mut dyn PostStepAction> {
        Some(self)
    }
}

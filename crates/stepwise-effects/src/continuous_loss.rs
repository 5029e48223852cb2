//! Continuous energy loss at a constant stopping power.
//!
//! Each step loses `stopping_power * length` of kinetic energy, deposited
//! locally. The proposed limit keeps the fractional loss per step below
//! `max_fraction` until the residual range drops under `final_range`,
//! after which the track is allowed to range out in a single step.
//!
//! Constructed via the builder pattern: [`ContinuousLoss::builder`].

use stepwise_core::EffectError;
use stepwise_effect::{
    AlongStepAction, AlongStepProposal, ApplyContext, Capabilities, Effect, ProposeContext,
};

/// Relative residual energy treated as fully stopped.
const RANGE_TOLERANCE: f64 = 1e-12;

/// Constant-dE/dx continuous energy loss.
#[derive(Clone, Debug)]
pub struct ContinuousLoss {
    name: String,
    stopping_power: f64,
    max_fraction: f64,
    final_range: f64,
    charged_only: bool,
}

/// Builder for [`ContinuousLoss`].
///
/// Required field: `stopping_power`.
#[derive(Clone, Debug)]
pub struct ContinuousLossBuilder {
    name: String,
    stopping_power: Option<f64>,
    max_fraction: f64,
    final_range: f64,
    charged_only: bool,
}

impl ContinuousLoss {
    /// Create a new builder for configuring a `ContinuousLoss` effect.
    pub fn builder() -> ContinuousLossBuilder {
        ContinuousLossBuilder {
            name: "eloss".to_string(),
            stopping_power: None,
            max_fraction: 0.2,
            final_range: 1.0,
            charged_only: true,
        }
    }

    /// Stopping power in MeV/mm.
    pub fn stopping_power(&self) -> f64 {
        self.stopping_power
    }

    /// Residual range in mm at `kinetic_energy`.
    pub fn range(&self, kinetic_energy: f64) -> f64 {
        kinetic_energy.max(0.0) / self.stopping_power
    }

    fn acts_on(&self, charge: f64) -> bool {
        !self.charged_only || charge != 0.0
    }
}

impl ContinuousLossBuilder {
    /// Effect name (default: `"eloss"`).
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Stopping power in MeV/mm. Must be finite and > 0.
    pub fn stopping_power(mut self, dedx: f64) -> Self {
        self.stopping_power = Some(dedx);
        self
    }

    /// Largest fraction of the residual range one step may consume
    /// (default: 0.2). Must be in `(0, 1]`.
    pub fn max_fraction(mut self, fraction: f64) -> Self {
        self.max_fraction = fraction;
        self
    }

    /// Range in mm below which the track stops in one step (default: 1.0).
    pub fn final_range(mut self, range: f64) -> Self {
        self.final_range = range;
        self
    }

    /// Whether neutral tracks are exempt (default: true).
    pub fn charged_only(mut self, charged_only: bool) -> Self {
        self.charged_only = charged_only;
        self
    }

    /// Build the effect, validating all configuration.
    ///
    /// # Errors
    ///
    /// Returns `Err` if:
    /// - `stopping_power` is not set, not finite, or not positive
    /// - `max_fraction` is outside `(0, 1]`
    /// - `final_range` is not finite or not positive
    pub fn build(self) -> Result<ContinuousLoss, String> {
        let stopping_power = self
            .stopping_power
            .ok_or_else(|| "stopping_power is required".to_string())?;
        if !stopping_power.is_finite() || stopping_power <= 0.0 {
            return Err(format!(
                "stopping_power must be finite and > 0, got {stopping_power}"
            ));
        }
        if !(self.max_fraction > 0.0 && self.max_fraction <= 1.0) {
            return Err(format!(
                "max_fraction must be in (0, 1], got {}",
                self.max_fraction
            ));
        }
        if !self.final_range.is_finite() || self.final_range <= 0.0 {
            return Err(format!(
                "final_range must be finite and > 0, got {}",
                self.final_range
            ));
        }
        Ok(ContinuousLoss {
            name: self.name,
            stopping_power,
            max_fraction: self.max_fraction,
            final_range: self.final_range,
            charged_only: self.charged_only,
        })
    }
}

impl AlongStepAction for ContinuousLoss {
    fn propose(&mut self, ctx: &ProposeContext<'_>) -> Result<AlongStepProposal, EffectError> {
        let track = ctx.track();
        if !self.acts_on(track.charge) || track.kinetic_energy <= 0.0 {
            return Ok(AlongStepProposal::unlimited());
        }
        let range = self.range(track.kinetic_energy);
        let limit = if range <= self.final_range {
            range
        } else {
            (self.max_fraction * range).max(self.final_range)
        };
        Ok(AlongStepProposal::candidate(limit))
    }

    fn apply(&mut self, ctx: &mut ApplyContext<'_>) -> Result<(), EffectError> {
        let post = *ctx.step().post();
        let length = ctx.step().length();
        if !self.acts_on(post.charge) || length <= 0.0 || post.kinetic_energy <= 0.0 {
            return Ok(());
        }
        let ke = post.kinetic_energy;
        let loss = self.stopping_power * length;
        let remaining = ke - loss;
        if remaining <= ke * RANGE_TOLERANCE {
            ctx.delta().set_kinetic_energy(0.0);
            ctx.delta().deposit(ke);
        } else {
            ctx.delta().set_kinetic_energy(remaining);
            ctx.delta().deposit(loss);
        }
        Ok(())
    }
}

impl Effect for ContinuousLoss {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::ALONG_STEP
    }

    fn along_step(&mut self) -> Option<&mut dyn AlongStepAction> {
        Some(self)
    }
}

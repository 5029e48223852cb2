//! At-rest decay with an exponential lifetime.
//!
//! A stopped track of the configured species waits an exponentially
//! distributed time, sampled once per track, then dies. Optionally one
//! product is emitted isotropically at the decay point.
//!
//! Constructed via the builder pattern: [`AtRestDecay::builder`].

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use stepwise_core::{three, EffectError, ParticleKind, Track};
use stepwise_effect::{
    ApplyContext, AtRestAction, AtRestProposal, Capabilities, Effect, ProposeContext,
};

use crate::{open_uniform, track_rng};

/// Exponential at-rest decay.
#[derive(Clone, Debug)]
pub struct AtRestDecay {
    name: String,
    mean_lifetime: f64,
    product: Option<(ParticleKind, f64)>,
    applies_to: Option<i32>,
    seed: u64,
    rng: ChaCha8Rng,
    decay_time: f64,
}

/// Builder for [`AtRestDecay`].
///
/// Required field: `mean_lifetime`.
#[derive(Clone, Debug)]
pub struct AtRestDecayBuilder {
    name: String,
    mean_lifetime: Option<f64>,
    product: Option<(ParticleKind, f64)>,
    applies_to: Option<i32>,
    seed: u64,
}

impl AtRestDecay {
    /// Create a new builder for configuring an `AtRestDecay` effect.
    pub fn builder() -> AtRestDecayBuilder {
        AtRestDecayBuilder {
            name: "decay".to_string(),
            mean_lifetime: None,
            product: None,
            applies_to: None,
            seed: 0,
        }
    }

    /// Time in ns the current track will wait at rest.
    pub fn decay_time(&self) -> f64 {
        self.decay_time
    }

    fn applies(&self, track: &Track) -> bool {
        self.applies_to
            .is_none_or(|code| code == track.kind().pdg_code)
    }

    fn resample(&mut self) {
        self.decay_time = -self.mean_lifetime * open_uniform(&mut self.rng).ln();
    }
}

impl AtRestDecayBuilder {
    /// Effect name (default: `"decay"`).
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Mean lifetime in ns. Must be finite and >= 0.
    pub fn mean_lifetime(mut self, tau: f64) -> Self {
        self.mean_lifetime = Some(tau);
        self
    }

    /// Emit one `kind` with `kinetic_energy` MeV on decay (default: none).
    pub fn product(mut self, kind: ParticleKind, kinetic_energy: f64) -> Self {
        self.product = Some((kind, kinetic_energy));
        self
    }

    /// Restrict to one species by PDG code (default: all species).
    pub fn applies_to(mut self, kind: ParticleKind) -> Self {
        self.applies_to = Some(kind.pdg_code);
        self
    }

    /// Seed for the per-track generator (default: 0).
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Build the effect, validating all configuration.
    ///
    /// # Errors
    ///
    /// Returns `Err` if:
    /// - `mean_lifetime` is not set, not finite, or negative
    /// - the product energy is not finite or negative
    pub fn build(self) -> Result<AtRestDecay, String> {
        let mean_lifetime = self
            .mean_lifetime
            .ok_or_else(|| "mean_lifetime is required".to_string())?;
        if !mean_lifetime.is_finite() || mean_lifetime < 0.0 {
            return Err(format!(
                "mean_lifetime must be finite and >= 0, got {mean_lifetime}"
            ));
        }
        if let Some((_, ke)) = self.product {
            if !ke.is_finite() || ke < 0.0 {
                return Err(format!("product energy must be finite and >= 0, got {ke}"));
            }
        }
        let mut effect = AtRestDecay {
            name: self.name,
            mean_lifetime,
            product: self.product,
            applies_to: self.applies_to,
            seed: self.seed,
            rng: ChaCha8Rng::seed_from_u64(self.seed),
            decay_time: 0.0,
        };
        effect.resample();
        Ok(effect)
    }
}

impl AtRestAction for AtRestDecay {
    fn propose(&mut self, ctx: &ProposeContext<'_>) -> Result<AtRestProposal, EffectError> {
        if !self.applies(ctx.track()) {
            return Ok(AtRestProposal::never());
        }
        Ok(AtRestProposal::new(self.decay_time))
    }

    fn apply(&mut self, ctx: &mut ApplyContext<'_>) -> Result<(), EffectError> {
        let post = *ctx.step().post();
        if let Some((kind, ke)) = self.product {
            let dir = three::isotropic(self.rng.random(), self.rng.random());
            let product = Track::new(kind, ke, post.position, dir).with_global_time(post.global_time);
            ctx.delta().add_secondary(product);
        }
        ctx.delta().kill();
        Ok(())
    }
}

impl Effect for AtRestDecay {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::AT_REST
    }

    fn at_rest(&mut self) -> Option<&mut dyn AtRestAction> {
        Some(self)
    }

    fn start_tracking(&mut self, track: &Track) {
        self.rng = track_rng(self.seed, track);
        self.resample();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stepwise_core::{StateDelta, Step, TrackId, TrackStatus};
    use stepwise_test_utils::primary;

    fn stopped_muon(id: u64) -> Track {
        let mut t = primary(ParticleKind::MUON_MINUS, 0.0);
        t.assign_identity(TrackId(id), TrackId::NONE, None);
        t
    }

    fn muon_decay() -> AtRestDecay {
        AtRestDecay::builder()
            .mean_lifetime(2197.0)
            .product(ParticleKind::ELECTRON, 30.0)
            .applies_to(ParticleKind::MUON_MINUS)
            .seed(5)
            .build()
            .unwrap()
    }

    #[test]
    fn builder_validates() {
        assert!(AtRestDecay::builder().build().is_err());
        assert!(AtRestDecay::builder().mean_lifetime(-1.0).build().is_err());
        assert!(AtRestDecay::builder()
            .mean_lifetime(1.0)
            .product(ParticleKind::GAMMA, f64::INFINITY)
            .build()
            .is_err());
        assert!(AtRestDecay::builder().mean_lifetime(0.0).build().is_ok());
    }

    #[test]
    fn proposes_the_sampled_time() {
        let t = stopped_muon(4);
        let mut e = muon_decay();
        e.start_tracking(&t);
        let p = AtRestAction::propose(&mut e, &ProposeContext::new(&t, 0.0, 0.0)).unwrap();
        assert_eq!(p.time, e.decay_time());
        assert!(p.time.is_finite() && p.time >= 0.0);
    }

    #[test]
    fn other_species_never_decay() {
        let mut t = primary(ParticleKind::PROTON, 0.0);
        t.assign_identity(TrackId(1), TrackId::NONE, None);
        let mut e = muon_decay();
        e.start_tracking(&t);
        let p = AtRestAction::propose(&mut e, &ProposeContext::new(&t, 0.0, 0.0)).unwrap();
        assert_eq!(p.time, f64::INFINITY);
    }

    #[test]
    fn zero_lifetime_decays_immediately() {
        let t = stopped_muon(1);
        let mut e = AtRestDecay::builder().mean_lifetime(0.0).build().unwrap();
        e.start_tracking(&t);
        assert_eq!(e.decay_time(), 0.0);
    }

    #[test]
    fn apply_kills_and_emits_product() {
        let t = stopped_muon(2);
        let mut e = muon_decay();
        let mut step = Step::new();
        step.reset_from(&t, 0.0);
        let mut delta = StateDelta::default();
        AtRestAction::apply(&mut e, &mut ApplyContext::new(&t, &step, &mut delta)).unwrap();
        assert_eq!(delta.status, Some(TrackStatus::StopAndKill));
        assert_eq!(delta.secondaries.len(), 1);
        assert_eq!(delta.secondaries[0].kind(), ParticleKind::ELECTRON);
        assert_eq!(delta.secondaries[0].kinetic_energy, 30.0);
    }
}

//! Discrete interaction with exponentially distributed free paths.
//!
//! At the start of every track the effect samples the number of mean free
//! paths to the next interaction, `n = -ln(u)`. Each proposal reports
//! `n * mean_free_path`; steps limited by something else consume
//! `length / mean_free_path` of the budget. When the effect wins, the
//! configured [`Outcome`] is applied and a fresh `n` is sampled.
//!
//! The generator is reseeded from `seed XOR track id` in
//! [`start_tracking`](Effect::start_tracking), so a track's history does
//! not depend on which tracks were processed before it.
//!
//! Constructed via the builder pattern: [`ExponentialInteraction::builder`].

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use stepwise_core::{three, EffectError, ParticleKind, Track};
use stepwise_effect::{
    ApplyContext, Capabilities, Effect, PostStepAction, PostStepProposal, ProposeContext,
};

use crate::{open_uniform, track_rng};

/// What happens at the interaction point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Outcome {
    /// Deposit all remaining energy and kill the track.
    Absorb,
    /// Pick a new isotropic direction; energy is unchanged.
    Scatter,
    /// Emit one `product` carrying `fraction` of the kinetic energy in an
    /// isotropic direction; the track keeps the rest.
    Split {
        /// Species of the emitted secondary.
        product: ParticleKind,
        /// Share of the kinetic energy given to the secondary, in `(0, 1]`.
        fraction: f64,
    },
}

/// Exponential free-path discrete interaction.
#[derive(Clone, Debug)]
pub struct ExponentialInteraction {
    name: String,
    mean_free_path: f64,
    outcome: Outcome,
    applies_to: Option<i32>,
    seed: u64,
    rng: ChaCha8Rng,
    paths_left: f64,
    just_fired: bool,
}

/// Builder for [`ExponentialInteraction`].
///
/// Required field: `mean_free_path`.
#[derive(Clone, Debug)]
pub struct ExponentialInteractionBuilder {
    name: String,
    mean_free_path: Option<f64>,
    outcome: Outcome,
    applies_to: Option<i32>,
    seed: u64,
}

impl ExponentialInteraction {
    /// Create a new builder for configuring an `ExponentialInteraction`.
    pub fn builder() -> ExponentialInteractionBuilder {
        ExponentialInteractionBuilder {
            name: "interaction".to_string(),
            mean_free_path: None,
            outcome: Outcome::Absorb,
            applies_to: None,
            seed: 0,
        }
    }

    /// Mean free path in mm.
    pub fn mean_free_path(&self) -> f64 {
        self.mean_free_path
    }

    /// Mean free paths remaining before the next interaction.
    pub fn paths_left(&self) -> f64 {
        self.paths_left
    }

    fn applies(&self, track: &Track) -> bool {
        self.applies_to
            .is_none_or(|code| code == track.kind().pdg_code)
    }

    fn resample(&mut self) {
        self.paths_left = -open_uniform(&mut self.rng).ln();
    }
}

impl ExponentialInteractionBuilder {
    /// Effect name (default: `"interaction"`).
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Mean free path in mm. Must be finite and > 0.
    pub fn mean_free_path(mut self, mfp: f64) -> Self {
        self.mean_free_path = Some(mfp);
        self
    }

    /// Interaction outcome (default: [`Outcome::Absorb`]).
    pub fn outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = outcome;
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
    /// - `mean_free_path` is not set, not finite, or not positive
    /// - a `Split` fraction is outside `(0, 1]`
    pub fn build(self) -> Result<ExponentialInteraction, String> {
        let mean_free_path = self
            .mean_free_path
            .ok_or_else(|| "mean_free_path is required".to_string())?;
        if !mean_free_path.is_finite() || mean_free_path <= 0.0 {
            return Err(format!(
                "mean_free_path must be finite and > 0, got {mean_free_path}"
            ));
        }
        if let Outcome::Split { fraction, .. } = self.outcome {
            if !(fraction > 0.0 && fraction <= 1.0) {
                return Err(format!("split fraction must be in (0, 1], got {fraction}"));
            }
        }
        let mut effect = ExponentialInteraction {
            name: self.name,
            mean_free_path,
            outcome: self.outcome,
            applies_to: self.applies_to,
            seed: self.seed,
            rng: ChaCha8Rng::seed_from_u64(self.seed),
            paths_left: 0.0,
            just_fired: false,
        };
        effect.resample();
        Ok(effect)
    }
}

impl PostStepAction for ExponentialInteraction {
    fn propose(&mut self, ctx: &ProposeContext<'_>) -> Result<PostStepProposal, EffectError> {
        if !self.applies(ctx.track()) {
            return Ok(PostStepProposal::new(f64::INFINITY));
        }
        if self.just_fired {
            self.just_fired = false;
        } else {
            let travelled = ctx.previous_step_length() / self.mean_free_path;
            self.paths_left = (self.paths_left - travelled).max(0.0);
        }
        Ok(PostStepProposal::new(self.paths_left * self.mean_free_path))
    }

    fn apply(&mut self, ctx: &mut ApplyContext<'_>) -> Result<(), EffectError> {
        let post = *ctx.step().post();
        let ke = post.kinetic_energy;
        match self.outcome {
            Outcome::Absorb => {
                ctx.delta().deposit(ke);
                ctx.delta().set_kinetic_energy(0.0);
                ctx.delta().kill();
            }
            Outcome::Scatter => {
                let dir = three::isotropic(self.rng.random(), self.rng.random());
                ctx.delta().set_direction(dir);
            }
            Outcome::Split { product, fraction } => {
                let dir = three::isotropic(self.rng.random(), self.rng.random());
                let given = fraction * ke;
                let secondary = Track::new(product, given, post.position, dir)
                    .with_global_time(post.global_time);
                ctx.delta().add_secondary(secondary);
                ctx.delta().set_kinetic_energy(ke - given);
            }
        }
        self.resample();
        self.just_fired = true;
        Ok(())
    }
}

impl Effect for ExponentialInteraction {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::POST_STEP
    }

    fn post_step(&mut self) -> Option<&mut dyn PostStepAction> {
        Some(self)
    }

    fn start_tracking(&mut self, track: &Track) {
        self.rng = track_rng(self.seed, track);
        self.just_fired = false;
        self.resample();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stepwise_core::{StateDelta, Step, TrackId, TrackStatus};
    use stepwise_test_utils::{electron, gamma};

    fn numbered(mut t: Track, id: u64) -> Track {
        t.assign_identity(TrackId(id), TrackId::NONE, None);
        t
    }

    fn absorber(seed: u64) -> ExponentialInteraction {
        ExponentialInteraction::builder()
            .mean_free_path(10.0)
            .seed(seed)
            .build()
            .unwrap()
    }

    fn propose(e: &mut ExponentialInteraction, t: &Track, prev: f64) -> f64 {
        PostStepAction::propose(e, &ProposeContext::new(t, prev, 0.0))
            .unwrap()
            .length
    }

    fn apply(e: &mut ExponentialInteraction, t: &Track) -> StateDelta {
        let mut step = Step::new();
        step.reset_from(t, 0.0);
        let mut delta = StateDelta::default();
        PostStepAction::apply(e, &mut ApplyContext::new(t, &step, &mut delta)).unwrap();
        delta
    }

    #[test]
    fn builder_validates() {
        assert!(ExponentialInteraction::builder().build().is_err());
        assert!(ExponentialInteraction::builder()
            .mean_free_path(0.0)
            .build()
            .is_err());
        assert!(ExponentialInteraction::builder()
            .mean_free_path(1.0)
            .outcome(Outcome::Split {
                product: ParticleKind::GAMMA,
                fraction: 1.5,
            })
            .build()
            .is_err());
    }

    #[test]
    fn same_seed_and_track_give_same_path() {
        let t = numbered(electron(1.0), 7);
        let mut a = absorber(42);
        let mut b = absorber(42);
        a.start_tracking(&t);
        b.start_tracking(&t);
        assert_eq!(propose(&mut a, &t, 0.0), propose(&mut b, &t, 0.0));
    }

    #[test]
    fn different_tracks_get_different_paths() {
        let mut e = absorber(42);
        e.start_tracking(&numbered(electron(1.0), 1));
        let first = e.paths_left();
        e.start_tracking(&numbered(electron(1.0), 2));
        assert_ne!(first, e.paths_left());
    }

    #[test]
    fn losing_steps_consume_the_budget() {
        let t = numbered(electron(1.0), 3);
        let mut e = absorber(1);
        e.start_tracking(&t);
        let full = propose(&mut e, &t, 0.0);
        let travelled = full / 4.0;
        let rest = propose(&mut e, &t, travelled);
        assert!((rest - (full - travelled)).abs() < 1e-9);
    }

    #[test]
    fn firing_resamples_without_consuming() {
        let t = numbered(electron(1.0), 3);
        let mut e = absorber(1);
        e.start_tracking(&t);
        let full = propose(&mut e, &t, 0.0);
        apply(&mut e, &t);
        let fresh = e.paths_left() * e.mean_free_path();
        assert_eq!(propose(&mut e, &t, full), fresh);
    }

    #[test]
    fn absorb_kills_and_deposits() {
        let t = numbered(electron(3.0), 1);
        let mut e = absorber(0);
        let delta = apply(&mut e, &t);
        assert_eq!(delta.status, Some(TrackStatus::StopAndKill));
        assert_eq!(delta.energy_deposit, 3.0);
        assert_eq!(delta.kinetic_energy, Some(0.0));
    }

    #[test]
    fn scatter_keeps_energy() {
        let t = numbered(electron(3.0), 1);
        let mut e = ExponentialInteraction::builder()
            .mean_free_path(1.0)
            .outcome(Outcome::Scatter)
            .build()
            .unwrap();
        let delta = apply(&mut e, &t);
        assert!(delta.kinetic_energy.is_none());
        let dir = delta.direction.unwrap();
        assert!((three::norm(dir) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn split_shares_energy() {
        let t = numbered(electron(4.0), 1);
        let mut e = ExponentialInteraction::builder()
            .mean_free_path(1.0)
            .outcome(Outcome::Split {
                product: ParticleKind::GAMMA,
                fraction: 0.25,
            })
            .build()
            .unwrap();
        let delta = apply(&mut e, &t);
        assert_eq!(delta.kinetic_energy, Some(3.0));
        assert_eq!(delta.secondaries.len(), 1);
        assert_eq!(delta.secondaries[0].kinetic_energy, 1.0);
        assert_eq!(delta.secondaries[0].kind(), ParticleKind::GAMMA);
    }

    #[test]
    fn other_species_are_unlimited() {
        let mut e = ExponentialInteraction::builder()
            .mean_free_path(1.0)
            .applies_to(ParticleKind::GAMMA)
            .build()
            .unwrap();
        assert_eq!(propose(&mut e, &electron(1.0), 0.0), f64::INFINITY);
        assert!(propose(&mut e, &gamma(1.0), 0.0).is_finite());
    }

    #[test]
    fn mean_path_matches_configuration() {
        let mut e = absorber(9);
        let n = 20_000;
        let total: f64 = (0..n)
            .map(|i| {
                e.start_tracking(&numbered(electron(1.0), i));
                e.paths_left() * e.mean_free_path()
            })
            .sum();
        let mean = total / n as f64;
        assert!((mean - 10.0).abs() < 0.5, "mean free path {mean}");
    }
}

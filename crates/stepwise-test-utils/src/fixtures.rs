//! Reusable effect fixtures.
//!
//! Four fixture effects with fixed proposals for arbitration and engine
//! testing:
//!
//! - [`FixedAlongStep`]: continuous, constant length limit.
//! - [`FixedPostStep`]: discrete, constant length or forced.
//! - [`FixedAtRest`]: at rest, constant time.
//! - [`FailingEffect`]: fails deterministically in `propose` or `apply`.
//!
//! Each can optionally lose energy, kill the track (with or without its
//! secondaries), emit secondaries and write to an [`ApplyLog`].

use stepwise_core::{EffectError, ParticleKind, Track, TrackStatus};
use stepwise_effect::{
    AlongStepAction, AlongStepProposal, ApplyContext, AtRestAction, AtRestProposal, Capabilities,
    Effect, Forcing, PostStepAction, PostStepProposal, ProposeContext, Selection,
};

use crate::ApplyLog;

/// What an apply call does besides logging.
#[derive(Clone, Debug, Default)]
struct Behaviour {
    loss: f64,
    kill: bool,
    wipe: bool,
    secondaries: Option<(usize, ParticleKind, f64)>,
    log: Option<ApplyLog>,
}

impl Behaviour {
    fn run(&self, name: &str, category: &str, ctx: &mut ApplyContext<'_>) {
        let post = *ctx.step().post();
        if self.loss > 0.0 {
            let ke = post.kinetic_energy;
            ctx.delta().set_kinetic_energy(ke - self.loss);
            ctx.delta().deposit(self.loss.min(ke));
        }
        if self.kill {
            ctx.delta().kill();
        }
        if self.wipe {
            ctx.delta().kill();
            ctx.delta().status = Some(TrackStatus::KillTrackAndSecondaries);
        }
        if let Some((count, kind, ke)) = self.secondaries {
            for _ in 0..count {
                let secondary = Track::new(kind, ke, post.position, post.direction)
                    .with_global_time(post.global_time);
                ctx.delta().add_secondary(secondary);
            }
        }
        if let Some(log) = &self.log {
            log.push(format!("{name}:{category}"));
        }
    }
}

macro_rules! behaviour_builders {
    ($ty:ty) => {
        impl $ty {
            /// Lower the kinetic energy by `loss` each apply, depositing it.
            pub fn with_loss(mut self, loss: f64) -> Self {
                self.behaviour.loss = loss;
                self
            }

            /// Stop and kill the track on apply.
            pub fn killing(mut self) -> Self {
                self.behaviour.kill = true;
                self
            }

            /// Kill the track and its secondaries on apply.
            pub fn wiping(mut self) -> Self {
                self.behaviour.wipe = true;
                self
            }

            /// Emit `count` secondaries of `kind` on apply.
            pub fn with_secondaries(mut self, count: usize, kind: ParticleKind, ke: f64) -> Self {
                self.behaviour.secondaries = Some((count, kind, ke));
                self
            }

            /// Log apply calls.
            pub fn with_log(mut self, log: &ApplyLog) -> Self {
                self.behaviour.log = Some(log.clone());
                self
            }
        }
    };
}

// ── FixedAlongStep ─────────────────────────────────────────────────

/// Continuous effect proposing a constant length.
#[derive(Clone, Debug)]
pub struct FixedAlongStep {
    pub name: String,
    pub length: f64,
    pub selection: Selection,
    behaviour: Behaviour,
}

impl FixedAlongStep {
    pub fn new(name: impl Into<String>, length: f64) -> Self {
        Self {
            name: name.into(),
            length,
            selection: Selection::Candidate,
            behaviour: Behaviour::default(),
        }
    }

    /// Limits the step but is never credited.
    pub fn not_candidate(name: impl Into<String>, length: f64) -> Self {
        Self {
            selection: Selection::NotCandidate,
            ..Self::new(name, length)
        }
    }
}

behaviour_builders!(FixedAlongStep);

impl AlongStepAction for FixedAlongStep {
    fn propose(&mut self, _ctx: &ProposeContext<'_>) -> Result<AlongStepProposal, EffectError> {
        Ok(AlongStepProposal {
            length: self.length,
            selection: self.selection,
        })
    }

    fn apply(&mut self, ctx: &mut ApplyContext<'_>) -> Result<(), EffectError> {
        self.behaviour.run(&self.name, "along", ctx);
        Ok(())
    }
}

impl Effect for FixedAlongStep {
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

// ── FixedPostStep ──────────────────────────────────────────────────

/// Discrete effect proposing a constant length.
#[derive(Clone, Debug)]
pub struct FixedPostStep {
    pub name: String,
    pub length: f64,
    pub forcing: Forcing,
    behaviour: Behaviour,
}

impl FixedPostStep {
    pub fn new(name: impl Into<String>, length: f64) -> Self {
        Self {
            name: name.into(),
            length,
            forcing: Forcing::NotForced,
            behaviour: Behaviour::default(),
        }
    }

    /// Unlimited, applied every step while alive.
    pub fn forced(name: impl Into<String>) -> Self {
        Self {
            forcing: Forcing::Forced,
            ..Self::new(name, f64::INFINITY)
        }
    }

    /// Unlimited, applied every step.
    pub fn strongly_forced(name: impl Into<String>) -> Self {
        Self {
            forcing: Forcing::StronglyForced,
            ..Self::new(name, f64::INFINITY)
        }
    }
}

behaviour_builders!(FixedPostStep);

impl PostStepAction for FixedPostStep {
    fn propose(&mut self, _ctx: &ProposeContext<'_>) -> Result<PostStepProposal, EffectError> {
        Ok(PostStepProposal {
            length: self.length,
            forcing: self.forcing,
        })
    }

    fn apply(&mut self, ctx: &mut ApplyContext<'_>) -> Result<(), EffectError> {
        self.behaviour.run(&self.name, "post", ctx);
        Ok(())
    }
}

impl Effect for FixedPostStep {
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

// ── FixedAtRest ────────────────────────────────────────────────────

/// At-rest effect proposing a constant time. Kills the track on apply
/// unless built with [`without_kill`](Self::without_kill).
#[derive(Clone, Debug)]
pub struct FixedAtRest {
    pub name: String,
    pub time: f64,
    pub forcing: Forcing,
    behaviour: Behaviour,
}

impl FixedAtRest {
    pub fn new(name: impl Into<String>, time: f64) -> Self {
        Self {
            name: name.into(),
            time,
            forcing: Forcing::NotForced,
            behaviour: Behaviour {
                kill: true,
                ..Behaviour::default()
            },
        }
    }

    /// Applied even when another at-rest effect wins.
    pub fn forced(mut self) -> Self {
        self.forcing = Forcing::Forced;
        self
    }

    /// Leave the status alone on apply.
    pub fn without_kill(mut self) -> Self {
        self.behaviour.kill = false;
        self
    }
}

behaviour_builders!(FixedAtRest);

impl AtRestAction for FixedAtRest {
    fn propose(&mut self, _ctx: &ProposeContext<'_>) -> Result<AtRestProposal, EffectError> {
        Ok(AtRestProposal {
            time: self.time,
            forcing: self.forcing,
        })
    }

    fn apply(&mut self, ctx: &mut ApplyContext<'_>) -> Result<(), EffectError> {
        self.behaviour.run(&self.name, "at_rest", ctx);
        Ok(())
    }
}

impl Effect for FixedAtRest {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::AT_REST
    }

    fn at_rest(&mut self) -> Option<&mut dyn AtRestAction> {
        Some(self)
    }
}

// ── FailingEffect ──────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FailOn {
    Propose,
    Apply,
    ForcedApply,
}

/// Post-step effect that fails after a configurable number of successful
/// calls to the failing method.
#[derive(Clone, Debug)]
pub struct FailingEffect {
    pub name: String,
    fail_on: FailOn,
    succeed_first: usize,
    calls: usize,
}

impl FailingEffect {
    fn with_mode(name: impl Into<String>, fail_on: FailOn) -> Self {
        Self {
            name: name.into(),
            fail_on,
            succeed_first: 0,
            calls: 0,
        }
    }

    /// `propose` fails.
    pub fn on_propose(name: impl Into<String>) -> Self {
        Self::with_mode(name, FailOn::Propose)
    }

    /// Proposes 1 mm; `apply` fails when it wins.
    pub fn on_apply(name: impl Into<String>) -> Self {
        Self::with_mode(name, FailOn::Apply)
    }

    /// Forced every step; `apply` fails.
    pub fn forced_on_apply(name: impl Into<String>) -> Self {
        Self::with_mode(name, FailOn::ForcedApply)
    }

    /// Succeed `n` times before failing.
    pub fn after(mut self, n: usize) -> Self {
        self.succeed_first = n;
        self
    }

    fn tick(&mut self) -> Result<(), EffectError> {
        self.calls += 1;
        if self.calls > self.succeed_first {
            return Err(EffectError::ExecutionFailed {
                reason: format!("{} failed on call {}", self.name, self.calls),
            });
        }
        Ok(())
    }
}

impl PostStepAction for FailingEffect {
    fn propose(&mut self, _ctx: &ProposeContext<'_>) -> Result<PostStepProposal, EffectError> {
        match self.fail_on {
            FailOn::Propose => {
                self.tick()?;
                Ok(PostStepProposal::new(1.0))
            }
            FailOn::Apply => Ok(PostStepProposal::new(1.0)),
            FailOn::ForcedApply => Ok(PostStepProposal::forced()),
        }
    }

    fn apply(&mut self, _ctx: &mut ApplyContext<'_>) -> Result<(), EffectError> {
        match self.fail_on {
            FailOn::Propose => Ok(()),
            FailOn::Apply | FailOn::ForcedApply => self.tick(),
        }
    }
}

impl Effect for FailingEffect {
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

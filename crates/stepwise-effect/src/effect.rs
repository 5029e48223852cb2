//! The [`Effect`] trait, its three capability traits, and proposal types.

use crate::context::{ApplyContext, ProposeContext};
use stepwise_core::{ActionCategory, EffectError, Track};

// ── Proposals ──────────────────────────────────────────────────────

/// How a post-step or at-rest effect is applied relative to arbitration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Forcing {
    /// Applied only when this effect wins arbitration.
    #[default]
    NotForced,
    /// Applied every step while the track is still alive, after the winner.
    Forced,
    /// Applied every step, even when the track was killed earlier in the step.
    StronglyForced,
}

/// Whether a continuous proposal may be credited as the step limiter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Selection {
    /// May be recorded as the limiting effect.
    #[default]
    Candidate,
    /// Limits the length but is never credited (e.g. multiple scattering).
    NotCandidate,
}

/// At-rest proposal: time until the effect fires.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AtRestProposal {
    /// Proposed time in ns. `INFINITY` means "never".
    pub time: f64,
    /// Application policy.
    pub forcing: Forcing,
}

impl AtRestProposal {
    /// Unforced proposal.
    pub fn new(time: f64) -> Self {
        Self {
            time,
            forcing: Forcing::NotForced,
        }
    }

    /// Never fires on its own.
    pub fn never() -> Self {
        Self::new(f64::INFINITY)
    }
}

/// Along-step proposal: length until the continuous effect limits the step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AlongStepProposal {
    /// Proposed length in mm. `INFINITY` means "no limit".
    pub length: f64,
    /// Whether this proposal can be credited.
    pub selection: Selection,
}

impl AlongStepProposal {
    /// A creditable limit.
    pub fn candidate(length: f64) -> Self {
        Self {
            length,
            selection: Selection::Candidate,
        }
    }

    /// A limit that is honoured but never credited.
    pub fn not_candidate(length: f64) -> Self {
        Self {
            length,
            selection: Selection::NotCandidate,
        }
    }

    /// No limit.
    pub fn unlimited() -> Self {
        Self::candidate(f64::INFINITY)
    }
}

/// Post-step proposal: length until the discrete effect occurs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PostStepProposal {
    /// Proposed length in mm. `INFINITY` means "no limit".
    pub length: f64,
    /// Application policy.
    pub forcing: Forcing,
}

impl PostStepProposal {
    /// Unforced proposal.
    pub fn new(length: f64) -> Self {
        Self {
            length,
            forcing: Forcing::NotForced,
        }
    }

    /// Unlimited, but applied after every step while the track is alive.
    pub fn forced() -> Self {
        Self {
            length: f64::INFINITY,
            forcing: Forcing::Forced,
        }
    }

    /// Unlimited, but applied after every step unconditionally.
    pub fn strongly_forced() -> Self {
        Self {
            length: f64::INFINITY,
            forcing: Forcing::StronglyForced,
        }
    }
}

// ── Capability traits ──────────────────────────────────────────────

/// Capability: act on a track at rest.
pub trait AtRestAction {
    /// Propose the time until this effect fires.
    fn propose(&mut self, ctx: &ProposeContext<'_>) -> Result<AtRestProposal, EffectError>;

    /// Write the at-rest state change into `ctx.delta()`.
    fn apply(&mut self, ctx: &mut ApplyContext<'_>) -> Result<(), EffectError>;
}

/// Capability: act continuously along every step.
pub trait AlongStepAction {
    /// Propose a step-length limit.
    ///
    /// `ctx.previous_step_length()` and `ctx.safety()` are provided for
    /// effects whose limit depends on local transport conditions.
    fn propose(&mut self, ctx: &ProposeContext<'_>) -> Result<AlongStepProposal, EffectError>;

    /// Write the continuous state change over `ctx.step().length()`.
    fn apply(&mut self, ctx: &mut ApplyContext<'_>) -> Result<(), EffectError>;
}

/// Capability: act at a discrete point at the end of a step.
pub trait PostStepAction {
    /// Propose the length until the interaction occurs.
    fn propose(&mut self, ctx: &ProposeContext<'_>) -> Result<PostStepProposal, EffectError>;

    /// Write the interaction's state change into `ctx.delta()`.
    fn apply(&mut self, ctx: &mut ApplyContext<'_>) -> Result<(), EffectError>;
}

// ── Effect ─────────────────────────────────────────────────────────

/// Declared capability set of an effect.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Capabilities {
    /// Implements [`AtRestAction`].
    pub at_rest: bool,
    /// Implements [`AlongStepAction`].
    pub along_step: bool,
    /// Implements [`PostStepAction`].
    pub post_step: bool,
}

impl Capabilities {
    /// No capabilities.
    pub const NONE: Capabilities = Capabilities {
        at_rest: false,
        along_step: false,
        post_step: false,
    };
    /// At-rest only.
    pub const AT_REST: Capabilities = Capabilities {
        at_rest: true,
        along_step: false,
        post_step: false,
    };
    /// Along-step only.
    pub const ALONG_STEP: Capabilities = Capabilities {
        at_rest: false,
        along_step: true,
        post_step: false,
    };
    /// Post-step only.
    pub const POST_STEP: Capabilities = Capabilities {
        at_rest: false,
        along_step: false,
        post_step: true,
    };

    /// Combine two sets.
    pub const fn union(self, other: Capabilities) -> Capabilities {
        Capabilities {
            at_rest: self.at_rest || other.at_rest,
            along_step: self.along_step || other.along_step,
            post_step: self.post_step || other.post_step,
        }
    }

    /// Whether no capability is set.
    pub fn is_empty(self) -> bool {
        !(self.at_rest || self.along_step || self.post_step)
    }

    /// Whether the given category is set.
    pub fn contains(self, category: ActionCategory) -> bool {
        match category {
            ActionCategory::AtRest => self.at_rest,
            ActionCategory::AlongStep => self.along_step,
            ActionCategory::PostStep => self.post_step,
        }
    }
}

/// A pluggable physical process.
///
/// # Contract
///
/// - `name()` is unique within an engine and never `"transportation"`.
/// - `capabilities()` is called once at registration and must agree with
///   which of `at_rest()`, `along_step()` and `post_step()` return `Some`.
/// - `propose` and `apply` must be deterministic given the track state
///   and the effect's own state; randomness must come from a seeded
///   generator owned by the effect.
/// - Per-track state is reset in `start_tracking`.
///
/// # Object safety
///
/// The engine stores effects as `Vec<Box<dyn Effect>>`.
///
/// # Examples
///
/// A continuous step limiter:
///
/// ```
/// use stepwise_core::EffectError;
/// use stepwise_effect::{
///     AlongStepAction, AlongStepProposal, ApplyContext, Capabilities, Effect, ProposeContext,
/// };
///
/// struct MaxStep(f64);
///
/// impl AlongStepAction for MaxStep {
///     fn propose(&mut self, _ctx: &ProposeContext<'_>) -> Result<AlongStepProposal, EffectError> {
///         Ok(AlongStepProposal::candidate(self.0))
///     }
///     fn apply(&mut self, _ctx: &mut ApplyContext<'_>) -> Result<(), EffectError> {
///         Ok(())
///     }
/// }
///
/// impl Effect for MaxStep {
///     fn name(&self) -> &str { "max_step" }
///     fn capabilities(&self) -> Capabilities { Capabilities::ALONG_STEP }
///     fn along_step(&mut self) -> Option<&mut dyn AlongStepAction> { Some(self) }
/// }
///
/// let mut e = MaxStep(2.0);
/// assert!(e.along_step().is_some());
/// assert!(e.post_step().is_none());
/// ```
pub trait Effect: Send + 'static {
    /// Unique human-readable name, used in diagnostics and metrics.
    fn name(&self) -> &str;

    /// Which capabilities this effect implements.
    fn capabilities(&self) -> Capabilities;

    /// At-rest capability view.
    fn at_rest(&mut self) -> Option<&mut dyn AtRestAction> {
        None
    }

    /// Along-step capability view.
    fn along_step(&mut self) -> Option<&mut dyn AlongStepAction> {
        None
    }

    /// Post-step capability view.
    fn post_step(&mut self) -> Option<&mut dyn PostStepAction> {
        None
    }

    /// Called before the first step of every track.
    fn start_tracking(&mut self, _track: &Track) {}

    /// Called after the last step of every track.
    fn end_tracking(&mut self) {}
}

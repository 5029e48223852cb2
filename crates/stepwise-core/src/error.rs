//! Error types for the Stepwise engine.
//!
//! Organised by who raises them: effects report [`EffectError`],
//! navigators report [`NavigationError`], and the stepping engine wraps
//! both into the fatal [`StepError`] with enough context (effect name,
//! track, step) to diagnose the failure.

use std::error::Error;
use std::fmt;

use crate::id::TrackId;
use crate::step::ActionCategory;
use crate::track::TrackStatus;

/// Errors returned by an effect's `propose` or `apply` call.
///
/// Wrapped in [`StepError::ProposalFailed`] or [`StepError::ApplyFailed`]
/// by the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EffectError {
    /// The effect could not compute its proposal or state update.
    ExecutionFailed {
        /// Human-readable description of the failure.
        reason: String,
    },
    /// The effect was asked for a capability it does not implement.
    Unsupported,
}

impl fmt::Display for EffectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExecutionFailed { reason } => write!(f, "execution failed: {reason}"),
            Self::Unsupported => write!(f, "capability not supported"),
        }
    }
}

impl Error for EffectError {}

/// Error reported by a [`Navigator`](crate::Navigator).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavigationError {
    /// Human-readable description of the failure.
    pub reason: String,
}

impl NavigationError {
    /// Build an error from any displayable reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for NavigationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "navigation failed: {}", self.reason)
    }
}

impl Error for NavigationError {}

/// Fatal errors from arbitrating or applying one step.
///
/// None of these are retried. The track being processed is abandoned and
/// no partial step is committed; recovery policy belongs to the caller.
#[derive(Clone, Debug, PartialEq)]
pub enum StepError {
    /// An effect's proposal call failed.
    ProposalFailed {
        /// Name of the failing effect.
        effect: String,
        /// Which capability was being queried.
        category: ActionCategory,
        /// Track being stepped.
        track_id: TrackId,
        /// Step number (1-based) in which the failure occurred.
        step_number: u64,
        /// The underlying effect error.
        reason: EffectError,
    },
    /// An effect's apply call failed.
    ApplyFailed {
        /// Name of the failing effect.
        effect: String,
        /// Which capability was being applied.
        category: ActionCategory,
        /// Track being stepped.
        track_id: TrackId,
        /// Step number (1-based) in which the failure occurred.
        step_number: u64,
        /// The underlying effect error.
        reason: EffectError,
    },
    /// An effect proposed a NaN or negative length or time.
    InvalidProposal {
        /// Name of the offending effect.
        effect: String,
        /// Which capability produced the value.
        category: ActionCategory,
        /// Track being stepped.
        track_id: TrackId,
        /// Step number (1-based).
        step_number: u64,
        /// The rejected value.
        value: f64,
    },
    /// The navigator failed or returned an unusable distance.
    Navigation {
        /// Track being stepped.
        track_id: TrackId,
        /// Step number (1-based).
        step_number: u64,
        /// The underlying navigator error.
        reason: NavigationError,
    },
    /// A status change would move a track backwards (e.g. resurrect a
    /// killed track).
    StatusRegression {
        /// Track whose status was being changed.
        track_id: TrackId,
        /// Current status.
        from: TrackStatus,
        /// Rejected target status.
        to: TrackStatus,
    },
    /// A track is at rest but no at-rest effect is registered.
    NoAtRestEffect {
        /// Track at rest.
        track_id: TrackId,
    },
    /// `process_one_track` was handed a track that is not alive.
    TrackNotAlive {
        /// The offending track.
        track_id: TrackId,
        /// Its status.
        status: TrackStatus,
    },
    /// The configured per-track step cap was reached.
    StepLimitExceeded {
        /// Track that did not terminate.
        track_id: TrackId,
        /// The configured cap.
        limit: u64,
    },
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProposalFailed {
                effect,
                category,
                track_id,
                step_number,
                reason,
            } => write!(
                f,
                "effect '{effect}' failed to propose ({category}) for track {track_id} \
                 at step {step_number}: {reason}"
            ),
            Self::ApplyFailed {
                effect,
                category,
                track_id,
                step_number,
                reason,
            } => write!(
                f,
                "effect '{effect}' failed to apply ({category}) for track {track_id} \
                 at step {step_number}: {reason}"
            ),
            Self::InvalidProposal {
                effect,
                category,
                track_id,
                step_number,
                value,
            } => write!(
                f,
                "effect '{effect}' proposed invalid value {value} ({category}) for track \
                 {track_id} at step {step_number}"
            ),
            Self::Navigation {
                track_id,
                step_number,
                reason,
            } => write!(f, "track {track_id} at step {step_number}: {reason}"),
            Self::StatusRegression { track_id, from, to } => write!(
                f,
                "track {track_id}: status cannot move from {from:?} to {to:?}"
            ),
            Self::NoAtRestEffect { track_id } => {
                write!(f, "track {track_id} is at rest but no at-rest effect is registered")
            }
            Self::TrackNotAlive { track_id, status } => {
                write!(f, "track {track_id} is not alive ({status:?})")
            }
            Self::StepLimitExceeded { track_id, limit } => {
                write!(f, "track {track_id} exceeded the step limit of {limit}")
            }
        }
    }
}

impl Error for StepError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ProposalFailed { reason, .. } | Self::ApplyFailed { reason, .. } => Some(reason),
            Self::Navigation { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

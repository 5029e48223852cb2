//! Reference effects for the Stepwise transport scheduler.
//!
//! Small, self-contained physics that exercise every capability category
//! of the engine:
//!
//! 1. [`ContinuousLoss`]: along-step, constant stopping power with a
//!    range-based step limit.
//! 2. [`StepLimiter`]: post-step, caps the step length.
//! 3. [`ExponentialInteraction`]: post-step, exponentially distributed
//!    free paths with absorb, scatter or split outcomes.
//! 4. [`AtRestDecay`]: at-rest, exponential lifetime emitting one product.
//!
//! [`SlabNavigator`] is a layered geometry for driving them end to end.
//!
//! Random effects own a ChaCha8 generator reseeded per track from
//! `seed XOR track id`, so results do not depend on track scheduling.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod continuous_loss;
pub mod decay;
pub mod interaction;
pub mod limiter;
pub mod slab;

pub use continuous_loss::{ContinuousLoss, ContinuousLossBuilder};
pub use decay::{AtRestDecay, AtRestDecayBuilder};
pub use interaction::{ExponentialInteraction, ExponentialInteractionBuilder, Outcome};
pub use limiter::StepLimiter;
pub use slab::SlabNavigator;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use stepwise_core::Track;

/// Per-track generator seeded from `seed XOR track id`.
pub(crate) fn track_rng(seed: u64, track: &Track) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed ^ track.id().0)
}

/// Uniform deviate in `(0, 1]`, safe to take the logarithm of.
pub(crate) fn open_uniform(rng: &mut ChaCha8Rng) -> f64 {
    1.0 - rng.random::<f64>()
}

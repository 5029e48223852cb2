//! Stepwise: a discrete-step particle transport scheduler.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! Stepwise sub-crates. For most users, adding `stepwise` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use stepwise::prelude::*;
//! use stepwise::effects::{ContinuousLoss, SlabNavigator};
//!
//! // 1 MeV/mm continuous loss in two 10 mm slabs.
//! let eloss = ContinuousLoss::builder().stopping_power(1.0).build().unwrap();
//! let slabs = SlabNavigator::uniform(2, 10.0, 50.0).unwrap();
//! let config = EngineConfig::new(vec![Box::new(eloss)], Box::new(slabs));
//! let mut driver = TrackDriver::new(config).unwrap();
//!
//! // A 5 MeV electron ranges out halfway through the first slab.
//! let electron = Track::new(ParticleKind::ELECTRON, 5.0, [0.0; 3], [0.0, 0.0, 1.0]);
//! let outcome = driver.process_one_track(electron).unwrap();
//! assert_eq!(outcome.status(), TrackStatus::StopAndKill);
//! assert!((outcome.metrics.energy_deposit - 5.0).abs() < 1e-9);
//! assert_eq!(outcome.trajectory.unwrap().point_count(), outcome.steps as usize + 1);
//! ```
//!
//! # Writing an effect
//!
//! ```rust
//! use stepwise::prelude::*;
//!
//! /// Kills every track it catches after a fixed distance.
//! struct Absorber(f64);
//!
//! impl PostStepAction for Absorber {
//!     fn propose(&mut self, _ctx: &ProposeContext<'_>) -> Result<PostStepProposal, EffectError> {
//!         Ok(PostStepProposal::new(self.0))
//!     }
//!     fn apply(&mut self, ctx: &mut ApplyContext<'_>) -> Result<(), EffectError> {
//!         let ke = ctx.step().post().kinetic_energy;
//!         ctx.delta().deposit(ke);
//!         ctx.delta().kill();
//!         Ok(())
//!     }
//! }
//!
//! impl Effect for Absorber {
//!     fn name(&self) -> &str { "absorber" }
//!     fn capabilities(&self) -> Capabilities { Capabilities::POST_STEP }
//!     fn post_step(&mut self) -> Option<&mut dyn PostStepAction> { Some(self) }
//! }
//!
//! let slabs = stepwise::effects::SlabNavigator::uniform(1, 100.0, 50.0).unwrap();
//! let config = EngineConfig::new(vec![Box::new(Absorber(7.0))], Box::new(slabs));
//! let mut driver = TrackDriver::new(config).unwrap();
//! let photon = Track::new(ParticleKind::GAMMA, 2.0, [0.0; 3], [0.0, 0.0, 1.0]);
//! let outcome = driver.process_one_track(photon).unwrap();
//! assert_eq!(outcome.steps, 1);
//! assert!((outcome.track.position[2] - 7.0).abs() < 1e-12);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `stepwise-core` | Tracks, steps, state deltas, IDs, errors, the navigator trait |
//! | [`arena`] | `stepwise-arena` | Chunk pool backing trajectory storage |
//! | [`effect`] | `stepwise-effect` | Effect capability traits and registry validation |
//! | [`effects`] | `stepwise-effects` | Reference effects and the slab navigator |
//! | [`engine`] | `stepwise-engine` | Arbitration, application, drivers, events and workers |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Chunk pool and chunked storage (`stepwise-arena`).
///
/// Most users only touch [`arena::PoolConfig`] through
/// [`engine::EngineConfig::pool`].
pub use stepwise_arena as arena;

/// Core types, traits, and IDs (`stepwise-core`).
///
/// Contains [`types::Track`], [`types::Step`], [`types::StateDelta`], the
/// error types, and the [`types::Navigator`] trait.
pub use stepwise_core as types;

/// Effect capability traits and registry validation (`stepwise-effect`).
///
/// The [`effect::Effect`] trait is the main extension point for
/// user-defined physics.
pub use stepwise_effect as effect;

/// Reference effect implementations (`stepwise-effects`).
///
/// Includes [`effects::ContinuousLoss`], [`effects::ExponentialInteraction`],
/// [`effects::AtRestDecay`], [`effects::StepLimiter`] and
/// [`effects::SlabNavigator`].
pub use stepwise_effects as effects;

/// Transport engine (`stepwise-engine`).
///
/// [`engine::TrackDriver`] transports one track at a time,
/// [`engine::EventProcessor`] runs whole events, and
/// [`engine::spawn_workers`] spreads events over threads.
pub use stepwise_engine as engine;

/// Common imports for typical Stepwise usage.
///
/// ```rust
/// use stepwise::prelude::*;
/// ```
///
/// This imports the most frequently used types: tracks and steps, the
/// effect traits and proposals, the navigator trait, and the engine
/// entry points.
pub mod prelude {
    // Core types and traits
    pub use stepwise_core::{
        EventId, GeomStep, Navigator, ParticleKind, StateDelta, Step, StepPoint, StepStatus,
        ThreeVector, Track, TrackId, TrackStatus, VolumeId,
    };

    // Errors
    pub use stepwise_core::{EffectError, NavigationError, StepError};

    // Effects
    pub use stepwise_effect::{
        AlongStepAction, AlongStepProposal, ApplyContext, AtRestAction, AtRestProposal,
        Capabilities, Effect, Forcing, PostStepAction, PostStepProposal, ProposeContext,
        Selection,
    };

    // Engine
    pub use stepwise_engine::{
        spawn_workers, AbortHandle, ConfigError, EngineConfig, EventProcessor, EventRecord,
        MasterCollector, RecordingMode, TrackControl, TrackDriver, TrackObserver, TrackOutcome,
        TrackStart, Trajectory, WorkerPool,
    };
}

//! Core types and traits for the Stepwise particle-transport engine.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the data model shared by every other crate in the workspace: typed
//! identifiers, particle kinds, the mutable [`Track`], the per-step
//! [`Step`] record, the [`StateDelta`] produced by effects, the
//! [`Navigator`] geometry contract, and the error taxonomy.
//!
//! Units throughout are millimetres, nanoseconds and MeV.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod delta;
pub mod error;
pub mod id;
pub mod particle;
pub mod step;
pub mod three;
pub mod track;
pub mod traits;

pub use delta::StateDelta;
pub use error::{EffectError, NavigationError, StepError};
pub use id::{EffectId, EventId, TrackId, VolumeId};
pub use particle::{ParticleKind, SPEED_OF_LIGHT};
pub use step::{ActionCategory, Step, StepPoint, StepStatus};
pub use three::ThreeVector;
pub use track::{Track, TrackStatus, UserData};
pub use traits::{GeomStep, Navigator};

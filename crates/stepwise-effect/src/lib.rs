//! Effect capability traits and registry for the Stepwise engine.
//!
//! An [`Effect`] is a pluggable physical process. It exposes any subset of
//! three capabilities ([`AtRestAction`], [`AlongStepAction`],
//! [`PostStepAction`]), each with a `propose` call used during arbitration
//! and an `apply` call that writes a [`StateDelta`](stepwise_core::StateDelta).
//! [`EffectRegistry`] validates the configured list once and owns it for
//! the lifetime of an engine.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod context;
pub mod effect;
pub mod registry;

pub use context::{ApplyContext, ProposeContext};
pub use effect::{
    AlongStepAction, AlongStepProposal, AtRestAction, AtRestProposal, Capabilities, Effect,
    Forcing, PostStepAction, PostStepProposal, Selection,
};
pub use registry::{validate_effects, EffectRegistry, EffectTable, RegistryError};

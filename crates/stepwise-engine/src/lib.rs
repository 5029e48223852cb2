//! Step arbitration, application and track driving for Stepwise.
//!
//! One [`TrackDriver`] owns everything needed to transport a track to
//! completion: the effect registry, the [`Transportation`] stage wrapping
//! the navigator, a [`StepArbiter`], a [`StepApplier`], a
//! [`TrajectoryRecorder`] with its per-worker chunk pool, and the
//! [`SecondaryRelay`]. Nothing is shared between drivers, so parallelism
//! is achieved by running one driver per thread (see [`worker`]).
//!
//! ```text
//! TrackDriver::process_one_track
//! └── loop while alive
//!     ├── StepArbiter::decide      (at-rest | continuous | discrete | boundary)
//!     ├── StepApplier::apply       (transport, along-step, winner, forced)
//!     ├── Track::commit_step
//!     ├── abort checkpoint
//!     ├── TrajectoryRecorder::append
//!     └── TrackObserver::on_step_complete
//! ```
//!
//! [`EventProcessor`] plays the surrounding scheduler: it stacks primaries
//! and drained secondaries, handles suspended and postponed tracks, and
//! collects finished trajectories into an [`EventRecord`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod abort;
pub mod applier;
pub mod arbiter;
pub mod config;
pub mod container;
pub mod driver;
pub mod event;
pub mod metrics;
pub mod observer;
pub mod relay;
pub mod trajectory;
pub mod transport;
pub mod worker;

pub use abort::AbortHandle;
pub use applier::StepApplier;
pub use arbiter::{StepArbiter, StepDecision, StepReason};
pub use config::{ConfigError, EngineConfig};
pub use container::TrajectoryContainer;
pub use driver::{TrackDriver, TrackOutcome};
pub use event::{EventProcessor, EventRecord};
pub use metrics::{EventMetrics, TrackMetrics};
pub use observer::{TrackControl, TrackObserver, TrackStart};
pub use relay::SecondaryRelay;
pub use trajectory::{
    PointAttributes, RecordingMode, Trajectory, TrajectoryPoint, TrajectoryRecorder,
};
pub use transport::Transportation;
pub use worker::{spawn_workers, MasterCollector, WorkerError, WorkerMessage, WorkerPool};

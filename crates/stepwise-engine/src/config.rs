//! Engine configuration, validation, and error types.
//!
//! [`EngineConfig`] is the builder input for a [`TrackDriver`](crate::TrackDriver).
//! [`validate()`](EngineConfig::validate) checks structural invariants
//! once at startup; the driver constructor then builds the
//! [`EffectRegistry`](stepwise_effect::EffectRegistry) from the same list.

use std::error::Error;
use std::fmt;

use stepwise_arena::{ArenaError, PoolConfig};
use stepwise_core::Navigator;
use stepwise_effect::{validate_effects, Effect, RegistryError};

use crate::abort::AbortHandle;
use crate::observer::TrackObserver;
use crate::trajectory::RecordingMode;

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected while validating an [`EngineConfig`] or starting
/// workers.
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// The effect list failed validation.
    Registry(RegistryError),
    /// Pool configuration is invalid.
    Arena(ArenaError),
    /// `max_steps_per_track` was `Some(0)`.
    ZeroStepLimit,
    /// A worker pool was requested with zero workers.
    WorkerCountZero,
    /// A worker thread could not be spawned.
    ThreadSpawnFailed {
        /// Description of which thread failed.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registry(e) => write!(f, "registry: {e}"),
            Self::Arena(e) => write!(f, "arena: {e}"),
            Self::ZeroStepLimit => write!(f, "max_steps_per_track must be at least 1"),
            Self::WorkerCountZero => write!(f, "worker count must be at least 1"),
            Self::ThreadSpawnFailed { reason } => {
                write!(f, "thread spawn failed: {reason}")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Registry(e) => Some(e),
            Self::Arena(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RegistryError> for ConfigError {
    fn from(e: RegistryError) -> Self {
        Self::Registry(e)
    }
}

impl From<ArenaError> for ConfigError {
    fn from(e: ArenaError) -> Self {
        Self::Arena(e)
    }
}

// ── EngineConfig ───────────────────────────────────────────────────

/// Complete configuration for one track driver.
pub struct EngineConfig {
    /// Effects in registration order. `EffectId(n)` is `effects[n]`.
    pub effects: Vec<Box<dyn Effect>>,
    /// Geometry, wrapped in the built-in transportation stage.
    pub navigator: Box<dyn Navigator>,
    /// Observers, invoked in registration order.
    pub observers: Vec<Box<dyn TrackObserver>>,
    /// Trajectory point pool. Default: 256 points per chunk, 1024 chunks
    /// retained.
    pub pool: PoolConfig,
    /// Recording mode before observers adjust it. Default: `Positions`.
    pub default_recording: RecordingMode,
    /// Steps after which a track is abandoned with
    /// [`StepLimitExceeded`](stepwise_core::StepError::StepLimitExceeded).
    /// Default: `None` (unbounded).
    pub max_steps_per_track: Option<u64>,
    /// Abort flag of the driver built from this config. Clone it before
    /// building to abort tracks from another thread or an observer.
    pub abort: AbortHandle,
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.effects.iter().map(|e| e.name()).collect();
        f.debug_struct("EngineConfig")
            .field("effects", &names)
            .field("observers", &self.observers.len())
            .field("pool", &self.pool)
            .field("default_recording", &self.default_recording)
            .field("max_steps_per_track", &self.max_steps_per_track)
            .finish_non_exhaustive()
    }
}

impl EngineConfig {
    /// Configuration with default pool, recording and step cap.
    pub fn new(effects: Vec<Box<dyn Effect>>, navigator: Box<dyn Navigator>) -> Self {
        Self {
            effects,
            navigator,
            observers: Vec::new(),
            pool: PoolConfig::default(),
            default_recording: RecordingMode::default(),
            max_steps_per_track: None,
            abort: AbortHandle::new(),
        }
    }

    /// Append an observer.
    pub fn with_observer(mut self, observer: impl TrackObserver) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    /// Set the per-track step cap.
    pub fn with_max_steps(mut self, limit: u64) -> Self {
        self.max_steps_per_track = Some(limit);
        self
    }

    /// Set the default recording mode.
    pub fn with_recording(mut self, mode: RecordingMode) -> Self {
        self.default_recording = mode;
        self
    }

    /// Validate all structural invariants.
    ///
    /// Takes `&mut self` because checking declared capabilities against
    /// the capability views needs mutable access to each effect.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        // 1. Effect list: non-empty, unique names, declared capabilities.
        validate_effects(&mut self.effects)?;
        // 2. Pool parameters.
        self.pool.validate()?;
        // 3. Step cap, if present, must allow at least one step.
        if self.max_steps_per_track == Some(0) {
            return Err(ConfigError::ZeroStepLimit);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stepwise_test_utils::{FixedAlongStep, FixedPostStep, MockNavigator};

    fn config(effects: Vec<Box<dyn Effect>>) -> EngineConfig {
        EngineConfig::new(effects, Box::new(MockNavigator::new(10.0)))
    }

    #[test]
    fn valid_config_passes() {
        let mut c = config(vec![
            Box::new(FixedAlongStep::new("eloss", 1.0)),
            Box::new(FixedPostStep::new("brem", 2.0)),
        ]);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn empty_effect_list_rejected() {
        let mut c = config(Vec::new());
        assert_eq!(
            c.validate(),
            Err(ConfigError::Registry(RegistryError::EmptyRegistry))
        );
    }

    #[test]
    fn duplicate_names_rejected() {
        let mut c = config(vec![
            Box::new(FixedAlongStep::new("x", 1.0)),
            Box::new(FixedPostStep::new("x", 2.0)),
        ]);
        assert!(matches!(
            c.validate(),
            Err(ConfigError::Registry(RegistryError::DuplicateName { .. }))
        ));
    }

    #[test]
    fn zero_step_limit_rejected() {
        let mut c = config(vec![Box::new(FixedPostStep::new("brem", 2.0))]).with_max_steps(0);
        assert_eq!(c.validate(), Err(ConfigError::ZeroStepLimit));
    }

    #[test]
    fn bad_pool_rejected() {
        let mut c = config(vec![Box::new(FixedPostStep::new("brem", 2.0))]);
        c.pool.chunk_capacity = 0;
        assert_eq!(
            c.validate(),
            Err(ConfigError::Arena(ArenaError::ZeroChunkCapacity))
        );
    }

    #[test]
    fn errors_chain_their_source() {
        let err = ConfigError::from(RegistryError::EmptyRegistry);
        assert!(err.source().is_some());
        assert!(err.to_string().starts_with("registry:"));
        assert!(ConfigError::ZeroStepLimit.source().is_none());
    }
}

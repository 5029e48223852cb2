//! The per-track stepping loop.

use std::time::Instant;

use stepwise_core::{Step, StepError, Track, TrackStatus};
use stepwise_effect::EffectRegistry;

use crate::abort::AbortHandle;
use crate::applier::StepApplier;
use crate::arbiter::{StepArbiter, StepDecision};
use crate::config::{ConfigError, EngineConfig};
use crate::metrics::TrackMetrics;
use crate::observer::{TrackControl, TrackObserver, TrackStart};
use crate::relay::SecondaryRelay;
use crate::trajectory::{RecordingMode, Trajectory, TrajectoryRecorder};
use crate::transport::Transportation;

// ── TrackOutcome ───────────────────────────────────────────────────

/// Result of driving one track to a non-alive status.
#[derive(Debug)]
pub struct TrackOutcome {
    /// The track in its final state.
    pub track: Track,
    /// Steps taken in this pass.
    pub steps: u64,
    /// Recorded path, unless recording was off.
    pub trajectory: Option<Trajectory>,
    /// Counters for this pass.
    pub metrics: TrackMetrics,
}

impl TrackOutcome {
    /// Final status of the track.
    pub fn status(&self) -> TrackStatus {
        self.track.status()
    }
}

// ── TrackDriver ────────────────────────────────────────────────────

/// Drives one track at a time from its first step to a terminal status.
///
/// Owns every per-worker resource: the effect registry, transportation,
/// the step buffer, the trajectory recorder and its pool, and the
/// secondary relay. A driver is `Send` but is used by one thread at a
/// time; run one driver per worker for parallelism.
pub struct TrackDriver {
    registry: EffectRegistry,
    transport: Transportation,
    arbiter: StepArbiter,
    applier: StepApplier,
    recorder: TrajectoryRecorder,
    relay: SecondaryRelay,
    observers: Vec<Box<dyn TrackObserver>>,
    step: Step,
    abort: AbortHandle,
    default_recording: RecordingMode,
    max_steps: Option<u64>,
}

impl std::fmt::Debug for TrackDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackDriver")
            .field("effects", &self.registry.len())
            .field("observers", &self.observers.len())
            .field("relay", &self.relay.len())
            .field("default_recording", &self.default_recording)
            .field("max_steps", &self.max_steps)
            .finish_non_exhaustive()
    }
}

impl TrackDriver {
    /// Validate `config` and build a driver from it.
    pub fn new(mut config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let registry = EffectRegistry::new(config.effects)?;
        let recorder = TrajectoryRecorder::new(&config.pool)?;
        Ok(Self {
            registry,
            transport: Transportation::new(config.navigator),
            arbiter: StepArbiter::new(),
            applier: StepApplier::new(),
            recorder,
            relay: SecondaryRelay::new(),
            observers: config.observers,
            step: Step::new(),
            abort: config.abort,
            default_recording: config.default_recording,
            max_steps: config.max_steps_per_track,
        })
    }

    /// A handle that can abort the in-flight track from any thread.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Request an abort of the current track at its next step boundary.
    pub fn abort_current_track(&self) {
        self.abort.request();
    }

    /// Append an observer after those from the config.
    pub fn add_observer(&mut self, observer: impl TrackObserver) {
        self.observers.push(Box::new(observer));
    }

    /// Secondaries produced so far and not yet drained.
    pub fn relay(&self) -> &SecondaryRelay {
        &self.relay
    }

    /// Mutable access to the relay, for draining.
    pub fn relay_mut(&mut self) -> &mut SecondaryRelay {
        &mut self.relay
    }

    /// The recorder, for merging and recycling trajectories.
    pub fn recorder_mut(&mut self) -> &mut TrajectoryRecorder {
        &mut self.recorder
    }

    /// The validated effect registry.
    pub fn registry(&self) -> &EffectRegistry {
        &self.registry
    }

    /// Recording mode handed to observers at track start.
    pub fn default_recording(&self) -> RecordingMode {
        self.default_recording
    }

    /// Change the recording mode handed to observers at track start.
    pub fn set_default_recording(&mut self, mode: RecordingMode) {
        self.default_recording = mode;
    }

    /// Transport `track` until it is no longer alive.
    ///
    /// A track without an id gets the relay's next id; a track without a
    /// volume is located first, and is killed without stepping if it lies
    /// outside the world. Secondaries are left in the [`relay`](Self::relay)
    /// for the caller to drain.
    ///
    /// # Errors
    ///
    /// [`StepError::TrackNotAlive`] if `track` is not alive on entry. Any
    /// fatal step error abandons the track: no partial step is committed,
    /// the secondaries of the failed step are withdrawn from the relay, and
    /// `on_track_end` is not called.
    pub fn process_one_track(&mut self, mut track: Track) -> Result<TrackOutcome, StepError> {
        let start = Instant::now();

        if !track.status().is_alive() {
            return Err(StepError::TrackNotAlive {
                track_id: track.id(),
                status: track.status(),
            });
        }
        if track.id().is_none() {
            let id = self.relay.allocate_id();
            track.assign_identity(id, track.parent_id(), track.creator());
        }
        if track.volume().is_none() {
            match self.transport.locate(&track) {
                Some(volume) => track.set_volume(Some(volume)),
                None => track.set_status(TrackStatus::StopAndKill)?,
            }
        }

        let mut start_hook = TrackStart::new(&track, self.default_recording);
        for observer in &mut self.observers {
            observer.on_track_start(&mut start_hook);
        }
        let (mode, user_data) = start_hook.into_parts();
        if user_data.is_some() {
            track.set_user_data(user_data);
        }

        self.recorder.begin(&track, mode);
        self.registry.start_tracking(&track);
        tracing::debug!(
            track = %track.id(),
            parent = %track.parent_id(),
            kind = track.kind().name,
            kinetic_energy = track.kinetic_energy,
            "track start"
        );

        let mut metrics = TrackMetrics::default();
        let result = self.step_loop(&mut track, &mut metrics);

        self.registry.end_tracking();
        let trajectory = self.recorder.finish();
        self.abort.clear();

        match result {
            Ok(()) => {
                for observer in &mut self.observers {
                    observer.on_track_end(&track, trajectory.as_ref());
                }
                metrics.total_us = start.elapsed().as_micros() as u64;
                tracing::debug!(
                    track = %track.id(),
                    status = ?track.status(),
                    steps = metrics.steps,
                    length = track.track_length(),
                    "track end"
                );
                Ok(TrackOutcome {
                    steps: metrics.steps,
                    track,
                    trajectory,
                    metrics,
                })
            }
            Err(error) => {
                if let Some(trajectory) = trajectory {
                    self.recorder.recycle(trajectory);
                }
                tracing::warn!(track = %track.id(), %error, "track abandoned");
                Err(error)
            }
        }
    }

    fn step_loop(&mut self, track: &mut Track, metrics: &mut TrackMetrics) -> Result<(), StepError> {
        if track.status().is_alive() && track.is_at_rest() && !self.registry.has_at_rest() {
            track.set_status(TrackStatus::StopAndKill)?;
            return Ok(());
        }

        let mut previous_length = 0.0;
        let mut safety = 0.0;
        let mut control = TrackControl::new();

        while track.status().is_alive() {
            if let Some(limit) = self.max_steps {
                if track.step_number() >= limit {
                    return Err(StepError::StepLimitExceeded {
                        track_id: track.id(),
                        limit,
                    });
                }
            }

            let mark = self.relay.mark();
            let decision = match self.take_step(track, previous_length, safety) {
                Ok(decision) => decision,
                Err(error) => {
                    self.relay.rollback(mark);
                    return Err(error);
                }
            };
            previous_length = self.step.length();
            safety = self.step.post().safety;

            // Abort checkpoint: only ever between steps.
            if self.abort.is_requested() {
                tracing::warn!(
                    track = %track.id(),
                    step = self.step.number(),
                    "abort requested, killing track and its secondaries"
                );
                track.set_status(TrackStatus::KillTrackAndSecondaries)?;
            }

            self.recorder.append(&self.step);
            let winner = decision.winner.map(|id| self.registry.name(id));
            metrics.record_step(decision.reason, winner, &self.step);
            tracing::trace!(
                track = %track.id(),
                step = self.step.number(),
                reason = ?decision.reason,
                length = self.step.length(),
                winner = winner.unwrap_or("-"),
                "step"
            );

            for observer in &mut self.observers {
                observer.on_step_complete(&self.step, track, &mut control);
                if let Some(next) = control.take() {
                    if track.status().can_transition_to(next) {
                        track.set_status(next)?;
                    } else {
                        tracing::debug!(
                            track = %track.id(),
                            from = ?track.status(),
                            to = ?next,
                            "ignoring observer status request"
                        );
                    }
                }
            }
        }
        Ok(())
    }

    fn take_step(
        &mut self,
        track: &mut Track,
        previous_length: f64,
        safety: f64,
    ) -> Result<StepDecision, StepError> {
        self.step.reset_from(track, safety);
        let decision = self.arbiter.decide(
            &mut self.registry,
            &mut self.transport,
            track,
            previous_length,
            safety,
        )?;
        self.applier.apply(
            &decision,
            &mut self.registry,
            &mut self.transport,
            &mut self.relay,
            track,
            &mut self.step,
        )?;
        track.commit_step(&self.step)?;
        Ok(decision)
    }
}

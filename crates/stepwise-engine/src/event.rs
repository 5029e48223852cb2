//! Event-level scheduling of primaries and their descendants.

use std::time::Instant;

use indexmap::IndexSet;
use stepwise_core::{EventId, StepError, Track, TrackId, TrackStatus};

use crate::config::{ConfigError, EngineConfig};
use crate::container::TrajectoryContainer;
use crate::driver::TrackDriver;
use crate::metrics::EventMetrics;

/// Everything one event produced.
#[derive(Debug)]
pub struct EventRecord {
    /// Which event this is.
    pub event_id: EventId,
    /// Finished trajectories, in completion order.
    pub trajectories: TrajectoryContainer,
    /// Counters for the event.
    pub metrics: EventMetrics,
    /// Tracks still suspended after their extra pass.
    pub suspended: Vec<Track>,
}

impl EventRecord {
    fn new(event_id: EventId) -> Self {
        Self {
            event_id,
            trajectories: TrajectoryContainer::new(),
            metrics: EventMetrics::default(),
            suspended: Vec::new(),
        }
    }
}

/// Runs whole events on one [`TrackDriver`].
///
/// Tracks are processed from a LIFO stack. Primaries are given ids
/// `1..=n` in order; secondaries get the following ids in creation order
/// and are stacked as soon as their parent finishes.
///
/// - `KillTrackAndSecondaries` discards the secondaries the track produced.
/// - `StopButAlive` tracks are resumed once the stack is empty, at most
///   once each; a track suspended again stays in
///   [`EventRecord::suspended`].
/// - `PostponeToNextEvent` tracks are carried into the next call to
///   [`process_event`](Self::process_event) and processed first, as
///   primaries with fresh ids.
#[derive(Debug)]
pub struct EventProcessor {
    driver: TrackDriver,
    postponed: Vec<Track>,
}

impl EventProcessor {
    /// Build a processor from a configuration.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        Ok(Self::from_driver(TrackDriver::new(config)?))
    }

    /// Wrap an existing driver.
    pub fn from_driver(driver: TrackDriver) -> Self {
        Self {
            driver,
            postponed: Vec::new(),
        }
    }

    /// The underlying driver.
    pub fn driver(&self) -> &TrackDriver {
        &self.driver
    }

    /// Mutable access to the underlying driver.
    pub fn driver_mut(&mut self) -> &mut TrackDriver {
        &mut self.driver
    }

    /// Tracks waiting for the next event.
    pub fn postponed(&self) -> &[Track] {
        &self.postponed
    }

    /// Process `primaries` and every descendant to completion.
    ///
    /// # Errors
    ///
    /// The first fatal [`StepError`] abandons the event: queued
    /// secondaries are discarded and recorded trajectories are returned to
    /// the pool. Tracks carried in from the previous event stay postponed,
    /// ahead of any postponed during the failed one.
    pub fn process_event(
        &mut self,
        event_id: EventId,
        primaries: Vec<Track>,
    ) -> Result<EventRecord, StepError> {
        let start = Instant::now();
        let mut record = EventRecord::new(event_id);
        tracing::debug!(event = %event_id, primaries = primaries.len(), "event start");

        let carried = self.postponed.clone();
        match self.run(primaries, &mut record) {
            Ok(()) => {
                record.metrics.suspended = record.suspended.len() as u64;
                record.metrics.total_us = start.elapsed().as_micros() as u64;
                tracing::debug!(
                    event = %event_id,
                    tracks = record.metrics.tracks,
                    steps = record.metrics.steps,
                    "event end"
                );
                Ok(record)
            }
            Err(error) => {
                self.driver.relay_mut().discard();
                let during = std::mem::replace(&mut self.postponed, carried);
                self.postponed.extend(during);
                let trajectories = std::mem::take(&mut record.trajectories);
                trajectories.recycle_into(self.driver.recorder_mut());
                tracing::warn!(event = %event_id, %error, "event abandoned");
                Err(error)
            }
        }
    }

    /// Return a record's point storage to this worker's pool.
    pub fn recycle(&mut self, record: EventRecord) {
        record
            .trajectories
            .recycle_into(self.driver.recorder_mut());
    }

    fn run(&mut self, primaries: Vec<Track>, record: &mut EventRecord) -> Result<(), StepError> {
        let relay = self.driver.relay_mut();
        relay.reset_ids();

        let mut queue = Vec::with_capacity(self.postponed.len() + primaries.len());
        for mut track in std::mem::take(&mut self.postponed) {
            track.resume()?;
            queue.push(track);
        }
        queue.extend(primaries);
        for track in &mut queue {
            let id = relay.allocate_id();
            track.assign_identity(id, TrackId::NONE, None);
        }
        queue.reverse();
        let mut stack = queue;

        let mut waiting: Vec<Track> = Vec::new();
        let mut resumed: IndexSet<TrackId> = IndexSet::new();
        loop {
            while let Some(track) = stack.pop() {
                self.run_track(track, record, &mut stack, &mut waiting)?;
            }
            if waiting.is_empty() {
                return Ok(());
            }
            for mut track in waiting.drain(..).rev() {
                if resumed.insert(track.id()) {
                    track.resume()?;
                    stack.push(track);
                } else {
                    record.suspended.push(track);
                }
            }
        }
    }

    fn run_track(
        &mut self,
        track: Track,
        record: &mut EventRecord,
        stack: &mut Vec<Track>,
        waiting: &mut Vec<Track>,
    ) -> Result<(), StepError> {
        let outcome = self.driver.process_one_track(track)?;
        record.metrics.absorb(&outcome.metrics);
        if let Some(trajectory) = outcome.trajectory {
            record
                .trajectories
                .insert_or_merge(trajectory, self.driver.recorder_mut());
        }

        let relay = self.driver.relay_mut();
        match outcome.track.status() {
            TrackStatus::KillTrackAndSecondaries => {
                record.metrics.secondaries_discarded += relay.discard() as u64;
            }
            _ => stack.extend(relay.drain()),
        }
        match outcome.track.status() {
            TrackStatus::StopButAlive => waiting.push(outcome.track),
            TrackStatus::PostponeToNextEvent => {
                record.metrics.postponed += 1;
                self.postponed.push(outcome.track);
            }
            _ => {}
        }
        Ok(())
    }
}

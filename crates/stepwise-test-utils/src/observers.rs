//! Observer fixtures.
//!
//! - [`RecordingObserver`] writes every hook call to an [`ObserverLog`].
//! - [`ControlAfter`] issues a [`TrackControl`] request after N steps.
//! - [`AbortAfter`] raises the driver's abort flag after N steps.

use std::sync::{Arc, Mutex};

use stepwise_core::{Step, StepStatus, Track, TrackId, TrackStatus};
use stepwise_engine::{AbortHandle, RecordingMode, TrackControl, TrackObserver, TrackStart, Trajectory};

/// One hook call.
#[derive(Clone, Debug, PartialEq)]
pub enum ObserverEvent {
    Start {
        track: TrackId,
        parent: TrackId,
    },
    Step {
        track: TrackId,
        number: u64,
        status: StepStatus,
        length: f64,
        secondaries: usize,
    },
    End {
        track: TrackId,
        status: TrackStatus,
        points: Option<usize>,
    },
}

/// Shared log written by [`RecordingObserver`].
#[derive(Clone, Debug, Default)]
pub struct ObserverLog(Arc<Mutex<Vec<ObserverEvent>>>);

impl ObserverLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: ObserverEvent) {
        if let Ok(mut log) = self.0.lock() {
            log.push(event);
        }
    }

    pub fn events(&self) -> Vec<ObserverEvent> {
        self.0.lock().map(|log| log.clone()).unwrap_or_default()
    }

    /// Ids of tracks that reached `on_track_end`, in order.
    pub fn ended(&self) -> Vec<TrackId> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ObserverEvent::End { track, .. } => Some(track),
                _ => None,
            })
            .collect()
    }

    /// Number of completed steps seen for `track`.
    pub fn steps_of(&self, id: TrackId) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ObserverEvent::Step { track, .. } if *track == id))
            .count()
    }
}

/// Records every hook call; optionally forces a recording mode.
#[derive(Debug)]
pub struct RecordingObserver {
    log: ObserverLog,
    recording: Option<RecordingMode>,
}

impl RecordingObserver {
    pub fn new(log: &ObserverLog) -> Self {
        Self {
            log: log.clone(),
            recording: None,
        }
    }

    pub fn with_recording(mut self, mode: RecordingMode) -> Self {
        self.recording = Some(mode);
        self
    }
}

impl TrackObserver for RecordingObserver {
    fn on_track_start(&mut self, start: &mut TrackStart<'_>) {
        if let Some(mode) = self.recording {
            start.set_recording(mode);
        }
        self.log.push(ObserverEvent::Start {
            track: start.track().id(),
            parent: start.track().parent_id(),
        });
    }

    fn on_step_complete(&mut self, step: &Step, track: &Track, _control: &mut TrackControl) {
        self.log.push(ObserverEvent::Step {
            track: track.id(),
            number: step.number(),
            status: step.post().status,
            length: step.length(),
            secondaries: step.secondaries().len(),
        });
    }

    fn on_track_end(&mut self, track: &Track, trajectory: Option<&Trajectory>) {
        self.log.push(ObserverEvent::End {
            track: track.id(),
            status: track.status(),
            points: trajectory.map(Trajectory::point_count),
        });
    }
}

/// Request issued by [`ControlAfter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    Kill,
    KillWithSecondaries,
    Suspend,
    Postpone,
}

/// Issues `control` once a track has taken `steps` steps.
#[derive(Debug)]
pub struct ControlAfter {
    steps: u64,
    control: Control,
    only: Option<TrackId>,
}

impl ControlAfter {
    pub fn new(steps: u64, control: Control) -> Self {
        Self {
            steps,
            control,
            only: None,
        }
    }

    /// Restrict to one track id.
    pub fn only_track(mut self, id: TrackId) -> Self {
        self.only = Some(id);
        self
    }
}

impl TrackObserver for ControlAfter {
    fn on_step_complete(&mut self, step: &Step, track: &Track, control: &mut TrackControl) {
        if step.number() != self.steps || self.only.is_some_and(|id| id != track.id()) {
            return;
        }
        match self.control {
            Control::Kill => control.kill(),
            Control::KillWithSecondaries => control.kill_with_secondaries(),
            Control::Suspend => control.suspend(),
            Control::Postpone => control.postpone(),
        }
    }
}

/// Raises an abort through `handle` when a track completes step `steps`.
#[derive(Debug)]
pub struct AbortAfter {
    steps: u64,
    handle: AbortHandle,
    only: Option<TrackId>,
}

impl AbortAfter {
    pub fn new(steps: u64, handle: AbortHandle) -> Self {
        Self {
            steps,
            handle,
            only: None,
        }
    }

    pub fn only_track(mut self, id: TrackId) -> Self {
        self.only = Some(id);
        self
    }
}

impl TrackObserver for AbortAfter {
    fn on_step_complete(&mut self, step: &Step, track: &Track, _control: &mut TrackControl) {
        if step.number() == self.steps && self.only.is_none_or(|id| id == track.id()) {
            self.handle.request();
        }
    }
}

//! User hooks around track processing.

use stepwise_core::{Step, Track, TrackStatus, UserData};

use crate::trajectory::{RecordingMode, Trajectory};

/// Observer of a single driver's tracks.
///
/// Hooks run on the worker thread, in registration order, after the step
/// or track they describe has been fully committed. All hooks default to
/// doing nothing.
pub trait TrackObserver: Send + 'static {
    /// Called before the first step, after the track has its id and
    /// volume. May choose the recording mode and attach user data.
    fn on_track_start(&mut self, _start: &mut TrackStart<'_>) {}

    /// Called after every committed step. `control` may request a status
    /// change, applied as soon as this observer returns, so later
    /// observers see it. A request that would move the status backwards
    /// is ignored.
    fn on_step_complete(&mut self, _step: &Step, _track: &Track, _control: &mut TrackControl) {}

    /// Called once the track has stopped. `trajectory` is `None` when
    /// recording was off.
    fn on_track_end(&mut self, _track: &Track, _trajectory: Option<&Trajectory>) {}
}

/// What an observer may configure before a track starts.
pub struct TrackStart<'a> {
    track: &'a Track,
    recording: RecordingMode,
    user_data: Option<UserData>,
}

impl<'a> TrackStart<'a> {
    pub(crate) fn new(track: &'a Track, recording: RecordingMode) -> Self {
        Self {
            track,
            recording,
            user_data: None,
        }
    }

    /// The track about to be stepped.
    pub fn track(&self) -> &Track {
        self.track
    }

    /// Recording mode chosen so far.
    pub fn recording(&self) -> RecordingMode {
        self.recording
    }

    /// Choose how the track's trajectory is recorded.
    pub fn set_recording(&mut self, mode: RecordingMode) {
        self.recording = mode;
    }

    /// Attach user data to the track. Replaces data attached by an
    /// earlier observer.
    pub fn attach_user_data(&mut self, data: UserData) {
        self.user_data = Some(data);
    }

    pub(crate) fn into_parts(self) -> (RecordingMode, Option<UserData>) {
        (self.recording, self.user_data)
    }
}

/// Status change requested by an observer after a step.
///
/// Only forward transitions take effect; a request that would move the
/// track backwards is ignored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrackControl {
    request: Option<TrackStatus>,
}

impl TrackControl {
    /// No request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop and kill the track; its secondaries survive.
    pub fn kill(&mut self) {
        self.request = Some(TrackStatus::StopAndKill);
    }

    /// Kill the track and discard its secondaries.
    pub fn kill_with_secondaries(&mut self) {
        self.request = Some(TrackStatus::KillTrackAndSecondaries);
    }

    /// Stop the track for this pass; it is resumed later in the event.
    pub fn suspend(&mut self) {
        self.request = Some(TrackStatus::StopButAlive);
    }

    /// Defer the track to the next event.
    pub fn postpone(&mut self) {
        self.request = Some(TrackStatus::PostponeToNextEvent);
    }

    /// The pending request.
    pub fn requested(&self) -> Option<TrackStatus> {
        self.request
    }

    /// Take the pending request, leaving none.
    pub fn take(&mut self) -> Option<TrackStatus> {
        self.request.take()
    }
}

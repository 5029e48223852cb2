//! Integration test: aborting the current track.
//!
//! An abort request is honoured at the next step boundary: the step in
//! progress completes, the track ends as `KillTrackAndSecondaries`, its
//! queued secondaries are discarded by the event processor, and the flag
//! is cleared so the next track runs normally.

use std::thread;

use stepwise_core::{EventId, ParticleKind, TrackId, TrackStatus};
use stepwise_engine::{EngineConfig, EventProcessor, TrackDriver};
use stepwise_test_utils::{
    electron, AbortAfter, FixedAlongStep, FixedPostStep, MockNavigator, ObserverLog,
    RecordingObserver,
};

fn config() -> EngineConfig {
    EngineConfig::new(
        vec![
            Box::new(FixedAlongStep::new("eloss", 1.0).with_loss(1.0)),
            Box::new(FixedPostStep::new("brem", 0.5).with_secondaries(
                1,
                ParticleKind::GAMMA,
                0.0,
            )),
        ],
        Box::new(MockNavigator::new(100.0)),
    )
}

#[test]
fn abort_before_first_step_stops_after_one_step() {
    let mut driver = TrackDriver::new(config()).unwrap();
    driver.abort_current_track();
    let outcome = driver.process_one_track(electron(10.0)).unwrap();
    assert_eq!(outcome.steps, 1);
    assert_eq!(outcome.status(), TrackStatus::KillTrackAndSecondaries);
    assert!(!driver.abort_handle().is_requested());

    // The flag does not leak into the next track.
    let next = driver.process_one_track(electron(3.0)).unwrap();
    assert_eq!(next.status(), TrackStatus::StopAndKill);
    assert_eq!(next.steps, 3);
}

#[test]
fn abort_from_another_thread() {
    let mut driver = TrackDriver::new(config()).unwrap();
    let handle = driver.abort_handle();
    thread::spawn(move || handle.request()).join().unwrap();
    let outcome = driver.process_one_track(electron(10.0)).unwrap();
    assert_eq!(outcome.status(), TrackStatus::KillTrackAndSecondaries);
}

#[test]
fn aborted_track_loses_its_secondaries_in_the_event() {
    let log = ObserverLog::new();
    let mut config = config();
    let abort = config.abort.clone();
    config = config
        .with_observer(AbortAfter::new(3, abort).only_track(TrackId(1)))
        .with_observer(RecordingObserver::new(&log));
    let mut processor = EventProcessor::new(config).unwrap();

    let record = processor
        .process_event(EventId(0), vec![electron(10.0), electron(2.0)])
        .unwrap();

    // The flag is raised after track 1's third step and honoured at the
    // end of its fourth, so its four brem photons are dropped. Track 2
    // ranges out on its second step and keeps the one photon it made.
    assert_eq!(record.metrics.secondaries_discarded, 4);
    assert_eq!(record.metrics.secondaries_produced, 5);
    assert_eq!(record.metrics.tracks, 2 + 1);
    assert_eq!(log.steps_of(TrackId(1)), 4);
    assert_eq!(log.steps_of(TrackId(2)), 2);
    assert!(log.ended().contains(&TrackId(2)));
    assert!(processor.driver().relay().is_empty());
}

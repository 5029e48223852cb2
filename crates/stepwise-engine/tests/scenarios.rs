//! Integration test: single-track stepping scenarios.
//!
//! Each scenario drives one track through a [`TrackDriver`] and checks
//! the recorded trajectory, the committed track, and the step metrics for
//! one kind of limiting process: volume boundaries, continuous effects,
//! discrete effects, at-rest effects and forced effects.

use stepwise_core::{EffectId, EventId, ParticleKind, StepStatus, TrackId, TrackStatus, VolumeId};
use stepwise_effect::Effect;
use stepwise_effects::{ExponentialInteraction, Outcome, SlabNavigator};
use stepwise_engine::{
    EngineConfig, EventProcessor, PointAttributes, RecordingMode, TrackDriver, TrackOutcome,
};
use stepwise_test_utils::{
    electron, ApplyLog, Control, ControlAfter, FixedAlongStep, FixedAtRest, FixedPostStep,
    MockNavigator, ScriptedNavigator,
};

fn run(
    effects: Vec<Box<dyn Effect>>,
    config: impl FnOnce(EngineConfig) -> EngineConfig,
    ke: f64,
) -> TrackOutcome {
    let base = EngineConfig::new(effects, Box::new(MockNavigator::new(100.0)))
        .with_recording(RecordingMode::Rich);
    let mut driver = TrackDriver::new(config(base)).unwrap();
    driver.process_one_track(electron(ke)).unwrap()
}

fn attributes(outcome: &TrackOutcome) -> Vec<PointAttributes> {
    outcome
        .trajectory
        .as_ref()
        .unwrap()
        .points()
        .filter_map(|p| p.attributes)
        .collect()
}

// ── Boundaries ──────────────────────────────────────────────────────

#[test]
fn boundary_steps_relocate_and_world_exit_kills() {
    let nav = ScriptedNavigator::new(vec![3.0, 2.0]).with_locations(vec![
        Some(VolumeId(0)),
        Some(VolumeId(1)),
        None,
    ]);
    let queried = nav.queried();
    let config = EngineConfig::new(
        vec![Box::new(FixedAlongStep::new("eloss", 10.0))],
        Box::new(nav),
    )
    .with_recording(RecordingMode::Rich);
    let mut driver = TrackDriver::new(config).unwrap();
    let outcome = driver.process_one_track(electron(50.0)).unwrap();

    assert_eq!(outcome.steps, 2);
    assert_eq!(outcome.status(), TrackStatus::StopAndKill);
    assert_eq!(outcome.track.position, [0.0, 0.0, 5.0]);
    assert_eq!(outcome.track.track_length(), 5.0);
    assert_eq!(outcome.metrics.boundary_limited, 2);
    assert_eq!(*queried.lock().unwrap(), vec![10.0, 10.0]);

    let attrs = attributes(&outcome);
    let statuses: Vec<StepStatus> = attrs.iter().map(|a| a.status).collect();
    assert_eq!(
        statuses,
        vec![
            StepStatus::Undefined,
            StepStatus::GeomBoundary,
            StepStatus::WorldBoundary
        ]
    );
    let volumes: Vec<Option<VolumeId>> = attrs.iter().map(|a| a.volume).collect();
    assert_eq!(volumes, vec![Some(VolumeId(0)), Some(VolumeId(1)), None]);
    assert!(attrs[1..]
        .iter()
        .all(|a| a.defined_by == Some(EffectId::TRANSPORTATION)));
}

#[test]
fn track_outside_world_is_killed_without_stepping() {
    let config = EngineConfig::new(
        vec![Box::new(FixedAlongStep::new("eloss", 1.0))],
        Box::new(MockNavigator::new(10.0).outside_world()),
    );
    let mut driver = TrackDriver::new(config).unwrap();
    let outcome = driver.process_one_track(electron(1.0)).unwrap();
    assert_eq!(outcome.steps, 0);
    assert_eq!(outcome.status(), TrackStatus::StopAndKill);
    assert_eq!(outcome.trajectory.unwrap().point_count(), 1);
}

// ── Continuous ──────────────────────────────────────────────────────

#[test]
fn smallest_continuous_limit_is_credited() {
    let outcome = run(
        vec![
            Box::new(FixedAlongStep::new("msc", 2.0)),
            Box::new(FixedAlongStep::new("eloss", 1.0).with_loss(1.0)),
        ],
        |c| c,
        3.0,
    );
    assert_eq!(outcome.steps, 3);
    assert_eq!(outcome.status(), TrackStatus::StopAndKill);
    assert_eq!(outcome.track.kinetic_energy, 0.0);
    assert_eq!(outcome.metrics.continuous_limited, 3);
    assert_eq!(outcome.metrics.effect_wins.get("eloss"), Some(&3));
    assert_eq!(outcome.metrics.energy_deposit, 3.0);
    assert!(attributes(&outcome)[1..]
        .iter()
        .all(|a| a.status == StepStatus::AlongStepLimited && a.defined_by == Some(EffectId(1))));
}

#[test]
fn non_candidate_limit_is_not_credited() {
    let outcome = run(
        vec![
            Box::new(FixedAlongStep::not_candidate("msc", 1.0)),
            Box::new(FixedAlongStep::new("eloss", 4.0)),
        ],
        |c| c.with_observer(ControlAfter::new(2, Control::Kill)),
        5.0,
    );
    assert_eq!(outcome.steps, 2);
    assert_eq!(outcome.track.track_length(), 2.0);
    assert_eq!(outcome.metrics.continuous_limited, 2);
    assert!(outcome.metrics.effect_wins.is_empty());
    let attrs = attributes(&outcome);
    assert_eq!(attrs[1].status, StepStatus::AlongStepLimited);
    assert_eq!(attrs[1].defined_by, None);
}

// ── Discrete ────────────────────────────────────────────────────────

#[test]
fn discrete_winner_applies_after_continuous() {
    let log = ApplyLog::new();
    let outcome = run(
        vec![
            Box::new(FixedAlongStep::new("eloss", 5.0).with_log(&log)),
            Box::new(FixedPostStep::new("brem", 2.0).killing().with_log(&log)),
            Box::new(FixedPostStep::new("compt", 3.0).with_log(&log)),
        ],
        |c| c,
        10.0,
    );
    assert_eq!(outcome.steps, 1);
    assert_eq!(outcome.track.track_length(), 2.0);
    assert_eq!(outcome.status(), TrackStatus::StopAndKill);
    assert_eq!(log.entries(), vec!["eloss:along", "brem:post"]);
    let attrs = attributes(&outcome);
    assert_eq!(attrs[1].status, StepStatus::PostStepLimited);
    assert_eq!(attrs[1].defined_by, Some(EffectId(1)));
}

#[test]
fn discrete_wins_a_tie_with_continuous() {
    let outcome = run(
        vec![
            Box::new(FixedAlongStep::new("eloss", 2.0)),
            Box::new(FixedPostStep::new("brem", 2.0).killing()),
        ],
        |c| c,
        10.0,
    );
    assert_eq!(outcome.metrics.discrete_limited, 1);
    assert_eq!(outcome.metrics.effect_wins.get("brem"), Some(&1));
}

#[test]
fn effect_limit_wins_a_tie_with_the_boundary() {
    let config = EngineConfig::new(
        vec![Box::new(FixedPostStep::new("brem", 2.0).killing())],
        Box::new(MockNavigator::new(2.0)),
    );
    let mut driver = TrackDriver::new(config).unwrap();
    let outcome = driver.process_one_track(electron(1.0)).unwrap();
    assert_eq!(outcome.metrics.discrete_limited, 1);
    assert_eq!(outcome.metrics.boundary_limited, 0);
}

#[test]
fn first_registered_wins_a_discrete_tie() {
    let outcome = run(
        vec![
            Box::new(FixedPostStep::new("phot", 1.0).killing()),
            Box::new(FixedPostStep::new("compt", 1.0).killing()),
        ],
        |c| c,
        1.0,
    );
    assert_eq!(outcome.metrics.effect_wins.get("phot"), Some(&1));
    assert_eq!(outcome.metrics.effect_wins.get("compt"), None);
}

#[test]
fn forced_effects_follow_the_winner() {
    let log = ApplyLog::new();
    let outcome = run(
        vec![
            Box::new(FixedAlongStep::new("eloss", 5.0).with_log(&log)),
            Box::new(FixedPostStep::forced("scoring").with_log(&log)),
            Box::new(FixedPostStep::new("brem", 2.0).killing().with_log(&log)),
            Box::new(FixedPostStep::strongly_forced("monitor").with_log(&log)),
        ],
        |c| c,
        10.0,
    );
    assert_eq!(outcome.steps, 1);
    // "scoring" is only Forced and the track died in "brem".
    assert_eq!(
        log.entries(),
        vec!["eloss:along", "brem:post", "monitor:post"]
    );
}

#[test]
fn continuous_kill_skips_the_discrete_winner() {
    let log = ApplyLog::new();
    let outcome = run(
        vec![
            Box::new(FixedAlongStep::new("cut", 5.0).killing().with_log(&log)),
            Box::new(FixedAlongStep::new("eloss", 5.0).with_log(&log)),
            Box::new(FixedPostStep::new("brem", 2.0).with_log(&log)),
        ],
        |c| c,
        10.0,
    );
    assert_eq!(outcome.status(), TrackStatus::StopAndKill);
    // Every continuous effect still runs on the killing step.
    assert_eq!(log.entries(), vec!["cut:along", "eloss:along"]);
}

// ── At rest ─────────────────────────────────────────────────────────

#[test]
fn exhausted_track_runs_at_rest_effect() {
    let config = EngineConfig::new(
        vec![
            Box::new(FixedAlongStep::new("eloss", 1.0).with_loss(1.0)),
            Box::new(FixedAtRest::new("decay", 50.0).with_secondaries(2, ParticleKind::GAMMA, 0.5)),
        ],
        Box::new(MockNavigator::new(100.0)),
    )
    .with_recording(RecordingMode::Rich);
    let mut driver = TrackDriver::new(config).unwrap();
    let outcome = driver.process_one_track(electron(2.0)).unwrap();

    assert_eq!(outcome.steps, 3);
    assert_eq!(outcome.metrics.at_rest_steps, 1);
    assert_eq!(outcome.status(), TrackStatus::StopAndKill);
    let attrs = attributes(&outcome);
    let last = attrs.last().unwrap();
    assert_eq!(last.status, StepStatus::AtRestLimited);
    assert_eq!(last.defined_by, Some(EffectId(1)));
    assert!(last.global_time >= 50.0);

    let pending = driver.relay().pending();
    assert_eq!(pending.len(), 2);
    for secondary in pending {
        assert_eq!(secondary.parent_id(), outcome.track.id());
        assert_eq!(secondary.creator(), Some(EffectId(1)));
        assert_eq!(secondary.position, outcome.track.position);
    }
}

#[test]
fn discrete_winner_taking_all_energy_ends_the_track() {
    let log = ApplyLog::new();
    let outcome = run(
        vec![
            Box::new(FixedPostStep::new("absorb", 1.0).with_loss(10.0)),
            Box::new(FixedPostStep::forced("scorer").with_log(&log)),
        ],
        |c| c,
        2.0,
    );
    assert_eq!(outcome.steps, 1);
    assert_eq!(outcome.status(), TrackStatus::StopAndKill);
    assert_eq!(outcome.track.kinetic_energy, 0.0);
    // The forced effect sees the live track before it is brought to rest.
    assert_eq!(log.entries(), vec!["scorer:post"]);
}

#[test]
fn full_split_ends_the_parent_and_keeps_the_event() {
    let split = ExponentialInteraction::builder()
        .mean_free_path(1.0)
        .applies_to(ParticleKind::ELECTRON)
        .outcome(Outcome::Split {
            product: ParticleKind::GAMMA,
            fraction: 1.0,
        })
        .build()
        .unwrap();
    let config = EngineConfig::new(
        vec![Box::new(split)],
        Box::new(SlabNavigator::uniform(1, 1.0e4, 1.0e4).unwrap()),
    );
    let mut processor = EventProcessor::new(config).unwrap();
    let record = processor
        .process_event(EventId(0), vec![electron(1.0)])
        .unwrap();

    assert_eq!(record.metrics.tracks, 2);
    assert_eq!(record.metrics.secondaries_produced, 1);
    let parent = record.trajectories.get(TrackId(1)).unwrap();
    assert_eq!(parent.point_count(), 2);
    let photon = record.trajectories.get(TrackId(2)).unwrap();
    assert_eq!(photon.parent_id(), TrackId(1));
    assert_eq!(photon.kind(), ParticleKind::GAMMA);
}

#[test]
fn primary_at_rest_without_at_rest_effects_is_killed() {
    let outcome = run(vec![Box::new(FixedAlongStep::new("eloss", 1.0))], |c| c, 0.0);
    assert_eq!(outcome.steps, 0);
    assert_eq!(outcome.status(), TrackStatus::StopAndKill);
}

#[test]
fn at_rest_without_a_finite_time_still_stops() {
    let outcome = run(
        vec![
            Box::new(FixedAlongStep::new("eloss", 1.0)),
            Box::new(FixedAtRest::new("never", f64::INFINITY)),
        ],
        |c| c,
        0.0,
    );
    assert_eq!(outcome.steps, 1);
    assert_eq!(outcome.status(), TrackStatus::StopAndKill);
    assert_eq!(outcome.metrics.at_rest_steps, 1);
    assert!(outcome.metrics.effect_wins.is_empty());
}

// ── Limits ──────────────────────────────────────────────────────────

#[test]
fn step_cap_abandons_the_track() {
    let config = EngineConfig::new(
        vec![Box::new(FixedAlongStep::new("eloss", 1.0))],
        Box::new(MockNavigator::new(100.0)),
    )
    .with_max_steps(4);
    let mut driver = TrackDriver::new(config).unwrap();
    let err = driver.process_one_track(electron(1.0)).unwrap_err();
    assert!(matches!(
        err,
        stepwise_core::StepError::StepLimitExceeded { limit: 4, .. }
    ));
}

//! Calorimeter shower example.
//!
//! Demonstrates: build a profile → spawn workers → submit events →
//! collect records on the master → summarise.

use stepwise_bench::{beam, calorimeter_profile};
use stepwise_core::{EventId, ParticleKind};
use stepwise_engine::{spawn_workers, EventProcessor, MasterCollector};

fn main() {
    println!("=== Stepwise Calorimeter Shower Example ===\n");

    let workers = 4;
    let events = 32u64;
    let mut pool = spawn_workers(workers, |_| {
        EventProcessor::new(calorimeter_profile(7).unwrap())
    })
    .unwrap();

    for event in 0..events {
        // Alternate photon and muon beams.
        let kind = if event % 2 == 0 {
            ParticleKind::GAMMA
        } else {
            ParticleKind::MUON_MINUS
        };
        pool.submit(EventId(event), beam(5, kind, 150.0)).unwrap();
    }

    let mut collector = MasterCollector::new();
    let received = pool.collect_into(&mut collector, events as usize);
    pool.shutdown().unwrap();
    collector.sort_by_event();

    println!("{received} events from {workers} workers\n");
    println!("{:>6} {:>8} {:>8} {:>12}", "event", "tracks", "steps", "deposit/MeV");
    for record in &collector.records {
        println!(
            "{:>6} {:>8} {:>8} {:>12.3}",
            record.event_id.0,
            record.metrics.tracks,
            record.metrics.steps,
            record.metrics.energy_deposit
        );
    }

    let totals = &collector.totals;
    println!(
        "\ntotal: {} tracks, {} steps, {} secondaries, {:.1} MeV deposited",
        totals.tracks, totals.steps, totals.secondaries_produced, totals.energy_deposit
    );
    for (worker, error) in &collector.failures {
        println!("worker {worker} failed: {error}");
    }
}

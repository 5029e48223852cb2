//! Benchmark profiles and utilities for the Stepwise transport scheduler.
//!
//! Provides pre-built [`EngineConfig`] profiles for benchmarks and examples:
//!
//! - [`calorimeter_profile`]: 20 lead-like slabs, continuous loss, photon
//!   splitting and muon decay. Produces showers of a few dozen tracks.
//! - [`thin_target_profile`]: 3 slabs and a step limiter only, to measure
//!   per-step engine overhead.
//! - [`beam`]: deterministic pencil-beam primaries.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use stepwise_core::{ParticleKind, Track};
use stepwise_effects::{
    AtRestDecay, ContinuousLoss, ExponentialInteraction, Outcome, SlabNavigator, StepLimiter,
};
use stepwise_engine::EngineConfig;

/// Build the calorimeter profile: 20 slabs of 5 mm in a 200 mm wide box.
///
/// Effects, in registration order: ContinuousLoss(1.2 MeV/mm) →
/// ExponentialInteraction(gamma, 6 mm, split 50/50 into e-) →
/// AtRestDecay(mu-, 2197 ns, 35 MeV e-).
pub fn calorimeter_profile(seed: u64) -> Result<EngineConfig, String> {
    let eloss = ContinuousLoss::builder()
        .stopping_power(1.2)
        .max_fraction(0.2)
        .final_range(0.5)
        .build()?;
    let split = ExponentialInteraction::builder()
        .name("photon_split")
        .mean_free_path(6.0)
        .applies_to(ParticleKind::GAMMA)
        .outcome(Outcome::Split {
            product: ParticleKind::ELECTRON,
            fraction: 0.5,
        })
        .seed(seed)
        .build()?;
    let decay = AtRestDecay::builder()
        .mean_lifetime(2197.0)
        .applies_to(ParticleKind::MUON_MINUS)
        .product(ParticleKind::ELECTRON, 35.0)
        .seed(seed.wrapping_add(1))
        .build()?;
    let navigator = SlabNavigator::uniform(20, 5.0, 100.0)?;

    Ok(EngineConfig::new(
        vec![Box::new(eloss), Box::new(split), Box::new(decay)],
        Box::new(navigator),
    ))
}

/// Build the thin-target profile: 3 slabs of 10 mm, a 0.1 mm step limiter.
///
/// Neutral primaries take about 300 steps each with no physics beyond the
/// cap.
pub fn thin_target_profile() -> Result<EngineConfig, String> {
    let navigator = SlabNavigator::uniform(3, 10.0, 50.0)?;
    Ok(EngineConfig::new(
        vec![Box::new(StepLimiter::new(0.1)?)],
        Box::new(navigator),
    ))
}

/// `count` primaries of `kind` at `kinetic_energy` MeV, starting on the
/// `z = 0` face and moving along +z.
///
/// Transverse positions follow a fixed grid so every run sees the same
/// beam.
pub fn beam(count: usize, kind: ParticleKind, kinetic_energy: f64) -> Vec<Track> {
    (0..count)
        .map(|i| {
            let x = (i % 7) as f64 - 3.0;
            let y = (i / 7 % 7) as f64 - 3.0;
            Track::new(kind, kinetic_energy, [x, y, 0.0], [0.0, 0.0, 1.0])
        })
        .collect()
}

//! The built-in transportation stage.

use std::fmt;

use stepwise_core::{
    three, EffectId, GeomStep, Navigator, NavigationError, Step, StepError, StepStatus, Track,
    TrackStatus, VolumeId,
};

/// Wraps the navigator and moves particles along straight steps.
///
/// Registered implicitly under [`EffectId::TRANSPORTATION`]. Its
/// continuous application runs first in every moving step, whether or
/// not the boundary limited the step.
pub struct Transportation {
    navigator: Box<dyn Navigator>,
}

impl fmt::Debug for Transportation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transportation").finish_non_exhaustive()
    }
}

impl Transportation {
    /// Reserved handle of this stage.
    pub const ID: EffectId = EffectId::TRANSPORTATION;

    /// Wrap a navigator.
    pub fn new(navigator: Box<dyn Navigator>) -> Self {
        Self { navigator }
    }

    /// Locate the track's current position.
    pub fn locate(&mut self, track: &Track) -> Option<VolumeId> {
        self.navigator.locate(track.position, track.direction)
    }

    /// Ask the navigator for the distance to the next boundary, bounded by
    /// `max_step`.
    ///
    /// Distances above `max_step` are clamped. A NaN, negative or infinite
    /// distance is a navigation failure.
    pub fn compute_step(
        &mut self,
        track: &Track,
        max_step: f64,
        step_number: u64,
    ) -> Result<GeomStep, StepError> {
        let fail = |reason: NavigationError| StepError::Navigation {
            track_id: track.id(),
            step_number,
            reason,
        };
        let mut geom = self
            .navigator
            .compute_step(track.position, track.direction, max_step)
            .map_err(fail)?;
        if geom.distance.is_nan() || geom.distance < 0.0 {
            return Err(fail(NavigationError::new(format!(
                "invalid distance {}",
                geom.distance
            ))));
        }
        if geom.distance > max_step {
            geom.distance = max_step;
        }
        if !geom.distance.is_finite() {
            return Err(fail(NavigationError::new(
                "unbounded step: no effect or boundary limits it",
            )));
        }
        if geom.safety.is_nan() || geom.safety < 0.0 {
            geom.safety = 0.0;
        }
        Ok(geom)
    }

    /// Move the post point by `step.length()` and advance its clocks.
    ///
    /// On a boundary step the post point is relocated; leaving the world
    /// stops and kills the track.
    pub fn apply(
        &mut self,
        track: &Track,
        step: &mut Step,
        safety: f64,
        on_boundary: bool,
    ) -> Result<(), StepError> {
        let length = step.length();
        let velocity = track.velocity();
        let dt = if length > 0.0 && velocity > 0.0 {
            length / velocity
        } else {
            0.0
        };
        let gamma = track.kind().gamma(track.kinetic_energy);
        let dtau = if gamma.is_finite() { dt / gamma } else { 0.0 };

        let post = step.post_mut();
        post.position = three::add_scaled(post.position, post.direction, length);
        post.global_time += dt;
        post.local_time += dt;
        post.proper_time += dtau;
        post.safety = (safety - length).max(0.0);

        if on_boundary {
            match self.navigator.locate(post.position, post.direction) {
                Some(volume) => {
                    post.volume = Some(volume);
                    post.status = StepStatus::GeomBoundary;
                }
                None => {
                    post.volume = None;
                    post.status = StepStatus::WorldBoundary;
                    step.transition(TrackStatus::StopAndKill)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stepwise_core::{ParticleKind, TrackId, SPEED_OF_LIGHT};

    /// World is |z| < half; two volumes split at z = 0.
    struct Split {
        half: f64,
        reply: Option<f64>,
    }

    impl Navigator for Split {
        fn compute_step(
            &mut self,
            position: [f64; 3],
            direction: [f64; 3],
            max_step: f64,
        ) -> Result<GeomStep, NavigationError> {
            if let Some(d) = self.reply {
                return Ok(GeomStep {
                    distance: d,
                    safety: 0.0,
                });
            }
            let z = position[2];
            let dz = direction[2];
            let target = if z < 0.0 { 0.0 } else { self.half };
            let d = if dz > 0.0 { (target - z) / dz } else { f64::INFINITY };
            Ok(GeomStep {
                distance: d.min(max_step),
                safety: (target - z).abs(),
            })
        }

        fn locate(&mut self, position: [f64; 3], direction: [f64; 3]) -> Option<VolumeId> {
            let z = position[2];
            if z.abs() > self.half || (z == self.half && direction[2] > 0.0) {
                None
            } else if z < 0.0 || (z == 0.0 && direction[2] < 0.0) {
                Some(VolumeId(0))
            } else {
                Some(VolumeId(1))
            }
        }
    }

    fn photon_at(z: f64) -> Track {
        let mut t = Track::new(ParticleKind::GAMMA, 1.0, [0.0, 0.0, z], [0.0, 0.0, 1.0]);
        t.assign_identity(TrackId(1), TrackId::NONE, None);
        t
    }

    fn transport(reply: Option<f64>) -> Transportation {
        Transportation::new(Box::new(Split { half: 10.0, reply }))
    }

    #[test]
    fn distance_is_clamped_to_max_step() {
        let mut tr = transport(Some(50.0));
        let g = tr.compute_step(&photon_at(-5.0), 3.0, 1).unwrap();
        assert_eq!(g.distance, 3.0);
    }

    #[test]
    fn invalid_distances_are_navigation_errors() {
        for bad in [f64::NAN, -1.0] {
            let mut tr = transport(Some(bad));
            assert!(matches!(
                tr.compute_step(&photon_at(0.0), 1.0, 4),
                Err(StepError::Navigation { step_number: 4, .. })
            ));
        }
        let mut tr = transport(Some(f64::INFINITY));
        assert!(tr
            .compute_step(&photon_at(0.0), f64::INFINITY, 1)
            .is_err());
    }

    #[test]
    fn boundary_step_relocates() {
        let mut tr = transport(None);
        let t = photon_at(-5.0);
        let mut step = Step::new();
        step.reset_from(&t, 0.0);
        step.set_length(5.0);
        tr.apply(&t, &mut step, 5.0, true).unwrap();
        assert_eq!(step.post().position, [0.0, 0.0, 0.0]);
        assert_eq!(step.post().volume, Some(VolumeId(1)));
        assert_eq!(step.post().status, StepStatus::GeomBoundary);
        assert!((step.post().global_time - 5.0 / SPEED_OF_LIGHT).abs() < 1e-12);
        assert_eq!(step.post().proper_time, 0.0);
        assert!(step.is_alive());
    }

    #[test]
    fn leaving_the_world_kills() {
        let mut tr = transport(None);
        let t = photon_at(5.0);
        let mut step = Step::new();
        step.reset_from(&t, 0.0);
        step.set_length(5.0);
        tr.apply(&t, &mut step, 5.0, true).unwrap();
        assert_eq!(step.post().status, StepStatus::WorldBoundary);
        assert_eq!(step.post().volume, None);
        assert_eq!(step.status(), TrackStatus::StopAndKill);
    }

    #[test]
    fn massive_particle_accrues_proper_time() {
        let mut tr = transport(None);
        let mut t = Track::new(ParticleKind::PROTON, 938.272_088_16, [0.0; 3], [0.0, 0.0, 1.0]);
        t.assign_identity(TrackId(1), TrackId::NONE, None);
        let mut step = Step::new();
        step.reset_from(&t, 0.0);
        step.set_length(2.0);
        tr.apply(&t, &mut step, 0.0, false).unwrap();
        // gamma = 2
        let p = step.post();
        assert!((p.proper_time * 2.0 - p.global_time).abs() < 1e-12);
        assert_eq!(p.safety, 0.0);
    }
}

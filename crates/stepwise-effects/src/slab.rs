//! Layered slab geometry.
//!
//! The world is the box `|x| <= half_width`, `|y| <= half_width`,
//! `planes[0] <= z <= planes[n-1]`. Consecutive z planes bound the slabs;
//! slab `i` (between `planes[i]` and `planes[i + 1]`) is `VolumeId(i)`.

use stepwise_core::{GeomStep, NavigationError, Navigator, ThreeVector, VolumeId};

/// Points within this distance (mm) of a plane are on it.
const TOLERANCE: f64 = 1e-9;

/// Stack of z slabs inside a square world box.
#[derive(Clone, Debug)]
pub struct SlabNavigator {
    planes: Vec<f64>,
    half_width: f64,
}

impl SlabNavigator {
    /// Slabs bounded by `planes`, which must be finite and strictly
    /// increasing, with at least two entries.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the planes or `half_width` are invalid.
    pub fn new(planes: Vec<f64>, half_width: f64) -> Result<Self, String> {
        if planes.len() < 2 {
            return Err(format!("need at least 2 planes, got {}", planes.len()));
        }
        if planes.iter().any(|z| !z.is_finite()) {
            return Err("planes must be finite".to_string());
        }
        if planes.windows(2).any(|w| w[1] <= w[0]) {
            return Err("planes must be strictly increasing".to_string());
        }
        if !half_width.is_finite() || half_width <= 0.0 {
            return Err(format!("half_width must be finite and > 0, got {half_width}"));
        }
        Ok(Self { planes, half_width })
    }

    /// `count` slabs of equal `thickness` starting at `z = 0`.
    pub fn uniform(count: usize, thickness: f64, half_width: f64) -> Result<Self, String> {
        let planes = (0..=count).map(|i| i as f64 * thickness).collect();
        Self::new(planes, half_width)
    }

    /// Number of slabs.
    pub fn slab_count(&self) -> usize {
        self.planes.len() - 1
    }

    fn inside_box(&self, position: ThreeVector) -> bool {
        position[0].abs() <= self.half_width + TOLERANCE
            && position[1].abs() <= self.half_width + TOLERANCE
            && position[2] >= self.planes[0] - TOLERANCE
            && position[2] <= self.planes[self.planes.len() - 1] + TOLERANCE
    }

    fn leaving_sides(&self, position: ThreeVector, direction: ThreeVector) -> bool {
        (0..2).any(|a| {
            position[a].abs() >= self.half_width - TOLERANCE && position[a] * direction[a] > 0.0
        })
    }

    /// Distance along `direction` to the next z plane.
    fn to_next_plane(&self, z: f64, dz: f64) -> f64 {
        if dz > 0.0 {
            self.planes
                .iter()
                .find(|&&p| p > z + TOLERANCE)
                .map_or(0.0, |p| (p - z) / dz)
        } else if dz < 0.0 {
            self.planes
                .iter()
                .rev()
                .find(|&&p| p < z - TOLERANCE)
                .map_or(0.0, |p| (p - z) / dz)
        } else {
            f64::INFINITY
        }
    }

    /// Distance along `direction` to the side walls.
    fn to_side_walls(&self, position: ThreeVector, direction: ThreeVector) -> f64 {
        (0..2)
            .map(|a| {
                if direction[a] > 0.0 {
                    (self.half_width - position[a]) / direction[a]
                } else if direction[a] < 0.0 {
                    (-self.half_width - position[a]) / direction[a]
                } else {
                    f64::INFINITY
                }
            })
            .fold(f64::INFINITY, f64::min)
            .max(0.0)
    }

    fn safety(&self, position: ThreeVector) -> f64 {
        let z = position[2];
        let to_plane = self
            .planes
            .iter()
            .map(|p| (p - z).abs())
            .fold(f64::INFINITY, f64::min);
        let to_side = (self.half_width - position[0].abs()).min(self.half_width - position[1].abs());
        to_plane.min(to_side).max(0.0)
    }
}

impl Navigator for SlabNavigator {
    fn compute_step(
        &mut self,
        position: ThreeVector,
        direction: ThreeVector,
        _max_step: f64,
    ) -> Result<GeomStep, NavigationError> {
        if !self.inside_box(position) {
            return Err(NavigationError::new(format!(
                "position {position:?} is outside the slab world"
            )));
        }
        let distance = self
            .to_next_plane(position[2], direction[2])
            .min(self.to_side_walls(position, direction));
        Ok(GeomStep {
            distance,
            safety: self.safety(position),
        })
    }

    fn locate(&mut self, position: ThreeVector, direction: ThreeVector) -> Option<VolumeId> {
        if !self.inside_box(position) || self.leaving_sides(position, direction) {
            return None;
        }
        let z = position[2];
        let last = self.slab_count();
        if let Some(k) = self.planes.iter().position(|p| (p - z).abs() <= TOLERANCE) {
            // On plane k: slab k lies above it, slab k - 1 below.
            let slab = if direction[2] > 0.0 || (direction[2] == 0.0 && k < last) {
                Some(k)
            } else {
                k.checked_sub(1)
            };
            return slab
                .filter(|&s| s < last)
                .and_then(|s| u32::try_from(s).ok())
                .map(VolumeId);
        }
        let slab = self.planes.iter().rposition(|&p| p < z)?;
        u32::try_from(slab.min(last - 1)).ok().map(VolumeId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const UP: ThreeVector = [0.0, 0.0, 1.0];
    const DOWN: ThreeVector = [0.0, 0.0, -1.0];

    fn three_slabs() -> SlabNavigator {
        SlabNavigator::uniform(3, 10.0, 50.0).unwrap()
    }

    #[test]
    fn rejects_bad_planes() {
        assert!(SlabNavigator::new(vec![0.0], 1.0).is_err());
        assert!(SlabNavigator::new(vec![0.0, 0.0], 1.0).is_err());
        assert!(SlabNavigator::new(vec![0.0, f64::NAN], 1.0).is_err());
        assert!(SlabNavigator::new(vec![0.0, 1.0], 0.0).is_err());
    }

    #[test]
    fn locates_interior_points() {
        let mut nav = three_slabs();
        assert_eq!(nav.locate([0.0, 0.0, 5.0], UP), Some(VolumeId(0)));
        assert_eq!(nav.locate([0.0, 0.0, 15.0], UP), Some(VolumeId(1)));
        assert_eq!(nav.locate([0.0, 0.0, 29.0], DOWN), Some(VolumeId(2)));
        assert_eq!(nav.locate([0.0, 0.0, 31.0], DOWN), None);
        assert_eq!(nav.locate([60.0, 0.0, 5.0], UP), None);
    }

    #[test]
    fn direction_disambiguates_planes() {
        let mut nav = three_slabs();
        assert_eq!(nav.locate([0.0, 0.0, 10.0], UP), Some(VolumeId(1)));
        assert_eq!(nav.locate([0.0, 0.0, 10.0], DOWN), Some(VolumeId(0)));
        assert_eq!(nav.locate([0.0, 0.0, 30.0], UP), None);
        assert_eq!(nav.locate([0.0, 0.0, 0.0], DOWN), None);
        assert_eq!(nav.locate([0.0, 0.0, 0.0], UP), Some(VolumeId(0)));
    }

    #[test]
    fn leaving_through_a_side_wall_is_outside() {
        let mut nav = three_slabs();
        assert_eq!(nav.locate([50.0, 0.0, 5.0], [1.0, 0.0, 0.0]), None);
        assert_eq!(
            nav.locate([50.0, 0.0, 5.0], [-1.0, 0.0, 0.0]),
            Some(VolumeId(0))
        );
    }

    #[test]
    fn step_reaches_next_plane() {
        let mut nav = three_slabs();
        let g = nav.compute_step([0.0, 0.0, 4.0], UP, f64::INFINITY).unwrap();
        assert_eq!(g.distance, 6.0);
        assert_eq!(g.safety, 4.0);
        let g = nav.compute_step([0.0, 0.0, 10.0], UP, f64::INFINITY).unwrap();
        assert_eq!(g.distance, 10.0);
        let g = nav.compute_step([0.0, 0.0, 10.0], DOWN, f64::INFINITY).unwrap();
        assert_eq!(g.distance, 10.0);
    }

    #[test]
    fn oblique_steps_scale_with_direction() {
        let mut nav = three_slabs();
        let s = std::f64::consts::FRAC_1_SQRT_2;
        let g = nav.compute_step([0.0, 0.0, 5.0], [s, 0.0, s], f64::INFINITY).unwrap();
        assert!((g.distance - 5.0 / s).abs() < 1e-9);
    }

    #[test]
    fn sideways_steps_hit_the_wall() {
        let mut nav = three_slabs();
        let g = nav
            .compute_step([20.0, 0.0, 5.0], [1.0, 0.0, 0.0], f64::INFINITY)
            .unwrap();
        assert_eq!(g.distance, 30.0);
    }

    #[test]
    fn outside_positions_are_errors() {
        let mut nav = three_slabs();
        assert!(nav.compute_step([0.0, 0.0, -1.0], UP, 1.0).is_err());
    }

    proptest! {
        #[test]
        fn stepping_to_boundary_changes_volume_or_exits(
            z in 0.01f64..29.99,
            up in any::<bool>(),
        ) {
            let mut nav = three_slabs();
            let dir = if up { UP } else { DOWN };
            let before = nav.locate([0.0, 0.0, z], dir);
            prop_assert!(before.is_some());
            let g = nav.compute_step([0.0, 0.0, z], dir, f64::INFINITY).unwrap();
            prop_assert!(g.safety <= g.distance + 1e-12);
            let after = nav.locate([0.0, 0.0, z + g.distance * dir[2]], dir);
            prop_assert_ne!(before, after);
        }
    }
}

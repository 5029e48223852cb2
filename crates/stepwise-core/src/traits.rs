//! Collaborator contracts defined at the core level.

use crate::error::NavigationError;
use crate::id::VolumeId;
use crate::three::ThreeVector;

/// Result of one geometry query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeomStep {
    /// Distance along the direction to the next boundary, bounded by the
    /// `max_step` that was passed in.
    pub distance: f64,
    /// Isotropic distance to the nearest boundary from the query point.
    pub safety: f64,
}

/// Geometry collaborator used by the built-in transportation stage.
///
/// # Contract
///
/// - `compute_step` must never return a distance larger than `max_step`
///   (the engine clamps if it does). Returning exactly `max_step` means
///   "no boundary within reach".
/// - `locate` returns `None` outside the world.
/// - Must be `Send + 'static` so each worker can own its own instance.
pub trait Navigator: Send + 'static {
    /// Distance to the next volume boundary along `direction`.
    fn compute_step(
        &mut self,
        position: ThreeVector,
        direction: ThreeVector,
        max_step: f64,
    ) -> Result<GeomStep, NavigationError>;

    /// Volume containing `position`, or `None` outside the world.
    ///
    /// `direction` disambiguates points lying exactly on a boundary.
    fn locate(&mut self, position: ThreeVector, direction: ThreeVector) -> Option<VolumeId>;
}

//! Plain `[f64; 3]` vector helpers.

/// A Cartesian 3-vector (position in mm, or a direction / momentum).
pub type ThreeVector = [f64; 3];

/// `a + s * d`.
pub fn add_scaled(a: ThreeVector, d: ThreeVector, s: f64) -> ThreeVector {
    [a[0] + s * d[0], a[1] + s * d[1], a[2] + s * d[2]]
}

/// `s * a`.
pub fn scale(a: ThreeVector, s: f64) -> ThreeVector {
    [s * a[0], s * a[1], s * a[2]]
}

/// Dot product.
pub fn dot(a: ThreeVector, b: ThreeVector) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Euclidean length.
pub fn norm(a: ThreeVector) -> f64 {
    dot(a, a).sqrt()
}

/// Unit vector along `a`, or `None` for a zero or non-finite vector.
pub fn unit(a: ThreeVector) -> Option<ThreeVector> {
    let n = norm(a);
    if n > 0.0 && n.is_finite() {
        Some(scale(a, 1.0 / n))
    } else {
        None
    }
}

/// Isotropic unit direction from two uniform deviates in `[0, 1)`.
pub fn isotropic(u1: f64, u2: f64) -> ThreeVector {
    let cos_theta = 2.0 * u1 - 1.0;
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    let phi = 2.0 * std::f64::consts::PI * u2;
    [sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta]
}

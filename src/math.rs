//! Scalar/vector/quaternion/matrix aliases shared by every module.
//!
//! The solver runs entirely in `f64` (see the crate-level docs): GJK, EPA and
//! the XPBD constraint passes all accumulate small corrections over many
//! substeps, and `f32` loses the precision needed to keep those stable. A
//! single conversion boundary (bottom of this file) exists for callers that
//! need `f32` data, e.g. to hand vertex buffers to a renderer.

pub use glam::{DMat3 as Mat3, DMat4 as Mat4, DQuat as Quaternion, DVec3 as Vector};

/// The crate's floating-point type. Always `f64`.
pub type Scalar = f64;

pub const PI: Scalar = std::f64::consts::PI;

/// Returns `m⁻¹`, or `None` if `m` is (numerically) singular.
///
/// Colliders degenerate to a plane or a line can produce a singular inertia
/// tensor or constraint gradient matrix; callers use this instead of
/// `Mat3::inverse`, which silently returns `NAN`-filled garbage on a
/// near-zero determinant.
pub fn try_invert_mat3(m: Mat3) -> Option<Mat3> {
    const EPSILON: Scalar = 1e-12;
    if m.determinant().abs() < EPSILON {
        None
    } else {
        Some(m.inverse())
    }
}

/// Transforms a body-space inertia tensor into world space: `I(q) = R I_body Rᵀ`.
pub fn rotate_inertia(inertia_body: Mat3, orientation: Quaternion) -> Mat3 {
    let r = Mat3::from_quat(orientation);
    r * inertia_body * r.transpose()
}

/// Advances an orientation by an angular velocity over `dt`, using the
/// linearized quaternion update `q' = q + (dt/2) * (ω, 0) ⊗ q`, renormalized.
///
/// This crate always uses the linearized form rather than the exact
/// axis-angle exponential map, consistently across every call site (see
/// DESIGN.md's Open Question decisions).
pub fn integrate_orientation(orientation: Quaternion, angular_velocity: Vector, dt: Scalar) -> Quaternion {
    let omega_quat = Quaternion::from_xyzw(
        angular_velocity.x,
        angular_velocity.y,
        angular_velocity.z,
        0.0,
    );
    let delta = omega_quat * orientation;
    let updated = Quaternion::from_xyzw(
        orientation.x + 0.5 * dt * delta.x,
        orientation.y + 0.5 * dt * delta.y,
        orientation.z + 0.5 * dt * delta.z,
        orientation.w + 0.5 * dt * delta.w,
    );
    updated.normalize()
}

/// The shortest rotation that takes `from` to `to`, expressed as a quaternion
/// with `w >= 0` (always takes the short path around the sphere).
pub fn shortest_rotation(from: Quaternion, to: Quaternion) -> Quaternion {
    let delta = to * from.inverse();
    if delta.w < 0.0 {
        Quaternion::from_xyzw(-delta.x, -delta.y, -delta.z, -delta.w)
    } else {
        delta
    }
}

/// Converts a world-space vector to `f32`, for callers (e.g. a renderer)
/// outside this crate's precision boundary.
pub fn to_f32_vec(v: Vector) -> [f32; 3] {
    [v.x as f32, v.y as f32, v.z as f32]
}

/// Converts a world-space quaternion to `f32`, for callers outside this
/// crate's precision boundary.
pub fn to_f32_quat(q: Quaternion) -> [f32; 4] {
    [q.x as f32, q.y as f32, q.z as f32, q.w as f32]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn invert_mat3_roundtrip() {
        let m = Mat3::from_diagonal(Vector::new(2.0, 4.0, 8.0));
        let inv = try_invert_mat3(m).expect("diagonal matrix is invertible");
        let identity = m * inv;
        assert_relative_eq!(identity, Mat3::IDENTITY, epsilon = 1e-9);
    }

    #[test]
    fn invert_mat3_singular_returns_none() {
        let m = Mat3::from_cols(Vector::X, Vector::X, Vector::Z);
        assert!(try_invert_mat3(m).is_none());
    }

    #[test]
    fn rotate_inertia_identity_is_noop() {
        let inertia = Mat3::from_diagonal(Vector::new(1.0, 2.0, 3.0));
        let rotated = rotate_inertia(inertia, Quaternion::IDENTITY);
        assert_relative_eq!(rotated, inertia, epsilon = 1e-9);
    }

    #[test]
    fn integrate_orientation_stays_normalized() {
        let q = integrate_orientation(Quaternion::IDENTITY, Vector::new(0.1, 0.2, 0.3), 1.0 / 60.0);
        assert_relative_eq!(q.length(), 1.0, epsilon = 1e-9);
    }
}

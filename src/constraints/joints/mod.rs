//! Hinge and spherical joints (§4.8), both assembled from the shared
//! positional/angular XPBD primitive in [`crate::constraints::xpbd_primitive`].

pub mod hinge;
pub mod spherical;

pub use hinge::{HingeJoint, HingeLimit};
pub use spherical::{SphericalJoint, SphericalLimit};

use crate::math::{Scalar, Vector};

/// Signed angle (radians) from `from` to `to`, both already projected into
/// the plane perpendicular to `axis`, measured about `axis` via `atan2`
/// (§4.8's wraparound policy: `atan2` rather than `acos`, so the sign and
/// full `[-pi, pi]` range come out for free).
pub(super) fn signed_angle_about_axis(axis: Vector, from: Vector, to: Vector) -> Scalar {
    let sin_theta = axis.dot(from.cross(to));
    let cos_theta = from.dot(to);
    sin_theta.atan2(cos_theta)
}

/// Projects `v` into the plane perpendicular to unit `axis`.
pub(super) fn project_onto_plane(axis: Vector, v: Vector) -> Vector {
    v - axis * axis.dot(v)
}

/// A corrective angular vector driving `angle` back into `[lower, upper]`,
/// or `None` if `angle` is already within the window (§4.8).
pub(super) fn limit_correction(axis: Vector, angle: Scalar, lower: Scalar, upper: Scalar) -> Option<Vector> {
    if angle < lower {
        Some(axis * (lower - angle))
    } else if angle > upper {
        Some(axis * (upper - angle))
    } else {
        None
    }
}

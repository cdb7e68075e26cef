//! Spherical joint: anchor positional constraint plus two independent
//! swing/twist angular limits (§4.8).

use crate::body::{Body, BodyId};
use crate::constraints::joints::{limit_correction, project_onto_plane, signed_angle_about_axis};
use crate::constraints::xpbd_primitive::{solve_angular, solve_positional};
use crate::math::{integrate_orientation, Scalar, Vector};

/// One angular window (either the swing or the twist limit), measured about
/// `axis1_local` (fixed in body1's frame) between `reference1_local` on
/// body1 and `reference2_local` on body2 (§4.8).
#[derive(Debug, Clone, Copy)]
pub struct SphericalLimit {
    pub axis1_local: Vector,
    pub reference1_local: Vector,
    pub reference2_local: Vector,
    pub lower: Scalar,
    pub upper: Scalar,
}

#[derive(Debug, Clone)]
pub struct SphericalJoint {
    pub body1: BodyId,
    pub body2: BodyId,
    pub r1_local: Vector,
    pub r2_local: Vector,
    pub swing: Option<SphericalLimit>,
    pub twist: Option<SphericalLimit>,
    pub compliance: Scalar,
    lambda_position: Scalar,
    lambda_swing: Scalar,
    lambda_twist: Scalar,
}

impl SphericalJoint {
    pub fn new(body1: BodyId, body2: BodyId, r1_local: Vector, r2_local: Vector, compliance: Scalar) -> Self {
        SphericalJoint {
            body1,
            body2,
            r1_local,
            r2_local,
            swing: None,
            twist: None,
            compliance,
            lambda_position: 0.0,
            lambda_swing: 0.0,
            lambda_twist: 0.0,
        }
    }

    pub fn with_swing_limit(mut self, limit: SphericalLimit) -> Self {
        self.swing = Some(limit);
        self
    }

    pub fn with_twist_limit(mut self, limit: SphericalLimit) -> Self {
        self.twist = Some(limit);
        self
    }

    /// Clears the persistent λ accumulators; called at the start of every
    /// substep (§3) so a compliant joint's `−α̃·λ` term doesn't carry stale
    /// state across substeps.
    pub(crate) fn reset_lambda(&mut self) {
        self.lambda_position = 0.0;
        self.lambda_swing = 0.0;
        self.lambda_twist = 0.0;
    }

    fn solve_limit(limit: &SphericalLimit, body1: &mut Body, body2: &mut Body, lambda: &mut Scalar, compliance: Scalar, h: Scalar) {
        let axis = (body1.orientation * limit.axis1_local).normalize();
        let ref1 = project_onto_plane(axis, body1.orientation * limit.reference1_local).normalize_or_zero();
        let ref2 = project_onto_plane(axis, body2.orientation * limit.reference2_local).normalize_or_zero();
        if ref1 == Vector::ZERO || ref2 == Vector::ZERO {
            return;
        }
        let angle = signed_angle_about_axis(axis, ref1, ref2);
        let Some(delta_q) = limit_correction(axis, angle, limit.lower, limit.upper) else {
            return;
        };
        if let Some(correction) = solve_angular(
            body1.world_inverse_inertia(),
            body2.world_inverse_inertia(),
            delta_q,
            compliance,
            lambda,
            h,
        ) {
            body1.orientation = integrate_orientation(body1.orientation, correction.delta_rotation1, 1.0);
            body2.orientation = integrate_orientation(body2.orientation, correction.delta_rotation2, 1.0);
        }
    }

    pub(crate) fn solve(&mut self, body1: &mut Body, body2: &mut Body, h: Scalar) {
        let r1_world = body1.orientation * self.r1_local;
        let r2_world = body2.orientation * self.r2_local;
        let delta_x = (body1.position + r1_world) - (body2.position + r2_world);
        if let Some(correction) = solve_positional(
            body1.inverse_mass,
            body2.inverse_mass,
            body1.world_inverse_inertia(),
            body2.world_inverse_inertia(),
            r1_world,
            r2_world,
            delta_x,
            self.compliance,
            &mut self.lambda_position,
            h,
        ) {
            body1.position += correction.delta_position1;
            body2.position += correction.delta_position2;
            body1.orientation = integrate_orientation(body1.orientation, correction.delta_rotation1, 1.0);
            body2.orientation = integrate_orientation(body2.orientation, correction.delta_rotation2, 1.0);
        }

        if let Some(limit) = self.swing {
            Self::solve_limit(&limit, body1, body2, &mut self.lambda_swing, self.compliance, h);
        }
        if let Some(limit) = self.twist {
            Self::solve_limit(&limit, body1, body2, &mut self.lambda_twist, self.compliance, h);
        }
    }
}

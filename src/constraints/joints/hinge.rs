//! Hinge joint: a coincident-anchor positional constraint plus a hinge-axis
//! alignment angular constraint, plus an optional angular limit (§4.8).

use crate::body::{Body, BodyId};
use crate::constraints::joints::{limit_correction, project_onto_plane, signed_angle_about_axis};
use crate::constraints::xpbd_primitive::{solve_angular, solve_positional};
use crate::math::{integrate_orientation, Scalar, Vector};

/// The hinge's secondary-axis angular window (§4.8), in radians.
#[derive(Debug, Clone, Copy)]
pub struct HingeLimit {
    pub limit_axis1_local: Vector,
    pub limit_axis2_local: Vector,
    pub lower: Scalar,
    pub upper: Scalar,
}

#[derive(Debug, Clone)]
pub struct HingeJoint {
    pub body1: BodyId,
    pub body2: BodyId,
    pub r1_local: Vector,
    pub r2_local: Vector,
    pub aligned_axis1_local: Vector,
    pub aligned_axis2_local: Vector,
    pub limit: Option<HingeLimit>,
    pub compliance: Scalar,
    lambda_position: Scalar,
    lambda_align: Scalar,
    lambda_limit: Scalar,
}

impl HingeJoint {
    pub fn new(
        body1: BodyId,
        body2: BodyId,
        r1_local: Vector,
        r2_local: Vector,
        aligned_axis1_local: Vector,
        aligned_axis2_local: Vector,
        compliance: Scalar,
    ) -> Self {
        HingeJoint {
            body1,
            body2,
            r1_local,
            r2_local,
            aligned_axis1_local,
            aligned_axis2_local,
            limit: None,
            compliance,
            lambda_position: 0.0,
            lambda_align: 0.0,
            lambda_limit: 0.0,
        }
    }

    pub fn with_limit(mut self, limit: HingeLimit) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Clears the persistent λ accumulators; called at the start of every
    /// substep (§3) so a compliant joint's `−α̃·λ` term doesn't carry stale
    /// state across substeps.
    pub(crate) fn reset_lambda(&mut self) {
        self.lambda_position = 0.0;
        self.lambda_align = 0.0;
        self.lambda_limit = 0.0;
    }

    pub(crate) fn solve(&mut self, body1: &mut Body, body2: &mut Body, h: Scalar) {
        // 1. coincident anchor points.
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

        // 2. hinge-axis alignment: delta_q = a1 x a2.
        let axis1_world = (body1.orientation * self.aligned_axis1_local).normalize();
        let axis2_world = (body2.orientation * self.aligned_axis2_local).normalize();
        let delta_q = axis1_world.cross(axis2_world);
        if let Some(correction) = solve_angular(
            body1.world_inverse_inertia(),
            body2.world_inverse_inertia(),
            delta_q,
            self.compliance,
            &mut self.lambda_align,
            h,
        ) {
            body1.orientation = integrate_orientation(body1.orientation, correction.delta_rotation1, 1.0);
            body2.orientation = integrate_orientation(body2.orientation, correction.delta_rotation2, 1.0);
        }

        // 3. optional secondary-axis angular limit.
        if let Some(limit) = self.limit {
            let axis = (body1.orientation * self.aligned_axis1_local).normalize();
            let ref1 = project_onto_plane(axis, body1.orientation * limit.limit_axis1_local).normalize_or_zero();
            let ref2 = project_onto_plane(axis, body2.orientation * limit.limit_axis2_local).normalize_or_zero();
            if ref1 != Vector::ZERO && ref2 != Vector::ZERO {
                let angle = signed_angle_about_axis(axis, ref1, ref2);
                if let Some(delta_q) = limit_correction(axis, angle, limit.lower, limit.upper) {
                    if let Some(correction) = solve_angular(
                        body1.world_inverse_inertia(),
                        body2.world_inverse_inertia(),
                        delta_q,
                        self.compliance,
                        &mut self.lambda_limit,
                        h,
                    ) {
                        body1.orientation = integrate_orientation(body1.orientation, correction.delta_rotation1, 1.0);
                        body2.orientation = integrate_orientation(body2.orientation, correction.delta_rotation2, 1.0);
                    }
                }
            }
        }
    }
}

//! The constraint kit (§3, §4.7g/h, §4.8): positional, angular, collision,
//! and the two joint kinds, all driven by the shared primitive in
//! [`xpbd_primitive`].

pub mod joints;
pub mod xpbd_primitive;

use crate::body::{Body, BodyId};
use crate::math::{integrate_orientation, Scalar, Vector};

pub use joints::{HingeJoint, HingeLimit, SphericalJoint, SphericalLimit};

/// A generic positional constraint: `p1 - p2 = target_offset` (§3).
#[derive(Debug, Clone)]
pub struct PositionalConstraint {
    pub body1: BodyId,
    pub body2: BodyId,
    pub r1_local: Vector,
    pub r2_local: Vector,
    pub compliance: Scalar,
    pub target_offset: Vector,
    lambda: Scalar,
}

impl PositionalConstraint {
    pub fn new(body1: BodyId, body2: BodyId, r1_local: Vector, r2_local: Vector, compliance: Scalar) -> Self {
        PositionalConstraint {
            body1,
            body2,
            r1_local,
            r2_local,
            compliance,
            target_offset: Vector::ZERO,
            lambda: 0.0,
        }
    }

    pub fn with_target_offset(mut self, target_offset: Vector) -> Self {
        self.target_offset = target_offset;
        self
    }
}

/// A generic angular constraint aligning a local axis on each body (§3).
/// Hinge-axis alignment and spherical swing/twist limits are built from the
/// same primitive (see [`joints`]).
#[derive(Debug, Clone)]
pub struct AngularConstraint {
    pub body1: BodyId,
    pub body2: BodyId,
    pub axis1_local: Vector,
    pub axis2_local: Vector,
    pub compliance: Scalar,
    lambda: Scalar,
}

impl AngularConstraint {
    pub fn new(body1: BodyId, body2: BodyId, axis1_local: Vector, axis2_local: Vector, compliance: Scalar) -> Self {
        AngularConstraint {
            body1,
            body2,
            axis1_local,
            axis2_local,
            compliance,
            lambda: 0.0,
        }
    }
}

/// An ephemeral per-contact-point constraint, rebuilt every substep from
/// the narrow phase (§3, §4.7f/h).
#[derive(Debug, Clone)]
pub struct CollisionConstraint {
    pub body1: BodyId,
    pub body2: BodyId,
    pub r1_local: Vector,
    pub r2_local: Vector,
    pub normal: Vector,
    pub lambda_normal: Scalar,
    pub lambda_tangent: Scalar,
}

/// A tagged sum over every constraint kind the solver walks in a positional
/// iteration (§3).
pub enum Constraint {
    Positional(PositionalConstraint),
    Angular(AngularConstraint),
    Collision(CollisionConstraint),
    Hinge(HingeJoint),
    Spherical(SphericalJoint),
}

/// Resolves two distinct bodies by id into mutable references, panicking on
/// a self-pair (a constraint must relate two different bodies) — mirrors
/// the registry's `get_two_mut` helper in [`crate::world`].
pub(crate) fn two_mut<'a>(
    bodies: &'a mut [Option<Body>],
    index1: usize,
    index2: usize,
) -> (&'a mut Body, &'a mut Body) {
    assert_ne!(index1, index2, "a constraint cannot relate a body to itself");
    if index1 < index2 {
        let (left, right) = bodies.split_at_mut(index2);
        (left[index1].as_mut().unwrap(), right[0].as_mut().unwrap())
    } else {
        let (left, right) = bodies.split_at_mut(index1);
        (right[0].as_mut().unwrap(), left[index2].as_mut().unwrap())
    }
}

impl Constraint {
    /// Clears the persistent λ accumulator(s) of user constraints at the
    /// start of each substep (§3); collision constraints are rebuilt fresh
    /// every substep and so never need this.
    pub(crate) fn reset_lambda(&mut self) {
        match self {
            Constraint::Positional(c) => c.lambda = 0.0,
            Constraint::Angular(c) => c.lambda = 0.0,
            Constraint::Collision(_) => {}
            Constraint::Hinge(c) => c.reset_lambda(),
            Constraint::Spherical(c) => c.reset_lambda(),
        }
    }

    /// Resolves this constraint's body ids to dense indices, or `None` if
    /// either id is stale (the body was removed); the caller skips the
    /// constraint for this step when that happens.
    pub(crate) fn body_ids(&self) -> (BodyId, BodyId) {
        match self {
            Constraint::Positional(c) => (c.body1, c.body2),
            Constraint::Angular(c) => (c.body1, c.body2),
            Constraint::Collision(c) => (c.body1, c.body2),
            Constraint::Hinge(c) => (c.body1, c.body2),
            Constraint::Spherical(c) => (c.body1, c.body2),
        }
    }

    /// Applies this constraint once. `index_of` resolves a live `BodyId` to
    /// its dense storage index.
    pub(crate) fn solve(&mut self, bodies: &mut [Option<Body>], index_of: impl Fn(BodyId) -> Option<usize>, h: Scalar) {
        let (id1, id2) = self.body_ids();
        let (Some(i1), Some(i2)) = (index_of(id1), index_of(id2)) else {
            return;
        };
        let (body1, body2) = two_mut(bodies, i1, i2);

        match self {
            Constraint::Positional(c) => solve_positional_constraint(c, body1, body2, h),
            Constraint::Angular(c) => solve_angular_constraint(c, body1, body2, h),
            Constraint::Collision(c) => solve_collision_normal(c, body1, body2, h),
            Constraint::Hinge(c) => c.solve(body1, body2, h),
            Constraint::Spherical(c) => c.solve(body1, body2, h),
        }
    }
}

fn apply_position(body: &mut Body, delta: Vector) {
    body.position += delta;
}

fn apply_rotation(body: &mut Body, delta_rotation: Vector) {
    body.orientation = integrate_orientation(body.orientation, delta_rotation, 1.0);
}

fn solve_positional_constraint(c: &mut PositionalConstraint, body1: &mut Body, body2: &mut Body, h: Scalar) {
    let r1_world = body1.orientation * c.r1_local;
    let r2_world = body2.orientation * c.r2_local;
    let p1 = body1.position + r1_world;
    let p2 = body2.position + r2_world;
    let delta_x = p1 - p2 - c.target_offset;

    if let Some(correction) = xpbd_primitive::solve_positional(
        body1.inverse_mass,
        body2.inverse_mass,
        body1.world_inverse_inertia(),
        body2.world_inverse_inertia(),
        r1_world,
        r2_world,
        delta_x,
        c.compliance,
        &mut c.lambda,
        h,
    ) {
        apply_position(body1, correction.delta_position1);
        apply_position(body2, correction.delta_position2);
        apply_rotation(body1, correction.delta_rotation1);
        apply_rotation(body2, correction.delta_rotation2);
    }
}

fn solve_angular_constraint(c: &mut AngularConstraint, body1: &mut Body, body2: &mut Body, h: Scalar) {
    let axis1_world = body1.orientation * c.axis1_local;
    let axis2_world = body2.orientation * c.axis2_local;
    let delta_q = axis1_world.cross(axis2_world);

    if let Some(correction) = xpbd_primitive::solve_angular(
        body1.world_inverse_inertia(),
        body2.world_inverse_inertia(),
        delta_q,
        c.compliance,
        &mut c.lambda,
        h,
    ) {
        apply_rotation(body1, correction.delta_rotation1);
        apply_rotation(body2, correction.delta_rotation2);
    }
}

/// §4.7h(i)/(ii): the normal-penetration half of collision resolution.
/// Static friction (iii) runs separately, after every collision constraint's
/// normal pass has had a chance to run, from [`crate::solver`].
pub(crate) fn solve_collision_normal(c: &mut CollisionConstraint, body1: &mut Body, body2: &mut Body, h: Scalar) {
    let r1_world = body1.orientation * c.r1_local;
    let r2_world = body2.orientation * c.r2_local;
    let p1 = body1.position + r1_world;
    let p2 = body2.position + r2_world;
    let gap = (p1 - p2).dot(c.normal);
    if gap <= 0.0 {
        return; // no penetration
    }
    let delta_x = gap * c.normal;

    if let Some(correction) = xpbd_primitive::solve_positional(
        body1.inverse_mass,
        body2.inverse_mass,
        body1.world_inverse_inertia(),
        body2.world_inverse_inertia(),
        r1_world,
        r2_world,
        delta_x,
        0.0,
        &mut c.lambda_normal,
        h,
    ) {
        apply_position(body1, correction.delta_position1);
        apply_position(body2, correction.delta_position2);
        apply_rotation(body1, correction.delta_rotation1);
        apply_rotation(body2, correction.delta_rotation2);
    }
}

/// §4.7h(iii): static friction, applied after the normal correction using
/// the frame-to-frame tangential slip at the (now corrected) contact point.
pub(crate) fn solve_collision_static_friction(
    c: &mut CollisionConstraint,
    body1: &mut Body,
    body2: &mut Body,
    static_friction: Scalar,
    h: Scalar,
) {
    if static_friction <= 0.0 || c.lambda_tangent.abs() > static_friction * c.lambda_normal.abs() {
        return;
    }
    let r1_world = body1.orientation * c.r1_local;
    let r2_world = body2.orientation * c.r2_local;
    let p1 = body1.position + r1_world;
    let p2 = body2.position + r2_world;

    let r1_prev_world = body1.previous_orientation * c.r1_local;
    let r2_prev_world = body2.previous_orientation * c.r2_local;
    let p1_prev = body1.previous_position + r1_prev_world;
    let p2_prev = body2.previous_position + r2_prev_world;

    let slip = (p1 - p1_prev) - (p2 - p2_prev);
    let tangential_slip = slip - c.normal * slip.dot(c.normal);
    if tangential_slip.length_squared() <= 1e-50 {
        return;
    }

    if let Some(correction) = xpbd_primitive::solve_positional(
        body1.inverse_mass,
        body2.inverse_mass,
        body1.world_inverse_inertia(),
        body2.world_inverse_inertia(),
        r1_world,
        r2_world,
        tangential_slip,
        0.0,
        &mut c.lambda_tangent,
        h,
    ) {
        apply_position(body1, correction.delta_position1);
        apply_position(body2, correction.delta_position2);
        apply_rotation(body1, correction.delta_rotation1);
        apply_rotation(body2, correction.delta_rotation2);
    }
}

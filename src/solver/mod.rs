//! The XPBD driver: configuration, per-step diagnostics, and the pure
//! integration/velocity-solve helpers the [`crate::world::World::step`]
//! pipeline composes in the exact order given by §4.7/§5.
//!
//! Mirrors the teacher's `SolverConfig`/diagnostics-resource pattern without
//! requiring an ECS: `SolverConfig` is a plain value the caller owns, and
//! `step` returns a `StepDiagnostics` snapshot instead of writing into a
//! shared resource.

pub mod sleeping;

use crate::body::Body;
use crate::constraints::CollisionConstraint;
use crate::math::{rotate_inertia, shortest_rotation, Scalar, Vector};

/// Named tolerances and substep/iteration counts (§9: "named constants, not
/// inline literals").
#[derive(Debug, Clone, Copy)]
pub struct SolverConfig {
    /// `N_sub` (§4.7). Default 10.
    pub substep_count: u32,
    /// `N_it` (§4.7g). Default 1.
    pub position_iterations: u32,
    pub enable_sleeping: bool,
    pub enable_islands: bool,
    /// EPA's support/face convergence tolerance (§4.5, §9).
    pub epa_tolerance: Scalar,
    /// Edge-vs-face alignment tolerance for contact classification (§4.6, §9).
    pub edge_face_tolerance: Scalar,
    /// Broad-phase bounding-sphere margin `ε` (§4.7b).
    pub broad_phase_margin: Scalar,
    /// Below this relative slip, static friction is treated as satisfied (§4.7h).
    pub static_friction_slip_epsilon: Scalar,
    /// `‖v‖` sleep threshold (§4.9).
    pub linear_sleep_threshold: Scalar,
    /// `‖ω‖` sleep threshold (§4.9).
    pub angular_sleep_threshold: Scalar,
    /// Seconds a candidate island must stay below threshold before sleeping (§4.9).
    pub deactivation_time: Scalar,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            substep_count: 10,
            position_iterations: 1,
            enable_sleeping: true,
            enable_islands: true,
            epa_tolerance: 1e-4,
            edge_face_tolerance: 1e-4,
            broad_phase_margin: 0.1,
            static_friction_slip_epsilon: 1e-9,
            linear_sleep_threshold: 0.15,
            angular_sleep_threshold: 0.15,
            deactivation_time: 1.0,
        }
    }
}

/// Per-`step` observability snapshot, returned to the caller instead of
/// written into a shared diagnostics resource (no ECS here).
#[derive(Debug, Clone, Copy, Default)]
pub struct StepDiagnostics {
    pub substeps_run: u32,
    pub broad_phase_pairs: usize,
    pub contacts_generated: usize,
    pub islands: usize,
    pub constraints_solved: usize,
}

/// §4.7a: semi-implicit Euler prediction for one non-fixed, active body.
/// Snapshots `previous_*` before mutating.
pub fn integrate_body(body: &mut Body, external_force: Vector, external_torque: Vector, h: Scalar) {
    body.previous_position = body.position;
    body.previous_orientation = body.orientation;
    body.previous_linear_velocity = body.linear_velocity;
    body.previous_angular_velocity = body.angular_velocity;

    body.linear_velocity += h * body.inverse_mass * external_force;
    body.position += h * body.linear_velocity;

    let inertia_world = rotate_inertia(body.inertia_tensor, body.orientation);
    let inverse_inertia_world = rotate_inertia(body.inverse_inertia_tensor, body.orientation);
    let gyroscopic = body.angular_velocity.cross(inertia_world * body.angular_velocity);
    body.angular_velocity += h * inverse_inertia_world * (external_torque - gyroscopic);

    body.orientation = crate::math::integrate_orientation(body.orientation, body.angular_velocity, h);
}

/// §4.7i: derives post-step velocities from the position/orientation delta
/// produced by the positional solver.
pub fn derive_velocities(body: &mut Body, h: Scalar) {
    body.linear_velocity = (body.position - body.previous_position) / h;

    // shortest_rotation already picks the w >= 0 branch, so this is always
    // the short-path angular delta.
    let delta = shortest_rotation(body.previous_orientation, body.orientation);
    body.angular_velocity = Vector::new(delta.x, delta.y, delta.z) * (2.0 / h);
}

/// §4.7j: dynamic friction + restitution velocity post-solve for one
/// collision constraint. Uses the pre-integration velocities (captured on
/// `previous_linear_velocity`/`previous_angular_velocity`) for the
/// restitution term, per spec.
pub fn velocity_post_solve(c: &CollisionConstraint, body1: &mut Body, body2: &mut Body, config: &SolverConfig, h: Scalar) {
    let r1_world = body1.orientation * c.r1_local;
    let r2_world = body2.orientation * c.r2_local;

    let v_rel = (body1.linear_velocity + body1.angular_velocity.cross(r1_world))
        - (body2.linear_velocity + body2.angular_velocity.cross(r2_world));
    let vn = v_rel.dot(c.normal);
    let vt = v_rel - vn * c.normal;

    let mut delta_v = Vector::ZERO;

    let dynamic_friction = 0.5 * (body1.dynamic_friction + body2.dynamic_friction);
    let slip_speed = vt.length();
    if slip_speed > config.static_friction_slip_epsilon {
        let max_slip = (dynamic_friction * c.lambda_normal.abs() / h).min(slip_speed);
        delta_v -= max_slip * (vt / slip_speed);
    }

    let v_rel_pre = (body1.previous_linear_velocity + body1.previous_angular_velocity.cross(r1_world))
        - (body2.previous_linear_velocity + body2.previous_angular_velocity.cross(r2_world));
    let vn_pre = c.normal.dot(v_rel_pre);
    let restitution = body1.restitution * body2.restitution;
    let bounce = (-restitution * vn_pre).min(0.0);
    delta_v += (-vn + bounce) * c.normal;

    let rn1 = r1_world.cross(c.normal);
    let rn2 = r2_world.cross(c.normal);
    let inv_inertia1 = rotate_inertia(body1.inverse_inertia_tensor, body1.orientation);
    let inv_inertia2 = rotate_inertia(body2.inverse_inertia_tensor, body2.orientation);
    let w1 = body1.inverse_mass + rn1.dot(inv_inertia1 * rn1);
    let w2 = body2.inverse_mass + rn2.dot(inv_inertia2 * rn2);
    let denom = w1 + w2;
    if denom <= 1e-12 {
        return;
    }
    let impulse = delta_v / denom;

    body1.linear_velocity += body1.inverse_mass * impulse;
    body2.linear_velocity -= body2.inverse_mass * impulse;
    body1.angular_velocity += inv_inertia1 * r1_world.cross(impulse);
    body2.angular_velocity -= inv_inertia2 * r2_world.cross(impulse);
}

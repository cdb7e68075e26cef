//! The rigid body record (§3's **Body**) and its identity type.

use crate::collider::{default_inertia_tensor, Collider};
use crate::math::{rotate_inertia, try_invert_mat3, Mat3, Quaternion, Scalar, Vector};

/// Opaque stable identity for a body, unique for the registry's lifetime
/// (§3). Carries a generation counter so a stale id from a removed body is
/// never silently confused with a reused slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

/// A force or torque buffered for the next `step`, applied at `point`
/// (§3's `forces` list, §6's `apply_force`).
#[derive(Debug, Clone, Copy)]
pub struct AppliedForce {
    pub point: Vector,
    pub force: Vector,
    pub world_space: bool,
}

/// Per-island sleep state (§4.9). Stored on the body so a waking call or a
/// pose mutation can flip it directly; the island-level transition logic
/// lives in [`crate::solver::sleeping`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepState {
    Active,
    Candidate,
    Sleeping,
}

#[derive(Debug, Clone)]
pub struct Body {
    pub id: BodyId,

    pub position: Vector,
    pub orientation: Quaternion,
    pub linear_velocity: Vector,
    pub angular_velocity: Vector,

    pub mass: Scalar,
    pub inverse_mass: Scalar,
    pub inertia_tensor: Mat3,
    pub inverse_inertia_tensor: Mat3,

    pub static_friction: Scalar,
    pub dynamic_friction: Scalar,
    pub restitution: Scalar,

    pub fixed: bool,
    pub sleep_state: SleepState,
    pub deactivation_time: Scalar,

    pub colliders: Vec<Collider>,
    pub bounding_sphere_radius: Scalar,
    pub forces: Vec<AppliedForce>,

    pub previous_position: Vector,
    pub previous_orientation: Quaternion,
    pub previous_linear_velocity: Vector,
    pub previous_angular_velocity: Vector,
}

impl Body {
    /// Builds a dynamic body. `friction`/`restitution` are clamped into
    /// `[0,1]`; a `dynamic > static` friction is accepted with a warning
    /// (§7's `InvalidConfiguration`, soft invariant).
    pub fn new_dynamic(
        position: Vector,
        orientation: Quaternion,
        mass: Scalar,
        colliders: Vec<Collider>,
        static_friction: Scalar,
        dynamic_friction: Scalar,
        restitution: Scalar,
    ) -> Self {
        if dynamic_friction > static_friction {
            tracing::warn!(
                static_friction,
                dynamic_friction,
                "dynamic friction exceeds static friction; accepting per soft invariant"
            );
        }
        let inertia_tensor = default_inertia_tensor(&colliders, mass);
        let inverse_inertia_tensor = try_invert_mat3(inertia_tensor).unwrap_or(Mat3::ZERO);
        let bounding_sphere_radius = colliders
            .iter()
            .map(Collider::bounding_sphere_radius)
            .fold(0.0, Scalar::max);

        Body {
            id: BodyId { index: 0, generation: 0 },
            position,
            orientation,
            linear_velocity: Vector::ZERO,
            angular_velocity: Vector::ZERO,
            mass,
            inverse_mass: 1.0 / mass,
            inertia_tensor,
            inverse_inertia_tensor,
            static_friction: static_friction.clamp(0.0, 1.0),
            dynamic_friction: dynamic_friction.clamp(0.0, 1.0),
            restitution: restitution.clamp(0.0, 1.0),
            fixed: false,
            sleep_state: SleepState::Active,
            deactivation_time: 0.0,
            colliders,
            bounding_sphere_radius,
            forces: Vec::new(),
            previous_position: position,
            previous_orientation: orientation,
            previous_linear_velocity: Vector::ZERO,
            previous_angular_velocity: Vector::ZERO,
        }
    }

    /// Builds a world-pinned body: infinite effective mass, zero (inverse)
    /// inertia (§3's `fixed` invariant).
    pub fn new_fixed(position: Vector, orientation: Quaternion, colliders: Vec<Collider>) -> Self {
        let bounding_sphere_radius = colliders
            .iter()
            .map(Collider::bounding_sphere_radius)
            .fold(0.0, Scalar::max);
        Body {
            id: BodyId { index: 0, generation: 0 },
            position,
            orientation,
            linear_velocity: Vector::ZERO,
            angular_velocity: Vector::ZERO,
            mass: 0.0,
            inverse_mass: 0.0,
            inertia_tensor: Mat3::ZERO,
            inverse_inertia_tensor: Mat3::ZERO,
            static_friction: 0.5,
            dynamic_friction: 0.5,
            restitution: 0.0,
            fixed: true,
            sleep_state: SleepState::Active,
            deactivation_time: 0.0,
            colliders,
            bounding_sphere_radius,
            forces: Vec::new(),
            previous_position: position,
            previous_orientation: orientation,
            previous_linear_velocity: Vector::ZERO,
            previous_angular_velocity: Vector::ZERO,
        }
    }

    /// `I(q) = R(q) I_body R(q)ᵀ` (§4.1, §4.7a).
    pub fn world_inertia(&self) -> Mat3 {
        rotate_inertia(self.inertia_tensor, self.orientation)
    }

    /// `I⁻¹(q) = R(q) I_body⁻¹ R(q)ᵀ`.
    pub fn world_inverse_inertia(&self) -> Mat3 {
        rotate_inertia(self.inverse_inertia_tensor, self.orientation)
    }

    pub fn is_active(&self) -> bool {
        matches!(self.sleep_state, SleepState::Active)
    }

    /// Wakes the body and resets its deactivation accumulator (§4.9).
    pub fn wake(&mut self) {
        self.sleep_state = SleepState::Active;
        self.deactivation_time = 0.0;
    }

    pub fn refresh_collider_world_cache(&mut self) {
        for collider in &mut self.colliders {
            collider.update_world_cache(self.position, self.orientation);
        }
    }
}

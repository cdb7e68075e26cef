//! The shared XPBD delta-lambda primitive (§4.7g), factored once and reused
//! by every constraint kind — generic positional, collision normal/friction,
//! and both joint types — instead of duplicating the formula per constraint
//! (see DESIGN.md's supplement entry).

use crate::math::{Mat3, Scalar, Vector};

/// Below this magnitude a constraint's error is treated as already
/// satisfied and skipped, per §4.7g / §9's named-constant requirement.
const DELTA_EPSILON: Scalar = 1e-50;

/// World-space corrections to apply to the two related bodies.
pub struct PositionalCorrection {
    pub delta_position1: Vector,
    pub delta_position2: Vector,
    /// Corrective rotation vector (axis * angle) for body 1, consumed by
    /// [`crate::math::integrate_orientation`] with `dt = 1.0`.
    pub delta_rotation1: Vector,
    pub delta_rotation2: Vector,
}

pub struct AngularCorrection {
    pub delta_rotation1: Vector,
    pub delta_rotation2: Vector,
}

/// `∆λ = (−c − α̃·λ) / (w1 + w2 + α̃)`, `α̃ = α / h²`, applied to a positional
/// error `delta_x` with lever arms `r1`/`r2` (world space, relative to each
/// body's center of mass). Returns `None` if `|delta_x|` is below
/// [`DELTA_EPSILON`] or the denominator is degenerate.
#[allow(clippy::too_many_arguments)]
pub fn solve_positional(
    inv_mass1: Scalar,
    inv_mass2: Scalar,
    inv_inertia1: Mat3,
    inv_inertia2: Mat3,
    r1: Vector,
    r2: Vector,
    delta_x: Vector,
    compliance: Scalar,
    lambda: &mut Scalar,
    h: Scalar,
) -> Option<PositionalCorrection> {
    let c = delta_x.length();
    if c <= DELTA_EPSILON {
        return None;
    }
    let n = delta_x / c;
    let rn1 = r1.cross(n);
    let rn2 = r2.cross(n);
    let w1 = inv_mass1 + rn1.dot(inv_inertia1 * rn1);
    let w2 = inv_mass2 + rn2.dot(inv_inertia2 * rn2);
    let alpha_tilde = compliance / (h * h);
    let denom = w1 + w2 + alpha_tilde;
    if denom.abs() <= DELTA_EPSILON {
        return None;
    }

    let delta_lambda = (-c - alpha_tilde * *lambda) / denom;
    *lambda += delta_lambda;
    let impulse = delta_lambda * n;

    Some(PositionalCorrection {
        delta_position1: inv_mass1 * impulse,
        delta_position2: -inv_mass2 * impulse,
        delta_rotation1: inv_inertia1 * r1.cross(impulse),
        delta_rotation2: -(inv_inertia2 * r2.cross(impulse)),
    })
}

/// Same formula, driven by an angular error `delta_q` (axis * angle) with
/// no lever arm: `w_i = nᵀ I_i⁻¹ n` (§4.7g).
pub fn solve_angular(
    inv_inertia1: Mat3,
    inv_inertia2: Mat3,
    delta_q: Vector,
    compliance: Scalar,
    lambda: &mut Scalar,
    h: Scalar,
) -> Option<AngularCorrection> {
    let theta = delta_q.length();
    if theta <= DELTA_EPSILON {
        return None;
    }
    let n = delta_q / theta;
    let w1 = n.dot(inv_inertia1 * n);
    let w2 = n.dot(inv_inertia2 * n);
    let alpha_tilde = compliance / (h * h);
    let denom = w1 + w2 + alpha_tilde;
    if denom.abs() <= DELTA_EPSILON {
        return None;
    }

    let delta_lambda = (-theta - alpha_tilde * *lambda) / denom;
    *lambda += delta_lambda;
    let impulse = delta_lambda * n;

    Some(AngularCorrection {
        delta_rotation1: inv_inertia1 * impulse,
        delta_rotation2: -(inv_inertia2 * impulse),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn positional_constraint_converges_in_one_hard_iteration() {
        // Two unit-mass, unit-inertia bodies with a zero-compliance
        // constraint should fully close a positional error in one apply
        // when w1+w2 is well-conditioned, per §8's round-trip property.
        let mut lambda = 0.0;
        let correction = solve_positional(
            1.0,
            1.0,
            Mat3::IDENTITY,
            Mat3::IDENTITY,
            Vector::ZERO,
            Vector::ZERO,
            Vector::new(1.0, 0.0, 0.0),
            0.0,
            &mut lambda,
            1.0,
        )
        .unwrap();
        let total_correction = correction.delta_position1 - correction.delta_position2;
        assert_relative_eq!(total_correction.length(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn below_epsilon_delta_is_skipped() {
        let mut lambda = 0.0;
        let result = solve_positional(
            1.0,
            1.0,
            Mat3::IDENTITY,
            Mat3::IDENTITY,
            Vector::ZERO,
            Vector::ZERO,
            Vector::ZERO,
            0.0,
            &mut lambda,
            1.0,
        );
        assert!(result.is_none());
    }
}

//! Support mapping on a single collider and on the Minkowski difference of
//! two colliders (§4.3).

use crate::collider::Collider;
use crate::math::Vector;

/// `support₁(d) − support₂(−d)`, the support point of the Minkowski
/// difference of two world-posed colliders, plus each side's contributing
/// vertex index (used downstream by clipping to reuse hull adjacency).
pub fn support_minkowski_diff(
    a: &Collider,
    b: &Collider,
    direction: Vector,
) -> (Vector, Option<usize>, Option<usize>) {
    let (pa, ia) = a.support(direction);
    let (pb, ib) = b.support(-direction);
    (pa - pb, ia, ib)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minkowski_support_of_separated_spheres() {
        let a = Collider::sphere(Vector::new(-5.0, 0.0, 0.0), 1.0);
        let b = Collider::sphere(Vector::new(5.0, 0.0, 0.0), 1.0);
        let (p, _, _) = support_minkowski_diff(&a, &b, Vector::X);
        // support_a(+x) - support_b(-x) = (-4,0,0) - (4,0,0) = (-8,0,0)
        assert!((p - Vector::new(-8.0, 0.0, 0.0)).length() < 1e-9);
    }
}

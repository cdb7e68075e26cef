//! GJK intersection test on the Minkowski difference of two colliders (§4.4).
//!
//! The simplex-reduction cases below decompose the same Voronoi regions the
//! original C implementation's bitmask-based tetrahedron case does; this
//! version recurses into the lower-dimensional case instead of encoding the
//! region as a 3-bit mask, which is mathematically equivalent and reads more
//! directly in Rust.

use crate::collider::Collider;
use crate::collision::support::support_minkowski_diff;
use crate::math::Vector;

/// Hard iteration cap from §4.4. Identical on every platform so that
/// identical inputs produce identical contact sequences.
const MAX_ITERATIONS: u32 = 100;

fn same_direction(direction: Vector, ao: Vector) -> bool {
    direction.dot(ao) > 0.0
}

fn triple_cross(a: Vector, b: Vector, c: Vector) -> Vector {
    a.cross(b).cross(c)
}

enum SimplexState {
    Continue,
    OriginEnclosed,
}

fn do_line(points: &mut Vec<Vector>, direction: &mut Vector) -> SimplexState {
    let a = points[1];
    let b = points[0];
    let ab = b - a;
    let ao = -a;
    if same_direction(ab, ao) {
        *direction = triple_cross(ab, ao, ab);
    } else {
        *points = vec![a];
        *direction = ao;
    }
    SimplexState::Continue
}

fn do_triangle(points: &mut Vec<Vector>, direction: &mut Vector) -> SimplexState {
    let a = points[2];
    let b = points[1];
    let c = points[0];
    let ab = b - a;
    let ac = c - a;
    let ao = -a;
    let abc = ab.cross(ac);

    if same_direction(abc.cross(ac), ao) {
        if same_direction(ac, ao) {
            *points = vec![c, a];
            do_line(points, direction)
        } else {
            *points = vec![b, a];
            do_line(points, direction)
        }
    } else if same_direction(ab.cross(abc), ao) {
        *points = vec![b, a];
        do_line(points, direction)
    } else if same_direction(abc, ao) {
        *points = vec![c, b, a];
        *direction = abc;
        SimplexState::Continue
    } else {
        *points = vec![b, c, a];
        *direction = -abc;
        SimplexState::Continue
    }
}

fn do_tetrahedron(points: &mut Vec<Vector>, direction: &mut Vector) -> SimplexState {
    let a = points[3];
    let b = points[2];
    let c = points[1];
    let d = points[0];
    let ab = b - a;
    let ac = c - a;
    let ad = d - a;
    let ao = -a;

    let abc = ab.cross(ac);
    let acd = ac.cross(ad);
    let adb = ad.cross(ab);

    if same_direction(abc, ao) {
        *points = vec![c, b, a];
        return do_triangle(points, direction);
    }
    if same_direction(acd, ao) {
        *points = vec![d, c, a];
        return do_triangle(points, direction);
    }
    if same_direction(adb, ao) {
        *points = vec![b, d, a];
        return do_triangle(points, direction);
    }
    SimplexState::OriginEnclosed
}

fn do_simplex(points: &mut Vec<Vector>, direction: &mut Vector) -> SimplexState {
    match points.len() {
        2 => do_line(points, direction),
        3 => do_triangle(points, direction),
        4 => do_tetrahedron(points, direction),
        _ => unreachable!("simplex size is always 2..=4 when do_simplex runs"),
    }
}

/// Runs GJK on the Minkowski difference of `a` and `b`. On intersection,
/// returns the terminal tetrahedron simplex `[A, B, C, D]` (in the order
/// EPA's `polytope_from_gjk_simplex` expects) that encloses the origin.
/// Returns `None` on no intersection or on failure to converge within
/// [`MAX_ITERATIONS`] (logged).
pub fn gjk_intersect(a: &Collider, b: &Collider) -> Option<[Vector; 4]> {
    let support = |d: Vector| support_minkowski_diff(a, b, d).0;

    let mut direction = Vector::Z;
    let mut points = vec![support(direction)];
    direction = -points[0];

    for _ in 0..MAX_ITERATIONS {
        let p = support(direction);
        if p.dot(direction) < 0.0 {
            return None;
        }
        points.push(p);
        if points.len() >= 2 {
            if let SimplexState::OriginEnclosed = do_simplex(&mut points, &mut direction) {
                let mut tetrahedron = [Vector::ZERO; 4];
                tetrahedron.copy_from_slice(&points[..4]);
                return Some(tetrahedron);
            }
        }
    }
    tracing::warn!(iterations = MAX_ITERATIONS, "GJK failed to converge");
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separated_spheres_do_not_intersect() {
        let a = Collider::sphere(Vector::new(-5.0, 0.0, 0.0), 1.0);
        let b = Collider::sphere(Vector::new(5.0, 0.0, 0.0), 1.0);
        assert!(gjk_intersect(&a, &b).is_none());
    }

    #[test]
    fn overlapping_spheres_intersect() {
        let a = Collider::sphere(Vector::new(-0.5, 0.0, 0.0), 1.0);
        let b = Collider::sphere(Vector::new(0.5, 0.0, 0.0), 1.0);
        assert!(gjk_intersect(&a, &b).is_some());
    }

    #[test]
    fn barely_separated_spheres_do_not_intersect() {
        // Just outside tangency; §8 requires the strict-inequality boundary
        // case (exact tangency) to report no contact, which this approaches
        // without depending on exact floating-point tie-breaking.
        let a = Collider::sphere(Vector::new(-1.0001, 0.0, 0.0), 1.0);
        let b = Collider::sphere(Vector::new(1.0001, 0.0, 0.0), 1.0);
        assert!(gjk_intersect(&a, &b).is_none());
    }
}

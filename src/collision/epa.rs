//! Expanding Polytope Algorithm: penetration depth and normal recovery from
//! a GJK tetrahedron (§4.5).

use crate::collider::Collider;
use crate::collision::support::support_minkowski_diff;
use crate::math::{Scalar, Vector};

/// Face/support convergence tolerance (§4.5, §9 — named, not inlined).
const EPA_TOLERANCE: Scalar = 1e-4;
/// Hard iteration cap (§4.5).
const MAX_ITERATIONS: u32 = 100;
/// Below this, a face's plane is treated as passing through the origin and
/// its normal orientation is resolved by inspecting another polytope vertex
/// instead of the plane-distance sign.
const PLANE_THROUGH_ORIGIN_EPSILON: Scalar = 1e-9;

/// A polytope face's outward unit normal and its (non-negative) distance
/// from the origin along that normal, resolving the degenerate
/// origin-on-plane case per §4.5.
fn face_normal_and_distance(vertices: &[Vector], face: [usize; 3], all_vertices: &[Vector]) -> (Vector, Scalar) {
    let v0 = vertices[face[0]];
    let v1 = vertices[face[1]];
    let v2 = vertices[face[2]];
    let mut normal = (v1 - v0).cross(v2 - v0).normalize();
    let mut distance = normal.dot(v0);

    if distance.abs() < PLANE_THROUGH_ORIGIN_EPSILON {
        for (idx, candidate) in all_vertices.iter().enumerate() {
            if idx == face[0] || idx == face[1] || idx == face[2] {
                continue;
            }
            let side = normal.dot(*candidate - v0);
            if side.abs() > PLANE_THROUGH_ORIGIN_EPSILON {
                if side > 0.0 {
                    normal = -normal;
                    distance = -distance;
                }
                break;
            }
        }
    } else if distance < 0.0 {
        normal = -normal;
        distance = -distance;
    }
    (normal, distance)
}

/// XOR-style boundary-edge collection: an edge shared by two removed faces
/// cancels out, leaving only the edges bordering the hole.
fn add_edge(edges: &mut Vec<(usize, usize)>, a: usize, b: usize) {
    if let Some(pos) = edges.iter().position(|&(x, y)| x == b && y == a) {
        edges.remove(pos);
    } else {
        edges.push((a, b));
    }
}

/// Runs EPA starting from the GJK tetrahedron. Returns `(normal, depth)` on
/// convergence, or `None` if EPA fails to converge within
/// [`MAX_ITERATIONS`] (logged; the caller skips contact generation for this
/// pair this substep, per §4.5/§7).
pub fn epa(a: &Collider, b: &Collider, simplex: [Vector; 4]) -> Option<(Vector, Scalar)> {
    let mut vertices: Vec<Vector> = Vec::with_capacity(128);
    vertices.extend_from_slice(&simplex);
    let mut faces: Vec<[usize; 3]> = Vec::with_capacity(128);
    faces.extend_from_slice(&[[0, 1, 2], [0, 2, 3], [0, 3, 1], [1, 2, 3]]);

    for _ in 0..MAX_ITERATIONS {
        let mut min_face = 0;
        let mut min_normal = Vector::ZERO;
        let mut min_distance = Scalar::MAX;
        for (fi, &face) in faces.iter().enumerate() {
            let (normal, distance) = face_normal_and_distance(&vertices, face, &vertices);
            if distance < min_distance {
                min_distance = distance;
                min_normal = normal;
                min_face = fi;
            }
        }
        let _ = min_face;

        let support = support_minkowski_diff(a, b, min_normal).0;
        let support_distance = support.dot(min_normal);

        if (support_distance - min_distance).abs() < EPA_TOLERANCE {
            return Some((min_normal, min_distance));
        }

        let new_index = vertices.len();
        vertices.push(support);

        let mut edges: Vec<(usize, usize)> = Vec::with_capacity(1024);
        let mut kept_faces = Vec::with_capacity(faces.len());
        for &face in &faces {
            let (normal, _) = face_normal_and_distance(&vertices, face, &vertices);
            let centroid = (vertices[face[0]] + vertices[face[1]] + vertices[face[2]]) / 3.0;
            if normal.dot(support - centroid) > 0.0 {
                add_edge(&mut edges, face[0], face[1]);
                add_edge(&mut edges, face[1], face[2]);
                add_edge(&mut edges, face[2], face[0]);
            } else {
                kept_faces.push(face);
            }
        }
        for (ea, eb) in edges {
            kept_faces.push([ea, eb, new_index]);
        }
        faces = kept_faces;
    }

    tracing::warn!(iterations = MAX_ITERATIONS, "EPA failed to converge");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::gjk::gjk_intersect;
    use approx::assert_relative_eq;

    #[test]
    fn overlapping_spheres_report_penetration_depth() {
        let a = Collider::sphere(Vector::new(-0.5, 0.0, 0.0), 1.0);
        let b = Collider::sphere(Vector::new(0.5, 0.0, 0.0), 1.0);
        let simplex = gjk_intersect(&a, &b).expect("spheres overlap");
        let (normal, depth) = epa(&a, &b, simplex).expect("EPA should converge");
        assert_relative_eq!(depth, 1.0, epsilon = 1e-3);
        assert!(normal.length() > 0.0);
    }
}

//! Contact-manifold generation (§4.6): sphere shortcuts, and convex/convex
//! reference-face clipping or edge-edge closest points.

use crate::collider::{Collider, ConvexHullData};
use crate::collision::epa::epa;
use crate::collision::gjk::gjk_intersect;
use crate::math::{Scalar, Vector};

/// Alignment margin by which the best edge pair must beat both face
/// alignments for a contact to be classified edge-edge (§4.6 step 3, §9).
const EDGE_FACE_TOLERANCE: Scalar = 1e-4;
/// Guard against division by a near-zero edge direction when intersecting
/// a clip plane (§4.6, clipping.cpp's `plane_edge_intersection`).
const PLANE_EDGE_EPSILON: Scalar = 1e-6;

/// One contact point pair, consistent with the EPA normal and penetration
/// (§4.6). `normal` points from `a`'s side of the contact toward `b`'s.
#[derive(Debug, Clone, Copy)]
pub struct Contact {
    pub point_a: Vector,
    pub point_b: Vector,
    pub normal: Vector,
    pub penetration: Scalar,
}

struct Plane {
    normal: Vector,
    point: Vector,
}

fn is_inside(plane: &Plane, p: Vector) -> bool {
    plane.normal.dot(p - plane.point) <= 0.0
}

fn plane_edge_intersection(plane: &Plane, a: Vector, b: Vector) -> Vector {
    let denom = plane.normal.dot(b - a);
    if denom.abs() < PLANE_EDGE_EPSILON {
        return a;
    }
    let t = (plane.normal.dot(plane.point - a) / denom).clamp(0.0, 1.0);
    a + t * (b - a)
}

/// Clips `polygon` against each half-plane in `planes` in turn, ping-ponging
/// the input/output vertex lists.
fn sutherland_hodgman(polygon: Vec<Vector>, planes: &[Plane]) -> Vec<Vector> {
    let mut output = polygon;
    for plane in planes {
        if output.is_empty() {
            break;
        }
        let input = output;
        output = Vec::with_capacity(input.len() + 1);
        for i in 0..input.len() {
            let current = input[i];
            let prev = input[(i + input.len() - 1) % input.len()];
            let current_inside = is_inside(plane, current);
            let prev_inside = is_inside(plane, prev);
            if current_inside {
                if !prev_inside {
                    output.push(plane_edge_intersection(plane, prev, current));
                }
                output.push(current);
            } else if prev_inside {
                output.push(plane_edge_intersection(plane, prev, current));
            }
        }
    }
    output
}

/// Closest points on two skew lines `p1 + s*d1` and `p2 + t*d2`, solving the
/// 2x2 normal-equations system (§4.6 step 3).
fn closest_points_on_skew_lines(p1: Vector, d1: Vector, p2: Vector, d2: Vector) -> (Vector, Vector) {
    let r = p1 - p2;
    let a = d1.dot(d1);
    let e = d2.dot(d2);
    let f = d2.dot(r);
    let b = d1.dot(d2);
    let c = d1.dot(r);
    let denom = a * e - b * b;
    if denom.abs() < 1e-12 {
        return (p1, p2);
    }
    let s = (b * f - c * e) / denom;
    let t = (a * f - b * c) / denom;
    (p1 + d1 * s, p2 + d2 * t)
}

fn sphere_sphere(c1: Vector, r1: Scalar, c2: Vector, r2: Scalar) -> Vec<Contact> {
    let delta = c2 - c1;
    let dist_sq = delta.length_squared();
    let radius_sum = r1 + r2;
    if dist_sq < radius_sum * radius_sum {
        let dist = dist_sq.sqrt();
        let normal = if dist > 1e-12 { delta / dist } else { Vector::Y };
        vec![Contact {
            point_a: c1 + r1 * normal,
            point_b: c2 - r2 * normal,
            normal,
            penetration: radius_sum - dist,
        }]
    } else {
        Vec::new()
    }
}

/// Sphere vs. convex hull: the sphere's "face" is its single support point
/// (§4.6). `sphere_is_a` controls the orientation of the returned contact
/// relative to the caller's (a, b) argument order.
fn sphere_convex(sphere_center: Vector, radius: Scalar, hull: &Collider, sphere_is_a: bool) -> Vec<Contact> {
    let sphere = Collider::sphere(sphere_center, radius);
    let (sphere_first, hull_second): (&Collider, &Collider) = if sphere_is_a {
        (&sphere, hull)
    } else {
        (hull, &sphere)
    };
    let Some(simplex) = gjk_intersect(sphere_first, hull_second) else {
        return Vec::new();
    };
    let Some((normal, penetration)) = epa(sphere_first, hull_second, simplex) else {
        return Vec::new();
    };

    // `normal` points from `sphere_first` toward `hull_second`.
    let sphere_to_hull_normal = if sphere_is_a { normal } else { -normal };
    let p_sphere = sphere_center + radius * sphere_to_hull_normal;
    let p_hull = p_sphere - penetration * sphere_to_hull_normal;

    let (point_a, point_b) = if sphere_is_a {
        (p_sphere, p_hull)
    } else {
        (p_hull, p_sphere)
    };
    vec![Contact {
        point_a,
        point_b,
        normal: sphere_to_hull_normal,
        penetration,
    }]
}

/// Picks the face adjacent to `support_index` whose transformed normal is
/// most parallel to `target_direction`.
fn incident_face(hull: &ConvexHullData, support_index: usize, target_direction: Vector) -> usize {
    hull.vertex_to_faces[support_index]
        .iter()
        .copied()
        .max_by(|&fa, &fb| {
            let da = hull.faces[fa].transformed_normal.dot(target_direction);
            let db = hull.faces[fb].transformed_normal.dot(target_direction);
            da.partial_cmp(&db).unwrap()
        })
        .expect("support vertex always borders at least one face")
}

struct EdgePair {
    point_a: Vector,
    dir_a: Vector,
    point_b: Vector,
    dir_b: Vector,
    alignment: Scalar,
}

/// Best neighbor-edge pair (one edge per hull, both touching their
/// respective support vertex) whose cross product best aligns with `n` or
/// `-n` (§4.6 step 2).
fn best_edge_pair(
    hull_a: &ConvexHullData,
    support_a: usize,
    hull_b: &ConvexHullData,
    support_b: usize,
    n: Vector,
) -> Option<EdgePair> {
    let mut best: Option<EdgePair> = None;
    for &na in &hull_a.vertex_to_neighbors[support_a] {
        let dir_a = hull_a.transformed_vertices[na] - hull_a.transformed_vertices[support_a];
        for &nb in &hull_b.vertex_to_neighbors[support_b] {
            let dir_b = hull_b.transformed_vertices[nb] - hull_b.transformed_vertices[support_b];
            let cross = dir_a.cross(dir_b);
            if cross.length_squared() < 1e-12 {
                continue;
            }
            let cross_n = cross.normalize();
            let mut alignment = cross_n.dot(n);
            if alignment < 0.0 {
                alignment = -alignment;
            }
            if best.as_ref().map_or(true, |b| alignment > b.alignment) {
                best = Some(EdgePair {
                    point_a: hull_a.transformed_vertices[support_a],
                    dir_a,
                    point_b: hull_b.transformed_vertices[support_b],
                    dir_b,
                    alignment,
                });
            }
        }
    }
    best
}

fn convex_convex(a: &Collider, b: &Collider, hull_a: &ConvexHullData, hull_b: &ConvexHullData) -> Vec<Contact> {
    let Some(simplex) = gjk_intersect(a, b) else {
        return Vec::new();
    };
    let Some((normal, penetration)) = epa(a, b, simplex) else {
        return Vec::new();
    };

    let (_, support_a) = a.support(normal);
    let (_, support_b) = b.support(-normal);
    let (Some(support_a), Some(support_b)) = (support_a, support_b) else {
        return Vec::new();
    };

    let face_a = incident_face(hull_a, support_a, normal);
    let face_b = incident_face(hull_b, support_b, -normal);
    let face_a_alignment = hull_a.faces[face_a].transformed_normal.dot(normal);
    let face_b_alignment = hull_b.faces[face_b].transformed_normal.dot(-normal);

    let edge_pair = best_edge_pair(hull_a, support_a, hull_b, support_b, normal);
    if let Some(edge) = &edge_pair {
        if edge.alignment > face_a_alignment.max(face_b_alignment) + EDGE_FACE_TOLERANCE {
            let (point_a, point_b) = closest_points_on_skew_lines(edge.point_a, edge.dir_a, edge.point_b, edge.dir_b);
            return vec![Contact {
                point_a,
                point_b,
                normal,
                penetration,
            }];
        }
    }

    let (reference_hull, reference_face, incident_hull, incident_face_idx, reference_is_a) =
        if face_a_alignment >= face_b_alignment {
            (hull_a, face_a, hull_b, face_b, true)
        } else {
            (hull_b, face_b, hull_a, face_a, false)
        };

    let incident_polygon: Vec<Vector> = incident_hull.faces[incident_face_idx]
        .indices
        .iter()
        .map(|&vi| incident_hull.transformed_vertices[vi])
        .collect();

    let boundary_planes: Vec<Plane> = reference_hull.face_to_neighbors[reference_face]
        .iter()
        .map(|&neighbor| Plane {
            normal: -reference_hull.faces[neighbor].transformed_normal,
            point: reference_hull.transformed_vertices[reference_hull.faces[neighbor].indices[0]],
        })
        .collect();

    let side_clipped = sutherland_hodgman(incident_polygon, &boundary_planes);

    let reference_plane = Plane {
        normal: reference_hull.faces[reference_face].transformed_normal,
        point: reference_hull.transformed_vertices[reference_hull.faces[reference_face].indices[0]],
    };

    let mut contacts = Vec::new();
    for q in side_clipped {
        let signed = reference_plane.normal.dot(q - reference_plane.point);
        if signed > 0.0 {
            continue; // not on the negative (interior) side: no overlap here
        }
        let projected = q - signed * reference_plane.normal;
        let point_penetration = normal.dot(q - projected);
        if point_penetration >= 0.0 {
            continue;
        }
        let depth = -point_penetration;
        let (point_a, point_b) = if reference_is_a {
            (projected, q)
        } else {
            (q, projected)
        };
        contacts.push(Contact {
            point_a,
            point_b,
            normal,
            penetration: depth,
        });
    }

    if contacts.is_empty() {
        // Degenerate clip (e.g. a single vertex touch): fall back to the
        // EPA-reported single point so the caller still gets a contact.
        contacts.push(Contact {
            point_a: reference_plane.point,
            point_b: reference_plane.point - penetration * normal,
            normal,
            penetration,
        });
    }
    contacts
}

/// Dispatches to the sphere/sphere shortcut, sphere/hull, or hull/hull path
/// per §4.6.
pub fn contact_manifold(a: &Collider, b: &Collider) -> Vec<Contact> {
    match (a, b) {
        (
            Collider::Sphere {
                transformed_center: c1,
                radius: r1,
                ..
            },
            Collider::Sphere {
                transformed_center: c2,
                radius: r2,
                ..
            },
        ) => sphere_sphere(*c1, *r1, *c2, *r2),
        (
            Collider::Sphere {
                transformed_center, radius, ..
            },
            Collider::ConvexHull(_),
        ) => sphere_convex(*transformed_center, *radius, b, true),
        (
            Collider::ConvexHull(_),
            Collider::Sphere {
                transformed_center, radius, ..
            },
        ) => sphere_convex(*transformed_center, *radius, a, false),
        (Collider::ConvexHull(hull_a), Collider::ConvexHull(hull_b)) => convex_convex(a, b, hull_a, hull_b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_sphere_manifold_matches_analytic_formula() {
        let a = Collider::sphere(Vector::new(-0.5, 0.0, 0.0), 1.0);
        let b = Collider::sphere(Vector::new(0.5, 0.0, 0.0), 1.0);
        let contacts = contact_manifold(&a, &b);
        assert_eq!(contacts.len(), 1);
        assert!((contacts[0].penetration - 1.0).abs() < 1e-9);
        assert!((contacts[0].normal - Vector::X).length() < 1e-9);
    }

    #[test]
    fn separated_spheres_have_no_contact() {
        let a = Collider::sphere(Vector::new(-5.0, 0.0, 0.0), 1.0);
        let b = Collider::sphere(Vector::new(5.0, 0.0, 0.0), 1.0);
        assert!(contact_manifold(&a, &b).is_empty());
    }
}

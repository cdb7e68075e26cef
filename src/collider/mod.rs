//! Collider shapes: sphere and convex hull, per §3 and §4.2.

pub mod convex_hull;

pub use convex_hull::{build_convex_hull, ConvexHullData, Face};

use crate::math::{Mat3, Quaternion, Scalar, Vector};

/// A convex collider attached to a body, in body-local coordinates.
#[derive(Debug, Clone)]
pub enum Collider {
    Sphere {
        center: Vector,
        radius: Scalar,
        /// World-space cache, refreshed by [`Collider::update_world_cache`].
        transformed_center: Vector,
    },
    ConvexHull(ConvexHullData),
}

impl Collider {
    pub fn sphere(center: Vector, radius: Scalar) -> Self {
        Collider::Sphere {
            center,
            radius,
            transformed_center: center,
        }
    }

    pub fn convex_hull(hull: ConvexHullData) -> Self {
        Collider::ConvexHull(hull)
    }

    /// Per §4.2: for spheres, copy translation to `center`; for hulls,
    /// rotate+translate every vertex and rotate (then renormalize) every
    /// face normal.
    pub fn update_world_cache(&mut self, position: Vector, orientation: Quaternion) {
        match self {
            Collider::Sphere {
                center,
                transformed_center,
                ..
            } => {
                *transformed_center = position + orientation * *center;
            }
            Collider::ConvexHull(hull) => hull.update_world_cache(position, orientation),
        }
    }

    /// Maximum distance from the body-frame origin to any collider vertex.
    pub fn bounding_sphere_radius(&self) -> Scalar {
        match self {
            Collider::Sphere { center, radius, .. } => center.length() + radius,
            Collider::ConvexHull(hull) => hull.bounding_sphere_radius,
        }
    }

    /// World-space support mapping (§4.3). Returns the support point and,
    /// for hulls, the vertex index (used by clipping to reuse adjacency).
    pub fn support(&self, direction: Vector) -> (Vector, Option<usize>) {
        match self {
            Collider::Sphere {
                transformed_center,
                radius,
                ..
            } => {
                let d = direction.normalize_or_zero();
                (*transformed_center + *radius * d, None)
            }
            Collider::ConvexHull(hull) => {
                let (p, i) = hull.support(direction);
                (p, Some(i))
            }
        }
    }
}

/// §4.2's `default_inertia_tensor`: a sphere gets the closed-form solid-ball
/// tensor; anything else is approximated by distributing `mass` uniformly
/// over the union of every collider's hull vertices (see DESIGN.md's Open
/// Question entry — this is a known approximation, not a production-accurate
/// closed form, per spec §9).
pub fn default_inertia_tensor(colliders: &[Collider], mass: Scalar) -> Mat3 {
    if let [Collider::Sphere { radius, .. }] = colliders {
        let i = 0.4 * mass * radius * radius;
        return Mat3::from_diagonal(Vector::splat(i));
    }

    let mut all_vertices: Vec<Vector> = Vec::new();
    for collider in colliders {
        match collider {
            Collider::Sphere { center, .. } => all_vertices.push(*center),
            Collider::ConvexHull(hull) => all_vertices.extend_from_slice(&hull.vertices),
        }
    }
    if all_vertices.is_empty() {
        return Mat3::ZERO;
    }

    let mass_per_vertex = mass / all_vertices.len() as Scalar;
    let mut tensor = Mat3::ZERO;
    for v in &all_vertices {
        let x = v.x;
        let y = v.y;
        let z = v.z;
        tensor += Mat3::from_cols(
            Vector::new(mass_per_vertex * (y * y + z * z), -mass_per_vertex * x * y, -mass_per_vertex * x * z),
            Vector::new(-mass_per_vertex * x * y, mass_per_vertex * (x * x + z * z), -mass_per_vertex * y * z),
            Vector::new(-mass_per_vertex * x * z, -mass_per_vertex * y * z, mass_per_vertex * (x * x + y * y)),
        );
    }
    tensor
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn sphere_inertia_matches_closed_form() {
        let collider = Collider::sphere(Vector::ZERO, 2.0);
        let tensor = default_inertia_tensor(&[collider], 5.0);
        let expected = 0.4 * 5.0 * 4.0;
        assert_relative_eq!(tensor.x_axis.x, expected, epsilon = 1e-9);
        assert_relative_eq!(tensor.y_axis.y, expected, epsilon = 1e-9);
        assert_relative_eq!(tensor.z_axis.z, expected, epsilon = 1e-9);
    }

    #[test]
    fn sphere_world_cache_tracks_translation() {
        let mut collider = Collider::sphere(Vector::ZERO, 1.0);
        collider.update_world_cache(Vector::new(1.0, 2.0, 3.0), Quaternion::IDENTITY);
        match collider {
            Collider::Sphere { transformed_center, .. } => {
                assert_relative_eq!(transformed_center, Vector::new(1.0, 2.0, 3.0), epsilon = 1e-12);
            }
            _ => unreachable!(),
        }
    }
}

//! Convex-hull construction from an indexed triangle soup, and the
//! world-space cache update run once per substep.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::{PhysicsError, PhysicsResult};
use crate::math::{Quaternion, Scalar, Vector};

/// Tolerance used when grouping triangles into planar faces (§4.2 step 4).
const COPLANAR_EPSILON: Scalar = 1e-6;

/// One planar, convex, CCW-wound face of a hull.
#[derive(Debug, Clone)]
pub struct Face {
    /// Indices into the owning hull's `vertices`, ordered head-to-tail
    /// around the polygon boundary, consistent with `normal`.
    pub indices: Vec<usize>,
    /// Outward unit normal in body-local space.
    pub normal: Vector,
    /// `normal` rotated into world space by the last `update_world_cache`.
    pub transformed_normal: Vector,
}

/// Body-local convex-hull geometry plus its topology and world-space cache.
#[derive(Debug, Clone)]
pub struct ConvexHullData {
    pub vertices: Vec<Vector>,
    pub faces: Vec<Face>,
    pub vertex_to_faces: Vec<Vec<usize>>,
    pub vertex_to_neighbors: Vec<Vec<usize>>,
    pub face_to_neighbors: Vec<Vec<usize>>,
    pub transformed_vertices: Vec<Vector>,
    pub bounding_sphere_radius: Scalar,
}

/// Exact-bit-pattern key so bit-identical duplicate vertices collapse,
/// matching §4.2 step 1's "exact float compare acceptable" contract.
#[derive(PartialEq, Eq, Hash, Clone, Copy)]
struct VertexKey(u64, u64, u64);

impl VertexKey {
    fn new(v: Vector) -> Self {
        VertexKey(v.x.to_bits(), v.y.to_bits(), v.z.to_bits())
    }
}

fn undirected_edge(a: usize, b: usize) -> (usize, usize) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

fn triangle_normal(v: &[Vector], tri: [usize; 3]) -> Vector {
    let ab = v[tri[1]] - v[tri[0]];
    let ac = v[tri[2]] - v[tri[0]];
    ab.cross(ac).normalize()
}

/// Builds a [`ConvexHullData`] from an indexed triangle soup, per §4.2.
pub fn build_convex_hull(
    positions: &[Vector],
    triangle_indices: &[[u32; 3]],
) -> PhysicsResult<ConvexHullData> {
    if positions.len() < 4 || triangle_indices.is_empty() {
        return Err(PhysicsError::DegenerateGeometry(
            "fewer than four vertices or no triangles supplied".into(),
        ));
    }

    // Step 1-2: de-duplicate positions (exact compare), re-index triangles.
    let mut unique_vertices: Vec<Vector> = Vec::new();
    let mut remap: HashMap<VertexKey, usize> = HashMap::new();
    for &p in positions {
        let key = VertexKey::new(p);
        remap.entry(key).or_insert_with(|| {
            unique_vertices.push(p);
            unique_vertices.len() - 1
        });
    }
    let triangles: Vec<[usize; 3]> = triangle_indices
        .iter()
        .map(|tri| {
            [
                remap[&VertexKey::new(positions[tri[0] as usize])],
                remap[&VertexKey::new(positions[tri[1] as usize])],
                remap[&VertexKey::new(positions[tri[2] as usize])],
            ]
        })
        .collect();

    // Step 3: triangle adjacency (sharing >= 1 vertex) and vertex->triangle.
    let mut vertex_to_triangles: Vec<Vec<usize>> = vec![Vec::new(); unique_vertices.len()];
    for (ti, tri) in triangles.iter().enumerate() {
        for &v in tri {
            vertex_to_triangles[v].push(ti);
        }
    }
    let mut triangle_neighbors: Vec<HashSet<usize>> = vec![HashSet::new(); triangles.len()];
    for v_tris in &vertex_to_triangles {
        for &a in v_tris {
            for &b in v_tris {
                if a != b {
                    triangle_neighbors[a].insert(b);
                }
            }
        }
    }

    // Step 4: BFS-group coplanar triangles into faces.
    let tri_normals: Vec<Vector> = triangles
        .iter()
        .map(|&tri| triangle_normal(&unique_vertices, tri))
        .collect();

    let mut visited = vec![false; triangles.len()];
    let mut faces = Vec::new();
    for seed in 0..triangles.len() {
        if visited[seed] {
            continue;
        }
        let seed_normal = tri_normals[seed];
        let mut group = vec![seed];
        visited[seed] = true;
        let mut queue = VecDeque::new();
        queue.push_back(seed);
        while let Some(current) = queue.pop_front() {
            for &neighbor in &triangle_neighbors[current] {
                if visited[neighbor] {
                    continue;
                }
                if tri_normals[neighbor].dot(seed_normal) > 1.0 - COPLANAR_EPSILON {
                    visited[neighbor] = true;
                    group.push(neighbor);
                    queue.push_back(neighbor);
                }
            }
        }
        faces.push(build_face(&unique_vertices, &triangles, &group, seed_normal)?);
    }

    // Step 5: vertex->neighbor (via any triangle edge), vertex->face, face->face.
    let mut vertex_to_neighbors: Vec<HashSet<usize>> = vec![HashSet::new(); unique_vertices.len()];
    for tri in &triangles {
        for i in 0..3 {
            let a = tri[i];
            let b = tri[(i + 1) % 3];
            vertex_to_neighbors[a].insert(b);
            vertex_to_neighbors[b].insert(a);
        }
    }
    let vertex_to_neighbors: Vec<Vec<usize>> = vertex_to_neighbors
        .into_iter()
        .map(|s| s.into_iter().collect())
        .collect();

    let mut vertex_to_faces: Vec<Vec<usize>> = vec![Vec::new(); unique_vertices.len()];
    for (fi, face) in faces.iter().enumerate() {
        for &v in &face.indices {
            vertex_to_faces[v].push(fi);
        }
    }

    let mut face_to_neighbors = vec![Vec::new(); faces.len()];
    for a in 0..faces.len() {
        for b in (a + 1)..faces.len() {
            let shares_vertex = faces[a].indices.iter().any(|v| faces[b].indices.contains(v));
            if shares_vertex {
                face_to_neighbors[a].push(b);
                face_to_neighbors[b].push(a);
            }
        }
    }

    // Step 6: bounding sphere radius.
    let bounding_sphere_radius = unique_vertices
        .iter()
        .map(|v| v.length())
        .fold(0.0, Scalar::max);

    let transformed_vertices = unique_vertices.clone();

    Ok(ConvexHullData {
        vertices: unique_vertices,
        faces,
        vertex_to_faces,
        vertex_to_neighbors,
        face_to_neighbors,
        transformed_vertices,
        bounding_sphere_radius,
    })
}

/// Orders a coplanar triangle group's border edges into a single CCW polygon
/// loop and computes the resulting [`Face`].
fn build_face(
    vertices: &[Vector],
    triangles: &[[usize; 3]],
    group: &[usize],
    normal: Vector,
) -> PhysicsResult<Face> {
    // Count undirected edge occurrences within the group; an edge appearing
    // exactly once is a border edge (§4.2 step 4).
    let mut undirected_count: HashMap<(usize, usize), u32> = HashMap::new();
    // Remember one directed orientation per undirected edge (the one that
    // walks CCW around the seed triangle's winding).
    let mut directed_of: HashMap<(usize, usize), (usize, usize)> = HashMap::new();
    for &ti in group {
        let tri = triangles[ti];
        for i in 0..3 {
            let a = tri[i];
            let b = tri[(i + 1) % 3];
            *undirected_count.entry(undirected_edge(a, b)).or_insert(0) += 1;
            directed_of.insert(undirected_edge(a, b), (a, b));
        }
    }

    let mut next: HashMap<usize, usize> = HashMap::new();
    for (edge, count) in &undirected_count {
        if *count == 1 {
            let (a, b) = directed_of[edge];
            next.insert(a, b);
        }
    }

    if next.is_empty() {
        return Err(PhysicsError::DegenerateGeometry(
            "coplanar triangle group has no border edges".into(),
        ));
    }

    let start = *next.keys().next().unwrap();
    let mut loop_indices = vec![start];
    let mut current = start;
    loop {
        let n = *next
            .get(&current)
            .ok_or_else(|| PhysicsError::DegenerateGeometry("face border is not a closed loop".into()))?;
        if n == start {
            break;
        }
        loop_indices.push(n);
        current = n;
        if loop_indices.len() > next.len() + 1 {
            return Err(PhysicsError::DegenerateGeometry(
                "face border loop failed to close".into(),
            ));
        }
    }

    let _ = vertices;
    Ok(Face {
        indices: loop_indices,
        normal,
        transformed_normal: normal,
    })
}

impl ConvexHullData {
    /// Refreshes `transformed_vertices` and each face's `transformed_normal`
    /// from the owning body's world pose. Must run before any broad/narrow
    /// phase query touches this collider in the current substep (§4.2).
    pub fn update_world_cache(&mut self, position: Vector, orientation: Quaternion) {
        for (dst, src) in self.transformed_vertices.iter_mut().zip(&self.vertices) {
            *dst = position + orientation * *src;
        }
        for face in &mut self.faces {
            face.transformed_normal = (orientation * face.normal).normalize();
        }
    }

    /// Support mapping (§4.3): the hull vertex maximizing `<v, d>`, with
    /// strict `>` so ties resolve deterministically to the first-found
    /// vertex in index order.
    pub fn support(&self, direction: Vector) -> (Vector, usize) {
        let mut best_index = 0;
        let mut best_dot = self.transformed_vertices[0].dot(direction);
        for (i, v) in self.transformed_vertices.iter().enumerate().skip(1) {
            let d = v.dot(direction);
            if d > best_dot {
                best_dot = d;
                best_index = i;
            }
        }
        (self.transformed_vertices[best_index], best_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube_mesh() -> (Vec<Vector>, Vec<[u32; 3]>) {
        let positions = vec![
            Vector::new(-1.0, -1.0, -1.0),
            Vector::new(1.0, -1.0, -1.0),
            Vector::new(1.0, 1.0, -1.0),
            Vector::new(-1.0, 1.0, -1.0),
            Vector::new(-1.0, -1.0, 1.0),
            Vector::new(1.0, -1.0, 1.0),
            Vector::new(1.0, 1.0, 1.0),
            Vector::new(-1.0, 1.0, 1.0),
        ];
        let triangles: Vec<[u32; 3]> = vec![
            [0, 1, 2], [0, 2, 3], // -z
            [5, 4, 7], [5, 7, 6], // +z
            [4, 0, 3], [4, 3, 7], // -x
            [1, 5, 6], [1, 6, 2], // +x
            [3, 2, 6], [3, 6, 7], // +y
            [4, 5, 1], [4, 1, 0], // -y
        ];
        (positions, triangles)
    }

    #[test]
    fn cube_hull_has_six_faces() {
        let (positions, triangles) = cube_mesh();
        let hull = build_convex_hull(&positions, &triangles).unwrap();
        assert_eq!(hull.faces.len(), 6);
        assert_eq!(hull.vertices.len(), 8);
        for face in &hull.faces {
            assert_eq!(face.indices.len(), 4);
        }
    }

    #[test]
    fn cube_bounding_radius_is_corner_distance() {
        let (positions, triangles) = cube_mesh();
        let hull = build_convex_hull(&positions, &triangles).unwrap();
        assert!((hull.bounding_sphere_radius - 3.0_f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn degenerate_input_is_rejected() {
        let positions = vec![Vector::ZERO, Vector::X, Vector::Y];
        let err = build_convex_hull(&positions, &[]).unwrap_err();
        assert!(matches!(err, PhysicsError::DegenerateGeometry(_)));
    }
}

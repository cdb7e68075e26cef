//! Bounding-sphere broad-phase pair pruning and union-find simulation
//! islands (§3's `SimulationIsland`, §4.7b/c).

use std::collections::HashMap;

use crate::math::{Scalar, Vector};

/// Enumerates unordered body-index pairs whose bounding spheres are within
/// `margin` of touching: `||x1-x2|| <= r1+r2+margin` (§4.7b).
pub fn broad_phase_pairs(positions: &[Vector], radii: &[Scalar], margin: Scalar) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for i in 0..positions.len() {
        for j in (i + 1)..positions.len() {
            let reach = radii[i] + radii[j] + margin;
            if (positions[i] - positions[j]).length_squared() <= reach * reach {
                pairs.push((i, j));
            }
        }
    }
    pairs
}

/// Array-indexed union-find (a direct substitute for the original's
/// hash-map-keyed-by-entity-id version, since this registry already hands
/// out dense indices — see DESIGN.md).
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        UnionFind {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[ra] = rb;
        }
    }
}

/// A partition of non-fixed body indices into maximal mutually-reachable
/// sets via the broad-phase pair graph (§3). Fixed bodies never appear in
/// any island.
#[derive(Debug, Default, Clone)]
pub struct SimulationIslands {
    pub islands: Vec<Vec<usize>>,
}

impl SimulationIslands {
    /// The island index containing `body`, or `None` if `body` is fixed or
    /// was never placed in a broad-phase pair this substep.
    pub fn island_of(&self, body: usize) -> Option<usize> {
        self.islands.iter().position(|island| island.contains(&body))
    }
}

/// Builds simulation islands from broad-phase pairs, restricted to pairs
/// where neither body is fixed (§4.7c; fixed bodies are background anchors
/// and never merge islands).
pub fn build_islands(pairs: &[(usize, usize)], fixed: &[bool], body_count: usize) -> SimulationIslands {
    let mut uf = UnionFind::new(body_count);
    for &(a, b) in pairs {
        if !fixed[a] && !fixed[b] {
            uf.union(a, b);
        }
    }

    let mut by_root: HashMap<usize, Vec<usize>> = HashMap::new();
    for i in 0..body_count {
        if fixed[i] {
            continue;
        }
        let root = uf.find(i);
        by_root.entry(root).or_default().push(i);
    }
    SimulationIslands {
        islands: by_root.into_values().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_respect_margin() {
        let positions = vec![Vector::ZERO, Vector::new(2.5, 0.0, 0.0), Vector::new(100.0, 0.0, 0.0)];
        let radii = vec![1.0, 1.0, 1.0];
        let pairs = broad_phase_pairs(&positions, &radii, 0.1);
        assert_eq!(pairs, vec![(0, 1)]);
    }

    #[test]
    fn islands_exclude_fixed_bodies_and_merge_chains() {
        // 0 -- 1 -- 2, body 2 is fixed (ground); 3 is isolated.
        let pairs = vec![(0, 1), (1, 2)];
        let fixed = vec![false, false, true, false];
        let islands = build_islands(&pairs, &fixed, 4);
        assert_eq!(islands.islands.len(), 2);
        let mut sorted_islands: Vec<Vec<usize>> = islands.islands.into_iter().map(|mut m| {
            m.sort();
            m
        }).collect();
        sorted_islands.sort();
        assert_eq!(sorted_islands, vec![vec![0, 1], vec![3]]);
    }
}

//! Flood-fill clustering: recursive graph bisection of the cell adjacency.
//!
//! Instead of a fixed spatial octree, the level-0 adjacency graph is
//! recursively split into two near-balanced halves: a farthest pair among a
//! random sample seeds the split, and two priority-queue frontiers grow
//! greedily towards each other (each frontier preferring cells far from the
//! opposing seed, a greedy Voronoi-like partition). Recursion halves clusters
//! until they are small, and the resulting cluster-tree depth becomes the
//! mesh level structure.
//!
//! Seed sampling is randomized; pass `FloodParams::seed` for a reproducible
//! partition. Structural invariants hold either way.

use crate::error::MeshError;
use crate::types::{CellId, Mesh};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use std::collections::BinaryHeap;

/// Tuning parameters for flood-fill clustering.
#[derive(Clone, Debug, PartialEq)]
pub struct FloodParams {
    /// Clusters at or below this size stop recursing (leaf clusters).
    pub max_cluster_size: usize,
    /// How many cells to sample when picking the farthest seed pair.
    pub seed_samples: usize,
    /// RNG seed for reproducible partitions; `None` uses entropy.
    pub seed: Option<u64>,
}

impl Default for FloodParams {
    fn default() -> Self {
        FloodParams { max_cluster_size: 6, seed_samples: 10, seed: None }
    }
}

/// Compact binary path identifying a cluster in the bisection tree
/// ("0"/"1" appended per split, replacing string tags).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ClusterPath {
    bits: u64,
    len: u8,
}

impl ClusterPath {
    fn root() -> Self {
        ClusterPath { bits: 0, len: 0 }
    }

    fn child(self, bit: u64) -> Self {
        ClusterPath { bits: self.bits | (bit << self.len), len: self.len + 1 }
    }
}

/// Per-depth cluster tags for every level-0 cell.
struct Tags {
    num_cells: usize,
    by_depth: Vec<Vec<Option<ClusterPath>>>,
}

impl Tags {
    fn new(num_cells: usize) -> Self {
        Tags { num_cells, by_depth: Vec::new() }
    }

    fn get(&mut self, depth: usize, cell: CellId) -> Option<ClusterPath> {
        self.ensure(depth);
        self.by_depth[depth][cell.0]
    }

    fn set(&mut self, depth: usize, cell: CellId, path: ClusterPath) {
        self.ensure(depth);
        self.by_depth[depth][cell.0] = Some(path);
    }

    fn ensure(&mut self, depth: usize) {
        while self.by_depth.len() <= depth {
            self.by_depth.push(vec![None; self.num_cells]);
        }
    }
}

/// The bisection tree: a leaf holds raw member cells, an internal node holds
/// sub-clusters.
enum ClusterNode {
    Leaf(Vec<CellId>),
    Internal(Vec<ClusterNode>),
}

/// Frontier entry ordered by distance to the opposing seed; the max-heap
/// pops the cell farthest from the other side first.
struct Frontier {
    dist: f64,
    cell: CellId,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.dist == other.dist && self.cell == other.cell
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.dist.total_cmp(&other.dist)
    }
}

/// Euclidean distance between two cells, using each cell's first corner
/// vertex position as a proxy coordinate.
fn cell_distance(mesh: &Mesh, a: CellId, b: CellId) -> f64 {
    let pa = mesh.vertex(mesh.cell(0, a).corners[0]).position;
    let pb = mesh.vertex(mesh.cell(0, b).corners[0]).position;
    (pa - pb).norm()
}

struct Bisector<'a> {
    mesh: &'a Mesh,
    params: &'a FloodParams,
    tags: Tags,
    rng: StdRng,
}

impl Bisector<'_> {
    /// Recursively bisect `cells`, returning the subtree depth (leaf = 0)
    /// and the cluster tree.
    fn bisect(&mut self, cells: Vec<CellId>, depth: usize, containing: ClusterPath) -> (usize, ClusterNode) {
        if cells.len() <= self.params.max_cluster_size.max(1) {
            return (0, ClusterNode::Leaf(cells));
        }

        // Farthest pair among a small random sample approximates a
        // diameter-based split without full pairwise cost.
        // Past the base case there are always at least two cells to seed.
        let sample_len = self.params.seed_samples.clamp(2, cells.len());
        let sample: Vec<CellId> = cells
            .choose_multiple(&mut self.rng, sample_len)
            .copied()
            .collect();
        let mut seed_a = sample[0];
        let mut seed_b = sample[1];
        let mut best = f64::NEG_INFINITY;
        for &a in &sample {
            for &b in &sample {
                if a == b {
                    continue;
                }
                let d = cell_distance(self.mesh, a, b);
                if d > best {
                    best = d;
                    seed_a = a;
                    seed_b = b;
                }
            }
        }

        let path_a = containing.child(0);
        let path_b = containing.child(1);
        self.tags.set(depth, seed_a, path_a);
        self.tags.set(depth, seed_b, path_b);

        let mut heap_a = BinaryHeap::from([Frontier {
            dist: cell_distance(self.mesh, seed_a, seed_b),
            cell: seed_a,
        }]);
        let mut heap_b = BinaryHeap::from([Frontier {
            dist: cell_distance(self.mesh, seed_b, seed_a),
            cell: seed_b,
        }]);
        let mut members_a = vec![seed_a];
        let mut members_b = vec![seed_b];

        // Two-frontier growth: pop from the side that is currently smaller
        // (side A unless B is strictly smaller with a non-empty queue, or
        // A's queue is drained) and claim the popped cell's free neighbors.
        while !(heap_a.is_empty() && heap_b.is_empty()) {
            let grow_b = (members_b.len() < members_a.len() && !heap_b.is_empty()) || heap_a.is_empty();
            let (heap, members, my_path, other_seed) = if grow_b {
                (&mut heap_b, &mut members_b, path_b, seed_a)
            } else {
                (&mut heap_a, &mut members_a, path_a, seed_b)
            };

            let cur = heap.pop().expect("selected side has a non-empty queue").cell;
            for neighbor in self.mesh.connected_cells(0, cur) {
                if self.tags.get(depth, neighbor).is_some() {
                    continue;
                }
                // Below the root split, stay inside the containing cluster.
                if depth > 0 && self.tags.get(depth - 1, neighbor) != Some(containing) {
                    continue;
                }
                self.tags.set(depth, neighbor, my_path);
                heap.push(Frontier {
                    dist: cell_distance(self.mesh, neighbor, other_seed),
                    cell: neighbor,
                });
                members.push(neighbor);
            }
        }

        let (mut depth_a, mut node_a) = self.bisect(members_a, depth + 1, path_a);
        let (mut depth_b, mut node_b) = self.bisect(members_b, depth + 1, path_b);

        // Pad the shallower subtree with singleton wrappers so both halves
        // report the same depth.
        while depth_a < depth_b {
            node_a = ClusterNode::Internal(vec![node_a]);
            depth_a += 1;
        }
        while depth_b < depth_a {
            node_b = ClusterNode::Internal(vec![node_b]);
            depth_b += 1;
        }

        (depth_a + 1, ClusterNode::Internal(vec![node_a, node_b]))
    }
}

/// A cluster flattened out of the bisection tree. Leaf clusters start with
/// their member cells; internal clusters collect the coarse cells
/// materialized from their children.
struct ClusterInfo {
    depth: usize,
    cells: Vec<CellId>,
    parent: Option<usize>,
}

/// Arena of flattened clusters, indexed by tree depth.
struct ClusterArena {
    infos: Vec<ClusterInfo>,
    by_depth: Vec<Vec<usize>>,
}

impl ClusterArena {
    fn from_tree(root: ClusterNode) -> Self {
        let mut arena = ClusterArena { infos: Vec::new(), by_depth: Vec::new() };
        arena.flatten(root);
        arena
    }

    fn flatten(&mut self, node: ClusterNode) -> usize {
        match node {
            ClusterNode::Leaf(cells) => self.push(ClusterInfo { depth: 0, cells, parent: None }),
            ClusterNode::Internal(children) => {
                let mut depth = 0;
                let child_indices: Vec<usize> = children
                    .into_iter()
                    .map(|c| {
                        let idx = self.flatten(c);
                        depth = depth.max(self.infos[idx].depth + 1);
                        idx
                    })
                    .collect();
                let idx = self.push(ClusterInfo { depth, cells: Vec::new(), parent: None });
                for c in child_indices {
                    self.infos[c].parent = Some(idx);
                }
                idx
            }
        }
    }

    fn push(&mut self, info: ClusterInfo) -> usize {
        let idx = self.infos.len();
        while self.by_depth.len() <= info.depth {
            self.by_depth.push(Vec::new());
        }
        self.by_depth[info.depth].push(idx);
        self.infos.push(info);
        idx
    }

    fn at_depth(&self, depth: usize) -> &[usize] {
        self.by_depth.get(depth).map_or(&[], |v| v.as_slice())
    }
}

/// Cluster the level-0 cells and materialize one coarser cell per cluster
/// for every mesh level above 0.
///
/// Coarse connectivity faces are *not* built here; run
/// [`crate::connectivity::build_coarse_faces`] per level afterwards.
pub fn build(mesh: &mut Mesh, params: &FloodParams) -> Result<(), MeshError> {
    let levels = mesh.num_levels();
    let leaf_count = mesh.levels[0].cells.len();
    if levels <= 1 || leaf_count == 0 {
        return Ok(());
    }

    let rng = match params.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_os_rng(),
    };
    let mut bisector = Bisector {
        mesh,
        params,
        tags: Tags::new(leaf_count),
        rng,
    };
    let leaf_cells: Vec<CellId> = (0..leaf_count).map(CellId).collect();
    let (tree_depth, root) = bisector.bisect(leaf_cells, 0, ClusterPath::root());
    log::debug!("flood-fill clustered {} cells to depth {}", leaf_count, tree_depth);

    let mut arena = ClusterArena::from_tree(root);

    for level in 0..levels - 1 {
        let cluster_ids: Vec<usize> = arena.at_depth(level).to_vec();
        for ci in cluster_ids {
            let members = arena.infos[ci].cells.clone();
            if members.is_empty() {
                return Err(MeshError::EmptyCluster { depth: level });
            }

            let n = members.len() as f64;
            let mut temp = 0.0;
            let mut cond = 0.0;
            for &m in &members {
                let cell = mesh.cell(level, m);
                temp += cell.temperature;
                cond += cell.conductivity;
            }

            let parent_id = mesh.add_cell(level + 1, temp / n, cond / n);
            for &m in &members {
                mesh.set_parent(level, m, parent_id)?;
            }
            mesh.cell_mut(level + 1, parent_id).children = members;

            // The parent cluster collects this cell, so the next level up
            // clusters cells that are already one level coarser.
            if let Some(p) = arena.infos[ci].parent {
                arena.infos[p].cells.push(parent_id);
            }
        }
        log::debug!(
            "level {}: {} cells (flood-fill)",
            level + 1,
            mesh.levels[level + 1].cells.len()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cluster_path_children_are_distinct() {
        let root = ClusterPath::root();
        let a = root.child(0);
        let b = root.child(1);
        assert_ne!(a, b);
        assert_ne!(a.child(1), b.child(1));
        assert_eq!(a.len, 1);
        assert_eq!(a.child(1).len, 2);
    }

    #[test]
    fn frontier_heap_pops_farthest_first() {
        let mut heap = BinaryHeap::new();
        heap.push(Frontier { dist: 1.0, cell: CellId(0) });
        heap.push(Frontier { dist: 5.0, cell: CellId(1) });
        heap.push(Frontier { dist: 3.0, cell: CellId(2) });
        assert_eq!(heap.pop().unwrap().cell, CellId(1));
        assert_eq!(heap.pop().unwrap().cell, CellId(2));
    }
}

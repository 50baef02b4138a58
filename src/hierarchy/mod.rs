//! Hierarchical coarsening: regular octree aggregation or flood-fill
//! graph clustering.

pub mod flood;
pub mod octree;

pub use flood::FloodParams;

/// Which coarsening strategy builds the levels above level 0.
#[derive(Clone, Debug, PartialEq)]
pub enum CoarseningStrategy {
    /// Regular 2×2×2 spatial grouping (the default).
    Octree,
    /// Greedy graph bisection into near-balanced clusters.
    FloodFill(FloodParams),
}

impl Default for CoarseningStrategy {
    fn default() -> Self {
        CoarseningStrategy::Octree
    }
}

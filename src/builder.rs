//! Pipeline driver: image → leaf cells → faces → hierarchy → coarse faces.

use crate::connectivity::{build_coarse_faces, build_leaf_faces};
use crate::error::MeshError;
use crate::grid::voxelize;
use crate::hierarchy::{flood, octree, CoarseningStrategy};
use crate::raster::{ColorGrid, Palette};
use crate::types::Mesh;

/// Mesh construction parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshConfig {
    /// Number of hierarchy levels (1 = no coarsening).
    pub levels: usize,
    /// Z-extent of the voxelized volume, in voxels.
    pub max_depth: usize,
    pub strategy: CoarseningStrategy,
}

impl Default for MeshConfig {
    fn default() -> Self {
        MeshConfig {
            levels: 1,
            max_depth: 16,
            strategy: CoarseningStrategy::Octree,
        }
    }
}

impl MeshConfig {
    pub fn new(levels: usize, max_depth: usize) -> Self {
        MeshConfig { levels, max_depth, ..Default::default() }
    }

    pub fn with_strategy(mut self, strategy: CoarseningStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}

/// Run the full mesh-construction pipeline.
///
/// Stages run in dependency order: voxelization, level-0 face construction,
/// hierarchical coarsening, coarse-face reconstruction. Any structural
/// failure aborts the whole run.
pub fn build_mesh(image: &ColorGrid, palette: &Palette, config: &MeshConfig) -> Result<Mesh, MeshError> {
    assert!(config.levels >= 1, "at least one mesh level is required");

    let (mut mesh, grid) = voxelize(image, palette, config.levels, config.max_depth)?;
    build_leaf_faces(&mut mesh, &grid);

    match &config.strategy {
        CoarseningStrategy::Octree => {
            // The octree path derives coarse faces from the directional
            // areas it aggregates while grouping, so it builds both cells
            // and faces per level.
            octree::build(&mut mesh, &grid)?;
        }
        CoarseningStrategy::FloodFill(params) => {
            flood::build(&mut mesh, params)?;
            for level in 1..config.levels {
                build_coarse_faces(&mut mesh, level)?;
            }
        }
    }

    for (level, lvl) in mesh.levels.iter().enumerate() {
        log::info!(
            "level {} - {} cells, {} faces",
            level,
            lvl.cells.len(),
            lvl.faces.len()
        );
    }
    log::info!("{} vertices", mesh.vertices.len());

    Ok(mesh)
}

//! Regular octree aggregation.
//!
//! Each coarser level groups 2×2×2 finer cells into one cell using the fixed
//! [`CORNER_OFFSETS`] ordering. A coarse cell averages its existing
//! children's thermal properties and sums the directional contact areas of
//! the children on its far face per axis; those aggregated areas then become
//! the coarse faces between grid-adjacent cells.

use crate::error::MeshError;
use crate::grid::CellGrid;
use crate::types::{Mesh, CORNER_OFFSETS};

/// Build all coarser levels (1..`mesh.num_levels()`) above the voxelized
/// level 0, including their connectivity faces.
pub fn build(mesh: &mut Mesh, leaf_grid: &CellGrid) -> Result<(), MeshError> {
    let mut finer = leaf_grid.clone();

    for level in 1..mesh.num_levels() {
        let dims = finer.dims.halved();
        let mut coarser = CellGrid::empty(dims);

        // Build coarser cells.
        for x in 0..dims.width {
            for y in 0..dims.height {
                for z in 0..dims.depth {
                    let mut children = Vec::with_capacity(8);
                    for off in CORNER_OFFSETS {
                        let fx = x * 2 + off[0];
                        let fy = y * 2 + off[1];
                        let fz = z * 2 + off[2];
                        if fx >= finer.dims.width || fy >= finer.dims.height || fz >= finer.dims.depth {
                            continue;
                        }
                        if let Some(child) = finer.get(fx, fy, fz) {
                            children.push((child, off));
                        }
                    }
                    if children.is_empty() {
                        continue;
                    }

                    let n = children.len() as f64;
                    let mut avg_temp = 0.0;
                    let mut avg_cond = 0.0;
                    let mut right_area = 0.0;
                    let mut up_area = 0.0;
                    let mut fwd_area = 0.0;
                    for &(child, off) in &children {
                        let c = mesh.cell(level - 1, child);
                        avg_temp += c.temperature;
                        avg_cond += c.conductivity;
                        // Only children on the far face in a direction carry
                        // contact area out of this group in that direction.
                        if off[0] == 1 {
                            right_area += c.right_area;
                        }
                        if off[1] == 1 {
                            up_area += c.up_area;
                        }
                        if off[2] == 1 {
                            fwd_area += c.fwd_area;
                        }
                    }

                    let id = mesh.add_cell(level, avg_temp / n, avg_cond / n);
                    coarser.set(x, y, z, id);
                    {
                        let cell = mesh.cell_mut(level, id);
                        cell.right_area = right_area;
                        cell.up_area = up_area;
                        cell.fwd_area = fwd_area;
                        cell.children = children.iter().map(|&(c, _)| c).collect();
                    }
                    for &(child, _) in &children {
                        mesh.set_parent(level - 1, child, id)?;
                    }
                }
            }
        }

        // Build coarse connectivity faces from the aggregated areas.
        for x in 0..dims.width {
            for y in 0..dims.height {
                for z in 0..dims.depth {
                    let Some(this) = coarser.get(x, y, z) else { continue };
                    let (right_area, up_area, fwd_area) = {
                        let c = mesh.cell(level, this);
                        (c.right_area, c.up_area, c.fwd_area)
                    };

                    if x + 1 < dims.width && right_area > 0.0 {
                        if let Some(right) = coarser.get(x + 1, y, z) {
                            mesh.add_face(level, right_area, this, right);
                        }
                    }
                    if y + 1 < dims.height && up_area > 0.0 {
                        if let Some(up) = coarser.get(x, y + 1, z) {
                            mesh.add_face(level, up_area, this, up);
                        }
                    }
                    if z + 1 < dims.depth && fwd_area > 0.0 {
                        if let Some(fwd) = coarser.get(x, y, z + 1) {
                            mesh.add_face(level, fwd_area, this, fwd);
                        }
                    }
                }
            }
        }

        log::debug!(
            "level {}: {} cells, {} faces (octree)",
            level,
            mesh.levels[level].cells.len(),
            mesh.levels[level].faces.len()
        );
        finer = coarser;
    }

    Ok(())
}

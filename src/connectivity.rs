//! Face construction: level-0 adjacency and cross-level reconstruction.
//!
//! At level 0 every existing cell is connected to its +x/+y/+z grid neighbor
//! with a directed unit-area face, visiting each adjacent pair exactly once
//! by construction. At coarser levels faces are rebuilt from the aggregated
//! connectivity of child cells, deduplicated by canonical (min-id, max-id)
//! orientation.

use crate::error::MeshError;
use crate::grid::CellGrid;
use crate::types::{CellId, Mesh};
use std::collections::BTreeMap;

/// Connect every existing leaf cell to its positive-direction neighbors.
///
/// The current cell becomes the face's "in" side and the neighbor its "out"
/// side; the per-direction contact area is recorded on the current cell for
/// later octree area aggregation. Negative directions are never visited, so
/// each adjacent pair yields exactly one face.
pub fn build_leaf_faces(mesh: &mut Mesh, grid: &CellGrid) {
    let dims = grid.dims;
    for x in 0..dims.width {
        for y in 0..dims.height {
            for z in 0..dims.depth {
                let Some(this) = grid.get(x, y, z) else { continue };

                if x + 1 < dims.width {
                    if let Some(right) = grid.get(x + 1, y, z) {
                        mesh.add_face(0, 1.0, this, right);
                        mesh.cell_mut(0, this).right_area = 1.0;
                    }
                }
                if y + 1 < dims.height {
                    if let Some(up) = grid.get(x, y + 1, z) {
                        mesh.add_face(0, 1.0, this, up);
                        mesh.cell_mut(0, this).up_area = 1.0;
                    }
                }
                if z + 1 < dims.depth {
                    if let Some(fwd) = grid.get(x, y, z + 1) {
                        mesh.add_face(0, 1.0, this, fwd);
                        mesh.cell_mut(0, this).fwd_area = 1.0;
                    }
                }
            }
        }
    }
    log::debug!("level 0: {} faces", mesh.levels[0].faces.len());
}

/// Rebuild connectivity faces at `level` from the faces of the cells'
/// children one level down.
///
/// For each coarse cell, the contact area towards every distinct neighboring
/// parent is accumulated from the children's in- and out-faces
/// (self-connections ignored); each positive-area neighbor pair then gets
/// exactly one face, oriented lower-id → higher-id. Requires the hierarchy
/// for `level` to be fully built: a child face endpoint without a parent is
/// fatal.
pub fn build_coarse_faces(mesh: &mut Mesh, level: usize) -> Result<(), MeshError> {
    let num_cells = mesh.levels[level].cells.len();
    for idx in 0..num_cells {
        let cell_id = CellId(idx);

        // Accumulate neighbor-parent → area. BTreeMap keeps face creation
        // order deterministic for a given partition.
        let mut connections: BTreeMap<CellId, f64> = BTreeMap::new();
        let children = mesh.cell(level, cell_id).children.clone();
        for child in children {
            let child_cell = mesh.cell(level - 1, child);
            let endpoints: Vec<(CellId, f64)> = child_cell
                .in_faces
                .iter()
                .map(|&f| {
                    let face = mesh.face(level - 1, f);
                    (face.in_cell, face.area)
                })
                .chain(child_cell.out_faces.iter().map(|&f| {
                    let face = mesh.face(level - 1, f);
                    (face.out_cell, face.area)
                }))
                .collect();

            for (other, area) in endpoints {
                let parent = mesh
                    .cell(level - 1, other)
                    .parent
                    .ok_or(MeshError::MissingParent { level: level - 1, cell: other })?;
                if parent != cell_id {
                    *connections.entry(parent).or_insert(0.0) += area;
                }
            }
        }

        for (neighbor, area) in connections {
            if area <= 0.0 {
                continue;
            }
            // A face may already exist from the neighbor's side.
            if mesh.cells_connected(level, cell_id, neighbor) {
                continue;
            }
            let (lo, hi) = if cell_id < neighbor { (cell_id, neighbor) } else { (neighbor, cell_id) };
            mesh.add_face(level, area, lo, hi);
        }
    }

    log::debug!("level {}: {} faces", level, mesh.levels[level].faces.len());
    Ok(())
}

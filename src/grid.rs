//! Spatial Grid Builder: voxelize a labeled image into level-0 cells.
//!
//! Each pixel with a positive depth fraction extrudes into a centered span of
//! unit voxels along z. Cells are created with dense level-0 ids in scan
//! order, and their 8 corner vertices are deduplicated through a slot array:
//! a vertex is materialized (and assigned an id) only the first time its
//! integer corner coordinate is touched.

use crate::error::MeshError;
use crate::raster::{ColorGrid, Palette};
use crate::types::{CellId, Mesh, VertexId, CORNER_OFFSETS};
use nalgebra::Vector3;

/// Dimensions of the working volume in voxels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridDims {
    pub width: usize,
    pub height: usize,
    pub depth: usize,
}

/// Round `n` up to the next multiple of `divisor`.
pub fn round_up_to_multiple(n: usize, divisor: usize) -> usize {
    n.div_ceil(divisor) * divisor
}

impl GridDims {
    /// Working dimensions for an image: the native bounds expanded so every
    /// axis is divisible by the coarsest cell width `2^levels`, letting
    /// integer octree grouping divide evenly.
    pub fn for_image(image: &ColorGrid, max_depth: usize, levels: usize) -> Self {
        let coarsest = 1usize << levels;
        GridDims {
            width: round_up_to_multiple(image.width(), coarsest),
            height: round_up_to_multiple(image.height(), coarsest),
            depth: round_up_to_multiple(max_depth, coarsest),
        }
    }

    /// Coarser dimensions one octree level up (ceil-halved per axis).
    pub fn halved(&self) -> Self {
        GridDims {
            width: self.width.div_ceil(2),
            height: self.height.div_ceil(2),
            depth: self.depth.div_ceil(2),
        }
    }
}

/// A 3D slot array addressing cells of one level by integer grid coordinate.
///
/// A `None` slot is a grid position with no cell (empty space, or the
/// expansion margin outside the image's native bounds).
#[derive(Clone, Debug)]
pub struct CellGrid {
    pub dims: GridDims,
    slots: Vec<Option<CellId>>,
}

impl CellGrid {
    pub fn empty(dims: GridDims) -> Self {
        CellGrid {
            dims,
            slots: vec![None; dims.width * dims.height * dims.depth],
        }
    }

    fn index(&self, x: usize, y: usize, z: usize) -> usize {
        (x * self.dims.height + y) * self.dims.depth + z
    }

    pub fn get(&self, x: usize, y: usize, z: usize) -> Option<CellId> {
        self.slots[self.index(x, y, z)]
    }

    pub fn set(&mut self, x: usize, y: usize, z: usize, id: CellId) {
        let idx = self.index(x, y, z);
        self.slots[idx] = Some(id);
    }
}

/// Vertex slot array, one slot per integer corner coordinate of the working
/// volume. Ensures every corner is materialized at most once.
struct VertexSlots {
    dims: GridDims,
    slots: Vec<Option<VertexId>>,
}

impl VertexSlots {
    fn new(dims: GridDims) -> Self {
        let n = (dims.width + 1) * (dims.height + 1) * (dims.depth + 1);
        VertexSlots { dims, slots: vec![None; n] }
    }

    fn get_or_insert(&mut self, mesh: &mut Mesh, x: usize, y: usize, z: usize) -> VertexId {
        let idx = (x * (self.dims.height + 1) + y) * (self.dims.depth + 1) + z;
        match self.slots[idx] {
            Some(id) => id,
            None => {
                let id = mesh.add_vertex(Vector3::new(x as f64, y as f64, z as f64));
                self.slots[idx] = Some(id);
                id
            }
        }
    }
}

/// Voxelize the image into a mesh with `levels` (initially empty except for
/// level 0) and the level-0 spatial index.
///
/// Fails with [`MeshError::UnexpectedColor`] if a pixel's color has no
/// palette entry.
pub fn voxelize(
    image: &ColorGrid,
    palette: &Palette,
    levels: usize,
    max_depth: usize,
) -> Result<(Mesh, CellGrid), MeshError> {
    let dims = GridDims::for_image(image, max_depth, levels);
    let mut mesh = Mesh::with_levels(levels);
    let mut grid = CellGrid::empty(dims);
    let mut vertex_slots = VertexSlots::new(dims);

    for x in 0..image.width() {
        for y in 0..image.height() {
            let color = image.get(x, y);
            let material = palette.lookup(color, x, y)?;
            if material.depth_fraction <= 0.0 {
                continue;
            }

            // Center the extruded span in the z-range.
            let num = (max_depth as f64 * material.depth_fraction).ceil() as usize;
            let start_z = (max_depth - num) / 2;
            for z in start_z..start_z + num {
                let id = mesh.add_cell(0, material.initial_temperature, material.conductivity);
                grid.set(x, y, z, id);

                for off in CORNER_OFFSETS {
                    let vid = vertex_slots.get_or_insert(&mut mesh, x + off[0], y + off[1], z + off[2]);
                    mesh.cell_mut(0, id).corners.push(vid);
                }
            }
        }
    }

    log::debug!(
        "voxelized {}x{} image into {} cells, {} vertices ({}x{}x{} working volume)",
        image.width(),
        image.height(),
        mesh.levels[0].cells.len(),
        mesh.vertices.len(),
        dims.width,
        dims.height,
        dims.depth
    );

    Ok((mesh, grid))
}

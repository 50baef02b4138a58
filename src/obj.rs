//! Wavefront OBJ debug dump of the level-0 voxel mesh.
//!
//! A simple visual export for inspection, not part of the binary format:
//! vertices are written once and every leaf cell emits six quads referencing
//! them by 1-based id, grouped by a material name derived from the cell's
//! integer temperature (resolved by the external `ramp.mtl` color ramp).

use crate::types::{corner_index, Mesh};
use std::io::{self, Write};

/// The four corner offsets of each of a cell's six quad faces, in
/// [`crate::types::CORNER_OFFSETS`] coordinates.
const QUAD_CORNERS: [[[usize; 3]; 4]; 6] = [
    [[0, 0, 0], [0, 0, 1], [0, 1, 1], [0, 1, 0]],
    [[0, 0, 0], [1, 0, 0], [1, 0, 1], [0, 0, 1]],
    [[0, 0, 0], [1, 0, 0], [1, 1, 0], [0, 1, 0]],
    [[1, 0, 0], [1, 0, 1], [1, 1, 1], [1, 1, 0]],
    [[0, 0, 1], [1, 0, 1], [1, 1, 1], [0, 1, 1]],
    [[0, 1, 0], [1, 1, 0], [1, 1, 1], [0, 1, 1]],
];

/// Write the level-0 cells as quads to `w`.
pub fn write_obj<W: Write>(mesh: &Mesh, w: &mut W) -> io::Result<()> {
    writeln!(w, "mtllib ramp.mtl")?;

    for v in &mesh.vertices {
        writeln!(w, "v {} {} {}", v.position.x, v.position.y, v.position.z)?;
    }

    for cell in &mesh.levels[0].cells {
        writeln!(w, "usemtl r{}", cell.temperature as i64)?;
        for quad in QUAD_CORNERS {
            write!(w, "f")?;
            for off in quad {
                // OBJ indices are 1-based.
                write!(w, " {}", cell.corners[corner_index(off)].0 + 1)?;
            }
            writeln!(w)?;
        }
    }

    Ok(())
}

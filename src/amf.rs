//! Adaptive Mesh Format (AMF) serialization.
//!
//! Little-endian fixed layout, framed by a magic number before and after
//! every logical section so downstream readers detect silent truncation:
//!
//! ```text
//! HEADER:  magic | i32 num_levels | i32 num_vertices
//! VERTICES num_vertices × { f64 x, f64 y, f64 z }          (24 bytes each)
//!          magic
//! PER LEVEL (num_levels times):
//!   magic | i32 level | i32 num_cells | i32 num_faces
//!   CELLS: num_cells × { i32 level, f64 temperature, f64 conductivity,
//!                        i32[K] in_face_ids, i32[K] out_face_ids,
//!                        i32[8] vertex_ids, i32[8] child_cell_ids }
//!   magic
//!   FACES: num_faces × { i32 level, f64 area, i32 in_cell, i32 out_cell }
//!          (20 bytes each)
//!   magic
//! ```
//!
//! `-1` marks an absent id slot. `K` is the per-cell face bound of the
//! chosen [`AmfFormat`]. All structural invariants are validated before the
//! first byte is written, and [`write_mesh_file`] finalizes through a rename
//! so a crash mid-write never leaves a plausible-looking partial file.

use crate::error::MeshError;
use crate::hierarchy::CoarseningStrategy;
use crate::types::{Cell, CellId, Face, FaceId, Mesh, VertexId};
use std::fs;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

/// Section-framing sentinel.
pub const MAGIC: u32 = 0xA115_CA1E;

pub const VERTEX_RECORD_SIZE: usize = 24;
pub const FACE_RECORD_SIZE: usize = 20;

/// Fixed-layout parameters of the cell record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AmfFormat {
    /// Maximum in-faces (and, separately, out-faces) per cell.
    pub max_faces: usize,
}

impl AmfFormat {
    /// Regular octree coarsening never exceeds 3 faces per direction
    /// (one per positive axis). 108-byte cells.
    pub const OCTREE: AmfFormat = AmfFormat { max_faces: 3 };

    /// Flood-fill clusters have irregular coarse connectivity; allow far
    /// more faces per cell. 284-byte cells.
    pub const FLOOD: AmfFormat = AmfFormat { max_faces: 25 };

    /// The format matching a coarsening strategy.
    pub fn for_strategy(strategy: &CoarseningStrategy) -> AmfFormat {
        match strategy {
            CoarseningStrategy::Octree => AmfFormat::OCTREE,
            CoarseningStrategy::FloodFill(_) => AmfFormat::FLOOD,
        }
    }

    /// On-disk size of one cell record.
    pub fn cell_record_size(&self) -> usize {
        // level + temperature + conductivity + 2×K face ids + 8 vertex ids
        // + 8 child ids
        4 + 8 + 8 + 2 * self.max_faces * 4 + 8 * 4 + 8 * 4
    }
}

/// Output filename matching the original tooling:
/// `mesh[_flood]_<stem>_d<max_depth>_l<levels>.amf`.
pub fn amf_file_name(stem: &str, strategy: &CoarseningStrategy, max_depth: usize, levels: usize) -> String {
    match strategy {
        CoarseningStrategy::Octree => format!("mesh_{stem}_d{max_depth}_l{levels}.amf"),
        CoarseningStrategy::FloodFill(_) => format!("mesh_flood_{stem}_d{max_depth}_l{levels}.amf"),
    }
}

/// Check every structural invariant the format requires. Run before any
/// byte is written; all violations are fatal.
pub fn validate(mesh: &Mesh, format: AmfFormat) -> Result<(), MeshError> {
    if mesh.levels.is_empty() {
        return Ok(());
    }
    let top = mesh.num_levels() - 1;

    for (level, lvl) in mesh.levels.iter().enumerate() {
        for (idx, cell) in lvl.cells.iter().enumerate() {
            let id = CellId(idx);
            if cell.level != level {
                return Err(MeshError::LevelMismatch { cell: id, expected: level, found: cell.level });
            }
            if level > 0 && cell.children.is_empty() {
                return Err(MeshError::MissingChildren { level, cell: id });
            }
            if level < top && cell.parent.is_none() {
                return Err(MeshError::MissingParent { level, cell: id });
            }
            if cell.children.len() > 8 {
                return Err(MeshError::TooManyChildren { level, cell: id, count: cell.children.len() });
            }
            if cell.corners.len() > 8 {
                return Err(MeshError::TooManyCorners { level, cell: id, count: cell.corners.len() });
            }
            if cell.in_faces.len() > format.max_faces {
                return Err(MeshError::TooManyFaces {
                    level,
                    cell: id,
                    count: cell.in_faces.len(),
                    max: format.max_faces,
                });
            }
            if cell.out_faces.len() > format.max_faces {
                return Err(MeshError::TooManyFaces {
                    level,
                    cell: id,
                    count: cell.out_faces.len(),
                    max: format.max_faces,
                });
            }
            if level == 0 && !cell.children.is_empty() {
                return Err(MeshError::LeafWithChildren { cell: id, count: cell.children.len() });
            }
            // Child back-references: one level down, pointing back here.
            for &child in &cell.children {
                let child_cell = match mesh.levels[level - 1].cells.get(child.0) {
                    Some(c) => c,
                    None => {
                        return Err(MeshError::IndexMismatch {
                            kind: "child cell",
                            index: mesh.levels[level - 1].cells.len(),
                            id: child.0,
                        })
                    }
                };
                if child_cell.parent != Some(id) {
                    return Err(MeshError::InconsistentParent { level, parent: id, child });
                }
                if child_cell.level != level - 1 {
                    return Err(MeshError::LevelMismatch {
                        cell: child,
                        expected: level - 1,
                        found: child_cell.level,
                    });
                }
            }
        }

        for (idx, face) in lvl.faces.iter().enumerate() {
            let id = FaceId(idx);
            if face.in_cell == face.out_cell {
                return Err(MeshError::SelfFace { level, face: id });
            }
            let endpoints =
                lvl.cells.get(face.in_cell.0).zip(lvl.cells.get(face.out_cell.0));
            match endpoints {
                Some((i, o)) if face.level == level && i.level == level && o.level == level => {}
                _ => return Err(MeshError::FaceLevelMismatch { level, face: id }),
            }
        }
    }

    Ok(())
}

// --- Record encoding ---

fn push_i32(buf: &mut Vec<u8>, v: i32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn push_f64(buf: &mut Vec<u8>, v: f64) {
    buf.extend_from_slice(&v.to_le_bytes());
}

/// Write `ids` as i32 slots padded with -1 up to `len`.
fn push_id_slots(buf: &mut Vec<u8>, ids: impl Iterator<Item = usize>, len: usize) {
    let mut written = 0;
    for id in ids {
        push_i32(buf, id as i32);
        written += 1;
    }
    for _ in written..len {
        push_i32(buf, -1);
    }
}

fn encode_cell(cell: &Cell, format: AmfFormat, buf: &mut Vec<u8>) {
    buf.clear();
    push_i32(buf, cell.level as i32);
    push_f64(buf, cell.temperature);
    push_f64(buf, cell.conductivity);
    push_id_slots(buf, cell.in_faces.iter().map(|f| f.0), format.max_faces);
    push_id_slots(buf, cell.out_faces.iter().map(|f| f.0), format.max_faces);
    push_id_slots(buf, cell.corners.iter().map(|v| v.0), 8);
    push_id_slots(buf, cell.children.iter().map(|c| c.0), 8);
}

fn encode_face(face: &Face, buf: &mut Vec<u8>) {
    buf.clear();
    push_i32(buf, face.level as i32);
    push_f64(buf, face.area);
    push_i32(buf, face.in_cell.0 as i32);
    push_i32(buf, face.out_cell.0 as i32);
}

fn write_magic<W: Write>(w: &mut W) -> Result<(), MeshError> {
    w.write_all(&MAGIC.to_le_bytes())?;
    Ok(())
}

fn check_record(kind: &'static str, got: usize, expected: usize) -> Result<(), MeshError> {
    if got != expected {
        return Err(MeshError::RecordSizeMismatch { kind, got, expected });
    }
    Ok(())
}

/// Serialize the full multi-level mesh. Validates first; nothing is written
/// if any invariant fails.
pub fn write_mesh<W: Write>(mesh: &Mesh, format: AmfFormat, w: &mut W) -> Result<(), MeshError> {
    validate(mesh, format)?;

    let mut buf = Vec::with_capacity(format.cell_record_size());

    // Header.
    write_magic(w)?;
    w.write_all(&(mesh.num_levels() as i32).to_le_bytes())?;
    w.write_all(&(mesh.vertices.len() as i32).to_le_bytes())?;

    // Vertices.
    for v in &mesh.vertices {
        buf.clear();
        push_f64(&mut buf, v.position.x);
        push_f64(&mut buf, v.position.y);
        push_f64(&mut buf, v.position.z);
        check_record("vertex", buf.len(), VERTEX_RECORD_SIZE)?;
        w.write_all(&buf)?;
    }
    write_magic(w)?;

    for (level, lvl) in mesh.levels.iter().enumerate() {
        write_magic(w)?;
        w.write_all(&(level as i32).to_le_bytes())?;
        w.write_all(&(lvl.cells.len() as i32).to_le_bytes())?;
        w.write_all(&(lvl.faces.len() as i32).to_le_bytes())?;

        let cell_size = format.cell_record_size();
        for cell in &lvl.cells {
            encode_cell(cell, format, &mut buf);
            check_record("cell", buf.len(), cell_size)?;
            w.write_all(&buf)?;
        }
        write_magic(w)?;

        for face in &lvl.faces {
            encode_face(face, &mut buf);
            check_record("face", buf.len(), FACE_RECORD_SIZE)?;
            w.write_all(&buf)?;
        }
        write_magic(w)?;

        log::debug!(
            "wrote level {}: {} cells ({} bytes each), {} faces",
            level,
            lvl.cells.len(),
            cell_size,
            lvl.faces.len()
        );
    }

    Ok(())
}

/// Write the mesh to `path`, staging through `<path>.tmp` and renaming on
/// success so the final file only ever appears complete.
pub fn write_mesh_file(mesh: &Mesh, format: AmfFormat, path: &Path) -> Result<(), MeshError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = std::path::PathBuf::from(tmp);

    {
        let file = fs::File::create(&tmp)?;
        let mut w = BufWriter::new(file);
        if let Err(e) = write_mesh(mesh, format, &mut w) {
            drop(w);
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        w.flush()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

// --- Reading (round-trip verification) ---

fn read_u32<R: Read>(r: &mut R) -> Result<u32, MeshError> {
    let mut b = [0u8; 4];
    r.read_exact(&mut b)?;
    Ok(u32::from_le_bytes(b))
}

fn read_i32<R: Read>(r: &mut R) -> Result<i32, MeshError> {
    let mut b = [0u8; 4];
    r.read_exact(&mut b)?;
    Ok(i32::from_le_bytes(b))
}

fn read_f64<R: Read>(r: &mut R) -> Result<f64, MeshError> {
    let mut b = [0u8; 8];
    r.read_exact(&mut b)?;
    Ok(f64::from_le_bytes(b))
}

/// Read a section count, rejecting negative values from a corrupt header
/// before they turn into huge `usize` loop bounds.
fn read_count<R: Read>(r: &mut R, kind: &'static str) -> Result<usize, MeshError> {
    let v = read_i32(r)?;
    if v < 0 {
        return Err(MeshError::NegativeCount { kind, found: v });
    }
    Ok(v as usize)
}

fn expect_magic<R: Read>(r: &mut R) -> Result<(), MeshError> {
    let found = read_u32(r)?;
    if found != MAGIC {
        return Err(MeshError::BadMagic { found });
    }
    Ok(())
}

fn read_id_slots<R: Read>(r: &mut R, len: usize) -> Result<Vec<usize>, MeshError> {
    let mut out = Vec::new();
    for _ in 0..len {
        let v = read_i32(r)?;
        if v >= 0 {
            out.push(v as usize);
        }
    }
    Ok(out)
}

/// Read a mesh back from the framed binary layout. Parent back-references
/// (which are not part of the file) are reconstructed from child lists.
pub fn read_mesh<R: Read>(r: &mut R, format: AmfFormat) -> Result<Mesh, MeshError> {
    expect_magic(r)?;
    let num_levels = read_count(r, "level")?;
    let num_vertices = read_count(r, "vertex")?;

    let mut mesh = Mesh::with_levels(num_levels);
    for _ in 0..num_vertices {
        let x = read_f64(r)?;
        let y = read_f64(r)?;
        let z = read_f64(r)?;
        mesh.add_vertex(nalgebra::Vector3::new(x, y, z));
    }
    expect_magic(r)?;

    for level in 0..num_levels {
        expect_magic(r)?;
        let stored_level = read_i32(r)? as usize;
        if stored_level != level {
            return Err(MeshError::IndexMismatch { kind: "level", index: level, id: stored_level });
        }
        let num_cells = read_count(r, "cell")?;
        let num_faces = read_count(r, "face")?;

        for _ in 0..num_cells {
            let cell_level = read_i32(r)? as usize;
            let temperature = read_f64(r)?;
            let conductivity = read_f64(r)?;
            let in_faces = read_id_slots(r, format.max_faces)?;
            let out_faces = read_id_slots(r, format.max_faces)?;
            let corners = read_id_slots(r, 8)?;
            let children = read_id_slots(r, 8)?;

            let id = mesh.add_cell(level, temperature, conductivity);
            let cell = mesh.cell_mut(level, id);
            cell.level = cell_level;
            cell.in_faces = in_faces.into_iter().map(FaceId).collect();
            cell.out_faces = out_faces.into_iter().map(FaceId).collect();
            cell.corners = corners.into_iter().map(VertexId).collect();
            cell.children = children.into_iter().map(CellId).collect();
        }
        expect_magic(r)?;

        for _ in 0..num_faces {
            let face_level = read_i32(r)? as usize;
            let area = read_f64(r)?;
            let in_cell = CellId(read_i32(r)? as usize);
            let out_cell = CellId(read_i32(r)? as usize);
            mesh.levels[level].faces.push(Face { level: face_level, area, in_cell, out_cell });
        }
        expect_magic(r)?;
    }

    // Restore parent links from child lists.
    for level in 1..num_levels {
        for idx in 0..mesh.levels[level].cells.len() {
            let children = mesh.levels[level].cells[idx].children.clone();
            for child in children {
                mesh.levels[level - 1].cells[child.0].parent = Some(CellId(idx));
            }
        }
    }

    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_record_sizes_match_format_constants() {
        assert_eq!(AmfFormat::OCTREE.cell_record_size(), 108);
        assert_eq!(AmfFormat::FLOOD.cell_record_size(), 284);
    }

    #[test]
    fn file_name_encodes_parameters() {
        assert_eq!(
            amf_file_name("demo_logo", &CoarseningStrategy::Octree, 16, 3),
            "mesh_demo_logo_d16_l3.amf"
        );
        assert_eq!(
            amf_file_name(
                "demo_logo",
                &CoarseningStrategy::FloodFill(Default::default()),
                8,
                2
            ),
            "mesh_flood_demo_logo_d8_l2.amf"
        );
    }

    #[test]
    fn empty_mesh_is_header_and_frames_only() {
        let mesh = Mesh::with_levels(1);
        let mut buf = Vec::new();
        write_mesh(&mesh, AmfFormat::OCTREE, &mut buf).unwrap();
        // magic + levels + verts | magic | magic + level hdr | magic | magic
        assert_eq!(buf.len(), 4 + 4 + 4 + 4 + 4 + 12 + 4 + 4);
        assert_eq!(&buf[0..4], &MAGIC.to_le_bytes());
        assert_eq!(&buf[buf.len() - 4..], &MAGIC.to_le_bytes());
    }
}

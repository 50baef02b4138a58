//! Core mesh data model: arena-stored vertices, cells, and faces.
//!
//! All entities live in the [`Mesh`] arena and reference each other via typed
//! indices (`VertexId`, `CellId`, `FaceId`). This avoids Rc/RefCell reference
//! cycles in the inherently cyclic cell↔face↔cell graph and matches the
//! id-based on-disk format: an entity's id *is* its array position, so the
//! id-density invariant (dense `[0, count)` ranges per arena) holds by
//! construction.
//!
//! `VertexId` is global; `CellId` and `FaceId` are scoped to a hierarchy
//! level. A cell's `parent` points into the arena one level up, its
//! `children` one level down.

use crate::error::MeshError;
use nalgebra::Vector3;

// --- Typed index handles ---

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VertexId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FaceId(pub usize);

/// Relative corner offsets of a unit cube, in the fixed order shared by
/// vertex registration, octree child gathering, and OBJ quad emission:
/// corner index `i` has x = bit 2, y = bit 1, z = bit 0 of `i`.
pub const CORNER_OFFSETS: [[usize; 3]; 8] = [
    [0, 0, 0],
    [0, 0, 1],
    [0, 1, 0],
    [0, 1, 1],
    [1, 0, 0],
    [1, 0, 1],
    [1, 1, 0],
    [1, 1, 1],
];

/// Inverse of [`CORNER_OFFSETS`]: map a relative corner offset back to its
/// index in a cell's corner list.
pub fn corner_index(offset: [usize; 3]) -> usize {
    offset[0] * 4 + offset[1] * 2 + offset[2]
}

/// A shared corner point of one or more cells.
///
/// Positions are integer grid coordinates stored as reals, matching the
/// on-disk `f64` layout.
#[derive(Clone, Debug, PartialEq)]
pub struct Vertex {
    pub position: Vector3<f64>,
}

/// An axis-aligned mesh element at some hierarchy level, carrying thermal
/// properties.
#[derive(Clone, Debug)]
pub struct Cell {
    /// Hierarchy level; 0 = finest. Stored explicitly because it is part of
    /// the binary cell record, and validated against the arena the cell
    /// lives in before serialization.
    pub level: usize,
    pub temperature: f64,
    pub conductivity: f64,
    /// Faces whose `out_cell` is this cell.
    pub in_faces: Vec<FaceId>,
    /// Faces whose `in_cell` is this cell.
    pub out_faces: Vec<FaceId>,
    /// Corner vertices in [`CORNER_OFFSETS`] order. Leaf cells carry all 8;
    /// coarser cells carry none.
    pub corners: Vec<VertexId>,
    /// Child cells one level down (at most 8). Back-references, not ownership.
    pub children: Vec<CellId>,
    /// Parent cell one level up. Set at most once; re-setting is an error.
    pub parent: Option<CellId>,
    /// Summed contact area towards the +x / +y / +z grid neighbor, recorded
    /// at level 0 by the face builder and aggregated upwards by octree
    /// coarsening to seed coarse face areas.
    pub right_area: f64,
    pub up_area: f64,
    pub fwd_area: f64,
}

impl Cell {
    fn new(level: usize, temperature: f64, conductivity: f64) -> Self {
        Cell {
            level,
            temperature,
            conductivity,
            in_faces: Vec::new(),
            out_faces: Vec::new(),
            corners: Vec::new(),
            children: Vec::new(),
            parent: None,
            right_area: 0.0,
            up_area: 0.0,
            fwd_area: 0.0,
        }
    }
}

/// A directed connectivity edge between two same-level cells, carrying the
/// contact area of their shared boundary.
#[derive(Clone, Debug, PartialEq)]
pub struct Face {
    pub level: usize,
    pub area: f64,
    pub in_cell: CellId,
    pub out_cell: CellId,
}

/// One hierarchy level's worth of cells and faces.
#[derive(Clone, Debug, Default)]
pub struct MeshLevel {
    pub cells: Vec<Cell>,
    pub faces: Vec<Face>,
}

/// The full multi-resolution mesh: a global vertex arena plus per-level cell
/// and face arenas.
#[derive(Clone, Debug)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub levels: Vec<MeshLevel>,
}

impl Mesh {
    /// Create an empty mesh with the given number of hierarchy levels.
    pub fn with_levels(num_levels: usize) -> Self {
        Mesh {
            vertices: Vec::new(),
            levels: vec![MeshLevel::default(); num_levels],
        }
    }

    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    // --- Add entities ---

    pub fn add_vertex(&mut self, position: Vector3<f64>) -> VertexId {
        let id = VertexId(self.vertices.len());
        self.vertices.push(Vertex { position });
        id
    }

    pub fn add_cell(&mut self, level: usize, temperature: f64, conductivity: f64) -> CellId {
        let cells = &mut self.levels[level].cells;
        let id = CellId(cells.len());
        cells.push(Cell::new(level, temperature, conductivity));
        id
    }

    /// Create a directed face and register it on both endpoint cells.
    pub fn add_face(&mut self, level: usize, area: f64, in_cell: CellId, out_cell: CellId) -> FaceId {
        let lvl = &mut self.levels[level];
        let id = FaceId(lvl.faces.len());
        lvl.faces.push(Face { level, area, in_cell, out_cell });
        lvl.cells[in_cell.0].out_faces.push(id);
        lvl.cells[out_cell.0].in_faces.push(id);
        id
    }

    // --- Accessors ---

    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id.0]
    }

    pub fn cell(&self, level: usize, id: CellId) -> &Cell {
        &self.levels[level].cells[id.0]
    }

    pub fn cell_mut(&mut self, level: usize, id: CellId) -> &mut Cell {
        &mut self.levels[level].cells[id.0]
    }

    pub fn face(&self, level: usize, id: FaceId) -> &Face {
        &self.levels[level].faces[id.0]
    }

    /// Link a child cell to its parent one level up. Assigning a parent
    /// twice is a structural violation and fails.
    pub fn set_parent(&mut self, level: usize, child: CellId, parent: CellId) -> Result<(), MeshError> {
        let cell = &mut self.levels[level].cells[child.0];
        if cell.parent.is_some() {
            return Err(MeshError::DuplicateParent { level, cell: child });
        }
        cell.parent = Some(parent);
        Ok(())
    }

    /// All cells sharing a face with `id` at the given level (the graph
    /// adjacency used by flood-fill clustering).
    pub fn connected_cells(&self, level: usize, id: CellId) -> Vec<CellId> {
        let lvl = &self.levels[level];
        let cell = &lvl.cells[id.0];
        let mut out = Vec::with_capacity(cell.in_faces.len() + cell.out_faces.len());
        for &f in &cell.in_faces {
            out.push(lvl.faces[f.0].in_cell);
        }
        for &f in &cell.out_faces {
            out.push(lvl.faces[f.0].out_cell);
        }
        out
    }

    /// Does any face (in either direction) already connect `a` and `b`?
    pub fn cells_connected(&self, level: usize, a: CellId, b: CellId) -> bool {
        let lvl = &self.levels[level];
        let cell = &lvl.cells[a.0];
        cell.in_faces.iter().any(|&f| lvl.faces[f.0].in_cell == b)
            || cell.out_faces.iter().any(|&f| lvl.faces[f.0].out_cell == b)
    }
}

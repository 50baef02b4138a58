//! Pipeline error type.
//!
//! Every failure here is fatal for the run: the mesh generator is an offline
//! batch transform with no retry or partial-success mode, so errors propagate
//! straight out of [`crate::builder::build_mesh`] and abort the pipeline.

use crate::types::{CellId, FaceId};
use std::fmt;
use std::io;

/// Errors produced by mesh construction and serialization.
#[derive(Debug)]
pub enum MeshError {
    /// A pixel's color has no entry in the material palette.
    UnexpectedColor { x: usize, y: usize, color: u32 },
    /// A non-leaf cell has no existing children.
    MissingChildren { level: usize, cell: CellId },
    /// A level-0 cell lists child cells.
    LeafWithChildren { cell: CellId, count: usize },
    /// A cell below the top level has no parent after hierarchy building.
    MissingParent { level: usize, cell: CellId },
    /// A second parent was assigned to an already-parented cell.
    DuplicateParent { level: usize, cell: CellId },
    /// A child's parent back-reference does not point at the cell that
    /// lists it as a child.
    InconsistentParent { level: usize, parent: CellId, child: CellId },
    /// A flood-fill cluster was materialized with no member cells.
    EmptyCluster { depth: usize },
    /// A cell's stored level field disagrees with the arena it lives in.
    LevelMismatch { cell: CellId, expected: usize, found: usize },
    /// A face connects cells at different levels, or its stored level
    /// disagrees with its endpoints.
    FaceLevelMismatch { level: usize, face: FaceId },
    /// A face connects a cell to itself.
    SelfFace { level: usize, face: FaceId },
    /// A cell's in- or out-face list exceeds the serialization format's bound.
    TooManyFaces { level: usize, cell: CellId, count: usize, max: usize },
    /// A cell references more than 8 children.
    TooManyChildren { level: usize, cell: CellId, count: usize },
    /// A cell references more than 8 corner vertices.
    TooManyCorners { level: usize, cell: CellId, count: usize },
    /// A fixed-layout record serialized to an unexpected byte count.
    RecordSizeMismatch { kind: &'static str, got: usize, expected: usize },
    /// An entity sits at an array position different from its assigned id.
    IndexMismatch { kind: &'static str, index: usize, id: usize },
    /// A section count read from a mesh file is negative.
    NegativeCount { kind: &'static str, found: i32 },
    /// A magic-number frame was missing or corrupt while reading.
    BadMagic { found: u32 },
    /// Underlying I/O failure.
    Io(io::Error),
}

impl fmt::Display for MeshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeshError::UnexpectedColor { x, y, color } => {
                write!(f, "unexpected color {color:#010x} at pixel ({x}, {y})")
            }
            MeshError::MissingChildren { level, cell } => {
                write!(f, "cell {cell:?} at level {level} has no child cells")
            }
            MeshError::LeafWithChildren { cell, count } => {
                write!(f, "level-0 cell {cell:?} lists {count} child cells")
            }
            MeshError::MissingParent { level, cell } => {
                write!(f, "cell {cell:?} at level {level} has no parent cell")
            }
            MeshError::DuplicateParent { level, cell } => {
                write!(f, "cell {cell:?} at level {level} already has a parent")
            }
            MeshError::InconsistentParent { level, parent, child } => {
                write!(
                    f,
                    "child {child:?} of cell {parent:?} at level {level} \
                     does not point back at its parent"
                )
            }
            MeshError::EmptyCluster { depth } => {
                write!(f, "cluster at depth {depth} has no member cells")
            }
            MeshError::LevelMismatch { cell, expected, found } => {
                write!(
                    f,
                    "cell {cell:?} stores level {found} but lives at level {expected}"
                )
            }
            MeshError::FaceLevelMismatch { level, face } => {
                write!(f, "face {face:?} at level {level} has mismatched endpoint levels")
            }
            MeshError::SelfFace { level, face } => {
                write!(f, "face {face:?} at level {level} connects a cell to itself")
            }
            MeshError::TooManyFaces { level, cell, count, max } => {
                write!(
                    f,
                    "cell {cell:?} at level {level} has {count} faces (format maximum {max})"
                )
            }
            MeshError::TooManyChildren { level, cell, count } => {
                write!(f, "cell {cell:?} at level {level} has {count} children (maximum 8)")
            }
            MeshError::TooManyCorners { level, cell, count } => {
                write!(f, "cell {cell:?} at level {level} has {count} corners (maximum 8)")
            }
            MeshError::RecordSizeMismatch { kind, got, expected } => {
                write!(f, "{kind} record serialized to {got} bytes, expected {expected}")
            }
            MeshError::IndexMismatch { kind, index, id } => {
                write!(f, "{kind} at array position {index} carries id {id}")
            }
            MeshError::NegativeCount { kind, found } => {
                write!(f, "negative {kind} count {found} in mesh file")
            }
            MeshError::BadMagic { found } => {
                write!(f, "bad magic number {found:#010x} in mesh file")
            }
            MeshError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for MeshError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MeshError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for MeshError {
    fn from(e: io::Error) -> Self {
        MeshError::Io(e)
    }
}

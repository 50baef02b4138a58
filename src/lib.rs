//! logomesh — converts a 2D labeled image (a logo) into a multi-resolution
//! volumetric mesh of axis-aligned cells connected by faces, serialized in
//! the Adaptive Mesh Format (AMF) for downstream simulation (e.g. heat
//! diffusion).
//!
//! Pipeline stages, in dependency order:
//! 1. [`grid::voxelize`] — image → level-0 cells with physical properties
//!    and deduplicated corner vertices.
//! 2. [`connectivity::build_leaf_faces`] — directed unit-area faces between
//!    adjacent leaf cells.
//! 3. [`hierarchy`] — coarser levels via regular octree aggregation or
//!    flood-fill graph clustering.
//! 4. [`connectivity::build_coarse_faces`] — connectivity faces between
//!    coarse cells, reconstructed from child adjacency.
//! 5. [`amf`] — validated, magic-framed binary serialization.
//!
//! [`builder::build_mesh`] runs the whole pipeline:
//!
//! ```
//! use logomesh::{build_mesh, ColorGrid, MeshConfig, Palette};
//! use logomesh::raster::BLACK;
//!
//! let image = ColorGrid::solid(2, 2, BLACK);
//! let mesh = build_mesh(&image, &Palette::demo_logo(), &MeshConfig::new(2, 4)).unwrap();
//! assert_eq!(mesh.num_levels(), 2);
//! ```

pub mod amf;
pub mod builder;
pub mod connectivity;
pub mod error;
pub mod grid;
pub mod hierarchy;
pub mod obj;
pub mod raster;
pub mod types;

pub use builder::{build_mesh, MeshConfig};
pub use error::MeshError;
pub use hierarchy::{CoarseningStrategy, FloodParams};
pub use raster::{ColorGrid, Material, Palette};
pub use types::{Cell, CellId, Face, FaceId, Mesh, Vertex, VertexId};

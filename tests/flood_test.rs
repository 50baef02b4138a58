use logomesh::amf::{validate, write_mesh, AmfFormat};
use logomesh::raster::{ColorGrid, Palette, BLACK};
use logomesh::{build_mesh, CoarseningStrategy, FloodParams, MeshConfig};
use std::collections::HashSet;

fn flood_config(levels: usize, max_depth: usize, seed: u64) -> MeshConfig {
    MeshConfig::new(levels, max_depth).with_strategy(CoarseningStrategy::FloodFill(FloodParams {
        seed: Some(seed),
        ..Default::default()
    }))
}

/// A connected 8-cell block with leaf clusters capped at 6 bisects exactly
/// once: level 1 holds two coarse cells whose child sets partition all 8
/// leaves with no overlap and no omission.
#[test]
fn eight_cell_block_bisects_once() {
    let image = ColorGrid::solid(2, 2, BLACK);
    let config = flood_config(2, 2, 7);
    let mesh = build_mesh(&image, &Palette::demo_logo(), &config).unwrap();

    assert_eq!(mesh.levels[0].cells.len(), 8);
    assert_eq!(mesh.levels[1].cells.len(), 2);

    let mut claimed = HashSet::new();
    for cell in &mesh.levels[1].cells {
        assert!(!cell.children.is_empty());
        assert!(cell.children.len() <= 6);
        for &child in &cell.children {
            assert!(claimed.insert(child), "leaf {child:?} claimed twice");
        }
    }
    assert_eq!(claimed.len(), 8);

    // Farthest-pair seeding picks opposite corners of the block, so the two
    // frontiers claim 4 cells each.
    assert_eq!(mesh.levels[1].cells[0].children.len(), 4);
    assert_eq!(mesh.levels[1].cells[1].children.len(), 4);
}

/// The two halves of the 8-cell block touch along 6 unit faces, all folded
/// into a single canonical coarse face.
#[test]
fn coarse_face_sums_boundary_area() {
    let image = ColorGrid::solid(2, 2, BLACK);
    let config = flood_config(2, 2, 7);
    let mesh = build_mesh(&image, &Palette::demo_logo(), &config).unwrap();

    assert_eq!(mesh.levels[1].faces.len(), 1);
    let face = &mesh.levels[1].faces[0];
    assert_eq!(face.area, 6.0);
    // Canonical orientation: lower id in, higher id out.
    assert!(face.in_cell < face.out_cell);
}

#[test]
fn small_inputs_skip_bisection() {
    // 4 cells <= max_cluster_size: the whole graph is one leaf cluster and
    // level 1 is a single cell.
    let image = ColorGrid::solid(2, 2, BLACK);
    let config = flood_config(2, 1, 3);
    let mesh = build_mesh(&image, &Palette::demo_logo(), &config).unwrap();

    assert_eq!(mesh.levels[0].cells.len(), 4);
    assert_eq!(mesh.levels[1].cells.len(), 1);
    assert_eq!(mesh.cell(1, logomesh::CellId(0)).children.len(), 4);
}

#[test]
fn clustered_mesh_validates_and_averages() {
    let image = ColorGrid::solid(6, 6, BLACK);
    let config = flood_config(2, 4, 99);
    let mesh = build_mesh(&image, &Palette::demo_logo(), &config).unwrap();

    validate(&mesh, AmfFormat::FLOOD).unwrap();

    for cell in &mesh.levels[1].cells {
        let n = cell.children.len() as f64;
        let sum: f64 = cell.children.iter().map(|&c| mesh.cell(0, c).temperature).sum();
        assert!((cell.temperature - sum / n).abs() < 1e-9);
        let sum: f64 = cell.children.iter().map(|&c| mesh.cell(0, c).conductivity).sum();
        assert!((cell.conductivity - sum / n).abs() < 1e-9);
    }
}

/// Entropy-seeded partitions vary from run to run, but every run must
/// produce a structurally valid mesh whose coarse cells partition the
/// leaves exactly.
#[test]
fn unseeded_runs_keep_structural_invariants() {
    let image = ColorGrid::solid(6, 6, BLACK);
    let config = MeshConfig::new(2, 4)
        .with_strategy(CoarseningStrategy::FloodFill(FloodParams::default()));
    let palette = Palette::demo_logo();

    for _ in 0..10 {
        let mesh = build_mesh(&image, &palette, &config).unwrap();
        validate(&mesh, AmfFormat::FLOOD).unwrap();

        let mut claimed = HashSet::new();
        for cell in &mesh.levels[1].cells {
            assert!(!cell.children.is_empty());
            for &child in &cell.children {
                assert!(claimed.insert(child), "leaf {child:?} claimed twice");
            }
        }
        assert_eq!(claimed.len(), mesh.levels[0].cells.len());
    }
}

#[test]
fn seeded_runs_are_reproducible() {
    let image = ColorGrid::solid(6, 6, BLACK);
    let config = flood_config(3, 4, 1234);

    let palette = Palette::demo_logo();
    let mesh_a = build_mesh(&image, &palette, &config).unwrap();
    let mesh_b = build_mesh(&image, &palette, &config).unwrap();

    let mut bytes_a = Vec::new();
    let mut bytes_b = Vec::new();
    write_mesh(&mesh_a, AmfFormat::FLOOD, &mut bytes_a).unwrap();
    write_mesh(&mesh_b, AmfFormat::FLOOD, &mut bytes_b).unwrap();
    assert_eq!(bytes_a, bytes_b);
}

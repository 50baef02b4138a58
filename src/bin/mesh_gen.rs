//! Demo mesh generator.
//!
//! Builds a procedurally drawn demo logo (image decoding is an external
//! concern), runs the mesh pipeline, and writes the AMF file — plus an OBJ
//! dump of level 0 when `-obj` is given.
//!
//! Usage: `mesh_gen [levels] [max_depth] [--flood] [--seed=N] [-obj]`

use logomesh::amf::{amf_file_name, write_mesh_file, AmfFormat};
use logomesh::hierarchy::FloodParams;
use logomesh::obj::write_obj;
use logomesh::raster::{BLACK, GREEN, ORANGE, WHITE};
use logomesh::{build_mesh, ColorGrid, CoarseningStrategy, MeshConfig, Palette};
use std::path::Path;
use std::process::ExitCode;

/// A 32×32 stand-in for the demo logo: a green backing plate, a cool black
/// bar and a hot orange bar.
fn demo_logo() -> ColorGrid {
    ColorGrid::from_fn(32, 32, |x, y| {
        if (4..28).contains(&x) && (12..16).contains(&y) {
            BLACK
        } else if (4..28).contains(&x) && (18..22).contains(&y) {
            ORANGE
        } else if (2..30).contains(&x) && (8..26).contains(&y) {
            GREEN
        } else {
            WHITE
        }
    })
}

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let positional: Vec<&String> = args.iter().filter(|a| !a.starts_with('-')).collect();
    let levels: usize = positional.first().and_then(|s| s.parse().ok()).unwrap_or(1);
    let max_depth: usize = positional.get(1).and_then(|s| s.parse().ok()).unwrap_or(16);
    let flood = args.iter().any(|a| a == "--flood");
    let dump_obj = args.iter().any(|a| a == "-obj");
    let seed: Option<u64> = args
        .iter()
        .find_map(|a| a.strip_prefix("--seed="))
        .and_then(|s| s.parse().ok());

    let strategy = if flood {
        CoarseningStrategy::FloodFill(FloodParams { seed, ..Default::default() })
    } else {
        CoarseningStrategy::Octree
    };
    let config = MeshConfig::new(levels, max_depth).with_strategy(strategy.clone());

    let image = demo_logo();
    let mesh = match build_mesh(&image, &Palette::demo_logo(), &config) {
        Ok(mesh) => mesh,
        Err(e) => {
            eprintln!("mesh construction failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    println!("levels: {levels}");
    println!("vertices: {}", mesh.vertices.len());
    for (level, lvl) in mesh.levels.iter().enumerate() {
        println!(
            "LEVEL {} - {:>10} cells {:>10} faces",
            level,
            lvl.cells.len(),
            lvl.faces.len()
        );
    }

    if dump_obj {
        let path = Path::new("level0.obj");
        let result = std::fs::File::create(path)
            .map(std::io::BufWriter::new)
            .and_then(|mut w| {
                write_obj(&mesh, &mut w)?;
                use std::io::Write;
                w.flush()
            });
        if let Err(e) = result {
            eprintln!("obj dump failed: {e}");
            return ExitCode::FAILURE;
        }
        println!("wrote {}", path.display());
    }

    let file_name = amf_file_name("demo_logo", &strategy, max_depth, levels);
    let format = AmfFormat::for_strategy(&strategy);
    if let Err(e) = write_mesh_file(&mesh, format, Path::new(&file_name)) {
        eprintln!("mesh serialization failed: {e}");
        return ExitCode::FAILURE;
    }
    println!("wrote {file_name}");

    ExitCode::SUCCESS
}

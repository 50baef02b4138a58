//! Image source and material palette.
//!
//! Image decoding is an external collaborator: the pipeline consumes an
//! already-decoded [`ColorGrid`] of RGBA-packed color values. The [`Palette`]
//! maps each color to the physical properties of the material it denotes.

use crate::error::MeshError;
use std::collections::HashMap;

// Demo logo palette colors (RGBA packed, high byte = red).
pub const WHITE: u32 = 0xFFFF_FFFF;
pub const BLACK: u32 = 0x231F_20FF;
pub const ORANGE: u32 = 0xF687_12FF;
pub const GREEN: u32 = 0x82FF_7AFF;

/// An in-memory 2D grid of RGBA-packed color values.
#[derive(Clone, Debug)]
pub struct ColorGrid {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
}

impl ColorGrid {
    /// Build a grid from row-major pixel data. Panics if `pixels` does not
    /// hold exactly `width * height` values.
    pub fn from_pixels(width: usize, height: usize, pixels: Vec<u32>) -> Self {
        assert_eq!(pixels.len(), width * height, "pixel count mismatch");
        ColorGrid { width, height, pixels }
    }

    /// Build a grid by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> u32) -> Self {
        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        ColorGrid { width, height, pixels }
    }

    /// A grid filled with a single color.
    pub fn solid(width: usize, height: usize, color: u32) -> Self {
        ColorGrid {
            width,
            height,
            pixels: vec![color; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> u32 {
        self.pixels[y * self.width + x]
    }
}

/// Physical properties of one palette material.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    /// Fraction of the maximum z-extent this material fills, in `[0, 1]`.
    /// Zero means the pixel produces no cells.
    pub depth_fraction: f64,
    pub initial_temperature: f64,
    pub conductivity: f64,
}

/// Color → material lookup table.
///
/// Every color occurring in the source image must have an entry; a miss is a
/// fatal [`MeshError::UnexpectedColor`].
#[derive(Clone, Debug, Default)]
pub struct Palette {
    entries: HashMap<u32, Material>,
}

impl Palette {
    pub fn new() -> Self {
        Palette::default()
    }

    pub fn insert(&mut self, color: u32, material: Material) -> &mut Self {
        self.entries.insert(color, material);
        self
    }

    /// Look up the material for the pixel at `(x, y)`.
    pub fn lookup(&self, color: u32, x: usize, y: usize) -> Result<Material, MeshError> {
        self.entries
            .get(&color)
            .copied()
            .ok_or(MeshError::UnexpectedColor { x, y, color })
    }

    /// The original demo-logo table: white is empty space, black a cool
    /// full-depth letter, orange a hot full-depth letter, green a half-depth
    /// background construct.
    pub fn demo_logo() -> Self {
        let mut p = Palette::new();
        p.insert(
            WHITE,
            Material { depth_fraction: 0.0, initial_temperature: 0.0, conductivity: 0.0 },
        );
        p.insert(
            BLACK,
            Material { depth_fraction: 1.0, initial_temperature: 0.0, conductivity: 1.0 / 6.0 },
        );
        p.insert(
            ORANGE,
            Material { depth_fraction: 1.0, initial_temperature: 511.0, conductivity: 1.0 / 6.0 },
        );
        p.insert(
            GREEN,
            Material { depth_fraction: 0.5, initial_temperature: 120.0, conductivity: 1.0 / 6.0 },
        );
        p
    }
}

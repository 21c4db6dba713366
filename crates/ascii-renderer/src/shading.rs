// ABOUTME: CPU reference for the ASCII cell-sampling fragment shaders.
// ABOUTME: Same math as shaders/ascii_*.wgsl, evaluated per pixel on an RgbaImage.

use ascii_core::{Color, ATLAS_GRID};
use image::RgbaImage;

use crate::atlas::{glyph_cell, GlyphAtlas};

/// Rec. 601 luma weights.
pub const LUMA_WEIGHTS: [f64; 3] = [0.299, 0.587, 0.114];

/// Perceived brightness of an RGB(A) color.
///
/// Summed in f64 so pure white lands on exactly 1.0.
pub fn luma(color: [f32; 4]) -> f32 {
    (LUMA_WEIGHTS[0] * f64::from(color[0])
        + LUMA_WEIGHTS[1] * f64::from(color[1])
        + LUMA_WEIGHTS[2] * f64::from(color[2])) as f32
}

/// Glyph picked for a brightness in [0, 1]: floor((count - 1) * brightness).
pub fn glyph_index(characters_count: u32, brightness: f32) -> u32 {
    let last = characters_count.max(1) as f32 - 1.0;
    (last * brightness.clamp(0.0, 1.0)).floor() as u32
}

/// Number of screen cells along each axis.
pub fn cell_grid(resolution: [f32; 2], cell_size: f32) -> [f32; 2] {
    [resolution[0] / cell_size, resolution[1] / cell_size]
}

/// Snap `uv` to the centre of the cell containing it.
pub fn cell_center(uv: [f32; 2], cells: [f32; 2]) -> [f32; 2] {
    let snap = |coord: f32, count: f32| {
        let grid = 1.0 / count;
        grid * (0.5 + (coord / grid).floor())
    };
    [snap(uv[0], cells[0]), snap(uv[1], cells[1])]
}

/// Atlas coordinate for `uv`'s position inside its cell, in glyph `index`'s atlas cell.
pub fn atlas_uv(index: u32, uv: [f32; 2], cells: [f32; 2]) -> [f32; 2] {
    let (col, row) = glyph_cell(index);
    let local = |coord: f32, count: f32| {
        let scaled = coord * count;
        scaled - scaled.floor()
    };
    let grid = ATLAS_GRID as f32;
    [
        (col as f32 + local(uv[0], cells[0])) / grid,
        (row as f32 + local(uv[1], cells[1])) / grid,
    ]
}

/// Nearest-neighbour lookup with clamp-to-edge, returning normalized RGBA.
pub fn sample_clamped(image: &RgbaImage, uv: [f32; 2]) -> [f32; 4] {
    let texel = |coord: f32, size: u32| ((coord.max(0.0) * size as f32) as u32).min(size - 1);
    let x = texel(uv[0], image.width());
    let y = texel(uv[1], image.height());
    image.get_pixel(x, y).0.map(|c| c as f32 / 255.0)
}

/// How the glyph mask is colored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shading {
    /// Fixed tint; alpha comes from the atlas
    Tint(Color),
    /// The cell's source color; alpha comes from the source
    Source { invert: bool },
}

/// One evaluation of the cell-sampling shader.
pub struct CellShader<'a> {
    pub atlas: &'a GlyphAtlas,
    pub cell_size: f32,
    pub characters_count: u32,
    pub shading: Shading,
}

impl CellShader<'_> {
    /// Brightness used for glyph selection, after optional inversion.
    pub fn brightness(&self, cell_color: [f32; 4]) -> f32 {
        let b = luma(cell_color);
        match self.shading {
            Shading::Source { invert: true } => 1.0 - b,
            _ => b,
        }
    }

    /// Shade one fragment. `source` samples the input frame at a normalized coordinate.
    pub fn shade<F>(&self, uv: [f32; 2], resolution: [f32; 2], source: F) -> [f32; 4]
    where
        F: Fn([f32; 2]) -> [f32; 4],
    {
        let cells = cell_grid(resolution, self.cell_size);
        let cell_color = source(cell_center(uv, cells));

        let index = glyph_index(self.characters_count, self.brightness(cell_color));
        let mask = self.atlas.sample(atlas_uv(index, uv, cells));

        match self.shading {
            Shading::Tint(tint) => [tint.r * mask[0], tint.g * mask[0], tint.b * mask[0], mask[3]],
            Shading::Source { .. } => [
                cell_color[0] * mask[0],
                cell_color[1] * mask[0],
                cell_color[2] * mask[0],
                cell_color[3],
            ],
        }
    }

    /// Shade every pixel of `source`, sampling at pixel centres.
    pub fn render(&self, source: &RgbaImage) -> RgbaImage {
        let (width, height) = source.dimensions();
        let resolution = [width as f32, height as f32];
        RgbaImage::from_fn(width, height, |x, y| {
            let uv = [
                (x as f32 + 0.5) / resolution[0],
                (y as f32 + 0.5) / resolution[1],
            ];
            let color = self.shade(uv, resolution, |at| sample_clamped(source, at));
            image::Rgba(color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8))
        })
    }
}

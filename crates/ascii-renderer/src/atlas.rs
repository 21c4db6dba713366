// ABOUTME: Glyph atlas for the ASCII cell-sampling shaders.
// ABOUTME: Rasterizes a glyph set into a fixed 16x16 grid of 64px cells.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ascii_core::{Color, GlyphSet, ATLAS_GRID};
use image::RgbaImage;

use crate::surface::RasterBackend;

/// Atlas width and height in pixels.
pub const ATLAS_SIZE: u32 = 1024;

/// Width and height of a single glyph cell in pixels.
pub const ATLAS_CELL: u32 = ATLAS_SIZE / ATLAS_GRID;

#[derive(Debug, thiserror::Error)]
pub enum AtlasError {
    #[error("No raster surface available: {0}")]
    SurfaceUnavailable(String),

    #[error("Failed to load font: {0}")]
    FontLoad(String),
}

/// Pixel position of glyph `index`'s cell (column, row) in the grid.
///
/// Rows past the last one are returned as-is; they lie outside the atlas.
pub fn glyph_cell(index: u32) -> (u32, u32) {
    (index % ATLAS_GRID, index / ATLAS_GRID)
}

/// A rasterized glyph set.
pub struct GlyphAtlas {
    pixels: RgbaImage,
    glyph_count: usize,
    font_size: u32,
}

impl GlyphAtlas {
    /// Draw every glyph of `glyphs` centred in its grid cell, white on transparent.
    pub fn build(
        backend: &dyn RasterBackend,
        glyphs: &GlyphSet,
        font_size: u32,
    ) -> Result<Self, AtlasError> {
        let mut surface = backend.acquire(ATLAS_SIZE, ATLAS_SIZE)?;

        if glyphs.overflows_atlas() {
            tracing::warn!(
                "Glyph set has {} glyphs but the atlas holds {}; the rest wrap to the first row",
                glyphs.len(),
                ascii_core::ATLAS_CAPACITY
            );
        }

        surface.clear();
        surface.set_fill(Color::WHITE);
        surface.set_font_size(font_size as f32);

        let half = ATLAS_CELL as f32 / 2.0;
        for (i, c) in glyphs.iter().enumerate() {
            let (col, row) = glyph_cell(i as u32);
            surface.fill_text_centered(
                c,
                (col * ATLAS_CELL) as f32 + half,
                (row * ATLAS_CELL) as f32 + half,
            );
        }

        tracing::debug!("Built glyph atlas: {} glyphs at {}px", glyphs.len(), font_size);

        Ok(Self {
            pixels: surface.read_pixels(),
            glyph_count: glyphs.len(),
            font_size,
        })
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn glyph_count(&self) -> usize {
        self.glyph_count
    }

    pub fn font_size(&self) -> u32 {
        self.font_size
    }

    /// Nearest-neighbour lookup with repeat wrapping, returning normalized RGBA.
    pub fn sample(&self, uv: [f32; 2]) -> [f32; 4] {
        let texel = |coord: f32, size: u32| {
            let wrapped = coord - coord.floor();
            ((wrapped * size as f32) as u32).min(size - 1)
        };
        let x = texel(uv[0], self.pixels.width());
        let y = texel(uv[1], self.pixels.height());
        self.pixels.get_pixel(x, y).0.map(|c| c as f32 / 255.0)
    }
}

static NEXT_TEXTURE_ID: AtomicU64 = AtomicU64::new(1);

/// The atlas as bound to a shader: an immutable raster plus sampling state and
/// a pending-upload flag. Every rebuild produces a handle with a new id.
#[derive(Clone)]
pub struct AtlasTexture {
    id: u64,
    atlas: Arc<GlyphAtlas>,
    needs_update: bool,
}

impl AtlasTexture {
    /// Addressing on both axes. Overflow indices wrap back to row 0.
    pub const WRAP: wgpu::AddressMode = wgpu::AddressMode::Repeat;
    pub const FILTER: wgpu::FilterMode = wgpu::FilterMode::Nearest;

    pub fn new(atlas: GlyphAtlas) -> Self {
        Self {
            id: NEXT_TEXTURE_ID.fetch_add(1, Ordering::Relaxed),
            atlas: Arc::new(atlas),
            needs_update: false,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn atlas(&self) -> &GlyphAtlas {
        &self.atlas
    }

    /// Flag the texture for upload on the next GPU prepare.
    pub fn mark_needs_update(&mut self) {
        self.needs_update = true;
    }

    pub fn needs_update(&self) -> bool {
        self.needs_update
    }

    /// Clear the upload flag, returning whether it was set.
    pub fn take_needs_update(&mut self) -> bool {
        std::mem::take(&mut self.needs_update)
    }

    /// True if both handles refer to the same texture object.
    pub fn same_texture(&self, other: &AtlasTexture) -> bool {
        self.id == other.id && Arc::ptr_eq(&self.atlas, &other.atlas)
    }
}

impl std::fmt::Debug for AtlasTexture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AtlasTexture")
            .field("id", &self.id)
            .field("glyph_count", &self.atlas.glyph_count)
            .field("font_size", &self.atlas.font_size)
            .field("needs_update", &self.needs_update)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bdf::tests::test_font;
    use crate::surface::SoftwareBackend;

    fn backend() -> SoftwareBackend {
        SoftwareBackend::new(Arc::new(test_font()))
    }

    struct NoSurface;

    impl RasterBackend for NoSurface {
        fn acquire(
            &self,
            _width: u32,
            _height: u32,
        ) -> Result<Box<dyn crate::surface::RasterSurface>, AtlasError> {
            Err(AtlasError::SurfaceUnavailable("headless".into()))
        }
    }

    #[test]
    fn grid_positions_follow_index() {
        assert_eq!(glyph_cell(0), (0, 0));
        assert_eq!(glyph_cell(15), (15, 0));
        assert_eq!(glyph_cell(16), (0, 1));
        assert_eq!(glyph_cell(255), (15, 15));
        assert_eq!(glyph_cell(256), (0, 16));
        assert_eq!(ATLAS_CELL, 64);
    }

    #[test]
    fn glyphs_are_centred_in_their_cells() {
        let glyphs = GlyphSet::new(" .:#").unwrap();
        let atlas = GlyphAtlas::build(&backend(), &glyphs, 32).unwrap();
        let pixels = atlas.pixels();
        assert_eq!(pixels.dimensions(), (ATLAS_SIZE, ATLAS_SIZE));

        // Space: nothing drawn in cell 0
        assert!((0..64).all(|x| (0..64).all(|y| pixels.get_pixel(x, y).0[3] == 0)));

        // Full block in cell 3 spans 32px around the cell centre (224, 32)
        assert_eq!(pixels.get_pixel(208, 16).0, [255, 255, 255, 255]);
        assert_eq!(pixels.get_pixel(239, 47).0, [255, 255, 255, 255]);
        assert_eq!(pixels.get_pixel(207, 32).0[3], 0);
        assert_eq!(pixels.get_pixel(240, 32).0[3], 0);

        // Period: 2x2 dot scaled 4x at the centre of cell 1
        assert_eq!(pixels.get_pixel(96, 32).0[3], 255);
        assert_eq!(pixels.get_pixel(80, 20).0[3], 0);
    }

    #[test]
    fn rebuild_is_pixel_identical() {
        let glyphs = GlyphSet::new(" .:#").unwrap();
        let a = GlyphAtlas::build(&backend(), &glyphs, 54).unwrap();
        let b = GlyphAtlas::build(&backend(), &glyphs, 54).unwrap();
        assert_eq!(a.pixels().as_raw(), b.pixels().as_raw());
    }

    #[test]
    fn missing_surface_is_an_error() {
        let glyphs = GlyphSet::new("#").unwrap();
        assert!(matches!(
            GlyphAtlas::build(&NoSurface, &glyphs, 54),
            Err(AtlasError::SurfaceUnavailable(_))
        ));
    }

    #[test]
    fn overflowing_glyphs_are_clipped() {
        let mut chars = " ".repeat(256);
        chars.push('#');
        let glyphs = GlyphSet::new(&chars).unwrap();
        let atlas = GlyphAtlas::build(&backend(), &glyphs, 32).unwrap();

        assert_eq!(atlas.glyph_count(), 257);
        // Glyph 256 would sit in row 16, outside the canvas
        assert!(atlas.pixels().pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn sampling_wraps_and_snaps() {
        let glyphs = GlyphSet::new("#").unwrap();
        let atlas = GlyphAtlas::build(&backend(), &glyphs, 64).unwrap();

        // Centre of cell 0 is covered
        let centre = atlas.sample([0.5 / 16.0, 0.5 / 16.0]);
        assert_eq!(centre, [1.0, 1.0, 1.0, 1.0]);
        // One full period away samples the same texel
        assert_eq!(atlas.sample([1.0 + 0.5 / 16.0, -1.0 + 0.5 / 16.0]), centre);
        // Cell 1 is empty
        assert_eq!(atlas.sample([1.5 / 16.0, 0.5 / 16.0]), [0.0; 4]);
    }

    #[test]
    fn texture_handles_are_distinct_per_build() {
        let glyphs = GlyphSet::new(" #").unwrap();
        let first = AtlasTexture::new(GlyphAtlas::build(&backend(), &glyphs, 20).unwrap());
        let second = AtlasTexture::new(GlyphAtlas::build(&backend(), &glyphs, 20).unwrap());

        assert!(first.same_texture(&first.clone()));
        assert!(!first.same_texture(&second));
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn upload_flag_is_taken_once() {
        let glyphs = GlyphSet::new("#").unwrap();
        let mut texture = AtlasTexture::new(GlyphAtlas::build(&backend(), &glyphs, 20).unwrap());
        assert!(!texture.needs_update());
        texture.mark_needs_update();
        assert!(texture.take_needs_update());
        assert!(!texture.take_needs_update());
    }
}

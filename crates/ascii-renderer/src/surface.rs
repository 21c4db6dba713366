// ABOUTME: Rasterization surfaces the glyph atlas is drawn onto.
// ABOUTME: Software RGBA pixmap fed by fontdue (TTF/OTF) or BDF glyph sources.

use std::sync::Arc;

use ascii_core::Color;
use fontdue::{Font, FontSettings};
use image::RgbaImage;

use crate::atlas::AtlasError;

/// A 2D drawing target with the handful of canvas operations the atlas needs.
pub trait RasterSurface {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Reset every pixel to fully transparent.
    fn clear(&mut self);

    fn set_fill(&mut self, color: Color);

    fn set_font_size(&mut self, font_size: f32);

    /// Draw `c` with its centre (horizontal centre, vertical middle) at (x, y).
    fn fill_text_centered(&mut self, c: char, x: f32, y: f32);

    /// Straight copy of the surface as RGBA8 with premultiplied color.
    fn read_pixels(&self) -> RgbaImage;
}

/// Hands out raster surfaces. Failing to acquire one is fatal for atlas builds.
pub trait RasterBackend: Send + Sync {
    fn acquire(&self, width: u32, height: u32) -> Result<Box<dyn RasterSurface>, AtlasError>;
}

/// A single rasterized glyph, positioned relative to its centre anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphBitmap {
    pub width: usize,
    pub height: usize,
    /// Row-major coverage, 0 = empty, 255 = fully covered
    pub coverage: Vec<u8>,
    /// Offset of the bitmap's left edge from the anchor
    pub left: f32,
    /// Offset of the bitmap's top edge from the anchor (y grows downwards)
    pub top: f32,
}

/// Anything that can turn a character into a coverage bitmap at a pixel size.
pub trait GlyphSource: Send + Sync {
    /// `None` when the source has no glyph for `c`.
    fn rasterize_centered(&self, c: char, font_size: f32) -> Option<GlyphBitmap>;
}

/// Outline fonts rasterized through fontdue.
pub struct FontdueSource {
    font: Font,
}

impl FontdueSource {
    pub fn from_bytes(data: &[u8]) -> Result<Self, AtlasError> {
        let font = Font::from_bytes(data, FontSettings::default())
            .map_err(|e| AtlasError::FontLoad(e.to_string()))?;
        Ok(Self { font })
    }
}

impl GlyphSource for FontdueSource {
    fn rasterize_centered(&self, c: char, font_size: f32) -> Option<GlyphBitmap> {
        let (metrics, coverage) = self.font.rasterize(c, font_size);

        let line = self
            .font
            .horizontal_line_metrics(font_size)
            .unwrap_or(fontdue::LineMetrics {
                ascent: font_size * 0.8,
                descent: font_size * -0.2,
                line_gap: 0.0,
                new_line_size: font_size,
            });

        // Middle of the em box sits on the anchor; fontdue's descent is negative
        let baseline = (line.ascent + line.descent) / 2.0;
        Some(GlyphBitmap {
            width: metrics.width,
            height: metrics.height,
            coverage,
            left: -metrics.advance_width / 2.0 + metrics.xmin as f32,
            top: baseline - (metrics.ymin as f32 + metrics.height as f32),
        })
    }
}

/// Software surfaces drawing glyphs from a shared source.
#[derive(Clone)]
pub struct SoftwareBackend {
    source: Arc<dyn GlyphSource>,
}

impl SoftwareBackend {
    pub fn new(source: Arc<dyn GlyphSource>) -> Self {
        Self { source }
    }

    /// Pick a glyph source by file contents: BDF text or an outline font.
    pub fn from_font_bytes(data: &[u8]) -> Result<Self, AtlasError> {
        let source: Arc<dyn GlyphSource> = if data.starts_with(b"STARTFONT") {
            let font = crate::bdf::BdfFont::parse(data)
                .map_err(|e| AtlasError::FontLoad(e.to_string()))?;
            Arc::new(font)
        } else {
            Arc::new(FontdueSource::from_bytes(data)?)
        };
        Ok(Self::new(source))
    }
}

impl RasterBackend for SoftwareBackend {
    fn acquire(&self, width: u32, height: u32) -> Result<Box<dyn RasterSurface>, AtlasError> {
        if width == 0 || height == 0 {
            return Err(AtlasError::SurfaceUnavailable(format!(
                "cannot allocate a {width}x{height} surface"
            )));
        }
        Ok(Box::new(SoftwareSurface::new(
            width,
            height,
            Arc::clone(&self.source),
        )))
    }
}

/// In-memory premultiplied RGBA pixmap.
pub struct SoftwareSurface {
    pixels: RgbaImage,
    fill: Color,
    font_size: f32,
    source: Arc<dyn GlyphSource>,
}

impl SoftwareSurface {
    pub fn new(width: u32, height: u32, source: Arc<dyn GlyphSource>) -> Self {
        Self {
            pixels: RgbaImage::new(width, height),
            fill: Color::BLACK,
            font_size: 10.0,
            source,
        }
    }

    /// Source-over composite of the fill color at `coverage` onto one pixel.
    fn blend(&mut self, x: u32, y: u32, coverage: u8) {
        let alpha = self.fill.a * coverage as f32 / 255.0;
        if alpha <= 0.0 {
            return;
        }
        let src = [self.fill.r * alpha, self.fill.g * alpha, self.fill.b * alpha, alpha];
        let dst = self.pixels.get_pixel_mut(x, y);
        for (channel, s) in dst.0.iter_mut().zip(src) {
            let d = *channel as f32 / 255.0;
            *channel = ((s + d * (1.0 - alpha)) * 255.0).round().clamp(0.0, 255.0) as u8;
        }
    }
}

impl RasterSurface for SoftwareSurface {
    fn width(&self) -> u32 {
        self.pixels.width()
    }

    fn height(&self) -> u32 {
        self.pixels.height()
    }

    fn clear(&mut self) {
        self.pixels.fill(0);
    }

    fn set_fill(&mut self, color: Color) {
        self.fill = color;
    }

    fn set_font_size(&mut self, font_size: f32) {
        self.font_size = font_size;
    }

    fn fill_text_centered(&mut self, c: char, x: f32, y: f32) {
        let Some(glyph) = self.source.rasterize_centered(c, self.font_size) else {
            return;
        };

        let x0 = (x + glyph.left).round() as i64;
        let y0 = (y + glyph.top).round() as i64;
        let (w, h) = (self.width() as i64, self.height() as i64);

        for gy in 0..glyph.height {
            let py = y0 + gy as i64;
            if py < 0 || py >= h {
                continue;
            }
            for gx in 0..glyph.width {
                let px = x0 + gx as i64;
                if px < 0 || px >= w {
                    continue;
                }
                let coverage = glyph.coverage[gy * glyph.width + gx];
                if coverage > 0 {
                    self.blend(px as u32, py as u32, coverage);
                }
            }
        }
    }

    fn read_pixels(&self) -> RgbaImage {
        self.pixels.clone()
    }
}

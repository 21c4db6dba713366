// ABOUTME: Glyph atlas building and ASCII post-processing effects.
// ABOUTME: CPU reference shading plus a headless wgpu path sharing the same WGSL math.

pub mod atlas;
pub mod bdf;
pub mod effect;
pub mod gpu;
pub mod pipeline;
pub mod renderer;
pub mod shading;
pub mod surface;

pub use atlas::{AtlasError, AtlasTexture, GlyphAtlas, ATLAS_CELL, ATLAS_SIZE};
pub use bdf::{BdfError, BdfFont};
pub use effect::{
    needs_atlas_rebuild, ColorAsciiEffect, ColorAsciiUniforms, EffectError, VertexAsciiEffect,
    VertexAsciiUniforms,
};
pub use gpu::GpuContext;
pub use pipeline::{AsciiPipeline, AsciiUniforms, GpuEffect, ShaderVariant};
pub use renderer::{HeadlessRenderer, RenderError};
pub use shading::{CellShader, Shading};
pub use surface::{
    FontdueSource, GlyphBitmap, GlyphSource, RasterBackend, RasterSurface, SoftwareBackend,
    SoftwareSurface,
};

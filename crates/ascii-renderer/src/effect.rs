// ABOUTME: ASCII effect instances: uniform state kept in sync with settings.
// ABOUTME: Rebuilds the glyph atlas on settings updates per the rebuild policy.

use std::sync::Arc;

use ascii_core::{
    AsciiSettings, AtlasRebuild, Color, ColorAsciiSettings, GlyphSetError, VertexAsciiSettings,
};
use image::RgbaImage;

use crate::atlas::{AtlasError, AtlasTexture, GlyphAtlas};
use crate::shading::{CellShader, Shading};
use crate::surface::RasterBackend;

#[derive(Debug, thiserror::Error)]
pub enum EffectError {
    #[error("Atlas error: {0}")]
    Atlas(#[from] AtlasError),

    #[error("Invalid glyph set: {0}")]
    Glyphs(#[from] GlyphSetError),

    #[error("Cell size must be at least 1 pixel")]
    ZeroCellSize,
}

/// Whether moving from `old` to `new` changes what the atlas looks like.
pub fn needs_atlas_rebuild(old: &AsciiSettings, new: &AsciiSettings) -> bool {
    old.characters != new.characters || old.font_size != new.font_size
}

fn should_rebuild(policy: AtlasRebuild, old: &AsciiSettings, new: &AsciiSettings) -> bool {
    match policy {
        AtlasRebuild::Always => true,
        AtlasRebuild::OnChange => needs_atlas_rebuild(old, new),
    }
}

fn build_texture(
    backend: &dyn RasterBackend,
    settings: &AsciiSettings,
) -> Result<AtlasTexture, EffectError> {
    if settings.cell_size == 0 {
        return Err(EffectError::ZeroCellSize);
    }
    let glyphs = settings.glyph_set()?;
    let mut texture = AtlasTexture::new(GlyphAtlas::build(backend, &glyphs, settings.font_size)?);
    texture.mark_needs_update();
    Ok(texture)
}

/// Validate `new` and build its atlas if the policy asks for one.
/// Returns the replacement texture (if any) and the glyph count.
fn prepare_update(
    backend: &dyn RasterBackend,
    policy: AtlasRebuild,
    old: &AsciiSettings,
    new: &AsciiSettings,
) -> Result<(Option<AtlasTexture>, u32), EffectError> {
    if new.cell_size == 0 {
        return Err(EffectError::ZeroCellSize);
    }
    let count = new.glyph_set()?.len() as u32;
    let characters = if should_rebuild(policy, old, new) {
        Some(build_texture(backend, new)?)
    } else {
        None
    };
    Ok((characters, count))
}

/// Uniforms of the color variant.
#[derive(Debug, Clone)]
pub struct ColorAsciiUniforms {
    pub characters: AtlasTexture,
    pub cell_size: f32,
    pub characters_count: u32,
    pub color: Color,
}

/// Uniforms of the vertex (source color) variant.
#[derive(Debug, Clone)]
pub struct VertexAsciiUniforms {
    pub characters: AtlasTexture,
    pub cell_size: f32,
    pub characters_count: u32,
    pub invert: bool,
}

/// Glyph masks tinted with a single color.
pub struct ColorAsciiEffect {
    backend: Arc<dyn RasterBackend>,
    settings: ColorAsciiSettings,
    uniforms: ColorAsciiUniforms,
    rebuild: AtlasRebuild,
}

impl ColorAsciiEffect {
    pub fn new(
        backend: Arc<dyn RasterBackend>,
        settings: ColorAsciiSettings,
    ) -> Result<Self, EffectError> {
        let characters = build_texture(backend.as_ref(), &settings.ascii)?;
        let uniforms = ColorAsciiUniforms {
            characters,
            cell_size: settings.ascii.cell_size as f32,
            characters_count: settings.ascii.glyph_set()?.len() as u32,
            color: settings.color,
        };
        Ok(Self {
            backend,
            settings,
            uniforms,
            rebuild: AtlasRebuild::default(),
        })
    }

    pub fn with_rebuild_policy(mut self, rebuild: AtlasRebuild) -> Self {
        self.rebuild = rebuild;
        self
    }

    pub fn settings(&self) -> &ColorAsciiSettings {
        &self.settings
    }

    pub fn uniforms(&self) -> &ColorAsciiUniforms {
        &self.uniforms
    }

    pub fn uniforms_mut(&mut self) -> &mut ColorAsciiUniforms {
        &mut self.uniforms
    }

    /// Apply new settings. Nothing is written if the atlas cannot be rebuilt.
    pub fn update(&mut self, settings: ColorAsciiSettings) -> Result<(), EffectError> {
        let (characters, count) = prepare_update(
            self.backend.as_ref(),
            self.rebuild,
            &self.settings.ascii,
            &settings.ascii,
        )?;

        self.uniforms.cell_size = settings.ascii.cell_size as f32;
        self.uniforms.characters_count = count;
        self.uniforms.color = settings.color;
        if let Some(characters) = characters {
            self.uniforms.characters = characters;
        }
        self.settings = settings;

        tracing::debug!(
            "colorAscii uniforms updated (atlas {})",
            self.uniforms.characters.id()
        );
        Ok(())
    }

    pub fn shader(&self) -> CellShader<'_> {
        CellShader {
            atlas: self.uniforms.characters.atlas(),
            cell_size: self.uniforms.cell_size,
            characters_count: self.uniforms.characters_count,
            shading: Shading::Tint(self.uniforms.color),
        }
    }

    /// Render `source` on the CPU with the current uniforms.
    pub fn render(&self, source: &RgbaImage) -> RgbaImage {
        self.shader().render(source)
    }
}

/// Glyph masks over the source's own per-cell colors.
pub struct VertexAsciiEffect {
    backend: Arc<dyn RasterBackend>,
    settings: VertexAsciiSettings,
    uniforms: VertexAsciiUniforms,
    rebuild: AtlasRebuild,
}

impl VertexAsciiEffect {
    pub fn new(
        backend: Arc<dyn RasterBackend>,
        settings: VertexAsciiSettings,
    ) -> Result<Self, EffectError> {
        let characters = build_texture(backend.as_ref(), &settings.ascii)?;
        let uniforms = VertexAsciiUniforms {
            characters,
            cell_size: settings.ascii.cell_size as f32,
            characters_count: settings.ascii.glyph_set()?.len() as u32,
            invert: settings.invert,
        };
        Ok(Self {
            backend,
            settings,
            uniforms,
            rebuild: AtlasRebuild::default(),
        })
    }

    pub fn with_rebuild_policy(mut self, rebuild: AtlasRebuild) -> Self {
        self.rebuild = rebuild;
        self
    }

    pub fn settings(&self) -> &VertexAsciiSettings {
        &self.settings
    }

    pub fn uniforms(&self) -> &VertexAsciiUniforms {
        &self.uniforms
    }

    pub fn uniforms_mut(&mut self) -> &mut VertexAsciiUniforms {
        &mut self.uniforms
    }

    /// Apply new settings. Nothing is written if the atlas cannot be rebuilt.
    pub fn update(&mut self, settings: VertexAsciiSettings) -> Result<(), EffectError> {
        let (characters, count) = prepare_update(
            self.backend.as_ref(),
            self.rebuild,
            &self.settings.ascii,
            &settings.ascii,
        )?;

        self.uniforms.cell_size = settings.ascii.cell_size as f32;
        self.uniforms.characters_count = count;
        self.uniforms.invert = settings.invert;
        if let Some(characters) = characters {
            self.uniforms.characters = characters;
        }
        self.settings = settings;

        tracing::debug!(
            "vertexAscii uniforms updated (atlas {})",
            self.uniforms.characters.id()
        );
        Ok(())
    }

    pub fn shader(&self) -> CellShader<'_> {
        CellShader {
            atlas: self.uniforms.characters.atlas(),
            cell_size: self.uniforms.cell_size,
            characters_count: self.uniforms.characters_count,
            shading: Shading::Source {
                invert: self.uniforms.invert,
            },
        }
    }

    /// Render `source` on the CPU with the current uniforms.
    pub fn render(&self, source: &RgbaImage) -> RgbaImage {
        self.shader().render(source)
    }
}

// ABOUTME: The node contract between a host and an effect: declare, build, refresh.
// ABOUTME: Also holds the effect pass a node hands back to the host.

use ascii_core::{ParamSpec, ParamValues, SettingsError};
use ascii_renderer::{ColorAsciiEffect, EffectError, GpuEffect, ShaderVariant, VertexAsciiEffect};
use image::RgbaImage;

/// Identifies the camera a pass renders for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CameraId(pub u64);

/// What the host provides when asking a node for a pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassContext {
    pub camera: CameraId,
}

#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error("Invalid parameters: {0}")]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Effect(#[from] EffectError),

    #[error("Node {node} cannot refresh a {found:?} pass")]
    WrongPass {
        node: &'static str,
        found: ShaderVariant,
    },

    #[error("Node type already registered: {0}")]
    Duplicate(String),

    #[error("Unknown node type: {0}")]
    UnknownNode(String),
}

pub enum AsciiEffect {
    Color(ColorAsciiEffect),
    Vertex(VertexAsciiEffect),
}

impl AsciiEffect {
    pub fn variant(&self) -> ShaderVariant {
        match self {
            AsciiEffect::Color(_) => ShaderVariant::Color,
            AsciiEffect::Vertex(_) => ShaderVariant::Vertex,
        }
    }

    /// Shade a frame on the CPU.
    pub fn render(&self, source: &RgbaImage) -> RgbaImage {
        match self {
            AsciiEffect::Color(effect) => effect.render(source),
            AsciiEffect::Vertex(effect) => effect.render(source),
        }
    }

    pub fn as_gpu_mut(&mut self) -> &mut dyn GpuEffect {
        match self {
            AsciiEffect::Color(effect) => effect,
            AsciiEffect::Vertex(effect) => effect,
        }
    }
}

/// An effect instance bound to one camera.
pub struct EffectPass {
    pub camera: CameraId,
    pub effect: AsciiEffect,
}

/// A post-processing node the host can instantiate.
///
/// The host calls `build_pass` once per camera and `refresh_pass` every
/// time a parameter value changes. Values arrive already range-clamped.
pub trait PostNode: Send + Sync {
    /// Stable type identifier, e.g. `"colorAscii"`.
    fn node_type(&self) -> &'static str;

    /// Parameter declarations with their defaults.
    fn params(&self) -> Vec<ParamSpec>;

    fn build_pass(&self, ctx: &PassContext, values: &ParamValues) -> Result<EffectPass, NodeError>;

    fn refresh_pass(&self, pass: &mut EffectPass, values: &ParamValues) -> Result<(), NodeError>;

    /// Current values seeded from the declared defaults.
    fn default_values(&self) -> ParamValues {
        ParamValues::defaults(&self.params())
    }
}

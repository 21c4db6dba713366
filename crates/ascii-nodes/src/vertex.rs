// ABOUTME: The "vertexAscii" node: glyph masks over the source's own colors.
// ABOUTME: Declares characters, fontSize and cellSize; invert is fixed at construction.

use std::sync::Arc;

use ascii_core::{AsciiSettings, AtlasRebuild, ParamSpec, ParamValues, VertexAsciiSettings};
use ascii_renderer::{RasterBackend, VertexAsciiEffect};

use crate::node::{AsciiEffect, EffectPass, NodeError, PassContext, PostNode};

pub struct VertexAsciiNode {
    backend: Arc<dyn RasterBackend>,
    defaults: VertexAsciiSettings,
    rebuild: AtlasRebuild,
}

impl VertexAsciiNode {
    pub const TYPE: &'static str = "vertexAscii";

    pub fn new(backend: Arc<dyn RasterBackend>) -> Self {
        Self {
            backend,
            defaults: VertexAsciiSettings::default(),
            rebuild: AtlasRebuild::default(),
        }
    }

    /// Override the declared defaults and the invert flag.
    pub fn with_defaults(mut self, defaults: VertexAsciiSettings) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_rebuild_policy(mut self, rebuild: AtlasRebuild) -> Self {
        self.rebuild = rebuild;
        self
    }
}

impl PostNode for VertexAsciiNode {
    fn node_type(&self) -> &'static str {
        Self::TYPE
    }

    fn params(&self) -> Vec<ParamSpec> {
        self.defaults.param_specs()
    }

    fn build_pass(&self, ctx: &PassContext, values: &ParamValues) -> Result<EffectPass, NodeError> {
        let settings = VertexAsciiSettings {
            ascii: AsciiSettings::from_params(values)?,
            invert: self.defaults.invert,
        };
        let effect = VertexAsciiEffect::new(self.backend.clone(), settings)?
            .with_rebuild_policy(self.rebuild);
        let mut pass = EffectPass {
            camera: ctx.camera,
            effect: AsciiEffect::Vertex(effect),
        };
        self.refresh_pass(&mut pass, values)?;
        Ok(pass)
    }

    fn refresh_pass(&self, pass: &mut EffectPass, values: &ParamValues) -> Result<(), NodeError> {
        let found = pass.effect.variant();
        let AsciiEffect::Vertex(effect) = &mut pass.effect else {
            return Err(NodeError::WrongPass {
                node: Self::TYPE,
                found,
            });
        };
        // invert is not a host parameter, so it carries over unchanged
        let settings = VertexAsciiSettings {
            ascii: AsciiSettings::from_params(values)?,
            invert: effect.settings().invert,
        };
        effect.update(settings)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorAsciiNode;
    use crate::fixtures::backend;
    use ascii_core::{param, ParamValue};
    use ascii_renderer::ShaderVariant;
    use image::{Rgba, RgbaImage};

    fn block_values(node: &VertexAsciiNode) -> ParamValues {
        let mut values = node.default_values();
        values.set(param::CHARACTERS, ParamValue::String(" #".into()));
        values.set(param::FONT_SIZE, ParamValue::Integer(64));
        values
    }

    #[test]
    fn declares_three_parameters() {
        let node = VertexAsciiNode::new(backend());
        let names: Vec<String> = node.params().into_iter().map(|s| s.name).collect();
        assert_eq!(names, ["characters", "fontSize", "cellSize"]);
    }

    #[test]
    fn invert_survives_refresh() {
        let node = VertexAsciiNode::new(backend()).with_defaults(VertexAsciiSettings {
            invert: true,
            ..Default::default()
        });
        let mut values = block_values(&node);
        let mut pass = node.build_pass(&PassContext::default(), &values).unwrap();

        values.set(param::CELL_SIZE, ParamValue::Integer(8));
        node.refresh_pass(&mut pass, &values).unwrap();

        let AsciiEffect::Vertex(effect) = &pass.effect else {
            panic!("expected a vertex pass");
        };
        assert!(effect.uniforms().invert);
        assert_eq!(effect.uniforms().cell_size, 8.0);
    }

    #[test]
    fn host_values_win_over_invalid_defaults() {
        let node = VertexAsciiNode::new(backend()).with_defaults(VertexAsciiSettings {
            ascii: AsciiSettings {
                characters: String::new(),
                ..Default::default()
            },
            invert: true,
        });

        let mut values = ParamValues::new();
        AsciiSettings::default().write_params(&mut values);
        values.set(param::CHARACTERS, ParamValue::String(" #".into()));

        let pass = node.build_pass(&PassContext::default(), &values).unwrap();
        let AsciiEffect::Vertex(effect) = &pass.effect else {
            panic!("expected a vertex pass");
        };
        assert_eq!(effect.settings().ascii.characters, " #");
        assert!(effect.uniforms().invert);
    }

    #[test]
    fn renders_source_colors() {
        let node = VertexAsciiNode::new(backend());
        let pass = node
            .build_pass(&PassContext::default(), &block_values(&node))
            .unwrap();

        // White cells pick the block and keep their alpha
        let source = RgbaImage::from_pixel(16, 16, Rgba([255, 255, 255, 180]));
        let out = pass.effect.render(&source);
        assert!(out.pixels().all(|p| p.0 == [255, 255, 255, 180]));

        // Anything darker picks the space: color masked out, alpha kept
        let source = RgbaImage::from_pixel(16, 16, Rgba([200, 40, 40, 255]));
        let out = pass.effect.render(&source);
        assert!(out.pixels().all(|p| p.0 == [0, 0, 0, 255]));
    }

    #[test]
    fn rejects_a_color_pass() {
        let color = ColorAsciiNode::new(backend());
        let mut pass = color
            .build_pass(&PassContext::default(), &color.default_values())
            .unwrap();

        let vertex = VertexAsciiNode::new(backend());
        let err = vertex
            .refresh_pass(&mut pass, &vertex.default_values())
            .unwrap_err();
        assert!(matches!(
            err,
            NodeError::WrongPass {
                node: "vertexAscii",
                found: ShaderVariant::Color
            }
        ));
    }
}

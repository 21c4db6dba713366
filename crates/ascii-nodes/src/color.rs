// ABOUTME: The "colorAscii" node: glyph masks tinted with one fixed color.
// ABOUTME: Declares characters, fontSize, cellSize and color.

use std::sync::Arc;

use ascii_core::{AtlasRebuild, ColorAsciiSettings, ParamSpec, ParamValues};
use ascii_renderer::{ColorAsciiEffect, RasterBackend};

use crate::node::{AsciiEffect, EffectPass, NodeError, PassContext, PostNode};

pub struct ColorAsciiNode {
    backend: Arc<dyn RasterBackend>,
    defaults: ColorAsciiSettings,
    rebuild: AtlasRebuild,
}

impl ColorAsciiNode {
    pub const TYPE: &'static str = "colorAscii";

    pub fn new(backend: Arc<dyn RasterBackend>) -> Self {
        Self {
            backend,
            defaults: ColorAsciiSettings::default(),
            rebuild: AtlasRebuild::default(),
        }
    }

    /// Override the declared defaults, e.g. from the config file.
    pub fn with_defaults(mut self, defaults: ColorAsciiSettings) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_rebuild_policy(mut self, rebuild: AtlasRebuild) -> Self {
        self.rebuild = rebuild;
        self
    }
}

impl PostNode for ColorAsciiNode {
    fn node_type(&self) -> &'static str {
        Self::TYPE
    }

    fn params(&self) -> Vec<ParamSpec> {
        self.defaults.param_specs()
    }

    fn build_pass(&self, ctx: &PassContext, values: &ParamValues) -> Result<EffectPass, NodeError> {
        let settings = ColorAsciiSettings::from_params(values)?;
        let effect = ColorAsciiEffect::new(self.backend.clone(), settings)?
            .with_rebuild_policy(self.rebuild);
        let mut pass = EffectPass {
            camera: ctx.camera,
            effect: AsciiEffect::Color(effect),
        };
        self.refresh_pass(&mut pass, values)?;
        Ok(pass)
    }

    fn refresh_pass(&self, pass: &mut EffectPass, values: &ParamValues) -> Result<(), NodeError> {
        let found = pass.effect.variant();
        let AsciiEffect::Color(effect) = &mut pass.effect else {
            return Err(NodeError::WrongPass {
                node: Self::TYPE,
                found,
            });
        };
        effect.update(ColorAsciiSettings::from_params(values)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{backend, NoSurface};
    use crate::node::CameraId;
    use ascii_core::{param, Color, IntegerRange, ParamKind, ParamValue, DEFAULT_CHARACTERS};
    use image::{Rgba, RgbaImage};

    fn node() -> ColorAsciiNode {
        ColorAsciiNode::new(backend())
    }

    #[test]
    fn declares_four_parameters() {
        let specs = node().params();
        let names: Vec<&str> = specs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["characters", "fontSize", "cellSize", "color"]);

        assert_eq!(
            specs[0].kind,
            ParamKind::String {
                default: DEFAULT_CHARACTERS.to_string()
            }
        );
        assert_eq!(
            specs[1].kind,
            ParamKind::Integer {
                default: 54,
                range: IntegerRange::min_locked(10, 100)
            }
        );
        assert_eq!(
            specs[2].kind,
            ParamKind::Integer {
                default: 16,
                range: IntegerRange::min_locked(1, 100)
            }
        );
        assert_eq!(specs[3].kind, ParamKind::Color { default: Color::WHITE });
    }

    #[test]
    fn build_pass_applies_current_values() {
        let node = node();
        let mut values = node.default_values();
        values.set(param::CHARACTERS, ParamValue::String(" #".into()));
        values.set(param::FONT_SIZE, ParamValue::Integer(64));
        values.set(param::CELL_SIZE, ParamValue::Integer(8));
        values.set(param::COLOR, ParamValue::Color(Color::rgb(0.0, 1.0, 0.0)));

        let ctx = PassContext {
            camera: CameraId(7),
        };
        let pass = node.build_pass(&ctx, &values).unwrap();
        assert_eq!(pass.camera, CameraId(7));

        let AsciiEffect::Color(effect) = &pass.effect else {
            panic!("expected a color pass");
        };
        assert_eq!(effect.uniforms().characters_count, 2);
        assert_eq!(effect.uniforms().cell_size, 8.0);
        assert_eq!(effect.uniforms().color, Color::rgb(0.0, 1.0, 0.0));

        let white = RgbaImage::from_pixel(16, 16, Rgba([255, 255, 255, 255]));
        let out = pass.effect.render(&white);
        assert!(out.pixels().all(|p| p.0 == [0, 255, 0, 255]));
    }

    #[test]
    fn refresh_updates_uniforms_in_place() {
        let node = node();
        let mut values = node.default_values();
        let mut pass = node.build_pass(&PassContext::default(), &values).unwrap();

        values.set(param::CELL_SIZE, ParamValue::Integer(4));
        node.refresh_pass(&mut pass, &values).unwrap();

        let AsciiEffect::Color(effect) = &pass.effect else {
            panic!("expected a color pass");
        };
        assert_eq!(effect.uniforms().cell_size, 4.0);
        assert_eq!(effect.settings().ascii.cell_size, 4);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let node = node();
        let mut values = node.default_values();
        values.set(param::CHARACTERS, ParamValue::String(String::new()));
        assert!(matches!(
            node.build_pass(&PassContext::default(), &values),
            Err(NodeError::Settings(_))
        ));
    }

    #[test]
    fn host_values_win_over_invalid_defaults() {
        let mut defaults = ColorAsciiSettings::default();
        defaults.ascii.characters = String::new();
        defaults.ascii.cell_size = 0;
        let node = ColorAsciiNode::new(backend()).with_defaults(defaults);

        let mut values = ParamValues::new();
        ColorAsciiSettings::default().ascii.write_params(&mut values);
        values.set(param::CHARACTERS, ParamValue::String(" #".into()));
        values.set(param::COLOR, ParamValue::Color(Color::WHITE));

        let pass = node.build_pass(&PassContext::default(), &values).unwrap();
        let AsciiEffect::Color(effect) = &pass.effect else {
            panic!("expected a color pass");
        };
        assert_eq!(effect.settings().ascii.characters, " #");
        assert_eq!(effect.uniforms().characters_count, 2);
        assert_eq!(effect.uniforms().cell_size, 16.0);
    }

    #[test]
    fn surface_failure_is_reported() {
        let node = ColorAsciiNode::new(Arc::new(NoSurface));
        let values = node.default_values();
        assert!(matches!(
            node.build_pass(&PassContext::default(), &values),
            Err(NodeError::Effect(_))
        ));
    }
}

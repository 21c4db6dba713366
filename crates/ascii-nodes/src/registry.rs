// ABOUTME: Registry of post-processing node types known to the host.
// ABOUTME: Maps type identifiers to nodes and refuses duplicate identifiers.

use std::collections::BTreeMap;
use std::sync::Arc;

use ascii_core::Config;
use ascii_renderer::RasterBackend;

use crate::color::ColorAsciiNode;
use crate::node::{NodeError, PostNode};
use crate::vertex::VertexAsciiNode;

#[derive(Default)]
pub struct NodeRegistry {
    nodes: BTreeMap<&'static str, Arc<dyn PostNode>>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Both ASCII nodes, with defaults and rebuild policy taken from `config`.
    pub fn with_ascii_nodes(
        backend: Arc<dyn RasterBackend>,
        config: &Config,
    ) -> Result<Self, NodeError> {
        let mut registry = Self::new();
        registry.register(Arc::new(
            ColorAsciiNode::new(backend.clone())
                .with_defaults(config.color_ascii.clone())
                .with_rebuild_policy(config.atlas_rebuild),
        ))?;
        registry.register(Arc::new(
            VertexAsciiNode::new(backend)
                .with_defaults(config.vertex_ascii.clone())
                .with_rebuild_policy(config.atlas_rebuild),
        ))?;
        Ok(registry)
    }

    pub fn register(&mut self, node: Arc<dyn PostNode>) -> Result<(), NodeError> {
        let node_type = node.node_type();
        if self.nodes.contains_key(node_type) {
            return Err(NodeError::Duplicate(node_type.to_string()));
        }
        tracing::debug!("Registered node type {}", node_type);
        self.nodes.insert(node_type, node);
        Ok(())
    }

    pub fn get(&self, node_type: &str) -> Result<Arc<dyn PostNode>, NodeError> {
        self.nodes
            .get(node_type)
            .cloned()
            .ok_or_else(|| NodeError::UnknownNode(node_type.to_string()))
    }

    /// Registered type identifiers in sorted order.
    pub fn node_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.nodes.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::backend;
    use ascii_core::{AtlasRebuild, Color};

    #[test]
    fn registers_both_ascii_nodes() {
        let registry = NodeRegistry::with_ascii_nodes(backend(), &Config::default()).unwrap();
        let types: Vec<&str> = registry.node_types().collect();
        assert_eq!(types, ["colorAscii", "vertexAscii"]);
        assert_eq!(registry.get("vertexAscii").unwrap().node_type(), "vertexAscii");
    }

    #[test]
    fn duplicate_types_are_rejected() {
        let mut registry = NodeRegistry::new();
        registry
            .register(Arc::new(ColorAsciiNode::new(backend())))
            .unwrap();
        let err = registry
            .register(Arc::new(ColorAsciiNode::new(backend())))
            .unwrap_err();
        assert!(matches!(err, NodeError::Duplicate(ref t) if t == "colorAscii"));
    }

    #[test]
    fn unknown_type_is_an_error() {
        let registry = NodeRegistry::new();
        assert!(matches!(
            registry.get("bloom"),
            Err(NodeError::UnknownNode(ref t)) if t == "bloom"
        ));
    }

    #[test]
    fn config_defaults_flow_into_declarations() {
        let mut config = Config::default();
        config.color_ascii.color = Color::AMBER;
        config.color_ascii.ascii.cell_size = 24;
        config.atlas_rebuild = AtlasRebuild::OnChange;

        let registry = NodeRegistry::with_ascii_nodes(backend(), &config).unwrap();
        let values = registry.get("colorAscii").unwrap().default_values();
        assert_eq!(values.color("color").unwrap(), Color::AMBER);
        assert_eq!(values.integer("cellSize").unwrap(), 24);
    }
}

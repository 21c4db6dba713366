// ABOUTME: Post-processing node adapters exposing the ASCII effects to a host.
// ABOUTME: Nodes declare parameters, build effect passes and refresh them on change.

mod color;
mod node;
mod registry;
mod vertex;

#[cfg(test)]
mod fixtures;

pub use color::ColorAsciiNode;
pub use node::{AsciiEffect, CameraId, EffectPass, NodeError, PassContext, PostNode};
pub use registry::NodeRegistry;
pub use vertex::VertexAsciiNode;

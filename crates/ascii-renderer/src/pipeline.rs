// ABOUTME: wgpu post-processing pipeline for the ASCII cell-sampling shaders.
// ABOUTME: Fullscreen triangle reading the scene texture and the glyph atlas.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::atlas::{AtlasTexture, ATLAS_SIZE};
use crate::effect::{ColorAsciiEffect, VertexAsciiEffect};

const COMMON_WGSL: &str = include_str!("../../../shaders/ascii_common.wgsl");
const COLOR_WGSL: &str = include_str!("../../../shaders/ascii_color.wgsl");
const VERTEX_WGSL: &str = include_str!("../../../shaders/ascii_vertex.wgsl");

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct AsciiUniforms {
    pub resolution: [f32; 2],
    pub cell_size: f32,
    pub characters_count: f32,
    pub color: [f32; 4],
    pub invert: u32,
    _pad: [u32; 3],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderVariant {
    Color,
    Vertex,
}

impl ShaderVariant {
    fn label(&self) -> &'static str {
        match self {
            ShaderVariant::Color => "Color ASCII",
            ShaderVariant::Vertex => "Vertex ASCII",
        }
    }

    /// Full WGSL source for this variant.
    pub fn source(&self) -> String {
        let fragment = match self {
            ShaderVariant::Color => COLOR_WGSL,
            ShaderVariant::Vertex => VERTEX_WGSL,
        };
        format!("{COMMON_WGSL}\n{fragment}")
    }
}

/// Every fragment in a cell must read the same source texel.
fn source_sampler_descriptor() -> wgpu::SamplerDescriptor<'static> {
    wgpu::SamplerDescriptor {
        label: Some("ASCII Source Sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Nearest,
        min_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    }
}

/// Sampling state recorded on the atlas texture.
fn atlas_sampler_descriptor() -> wgpu::SamplerDescriptor<'static> {
    wgpu::SamplerDescriptor {
        label: Some("ASCII Atlas Sampler"),
        address_mode_u: AtlasTexture::WRAP,
        address_mode_v: AtlasTexture::WRAP,
        address_mode_w: AtlasTexture::WRAP,
        mag_filter: AtlasTexture::FILTER,
        min_filter: AtlasTexture::FILTER,
        ..Default::default()
    }
}

/// An effect the GPU pipeline can draw.
pub trait GpuEffect {
    fn variant(&self) -> ShaderVariant;

    fn gpu_uniforms(&self, resolution: [f32; 2]) -> AsciiUniforms;

    fn atlas_texture_mut(&mut self) -> &mut AtlasTexture;
}

impl GpuEffect for ColorAsciiEffect {
    fn variant(&self) -> ShaderVariant {
        ShaderVariant::Color
    }

    fn gpu_uniforms(&self, resolution: [f32; 2]) -> AsciiUniforms {
        let u = self.uniforms();
        AsciiUniforms {
            resolution,
            cell_size: u.cell_size,
            characters_count: u.characters_count as f32,
            color: u.color.to_array(),
            invert: 0,
            _pad: [0; 3],
        }
    }

    fn atlas_texture_mut(&mut self) -> &mut AtlasTexture {
        &mut self.uniforms_mut().characters
    }
}

impl GpuEffect for VertexAsciiEffect {
    fn variant(&self) -> ShaderVariant {
        ShaderVariant::Vertex
    }

    fn gpu_uniforms(&self, resolution: [f32; 2]) -> AsciiUniforms {
        let u = self.uniforms();
        AsciiUniforms {
            resolution,
            cell_size: u.cell_size,
            characters_count: u.characters_count as f32,
            color: [1.0; 4],
            invert: u32::from(u.invert),
            _pad: [0; 3],
        }
    }

    fn atlas_texture_mut(&mut self) -> &mut AtlasTexture {
        &mut self.uniforms_mut().characters
    }
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

pub struct AsciiPipeline {
    variant: ShaderVariant,
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    source_sampler: wgpu::Sampler,
    atlas_sampler: wgpu::Sampler,
    atlas_texture: wgpu::Texture,
    atlas_view: wgpu::TextureView,
    /// Id of the atlas currently on the GPU
    uploaded_atlas: Option<u64>,
}

impl AsciiPipeline {
    pub fn new(device: &wgpu::Device, variant: ShaderVariant, format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(variant.label()),
            source: wgpu::ShaderSource::Wgsl(variant.source().into()),
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("ASCII Uniform Buffer"),
            contents: bytemuck::bytes_of(&AsciiUniforms::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let source_sampler = device.create_sampler(&source_sampler_descriptor());
        let atlas_sampler = device.create_sampler(&atlas_sampler_descriptor());

        let atlas_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("ASCII Atlas Texture"),
            size: wgpu::Extent3d {
                width: ATLAS_SIZE,
                height: ATLAS_SIZE,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let atlas_view = atlas_texture.create_view(&wgpu::TextureViewDescriptor::default());

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("ASCII Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Scene
                texture_entry(1),
                sampler_entry(2),
                // Glyph atlas
                texture_entry(3),
                sampler_entry(4),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("ASCII Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(variant.label()),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            variant,
            pipeline,
            bind_group_layout,
            uniform_buffer,
            source_sampler,
            atlas_sampler,
            atlas_texture,
            atlas_view,
            uploaded_atlas: None,
        }
    }

    pub fn variant(&self) -> ShaderVariant {
        self.variant
    }

    pub fn create_bind_group(
        &self,
        device: &wgpu::Device,
        input_texture_view: &wgpu::TextureView,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("ASCII Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(input_texture_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.source_sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&self.atlas_view),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::Sampler(&self.atlas_sampler),
                },
            ],
        })
    }

    /// Upload the atlas if it was rebuilt since the last frame, then write uniforms.
    pub fn prepare(
        &mut self,
        queue: &wgpu::Queue,
        effect: &mut dyn GpuEffect,
        resolution: [f32; 2],
    ) {
        let texture = effect.atlas_texture_mut();
        let flagged = texture.take_needs_update();
        if flagged || self.uploaded_atlas != Some(texture.id()) {
            self.upload_atlas(queue, texture);
        }

        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&effect.gpu_uniforms(resolution)),
        );
    }

    fn upload_atlas(&mut self, queue: &wgpu::Queue, texture: &AtlasTexture) {
        let pixels = texture.atlas().pixels();
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.atlas_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels.as_raw(),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * ATLAS_SIZE),
                rows_per_image: Some(ATLAS_SIZE),
            },
            wgpu::Extent3d {
                width: ATLAS_SIZE,
                height: ATLAS_SIZE,
                depth_or_array_layers: 1,
            },
        );
        self.uploaded_atlas = Some(texture.id());
        tracing::debug!("Uploaded glyph atlas {}", texture.id());
    }

    pub fn render(&self, render_pass: &mut wgpu::RenderPass<'_>, bind_group: &wgpu::BindGroup) {
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, bind_group, &[]);
        render_pass.draw(0..3, 0..1); // Fullscreen triangle
    }
}

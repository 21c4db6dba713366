// ABOUTME: Offscreen GPU renderer for the ASCII effects.
// ABOUTME: Uploads a source image, runs the effect pass and reads the frame back.

use std::collections::HashMap;

use image::RgbaImage;

use crate::gpu::GpuContext;
use crate::pipeline::{AsciiPipeline, GpuEffect, ShaderVariant};

/// Color format for source and output textures. Values pass through
/// unconverted so the GPU output matches the CPU reference.
const FRAME_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("No suitable GPU adapter found")]
    NoAdapter,

    #[error("Failed to create device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("Failed to read back frame: {0}")]
    Readback(String),

    #[error("Cannot render an empty {0}x{1} frame")]
    EmptyFrame(u32, u32),

    #[error("Frame {width}x{height} exceeds the device limit of {max} pixels per side")]
    FrameTooLarge { width: u32, height: u32, max: u32 },
}

/// Reject frames the device cannot hold in a single 2D texture.
fn check_frame_size(width: u32, height: u32, max: u32) -> Result<(), RenderError> {
    if width == 0 || height == 0 {
        return Err(RenderError::EmptyFrame(width, height));
    }
    if width > max || height > max {
        return Err(RenderError::FrameTooLarge { width, height, max });
    }
    Ok(())
}

/// Bytes per row in the readback buffer, rounded up to wgpu's copy alignment.
fn padded_bytes_per_row(width: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    (4 * width).div_ceil(align) * align
}

pub struct HeadlessRenderer {
    gpu: GpuContext,
    pipelines: HashMap<ShaderVariant, AsciiPipeline>,
}

impl HeadlessRenderer {
    pub async fn new() -> Result<Self, RenderError> {
        Ok(Self::with_context(GpuContext::headless().await?))
    }

    pub fn with_context(gpu: GpuContext) -> Self {
        Self {
            gpu,
            pipelines: HashMap::new(),
        }
    }

    fn frame_texture(
        &self,
        label: &str,
        width: u32,
        height: u32,
        usage: wgpu::TextureUsages,
    ) -> wgpu::Texture {
        self.gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: FRAME_FORMAT,
            usage,
            view_formats: &[],
        })
    }

    /// Render one frame of `effect` over `source`.
    pub fn render(
        &mut self,
        effect: &mut dyn GpuEffect,
        source: &RgbaImage,
    ) -> Result<RgbaImage, RenderError> {
        let (width, height) = source.dimensions();
        let max = self.gpu.device.limits().max_texture_dimension_2d;
        check_frame_size(width, height, max)?;
        let extent = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let input = self.frame_texture(
            "Source Texture",
            width,
            height,
            wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        );
        self.gpu.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &input,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            source.as_raw(),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            extent,
        );
        let input_view = input.create_view(&wgpu::TextureViewDescriptor::default());

        let output = self.frame_texture(
            "Output Texture",
            width,
            height,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        );
        let output_view = output.create_view(&wgpu::TextureViewDescriptor::default());

        let device = &self.gpu.device;
        let variant = effect.variant();
        let pipeline = self
            .pipelines
            .entry(variant)
            .or_insert_with(|| AsciiPipeline::new(device, variant, FRAME_FORMAT));
        pipeline.prepare(&self.gpu.queue, effect, [width as f32, height as f32]);
        let bind_group = pipeline.create_bind_group(device, &input_view);

        let unpadded_row = 4 * width;
        let padded_row = padded_bytes_per_row(width);
        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Readback Buffer"),
            size: (padded_row * height) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("ASCII Encoder"),
        });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("ASCII Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &output_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pipeline.render(&mut render_pass, &bind_group);
        }
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &output,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &readback,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row),
                    rows_per_image: Some(height),
                },
            },
            extent,
        );
        self.gpu.queue.submit(std::iter::once(encoder.finish()));

        let slice = readback.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|e| RenderError::Readback(e.to_string()))?
            .map_err(|e| RenderError::Readback(e.to_string()))?;

        let mut pixels = Vec::with_capacity((unpadded_row * height) as usize);
        {
            let mapped = slice.get_mapped_range();
            for row in mapped.chunks(padded_row as usize) {
                pixels.extend_from_slice(&row[..unpadded_row as usize]);
            }
        }
        readback.unmap();

        RgbaImage::from_raw(width, height, pixels)
            .ok_or_else(|| RenderError::Readback("frame size mismatch".into()))
    }
}

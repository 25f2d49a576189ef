// ============================================================================
// FILTER PIPELINE — render pipeline for the per-pixel color transform
// ============================================================================
//
// One draw per render: a full-screen quad over a target the size of the
// source image.  Hardware blending is disabled; the fragment shader computes
// the final color on its own.
// ============================================================================

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use super::context::GpuContext;
use super::texture::{RenderTarget, SourceTexture};
use crate::error::{FilterError, Result};
use crate::ops::adjustments::SaturationModel;
use crate::params::FilterParams;

/// Mirrors `FilterUniforms` in the WGSL source.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct FilterUniforms {
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
    pub greyscale: u32,
    pub saturation_model: u32,
    pub _pad: [u32; 3],
}

impl FilterUniforms {
    pub fn new(params: &FilterParams, model: SaturationModel) -> Self {
        Self {
            brightness: params.brightness,
            contrast: params.contrast,
            saturation: params.saturation,
            greyscale: params.greyscale as u32,
            saturation_model: model.to_u32(),
            _pad: [0; 3],
        }
    }
}

pub struct FilterPipeline {
    pipeline: wgpu::RenderPipeline,
    /// Group 1: the source texture.  Needed by `SourceTexture::new`.
    pub texture_bgl: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
}

impl FilterPipeline {
    /// Compile the shader and build the pipeline.  Compile or link errors are
    /// returned with the validator's diagnostic text.
    pub fn new(ctx: &GpuContext) -> Result<Self> {
        let shader = ctx.validated(
            |device| {
                device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some("filter_shader"),
                    source: wgpu::ShaderSource::Wgsl(super::shaders::FILTER_SHADER.into()),
                })
            },
            FilterError::ShaderCompile,
        )?;

        let device = &ctx.device;

        // Group 0: FilterUniforms
        let uniform_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("filter_uniform_bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        // Group 1: source texture (textureLoad only, no sampler)
        let texture_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("filter_texture_bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: false },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            }],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("filter_pipeline_layout"),
            bind_group_layouts: &[&uniform_bgl, &texture_bgl],
            push_constant_ranges: &[],
        });

        let pipeline = ctx.validated(
            |device| {
                device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some("filter_pipeline"),
                    layout: Some(&layout),
                    vertex: wgpu::VertexState {
                        module: &shader,
                        entry_point: "vs_quad",
                        buffers: &[],
                        compilation_options: Default::default(),
                    },
                    primitive: wgpu::PrimitiveState {
                        topology: wgpu::PrimitiveTopology::TriangleList,
                        ..Default::default()
                    },
                    depth_stencil: None,
                    multisample: wgpu::MultisampleState::default(),
                    fragment: Some(wgpu::FragmentState {
                        module: &shader,
                        entry_point: "fs_filter",
                        targets: &[Some(wgpu::ColorTargetState {
                            format: super::TARGET_FORMAT,
                            blend: None,
                            write_mask: wgpu::ColorWrites::ALL,
                        })],
                        compilation_options: Default::default(),
                    }),
                    multiview: None,
                })
            },
            FilterError::PipelineCreation,
        )?;

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("filter_uniforms"),
            contents: bytemuck::bytes_of(&FilterUniforms::new(
                &FilterParams::DEFAULT,
                SaturationModel::Linear,
            )),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("filter_uniform_bg"),
            layout: &uniform_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        Ok(Self {
            pipeline,
            texture_bgl,
            uniform_buffer,
            uniform_bind_group,
        })
    }

    /// Write the uniforms and draw the quad into `target`.
    pub fn draw(
        &self,
        ctx: &GpuContext,
        source: &SourceTexture,
        target: &RenderTarget,
        uniforms: &FilterUniforms,
    ) {
        ctx.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniforms));

        let mut encoder = ctx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("filter_encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("filter_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.view,
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
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            pass.set_bind_group(1, &source.bind_group, &[]);
            pass.draw(0..6, 0..1);
        }
        ctx.submit_one(encoder);
    }
}

/// Copy a whole texture into CPU memory as tightly packed RGBA8.
///
/// `cached_staging` keeps the mapped staging buffer alive between calls and is
/// only reallocated when a bigger one is needed.
pub fn readback_texture(
    ctx: &GpuContext,
    texture: &wgpu::Texture,
    width: u32,
    height: u32,
    cached_staging: &mut Option<(wgpu::Buffer, u64)>,
) -> Result<Vec<u8>> {
    let device = &ctx.device;

    let bytes_per_row = super::aligned_bytes_per_row(width);
    let buffer_size = super::readback_size(width, height);

    if !matches!(cached_staging, Some((_, sz)) if *sz >= buffer_size) {
        let buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("readback_staging"),
            size: buffer_size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        *cached_staging = Some((buf, buffer_size));
    }
    let Some((staging, _)) = cached_staging.as_ref() else {
        return Err(FilterError::Readback("no staging buffer".into()));
    };

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("readback_encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::ImageCopyTexture {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::ImageCopyBuffer {
            buffer: staging,
            layout: wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    ctx.submit_one(encoder);

    let slice = staging.slice(..buffer_size);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device.poll(wgpu::Maintain::Wait);
    match rx.recv() {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(FilterError::Readback(format!("map error: {:?}", e))),
        Err(e) => return Err(FilterError::Readback(format!("channel error: {}", e))),
    }

    let mapped = slice.get_mapped_range();
    let actual_row = (width * 4) as usize;
    let mut result = Vec::with_capacity(actual_row * height as usize);
    for row in mapped.chunks(bytes_per_row as usize).take(height as usize) {
        result.extend_from_slice(&row[..actual_row]);
    }
    drop(mapped);
    staging.unmap();

    Ok(result)
}

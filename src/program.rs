//! # Shader Program
//!
//! Compiles [`crate::SHADER_SOURCE`] and links it into the single render pipeline used for
//! both the sphere and the overlay. The shader:
//!
//! - transforms `@location(0)` positions by `uniforms.mvp`,
//! - transforms `@location(1)` texture coordinates by `uniforms.tex_transform`,
//! - samples the video texture bound at `@group(1)`.
//!
//! Shader and pipeline creation run inside a validation error scope. A shader that fails to
//! compile or a pipeline that fails to link is returned as an error right away instead of
//! leaving an invalid pipeline behind to draw garbage.

use std::borrow::Cow;

use crate::error::RendererError;
use crate::uniform_binding::UniformBinding;
use crate::vertex;
use crate::SHADER_SOURCE;

/// Bind group index of the uniform block.
pub const UNIFORM_GROUP: u32 = 0;
/// Bind group index of the video texture and its sampler.
pub const TEXTURE_GROUP: u32 = 1;
/// Binding of the video texture inside [`TEXTURE_GROUP`].
pub const TEXTURE_BINDING: u32 = 0;
/// Binding of the sampler inside [`TEXTURE_GROUP`].
pub const SAMPLER_BINDING: u32 = 1;

pub struct Program {
    pub pipeline: wgpu::RenderPipeline,

    pub uniform_layout: wgpu::BindGroupLayout,

    pub texture_layout: wgpu::BindGroupLayout,
}

impl Program {
    pub async fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
    ) -> Result<Self, RendererError> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sphere video shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(SHADER_SOURCE)),
        });
        if let Some(error) = device.pop_error_scope().await {
            return Err(RendererError::ShaderCompilation(error.to_string()));
        }

        let uniform_layout = UniformBinding::layout(device);
        let texture_layout = Self::texture_layout(device);

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = Self::create_pipeline(
            device,
            surface_format,
            &shader_module,
            &uniform_layout,
            &texture_layout,
        );
        if let Some(error) = device.pop_error_scope().await {
            return Err(RendererError::PipelineLink(error.to_string()));
        }

        log::debug!("shader program linked for {surface_format:?}");

        Ok(Self {
            pipeline,
            uniform_layout,
            texture_layout,
        })
    }

    fn texture_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: TEXTURE_BINDING,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: SAMPLER_BINDING,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
            label: Some("video_texture_bind_group_layout"),
        })
    }

    fn create_pipeline(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        shader_module: &wgpu::ShaderModule,
        uniform_layout: &wgpu::BindGroupLayout,
        texture_layout: &wgpu::BindGroupLayout,
    ) -> wgpu::RenderPipeline {
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sphere video pipeline layout"),
            bind_group_layouts: &[uniform_layout, texture_layout],
            push_constant_ranges: &[],
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("sphere video pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: shader_module,
                entry_point: Some("vertex_main"),
                buffers: &[vertex::position_layout(), vertex::tex_coord_layout()],
                compilation_options: Default::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: None, // non-indexed draws
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None, // the sphere is seen from inside
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
                unclipped_depth: false,
            },
            // Painter's order: sphere first, overlay on top.
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            fragment: Some(wgpu::FragmentState {
                module: shader_module,
                entry_point: Some("fragment_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            multiview: None,
            cache: None,
        })
    }
}

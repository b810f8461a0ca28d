//! # Uniform Binding
//!
//! Owns one uniform buffer and the bind group exposing it to the shader at
//! `@group(0) @binding(0)`.
//!
//! The sphere and the overlay are drawn in the same render pass with different matrices, so
//! each gets its own `UniformBinding`. Writes through `Queue::write_buffer` only land when the
//! frame is submitted; two draws sharing one buffer would both see the last write.
//!
//! All bindings share a single layout, created once by [`UniformBinding::layout`] and owned
//! by the [`crate::program::Program`].

use crate::uniform_buffer::UniformBuffer;

pub struct UniformBinding {
    pub buffer: wgpu::Buffer,

    pub bind_group: wgpu::BindGroup,
}

impl UniformBinding {
    /// Bind group layout matching the shader's uniform block, visible to the vertex stage.
    pub fn layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<UniformBuffer>() as u64,
                    ),
                },
                count: None,
            }],
            label: Some("uniform_bind_group_layout"),
        })
    }

    pub fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, label: &str) -> Self {
        let buffer = wgpu::util::DeviceExt::create_buffer_init(
            device,
            &wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(&[UniformBuffer::default()]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            },
        );

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some(label),
        });

        Self { buffer, bind_group }
    }

    pub fn update_buffer(&self, queue: &wgpu::Queue, uniform_buffer: UniformBuffer) {
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[uniform_buffer]))
    }
}

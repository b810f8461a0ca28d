//! # Scene
//!
//! GPU-side geometry of the viewer: the sphere the video is wrapped around and the flat
//! overlay strip along the bottom of the screen.
//!
//! Both are drawn with the same pipeline and the same video texture, one after the other:
//!
//! 1. the sphere, a triangle strip transformed by `P_frustum * V * R(yaw, pitch)`,
//! 2. the overlay, a four-vertex strip transformed by `P_ortho * V`.
//!
//! Each object has its own position buffer, texture-coordinate buffer and uniform binding.
//! The sphere buffers never change after creation. The overlay position buffer is rewritten
//! whenever the viewport bounds change.

use nalgebra_glm as glm;
use wgpu::util::DeviceExt;

use crate::camera::CameraState;
use crate::mesh::SphereMesh;
use crate::overlay::OverlayQuad;
use crate::program::{Program, TEXTURE_GROUP, UNIFORM_GROUP};
use crate::projection::{self, ViewportBounds};
use crate::uniform_binding::UniformBinding;
use crate::uniform_buffer::UniformBuffer;
use crate::vertex::{POSITION_SLOT, TEX_COORD_SLOT};

struct DrawObject {
    positions: wgpu::Buffer,
    tex_coords: wgpu::Buffer,
    uniform: UniformBinding,
    vertex_count: u32,
}

impl DrawObject {
    fn draw(&self, renderpass: &mut wgpu::RenderPass<'_>) {
        renderpass.set_bind_group(UNIFORM_GROUP, &self.uniform.bind_group, &[]);
        renderpass.set_vertex_buffer(POSITION_SLOT, self.positions.slice(..));
        renderpass.set_vertex_buffer(TEX_COORD_SLOT, self.tex_coords.slice(..));
        renderpass.draw(0..self.vertex_count, 0..1);
    }
}

pub struct Scene {
    sphere: DrawObject,

    overlay: DrawObject,

    bounds: ViewportBounds,
}

impl Scene {
    pub fn new(device: &wgpu::Device, program: &Program, mesh: &SphereMesh) -> Self {
        let sphere = DrawObject {
            positions: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("sphere positions"),
                contents: bytemuck::cast_slice(&mesh.positions),
                usage: wgpu::BufferUsages::VERTEX,
            }),
            tex_coords: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("sphere tex coords"),
                contents: bytemuck::cast_slice(&mesh.tex_coords),
                usage: wgpu::BufferUsages::VERTEX,
            }),
            uniform: UniformBinding::new(device, &program.uniform_layout, "sphere uniforms"),
            vertex_count: mesh.vertex_count(),
        };

        let bounds = ViewportBounds::default();
        let quad = OverlayQuad::build(&bounds);
        let overlay = DrawObject {
            positions: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("overlay positions"),
                contents: bytemuck::cast_slice(&quad.positions),
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            }),
            tex_coords: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("overlay tex coords"),
                contents: bytemuck::cast_slice(&quad.tex_coords),
                usage: wgpu::BufferUsages::VERTEX,
            }),
            uniform: UniformBinding::new(device, &program.uniform_layout, "overlay uniforms"),
            vertex_count: OverlayQuad::VERTEX_COUNT,
        };

        Self {
            sphere,
            overlay,
            bounds,
        }
    }

    /// Adopts new viewport bounds and rebuilds the overlay geometry for them.
    pub fn set_bounds(&mut self, queue: &wgpu::Queue, bounds: ViewportBounds) {
        self.bounds = bounds;
        let quad = OverlayQuad::build(&bounds);
        queue.write_buffer(
            &self.overlay.positions,
            0,
            bytemuck::cast_slice(&quad.positions),
        );
    }

    /// Uploads this frame's matrices for both objects.
    pub fn update(&self, queue: &wgpu::Queue, camera: CameraState, tex_transform: glm::Mat4) {
        self.sphere.uniform.update_buffer(
            queue,
            UniformBuffer {
                mvp: projection::sphere_transform(&self.bounds, camera),
                tex_transform,
            },
        );
        self.overlay.uniform.update_buffer(
            queue,
            UniformBuffer {
                mvp: projection::overlay_transform(&self.bounds),
                tex_transform,
            },
        );
    }

    pub fn render(
        &self,
        renderpass: &mut wgpu::RenderPass<'_>,
        program: &Program,
        texture_bind_group: &wgpu::BindGroup,
    ) {
        renderpass.set_pipeline(&program.pipeline);
        renderpass.set_bind_group(TEXTURE_GROUP, texture_bind_group, &[]);

        self.sphere.draw(renderpass);
        self.overlay.draw(renderpass);
    }
}

//! # Uniform Buffer
//!
//! CPU-side mirror of the shader's `Uniforms` block (see `sphere_video.wgsl`):
//!
//! | field           | WGSL type          | bytes |
//! |-----------------|--------------------|-------|
//! | `mvp`           | `mat4x4<f32>`      | 64    |
//! | `tex_transform` | `mat4x4<f32>`      | 64    |
//!
//! `mvp` is the combined projection-view(-rotation) matrix of the object being drawn;
//! `tex_transform` is the texture-coordinate transform that came with the current video
//! frame. Both matrices are column-major, which is what `nalgebra_glm::Mat4` stores and what
//! WGSL expects, so the struct can be uploaded with `bytemuck::bytes_of` as is.

use nalgebra_glm as glm;

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct UniformBuffer {
    pub mvp: glm::Mat4,
    pub tex_transform: glm::Mat4,
}

impl Default for UniformBuffer {
    fn default() -> Self {
        Self {
            mvp: glm::Mat4::identity(),
            tex_transform: glm::Mat4::identity(),
        }
    }
}

// Catch CPU/GPU layout mismatches at compile time
const _: () = assert!(std::mem::size_of::<UniformBuffer>() == 128);

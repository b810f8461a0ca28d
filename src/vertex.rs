//! # Vertex Layouts
//!
//! The sphere and the overlay quad both feed the pipeline through two parallel vertex
//! buffers rather than one interleaved buffer:
//!
//! - slot 0: [`Position`] (`vec3<f32>`) at shader location [`POSITION_LOCATION`]
//! - slot 1: [`TexCoord`] (`vec2<f32>`) at shader location [`TEX_COORD_LOCATION`]
//!
//! Keeping them apart lets [`crate::SphereMesh`] and [`crate::OverlayQuad`] hand their arrays
//! straight to `bytemuck::cast_slice` without repacking.
//!
//! ```ignore
//! let buffers = [vertex::position_layout(), vertex::tex_coord_layout()];
//! let state = wgpu::VertexState { buffers: &buffers, ..state };
//! ```

/// A vertex position in model space.
pub type Position = [f32; 3];

/// A texture coordinate before the frame's texture transform is applied.
pub type TexCoord = [f32; 2];

/// Shader location of the position attribute.
pub const POSITION_LOCATION: u32 = 0;

/// Shader location of the texture coordinate attribute.
pub const TEX_COORD_LOCATION: u32 = 1;

/// Vertex buffer slot the positions are bound to.
pub const POSITION_SLOT: u32 = 0;

/// Vertex buffer slot the texture coordinates are bound to.
pub const TEX_COORD_SLOT: u32 = 1;

const POSITION_ATTRIBUTES: [wgpu::VertexAttribute; 1] =
    wgpu::vertex_attr_array![POSITION_LOCATION => Float32x3];

const TEX_COORD_ATTRIBUTES: [wgpu::VertexAttribute; 1] =
    wgpu::vertex_attr_array![TEX_COORD_LOCATION => Float32x2];

/// Buffer layout for [`Position`] data.
pub fn position_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Position>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &POSITION_ATTRIBUTES,
    }
}

/// Buffer layout for [`TexCoord`] data.
pub fn tex_coord_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<TexCoord>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &TEX_COORD_ATTRIBUTES,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strides_match_attribute_formats() {
        assert_eq!(position_layout().array_stride, 12);
        assert_eq!(tex_coord_layout().array_stride, 8);
        assert_eq!(position_layout().attributes[0].shader_location, POSITION_LOCATION);
        assert_eq!(tex_coord_layout().attributes[0].shader_location, TEX_COORD_LOCATION);
    }
}

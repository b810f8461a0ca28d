//! # Video Texture
//!
//! The GPU side of the video binding: one RGBA8 texture, its sampler and the bind group the
//! shader samples from at `@group(1)`. It starts as a small checkerboard so the sphere is
//! visibly textured before the first frame arrives, and is updated in place for every
//! frame. A frame with different dimensions replaces the texture and rebuilds the bind
//! group.

use crate::error::VideoError;
use crate::program::{SAMPLER_BINDING, TEXTURE_BINDING};
use crate::video::VideoFrame;

// The surface is non-sRGB, so frame bytes go through untouched.
const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

const PLACEHOLDER: [u8; 16] = [
    40, 40, 40, 255, 90, 90, 90, 255, //
    90, 90, 90, 255, 40, 40, 40, 255,
];

pub struct VideoTexture {
    texture: wgpu::Texture,
    sampler: wgpu::Sampler,
    pub bind_group: wgpu::BindGroup,
    size: (u32, u32),
}

impl VideoTexture {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, layout: &wgpu::BindGroupLayout) -> Self {
        // Wrap around the seam, clamp at the poles.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("video_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let texture = Self::create_texture(device, 2, 2);
        write_pixels(queue, &texture, 2, 2, &PLACEHOLDER);
        let bind_group = Self::create_bind_group(device, layout, &texture, &sampler);

        Self {
            texture,
            sampler,
            bind_group,
            size: (2, 2),
        }
    }

    /// Copies `frame` into the texture, reallocating it if the frame size changed.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        frame: &VideoFrame,
    ) -> Result<(), VideoError> {
        let max = device.limits().max_texture_dimension_2d;
        if frame.width > max || frame.height > max {
            return Err(VideoError::Unsupported(format!(
                "frame {}x{} exceeds the maximum texture size {max}",
                frame.width, frame.height
            )));
        }

        if self.size != (frame.width, frame.height) {
            log::info!(
                "video texture resized from {:?} to {}x{}",
                self.size,
                frame.width,
                frame.height
            );
            self.texture = Self::create_texture(device, frame.width, frame.height);
            self.bind_group = Self::create_bind_group(device, layout, &self.texture, &self.sampler);
            self.size = (frame.width, frame.height);
        }

        write_pixels(queue, &self.texture, frame.width, frame.height, &frame.pixels);
        Ok(())
    }

    fn create_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::Texture {
        device.create_texture(&wgpu::TextureDescriptor {
            label: Some("video_texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        })
    }

    fn create_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        texture: &wgpu::Texture,
        sampler: &wgpu::Sampler,
    ) -> wgpu::BindGroup {
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: TEXTURE_BINDING,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: SAMPLER_BINDING,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
            label: Some("video_texture_bind_group"),
        })
    }
}

fn write_pixels(queue: &wgpu::Queue, texture: &wgpu::Texture, width: u32, height: u32, pixels: &[u8]) {
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
}

//! # Renderer
//!
//! Draws one frame of the viewer into the window surface:
//!
//! 1. **Texture sync.** If the video source published a new frame since the last render,
//!    it is uploaded into the [`VideoTexture`] and its texture transform is adopted. A
//!    frame is picked up at most once; a render with nothing new keeps the old texture.
//! 2. **Sphere**, then **overlay**, in painter's order (see [`Scene`]).
//! 3. **HUD**, whatever egui paint jobs the host produced for this frame.
//!
//! A `Renderer` lives exactly as long as its GPU device and window surface. When either
//! goes away (suspend, device loss) the host drops it and creates a new one, which
//! regenerates the mesh, the shader program and every buffer. The camera survives because
//! it is owned by the host.
//!
//! The camera angles are read once per frame from the [`SharedCamera`], so the sphere is
//! never drawn with a yaw from one touch and a pitch from another.
//!
//! ## Usage
//!
//! ```ignore
//! let camera = SharedCamera::default();
//! let mut renderer = Renderer::new(window, width, height, &config, camera.clone()).await?;
//! renderer.attach_video(&mut PatternSource::default());
//! renderer.resize(width, height);
//! renderer.render_frame(screen_descriptor, paint_jobs, textures_delta)?;
//! ```

use nalgebra_glm as glm;

use crate::camera::SharedCamera;
use crate::config::Config;
use crate::error::{RendererError, VideoError};
use crate::gpu::Gpu;
use crate::mesh::SphereMesh;
use crate::program::Program;
use crate::projection::ViewportBounds;
use crate::scene::Scene;
use crate::video::{self, FrameConsumer, VideoSource, VideoStatus};
use crate::video_texture::VideoTexture;

pub struct Renderer {
    gpu: Gpu,

    program: Program,

    scene: Scene,

    video_texture: VideoTexture,

    egui_renderer: egui_wgpu::Renderer,

    camera: SharedCamera,

    frames: Option<FrameConsumer>,

    /// Texture-coordinate transform of the last uploaded frame.
    tex_transform: glm::Mat4,

    status: VideoStatus,

    frames_shown: u64,

    clear_color: wgpu::Color,
}

impl Renderer {
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        config: &Config,
        camera: SharedCamera,
    ) -> Result<Self, RendererError> {
        let mesh = SphereMesh::generate(config.sphere)?;
        log::info!(
            "Sphere mesh: {} vertices ({}x{} steps, radius {})",
            mesh.vertex_count(),
            config.sphere.tetta_steps,
            config.sphere.phi_steps,
            config.sphere.radius
        );

        let gpu = Gpu::new_async(window, width, height).await?;

        let program = Program::new(&gpu.device, gpu.surface_format).await?;

        let scene = Scene::new(&gpu.device, &program, &mesh);

        let video_texture = VideoTexture::new(&gpu.device, &gpu.queue, &program.texture_layout);

        let egui_renderer =
            egui_wgpu::Renderer::new(&gpu.device, gpu.surface_config.format, None, 1, false);

        gpu.check("renderer setup")?;

        let mut renderer = Self {
            gpu,
            program,
            scene,
            video_texture,
            egui_renderer,
            camera,
            frames: None,
            tex_transform: glm::Mat4::identity(),
            status: VideoStatus::Waiting,
            frames_shown: 0,
            clear_color: config.clear_color,
        };
        renderer.resize(width, height);

        Ok(renderer)
    }

    pub fn camera(&self) -> &SharedCamera {
        &self.camera
    }

    pub fn status(&self) -> &VideoStatus {
        &self.status
    }

    /// Connects `source` to a fresh frame slot and starts it.
    ///
    /// Safe to call on every resume: frames still pending from the previous source are
    /// discarded along with its slot.
    pub fn attach_video(&mut self, source: &mut dyn VideoSource) -> Result<(), VideoError> {
        let (producer, consumer) = video::frame_slot();
        self.frames = Some(consumer);
        self.status = VideoStatus::Waiting;

        if let Err(error) = source.prepare(producer) {
            log::error!("Failed to start video source: {error}");
            self.status = VideoStatus::Failed(error.to_string());
            return Err(error);
        }
        log::info!("Video source attached");
        Ok(())
    }

    /// Reconfigures the surface and rebuilds the size-dependent geometry.
    /// Zero sizes (minimized windows) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        let Some(bounds) = ViewportBounds::from_size(width, height) else {
            log::debug!("Ignoring resize to {width}x{height}");
            return;
        };
        self.gpu.resize(width, height);
        self.scene.set_bounds(&self.gpu.queue, bounds);
    }

    fn sync_video(&mut self) {
        let Some(frames) = self.frames.as_ref() else {
            return;
        };

        if let Some(error) = frames.take_error() {
            self.status = VideoStatus::Failed(error.to_string());
        }

        let Some(frame) = frames.take_latest() else {
            return;
        };

        match self.video_texture.upload(
            &self.gpu.device,
            &self.gpu.queue,
            &self.program.texture_layout,
            &frame,
        ) {
            Ok(()) => {
                self.tex_transform = frame.transform;
                self.frames_shown += 1;
                self.status = VideoStatus::Playing {
                    frames: self.frames_shown,
                };
            }
            Err(error) => {
                log::error!("Dropping video frame: {error}");
                self.status = VideoStatus::Failed(error.to_string());
            }
        }
    }

    pub fn render_frame(
        &mut self,
        screen_descriptor: egui_wgpu::ScreenDescriptor,
        paint_jobs: Vec<egui::epaint::ClippedPrimitive>,
        textures_delta: egui::TexturesDelta,
    ) -> Result<(), RendererError> {
        if self.gpu.is_lost() {
            return Err(RendererError::ContextLost);
        }

        self.sync_video();
        self.gpu.check("texture upload")?;

        self.scene
            .update(&self.gpu.queue, self.camera.load(), self.tex_transform);

        for (id, image_delta) in &textures_delta.set {
            self.egui_renderer
                .update_texture(&self.gpu.device, &self.gpu.queue, *id, image_delta);
        }

        for id in &textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        let surface_texture = match self.gpu.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost, reconfiguring");
                self.gpu.configure();
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Timed out waiting for the surface texture, skipping frame");
                return Ok(());
            }
            Err(error) => return Err(error.into()),
        };

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        self.egui_renderer.update_buffers(
            &self.gpu.device,
            &self.gpu.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );

        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        encoder.insert_debug_marker("Render sphere video");

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.scene.render(
                &mut render_pass,
                &self.program,
                &self.video_texture.bind_group,
            );

            self.egui_renderer.render(
                &mut render_pass.forget_lifetime(),
                &paint_jobs,
                &screen_descriptor,
            );
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();

        self.gpu.check("draw")
    }
}

//! # Sphere Video
//!
//! A 360° video viewer. Decoded equirectangular frames are mapped onto the inside of a
//! sphere that the camera looks out from, and the same frame is shown flat in a strip along
//! the bottom of the screen as an orientation map. Dragging above the strip turns the
//! camera; touching the strip points it at the touched spot.
//!
//! ## Modules
//!
//! - [`app`]: `winit` host: window, event loop integration, pointer input and the HUD.
//! - [`renderer`]: per-frame texture sync and drawing.
//! - [`gpu`]: surface, device and queue, plus GPU error collection.
//! - [`program`]: the shader and the single render pipeline.
//! - [`scene`]: sphere and overlay vertex buffers and their uniforms.
//! - [`mesh`]: sphere triangle-strip generation.
//! - [`overlay`]: the bottom-strip quad.
//! - [`projection`]: viewport bounds and the projection/view matrices.
//! - [`camera`]: yaw/pitch state shared between input and rendering.
//! - [`input`]: touch samples to camera updates.
//! - [`video`]: video sources and the frame handoff slot.
//! - [`video_texture`]: the GPU texture frames are uploaded into.
//! - [`config`]: start-up options.
//! - [`error`]: error types.
//!
//! ## Threads
//!
//! Input may arrive on a different thread than rendering; both sides share the camera
//! through a [`SharedCamera`]. Video sources decode on their own threads and hand frames
//! over through [`video::frame_slot`].
//!
//! ## Features
//!
//! - `webgl` / `webgpu`: select the browser backend for `wasm32` builds.
//!
//! ## Example
//!
//! ```ignore
//! let config = sphere_video::Config::from(sphere_video::config::Args::parse());
//! let event_loop = winit::event_loop::EventLoop::builder().build()?;
//! event_loop.run_app(&mut sphere_video::App::new(config))?;
//! ```

pub mod app;
pub mod camera;
pub mod config;
pub mod error;
pub mod gpu;
pub mod input;
pub mod mesh;
pub mod overlay;
pub mod program;
pub mod projection;
pub mod renderer;
pub mod scene;
pub mod uniform_binding;
pub mod uniform_buffer;
pub mod vertex;
pub mod video;
pub mod video_texture;

pub use crate::app::App;
pub use crate::camera::{CameraState, SharedCamera};
pub use crate::config::Config;
pub use crate::error::{MeshError, RendererError, VideoError};
pub use crate::gpu::Gpu;
pub use crate::input::{InputMapper, RedrawRequest, TouchPhase};
pub use crate::mesh::{SphereMesh, SphereParams};
pub use crate::overlay::OverlayQuad;
pub use crate::program::Program;
pub use crate::projection::ViewportBounds;
pub use crate::renderer::Renderer;
pub use crate::scene::Scene;
pub use crate::uniform_binding::UniformBinding;
pub use crate::uniform_buffer::UniformBuffer;
pub use crate::video::{
    FrameConsumer, FrameProducer, PatternSource, VideoFrame, VideoSource, VideoStatus,
};
#[cfg(not(target_arch = "wasm32"))]
pub use crate::video::ImageSource;
pub use crate::video_texture::VideoTexture;

pub const SHADER_SOURCE: &str = include_str!("sphere_video.wgsl");

/// Browser entry point: sets up logging and runs the viewer in the `#canvas` element.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn start() -> Result<(), wasm_bindgen::JsValue> {
    use winit::platform::web::EventLoopExtWebSys;

    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    console_log::init_with_level(log::Level::Info)
        .map_err(|error| wasm_bindgen::JsValue::from_str(&error.to_string()))?;

    let event_loop = winit::event_loop::EventLoop::builder()
        .build()
        .map_err(|error| wasm_bindgen::JsValue::from_str(&error.to_string()))?;
    event_loop.spawn_app(App::default());
    Ok(())
}

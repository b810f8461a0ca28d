//! # Application
//!
//! The `winit` host for the viewer. [`App`] owns the window, the [`Renderer`], the egui
//! state and the [`VideoSource`], and forwards window events to them:
//!
//! - **Resume**: creates the window the first time, then builds a renderer and attaches
//!   the video source. **Suspend** drops the renderer and stops the video, so every resume
//!   starts from a new surface. A lost GPU device triggers the same rebuild.
//! - **Resize**: reconfigures the renderer and tells the [`InputMapper`] the new size.
//! - **Pointer**: mouse buttons, cursor motion and the first touch finger become
//!   [`TouchPhase`] samples for the [`InputMapper`].
//! - **Redraw**: builds the HUD and renders a frame. Redraws are requested continuously
//!   so that video frames keep flowing while the user is idle.
//!
//! On desktop the renderer is created synchronously with `pollster`. On WebAssembly it is
//! created in a spawned future and handed back through a oneshot channel, so the first few
//! events may arrive before it exists; they are dropped.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

use std::sync::Arc;

use web_time::Instant;

use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, MouseButton, WindowEvent},
    window::{Theme, Window},
};

use crate::camera::SharedCamera;
use crate::config::Config;
use crate::error::RendererError;
use crate::input::{InputMapper, TouchPhase};
use crate::renderer::Renderer;
use crate::video::{PatternSource, VideoSource, VideoStatus};

#[cfg(target_arch = "wasm32")]
type RendererReceiver = futures::channel::oneshot::Receiver<Result<Renderer, RendererError>>;

pub struct App {
    config: Config,

    window: Option<Arc<Window>>,

    renderer: Option<Renderer>,

    gui_state: Option<egui_winit::State>,

    input: InputMapper,

    pointer: PointerTracker,

    video: Box<dyn VideoSource>,

    last_render_time: Option<Instant>,

    frame_seconds: f32,

    #[cfg(target_arch = "wasm32")]
    renderer_receiver: Option<RendererReceiver>,

    last_size: (u32, u32),
}

impl Default for App {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl App {
    pub fn new(config: Config) -> Self {
        let video = video_source(&config);
        Self::with_video_source(config, video)
    }

    /// Uses `video` instead of the source `config` would pick.
    pub fn with_video_source(config: Config, video: Box<dyn VideoSource>) -> Self {
        Self {
            config,
            window: None,
            renderer: None,
            gui_state: None,
            input: InputMapper::new(SharedCamera::default()),
            pointer: PointerTracker::default(),
            video,
            last_render_time: None,
            frame_seconds: 0.0,
            #[cfg(target_arch = "wasm32")]
            renderer_receiver: None,
            last_size: (0, 0),
        }
    }

    fn attach_renderer(&mut self, mut renderer: Renderer) {
        let (width, height) = self.last_size;
        renderer.resize(width, height);
        // Failures are kept in the renderer's status and shown in the HUD.
        let _ = renderer.attach_video(self.video.as_mut());
        self.renderer = Some(renderer);
    }

    /// Builds a renderer, and a fresh egui state to go with it, for the current window.
    ///
    /// Used on the first resume, on every resume after a suspend and after the GPU device
    /// was lost. The mesh, shader program and all GPU buffers are created anew; the camera
    /// carries over.
    fn start_renderer(&mut self, event_loop: &winit::event_loop::ActiveEventLoop) {
        let Some(window_handle) = self.window.clone() else {
            return;
        };

        let gui_context = egui::Context::default();

        #[cfg(not(target_arch = "wasm32"))]
        {
            let inner_size = window_handle.inner_size();
            self.last_size = (inner_size.width, inner_size.height);
        }

        #[cfg(target_arch = "wasm32")]
        {
            gui_context.set_pixels_per_point(window_handle.scale_factor() as f32);
        }

        let viewport_id = gui_context.viewport_id();

        self.gui_state = Some(egui_winit::State::new(
            gui_context,
            viewport_id,
            &window_handle,
            Some(window_handle.scale_factor() as _),
            Some(Theme::Dark),
            None,
        ));

        let (width, height) = self.last_size;
        self.input.set_screen_size(width, height);
        let camera = self.input.camera().clone();

        #[cfg(not(target_arch = "wasm32"))]
        {
            let config = self.config.clone();
            let result = pollster::block_on(async move {
                Renderer::new(window_handle, width, height, &config, camera).await
            });
            match result {
                Ok(renderer) => self.attach_renderer(renderer),
                Err(error) => {
                    log::error!("Failed to create renderer: {error}");
                    event_loop.exit();
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let _ = event_loop;
            let (sender, receiver) = futures::channel::oneshot::channel();
            self.renderer_receiver = Some(receiver);
            let config = self.config.clone();
            log::info!("Canvas dimensions: ({width} x {height})");
            wasm_bindgen_futures::spawn_local(async move {
                let renderer = Renderer::new(window_handle, width, height, &config, camera).await;
                if sender.send(renderer).is_err() {
                    log::error!("Failed to send renderer!");
                }
            });
        }
    }

    fn touch(&mut self, x: f32, y: f32, phase: TouchPhase) {
        let _redraw = self.input.handle_touch(x, y, phase);
        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn video_source(config: &Config) -> Box<dyn VideoSource> {
    match &config.image_path {
        Some(path) => {
            log::info!("Showing {}", path.display());
            Box::new(crate::video::ImageSource::new(path.clone()))
        }
        None => Box::new(PatternSource::default()),
    }
}

#[cfg(target_arch = "wasm32")]
fn video_source(config: &Config) -> Box<dyn VideoSource> {
    if let Some(path) = &config.image_path {
        log::warn!("Ignoring {}: only the test pattern plays on the web", path.display());
    }
    Box::new(PatternSource::default())
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &winit::event_loop::ActiveEventLoop) {
        if self.renderer.is_some() {
            return;
        }
        #[cfg(target_arch = "wasm32")]
        if self.renderer_receiver.is_some() {
            return;
        }

        if self.window.is_none() {
            let mut attributes = Window::default_attributes();

            #[cfg(not(target_arch = "wasm32"))]
            {
                attributes = attributes.with_title("Sphere Video");
            }

            #[cfg(target_arch = "wasm32")]
            {
                use winit::platform::web::WindowAttributesExtWebSys;

                let canvas = wgpu::web_sys::window()
                    .and_then(|window| window.document())
                    .and_then(|document| document.get_element_by_id("canvas"))
                    .and_then(|element| {
                        element.dyn_into::<wgpu::web_sys::HtmlCanvasElement>().ok()
                    });
                let Some(canvas) = canvas else {
                    log::error!("No <canvas id=\"canvas\"> element to render into");
                    event_loop.exit();
                    return;
                };
                self.last_size = (canvas.width(), canvas.height());
                attributes = attributes.with_canvas(Some(canvas));
            }

            match event_loop.create_window(attributes) {
                Ok(window) => self.window = Some(Arc::new(window)),
                Err(error) => {
                    log::error!("Failed to create window: {error}");
                    event_loop.exit();
                    return;
                }
            }
        }

        self.start_renderer(event_loop);
        self.last_render_time = Some(Instant::now());
    }

    fn window_event(
        &mut self,
        event_loop: &winit::event_loop::ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: winit::event::WindowEvent,
    ) {
        #[cfg(target_arch = "wasm32")]
        if let Some(receiver) = self.renderer_receiver.as_mut() {
            if let Ok(Some(result)) = receiver.try_recv() {
                self.renderer_receiver = None;
                match result {
                    Ok(renderer) => self.attach_renderer(renderer),
                    Err(error) => {
                        log::error!("Failed to create renderer: {error}");
                        event_loop.exit();
                        return;
                    }
                }
            }
        }

        let (Some(gui_state), Some(window)) = (self.gui_state.as_mut(), self.window.clone())
        else {
            return;
        };

        if gui_state.on_window_event(&window, &event).consumed {
            window.request_redraw();
            return;
        }

        let sample = match &event {
            WindowEvent::CursorMoved { position, .. } => {
                self.pointer.cursor_moved(position.x as f32, position.y as f32)
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => self.pointer.mouse_button(*state == ElementState::Pressed),
            WindowEvent::Touch(touch) => self.pointer.touch(
                touch.id,
                touch.phase,
                touch.location.x as f32,
                touch.location.y as f32,
            ),
            _ => None,
        };
        if let Some((x, y, phase)) = sample {
            self.touch(x, y, phase);
            return;
        }

        match event {
            WindowEvent::KeyboardInput {
                event:
                    winit::event::KeyEvent {
                        physical_key: winit::keyboard::PhysicalKey::Code(key_code),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => match key_code {
                winit::keyboard::KeyCode::Escape => event_loop.exit(),
                winit::keyboard::KeyCode::KeyH => self.config.show_hud = !self.config.show_hud,
                _ => (),
            },
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                log::info!("Resizing renderer surface to: ({width}, {height})");
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.resize(width, height);
                }
                self.input.set_screen_size(width, height);
                self.last_size = (width, height);
            }
            WindowEvent::CloseRequested => {
                log::info!("Close requested. Exiting...");
                self.video.stop();
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                let Some(renderer) = self.renderer.as_mut() else {
                    window.request_redraw();
                    return;
                };

                let now = Instant::now();
                if let Some(last_render_time) = self.last_render_time.replace(now) {
                    self.frame_seconds = (now - last_render_time).as_secs_f32();
                }

                let gui_input = gui_state.take_egui_input(&window);
                gui_state.egui_ctx().begin_pass(gui_input);

                if self.config.show_hud {
                    hud(
                        gui_state.egui_ctx(),
                        renderer,
                        self.frame_seconds,
                    );
                }

                let egui_winit::egui::FullOutput {
                    textures_delta,
                    shapes,
                    pixels_per_point,
                    platform_output,
                    ..
                } = gui_state.egui_ctx().end_pass();

                gui_state.handle_platform_output(&window, platform_output);

                let paint_jobs = gui_state.egui_ctx().tessellate(shapes, pixels_per_point);

                let screen_descriptor = {
                    let (width, height) = self.last_size;
                    egui_wgpu::ScreenDescriptor {
                        size_in_pixels: [width, height],
                        pixels_per_point: window.scale_factor() as f32,
                    }
                };

                if let Err(error) =
                    renderer.render_frame(screen_descriptor, paint_jobs, textures_delta)
                {
                    log::error!("Failed to render frame: {error}");
                    match recovery(&error) {
                        Recovery::Continue => (),
                        Recovery::Rebuild => {
                            self.renderer = None;
                            self.start_renderer(event_loop);
                        }
                        Recovery::Exit => {
                            self.video.stop();
                            event_loop.exit();
                            return;
                        }
                    }
                }
            }
            _ => (),
        }

        window.request_redraw();
    }

    fn suspended(&mut self, _event_loop: &winit::event_loop::ActiveEventLoop) {
        // The native window, and with it the surface, may be destroyed until the next resume.
        log::info!("Suspended, releasing renderer and stopping video");
        self.video.stop();
        self.renderer = None;
        self.gui_state = None;
        #[cfg(target_arch = "wasm32")]
        {
            self.renderer_receiver = None;
        }
    }
}

/// What the host does after a failed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Recovery {
    /// Keep the renderer and try again next frame.
    Continue,
    /// Drop the renderer and build a new one on a new device.
    Rebuild,
    Exit,
}

fn recovery(error: &RendererError) -> Recovery {
    match error {
        RendererError::ContextLost => Recovery::Rebuild,
        RendererError::Surface(_) | RendererError::Gpu { .. } => Recovery::Exit,
        _ => Recovery::Continue,
    }
}

fn hud(ctx: &egui::Context, renderer: &Renderer, frame_seconds: f32) {
    #[cfg(not(target_arch = "wasm32"))]
    let title = "Sphere Video";

    #[cfg(feature = "webgpu")]
    let title = "Sphere Video/Webgpu";

    #[cfg(feature = "webgl")]
    let title = "Sphere Video/Webgl";

    let camera = renderer.camera().load();

    egui::Window::new(title)
        .anchor(egui::Align2::LEFT_TOP, [8.0, 8.0])
        .resizable(false)
        .collapsible(true)
        .show(ctx, |ui| {
            ui.label(format!("Yaw: {:.1}°", camera.yaw));
            ui.label(format!("Pitch: {:.1}°", camera.pitch));
            match renderer.status() {
                VideoStatus::Waiting => {
                    ui.label(egui::RichText::new("Video: waiting").color(egui::Color32::YELLOW));
                }
                VideoStatus::Playing { frames } => {
                    ui.label(format!("Video: {frames} frames"));
                }
                VideoStatus::Failed(message) => {
                    ui.label(
                        egui::RichText::new(format!("Video failed: {message}"))
                            .color(egui::Color32::RED),
                    );
                }
            }
            if frame_seconds > 0.0 {
                ui.label(
                    egui::RichText::new(format!("FPS: {:.1}", 1.0 / frame_seconds))
                        .color(egui::Color32::GREEN),
                );
            }
        });
}

/// Turns mouse and touch events into single-pointer samples.
///
/// The left mouse button acts as a finger. Of several touches only the first one down is
/// followed until it lifts.
#[derive(Debug, Default)]
struct PointerTracker {
    position: (f32, f32),
    pressed: bool,
    finger: Option<u64>,
}

impl PointerTracker {
    fn cursor_moved(&mut self, x: f32, y: f32) -> Option<(f32, f32, TouchPhase)> {
        self.position = (x, y);
        self.pressed.then_some((x, y, TouchPhase::Move))
    }

    fn mouse_button(&mut self, pressed: bool) -> Option<(f32, f32, TouchPhase)> {
        if self.pressed == pressed {
            return None;
        }
        self.pressed = pressed;
        let phase = if pressed {
            TouchPhase::Down
        } else {
            TouchPhase::Up
        };
        Some((self.position.0, self.position.1, phase))
    }

    fn touch(
        &mut self,
        id: u64,
        phase: winit::event::TouchPhase,
        x: f32,
        y: f32,
    ) -> Option<(f32, f32, TouchPhase)> {
        use winit::event::TouchPhase as Winit;

        match phase {
            Winit::Started if self.finger.is_none() => {
                self.finger = Some(id);
                Some((x, y, TouchPhase::Down))
            }
            Winit::Moved if self.finger == Some(id) => Some((x, y, TouchPhase::Move)),
            Winit::Ended | Winit::Cancelled if self.finger == Some(id) => {
                self.finger = None;
                Some((x, y, TouchPhase::Up))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::event::TouchPhase as Winit;

    #[test]
    fn lost_device_rebuilds_and_broken_surface_exits() {
        assert_eq!(recovery(&RendererError::ContextLost), Recovery::Rebuild);
        assert_eq!(
            recovery(&RendererError::Surface("out of memory".into())),
            Recovery::Exit
        );
        assert_eq!(
            recovery(&RendererError::Gpu {
                op: "draw",
                message: "validation".into()
            }),
            Recovery::Exit
        );
        assert_eq!(
            recovery(&RendererError::Mesh(crate::error::MeshError::InvalidRadius(0.0))),
            Recovery::Continue
        );
    }

    #[test]
    fn mouse_drag_becomes_down_move_up() {
        let mut pointer = PointerTracker::default();
        assert_eq!(pointer.cursor_moved(10.0, 20.0), None);
        assert_eq!(pointer.mouse_button(true), Some((10.0, 20.0, TouchPhase::Down)));
        assert_eq!(pointer.mouse_button(true), None);
        assert_eq!(
            pointer.cursor_moved(15.0, 25.0),
            Some((15.0, 25.0, TouchPhase::Move))
        );
        assert_eq!(pointer.mouse_button(false), Some((15.0, 25.0, TouchPhase::Up)));
        assert_eq!(pointer.cursor_moved(30.0, 30.0), None);
    }

    #[test]
    fn only_the_first_finger_is_followed() {
        let mut pointer = PointerTracker::default();
        assert_eq!(
            pointer.touch(1, Winit::Started, 1.0, 2.0),
            Some((1.0, 2.0, TouchPhase::Down))
        );
        assert_eq!(pointer.touch(2, Winit::Started, 5.0, 5.0), None);
        assert_eq!(pointer.touch(2, Winit::Moved, 6.0, 6.0), None);
        assert_eq!(
            pointer.touch(1, Winit::Moved, 3.0, 4.0),
            Some((3.0, 4.0, TouchPhase::Move))
        );
        assert_eq!(pointer.touch(2, Winit::Ended, 6.0, 6.0), None);
        assert_eq!(
            pointer.touch(1, Winit::Cancelled, 3.0, 4.0),
            Some((3.0, 4.0, TouchPhase::Up))
        );
        assert_eq!(
            pointer.touch(2, Winit::Started, 7.0, 7.0),
            Some((7.0, 7.0, TouchPhase::Down))
        );
    }
}

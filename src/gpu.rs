//! # GPU Context
//!
//! Owns the wgpu surface, device and queue for the window the viewer draws into, and the
//! surface configuration that has to be reapplied whenever the window changes size or the
//! surface is lost.
//!
//! Validation errors that wgpu reports outside an explicit error scope would normally
//! panic. Here they are collected instead, and [`Gpu::check`] drains them after each
//! state-changing step of a frame:
//!
//! - debug builds turn the first collected error into [`RendererError::Gpu`],
//! - release builds log every collected error and carry on.
//!
//! A lost device is tracked separately by [`ContextLoss`]. Once it is set, every check
//! fails with [`RendererError::ContextLost`] and the owner has to build a new `Gpu`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::RendererError;

type ErrorLog = Arc<Mutex<Vec<String>>>;

/// Set once the device behind a [`Gpu`] is gone. Everything created from that device,
/// including the mesh buffers and the pipeline, has to be rebuilt on a new one.
#[derive(Debug, Clone, Default)]
pub struct ContextLoss(Arc<AtomicBool>);

impl ContextLoss {
    pub fn mark(&self, reason: &str) {
        if !self.0.swap(true, Ordering::AcqRel) {
            log::error!("GPU device lost: {reason}");
        }
    }

    pub fn is_lost(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

pub struct Gpu {
    pub surface: wgpu::Surface<'static>,

    pub device: wgpu::Device,

    pub queue: wgpu::Queue,

    pub surface_config: wgpu::SurfaceConfiguration,

    pub surface_format: wgpu::TextureFormat,

    errors: ErrorLog,

    lost: ContextLoss,
}

impl Gpu {
    pub fn resize(&mut self, width: u32, height: u32) {
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.configure();
    }

    /// Reapplies the current configuration, e.g. after the surface was lost.
    pub fn configure(&self) {
        self.surface.configure(&self.device, &self.surface_config);
    }

    pub fn is_lost(&self) -> bool {
        self.lost.is_lost()
    }

    /// Reports GPU errors recorded since the last check, attributing them to `op`.
    pub fn check(&self, op: &'static str) -> Result<(), RendererError> {
        if self.is_lost() {
            return Err(RendererError::ContextLost);
        }
        let errors = std::mem::take(
            &mut *self.errors.lock().unwrap_or_else(PoisonError::into_inner),
        );
        Self::report(op, errors)
    }

    fn report(op: &'static str, errors: Vec<String>) -> Result<(), RendererError> {
        if cfg!(debug_assertions) {
            if let Some(message) = errors.into_iter().next() {
                return Err(RendererError::Gpu { op, message });
            }
        } else {
            for message in errors {
                log::error!("gpu error after {op}: {message}");
            }
        }
        Ok(())
    }

    pub async fn new_async(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> Result<Self, RendererError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RendererError::AdapterNotFound)?;

        log::info!("Using adapter: {:?}", adapter.get_info());

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("sphere video device"),
                    memory_hints: wgpu::MemoryHints::default(),
                    required_features: wgpu::Features::default(),
                    #[cfg(not(target_arch = "wasm32"))]
                    required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                    #[cfg(all(target_arch = "wasm32", feature = "webgpu"))]
                    required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                    #[cfg(all(target_arch = "wasm32", feature = "webgl"))]
                    required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                        .using_resolution(adapter.limits()),
                },
                None,
            )
            .await?;

        let errors = ErrorLog::default();
        {
            let errors = errors.clone();
            device.on_uncaptured_error(Box::new(move |error| {
                errors
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(error.to_string());
            }));
        }

        let lost = ContextLoss::default();
        {
            let lost = lost.clone();
            device.set_device_lost_callback(move |reason, message| {
                lost.mark(&format!("{reason:?}: {message}"));
            });
        }

        let surface_capabilities = surface.get_capabilities(&adapter);

        let surface_format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb()) // egui wants a non-srgb surface texture
            .or_else(|| surface_capabilities.formats.first().copied())
            .ok_or_else(|| RendererError::Surface("surface reports no formats".into()))?;

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_capabilities
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &surface_config);

        Ok(Self {
            surface,
            device,
            queue,
            surface_config,
            surface_format,
            errors,
            lost,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_loss_is_shared_between_clones_and_sticks() {
        let loss = ContextLoss::default();
        let callback_side = loss.clone();
        assert!(!loss.is_lost());
        callback_side.mark("Unknown: driver reset");
        callback_side.mark("Destroyed: second report");
        assert!(loss.is_lost());
    }

    #[test]
    fn check_passes_without_errors() {
        assert!(Gpu::report("draw", Vec::new()).is_ok());
    }

    #[test]
    #[cfg(debug_assertions)]
    fn debug_builds_fail_on_recorded_errors() {
        let result = Gpu::report("upload", vec!["bad copy".into(), "second".into()]);
        match result {
            Err(RendererError::Gpu { op, message }) => {
                assert_eq!(op, "upload");
                assert_eq!(message, "bad copy");
            }
            other => panic!("expected a gpu error, got {other:?}"),
        }
    }
}

//! # Camera State
//!
//! The camera is two angles in degrees: `yaw` (rotation about the vertical axis) and
//! `pitch` (rotation about the horizontal axis). Input writes them, the renderer reads them
//! once per frame.
//!
//! [`SharedCamera`] is the handoff between those two sides. Both angles are packed into one
//! `AtomicU64`, so a reader never sees a yaw from one update paired with a pitch from
//! another.
//!
//! Angles are never wrapped or clamped; a long drag keeps accumulating.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use nalgebra_glm as glm;

/// Yaw and pitch in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CameraState {
    pub yaw: f32,
    pub pitch: f32,
}

impl CameraState {
    pub fn new(yaw: f32, pitch: f32) -> Self {
        Self { yaw, pitch }
    }

    /// Pitch about -X first, then yaw about -Y: `R = Rx(pitch) * Ry(yaw)`.
    pub fn rotation(&self) -> glm::Mat4 {
        let around_x = glm::rotation(self.pitch.to_radians(), &glm::vec3(-1.0, 0.0, 0.0));
        let around_y = glm::rotation(self.yaw.to_radians(), &glm::vec3(0.0, -1.0, 0.0));
        around_x * around_y
    }

    fn pack(self) -> u64 {
        (u64::from(self.yaw.to_bits()) << 32) | u64::from(self.pitch.to_bits())
    }

    fn unpack(bits: u64) -> Self {
        Self {
            yaw: f32::from_bits((bits >> 32) as u32),
            pitch: f32::from_bits(bits as u32),
        }
    }
}

/// Camera state shared between the input side and the render side.
#[derive(Debug, Clone, Default)]
pub struct SharedCamera {
    bits: Arc<AtomicU64>,
}

impl SharedCamera {
    pub fn new(state: CameraState) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(state.pack())),
        }
    }

    /// Consistent snapshot of both angles.
    pub fn load(&self) -> CameraState {
        CameraState::unpack(self.bits.load(Ordering::Acquire))
    }

    pub fn store(&self, state: CameraState) {
        self.bits.store(state.pack(), Ordering::Release);
    }

    /// Applies `f` atomically and returns the new state.
    pub fn update(&self, f: impl Fn(CameraState) -> CameraState) -> CameraState {
        let mut current = self.bits.load(Ordering::Acquire);
        loop {
            let next = f(CameraState::unpack(current));
            match self.bits.compare_exchange_weak(
                current,
                next.pack(),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return next,
                Err(actual) => current = actual,
            }
        }
    }
}

//! # Touch Input
//!
//! Turns raw pointer samples into camera angle updates. The screen is split at
//! `height * 4/5`:
//!
//! - **Sphere region** (above the split): dragging rotates the camera relative to where it
//!   is, by the pointer displacement times [`TOUCH_SCALE_FACTOR`]. A touch-down here does
//!   nothing on its own.
//! - **Overlay region** (the bottom fifth): touch-down and drag both set the angles
//!   absolutely from the pointer position, so the overlay acts as an orientation map.
//!
//! Every sample updates the remembered pointer position, even when no angle changed, and
//! every sample asks the host for a redraw.

use crate::camera::{CameraState, SharedCamera};

/// Degrees of rotation per pixel of drag in the sphere region.
pub const TOUCH_SCALE_FACTOR: f32 = 180.0 / 320.0 / 3.8;

/// Fraction of the screen height above which drags rotate the sphere.
pub const SPHERE_REGION_RATIO: f32 = 4.0 / 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Down,
    Move,
    Up,
}

/// Returned by [`InputMapper::handle_touch`]; tells the host to schedule a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct RedrawRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Region {
    Sphere,
    Overlay,
}

#[derive(Debug)]
pub struct InputMapper {
    camera: SharedCamera,
    screen_width: f32,
    screen_height: f32,
    previous: (f32, f32),
}

impl InputMapper {
    pub fn new(camera: SharedCamera) -> Self {
        Self {
            camera,
            screen_width: 0.0,
            screen_height: 0.0,
            previous: (0.0, 0.0),
        }
    }

    pub fn camera(&self) -> &SharedCamera {
        &self.camera
    }

    /// Records the viewport size the touch coordinates refer to.
    pub fn set_screen_size(&mut self, width: u32, height: u32) {
        self.screen_width = width as f32;
        self.screen_height = height as f32;
    }

    /// Y coordinate separating the sphere region from the overlay region.
    pub fn threshold_y(&self) -> f32 {
        self.screen_height * SPHERE_REGION_RATIO
    }

    pub fn handle_touch(&mut self, x: f32, y: f32, phase: TouchPhase) -> RedrawRequest {
        if self.screen_width > 0.0 && self.screen_height > 0.0 {
            match (phase, self.region(y)) {
                (TouchPhase::Move, Region::Sphere) => {
                    let dx = x - self.previous.0;
                    let dy = y - self.previous.1;
                    self.camera.update(|c| {
                        CameraState::new(
                            c.yaw + dx * TOUCH_SCALE_FACTOR,
                            c.pitch + dy * TOUCH_SCALE_FACTOR,
                        )
                    });
                }
                (TouchPhase::Down | TouchPhase::Move, Region::Overlay) => {
                    self.camera.store(self.overlay_angles(x, y));
                }
                (TouchPhase::Down, Region::Sphere) | (TouchPhase::Up, _) => {}
            }
        } else {
            log::trace!("touch at ({x}, {y}) before the first resize, angles unchanged");
        }

        self.previous = (x, y);
        RedrawRequest
    }

    fn region(&self, y: f32) -> Region {
        if y < self.threshold_y() {
            Region::Sphere
        } else {
            Region::Overlay
        }
    }

    fn overlay_angles(&self, x: f32, y: f32) -> CameraState {
        let strip_height = self.screen_height / 5.0;
        CameraState::new(
            -x / self.screen_width * 360.0 - 90.0,
            90.0 - (180.0 / strip_height) * (y - self.threshold_y()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper(width: u32, height: u32) -> InputMapper {
        let mut mapper = InputMapper::new(SharedCamera::default());
        mapper.set_screen_size(width, height);
        mapper
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn threshold_is_four_fifths_of_height() {
        assert_eq!(mapper(1000, 2000).threshold_y(), 1600.0);
    }

    #[test]
    fn touch_down_in_overlay_sets_angles_absolutely() {
        let mut m = mapper(1000, 2000);
        let _ = m.handle_touch(500.0, 1800.0, TouchPhase::Down);
        let camera = m.camera().load();
        assert!(close(camera.yaw, -270.0));
        // Halfway down the strip is the horizon.
        assert!(close(camera.pitch, 0.0));
    }

    #[test]
    fn touch_down_in_sphere_region_leaves_angles_alone() {
        let mut m = mapper(1000, 2000);
        m.camera().store(CameraState::new(12.0, -3.0));
        let _ = m.handle_touch(400.0, 300.0, TouchPhase::Down);
        assert_eq!(m.camera().load(), CameraState::new(12.0, -3.0));
    }

    #[test]
    fn drag_in_sphere_region_accumulates_scaled_deltas() {
        let mut m = mapper(1000, 2000);
        let _ = m.handle_touch(100.0, 200.0, TouchPhase::Down);
        let _ = m.handle_touch(164.0, 138.0, TouchPhase::Move);
        let camera = m.camera().load();
        assert!(close(camera.yaw, 64.0 * TOUCH_SCALE_FACTOR));
        assert!(close(camera.pitch, -62.0 * TOUCH_SCALE_FACTOR));

        let _ = m.handle_touch(200.0, 150.0, TouchPhase::Move);
        let camera = m.camera().load();
        assert!(close(camera.yaw, 100.0 * TOUCH_SCALE_FACTOR));
        assert!(close(camera.pitch, -50.0 * TOUCH_SCALE_FACTOR));
    }

    #[test]
    fn drag_in_overlay_region_tracks_position() {
        let mut m = mapper(1000, 2000);
        let _ = m.handle_touch(0.0, 1600.0, TouchPhase::Move);
        let camera = m.camera().load();
        assert!(close(camera.yaw, -90.0));
        assert!(close(camera.pitch, 90.0));

        let _ = m.handle_touch(1000.0, 2000.0, TouchPhase::Move);
        let camera = m.camera().load();
        assert!(close(camera.yaw, -450.0));
        assert!(close(camera.pitch, -90.0));
    }

    #[test]
    fn ignored_samples_still_move_the_reference_point() {
        let mut m = mapper(1000, 2000);
        // Down in the sphere region updates nothing but the reference point.
        let _ = m.handle_touch(10.0, 10.0, TouchPhase::Down);
        let _ = m.handle_touch(300.0, 400.0, TouchPhase::Up);
        let _ = m.handle_touch(310.0, 405.0, TouchPhase::Move);
        let camera = m.camera().load();
        assert!(close(camera.yaw, 10.0 * TOUCH_SCALE_FACTOR));
        assert!(close(camera.pitch, 5.0 * TOUCH_SCALE_FACTOR));
    }

    #[test]
    fn angles_are_not_wrapped() {
        let mut m = mapper(1000, 2000);
        let _ = m.handle_touch(0.0, 0.0, TouchPhase::Down);
        for step in 1..=200 {
            let _ = m.handle_touch(step as f32 * 100.0, 0.0, TouchPhase::Move);
        }
        let expected = 20_000.0 * TOUCH_SCALE_FACTOR;
        assert!((m.camera().load().yaw - expected).abs() < expected * 1e-4);
    }

    #[test]
    fn touches_before_first_resize_do_not_produce_nan() {
        let mut m = InputMapper::new(SharedCamera::default());
        assert_eq!(m.handle_touch(5.0, 5.0, TouchPhase::Down), RedrawRequest);
        let _ = m.handle_touch(50.0, 50.0, TouchPhase::Move);
        assert_eq!(m.camera().load(), CameraState::default());
    }
}

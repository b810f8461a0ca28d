//! # Viewport Bounds and Projection Matrices
//!
//! The viewer works in a normalized space where the shorter screen axis spans `[-1, 1]` and
//! the longer axis is stretched by the aspect ratio. Both the perspective projection of the
//! sphere and the orthographic projection of the overlay are built over those bounds.
//!
//! Matrices follow OpenGL's `frustumM`/`orthoM` conventions for x and y but map depth into
//! wgpu's `0..1` clip range.

use nalgebra_glm as glm;

use crate::camera::CameraState;

/// Near plane of the sphere frustum.
pub const SPHERE_NEAR: f32 = 1.2;
/// Far plane of the sphere frustum.
pub const SPHERE_FAR: f32 = 5.0;
/// Near plane of the overlay projection.
pub const OVERLAY_NEAR: f32 = 0.0;
/// Far plane of the overlay projection.
pub const OVERLAY_FAR: f32 = 5.0;

/// Left/right/bottom/top of the current viewport in normalized units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportBounds {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
}

impl Default for ViewportBounds {
    fn default() -> Self {
        Self {
            left: -1.0,
            right: 1.0,
            bottom: -1.0,
            top: 1.0,
        }
    }
}

impl ViewportBounds {
    /// Scales the unit square along the longer axis so pixels stay square.
    ///
    /// Returns `None` for an empty viewport.
    pub fn from_size(width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }

        let mut bounds = Self::default();
        if width > height {
            let ratio = width as f32 / height as f32;
            bounds.left *= ratio;
            bounds.right *= ratio;
        } else {
            let ratio = height as f32 / width as f32;
            bounds.bottom *= ratio;
            bounds.top *= ratio;
        }
        Some(bounds)
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.top - self.bottom
    }
}

/// Perspective projection over `bounds` at the near plane.
pub fn frustum(bounds: &ViewportBounds, near: f32, far: f32) -> glm::Mat4 {
    let ViewportBounds {
        left,
        right,
        bottom,
        top,
    } = *bounds;

    glm::Mat4::new(
        2.0 * near / (right - left),
        0.0,
        (right + left) / (right - left),
        0.0,
        0.0,
        2.0 * near / (top - bottom),
        (top + bottom) / (top - bottom),
        0.0,
        0.0,
        0.0,
        far / (near - far),
        near * far / (near - far),
        0.0,
        0.0,
        -1.0,
        0.0,
    )
}

/// Orthographic projection over `bounds`.
pub fn ortho(bounds: &ViewportBounds, near: f32, far: f32) -> glm::Mat4 {
    glm::ortho_rh_zo(bounds.left, bounds.right, bounds.bottom, bounds.top, near, far)
}

/// Fixed camera: at the origin, looking down -Z with +Y up.
pub fn view() -> glm::Mat4 {
    glm::look_at_rh(
        &glm::vec3(0.0, 0.0, 0.0),
        &glm::vec3(0.0, 0.0, -1.0),
        &glm::Vec3::y(),
    )
}

/// Combined matrix for the sphere: projection, fixed view, then the camera rotation.
pub fn sphere_transform(bounds: &ViewportBounds, camera: CameraState) -> glm::Mat4 {
    frustum(bounds, SPHERE_NEAR, SPHERE_FAR) * view() * camera.rotation()
}

/// Combined matrix for the overlay. Independent of the camera.
pub fn overlay_transform(bounds: &ViewportBounds) -> glm::Mat4 {
    ortho(bounds, OVERLAY_NEAR, OVERLAY_FAR) * view()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(m: &glm::Mat4, p: glm::Vec3) -> glm::Vec3 {
        let clip = m * glm::vec4(p.x, p.y, p.z, 1.0);
        glm::vec3(clip.x / clip.w, clip.y / clip.w, clip.z / clip.w)
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn landscape_scales_horizontal_bounds() {
        let b = ViewportBounds::from_size(2000, 1000).unwrap();
        assert_eq!(
            b,
            ViewportBounds {
                left: -2.0,
                right: 2.0,
                bottom: -1.0,
                top: 1.0
            }
        );
    }

    #[test]
    fn portrait_and_square_scale_vertical_bounds() {
        let b = ViewportBounds::from_size(1000, 2000).unwrap();
        assert_eq!((b.bottom, b.top), (-2.0, 2.0));
        assert_eq!((b.left, b.right), (-1.0, 1.0));

        let square = ViewportBounds::from_size(512, 512).unwrap();
        assert_eq!(square, ViewportBounds::default());
    }

    #[test]
    fn empty_viewport_has_no_bounds() {
        assert!(ViewportBounds::from_size(0, 100).is_none());
        assert!(ViewportBounds::from_size(100, 0).is_none());
    }

    #[test]
    fn fixed_view_is_identity() {
        let diff = view() - glm::Mat4::identity();
        assert!(diff.iter().all(|v| v.abs() < 1e-6));
    }

    #[test]
    fn frustum_maps_near_corners_and_depth_range() {
        let b = ViewportBounds::from_size(1000, 2000).unwrap();
        let p = frustum(&b, SPHERE_NEAR, SPHERE_FAR);

        let corner = project(&p, glm::vec3(b.right, b.top, -SPHERE_NEAR));
        assert!(close(corner.x, 1.0) && close(corner.y, 1.0) && close(corner.z, 0.0));

        let far_center = project(&p, glm::vec3(0.0, 0.0, -SPHERE_FAR));
        assert!(close(far_center.x, 0.0) && close(far_center.y, 0.0) && close(far_center.z, 1.0));
    }

    #[test]
    fn ortho_maps_bounds_to_clip_edges() {
        let b = ViewportBounds::from_size(1600, 900).unwrap();
        let m = overlay_transform(&b);
        let bottom_left = project(&m, glm::vec3(b.left, b.bottom, 0.0));
        assert!(close(bottom_left.x, -1.0) && close(bottom_left.y, -1.0) && close(bottom_left.z, 0.0));
        let top_right = project(&m, glm::vec3(b.right, b.top, -OVERLAY_FAR));
        assert!(close(top_right.x, 1.0) && close(top_right.y, 1.0) && close(top_right.z, 1.0));
    }

    #[test]
    fn unrotated_camera_looks_down_negative_z() {
        let b = ViewportBounds::default();
        let m = sphere_transform(&b, CameraState::default());
        let ahead = project(&m, glm::vec3(0.0, 0.0, -3.0));
        assert!(close(ahead.x, 0.0) && close(ahead.y, 0.0));
        assert!(ahead.z > 0.0 && ahead.z < 1.0);
    }
}

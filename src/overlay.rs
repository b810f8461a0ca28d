//! Screen-space strip along the bottom fifth of the viewport that shows the whole video
//! frame unprojected. Touching it steers the camera (see [`crate::input`]).

use crate::projection::ViewportBounds;
use crate::vertex::{Position, TexCoord};

/// Share of the viewport height the overlay covers, as a divisor.
pub const OVERLAY_HEIGHT_DIVISOR: f32 = 5.0;

/// Texture coordinates of the quad corners, in strip order.
pub const OVERLAY_TEX_COORDS: [TexCoord; 4] = [[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayQuad {
    pub positions: [Position; 4],
    pub tex_coords: [TexCoord; 4],
}

impl OverlayQuad {
    /// Full width, bottom fifth of the height. Depends on `bounds` only.
    pub fn build(bounds: &ViewportBounds) -> Self {
        let strip_top = bounds.bottom + bounds.height() / OVERLAY_HEIGHT_DIVISOR;
        Self {
            positions: [
                [bounds.left, bounds.bottom, 0.0],
                [bounds.left, strip_top, 0.0],
                [bounds.right, bounds.bottom, 0.0],
                [bounds.right, strip_top, 0.0],
            ],
            tex_coords: OVERLAY_TEX_COORDS,
        }
    }

    pub const VERTEX_COUNT: u32 = 4;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spans_full_width_and_bottom_fifth() {
        for (w, h) in [(1000, 2000), (1920, 1080), (640, 640), (1, 4000)] {
            let bounds = ViewportBounds::from_size(w, h).unwrap();
            let quad = OverlayQuad::build(&bounds);

            let xs: Vec<f32> = quad.positions.iter().map(|p| p[0]).collect();
            let ys: Vec<f32> = quad.positions.iter().map(|p| p[1]).collect();
            assert_eq!(xs, vec![bounds.left, bounds.left, bounds.right, bounds.right]);

            let expected_top = bounds.bottom + (bounds.top - bounds.bottom) / 5.0;
            assert_eq!(ys, vec![bounds.bottom, expected_top, bounds.bottom, expected_top]);
            assert!(quad.positions.iter().all(|p| p[2] == 0.0));
        }
    }

    #[test]
    fn portrait_strip_coordinates() {
        let bounds = ViewportBounds::from_size(1000, 2000).unwrap();
        let quad = OverlayQuad::build(&bounds);
        assert_eq!(quad.positions[0], [-1.0, -2.0, 0.0]);
        assert!((quad.positions[3][1] - (-1.2)).abs() < 1e-6);
    }

    #[test]
    fn rebuilding_for_the_same_size_is_byte_identical() {
        let first = OverlayQuad::build(&ViewportBounds::from_size(1280, 720).unwrap());
        let second = OverlayQuad::build(&ViewportBounds::from_size(1280, 720).unwrap());
        let first_bytes: &[u8] = bytemuck::cast_slice(&first.positions);
        let second_bytes: &[u8] = bytemuck::cast_slice(&second.positions);
        assert_eq!(first_bytes, second_bytes);
        assert_eq!(
            bytemuck::cast_slice::<TexCoord, u8>(&first.tex_coords),
            bytemuck::cast_slice::<TexCoord, u8>(&second.tex_coords)
        );
    }

    #[test]
    fn texture_set_is_the_unit_square() {
        let quad = OverlayQuad::build(&ViewportBounds::default());
        assert_eq!(quad.tex_coords, OVERLAY_TEX_COORDS);
    }
}

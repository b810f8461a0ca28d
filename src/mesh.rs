//! # Sphere Mesh
//!
//! Builds the latitude/longitude sphere the video is projected onto. The mesh is emitted for
//! triangle-strip rendering: each latitude band contributes a zig-zag of vertex pairs, one
//! on the band's upper edge (`tetta`) and one on its lower edge (`tetta + step`), for every
//! longitude from `0` to `2π` inclusive.
//!
//! Positions and texture coordinates are kept as two parallel arrays so they can be bound as
//! two separate vertex buffers (see [`crate::vertex`]).
//!
//! Texture mapping is equirectangular: `u = phi / 2π` and `v = 1 - tetta / π`, so the top of
//! the video lands on the top of the sphere once the frame's texture transform is applied.

use std::f32::consts::PI;

use crate::error::MeshError;
use crate::vertex::{Position, TexCoord};

/// Upper bound on generated vertices: 4M vertices, 80 MiB of vertex data.
pub const MAX_VERTICES: usize = 1 << 22;

/// Subdivision and size of the generated sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereParams {
    /// Latitude bands between the poles.
    pub tetta_steps: u32,
    /// Longitude segments around the equator.
    pub phi_steps: u32,
    pub radius: f32,
}

impl Default for SphereParams {
    fn default() -> Self {
        Self {
            tetta_steps: 10,
            phi_steps: 18,
            radius: 5.0,
        }
    }
}

impl SphereParams {
    /// Number of strip vertices the mesh will contain, `None` if it does not fit a `usize`.
    pub fn vertex_count(&self) -> Option<usize> {
        usize::try_from(self.tetta_steps)
            .ok()?
            .checked_mul(usize::try_from(self.phi_steps).ok()?.checked_add(1)?)?
            .checked_mul(2)
    }

    /// Checks the parameters and returns the vertex count they produce.
    fn validate(&self) -> Result<usize, MeshError> {
        if self.tetta_steps == 0 || self.phi_steps == 0 {
            return Err(MeshError::NoSteps {
                tetta_steps: self.tetta_steps,
                phi_steps: self.phi_steps,
            });
        }
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(MeshError::InvalidRadius(self.radius));
        }
        match self.vertex_count() {
            Some(count) if count <= MAX_VERTICES => Ok(count),
            _ => Err(MeshError::TooManyVertices {
                tetta_steps: self.tetta_steps,
                phi_steps: self.phi_steps,
                max: MAX_VERTICES,
            }),
        }
    }
}

/// Immutable sphere geometry, generated once per rendering context.
#[derive(Debug, Clone, PartialEq)]
pub struct SphereMesh {
    pub positions: Vec<Position>,
    pub tex_coords: Vec<TexCoord>,
}

impl SphereMesh {
    pub fn generate(params: SphereParams) -> Result<Self, MeshError> {
        let count = params.validate()?;
        let mut positions = Vec::with_capacity(count);
        let mut tex_coords = Vec::with_capacity(count);

        let tetta_step = PI / params.tetta_steps as f32;
        let phi_step = 2.0 * PI / params.phi_steps as f32;

        for band in 0..params.tetta_steps {
            // Band edges come straight from the integer index; nothing accumulates.
            let upper = band as f32 * tetta_step;
            let lower = (band + 1) as f32 * tetta_step;

            for segment in 0..=params.phi_steps {
                let phi = segment as f32 * phi_step;

                for tetta in [upper, lower] {
                    positions.push(sphere_point(params.radius, tetta, phi));
                    tex_coords.push([phi / (2.0 * PI), 1.0 - tetta / PI]);
                }
            }
        }

        debug_assert_eq!(positions.len(), count);
        debug_assert_eq!(tex_coords.len(), count);

        Ok(Self {
            positions,
            tex_coords,
        })
    }

    pub fn vertex_count(&self) -> u32 {
        // Bounded by MAX_VERTICES at generation.
        u32::try_from(self.positions.len()).unwrap_or(u32::MAX)
    }
}

fn sphere_point(radius: f32, tetta: f32, phi: f32) -> Position {
    let (sin_t, cos_t) = tetta.sin_cos();
    let (sin_p, cos_p) = phi.sin_cos();
    [radius * sin_t * cos_p, radius * cos_t, radius * sin_t * sin_p]
}

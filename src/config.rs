//! # Configuration
//!
//! Start-up options for the viewer. There is no config file. On desktop everything comes
//! from the command line through [`Args`], with one environment fallback:
//!
//! ```text
//! sphere-video [IMAGE_PATH] [--no-hud] [--tetta N] [--phi N]
//! ```
//!
//! Without a path on the command line, `SPHERE_IMAGE_PATH` is used. Without either, the
//! built-in test pattern plays.

use std::path::PathBuf;

use crate::mesh::SphereParams;

/// Environment variable consulted when no image path is passed.
pub const IMAGE_PATH_ENV: &str = "SPHERE_IMAGE_PATH";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub sphere: SphereParams,

    /// Equirectangular still image to map onto the sphere. `None` plays the animated
    /// test pattern.
    pub image_path: Option<PathBuf>,

    /// Draw the yaw/pitch/status overlay window.
    pub show_hud: bool,

    pub clear_color: wgpu::Color,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sphere: SphereParams::default(),
            image_path: None,
            show_hud: true,
            clear_color: wgpu::Color::GREEN,
        }
    }
}

/// Sphere video viewer.
#[cfg(not(target_arch = "wasm32"))]
#[derive(clap::Parser, Debug)]
#[command(name = "sphere-video", version, about)]
pub struct Args {
    /// Equirectangular still image to map onto the sphere. Plays a test pattern when absent.
    #[arg(env = IMAGE_PATH_ENV)]
    pub image_path: Option<PathBuf>,

    /// Hide the yaw/pitch/status window.
    #[arg(long)]
    pub no_hud: bool,

    /// Latitude bands of the sphere mesh.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub tetta: Option<u32>,

    /// Longitude segments of the sphere mesh.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub phi: Option<u32>,
}

#[cfg(not(target_arch = "wasm32"))]
impl From<Args> for Config {
    fn from(args: Args) -> Self {
        let mut config = Config {
            image_path: args.image_path,
            show_hud: !args.no_hud,
            ..Config::default()
        };
        if let Some(tetta_steps) = args.tetta {
            config.sphere.tetta_steps = tetta_steps;
        }
        if let Some(phi_steps) = args.phi {
            config.sphere.phi_steps = phi_steps;
        }
        config
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use clap::{CommandFactory, Parser};

    fn config(args: &[&str]) -> Result<Config, clap::Error> {
        Args::try_parse_from(std::iter::once("sphere-video").chain(args.iter().copied()))
            .map(Config::from)
    }

    #[test]
    fn command_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn defaults_without_arguments() {
        let config = Config::default();
        assert_eq!(config.sphere, SphereParams::default());
        assert!(config.show_hud);
        assert_eq!(config.clear_color, wgpu::Color::GREEN);
        assert_eq!(config.image_path, None);
    }

    #[test]
    fn parses_path_and_flags() {
        let config = config(&["--tetta", "20", "pano.jpg", "--no-hud", "--phi", "36"]).unwrap();
        assert_eq!(config.image_path, Some(PathBuf::from("pano.jpg")));
        assert!(!config.show_hud);
        assert_eq!(config.sphere.tetta_steps, 20);
        assert_eq!(config.sphere.phi_steps, 36);
        assert_eq!(config.sphere.radius, 5.0);
    }

    #[test]
    fn omitted_steps_keep_the_default_mesh() {
        let config = config(&["--phi", "36"]).unwrap();
        assert_eq!(config.sphere.tetta_steps, SphereParams::default().tetta_steps);
        assert_eq!(config.sphere.phi_steps, 36);
    }

    #[test]
    fn image_path_falls_back_to_the_environment() {
        let command = Args::command();
        let path = command
            .get_arguments()
            .find(|arg| arg.get_id() == "image_path")
            .unwrap();
        assert_eq!(path.get_env(), Some(std::ffi::OsStr::new(IMAGE_PATH_ENV)));
    }

    #[test]
    fn rejects_bad_arguments() {
        use clap::error::ErrorKind;

        let kind = |args: &[&str]| config(args).unwrap_err().kind();
        assert_eq!(kind(&["--fullscreen"]), ErrorKind::UnknownArgument);
        assert_eq!(kind(&["--tetta", "0"]), ErrorKind::ValueValidation);
        assert_eq!(kind(&["--tetta", "many"]), ErrorKind::ValueValidation);
        assert_eq!(kind(&["a.png", "b.png"]), ErrorKind::UnknownArgument);
    }

    #[test]
    fn oversized_steps_parse_but_the_mesh_refuses_them() {
        let config = config(&["--tetta", "4294967295", "--phi", "4294967295"]).unwrap();
        assert!(matches!(
            crate::mesh::SphereMesh::generate(config.sphere),
            Err(crate::error::MeshError::TooManyVertices { .. })
        ));
    }
}

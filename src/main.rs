#[cfg(not(target_arch = "wasm32"))]
use clap::Parser;

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info,wgpu_core=warn,wgpu_hal=warn"),
    )
    .init();

    let config = sphere_video::Config::from(sphere_video::config::Args::parse());
    log::debug!("{config:?}");

    let event_loop = winit::event_loop::EventLoop::builder().build()?;
    let mut app = sphere_video::App::new(config);
    event_loop.run_app(&mut app)?;
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {}

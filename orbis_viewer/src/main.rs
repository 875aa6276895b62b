//! Interactive globe viewer: a textured sphere with clickable ripple markers,
//! an orbiting camera, and a popup label that tracks the picked marker on
//! screen. Scene constants come from a JSON preset; the event loop forwards
//! window and pointer events into `ViewerState`.

mod cli;
mod texture;
mod viewer;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use orbis_scene::{MarkerRegistry, ScenePreset, load_scene_preset};
use pollster::FutureExt;
use wgpu::SurfaceError;
use winit::{
    dpi::PhysicalSize,
    event::{ElementState, Event, KeyEvent, MouseButton, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    window::WindowBuilder,
};

use cli::Args;
use texture::{GlobeTexture, generate_placeholder_texture, load_globe_texture};
use viewer::ViewerState;

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let preset = match args.preset.as_deref() {
        Some(path) => load_scene_preset(path)?,
        None => ScenePreset::default(),
    };
    let registry = MarkerRegistry::from_seeds(preset.globe_radius, &preset.markers)
        .context("building marker registry from preset")?;

    if args.headless {
        print_scene_summary(&preset, &registry);
        return Ok(());
    }

    let texture_result = resolve_texture(&args, &preset);

    let event_loop = EventLoop::new().context("creating winit event loop")?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Orbis Viewer")
            .with_inner_size(PhysicalSize::new(1280, 720))
            .build(&event_loop)
            .context("creating viewer window")?,
    );

    let mut state = ViewerState::new(window.clone(), preset, registry, texture_result).block_on()?;

    event_loop
        .run(move |event, target| {
            target.set_control_flow(ControlFlow::Poll);

            match event {
                Event::WindowEvent { window_id, event } if window_id == state.window().id() => {
                    match event {
                        WindowEvent::CloseRequested => target.exit(),
                        WindowEvent::KeyboardInput {
                            event:
                                KeyEvent {
                                    logical_key: Key::Named(NamedKey::Escape),
                                    state: ElementState::Pressed,
                                    ..
                                },
                            ..
                        } => target.exit(),
                        WindowEvent::Resized(new_size) => state.resize(new_size),
                        WindowEvent::CursorMoved { position, .. } => {
                            state.handle_cursor_moved(position.x as f32, position.y as f32);
                        }
                        WindowEvent::MouseInput {
                            state: button_state,
                            button: MouseButton::Left,
                            ..
                        } => state.handle_mouse_button(button_state),
                        WindowEvent::MouseWheel { delta, .. } => state.handle_scroll(delta),
                        WindowEvent::RedrawRequested => match state.render() {
                            Ok(_) => {}
                            Err(SurfaceError::Lost) => state.resize(state.size()),
                            Err(SurfaceError::OutOfMemory) => target.exit(),
                            Err(err) => log::error!("render error: {err:?}"),
                        },
                        _ => {}
                    }
                }
                Event::AboutToWait => state.window().request_redraw(),
                _ => {}
            }
        })
        .context("running viewer application")?;
    Ok(())
}

/// CLI texture path wins over the preset's; no path at all means the
/// placeholder without a warning.
fn resolve_texture(args: &Args, preset: &ScenePreset) -> Result<GlobeTexture> {
    let path = args
        .texture
        .clone()
        .or_else(|| preset.texture.as_ref().map(PathBuf::from));
    match path {
        Some(path) => load_globe_texture(&path),
        None => Ok(generate_placeholder_texture()),
    }
}

fn print_scene_summary(preset: &ScenePreset, registry: &MarkerRegistry) {
    println!(
        "globe radius {} | camera distance {} ({}..{}) | auto-rotate {} rad/s",
        preset.globe_radius,
        preset.camera_distance,
        preset.min_distance,
        preset.max_distance,
        preset.auto_rotate_speed
    );
    println!(
        "zoom {} | country line {} | fly-to {}",
        if preset.enable_zoom { "on" } else { "off" },
        if preset.show_country { "on" } else { "off" },
        if preset.fly_to_enabled { "on" } else { "off" }
    );
    println!("{} markers:", registry.len());
    for marker in registry.markers() {
        let country = marker.country.as_deref().unwrap_or("-");
        println!(
            "  {:<20} {:<18} {:<12} ({:+.3}, {:+.3}, {:+.3})",
            marker.id,
            marker.magnitude,
            country,
            marker.position.x,
            marker.position.y,
            marker.position.z
        );
    }
}

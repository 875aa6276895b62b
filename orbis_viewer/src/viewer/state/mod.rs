//! Central runtime state for the globe viewer. Owns the wgpu device/surface,
//! the globe and marker GPU resources, the orbit camera, and the popup label,
//! and exposes small helpers that the event loop in `main.rs` drives.
//! Submodules cover lifecycle slices: `init` for setup, `render` for the
//! per-frame pass, and `input` for pointer routing.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use glam::Mat4;
use orbis_scene::{FlyTo, MarkerRegistry, OrbitControls, PopupState, ScenePreset};
use wgpu::SurfaceError;
use winit::{
    dpi::PhysicalSize,
    event::{ElementState, MouseScrollDelta},
    window::Window,
};

use super::overlays::LabelOverlay;
use crate::texture::GlobeTexture;

pub struct ViewerState {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    background: wgpu::Color,
    depth_view: wgpu::TextureView,

    globe_pipeline: wgpu::RenderPipeline,
    globe_vertex_buffer: wgpu::Buffer,
    globe_index_buffer: wgpu::Buffer,
    globe_index_count: u32,
    globe_uniform_buffer: wgpu::Buffer,
    globe_uniform_bind_group: wgpu::BindGroup,
    globe_texture_bind_group: wgpu::BindGroup,
    _globe_texture: wgpu::Texture,

    marker_pipeline: wgpu::RenderPipeline,
    marker_vertex_buffer: wgpu::Buffer,
    marker_instance_buffer: wgpu::Buffer,
    marker_instance_count: u32,
    marker_uniform_buffer: wgpu::Buffer,
    marker_uniform_bind_group: wgpu::BindGroup,

    overlay_pipeline: wgpu::RenderPipeline,
    label: LabelOverlay,

    preset: ScenePreset,
    registry: MarkerRegistry,
    orbit: OrbitControls,
    fly_to: Option<FlyTo>,
    popup: PopupState,

    started_at: Instant,
    last_frame: Instant,
    cursor: Option<(f32, f32)>,
    dragging: bool,
    view_proj: Mat4,
}

mod init;
mod input;
mod render;

impl ViewerState {
    pub async fn new(
        window: Arc<Window>,
        preset: ScenePreset,
        registry: MarkerRegistry,
        texture_result: Result<GlobeTexture>,
    ) -> Result<Self> {
        init::new(window, preset, registry, texture_result).await
    }

    pub fn window(&self) -> &Window {
        self.window.as_ref()
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        self.depth_view = init::create_depth_view(&self.device, new_size);
    }

    pub fn render(&mut self) -> Result<(), SurfaceError> {
        render::render(self)
    }

    pub fn handle_mouse_button(&mut self, button_state: ElementState) {
        match button_state {
            ElementState::Pressed => input::handle_pointer_pressed(self),
            ElementState::Released => input::handle_pointer_released(self),
        }
    }

    pub fn handle_cursor_moved(&mut self, x: f32, y: f32) {
        input::handle_pointer_moved(self, x, y);
    }

    pub fn handle_scroll(&mut self, delta: MouseScrollDelta) {
        input::handle_scroll(self, delta);
    }
}

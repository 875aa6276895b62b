//! The popup label: marker text rasterized into a small RGBA texture on the
//! CPU and drawn as a screen-space quad anchored at the marker's projected
//! position. The quad runs the 250 ms grow transition on reveal and takes
//! its alpha from the visibility tracker.

use anyhow::Result;
use bytemuck::{Pod, Zeroable, cast_slice};
use font8x8::legacy::BASIC_LEGACY;
use glam::Vec2;
use orbis_scene::Marker;
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;

use crate::texture::prepare_rgba_upload;

pub(super) const POPUP_TEXTURE_WIDTH: u32 = 256;
pub(super) const POPUP_TEXTURE_HEIGHT: u32 = 80;

/// On-screen quad size at full grow, in physical pixels.
const POPUP_DISPLAY_WIDTH: f32 = 230.0;
const POPUP_DISPLAY_HEIGHT: f32 = 72.0;
/// Horizontal gap between the marker's projected anchor and the popup.
const ANCHOR_OFFSET_X: f32 = 14.0;

const GLYPH_SCALE: u32 = 2;
const GLYPH_SIZE: u32 = 8 * GLYPH_SCALE;
const PADDING_X: u32 = 10;
const LINE_TOP: [u32; 3] = [8, 28, 48];

/// Close-control box in texture pixels.
const CLOSE_BOX: [u32; 4] = [POPUP_TEXTURE_WIDTH - 28, 6, 18, 18];

const FG_COLOR: [u8; 4] = [20, 20, 24, 255];
const BG_COLOR: [u8; 4] = [255, 255, 255, 225];

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub(super) struct OverlayVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
}

/// Screen-space rectangle in physical pixels.
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct RectPx {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl RectPx {
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }
}

pub(super) struct LabelOverlay {
    texture: wgpu::Texture,
    _view: wgpu::TextureView,
    _sampler: wgpu::Sampler,
    texture_bind_group: wgpu::BindGroup,
    params_buffer: wgpu::Buffer,
    params_bind_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    pixels: Vec<u8>,
    dirty: bool,
    rect: RectPx,
}

impl LabelOverlay {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        texture_layout: &wgpu::BindGroupLayout,
        params_layout: &wgpu::BindGroupLayout,
    ) -> Result<Self> {
        let extent = wgpu::Extent3d {
            width: POPUP_TEXTURE_WIDTH,
            height: POPUP_TEXTURE_HEIGHT,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("popup-label-texture"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("popup-label-sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let texture_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("popup-label-bind-group"),
            layout: texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("popup-params"),
            contents: cast_slice(&[0.0f32; 4]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let params_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("popup-params-bind-group"),
            layout: params_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: params_buffer.as_entire_binding(),
            }],
        });

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("popup-vertices"),
            contents: cast_slice(&[OverlayVertex::zeroed(); 6]),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        let mut pixels = vec![0u8; (POPUP_TEXTURE_WIDTH * POPUP_TEXTURE_HEIGHT * 4) as usize];
        fill_background(&mut pixels);
        let upload = prepare_rgba_upload(POPUP_TEXTURE_WIDTH, POPUP_TEXTURE_HEIGHT, &pixels)?;
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            upload.pixels(),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(upload.bytes_per_row()),
                rows_per_image: Some(POPUP_TEXTURE_HEIGHT),
            },
            extent,
        );

        Ok(Self {
            texture,
            _view: view,
            _sampler: sampler,
            texture_bind_group,
            params_buffer,
            params_bind_group,
            vertex_buffer,
            pixels,
            dirty: false,
            rect: RectPx::default(),
        })
    }

    /// Redraw the popup content for a marker: id line, magnitude line, and
    /// the country line when the preset asks for it, plus the close glyph.
    pub fn set_marker(&mut self, marker: &Marker, show_country: bool) {
        fill_background(&mut self.pixels);

        let mut lines = vec![marker.id.clone(), marker.magnitude.clone()];
        if show_country {
            if let Some(country) = marker.country.as_deref() {
                lines.push(country.to_string());
            }
        }

        for (row, line) in lines.iter().take(LINE_TOP.len()).enumerate() {
            draw_line(&mut self.pixels, line, PADDING_X, LINE_TOP[row]);
        }
        draw_close_glyph(&mut self.pixels);

        self.dirty = true;
    }

    /// Place the quad for this frame: anchored right of the marker's
    /// projected position, scaled by the grow transition, alpha from the
    /// visibility tracker.
    pub fn update_geometry(
        &mut self,
        queue: &wgpu::Queue,
        anchor: Vec2,
        grow: f32,
        opacity: f32,
        window: PhysicalSize<u32>,
    ) {
        let width = POPUP_DISPLAY_WIDTH * grow;
        let height = POPUP_DISPLAY_HEIGHT * grow;
        self.rect = RectPx {
            x: anchor.x + ANCHOR_OFFSET_X,
            y: anchor.y - height * 0.5,
            width,
            height,
        };

        let vertices = vertex_positions(self.rect, window);
        queue.write_buffer(&self.vertex_buffer, 0, cast_slice(&vertices));
        queue.write_buffer(
            &self.params_buffer,
            0,
            cast_slice(&[opacity, 0.0, 0.0, 0.0]),
        );
    }

    pub fn upload(&mut self, queue: &wgpu::Queue) {
        if !self.dirty {
            return;
        }
        let upload =
            match prepare_rgba_upload(POPUP_TEXTURE_WIDTH, POPUP_TEXTURE_HEIGHT, &self.pixels) {
                Ok(upload) => upload,
                Err(err) => {
                    log::warn!("popup overlay upload failed: {err}");
                    return;
                }
            };
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            upload.pixels(),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(upload.bytes_per_row()),
                rows_per_image: Some(POPUP_TEXTURE_HEIGHT),
            },
            wgpu::Extent3d {
                width: POPUP_TEXTURE_WIDTH,
                height: POPUP_TEXTURE_HEIGHT,
                depth_or_array_layers: 1,
            },
        );
        self.dirty = false;
    }

    /// Current popup rectangle in screen pixels.
    pub fn rect(&self) -> RectPx {
        self.rect
    }

    /// Close-control rectangle, scaled with the quad.
    pub fn close_rect(&self) -> RectPx {
        let scale_x = self.rect.width / POPUP_TEXTURE_WIDTH as f32;
        let scale_y = self.rect.height / POPUP_TEXTURE_HEIGHT as f32;
        RectPx {
            x: self.rect.x + CLOSE_BOX[0] as f32 * scale_x,
            y: self.rect.y + CLOSE_BOX[1] as f32 * scale_y,
            width: CLOSE_BOX[2] as f32 * scale_x,
            height: CLOSE_BOX[3] as f32 * scale_y,
        }
    }

    pub fn texture_bind_group(&self) -> &wgpu::BindGroup {
        &self.texture_bind_group
    }

    pub fn params_bind_group(&self) -> &wgpu::BindGroup {
        &self.params_bind_group
    }

    pub fn vertex_buffer(&self) -> &wgpu::Buffer {
        &self.vertex_buffer
    }
}

fn fill_background(pixels: &mut [u8]) {
    for pixel in pixels.chunks_exact_mut(4) {
        pixel.copy_from_slice(&BG_COLOR);
    }
}

fn glyph_for_char(ch: char) -> [u8; 8] {
    let index = ch as usize;
    if index < BASIC_LEGACY.len() {
        BASIC_LEGACY[index]
    } else {
        BASIC_LEGACY[b'?' as usize]
    }
}

/// Blit one text line at the given texture offset, `GLYPH_SCALE`x scaled.
fn draw_line(pixels: &mut [u8], line: &str, start_x: u32, start_y: u32) {
    let max_cols = (POPUP_TEXTURE_WIDTH.saturating_sub(start_x + CLOSE_BOX[2]) / GLYPH_SIZE) as usize;
    for (col, ch) in line.chars().take(max_cols).enumerate() {
        let glyph = glyph_for_char(ch);
        let glyph_x = start_x + col as u32 * GLYPH_SIZE;
        for (row, bits) in glyph.iter().enumerate() {
            for bit in 0..8u32 {
                if (bits >> bit) & 0x01 == 0 {
                    continue;
                }
                blit_scaled_dot(
                    pixels,
                    glyph_x + bit * GLYPH_SCALE,
                    start_y + row as u32 * GLYPH_SCALE,
                );
            }
        }
    }
}

fn blit_scaled_dot(pixels: &mut [u8], x: u32, y: u32) {
    for dy in 0..GLYPH_SCALE {
        for dx in 0..GLYPH_SCALE {
            let px = x + dx;
            let py = y + dy;
            if px >= POPUP_TEXTURE_WIDTH || py >= POPUP_TEXTURE_HEIGHT {
                continue;
            }
            let idx = ((py * POPUP_TEXTURE_WIDTH + px) * 4) as usize;
            pixels[idx..idx + 4].copy_from_slice(&FG_COLOR);
        }
    }
}

fn draw_close_glyph(pixels: &mut [u8]) {
    let glyph = glyph_for_char('x');
    let base_x = CLOSE_BOX[0] + 1;
    let base_y = CLOSE_BOX[1] + 1;
    for (row, bits) in glyph.iter().enumerate() {
        for bit in 0..8u32 {
            if (bits >> bit) & 0x01 == 0 {
                continue;
            }
            blit_scaled_dot(
                pixels,
                base_x + bit * GLYPH_SCALE,
                base_y + row as u32 * GLYPH_SCALE,
            );
        }
    }
}

/// Screen rect to clip-space quad, two triangles, full-texture UVs.
fn vertex_positions(rect: RectPx, window: PhysicalSize<u32>) -> [OverlayVertex; 6] {
    let win_width = window.width.max(1) as f32;
    let win_height = window.height.max(1) as f32;

    let left = (rect.x / win_width) * 2.0 - 1.0;
    let right = ((rect.x + rect.width) / win_width) * 2.0 - 1.0;
    let top = 1.0 - (rect.y / win_height) * 2.0;
    let bottom = 1.0 - ((rect.y + rect.height) / win_height) * 2.0;

    [
        OverlayVertex {
            position: [left, top],
            uv: [0.0, 0.0],
        },
        OverlayVertex {
            position: [right, top],
            uv: [1.0, 0.0],
        },
        OverlayVertex {
            position: [left, bottom],
            uv: [0.0, 1.0],
        },
        OverlayVertex {
            position: [left, bottom],
            uv: [0.0, 1.0],
        },
        OverlayVertex {
            position: [right, top],
            uv: [1.0, 0.0],
        },
        OverlayVertex {
            position: [right, bottom],
            uv: [1.0, 1.0],
        },
    ]
}

#[cfg(test)]
mod popup_raster_tests {
    use super::*;

    fn marker() -> Marker {
        Marker {
            id: String::from("Venezuela"),
            magnitude: String::from("+00 123 4567 891"),
            country: Some(String::from("Venezuela")),
            position: glam::Vec3::new(0.0, 0.0, 5.0),
        }
    }

    fn fg_pixel_count(pixels: &[u8]) -> usize {
        pixels
            .chunks_exact(4)
            .filter(|px| px == &FG_COLOR.as_slice())
            .count()
    }

    #[test]
    fn text_raster_touches_the_buffer_and_stays_in_bounds() {
        let mut pixels = vec![0u8; (POPUP_TEXTURE_WIDTH * POPUP_TEXTURE_HEIGHT * 4) as usize];
        fill_background(&mut pixels);
        assert_eq!(fg_pixel_count(&pixels), 0);

        draw_line(&mut pixels, "Venezuela", PADDING_X, LINE_TOP[0]);
        assert!(fg_pixel_count(&pixels) > 0, "glyphs should write pixels");
        assert_eq!(
            pixels.len(),
            (POPUP_TEXTURE_WIDTH * POPUP_TEXTURE_HEIGHT * 4) as usize
        );
    }

    #[test]
    fn country_line_renders_only_when_requested() {
        let mut with_country = vec![0u8; (POPUP_TEXTURE_WIDTH * POPUP_TEXTURE_HEIGHT * 4) as usize];
        let mut without = with_country.clone();

        fill_background(&mut with_country);
        fill_background(&mut without);
        draw_line(&mut with_country, "Venezuela", PADDING_X, LINE_TOP[2]);

        let third_line_range = |pixels: &[u8]| {
            let start = (LINE_TOP[2] * POPUP_TEXTURE_WIDTH * 4) as usize;
            let end = ((LINE_TOP[2] + GLYPH_SIZE) * POPUP_TEXTURE_WIDTH * 4) as usize;
            fg_pixel_count(&pixels[start..end])
        };
        assert!(third_line_range(&with_country) > 0);
        assert_eq!(third_line_range(&without), 0);
    }

    #[test]
    fn close_box_sits_inside_the_texture() {
        assert!(CLOSE_BOX[0] + CLOSE_BOX[2] <= POPUP_TEXTURE_WIDTH);
        assert!(CLOSE_BOX[1] + CLOSE_BOX[3] <= POPUP_TEXTURE_HEIGHT);
    }

    #[test]
    fn quad_vertices_map_the_rect_into_clip_space() {
        let rect = RectPx {
            x: 0.0,
            y: 0.0,
            width: 400.0,
            height: 300.0,
        };
        let vertices = vertex_positions(rect, PhysicalSize::new(800, 600));

        // Top-left of the rect is clip (-1, 1); rect spans half the window.
        assert_eq!(vertices[0].position, [-1.0, 1.0]);
        assert_eq!(vertices[1].position, [0.0, 1.0]);
        assert_eq!(vertices[5].position, [0.0, 0.0]);
    }

    #[test]
    fn rect_contains_matches_extents() {
        let rect = RectPx {
            x: 10.0,
            y: 20.0,
            width: 100.0,
            height: 50.0,
        };
        assert!(rect.contains(10.0, 20.0));
        assert!(rect.contains(110.0, 70.0));
        assert!(!rect.contains(9.0, 30.0));
        assert!(!rect.contains(50.0, 71.0));
    }

    #[test]
    fn marker_lines_respect_the_country_toggle() {
        let marker = marker();
        let mut lines = vec![marker.id.clone(), marker.magnitude.clone()];
        if let Some(country) = marker.country.as_deref() {
            lines.push(country.to_string());
        }
        assert_eq!(lines.len(), 3);
        assert!(lines.len() <= LINE_TOP.len(), "popup fits all lines");
    }
}

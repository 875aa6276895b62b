//! Globe texture loading and RGBA upload helpers. A missing or undecodable
//! texture file degrades to a procedural placeholder so the viewer always has
//! something to wrap around the sphere.

use std::{borrow::Cow, path::Path};

use anyhow::{Context, Result, ensure};
use image::ImageFormat;

#[derive(Debug)]
pub struct GlobeTexture {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Decode an equirectangular globe texture (PNG or JPEG) into RGBA8.
pub fn load_globe_texture(path: &Path) -> Result<GlobeTexture> {
    let bytes =
        std::fs::read(path).with_context(|| format!("reading globe texture {}", path.display()))?;
    let format = ImageFormat::from_path(path)
        .with_context(|| format!("unrecognized texture extension {}", path.display()))?;
    let decoded = image::load_from_memory_with_format(&bytes, format)
        .with_context(|| format!("decoding globe texture {}", path.display()))?;

    let rgba = decoded.to_rgba8();
    Ok(GlobeTexture {
        width: rgba.width(),
        height: rgba.height(),
        data: rgba.into_raw(),
    })
}

/// Fallback texture when no file is available: a banded blue/green gradient
/// with a faint meridian grid, enough to read the sphere's rotation.
pub fn generate_placeholder_texture() -> GlobeTexture {
    const WIDTH: u32 = 512;
    const HEIGHT: u32 = 256;
    let mut data = vec![0u8; (WIDTH * HEIGHT * 4) as usize];

    for y in 0..HEIGHT {
        let latitude = y as f32 / HEIGHT as f32;
        for x in 0..WIDTH {
            let longitude = x as f32 / WIDTH as f32;
            let idx = ((y * WIDTH + x) * 4) as usize;

            let band = ((latitude * 6.0).sin() * 0.5 + 0.5) * 0.35;
            let mut r = 40.0 + band * 60.0;
            let mut g = 90.0 + band * 110.0;
            let mut b = 140.0 + (1.0 - band) * 80.0;

            let on_meridian = (longitude * 24.0).fract() < 0.02;
            let on_parallel = (latitude * 12.0).fract() < 0.04;
            if on_meridian || on_parallel {
                r += 50.0;
                g += 50.0;
                b += 50.0;
            }

            data[idx] = r.min(255.0) as u8;
            data[idx + 1] = g.min(255.0) as u8;
            data[idx + 2] = b.min(255.0) as u8;
            data[idx + 3] = 0xFF;
        }
    }

    GlobeTexture {
        data,
        width: WIDTH,
        height: HEIGHT,
    }
}

pub struct TextureUpload<'a> {
    data: Cow<'a, [u8]>,
    bytes_per_row: u32,
}

impl<'a> TextureUpload<'a> {
    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    pub fn bytes_per_row(&self) -> u32 {
        self.bytes_per_row
    }
}

/// Pad RGBA rows out to wgpu's 256-byte copy alignment when needed.
pub fn prepare_rgba_upload<'a>(
    width: u32,
    height: u32,
    data: &'a [u8],
) -> Result<TextureUpload<'a>> {
    ensure!(width > 0 && height > 0, "texture has no dimensions");
    let row_bytes = 4usize * width as usize;
    let alignment = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as usize;
    ensure!(
        data.len() >= row_bytes * height as usize,
        "texture buffer ({}) smaller than {}x{} RGBA ({})",
        data.len(),
        width,
        height,
        row_bytes * height as usize
    );

    if row_bytes % alignment == 0 && data.len() == row_bytes * height as usize {
        return Ok(TextureUpload {
            data: Cow::Borrowed(data),
            bytes_per_row: row_bytes as u32,
        });
    }

    let padded_row_bytes = row_bytes.div_ceil(alignment) * alignment;
    let mut buffer = vec![0u8; padded_row_bytes * height as usize];
    for row in 0..height as usize {
        let src_offset = row * row_bytes;
        let dst_offset = row * padded_row_bytes;
        buffer[dst_offset..dst_offset + row_bytes]
            .copy_from_slice(&data[src_offset..src_offset + row_bytes]);
    }

    Ok(TextureUpload {
        data: Cow::Owned(buffer),
        bytes_per_row: padded_row_bytes as u32,
    })
}

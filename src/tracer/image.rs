use std::path::Path;

use bytemuck::cast_slice;
use image::{ColorType, ImageResult};

use crate::rgba_to_bytes;

/// Packed RGBA output of the renderer, row-major, stride = width.
///
/// Row 0 is the top of the picture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    data: Vec<u32>,
}

impl Image {
    pub fn new(width: u32, height: u32) -> Image {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize],
        }
    }

    /// 크기가 같으면 아무것도 안 함. 다르면 예전 픽셀은 버리고 새로 할당.
    ///
    /// Returns whether the buffer was reallocated.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if self.width == width && self.height == height {
            return false;
        }

        self.width = width;
        self.height = height;
        self.data = vec![0; width as usize * height as usize];
        true
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixels(&self) -> &[u32] {
        &self.data
    }

    pub(crate) fn pixels_mut(&mut self) -> &mut [u32] {
        &mut self.data
    }

    pub fn pixel(&self, x: u32, y: u32) -> u32 {
        self.data[(x + y * self.width) as usize]
    }

    /// `[R, G, B, A]` of the pixel at `(x, y)`.
    pub fn pixel_rgba(&self, x: u32, y: u32) -> [u8; 4] {
        rgba_to_bytes(self.pixel(x, y))
    }

    /// Zero-copy byte view of the packed buffer, for uploading to a display
    /// texture. On little-endian hosts the bytes come out as R, G, B, A.
    pub fn as_bytes(&self) -> &[u8] {
        cast_slice(&self.data)
    }

    /// 호스트 엔디언과 상관없이 항상 R, G, B, A 순서
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.data.iter().copied().flat_map(rgba_to_bytes).collect()
    }

    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        image::save_buffer_with_format(
            path,
            &self.to_rgba8(),
            self.width,
            self.height,
            ColorType::Rgba8,
            image::ImageFormat::Png,
        )
    }
}

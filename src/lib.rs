//! Glimmer: a progressive CPU ray tracer for small sphere scenes.
//!
//! The [`Renderer`] owns the final image and an accumulation buffer. Every
//! call to [`Renderer::render`] traces one sample per pixel and displays the
//! running average, so a static scene gets less noisy frame by frame.
//! [`Renderer::render_ssaa`] is the fixed 2x2 supersampling alternative.

use nalgebra::Vector4;

pub mod camera;
pub mod tracer;
pub mod util;

pub use camera::Camera;
pub use tracer::scene::{Material, Scene, Sphere};
pub use tracer::{HitPayload, RenderError, Renderer, Settings};

/// Packs a linear color into `(A << 24) | (B << 16) | (G << 8) | R`.
///
/// Every channel is clamped to `[0, 1]` and then truncated:
/// `floor(channel * 255)`. NaN channels encode as 0.
pub fn vec4_to_rgba(color: &Vector4<f32>) -> u32 {
    let channel = |value: f32| (value.clamp(0.0, 1.0) * 255.0) as u32;

    let r = channel(color.x);
    let g = channel(color.y);
    let b = channel(color.z);
    let a = channel(color.w);

    (a << 24) | (b << 16) | (g << 8) | r
}

/// 패킹된 픽셀을 R, G, B, A 바이트 순서로 풀어냄
pub fn rgba_to_bytes(packed: u32) -> [u8; 4] {
    packed.to_le_bytes()
}

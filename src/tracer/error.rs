use thiserror::Error;

/// Caller contract violations, reported before any pixel is traced.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("cannot size the image to {width}x{height}: both dimensions must be non-zero")]
    ZeroSize { width: u32, height: u32 },

    #[error("camera provides {actual} ray directions but the image has {expected} pixels")]
    RayTableMismatch { expected: usize, actual: usize },

    #[error("sphere {sphere} uses material {material}, but the scene only has {available} materials")]
    InvalidMaterial {
        sphere: usize,
        material: usize,
        available: usize,
    },
}

use std::path::Path;

use anyhow::Context;

use crate::foundation::error::{MontageError, MontageResult};
use crate::foundation::math::unit_alpha;

/// Decoded foreground still with straight (non-premultiplied) RGB and a normalized alpha mask.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageAsset {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Packed RGB8, `width * height * 3` bytes.
    pub rgb: Vec<u8>,
    /// Per-pixel alpha in `[0, 1]`, `width * height` entries.
    pub alpha: Vec<f32>,
}

impl ImageAsset {
    /// Build an asset from straight-alpha RGBA8 pixels.
    pub fn from_rgba8(width: u32, height: u32, rgba: &[u8]) -> MontageResult<Self> {
        let px = width as usize * height as usize;
        if rgba.len() != px * 4 {
            return Err(MontageError::decode(format!(
                "rgba8 buffer for {width}x{height} must be {} bytes, got {}",
                px * 4,
                rgba.len()
            )));
        }
        let mut rgb = Vec::with_capacity(px * 3);
        let mut alpha = Vec::with_capacity(px);
        for p in rgba.chunks_exact(4) {
            rgb.extend_from_slice(&p[..3]);
            alpha.push(unit_alpha(p[3]));
        }
        Ok(Self {
            width,
            height,
            rgb,
            alpha,
        })
    }

    /// A single-color asset with uniform alpha, mostly useful for tests and placeholders.
    pub fn solid(width: u32, height: u32, rgb: [u8; 3], alpha: f32) -> Self {
        let px = width as usize * height as usize;
        let mut data = Vec::with_capacity(px * 3);
        for _ in 0..px {
            data.extend_from_slice(&rgb);
        }
        Self {
            width,
            height,
            rgb: data,
            alpha: vec![alpha.clamp(0.0, 1.0); px],
        }
    }
}

/// Decode an encoded still (PNG, WebP, ...) from memory.
///
/// Images without an alpha channel decode as fully opaque.
pub fn decode_image(bytes: &[u8]) -> MontageResult<ImageAsset> {
    let dyn_img =
        image::load_from_memory(bytes).map_err(|e| MontageError::decode(format!("{e}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    ImageAsset::from_rgba8(width, height, rgba.as_raw())
}

/// Read and decode a still from disk.
pub fn load_image(path: &Path) -> MontageResult<ImageAsset> {
    if !path.exists() {
        return Err(MontageError::not_found(path));
    }
    let bytes = std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
    decode_image(&bytes).map_err(|e| match e {
        MontageError::Decode(msg) => {
            MontageError::decode(format!("image '{}': {msg}", path.display()))
        }
        other => other,
    })
}

/// Read a still's pixel size from its header without decoding the pixels.
pub fn image_dimensions(path: &Path) -> MontageResult<(u32, u32)> {
    if !path.exists() {
        return Err(MontageError::not_found(path));
    }
    image::image_dimensions(path)
        .map_err(|e| MontageError::decode(format!("image '{}': {e}", path.display())))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;

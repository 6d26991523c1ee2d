use crate::foundation::error::{MontageError, MontageResult};

/// Absolute 0-based frame index in output timeline space.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32, // must be > 0
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> MontageResult<Self> {
        if den == 0 {
            return Err(MontageError::invalid_argument("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(MontageError::invalid_argument("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Parse an ffmpeg-style rational such as `30000/1001` or a bare integer such as `25`.
    pub fn parse_ratio(s: &str) -> MontageResult<Self> {
        let mut parts = s.trim().split('/');
        let num = parts.next().and_then(|p| p.parse::<u32>().ok());
        let den = match parts.next() {
            Some(p) => p.parse::<u32>().ok(),
            None => Some(1),
        };
        match (num, den, parts.next()) {
            (Some(num), Some(den), None) => Self::new(num, den),
            _ => Err(MontageError::decode(format!("invalid frame rate '{s}'"))),
        }
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    /// Convert frame count to seconds.
    pub fn frames_to_secs(self, frames: u64) -> f64 {
        (frames as f64) * self.frame_duration_secs()
    }

    /// Convert seconds to frame count using floor semantics.
    pub fn secs_to_frames_floor(self, secs: f64) -> u64 {
        (secs * self.as_f64()).floor().max(0.0) as u64
    }
}

/// One opaque video frame as packed RGB8 (`width * height * 3` bytes, row-major).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Packed `rgb24` pixel data.
    pub data: Vec<u8>,
}

impl FrameBuffer {
    /// Bytes per pixel of the packed layout.
    pub const CHANNELS: usize = 3;

    /// Wrap an existing packed RGB8 buffer, checking its length.
    pub fn from_rgb8(width: u32, height: u32, data: Vec<u8>) -> MontageResult<Self> {
        let expected = Self::byte_len(width, height);
        if data.len() != expected {
            return Err(MontageError::invalid_argument(format!(
                "rgb8 buffer for {width}x{height} must be {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// A frame filled with a single color.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let mut data = Vec::with_capacity(Self::byte_len(width, height));
        for _ in 0..(width as usize * height as usize) {
            data.extend_from_slice(&rgb);
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Number of bytes a packed RGB8 frame of this size occupies.
    pub fn byte_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * Self::CHANNELS
    }

    /// Bytes in one row.
    pub fn stride(&self) -> usize {
        self.width as usize * Self::CHANNELS
    }

    /// RGB triple at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let off = y as usize * self.stride() + x as usize * Self::CHANNELS;
        [self.data[off], self.data[off + 1], self.data[off + 2]]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;

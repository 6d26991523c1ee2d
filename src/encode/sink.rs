use std::path::PathBuf;

use crate::foundation::core::{FrameBuffer, FrameIndex, Fps};
use crate::foundation::error::{MontageError, MontageResult};

/// Output stream parameters, fixed for the whole assembly.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    /// Background width; every pushed frame must match it.
    pub width: u32,
    /// Background height; every pushed frame must match it.
    pub height: u32,
    /// Background frame rate, used unchanged for the output.
    pub fps: Fps,
    /// Concatenated narration to mux alongside the frames, if any.
    pub audio: Option<AudioInputConfig>,
}

impl SinkConfig {
    /// Byte length of one packed RGB24 frame at this geometry.
    pub fn frame_len(&self) -> usize {
        FrameBuffer::byte_len(self.width, self.height)
    }
}

/// Narration track already written to disk as raw interleaved little-endian `f32`.
#[derive(Debug, Clone)]
pub struct AudioInputConfig {
    /// Location of the `.f32le` file.
    pub path: PathBuf,
    /// Samples per second per channel.
    pub sample_rate: u32,
    /// Interleaved channel count.
    pub channels: u16,
}

/// Consumer of composited frames.
///
/// `begin` precedes every frame and `end` follows the last one. Frame indices count up from the
/// first frame of the first segment and never repeat.
pub trait FrameSink: Send {
    /// Prepare for frames of `cfg`'s geometry.
    fn begin(&mut self, cfg: SinkConfig) -> MontageResult<()>;
    /// Accept the frame at output position `idx`.
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameBuffer) -> MontageResult<()>;
    /// Flush everything; no frames follow.
    fn end(&mut self) -> MontageResult<()>;
}

/// Keeps every frame it receives, checked against the same rules as the encoder.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(FrameIndex, FrameBuffer)>,
    ended: bool,
}

impl InMemorySink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parameters passed to the last `begin`.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg.clone()
    }

    /// Frames received since the last `begin`, in arrival order.
    pub fn frames(&self) -> &[(FrameIndex, FrameBuffer)] {
        &self.frames
    }

    /// Take ownership of the received frames.
    pub fn into_frames(self) -> Vec<(FrameIndex, FrameBuffer)> {
        self.frames
    }

    /// Whether `end` was reached.
    pub fn is_ended(&self) -> bool {
        self.ended
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> MontageResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.ended = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameBuffer) -> MontageResult<()> {
        let Some(cfg) = self.cfg.as_ref() else {
            return Err(MontageError::encode("in-memory sink not started"));
        };
        if self.ended {
            return Err(MontageError::encode("in-memory sink already ended"));
        }
        if let Some((last, _)) = self.frames.last()
            && idx.0 <= last.0
        {
            return Err(MontageError::encode(format!(
                "frame {} pushed after frame {}",
                idx.0, last.0
            )));
        }
        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(MontageError::invalid_argument(format!(
                "frame is {}x{}, sink expects {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> MontageResult<()> {
        if self.cfg.is_none() {
            return Err(MontageError::encode("in-memory sink not started"));
        }
        self.ended = true;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;

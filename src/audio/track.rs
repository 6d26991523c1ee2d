use std::path::{Path, PathBuf};

use crate::foundation::core::Fps;
use crate::foundation::error::{MontageError, MontageResult};

/// Decoded narration clip attached to one segment.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioAsset {
    /// Path the clip was loaded from.
    pub source_path: PathBuf,
    /// Clip duration in seconds. Drives the segment's frame count.
    pub duration_sec: f64,
    /// Sample rate of `interleaved_f32`.
    pub sample_rate: u32,
    /// Channel count of `interleaved_f32`.
    pub channels: u16,
    /// Interleaved samples.
    pub interleaved_f32: Vec<f32>,
}

impl AudioAsset {
    /// Build a validated asset.
    pub fn new(
        source_path: impl AsRef<Path>,
        duration_sec: f64,
        sample_rate: u32,
        channels: u16,
        interleaved_f32: Vec<f32>,
    ) -> MontageResult<Self> {
        if !duration_sec.is_finite() || duration_sec < 0.0 {
            return Err(MontageError::decode(format!(
                "audio '{}' has invalid duration {duration_sec}",
                source_path.as_ref().display()
            )));
        }
        if sample_rate == 0 || channels == 0 {
            return Err(MontageError::decode(format!(
                "audio '{}' has zero sample rate or channel count",
                source_path.as_ref().display()
            )));
        }
        if !interleaved_f32.len().is_multiple_of(usize::from(channels)) {
            return Err(MontageError::decode(format!(
                "audio '{}' sample count is not a multiple of its channel count",
                source_path.as_ref().display()
            )));
        }
        Ok(Self {
            source_path: source_path.as_ref().to_path_buf(),
            duration_sec,
            sample_rate,
            channels,
            interleaved_f32,
        })
    }

    /// Silent clip of `duration_sec`, mostly for tests.
    pub fn silence(duration_sec: f64, sample_rate: u32, channels: u16) -> MontageResult<Self> {
        let frames = (duration_sec.max(0.0) * f64::from(sample_rate)).round() as usize;
        Self::new(
            "<silence>",
            duration_sec,
            sample_rate,
            channels,
            vec![0.0; frames * usize::from(channels)],
        )
    }

    /// Number of sample frames (one sample per channel).
    pub fn sample_frames(&self) -> usize {
        self.interleaved_f32.len() / usize::from(self.channels)
    }
}

/// Convert a frame delta to the nearest sample index at `sample_rate`.
pub fn frame_to_sample(frame_delta: u64, fps: Fps, sample_rate: u32) -> u64 {
    let num = u128::from(frame_delta) * u128::from(sample_rate) * u128::from(fps.den);
    let den = u128::from(fps.num);
    ((num + (den / 2)) / den) as u64
}

/// Concatenate each segment's audio over its visual span.
///
/// `spans` holds `(frames, audio)` per segment, in output order. Segment `i`'s audio starts at
/// the sample matching the first frame of segment `i`; the rest of its span is silence, and
/// audio longer than the span is cut at the segment boundary.
pub fn concat_segment_audio(
    spans: &[(u64, &AudioAsset)],
    fps: Fps,
) -> MontageResult<(u32, u16, Vec<f32>)> {
    let Some((_, first)) = spans.first() else {
        return Err(MontageError::invalid_argument(
            "cannot build an audio track from zero segments",
        ));
    };
    let (sample_rate, channels) = (first.sample_rate, first.channels);
    if let Some((_, odd)) = spans
        .iter()
        .find(|(_, a)| a.sample_rate != sample_rate || a.channels != channels)
    {
        return Err(MontageError::invalid_argument(format!(
            "segment audio '{}' is {} Hz/{} ch, expected {sample_rate} Hz/{channels} ch",
            odd.source_path.display(),
            odd.sample_rate,
            odd.channels
        )));
    }

    let total_frames: u64 = spans.iter().map(|(f, _)| *f).sum();
    let ch = usize::from(channels);
    let total_samples = frame_to_sample(total_frames, fps, sample_rate) as usize;
    let mut out = vec![0.0f32; total_samples * ch];

    let mut frames_before = 0u64;
    for (frames, audio) in spans {
        let start = frame_to_sample(frames_before, fps, sample_rate) as usize;
        frames_before += frames;
        let end = frame_to_sample(frames_before, fps, sample_rate) as usize;

        let take = audio.sample_frames().min(end - start);
        out[start * ch..(start + take) * ch].copy_from_slice(&audio.interleaved_f32[..take * ch]);
    }
    Ok((sample_rate, channels, out))
}

/// Write interleaved `f32` PCM samples to a raw little-endian `.f32le` file.
pub(crate) fn write_f32le_file(samples_interleaved: &[f32], out_path: &Path) -> MontageResult<()> {
    let mut bytes = Vec::<u8>::with_capacity(samples_interleaved.len() * 4);
    for &sample in samples_interleaved {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    std::fs::write(out_path, bytes).map_err(|e| {
        MontageError::encode(format!(
            "failed to write audio track '{}': {e}",
            out_path.display()
        ))
    })
}

#[cfg(test)]
#[path = "../../tests/unit/audio/track.rs"]
mod tests;

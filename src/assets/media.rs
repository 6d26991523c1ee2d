use std::path::{Path, PathBuf};

use crate::audio::track::AudioAsset;
use crate::foundation::core::Fps;
use crate::foundation::error::{MontageError, MontageResult};

/// Sample rate all segment audio is decoded to, so segments concatenate without resampling.
pub const MIX_SAMPLE_RATE: u32 = 48_000;
/// Channel count all segment audio is decoded to.
pub const MIX_CHANNELS: u16 = 2;

/// Probed properties of a video source.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoInfo {
    /// Path the info was probed from.
    pub source_path: PathBuf,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Native frame rate.
    pub fps: Fps,
    /// Number of decodable frames.
    pub total_frames: u64,
    /// Container duration in seconds (informational).
    pub duration_sec: f64,
}

impl VideoInfo {
    /// Duration implied by the frame count: `total_frames / fps`.
    pub fn total_duration_secs(&self) -> f64 {
        self.fps.frames_to_secs(self.total_frames)
    }
}

/// Probed properties of an audio source.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioInfo {
    /// Path the info was probed from.
    pub source_path: PathBuf,
    /// Duration in seconds.
    pub duration_sec: f64,
    /// Native sample rate in Hz (0 when unknown).
    pub sample_rate: u32,
    /// Native channel count (0 when unknown).
    pub channels: u16,
}

/// Result of [`probe`]: either a video or an audio-only source.
#[derive(Clone, Debug, PartialEq)]
pub enum MediaInfo {
    /// The file carries a (non cover-art) video stream.
    Video(VideoInfo),
    /// The file carries only audio.
    Audio(AudioInfo),
}

impl MediaInfo {
    /// Duration in seconds regardless of kind.
    pub fn duration_sec(&self) -> f64 {
        match self {
            Self::Video(v) => v.total_duration_secs(),
            Self::Audio(a) => a.duration_sec,
        }
    }
}

/// Interleaved PCM as produced by the audio decoder.
#[derive(Clone, Debug)]
pub struct AudioPcm {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Interleaved samples.
    pub interleaved_f32: Vec<f32>,
}

#[derive(serde::Deserialize, Default)]
struct ProbeDisposition {
    #[serde(default)]
    attached_pic: u8,
}

#[derive(serde::Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    nb_frames: Option<String>,
    duration: Option<String>,
    sample_rate: Option<String>,
    channels: Option<u16>,
    #[serde(default)]
    disposition: ProbeDisposition,
}

#[derive(serde::Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProbeOut {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

/// Interpret `ffprobe -print_format json -show_streams -show_format` output.
pub(crate) fn parse_probe_json(source_path: &Path, json: &[u8]) -> MontageResult<MediaInfo> {
    let parsed: ProbeOut = serde_json::from_slice(json).map_err(|e| {
        MontageError::decode(format!(
            "ffprobe json parse failed for '{}': {e}",
            source_path.display()
        ))
    })?;
    let format_duration = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .and_then(parse_secs);

    let video = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video") && s.disposition.attached_pic == 0);
    if let Some(v) = video {
        let width = v.width.ok_or_else(|| {
            MontageError::decode(format!("missing video width for '{}'", source_path.display()))
        })?;
        let height = v.height.ok_or_else(|| {
            MontageError::decode(format!(
                "missing video height for '{}'",
                source_path.display()
            ))
        })?;
        let fps = v
            .r_frame_rate
            .as_deref()
            .and_then(|r| Fps::parse_ratio(r).ok())
            .or_else(|| {
                v.avg_frame_rate
                    .as_deref()
                    .and_then(|r| Fps::parse_ratio(r).ok())
            })
            .ok_or_else(|| {
                MontageError::decode(format!(
                    "missing or invalid frame rate for '{}'",
                    source_path.display()
                ))
            })?;
        let duration_sec = v
            .duration
            .as_deref()
            .and_then(parse_secs)
            .or(format_duration);
        let total_frames = match v.nb_frames.as_deref().and_then(|n| n.parse::<u64>().ok()) {
            Some(n) if n > 0 => n,
            _ => {
                let secs = duration_sec.ok_or_else(|| {
                    MontageError::decode(format!(
                        "cannot determine frame count for '{}'",
                        source_path.display()
                    ))
                })?;
                fps.secs_to_frames_floor(secs)
            }
        };
        return Ok(MediaInfo::Video(VideoInfo {
            source_path: source_path.to_path_buf(),
            width,
            height,
            fps,
            total_frames,
            duration_sec: duration_sec.unwrap_or_else(|| fps.frames_to_secs(total_frames)),
        }));
    }

    let audio = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("audio"))
        .ok_or_else(|| {
            MontageError::decode(format!(
                "no audio or video stream found in '{}'",
                source_path.display()
            ))
        })?;
    let duration_sec = audio
        .duration
        .as_deref()
        .and_then(parse_secs)
        .or(format_duration)
        .ok_or_else(|| {
            MontageError::decode(format!(
                "missing audio duration for '{}'",
                source_path.display()
            ))
        })?;
    Ok(MediaInfo::Audio(AudioInfo {
        source_path: source_path.to_path_buf(),
        duration_sec,
        sample_rate: audio
            .sample_rate
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0),
        channels: audio.channels.unwrap_or(0),
    }))
}

fn parse_secs(s: &str) -> Option<f64> {
    s.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

/// Open `path` with `ffprobe` and report its media properties.
///
/// Fails with [`MontageError::NotFound`] when the file is missing and [`MontageError::Decode`]
/// when its headers cannot be read.
#[cfg(feature = "media-ffmpeg")]
pub fn probe(path: &Path) -> MontageResult<MediaInfo> {
    if !path.exists() {
        return Err(MontageError::not_found(path));
    }
    let out = std::process::Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(path)
        .output()
        .map_err(|e| MontageError::decode(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(MontageError::decode(format!(
            "ffprobe failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    let info = parse_probe_json(path, &out.stdout)?;
    tracing::debug!(path = %path.display(), ?info, "probed media");
    Ok(info)
}

/// Probe a media file (unavailable without the `media-ffmpeg` feature).
#[cfg(not(feature = "media-ffmpeg"))]
pub fn probe(_path: &Path) -> MontageResult<MediaInfo> {
    Err(MontageError::decode(
        "media probing requires the 'media-ffmpeg' feature",
    ))
}

/// Probe a file that must carry a video stream.
pub fn probe_video(path: &Path) -> MontageResult<VideoInfo> {
    match probe(path)? {
        MediaInfo::Video(v) => Ok(v),
        MediaInfo::Audio(_) => Err(MontageError::decode(format!(
            "'{}' has no video stream",
            path.display()
        ))),
    }
}

/// Probe a file for its audio properties.
///
/// Video files with an audio track are reported by their container duration.
pub fn probe_audio(path: &Path) -> MontageResult<AudioInfo> {
    match probe(path)? {
        MediaInfo::Audio(a) => Ok(a),
        MediaInfo::Video(v) => Ok(AudioInfo {
            source_path: v.source_path,
            duration_sec: v.duration_sec,
            sample_rate: 0,
            channels: 0,
        }),
    }
}

/// Decode any audio file to interleaved stereo `f32` at `sample_rate`.
#[cfg(feature = "media-ffmpeg")]
pub fn decode_audio_f32_stereo(path: &Path, sample_rate: u32) -> MontageResult<AudioPcm> {
    if !path.exists() {
        return Err(MontageError::not_found(path));
    }
    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(path)
        .args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            &MIX_CHANNELS.to_string(),
            "-ar",
            &sample_rate.to_string(),
            "pipe:1",
        ])
        .output()
        .map_err(|e| MontageError::decode(format!("failed to run ffmpeg for audio decode: {e}")))?;

    if !out.status.success() {
        return Err(MontageError::decode(format!(
            "ffmpeg audio decode failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    Ok(AudioPcm {
        sample_rate,
        channels: MIX_CHANNELS,
        interleaved_f32: f32le_to_samples(&out.stdout)?,
    })
}

/// Decode audio (unavailable without the `media-ffmpeg` feature).
#[cfg(not(feature = "media-ffmpeg"))]
pub fn decode_audio_f32_stereo(_path: &Path, _sample_rate: u32) -> MontageResult<AudioPcm> {
    Err(MontageError::decode(
        "audio decoding requires the 'media-ffmpeg' feature",
    ))
}

/// Probe and decode one narration clip into an [`AudioAsset`].
///
/// The asset's duration is the probed duration; the decoded samples are carried alongside for
/// muxing.
pub fn load_audio(path: &Path) -> MontageResult<AudioAsset> {
    let info = probe_audio(path)?;
    let pcm = decode_audio_f32_stereo(path, MIX_SAMPLE_RATE)?;
    AudioAsset::new(
        path,
        info.duration_sec,
        pcm.sample_rate,
        pcm.channels,
        pcm.interleaved_f32,
    )
}

pub(crate) fn f32le_to_samples(bytes: &[u8]) -> MontageResult<Vec<f32>> {
    if !bytes.len().is_multiple_of(4) {
        return Err(MontageError::decode(
            "decoded audio byte length is not aligned to f32 samples",
        ));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

#[cfg(test)]
#[path = "../../tests/unit/assets/media.rs"]
mod tests;

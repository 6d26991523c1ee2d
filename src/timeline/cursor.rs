use rand::Rng;

use crate::assets::media::VideoInfo;
use crate::foundation::core::{FrameBuffer, Fps};
use crate::foundation::error::{MontageError, MontageResult};

/// Sequential supply of decoded background frames.
///
/// `Ok(None)` means the source is exhausted; sources never rewind.
pub trait FrameSource: Send {
    /// Decode the next frame in presentation order.
    fn next_frame(&mut self) -> MontageResult<Option<FrameBuffer>>;
}

/// Frame source over pre-decoded frames.
#[derive(Debug)]
pub struct VecFrameSource {
    frames: std::vec::IntoIter<FrameBuffer>,
}

impl VecFrameSource {
    /// Wrap pre-decoded frames, yielded in order.
    pub fn new(frames: Vec<FrameBuffer>) -> Self {
        Self {
            frames: frames.into_iter(),
        }
    }
}

impl FrameSource for VecFrameSource {
    fn next_frame(&mut self) -> MontageResult<Option<FrameBuffer>> {
        Ok(self.frames.next())
    }
}

/// Pick the background start time for a run.
///
/// With `max_start = total_background - total_audio`, a positive `max_start` yields a uniform
/// draw from `[0, max_start]`; otherwise the run starts at `0`.
pub fn choose_start_secs<R: Rng>(
    total_background_secs: f64,
    total_audio_secs: f64,
    rng: &mut R,
) -> f64 {
    let max_start = total_background_secs - total_audio_secs;
    if max_start.is_finite() && max_start > 0.0 {
        rng.gen_range(0.0..=max_start)
    } else {
        0.0
    }
}

/// Read position into the background video, shared by every segment of one run.
///
/// The cursor is positioned once at construction and only moves forward. After the source
/// reports exhaustion every further read returns `Ok(None)`; there is no wraparound.
pub struct BackgroundCursor {
    source: Box<dyn FrameSource>,
    width: u32,
    height: u32,
    fps: Fps,
    start_frame: u64,
    frames_read: u64,
    exhausted: bool,
}

impl std::fmt::Debug for BackgroundCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundCursor")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("fps", &self.fps)
            .field("start_frame", &self.start_frame)
            .field("frames_read", &self.frames_read)
            .field("exhausted", &self.exhausted)
            .finish_non_exhaustive()
    }
}

impl BackgroundCursor {
    /// Wrap a source already positioned at `start_frame`.
    pub fn new(
        source: Box<dyn FrameSource>,
        width: u32,
        height: u32,
        fps: Fps,
        start_frame: u64,
    ) -> Self {
        Self {
            source,
            width,
            height,
            fps,
            start_frame,
            frames_read: 0,
            exhausted: false,
        }
    }

    /// Decode `info`'s file with ffmpeg starting at `start_frame`.
    pub fn open(info: &VideoInfo, start_frame: u64) -> MontageResult<Self> {
        let reader = FfmpegFrameReader::spawn(info, info.fps.frames_to_secs(start_frame))?;
        Ok(Self::new(
            Box::new(reader),
            info.width,
            info.height,
            info.fps,
            start_frame,
        ))
    }

    /// Next background frame, or `None` once the background has run out.
    pub fn next_frame(&mut self) -> MontageResult<Option<FrameBuffer>> {
        if self.exhausted {
            return Ok(None);
        }
        match self.source.next_frame()? {
            Some(frame) => {
                if frame.width != self.width || frame.height != self.height {
                    return Err(MontageError::decode(format!(
                        "background frame size changed: got {}x{}, expected {}x{}",
                        frame.width, frame.height, self.width, self.height
                    )));
                }
                self.frames_read += 1;
                Ok(Some(frame))
            }
            None => {
                tracing::warn!(
                    position = self.position(),
                    "background exhausted, remaining segments are truncated"
                );
                self.exhausted = true;
                Ok(None)
            }
        }
    }

    /// Frame width of the background.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height of the background.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Native frame rate of the background.
    pub fn fps(&self) -> Fps {
        self.fps
    }

    /// Background frame index the run started at.
    pub fn start_frame(&self) -> u64 {
        self.start_frame
    }

    /// Frames handed out so far.
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    /// Absolute background frame index of the next read.
    pub fn position(&self) -> u64 {
        self.start_frame + self.frames_read
    }

    /// `true` once the source has reported the end of the background.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

/// First video stream as packed `rgb24`, one decoded frame per output frame.
#[cfg(feature = "media-ffmpeg")]
const RAWVIDEO_OUTPUT_ARGS: [&str; 11] = [
    "-map", "0:v:0", "-an", "-sn", "-fps_mode", "passthrough", "-f", "rawvideo", "-pix_fmt",
    "rgb24", "pipe:1",
];

/// Background decoder that streams `rgb24` frames from a system `ffmpeg` process.
///
/// Seeks once at spawn time and then reads sequentially. Decoded frames are passed through as-is;
/// variable frame rate sources are not resampled to a constant rate.
pub struct FfmpegFrameReader {
    source_path: std::path::PathBuf,
    frame_len: usize,
    width: u32,
    height: u32,
    child: Option<std::process::Child>,
    stdout: Option<std::process::ChildStdout>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,
}

impl FfmpegFrameReader {
    /// Start decoding `info`'s file at `start_secs`.
    #[cfg(feature = "media-ffmpeg")]
    pub fn spawn(info: &VideoInfo, start_secs: f64) -> MontageResult<Self> {
        use std::io::Read as _;
        use std::process::{Command, Stdio};

        if !info.source_path.exists() {
            return Err(MontageError::not_found(&info.source_path));
        }
        let frame_len = FrameBuffer::byte_len(info.width, info.height);
        if frame_len == 0 {
            return Err(MontageError::decode(
                "background frame size is zero (invalid source dimensions)",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .args(["-v", "error", "-ss", &format!("{start_secs:.9}"), "-i"])
            .arg(&info.source_path)
            .args(RAWVIDEO_OUTPUT_ARGS);
        let mut child = cmd.spawn().map_err(|e| {
            MontageError::decode(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| MontageError::decode("failed to open ffmpeg stdout (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| MontageError::decode("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        tracing::debug!(
            path = %info.source_path.display(),
            start_secs,
            "opened background decoder"
        );
        Ok(Self {
            source_path: info.source_path.clone(),
            frame_len,
            width: info.width,
            height: info.height,
            child: Some(child),
            stdout: Some(stdout),
            stderr_drain: Some(stderr_drain),
        })
    }

    /// Start decoding (unavailable without the `media-ffmpeg` feature).
    #[cfg(not(feature = "media-ffmpeg"))]
    pub fn spawn(_info: &VideoInfo, _start_secs: f64) -> MontageResult<Self> {
        Err(MontageError::decode(
            "background decoding requires the 'media-ffmpeg' feature",
        ))
    }

    fn finish(&mut self) -> MontageResult<()> {
        drop(self.stdout.take());
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        let status = child
            .wait()
            .map_err(|e| MontageError::decode(format!("failed to wait for ffmpeg: {e}")))?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| MontageError::decode("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| MontageError::decode(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };
        if !status.success() {
            return Err(MontageError::decode(format!(
                "ffmpeg background decode failed for '{}' ({status}): {}",
                self.source_path.display(),
                String::from_utf8_lossy(&stderr_bytes).trim()
            )));
        }
        Ok(())
    }
}

impl FrameSource for FfmpegFrameReader {
    fn next_frame(&mut self) -> MontageResult<Option<FrameBuffer>> {
        use std::io::Read as _;

        let Some(stdout) = self.stdout.as_mut() else {
            return Ok(None);
        };
        let mut data = vec![0u8; self.frame_len];
        let mut filled = 0;
        while filled < self.frame_len {
            match stdout.read(&mut data[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(MontageError::decode(format!(
                        "failed to read background frame from ffmpeg: {e}"
                    )));
                }
            }
        }
        if filled == self.frame_len {
            return Ok(Some(FrameBuffer {
                width: self.width,
                height: self.height,
                data,
            }));
        }
        if filled > 0 {
            tracing::warn!(bytes = filled, "discarding partial trailing background frame");
        }
        self.finish()?;
        Ok(None)
    }
}

impl Drop for FfmpegFrameReader {
    fn drop(&mut self) {
        drop(self.stdout.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/cursor.rs"]
mod tests;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use crate::encode::sink::{AudioInputConfig, FrameSink, SinkConfig};
use crate::foundation::core::{FrameBuffer, FrameIndex, Fps};
use crate::foundation::error::{MontageError, MontageResult};

/// Options for [`FfmpegSink`] output.
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// File ffmpeg writes to. Existing files are overwritten.
    pub out_path: PathBuf,
    /// Force a container format (`-f`), for paths whose extension ffmpeg cannot infer from.
    pub format: Option<String>,
}

impl FfmpegSinkOpts {
    /// Create options for writing to `out_path`.
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        let out_path = out_path.into();
        Self {
            format: container_override(&out_path),
            out_path,
        }
    }
}

/// Sink that spawns the system `ffmpeg` and streams raw `rgb24` frames to stdin.
///
/// Audio is optional and provided through [`SinkConfig::audio`].
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,

    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
}

impl FfmpegSink {
    /// Create a new sink that streams into `ffmpeg`.
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            child: None,
            stdin: None,
            stderr_drain: None,
            cfg: None,
            last_idx: None,
        }
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> MontageResult<()> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(MontageError::invalid_argument(
                "ffmpeg sink width/height must be non-zero",
            ));
        }
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(MontageError::invalid_argument(
                "ffmpeg sink width/height must be even (required for yuv420p output)",
            ));
        }
        ensure_parent_dir(&self.opts.out_path)?;
        if !is_ffmpeg_on_path() {
            return Err(MontageError::encode(
                "ffmpeg is required for encoding, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        cmd.args([
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgb24",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
        ]);
        push_input_fps(&mut cmd, cfg.fps);
        cmd.args(["-i", "pipe:0"]);

        if let Some(audio) = cfg.audio.as_ref() {
            if audio.sample_rate == 0 || audio.channels == 0 {
                return Err(MontageError::invalid_argument(
                    "audio sample_rate and channels must be non-zero when audio is enabled",
                ));
            }
            push_pcm_input(&mut cmd, audio);
            cmd.args([
                "-map", "0:v:0", "-map", "1:a:0", "-c:v", "libx264", "-pix_fmt", "yuv420p",
                "-c:a", "aac", "-shortest",
            ]);
        } else {
            cmd.args(["-an", "-c:v", "libx264", "-pix_fmt", "yuv420p"]);
        }
        push_output(&mut cmd, &self.opts);

        let (child, stdin, stderr_drain) = spawn_with_stderr_drain(cmd)?;
        self.child = Some(child);
        self.stdin = stdin;
        self.stderr_drain = Some(stderr_drain);
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameBuffer) -> MontageResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| MontageError::encode("ffmpeg sink not started"))?;
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(MontageError::encode(
                "ffmpeg sink received out-of-order frame index",
            ));
        }
        self.last_idx = Some(idx);

        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(MontageError::invalid_argument(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        if frame.data.len() != FrameBuffer::byte_len(cfg.width, cfg.height) {
            return Err(MontageError::invalid_argument(
                "frame.data size mismatch with width*height*3",
            ));
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(MontageError::encode("ffmpeg sink is already finalized"));
        };

        use std::io::Write as _;
        stdin.write_all(&frame.data).map_err(|e| {
            MontageError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    fn end(&mut self) -> MontageResult<()> {
        drop(self.stdin.take());
        let child = self
            .child
            .take()
            .ok_or_else(|| MontageError::encode("ffmpeg sink not started"))?;
        wait_and_check(child, self.stderr_drain.take())?;
        self.cfg = None;
        Ok(())
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Destination file written through a temporary sibling and renamed into place on success.
///
/// Dropping an uncommitted output removes the temporary file, so a failed encode never leaves
/// a partial file at the destination.
#[derive(Debug)]
pub struct AtomicOutput {
    tmp: tempfile::NamedTempFile,
    dest: PathBuf,
    overwrite: bool,
}

impl AtomicOutput {
    /// Reserve a temporary file next to `dest` with the same extension.
    pub fn new(dest: impl Into<PathBuf>, overwrite: bool) -> MontageResult<Self> {
        let dest = dest.into();
        if !overwrite && dest.exists() {
            return Err(MontageError::encode(format!(
                "output file '{}' already exists",
                dest.display()
            )));
        }
        ensure_parent_dir(&dest)?;
        let dir = output_dir(&dest);
        let suffix = dest
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_else(|| ".mp4".to_string());
        let tmp = tempfile::Builder::new()
            .prefix(".montage-")
            .suffix(&suffix)
            .tempfile_in(&dir)
            .map_err(|e| {
                MontageError::encode(format!(
                    "failed to create temporary output in '{}': {e}",
                    dir.display()
                ))
            })?;
        Ok(Self {
            tmp,
            dest,
            overwrite,
        })
    }

    /// Path encoders should write to.
    pub fn path(&self) -> &Path {
        self.tmp.path()
    }

    /// Final destination.
    pub fn dest(&self) -> &Path {
        &self.dest
    }

    /// Sink options targeting the temporary path with the destination's container.
    pub fn sink_opts(&self) -> FfmpegSinkOpts {
        FfmpegSinkOpts {
            out_path: self.path().to_path_buf(),
            format: container_override(&self.dest),
        }
    }

    /// Atomically move the finished file onto the destination path.
    pub fn commit(self) -> MontageResult<PathBuf> {
        let persisted = if self.overwrite {
            self.tmp.persist(&self.dest)
        } else {
            self.tmp.persist_noclobber(&self.dest)
        };
        persisted.map_err(|e| {
            MontageError::encode(format!(
                "failed to move output into '{}': {}",
                self.dest.display(),
                e.error
            ))
        })?;
        Ok(self.dest)
    }
}

/// Encode `frames` into a video without audio at `out_path`.
pub fn write_silent_video(
    frames: &[FrameBuffer],
    fps: Fps,
    out_path: &Path,
    overwrite: bool,
) -> MontageResult<PathBuf> {
    let Some(first) = frames.first() else {
        return Err(MontageError::invalid_argument("no frames to encode"));
    };
    let out = AtomicOutput::new(out_path, overwrite)?;
    let mut sink = FfmpegSink::new(out.sink_opts());
    sink.begin(SinkConfig {
        width: first.width,
        height: first.height,
        fps,
        audio: None,
    })?;
    for (i, frame) in frames.iter().enumerate() {
        sink.push_frame(FrameIndex(i as u64), frame)?;
    }
    sink.end()?;
    out.commit()
}

/// Copy the video stream of `video_path` and add `audio` as an AAC track, writing `out`.
pub fn mux_audio(video_path: &Path, audio: &AudioInputConfig, out: &FfmpegSinkOpts) -> MontageResult<()> {
    if !is_ffmpeg_on_path() {
        return Err(MontageError::encode(
            "ffmpeg is required for muxing, but was not found on PATH",
        ));
    }
    let mut cmd = Command::new("ffmpeg");
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .args(["-y", "-loglevel", "error", "-i"])
        .arg(video_path);
    push_pcm_input(&mut cmd, audio);
    cmd.args([
        "-map", "0:v:0", "-map", "1:a:0", "-c:v", "copy", "-c:a", "aac", "-shortest",
    ]);
    push_output(&mut cmd, out);

    let (child, _, stderr_drain) = spawn_with_stderr_drain(cmd)?;
    wait_and_check(child, Some(stderr_drain))
}

fn push_input_fps(cmd: &mut Command, fps: Fps) {
    // For rawvideo input, `-r` before `-i` sets the input framerate.
    cmd.args(["-r", &format!("{}/{}", fps.num, fps.den)]);
}

fn push_pcm_input(cmd: &mut Command, audio: &AudioInputConfig) {
    cmd.args([
        "-f",
        "f32le",
        "-ar",
        &audio.sample_rate.to_string(),
        "-ac",
        &audio.channels.to_string(),
        "-i",
    ])
    .arg(&audio.path);
}

fn push_output(cmd: &mut Command, opts: &FfmpegSinkOpts) {
    let mov_family = match opts.format.as_deref() {
        Some(f) => f == "mp4" || f == "mov",
        None => has_mov_extension(&opts.out_path),
    };
    if mov_family {
        cmd.args(["-movflags", "+faststart"]);
    }
    if let Some(format) = opts.format.as_deref() {
        cmd.args(["-f", format]);
    }
    cmd.arg(&opts.out_path);
}

fn has_mov_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e.to_ascii_lowercase().as_str(), "mp4" | "m4v" | "mov"))
        .unwrap_or(false)
}

fn container_override(path: &Path) -> Option<String> {
    match path.extension() {
        None => Some("mp4".to_string()),
        Some(_) => None,
    }
}

type StderrDrain = std::thread::JoinHandle<std::io::Result<Vec<u8>>>;

fn spawn_with_stderr_drain(
    mut cmd: Command,
) -> MontageResult<(Child, Option<ChildStdin>, StderrDrain)> {
    let mut child = cmd.spawn().map_err(|e| {
        MontageError::encode(format!(
            "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
        ))
    })?;
    let stdin = child.stdin.take();
    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| MontageError::encode("failed to open ffmpeg stderr (unexpected)"))?;
    let stderr_drain = std::thread::spawn(move || {
        let mut stderr_bytes = Vec::new();
        stderr.read_to_end(&mut stderr_bytes)?;
        Ok(stderr_bytes)
    });
    Ok((child, stdin, stderr_drain))
}

fn wait_and_check(mut child: Child, stderr_drain: Option<StderrDrain>) -> MontageResult<()> {
    let status = child
        .wait()
        .map_err(|e| MontageError::encode(format!("failed to wait for ffmpeg to finish: {e}")))?;
    let stderr_bytes = match stderr_drain {
        Some(handle) => handle
            .join()
            .map_err(|_| MontageError::encode("ffmpeg stderr drain thread panicked"))?
            .map_err(|e| MontageError::encode(format!("ffmpeg stderr read failed: {e}")))?,
        None => Vec::new(),
    };

    if !status.success() {
        let stderr = String::from_utf8_lossy(&stderr_bytes);
        return Err(MontageError::encode(format!(
            "ffmpeg exited with status {}: {}",
            status,
            stderr.trim()
        )));
    }
    Ok(())
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> MontageResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            MontageError::encode(format!(
                "failed to create output directory '{}': {e}",
                parent.display()
            ))
        })?;
    }
    Ok(())
}

/// Directory `path` lives in, `.` for bare file names.
pub(crate) fn output_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;

use std::path::Path;
use std::sync::mpsc::{Receiver, SyncSender, sync_channel};

use crate::audio::track::{AudioAsset, concat_segment_audio, write_f32le_file};
use crate::encode::ffmpeg::{AtomicOutput, FfmpegSink, mux_audio, output_dir};
use crate::encode::sink::{AudioInputConfig, FrameSink, SinkConfig};
use crate::foundation::core::{FrameBuffer, FrameIndex, Fps};
use crate::foundation::error::{MontageError, MontageResult};
use crate::segment::builder::Segment;

/// Options for [`Assembler`].
#[derive(Clone, Copy, Debug)]
pub struct AssembleOpts {
    /// Replace an existing file at the output path.
    pub overwrite: bool,
}

impl Default for AssembleOpts {
    fn default() -> Self {
        Self { overwrite: true }
    }
}

/// Summary of an assembled output.
#[derive(Clone, Debug, PartialEq)]
pub struct AssemblyStats {
    /// Frames written.
    pub frames_total: u64,
    /// Output frame rate.
    pub fps: Fps,
    /// Segments concatenated.
    pub segments: usize,
}

impl AssemblyStats {
    /// Visual length of the output.
    pub fn duration_secs(&self) -> f64 {
        self.fps.frames_to_secs(self.frames_total)
    }
}

/// Concatenates ordered segments into a single video stream with one audio track.
///
/// Segments are only read; nothing handed to the assembler is modified.
#[derive(Clone, Copy, Debug, Default)]
pub struct Assembler {
    opts: AssembleOpts,
}

impl Assembler {
    /// Create an assembler.
    pub fn new(opts: AssembleOpts) -> Self {
        Self { opts }
    }

    /// Encode `segments` in order to `output_path`.
    ///
    /// The file appears at `output_path` only if encoding succeeds.
    #[tracing::instrument(skip(self, segments), fields(segments = segments.len()))]
    pub fn assemble(
        &self,
        segments: &[Segment],
        output_path: &Path,
    ) -> MontageResult<AssemblyStats> {
        let (width, height, fps) = check_uniform(segments)?;
        let frames_total: u64 = segments.iter().map(Segment::frame_count).sum();
        if frames_total == 0 {
            return Err(MontageError::encode("no frames to encode"));
        }
        tracing::info!(
            output = %output_path.display(),
            expected_secs = fps.frames_to_secs(frames_total),
            "concatenating segments"
        );

        let out = AtomicOutput::new(output_path, self.opts.overwrite)?;
        let spans: Vec<(u64, &AudioAsset)> =
            segments.iter().map(|s| (s.frame_count(), &s.audio)).collect();
        let audio_file = write_audio_track(&spans, fps, out.dest())?;

        let mut sink = FfmpegSink::new(out.sink_opts());
        let stats = self.assemble_into(
            segments,
            &mut sink,
            SinkConfig {
                width,
                height,
                fps,
                audio: Some(audio_file.config.clone()),
            },
        )?;
        out.commit()?;
        drop(audio_file);
        Ok(stats)
    }

    /// Push every frame of `segments`, in order, through `sink`.
    pub fn assemble_into(
        &self,
        segments: &[Segment],
        sink: &mut dyn FrameSink,
        cfg: SinkConfig,
    ) -> MontageResult<AssemblyStats> {
        let (width, height, fps) = check_uniform(segments)?;
        if cfg.width != width || cfg.height != height || cfg.fps != fps {
            return Err(MontageError::invalid_argument(
                "sink config does not match segment geometry/fps",
            ));
        }
        sink.begin(cfg)?;
        let mut idx = 0u64;
        for seg in segments {
            for frame in &seg.frames {
                sink.push_frame(FrameIndex(idx), frame)?;
                idx += 1;
            }
        }
        sink.end()?;
        Ok(AssemblyStats {
            frames_total: idx,
            fps,
            segments: segments.len(),
        })
    }

    /// Add the concatenated segment audio to an already-encoded video and publish it.
    ///
    /// `spans` holds `(frames, audio)` per segment in output order.
    pub fn mux_streamed(
        &self,
        video_path: &Path,
        spans: &[(u64, &AudioAsset)],
        fps: Fps,
        output_path: &Path,
    ) -> MontageResult<AssemblyStats> {
        let frames_total: u64 = spans.iter().map(|(f, _)| *f).sum();
        if frames_total == 0 {
            return Err(MontageError::encode("no frames to encode"));
        }
        let out = AtomicOutput::new(output_path, self.opts.overwrite)?;
        let audio_file = write_audio_track(spans, fps, out.dest())?;
        mux_audio(video_path, &audio_file.config, &out.sink_opts())?;
        out.commit()?;
        Ok(AssemblyStats {
            frames_total,
            fps,
            segments: spans.len(),
        })
    }
}

fn check_uniform(segments: &[Segment]) -> MontageResult<(u32, u32, Fps)> {
    let first_frame = segments.iter().flat_map(|s| s.frames.first()).next();
    let (Some(first), Some(frame)) = (segments.first(), first_frame) else {
        if segments.is_empty() {
            return Err(MontageError::invalid_argument("no segments to assemble"));
        }
        return Err(MontageError::encode("no frames to encode"));
    };
    let (width, height, fps) = (frame.width, frame.height, first.fps);
    for seg in segments {
        if seg.fps != fps {
            return Err(MontageError::invalid_argument(format!(
                "segment {} runs at {}/{} fps, expected {}/{}",
                seg.index, seg.fps.num, seg.fps.den, fps.num, fps.den
            )));
        }
        if seg
            .frames
            .iter()
            .any(|f| f.width != width || f.height != height)
        {
            return Err(MontageError::invalid_argument(format!(
                "segment {} has frames that are not {width}x{height}",
                seg.index
            )));
        }
    }
    Ok((width, height, fps))
}

/// Concatenated audio written to a temporary raw PCM file, removed on drop.
struct AudioTrackFile {
    _file: tempfile::NamedTempFile,
    config: AudioInputConfig,
}

fn write_audio_track(
    spans: &[(u64, &AudioAsset)],
    fps: Fps,
    near: &Path,
) -> MontageResult<AudioTrackFile> {
    let (sample_rate, channels, pcm) = concat_segment_audio(spans, fps)?;
    let dir = output_dir(near);
    let file = tempfile::Builder::new()
        .prefix(".montage-audio-")
        .suffix(".f32le")
        .tempfile_in(&dir)
        .map_err(|e| MontageError::encode(format!("failed to create audio temp file: {e}")))?;
    write_f32le_file(&pcm, file.path())?;
    Ok(AudioTrackFile {
        config: AudioInputConfig {
            path: file.path().to_path_buf(),
            sample_rate,
            channels,
        },
        _file: file,
    })
}

enum StreamMsg {
    Frame(FrameBuffer),
    Finish,
}

/// Frames queued to an encoder thread over a bounded channel.
///
/// The producer blocks once `capacity` frames are waiting, which bounds memory to a few frames
/// regardless of segment length. Only [`FrameStream::finish`] ends the sink; dropping an
/// unfinished stream waits for the encoder thread and drops the sink without ending it.
pub struct FrameStream<S: FrameSink + 'static> {
    tx: Option<SyncSender<StreamMsg>>,
    worker: Option<std::thread::JoinHandle<MontageResult<S>>>,
    pushed: u64,
}

impl<S: FrameSink + 'static> FrameStream<S> {
    /// Begin `sink` with `cfg` and move it onto an encoder thread.
    pub fn start(mut sink: S, cfg: SinkConfig, capacity: usize) -> MontageResult<Self> {
        if capacity == 0 {
            return Err(MontageError::invalid_argument(
                "frame stream capacity must be > 0",
            ));
        }
        sink.begin(cfg)?;
        let (tx, rx) = sync_channel::<StreamMsg>(capacity);
        let worker = std::thread::spawn(move || encode_loop(sink, rx));
        Ok(Self {
            tx: Some(tx),
            worker: Some(worker),
            pushed: 0,
        })
    }

    /// Queue the next frame, blocking while the channel is full.
    pub fn push(&mut self, frame: FrameBuffer) -> MontageResult<()> {
        self.send(StreamMsg::Frame(frame))?;
        self.pushed += 1;
        Ok(())
    }

    /// Frames queued so far.
    pub fn pushed(&self) -> u64 {
        self.pushed
    }

    /// Wait for the encoder to drain, end the sink and return it.
    pub fn finish(mut self) -> MontageResult<(u64, S)> {
        self.send(StreamMsg::Finish)?;
        self.tx = None;
        let sink = self.join()?;
        Ok((self.pushed, sink))
    }

    fn send(&mut self, msg: StreamMsg) -> MontageResult<()> {
        let Some(tx) = self.tx.as_ref() else {
            return Err(MontageError::encode("frame stream already finished"));
        };
        if tx.send(msg).is_err() {
            // The encoder hung up early; surface its error.
            self.tx = None;
            return match self.join() {
                Ok(_) => Err(MontageError::encode("encoder thread stopped unexpectedly")),
                Err(e) => Err(e),
            };
        }
        Ok(())
    }

    fn join(&mut self) -> MontageResult<S> {
        let worker = self
            .worker
            .take()
            .ok_or_else(|| MontageError::encode("encoder thread already joined"))?;
        worker
            .join()
            .map_err(|_| MontageError::encode("encoder thread panicked"))?
    }
}

impl<S: FrameSink + 'static> Drop for FrameStream<S> {
    fn drop(&mut self) {
        drop(self.tx.take());
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn encode_loop<S: FrameSink>(mut sink: S, rx: Receiver<StreamMsg>) -> MontageResult<S> {
    let mut idx = 0u64;
    for msg in rx {
        match msg {
            StreamMsg::Frame(frame) => {
                sink.push_frame(FrameIndex(idx), &frame)?;
                idx += 1;
            }
            StreamMsg::Finish => {
                sink.end()?;
                return Ok(sink);
            }
        }
    }
    // Producer went away without finishing; `sink` is dropped unended.
    tracing::debug!(frames = idx, "frame stream abandoned");
    Err(MontageError::encode("frame stream dropped before finish"))
}

#[cfg(test)]
#[path = "../../tests/unit/assemble/assembler.rs"]
mod tests;

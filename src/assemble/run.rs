use std::path::{Path, PathBuf};

use rand::SeedableRng as _;
use rand::rngs::StdRng;

use crate::assemble::assembler::{AssembleOpts, Assembler, FrameStream};
use crate::assets::decode::{ImageAsset, image_dimensions, load_image};
use crate::assets::media::{VideoInfo, load_audio, probe_video};
use crate::audio::track::AudioAsset;
use crate::compose::composite::{centered_offset, check_fits};
use crate::config::{AssemblyConfig, Buffering};
use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, ensure_parent_dir, output_dir};
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::Fps;
use crate::foundation::error::{MontageError, MontageResult};
use crate::segment::builder::{Segment, SegmentBuilder};
use crate::timeline::cursor::{BackgroundCursor, choose_start_secs};
use crate::timeline::schedule::total_audio_secs;

/// Inputs of one assembly run: a background plus index-aligned image/audio lists.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AssemblyRequest {
    /// Background video file.
    pub background: PathBuf,
    /// Still images, one per segment.
    pub images: Vec<PathBuf>,
    /// Narration clips; `audio[i]` pairs with `images[i]`.
    pub audio: Vec<PathBuf>,
    /// Destination of the muxed output.
    pub output: PathBuf,
}

impl AssemblyRequest {
    /// Request with no pairs yet.
    pub fn new(background: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            background: background.into(),
            output: output.into(),
            ..Self::default()
        }
    }

    /// Append one (image, audio) pair.
    pub fn with_pair(mut self, image: impl Into<PathBuf>, audio: impl Into<PathBuf>) -> Self {
        self.images.push(image.into());
        self.audio.push(audio.into());
        self
    }

    /// Number of (image, audio) pairs.
    pub fn pair_count(&self) -> usize {
        self.images.len()
    }

    /// Reject empty or misaligned pair lists.
    pub fn validate(&self) -> MontageResult<()> {
        if self.images.len() != self.audio.len() {
            return Err(MontageError::invalid_argument(format!(
                "{} images but {} audio clips",
                self.images.len(),
                self.audio.len()
            )));
        }
        if self.images.is_empty() {
            return Err(MontageError::invalid_argument("no (image, audio) pairs"));
        }
        Ok(())
    }
}

/// Media IO used by [`AssemblyRun`].
pub trait MediaLoader: Send {
    /// Probe the background video.
    fn probe_background(&self, path: &Path) -> MontageResult<VideoInfo>;
    /// Open a cursor over the background positioned at `start_frame`.
    fn open_background(
        &self,
        info: &VideoInfo,
        start_frame: u64,
    ) -> MontageResult<BackgroundCursor>;
    /// Decode one still image.
    fn load_image(&self, path: &Path) -> MontageResult<ImageAsset>;
    /// Pixel size of one still image.
    fn image_dimensions(&self, path: &Path) -> MontageResult<(u32, u32)> {
        self.load_image(path).map(|image| (image.width, image.height))
    }
    /// Probe and decode one narration clip.
    fn load_audio(&self, path: &Path) -> MontageResult<AudioAsset>;
}

/// [`MediaLoader`] backed by the `image` crate and the system `ffprobe`/`ffmpeg`.
#[derive(Clone, Copy, Debug, Default)]
pub struct FfmpegLoader;

impl MediaLoader for FfmpegLoader {
    fn probe_background(&self, path: &Path) -> MontageResult<VideoInfo> {
        probe_video(path)
    }

    fn open_background(
        &self,
        info: &VideoInfo,
        start_frame: u64,
    ) -> MontageResult<BackgroundCursor> {
        BackgroundCursor::open(info, start_frame)
    }

    fn load_image(&self, path: &Path) -> MontageResult<ImageAsset> {
        load_image(path)
    }

    fn image_dimensions(&self, path: &Path) -> MontageResult<(u32, u32)> {
        image_dimensions(path)
    }

    fn load_audio(&self, path: &Path) -> MontageResult<AudioAsset> {
        load_audio(path)
    }
}

/// Outcome of a [`PairErrorPolicy`] decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PairDecision {
    /// Fail the run with the pair's error.
    Abort,
    /// Leave the pair out and continue with the next one.
    Skip,
}

/// Decides what happens when one (image, audio) pair cannot be used.
///
/// Only pair-local failures reach the policy: missing or undecodable image/audio and
/// foreground images larger than the background. `err` is always a
/// [`MontageError::Pair`].
pub trait PairErrorPolicy: Send {
    /// Decide for pair `index`.
    fn decide(&mut self, index: usize, err: &MontageError) -> PairDecision;
}

impl<F> PairErrorPolicy for F
where
    F: FnMut(usize, &MontageError) -> PairDecision + Send,
{
    fn decide(&mut self, index: usize, err: &MontageError) -> PairDecision {
        self(index, err)
    }
}

/// Abort on the first failed pair.
#[derive(Clone, Copy, Debug, Default)]
pub struct AbortOnPairError;

impl PairErrorPolicy for AbortOnPairError {
    fn decide(&mut self, _index: usize, _err: &MontageError) -> PairDecision {
        PairDecision::Abort
    }
}

/// Skip every failed pair.
#[derive(Clone, Copy, Debug, Default)]
pub struct SkipFailedPairs;

impl PairErrorPolicy for SkipFailedPairs {
    fn decide(&mut self, _index: usize, _err: &MontageError) -> PairDecision {
        PairDecision::Skip
    }
}

/// Lifecycle of an [`AssemblyRun`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    /// Nothing has happened yet.
    Idle,
    /// Probing the background and narration.
    Probing,
    /// Computing the frame count of pair `index`.
    Scheduling {
        /// Pair index.
        index: usize,
    },
    /// Compositing the frames of pair `index`.
    Building {
        /// Pair index.
        index: usize,
    },
    /// Concatenating segments into the output.
    Assembling,
    /// Finished successfully.
    Done,
    /// Stopped on an unrecoverable error.
    Failed,
}

/// Per-pair outcome.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentReport {
    /// Pair index.
    pub index: usize,
    /// Frames the scheduler asked for (0 for skipped pairs).
    pub scheduled_frames: u64,
    /// Frames actually produced.
    pub emitted_frames: u64,
    /// The background ran out inside this segment.
    pub truncated: bool,
    /// The pair failed and the policy skipped it.
    pub skipped: bool,
}

impl SegmentReport {
    fn skipped(index: usize) -> Self {
        Self {
            index,
            scheduled_frames: 0,
            emitted_frames: 0,
            truncated: false,
            skipped: true,
        }
    }
}

/// Summary of one run.
#[derive(Clone, Debug, PartialEq)]
pub struct RunReport {
    /// Chosen background start time in seconds.
    pub start_secs: f64,
    /// First background frame read.
    pub start_frame: u64,
    /// Output frame rate (the background's).
    pub fps: Fps,
    /// One entry per input pair, in input order.
    pub segments: Vec<SegmentReport>,
    /// Frames in the output.
    pub frames_total: u64,
    /// Written file, when the run produced one.
    pub output: Option<PathBuf>,
}

impl RunReport {
    /// Visual length of the output in seconds.
    pub fn expected_duration_secs(&self) -> f64 {
        self.fps.frames_to_secs(self.frames_total)
    }

    /// Indices of pairs the policy skipped.
    pub fn skipped_pairs(&self) -> Vec<usize> {
        self.segments
            .iter()
            .filter(|s| s.skipped)
            .map(|s| s.index)
            .collect()
    }

    /// `true` when any segment was cut short by the background running out.
    pub fn is_truncated(&self) -> bool {
        self.segments.iter().any(|s| s.truncated)
    }
}

/// Segments materialized by [`AssemblyRun::build_segments`].
#[derive(Debug)]
pub struct BuiltRun {
    /// Built segments in input order, skipped pairs left out.
    pub segments: Vec<Segment>,
    /// Run summary; `output` is `None`.
    pub report: RunReport,
}

/// Result of [`AssemblyRun::stream_segments`].
#[derive(Debug)]
pub struct StreamedRun<S> {
    /// The ended sink.
    pub sink: S,
    /// `(emitted frames, audio)` per built segment in output order.
    pub audio: Vec<(u64, AudioAsset)>,
    /// Run summary; `output` is `None`.
    pub report: RunReport,
}

struct Prepared {
    cursor: BackgroundCursor,
    pairs: Vec<(usize, AudioAsset)>,
    reports: Vec<SegmentReport>,
    start_secs: f64,
    start_frame: u64,
    fps: Fps,
}

/// One assembly run: probe, schedule, build and assemble.
///
/// A run owns its background cursor; runs never share read positions.
pub struct AssemblyRun {
    config: AssemblyConfig,
    loader: Box<dyn MediaLoader>,
    policy: Box<dyn PairErrorPolicy>,
    state: RunState,
}

impl std::fmt::Debug for AssemblyRun {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssemblyRun")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl AssemblyRun {
    /// Run with the ffmpeg loader and [`AbortOnPairError`].
    pub fn new(config: AssemblyConfig) -> Self {
        Self {
            config,
            loader: Box::new(FfmpegLoader),
            policy: Box::new(AbortOnPairError),
            state: RunState::Idle,
        }
    }

    /// Replace the media loader.
    pub fn with_loader(mut self, loader: impl MediaLoader + 'static) -> Self {
        self.loader = Box::new(loader);
        self
    }

    /// Replace the pair error policy.
    pub fn with_policy(mut self, policy: impl PairErrorPolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Run configuration.
    pub fn config(&self) -> &AssemblyConfig {
        &self.config
    }

    /// Produce the output file described by `request`.
    #[tracing::instrument(skip(self, request), fields(pairs = request.pair_count(), output = %request.output.display()))]
    pub fn run(&mut self, request: &AssemblyRequest) -> MontageResult<RunReport> {
        let result = self.run_inner(request);
        self.settle(result, RunState::Done)
    }

    /// Build every segment in memory without encoding.
    ///
    /// Leaves the run in [`RunState::Assembling`]; the caller owns the assembly step.
    pub fn build_segments(&mut self, request: &AssemblyRequest) -> MontageResult<BuiltRun> {
        let result = self.build_inner(request, false);
        self.settle(result, RunState::Assembling)
    }

    /// Stream every composited frame into `sink` through a bounded encoder channel.
    ///
    /// `sink` receives the background's geometry and frame rate and no audio; the returned
    /// spans let the caller lay the narration over the stream afterwards.
    pub fn stream_segments<S: FrameSink + 'static>(
        &mut self,
        request: &AssemblyRequest,
        sink: S,
        channel_capacity: usize,
    ) -> MontageResult<StreamedRun<S>> {
        let result = self.stream_inner(request, sink, channel_capacity, false);
        self.settle(result, RunState::Done)
    }

    fn settle<T>(&mut self, result: MontageResult<T>, on_ok: RunState) -> MontageResult<T> {
        self.state = match &result {
            Ok(_) => on_ok,
            Err(_) => RunState::Failed,
        };
        result
    }

    fn run_inner(&mut self, request: &AssemblyRequest) -> MontageResult<RunReport> {
        tracing::info!(pairs = request.pair_count(), "assembly run starting");
        let assembler = Assembler::new(AssembleOpts {
            overwrite: self.config.overwrite,
        });
        let mut report = match self.config.buffering {
            Buffering::Segment => {
                let built = self.build_inner(request, true)?;
                self.state = RunState::Assembling;
                assembler.assemble(&built.segments, &request.output)?;
                built.report
            }
            Buffering::Streaming { channel_capacity } => {
                check_destination(&request.output, self.config.overwrite)?;
                let video = tempfile::Builder::new()
                    .prefix(".montage-video-")
                    .suffix(".mp4")
                    .tempfile_in(output_dir(&request.output))
                    .map_err(|e| {
                        MontageError::encode(format!("failed to create video temp file: {e}"))
                    })?;
                let sink = FfmpegSink::new(FfmpegSinkOpts::new(video.path()));
                let streamed = self.stream_inner(request, sink, channel_capacity, true)?;
                self.state = RunState::Assembling;
                let spans: Vec<(u64, &AudioAsset)> =
                    streamed.audio.iter().map(|(f, a)| (*f, a)).collect();
                assembler.mux_streamed(video.path(), &spans, streamed.report.fps, &request.output)?;
                streamed.report
            }
        };
        report.output = Some(request.output.clone());
        tracing::info!(
            output = %request.output.display(),
            frames = report.frames_total,
            expected_secs = report.expected_duration_secs(),
            skipped = report.skipped_pairs().len(),
            "assembly run finished"
        );
        Ok(report)
    }

    fn build_inner(
        &mut self,
        request: &AssemblyRequest,
        encoded: bool,
    ) -> MontageResult<BuiltRun> {
        let builder = SegmentBuilder::new(self.config.pad_seconds)?;
        let mut prepared = self.prepare(request, encoded)?;
        let mut segments = Vec::with_capacity(prepared.pairs.len());

        for (index, audio) in std::mem::take(&mut prepared.pairs) {
            let Some(image) = self.load_pair_image(request, index, &prepared)? else {
                prepared.reports.push(SegmentReport::skipped(index));
                continue;
            };
            self.state = RunState::Building { index };
            let segment = builder.build(index, image, audio, &mut prepared.cursor)?;
            prepared.reports.push(SegmentReport {
                index,
                scheduled_frames: segment.scheduled_frames,
                emitted_frames: segment.frame_count(),
                truncated: segment.is_truncated(),
                skipped: false,
            });
            segments.push(segment);
        }

        if segments.is_empty() {
            return Err(MontageError::invalid_argument("every pair was skipped"));
        }
        let report = finish_report(prepared);
        Ok(BuiltRun { segments, report })
    }

    fn stream_inner<S: FrameSink + 'static>(
        &mut self,
        request: &AssemblyRequest,
        sink: S,
        channel_capacity: usize,
        encoded: bool,
    ) -> MontageResult<StreamedRun<S>> {
        let builder = SegmentBuilder::new(self.config.pad_seconds)?;
        let mut prepared = self.prepare(request, encoded)?;
        let mut stream = FrameStream::start(
            sink,
            SinkConfig {
                width: prepared.cursor.width(),
                height: prepared.cursor.height(),
                fps: prepared.fps,
                audio: None,
            },
            channel_capacity,
        )?;
        let mut spans = Vec::with_capacity(prepared.pairs.len());

        for (index, audio) in std::mem::take(&mut prepared.pairs) {
            let Some(image) = self.load_pair_image(request, index, &prepared)? else {
                prepared.reports.push(SegmentReport::skipped(index));
                continue;
            };
            self.state = RunState::Building { index };
            let (scheduled, emitted) =
                builder.stream(index, image, &audio, &mut prepared.cursor, |frame| {
                    stream.push(frame)
                })?;
            prepared.reports.push(SegmentReport {
                index,
                scheduled_frames: scheduled,
                emitted_frames: emitted,
                truncated: emitted < scheduled,
                skipped: false,
            });
            spans.push((emitted, audio));
        }

        if spans.is_empty() {
            return Err(MontageError::invalid_argument("every pair was skipped"));
        }
        let (_, sink) = stream.finish()?;
        let report = finish_report(prepared);
        Ok(StreamedRun {
            sink,
            audio: spans,
            report,
        })
    }

    /// Probe the background, vet every pair, pick the start offset and open the cursor.
    ///
    /// `encoded` runs end in the ffmpeg encoder, which needs even frame dimensions.
    fn prepare(&mut self, request: &AssemblyRequest, encoded: bool) -> MontageResult<Prepared> {
        self.state = RunState::Probing;
        request.validate()?;
        let info = self.loader.probe_background(&request.background)?;
        tracing::debug!(
            width = info.width,
            height = info.height,
            fps = info.fps.as_f64(),
            total_frames = info.total_frames,
            "background probed"
        );
        if info.width == 0 || info.height == 0 {
            return Err(MontageError::decode(format!(
                "background '{}' has zero-sized frames",
                request.background.display()
            )));
        }

        if encoded && (!info.width.is_multiple_of(2) || !info.height.is_multiple_of(2)) {
            return Err(MontageError::invalid_argument(format!(
                "background is {}x{}; encoding to yuv420p needs even dimensions",
                info.width, info.height
            )));
        }

        // Pairs rejected here do not count towards the run length the start offset must leave.
        let mut pairs = Vec::with_capacity(request.pair_count());
        let mut reports = Vec::new();
        for index in 0..request.pair_count() {
            match self.vet_pair(request, index, &info) {
                Ok(audio) => pairs.push((index, audio)),
                Err(err) => {
                    self.on_pair_error(index, err)?;
                    reports.push(SegmentReport::skipped(index));
                }
            }
        }
        if pairs.is_empty() {
            return Err(MontageError::invalid_argument("every pair was skipped"));
        }

        let durations: Vec<f64> = pairs.iter().map(|(_, a)| a.duration_sec).collect();
        let total_audio = total_audio_secs(&durations, self.config.pad_seconds);
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let start_secs = choose_start_secs(info.total_duration_secs(), total_audio, &mut rng);
        let start_frame = info
            .fps
            .secs_to_frames_floor(start_secs)
            .min(info.total_frames);
        tracing::debug!(
            start_secs,
            start_frame,
            total_audio,
            total_background = info.total_duration_secs(),
            "background start chosen"
        );

        let cursor = self.loader.open_background(&info, start_frame)?;
        Ok(Prepared {
            cursor,
            pairs,
            reports,
            start_secs,
            start_frame,
            fps: info.fps,
        })
    }

    /// Size-check pair `index`'s still against the background and load its narration.
    fn vet_pair(
        &self,
        request: &AssemblyRequest,
        index: usize,
        info: &VideoInfo,
    ) -> MontageResult<AudioAsset> {
        let (width, height) = self.loader.image_dimensions(&request.images[index])?;
        centered_offset(info.width, info.height, width, height)?;
        self.loader.load_audio(&request.audio[index])
    }

    /// Load and size-check the image of pair `index`; `None` when the policy skipped it.
    fn load_pair_image(
        &mut self,
        request: &AssemblyRequest,
        index: usize,
        prepared: &Prepared,
    ) -> MontageResult<Option<ImageAsset>> {
        self.state = RunState::Scheduling { index };
        let loaded = self.loader.load_image(&request.images[index]).and_then(|image| {
            check_fits(prepared.cursor.width(), prepared.cursor.height(), &image)?;
            Ok(image)
        });
        match loaded {
            Ok(image) => Ok(Some(image)),
            Err(err) => {
                self.on_pair_error(index, err)?;
                Ok(None)
            }
        }
    }

    fn on_pair_error(&mut self, index: usize, err: MontageError) -> MontageResult<()> {
        let err = err.for_pair(index);
        match self.policy.decide(index, &err) {
            PairDecision::Skip => {
                tracing::warn!(index, error = %err, "skipping pair");
                Ok(())
            }
            PairDecision::Abort => Err(err),
        }
    }
}

fn finish_report(prepared: Prepared) -> RunReport {
    let mut segments = prepared.reports;
    segments.sort_by_key(|s| s.index);
    let frames_total = segments.iter().map(|s| s.emitted_frames).sum();
    RunReport {
        start_secs: prepared.start_secs,
        start_frame: prepared.start_frame,
        fps: prepared.fps,
        segments,
        frames_total,
        output: None,
    }
}

fn check_destination(output: &Path, overwrite: bool) -> MontageResult<()> {
    if !overwrite && output.exists() {
        return Err(MontageError::encode(format!(
            "output '{}' already exists",
            output.display()
        )));
    }
    ensure_parent_dir(output)
}

#[cfg(test)]
#[path = "../../tests/unit/assemble/run.rs"]
mod tests;

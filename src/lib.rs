//! Montage is a synchronized video-assembly engine.
//!
//! Given a background video and an ordered list of (still image, narration clip) pairs, it
//! produces one video in which each still is alpha-composited, centered, over the background
//! for as long as its narration plus a short pad, with every segment's own audio laid under
//! its frames.
//!
//! # Pipeline overview
//!
//! 1. **Probe**: read the background's geometry, frame rate and length ([`probe_video`]).
//! 2. **Schedule**: `floor((audio + pad) * fps)` frames per pair ([`frame_count`]).
//! 3. **Position**: pick one random start offset that lets the whole run fit
//!    ([`choose_start_secs`]) and read the background sequentially from there
//!    ([`BackgroundCursor`]).
//! 4. **Build**: composite each still over the next frames ([`SegmentBuilder`], [`composite`]).
//! 5. **Assemble**: concatenate segments, concatenate their audio, and encode with the system
//!    `ffmpeg` binary into a temp file that is moved onto the output path on success
//!    ([`Assembler`]).
//!
//! [`AssemblyRun`] drives all five steps for an [`AssemblyRequest`].
//!
//! Design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **No looping**: a background that runs out truncates the current segment and every later
//!   one; it never wraps around.
//! - **Pluggable failure policy**: pair-local failures are handed to a [`PairErrorPolicy`].
#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![allow(missing_docs_in_private_items)]

mod assemble;
mod assets;
mod audio;
mod compose;
mod config;
mod encode;
mod foundation;
mod segment;
mod timeline;

pub use assemble::assembler::{AssembleOpts, Assembler, AssemblyStats, FrameStream};
pub use assemble::run::{
    AbortOnPairError, AssemblyRequest, AssemblyRun, BuiltRun, FfmpegLoader, MediaLoader,
    PairDecision, PairErrorPolicy, RunReport, RunState, SegmentReport, SkipFailedPairs,
    StreamedRun,
};
pub use assets::decode::{ImageAsset, decode_image, image_dimensions, load_image};
pub use assets::media::{
    AudioInfo, AudioPcm, MIX_CHANNELS, MIX_SAMPLE_RATE, MediaInfo, VideoInfo,
    decode_audio_f32_stereo, load_audio, probe, probe_audio, probe_video,
};
pub use audio::track::{AudioAsset, concat_segment_audio, frame_to_sample};
pub use compose::composite::{centered_offset, check_fits, composite, composite_in_place};
pub use config::{AssemblyConfig, Buffering};
pub use foundation::core::{FrameBuffer, FrameIndex, Fps};
pub use foundation::error::{MontageError, MontageResult};
pub use segment::builder::{Segment, SegmentBuilder};
pub use timeline::cursor::{
    BackgroundCursor, FfmpegFrameReader, FrameSource, VecFrameSource, choose_start_secs,
};
pub use timeline::schedule::{DEFAULT_PAD_SECONDS, frame_count, total_audio_secs};

pub use encode::ffmpeg::{
    AtomicOutput, FfmpegSink, FfmpegSinkOpts, ensure_parent_dir, is_ffmpeg_on_path, mux_audio,
    write_silent_video,
};
pub use encode::sink::{AudioInputConfig, FrameSink, InMemorySink, SinkConfig};

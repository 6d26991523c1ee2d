use crate::assets::decode::ImageAsset;
use crate::audio::track::AudioAsset;
use crate::compose::composite::{check_fits, composite_in_place};
use crate::foundation::core::{FrameBuffer, Fps};
use crate::foundation::error::MontageResult;
use crate::timeline::cursor::BackgroundCursor;
use crate::timeline::schedule::{DEFAULT_PAD_SECONDS, check_pad, frame_count};

/// Composited frames plus narration for one input pair.
#[derive(Clone, Debug)]
pub struct Segment {
    /// Index of the input pair this segment was built from.
    pub index: usize,
    /// Composited frames in presentation order.
    pub frames: Vec<FrameBuffer>,
    /// The pair's narration, attached untrimmed.
    pub audio: AudioAsset,
    /// Frame rate of `frames`.
    pub fps: Fps,
    /// Frame count the scheduler asked for.
    pub scheduled_frames: u64,
}

impl Segment {
    /// Frames actually produced.
    pub fn frame_count(&self) -> u64 {
        self.frames.len() as u64
    }

    /// `true` when the background ran out before the scheduled frame count was reached.
    pub fn is_truncated(&self) -> bool {
        self.frame_count() < self.scheduled_frames
    }

    /// Visual duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.fps.frames_to_secs(self.frame_count())
    }
}

/// Turns (image, audio) pairs into segments by pulling frames from the run's cursor.
#[derive(Clone, Copy, Debug)]
pub struct SegmentBuilder {
    pad_seconds: f64,
}

impl Default for SegmentBuilder {
    fn default() -> Self {
        Self {
            pad_seconds: DEFAULT_PAD_SECONDS,
        }
    }
}

impl SegmentBuilder {
    /// Builder that keeps each still on screen `pad_seconds` past its narration.
    pub fn new(pad_seconds: f64) -> MontageResult<Self> {
        check_pad(pad_seconds)?;
        Ok(Self { pad_seconds })
    }

    /// Pad applied after each clip.
    pub fn pad_seconds(&self) -> f64 {
        self.pad_seconds
    }

    /// Frames a segment for `audio` should span at `fps`.
    pub fn schedule(&self, audio: &AudioAsset, fps: Fps) -> MontageResult<u64> {
        frame_count(audio.duration_sec, fps.as_f64(), self.pad_seconds)
    }

    /// Build a fully materialized segment.
    ///
    /// Stops early, keeping the frames produced so far, when the cursor runs out. `image` is
    /// dropped once compositing is done.
    pub fn build(
        &self,
        index: usize,
        image: ImageAsset,
        audio: AudioAsset,
        cursor: &mut BackgroundCursor,
    ) -> MontageResult<Segment> {
        let scheduled_frames = self.schedule(&audio, cursor.fps())?;
        let mut frames = Vec::with_capacity(scheduled_frames.min(1 << 16) as usize);
        self.composite_run(index, image, scheduled_frames, cursor, |frame| {
            frames.push(frame);
            Ok(())
        })?;
        Ok(Segment {
            index,
            frames,
            audio,
            fps: cursor.fps(),
            scheduled_frames,
        })
    }

    /// Composite the segment for `audio` and hand each frame to `emit` instead of buffering.
    ///
    /// Returns `(scheduled, emitted)` frame counts.
    pub fn stream(
        &self,
        index: usize,
        image: ImageAsset,
        audio: &AudioAsset,
        cursor: &mut BackgroundCursor,
        emit: impl FnMut(FrameBuffer) -> MontageResult<()>,
    ) -> MontageResult<(u64, u64)> {
        let scheduled_frames = self.schedule(audio, cursor.fps())?;
        let emitted = self.composite_run(index, image, scheduled_frames, cursor, emit)?;
        Ok((scheduled_frames, emitted))
    }

    #[tracing::instrument(level = "debug", skip(self, image, cursor, emit))]
    fn composite_run(
        &self,
        index: usize,
        image: ImageAsset,
        scheduled_frames: u64,
        cursor: &mut BackgroundCursor,
        mut emit: impl FnMut(FrameBuffer) -> MontageResult<()>,
    ) -> MontageResult<u64> {
        // Reject before touching the cursor so a failed pair does not consume background.
        check_fits(cursor.width(), cursor.height(), &image)?;
        tracing::info!(index, frames = scheduled_frames, "creating segment");

        let mut emitted = 0u64;
        while emitted < scheduled_frames {
            let Some(mut frame) = cursor.next_frame()? else {
                tracing::warn!(
                    index,
                    emitted,
                    scheduled = scheduled_frames,
                    "segment truncated by background exhaustion"
                );
                break;
            };
            composite_in_place(&mut frame, &image)?;
            emit(frame)?;
            emitted += 1;
        }
        drop(image);
        Ok(emitted)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/segment/builder.rs"]
mod tests;

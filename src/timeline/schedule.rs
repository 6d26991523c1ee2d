use crate::foundation::error::{MontageError, MontageResult};

/// Seconds a still lingers after its narration ends.
pub const DEFAULT_PAD_SECONDS: f64 = 2.0;

/// Number of background frames a segment spans: `floor((audio_duration + pad) * fps)`.
pub fn frame_count(audio_duration: f64, fps: f64, pad: f64) -> MontageResult<u64> {
    if !audio_duration.is_finite() || audio_duration < 0.0 {
        return Err(MontageError::invalid_argument(format!(
            "audio duration must be a finite value >= 0, got {audio_duration}"
        )));
    }
    if !fps.is_finite() || fps <= 0.0 {
        return Err(MontageError::invalid_argument(format!(
            "fps must be a finite value > 0, got {fps}"
        )));
    }
    check_pad(pad)?;
    Ok(((audio_duration + pad) * fps).floor() as u64)
}

/// Total run length the background must cover: `sum(durations) + n * pad`.
pub fn total_audio_secs(durations: &[f64], pad: f64) -> f64 {
    durations.iter().sum::<f64>() + durations.len() as f64 * pad
}

pub(crate) fn check_pad(pad: f64) -> MontageResult<()> {
    if !pad.is_finite() || pad < 0.0 {
        return Err(MontageError::invalid_argument(format!(
            "pad must be a finite value >= 0, got {pad}"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/schedule.rs"]
mod tests;

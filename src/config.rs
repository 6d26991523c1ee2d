use std::path::Path;

use anyhow::Context as _;

use crate::foundation::error::{MontageError, MontageResult};
use crate::timeline::schedule::{DEFAULT_PAD_SECONDS, check_pad};

/// How composited frames travel from the segment builder to the encoder.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Buffering {
    #[default]
    /// Materialize each segment's frames before handing the run to the assembler.
    Segment,
    /// Stream frames through a bounded channel to an encoder thread.
    Streaming {
        /// Frames that may be queued ahead of the encoder.
        channel_capacity: usize,
    },
}

/// Options recognized by an assembly run.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssemblyConfig {
    /// Seconds each still lingers after its narration ends.
    pub pad_seconds: f64,
    /// Seed for the background start offset; `None` draws from the thread RNG.
    pub seed: Option<u64>,
    /// Frame buffering strategy.
    pub buffering: Buffering,
    /// Replace an existing file at the output path.
    pub overwrite: bool,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            pad_seconds: DEFAULT_PAD_SECONDS,
            seed: None,
            buffering: Buffering::Segment,
            overwrite: true,
        }
    }
}

impl AssemblyConfig {
    /// Check option ranges.
    pub fn validate(&self) -> MontageResult<()> {
        check_pad(self.pad_seconds)?;
        if let Buffering::Streaming { channel_capacity } = self.buffering
            && channel_capacity == 0
        {
            return Err(MontageError::invalid_argument(
                "streaming channel_capacity must be > 0",
            ));
        }
        Ok(())
    }

    /// Load and validate a JSON config file. Missing fields take their defaults.
    pub fn from_json_path(path: &Path) -> MontageResult<Self> {
        if !path.exists() {
            return Err(MontageError::not_found(path));
        }
        let bytes =
            std::fs::read(path).with_context(|| format!("read config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_slice(&bytes).map_err(|e| {
            MontageError::invalid_argument(format!("config '{}': {e}", path.display()))
        })?;
        cfg.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;

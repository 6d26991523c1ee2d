use std::path::PathBuf;

/// Convenience result type used across montage.
pub type MontageResult<T> = Result<T, MontageError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum MontageError {
    /// A background, image or audio file does not exist.
    #[error("not found: '{}'", .0.display())]
    NotFound(PathBuf),

    /// Corrupt or unsupported media, or headers that could not be read.
    #[error("decode error: {0}")]
    Decode(String),

    /// Foreground image does not fit inside the background frame.
    #[error("geometry error: {0}")]
    Geometry(String),

    /// Output could not be encoded or written.
    #[error("encode error: {0}")]
    Encode(String),

    /// Caller-provided value outside its valid domain.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Pair-local failure, tagged with the index of the (image, audio) pair.
    #[error("pair {index}: {source}")]
    Pair {
        /// 0-based index into the input pair list.
        index: usize,
        /// Underlying failure.
        #[source]
        source: Box<MontageError>,
    },

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MontageError {
    /// Build a [`MontageError::NotFound`] value.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound(path.into())
    }

    /// Build a [`MontageError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`MontageError::Geometry`] value.
    pub fn geometry(msg: impl Into<String>) -> Self {
        Self::Geometry(msg.into())
    }

    /// Build a [`MontageError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`MontageError::InvalidArgument`] value.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Attach the pair index to a pair-local failure.
    ///
    /// Already-tagged errors are returned unchanged.
    pub fn for_pair(self, index: usize) -> Self {
        match self {
            Self::Pair { .. } => self,
            other => Self::Pair {
                index,
                source: Box::new(other),
            },
        }
    }

    /// Index of the failing pair, if this error is pair-local.
    pub fn pair_index(&self) -> Option<usize> {
        match self {
            Self::Pair { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// Return `true` when the error ends the whole run regardless of pair policy.
    ///
    /// Pair-tagged errors are never run-fatal; the caller's policy decides whether to skip or
    /// abort.
    pub fn is_run_fatal(&self) -> bool {
        !matches!(self, Self::Pair { .. })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;

//! Encoding sinks.
//!
//! Sinks consume composited frames in output order; the assembler drives them.

/// `ffmpeg`-based sinks and helpers (MP4 output via system `ffmpeg`).
pub mod ffmpeg;
/// Generic frame sink trait and built-in sinks.
pub mod sink;

/// Still-image decoding into straight-alpha foreground assets.
pub(crate) mod decode;
/// `ffprobe`/`ffmpeg`-backed probing and audio decoding.
pub(crate) mod media;

/// Building one composited segment per (image, audio) pair.
pub(crate) mod builder;

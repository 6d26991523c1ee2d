/// Sequential background frame supply shared by all segments of a run.
pub(crate) mod cursor;
/// Frame-count scheduling from audio duration.
pub(crate) mod schedule;

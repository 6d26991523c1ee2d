/// Per-segment audio assets and their concatenation into one output track.
pub(crate) mod track;

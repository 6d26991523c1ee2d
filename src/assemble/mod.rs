/// Concatenation of segments into one muxed output file.
pub(crate) mod assembler;
/// Run driver: probing, scheduling, building and assembling one request.
pub(crate) mod run;

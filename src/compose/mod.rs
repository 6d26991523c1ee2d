/// Centered alpha compositing of a still over a background frame.
pub(crate) mod composite;

// Document generation: background task pipeline and renderer hand-off.
// Outline construction lives in crate::outline; this module only drives it.

pub mod pipeline;
pub mod render;

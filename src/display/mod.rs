pub mod buffer;

pub use buffer::{beat_marker, DisplayBuffer, DOWNBEAT_SUFFIX};

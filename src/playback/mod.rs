//! Transport state shared by both front ends

pub mod state;
pub mod tempo;

pub use state::{Controls, PlaybackAction, PlaybackState, PlaybackStateMachine, TransitionError};
pub use tempo::TempoStep;

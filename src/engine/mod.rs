//! Beat engine - the clock that produces ticks and clicks
//!
//! Front ends only talk to the `Engine` trait. `Gnome` is the implementation
//! shipped with the crate: a clock thread that calls the beat callback once
//! per beat and sends a click to a `ClickSink` for every hit beat.

pub mod click;
pub mod clock;
pub mod output;

use std::sync::Arc;

use thiserror::Error;

use crate::beat::TickFilter;
use crate::meter::TimeSignature;

pub use click::{Click, ClickVoice, Sound};
pub use clock::Gnome;
#[cfg(feature = "audio")]
pub use output::AudioOutput;
pub use output::{ClickSink, Silent};

/// Per-beat callback, invoked on the engine's clock thread with the 1-based
/// beat number
pub type BeatCallback = Box<dyn FnMut(u32) + Send>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("tick filter must not be nil")]
    NilTickFilter,
    #[error("engine has been closed")]
    Closed,
    #[error("failed to spawn clock thread")]
    Spawn(#[from] std::io::Error),
    #[error("no default output device available")]
    NoOutputDevice,
    #[cfg(feature = "audio")]
    #[error("failed to fetch default output config")]
    OutputConfig(#[from] cpal::DefaultStreamConfigError),
    #[cfg(feature = "audio")]
    #[error("failed to build output stream")]
    BuildStream(#[from] cpal::BuildStreamError),
    #[cfg(feature = "audio")]
    #[error("failed to start output stream")]
    PlayStream(#[from] cpal::PlayStreamError),
}

/// Operations a front end needs from a metronome engine
pub trait Engine {
    /// Begin producing beats from beat 1
    fn start(&mut self) -> Result<(), EngineError>;

    /// Stop producing beats. The engine can be restarted.
    fn stop(&mut self);

    /// Hold the clock where it is
    fn pause(&mut self);

    /// Continue after a pause, first beat one interval from now
    fn resume(&mut self);

    /// Start again after a stop
    fn restart(&mut self) -> Result<(), EngineError>;

    /// Apply a new tempo (already committed to the signature's counter)
    fn change(&mut self, tempo: i32);

    fn set_muted(&mut self, muted: bool);

    fn set_panned(&mut self, panned: bool);

    /// Stop for good and drop the beat callback
    fn close(&mut self);

    fn is_paused(&self) -> bool;

    /// The shared meter and tempo
    fn signature(&self) -> &Arc<TimeSignature>;

    /// Replace the hit-beat predicate. `None` is refused.
    fn set_tick_filter(&mut self, filter: Option<TickFilter>) -> Result<(), EngineError>;
}

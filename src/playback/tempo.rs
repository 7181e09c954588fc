//! Tempo stepping with a floor
//!
//! The tempo lives in the shared TimeSignature as an atomic counter. A step
//! adds the delta first and checks the result afterwards; if the result is
//! not a usable tempo the same delta is added back, leaving the counter where
//! it started.

use crate::meter::TimeSignature;

/// Up/down tempo buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TempoStep {
    delta: i32,
}

impl TempoStep {
    pub fn new(delta: i32) -> Self {
        Self { delta }
    }

    pub fn delta(&self) -> i32 {
        self.delta
    }

    /// Raise the tempo by one step. Returns the committed BPM.
    pub fn up(&self, signature: &TimeSignature) -> Option<i32> {
        self.step(signature, self.delta)
    }

    /// Lower the tempo by one step. Returns `None` (and leaves the tempo
    /// untouched) if that would reach zero or below.
    pub fn down(&self, signature: &TimeSignature) -> Option<i32> {
        self.step(signature, -self.delta)
    }

    fn step(&self, signature: &TimeSignature, delta: i32) -> Option<i32> {
        let new = signature.add_tempo(delta);
        if new <= 0 {
            // Compensate; also catches wrap-around at i32::MAX
            signature.add_tempo(-delta);
            tracing::debug!(delta, tempo = signature.tempo(), "tempo step rejected");
            return None;
        }
        Some(new)
    }
}

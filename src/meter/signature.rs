use std::fmt;
use std::sync::atomic::{AtomicI32, AtomicU8, Ordering};
use std::time::Duration;

use thiserror::Error;

/*
Time Signature
==============

The meter is shared between the UI thread (which edits it) and the clock
thread (which reads it once per beat), so every field is an atomic rather
than a plain integer.

  beats       Number of beats per measure (numerator). The clock re-reads
              this on every tick, so a meter change lands on the next beat.

  note_value  The note value that gets one beat (denominator: 4 = quarter,
              8 = eighth). Display only; the tempo is always counted in
              beats per minute of whatever note gets the beat.

  tempo       Beats per minute. Mutated through add_tempo(), which returns
              the new value so callers can check it and compensate.

Text form is "N/D" on input and "N/D @ T bpm" on output.
*/

/// Reasons a time signature string can be rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("expected \"beats/note\", got {0:?}")]
    Malformed(String),
    #[error("beats per measure must be at least 1, got {0}")]
    NoBeats(i32),
    #[error("note value must be a power of two between 1 and 32, got {0}")]
    BadNoteValue(i32),
}

/// Shared, lock-free time signature and tempo
#[derive(Debug)]
pub struct TimeSignature {
    beats: AtomicI32,
    note_value: AtomicU8,
    tempo: AtomicI32,
}

impl TimeSignature {
    /// Create a new time signature
    pub fn new(beats: i32, note_value: u8, tempo: i32) -> Self {
        Self {
            beats: AtomicI32::new(beats),
            note_value: AtomicU8::new(note_value),
            tempo: AtomicI32::new(tempo),
        }
    }

    /// Beats per measure
    pub fn beats(&self) -> i32 {
        self.beats.load(Ordering::Acquire)
    }

    /// Note value that gets one beat
    pub fn note_value(&self) -> u8 {
        self.note_value.load(Ordering::Acquire)
    }

    /// Current tempo in BPM
    pub fn tempo(&self) -> i32 {
        self.tempo.load(Ordering::Acquire)
    }

    /// Atomically add `delta` to the tempo and return the new value.
    ///
    /// No guard is applied here; callers that need a floor check the
    /// returned value and add the delta back.
    pub fn add_tempo(&self, delta: i32) -> i32 {
        self.tempo.fetch_add(delta, Ordering::AcqRel).wrapping_add(delta)
    }

    /// Overwrite the tempo
    pub fn set_tempo(&self, tempo: i32) {
        self.tempo.store(tempo, Ordering::Release);
    }

    /// Duration of one beat at the current tempo (60s / BPM).
    ///
    /// A non-positive tempo never reaches the clock, but if it did we fall
    /// back to one beat per second rather than dividing by zero.
    pub fn tempo_to_duration(&self) -> Duration {
        let tempo = self.tempo();
        if tempo <= 0 {
            return Duration::from_secs(1);
        }
        Duration::from_secs(60) / tempo as u32
    }

    /// Parse "N/D" and, if valid, replace beats and note value.
    ///
    /// The tempo is untouched. On error nothing changes.
    pub fn from_str(&self, text: &str) -> Result<(), SignatureError> {
        let (beats, note_value) = parse_signature(text)?;
        self.beats.store(beats, Ordering::Release);
        self.note_value.store(note_value, Ordering::Release);
        Ok(())
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} @ {} bpm",
            self.beats(),
            self.note_value(),
            self.tempo()
        )
    }
}

fn parse_signature(text: &str) -> Result<(i32, u8), SignatureError> {
    let malformed = || SignatureError::Malformed(text.to_string());

    let (beats, note_value) = text.trim().split_once('/').ok_or_else(malformed)?;
    let beats: i32 = beats.trim().parse().map_err(|_| malformed())?;
    let note_value: i32 = note_value.trim().parse().map_err(|_| malformed())?;

    if beats < 1 {
        return Err(SignatureError::NoBeats(beats));
    }
    if !(1..=32).contains(&note_value) || (note_value & (note_value - 1)) != 0 {
        return Err(SignatureError::BadNoteValue(note_value));
    }

    Ok((beats, note_value as u8))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_four_four_display() {
        let ts = TimeSignature::new(4, 4, 60);
        assert_eq!(ts.to_string(), "4/4 @ 60 bpm");
    }

    #[test]
    fn test_tempo_to_duration() {
        let ts = TimeSignature::new(4, 4, 60);
        assert_eq!(ts.tempo_to_duration(), Duration::from_secs(1));

        ts.set_tempo(120);
        assert_eq!(ts.tempo_to_duration(), Duration::from_millis(500));

        ts.set_tempo(0);
        assert_eq!(ts.tempo_to_duration(), Duration::from_secs(1));
    }

    #[test]
    fn test_add_tempo_returns_new_value() {
        let ts = TimeSignature::new(4, 4, 60);
        assert_eq!(ts.add_tempo(10), 70);
        assert_eq!(ts.add_tempo(-30), 40);
        assert_eq!(ts.tempo(), 40);
    }

    #[test]
    fn test_from_str_six_eight() {
        let ts = TimeSignature::new(4, 4, 90);
        ts.from_str("6/8").unwrap();
        assert_eq!(ts.beats(), 6);
        assert_eq!(ts.note_value(), 8);
        // Tempo survives a meter change
        assert_eq!(ts.tempo(), 90);
    }

    #[test]
    fn test_from_str_tolerates_whitespace() {
        let ts = TimeSignature::new(4, 4, 60);
        ts.from_str(" 3 / 4 ").unwrap();
        assert_eq!(ts.beats(), 3);
    }

    #[test]
    fn test_from_str_rejects_garbage() {
        let ts = TimeSignature::new(4, 4, 60);

        assert!(matches!(ts.from_str("four"), Err(SignatureError::Malformed(_))));
        assert!(matches!(ts.from_str("4/x"), Err(SignatureError::Malformed(_))));
        assert_eq!(ts.from_str("0/4"), Err(SignatureError::NoBeats(0)));
        assert_eq!(ts.from_str("4/3"), Err(SignatureError::BadNoteValue(3)));
        assert_eq!(ts.from_str("4/64"), Err(SignatureError::BadNoteValue(64)));

        // Nothing changed
        assert_eq!(ts.beats(), 4);
        assert_eq!(ts.note_value(), 4);
    }
}

//! Startup settings shared by both front ends

use thiserror::Error;

use crate::engine::Sound;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("tempo must be positive, got {0}")]
    Tempo(i32),
    #[error("tempo delta must be positive, got {0}")]
    Delta(i32),
    #[error("beats per measure must be positive, got {0}")]
    Beats(i32),
}

/// Session settings, built up like
/// `SessionConfig::new().tempo(90).beats(3)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Starting tempo in BPM
    pub tempo: i32,
    /// BPM step for the up/down controls
    pub delta: i32,
    /// Starting beats per measure (the note value is always 4)
    pub beats: i32,
    /// Click sound
    pub sound: Sound,
}

impl SessionConfig {
    pub fn new() -> Self {
        Self {
            tempo: 60,
            delta: 10,
            beats: 4,
            sound: Sound::Woodblock,
        }
    }

    pub fn tempo(mut self, tempo: i32) -> Self {
        self.tempo = tempo;
        self
    }

    pub fn delta(mut self, delta: i32) -> Self {
        self.delta = delta;
        self
    }

    pub fn beats(mut self, beats: i32) -> Self {
        self.beats = beats;
        self
    }

    pub fn sound(mut self, sound: Sound) -> Self {
        self.sound = sound;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tempo <= 0 {
            return Err(ConfigError::Tempo(self.tempo));
        }
        if self.delta <= 0 {
            return Err(ConfigError::Delta(self.delta));
        }
        if self.beats <= 0 {
            return Err(ConfigError::Beats(self.beats));
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}

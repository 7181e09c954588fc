use std::f32::consts::{FRAC_PI_4, TAU};
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
Click Voice
===========

A metronome click is a very short percussive burst: a sharp onset and an
exponential decay, with no sustain. Two timbres are offered:

  Woodblock   Sine at a fixed pitch. Accented beats sound a fourth higher.
              Sound: "tock", hollow and woody.

  Maracas     White noise from a xorshift generator. Accented beats are
              louder rather than higher.
              Sound: "tss", a dry shaker.

Decay
-----

Each sample the level is multiplied by a constant:

    decay = exp(-1 / (tau * sample_rate))

After `tau` seconds the level has fallen to 1/e (~37%), after 5 * tau it is
below 1% and the voice goes idle.

Panning
-------

Equal-power pan law, pan in [-1, 1]:

    left  = cos((pan + 1) * PI/4)
    right = sin((pan + 1) * PI/4)

At pan = 0 both sides get ~0.707 so the perceived loudness stays constant.
*/

/// Level below which the voice counts as finished
const SILENCE: f32 = 1.0e-4;

/// Which sound the click makes
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sound {
    #[default]
    Woodblock,
    Maracas,
}

impl Sound {
    pub const ALL: [Sound; 2] = [Sound::Woodblock, Sound::Maracas];

    pub fn name(&self) -> &'static str {
        match self {
            Sound::Woodblock => "Woodblock",
            Sound::Maracas => "Maracas",
        }
    }

    /// Decay time constant in seconds
    fn tau(&self) -> f32 {
        match self {
            Sound::Woodblock => 0.015,
            Sound::Maracas => 0.02,
        }
    }
}

impl fmt::Display for Sound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Sound {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Sound::ALL
            .into_iter()
            .find(|sound| sound.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let names: Vec<&str> = Sound::ALL.iter().map(Sound::name).collect();
                format!("unknown sound {:?}, expected one of {}", s, names.join(", "))
            })
    }
}

/// One click request, sent from the clock thread to the audio thread
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Click {
    /// First beat of the measure
    pub accent: bool,
    /// Stereo position, -1 (left) to 1 (right)
    pub pan: f32,
}

/// Monophonic click generator
pub struct ClickVoice {
    sound: Sound,
    sample_rate: f32,
    phase: f32,
    frequency: f32,
    level: f32,
    decay: f32,
    gain_left: f32,
    gain_right: f32,
    noise: u32,
}

impl ClickVoice {
    const WOODBLOCK_HZ: f32 = 1800.0;
    const ACCENT_RATIO: f32 = 4.0 / 3.0;

    pub fn new(sound: Sound, sample_rate: f32) -> Self {
        let (gain_left, gain_right) = pan_gains(0.0);
        Self {
            sound,
            sample_rate,
            phase: 0.0,
            frequency: Self::WOODBLOCK_HZ,
            level: 0.0,
            decay: (-1.0 / (sound.tau() * sample_rate)).exp(),
            gain_left,
            gain_right,
            noise: 0x9E37_79B9,
        }
    }

    pub fn sound(&self) -> Sound {
        self.sound
    }

    /// Start a click, cutting off any click still ringing
    pub fn trigger(&mut self, click: Click) {
        self.phase = 0.0;
        self.frequency = if click.accent {
            Self::WOODBLOCK_HZ * Self::ACCENT_RATIO
        } else {
            Self::WOODBLOCK_HZ
        };
        self.level = match (self.sound, click.accent) {
            (_, true) => 1.0,
            (Sound::Woodblock, false) => 0.8,
            (Sound::Maracas, false) => 0.6,
        };
        (self.gain_left, self.gain_right) = pan_gains(click.pan);
    }

    pub fn is_active(&self) -> bool {
        self.level > SILENCE
    }

    /// Next mono sample
    pub fn next_sample(&mut self) -> f32 {
        if !self.is_active() {
            return 0.0;
        }

        let raw = match self.sound {
            Sound::Woodblock => {
                let s = (self.phase * TAU).sin();
                self.phase = (self.phase + self.frequency / self.sample_rate).fract();
                s
            }
            Sound::Maracas => self.next_noise(),
        };

        let out = raw * self.level;
        self.level *= self.decay;
        out
    }

    /// Fill an interleaved buffer. Stereo and wider outputs get the pan
    /// applied to the first two channels; extra channels get the mono signal.
    pub fn render_interleaved(&mut self, out: &mut [f32], channels: usize) {
        if channels == 0 {
            return;
        }

        for frame in out.chunks_mut(channels) {
            let s = self.next_sample();
            match frame {
                [mono] => *mono = s,
                [left, right, rest @ ..] => {
                    *left = s * self.gain_left;
                    *right = s * self.gain_right;
                    rest.fill(s);
                }
                [] => {}
            }
        }
    }

    /// White noise in [-1, 1) (xorshift32)
    fn next_noise(&mut self) -> f32 {
        let mut x = self.noise;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.noise = x;
        (x as f32 / u32::MAX as f32) * 2.0 - 1.0
    }
}

/// Equal-power gains for a pan position
fn pan_gains(pan: f32) -> (f32, f32) {
    let angle = (pan.clamp(-1.0, 1.0) + 1.0) * FRAC_PI_4;
    (angle.cos(), angle.sin())
}

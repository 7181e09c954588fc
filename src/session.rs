//! Session - everything one front end needs, in one place
//!
//! A session owns the engine, the shared time signature, the playback state
//! machine, the drift tracker and the toggles. It lives on the UI thread and
//! is the only thing that mutates any of them; the clock thread only ever
//! sees the signature (read-only atomics) and the relay's producer half.
//!
//! Every control action runs to completion before returning.

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use crate::beat::{default_spec, BeatFilter, BeatFilterSpec};
use crate::config::{ConfigError, SessionConfig};
use crate::engine::{Engine, EngineError, Gnome, Silent};
use crate::meter::TimeSignature;
use crate::playback::{Controls, PlaybackState, PlaybackStateMachine, TempoStep, TransitionError};
use crate::relay::{RelayError, TickEvent, TickReceiver, TickRelay, DEFAULT_RELAY_CAPACITY};
use crate::timing::{DriftSample, DriftTracker};

#[derive(Debug, Error)]
pub enum SessionError {
    /// User-facing; the parse error behind it is only logged
    #[error("Invalid Signature")]
    InvalidSignature,
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Relay(#[from] RelayError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Where clicks go when the session builds its own engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    /// Default audio device
    #[cfg(feature = "audio")]
    Audio,
    /// No sound, ticks only
    Silent,
}

pub struct Session {
    engine: Box<dyn Engine>,
    signature: Arc<TimeSignature>,
    machine: PlaybackStateMachine,
    drift: DriftTracker,
    tempo: TempoStep,
    hit_beats: BeatFilterSpec,
    muted: bool,
    panned: bool,
}

impl Session {
    /// Wrap an engine. The hit-beat filter is seeded with every beat of the
    /// engine's current measure.
    pub fn new(mut engine: Box<dyn Engine>, delta: i32) -> Result<Self, SessionError> {
        let signature = Arc::clone(engine.signature());
        let hit_beats = BeatFilterSpec::default_for(signature.beats().max(0) as u32);
        let filter = BeatFilter::compile(hit_beats.as_str());
        engine.set_tick_filter(Some(filter.into_tick_filter()))?;

        Ok(Self {
            engine,
            signature,
            machine: PlaybackStateMachine::new(),
            drift: DriftTracker::new(Instant::now()),
            tempo: TempoStep::new(delta),
            hit_beats,
            muted: false,
            panned: false,
        })
    }

    /// Build the whole pipeline: signature, relay, `Gnome` engine, session.
    ///
    /// Returns the session and the receiving end of the relay for the
    /// renderer loop. Any failure here is a setup failure.
    pub fn connect(
        config: &SessionConfig,
        output: Output,
    ) -> Result<(Self, TickReceiver), SessionError> {
        config.validate()?;

        let signature = Arc::new(TimeSignature::new(config.beats, 4, config.tempo));
        let (notifier, receiver) =
            TickRelay::new(DEFAULT_RELAY_CAPACITY, Arc::clone(&signature))?;
        let callback = notifier.into_callback();

        let engine: Box<dyn Engine> = match output {
            #[cfg(feature = "audio")]
            Output::Audio => Box::new(Gnome::with_audio(signature, config.sound, callback)?),
            Output::Silent => Box::new(Gnome::new(signature, callback, Box::new(Silent))),
        };

        Ok((Self::new(engine, config.delta)?, receiver))
    }

    pub fn signature(&self) -> &Arc<TimeSignature> {
        &self.signature
    }

    pub fn state(&self) -> PlaybackState {
        self.machine.state()
    }

    pub fn controls(&self) -> Controls {
        self.machine.controls()
    }

    /// First launch
    pub fn start(&mut self, now: Instant) -> Result<PlaybackState, SessionError> {
        let mut next = self.machine.clone();
        next.start()?;
        self.engine.start()?;
        self.machine = next;
        self.drift.reset(now);
        Ok(self.machine.state())
    }

    pub fn pause(&mut self) -> Result<PlaybackState, SessionError> {
        let state = self.machine.pause()?;
        self.engine.pause();
        self.drift.freeze();
        Ok(state)
    }

    /// Resume re-anchors drift at `now` so the pause is not counted
    pub fn resume(&mut self, now: Instant) -> Result<PlaybackState, SessionError> {
        let state = self.machine.resume()?;
        self.engine.resume();
        self.drift.reset(now);
        Ok(state)
    }

    /// The pause button
    pub fn toggle_pause(&mut self, now: Instant) -> Result<PlaybackState, SessionError> {
        match self.machine.state() {
            PlaybackState::Paused => self.resume(now),
            _ => self.pause(),
        }
    }

    pub fn stop(&mut self) -> Result<PlaybackState, SessionError> {
        let state = self.machine.stop()?;
        self.engine.stop();
        self.drift.freeze();
        Ok(state)
    }

    /// Leave Stopped after the first run
    pub fn restart(&mut self, now: Instant) -> Result<PlaybackState, SessionError> {
        let mut next = self.machine.clone();
        next.restart()?;
        self.engine.restart()?;
        self.machine = next;
        self.drift.reset(now);
        Ok(self.machine.state())
    }

    /// One tempo step up. Returns the new BPM if it was committed.
    pub fn tempo_up(&mut self) -> Option<i32> {
        let tempo = self.tempo.up(&self.signature)?;
        self.engine.change(tempo);
        Some(tempo)
    }

    /// One tempo step down. A step that would reach zero is undone and
    /// returns `None`.
    pub fn tempo_down(&mut self) -> Option<i32> {
        let tempo = self.tempo.down(&self.signature)?;
        self.engine.change(tempo);
        Some(tempo)
    }

    pub fn tempo_delta(&self) -> i32 {
        self.tempo.delta()
    }

    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        self.engine.set_muted(self.muted);
        self.muted
    }

    pub fn toggle_pan(&mut self) -> bool {
        self.panned = !self.panned;
        self.engine.set_panned(self.panned);
        self.panned
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn is_panned(&self) -> bool {
        self.panned
    }

    pub fn mute_label(&self) -> &'static str {
        if self.muted {
            "Unmute"
        } else {
            "Mute"
        }
    }

    pub fn pan_label(&self) -> &'static str {
        if self.panned {
            "Unpan"
        } else {
            "Pan"
        }
    }

    /// Parse "N/D" into the shared signature and reseed the hit beats with
    /// every beat of the new measure.
    pub fn set_signature(&mut self, text: &str) -> Result<&BeatFilterSpec, SessionError> {
        if let Err(err) = self.signature.from_str(text) {
            tracing::debug!(%err, text, "rejected time signature");
            return Err(SessionError::InvalidSignature);
        }

        let measure = self.signature.beats().max(0) as u32;
        self.set_hit_beats(&default_spec(measure))?;
        Ok(&self.hit_beats)
    }

    /// Replace the hit-beat selection
    pub fn set_hit_beats(&mut self, text: &str) -> Result<(), SessionError> {
        let filter = BeatFilter::compile(text);
        self.engine.set_tick_filter(Some(filter.clone().into_tick_filter()))?;
        self.hit_beats = filter.spec().clone();
        Ok(())
    }

    pub fn hit_beats(&self) -> &BeatFilterSpec {
        &self.hit_beats
    }

    /// Feed a delivered tick to the drift tracker. Ticks that arrive while
    /// not running (still in flight when pausing or stopping) are ignored.
    pub fn record_tick(&mut self, event: &TickEvent) -> Option<DriftSample> {
        if !self.machine.is_running() {
            return None;
        }
        self.drift
            .record(event.emitted_at, self.signature.tempo_to_duration())
    }

    pub fn last_drift(&self) -> Option<DriftSample> {
        self.drift.last()
    }

    pub fn engine_is_paused(&self) -> bool {
        self.engine.is_paused()
    }

    /// Stop the engine for good. The relay closes once its last event is read.
    pub fn close(&mut self) {
        self.engine.close();
    }
}

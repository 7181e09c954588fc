//! Gnome - clock-thread metronome engine
//!
//! Starting the engine moves the beat callback and the click sink into a
//! dedicated clock thread. The thread sleeps until the next beat deadline on
//! its command channel, so pause, stop and tempo changes wake it at once.
//! Stopping joins the thread and takes the callback and sink back, which is
//! what lets stop/restart reuse them. Closing drops them for good; dropping
//! the callback is what tells a tick relay that no more beats are coming.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use crate::beat::{BeatFilter, TickFilter};
use crate::meter::TimeSignature;

use super::click::Click;
#[cfg(feature = "audio")]
use super::{click::Sound, output::AudioOutput};
use super::{BeatCallback, ClickSink, Engine, EngineError};

/// Commands sent from the UI thread to the clock thread
enum ClockCommand {
    Pause,
    Resume,
    /// Tempo changed: recompute the next deadline from the last beat
    Retime,
    SetFilter(TickFilter),
    Stop,
}

/// Mute and pan, read by the clock thread on every beat
#[derive(Debug, Default)]
struct OutputFlags {
    muted: AtomicBool,
    panned: AtomicBool,
}

/// What travels into the clock thread and back out again
struct ClockParts {
    callback: BeatCallback,
    sink: Box<dyn ClickSink>,
}

struct RunningClock {
    tx: Sender<ClockCommand>,
    handle: JoinHandle<ClockParts>,
}

/// Metronome engine driven by a clock thread
pub struct Gnome {
    signature: Arc<TimeSignature>,
    filter: TickFilter,
    flags: Arc<OutputFlags>,
    idle: Option<ClockParts>,
    running: Option<RunningClock>,
    paused: bool,
    #[cfg(feature = "audio")]
    output: Option<AudioOutput>,
}

impl Gnome {
    /// Create an engine that calls `callback` on every beat and sends hit
    /// beats to `sink`. Every beat is a hit until a filter is set.
    pub fn new(
        signature: Arc<TimeSignature>,
        callback: BeatCallback,
        sink: Box<dyn ClickSink>,
    ) -> Self {
        let measure = signature.beats().max(0) as u32;
        Self {
            filter: BeatFilter::every_beat(measure).into_tick_filter(),
            signature,
            flags: Arc::new(OutputFlags::default()),
            idle: Some(ClockParts { callback, sink }),
            running: None,
            paused: false,
            #[cfg(feature = "audio")]
            output: None,
        }
    }

    /// Create an engine that plays `sound` on the default output device
    #[cfg(feature = "audio")]
    pub fn with_audio(
        signature: Arc<TimeSignature>,
        sound: Sound,
        callback: BeatCallback,
    ) -> Result<Self, EngineError> {
        let (output, clicks) = AudioOutput::open(sound)?;
        let mut gnome = Self::new(signature, callback, Box::new(clicks));
        gnome.output = Some(output);
        Ok(gnome)
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.idle.is_none() && self.running.is_none()
    }

    fn send(&self, command: ClockCommand) {
        if let Some(running) = &self.running {
            // The clock only hangs up when it is stopping
            let _ = running.tx.send(command);
        }
    }
}

impl Engine for Gnome {
    fn start(&mut self) -> Result<(), EngineError> {
        if self.running.is_some() {
            return Ok(());
        }
        let parts = self.idle.take().ok_or(EngineError::Closed)?;

        let (tx, rx) = mpsc::channel();
        let clock = Clock {
            rx,
            signature: Arc::clone(&self.signature),
            filter: Arc::clone(&self.filter),
            flags: Arc::clone(&self.flags),
            parts,
        };
        let handle = std::thread::Builder::new()
            .name("metrognome-clock".into())
            .spawn(move || clock.run())?;

        self.running = Some(RunningClock { tx, handle });
        self.paused = false;
        tracing::info!(signature = %self.signature, "clock started");
        Ok(())
    }

    fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };

        let _ = running.tx.send(ClockCommand::Stop);
        match running.handle.join() {
            Ok(parts) => self.idle = Some(parts),
            Err(_) => tracing::error!("clock thread panicked; engine is unusable"),
        }
        self.paused = false;
        tracing::info!("clock stopped");
    }

    fn pause(&mut self) {
        if self.running.is_some() && !self.paused {
            self.send(ClockCommand::Pause);
            self.paused = true;
        }
    }

    fn resume(&mut self) {
        if self.paused {
            self.send(ClockCommand::Resume);
            self.paused = false;
        }
    }

    fn restart(&mut self) -> Result<(), EngineError> {
        self.stop();
        self.start()
    }

    fn change(&mut self, tempo: i32) {
        self.signature.set_tempo(tempo);
        self.send(ClockCommand::Retime);
    }

    fn set_muted(&mut self, muted: bool) {
        self.flags.muted.store(muted, Ordering::Relaxed);
    }

    fn set_panned(&mut self, panned: bool) {
        self.flags.panned.store(panned, Ordering::Relaxed);
    }

    fn close(&mut self) {
        self.stop();
        self.idle = None;
        #[cfg(feature = "audio")]
        {
            self.output = None;
        }
        tracing::info!("engine closed");
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn signature(&self) -> &Arc<TimeSignature> {
        &self.signature
    }

    fn set_tick_filter(&mut self, filter: Option<TickFilter>) -> Result<(), EngineError> {
        let filter = filter.ok_or(EngineError::NilTickFilter)?;
        self.filter = Arc::clone(&filter);
        self.send(ClockCommand::SetFilter(filter));
        Ok(())
    }
}

impl Drop for Gnome {
    fn drop(&mut self) {
        self.stop();
    }
}

/// State owned by the clock thread
struct Clock {
    rx: Receiver<ClockCommand>,
    signature: Arc<TimeSignature>,
    filter: TickFilter,
    flags: Arc<OutputFlags>,
    parts: ClockParts,
}

impl Clock {
    fn run(mut self) -> ClockParts {
        let mut beat = 0u32;
        let mut side = 1.0f32;
        let mut last = Instant::now();
        let mut deadline = last + self.signature.tempo_to_duration();

        loop {
            let wait = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(wait) {
                Err(RecvTimeoutError::Timeout) => {
                    let measure = self.signature.beats().max(1) as u32;
                    beat = if beat >= measure { 1 } else { beat + 1 };

                    if (self.filter)(beat) && !self.flags.muted.load(Ordering::Relaxed) {
                        // Panned clicks alternate hard left, hard right
                        let pan = if self.flags.panned.load(Ordering::Relaxed) {
                            side = -side;
                            side
                        } else {
                            0.0
                        };
                        self.parts.sink.play(Click {
                            accent: beat == 1,
                            pan,
                        });
                    }

                    tracing::trace!(beat, "tick");
                    (self.parts.callback)(beat);

                    last = deadline;
                    deadline += self.signature.tempo_to_duration();
                }
                Ok(ClockCommand::Retime) => {
                    deadline = last + self.signature.tempo_to_duration();
                }
                Ok(ClockCommand::SetFilter(filter)) => self.filter = filter,
                Ok(ClockCommand::Pause) => {
                    if !self.wait_for_resume() {
                        break;
                    }
                    last = Instant::now();
                    deadline = last + self.signature.tempo_to_duration();
                }
                Ok(ClockCommand::Resume) => {}
                Ok(ClockCommand::Stop) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        self.parts
    }

    /// Block until resumed. Returns false if told to stop instead.
    fn wait_for_resume(&mut self) -> bool {
        loop {
            match self.rx.recv() {
                Ok(ClockCommand::Resume) => return true,
                Ok(ClockCommand::SetFilter(filter)) => self.filter = filter,
                Ok(ClockCommand::Pause | ClockCommand::Retime) => {}
                Ok(ClockCommand::Stop) | Err(_) => return false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Silent;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Collects clicks so tests can inspect them
    #[derive(Clone, Default)]
    struct Collect(Arc<Mutex<Vec<Click>>>);

    impl ClickSink for Collect {
        fn play(&mut self, click: Click) {
            self.0.lock().unwrap().push(click);
        }
    }

    fn fast_signature() -> Arc<TimeSignature> {
        // 6000 bpm: one beat every 10ms
        Arc::new(TimeSignature::new(4, 4, 6000))
    }

    fn beat_log() -> (Arc<Mutex<Vec<u32>>>, BeatCallback) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        (log, Box::new(move |beat| sink.lock().unwrap().push(beat)))
    }

    #[test]
    fn test_beats_cycle_through_measure() {
        let (log, callback) = beat_log();
        let mut gnome = Gnome::new(fast_signature(), callback, Box::new(Silent));

        gnome.start().unwrap();
        std::thread::sleep(Duration::from_millis(120));
        gnome.stop();

        let beats = log.lock().unwrap().clone();
        assert!(beats.len() >= 3, "only {} beats", beats.len());
        for (i, beat) in beats.iter().enumerate() {
            assert_eq!(*beat, (i as u32 % 4) + 1);
        }
    }

    #[test]
    fn test_stop_then_restart_reuses_callback() {
        let (log, callback) = beat_log();
        let mut gnome = Gnome::new(fast_signature(), callback, Box::new(Silent));

        gnome.start().unwrap();
        std::thread::sleep(Duration::from_millis(40));
        gnome.stop();
        assert!(!gnome.is_running());

        let before = log.lock().unwrap().len();
        gnome.restart().unwrap();
        std::thread::sleep(Duration::from_millis(40));
        gnome.stop();

        let beats = log.lock().unwrap().clone();
        assert!(beats.len() > before);
        // Restart begins a fresh measure
        assert_eq!(beats[before], 1);
    }

    #[test]
    fn test_pause_holds_beats() {
        let (log, callback) = beat_log();
        let mut gnome = Gnome::new(fast_signature(), callback, Box::new(Silent));

        gnome.start().unwrap();
        std::thread::sleep(Duration::from_millis(40));
        gnome.pause();
        assert!(gnome.is_paused());
        std::thread::sleep(Duration::from_millis(15));

        let held = log.lock().unwrap().len();
        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(log.lock().unwrap().len(), held);

        gnome.resume();
        assert!(!gnome.is_paused());
        std::thread::sleep(Duration::from_millis(60));
        gnome.stop();
        assert!(log.lock().unwrap().len() > held);
    }

    #[test]
    fn test_filter_and_mute_gate_clicks() {
        let (_log, callback) = beat_log();
        let clicks = Collect::default();
        let mut gnome = Gnome::new(fast_signature(), callback, Box::new(clicks.clone()));

        assert!(matches!(
            gnome.set_tick_filter(None),
            Err(EngineError::NilTickFilter)
        ));
        gnome
            .set_tick_filter(Some(BeatFilter::compile("1").into_tick_filter()))
            .unwrap();

        gnome.start().unwrap();
        std::thread::sleep(Duration::from_millis(100));
        gnome.set_muted(true);
        std::thread::sleep(Duration::from_millis(15));
        let heard = clicks.0.lock().unwrap().len();
        std::thread::sleep(Duration::from_millis(60));
        gnome.stop();

        let clicks = clicks.0.lock().unwrap();
        assert!(!clicks.is_empty());
        // Only beat 1 was a hit, and beat 1 is accented
        assert!(clicks.iter().all(|c| c.accent));
        assert_eq!(clicks.len(), heard);
    }

    #[test]
    fn test_pan_alternates_sides() {
        let (_log, callback) = beat_log();
        let clicks = Collect::default();
        let mut gnome = Gnome::new(fast_signature(), callback, Box::new(clicks.clone()));
        gnome.set_panned(true);

        gnome.start().unwrap();
        std::thread::sleep(Duration::from_millis(60));
        gnome.stop();

        let clicks = clicks.0.lock().unwrap();
        assert!(clicks.len() >= 2);
        assert_eq!(clicks[0].pan, -1.0);
        assert_eq!(clicks[1].pan, 1.0);
    }

    #[test]
    fn test_close_drops_callback() {
        let (log, callback) = beat_log();
        let mut gnome = Gnome::new(fast_signature(), callback, Box::new(Silent));

        gnome.start().unwrap();
        gnome.close();
        assert!(gnome.is_closed());
        assert!(matches!(gnome.start(), Err(EngineError::Closed)));
        // Only the test's handle remains
        assert_eq!(Arc::strong_count(&log), 1);
    }
}

//! Tick relay - hands beat notifications from the clock thread to a renderer
//!
//! The engine calls the beat callback on its own timing thread. That thread
//! must never wait on the UI, so the callback only pushes a small `Copy`
//! event into a wait-free SPSC ring buffer (rtrb) and returns. The renderer
//! owns the other end and pulls events at its own pace.
//!
//! ```text
//!   clock thread                         renderer loop
//!   ────────────                         ─────────────
//!   callback(beat)                       try_next() / next_event()
//!     └─ TickNotifier::notify ──rtrb──▶ TickReceiver
//! ```
//!
//! If the renderer falls behind and the queue is full, the newest event is
//! dropped and counted. Events already queued keep their order, nothing is
//! ever duplicated, and the producer never blocks.
//!
//! Dropping the notifier (engine close) closes the relay. The receiver reports
//! that as `RelayClosed` once the queue is drained, so a consumer loop can
//! exit instead of waiting forever.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rtrb::{Consumer, Producer, RingBuffer};
use thiserror::Error;

use crate::engine::BeatCallback;
use crate::meter::TimeSignature;

/// Queue depth used by the front ends. A few beats of slack is plenty: at
/// 300 bpm a beat arrives every 200ms, while the TUI drains every 16ms.
pub const DEFAULT_RELAY_CAPACITY: usize = 4;

/// First sleep of a blocking receive. Each empty poll doubles it.
const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Longest sleep between polls: one 60fps frame
const MAX_POLL_INTERVAL: Duration = Duration::from_millis(16);

/// Sleep schedule for blocking receives: 1, 2, 4, 8, 16, 16, ... ms
#[derive(Debug)]
struct Backoff {
    next: Duration,
}

impl Backoff {
    fn new() -> Self {
        Self {
            next: POLL_INTERVAL,
        }
    }

    fn step(&mut self) -> Duration {
        let current = self.next;
        self.next = (current * 2).min(MAX_POLL_INTERVAL);
        current
    }
}

/// One beat, as seen by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickEvent {
    /// 1-based beat number within the measure
    pub beat: u32,
    /// True for the last beat of the measure (beat == beats per measure)
    pub is_downbeat: bool,
    /// When the clock thread emitted the beat
    pub emitted_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("tick relay needs room for at least one event")]
    ZeroCapacity,
}

/// The producer side is gone and every queued event has been consumed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("tick relay closed")]
pub struct RelayClosed;

/// Constructor for a connected notifier/receiver pair
pub struct TickRelay;

impl TickRelay {
    /// Create a relay holding up to `capacity` undelivered events.
    ///
    /// The signature supplies the measure length used to flag downbeats.
    pub fn new(
        capacity: usize,
        signature: Arc<TimeSignature>,
    ) -> Result<(TickNotifier, TickReceiver), RelayError> {
        if capacity == 0 {
            return Err(RelayError::ZeroCapacity);
        }

        let (tx, rx) = RingBuffer::<TickEvent>::new(capacity);
        let dropped = Arc::new(AtomicU64::new(0));

        let notifier = TickNotifier {
            tx,
            signature,
            dropped: Arc::clone(&dropped),
        };
        let receiver = TickReceiver {
            rx,
            dropped,
            reported: 0,
        };

        Ok((notifier, receiver))
    }
}

/// Producer half, owned by the engine's beat callback
pub struct TickNotifier {
    tx: Producer<TickEvent>,
    signature: Arc<TimeSignature>,
    dropped: Arc<AtomicU64>,
}

impl TickNotifier {
    /// Publish a beat. Never blocks and never allocates.
    pub fn notify(&mut self, beat: u32) {
        let measure = self.signature.beats();
        let event = TickEvent {
            beat,
            is_downbeat: measure > 0 && beat == measure as u32,
            emitted_at: Instant::now(),
        };

        if self.tx.push(event).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Wrap the notifier as the engine's per-beat callback
    pub fn into_callback(mut self) -> BeatCallback {
        Box::new(move |beat| self.notify(beat))
    }
}

/// Consumer half, owned by exactly one renderer loop
pub struct TickReceiver {
    rx: Consumer<TickEvent>,
    dropped: Arc<AtomicU64>,
    reported: u64,
}

impl TickReceiver {
    /// Take the next event if one is queued.
    ///
    /// `Ok(None)` means nothing yet; `Err(RelayClosed)` means nothing ever again.
    pub fn try_next(&mut self) -> Result<Option<TickEvent>, RelayClosed> {
        if let Ok(event) = self.rx.pop() {
            return Ok(Some(event));
        }

        if self.rx.is_abandoned() {
            // The producer may have pushed right before it was dropped
            return match self.rx.pop() {
                Ok(event) => Ok(Some(event)),
                Err(_) => Err(RelayClosed),
            };
        }

        Ok(None)
    }

    /// Wait for the next event. Returns `None` once the relay is closed.
    pub fn next_event(&mut self) -> Option<TickEvent> {
        let mut backoff = Backoff::new();
        loop {
            match self.try_next() {
                Ok(Some(event)) => return Some(event),
                Ok(None) => std::thread::sleep(backoff.step()),
                Err(RelayClosed) => return None,
            }
        }
    }

    /// Wait up to `timeout` for the next event
    pub fn next_event_timeout(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<TickEvent>, RelayClosed> {
        let deadline = Instant::now() + timeout;
        let mut backoff = Backoff::new();
        loop {
            if let Some(event) = self.try_next()? {
                return Ok(Some(event));
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            std::thread::sleep(backoff.step().min(deadline - now));
        }
    }

    /// Hand every queued event to `f` in order, returning how many were seen
    pub fn drain(&mut self, mut f: impl FnMut(TickEvent)) -> Result<usize, RelayClosed> {
        let mut seen = 0;
        loop {
            match self.try_next() {
                Ok(Some(event)) => {
                    f(event);
                    seen += 1;
                }
                Ok(None) => return Ok(seen),
                // Report closure only when this call delivered nothing
                Err(RelayClosed) if seen > 0 => return Ok(seen),
                Err(closed) => return Err(closed),
            }
        }
    }

    /// Drain the queue and keep only the newest event
    pub fn latest(&mut self) -> Result<Option<TickEvent>, RelayClosed> {
        let mut latest = None;
        self.drain(|event| latest = Some(event))?;
        Ok(latest)
    }

    /// Number of events dropped because the queue was full
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Drops since the last call, for logging on the consumer side
    pub fn take_dropped(&mut self) -> u64 {
        let total = self.dropped();
        let fresh = total - self.reported;
        self.reported = total;
        fresh
    }

    /// True once the producer is gone (there may still be queued events)
    pub fn is_abandoned(&self) -> bool {
        self.rx.is_abandoned()
    }
}

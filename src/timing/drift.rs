use std::fmt;
use std::time::{Duration, Instant};

/*
Drift Tracking
==============

Drift is how late (or early) a beat arrived compared to an ideal clock that
started at the same moment and never wavered:

    expected(n) = baseline + interval * n
    drift(n)    = actual(n) - expected(n)

  baseline    The instant playback started or last resumed.

  n           Beats recorded since the baseline (first beat is n = 1, one
              full interval after the baseline).

  interval    60s / BPM, taken at the moment the beat is recorded. A tempo
              change does not rescale earlier beats, so after one the
              figure describes how well the *current* schedule is being
              kept rather than a cumulative clock error.

Pausing freezes the tracker; resuming calls reset() so the paused wall-clock
time never shows up as drift. Only the latest sample is kept.
*/

/// One measurement: when a beat was due and when it showed up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriftSample {
    pub expected: Instant,
    pub actual: Instant,
}

impl DriftSample {
    /// Signed drift in nanoseconds (positive = late)
    pub fn drift_nanos(&self) -> i128 {
        if self.actual >= self.expected {
            (self.actual - self.expected).as_nanos() as i128
        } else {
            -((self.expected - self.actual).as_nanos() as i128)
        }
    }

    /// Absolute drift
    pub fn magnitude(&self) -> Duration {
        if self.actual >= self.expected {
            self.actual - self.expected
        } else {
            self.expected - self.actual
        }
    }

    pub fn is_late(&self) -> bool {
        self.actual > self.expected
    }
}

impl fmt::Display for DriftSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.actual >= self.expected { "+" } else { "-" };
        write!(f, "{}{:?}", sign, self.magnitude())
    }
}

/// Measures scheduling error of delivered beats
#[derive(Debug, Clone)]
pub struct DriftTracker {
    baseline: Instant,
    iterations: u32,
    frozen: bool,
    last: Option<DriftSample>,
}

impl DriftTracker {
    /// Create a tracker anchored at `now`
    pub fn new(now: Instant) -> Self {
        Self {
            baseline: now,
            iterations: 0,
            frozen: false,
            last: None,
        }
    }

    /// Re-anchor the ideal clock at `now` and start counting from zero
    pub fn reset(&mut self, now: Instant) {
        self.baseline = now;
        self.iterations = 0;
        self.frozen = false;
    }

    /// Stop accepting samples until the next reset
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Record a beat observed at `now` under the current beat `interval`.
    ///
    /// Returns `None` while frozen; the previous sample stays visible.
    pub fn record(&mut self, now: Instant, interval: Duration) -> Option<DriftSample> {
        if self.frozen {
            return None;
        }

        self.iterations += 1;
        let sample = DriftSample {
            expected: self.baseline + interval * self.iterations,
            actual: now,
        };
        self.last = Some(sample);
        Some(sample)
    }

    /// Most recent sample, if any beat has been recorded
    pub fn last(&self) -> Option<DriftSample> {
        self.last
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BEAT: Duration = Duration::from_millis(500); // 120 bpm

    #[test]
    fn test_on_time_beat_has_zero_drift() {
        let t0 = Instant::now();
        let mut tracker = DriftTracker::new(t0);

        let sample = tracker.record(t0 + BEAT, BEAT).unwrap();
        assert_eq!(sample.drift_nanos(), 0);
        assert_eq!(sample.magnitude(), Duration::ZERO);
    }

    #[test]
    fn test_late_and_early_beats() {
        let t0 = Instant::now();
        let mut tracker = DriftTracker::new(t0);

        let late = tracker.record(t0 + BEAT + Duration::from_millis(3), BEAT).unwrap();
        assert!(late.is_late());
        assert_eq!(late.drift_nanos(), 3_000_000);
        assert_eq!(late.to_string(), "+3ms");

        let early = tracker
            .record(t0 + BEAT * 2 - Duration::from_millis(2), BEAT)
            .unwrap();
        assert!(!early.is_late());
        assert_eq!(early.drift_nanos(), -2_000_000);
        assert_eq!(early.to_string(), "-2ms");
    }

    #[test]
    fn test_pause_does_not_count_as_drift() {
        let t0 = Instant::now();
        let mut tracker = DriftTracker::new(t0);
        tracker.record(t0 + BEAT, BEAT);

        // Paused for ten seconds
        tracker.freeze();
        let paused_for = Duration::from_secs(10);
        assert_eq!(tracker.record(t0 + BEAT + paused_for / 2, BEAT), None);

        let resumed_at = t0 + BEAT + paused_for;
        tracker.reset(resumed_at);
        let sample = tracker.record(resumed_at + BEAT, BEAT).unwrap();
        assert_eq!(sample.magnitude(), Duration::ZERO);
        assert_eq!(tracker.iterations(), 1);
    }

    #[test]
    fn test_tempo_change_uses_current_interval() {
        let t0 = Instant::now();
        let mut tracker = DriftTracker::new(t0);
        tracker.record(t0 + BEAT, BEAT);

        // Halving the interval mid-stream: the schedule is recomputed as if
        // the new tempo had been in effect all along
        let faster = BEAT / 2;
        let sample = tracker.record(t0 + BEAT + faster, faster).unwrap();
        assert_eq!(sample.expected, t0 + faster * 2);
        assert_eq!(sample.drift_nanos(), faster.as_nanos() as i128);
    }

    #[test]
    fn test_only_latest_sample_is_kept() {
        let t0 = Instant::now();
        let mut tracker = DriftTracker::new(t0);
        assert_eq!(tracker.last(), None);

        tracker.record(t0 + BEAT, BEAT);
        let second = tracker.record(t0 + BEAT * 2, BEAT);
        assert_eq!(tracker.last(), second);
    }
}

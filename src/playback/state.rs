use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

/*
Playback State Machine
======================

    ┌─────────┐  start    ┌─────────┐  pause   ┌────────┐
    │ Stopped │ ────────→ │ Running │ ───────→ │ Paused │
    └─────────┘  restart  └─────────┘ ←─────── └────────┘
         ↑                     │       resume       │
         │        stop         │                    │
         └─────────────────────┴────────────────────┘
                          stop

Stopped is the initial state. Paused is only reachable from Running, and
there is no Stopped → Paused edge. `start` is the first launch; once the
metronome has run, leaving Stopped again is a `restart`.

Anything else is rejected with a TransitionError and the state is left as it
was. Button enablement and the Pause/Resume label are derived from the state
(see Controls) rather than stored next to it.
*/

/// Where playback currently is
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Running,
    Paused,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PlaybackState::Stopped => "stopped",
            PlaybackState::Running => "running",
            PlaybackState::Paused => "paused",
        })
    }
}

/// A requested transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackAction {
    Start,
    Pause,
    Resume,
    Stop,
    Restart,
}

impl fmt::Display for PlaybackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PlaybackAction::Start => "start",
            PlaybackAction::Pause => "pause",
            PlaybackAction::Resume => "resume",
            PlaybackAction::Stop => "stop",
            PlaybackAction::Restart => "restart",
        })
    }
}

/// A transition that is not valid from the current state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot {action} while {state}")]
pub struct TransitionError {
    pub action: PlaybackAction,
    pub state: PlaybackState,
}

/// Which transport controls are usable, plus the pause button's label
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    pub start: bool,
    pub pause: bool,
    pub stop: bool,
    pub restart: bool,
    pub pause_label: &'static str,
}

impl Controls {
    /// Enablement for a state. `has_started` separates the first launch
    /// (Start) from every later one (Restart).
    pub fn for_state(state: PlaybackState, has_started: bool) -> Self {
        match state {
            PlaybackState::Stopped => Self {
                start: !has_started,
                pause: false,
                stop: false,
                restart: has_started,
                pause_label: "Pause",
            },
            PlaybackState::Running => Self {
                start: false,
                pause: true,
                stop: true,
                restart: false,
                pause_label: "Pause",
            },
            PlaybackState::Paused => Self {
                start: false,
                pause: true,
                stop: true,
                restart: false,
                pause_label: "Resume",
            },
        }
    }
}

/// Single-writer playback state, owned by the UI thread
#[derive(Debug, Clone, Default)]
pub struct PlaybackStateMachine {
    state: PlaybackState,
    has_started: bool,
}

impl PlaybackStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn has_started(&self) -> bool {
        self.has_started
    }

    pub fn is_running(&self) -> bool {
        self.state == PlaybackState::Running
    }

    pub fn is_paused(&self) -> bool {
        self.state == PlaybackState::Paused
    }

    pub fn is_stopped(&self) -> bool {
        self.state == PlaybackState::Stopped
    }

    pub fn controls(&self) -> Controls {
        Controls::for_state(self.state, self.has_started)
    }

    /// Apply `action`, returning the new state or leaving everything untouched
    pub fn apply(&mut self, action: PlaybackAction) -> Result<PlaybackState, TransitionError> {
        use PlaybackAction as A;
        use PlaybackState as S;

        let next = match (action, self.state) {
            (A::Start, S::Stopped) if !self.has_started => S::Running,
            (A::Restart, S::Stopped) if self.has_started => S::Running,
            (A::Pause, S::Running) => S::Paused,
            (A::Resume, S::Paused) => S::Running,
            (A::Stop, S::Running | S::Paused) => S::Stopped,
            (action, state) => {
                tracing::warn!(%action, %state, "playback transition rejected");
                return Err(TransitionError { action, state });
            }
        };

        tracing::debug!(%action, from = %self.state, to = %next, "playback transition");
        self.state = next;
        if next == S::Running {
            self.has_started = true;
        }
        Ok(next)
    }

    pub fn start(&mut self) -> Result<PlaybackState, TransitionError> {
        self.apply(PlaybackAction::Start)
    }

    pub fn pause(&mut self) -> Result<PlaybackState, TransitionError> {
        self.apply(PlaybackAction::Pause)
    }

    pub fn resume(&mut self) -> Result<PlaybackState, TransitionError> {
        self.apply(PlaybackAction::Resume)
    }

    pub fn stop(&mut self) -> Result<PlaybackState, TransitionError> {
        self.apply(PlaybackAction::Stop)
    }

    pub fn restart(&mut self) -> Result<PlaybackState, TransitionError> {
        self.apply(PlaybackAction::Restart)
    }

    /// The single pause button: pause when running, resume when paused
    pub fn toggle_pause(&mut self) -> Result<PlaybackState, TransitionError> {
        match self.state {
            PlaybackState::Paused => self.resume(),
            _ => self.pause(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let machine = PlaybackStateMachine::new();
        assert!(machine.is_stopped());
        assert!(!machine.has_started());

        let controls = machine.controls();
        assert!(controls.start);
        assert!(!controls.pause);
        assert!(!controls.stop);
        assert!(!controls.restart);
    }

    #[test]
    fn test_pause_and_stop_rejected_from_stopped() {
        let mut machine = PlaybackStateMachine::new();

        assert_eq!(
            machine.pause(),
            Err(TransitionError {
                action: PlaybackAction::Pause,
                state: PlaybackState::Stopped,
            })
        );
        assert!(machine.stop().is_err());
        assert!(machine.resume().is_err());
        assert!(machine.is_stopped());
    }

    #[test]
    fn test_full_cycle() {
        let mut machine = PlaybackStateMachine::new();

        assert_eq!(machine.start(), Ok(PlaybackState::Running));
        assert_eq!(machine.controls().pause_label, "Pause");
        assert!(!machine.controls().start);

        assert_eq!(machine.pause(), Ok(PlaybackState::Paused));
        assert_eq!(machine.controls().pause_label, "Resume");

        assert_eq!(machine.resume(), Ok(PlaybackState::Running));
        assert_eq!(machine.stop(), Ok(PlaybackState::Stopped));

        assert_eq!(
            machine.controls(),
            Controls::for_state(PlaybackState::Stopped, true)
        );
        let controls = machine.controls();
        assert!(!controls.pause);
        assert!(!controls.stop);
        assert!(controls.restart);
    }

    #[test]
    fn test_stop_from_paused() {
        let mut machine = PlaybackStateMachine::new();
        machine.start().unwrap();
        machine.pause().unwrap();
        assert_eq!(machine.stop(), Ok(PlaybackState::Stopped));
    }

    #[test]
    fn test_start_only_once_then_restart() {
        let mut machine = PlaybackStateMachine::new();
        assert!(machine.restart().is_err());

        machine.start().unwrap();
        machine.stop().unwrap();
        assert!(machine.start().is_err());
        assert_eq!(machine.restart(), Ok(PlaybackState::Running));
        assert_eq!(machine.controls().pause_label, "Pause");
    }

    #[test]
    fn test_toggle_pause() {
        let mut machine = PlaybackStateMachine::new();
        assert!(machine.toggle_pause().is_err());

        machine.start().unwrap();
        assert_eq!(machine.toggle_pause(), Ok(PlaybackState::Paused));
        assert_eq!(machine.toggle_pause(), Ok(PlaybackState::Running));
    }

    #[test]
    fn test_error_message() {
        let err = TransitionError {
            action: PlaybackAction::Stop,
            state: PlaybackState::Stopped,
        };
        assert_eq!(err.to_string(), "cannot stop while stopped");
    }
}

//! Terminal front end
//!
//! Draws the beat markers as they arrive and maps keys to session actions.
//! The relay is drained once per frame; the loop ends on quit or when the
//! engine goes away.

mod keys;
mod view;

use std::time::{Duration, Instant};

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    DefaultTerminal, Frame,
};
use tracing::{debug, warn};

use metrognome::{
    display::DisplayBuffer, playback::PlaybackState, relay::TickReceiver, Session,
};

use keys::Action;
use view::{render_beats, render_help, render_status, StatusView};

/// Poll period for key events (~60fps)
const FRAME: Duration = Duration::from_millis(16);

pub fn run(session: Session, ticks: TickReceiver) -> EyreResult<()> {
    let mut terminal = ratatui::init();
    let width = terminal.size().map(|size| size.width).unwrap_or(80);

    let mut app = TuiApp::new(session, ticks, width as usize);
    let result = app.run(&mut terminal);

    ratatui::restore();
    app.session.close();
    result
}

/// Terminal application state
struct TuiApp {
    session: Session,
    ticks: TickReceiver,
    /// Beat markers laid out at the terminal width
    buffer: DisplayBuffer,
    last_message: String,
    show_drift: bool,
    show_help: bool,
    should_quit: bool,
}

impl TuiApp {
    fn new(session: Session, ticks: TickReceiver, width: usize) -> Self {
        Self {
            session,
            ticks,
            buffer: DisplayBuffer::new(width),
            last_message: String::new(),
            show_drift: false,
            show_help: false,
            should_quit: false,
        }
    }

    fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        self.session.start(Instant::now())?;
        self.last_message = "RUNNING".into();

        while !self.should_quit {
            self.poll_ticks();

            terminal.draw(|frame| self.render(frame))?;

            if event::poll(FRAME)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
                    Event::Resize(width, height) => self.resize(width, height),
                    _ => {}
                }
            }
        }

        Ok(())
    }

    /// Take everything the clock has delivered since the last frame
    fn poll_ticks(&mut self) {
        let delivered = self.ticks.drain(|event| {
            self.session.record_tick(&event);
            self.buffer.append(&event.marker());
        });

        let dropped = self.ticks.take_dropped();
        if dropped > 0 {
            warn!(dropped, "renderer fell behind, ticks dropped");
        }

        if delivered.is_err() {
            debug!("tick relay closed");
            self.last_message = "ENGINE CLOSED".into();
            self.should_quit = true;
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        let Some(action) = keys::action_for(&key) else {
            return;
        };

        match action {
            Action::Quit => {
                self.last_message = "QUITTING".into();
                self.should_quit = true;
            }
            Action::Help => self.show_help = !self.show_help,
            Action::Drift => self.show_drift = !self.show_drift,
            Action::TempoUp => {
                self.session.tempo_up();
                self.last_message = format!("TEMPO +{}", self.session.tempo_delta());
            }
            Action::TempoDown => {
                self.session.tempo_down();
                self.last_message = format!("TEMPO -{}", self.session.tempo_delta());
            }
            Action::Pause => {
                if let Err(err) = self.session.toggle_pause(Instant::now()) {
                    debug!(%err, "pause ignored");
                }
            }
            Action::Stop => {
                let result = match self.session.state() {
                    PlaybackState::Stopped => self.session.restart(Instant::now()),
                    _ => self.session.stop(),
                };
                match result {
                    Ok(PlaybackState::Stopped) => self.last_message = "STOPPED".into(),
                    Ok(_) => self.last_message = "RESTARTED".into(),
                    Err(err) => self.last_message = err.to_string(),
                }
            }
            Action::Mute => {
                let muted = self.session.toggle_mute();
                self.last_message = if muted { "MUTE" } else { "UNMUTE" }.into();
            }
            Action::Pan => {
                let panned = self.session.toggle_pan();
                self.last_message = if panned { "PAN" } else { "UNPAN" }.into();
            }
        }
    }

    /// New width applies from the next appended marker
    fn resize(&mut self, width: u16, height: u16) {
        self.buffer.set_width(width as usize);
        self.last_message = format!("RESIZED {}x{}", width, height);
    }

    fn render(&self, frame: &mut Frame) {
        let help = if self.show_help {
            keys::full_help()
        } else {
            keys::short_help()
        };

        // Layout: status, beats, help
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Min(1),
                Constraint::Length(help.len() as u16),
            ])
            .split(frame.area());

        let status = StatusView {
            paused: self.session.state() == PlaybackState::Paused,
            signature: self.session.signature().to_string(),
            message: &self.last_message,
            drift: self
                .show_drift
                .then(|| self.session.last_drift())
                .flatten(),
        };

        render_status(frame, chunks[0], &status);
        render_beats(frame, chunks[1], &self.buffer);
        render_help(frame, chunks[2], help);
    }
}

//! Key bindings and the help bar built from them

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    style::{Color, Style},
    text::{Line, Span},
};

/// What a key press asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    TempoUp,
    TempoDown,
    Pause,
    Stop,
    Mute,
    Pan,
    Drift,
    Help,
    Quit,
}

pub struct Binding {
    pub action: Action,
    pub keys: &'static [KeyCode],
    pub label: &'static str,
    pub help: &'static str,
}

pub const BINDINGS: [Binding; 9] = [
    Binding {
        action: Action::TempoUp,
        keys: &[KeyCode::Up, KeyCode::Char('a')],
        label: "↑/a",
        help: "tempo up",
    },
    Binding {
        action: Action::TempoDown,
        keys: &[KeyCode::Down, KeyCode::Char('z')],
        label: "↓/z",
        help: "tempo down",
    },
    Binding {
        action: Action::Pan,
        keys: &[KeyCode::Char('r')],
        label: "r",
        help: "Pan/Unpan",
    },
    Binding {
        action: Action::Pause,
        keys: &[KeyCode::Char('p')],
        label: "p",
        help: "Pause/Resume",
    },
    Binding {
        action: Action::Mute,
        keys: &[KeyCode::Char('m')],
        label: "m",
        help: "Mute/Unmute",
    },
    Binding {
        action: Action::Drift,
        keys: &[KeyCode::Char('d')],
        label: "d",
        help: "Display drift",
    },
    Binding {
        action: Action::Stop,
        keys: &[KeyCode::Char('s')],
        label: "s",
        help: "Stop/Restart",
    },
    Binding {
        action: Action::Help,
        keys: &[KeyCode::Char('?')],
        label: "?",
        help: "toggle help",
    },
    Binding {
        action: Action::Quit,
        keys: &[KeyCode::Char('q'), KeyCode::Esc],
        label: "q",
        help: "quit",
    },
];

/// Full help is laid out in columns of at most three bindings
const COLUMNS: [&[Action]; 3] = [
    &[Action::TempoUp, Action::TempoDown, Action::Pan],
    &[Action::Pause, Action::Mute, Action::Drift],
    &[Action::Stop, Action::Help, Action::Quit],
];

const COLUMN_WIDTH: usize = 22;

/// Map a key press to an action
pub fn action_for(key: &KeyEvent) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return (key.code == KeyCode::Char('c')).then_some(Action::Quit);
    }

    BINDINGS
        .iter()
        .find(|binding| binding.keys.contains(&key.code))
        .map(|binding| binding.action)
}

fn binding(action: Action) -> Option<&'static Binding> {
    BINDINGS.iter().find(|b| b.action == action)
}

fn entry(binding: &Binding) -> Vec<Span<'static>> {
    vec![
        Span::styled(binding.label, Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(binding.help, Style::default().fg(Color::DarkGray)),
    ]
}

/// One-line help: "? toggle help  q quit"
pub fn short_help() -> Vec<Line<'static>> {
    let mut spans = Vec::new();
    for action in [Action::Help, Action::Quit] {
        if let Some(binding) = binding(action) {
            if !spans.is_empty() {
                spans.push(Span::raw("  "));
            }
            spans.extend(entry(binding));
        }
    }
    vec![Line::from(spans)]
}

/// Multi-column help, one line per row
pub fn full_help() -> Vec<Line<'static>> {
    let rows = COLUMNS.iter().map(|c| c.len()).max().unwrap_or(0);

    (0..rows)
        .map(|row| {
            let mut spans = Vec::new();
            for column in COLUMNS {
                let Some(binding) = column.get(row).and_then(|a| binding(*a)) else {
                    continue;
                };
                let width = binding.label.chars().count() + 1 + binding.help.len();
                spans.extend(entry(binding));
                spans.push(Span::raw(" ".repeat(COLUMN_WIDTH.saturating_sub(width))));
            }
            Line::from(spans)
        })
        .collect()
}

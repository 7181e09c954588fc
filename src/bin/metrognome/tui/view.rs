//! Status line, beat markers and help bar

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use metrognome::{display::DisplayBuffer, display::DOWNBEAT_SUFFIX, timing::DriftSample};

/// What the status line shows
pub struct StatusView<'a> {
    pub paused: bool,
    /// "N/D @ T bpm"
    pub signature: String,
    pub message: &'a str,
    /// Only set when drift display is on
    pub drift: Option<DriftSample>,
}

impl StatusView<'_> {
    /// "[PAUSED - ]N/D @ T bpm - message[ - Drift: x]"
    pub fn line(&self) -> Line<'static> {
        let mut spans = Vec::new();

        if self.paused {
            spans.push(Span::styled(
                "PAUSED - ",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ));
        }
        spans.push(Span::styled(
            self.signature.clone(),
            Style::default().fg(Color::Cyan),
        ));
        spans.push(Span::raw(" - "));
        spans.push(Span::styled(
            self.message.to_string(),
            Style::default().fg(Color::White),
        ));
        if let Some(drift) = self.drift {
            spans.push(Span::styled(
                format!(" - Drift: {}", drift),
                Style::default().fg(Color::Magenta),
            ));
        }

        Line::from(spans)
    }
}

pub fn render_status(frame: &mut Frame, area: Rect, status: &StatusView) {
    // Leading blank row
    let paragraph = Paragraph::new(vec![Line::default(), status.line()]);
    frame.render_widget(paragraph, area);
}

/// One terminal row per buffer row. Downbeat separators are highlighted.
pub fn render_beats(frame: &mut Frame, area: Rect, buffer: &DisplayBuffer) {
    let accent = Style::default().fg(Color::Rgb(0xFF, 0x75, 0xB7));

    let lines: Vec<Line> = buffer
        .wrapped()
        .into_iter()
        .map(|row| {
            let spans: Vec<Span> = row
                .split_inclusive(DOWNBEAT_SUFFIX)
                .flat_map(|chunk| match chunk.strip_suffix(DOWNBEAT_SUFFIX) {
                    Some(beats) => vec![
                        Span::raw(beats.to_string()),
                        Span::styled(DOWNBEAT_SUFFIX.to_string(), accent),
                    ],
                    None => vec![Span::raw(chunk.to_string())],
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), area);
}

pub fn render_help(frame: &mut Frame, area: Rect, help: Vec<Line<'static>>) {
    frame.render_widget(Paragraph::new(help), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_status_line() {
        let status = StatusView {
            paused: false,
            signature: "4/4 @ 60 bpm".into(),
            message: "RUNNING",
            drift: None,
        };
        assert_eq!(text(&status.line()), "4/4 @ 60 bpm - RUNNING");
    }

    #[test]
    fn test_status_line_paused_with_drift() {
        let expected = Instant::now();
        let status = StatusView {
            paused: true,
            signature: "3/4 @ 90 bpm".into(),
            message: "TEMPO +10",
            drift: Some(DriftSample {
                expected,
                actual: expected + Duration::from_millis(3),
            }),
        };
        assert_eq!(
            text(&status.line()),
            "PAUSED - 3/4 @ 90 bpm - TEMPO +10 - Drift: +3ms"
        );
    }
}

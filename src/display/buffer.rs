//! Display buffer - one line of recent beat markers for the terminal
//!
//! Markers accumulate left to right. When the next marker would reach the
//! viewport width the whole line is thrown away and restarts with that
//! marker; there is no sliding window. Lengths and widths count chars.

use crate::relay::TickEvent;

/// Suffix that marks the last beat of a measure
pub const DOWNBEAT_SUFFIX: char = '|';

/// Text for a single beat: "3", or "4|" when it closes the measure
pub fn beat_marker(beat: u32, is_downbeat: bool) -> String {
    if is_downbeat {
        format!("{}{}", beat, DOWNBEAT_SUFFIX)
    } else {
        beat.to_string()
    }
}

impl TickEvent {
    /// Marker text for this beat
    pub fn marker(&self) -> String {
        beat_marker(self.beat, self.is_downbeat)
    }
}

/// Bounded line of beat markers, owned by the renderer loop
#[derive(Debug, Clone, Default)]
pub struct DisplayBuffer {
    text: String,
    /// Length of `text` in chars
    chars: usize,
    width: usize,
}

impl DisplayBuffer {
    pub fn new(width: usize) -> Self {
        Self {
            text: String::with_capacity(width),
            chars: 0,
            width,
        }
    }

    /// Change the viewport width. Stored text is left alone; the new width
    /// applies from the next append.
    pub fn set_width(&mut self, width: usize) {
        self.width = width;
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Add a marker, starting over when the line would fill the viewport
    pub fn append(&mut self, marker: &str) {
        let marker_chars = marker.chars().count();
        if self.chars + marker_chars >= self.width {
            self.clear();
        }
        self.text.push_str(marker);
        self.chars += marker_chars;
    }

    /// Raw stored text
    pub fn contents(&self) -> &str {
        &self.text
    }

    /// Stored text split into rows of `width` chars for drawing. A zero
    /// width yields the text as a single row.
    pub fn wrapped(&self) -> Vec<&str> {
        if self.text.is_empty() {
            return Vec::new();
        }
        if self.width == 0 {
            return vec![self.text.as_str()];
        }

        let mut rows = Vec::with_capacity(self.chars / self.width + 1);
        let mut start = 0;
        for (count, (index, _)) in self.text.char_indices().enumerate() {
            if count > 0 && count % self.width == 0 {
                rows.push(&self.text[start..index]);
                start = index;
            }
        }
        rows.push(&self.text[start..]);
        rows
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.chars = 0;
    }

    /// Length in chars
    pub fn len(&self) -> usize {
        self.chars
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_format() {
        assert_eq!(beat_marker(3, false), "3");
        assert_eq!(beat_marker(4, true), "4|");
    }

    #[test]
    fn test_append_concatenates_below_width() {
        let mut buf = DisplayBuffer::new(8);
        for marker in ["1", "2", "3", "4|"] {
            buf.append(marker);
        }
        assert_eq!(buf.contents(), "1234|");
    }

    #[test]
    fn test_full_buffer_resets_to_new_marker() {
        let mut buf = DisplayBuffer::new(20);
        buf.append("12345678");
        buf.set_width(8);
        buf.append("9");
        assert_eq!(buf.contents(), "9");
    }

    #[test]
    fn test_reset_when_marker_would_reach_width() {
        let mut buf = DisplayBuffer::new(8);
        for marker in ["1", "2", "3", "4|", "1", "2"] {
            buf.append(marker);
        }
        assert_eq!(buf.contents(), "1234|12");

        // 7 + 1 reaches the width
        buf.append("3");
        assert_eq!(buf.contents(), "3");
    }

    #[test]
    fn test_width_change_applies_on_next_append() {
        let mut buf = DisplayBuffer::new(20);
        for marker in ["1", "2", "3", "4|"] {
            buf.append(marker);
        }

        buf.set_width(4);
        assert_eq!(buf.contents(), "1234|");

        buf.append("1");
        assert_eq!(buf.contents(), "1");
    }

    #[test]
    fn test_wrapped_is_display_only() {
        let mut buf = DisplayBuffer::new(20);
        for marker in ["1", "2", "3", "4|", "1", "2"] {
            buf.append(marker);
        }

        buf.set_width(3);
        assert_eq!(buf.wrapped(), vec!["123", "4|1", "2"]);
        assert_eq!(buf.contents(), "1234|12");
    }

    #[test]
    fn test_wrapped_edge_cases() {
        let mut buf = DisplayBuffer::new(0);
        assert!(buf.wrapped().is_empty());

        // Zero width: every append replaces
        buf.append("1");
        buf.append("2");
        assert_eq!(buf.wrapped(), vec!["2"]);
    }

    #[test]
    fn test_wrapped_multibyte_narrow_width() {
        let mut buf = DisplayBuffer::new(20);
        buf.append("é1");
        buf.set_width(1);
        assert_eq!(buf.wrapped(), vec!["é", "1"]);

        buf.set_width(2);
        buf.append("ü");
        assert_eq!(buf.contents(), "ü");
        assert_eq!(buf.wrapped(), vec!["ü"]);
    }

    #[test]
    fn test_width_counts_chars() {
        let mut buf = DisplayBuffer::new(4);
        buf.append("éé");
        buf.append("é");
        assert_eq!(buf.contents(), "ééé");
        assert_eq!(buf.len(), 3);

        // 3 + 1 reaches the width
        buf.append("ü");
        assert_eq!(buf.contents(), "ü");
        assert_eq!(buf.len(), 1);

        buf.set_width(10);
        buf.append("aaé");
        buf.set_width(2);
        assert_eq!(buf.wrapped(), vec!["üa", "aé"]);
    }
}

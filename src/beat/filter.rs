//! Beat filter - which beats of a measure are "hit" beats
//!
//! The user types the beats they want to hear as a digit string, e.g. "134"
//! for beats 1, 3 and 4 of a 4/4 measure. A beat is a hit when its decimal
//! form appears anywhere in that string.
//!
//! This is a substring test, not a parsed set. For measures of ten or more
//! beats the text is ambiguous: "12" matches beats 1, 2 and 12, and "10"
//! matches beats 1 and 10. The behaviour is kept as-is; `is_ambiguous` lets
//! a front end warn.

use std::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Predicate handed to the engine, evaluated once per beat on the clock thread
pub type TickFilter = Arc<dyn Fn(u32) -> bool + Send + Sync>;

/// The beat-selection text as entered by the user
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BeatFilterSpec(String);

impl BeatFilterSpec {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Every beat of an `n`-beat measure: "1", "12", "123", ...
    pub fn default_for(measure: u32) -> Self {
        Self(default_spec(measure))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BeatFilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compiled, immutable beat predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeatFilter {
    spec: BeatFilterSpec,
}

impl BeatFilter {
    /// Build a filter from any text. Never fails; unmatched characters
    /// simply never match.
    pub fn compile(spec: impl Into<String>) -> Self {
        Self {
            spec: BeatFilterSpec::new(spec),
        }
    }

    /// Filter that marks every beat of an `n`-beat measure
    pub fn every_beat(measure: u32) -> Self {
        Self {
            spec: BeatFilterSpec::default_for(measure),
        }
    }

    pub fn spec(&self) -> &BeatFilterSpec {
        &self.spec
    }

    /// True when the beat's decimal digits appear in the spec
    pub fn matches(&self, beat: u32) -> bool {
        self.spec.as_str().contains(beat.to_string().as_str())
    }

    /// True when `measure` has multi-digit beats, where the substring rule
    /// can mark beats the user did not mean
    pub fn is_ambiguous(measure: u32) -> bool {
        measure >= 10
    }

    /// Convert into the shared predicate the engine stores
    pub fn into_tick_filter(self) -> TickFilter {
        Arc::new(move |beat| self.matches(beat))
    }
}

/// Concatenate "1" through `measure`, used to seed the filter whenever the
/// meter changes
pub fn default_spec(measure: u32) -> String {
    (1..=measure).map(|beat| beat.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_spec_small_measures() {
        let mut expected = String::new();
        for n in 1..=9u32 {
            expected.push_str(&n.to_string());
            assert_eq!(default_spec(n), expected);
        }
        assert_eq!(default_spec(4), "1234");
    }

    #[test]
    fn test_default_spec_empty_measure() {
        assert_eq!(default_spec(0), "");
    }

    #[test]
    fn test_compile_selects_beats() {
        let filter = BeatFilter::compile("134");
        let hits: Vec<bool> = (1..=4).map(|b| filter.matches(b)).collect();
        assert_eq!(hits, vec![true, false, true, true]);
    }

    #[test]
    fn test_compile_garbage_matches_nothing() {
        let filter = BeatFilter::compile("abc");
        assert!((1..=12).all(|b| !filter.matches(b)));

        let empty = BeatFilter::compile("");
        assert!((1..=4).all(|b| !empty.matches(b)));
    }

    #[test]
    fn test_substring_ambiguity_is_preserved() {
        // "12" is beats 1 and 2 in 4/4, but also beat 12 in a 12-beat measure
        let filter = BeatFilter::compile("12");
        assert!(filter.matches(1));
        assert!(filter.matches(2));
        assert!(filter.matches(12));
        assert!(!filter.matches(3));

        assert!(!BeatFilter::is_ambiguous(9));
        assert!(BeatFilter::is_ambiguous(10));
    }

    #[test]
    fn test_every_beat_seeds_from_measure() {
        let filter = BeatFilter::every_beat(3);
        assert_eq!(filter.spec().as_str(), "123");
        assert!(!filter.matches(4));
    }

    #[test]
    fn test_tick_filter_matches_compiled() {
        let tf = BeatFilter::compile("24").into_tick_filter();
        assert!(!tf(1));
        assert!(tf(2));
        assert!(!tf(3));
        assert!(tf(4));
    }
}

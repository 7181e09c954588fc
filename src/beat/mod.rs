//! Beat selection

pub mod filter;

pub use filter::{default_spec, BeatFilter, BeatFilterSpec, TickFilter};

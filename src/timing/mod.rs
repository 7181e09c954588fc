pub mod drift;

pub use drift::{DriftSample, DriftTracker};

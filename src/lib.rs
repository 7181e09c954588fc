pub mod beat; // Hit-beat selection
pub mod config;
pub mod display;
pub mod engine; // Clock thread and click output
pub mod gallery;
pub mod meter;
pub mod playback; // Stopped / Running / Paused
pub mod relay; // Clock thread -> renderer handoff
pub mod session;
pub mod timing;

pub use config::SessionConfig;
pub use session::{Output, Session, SessionError};

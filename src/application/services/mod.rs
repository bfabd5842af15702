//! Application Services
//!
//! Logic that coordinates domain operations.
//!
//! ## Available Services
//!
//! - **PlaySessionController**: Session start/resume, heartbeat billing,
//!   visibility suspend/resume and stop

pub mod play_session_service;

// Re-export play session controller types
pub use play_session_service::{
    PlayPhase, PlaySessionController, PlaySnapshot, SessionTiming, StartOutcome, StopOutcome,
    Visibility,
};

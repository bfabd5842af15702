//! # Domain Entities
//!
//! Core domain entities of the play client.
//!
//! ## Entities
//!
//! - **Play session**: Wire shapes of the session backend and the client's
//!   cached `ActiveSession`
//! - **Balance**: Opaque wallet balance object with readout helpers
//!
//! ## Service Traits
//!
//! Each remote collaborator has a trait defining its operations. The traits
//! are implemented over HTTP in the infrastructure layer and mocked in tests.

mod balance;
mod play_session;

// Re-export play session types
pub use play_session::{
    ActiveSession, CurrentSession, HeartbeatAck, SessionInfo, SessionService, StartedSession,
};

#[cfg(test)]
pub use play_session::MockSessionService;

// Re-export balance types
pub use balance::{BalanceService, BalanceSnapshot};

#[cfg(test)]
pub use balance::MockBalanceService;

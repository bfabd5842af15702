//! Application Layer
//!
//! Contains the play session controller, which orchestrates the remote
//! session and balance services on behalf of UI consumers.

pub mod services;

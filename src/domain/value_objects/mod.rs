//! # Domain Value Objects
//!
//! Immutable value types that represent domain concepts without identity.
//!
//! ## Value Objects
//!
//! - **GameId**: Catalogue identifier of a game
//! - **PlayerId**: Player identifier (wallet address)
//! - **SessionToken**: Redacted bearer credential of a play session

mod identifiers;

pub use identifiers::*;

//! # Domain Layer
//!
//! The domain layer contains the core types of the play client.
//! It is independent of any HTTP or runtime concerns.
//!
//! ## Structure
//!
//! - **entities**: Session and balance shapes plus the remote service traits
//! - **value_objects**: Identifiers and the redacted session token
//!
//! ## Design Principles
//!
//! - No dependencies on infrastructure or application layers
//! - Service traits define the contracts of remote collaborators

pub mod entities;
pub mod value_objects;

// Re-export commonly used types
pub use entities::*;
pub use value_objects::*;

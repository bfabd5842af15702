//! # Playtime Client Library
//!
//! Client side of a pay-per-second game platform:
//! - Play session lifecycle (start, resume, heartbeat billing, stop)
//! - Visibility-driven suspend and resume of session timers
//! - HTTP adapters for the session and balance backends
//! - Wallet balance cache and display formatters
//!
//! ## Architecture
//!
//! The crate follows Clean Architecture principles:
//!
//! - **Domain Layer**: Session and balance types, remote service traits
//! - **Application Layer**: The play session controller
//! - **Infrastructure Layer**: HTTP adapters, caches and metrics
//!
//! ## Module Structure
//!
//! ```text
//! playtime_client/
//! +-- config/          Configuration management
//! +-- domain/          Entities, value objects and service traits
//! +-- application/     Play session controller
//! +-- infrastructure/  HTTP adapters, balance cache, metrics
//! +-- shared/          Common utilities (errors, formatters)
//! ```

// Configuration module
pub mod config;

// Domain layer - Core types
pub mod domain;

// Application layer - Session controller
pub mod application;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Shared utilities
pub mod shared;

// Application startup and wiring
pub mod startup;

// Telemetry and observability
pub mod telemetry;

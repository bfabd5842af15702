//! Infrastructure Layer
//!
//! Contains implementations for external services including:
//! - HTTP adapters for the session and balance backends
//! - In-memory caches
//! - Prometheus metrics

pub mod cache;
pub mod http;
pub mod metrics;

//! # Configuration Module
//!
//! This module handles client configuration loading and management.
//! Configuration can be loaded from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default.toml, config/{environment}.toml)
//! - .env files (via dotenvy)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use playtime_client::config::Settings;
//!
//! let settings = Settings::load()?;
//! println!("Backend at {}", settings.api.base_url());
//! ```

mod settings;

pub use settings::*;

//! Application settings and configuration structures.

use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use validator::Validate;

/// Root configuration structure containing all client settings.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Settings {
    /// Backend API configuration
    #[validate(nested)]
    pub api: ApiSettings,

    /// Session timing configuration
    #[validate(nested)]
    pub session: SessionSettings,

    /// Player and game to run when started from the command line
    #[serde(default)]
    pub player: PlayerSettings,

    /// Current environment (development, staging, production)
    pub environment: String,
}

/// Backend API configuration.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ApiSettings {
    /// Base URL of the session and balance backend
    #[validate(url)]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[validate(range(min = 1, max = 300))]
    pub request_timeout_secs: u64,
}

/// Play session timing.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SessionSettings {
    /// Heartbeat interval in seconds (default: 30)
    #[validate(range(min = 1))]
    pub heartbeat_interval_secs: u64,

    /// Local play-time display refresh in milliseconds (default: 1000)
    #[validate(range(min = 10))]
    pub display_tick_ms: u64,
}

/// Player identity for the command-line runner.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayerSettings {
    /// Wallet address used as the player identifier
    pub wallet_address: Option<String>,

    /// Game to play
    pub game_id: Option<String>,
}

impl Settings {
    /// Load settings from environment variables and configuration files.
    ///
    /// The loading order is:
    /// 1. config/default.toml (base configuration)
    /// 2. config/{RUN_ENV}.toml (environment-specific overrides)
    /// 3. Environment variables (highest priority)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or parsed,
    /// or if a value is out of range.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        Config::builder()
            .set_default("environment", environment.clone())?
            .set_default("api.base_url", "http://localhost:3000")?
            .set_default("api.request_timeout_secs", 10_i64)?
            .set_default("session.heartbeat_interval_secs", 30_i64)?
            .set_default("session.display_tick_ms", 1000_i64)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // APP__SESSION__HEARTBEAT_INTERVAL_SECS=15 -> session.heartbeat_interval_secs = 15
            .add_source(
                Environment::default()
                    .prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("api.base_url", std::env::var("API_BASE_URL").ok())?
            .set_override_option(
                "player.wallet_address",
                std::env::var("WALLET_ADDRESS").ok(),
            )?
            .set_override_option("player.game_id", std::env::var("GAME_ID").ok())?
            .build()?
            .try_deserialize()
            .and_then(|settings: Self| {
                settings
                    .validate()
                    .map_err(|e| ConfigError::Message(format!("Invalid configuration: {}", e)))?;
                Ok(settings)
            })
    }
}

impl ApiSettings {
    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl SessionSettings {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    pub fn display_tick(&self) -> Duration {
        Duration::from_millis(self.display_tick_ms)
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            heartbeat_interval_secs: 30,
            display_tick_ms: 1000,
        }
    }
}

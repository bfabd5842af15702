//! Client Error Types
//!
//! Centralized error handling for the session and balance APIs and the
//! play session controller.

use serde::Deserialize;

/// Error returned by the remote session and balance services.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Non-2xx response. `message` is the body's `message` field when the
    /// server sent one, else a status-derived message.
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// Build a status error from a response body that may carry a `message`.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("HTTP error! status: {}", status));

        ApiError::Status { status, message }
    }

    /// HTTP status code, when the failure came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            ApiError::Decode(_) => None,
        }
    }
}

/// Error body shape returned by the backend
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Error returned by the play session controller.
#[derive(Debug, thiserror::Error)]
pub enum PlayError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Another session operation is already in progress")]
    Busy,
}

//! Play session entity and session service trait.
//!
//! The session itself is owned by the remote session service. The types here
//! mirror its JSON responses, and `ActiveSession` is the client's cached copy
//! that only the controller mutates.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::value_objects::{GameId, PlayerId, SessionToken};
use crate::shared::error::ApiError;

/// Response of the current-session query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentSession {
    #[serde(default)]
    pub has_active_session: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_info: Option<SessionInfo>,
}

impl CurrentSession {
    /// No active session for the player.
    pub fn none() -> Self {
        Self::default()
    }

    /// The reported session, if the server says one is active.
    pub fn active(&self) -> Option<&SessionInfo> {
        if self.has_active_session {
            self.session_info.as_ref()
        } else {
            None
        }
    }
}

/// Server-side session as reported by the current-session query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub session_token: SessionToken,

    /// Billable seconds accumulated so far
    #[serde(default, deserialize_with = "seconds")]
    pub active_play_time: u64,

    pub expires_at: DateTime<Utc>,
}

impl SessionInfo {
    /// A session is resumable only while `now < expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Response of the start-session call. Always carries a fresh token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartedSession {
    pub session_token: SessionToken,

    #[serde(default, deserialize_with = "cost")]
    pub total_cost: f64,
}

/// Response of a heartbeat. `session_token` is present only when rotated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatAck {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_token: Option<SessionToken>,

    #[serde(default, deserialize_with = "cost")]
    pub total_cost: f64,

    #[serde(default, deserialize_with = "seconds")]
    pub active_play_time: u64,
}

/// Client-side cached copy of the current session.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveSession {
    pub token: SessionToken,
    pub active_play_time: u64,
    pub total_cost: f64,
    pub expires_at: Option<DateTime<Utc>>,
}

impl ActiveSession {
    /// Session freshly issued by the start call.
    pub fn started(started: StartedSession) -> Self {
        Self {
            token: started.session_token,
            active_play_time: 0,
            total_cost: started.total_cost,
            expires_at: None,
        }
    }

    /// Session adopted from the current-session query.
    pub fn resumed(info: &SessionInfo) -> Self {
        Self {
            token: info.session_token.clone(),
            active_play_time: info.active_play_time,
            total_cost: 0.0,
            expires_at: Some(info.expires_at),
        }
    }

    /// Apply a heartbeat response. Returns `true` when the token rotated.
    pub fn apply(&mut self, ack: HeartbeatAck) -> bool {
        self.total_cost = ack.total_cost;
        self.active_play_time = ack.active_play_time;

        match ack.session_token {
            Some(token) if token != self.token => {
                self.token = token;
                true
            }
            _ => false,
        }
    }
}

/// Remote session service consumed by the play session controller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionService: Send + Sync {
    /// Query the player's current session, if any.
    async fn current_session(&self, player: &PlayerId) -> Result<CurrentSession, ApiError>;

    /// Open a brand-new session for (player, game).
    async fn start_session(
        &self,
        player: &PlayerId,
        game: &GameId,
    ) -> Result<StartedSession, ApiError>;

    /// Keep the session alive and fetch accrued cost.
    async fn heartbeat(&self, token: &SessionToken) -> Result<HeartbeatAck, ApiError>;

    /// Terminate the session.
    async fn stop_session(&self, token: &SessionToken) -> Result<(), ApiError>;
}

/// Accept integral or fractional second counts, flooring fractions.
/// `null` reads as zero.
fn seconds<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0);
    if value.is_finite() && value > 0.0 {
        Ok(value.floor() as u64)
    } else {
        Ok(0)
    }
}

/// Accumulated cost; `null` reads as zero.
fn cost<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

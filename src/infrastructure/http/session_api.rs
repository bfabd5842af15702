//! Session service over HTTP.
//!
//! | Operation | Route |
//! |---|---|
//! | current session | `GET /api/play/current?userId=` |
//! | start | `POST /api/play/start` |
//! | heartbeat | `POST /api/play/heartbeat` (bearer) |
//! | stop | `POST /api/play/stop` (bearer) |

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::instrument;

use super::client::ApiClient;
use crate::domain::{
    CurrentSession, GameId, HeartbeatAck, PlayerId, SessionService, SessionToken, StartedSession,
};
use crate::shared::error::ApiError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StartSessionRequest<'a> {
    game_id: &'a str,
    user_id: &'a str,
}

/// `SessionService` backed by the play API.
#[derive(Debug, Clone)]
pub struct HttpSessionService {
    client: Arc<ApiClient>,
}

impl HttpSessionService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SessionService for HttpSessionService {
    #[instrument(skip_all, fields(player = %player))]
    async fn current_session(&self, player: &PlayerId) -> Result<CurrentSession, ApiError> {
        let request = self
            .client
            .get("/api/play/current")
            .query(&[("userId", player.as_str())]);

        match self.client.send_json("current_session", request).await {
            Ok(current) => Ok(current),
            // The backend answers 404 when the player has no session
            Err(ApiError::Status { status: 404, .. }) => Ok(CurrentSession::none()),
            Err(e) => Err(e),
        }
    }

    #[instrument(skip_all, fields(player = %player, game = %game))]
    async fn start_session(
        &self,
        player: &PlayerId,
        game: &GameId,
    ) -> Result<StartedSession, ApiError> {
        let request = self.client.post("/api/play/start").json(&StartSessionRequest {
            game_id: game.as_str(),
            user_id: player.as_str(),
        });

        self.client.send_json("start_session", request).await
    }

    #[instrument(skip_all)]
    async fn heartbeat(&self, token: &SessionToken) -> Result<HeartbeatAck, ApiError> {
        let request = self
            .client
            .post("/api/play/heartbeat")
            .bearer_auth(token.expose());

        self.client.send_json("heartbeat", request).await
    }

    #[instrument(skip_all)]
    async fn stop_session(&self, token: &SessionToken) -> Result<(), ApiError> {
        let request = self.client.post("/api/play/stop").bearer_auth(token.expose());

        self.client.send("stop_session", request).await?;
        Ok(())
    }
}

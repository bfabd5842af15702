//! Balance service over HTTP (`POST /api/users/balance`).

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::instrument;

use super::client::ApiClient;
use crate::domain::{BalanceService, BalanceSnapshot, PlayerId};
use crate::shared::error::ApiError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BalanceRequest<'a> {
    wallet_address: &'a str,
}

/// `BalanceService` backed by the users API.
#[derive(Debug, Clone)]
pub struct HttpBalanceService {
    client: Arc<ApiClient>,
}

impl HttpBalanceService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BalanceService for HttpBalanceService {
    #[instrument(skip_all, fields(player = %player))]
    async fn fetch_balance(&self, player: &PlayerId) -> Result<BalanceSnapshot, ApiError> {
        let request = self.client.post("/api/users/balance").json(&BalanceRequest {
            wallet_address: player.as_str(),
        });

        self.client.send_json("fetch_balance", request).await
    }
}

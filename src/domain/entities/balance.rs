//! Wallet balance entity and balance service trait.
//!
//! The balance object is opaque to the play session controller, which only
//! triggers refreshes. The accessors below read the fields the wallet
//! readout cares about.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::PlayerId;
use crate::shared::error::ApiError;

/// Balance object returned by the balance service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BalanceSnapshot(pub serde_json::Value);

impl BalanceSnapshot {
    /// Whether the backend knows this wallet.
    pub fn has_user(&self) -> bool {
        self.flag("hasUser")
    }

    /// Whether a temporary (custodial) wallet exists for the user.
    pub fn has_temp_wallet(&self) -> bool {
        self.flag("hasTempWallet")
    }

    /// Spendable token balance.
    ///
    /// `None` when the user or the temp wallet is missing. A temp wallet
    /// without a `tokenBalance.value` reads as zero.
    pub fn token_balance(&self) -> Option<f64> {
        if !self.has_user() || !self.has_temp_wallet() {
            return None;
        }

        let value = self.0.get("tokenBalance").and_then(|b| b.get("value"));
        let parsed = match value {
            Some(serde_json::Value::String(s)) => leading_number(s),
            Some(serde_json::Value::Number(n)) => n.as_f64(),
            _ => None,
        };

        Some(parsed.unwrap_or(0.0))
    }

    fn flag(&self, key: &str) -> bool {
        self.0.get(key).and_then(|v| v.as_bool()).unwrap_or(false)
    }
}

/// Parse the longest numeric prefix of `s`, ignoring leading whitespace
/// and any trailing text (`"12abc"` reads as 12).
fn leading_number(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let candidate_len = s
        .find(|c: char| !matches!(c, '0'..='9' | '.' | '+' | '-' | 'e' | 'E'))
        .unwrap_or(s.len());

    (1..=candidate_len)
        .rev()
        .find_map(|len| s[..len].parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

/// Remote balance service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BalanceService: Send + Sync {
    /// Re-fetch the spendable balance of a player's wallet.
    async fn fetch_balance(&self, player: &PlayerId) -> Result<BalanceSnapshot, ApiError>;
}

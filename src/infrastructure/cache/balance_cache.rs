//! Wallet balance cache
//!
//! Keeps the last balance fetched for each wallet so readouts can render
//! without a round trip. The cache is an owned object: construct one at
//! startup and hand it out by `Arc`.
//!
//! `CachedBalanceService` wraps any `BalanceService` and records every
//! successful fetch, so the controller's balance refreshes land here.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;

use crate::domain::{BalanceService, BalanceSnapshot, PlayerId};
use crate::shared::error::ApiError;

/// A balance together with the time it was fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedBalance {
    pub snapshot: BalanceSnapshot,
    pub fetched_at: DateTime<Utc>,
}

/// Last known balance per wallet.
#[derive(Debug, Default)]
pub struct BalanceCache {
    entries: DashMap<PlayerId, CachedBalance>,
}

impl BalanceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, player: &PlayerId) -> Option<CachedBalance> {
        self.entries.get(player).map(|entry| entry.value().clone())
    }

    /// Spendable balance from the cached snapshot.
    pub fn token_balance(&self, player: &PlayerId) -> Option<f64> {
        self.entries
            .get(player)
            .and_then(|entry| entry.snapshot.token_balance())
    }

    pub fn insert(&self, player: PlayerId, snapshot: BalanceSnapshot) {
        self.entries.insert(
            player,
            CachedBalance {
                snapshot,
                fetched_at: Utc::now(),
            },
        );
    }

    /// Drop a wallet's entry, e.g. on disconnect.
    pub fn invalidate(&self, player: &PlayerId) -> bool {
        self.entries.remove(player).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `BalanceService` decorator that records fetched balances in a cache.
pub struct CachedBalanceService<B: BalanceService> {
    inner: B,
    cache: Arc<BalanceCache>,
}

impl<B: BalanceService> CachedBalanceService<B> {
    pub fn new(inner: B, cache: Arc<BalanceCache>) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &Arc<BalanceCache> {
        &self.cache
    }
}

#[async_trait]
impl<B: BalanceService> BalanceService for CachedBalanceService<B> {
    async fn fetch_balance(&self, player: &PlayerId) -> Result<BalanceSnapshot, ApiError> {
        let snapshot = self.inner.fetch_balance(player).await?;
        debug!(player = %player, balance = ?snapshot.token_balance(), "Balance refreshed");
        self.cache.insert(player.clone(), snapshot.clone());
        Ok(snapshot)
    }
}

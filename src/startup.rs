//! Application Startup
//!
//! Wires the HTTP adapters, the balance cache and the play session
//! controller together, and runs one session until interrupted.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::application::services::{PlaySessionController, SessionTiming, StartOutcome};
use crate::config::Settings;
use crate::infrastructure::cache::{BalanceCache, CachedBalanceService};
use crate::infrastructure::http::{ApiClient, HttpBalanceService, HttpSessionService};
use crate::infrastructure::metrics;
use crate::shared::formatters::short_address;

/// Balance service used by the application: HTTP with a cache in front
pub type AppBalanceService = CachedBalanceService<HttpBalanceService>;

/// Controller type used by the application
pub type AppController = PlaySessionController<HttpSessionService, AppBalanceService>;

/// Application instance
pub struct Application {
    settings: Arc<Settings>,
    controller: AppController,
    balances: Arc<BalanceCache>,
}

impl Application {
    /// Build the application from settings
    pub fn build(settings: Settings) -> Result<Self> {
        let client = Arc::new(ApiClient::new(&settings.api).context("building HTTP client")?);
        tracing::info!(base_url = %client.base_url(), "API client created");

        let balances = Arc::new(BalanceCache::new());
        let balance_service = Arc::new(CachedBalanceService::new(
            HttpBalanceService::new(client.clone()),
            balances.clone(),
        ));
        let session_service = Arc::new(HttpSessionService::new(client));

        let controller = PlaySessionController::new(
            session_service,
            balance_service,
            SessionTiming::from(&settings.session),
        );

        Ok(Self {
            settings: Arc::new(settings),
            controller,
            balances,
        })
    }

    pub fn controller(&self) -> &AppController {
        &self.controller
    }

    pub fn balances(&self) -> &Arc<BalanceCache> {
        &self.balances
    }

    /// Start the configured session, report progress until Ctrl-C, then stop.
    pub async fn run_until_stopped(self) -> Result<()> {
        let player = &self.settings.player;
        let wallet = player.wallet_address.clone().unwrap_or_default();
        let game = player.game_id.clone().unwrap_or_default();

        let outcome = self.controller.start_play(&game, &wallet).await?;
        if outcome == StartOutcome::Skipped {
            anyhow::bail!("player.wallet_address and player.game_id must be configured");
        }
        tracing::info!(
            wallet = %short_address(&wallet),
            game = %game,
            outcome = ?outcome,
            "Play session running, press Ctrl-C to stop"
        );

        let mut updates = self.controller.subscribe();
        let reporter = tokio::spawn(async move {
            while updates.changed().await.is_ok() {
                let snapshot = updates.borrow_and_update().clone();
                tracing::debug!(
                    phase = ?snapshot.phase,
                    time = %snapshot.play_time_label(),
                    cost = %snapshot.cost_label(),
                    error = ?snapshot.error,
                    "Session update"
                );
            }
        });

        tokio::signal::ctrl_c().await.context("waiting for Ctrl-C")?;
        tracing::info!("Interrupt received, stopping play session");

        let stopped = self.controller.stop_play().await;
        reporter.abort();
        stopped?;

        let wallet_id = crate::domain::PlayerId::parse(&wallet);
        if let Some(balance) = wallet_id.and_then(|id| self.balances.token_balance(&id)) {
            tracing::info!(balance, "Final balance");
        }
        tracing::debug!(metrics = %metrics::gather_metrics(), "Client metrics");

        Ok(())
    }
}

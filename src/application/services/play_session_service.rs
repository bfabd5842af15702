//! Play Session Controller
//!
//! Drives one "play and bill" session for a (player, game) pair: acquiring
//! or resuming a session token, heartbeating it every 30 seconds to keep it
//! alive and pull accrued cost, ticking a local play-time readout every
//! second, and stopping it.
//!
//! ## States
//!
//! ```text
//!            start_play                 stop_play
//!   Idle ──────────────> Starting ──> Playing ──────> Stopping ──> Idle
//!    ^                      │          │   ^              │
//!    │                      v          v   │ visible      v
//!    └──── start_play ─── Error <── heartbeat   Suspended  Error
//!                                   failure   (hidden)
//! ```
//!
//! ## Timers
//!
//! A heartbeat task and a display task form one *timer pair*. At most one
//! pair is alive per controller: `rearm` always tears the old pair down
//! before spawning a new one, and every teardown bumps a generation counter
//! so results from a torn-down pair are discarded. Timer tasks hold a `Weak`
//! reference and read the current token from the shared state at call time.
//!
//! The state mutex is never held across an `.await`.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::config::SessionSettings;
use crate::domain::{
    ActiveSession, BalanceService, GameId, PlayerId, SessionService, SessionToken,
};
use crate::infrastructure::metrics;
use crate::shared::error::{ApiError, PlayError};
use crate::shared::formatters::{format_cost, format_play_time};

/// Lifecycle phase of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayPhase {
    Idle,
    Starting,
    Playing,
    /// Playing while the page is hidden; timers are down, the token is kept.
    Suspended,
    Stopping,
    Error,
}

impl PlayPhase {
    pub fn is_playing(self) -> bool {
        matches!(self, PlayPhase::Playing | PlayPhase::Suspended)
    }
}

/// Visibility of the hosting page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

/// Result of `start_play`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// Game or player id missing; nothing happened.
    Skipped,
    /// No session existed; a new one was opened.
    Started,
    /// An unexpired server session was adopted.
    Resumed,
    /// The reported session had expired and was replaced.
    Restarted,
}

/// Result of `stop_play`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// No token held; nothing happened.
    NotPlaying,
    Stopped,
}

/// Readout published to UI consumers on every state change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaySnapshot {
    pub phase: PlayPhase,
    pub is_playing: bool,
    pub loading: bool,
    pub error: Option<String>,
    pub play_time_secs: u64,
    pub total_cost: f64,
    pub has_session: bool,
}

impl PlaySnapshot {
    pub fn play_time_label(&self) -> String {
        format_play_time(self.play_time_secs)
    }

    pub fn cost_label(&self) -> String {
        format_cost(self.total_cost)
    }
}

/// Heartbeat and display intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTiming {
    pub heartbeat_interval: Duration,
    pub display_tick: Duration,
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(30),
            display_tick: Duration::from_secs(1),
        }
    }
}

impl From<&SessionSettings> for SessionTiming {
    fn from(settings: &SessionSettings) -> Self {
        Self {
            heartbeat_interval: settings.heartbeat_interval(),
            display_tick: settings.display_tick(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum RearmReason {
    Start,
    Resume,
    ResumeAfterExpiry,
    ResumeFromBackground,
}

impl RearmReason {
    fn as_str(self) -> &'static str {
        match self {
            RearmReason::Start => "start",
            RearmReason::Resume => "resume",
            RearmReason::ResumeAfterExpiry => "resume_after_expiry",
            RearmReason::ResumeFromBackground => "resume_from_background",
        }
    }
}

/// Heartbeat and display tasks of one armed generation.
struct TimerPair {
    heartbeat: JoinHandle<()>,
    display: JoinHandle<()>,
}

impl TimerPair {
    fn live(&self) -> usize {
        [&self.heartbeat, &self.display]
            .iter()
            .filter(|handle| !handle.is_finished())
            .count()
    }
}

impl Drop for TimerPair {
    fn drop(&mut self) {
        self.heartbeat.abort();
        self.display.abort();
    }
}

struct ControllerState {
    phase: PlayPhase,
    session: Option<ActiveSession>,
    player: Option<PlayerId>,
    game: Option<GameId>,
    /// Instant at which play time was zero.
    anchor: Option<Instant>,
    play_time: u64,
    error: Option<String>,
    loading: bool,
    visibility: Visibility,
    timers: Option<TimerPair>,
    generation: u64,
}

impl ControllerState {
    fn new() -> Self {
        Self {
            phase: PlayPhase::Idle,
            session: None,
            player: None,
            game: None,
            anchor: None,
            play_time: 0,
            error: None,
            loading: false,
            visibility: Visibility::Visible,
            timers: None,
            generation: 0,
        }
    }

    fn set_phase(&mut self, phase: PlayPhase) {
        match (self.phase.is_playing(), phase.is_playing()) {
            (false, true) => metrics::session_attached(),
            (true, false) => metrics::session_detached(),
            _ => {}
        }
        self.phase = phase;
    }

    /// Abort the armed timer pair, if any, and invalidate its generation.
    fn teardown(&mut self) {
        self.generation += 1;
        if self.timers.take().is_some() {
            debug!(generation = self.generation, "Timers torn down");
        }
    }

    fn fail(&mut self, message: String) {
        self.teardown();
        self.loading = false;
        self.error = Some(message);
        self.set_phase(PlayPhase::Error);
    }

    fn token(&self) -> Option<SessionToken> {
        self.session.as_ref().map(|s| s.token.clone())
    }

    fn snapshot(&self) -> PlaySnapshot {
        PlaySnapshot {
            phase: self.phase,
            is_playing: self.phase.is_playing(),
            loading: self.loading,
            error: self.error.clone(),
            play_time_secs: self.play_time,
            total_cost: self.session.as_ref().map(|s| s.total_cost).unwrap_or(0.0),
            has_session: self.session.is_some(),
        }
    }
}

impl Drop for ControllerState {
    fn drop(&mut self) {
        if self.phase.is_playing() {
            metrics::session_detached();
        }
    }
}

/// Session acquired by `start_play`, ready to be attached.
struct Attach {
    outcome: StartOutcome,
    session: ActiveSession,
    anchor_secs: u64,
    reason: RearmReason,
}

struct Shared<S, B> {
    sessions: Arc<S>,
    balances: Arc<B>,
    timing: SessionTiming,
    state: Mutex<ControllerState>,
    updates: watch::Sender<PlaySnapshot>,
}

impl<S, B> Shared<S, B>
where
    S: SessionService + 'static,
    B: BalanceService + 'static,
{
    fn publish(&self, state: &ControllerState) {
        self.updates.send_replace(state.snapshot());
    }

    /// Tear down any armed pair, re-anchor play time and arm a fresh pair.
    ///
    /// While the page is hidden the session is attached suspended instead.
    fn rearm(self: &Arc<Self>, state: &mut ControllerState, reason: RearmReason) {
        state.teardown();

        let now = Instant::now();
        state.anchor = Some(
            now.checked_sub(Duration::from_secs(state.play_time))
                .unwrap_or(now),
        );

        if state.visibility == Visibility::Hidden {
            state.set_phase(PlayPhase::Suspended);
            debug!(reason = reason.as_str(), "Page hidden, session attached suspended");
            return;
        }

        let generation = state.generation;
        let heartbeat = tokio::spawn(heartbeat_loop(
            Arc::downgrade(self),
            generation,
            self.timing.heartbeat_interval,
        ));
        let display = tokio::spawn(display_loop(
            Arc::downgrade(self),
            generation,
            self.timing.display_tick,
        ));

        state.timers = Some(TimerPair { heartbeat, display });
        state.set_phase(PlayPhase::Playing);
        debug!(reason = reason.as_str(), generation, "Timers armed");
    }

    /// One heartbeat tick. Returns `false` when the timer pair should exit.
    async fn heartbeat_tick(self: &Arc<Self>, generation: u64) -> bool {
        let token = {
            let state = self.state.lock();
            if state.generation != generation {
                return false;
            }
            match state.token() {
                Some(token) => token,
                None => return false,
            }
        };

        let result = self.sessions.heartbeat(&token).await;

        let player = {
            let mut state = self.state.lock();
            if state.generation != generation {
                debug!("Discarding heartbeat result of a torn-down timer pair");
                return false;
            }

            match result {
                Ok(ack) => {
                    let Some(session) = state.session.as_mut() else {
                        return false;
                    };
                    let rotated = session.apply(ack);
                    let (total_cost, active_play_time) =
                        (session.total_cost, session.active_play_time);

                    metrics::record_heartbeat(if rotated { "rotated" } else { "ok" });
                    debug!(rotated, total_cost, active_play_time, "Heartbeat acknowledged");
                    self.publish(&state);
                    state.player.clone()
                }
                Err(e) => {
                    metrics::record_heartbeat("failed");
                    error!(error = %e, "Heartbeat failed, ending play session");
                    state.fail(heartbeat_failure_message(&e));
                    self.publish(&state);
                    return false;
                }
            }
        };

        if let Some(player) = player {
            self.refresh_balance(&player).await;
        }
        true
    }

    /// Recompute displayed play time from the anchor.
    fn display_tick(&self, generation: u64) -> bool {
        let mut state = self.state.lock();
        if state.generation != generation {
            return false;
        }

        if let Some(anchor) = state.anchor {
            let secs = anchor.elapsed().as_secs();
            if secs != state.play_time {
                state.play_time = secs;
                self.publish(&state);
            }
        }
        true
    }

    async fn refresh_balance(&self, player: &PlayerId) {
        if let Err(e) = self.balances.fetch_balance(player).await {
            warn!(player = %player, error = %e, "Balance refresh failed");
        }
    }
}

async fn heartbeat_loop<S, B>(weak: Weak<Shared<S, B>>, generation: u64, period: Duration)
where
    S: SessionService + 'static,
    B: BalanceService + 'static,
{
    // First tick one full period out; the session was just validated
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let Some(shared) = weak.upgrade() else {
            break;
        };
        if !shared.heartbeat_tick(generation).await {
            break;
        }
    }
}

async fn display_loop<S, B>(weak: Weak<Shared<S, B>>, generation: u64, period: Duration)
where
    S: SessionService + 'static,
    B: BalanceService + 'static,
{
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        let Some(shared) = weak.upgrade() else {
            break;
        };
        if !shared.display_tick(generation) {
            break;
        }
    }
}

fn heartbeat_failure_message(e: &ApiError) -> String {
    format!("Connection lost ({}). Please start the game again.", e)
}

/// Controller for one play session at a time.
///
/// Cheap to clone; clones share the same session. Dropping the last clone
/// aborts any armed timers.
pub struct PlaySessionController<S, B>
where
    S: SessionService + 'static,
    B: BalanceService + 'static,
{
    shared: Arc<Shared<S, B>>,
}

impl<S, B> Clone for PlaySessionController<S, B>
where
    S: SessionService + 'static,
    B: BalanceService + 'static,
{
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<S, B> PlaySessionController<S, B>
where
    S: SessionService + 'static,
    B: BalanceService + 'static,
{
    /// Create an idle controller.
    pub fn new(sessions: Arc<S>, balances: Arc<B>, timing: SessionTiming) -> Self {
        let state = ControllerState::new();
        let (updates, _) = watch::channel(state.snapshot());

        Self {
            shared: Arc::new(Shared {
                sessions,
                balances,
                timing,
                state: Mutex::new(state),
                updates,
            }),
        }
    }

    /// Start or resume a play session.
    ///
    /// Blank `game_id` or `player_id` makes this a no-op returning
    /// `StartOutcome::Skipped`. Failures leave the controller in `Error`
    /// with `is_playing() == false` and are also returned.
    pub async fn start_play(
        &self,
        game_id: &str,
        player_id: &str,
    ) -> Result<StartOutcome, PlayError> {
        let (Some(game), Some(player)) = (GameId::parse(game_id), PlayerId::parse(player_id))
        else {
            debug!("start_play without game or player id, ignoring");
            return Ok(StartOutcome::Skipped);
        };

        let generation = {
            let mut state = self.shared.state.lock();
            if state.loading {
                return Err(PlayError::Busy);
            }
            state.teardown();
            state.loading = true;
            state.error = None;
            state.set_phase(PlayPhase::Starting);
            self.shared.publish(&state);
            state.generation
        };

        info!(player = %player, game = %game, "Starting play session");

        let attach = match self.acquire(&player, &game).await {
            Ok(attach) => attach,
            Err(e) => {
                warn!(player = %player, game = %game, error = %e, "Failed to start play session");
                let mut state = self.shared.state.lock();
                state.fail(e.to_string());
                self.shared.publish(&state);
                return Err(e.into());
            }
        };

        let outcome = attach.outcome;
        {
            let mut state = self.shared.state.lock();
            state.session = Some(attach.session);
            state.player = Some(player.clone());
            state.game = Some(game.clone());
            state.play_time = attach.anchor_secs;
            state.loading = false;
            state.error = None;
            if state.generation == generation {
                self.shared.rearm(&mut state, attach.reason);
            } else {
                // Shut down while acquiring: keep the session, arm nothing
                info!(player = %player, "Controller shut down during start, session attached suspended");
                state.anchor = None;
                state.set_phase(PlayPhase::Suspended);
            }
            self.shared.publish(&state);
        }

        info!(player = %player, game = %game, outcome = ?outcome, "Play session attached");

        if outcome == StartOutcome::Resumed {
            self.shared.refresh_balance(&player).await;
        }
        Ok(outcome)
    }

    async fn acquire(&self, player: &PlayerId, game: &GameId) -> Result<Attach, ApiError> {
        let sessions = &self.shared.sessions;
        let current = sessions.current_session(player).await?;

        match current.active() {
            Some(info) if !info.is_expired() => {
                let mut session = ActiveSession::resumed(info);
                let ack = sessions.heartbeat(&session.token).await.inspect_err(|_| {
                    metrics::record_heartbeat("failed");
                })?;
                let rotated = session.apply(ack);
                metrics::record_heartbeat(if rotated { "rotated" } else { "ok" });

                Ok(Attach {
                    outcome: StartOutcome::Resumed,
                    session,
                    anchor_secs: info.active_play_time,
                    reason: RearmReason::Resume,
                })
            }
            Some(stale) => {
                info!(expires_at = %stale.expires_at, "Reported session expired, replacing it");
                if let Err(e) = sessions.stop_session(&stale.session_token).await {
                    warn!(error = %e, "Failed to stop expired session");
                }

                let started = sessions.start_session(player, game).await?;
                Ok(Attach {
                    outcome: StartOutcome::Restarted,
                    session: ActiveSession::started(started),
                    anchor_secs: 0,
                    reason: RearmReason::ResumeAfterExpiry,
                })
            }
            None => {
                let started = sessions.start_session(player, game).await?;
                Ok(Attach {
                    outcome: StartOutcome::Started,
                    session: ActiveSession::started(started),
                    anchor_secs: 0,
                    reason: RearmReason::Start,
                })
            }
        }
    }

    /// Stop the current session.
    ///
    /// Without a held token this is a no-op. Timers are torn down before the
    /// stop call is sent. On failure the controller enters `Error` but keeps
    /// the token so the stop can be retried.
    pub async fn stop_play(&self) -> Result<StopOutcome, PlayError> {
        let token = {
            let mut state = self.shared.state.lock();
            let Some(token) = state.token() else {
                return Ok(StopOutcome::NotPlaying);
            };
            if state.loading {
                return Err(PlayError::Busy);
            }
            state.teardown();
            state.loading = true;
            state.error = None;
            state.set_phase(PlayPhase::Stopping);
            self.shared.publish(&state);
            token
        };

        match self.shared.sessions.stop_session(&token).await {
            Ok(()) => {
                let player = {
                    let mut state = self.shared.state.lock();
                    state.session = None;
                    state.anchor = None;
                    state.play_time = 0;
                    state.loading = false;
                    state.set_phase(PlayPhase::Idle);
                    self.shared.publish(&state);
                    state.player.clone()
                };

                info!("Play session stopped");
                if let Some(player) = player {
                    self.shared.refresh_balance(&player).await;
                }
                Ok(StopOutcome::Stopped)
            }
            Err(e) => {
                warn!(error = %e, "Failed to stop play session");
                let mut state = self.shared.state.lock();
                state.fail(e.to_string());
                self.shared.publish(&state);
                Err(e.into())
            }
        }
    }

    /// React to the hosting page becoming hidden or visible.
    ///
    /// Hidden suspends a playing session without touching the token.
    /// Visible resumes a suspended one: one immediate heartbeat with the
    /// held token, then timers re-armed from the last displayed play time.
    /// Repeated events are no-ops.
    /// A failed resume heartbeat is fatal, like any heartbeat failure.
    pub async fn set_visibility(&self, visibility: Visibility) -> Result<(), PlayError> {
        let (token, generation) = {
            let mut state = self.shared.state.lock();
            state.visibility = visibility;

            if visibility == Visibility::Hidden {
                if state.phase == PlayPhase::Playing {
                    state.teardown();
                    state.set_phase(PlayPhase::Suspended);
                    self.shared.publish(&state);
                    debug!("Page hidden, play session suspended");
                }
                return Ok(());
            }

            if state.phase != PlayPhase::Suspended || state.loading {
                return Ok(());
            }
            let Some(token) = state.token() else {
                return Ok(());
            };
            state.loading = true;
            self.shared.publish(&state);
            (token, state.generation)
        };

        let result = self.shared.sessions.heartbeat(&token).await;

        let player = {
            let mut state = self.shared.state.lock();
            state.loading = false;
            if state.generation != generation || state.phase != PlayPhase::Suspended {
                self.shared.publish(&state);
                return Ok(());
            }

            match result {
                Ok(ack) => {
                    if let Some(session) = state.session.as_mut() {
                        let rotated = session.apply(ack);
                        metrics::record_heartbeat(if rotated { "rotated" } else { "ok" });
                    }
                    self.shared.rearm(&mut state, RearmReason::ResumeFromBackground);
                    self.shared.publish(&state);
                    state.player.clone()
                }
                Err(e) => {
                    metrics::record_heartbeat("failed");
                    error!(error = %e, "Resume heartbeat failed, ending play session");
                    state.fail(heartbeat_failure_message(&e));
                    self.shared.publish(&state);
                    return Err(e.into());
                }
            }
        };

        if let Some(player) = player {
            self.shared.refresh_balance(&player).await;
        }
        Ok(())
    }

    /// Tear down timers without ending the session (component unmount).
    ///
    /// A playing session is left `Suspended` with its token. The next
    /// `set_visibility(Visibility::Visible)` resumes it, as does a new
    /// `start_play`. A start still in flight attaches its session
    /// suspended instead of arming timers.
    pub fn shutdown(&self) {
        let mut state = self.shared.state.lock();
        state.teardown();
        if state.phase == PlayPhase::Playing {
            state.set_phase(PlayPhase::Suspended);
        }
        self.shared.publish(&state);
    }

    pub fn snapshot(&self) -> PlaySnapshot {
        self.shared.state.lock().snapshot()
    }

    /// Receive a snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<PlaySnapshot> {
        self.shared.updates.subscribe()
    }

    pub fn phase(&self) -> PlayPhase {
        self.shared.state.lock().phase
    }

    pub fn is_playing(&self) -> bool {
        self.phase().is_playing()
    }

    /// Whether a start, stop or resume call is in flight.
    pub fn is_loading(&self) -> bool {
        self.shared.state.lock().loading
    }

    pub fn error(&self) -> Option<String> {
        self.shared.state.lock().error.clone()
    }

    /// Displayed play time in seconds.
    pub fn play_time(&self) -> u64 {
        self.shared.state.lock().play_time
    }

    pub fn total_cost(&self) -> f64 {
        self.shared
            .state
            .lock()
            .session
            .as_ref()
            .map(|s| s.total_cost)
            .unwrap_or(0.0)
    }

    pub fn session_token(&self) -> Option<SessionToken> {
        self.shared.state.lock().token()
    }

    /// Game of the current or last session.
    pub fn game(&self) -> Option<GameId> {
        self.shared.state.lock().game.clone()
    }

    /// Number of running interval tasks: 0 when disarmed, 2 when armed.
    pub fn armed_intervals(&self) -> usize {
        self.shared
            .state
            .lock()
            .timers
            .as_ref()
            .map(TimerPair::live)
            .unwrap_or(0)
    }
}

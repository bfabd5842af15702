//! Overlapping calls: in-flight heartbeats, busy guards and shutdown
//! during a start.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio::time::sleep;

use playtime_client::application::services::{PlayPhase, StartOutcome, StopOutcome, Visibility};
use playtime_client::shared::error::PlayError;

use crate::common::*;

/// Start, then park the first heartbeat (issued at 30 s) in flight until 35 s.
async fn heartbeat_in_flight() -> (TestController, Arc<FakeSessionService>, Arc<FakeBalanceService>) {
    let (ctl, sessions, balances) = controller();
    ctl.start_play(GAME, WALLET).await.unwrap();

    sessions.delay(Op::Heartbeat, Duration::from_secs(5));
    sessions.push_heartbeat(Ok(ack(Some("tok-late"), 0.5, 30)));

    sleep(Duration::from_millis(30_100)).await;
    assert_eq!(sessions.heartbeat_count(), 1);
    (ctl, sessions, balances)
}

#[tokio::test(start_paused = true)]
async fn test_stop_discards_in_flight_heartbeat() {
    let (ctl, sessions, balances) = heartbeat_in_flight().await;

    assert_eq!(ctl.stop_play().await.unwrap(), StopOutcome::Stopped);
    sleep(Duration::from_secs(10)).await;

    assert_eq!(ctl.phase(), PlayPhase::Idle);
    assert!(ctl.session_token().is_none());
    assert_eq!(ctl.total_cost(), 0.0);
    assert_eq!(ctl.armed_intervals(), 0);
    assert_eq!(sessions.calls().last(), Some(&Call::Stop("tok-1".into())));
    assert_eq!(sessions.heartbeat_count(), 1);
    assert_eq!(balances.refresh_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_hidden_discards_in_flight_heartbeat() {
    let (ctl, sessions, balances) = heartbeat_in_flight().await;

    ctl.set_visibility(Visibility::Hidden).await.unwrap();
    sleep(Duration::from_secs(10)).await;

    assert_eq!(ctl.phase(), PlayPhase::Suspended);
    assert_eq!(ctl.session_token().unwrap().expose(), "tok-1");
    assert_eq!(ctl.total_cost(), 0.0);
    assert_eq!(ctl.play_time(), 30);
    assert_eq!(ctl.armed_intervals(), 0);
    assert_eq!(sessions.heartbeat_count(), 1);
    assert_eq!(balances.refresh_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_restart_discards_in_flight_heartbeat() {
    let (ctl, sessions, _balances) = heartbeat_in_flight().await;

    assert_eq!(ctl.start_play(GAME, WALLET).await.unwrap(), StartOutcome::Started);
    sleep(Duration::from_secs(10)).await;

    assert_eq!(ctl.phase(), PlayPhase::Playing);
    assert_eq!(ctl.session_token().unwrap().expose(), "tok-2");
    assert_eq!(ctl.total_cost(), 0.0);
    assert_eq!(ctl.armed_intervals(), 2);
    assert_eq!(sessions.heartbeat_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_start_while_start_in_flight_is_busy() {
    let (ctl, sessions, _balances) = controller();
    sessions.delay(Op::Current, Duration::from_secs(2));

    let pending = tokio::spawn({
        let ctl = ctl.clone();
        async move { ctl.start_play(GAME, WALLET).await }
    });
    sleep(Duration::from_millis(500)).await;

    assert!(ctl.is_loading());
    assert_eq!(ctl.phase(), PlayPhase::Starting);
    assert!(matches!(ctl.start_play(GAME, WALLET).await, Err(PlayError::Busy)));

    assert_eq!(pending.await.unwrap().unwrap(), StartOutcome::Started);
    assert_eq!(ctl.phase(), PlayPhase::Playing);
    assert_eq!(ctl.armed_intervals(), 2);
    assert_eq!(
        sessions.calls(),
        vec![
            Call::Current(WALLET.into()),
            Call::Start {
                player: WALLET.into(),
                game: GAME.into()
            },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_start_or_stop_while_stop_in_flight_is_busy() {
    let (ctl, sessions, _balances) = controller();
    ctl.start_play(GAME, WALLET).await.unwrap();
    sessions.delay(Op::Stop, Duration::from_secs(2));

    let pending = tokio::spawn({
        let ctl = ctl.clone();
        async move { ctl.stop_play().await }
    });
    sleep(Duration::from_millis(500)).await;

    assert_eq!(ctl.phase(), PlayPhase::Stopping);
    assert!(matches!(ctl.stop_play().await, Err(PlayError::Busy)));
    assert!(matches!(ctl.start_play(GAME, WALLET).await, Err(PlayError::Busy)));

    assert_eq!(pending.await.unwrap().unwrap(), StopOutcome::Stopped);
    assert_eq!(ctl.phase(), PlayPhase::Idle);
    let stops = sessions
        .calls()
        .into_iter()
        .filter(|call| matches!(call, Call::Stop(_)))
        .count();
    assert_eq!(stops, 1);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_during_start_arms_no_timers() {
    let (ctl, sessions, _balances) = controller();
    sessions.delay(Op::Current, Duration::from_secs(2));

    let pending = tokio::spawn({
        let ctl = ctl.clone();
        async move { ctl.start_play(GAME, WALLET).await }
    });
    sleep(Duration::from_millis(500)).await;
    ctl.shutdown();

    assert_eq!(pending.await.unwrap().unwrap(), StartOutcome::Started);
    assert_eq!(ctl.armed_intervals(), 0);
    assert_eq!(ctl.phase(), PlayPhase::Suspended);
    assert!(!ctl.is_loading());
    assert_eq!(ctl.session_token().unwrap().expose(), "tok-1");

    sleep(Duration::from_secs(60)).await;
    assert_eq!(sessions.heartbeat_count(), 0);
    assert_eq!(ctl.play_time(), 0);

    // A remount's visible event picks the session back up
    ctl.set_visibility(Visibility::Visible).await.unwrap();
    assert_eq!(ctl.phase(), PlayPhase::Playing);
    assert_eq!(ctl.armed_intervals(), 2);
    assert_eq!(sessions.heartbeat_tokens(), vec!["tok-1".to_string()]);
}

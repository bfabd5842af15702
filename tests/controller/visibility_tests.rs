//! Suspend and resume on page visibility changes.

use std::time::Duration;

use tokio::time::sleep;

use playtime_client::application::services::{PlayPhase, StartOutcome, Visibility};

use crate::common::*;

#[tokio::test(start_paused = true)]
async fn test_hidden_page_suspends_timers() {
    let (ctl, sessions, _balances) = controller();
    ctl.start_play(GAME, WALLET).await.unwrap();

    sleep(Duration::from_millis(5_500)).await;
    ctl.set_visibility(Visibility::Hidden).await.unwrap();

    assert_eq!(ctl.phase(), PlayPhase::Suspended);
    assert!(ctl.is_playing());
    assert_eq!(ctl.armed_intervals(), 0);
    assert_eq!(ctl.session_token().unwrap().expose(), "tok-1");

    sleep(Duration::from_secs(90)).await;
    assert_eq!(sessions.heartbeat_count(), 0);
    assert_eq!(ctl.play_time(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_visible_page_resumes_from_displayed_time() {
    let (ctl, sessions, balances) = controller();
    ctl.start_play(GAME, WALLET).await.unwrap();

    sleep(Duration::from_millis(5_500)).await;
    ctl.set_visibility(Visibility::Hidden).await.unwrap();
    sleep(Duration::from_secs(100)).await;

    sessions.push_heartbeat(Ok(ack(None, 0.005, 5)));
    ctl.set_visibility(Visibility::Visible).await.unwrap();

    assert_eq!(ctl.phase(), PlayPhase::Playing);
    assert_eq!(ctl.armed_intervals(), 2);
    assert_eq!(sessions.heartbeat_tokens(), vec!["tok-1".to_string()]);
    assert_eq!(ctl.total_cost(), 0.005);
    assert_eq!(ctl.play_time(), 5);
    assert_eq!(balances.refresh_count(), 1);

    sleep(Duration::from_millis(2_100)).await;
    assert_eq!(ctl.play_time(), 7);
}

#[tokio::test(start_paused = true)]
async fn test_rapid_toggling_keeps_single_timer_pair() {
    let (ctl, sessions, _balances) = controller();
    ctl.start_play(GAME, WALLET).await.unwrap();

    for _ in 0..2 {
        ctl.set_visibility(Visibility::Hidden).await.unwrap();
        assert_eq!(ctl.armed_intervals(), 0);
        ctl.set_visibility(Visibility::Visible).await.unwrap();
        assert_eq!(ctl.armed_intervals(), 2);
    }
    // One immediate heartbeat per resume
    assert_eq!(sessions.heartbeat_count(), 2);

    sleep(Duration::from_millis(30_100)).await;
    assert_eq!(sessions.heartbeat_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_repeated_visibility_event_is_ignored() {
    let (ctl, sessions, _balances) = controller();
    ctl.start_play(GAME, WALLET).await.unwrap();

    ctl.set_visibility(Visibility::Visible).await.unwrap();

    assert_eq!(ctl.phase(), PlayPhase::Playing);
    assert_eq!(sessions.heartbeat_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_failed_resume_heartbeat_is_fatal() {
    let (ctl, sessions, _balances) = controller();
    ctl.start_play(GAME, WALLET).await.unwrap();
    ctl.set_visibility(Visibility::Hidden).await.unwrap();

    sessions.push_heartbeat(Err((410, r#"{"message":"session expired"}"#)));
    let err = ctl.set_visibility(Visibility::Visible).await.unwrap_err();

    assert_eq!(err.to_string(), "session expired");
    assert_eq!(ctl.phase(), PlayPhase::Error);
    assert!(!ctl.is_playing());
    assert_eq!(ctl.armed_intervals(), 0);
    assert!(ctl.error().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_start_while_hidden_attaches_suspended() {
    let (ctl, sessions, _balances) = controller();
    ctl.set_visibility(Visibility::Hidden).await.unwrap();

    let outcome = ctl.start_play(GAME, WALLET).await.unwrap();

    assert_eq!(outcome, StartOutcome::Started);
    assert_eq!(ctl.phase(), PlayPhase::Suspended);
    assert_eq!(ctl.armed_intervals(), 0);

    ctl.set_visibility(Visibility::Visible).await.unwrap();
    assert_eq!(ctl.phase(), PlayPhase::Playing);
    assert_eq!(sessions.heartbeat_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stop_while_suspended() {
    let (ctl, sessions, _balances) = controller();
    ctl.start_play(GAME, WALLET).await.unwrap();
    ctl.set_visibility(Visibility::Hidden).await.unwrap();

    ctl.stop_play().await.unwrap();

    assert_eq!(ctl.phase(), PlayPhase::Idle);
    assert_eq!(sessions.calls().last(), Some(&Call::Stop("tok-1".into())));

    // Becoming visible again has nothing to resume
    ctl.set_visibility(Visibility::Visible).await.unwrap();
    assert_eq!(ctl.phase(), PlayPhase::Idle);
    assert_eq!(sessions.heartbeat_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_visible_after_shutdown_resumes() {
    let (ctl, sessions, _balances) = controller();
    ctl.start_play(GAME, WALLET).await.unwrap();
    sleep(Duration::from_millis(5_500)).await;

    ctl.shutdown();
    assert_eq!(ctl.phase(), PlayPhase::Suspended);
    assert_eq!(ctl.armed_intervals(), 0);

    ctl.set_visibility(Visibility::Visible).await.unwrap();

    assert_eq!(ctl.phase(), PlayPhase::Playing);
    assert_eq!(ctl.armed_intervals(), 2);
    assert_eq!(sessions.heartbeat_tokens(), vec!["tok-1".to_string()]);
    assert_eq!(ctl.play_time(), 5);
}

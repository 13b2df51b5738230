//! Capture strategy tests driven through the turn controller

mod common;

use common::{wait_until, Harness, ScriptedRecognizer, ScriptedTransport};
use parley::capture::{CaptureError, RecognitionEvent};
use parley::session::TurnEvent;
use parley::CaptureKind;
use std::sync::atomic::Ordering;

const NO_SPEECH: &str = "No speech detected. Please try again.";

#[tokio::test(start_paused = true)]
async fn test_tap_runs_a_turn() {
    let h = Harness::new(CaptureKind::Tap, ScriptedTransport::replying("Since Tuesday."));
    h.recognizer.push_once(Ok("  when did it start ".into()));

    h.controller.start_capture().await;

    let snapshot = h.controller.snapshot();
    assert_eq!(snapshot.display.user().unwrap().content, "when did it start");
    assert_eq!(snapshot.display.reply().unwrap().content, "Since Tuesday.");
    assert!(!snapshot.loading);
    assert!(!snapshot.processing);
    assert!(!snapshot.listening);
}

#[tokio::test(start_paused = true)]
async fn test_tap_with_no_speech_publishes_error() {
    let h = Harness::new(CaptureKind::Tap, ScriptedTransport::replying("unused"));
    h.recognizer.push_once(Ok("   ".into()));

    h.controller.start_capture().await;

    let snapshot = h.controller.snapshot();
    assert_eq!(snapshot.error.as_deref(), Some(NO_SPEECH));
    assert!(snapshot.display.is_empty());
    assert!(!snapshot.loading);
    assert!(h.transport.utterances().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_tap_recognition_failure() {
    let h = Harness::new(CaptureKind::Tap, ScriptedTransport::replying("unused"));
    h.recognizer
        .push_once(Err(CaptureError::RecognitionFailed("timeout".into())));

    h.controller.start_capture().await;

    assert_eq!(
        h.controller.state().error().as_deref(),
        Some("Speech recognition failed. Please try again or use text input.")
    );
    assert!(h.transport.utterances().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_start_clears_previous_error() {
    let h = Harness::new(CaptureKind::Tap, ScriptedTransport::replying("Okay."));
    h.recognizer.push_once(Ok(String::new()));
    h.recognizer.push_once(Ok("hello there".into()));

    h.controller.start_capture().await;
    assert!(h.controller.state().error().is_some());

    h.controller.start_capture().await;
    assert!(h.controller.state().error().is_none());
    assert_eq!(h.transport.utterances(), vec!["hello there".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_toggle_accumulates_recognized_segments() {
    let h = Harness::new(CaptureKind::Toggle, ScriptedTransport::replying("Yes, a little."));
    let events = h.controller.events();

    h.controller.start_capture().await;
    assert!(h.controller.state().is_listening());

    assert!(h.recognizer.emit(RecognitionEvent::Recognizing("are you".into())));
    assert!(h.recognizer.emit(RecognitionEvent::Recognized("Are you dizzy".into())));
    assert!(h.recognizer.emit(RecognitionEvent::Recognized("at all".into())));
    wait_until(|| h.controller.snapshot().interim_text.as_deref() == Some("Are you dizzy at all"))
        .await;

    h.controller.stop_capture().await;

    assert_eq!(h.transport.utterances(), vec!["Are you dizzy at all".to_string()]);
    let snapshot = h.controller.snapshot();
    assert!(!snapshot.listening);
    assert!(!snapshot.processing);
    assert!(snapshot.interim_text.is_none());
    assert!(!h.recognizer.is_open());

    let seen: Vec<TurnEvent> = events.try_iter().collect();
    assert_eq!(
        seen[0],
        TurnEvent::CaptureStarted {
            kind: CaptureKind::Toggle
        }
    );
    assert!(seen.contains(&TurnEvent::Interim("Are you dizzy".into())));
    assert!(seen.contains(&TurnEvent::CaptureStopped));
}

#[tokio::test(start_paused = true)]
async fn test_toggle_stop_without_speech() {
    let h = Harness::new(CaptureKind::Toggle, ScriptedTransport::replying("unused"));

    h.controller.start_capture().await;
    h.controller.stop_capture().await;

    let snapshot = h.controller.snapshot();
    assert_eq!(snapshot.error.as_deref(), Some(NO_SPEECH));
    assert!(snapshot.display.is_empty());
    assert!(!snapshot.listening);
}

#[tokio::test(start_paused = true)]
async fn test_hold_strips_repeated_role_label() {
    let h = Harness::new(CaptureKind::Hold, ScriptedTransport::replying("All the time."));

    h.controller.start_capture().await;
    h.recognizer.emit(RecognitionEvent::Recognizing("Nurse: it".into()));
    h.recognizer.emit(RecognitionEvent::Recognized("Nurse: it hurts".into()));
    h.recognizer.emit(RecognitionEvent::Recognized("Nurse: a lot".into()));
    h.controller.stop_capture().await;

    let submitted = h.transport.utterances();
    assert_eq!(submitted, vec!["it hurts a lot".to_string()]);
    assert!(!submitted[0].to_lowercase().contains("nurse: nurse:"));
    assert_eq!(
        h.controller.snapshot().display.user().unwrap().content,
        "it hurts a lot"
    );
}

#[tokio::test(start_paused = true)]
async fn test_hold_interim_replaces_partial() {
    let h = Harness::new(CaptureKind::Hold, ScriptedTransport::replying("Okay."));

    h.controller.start_capture().await;
    h.recognizer.emit(RecognitionEvent::Recognized("my leg".into()));
    h.recognizer.emit(RecognitionEvent::Recognizing("is swol".into()));
    h.recognizer.emit(RecognitionEvent::Recognizing("is swollen".into()));
    wait_until(|| h.controller.snapshot().interim_text.as_deref() == Some("my leg is swollen"))
        .await;

    // A partial that never finalized is kept on release
    h.controller.stop_capture().await;
    assert_eq!(h.transport.utterances(), vec!["my leg is swollen".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_canceled_session_reports_error_and_can_restart() {
    let h = Harness::new(CaptureKind::Toggle, ScriptedTransport::replying("Okay."));

    h.controller.start_capture().await;
    h.recognizer
        .emit(RecognitionEvent::Canceled("network lost".into()));
    wait_until(|| !h.controller.state().is_listening()).await;
    assert_eq!(
        h.controller.state().error().as_deref(),
        Some("Speech recognition failed. Please try again or use text input.")
    );

    h.controller.start_capture().await;
    assert!(h.controller.state().is_listening());
    assert!(h.controller.state().error().is_none());
    assert_eq!(h.recognizer.starts.load(Ordering::SeqCst), 2);
    assert_eq!(h.recognizer.stops.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_switching_strategy_discards_open_session() {
    let h = Harness::new(CaptureKind::Hold, ScriptedTransport::replying("unused"));

    h.controller.start_capture().await;
    h.recognizer.emit(RecognitionEvent::Recognized("never sent".into()));

    h.controller
        .select_capture_strategy(CaptureKind::Toggle)
        .await
        .unwrap();

    let snapshot = h.controller.snapshot();
    assert_eq!(snapshot.capture_kind, CaptureKind::Toggle);
    assert!(!snapshot.listening);
    assert!(!h.recognizer.is_open());
    assert_eq!(h.recognizer.stops.load(Ordering::SeqCst), 1);

    // Nothing left to stop on the new strategy
    h.controller.stop_capture().await;
    assert!(h.transport.utterances().is_empty());
    assert!(h.controller.snapshot().display.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_start_ignored_while_turn_in_flight() {
    let transport = ScriptedTransport::gated("Okay.");
    let h = Harness::new(CaptureKind::Tap, transport.clone());
    h.recognizer.push_once(Ok("should not run".into()));

    let controller = h.controller.clone();
    let typed = tokio::spawn(async move { controller.submit_text("typed first").await });
    wait_until(|| h.controller.state().is_turn_active()).await;

    h.controller.start_capture().await;
    assert_eq!(h.recognizer.once_calls.load(Ordering::SeqCst), 0);

    transport.release();
    typed.await.unwrap();
    assert_eq!(transport.utterances(), vec!["typed first".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_releases_session() {
    let h = Harness::new(CaptureKind::Toggle, ScriptedTransport::replying("unused"));

    h.controller.start_capture().await;
    assert!(h.recognizer.is_open());

    h.controller.shutdown().await;
    assert!(!h.recognizer.is_open());
    assert!(!h.controller.state().is_listening());
    assert!(h.transport.utterances().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_dropping_controller_closes_open_session() {
    let h = Harness::new(CaptureKind::Toggle, ScriptedTransport::replying("unused"));
    h.controller.start_capture().await;
    assert!(h.recognizer.is_open());

    let Harness {
        controller,
        recognizer,
        transport,
        ..
    } = h;
    drop(controller);

    wait_until(|| !recognizer.is_open()).await;
    assert_eq!(recognizer.stops.load(Ordering::SeqCst), 1);
    assert!(transport.utterances().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_start_ignored_while_tap_recognizes() {
    let recognizer = ScriptedRecognizer::gated();
    recognizer.push_once(Ok("first".into()));
    let h = Harness::with_recognizer(
        CaptureKind::Tap,
        ScriptedTransport::replying("Okay."),
        recognizer.clone(),
    );

    let controller = h.controller.clone();
    let tap = tokio::spawn(async move { controller.start_capture().await });
    wait_until(|| recognizer.once_calls.load(Ordering::SeqCst) == 1).await;
    assert!(h.controller.snapshot().processing);

    // The capture slot is held by the first tap
    h.controller.start_capture().await;
    assert_eq!(recognizer.once_calls.load(Ordering::SeqCst), 1);

    recognizer.release();
    tap.await.unwrap();
    assert_eq!(h.transport.utterances(), vec!["first".to_string()]);
    assert_eq!(h.controller.state().history_len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_start_ignored_while_hold_stops() {
    let recognizer = ScriptedRecognizer::gated();
    let h = Harness::with_recognizer(
        CaptureKind::Hold,
        ScriptedTransport::replying("Since this morning."),
        recognizer.clone(),
    );

    h.controller.start_capture().await;
    assert!(recognizer.emit(RecognitionEvent::Recognized("how long".into())));

    let controller = h.controller.clone();
    let release = tokio::spawn(async move { controller.stop_capture().await });
    wait_until(|| recognizer.stops.load(Ordering::SeqCst) == 1).await;

    h.controller.start_capture().await;
    assert_eq!(recognizer.starts.load(Ordering::SeqCst), 1);
    assert!(!h.controller.state().is_listening());

    recognizer.release();
    release.await.unwrap();
    assert_eq!(h.transport.utterances(), vec!["how long".to_string()]);
    assert!(!recognizer.is_open());
}

//! Turn controller
//!
//! Owns the single-flight turn guard, the reveal timer and the bound capture
//! strategy. Everything the presentation layer sees flows through
//! `SharedSessionState` and the `TurnEvent` channel.

use crate::capture::{
    build_strategy, CaptureConfig, CaptureError, CaptureKind, CaptureObserver, CaptureProgress,
    CaptureStrategy, SpeechRecognizer,
};
use crate::config::SessionConfig;
use crate::dialogue::{Dialogue, DialogueClient, DialogueReply};
use crate::session::events::TurnEvent;
use crate::session::state::{SessionSnapshot, SharedSessionState};
use crate::speech::{SpeechEngine, SpeechObserver, SynthesizerAdapter, VoiceProfile};
use crate::{ParleyError, Result};
use async_trait::async_trait;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, error, info, warn};

const EVENT_CAPACITY: usize = 256;

/// Pacing of the reply reveal
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnTiming {
    /// Delay between receiving a reply and showing it
    pub reveal_delay_ms: u64,
}

impl Default for TurnTiming {
    fn default() -> Self {
        Self {
            reveal_delay_ms: 800,
        }
    }
}

impl TurnTiming {
    pub fn reveal_delay(&self) -> Duration {
        Duration::from_millis(self.reveal_delay_ms)
    }
}

/// How a submitted utterance was handled
#[derive(Clone, Debug)]
pub enum TurnOutcome {
    /// The turn ran and produced a reply
    Replied(DialogueReply),
    /// Empty input, or another turn was still outstanding
    Ignored,
    /// The dialogue call failed; the error is published and nothing is revealed
    Failed(ParleyError),
}

impl TurnOutcome {
    pub fn reply(&self) -> Option<&str> {
        match self {
            TurnOutcome::Replied(reply) => Some(&reply.reply),
            _ => None,
        }
    }

    pub fn is_ignored(&self) -> bool {
        matches!(self, TurnOutcome::Ignored)
    }
}

/// Publishes capture and speech callbacks into session state
#[derive(Clone)]
struct StatePublisher {
    state: SharedSessionState,
    events: Sender<TurnEvent>,
}

impl StatePublisher {
    fn emit(&self, event: TurnEvent) {
        match self.events.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => debug!("Event queue full, dropping {:?}", event),
            Err(TrySendError::Disconnected(_)) => {}
        }
    }

    fn publish_error(&self, message: impl Into<String>) {
        let message = message.into();
        self.state.write().set_error(message.clone());
        self.emit(TurnEvent::Error(message));
    }
}

impl CaptureObserver for StatePublisher {
    fn on_interim(&self, text: &str) {
        self.state.write().interim_text = Some(text.to_string());
        self.emit(TurnEvent::Interim(text.to_string()));
    }

    fn on_error(&self, error: &CaptureError) {
        self.state.write().stop_listening();
        self.publish_error(error.user_message());
    }
}

impl SpeechObserver for StatePublisher {
    fn on_start(&self) {
        self.state.write().speaking = true;
        self.emit(TurnEvent::SpeakingStarted);
    }

    fn on_finish(&self) {
        self.state.write().speaking = false;
        self.emit(TurnEvent::SpeakingFinished);
    }

    fn on_error(&self, diagnostic: &str) {
        // The reply stays visible; playback failure is not a user error
        self.state.write().speaking = false;
        self.emit(TurnEvent::SpeechFailed {
            diagnostic: diagnostic.to_string(),
        });
    }
}

/// Releases the single-flight guard on every exit path
struct TurnGuard<'a>(&'a AtomicBool);

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

struct Inner {
    dialogue: Arc<dyn Dialogue>,
    synthesizer: SynthesizerAdapter,
    recognizer: Arc<dyn SpeechRecognizer>,
    voice: VoiceProfile,
    reveal_delay: Duration,
    capture_config: CaptureConfig,
    capture: AsyncMutex<Box<dyn CaptureStrategy>>,
    turn_in_flight: AtomicBool,
    publisher: Arc<StatePublisher>,
    state: SharedSessionState,
    event_rx: Receiver<TurnEvent>,
}

/// Root component of a conversation session. Cheap to clone; clones share the session.
#[derive(Clone)]
pub struct TurnController {
    inner: Arc<Inner>,
}

impl TurnController {
    pub fn builder() -> TurnControllerBuilder {
        TurnControllerBuilder::default()
    }

    /// Current session state for rendering
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.state.snapshot()
    }

    pub fn state(&self) -> &SharedSessionState {
        &self.inner.state
    }

    /// Receiver for session notifications
    pub fn events(&self) -> Receiver<TurnEvent> {
        self.inner.event_rx.clone()
    }

    pub fn voice(&self) -> &VoiceProfile {
        &self.inner.voice
    }

    /// Run one conversational turn for `utterance`.
    ///
    /// Rejected while another turn is outstanding. The reply is published hidden
    /// and revealed after the configured delay, at which point it is spoken.
    pub async fn begin_turn(&self, utterance: &str) -> TurnOutcome {
        let utterance = utterance.trim();
        if utterance.is_empty() {
            return TurnOutcome::Ignored;
        }

        let inner = &self.inner;
        if inner
            .turn_in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Turn already in flight, ignoring submission");
            inner.publisher.emit(TurnEvent::TurnIgnored);
            return TurnOutcome::Ignored;
        }
        let _guard = TurnGuard(&inner.turn_in_flight);

        let (turn_id, conversation) = {
            let mut state = inner.state.write();
            let turn_id = state.begin_turn(utterance);
            (turn_id, state.conversation.clone())
        };
        info!("Turn {} started", turn_id);
        inner.publisher.emit(TurnEvent::TurnStarted {
            utterance: utterance.to_string(),
        });

        let outcome = match inner.dialogue.submit(utterance, &conversation).await {
            Ok(reply) => {
                inner
                    .state
                    .write()
                    .accept_reply(&reply.reply, reply.state.clone());
                inner.publisher.emit(TurnEvent::ReplyReceived {
                    reply: reply.reply.clone(),
                });
                self.schedule_reveal(turn_id, reply.reply.clone());
                TurnOutcome::Replied(reply)
            }
            Err(e) => {
                error!("Turn {} failed: {}", turn_id, e);
                inner.publisher.publish_error(e.user_message());
                TurnOutcome::Failed(e)
            }
        };

        inner.state.write().settle_turn();
        inner.publisher.emit(TurnEvent::TurnSettled);
        outcome
    }

    /// Reveal and speak the reply once the delay elapses.
    ///
    /// The timer is never cancelled: a reply still speaks if a newer turn has
    /// started, but only the current turn's bubble is revealed.
    fn schedule_reveal(&self, turn_id: u64, reply: String) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(inner.reveal_delay).await;

            if inner.state.write().reveal(turn_id) {
                inner.publisher.emit(TurnEvent::ReplyRevealed {
                    reply: reply.clone(),
                });
            } else {
                debug!("Turn {} superseded before reveal", turn_id);
            }

            inner
                .synthesizer
                .speak(&reply, &inner.voice, inner.publisher.as_ref())
                .await;
        });
    }

    /// Typed input path. Whitespace-only text is ignored.
    pub async fn submit_text(&self, text: &str) -> TurnOutcome {
        self.begin_turn(text).await
    }

    /// Start intent from the capture control.
    ///
    /// Ignored (not queued) while a turn is outstanding or another capture
    /// operation is running. For Tap this runs the whole recognition and the
    /// resulting turn.
    pub async fn start_capture(&self) {
        let inner = &self.inner;
        if inner.turn_in_flight.load(Ordering::SeqCst) {
            debug!("Start ignored: turn in flight");
            return;
        }
        let Ok(mut capture) = inner.capture.try_lock() else {
            debug!("Start ignored: capture busy");
            return;
        };

        if capture.is_listening() {
            if inner.state.read().listening {
                return;
            }
            // The backend aborted the last session; open a fresh one
            capture.teardown().await;
        }

        let kind = capture.kind();
        {
            let mut state = inner.state.write();
            state.clear_error();
            if kind == CaptureKind::Tap {
                state.processing = true;
                state.loading = true;
            }
        }

        let result = capture.start().await;
        drop(capture);

        match result {
            Ok(CaptureProgress::Finished(utterance)) => {
                inner.state.write().processing = false;
                self.begin_turn(&utterance).await;
                inner.state.write().loading = false;
            }
            Ok(CaptureProgress::Listening) => {
                inner.state.write().start_listening();
                info!("{} capture listening", kind);
                inner.publisher.emit(TurnEvent::CaptureStarted { kind });
            }
            Err(e) => self.capture_failed(e),
        }
    }

    /// Stop intent from the capture control. A no-op when nothing is listening.
    pub async fn stop_capture(&self) {
        let inner = &self.inner;
        let mut capture = inner.capture.lock().await;
        if !capture.is_listening() {
            return;
        }

        {
            let mut state = inner.state.write();
            state.stop_listening();
            state.processing = true;
        }
        inner.publisher.emit(TurnEvent::CaptureStopped);

        let result = capture.stop().await;
        drop(capture);

        match result {
            Ok(utterance) => {
                self.begin_turn(&utterance).await;
                inner.state.write().finish_capture();
            }
            Err(e) => self.capture_failed(e),
        }
    }

    fn capture_failed(&self, e: CaptureError) {
        warn!("Capture failed: {}", e);
        {
            let mut state = self.inner.state.write();
            state.finish_capture();
            if !state.turn_active {
                state.loading = false;
            }
        }
        self.inner.publisher.publish_error(e.user_message());
    }

    /// Swap the capture strategy. Any open session of the old one is torn down
    /// without producing an utterance.
    pub async fn select_capture_strategy(&self, kind: CaptureKind) -> Result<()> {
        let inner = &self.inner;
        let mut capture = inner.capture.lock().await;
        if capture.kind() == kind {
            return Ok(());
        }

        capture.teardown().await;
        *capture = build_strategy(
            kind,
            &inner.capture_config,
            Arc::clone(&inner.recognizer),
            inner.publisher.clone(),
        )?;

        {
            let mut state = inner.state.write();
            state.finish_capture();
            state.capture_kind = kind;
        }
        info!("Capture strategy set to {}", kind);
        Ok(())
    }

    /// Release the capture session. Pending reveal timers keep running.
    pub async fn shutdown(&self) {
        let mut capture = self.inner.capture.lock().await;
        capture.teardown().await;
        self.inner.state.write().finish_capture();
        info!("Session shut down");
    }
}

/// Stand-in recognizer for sessions without a capture device
pub struct NoRecognizer;

#[async_trait]
impl SpeechRecognizer for NoRecognizer {
    async fn recognize_once(&self) -> std::result::Result<String, CaptureError> {
        Err(CaptureError::DeviceUnavailable(
            "no recognizer configured".to_string(),
        ))
    }

    async fn start_continuous(
        &self,
        _events: tokio::sync::mpsc::UnboundedSender<crate::capture::RecognitionEvent>,
    ) -> std::result::Result<(), CaptureError> {
        Err(CaptureError::DeviceUnavailable(
            "no recognizer configured".to_string(),
        ))
    }

    async fn stop_continuous(&self) -> std::result::Result<(), CaptureError> {
        Ok(())
    }
}

/// Builder for `TurnController`
#[derive(Default)]
pub struct TurnControllerBuilder {
    config: SessionConfig,
    dialogue: Option<Arc<dyn Dialogue>>,
    engine: Option<Arc<dyn SpeechEngine>>,
    recognizer: Option<Arc<dyn SpeechRecognizer>>,
}

impl TurnControllerBuilder {
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the HTTP dialogue client
    pub fn dialogue(mut self, dialogue: Arc<dyn Dialogue>) -> Self {
        self.dialogue = Some(dialogue);
        self
    }

    pub fn speech_engine(mut self, engine: Arc<dyn SpeechEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn recognizer(mut self, recognizer: Arc<dyn SpeechRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    pub fn build(self) -> Result<TurnController> {
        self.config.validate()?;
        let config = self.config;

        let dialogue: Arc<dyn Dialogue> = match self.dialogue {
            Some(dialogue) => dialogue,
            None => Arc::new(DialogueClient::new(config.dialogue.clone())?),
        };
        let engine = self
            .engine
            .unwrap_or_else(|| config.speech.build_engine());
        let recognizer: Arc<dyn SpeechRecognizer> = match self.recognizer {
            Some(recognizer) => recognizer,
            None => Arc::new(NoRecognizer),
        };

        let (event_tx, event_rx) = bounded(EVENT_CAPACITY);
        let state = SharedSessionState::new(config.capture.strategy);
        let publisher = Arc::new(StatePublisher {
            state: state.clone(),
            events: event_tx,
        });

        let capture = build_strategy(
            config.capture.strategy,
            &config.capture,
            Arc::clone(&recognizer),
            publisher.clone(),
        )?;

        info!(
            "Session for {} ready ({} capture)",
            config.patient.name, config.capture.strategy
        );

        Ok(TurnController {
            inner: Arc::new(Inner {
                dialogue,
                synthesizer: SynthesizerAdapter::new(engine),
                recognizer,
                voice: config.patient.voice.clone(),
                reveal_delay: config.timing.reveal_delay(),
                capture_config: config.capture.clone(),
                capture: AsyncMutex::new(capture),
                turn_in_flight: AtomicBool::new(false),
                publisher,
                state,
                event_rx,
            }),
        })
    }
}

//! Scripted test doubles for session tests
#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use parley::capture::{CaptureError, CaptureKind, RecognitionEvent, SpeechRecognizer};
use parley::dialogue::{DialogueClient, DialogueError, DialogueTransport};
use parley::session::TurnController;
use parley::speech::{SpeechEngine, VoiceProfile};
use parley::{CaptureConfig, ParleyError, SessionConfig};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Semaphore;

/// Recognizer driven by the test: queued one-shot results and events pushed
/// into the open continuous session. A gated recognizer holds each one-shot
/// call and each stop until the test releases it.
#[derive(Default)]
pub struct ScriptedRecognizer {
    once: Mutex<VecDeque<Result<String, CaptureError>>>,
    sink: Mutex<Option<UnboundedSender<RecognitionEvent>>>,
    gate: Option<Semaphore>,
    pub once_calls: AtomicUsize,
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
}

impl ScriptedRecognizer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn gated() -> Arc<Self> {
        Arc::new(Self {
            gate: Some(Semaphore::new(0)),
            ..Self::default()
        })
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    async fn pass_gate(&self) -> Result<(), CaptureError> {
        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|e| CaptureError::RecognitionFailed(e.to_string()))?
                .forget();
        }
        Ok(())
    }

    pub fn push_once(&self, result: Result<String, CaptureError>) {
        self.once.lock().push_back(result);
    }

    /// Deliver an event to the open session; false if none is open
    pub fn emit(&self, event: RecognitionEvent) -> bool {
        match self.sink.lock().as_ref() {
            Some(sink) => sink.send(event).is_ok(),
            None => false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.sink.lock().is_some()
    }
}

#[async_trait]
impl SpeechRecognizer for ScriptedRecognizer {
    async fn recognize_once(&self) -> Result<String, CaptureError> {
        self.once_calls.fetch_add(1, Ordering::SeqCst);
        self.pass_gate().await?;
        self.once.lock().pop_front().unwrap_or_else(|| Ok(String::new()))
    }

    async fn start_continuous(
        &self,
        events: UnboundedSender<RecognitionEvent>,
    ) -> Result<(), CaptureError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        *self.sink.lock() = Some(events);
        Ok(())
    }

    async fn stop_continuous(&self) -> Result<(), CaptureError> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.pass_gate().await?;
        self.sink.lock().take();
        Ok(())
    }
}

/// Dialogue transport with a fixed answer and an optional gate that holds each
/// request until the test releases it
pub struct ScriptedTransport {
    reply: Option<String>,
    gate: Option<Semaphore>,
    pub utterances: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    /// Answers every request with `reply`
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(reply.to_string()),
            gate: None,
            utterances: Mutex::new(Vec::new()),
        })
    }

    /// Refuses every request, so the client answers from its fallback table
    pub fn unreachable() -> Arc<Self> {
        Arc::new(Self {
            reply: None,
            gate: None,
            utterances: Mutex::new(Vec::new()),
        })
    }

    /// Like `replying`, but each request waits for `release`
    pub fn gated(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(reply.to_string()),
            gate: Some(Semaphore::new(0)),
            utterances: Mutex::new(Vec::new()),
        })
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub fn utterances(&self) -> Vec<String> {
        self.utterances.lock().clone()
    }
}

#[async_trait]
impl DialogueTransport for ScriptedTransport {
    async fn invoke(&self, payload: &Value) -> Result<Value, DialogueError> {
        let utterance = payload["dataframe_split"]["data"][0][0]
            .as_str()
            .unwrap_or_default()
            .to_string();
        self.utterances.lock().push(utterance);

        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|e| DialogueError::Transport(e.to_string()))?
                .forget();
        }

        match &self.reply {
            Some(reply) => Ok(json!({ "predictions": [reply] })),
            None => Err(DialogueError::Transport("connection refused".into())),
        }
    }
}

/// Speech engine that records what it was asked to say
#[derive(Default)]
pub struct RecordingEngine {
    spoken: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            spoken: Mutex::new(Vec::new()),
            fail: true,
        })
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().clone()
    }
}

#[async_trait]
impl SpeechEngine for RecordingEngine {
    async fn synthesize(&self, text: &str, _voice: &VoiceProfile) -> parley::Result<()> {
        self.spoken.lock().push(text.to_string());
        if self.fail {
            return Err(ParleyError::SynthesisError("no audio device".into()));
        }
        Ok(())
    }
}

pub struct Harness {
    pub controller: TurnController,
    pub transport: Arc<ScriptedTransport>,
    pub engine: Arc<RecordingEngine>,
    pub recognizer: Arc<ScriptedRecognizer>,
}

impl Harness {
    pub fn new(kind: CaptureKind, transport: Arc<ScriptedTransport>) -> Self {
        Self::build(kind, transport, RecordingEngine::new(), ScriptedRecognizer::new())
    }

    pub fn with_engine(
        kind: CaptureKind,
        transport: Arc<ScriptedTransport>,
        engine: Arc<RecordingEngine>,
    ) -> Self {
        Self::build(kind, transport, engine, ScriptedRecognizer::new())
    }

    pub fn with_recognizer(
        kind: CaptureKind,
        transport: Arc<ScriptedTransport>,
        recognizer: Arc<ScriptedRecognizer>,
    ) -> Self {
        Self::build(kind, transport, RecordingEngine::new(), recognizer)
    }

    fn build(
        kind: CaptureKind,
        transport: Arc<ScriptedTransport>,
        engine: Arc<RecordingEngine>,
        recognizer: Arc<ScriptedRecognizer>,
    ) -> Self {
        let config =
            SessionConfig::default().with_capture(CaptureConfig::default().with_strategy(kind));
        let dialogue = DialogueClient::with_transport(config.dialogue.clone(), transport.clone());

        let controller = TurnController::builder()
            .config(config)
            .dialogue(Arc::new(dialogue))
            .speech_engine(engine.clone())
            .recognizer(recognizer.clone())
            .build()
            .unwrap();

        Self {
            controller,
            transport,
            engine,
            recognizer,
        }
    }
}

/// Yield to spawned tasks until `condition` holds
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}

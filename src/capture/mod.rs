//! Speech capture strategies
//!
//! Three interchangeable ways of turning a user action into one finished
//! utterance:
//! - **Tap**: a single blocking recognition call
//! - **Toggle**: explicit start/stop, recognized segments accumulate
//! - **Hold**: press/release, partial text is replaced and only recognized
//!   segments are kept
//!
//! The raw recognizer is abstract (`SpeechRecognizer`); strategies own the
//! session lifecycle and text handling on top of it.

pub mod continuous;
pub mod tap;
pub mod transcript;

pub use continuous::{ContinuousCapture, HoldCapture, ToggleCapture};
pub use tap::TapCapture;
pub use transcript::{AccumulatingTranscript, HoldTranscript, RoleLabel, Transcript};

use crate::{ParleyError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("no speech detected")]
    NoSpeechDetected,

    #[error("recognition failed: {0}")]
    RecognitionFailed(String),

    #[error("capture device unavailable: {0}")]
    DeviceUnavailable(String),
}

impl CaptureError {
    /// Message shown inline to the trainee
    pub fn user_message(&self) -> &'static str {
        match self {
            CaptureError::NoSpeechDetected => "No speech detected. Please try again.",
            CaptureError::RecognitionFailed(_) => {
                "Speech recognition failed. Please try again or use text input."
            }
            CaptureError::DeviceUnavailable(_) => {
                "Microphone unavailable. Please check your device and permissions."
            }
        }
    }
}

/// Which capture strategy a session uses
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureKind {
    #[default]
    Tap,
    Toggle,
    Hold,
}

impl fmt::Display for CaptureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureKind::Tap => write!(f, "tap"),
            CaptureKind::Toggle => write!(f, "toggle"),
            CaptureKind::Hold => write!(f, "hold"),
        }
    }
}

impl FromStr for CaptureKind {
    type Err = ParleyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "tap" | "1" => Ok(CaptureKind::Tap),
            "toggle" | "2" => Ok(CaptureKind::Toggle),
            "hold" | "3" => Ok(CaptureKind::Hold),
            other => Err(ParleyError::ConfigError(format!(
                "unknown capture strategy: {}",
                other
            ))),
        }
    }
}

/// Events delivered by a continuous recognition session
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// Partial hypothesis for the segment currently being spoken
    Recognizing(String),
    /// Final text for a completed segment
    Recognized(String),
    /// The backend aborted the session
    Canceled(String),
    /// The backend ended the session on its own
    SessionStopped,
}

/// Raw speech-to-text backend
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Listen for a single utterance and return its text (possibly empty)
    async fn recognize_once(&self) -> std::result::Result<String, CaptureError>;

    /// Open a continuous session that reports into `events`
    async fn start_continuous(
        &self,
        events: UnboundedSender<RecognitionEvent>,
    ) -> std::result::Result<(), CaptureError>;

    /// Close the continuous session. Events sent before this resolves are still
    /// delivered to the strategy.
    async fn stop_continuous(&self) -> std::result::Result<(), CaptureError>;
}

/// Receives interim text and asynchronous errors from an open session
pub trait CaptureObserver: Send + Sync {
    fn on_interim(&self, text: &str);
    fn on_error(&self, error: &CaptureError);
}

/// Result of starting a capture
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaptureProgress {
    /// A session is open; the utterance arrives on `stop`
    Listening,
    /// The strategy already produced the utterance
    Finished(String),
}

/// Capability surface shared by all strategies
#[async_trait]
pub trait CaptureStrategy: Send {
    fn kind(&self) -> CaptureKind;

    /// Whether a session is currently open
    fn is_listening(&self) -> bool;

    async fn start(&mut self) -> std::result::Result<CaptureProgress, CaptureError>;

    async fn stop(&mut self) -> std::result::Result<String, CaptureError>;

    /// Release any open session without producing a result
    async fn teardown(&mut self);
}

/// Configuration for speech capture
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Strategy bound when the session starts
    pub strategy: CaptureKind,

    /// Speaker label the recognizer sometimes echoes at the start of a segment
    pub role_label: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            strategy: CaptureKind::Tap,
            role_label: "Nurse".to_string(),
        }
    }
}

impl CaptureConfig {
    pub fn with_strategy(mut self, strategy: CaptureKind) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_role_label(mut self, label: impl Into<String>) -> Self {
        self.role_label = label.into();
        self
    }
}

/// Build the strategy for `kind`
pub fn build_strategy(
    kind: CaptureKind,
    config: &CaptureConfig,
    recognizer: Arc<dyn SpeechRecognizer>,
    observer: Arc<dyn CaptureObserver>,
) -> Result<Box<dyn CaptureStrategy>> {
    let strategy: Box<dyn CaptureStrategy> = match kind {
        CaptureKind::Tap => Box::new(TapCapture::new(recognizer)),
        CaptureKind::Toggle => Box::new(ToggleCapture::new(
            recognizer,
            observer,
            AccumulatingTranscript::default(),
        )),
        CaptureKind::Hold => Box::new(HoldCapture::new(
            recognizer,
            observer,
            HoldTranscript::new(RoleLabel::new(&config.role_label)?),
        )),
    };
    Ok(strategy)
}

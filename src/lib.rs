pub mod capture;
pub mod config;
pub mod conversation;
pub mod dialogue;
pub mod session;
pub mod speech;

pub use capture::{CaptureConfig, CaptureError, CaptureKind};
pub use config::{PatientProfile, SessionConfig};
pub use conversation::{ConversationState, DisplayHistory, Message, Role};
pub use dialogue::{Dialogue, DialogueClient, DialogueReply};
pub use session::{SessionSnapshot, TurnController, TurnEvent, TurnOutcome, TurnTiming};
pub use speech::{SpeechEngine, SynthesizerAdapter, VoiceProfile};

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ParleyError {
    #[error("Capture error: {0}")]
    CaptureError(#[from] CaptureError),

    #[error("Dialogue error: {0}")]
    DialogueError(String),

    #[error("Synthesis error: {0}")]
    SynthesisError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ParleyError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // A missing or denied microphone needs the user to act
            ParleyError::CaptureError(CaptureError::DeviceUnavailable(_)) => false,
            ParleyError::CaptureError(_) => true,
            ParleyError::DialogueError(_) => true,
            ParleyError::SynthesisError(_) => true,
            ParleyError::ConfigError(_) => false,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            ParleyError::CaptureError(e) => e.user_message().to_string(),
            ParleyError::DialogueError(_) => {
                "There was an error processing your request. Please try again.".to_string()
            }
            ParleyError::SynthesisError(_) => {
                "Speech playback failed. The reply is shown as text.".to_string()
            }
            ParleyError::ConfigError(_) => {
                "Configuration error. Please check settings.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ParleyError>;

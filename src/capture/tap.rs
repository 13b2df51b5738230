use crate::capture::{CaptureError, CaptureKind, CaptureProgress, CaptureStrategy, SpeechRecognizer};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// One blocking recognition per tap; no interim text
pub struct TapCapture {
    recognizer: Arc<dyn SpeechRecognizer>,
}

impl TapCapture {
    pub fn new(recognizer: Arc<dyn SpeechRecognizer>) -> Self {
        Self { recognizer }
    }
}

#[async_trait]
impl CaptureStrategy for TapCapture {
    fn kind(&self) -> CaptureKind {
        CaptureKind::Tap
    }

    fn is_listening(&self) -> bool {
        false
    }

    async fn start(&mut self) -> Result<CaptureProgress, CaptureError> {
        let text = self.recognizer.recognize_once().await?;
        let text = text.trim();
        if text.is_empty() {
            return Err(CaptureError::NoSpeechDetected);
        }
        debug!("Tap capture recognized {} chars", text.len());
        Ok(CaptureProgress::Finished(text.to_string()))
    }

    async fn stop(&mut self) -> Result<String, CaptureError> {
        Err(CaptureError::RecognitionFailed(
            "tap capture has no open session".to_string(),
        ))
    }

    async fn teardown(&mut self) {}
}

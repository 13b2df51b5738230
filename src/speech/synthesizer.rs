//! Synthesizer adapter
//!
//! Wraps a speech engine and keeps a "speaking" indicator alive for roughly as
//! long as the audio plays. Engines report when synthesis is handed off, not when
//! playback ends, so the finish signal is driven by an estimate from word count.

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Minimum estimated playback time in seconds
pub const MIN_SPOKEN_SECS: f64 = 1.5;

/// Estimated seconds per spoken word
pub const SECS_PER_WORD: f64 = 0.3;

/// Tail added after the estimate so the indicator never clips the last word
pub const SPOKEN_TAIL_SECS: f64 = 0.5;

/// Voice used for the patient
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceProfile {
    /// Engine voice identifier
    pub voice_name: String,

    /// Speaking style, for engines that support expressive styles
    pub voice_style: String,
}

impl Default for VoiceProfile {
    fn default() -> Self {
        Self {
            voice_name: "en-US-JennyNeural".to_string(),
            voice_style: "whispering".to_string(),
        }
    }
}

impl VoiceProfile {
    pub fn new(voice_name: impl Into<String>, voice_style: impl Into<String>) -> Self {
        Self {
            voice_name: voice_name.into(),
            voice_style: voice_style.into(),
        }
    }

    /// Render `text` as an SSML document spoken with this voice and style
    pub fn to_ssml(&self, text: &str) -> String {
        format!(
            concat!(
                r#"<speak version="1.0" xmlns="http://www.w3.org/2001/10/synthesis" "#,
                r#"xmlns:mstts="http://www.w3.org/2001/mstts" xml:lang="en-US">"#,
                r#"<voice name="{}"><mstts:express-as style="{}">{}</mstts:express-as></voice></speak>"#
            ),
            escape_xml(&self.voice_name),
            escape_xml(&self.voice_style),
            escape_xml(text)
        )
    }
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Raw text-to-speech primitive
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// Hand `text` to the engine. Resolves once synthesis is under way or done;
    /// playback may still be running.
    async fn synthesize(&self, text: &str, voice: &VoiceProfile) -> Result<()>;
}

/// Receives playback lifecycle notifications
pub trait SpeechObserver: Send + Sync {
    fn on_start(&self);
    fn on_finish(&self);
    fn on_error(&self, diagnostic: &str);
}

/// Estimated spoken duration of `text`
pub fn estimated_duration(text: &str) -> Duration {
    let words = text.split_whitespace().count() as f64;
    Duration::from_secs_f64((words * SECS_PER_WORD).max(MIN_SPOKEN_SECS) + SPOKEN_TAIL_SECS)
}

#[derive(Clone)]
pub struct SynthesizerAdapter {
    engine: Arc<dyn SpeechEngine>,
}

impl SynthesizerAdapter {
    pub fn new(engine: Arc<dyn SpeechEngine>) -> Self {
        Self { engine }
    }

    /// Speak `text`, reporting start, estimated finish, or failure to `observer`.
    ///
    /// Empty text is ignored and produces no notifications.
    pub async fn speak(&self, text: &str, voice: &VoiceProfile, observer: &dyn SpeechObserver) {
        if text.trim().is_empty() {
            return;
        }

        observer.on_start();

        match self.engine.synthesize(text, voice).await {
            Ok(()) => {
                let duration = estimated_duration(text);
                debug!("Synthesis handed off, holding indicator for {:?}", duration);
                tokio::time::sleep(duration).await;
                observer.on_finish();
            }
            Err(e) => {
                warn!("Speech synthesis failed: {}", e);
                observer.on_error(&e.to_string());
            }
        }
    }
}

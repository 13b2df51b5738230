//! Session configuration
//!
//! Aggregates the per-component configs. Loadable from TOML; every section and
//! field is optional and falls back to its default.

use crate::capture::CaptureConfig;
use crate::dialogue::DialogueConfig;
use crate::session::TurnTiming;
use crate::speech::{SpeechConfig, VoiceProfile};
use crate::{ParleyError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const ENDPOINT_ENV: &str = "PARLEY_ENDPOINT";
pub const TOKEN_ENV: &str = "PARLEY_TOKEN";

/// The simulated patient
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientProfile {
    /// Name shown on reply bubbles
    pub name: String,

    pub voice: VoiceProfile,
}

impl Default for PatientProfile {
    fn default() -> Self {
        Self {
            name: "Millie Larsen".to_string(),
            voice: VoiceProfile::default(),
        }
    }
}

/// Configuration for a complete session
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub dialogue: DialogueConfig,

    pub patient: PatientProfile,

    pub capture: CaptureConfig,

    pub speech: SpeechConfig,

    pub timing: TurnTiming,
}

impl SessionConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| ParleyError::ConfigError(e.to_string()))
    }

    /// Load from a TOML file, then apply environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            ParleyError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_toml_str(&text)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply `PARLEY_ENDPOINT` and `PARLEY_TOKEN` if set and non-empty
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(
            std::env::var(ENDPOINT_ENV).ok(),
            std::env::var(TOKEN_ENV).ok(),
        );
    }

    fn apply_overrides(&mut self, endpoint: Option<String>, token: Option<String>) {
        if let Some(endpoint) = endpoint.filter(|v| !v.trim().is_empty()) {
            self.dialogue.endpoint = endpoint;
        }
        if let Some(token) = token.filter(|v| !v.trim().is_empty()) {
            self.dialogue.token = Some(token);
        }
    }

    pub fn with_dialogue(mut self, dialogue: DialogueConfig) -> Self {
        self.dialogue = dialogue;
        self
    }

    pub fn with_patient(mut self, patient: PatientProfile) -> Self {
        self.patient = patient;
        self
    }

    pub fn with_capture(mut self, capture: CaptureConfig) -> Self {
        self.capture = capture;
        self
    }

    pub fn with_speech(mut self, speech: SpeechConfig) -> Self {
        self.speech = speech;
        self
    }

    pub fn with_reveal_delay_ms(mut self, reveal_delay_ms: u64) -> Self {
        self.timing.reveal_delay_ms = reveal_delay_ms;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let endpoint = self.dialogue.endpoint.trim();
        if endpoint.is_empty() {
            return Err(ParleyError::ConfigError(
                "dialogue endpoint is required".to_string(),
            ));
        }
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(ParleyError::ConfigError(format!(
                "dialogue endpoint must be an http(s) URL: {}",
                endpoint
            )));
        }
        if self.dialogue.timeout_secs == 0 {
            return Err(ParleyError::ConfigError(
                "dialogue timeout must be at least one second".to_string(),
            ));
        }
        if self.capture.role_label.trim().is_empty() {
            return Err(ParleyError::ConfigError(
                "capture role label must not be empty".to_string(),
            ));
        }
        if self.patient.voice.voice_name.trim().is_empty() {
            return Err(ParleyError::ConfigError(
                "patient voice name must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

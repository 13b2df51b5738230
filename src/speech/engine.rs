//! Speech engines
//!
//! `CommandEngine` hands text to an external text-to-speech program (`say`,
//! `espeak`, ...). `SilentEngine` accepts everything and plays nothing, for
//! text-only sessions.

use crate::speech::synthesizer::{SpeechEngine, VoiceProfile};
use crate::{ParleyError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, warn};

/// Configuration for the speech engine
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// External TTS program; `None` means a silent session
    pub command: Option<String>,

    /// Flag that selects the voice (e.g. `-v`)
    pub voice_flag: Option<String>,

    /// Flag that makes the program read SSML markup (e.g. `-m` for espeak)
    pub ssml_flag: Option<String>,
}

impl SpeechConfig {
    /// Build the engine this configuration describes
    pub fn build_engine(&self) -> Arc<dyn SpeechEngine> {
        match &self.command {
            Some(program) => {
                let mut engine = CommandEngine::new(program);
                if let Some(flag) = &self.voice_flag {
                    engine = engine.with_voice_flag(flag);
                }
                if let Some(flag) = &self.ssml_flag {
                    engine = engine.with_ssml_flag(flag);
                }
                Arc::new(engine)
            }
            None => Arc::new(SilentEngine),
        }
    }
}

/// Speaks through an external program
#[derive(Clone, Debug)]
pub struct CommandEngine {
    program: String,
    voice_flag: Option<String>,
    ssml_flag: Option<String>,
}

impl CommandEngine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            voice_flag: None,
            ssml_flag: None,
        }
    }

    pub fn with_voice_flag(mut self, flag: impl Into<String>) -> Self {
        self.voice_flag = Some(flag.into());
        self
    }

    pub fn with_ssml_flag(mut self, flag: impl Into<String>) -> Self {
        self.ssml_flag = Some(flag.into());
        self
    }

    /// Arguments passed to the program for `text`
    pub fn args(&self, text: &str, voice: &VoiceProfile) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(flag) = &self.voice_flag {
            args.push(flag.clone());
            args.push(voice.voice_name.clone());
        }
        match &self.ssml_flag {
            Some(flag) => {
                args.push(flag.clone());
                args.push(voice.to_ssml(text));
            }
            None => args.push(text.to_string()),
        }
        args
    }
}

#[async_trait]
impl SpeechEngine for CommandEngine {
    async fn synthesize(&self, text: &str, voice: &VoiceProfile) -> Result<()> {
        let mut child = Command::new(&self.program)
            .args(self.args(text, voice))
            .spawn()
            .map_err(|e| {
                ParleyError::SynthesisError(format!("failed to spawn '{}': {}", self.program, e))
            })?;

        debug!("Spawned '{}' for {} chars", self.program, text.len());

        // Reap the process in the background; playback length is estimated by the adapter
        let program = self.program.clone();
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) if !status.success() => {
                    warn!("'{}' exited with {}", program, status);
                }
                Ok(_) => {}
                Err(e) => warn!("Failed to wait for '{}': {}", program, e),
            }
        });

        Ok(())
    }
}

/// Accepts every request without producing audio
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentEngine;

#[async_trait]
impl SpeechEngine for SilentEngine {
    async fn synthesize(&self, text: &str, _voice: &VoiceProfile) -> Result<()> {
        debug!("Silent engine skipping {} chars", text.len());
        Ok(())
    }
}

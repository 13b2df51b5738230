//! Speech output for patient replies
//!
//! This module provides:
//! - The synthesizer adapter that paces the "speaking" indicator
//! - Engines that turn text into audio

pub mod engine;
pub mod synthesizer;

// Re-export commonly used types
pub use engine::{CommandEngine, SilentEngine, SpeechConfig};
pub use synthesizer::{
    estimated_duration, SpeechEngine, SpeechObserver, SynthesizerAdapter, VoiceProfile,
};

//! Transcript assembly for continuous capture sessions

use crate::capture::{CaptureKind, RecognitionEvent};
use crate::{ParleyError, Result};
use regex::{NoExpand, Regex};

/// Text handling policy for one continuous session
pub trait Transcript: Clone + Send + 'static {
    const KIND: CaptureKind;

    /// Fold a recognition event in; returns the interim text to publish, if it changed
    fn apply(&mut self, event: RecognitionEvent) -> Option<String>;

    /// Final utterance, or `None` if nothing usable was heard
    fn finish(&self) -> Option<String>;
}

/// Toggle policy: every recognized segment is appended, space-joined
#[derive(Clone, Debug, Default)]
pub struct AccumulatingTranscript {
    text: String,
}

impl Transcript for AccumulatingTranscript {
    const KIND: CaptureKind = CaptureKind::Toggle;

    fn apply(&mut self, event: RecognitionEvent) -> Option<String> {
        match event {
            RecognitionEvent::Recognized(segment) => {
                let segment = segment.trim();
                if segment.is_empty() {
                    return None;
                }
                push_segment(&mut self.text, segment);
                Some(self.text.clone())
            }
            _ => None,
        }
    }

    fn finish(&self) -> Option<String> {
        non_empty(&self.text)
    }
}

/// Cleanup rules for the speaker label some recognizers echo back
#[derive(Clone, Debug)]
pub struct RoleLabel {
    label: String,
    leading: Regex,
    repeated: Regex,
}

impl RoleLabel {
    pub fn new(label: &str) -> Result<Self> {
        let escaped = regex::escape(label.trim());
        let leading = Regex::new(&format!(r"(?i)^\s*{}:\s*", escaped))
            .map_err(|e| ParleyError::ConfigError(format!("role label: {}", e)))?;
        let repeated = Regex::new(&format!(r"(?i)(?:{}:\s*){{2,}}", escaped))
            .map_err(|e| ParleyError::ConfigError(format!("role label: {}", e)))?;

        Ok(Self {
            label: label.trim().to_string(),
            leading,
            repeated,
        })
    }

    /// Remove one leading `Label:` from a segment
    pub fn strip_leading<'a>(&self, text: &'a str) -> std::borrow::Cow<'a, str> {
        self.leading.replace(text, NoExpand(""))
    }

    /// Collapse runs like `Label: Label:` into a single `Label: `
    pub fn collapse_repeats<'a>(&self, text: &'a str) -> std::borrow::Cow<'a, str> {
        let single = format!("{}: ", self.label);
        self.repeated.replace_all(text, NoExpand(&single))
    }
}

/// Hold policy: partial text replaces the previous partial, recognized
/// segments are cleaned and appended
#[derive(Clone, Debug)]
pub struct HoldTranscript {
    label: RoleLabel,
    finalized: String,
    partial: String,
}

impl HoldTranscript {
    pub fn new(label: RoleLabel) -> Self {
        Self {
            label,
            finalized: String::new(),
            partial: String::new(),
        }
    }

    fn preview(&self) -> String {
        let mut text = self.finalized.clone();
        push_segment(&mut text, self.partial.trim());
        text
    }
}

impl Transcript for HoldTranscript {
    const KIND: CaptureKind = CaptureKind::Hold;

    fn apply(&mut self, event: RecognitionEvent) -> Option<String> {
        match event {
            RecognitionEvent::Recognizing(partial) => {
                self.partial = partial;
                Some(self.preview())
            }
            RecognitionEvent::Recognized(segment) => {
                self.partial.clear();
                let cleaned = self.label.strip_leading(&segment);
                let cleaned = cleaned.trim();
                if cleaned.is_empty() {
                    return None;
                }
                push_segment(&mut self.finalized, cleaned);
                Some(self.preview())
            }
            _ => None,
        }
    }

    fn finish(&self) -> Option<String> {
        // A trailing partial that never finalized is still speech the user produced
        let text = self.preview();
        let text = self.label.collapse_repeats(text.trim());
        non_empty(&text)
    }
}

fn push_segment(text: &mut String, segment: &str) {
    if segment.is_empty() {
        return;
    }
    if !text.is_empty() {
        text.push(' ');
    }
    text.push_str(segment);
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

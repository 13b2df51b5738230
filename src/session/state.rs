//! Session state published to the presentation layer
//!
//! The Turn Controller is the only writer. The presentation layer reads through
//! `SharedSessionState` (or takes a `SessionSnapshot`) and renders from it.

use crate::capture::CaptureKind;
use crate::conversation::{ConversationState, DisplayHistory};
use parking_lot::RwLock;
use std::sync::Arc;

#[derive(Clone, Debug, Default)]
pub struct SessionState {
    /// Dialogue memory threaded through every request
    pub conversation: ConversationState,

    /// Bubbles for the current turn
    pub display: DisplayHistory,

    /// Whether the reply bubble is visible
    pub revealed: bool,

    /// Whether the patient is speaking
    pub speaking: bool,

    /// A dialogue request is outstanding
    pub turn_active: bool,

    /// Busy indicator: a turn is outstanding or a tap recognition is running
    pub loading: bool,

    /// A capture session is open
    pub listening: bool,

    /// A capture is being finalized (tap in flight or stop pending)
    pub processing: bool,

    /// Interim transcript of the open capture session
    pub interim_text: Option<String>,

    /// Transient inline error
    pub error: Option<String>,

    pub capture_kind: CaptureKind,

    /// Sequence number of the most recent turn
    pub turn_id: u64,
}

impl SessionState {
    pub fn new(capture_kind: CaptureKind) -> Self {
        Self {
            capture_kind,
            ..Default::default()
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            conversation: self.conversation.clone(),
            display: self.display.clone(),
            revealed: self.revealed,
            speaking: self.speaking,
            turn_active: self.turn_active,
            loading: self.loading,
            listening: self.listening,
            processing: self.processing,
            interim_text: self.interim_text.clone(),
            error: self.error.clone(),
            capture_kind: self.capture_kind,
        }
    }

    // === State transitions ===

    /// Accept a new turn: fresh display pair, reply hidden, error cleared
    pub fn begin_turn(&mut self, utterance: &str) -> u64 {
        self.turn_id += 1;
        self.display = DisplayHistory::begin(utterance);
        self.revealed = false;
        self.turn_active = true;
        self.loading = true;
        self.error = None;
        self.turn_id
    }

    /// Store the reply and the state returned with it; the bubble stays hidden
    pub fn accept_reply(&mut self, reply: &str, conversation: ConversationState) {
        self.conversation = conversation;
        self.display.set_reply(reply);
    }

    pub fn settle_turn(&mut self) {
        self.turn_active = false;
        self.loading = false;
    }

    /// Reveal the reply bubble of `turn_id`. A turn that has since been
    /// superseded is left alone.
    pub fn reveal(&mut self, turn_id: u64) -> bool {
        if self.turn_id != turn_id {
            return false;
        }
        self.revealed = true;
        true
    }

    pub fn set_error(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn start_listening(&mut self) {
        self.listening = true;
        self.interim_text = None;
    }

    pub fn stop_listening(&mut self) {
        self.listening = false;
    }

    pub fn finish_capture(&mut self) {
        self.listening = false;
        self.processing = false;
        self.interim_text = None;
    }
}

/// Immutable copy of session state for rendering and assertions
#[derive(Clone, Debug)]
pub struct SessionSnapshot {
    pub conversation: ConversationState,
    pub display: DisplayHistory,
    pub revealed: bool,
    pub speaking: bool,
    pub turn_active: bool,
    pub loading: bool,
    pub listening: bool,
    pub processing: bool,
    pub interim_text: Option<String>,
    pub error: Option<String>,
    pub capture_kind: CaptureKind,
}

impl SessionSnapshot {
    /// The reply text, if it has been revealed
    pub fn visible_reply(&self) -> Option<&str> {
        if !self.revealed {
            return None;
        }
        self.display.reply().map(|m| m.content.as_str())
    }
}

/// Thread-safe shared session state
#[derive(Clone, Default)]
pub struct SharedSessionState {
    inner: Arc<RwLock<SessionState>>,
}

impl SharedSessionState {
    pub fn new(capture_kind: CaptureKind) -> Self {
        Self {
            inner: Arc::new(RwLock::new(SessionState::new(capture_kind))),
        }
    }

    pub fn read(&self) -> parking_lot::RwLockReadGuard<'_, SessionState> {
        self.inner.read()
    }

    pub(crate) fn write(&self) -> parking_lot::RwLockWriteGuard<'_, SessionState> {
        self.inner.write()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.read().snapshot()
    }

    // === Convenience read methods ===

    pub fn is_turn_active(&self) -> bool {
        self.inner.read().turn_active
    }

    pub fn is_revealed(&self) -> bool {
        self.inner.read().revealed
    }

    pub fn is_speaking(&self) -> bool {
        self.inner.read().speaking
    }

    pub fn is_listening(&self) -> bool {
        self.inner.read().listening
    }

    pub fn error(&self) -> Option<String> {
        self.inner.read().error.clone()
    }

    pub fn history_len(&self) -> usize {
        self.inner.read().conversation.history.len()
    }
}

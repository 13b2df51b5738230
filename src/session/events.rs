use crate::capture::CaptureKind;

/// Notifications for the presentation layer.
///
/// State itself lives in `SharedSessionState`; events only say that something
/// changed and carry the text needed to render it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnEvent {
    /// A turn was accepted and the user bubble published
    TurnStarted { utterance: String },

    /// A submission arrived while a turn was outstanding
    TurnIgnored,

    /// The reply arrived; it stays hidden until revealed
    ReplyReceived { reply: String },

    /// The dialogue request settled; new turns are accepted again
    TurnSettled,

    /// The reply bubble became visible
    ReplyRevealed { reply: String },

    SpeakingStarted,

    SpeakingFinished,

    /// Synthesis failed; the revealed reply is still valid
    SpeechFailed { diagnostic: String },

    CaptureStarted { kind: CaptureKind },

    CaptureStopped,

    /// Interim transcript of the open capture session
    Interim(String),

    /// User-visible error message
    Error(String),
}

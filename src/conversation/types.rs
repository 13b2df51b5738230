use serde::{Deserialize, Serialize};

/// Role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The trainee
    User,
    /// The simulated patient
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// One entry of the backend-owned affect vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Emotion {
    pub emotion: String,
    pub value: f32,
}

impl Emotion {
    pub fn new(emotion: impl Into<String>, value: f32) -> Self {
        Self {
            emotion: emotion.into(),
            value,
        }
    }
}

/// Dialogue memory threaded through every request.
///
/// `stage`, `step` and `emotions` belong to the dialogue service and are passed
/// through untouched. `history` only ever grows, one user entry followed by one
/// assistant entry per turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    pub stage: u32,
    pub step: u32,
    pub history: Vec<Message>,
    pub emotions: Vec<Emotion>,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self {
            stage: 1,
            step: 1,
            history: Vec::new(),
            emotions: vec![
                Emotion::new("anger", 0.25),
                Emotion::new("fear", 0.25),
                Emotion::new("joy", 0.25),
                Emotion::new("sadness", 0.25),
            ],
        }
    }
}

impl ConversationState {
    /// Copy of this state with `message` appended to the history
    pub fn with_message(&self, message: Message) -> Self {
        let mut next = self.clone();
        next.history.push(message);
        next
    }
}

/// The two bubbles shown for the current turn.
///
/// Slot 0 holds the trainee's utterance and is visible immediately; slot 1 holds
/// the patient's reply, which stays hidden until the reveal delay passes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayHistory {
    entries: Vec<Message>,
}

impl DisplayHistory {
    /// Start a fresh pair, discarding the previous turn's bubbles
    pub fn begin(utterance: impl Into<String>) -> Self {
        Self {
            entries: vec![Message::user(utterance)],
        }
    }

    pub fn set_reply(&mut self, reply: impl Into<String>) {
        self.entries.truncate(1);
        self.entries.push(Message::assistant(reply));
    }

    pub fn user(&self) -> Option<&Message> {
        self.entries.first()
    }

    pub fn reply(&self) -> Option<&Message> {
        self.entries.get(1)
    }

    pub fn entries(&self) -> &[Message] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

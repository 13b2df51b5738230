pub mod types;

pub use types::{ConversationState, DisplayHistory, Emotion, Message, Role};

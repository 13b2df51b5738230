//! Request payload for the dialogue service
//!
//! The service is a tabular model endpoint: every request is a single row in a
//! `dataframe_split` envelope whose columns are fixed.

use crate::conversation::ConversationState;
use crate::dialogue::config::{ContentModifier, DialogueConfig, GenerationConfig};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

/// Column order expected by the service
pub const COLUMNS: [&str; 12] = [
    "user_input",
    "content_id",
    "content_version",
    "conversation_state",
    "config",
    "top_n",
    "generate_rephrase_precondition",
    "general_content_modifier",
    "stage_content_modifier",
    "session_id",
    "hardware_id",
    "user_id",
];

/// One dialogue request, before it is flattened into the wire envelope
#[derive(Clone, Debug)]
pub struct DialogueRequest {
    pub client_request_id: String,
    pub utterance: String,
    pub content_id: String,
    /// Working state, already carrying the new user entry
    pub conversation_state: ConversationState,
    pub generation: GenerationConfig,
    pub candidate_count: u32,
    pub general_modifiers: Vec<ContentModifier>,
    pub stage_modifiers: Vec<ContentModifier>,
    pub session_id: String,
    pub device_id: String,
    pub user_id: String,
}

impl DialogueRequest {
    pub fn build(
        config: &DialogueConfig,
        session_id: &str,
        utterance: &str,
        conversation_state: ConversationState,
    ) -> Self {
        Self {
            client_request_id: new_request_id(),
            utterance: utterance.to_string(),
            content_id: config.content_id.clone(),
            conversation_state,
            generation: config.generation.clone(),
            candidate_count: config.candidate_count,
            general_modifiers: config.general_modifiers.clone(),
            stage_modifiers: config.stage_modifiers.clone(),
            session_id: session_id.to_string(),
            device_id: config.device_id.clone(),
            user_id: config.user_id.clone(),
        }
    }

    /// Flatten into the `dataframe_split` envelope
    pub fn to_wire(&self) -> Value {
        // The service insists on a precondition list even when it is unused
        let precondition = json!([{ "id": "", "intent": "", "response": "", "score": 0.1 }]);

        json!({
            "client_request_id": self.client_request_id,
            "dataframe_split": {
                "columns": COLUMNS,
                "data": [[
                    self.utterance,
                    self.content_id,
                    "",
                    self.conversation_state,
                    self.generation,
                    self.candidate_count,
                    precondition,
                    self.general_modifiers,
                    self.stage_modifiers,
                    self.session_id,
                    self.device_id,
                    self.user_id,
                ]]
            }
        })
    }
}

fn new_request_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("request-{}-{}", Utc::now().timestamp_millis(), &suffix[..5])
}

//! Response classification for the dialogue service

use serde_json::Value;
use thiserror::Error;

/// Failures of a single dialogue round trip.
///
/// None of these reach the user; the client answers from the fallback
/// responder instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DialogueError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("service responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Extract the reply text from a service response.
///
/// The payload normally sits under `predictions`; a bare payload is accepted as
/// well. An array payload carries the reply as its first element, an object
/// payload as `response` or `intent_response`.
pub fn parse_reply(body: &Value) -> Result<String, DialogueError> {
    let payload = body.get("predictions").unwrap_or(body);

    let reply = match payload {
        Value::Array(items) => items.first().and_then(Value::as_str),
        Value::Object(fields) => ["response", "intent_response"]
            .iter()
            .filter_map(|key| fields.get(*key).and_then(Value::as_str))
            .find(|text| !text.trim().is_empty()),
        other => {
            return Err(DialogueError::Malformed(format!(
                "unexpected payload type: {}",
                type_name(other)
            )))
        }
    };

    match reply.map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        _ => Err(DialogueError::Malformed(
            "no response or intent_response in payload".to_string(),
        )),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

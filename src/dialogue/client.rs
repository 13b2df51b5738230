//! Dialogue client
//!
//! Threads the conversation state through the remote service and answers from
//! the local fallback responder whenever the round trip fails. Callers always
//! get a reply and an updated state back.

use crate::conversation::{ConversationState, Message};
use crate::dialogue::config::DialogueConfig;
use crate::dialogue::fallback::FallbackResponder;
use crate::dialogue::request::DialogueRequest;
use crate::dialogue::response::{parse_reply, DialogueError};
use crate::dialogue::transport::{DialogueTransport, HttpTransport};
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Where a reply came from. Informational only; both kinds have the same shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplySource {
    Service,
    Fallback,
}

#[derive(Clone, Debug)]
pub struct DialogueReply {
    pub reply: String,
    /// State to thread into the next request
    pub state: ConversationState,
    pub source: ReplySource,
}

/// Produces the patient's reply for one utterance
#[async_trait]
pub trait Dialogue: Send + Sync {
    async fn submit(&self, utterance: &str, state: &ConversationState) -> Result<DialogueReply>;
}

pub struct DialogueClient {
    config: DialogueConfig,
    session_id: String,
    transport: Arc<dyn DialogueTransport>,
    fallback: FallbackResponder,
}

impl DialogueClient {
    /// Create a client that talks HTTP to the configured endpoint
    pub fn new(config: DialogueConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    pub fn with_transport(config: DialogueConfig, transport: Arc<dyn DialogueTransport>) -> Self {
        Self {
            config,
            session_id: format!("session-{}", Uuid::new_v4()),
            transport,
            fallback: FallbackResponder::new(),
        }
    }

    async fn request_reply(
        &self,
        utterance: &str,
        working: &ConversationState,
    ) -> std::result::Result<String, DialogueError> {
        let request =
            DialogueRequest::build(&self.config, &self.session_id, utterance, working.clone());
        debug!("Sending dialogue request {}", request.client_request_id);

        let body = self.transport.invoke(&request.to_wire()).await?;
        parse_reply(&body)
    }
}

#[async_trait]
impl Dialogue for DialogueClient {
    async fn submit(&self, utterance: &str, state: &ConversationState) -> Result<DialogueReply> {
        let working = state.with_message(Message::user(utterance));

        let (reply, source) = match self.request_reply(utterance, &working).await {
            Ok(reply) => (reply, ReplySource::Service),
            Err(e) => {
                warn!("Dialogue service unavailable, using fallback: {}", e);
                (self.fallback.respond(utterance).to_string(), ReplySource::Fallback)
            }
        };

        info!("Reply ready ({:?}, {} chars)", source, reply.len());

        let state = working.with_message(Message::assistant(reply.clone()));
        Ok(DialogueReply {
            reply,
            state,
            source,
        })
    }
}

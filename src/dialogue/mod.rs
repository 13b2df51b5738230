//! Dialogue service client and its local fallback
//!
//! This module provides:
//! - The request payload and response classification for the remote service
//! - An HTTP transport
//! - A deterministic rule-based responder for when the service is unreachable

pub mod client;
pub mod config;
pub mod fallback;
pub mod request;
pub mod response;
pub mod transport;

pub use client::{Dialogue, DialogueClient, DialogueReply, ReplySource};
pub use config::{ContentModifier, DialogueConfig, GenerationConfig, GeneratorConfig, Thresholds};
pub use fallback::FallbackResponder;
pub use request::DialogueRequest;
pub use response::{parse_reply, DialogueError};
pub use transport::{DialogueTransport, HttpTransport};

//! Conversation session
//!
//! This module provides:
//! - The turn controller, the root component of a session
//! - Session state and snapshots read by the presentation layer
//! - Notifications emitted as a turn progresses

pub mod controller;
pub mod events;
pub mod state;

pub use controller::{
    NoRecognizer, TurnController, TurnControllerBuilder, TurnOutcome, TurnTiming,
};
pub use events::TurnEvent;
pub use state::{SessionSnapshot, SessionState, SharedSessionState};

//! chatapt-core: conversation orchestration
//!
//! This crate owns the chat state machine. It persists every turn to a
//! [`MessageStore`], keeps a bounded [`HistoryWindow`] of recent turns as
//! prompt context, calls a [`chatapt_ai::GenerationClient`] and publishes
//! [`ConversationState`] snapshots to whoever renders them.

pub mod error;
pub mod history;
pub mod message;
pub mod orchestrator;
pub mod state;
pub mod store;

pub use error::{Error, Result};
pub use history::{HistoryWindow, MAX_HISTORY_SIZE};
pub use message::{Message, MessageId};
pub use orchestrator::{ConversationConfig, Orchestrator, SendOutcome};
pub use state::{ConversationState, Phase};
pub use store::{InsertOutcome, JsonlStore, MemoryStore, MessageStore, MessageStream};

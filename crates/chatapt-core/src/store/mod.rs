//! Message store: an ordered, append-only log of chat messages

mod jsonl;
mod log;
mod memory;

pub use jsonl::JsonlStore;
pub use memory::MemoryStore;

use std::pin::Pin;

use async_trait::async_trait;
use tokio_stream::Stream;

use crate::error::Result;
use crate::message::{Message, MessageId};

/// Live view of the full ordered log.
///
/// The first item is the current contents; each later item is the full log
/// after a change.
pub type MessageStream = Pin<Box<dyn Stream<Item = Vec<Message>> + Send>>;

/// What an insert did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Stored under this key
    Inserted(MessageId),
    /// A row with this key already existed; nothing changed
    Ignored(MessageId),
}

impl InsertOutcome {
    /// Key of the row the insert refers to
    pub fn id(&self) -> MessageId {
        match self {
            InsertOutcome::Inserted(id) | InsertOutcome::Ignored(id) => *id,
        }
    }
}

/// Persistence for chat messages
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Subscribe to the ordered log (ascending `id`)
    fn observe_all(&self) -> MessageStream;

    /// Insert a message; an `id` collision is ignored, not an error
    async fn insert(&self, message: Message) -> Result<InsertOutcome>;

    /// Delete one message; returns whether a row was removed
    async fn delete(&self, id: MessageId) -> Result<bool>;

    /// Remove every message. Keys are never reused afterwards.
    async fn clear(&self) -> Result<()>;
}

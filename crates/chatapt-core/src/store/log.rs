//! In-memory ordered log shared by the store implementations

use std::collections::BTreeMap;

use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use super::MessageStream;
use crate::error::{Error, Result};
use crate::message::{Message, MessageId};

/// Rows keyed by id plus the change feed subscribers listen on
pub(crate) struct MessageLog {
    rows: BTreeMap<MessageId, Message>,
    next_id: MessageId,
    tx: watch::Sender<Vec<Message>>,
}

impl MessageLog {
    pub(crate) fn new() -> Self {
        let (tx, _) = watch::channel(Vec::new());
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
            tx,
        }
    }

    /// Key the message would be stored under, or `None` if that key is taken.
    ///
    /// `MessageId::MAX` is never handed out or accepted, so the next key
    /// always exists.
    pub(crate) fn assign(&self, message: &Message) -> Result<Option<MessageId>> {
        let id = if message.is_unassigned() {
            self.next_id
        } else {
            message.id
        };
        if id.checked_add(1).is_none() {
            return Err(Error::IdOutOfRange(id));
        }
        if !message.is_unassigned() && self.rows.contains_key(&id) {
            return Ok(None);
        }
        Ok(Some(id))
    }

    /// Store a message whose key came from [`Self::assign`]
    pub(crate) fn commit(&mut self, message: Message) {
        self.next_id = self.next_id.max(message.id.saturating_add(1));
        self.rows.insert(message.id, message);
    }

    pub(crate) fn remove(&mut self, id: MessageId) -> bool {
        self.rows.remove(&id).is_some()
    }

    pub(crate) fn clear(&mut self) {
        self.rows.clear();
    }

    pub(crate) fn contains(&self, id: MessageId) -> bool {
        self.rows.contains_key(&id)
    }

    pub(crate) fn messages(&self) -> Vec<Message> {
        self.rows.values().cloned().collect()
    }

    /// Push the current contents to subscribers
    pub(crate) fn publish(&self) {
        self.tx.send_replace(self.messages());
    }

    pub(crate) fn stream(&self) -> MessageStream {
        Box::pin(WatchStream::new(self.tx.subscribe()))
    }
}

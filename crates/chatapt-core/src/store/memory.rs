//! Volatile message store

use async_trait::async_trait;
use parking_lot::Mutex;

use super::log::MessageLog;
use super::{InsertOutcome, MessageStore, MessageStream};
use crate::error::Result;
use crate::message::{Message, MessageId};

/// Message store that lives only as long as the process
pub struct MemoryStore {
    log: Mutex<MessageLog>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            log: Mutex::new(MessageLog::new()),
        }
    }

    /// Current contents in ascending `id` order
    pub fn messages(&self) -> Vec<Message> {
        self.log.lock().messages()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    fn observe_all(&self) -> MessageStream {
        self.log.lock().stream()
    }

    async fn insert(&self, message: Message) -> Result<InsertOutcome> {
        let mut log = self.log.lock();
        let Some(id) = log.assign(&message)? else {
            return Ok(InsertOutcome::Ignored(message.id));
        };
        log.commit(message.with_id(id));
        log.publish();
        Ok(InsertOutcome::Inserted(id))
    }

    async fn delete(&self, id: MessageId) -> Result<bool> {
        let mut log = self.log.lock();
        let removed = log.remove(id);
        if removed {
            log.publish();
        }
        Ok(removed)
    }

    async fn clear(&self) -> Result<()> {
        let mut log = self.log.lock();
        log.clear();
        log.publish();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_insert_assigns_increasing_ids() {
        let store = MemoryStore::new();
        assert_eq!(
            store.insert(Message::user("Hi")).await.unwrap(),
            InsertOutcome::Inserted(1)
        );
        assert_eq!(
            store.insert(Message::model("Hello")).await.unwrap(),
            InsertOutcome::Inserted(2)
        );

        let ids: Vec<_> = store.messages().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_duplicate_id_insert_is_noop() {
        let store = MemoryStore::new();
        store.insert(Message::user("first").with_id(5)).await.unwrap();
        let outcome = store.insert(Message::user("second").with_id(5)).await.unwrap();

        assert_eq!(outcome, InsertOutcome::Ignored(5));
        let messages = store.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, "first");
    }

    #[tokio::test]
    async fn test_observe_replays_then_streams() {
        let store = MemoryStore::new();
        store.insert(Message::user("a")).await.unwrap();

        let mut stream = store.observe_all();
        let initial = stream.next().await.unwrap();
        assert_eq!(initial.len(), 1);

        store.insert(Message::model("b")).await.unwrap();
        let updated = stream.next().await.unwrap();
        assert_eq!(
            updated.iter().map(|m| m.text.as_str()).collect::<Vec<_>>(),
            vec!["a", "b"]
        );
    }

    #[tokio::test]
    async fn test_ignored_insert_does_not_notify() {
        let store = MemoryStore::new();
        store.insert(Message::user("a").with_id(1)).await.unwrap();
        let mut stream = store.observe_all();
        stream.next().await.unwrap();

        store.insert(Message::user("dup").with_id(1)).await.unwrap();
        let pending = tokio::time::timeout(std::time::Duration::from_millis(50), stream.next()).await;
        assert!(pending.is_err(), "duplicate insert should not publish");
    }

    #[tokio::test]
    async fn test_max_id_insert_is_rejected() {
        let store = MemoryStore::new();
        let err = store
            .insert(Message::user("x").with_id(MessageId::MAX))
            .await
            .unwrap_err();
        assert!(matches!(err, crate::Error::IdOutOfRange(_)));
        assert!(store.messages().is_empty());

        // Key assignment is unaffected
        assert_eq!(
            store.insert(Message::user("y")).await.unwrap(),
            InsertOutcome::Inserted(1)
        );
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let store = MemoryStore::new();
        store.insert(Message::user("a")).await.unwrap();
        store.insert(Message::model("b")).await.unwrap();

        assert!(store.delete(1).await.unwrap());
        assert!(!store.delete(1).await.unwrap());
        assert_eq!(store.messages().len(), 1);

        store.clear().await.unwrap();
        assert!(store.messages().is_empty());

        // Keys keep increasing after a clear
        assert_eq!(
            store.insert(Message::user("c")).await.unwrap(),
            InsertOutcome::Inserted(3)
        );
    }
}

//! Persisted chat messages

use serde::{Deserialize, Serialize};

/// Surrogate key assigned by the store
pub type MessageId = u64;

/// A persisted chat turn.
///
/// An `id` of `0` means "not yet assigned"; the store replaces it with the
/// next key on insert. A non-zero `id` is kept as-is, and inserting it a
/// second time is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default)]
    pub id: MessageId,
    pub text: String,
    pub is_user: bool,
}

impl Message {
    /// Key value meaning "assign on insert"
    pub const UNASSIGNED: MessageId = 0;

    /// Create an unsaved user message
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: Self::UNASSIGNED,
            text: text.into(),
            is_user: true,
        }
    }

    /// Create an unsaved model message
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            id: Self::UNASSIGNED,
            text: text.into(),
            is_user: false,
        }
    }

    /// Set an explicit key
    pub fn with_id(mut self, id: MessageId) -> Self {
        self.id = id;
        self
    }

    /// Whether the store still has to assign a key
    pub fn is_unassigned(&self) -> bool {
        self.id == Self::UNASSIGNED
    }
}

//! Error types for chatapt-core

use thiserror::Error;

/// Result type alias using chatapt-core Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the conversation core
#[derive(Error, Debug)]
pub enum Error {
    /// An error from the generation client
    #[error(transparent)]
    Ai(#[from] chatapt_ai::Error),

    /// Message log I/O failed
    #[error("Message log I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Message log entry could not be encoded
    #[error("Message log encoding error: {0}")]
    Json(#[from] serde_json::Error),

    /// Key too large to store without exhausting the key space
    #[error("Message id {0} is out of range")]
    IdOutOfRange(crate::message::MessageId),

    /// A generic core error
    #[error("{0}")]
    Other(String),
}

//! Durable message store backed by an append-only JSONL file

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::log::MessageLog;
use super::{InsertOutcome, MessageStore, MessageStream};
use crate::error::Result;
use crate::message::{Message, MessageId};

/// One line of the log file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum LogEntry {
    /// A stored message (always carries its assigned id)
    Insert { message: Message, timestamp: i64 },
    /// A single deleted message
    Delete { id: MessageId, timestamp: i64 },
    /// Everything before this line is gone
    Clear { timestamp: i64 },
}

struct Inner {
    log: MessageLog,
    writer: BufWriter<File>,
}

impl Inner {
    fn append(&mut self, entry: &LogEntry) -> Result<()> {
        writeln!(self.writer, "{}", serde_json::to_string(entry)?)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Message store persisted to a JSONL file.
///
/// Every mutation is appended as one line; opening the file replays them.
pub struct JsonlStore {
    path: PathBuf,
    inner: Mutex<Inner>,
}

impl JsonlStore {
    /// Open (or create) the log at `path` and replay it
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        let mut log = MessageLog::new();
        if path.exists() {
            replay(&path, &mut log)?;
        }

        let file = File::options().create(true).append(true).open(&path)?;
        tracing::info!(
            path = %path.display(),
            messages = log.messages().len(),
            "opened message log"
        );

        log.publish();
        Ok(Self {
            path,
            inner: Mutex::new(Inner {
                log,
                writer: BufWriter::new(file),
            }),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current contents in ascending `id` order
    pub fn messages(&self) -> Vec<Message> {
        self.inner.lock().log.messages()
    }
}

fn replay(path: &Path, log: &mut MessageLog) -> Result<()> {
    let reader = BufReader::new(File::open(path)?);

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<LogEntry>(&line) {
            Ok(LogEntry::Insert { message, .. }) => match log.assign(&message) {
                Ok(Some(id)) => log.commit(message.with_id(id)),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        line = index + 1,
                        "skipping message log entry: {}",
                        e
                    );
                }
            },
            Ok(LogEntry::Delete { id, .. }) => {
                log.remove(id);
            }
            Ok(LogEntry::Clear { .. }) => log.clear(),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    line = index + 1,
                    "skipping unreadable message log entry: {}",
                    e
                );
            }
        }
    }
    Ok(())
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[async_trait]
impl MessageStore for JsonlStore {
    fn observe_all(&self) -> MessageStream {
        self.inner.lock().log.stream()
    }

    async fn insert(&self, message: Message) -> Result<InsertOutcome> {
        let mut inner = self.inner.lock();
        let Some(id) = inner.log.assign(&message)? else {
            tracing::debug!(id = message.id, "ignoring insert of existing message");
            return Ok(InsertOutcome::Ignored(message.id));
        };

        let message = message.with_id(id);
        inner.append(&LogEntry::Insert {
            message: message.clone(),
            timestamp: now_millis(),
        })?;
        inner.log.commit(message);
        inner.log.publish();
        Ok(InsertOutcome::Inserted(id))
    }

    async fn delete(&self, id: MessageId) -> Result<bool> {
        let mut inner = self.inner.lock();
        if !inner.log.contains(id) {
            return Ok(false);
        }

        inner.append(&LogEntry::Delete {
            id,
            timestamp: now_millis(),
        })?;
        inner.log.remove(id);
        inner.log.publish();
        Ok(true)
    }

    async fn clear(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.append(&LogEntry::Clear {
            timestamp: now_millis(),
        })?;
        inner.log.clear();
        inner.log.publish();
        Ok(())
    }
}

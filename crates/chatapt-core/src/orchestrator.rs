//! The conversation state machine
//!
//! An [`Orchestrator`] owns one [`ConversationState`] and one
//! [`HistoryWindow`]. A send moves the state from `Idle` to `Loading`, asks
//! the [`GenerationClient`] for a reply using a snapshot of the window, and
//! returns to `Idle` with or without an error. Messages are persisted by a
//! detached worker, and the store's live feed is merged into the state by a
//! second background task, independently of any request.

use std::sync::Arc;

use chatapt_ai::{GenerationClient, GenerationOptions, HistoryTurn};
use futures::StreamExt;
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::history::{HistoryWindow, MAX_HISTORY_SIZE};
use crate::message::{Message, MessageId};
use crate::state::{ConversationState, Phase};
use crate::store::MessageStore;

/// Output cap applied to every request unless configured otherwise
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 50;

/// Orchestrator configuration
#[derive(Debug, Clone)]
pub struct ConversationConfig {
    /// Options forwarded to the generation client on every request
    pub generation: GenerationOptions,
    /// Number of turns kept as prompt context
    pub history_size: usize,
    /// Canned prompts published in the state
    pub templates: Vec<String>,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            generation: GenerationOptions::with_max_output_tokens(DEFAULT_MAX_OUTPUT_TOKENS),
            history_size: MAX_HISTORY_SIZE,
            templates: Vec::new(),
        }
    }
}

/// How a send ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank input; nothing happened
    Ignored,
    /// Another send is still in flight
    Busy,
    /// The model answered with this text
    Replied(String),
    /// Generation failed with this message
    Failed(String),
    /// The orchestrator was shut down before the reply arrived
    Cancelled,
}

enum PersistCommand {
    Insert(Message),
    Flush(oneshot::Sender<()>),
}

/// Drives the Idle/Loading state machine for one conversation.
///
/// Must be created inside a Tokio runtime; it spawns its background tasks
/// on construction.
pub struct Orchestrator {
    config: ConversationConfig,
    store: Arc<dyn MessageStore>,
    client: Arc<dyn GenerationClient>,
    state_tx: Arc<watch::Sender<ConversationState>>,
    window: Mutex<HistoryWindow>,
    persist_tx: mpsc::UnboundedSender<PersistCommand>,
    cancel: CancellationToken,
}

impl Orchestrator {
    pub fn new(
        config: ConversationConfig,
        store: Arc<dyn MessageStore>,
        client: Arc<dyn GenerationClient>,
    ) -> Self {
        let (state_tx, _) = watch::channel(ConversationState {
            templates: config.templates.clone(),
            ..Default::default()
        });
        let state_tx = Arc::new(state_tx);
        let cancel = CancellationToken::new();

        spawn_message_merge(Arc::clone(&store), Arc::clone(&state_tx), cancel.clone());
        let persist_tx = spawn_persist_worker(Arc::clone(&store));

        tracing::info!(
            history_size = config.history_size,
            templates = config.templates.len(),
            "orchestrator started"
        );

        Self {
            window: Mutex::new(HistoryWindow::new(config.history_size)),
            config,
            store,
            client,
            state_tx,
            persist_tx,
            cancel,
        }
    }

    /// Subscribe to state changes
    pub fn subscribe(&self) -> watch::Receiver<ConversationState> {
        self.state_tx.subscribe()
    }

    /// Current state snapshot
    pub fn state(&self) -> ConversationState {
        self.state_tx.borrow().clone()
    }

    pub fn config(&self) -> &ConversationConfig {
        &self.config
    }

    /// Copy of the turns that will be sent as context on the next request
    pub fn history(&self) -> Vec<HistoryTurn> {
        self.window.lock().snapshot()
    }

    /// Replace the input buffer. Legal in any phase.
    pub fn update_input(&self, text: impl Into<String>) {
        let text = text.into();
        self.state_tx.send_if_modified(|state| {
            if state.input == text {
                return false;
            }
            state.input = text;
            true
        });
    }

    /// Send whatever is in the input buffer
    pub async fn send_message(&self) -> SendOutcome {
        let text = self.state_tx.borrow().input.clone();
        self.send(text).await
    }

    /// Put a template in the input buffer and send it
    pub async fn send_template(&self, template: impl Into<String>) -> SendOutcome {
        self.update_input(template);
        self.send_message().await
    }

    /// Send `text` to the model.
    ///
    /// Blank text is ignored. While another send is in flight the call is
    /// rejected with [`SendOutcome::Busy`]. Generation failures are recorded
    /// in the state and returned, never propagated as errors.
    pub async fn send(&self, text: impl Into<String>) -> SendOutcome {
        let text = text.into();
        if text.trim().is_empty() {
            return SendOutcome::Ignored;
        }
        if self.cancel.is_cancelled() {
            return SendOutcome::Cancelled;
        }

        let accepted = self.state_tx.send_if_modified(|state| {
            if state.is_loading() {
                return false;
            }
            state.input.clear();
            state.phase = Phase::Loading;
            true
        });
        if !accepted {
            tracing::debug!("send rejected, request already in flight");
            return SendOutcome::Busy;
        }
        let guard = LoadingGuard::new(&self.state_tx);

        self.persist(Message::user(text.clone()));
        let history = {
            let mut window = self.window.lock();
            window.append(HistoryTurn::user(text));
            window.snapshot()
        };

        tracing::debug!(turns = history.len(), "requesting completion");
        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            result = self.generate(&history) => Some(result),
        };

        match result {
            Some(Ok(reply)) => {
                self.persist(Message::model(reply.clone()));
                self.window.lock().append(HistoryTurn::model(reply.clone()));
                guard.finish(None);
                SendOutcome::Replied(reply)
            }
            Some(Err(e)) => {
                let message = e.to_string();
                tracing::warn!("generation failed: {}", message);
                guard.finish(Some(message.clone()));
                SendOutcome::Failed(message)
            }
            None => {
                tracing::debug!("send interrupted by shutdown");
                guard.finish(None);
                SendOutcome::Cancelled
            }
        }
    }

    async fn generate(&self, history: &[HistoryTurn]) -> chatapt_ai::Result<String> {
        let completion = self
            .client
            .generate(history, &self.config.generation)
            .await?;
        match completion.first_text() {
            Some(text) if !text.trim().is_empty() => Ok(text.to_string()),
            _ => Err(chatapt_ai::Error::EmptyCompletion),
        }
    }

    fn persist(&self, message: Message) {
        if self.persist_tx.send(PersistCommand::Insert(message)).is_err() {
            tracing::warn!("persistence worker is gone, message not saved");
        }
    }

    /// Wait until every insert queued so far has reached the store
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        if self.persist_tx.send(PersistCommand::Flush(tx)).is_ok() {
            let _ = rx.await;
        }
    }

    /// Delete every persisted message. The history window is left alone.
    pub async fn clear_messages(&self) -> Result<()> {
        self.flush().await;
        self.store.clear().await
    }

    /// Delete one persisted message
    pub async fn delete_message(&self, id: MessageId) -> Result<bool> {
        self.flush().await;
        self.store.delete(id).await
    }

    /// Stop the store subscription and interrupt any in-flight send.
    ///
    /// Inserts already queued are still written.
    pub fn shutdown(&self) {
        if !self.cancel.is_cancelled() {
            tracing::info!("orchestrator shutting down");
            self.cancel.cancel();
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Returns the state to `Idle` however the send ends, including when its
/// future is dropped mid-request.
struct LoadingGuard<'a> {
    state_tx: &'a watch::Sender<ConversationState>,
    finished: bool,
}

impl<'a> LoadingGuard<'a> {
    fn new(state_tx: &'a watch::Sender<ConversationState>) -> Self {
        Self {
            state_tx,
            finished: false,
        }
    }

    fn finish(mut self, error: Option<String>) {
        self.finished = true;
        self.state_tx.send_modify(|state| state.phase = Phase::Idle { error });
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.state_tx
                .send_modify(|state| state.phase = Phase::Idle { error: None });
        }
    }
}

fn spawn_message_merge(
    store: Arc<dyn MessageStore>,
    state_tx: Arc<watch::Sender<ConversationState>>,
    cancel: CancellationToken,
) {
    let mut messages = store.observe_all();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                next = messages.next() => {
                    let Some(messages) = next else {
                        tracing::debug!("message feed closed");
                        break;
                    };
                    state_tx.send_if_modified(|state| {
                        if state.messages == messages {
                            return false;
                        }
                        state.messages = messages;
                        true
                    });
                }
            }
        }
    });
}

fn spawn_persist_worker(store: Arc<dyn MessageStore>) -> mpsc::UnboundedSender<PersistCommand> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(command) = rx.recv().await {
            match command {
                PersistCommand::Insert(message) => {
                    if let Err(e) = store.insert(message).await {
                        tracing::warn!("failed to persist message: {}", e);
                    }
                }
                PersistCommand::Flush(done) => {
                    let _ = done.send(());
                }
            }
        }
    });
    tx
}

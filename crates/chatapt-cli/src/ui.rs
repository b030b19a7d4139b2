//! TUI front end

use std::sync::Arc;
use std::time::Instant;

use chatapt_core::{ConversationState, Orchestrator, SendOutcome};
use chatapt_tui::{
    App, AppState, Theme,
    input::Action,
    widgets::{
        Bubble, InputBox, MessageList, Spinner, TemplateList, TemplatePicker,
        message_list::content_height,
    },
};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use tokio::sync::{mpsc, watch};

use crate::commands::{CommandResult, execute_command};

/// Lines moved per PageUp/PageDown
const PAGE: usize = 10;

/// Screen state; the conversation itself lives in the orchestrator
pub struct TuiState {
    orchestrator: Arc<Orchestrator>,
    state_rx: watch::Receiver<ConversationState>,
    /// Last state seen on `state_rx`
    state: ConversationState,
    input: InputBox,
    picker: TemplatePicker,
    show_templates: bool,
    /// Lines scrolled back from the newest message
    scroll: usize,
    theme: Theme,
    model: String,
    /// Command output or hint, dismissed with Esc
    notice: Option<String>,
    notice_tx: mpsc::UnboundedSender<String>,
    notice_rx: mpsc::UnboundedReceiver<String>,
    spinner_start: Instant,
    width: u16,
}

impl TuiState {
    pub fn new(orchestrator: Arc<Orchestrator>, model: impl Into<String>, theme: Theme) -> Self {
        let state_rx = orchestrator.subscribe();
        let state = state_rx.borrow().clone();
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();

        let mut input = InputBox::new().with_placeholder("Type a message... (/help for commands)");
        input.set_title("Message");

        Self {
            show_templates: !state.templates.is_empty(),
            orchestrator,
            state_rx,
            state,
            input,
            picker: TemplatePicker::new(),
            scroll: 0,
            theme,
            model: model.into(),
            notice: None,
            notice_tx,
            notice_rx,
            spinner_start: Instant::now(),
            width: 80,
        }
    }

    /// Pull the latest orchestrator state and any finished command output
    fn sync(&mut self) {
        if self.state_rx.has_changed().unwrap_or(false) {
            let state = self.state_rx.borrow_and_update().clone();
            if state.is_loading() && !self.state.is_loading() {
                self.spinner_start = Instant::now();
            }
            if state.input != self.input.content() {
                self.input.set_content(state.input.clone(), self.width);
            }
            self.input.set_busy(state.is_loading());
            self.state = state;
        }

        while let Ok(notice) = self.notice_rx.try_recv() {
            self.notice = Some(notice);
        }
    }

    fn submit(&mut self) -> bool {
        let text = self.input.content().trim().to_string();
        if text.is_empty() {
            return true;
        }

        if text.starts_with('/') {
            self.input.clear();
            self.orchestrator.update_input("");
            return self.run_command(&text);
        }

        if self.state.is_loading() {
            self.notice = Some("Still waiting for the last reply".to_string());
            return true;
        }

        self.notice = None;
        self.show_templates = false;
        self.scroll = 0;

        let orchestrator = Arc::clone(&self.orchestrator);
        let notice_tx = self.notice_tx.clone();
        tokio::spawn(async move {
            if orchestrator.send_message().await == SendOutcome::Busy {
                let _ = notice_tx.send("Still waiting for the last reply".to_string());
            }
        });
        true
    }

    fn send_template(&mut self, template: String) {
        if self.state.is_loading() {
            self.notice = Some("Still waiting for the last reply".to_string());
            return;
        }

        self.notice = None;
        self.show_templates = false;
        self.scroll = 0;

        let orchestrator = Arc::clone(&self.orchestrator);
        tokio::spawn(async move {
            orchestrator.send_template(template).await;
        });
    }

    fn run_command(&mut self, text: &str) -> bool {
        let Some(result) = execute_command(text, &self.state.templates) else {
            return true;
        };
        tracing::debug!(?result, "slash command");

        match result {
            CommandResult::Exit => return false,
            CommandResult::Message(msg) => self.notice = Some(msg),
            CommandResult::Unknown(cmd) => {
                self.notice = Some(format!(
                    "Unknown command: /{}\nType /help for available commands.",
                    cmd
                ));
            }
            CommandResult::ShowTemplates => {
                if self.state.templates.is_empty() {
                    self.notice = Some("No templates configured".to_string());
                } else {
                    self.show_templates = true;
                }
            }
            CommandResult::SendTemplate(template) => self.send_template(template),
            CommandResult::Clear => {
                let orchestrator = Arc::clone(&self.orchestrator);
                let notice_tx = self.notice_tx.clone();
                tokio::spawn(async move {
                    let notice = match orchestrator.clear_messages().await {
                        Ok(()) => "Cleared saved messages".to_string(),
                        Err(e) => format!("Clear failed: {}", e),
                    };
                    let _ = notice_tx.send(notice);
                });
            }
            CommandResult::Delete(id) => {
                let orchestrator = Arc::clone(&self.orchestrator);
                let notice_tx = self.notice_tx.clone();
                tokio::spawn(async move {
                    let notice = match orchestrator.delete_message(id).await {
                        Ok(true) => format!("Deleted message #{}", id),
                        Ok(false) => format!("No message #{}", id),
                        Err(e) => format!("Delete failed: {}", e),
                    };
                    let _ = notice_tx.send(notice);
                });
            }
        }
        true
    }

    fn render_messages(&mut self, frame: &mut Frame, area: Rect) {
        if self.state.messages.is_empty() {
            let welcome = Paragraph::new(format!(
                "Chatting with {}.\nType a message, or pick a template below.",
                self.model
            ))
            .style(self.theme.dim_style())
            .wrap(Wrap { trim: false });
            frame.render_widget(welcome, area);
            return;
        }

        let bubbles: Vec<Bubble> = self
            .state
            .messages
            .iter()
            .map(|m| {
                let bubble = if m.is_user {
                    Bubble::user(&m.text)
                } else {
                    Bubble::model(&m.text)
                };
                bubble.with_id(m.id)
            })
            .collect();

        let max_scroll =
            content_height(&bubbles, area.width as usize).saturating_sub(area.height as usize);
        self.scroll = self.scroll.min(max_scroll);

        frame.render_widget(
            MessageList::new(&bubbles, &self.theme).offset(self.scroll),
            area,
        );
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        if self.state.is_loading() {
            let spinner = Spinner::new("Waiting for Gemini...", self.spinner_start, &self.theme);
            frame.render_widget(spinner, area);
            return;
        }

        let status = match self.state.error() {
            Some(error) => Paragraph::new(format!("Error: {}", error)).style(self.theme.error_style()),
            None => Paragraph::new(format!(
                "Ready | {} | {} messages",
                self.model,
                self.state.messages.len()
            ))
            .style(self.theme.dim_style()),
        };
        frame.render_widget(status, area);
    }
}

impl AppState for TuiState {
    fn handle_action(&mut self, action: Action, width: u16) -> bool {
        self.width = width;
        self.sync();

        let templates = self.state.templates.len();
        match action {
            Action::Interrupt | Action::Eof => return false,
            Action::Submit => return self.submit(),
            Action::Tab if self.show_templates => {
                if let Some(template) = self.picker.current(&self.state.templates) {
                    let template = template.to_string();
                    self.send_template(template);
                }
            }
            Action::Up if self.show_templates => self.picker.up(templates),
            Action::Down if self.show_templates => self.picker.down(templates),
            Action::Up => self.scroll = self.scroll.saturating_add(1),
            Action::Down => self.scroll = self.scroll.saturating_sub(1),
            Action::PageUp => self.scroll = self.scroll.saturating_add(PAGE),
            Action::PageDown => self.scroll = self.scroll.saturating_sub(PAGE),
            Action::Escape => {
                if self.notice.take().is_none() {
                    self.show_templates = false;
                }
            }
            other => {
                if self.input.handle_action(&other, width) {
                    self.orchestrator.update_input(self.input.content());
                }
            }
        }
        true
    }

    fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();
        self.width = area.width;
        self.sync();

        let notice_height = self
            .notice
            .as_ref()
            .map(|n| (n.lines().count() as u16 + 2).min(area.height / 2))
            .unwrap_or(0);
        let templates_height = if self.show_templates {
            TemplateList::height(&self.state.templates)
        } else {
            0
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),
                Constraint::Length(notice_height),
                Constraint::Length(templates_height),
                Constraint::Length(1),
                Constraint::Length(3),
            ])
            .split(area);

        self.render_messages(frame, chunks[0]);

        if let Some(notice) = &self.notice {
            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(self.theme.border_style())
                .title(" Esc to dismiss ");
            frame.render_widget(
                Paragraph::new(notice.as_str())
                    .block(block)
                    .style(self.theme.base_style()),
                chunks[1],
            );
        }

        if self.show_templates {
            frame.render_widget(
                TemplateList::new(&self.state.templates, &self.picker, &self.theme),
                chunks[2],
            );
        }

        self.render_status(frame, chunks[3]);
        self.input
            .render(chunks[4], frame.buffer_mut(), &self.theme);
    }

    fn tick(&mut self) -> bool {
        self.sync();
        true
    }
}

/// Run the TUI until the user quits
pub async fn run_tui(orchestrator: Arc<Orchestrator>, model: &str) -> anyhow::Result<()> {
    let mut app = App::new()?;
    let mut state = TuiState::new(orchestrator, model, app.theme().clone());
    app.run_async(&mut state).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chatapt_ai::{
        Candidate, CandidateContent, Completion, GenerationClient, GenerationOptions,
        HistoryTurn, Part,
    };
    use chatapt_core::{ConversationConfig, MemoryStore};
    use std::time::Duration;

    /// Replies with the last user turn, prefixed
    struct EchoClient;

    #[async_trait]
    impl GenerationClient for EchoClient {
        async fn generate(
            &self,
            history: &[HistoryTurn],
            _options: &GenerationOptions,
        ) -> chatapt_ai::Result<Completion> {
            let last = history.last().map(|t| t.text.clone()).unwrap_or_default();
            Ok(Completion {
                candidates: vec![Candidate {
                    content: Some(CandidateContent {
                        role: Some("model".into()),
                        parts: vec![Part {
                            text: Some(format!("echo: {}", last)),
                        }],
                    }),
                    finish_reason: None,
                }],
                ..Default::default()
            })
        }
    }

    fn tui() -> (TuiState, Arc<Orchestrator>) {
        let orchestrator = Arc::new(Orchestrator::new(
            ConversationConfig {
                templates: vec!["Halo".into(), "Apa kabar?".into()],
                ..Default::default()
            },
            Arc::new(MemoryStore::new()),
            Arc::new(EchoClient),
        ));
        let state = TuiState::new(Arc::clone(&orchestrator), "gemini-2.0-flash", Theme::dark());
        (state, orchestrator)
    }

    fn type_text(tui: &mut TuiState, text: &str) {
        for c in text.chars() {
            assert!(tui.handle_action(Action::Char(c), 80));
        }
    }

    async fn wait_for_messages(orchestrator: &Orchestrator, count: usize) -> ConversationState {
        let mut rx = orchestrator.subscribe();
        tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|s| s.messages.len() == count))
            .await
            .expect("messages did not arrive")
            .expect("state channel closed")
            .clone()
    }

    #[tokio::test]
    async fn test_typing_updates_orchestrator_input() {
        let (mut tui, orchestrator) = tui();
        type_text(&mut tui, "Hi");
        assert_eq!(orchestrator.state().input, "Hi");

        tui.handle_action(Action::Backspace, 80);
        assert_eq!(orchestrator.state().input, "H");
    }

    #[tokio::test]
    async fn test_submit_sends_and_clears_input() {
        let (mut tui, orchestrator) = tui();
        type_text(&mut tui, "Hi");
        assert!(tui.handle_action(Action::Submit, 80));
        assert!(!tui.show_templates);

        let state = wait_for_messages(&orchestrator, 2).await;
        assert_eq!(state.messages[1].text, "echo: Hi");

        tui.tick();
        assert_eq!(tui.input.content(), "");
        assert_eq!(tui.state.messages.len(), 2);
    }

    #[tokio::test]
    async fn test_tab_sends_highlighted_template() {
        let (mut tui, orchestrator) = tui();
        assert!(tui.show_templates);

        tui.handle_action(Action::Down, 80);
        tui.handle_action(Action::Tab, 80);

        let state = wait_for_messages(&orchestrator, 2).await;
        assert_eq!(state.messages[0].text, "Apa kabar?");
        assert_eq!(state.messages[1].text, "echo: Apa kabar?");
    }

    #[tokio::test]
    async fn test_commands() {
        let (mut tui, _orchestrator) = tui();

        type_text(&mut tui, "/nope");
        assert!(tui.handle_action(Action::Submit, 80));
        assert!(tui.notice.as_deref().unwrap().starts_with("Unknown command: /nope"));
        assert_eq!(tui.input.content(), "");

        tui.handle_action(Action::Escape, 80);
        assert!(tui.notice.is_none());

        type_text(&mut tui, "/quit");
        assert!(!tui.handle_action(Action::Submit, 80));
    }

    #[tokio::test]
    async fn test_clear_command_reports_back() {
        let (mut tui, orchestrator) = tui();
        orchestrator.send("Hi").await;

        type_text(&mut tui, "/clear");
        tui.handle_action(Action::Submit, 80);

        // The command runs in a spawned task
        for _ in 0..50 {
            tui.tick();
            if tui.notice.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(tui.notice.as_deref(), Some("Cleared saved messages"));
    }
}

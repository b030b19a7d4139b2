//! Terminal setup and the event loop

use crate::input::{Action, event_to_action};
use crate::theme::Theme;
use crossterm::{
    event::{DisableBracketedPaste, EnableBracketedPaste, EventStream},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{self, Stdout};
use std::time::Duration;

/// Application state driven by [`App`]
pub trait AppState {
    /// Handle an input action; return false to quit.
    ///
    /// `width` is the current terminal width, for widgets that scroll.
    fn handle_action(&mut self, action: Action, width: u16) -> bool;

    /// Render the UI
    fn render(&mut self, frame: &mut ratatui::Frame);

    /// Called when no input arrived within one tick; return false to quit
    fn tick(&mut self) -> bool {
        true
    }
}

/// Owns the terminal for the lifetime of the UI
pub struct App {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    theme: Theme,
    tick_rate: Duration,
}

impl App {
    /// Switch the terminal to raw mode on the alternate screen
    pub fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;

        Ok(Self {
            terminal,
            theme: Theme::default(),
            tick_rate: Duration::from_millis(100),
        })
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Set how often [`AppState::tick`] runs while idle
    pub fn with_tick_rate(mut self, rate: Duration) -> Self {
        self.tick_rate = rate;
        self
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Run until the state asks to quit or the terminal event stream ends
    pub async fn run_async<S: AppState>(&mut self, state: &mut S) -> io::Result<()> {
        let mut events = EventStream::new();

        loop {
            self.terminal.draw(|frame| state.render(frame))?;

            match tokio::time::timeout(self.tick_rate, events.next()).await {
                Ok(Some(Ok(event))) => {
                    // Resizes and focus changes only need the redraw above
                    if let Some(action) = event_to_action(event) {
                        let width = self.terminal.size()?.width;
                        if !state.handle_action(action, width) {
                            return Ok(());
                        }
                    }
                }
                Ok(Some(Err(e))) => return Err(e),
                Ok(None) => return Ok(()),
                Err(_) => {
                    if !state.tick() {
                        return Ok(());
                    }
                }
            }
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableBracketedPaste
        );
        let _ = self.terminal.show_cursor();
    }
}

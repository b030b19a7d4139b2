//! chatapt-tui: Terminal UI components
//!
//! Widgets and a small event loop for rendering a chat in the terminal,
//! built on ratatui and crossterm. Nothing here knows about the
//! conversation core; callers map their own state onto the widgets.

pub mod app;
pub mod input;
pub mod theme;
pub mod widgets;

pub use app::{App, AppState};
pub use input::Action;
pub use theme::Theme;

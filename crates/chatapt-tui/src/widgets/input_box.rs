//! Single-line prompt input

use crate::input::Action;
use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    widgets::{Block, Borders, Paragraph, Widget},
};
use unicode_width::UnicodeWidthChar;

/// Columns taken by the border on each side
const BORDER_WIDTH: usize = 2;

/// Editable single-line text field
#[derive(Debug, Default)]
pub struct InputBox {
    content: String,
    /// Cursor position in chars
    cursor: usize,
    /// First visible display column
    scroll: usize,
    placeholder: String,
    title: String,
    /// Dimmed border; editing still works
    busy: bool,
}

impl InputBox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Render as waiting on a reply
    pub fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Replace the text and move the cursor to the end
    pub fn set_content(&mut self, content: impl Into<String>, width: u16) {
        self.content = content.into();
        self.cursor = self.char_count();
        self.update_scroll(width);
    }

    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor = 0;
        self.scroll = 0;
    }

    fn char_count(&self) -> usize {
        self.content.chars().count()
    }

    fn byte_offset(&self, char_index: usize) -> usize {
        self.content
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.content.len())
    }

    fn cursor_column(&self) -> usize {
        self.content
            .chars()
            .take(self.cursor)
            .map(|c| c.width().unwrap_or(0))
            .sum()
    }

    /// Remove chars `[start, end)`, leaving the cursor at `start`
    fn remove_range(&mut self, start: usize, end: usize) {
        let (from, to) = (self.byte_offset(start), self.byte_offset(end));
        self.content.drain(from..to);
        self.cursor = start;
    }

    fn insert_char(&mut self, c: char) {
        let at = self.byte_offset(self.cursor);
        self.content.insert(at, c);
        self.cursor += 1;
    }

    /// Apply an editing action; returns whether the text or cursor changed
    pub fn handle_action(&mut self, action: &Action, width: u16) -> bool {
        let len = self.char_count();
        let changed = match action {
            Action::Char(c) => {
                self.insert_char(*c);
                true
            }
            Action::Paste(text) => {
                // Line breaks become single spaces
                for c in text.chars() {
                    if c == '\n' || c == '\r' {
                        if self.cursor > 0 && !self.content.ends_with(' ') {
                            self.insert_char(' ');
                        }
                    } else {
                        self.insert_char(c);
                    }
                }
                !text.is_empty()
            }
            Action::Backspace if self.cursor > 0 => {
                self.remove_range(self.cursor - 1, self.cursor);
                true
            }
            Action::Delete if self.cursor < len => {
                let cursor = self.cursor;
                self.remove_range(cursor, cursor + 1);
                true
            }
            Action::Left if self.cursor > 0 => {
                self.cursor -= 1;
                true
            }
            Action::Right if self.cursor < len => {
                self.cursor += 1;
                true
            }
            Action::Home => {
                self.cursor = 0;
                true
            }
            Action::End => {
                self.cursor = len;
                true
            }
            Action::ClearLine => {
                self.clear();
                true
            }
            Action::DeleteWord if self.cursor > 0 => {
                let chars: Vec<char> = self.content.chars().collect();
                let mut start = self.cursor;
                while start > 0 && chars[start - 1] == ' ' {
                    start -= 1;
                }
                while start > 0 && chars[start - 1] != ' ' {
                    start -= 1;
                }
                self.remove_range(start, self.cursor);
                true
            }
            _ => false,
        };

        if changed {
            self.update_scroll(width);
        }
        changed
    }

    fn update_scroll(&mut self, width: u16) {
        let visible = (width as usize).saturating_sub(BORDER_WIDTH).max(1);
        let column = self.cursor_column();

        if column < self.scroll {
            self.scroll = column;
        } else if column >= self.scroll + visible {
            self.scroll = column + 1 - visible;
        }
    }

    /// Text between display columns `scroll` and `scroll + width`
    fn visible_text(&self, width: usize) -> String {
        let mut column = 0;
        let mut visible = String::new();
        for c in self.content.chars() {
            let w = c.width().unwrap_or(0);
            if column >= self.scroll {
                if column + w > self.scroll + width {
                    break;
                }
                visible.push(c);
            }
            column += w;
        }
        visible
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        let mut block = Block::default()
            .borders(Borders::ALL)
            .border_style(if self.busy {
                theme.border_style()
            } else {
                theme.accent_style()
            });
        if !self.title.is_empty() {
            block = block.title(format!(" {} ", self.title));
        }

        let inner = block.inner(area);
        block.render(area, buf);

        let (text, style) = if self.content.is_empty() {
            (self.placeholder.clone(), theme.dim_style())
        } else {
            (self.visible_text(inner.width as usize), theme.base_style())
        };
        Paragraph::new(text).style(style).render(inner, buf);

        if inner.width > 0 {
            let x = self.cursor_column().saturating_sub(self.scroll);
            if x < inner.width as usize {
                if let Some(cell) = buf.cell_mut((inner.x + x as u16, inner.y)) {
                    cell.set_style(Style::default().bg(theme.accent));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(text: &str) -> InputBox {
        let mut input = InputBox::new();
        for c in text.chars() {
            input.handle_action(&Action::Char(c), 40);
        }
        input
    }

    #[test]
    fn test_typing_and_backspace() {
        let mut input = typed("Halo");
        assert_eq!(input.content(), "Halo");

        assert!(input.handle_action(&Action::Backspace, 40));
        assert_eq!(input.content(), "Hal");
    }

    #[test]
    fn test_backspace_at_start_is_noop() {
        let mut input = InputBox::new();
        assert!(!input.handle_action(&Action::Backspace, 40));
    }

    #[test]
    fn test_insert_in_middle_with_multibyte() {
        let mut input = typed("héllo");
        input.handle_action(&Action::Home, 40);
        input.handle_action(&Action::Right, 40);
        input.handle_action(&Action::Right, 40);
        input.handle_action(&Action::Char('X'), 40);
        assert_eq!(input.content(), "héXllo");

        input.handle_action(&Action::Delete, 40);
        assert_eq!(input.content(), "héXlo");
    }

    #[test]
    fn test_delete_word() {
        let mut input = typed("Apa kabar  ");
        input.handle_action(&Action::DeleteWord, 40);
        assert_eq!(input.content(), "Apa ");
    }

    #[test]
    fn test_paste_flattens_newlines() {
        let mut input = InputBox::new();
        input.handle_action(&Action::Paste("Apa\r\nkabar?".into()), 40);
        assert_eq!(input.content(), "Apa kabar?");
    }

    #[test]
    fn test_scroll_follows_cursor() {
        let mut input = typed("abcdefghij");
        // 4 visible columns inside the border
        input.update_scroll(6);
        assert_eq!(input.scroll, 7);
        assert_eq!(input.visible_text(4), "hij");

        input.handle_action(&Action::Home, 6);
        assert_eq!(input.scroll, 0);
    }

    #[test]
    fn test_set_content_moves_cursor_to_end() {
        let mut input = InputBox::new();
        input.set_content("Ada yang bisa dibantu?", 80);
        input.handle_action(&Action::Char('!'), 80);
        assert_eq!(input.content(), "Ada yang bisa dibantu?!");
    }
}

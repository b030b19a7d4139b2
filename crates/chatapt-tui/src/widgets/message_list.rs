//! Chat transcript widget

use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

/// Who wrote a bubble
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Author {
    User,
    Model,
}

/// One message as shown in the transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bubble<'a> {
    pub author: Author,
    pub text: &'a str,
    /// Shown dimmed after the author
    pub id: Option<u64>,
}

impl<'a> Bubble<'a> {
    pub fn user(text: &'a str) -> Self {
        Self {
            author: Author::User,
            text,
            id: None,
        }
    }

    pub fn model(text: &'a str) -> Self {
        Self {
            author: Author::Model,
            text,
            id: None,
        }
    }

    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }
}

/// Transcript pinned to its newest line.
///
/// `offset` scrolls back from the bottom by that many lines.
pub struct MessageList<'a> {
    bubbles: &'a [Bubble<'a>],
    theme: &'a Theme,
    offset: usize,
}

impl<'a> MessageList<'a> {
    pub fn new(bubbles: &'a [Bubble<'a>], theme: &'a Theme) -> Self {
        Self {
            bubbles,
            theme,
            offset: 0,
        }
    }

    /// Scroll back from the newest line
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    fn bubble_lines(&self, bubble: &Bubble<'_>, width: usize) -> Vec<Line<'static>> {
        let (label, style) = match bubble.author {
            Author::User => ("▶ You", self.theme.user_style()),
            Author::Model => ("◀ Gemini", self.theme.model_style()),
        };

        let mut header = vec![Span::styled(label, style)];
        if let Some(id) = bubble.id {
            header.push(Span::styled(format!("  #{}", id), self.theme.dim_style()));
        }

        let mut lines = vec![Line::from(header)];
        for row in wrap(bubble.text, width) {
            lines.push(Line::from(Span::styled(
                format!("  {}", row),
                self.theme.base_style(),
            )));
        }
        lines.push(Line::default());
        lines
    }
}

fn wrap(text: &str, width: usize) -> Vec<String> {
    textwrap::wrap(text, width.saturating_sub(2).max(1))
        .into_iter()
        .map(|row| row.into_owned())
        .collect()
}

/// Total rendered height of `bubbles` at `width`, in lines
pub fn content_height(bubbles: &[Bubble<'_>], width: usize) -> usize {
    // Header and trailing blank line per bubble
    bubbles
        .iter()
        .map(|b| wrap(b.text, width).len() + 2)
        .sum()
}

impl Widget for MessageList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let width = area.width as usize;
        let lines: Vec<Line> = self
            .bubbles
            .iter()
            .flat_map(|b| self.bubble_lines(b, width))
            .collect();

        let height = area.height as usize;
        let max_offset = lines.len().saturating_sub(height);
        let start = max_offset - self.offset.min(max_offset);

        let visible: Vec<Line> = lines.into_iter().skip(start).take(height).collect();
        Paragraph::new(visible).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf[(x, y)].symbol())
            .collect::<String>()
            .trim_end()
            .to_string()
    }

    fn render(bubbles: &[Bubble<'_>], offset: usize, width: u16, height: u16) -> Buffer {
        let theme = Theme::dark();
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        MessageList::new(bubbles, &theme)
            .offset(offset)
            .render(area, &mut buf);
        buf
    }

    #[test]
    fn test_renders_headers_and_text() {
        let bubbles = [Bubble::user("Hi"), Bubble::model("Halo!")];
        let buf = render(&bubbles, 0, 30, 6);

        assert_eq!(row(&buf, 0), "▶ You");
        assert_eq!(row(&buf, 1), "  Hi");
        assert_eq!(row(&buf, 3), "◀ Gemini");
        assert_eq!(row(&buf, 4), "  Halo!");
    }

    #[test]
    fn test_header_shows_id() {
        let bubbles = [Bubble::user("Hi").with_id(7)];
        let buf = render(&bubbles, 0, 30, 3);
        assert_eq!(row(&buf, 0), "▶ You  #7");
    }

    #[test]
    fn test_pins_to_bottom_and_scrolls_back() {
        let bubbles = [
            Bubble::user("one"),
            Bubble::model("two"),
            Bubble::user("three"),
        ];
        // 9 lines total, 3 visible
        let buf = render(&bubbles, 0, 20, 3);
        assert_eq!(row(&buf, 0), "▶ You");
        assert_eq!(row(&buf, 1), "  three");

        let buf = render(&bubbles, 100, 20, 3);
        assert_eq!(row(&buf, 1), "  one");
    }

    #[test]
    fn test_content_height_counts_wrapped_rows() {
        let bubbles = [Bubble::model("aaaa bbbb cccc")];
        // 8 columns leaves 6 for text after the indent
        assert_eq!(content_height(&bubbles, 8), 5);
        assert_eq!(content_height(&bubbles, 80), 3);
        assert_eq!(content_height(&[], 80), 0);
    }
}

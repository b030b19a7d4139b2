//! Canned prompt list shown above the input

use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, StatefulWidget, Widget},
};

/// Highlight position over a list of templates
#[derive(Debug, Clone, Default)]
pub struct TemplatePicker {
    selected: usize,
}

impl TemplatePicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Move up, wrapping to the last of `len` entries
    pub fn up(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        self.selected = if self.selected == 0 {
            len - 1
        } else {
            (self.selected - 1).min(len - 1)
        };
    }

    /// Move down, wrapping to the first entry
    pub fn down(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        self.selected = (self.selected + 1) % len;
    }

    /// The highlighted entry, if the list is not empty
    pub fn current<'t>(&self, templates: &'t [String]) -> Option<&'t str> {
        templates
            .get(self.selected.min(templates.len().saturating_sub(1)))
            .map(String::as_str)
    }
}

/// Bordered list of templates with one highlighted row
pub struct TemplateList<'a> {
    templates: &'a [String],
    picker: &'a TemplatePicker,
    theme: &'a Theme,
}

impl<'a> TemplateList<'a> {
    pub fn new(templates: &'a [String], picker: &'a TemplatePicker, theme: &'a Theme) -> Self {
        Self {
            templates,
            picker,
            theme,
        }
    }

    /// Rows needed to show every template plus the border
    pub fn height(templates: &[String]) -> u16 {
        if templates.is_empty() {
            0
        } else {
            templates.len() as u16 + 2
        }
    }
}

impl Widget for TemplateList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.templates.is_empty() || area.height < 3 {
            return;
        }

        let items: Vec<ListItem> = self
            .templates
            .iter()
            .map(|t| ListItem::new(Line::from(Span::styled(t.as_str(), self.theme.base_style()))))
            .collect();

        let block = Block::default()
            .title(" Templates (↑/↓, Tab to send) ")
            .title_style(self.theme.dim_style())
            .borders(Borders::ALL)
            .border_style(self.theme.border_style());

        let list = List::new(items)
            .block(block)
            .highlight_style(self.theme.highlight_style())
            .highlight_symbol("› ");

        let mut state = ListState::default();
        state.select(Some(
            self.picker
                .selected()
                .min(self.templates.len().saturating_sub(1)),
        ));
        StatefulWidget::render(list, area, buf, &mut state);
    }
}

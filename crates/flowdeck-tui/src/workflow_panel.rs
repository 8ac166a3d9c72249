//! Workflow list.

use flowdeck_core::types::{Workflow, format_local};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Row, Table, Widget},
};

use crate::theme::Theme;
use crate::widget::{panel_block, truncate_text, visible_window};

/// Comma-separated tag names.
pub fn tag_list(workflow: &Workflow) -> String {
    workflow
        .tags
        .iter()
        .map(|t| t.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Every workflow with id, tags and last update.
pub struct WorkflowPanel<'a> {
    workflows: &'a [Workflow],
    theme: &'a Theme,
    selected: Option<usize>,
}

impl<'a> WorkflowPanel<'a> {
    pub fn new(workflows: &'a [Workflow], theme: &'a Theme) -> Self {
        Self {
            workflows,
            theme,
            selected: None,
        }
    }

    pub fn selected(mut self, selected: Option<usize>) -> Self {
        self.selected = selected;
        self
    }
}

impl Widget for WorkflowPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let block = panel_block(format!("Workflows ({})", self.workflows.len()), self.theme, true);
        let inner = block.inner(area);
        block.render(area, buf);

        if self.workflows.is_empty() {
            Paragraph::new("No workflows")
                .style(Style::default().fg(colors.text_dim))
                .render(inner, buf);
            return;
        }

        let height = inner.height.saturating_sub(1) as usize;
        let (start, end) = visible_window(self.workflows.len(), self.selected.unwrap_or(0), height);

        let rows: Vec<Row> = self.workflows[start..end]
            .iter()
            .enumerate()
            .map(|(offset, w)| {
                let updated = w
                    .updated_at
                    .as_deref()
                    .map(|raw| format_local(raw, "%d/%m/%Y %H:%M"))
                    .unwrap_or_else(|| "N/A".to_string());
                let mut style = Style::default().fg(colors.text);
                if self.selected == Some(start + offset) {
                    style = style.add_modifier(Modifier::REVERSED);
                }
                Row::new(vec![
                    Line::from(truncate_text(&w.name, 40)),
                    Line::from(Span::styled(w.id.clone(), Style::default().fg(colors.text_dim))),
                    Line::from(Span::styled(tag_list(w), Style::default().fg(colors.hotkey))),
                    Line::from(updated),
                ])
                .style(style)
            })
            .collect();

        let header = Row::new(vec!["NAME", "ID", "TAGS", "UPDATED"]).style(
            Style::default()
                .fg(colors.text_dim)
                .add_modifier(Modifier::BOLD),
        );
        let widths = [
            Constraint::Min(20),
            Constraint::Length(18),
            Constraint::Length(24),
            Constraint::Length(16),
        ];

        Widget::render(
            Table::new(rows, widths).header(header).column_spacing(1),
            inner,
            buf,
        );
    }
}

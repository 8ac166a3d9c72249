//! Execution log and error log tables.
//!
//! Both tables list executions newest first. The error log keeps only
//! non-success entries, can be narrowed to one workflow, and pages in steps
//! of [`PAGE_STEP`] rows.

use flowdeck_core::types::{DashboardPayload, Execution, format_local};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Row, Table, Widget},
};

use crate::theme::Theme;
use crate::widget::{HotkeyHints, panel_block, truncate_text, visible_window};

/// Rows added by each "show more".
pub const PAGE_STEP: usize = 30;

const TIME_FORMAT: &str = "%d/%m %H:%M:%S";

/// `450ms`, `2.34s`, `3m 12s`, `1h 5m`.
pub fn format_duration(ms: i64) -> String {
    let ms = ms.max(0);
    if ms < 1_000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.2}s", ms as f64 / 1000.0)
    } else if ms < 3_600_000 {
        let minutes = ms / 60_000;
        let seconds = ((ms % 60_000) as f64 / 1000.0).round() as i64;
        format!("{}m {}s", minutes, seconds)
    } else {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        format!("{}h {}m", hours, minutes)
    }
}

fn execution_duration(execution: &Execution) -> String {
    match execution.duration() {
        Some(d) => format_duration(d.num_milliseconds()),
        None if execution.stopped_at.is_none() => "running".to_string(),
        None => "--".to_string(),
    }
}

fn started(execution: &Execution) -> String {
    execution
        .started_at
        .as_deref()
        .map(|raw| format_local(raw, TIME_FORMAT))
        .unwrap_or_default()
}

/// Filter and paging state of the error log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorLogState {
    /// Workflow id to show, or every workflow
    pub workflow_filter: Option<String>,
    pub display_count: usize,
}

impl Default for ErrorLogState {
    fn default() -> Self {
        Self {
            workflow_filter: None,
            display_count: PAGE_STEP,
        }
    }
}

impl ErrorLogState {
    /// Workflow ids offered by the filter: workflows with at least one failure.
    pub fn filter_options(payload: &DashboardPayload) -> Vec<&str> {
        payload
            .workflows
            .iter()
            .filter(|w| {
                payload
                    .executions
                    .iter()
                    .any(|e| !e.is_success() && e.workflow_id == w.id)
            })
            .map(|w| w.id.as_str())
            .collect()
    }

    /// Advance the filter: all, then each workflow with failures, then all again.
    pub fn cycle_filter(&mut self, payload: &DashboardPayload) {
        let options = Self::filter_options(payload);
        let next = match &self.workflow_filter {
            None => options.first(),
            Some(current) => options
                .iter()
                .position(|id| id == current)
                .and_then(|idx| options.get(idx + 1)),
        };
        self.workflow_filter = next.map(|id| id.to_string());
    }

    pub fn show_more(&mut self) {
        self.display_count += PAGE_STEP;
    }

    /// Non-success executions passing the workflow filter.
    pub fn filtered<'a>(&self, payload: &'a DashboardPayload) -> Vec<&'a Execution> {
        payload
            .executions
            .iter()
            .filter(|e| !e.is_success())
            .filter(|e| {
                self.workflow_filter
                    .as_deref()
                    .is_none_or(|id| e.workflow_id == id)
            })
            .collect()
    }

    /// The page currently shown.
    pub fn displayed<'a>(&self, payload: &'a DashboardPayload) -> Vec<&'a Execution> {
        let mut rows = self.filtered(payload);
        rows.truncate(self.display_count);
        rows
    }
}

fn execution_rows<'a>(
    executions: &[&'a Execution],
    payload: &'a DashboardPayload,
    selected: Option<usize>,
    height: usize,
    theme: &Theme,
) -> Vec<Row<'a>> {
    let colors = &theme.colors;
    let (start, end) = visible_window(executions.len(), selected.unwrap_or(0), height);

    executions[start..end]
        .iter()
        .enumerate()
        .map(|(offset, e)| {
            let status_color = if e.is_success() {
                colors.status_healthy
            } else if e.is_error() {
                colors.status_error
            } else {
                colors.status_warning
            };
            let mut style = Style::default().fg(colors.text);
            if selected == Some(start + offset) {
                style = style.add_modifier(Modifier::REVERSED);
            }
            Row::new(vec![
                Line::from(Span::styled(format!("● {}", e.status), Style::default().fg(status_color))),
                Line::from(e.id.clone()),
                Line::from(truncate_text(payload.workflow_name(&e.workflow_id, &e.workflow_id), 40)),
                Line::from(started(e)),
                Line::from(execution_duration(e)),
            ])
            .style(style)
        })
        .collect()
}

fn execution_table<'a>(rows: Vec<Row<'a>>, theme: &Theme) -> Table<'a> {
    let header = Row::new(vec!["STATUS", "ID", "WORKFLOW", "STARTED", "DURATION"]).style(
        Style::default()
            .fg(theme.colors.text_dim)
            .add_modifier(Modifier::BOLD),
    );
    let widths = [
        Constraint::Length(11),
        Constraint::Length(8),
        Constraint::Min(16),
        Constraint::Length(15),
        Constraint::Length(9),
    ];
    Table::new(rows, widths).header(header).column_spacing(1)
}

/// Every execution, newest first.
pub struct ExecutionTable<'a> {
    payload: &'a DashboardPayload,
    theme: &'a Theme,
    selected: Option<usize>,
    limit: Option<usize>,
    focused: bool,
}

impl<'a> ExecutionTable<'a> {
    pub fn new(payload: &'a DashboardPayload, theme: &'a Theme) -> Self {
        Self {
            payload,
            theme,
            selected: None,
            limit: None,
            focused: false,
        }
    }

    /// Highlight a row and keep it scrolled into view.
    pub fn selected(mut self, selected: Option<usize>) -> Self {
        self.selected = selected;
        self
    }

    /// Show only the newest `limit` executions.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }
}

impl Widget for ExecutionTable<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut executions: Vec<&Execution> = self.payload.executions.iter().collect();
        if let Some(limit) = self.limit {
            executions.truncate(limit);
        }

        let title = match self.limit {
            Some(_) => "Recent Executions".to_string(),
            None => format!("Executions ({})", executions.len()),
        };
        let block = panel_block(title, self.theme, self.focused);
        let inner = block.inner(area);
        block.render(area, buf);

        if executions.is_empty() {
            Paragraph::new("No executions yet")
                .style(Style::default().fg(self.theme.colors.text_dim))
                .render(inner, buf);
            return;
        }

        let height = inner.height.saturating_sub(1) as usize;
        let rows = execution_rows(&executions, self.payload, self.selected, height, self.theme);
        Widget::render(execution_table(rows, self.theme), inner, buf);
    }
}

/// Failed executions with workflow filter and paging.
pub struct ErrorLogPanel<'a> {
    payload: &'a DashboardPayload,
    state: &'a ErrorLogState,
    theme: &'a Theme,
    selected: Option<usize>,
}

impl<'a> ErrorLogPanel<'a> {
    pub fn new(payload: &'a DashboardPayload, state: &'a ErrorLogState, theme: &'a Theme) -> Self {
        Self {
            payload,
            state,
            theme,
            selected: None,
        }
    }

    pub fn selected(mut self, selected: Option<usize>) -> Self {
        self.selected = selected;
        self
    }
}

impl Widget for ErrorLogPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let all_errors = self.payload.executions.iter().filter(|e| !e.is_success()).count();
        let filtered = self.state.filtered(self.payload);
        let displayed = self.state.displayed(self.payload);

        let block = panel_block(format!("Error Log [{}]", all_errors), self.theme, true);
        let inner = block.inner(area);
        block.render(area, buf);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(1),
                Constraint::Length(1),
            ])
            .split(inner);

        let filter_name = match &self.state.workflow_filter {
            Some(id) => self.payload.workflow_name(id, id).to_string(),
            None => "All workflows".to_string(),
        };
        Paragraph::new(Line::from(vec![
            Span::styled("Filter: ", Style::default().fg(colors.text_dim)),
            Span::styled(filter_name, Style::default().fg(colors.text)),
            Span::styled(
                format!("   {}/{}", displayed.len(), filtered.len()),
                Style::default().fg(colors.text_dim),
            ),
        ]))
        .render(chunks[0], buf);

        if filtered.is_empty() {
            Paragraph::new(vec![
                Line::styled("● No errors recorded", Style::default().fg(colors.status_healthy)),
                Line::styled(
                    "All executions succeeded",
                    Style::default().fg(colors.text_dim),
                ),
            ])
            .render(chunks[1], buf);
        } else {
            let height = chunks[1].height.saturating_sub(1) as usize;
            let rows = execution_rows(&displayed, self.payload, self.selected, height, self.theme);
            Widget::render(execution_table(rows, self.theme), chunks[1], buf);
        }

        let mut hints = HotkeyHints::new().hint("f", "Filter").hint("Enter", "Open");
        let remaining = filtered.len().saturating_sub(displayed.len());
        if remaining > 0 {
            hints = hints.hint("m", format!("Load more ({} remaining)", remaining));
        }
        Paragraph::new(hints.as_line(self.theme)).render(chunks[2], buf);
    }
}

//! KPI cards for the overview.
//!
//! Five cards in a row: latest status, total executions, success rate,
//! average latency and the most recent failure.

use flowdeck_core::types::{DashboardPayload, Execution, format_local};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::theme::Theme;

/// Most recent non-success execution.
#[derive(Debug, Clone, PartialEq)]
pub struct LastError {
    pub execution_id: String,
    pub workflow_name: String,
    pub started_at: Option<String>,
    pub link: Option<String>,
}

/// Figures shown on the KPI cards.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct KpiSummary {
    /// Newest execution succeeded
    pub online: bool,
    pub total: usize,
    /// Percentage of executions with status `success`
    pub success_rate: f64,
    /// Mean `stoppedAt - startedAt` over executions where both parse
    pub avg_latency_ms: Option<f64>,
    pub last_error: Option<LastError>,
}

impl KpiSummary {
    pub fn from_payload(payload: &DashboardPayload) -> Self {
        let executions = &payload.executions;
        let total = executions.len();
        let successes = executions.iter().filter(|e| e.is_success()).count();
        let success_rate = if total > 0 {
            successes as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        let durations: Vec<f64> = executions
            .iter()
            .filter_map(Execution::duration)
            .map(|d| d.num_milliseconds() as f64)
            .collect();
        let avg_latency_ms =
            (!durations.is_empty()).then(|| durations.iter().sum::<f64>() / durations.len() as f64);

        let last_error = executions.iter().find(|e| !e.is_success()).map(|e| LastError {
            execution_id: e.id.clone(),
            workflow_name: payload.workflow_name(&e.workflow_id, &e.workflow_id).to_string(),
            started_at: e.started_at.clone(),
            link: (!payload.dev_profile.n8n_url.is_empty()).then(|| payload.execution_link(e)),
        });

        Self {
            online: executions.first().is_some_and(Execution::is_success),
            total,
            success_rate,
            avg_latency_ms,
            last_error,
        }
    }
}

/// `850ms`, `2.5s`, `1.2m`.
pub fn format_latency(ms: f64) -> String {
    if ms < 1000.0 {
        format!("{:.0}ms", ms)
    } else if ms < 60_000.0 {
        format!("{:.1}s", ms / 1000.0)
    } else {
        format!("{:.1}m", ms / 60_000.0)
    }
}

/// Row of KPI cards.
pub struct KpiPanel<'a> {
    summary: &'a KpiSummary,
    theme: &'a Theme,
}

impl<'a> KpiPanel<'a> {
    pub fn new(summary: &'a KpiSummary, theme: &'a Theme) -> Self {
        Self { summary, theme }
    }

    fn card(&self, label: &str, lines: Vec<Line<'static>>, accent: Color, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let mut content = vec![Line::from(Span::styled(
            label.to_string(),
            Style::default().fg(colors.text_dim),
        ))];
        content.extend(lines.into_iter().map(|l| l.patch_style(Style::default().fg(accent))));

        Paragraph::new(content)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(colors.border_dim)),
            )
            .render(area, buf);
    }
}

impl Widget for KpiPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let cards = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Ratio(1, 6),
                Constraint::Ratio(1, 6),
                Constraint::Ratio(1, 6),
                Constraint::Ratio(1, 6),
                Constraint::Ratio(2, 6),
            ])
            .split(area);

        let s = self.summary;
        let bold = Style::default().add_modifier(Modifier::BOLD);

        let (status, status_color) = if s.online {
            ("● Online", colors.status_healthy)
        } else {
            ("● Error", colors.status_error)
        };
        self.card("STATUS", vec![Line::styled(status, bold)], status_color, cards[0], buf);

        self.card(
            "EXECUTIONS",
            vec![Line::styled(s.total.to_string(), bold)],
            colors.text,
            cards[1],
            buf,
        );

        self.card(
            "SUCCESS RATE",
            vec![Line::styled(format!("{:.1}%", s.success_rate), bold)],
            colors.status_healthy,
            cards[2],
            buf,
        );

        let latency = s.avg_latency_ms.map_or_else(|| "--".to_string(), format_latency);
        self.card("LATENCY", vec![Line::styled(latency, bold)], colors.text, cards[3], buf);

        match &s.last_error {
            Some(err) => {
                let when = err
                    .started_at
                    .as_deref()
                    .map(|raw| format_local(raw, "%d/%m %H:%M:%S"))
                    .unwrap_or_default();
                let mut detail = vec![
                    Span::raw(format!("#{} ", err.execution_id)),
                    Span::styled(when, Style::default().fg(colors.text_dim)),
                ];
                if err.link.is_some() {
                    detail.push(Span::styled("  [L] open", Style::default().fg(colors.hotkey)));
                }
                self.card(
                    "LAST ERROR",
                    vec![Line::styled(err.workflow_name.clone(), bold), Line::from(detail)],
                    colors.status_error,
                    cards[4],
                    buf,
                );
            }
            None => self.card(
                "LAST ERROR",
                vec![Line::raw("None")],
                colors.text_dim,
                cards[4],
                buf,
            ),
        }
    }
}

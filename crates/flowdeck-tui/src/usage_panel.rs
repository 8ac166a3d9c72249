//! Token usage panel.
//!
//! Four KPI cards over the selected date range, one row per project, and the
//! exchange rate footer. The range is moved with `[` `]` (start) and `{` `}`
//! (end).

use flowdeck_cost::format::render_bar;
use flowdeck_cost::{DateRange, UsagePayload, UsageSummary, format_brl, format_rate, format_tokens, format_usd};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Row, Table, Widget},
};

use crate::data::FeedState;
use crate::theme::Theme;
use crate::widget::{HotkeyHints, panel_block, truncate_text};

const TITLE: &str = "OpenAI Usage";

/// Usage roll-up for the selected range.
pub struct UsagePanel<'a> {
    feed: &'a FeedState<UsagePayload>,
    summary: &'a UsageSummary,
    range: &'a DateRange,
    usd_to_brl: f64,
    theme: &'a Theme,
}

impl<'a> UsagePanel<'a> {
    pub fn new(
        feed: &'a FeedState<UsagePayload>,
        summary: &'a UsageSummary,
        range: &'a DateRange,
        usd_to_brl: f64,
        theme: &'a Theme,
    ) -> Self {
        Self {
            feed,
            summary,
            range,
            usd_to_brl,
            theme,
        }
    }

    fn card(&self, label: &str, value: String, detail: String, accent: Color, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        Paragraph::new(vec![
            Line::styled(label.to_string(), Style::default().fg(colors.text_dim)),
            Line::styled(value, Style::default().fg(accent).add_modifier(Modifier::BOLD)),
            Line::styled(detail, Style::default().fg(colors.text_dim)),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(colors.border_dim)),
        )
        .render(area, buf);
    }

    fn render_cards(&self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let totals = &self.summary.totals;
        let cards = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 4); 4])
            .split(area);

        self.card(
            "TOTAL TOKENS",
            format_tokens(totals.tokens),
            format!("{} days", totals.days),
            colors.text,
            cards[0],
            buf,
        );
        self.card(
            "TOTAL COST",
            format_usd(totals.cost_usd),
            format_brl(totals.cost_usd, self.usd_to_brl),
            colors.money,
            cards[1],
            buf,
        );
        self.card("INPUT", format_tokens(totals.input), String::new(), colors.text, cards[2], buf);
        self.card("OUTPUT", format_tokens(totals.output), String::new(), colors.text, cards[3], buf);
    }

    fn render_projects(&self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        if self.summary.is_empty() {
            Paragraph::new("No data for the period")
                .style(Style::default().fg(colors.text_dim))
                .render(area, buf);
            return;
        }

        let max_cost = self
            .summary
            .projects
            .iter()
            .map(|p| p.cost_usd)
            .fold(0.0_f64, f64::max);

        let rows: Vec<Row> = self
            .summary
            .projects
            .iter()
            .map(|p| {
                Row::new(vec![
                    Line::from(vec![
                        Span::styled("● ", Style::default().fg(colors.status_healthy)),
                        Span::raw(truncate_text(&p.name, 24)),
                        Span::styled(
                            format!(" ({}d)", p.day_count()),
                            Style::default().fg(colors.text_dim),
                        ),
                    ]),
                    Line::from(format_tokens(p.tokens)),
                    Line::from(format_tokens(p.input)),
                    Line::from(format_tokens(p.output)),
                    Line::styled(format_usd(p.cost_usd), Style::default().fg(colors.money)),
                    Line::styled(
                        format_brl(p.cost_usd, self.usd_to_brl),
                        Style::default().fg(colors.text_dim),
                    ),
                    Line::styled(
                        render_bar(p.cost_usd, max_cost, 10, '▓', '░'),
                        Style::default().fg(colors.money),
                    ),
                ])
                .style(Style::default().fg(colors.text))
            })
            .collect();

        let header = Row::new(vec!["PROJECT", "TOKENS", "INPUT", "OUTPUT", "COST", "BRL", ""]).style(
            Style::default()
                .fg(colors.text_dim)
                .add_modifier(Modifier::BOLD),
        );
        let widths = [
            Constraint::Min(22),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(10),
            Constraint::Length(11),
            Constraint::Length(10),
        ];
        Widget::render(
            Table::new(rows, widths).header(header).column_spacing(1),
            area,
            buf,
        );
    }
}

impl Widget for UsagePanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let block = panel_block(TITLE, self.theme, true);
        let inner = block.inner(area);
        block.render(area, buf);

        if self.feed.is_loading() {
            Paragraph::new("Loading usage data...")
                .style(Style::default().fg(colors.status_warning))
                .render(inner, buf);
            return;
        }

        if let Some(error) = &self.feed.error {
            Paragraph::new(vec![
                Line::styled(
                    "Failed to load usage data",
                    Style::default().fg(colors.status_error).add_modifier(Modifier::BOLD),
                ),
                Line::styled(error.clone(), Style::default().fg(colors.text_dim)),
                Line::raw(""),
                HotkeyHints::new().hint("r", "Retry").as_line(self.theme),
            ])
            .render(inner, buf);
            return;
        }

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(5),
                Constraint::Min(3),
                Constraint::Length(1),
            ])
            .split(inner);

        Paragraph::new(Line::from(vec![
            Span::styled("Period: ", Style::default().fg(colors.text_dim)),
            Span::styled(
                format!(
                    "{} to {} ({} days)",
                    self.range.start().format("%d/%m/%Y"),
                    self.range.end().format("%d/%m/%Y"),
                    self.range.len_days()
                ),
                Style::default().fg(colors.text),
            ),
        ]))
        .render(chunks[0], buf);

        self.render_cards(chunks[1], buf);
        self.render_projects(chunks[2], buf);

        let hotkey = Style::default().fg(colors.hotkey);
        let dim = Style::default().fg(colors.text_dim);
        let mut footer = Line::from(vec![
            Span::styled("[ ]", hotkey),
            Span::styled(" start ", dim),
            Span::styled("{ }", hotkey),
            Span::styled(" end", dim),
        ]);
        footer.spans.push(Span::styled(
            format!("  Rate: {}", format_rate(self.usd_to_brl)),
            Style::default().fg(colors.text_dim),
        ));
        if let Some(payload) = &self.feed.data {
            footer.spans.push(Span::styled(
                format!(
                    "  Feed: {} days, {} reported",
                    payload.days_processed,
                    format_usd(payload.reported_total_cost_usd)
                ),
                Style::default().fg(colors.text_dim),
            ));
        }
        Paragraph::new(footer).render(chunks[3], buf);
    }
}

//! Messaging instance monitor and diagnostic overlay.

use flowdeck_core::types::{DashboardPayload, Instance, format_local};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph, Widget, Wrap},
};

use crate::theme::Theme;
use crate::widget::{panel_block, truncate_text, visible_window};

const NOT_AVAILABLE: &str = "N/A";

fn yes_no(value: bool) -> &'static str {
    if value { "Yes" } else { "No" }
}

fn format_date(raw: Option<&str>) -> String {
    match raw {
        Some(raw) if !raw.is_empty() => format_local(raw, "%d/%m/%Y %H:%M:%S"),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// `connected/total connected`
pub fn connection_summary(payload: &DashboardPayload) -> String {
    format!(
        "{}/{} connected",
        payload.connected_instances(),
        payload.total_instances
    )
}

/// One line per instance with its connection state.
pub struct InstancePanel<'a> {
    payload: &'a DashboardPayload,
    theme: &'a Theme,
    selected: Option<usize>,
    focused: bool,
}

impl<'a> InstancePanel<'a> {
    pub fn new(payload: &'a DashboardPayload, theme: &'a Theme) -> Self {
        Self {
            payload,
            theme,
            selected: None,
            focused: false,
        }
    }

    pub fn selected(mut self, selected: Option<usize>) -> Self {
        self.selected = selected;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }
}

impl Widget for InstancePanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let title = format!("Instances  {}", connection_summary(self.payload));
        let block = panel_block(title, self.theme, self.focused);
        let inner = block.inner(area);
        block.render(area, buf);

        let instances = &self.payload.instances;
        if instances.is_empty() {
            Paragraph::new("No instances")
                .style(Style::default().fg(colors.text_dim))
                .render(inner, buf);
            return;
        }

        let (start, end) =
            visible_window(instances.len(), self.selected.unwrap_or(0), inner.height as usize);
        let lines: Vec<Line> = instances[start..end]
            .iter()
            .enumerate()
            .map(|(offset, instance)| {
                let (status, color) = if instance.is_connected() {
                    ("● Online ", colors.status_healthy)
                } else {
                    ("● Offline", colors.status_error)
                };
                let subtitle = instance
                    .profile_name
                    .as_deref()
                    .filter(|s| !s.is_empty())
                    .or(instance.number.as_deref())
                    .unwrap_or_default();

                let mut spans = vec![
                    Span::styled(status, Style::default().fg(color)),
                    Span::raw(" "),
                    Span::styled(
                        format!("{:<20}", truncate_text(&instance.name, 20)),
                        Style::default().fg(colors.text),
                    ),
                    Span::styled(
                        truncate_text(subtitle, 24),
                        Style::default().fg(colors.text_dim),
                    ),
                ];
                if let (false, Some(code)) = (instance.is_connected(), instance.disconnection_reason_code) {
                    spans.push(Span::styled(
                        format!("  code {}", code),
                        Style::default().fg(colors.status_error),
                    ));
                }

                let mut line = Line::from(spans);
                if self.selected == Some(start + offset) {
                    line = line.patch_style(Style::default().add_modifier(Modifier::REVERSED));
                }
                line
            })
            .collect();

        Paragraph::new(lines).render(inner, buf);
    }
}

/// Diagnostic overlay for one instance.
pub struct InstanceDetail<'a> {
    instance: &'a Instance,
    theme: &'a Theme,
}

impl<'a> InstanceDetail<'a> {
    pub fn new(instance: &'a Instance, theme: &'a Theme) -> Self {
        Self { instance, theme }
    }

    /// Text lines of the overlay.
    pub fn lines(&self) -> Vec<Line<'static>> {
        let colors = &self.theme.colors;
        let i = self.instance;
        let section = |title: &str| {
            Line::styled(
                title.to_string(),
                Style::default()
                    .fg(colors.text_dim)
                    .add_modifier(Modifier::BOLD),
            )
        };
        let field = |label: &str, value: String| {
            Line::from(vec![
                Span::styled(format!("  {:<16}", label), Style::default().fg(colors.text_dim)),
                Span::styled(value, Style::default().fg(colors.text)),
            ])
        };

        let mut lines = vec![section("CONNECTION STATUS")];
        if i.is_connected() {
            lines.push(Line::styled(
                "  ● Connected",
                Style::default().fg(colors.status_healthy).add_modifier(Modifier::BOLD),
            ));
        } else {
            lines.push(Line::styled(
                "  ● Disconnected",
                Style::default().fg(colors.status_error).add_modifier(Modifier::BOLD),
            ));
        }
        if let Some(code) = i.disconnection_reason_code {
            lines.push(Line::styled(
                format!("  Error code: {}", code),
                Style::default().fg(colors.status_error),
            ));
            if let Some(message) = i.diagnostic_message() {
                lines.push(Line::styled(
                    format!("  {}", message),
                    Style::default().fg(colors.text_dim),
                ));
            }
        }
        if i.disconnection_at.is_some() {
            lines.push(field("Disconnected:", format_date(i.disconnection_at.as_deref())));
        }

        lines.push(Line::raw(""));
        lines.push(section("BASIC INFO"));
        lines.push(field("Name:", i.name.clone()));
        lines.push(field(
            "Profile:",
            i.profile_name
                .clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        ));
        lines.push(field(
            "Number:",
            i.number.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        ));
        if let Some(owner) = &i.owner_jid {
            lines.push(field("Owner JID:", owner.clone()));
        }
        lines.push(field("Created:", format_date(i.created_at.as_deref())));
        lines.push(field("Updated:", format_date(i.updated_at.as_deref())));

        if let Some(counts) = i.counts {
            lines.push(Line::raw(""));
            lines.push(section("STATISTICS"));
            lines.push(field("Messages:", counts.messages.to_string()));
            lines.push(field("Contacts:", counts.contacts.to_string()));
            lines.push(field("Chats:", counts.chats.to_string()));
        }

        if let Some(settings) = i.settings {
            lines.push(Line::raw(""));
            lines.push(section("SETTINGS"));
            lines.push(field("Ignore groups:", yes_no(settings.groups_ignore).into()));
            lines.push(field("Always online:", yes_no(settings.always_online).into()));
            lines.push(field("Read messages:", yes_no(settings.read_messages).into()));
            lines.push(field("Read status:", yes_no(settings.read_status).into()));
        }

        if let Some(rabbitmq) = &i.rabbitmq {
            lines.push(Line::raw(""));
            lines.push(section("RABBITMQ"));
            lines.push(field("Enabled:", yes_no(rabbitmq.enabled).into()));
            lines.push(field("Events:", rabbitmq.events.join(", ")));
        }

        lines.push(Line::raw(""));
        lines.push(section("CHATWOOT"));
        let chatwoot = if i.has_chatwoot.unwrap_or(false) {
            "Integrated"
        } else {
            "Not integrated"
        };
        lines.push(Line::styled(format!("  {}", chatwoot), Style::default().fg(colors.text)));

        if let Some(raw) = &i.disconnection_object {
            lines.push(Line::raw(""));
            lines.push(section("DISCONNECTION OBJECT (RAW)"));
            let pretty = serde_json::to_string_pretty(raw).unwrap_or_else(|_| raw.to_string());
            lines.extend(
                pretty
                    .lines()
                    .map(|l| Line::styled(format!("  {}", l), Style::default().fg(colors.text_dim))),
            );
        }

        lines
    }
}

impl Widget for InstanceDetail<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let lines = self.lines();
        let block = panel_block(format!("Diagnostics: {}", self.instance.name), self.theme, true)
            .style(Style::default().bg(self.theme.colors.overlay_bg));
        Clear.render(area, buf);
        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowdeck_core::types::{InstanceCounts, InstanceSettings};
    use serde_json::json;

    fn text(lines: &[Line]) -> String {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_connection_summary() {
        let payload = DashboardPayload {
            instances: vec![
                Instance {
                    connection_status: "open".into(),
                    ..Default::default()
                },
                Instance {
                    connection_status: "close".into(),
                    ..Default::default()
                },
            ],
            total_instances: 3,
            ..Default::default()
        };
        assert_eq!(connection_summary(&payload), "1/3 connected");
    }

    #[test]
    fn test_detail_shows_diagnostics() {
        let instance = Instance {
            name: "suporte".into(),
            connection_status: "close".into(),
            disconnection_reason_code: Some(401),
            disconnection_object: Some(json!({"error": {"output": {"payload": {"message": "Connection Failure"}}}})),
            counts: Some(InstanceCounts {
                messages: 1200,
                contacts: 80,
                chats: 45,
            }),
            settings: Some(InstanceSettings {
                always_online: true,
                ..Default::default()
            }),
            ..Default::default()
        };
        let theme = Theme::default();
        let rendered = text(&InstanceDetail::new(&instance, &theme).lines());

        assert!(rendered.contains("Disconnected"));
        assert!(rendered.contains("Error code: 401"));
        assert!(rendered.contains("Connection Failure"));
        assert!(rendered.contains("1200"));
        assert!(rendered.contains("Always online:  Yes"));
        assert!(rendered.contains("Not integrated"));
        assert!(rendered.contains("DISCONNECTION OBJECT (RAW)"));
    }

    #[test]
    fn test_missing_fields_render_na() {
        let instance = Instance {
            name: "vendas".into(),
            connection_status: "open".into(),
            ..Default::default()
        };
        let theme = Theme::default();
        let rendered = text(&InstanceDetail::new(&instance, &theme).lines());

        assert!(rendered.contains("● Connected"));
        assert!(rendered.contains("Profile:        N/A"));
        assert!(rendered.contains("Created:        N/A"));
        assert!(!rendered.contains("STATISTICS"));
        assert!(!rendered.contains("RABBITMQ"));
    }
}

//! Header bar: company, developer contacts and refresh status.

use chrono::{DateTime, Local};
use flowdeck_core::types::DevProfile;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::theme::Theme;
use crate::view::View;

/// Header shown above every view.
pub struct HeaderBar<'a> {
    profile: Option<&'a DevProfile>,
    view: View,
    theme: &'a Theme,
    last_updated: Option<DateTime<Local>>,
    fetching: bool,
}

impl<'a> HeaderBar<'a> {
    pub fn new(profile: Option<&'a DevProfile>, view: View, theme: &'a Theme) -> Self {
        Self {
            profile,
            view,
            theme,
            last_updated: None,
            fetching: false,
        }
    }

    pub fn last_updated(mut self, at: Option<DateTime<Local>>) -> Self {
        self.last_updated = at;
        self
    }

    pub fn fetching(mut self, fetching: bool) -> Self {
        self.fetching = fetching;
        self
    }

    fn title_line(&self) -> Line<'static> {
        let colors = &self.theme.colors;
        let company = self
            .profile
            .map(|p| p.company.as_str())
            .filter(|c| !c.is_empty())
            .unwrap_or("flowdeck");

        Line::from(vec![
            Span::styled(
                format!(" {} ", company),
                Style::default().fg(colors.header).add_modifier(Modifier::BOLD),
            ),
            Span::styled("ANALYTICS", Style::default().fg(colors.text_dim)),
            Span::styled(
                format!("  · {}", self.view.title()),
                Style::default().fg(colors.text),
            ),
        ])
    }

    fn status_line(&self) -> Line<'static> {
        let colors = &self.theme.colors;
        let mut spans = Vec::new();
        if self.fetching {
            spans.push(Span::styled("⟳ updating  ", Style::default().fg(colors.status_warning)));
        }
        if let Some(at) = self.last_updated {
            spans.push(Span::styled(
                format!("updated {}  ", at.format("%H:%M:%S")),
                Style::default().fg(colors.text_dim),
            ));
        }
        spans.push(Span::styled(
            format!("[{}] ", self.theme.mode),
            Style::default().fg(colors.hotkey),
        ));
        Line::from(spans)
    }

    fn contact_line(&self) -> Line<'static> {
        let colors = &self.theme.colors;
        let Some(profile) = self.profile else {
            return Line::raw("");
        };
        let dim = Style::default().fg(colors.text_dim);

        let mut spans = Vec::new();
        let mut push = |label: &str, value: String| {
            if !value.is_empty() {
                spans.push(Span::styled(format!(" {} ", label), dim));
                spans.push(Span::styled(format!("{} ", value), Style::default().fg(colors.text)));
            }
        };
        push("dev", profile.name.clone());
        push("whatsapp", profile.whatsapp.clone());
        if !profile.instagram.is_empty() {
            push("instagram", format!("@{}", profile.instagram));
        }
        push("site", profile.site.clone());
        push("n8n", profile.n8n_url.clone());
        Line::from(spans)
    }
}

impl Widget for HeaderBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.colors.border_dim));
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.height == 0 {
            return;
        }
        let top = Rect::new(inner.x, inner.y, inner.width, 1);
        Paragraph::new(self.title_line()).render(top, buf);
        Paragraph::new(self.status_line())
            .alignment(Alignment::Right)
            .render(top, buf);

        if inner.height > 1 {
            let bottom = Rect::new(inner.x, inner.y + 1, inner.width, 1);
            Paragraph::new(self.contact_line()).render(bottom, buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_contact_line_skips_empty_fields() {
        let profile = DevProfile {
            name: "Ana".into(),
            instagram: "acme".into(),
            ..Default::default()
        };
        let theme = Theme::default();
        let header = HeaderBar::new(Some(&profile), View::Overview, &theme);
        let text = line_text(&header.contact_line());

        assert!(text.contains("dev Ana"));
        assert!(text.contains("@acme"));
        assert!(!text.contains("whatsapp"));
        assert!(!text.contains("site"));
    }

    #[test]
    fn test_title_falls_back_without_profile() {
        let theme = Theme::default();
        let header = HeaderBar::new(None, View::Usage, &theme);
        let text = line_text(&header.title_line());
        assert!(text.contains("flowdeck"));
        assert!(text.contains("ANALYTICS"));
        assert!(text.contains("Token Usage"));
    }

    #[test]
    fn test_status_line_shows_fetching_and_theme() {
        let theme = Theme::light_theme();
        let header = HeaderBar::new(None, View::Overview, &theme).fetching(true);
        let text = line_text(&header.status_line());
        assert!(text.contains("updating"));
        assert!(text.contains("[light]"));
    }
}

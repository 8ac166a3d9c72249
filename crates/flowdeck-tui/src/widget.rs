//! Small building blocks shared by the panels.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders},
};

use crate::theme::Theme;

/// Bordered block with a bold title, highlighted when `focused`.
pub fn panel_block<'a>(title: impl Into<String>, theme: &Theme, focused: bool) -> Block<'a> {
    let colors = &theme.colors;
    let border = if focused { colors.header } else { colors.border_dim };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(Span::styled(
            format!(" {} ", title.into()),
            Style::default().fg(colors.header).add_modifier(Modifier::BOLD),
        ))
}

/// Hotkey hints for footers and panel captions.
#[derive(Debug, Default)]
pub struct HotkeyHints {
    hints: Vec<(String, String)>,
}

impl HotkeyHints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a hint.
    pub fn hint(mut self, key: impl Into<String>, description: impl Into<String>) -> Self {
        self.hints.push((key.into(), description.into()));
        self
    }

    /// Render as a line of spans.
    pub fn as_line(&self, theme: &Theme) -> Line<'static> {
        let mut spans = Vec::new();
        for (key, desc) in &self.hints {
            spans.push(Span::styled(
                format!("[{}]", key),
                Style::default().fg(theme.colors.hotkey),
            ));
            spans.push(Span::styled(
                format!("{} ", desc),
                Style::default().fg(theme.colors.text_dim),
            ));
        }
        Line::from(spans)
    }
}

/// Truncate to `max` characters, marking the cut with an ellipsis.
pub fn truncate_text(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    if max <= 1 {
        return s.chars().take(max).collect();
    }
    let mut out: String = s.chars().take(max - 1).collect();
    out.push('…');
    out
}

/// Index range of `len` rows to draw in `height` lines keeping `selected` visible.
pub fn visible_window(len: usize, selected: usize, height: usize) -> (usize, usize) {
    if height == 0 || len == 0 {
        return (0, 0);
    }
    let selected = selected.min(len - 1);
    let start = (selected + 1).saturating_sub(height);
    (start, (start + height).min(len))
}

/// Rect of at most `width` x `height` centered in `area`.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("Atendimento", 6), "Atend…");
        assert_eq!(truncate_text("ação-longa", 4), "açã…");
    }

    #[test]
    fn test_visible_window() {
        assert_eq!(visible_window(100, 0, 10), (0, 10));
        assert_eq!(visible_window(100, 15, 10), (6, 16));
        assert_eq!(visible_window(5, 3, 10), (0, 5));
        assert_eq!(visible_window(5, 99, 2), (3, 5));
        assert_eq!(visible_window(0, 0, 10), (0, 0));
    }

    #[test]
    fn test_centered_rect_fits() {
        let area = Rect::new(0, 0, 100, 30);
        let rect = centered_rect(60, 20, area);
        assert_eq!(rect, Rect::new(20, 5, 60, 20));

        let small = centered_rect(60, 20, Rect::new(0, 0, 40, 10));
        assert!(small.width <= 40 && small.height <= 10);
    }

    #[test]
    fn test_hotkey_hints_line() {
        let line = HotkeyHints::new().hint("r", "Refresh").hint("q", "Quit").as_line(&Theme::default());
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "[r]Refresh [q]Quit ");
    }
}

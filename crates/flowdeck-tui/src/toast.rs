//! Transient toast messages.
//!
//! Toasts stack in the bottom-right corner and expire after
//! [`TOAST_DURATION`]. A toast may carry a link, which the `v` key opens.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};

use crate::theme::Theme;

/// How long a toast stays on screen.
pub const TOAST_DURATION: Duration = Duration::from_secs(4);

/// Most toasts shown at once; older ones are dropped.
const MAX_TOASTS: usize = 3;

/// Toast severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Error,
}

/// One toast message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    pub link: Option<String>,
    shown_at: Instant,
}

impl Toast {
    pub fn new(kind: ToastKind, message: impl Into<String>, now: Instant) -> Self {
        Self {
            message: message.into(),
            kind,
            link: None,
            shown_at: now,
        }
    }

    pub fn with_link(mut self, link: Option<String>) -> Self {
        self.link = link;
        self
    }

    fn expired(&self, now: Instant, duration: Duration) -> bool {
        now.saturating_duration_since(self.shown_at) >= duration
    }
}

/// Toasts currently on screen, oldest first.
#[derive(Debug)]
pub struct ToastStack {
    toasts: VecDeque<Toast>,
    duration: Duration,
}

impl Default for ToastStack {
    fn default() -> Self {
        Self::new(TOAST_DURATION)
    }
}

impl ToastStack {
    pub fn new(duration: Duration) -> Self {
        Self {
            toasts: VecDeque::new(),
            duration,
        }
    }

    pub fn push(&mut self, toast: Toast) {
        if self.toasts.len() == MAX_TOASTS {
            self.toasts.pop_front();
        }
        self.toasts.push_back(toast);
    }

    /// Drop expired toasts; returns true if anything was removed.
    pub fn expire(&mut self, now: Instant) -> bool {
        let before = self.toasts.len();
        let duration = self.duration;
        self.toasts.retain(|t| !t.expired(now, duration));
        self.toasts.len() != before
    }

    /// Link of the newest toast that carries one.
    pub fn latest_link(&self) -> Option<&str> {
        self.toasts.iter().rev().find_map(|t| t.link.as_deref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter()
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}

/// Renders the toast stack.
pub struct ToastOverlay<'a> {
    stack: &'a ToastStack,
    theme: &'a Theme,
}

impl<'a> ToastOverlay<'a> {
    pub fn new(stack: &'a ToastStack, theme: &'a Theme) -> Self {
        Self { stack, theme }
    }

    /// Area in the bottom-right corner of `area` sized for the stack.
    pub fn area(&self, area: Rect) -> Rect {
        let width = 48.min(area.width);
        let height = (self.stack.len() as u16 * 3).min(area.height);
        Rect::new(
            area.x + area.width - width,
            area.y + area.height - height,
            width,
            height,
        )
    }
}

impl Widget for ToastOverlay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        for (idx, toast) in self.stack.iter().enumerate() {
            let y = area.y + idx as u16 * 3;
            if y + 3 > area.y + area.height {
                break;
            }
            let slot = Rect::new(area.x, y, area.width, 3);

            let (icon, color) = match toast.kind {
                ToastKind::Info => ("i", colors.header),
                ToastKind::Success => ("✓", colors.status_healthy),
                ToastKind::Error => ("✗", colors.status_error),
            };

            let mut spans = vec![
                Span::styled(format!("{} ", icon), Style::default().fg(color)),
                Span::styled(toast.message.clone(), Style::default().fg(colors.text)),
            ];
            if toast.link.is_some() {
                spans.push(Span::raw("  "));
                spans.push(Span::styled(
                    "[v] View",
                    Style::default().fg(colors.hotkey).add_modifier(Modifier::BOLD),
                ));
            }

            Clear.render(slot, buf);
            Paragraph::new(Line::from(spans))
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(color))
                        .style(Style::default().bg(colors.overlay_bg)),
                )
                .render(slot, buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toasts_expire() {
        let start = Instant::now();
        let mut stack = ToastStack::default();
        stack.push(Toast::new(ToastKind::Info, "Reloading data...", start));

        assert!(!stack.expire(start + Duration::from_secs(3)));
        assert!(stack.expire(start + TOAST_DURATION));
        assert!(stack.is_empty());
    }

    #[test]
    fn test_stack_is_bounded() {
        let now = Instant::now();
        let mut stack = ToastStack::default();
        for i in 0..5 {
            stack.push(Toast::new(ToastKind::Info, format!("toast {i}"), now));
        }
        assert_eq!(stack.len(), MAX_TOASTS);
        assert_eq!(stack.iter().next().unwrap().message, "toast 2");
    }

    #[test]
    fn test_latest_link() {
        let now = Instant::now();
        let mut stack = ToastStack::default();
        stack.push(
            Toast::new(ToastKind::Error, "Error in: A", now).with_link(Some("https://a".into())),
        );
        stack.push(Toast::new(ToastKind::Info, "Data updated", now));
        assert_eq!(stack.latest_link(), Some("https://a"));
    }
}

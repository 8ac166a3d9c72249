//! View types and navigation for the flowdeck TUI.

use std::fmt;

/// Screens of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    /// KPI cards, last error, instance summary and recent executions
    #[default]
    Overview,
    /// Full execution log
    Executions,
    /// Failed executions with workflow filter and paging
    Errors,
    /// Workflow list
    Workflows,
    /// Token and cost usage by project
    Usage,
    /// Messaging instance monitor
    Instances,
}

impl View {
    /// All views in display order (for Tab cycling).
    pub const ALL: [View; 6] = [
        View::Overview,
        View::Executions,
        View::Errors,
        View::Workflows,
        View::Usage,
        View::Instances,
    ];

    /// Returns the hotkey character for this view.
    pub fn hotkey(&self) -> char {
        match self {
            View::Overview => 'o',
            View::Executions => 'e',
            View::Errors => 'l',
            View::Workflows => 'w',
            View::Usage => 'u',
            View::Instances => 'n',
        }
    }

    /// Returns the display title for this view.
    pub fn title(&self) -> &'static str {
        match self {
            View::Overview => "Overview",
            View::Executions => "Executions",
            View::Errors => "Error Log",
            View::Workflows => "Workflows",
            View::Usage => "Token Usage",
            View::Instances => "Instances",
        }
    }

    /// Returns the next view in the cycle (for Tab navigation).
    pub fn next(&self) -> View {
        let idx = Self::ALL.iter().position(|v| v == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Returns the previous view in the cycle (for Shift+Tab navigation).
    pub fn prev(&self) -> View {
        let idx = Self::ALL.iter().position(|v| v == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// Try to parse a view from a hotkey character.
    pub fn from_hotkey(key: char) -> Option<View> {
        Self::ALL.into_iter().find(|v| v.hotkey() == key)
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

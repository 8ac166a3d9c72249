//! Event handling for the flowdeck TUI.
//!
//! Maps key events to application events.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::view::View;

/// Days a range bound moves per key press.
pub const RANGE_STEP_DAYS: i64 = 1;

/// Application-level events that can trigger state changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// Switch to a specific view
    SwitchView(View),
    /// Cycle to the next view
    NextView,
    /// Cycle to the previous view
    PrevView,
    /// Show help overlay
    ShowHelp,
    /// Request application quit
    Quit,
    /// Force quit (Ctrl+C)
    ForceQuit,
    /// Fetch both feeds now
    Refresh,
    /// Close the topmost overlay
    Cancel,
    /// Navigate up in a list
    NavigateUp,
    /// Navigate down in a list
    NavigateDown,
    /// Open the selected item
    Select,
    /// Switch between dark and light
    ToggleTheme,
    /// Open the link of the newest toast
    OpenToastLink,
    /// Open the most recent failed execution
    OpenLastError,
    /// Cycle the error log workflow filter
    CycleWorkflowFilter,
    /// Show another page of the error log
    ShowMore,
    /// Move the usage range start by N days
    ShiftRangeStart(i64),
    /// Move the usage range end by N days
    ShiftRangeEnd(i64),
    /// Accept the install hint
    AcceptInstall,
    /// Dismiss the install hint for good
    DismissInstall,
    /// No action needed
    None,
}

/// Input handler for converting key events to app events.
#[derive(Debug, Default)]
pub struct InputHandler;

impl InputHandler {
    pub fn new() -> Self {
        Self
    }

    /// Handle a key event and return the corresponding app event.
    pub fn handle_key(&self, key: KeyEvent) -> AppEvent {
        // Windows reports releases too
        if key.kind == KeyEventKind::Release {
            return AppEvent::None;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c') => AppEvent::ForceQuit,
                KeyCode::Char('l') => AppEvent::Refresh,
                _ => AppEvent::None,
            };
        }

        match key.code {
            KeyCode::Esc => AppEvent::Cancel,
            KeyCode::Char('q') => AppEvent::Quit,
            KeyCode::Char('?') => AppEvent::ShowHelp,

            KeyCode::Tab => AppEvent::NextView,
            KeyCode::BackTab => AppEvent::PrevView,

            KeyCode::Char('r') | KeyCode::Char('R') => AppEvent::Refresh,
            KeyCode::Char('T') => AppEvent::ToggleTheme,
            KeyCode::Char('v') => AppEvent::OpenToastLink,
            KeyCode::Char('L') => AppEvent::OpenLastError,
            KeyCode::Char('f') => AppEvent::CycleWorkflowFilter,
            KeyCode::Char('m') => AppEvent::ShowMore,
            KeyCode::Char('i') => AppEvent::AcceptInstall,
            KeyCode::Char('x') => AppEvent::DismissInstall,

            KeyCode::Char('[') => AppEvent::ShiftRangeStart(-RANGE_STEP_DAYS),
            KeyCode::Char(']') => AppEvent::ShiftRangeStart(RANGE_STEP_DAYS),
            KeyCode::Char('{') => AppEvent::ShiftRangeEnd(-RANGE_STEP_DAYS),
            KeyCode::Char('}') => AppEvent::ShiftRangeEnd(RANGE_STEP_DAYS),

            KeyCode::Up | KeyCode::Char('k') => AppEvent::NavigateUp,
            KeyCode::Down | KeyCode::Char('j') => AppEvent::NavigateDown,
            KeyCode::Enter => AppEvent::Select,

            KeyCode::Char(c) => View::from_hotkey(c).map_or(AppEvent::None, AppEvent::SwitchView),
            _ => AppEvent::None,
        }
    }
}

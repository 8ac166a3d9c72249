//! Main application state and logic for the flowdeck TUI.
//!
//! The `App` struct owns every piece of UI state: current view, feed data,
//! error notifier, toasts, theme and install hint. It drains feed events,
//! reacts to keys and draws the frame.

use std::io;
use std::time::{Duration, Instant};

use chrono::Utc;
use crossterm::event::{self, Event, KeyEvent};
use flowdeck_core::types::DashboardPayload;
use flowdeck_core::{ClientStateStore, DashboardConfig};
use flowdeck_cost::{DateRange, UsageSummary, aggregate};
use flowdeck_feed::FetchTrigger;
use ratatui::{
    Frame, Terminal,
    backend::{Backend, CrosstermBackend},
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use tracing::{info, warn};

use crate::alert::{ErrorNotification, ErrorNotifier};
use crate::browser;
use crate::data::{DataChange, DataManager};
use crate::event::{AppEvent, InputHandler};
use crate::execution_panel::{ErrorLogPanel, ErrorLogState, ExecutionTable};
use crate::header::HeaderBar;
use crate::install_prompt::InstallPrompt;
use crate::instance_panel::{InstanceDetail, InstancePanel};
use crate::kpi_panel::{KpiPanel, KpiSummary};
use crate::sound::{SoundCue, TerminalBell, play_notification_sound};
use crate::theme::ThemeManager;
use crate::toast::{Toast, ToastKind, ToastOverlay, ToastStack};
use crate::usage_panel::UsagePanel;
use crate::view::View;
use crate::widget::{HotkeyHints, centered_rect};
use crate::workflow_panel::WorkflowPanel;

/// Result type for app operations.
pub type AppResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Opens a URL outside the terminal.
pub type LinkOpener = Box<dyn FnMut(&str) -> anyhow::Result<()>>;

/// Target frame rate (30 FPS is plenty for a polling dashboard).
const TARGET_FPS: u64 = 30;
const FRAME_DURATION: Duration = Duration::from_millis(1000 / TARGET_FPS);

/// Rows of recent executions on the overview.
const OVERVIEW_EXECUTIONS: usize = 10;

/// Main application state.
pub struct App {
    current_view: View,
    input_handler: InputHandler,
    should_quit: bool,
    show_help: bool,
    /// Highlighted row in the current view's list
    selection: usize,
    /// Instance shown in the diagnostic overlay
    instance_detail: Option<usize>,
    data: DataManager,
    theme_manager: ThemeManager,
    notifier: ErrorNotifier,
    sound: Box<dyn SoundCue>,
    sound_volume: Option<f64>,
    toasts: ToastStack,
    install_prompt: InstallPrompt,
    link_opener: LinkOpener,
    usd_to_brl: f64,
    usage_range: DateRange,
    usage_summary: UsageSummary,
    error_log: ErrorLogState,
    /// A manual refresh is waiting for the dashboard feed
    refresh_pending: bool,
    /// Dirty flag - whether UI needs redraw
    dirty: bool,
}

impl App {
    /// Create the app, start polling and load persisted client state.
    pub fn new(config: &DashboardConfig) -> AppResult<Self> {
        let data = DataManager::new(config)?;
        let store = match ClientStateStore::default_location() {
            Ok(store) => Some(store),
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => {
                warn!(error = %e, "client state unavailable, preferences will not persist");
                None
            }
        };
        Ok(Self::with_parts(data, config, store))
    }

    /// Assemble the app from an existing data source.
    pub fn with_parts(data: DataManager, config: &DashboardConfig, store: Option<ClientStateStore>) -> Self {
        let now = Instant::now();
        let delay = config.install_prompt_delay();
        let (theme_manager, install_prompt) = match store {
            Some(store) => (
                ThemeManager::load(store.clone(), config.default_theme_mode()),
                InstallPrompt::load(store, delay, now),
            ),
            None => (
                ThemeManager::new(config.default_theme_mode()),
                InstallPrompt::new(false, delay, now),
            ),
        };

        Self {
            current_view: View::default(),
            input_handler: InputHandler::new(),
            should_quit: false,
            show_help: false,
            selection: 0,
            instance_detail: None,
            data,
            theme_manager,
            notifier: ErrorNotifier::new(config.error_threshold()),
            sound: Box::new(TerminalBell),
            sound_volume: config.sound_volume(),
            toasts: ToastStack::default(),
            install_prompt,
            link_opener: Box::new(|url: &str| browser::open_url(url)),
            usd_to_brl: config.usd_to_brl,
            usage_range: DateRange::ending_today(),
            usage_summary: UsageSummary::default(),
            error_log: ErrorLogState::default(),
            refresh_pending: false,
            dirty: true,
        }
    }

    /// Replace the notification cue.
    pub fn with_sound(mut self, sound: Box<dyn SoundCue>) -> Self {
        self.sound = sound;
        self
    }

    /// Replace the browser launcher.
    pub fn with_link_opener(mut self, opener: LinkOpener) -> Self {
        self.link_opener = opener;
        self
    }

    /// Returns the current view.
    pub fn current_view(&self) -> View {
        self.current_view
    }

    /// Returns whether the app should quit.
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Returns whether help overlay is visible.
    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn toasts(&self) -> &ToastStack {
        &self.toasts
    }

    pub fn usage_range(&self) -> DateRange {
        self.usage_range
    }

    pub fn usage_summary(&self) -> &UsageSummary {
        &self.usage_summary
    }

    pub fn notifier(&self) -> &ErrorNotifier {
        &self.notifier
    }

    pub fn theme_manager(&self) -> &ThemeManager {
        &self.theme_manager
    }

    pub fn install_prompt(&self) -> &InstallPrompt {
        &self.install_prompt
    }

    pub fn error_log(&self) -> &ErrorLogState {
        &self.error_log
    }

    fn dashboard(&self) -> Option<&DashboardPayload> {
        self.data.dashboard.data.as_ref()
    }

    /// Mark the UI as dirty (needs redraw).
    fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Check if UI needs redraw and clear the dirty flag.
    fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    fn toast(&mut self, kind: ToastKind, message: impl Into<String>, link: Option<String>) {
        self.toasts
            .push(Toast::new(kind, message, Instant::now()).with_link(link));
        self.mark_dirty();
    }

    /// Switch to a specific view.
    pub fn switch_view(&mut self, view: View) {
        if self.current_view != view {
            self.current_view = view;
            self.selection = 0;
            self.instance_detail = None;
            self.mark_dirty();
        }
    }

    /// Number of selectable rows in the current view.
    fn list_len(&self) -> usize {
        let Some(payload) = self.dashboard() else {
            return 0;
        };
        match self.current_view {
            View::Executions => payload.executions.len(),
            View::Errors => self.error_log.displayed(payload).len(),
            View::Workflows => payload.workflows.len(),
            View::Instances => payload.instances.len(),
            View::Overview | View::Usage => 0,
        }
    }

    fn clamp_selection(&mut self) {
        self.selection = self.selection.min(self.list_len().saturating_sub(1));
    }

    /// Handle a key event.
    pub fn handle_key_event(&mut self, key: KeyEvent) {
        let event = self.input_handler.handle_key(key);
        if self.show_help && event != AppEvent::None {
            // any key closes help
            self.show_help = false;
            self.mark_dirty();
            if !matches!(event, AppEvent::ForceQuit) {
                return;
            }
        }
        self.handle_app_event(event);
    }

    /// Handle an application event.
    pub fn handle_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::SwitchView(view) => self.switch_view(view),
            AppEvent::NextView => self.switch_view(self.current_view.next()),
            AppEvent::PrevView => self.switch_view(self.current_view.prev()),
            AppEvent::ShowHelp => {
                self.show_help = true;
                self.mark_dirty();
            }
            AppEvent::Quit | AppEvent::ForceQuit => self.should_quit = true,
            AppEvent::Refresh => self.manual_refresh(),
            AppEvent::Cancel => {
                if self.show_help {
                    self.show_help = false;
                } else {
                    self.instance_detail = None;
                }
                self.mark_dirty();
            }
            AppEvent::NavigateUp => {
                if self.instance_detail.is_none() && self.selection > 0 {
                    self.selection -= 1;
                    self.mark_dirty();
                }
            }
            AppEvent::NavigateDown => {
                if self.instance_detail.is_none() && self.selection + 1 < self.list_len() {
                    self.selection += 1;
                    self.mark_dirty();
                }
            }
            AppEvent::Select => self.select(),
            AppEvent::ToggleTheme => {
                let mode = self.theme_manager.toggle();
                info!(theme = %mode, "theme toggled");
                self.mark_dirty();
            }
            AppEvent::OpenToastLink => {
                if let Some(link) = self.toasts.latest_link().map(str::to_string) {
                    self.open_link(&link);
                }
            }
            AppEvent::OpenLastError => {
                let link = self
                    .dashboard()
                    .map(KpiSummary::from_payload)
                    .and_then(|s| s.last_error)
                    .and_then(|e| e.link);
                match link {
                    Some(link) => self.open_link(&link),
                    None => self.toast(ToastKind::Info, "No error to open", None),
                }
            }
            AppEvent::CycleWorkflowFilter => {
                if self.current_view == View::Errors {
                    if let Some(payload) = self.data.dashboard.data.as_ref() {
                        self.error_log.cycle_filter(payload);
                    }
                    self.selection = 0;
                    self.mark_dirty();
                }
            }
            AppEvent::ShowMore => {
                if self.current_view == View::Errors {
                    self.error_log.show_more();
                    self.mark_dirty();
                }
            }
            AppEvent::ShiftRangeStart(days) => self.shift_range(|r| r.shift_start(days)),
            AppEvent::ShiftRangeEnd(days) => self.shift_range(|r| r.shift_end(days)),
            AppEvent::AcceptInstall => {
                if let Some(command) = self.install_prompt.accept() {
                    self.toast(
                        ToastKind::Success,
                        format!("Add to your shell profile: {}", command),
                        None,
                    );
                }
            }
            AppEvent::DismissInstall => {
                if self.install_prompt.dismiss() {
                    self.mark_dirty();
                }
            }
            AppEvent::None => {}
        }
    }

    fn manual_refresh(&mut self) {
        info!("manual refresh");
        self.data.refresh(None);
        self.refresh_pending = true;
        self.toast(ToastKind::Info, "Reloading data...", None);
    }

    fn select(&mut self) {
        if self.current_view == View::Instances {
            if self.selection < self.dashboard().map_or(0, |p| p.instances.len()) {
                self.instance_detail = Some(self.selection);
                self.mark_dirty();
            }
            return;
        }

        let Some(payload) = self.dashboard() else {
            return;
        };
        let execution = match self.current_view {
            View::Executions => payload.executions.get(self.selection),
            View::Errors => self.error_log.displayed(payload).get(self.selection).copied(),
            _ => return,
        };
        let Some(execution) = execution else {
            return;
        };

        if payload.dev_profile.n8n_url.is_empty() {
            self.toast(ToastKind::Info, "n8n URL not configured", None);
        } else {
            let link = payload.execution_link(execution);
            self.open_link(&link);
        }
    }

    fn open_link(&mut self, url: &str) {
        if let Err(e) = (self.link_opener)(url) {
            warn!(url, error = %e, "failed to open link");
            self.toast(ToastKind::Error, "Could not open the browser", None);
        }
    }

    fn shift_range(&mut self, shift: impl FnOnce(DateRange) -> flowdeck_cost::Result<DateRange>) {
        if self.current_view != View::Usage {
            return;
        }
        match shift(self.usage_range) {
            Ok(range) => {
                self.usage_range = range;
                self.recompute_usage();
            }
            Err(e) => self.toast(ToastKind::Info, e.friendly_message(), None),
        }
    }

    fn recompute_usage(&mut self) {
        self.usage_summary = match &self.data.usage.data {
            Some(payload) => aggregate(
                &payload.tokens,
                &payload.costs,
                &payload.projects.names_by_id(),
                &self.usage_range,
            ),
            None => UsageSummary::default(),
        };
        self.mark_dirty();
    }

    /// Drain feed events and react to them.
    pub fn poll_data(&mut self) {
        for change in self.data.poll_updates() {
            self.apply_change(change);
        }
    }

    fn apply_change(&mut self, change: DataChange) {
        match change {
            DataChange::Fetching(_) => {}
            DataChange::DashboardUpdated(trigger) => {
                let notification = match self.data.dashboard.data.as_ref() {
                    Some(payload) => self.notifier.observe(payload, Utc::now()),
                    None => None,
                };
                if let Some(notification) = notification {
                    self.notify(notification);
                }
                if trigger == FetchTrigger::Manual && self.refresh_pending {
                    self.refresh_pending = false;
                    self.toast(ToastKind::Success, "Data updated", None);
                }
                self.clamp_selection();
            }
            DataChange::DashboardFailed(trigger) => {
                if trigger == FetchTrigger::Manual && self.refresh_pending {
                    self.refresh_pending = false;
                    self.toast(ToastKind::Error, "Update failed", None);
                }
            }
            DataChange::UsageUpdated(_) => self.recompute_usage(),
            DataChange::UsageFailed(_) => {}
            DataChange::Disconnected => {
                self.toast(ToastKind::Error, "Background refresh stopped", None);
            }
        }
        self.mark_dirty();
    }

    fn notify(&mut self, notification: ErrorNotification) {
        play_notification_sound(self.sound.as_mut(), self.sound_volume);
        let link = notification.link().map(str::to_string);
        self.toast(ToastKind::Error, notification.message(), link);
    }

    /// Advance timers: toast expiry and the install hint countdown.
    pub fn tick(&mut self, now: Instant) {
        if self.toasts.expire(now) {
            self.mark_dirty();
        }
        if self.install_prompt.tick(now) {
            self.mark_dirty();
        }
    }

    /// Run the main application loop.
    pub fn run(&mut self) -> AppResult<()> {
        // Setup terminal
        crossterm::terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        // Main loop
        let result = self.run_loop(&mut terminal);

        // Restore terminal
        crossterm::terminal::disable_raw_mode()?;
        crossterm::execute!(terminal.backend_mut(), crossterm::terminal::LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    /// The inner event loop with frame-rate limiting.
    fn run_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> AppResult<()> {
        while !self.should_quit {
            let frame_start = Instant::now();

            self.poll_data();
            self.tick(frame_start);

            if self.take_dirty() {
                terminal.draw(|frame| self.draw(frame))?;
            }

            let timeout = FRAME_DURATION.saturating_sub(frame_start.elapsed());
            if event::poll(timeout)? {
                match event::read()? {
                    Event::Key(key) => self.handle_key_event(key),
                    Event::Resize(_, _) => self.mark_dirty(),
                    _ => {}
                }
            }
        }
        Ok(())
    }

    /// Draw the UI.
    pub fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();

        if self.data.dashboard.is_loading() {
            self.draw_loading(frame, area);
        } else if let Some(error) = self.data.dashboard.error.clone() {
            self.draw_connection_error(frame, area, &error);
        } else {
            let banner_height = if self.install_prompt.is_visible() { 3 } else { 0 };
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(4),             // Header
                    Constraint::Min(10),               // Content
                    Constraint::Length(banner_height), // Install hint
                    Constraint::Length(2),             // Footer
                ])
                .split(area);

            self.draw_header(frame, chunks[0]);
            self.draw_content(frame, chunks[1]);
            if banner_height > 0 {
                self.draw_install_banner(frame, chunks[2]);
            }
            self.draw_footer(frame, chunks[3]);

            if let Some(idx) = self.instance_detail {
                self.draw_instance_detail(frame, area, idx);
            }
        }

        if !self.toasts.is_empty() {
            let overlay = ToastOverlay::new(&self.toasts, self.theme_manager.current());
            let toast_area = overlay.area(area);
            frame.render_widget(overlay, toast_area);
        }

        if self.show_help {
            self.draw_help_overlay(frame, area);
        }
    }

    fn draw_loading(&self, frame: &mut Frame, area: Rect) {
        let theme = self.theme_manager.current();
        let message = Paragraph::new(vec![
            Line::styled("⟳", Style::default().fg(theme.colors.header)),
            Line::styled("Loading dashboard...", Style::default().fg(theme.colors.text_dim)),
        ])
        .alignment(Alignment::Center);
        frame.render_widget(message, centered_rect(40, 2, area));
    }

    fn draw_connection_error(&self, frame: &mut Frame, area: Rect, error: &str) {
        let theme = self.theme_manager.current();
        let colors = &theme.colors;
        let message = Paragraph::new(vec![
            Line::styled(
                "Connection error",
                Style::default().fg(colors.status_error).add_modifier(Modifier::BOLD),
            ),
            Line::styled(error.to_string(), Style::default().fg(colors.text_dim)),
            Line::raw(""),
            HotkeyHints::new().hint("r", "Retry").hint("q", "Quit").as_line(theme),
        ])
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
        frame.render_widget(message, centered_rect(70, 5, area));
    }

    /// Draw the header bar.
    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let header = HeaderBar::new(
            self.dashboard().map(|p| &p.dev_profile),
            self.current_view,
            self.theme_manager.current(),
        )
        .last_updated(self.data.dashboard.last_updated)
        .fetching(self.data.is_fetching());
        frame.render_widget(header, area);
    }

    /// Draw the main content area based on current view.
    fn draw_content(&self, frame: &mut Frame, area: Rect) {
        let Some(payload) = self.dashboard() else {
            return;
        };
        let theme = self.theme_manager.current();
        let selected = Some(self.selection);

        match self.current_view {
            View::Overview => self.draw_overview(frame, area, payload),
            View::Executions => frame.render_widget(
                ExecutionTable::new(payload, theme).selected(selected).focused(true),
                area,
            ),
            View::Errors => frame.render_widget(
                ErrorLogPanel::new(payload, &self.error_log, theme).selected(selected),
                area,
            ),
            View::Workflows => frame.render_widget(
                WorkflowPanel::new(&payload.workflows, theme).selected(selected),
                area,
            ),
            View::Usage => frame.render_widget(
                UsagePanel::new(
                    &self.data.usage,
                    &self.usage_summary,
                    &self.usage_range,
                    self.usd_to_brl,
                    theme,
                ),
                area,
            ),
            View::Instances => frame.render_widget(
                InstancePanel::new(payload, theme).selected(selected).focused(true),
                area,
            ),
        }
    }

    /// KPI cards, instance summary and the newest executions.
    fn draw_overview(&self, frame: &mut Frame, area: Rect, payload: &DashboardPayload) {
        let theme = self.theme_manager.current();
        let instance_height = instance_panel_height(payload.instances.len());
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5),
                Constraint::Length(instance_height),
                Constraint::Min(4),
            ])
            .split(area);

        let summary = KpiSummary::from_payload(payload);
        frame.render_widget(KpiPanel::new(&summary, theme), chunks[0]);
        frame.render_widget(InstancePanel::new(payload, theme), chunks[1]);
        frame.render_widget(
            ExecutionTable::new(payload, theme).limit(OVERVIEW_EXECUTIONS),
            chunks[2],
        );
    }

    fn draw_install_banner(&self, frame: &mut Frame, area: Rect) {
        let theme = self.theme_manager.current();
        let mut line = vec![Span::styled(
            "Launch flowdeck from anywhere with a shell alias.  ",
            Style::default().fg(theme.colors.text),
        )];
        line.extend(
            HotkeyHints::new()
                .hint("i", "Show command")
                .hint("x", "Dismiss")
                .as_line(theme)
                .spans,
        );
        let banner = Paragraph::new(Line::from(line)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.colors.header))
                .title(Span::styled(" Install ", Style::default().fg(theme.colors.header))),
        );
        frame.render_widget(banner, area);
    }

    /// Draw the footer with hotkey hints.
    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let theme = self.theme_manager.current();
        let mut hints = HotkeyHints::new();
        for view in View::ALL {
            hints = hints.hint(view.hotkey().to_string(), view.title());
        }
        hints = hints
            .hint("r", "Refresh")
            .hint("T", "Theme")
            .hint("?", "Help")
            .hint("q", "Quit");

        let footer = Paragraph::new(hints.as_line(theme)).block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(Style::default().fg(theme.colors.border_dim)),
        );
        frame.render_widget(footer, area);
    }

    fn draw_instance_detail(&self, frame: &mut Frame, area: Rect, idx: usize) {
        let Some(instance) = self.dashboard().and_then(|p| p.instances.get(idx)) else {
            return;
        };
        let overlay = centered_rect(80, 32, area);
        frame.render_widget(
            InstanceDetail::new(instance, self.theme_manager.current()),
            overlay,
        );
    }

    /// Draw the help overlay.
    fn draw_help_overlay(&self, frame: &mut Frame, area: Rect) {
        let theme = self.theme_manager.current();
        let overlay_area = centered_rect(60, 28, area);

        // Clear background
        frame.render_widget(Clear, overlay_area);

        let help_text = "\
flowdeck Hotkey Reference

Views:
  o        Overview
  e        Executions
  l        Error log
  w        Workflows
  u        Token usage
  n        Instances
  Tab      Cycle views forward
  Shift+Tab Cycle views backward

Actions:
  r        Refresh now
  T        Toggle dark / light theme
  Enter    Open execution / instance details
  v        Open the link of the latest toast
  L        Open the last failed execution
  f  m     Error log: filter workflow / load more
  [  ]     Usage: move range start
  {  }     Usage: move range end

General:
  ?        Show this help
  Esc      Close overlay
  q        Quit

Press any key to close this help.";

        let help = Paragraph::new(help_text)
            .style(Style::default().fg(theme.colors.text))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(theme.colors.header))
                    .title(Span::styled(
                        " Help ",
                        Style::default().fg(theme.colors.header).add_modifier(Modifier::BOLD),
                    ))
                    .style(Style::default().bg(theme.colors.overlay_bg)),
            )
            .wrap(Wrap { trim: false });

        frame.render_widget(help, overlay_area);
    }
}

/// Overview rows for the instance summary: one per instance plus borders.
fn instance_panel_height(instances: usize) -> u16 {
    u16::try_from(instances)
        .unwrap_or(u16::MAX)
        .saturating_add(2)
        .clamp(3, 8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::mpsc::{self, Sender};

    use chrono::TimeDelta;
    use crossterm::event::{KeyCode, KeyModifiers};
    use flowdeck_core::config::{
        ENV_ERROR_NOTIFICATION_THRESHOLD_MINUTES, ENV_NOTIFICATION_SOUND_VOLUME, ENV_USD_TO_BRL,
    };
    use flowdeck_core::types::{DevProfile, Execution, ExecutionStatus, Instance, Workflow};
    use flowdeck_core::{FileConfig, ThemeMode};
    use flowdeck_cost::{CostRecord, ProjectMapping, TokenUsageRecord, UsagePayload};
    use flowdeck_feed::{FeedError, FeedEvent, FeedKind};
    use ratatui::backend::TestBackend;
    use ratatui::buffer::Buffer;

    /// Helper to create a test terminal with specified dimensions
    fn test_terminal(width: u16, height: u16) -> Terminal<TestBackend> {
        let backend = TestBackend::new(width, height);
        Terminal::new(backend).unwrap()
    }

    /// Helper to render app and get the buffer
    fn render_app(app: &mut App, width: u16, height: u16) -> Buffer {
        let mut terminal = test_terminal(width, height);
        terminal.draw(|frame| app.draw(frame)).unwrap();
        terminal.backend().buffer().clone()
    }

    /// Check if a buffer contains a specific string
    fn buffer_contains(buffer: &Buffer, text: &str) -> bool {
        let content = buffer_to_string(buffer);
        content.contains(text)
    }

    /// Convert buffer to string for debugging/searching
    fn buffer_to_string(buffer: &Buffer) -> String {
        let area = buffer.area;
        let mut result = String::new();
        for y in 0..area.height {
            for x in 0..area.width {
                result.push(buffer[(x, y)].symbol().chars().next().unwrap_or(' '));
            }
            result.push('\n');
        }
        result
    }

    fn key(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    struct RecordingCue(Rc<RefCell<Vec<f64>>>);

    impl SoundCue for RecordingCue {
        fn play(&mut self, volume: f64) -> io::Result<()> {
            self.0.borrow_mut().push(volume);
            Ok(())
        }
    }

    struct Harness {
        app: App,
        tx: Sender<FeedEvent>,
        opened: Rc<RefCell<Vec<String>>>,
        plays: Rc<RefCell<Vec<f64>>>,
    }

    impl Harness {
        fn new(store: Option<ClientStateStore>) -> Self {
            let config = DashboardConfig::from_sources(FileConfig::default(), |key| match key {
                ENV_ERROR_NOTIFICATION_THRESHOLD_MINUTES => Some("5".into()),
                ENV_NOTIFICATION_SOUND_VOLUME => Some("0.5".into()),
                ENV_USD_TO_BRL => Some("5".into()),
                _ => None,
            });
            let (tx, rx) = mpsc::channel();
            let opened = Rc::new(RefCell::new(Vec::new()));
            let plays = Rc::new(RefCell::new(Vec::new()));

            let sink = opened.clone();
            let app = App::with_parts(DataManager::from_receiver(rx), &config, store)
                .with_sound(Box::new(RecordingCue(plays.clone())))
                .with_link_opener(Box::new(move |url: &str| {
                    sink.borrow_mut().push(url.to_string());
                    Ok::<(), anyhow::Error>(())
                }));

            Self {
                app,
                tx,
                opened,
                plays,
            }
        }

        fn dashboard(&mut self, trigger: FetchTrigger, payload: DashboardPayload) {
            self.tx
                .send(FeedEvent::Dashboard {
                    trigger,
                    result: Ok(payload),
                })
                .unwrap();
            self.app.poll_data();
        }

        fn dashboard_failed(&mut self, trigger: FetchTrigger) {
            self.tx
                .send(FeedEvent::Dashboard {
                    trigger,
                    result: Err(FeedError::NotConfigured {
                        feed: FeedKind::Dashboard,
                    }),
                })
                .unwrap();
            self.app.poll_data();
        }

        fn toast_messages(&self) -> Vec<String> {
            self.app.toasts().iter().map(|t| t.message.clone()).collect()
        }
    }

    fn exec(id: &str, status: ExecutionStatus, minutes_ago: i64) -> Execution {
        let stopped = Utc::now() - TimeDelta::minutes(minutes_ago);
        Execution {
            id: id.to_string(),
            finished: true,
            status,
            started_at: Some((stopped - TimeDelta::seconds(3)).to_rfc3339()),
            stopped_at: Some(stopped.to_rfc3339()),
            workflow_id: "wf-leads".to_string(),
        }
    }

    fn payload(executions: Vec<Execution>) -> DashboardPayload {
        DashboardPayload {
            executions,
            workflows: vec![Workflow {
                id: "wf-leads".into(),
                name: "Lead intake".into(),
                ..Default::default()
            }],
            instances: vec![
                Instance {
                    id: "i-1".into(),
                    name: "vendas".into(),
                    connection_status: "open".into(),
                    ..Default::default()
                },
                Instance {
                    id: "i-2".into(),
                    name: "suporte".into(),
                    connection_status: "close".into(),
                    disconnection_reason_code: Some(401),
                    ..Default::default()
                },
            ],
            total_instances: 2,
            dev_profile: DevProfile {
                company: "Acme".into(),
                n8n_url: "https://n8n.acme.dev".into(),
                ..Default::default()
            },
        }
    }

    fn primed() -> Harness {
        let mut h = Harness::new(None);
        h.dashboard(
            FetchTrigger::Initial,
            payload(vec![
                exec("e1", ExecutionStatus::Error, 1),
                exec("s1", ExecutionStatus::Success, 2),
            ]),
        );
        h
    }

    // ============================================================
    // Screen States
    // ============================================================

    #[test]
    fn test_loading_screen_before_first_payload() {
        let mut h = Harness::new(None);
        let buffer = render_app(&mut h.app, 100, 30);
        assert!(buffer_contains(&buffer, "Loading dashboard..."));
    }

    #[test]
    fn test_connection_error_screen() {
        let mut h = Harness::new(None);
        h.dashboard_failed(FetchTrigger::Initial);

        let buffer = render_app(&mut h.app, 100, 30);
        assert!(buffer_contains(&buffer, "Connection error"));
        assert!(buffer_contains(&buffer, "Retry"));
    }

    #[test]
    fn test_overview_renders_header_and_panels() {
        let mut h = primed();
        let buffer = render_app(&mut h.app, 140, 40);

        assert!(buffer_contains(&buffer, "Acme"), "header should show the company");
        assert!(buffer_contains(&buffer, "Recent Executions"));
        assert!(buffer_contains(&buffer, "1/2 connected"));
        assert!(buffer_contains(&buffer, "Refresh"));
    }

    #[test]
    fn test_instance_panel_height_is_bounded() {
        assert_eq!(instance_panel_height(0), 3);
        assert_eq!(instance_panel_height(2), 4);
        assert_eq!(instance_panel_height(65_534), 8);
        assert_eq!(instance_panel_height(70_000), 8);
        assert_eq!(instance_panel_height(usize::MAX), 8);
    }

    #[test]
    fn test_help_overlay_opens_and_any_key_closes() {
        let mut h = primed();
        h.app.handle_key_event(key('?'));
        assert!(h.app.show_help());
        let buffer = render_app(&mut h.app, 100, 40);
        assert!(buffer_contains(&buffer, "Hotkey Reference"));

        h.app.handle_key_event(key('e'));
        assert!(!h.app.show_help());
        // the closing key is swallowed
        assert_eq!(h.app.current_view(), View::Overview);
    }

    #[test]
    fn test_view_switching_keys() {
        let mut h = primed();
        h.app.handle_key_event(key('e'));
        assert_eq!(h.app.current_view(), View::Executions);
        h.app.handle_key_event(KeyEvent::new(KeyCode::Tab, KeyModifiers::NONE));
        assert_eq!(h.app.current_view(), View::Errors);

        h.app.handle_key_event(key('q'));
        assert!(h.app.should_quit());
    }

    // ============================================================
    // Error Notifications
    // ============================================================

    #[test]
    fn test_first_payload_only_primes() {
        let h = primed();
        assert!(h.app.toasts().is_empty());
        assert!(h.plays.borrow().is_empty());
        assert!(h.app.notifier().notified().contains("e1"));
    }

    #[test]
    fn test_new_error_shows_toast_and_plays_sound() {
        let mut h = primed();
        h.dashboard(
            FetchTrigger::Timer,
            payload(vec![
                exec("e2", ExecutionStatus::Error, 0),
                exec("e1", ExecutionStatus::Error, 1),
            ]),
        );

        assert_eq!(h.toast_messages(), vec!["Error in: Lead intake"]);
        assert_eq!(*h.plays.borrow(), vec![0.5]);

        let buffer = render_app(&mut h.app, 140, 40);
        assert!(buffer_contains(&buffer, "Error in: Lead intake"));

        h.app.handle_key_event(key('v'));
        assert_eq!(
            *h.opened.borrow(),
            vec!["https://n8n.acme.dev/workflow/wf-leads/executions/e2"]
        );

        // the same payload again stays quiet
        h.dashboard(
            FetchTrigger::Timer,
            payload(vec![exec("e2", ExecutionStatus::Error, 0)]),
        );
        assert_eq!(h.app.toasts().len(), 1);
    }

    #[test]
    fn test_several_new_errors_share_one_toast() {
        let mut h = primed();
        h.dashboard(
            FetchTrigger::Timer,
            payload(vec![
                exec("e3", ExecutionStatus::Error, 0),
                exec("e2", ExecutionStatus::Error, 1),
            ]),
        );

        assert_eq!(h.toast_messages(), vec!["2 new errors detected"]);
        assert_eq!(h.plays.borrow().len(), 1);
        assert_eq!(h.app.toasts().latest_link(), None);
    }

    // ============================================================
    // Actions
    // ============================================================

    #[test]
    fn test_manual_refresh_toasts() {
        let mut h = primed();
        h.app.handle_key_event(key('r'));
        assert_eq!(h.toast_messages(), vec!["Reloading data..."]);

        // timer results do not complete a manual refresh
        h.dashboard(FetchTrigger::Timer, payload(vec![]));
        assert_eq!(h.app.toasts().len(), 1);

        h.dashboard(FetchTrigger::Manual, payload(vec![]));
        assert_eq!(h.toast_messages(), vec!["Reloading data...", "Data updated"]);
    }

    #[test]
    fn test_manual_refresh_failure_toast() {
        let mut h = primed();
        h.app.handle_app_event(AppEvent::Refresh);
        h.dashboard_failed(FetchTrigger::Manual);

        assert_eq!(h.toast_messages(), vec!["Reloading data...", "Update failed"]);
        let buffer = render_app(&mut h.app, 100, 30);
        assert!(buffer_contains(&buffer, "Connection error"));
    }

    #[test]
    fn test_select_execution_opens_link() {
        let mut h = primed();
        h.app.switch_view(View::Executions);
        h.app.handle_app_event(AppEvent::NavigateDown);
        h.app.handle_app_event(AppEvent::Select);

        assert_eq!(
            *h.opened.borrow(),
            vec!["https://n8n.acme.dev/workflow/wf-leads/executions/s1"]
        );
    }

    #[test]
    fn test_select_without_base_url() {
        let mut h = Harness::new(None);
        let mut data = payload(vec![exec("s1", ExecutionStatus::Success, 1)]);
        data.dev_profile.n8n_url.clear();
        h.dashboard(FetchTrigger::Initial, data);

        h.app.switch_view(View::Executions);
        h.app.handle_app_event(AppEvent::Select);
        assert!(h.opened.borrow().is_empty());
        assert_eq!(h.toast_messages(), vec!["n8n URL not configured"]);
    }

    #[test]
    fn test_open_last_error() {
        let mut h = primed();
        h.app.handle_key_event(KeyEvent::new(KeyCode::Char('L'), KeyModifiers::SHIFT));
        assert_eq!(
            *h.opened.borrow(),
            vec!["https://n8n.acme.dev/workflow/wf-leads/executions/e1"]
        );
    }

    #[test]
    fn test_instance_detail_overlay() {
        let mut h = primed();
        h.app.switch_view(View::Instances);
        h.app.handle_app_event(AppEvent::NavigateDown);
        h.app.handle_app_event(AppEvent::Select);

        let buffer = render_app(&mut h.app, 120, 45);
        assert!(buffer_contains(&buffer, "Diagnostics: suporte"));

        h.app.handle_app_event(AppEvent::Cancel);
        let buffer = render_app(&mut h.app, 120, 45);
        assert!(!buffer_contains(&buffer, "Diagnostics: suporte"));
    }

    #[test]
    fn test_error_log_filter_only_in_error_view() {
        let mut h = primed();
        h.app.handle_app_event(AppEvent::CycleWorkflowFilter);
        assert_eq!(h.app.error_log().workflow_filter, None);

        h.app.switch_view(View::Errors);
        h.app.handle_app_event(AppEvent::CycleWorkflowFilter);
        assert_eq!(h.app.error_log().workflow_filter.as_deref(), Some("wf-leads"));
    }

    #[test]
    fn test_theme_toggle_persists() {
        let dir = tempfile::tempdir().unwrap();
        let store = ClientStateStore::new(dir.path().join("state.json"));
        let mut h = Harness::new(Some(store.clone()));
        assert_eq!(h.app.theme_manager().mode(), ThemeMode::Dark);

        h.app.handle_key_event(KeyEvent::new(KeyCode::Char('T'), KeyModifiers::SHIFT));
        assert_eq!(h.app.theme_manager().mode(), ThemeMode::Light);
        assert_eq!(store.load().theme, Some(ThemeMode::Light));
    }

    #[test]
    fn test_install_hint_dismiss_persists() {
        let dir = tempfile::tempdir().unwrap();
        let store = ClientStateStore::new(dir.path().join("state.json"));
        let mut h = primed_with_store(store.clone());

        h.app.tick(Instant::now());
        assert!(h.app.install_prompt().is_visible());
        let buffer = render_app(&mut h.app, 140, 40);
        assert!(buffer_contains(&buffer, "Show command"));

        h.app.handle_key_event(key('x'));
        assert!(!h.app.install_prompt().is_visible());
        assert!(store.load().install_prompt_dismissed);
    }

    #[test]
    fn test_install_hint_accept_shows_alias() {
        let mut h = primed();
        h.app.tick(Instant::now());
        h.app.handle_key_event(key('i'));

        assert!(!h.app.install_prompt().is_visible());
        assert!(h.toast_messages()[0].contains("alias n8n-dash"));
    }

    fn primed_with_store(store: ClientStateStore) -> Harness {
        let mut h = Harness::new(Some(store));
        h.dashboard(FetchTrigger::Initial, payload(vec![]));
        h
    }

    // ============================================================
    // Token Usage
    // ============================================================

    fn usage_payload() -> UsagePayload {
        let today = chrono::Local::now().date_naive().format("%Y-%m-%d").to_string();
        UsagePayload {
            tokens: vec![TokenUsageRecord::new(today.clone(), "proj_a", 900, 100)],
            costs: vec![CostRecord::new(today, "proj_a", 0.02)],
            projects: ProjectMapping([("Atendimento".to_string(), "proj_a".to_string())].into()),
            days_processed: 1,
            reported_total_cost_usd: 0.02,
        }
    }

    #[test]
    fn test_usage_view_aggregates_current_range() {
        let mut h = primed();
        h.tx.send(FeedEvent::Usage {
            trigger: FetchTrigger::Initial,
            result: Ok(usage_payload()),
        })
        .unwrap();
        h.app.poll_data();

        let summary = h.app.usage_summary();
        assert_eq!(summary.totals.tokens, 1000);
        assert_eq!(summary.projects[0].name, "Atendimento");

        h.app.switch_view(View::Usage);
        let buffer = render_app(&mut h.app, 140, 40);
        assert!(buffer_contains(&buffer, "OpenAI Usage"));
        assert!(buffer_contains(&buffer, "Atendimento"));
    }

    #[test]
    fn test_usage_range_shift() {
        let mut h = primed();
        h.app.switch_view(View::Usage);
        let before = h.app.usage_range();

        h.app.handle_key_event(key(']'));
        assert_eq!(h.app.usage_range().start(), before.start() + TimeDelta::days(1));

        // start past the end is refused
        h.app.handle_app_event(AppEvent::ShiftRangeStart(60));
        assert_eq!(h.app.usage_range().start(), before.start() + TimeDelta::days(1));
        assert!(h.toast_messages()[0].contains("must not be after"));
    }

    #[test]
    fn test_range_keys_ignored_outside_usage() {
        let mut h = primed();
        let before = h.app.usage_range();
        h.app.handle_key_event(key('['));
        assert_eq!(h.app.usage_range(), before);
    }

    #[test]
    fn test_toasts_expire() {
        let mut h = primed();
        h.app.handle_app_event(AppEvent::Refresh);
        h.app.tick(Instant::now() + crate::toast::TOAST_DURATION);
        assert!(h.app.toasts().is_empty());
    }
}

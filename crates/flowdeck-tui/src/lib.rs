//! Terminal UI for flowdeck.
//!
//! This crate provides the Ratatui-based terminal interface over the n8n
//! dashboard and token usage feeds.
//!
//! ## Features
//!
//! - Multi-view dashboard with hotkey navigation
//! - KPI cards, execution history and an error log with workflow filter
//! - Messaging instance health with a diagnostic overlay
//! - OpenAI token and cost breakdown per project over a date range
//! - Toast plus bell for newly failed executions
//! - Dark and light themes, persisted between runs
//!
//! ## Hotkeys
//!
//! - `o` - Overview
//! - `e` - Executions
//! - `l` - Error log
//! - `w` - Workflows
//! - `u` - Token usage
//! - `n` - Instances
//! - `r` - Refresh now
//! - `T` - Toggle theme
//! - `v` - Open the link of the latest toast
//! - `L` - Open the last failed execution
//! - `[` `]` / `{` `}` - Move the usage range start / end
//! - `?` - Help
//! - `q` - Quit
//! - `Tab` - Cycle views
//! - `Esc` - Close overlay

pub mod alert;
pub mod app;
pub mod browser;
pub mod data;
pub mod event;
pub mod execution_panel;
pub mod header;
pub mod install_prompt;
pub mod instance_panel;
pub mod kpi_panel;
pub mod sound;
pub mod theme;
pub mod toast;
pub mod usage_panel;
pub mod view;
pub mod widget;
pub mod workflow_panel;

pub use alert::{ErrorNotification, ErrorNotifier};
pub use app::{App, AppResult};
pub use data::{DataManager, FeedState};
pub use view::View;

//! # flowdeck-core
//!
//! Core types, errors, and utilities for the flowdeck monitoring dashboard.
//!
//! This crate provides:
//! - [`FlowdeckError`] - Error types for configuration, state and terminal operations
//! - [`logging`] - Tracing setup and log management utilities
//! - [`config`] - Environment and YAML driven dashboard configuration
//! - [`types`] - Feed data model shared across flowdeck crates
//! - [`client_state`] - Persisted theme and install-hint preferences
//!
//! ## Example
//!
//! ```no_run
//! use flowdeck_core::{DashboardConfig, logging};
//!
//! fn main() -> flowdeck_core::Result<()> {
//!     let _guard = logging::init_logging(None, false, logging::LogOutput::FileOnly)?;
//!
//!     let config = DashboardConfig::load(None)?;
//!     tracing::info!(url = %config.dashboard_webhook_url, "configured");
//!
//!     Ok(())
//! }
//! ```

pub mod client_state;
pub mod config;
pub mod error;
pub mod logging;
pub mod types;

// Re-export main types for convenience
pub use client_state::{ClientState, ClientStateStore, ThemeMode};
pub use config::{DashboardConfig, FileConfig};
pub use error::{FlowdeckError, Result};
pub use logging::{LogGuard, LogOutput, init_logging};
pub use types::{DashboardPayload, DevProfile, Execution, ExecutionStatus, Instance, Workflow};

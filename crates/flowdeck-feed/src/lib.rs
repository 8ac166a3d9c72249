//! # flowdeck-feed
//!
//! Webhook feed client and background poller for the flowdeck dashboard.
//!
//! This crate provides:
//! - [`FeedClient`] - GET + decode of the dashboard and usage webhooks
//! - [`FeedPoller`] - Background thread polling both feeds on independent timers
//! - [`FeedError`] - Transport, status and decode failures
//!
//! ## Example
//!
//! ```no_run
//! use flowdeck_feed::{FeedClient, FeedEvent, FeedPoller, PollerConfig};
//!
//! fn main() -> flowdeck_feed::Result<()> {
//!     let client = FeedClient::new("https://n8n.example.com/webhook/dashboard", "")?;
//!     let (tx, rx) = std::sync::mpsc::channel();
//!     let poller = FeedPoller::spawn(client, PollerConfig::default(), tx)?;
//!
//!     for event in rx.iter() {
//!         if let FeedEvent::Dashboard { result, .. } = event {
//!             println!("executions: {}", result?.executions.len());
//!             break;
//!         }
//!     }
//!
//!     poller.shutdown();
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod payload;
pub mod poller;

// Re-export main types
pub use client::FeedClient;
pub use error::{FeedError, Result};
pub use payload::{decode_dashboard, decode_usage};
pub use poller::{FeedCommand, FeedEvent, FeedKind, FeedPoller, FetchTrigger, PollerConfig};

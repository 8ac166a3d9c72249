//! # flowdeck-cost
//!
//! Token and cost usage aggregation for the flowdeck dashboard.
//!
//! This crate provides:
//! - [`TokenUsageRecord`] / [`CostRecord`] - Daily usage rows from the usage feed
//! - [`aggregate`] - Per-project roll-up over an inclusive [`DateRange`]
//! - [`format`] - Token and currency formatting
//!
//! ## Example
//!
//! ```
//! use std::collections::HashMap;
//! use flowdeck_cost::{CostRecord, DateRange, TokenUsageRecord, aggregate};
//!
//! let tokens = vec![TokenUsageRecord::new("2025-03-01", "p1", 900, 100)];
//! let costs = vec![CostRecord::new("2025-03-01", "p1", 0.25)];
//! let range = DateRange::last_30_days(chrono::NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
//!
//! let summary = aggregate(&tokens, &costs, &HashMap::new(), &range);
//! assert_eq!(summary.totals.tokens, 1000);
//! assert_eq!(summary.totals.days, 1);
//! ```

pub mod error;
pub mod format;
pub mod models;
pub mod usage;

// Re-export main types
pub use error::{Result, UsageError};
pub use format::{format_brl, format_rate, format_tokens, format_usd};
pub use models::{CostRecord, ProjectMapping, TokenUsageRecord, UsagePayload};
pub use usage::{DateRange, ProjectUsage, UsageSummary, UsageTotals, aggregate};

//! Failed-execution notifications.
//!
//! [`ErrorNotifier`] watches each dashboard payload and decides which error
//! executions are new. The first payload only primes it: every error already
//! present is recorded as seen and nothing is announced. After that, each
//! payload yields at most one [`ErrorNotification`], covering every error
//! that is unseen and stopped within the recency window.
//!
//! ## Guarantees
//!
//! - An execution id is announced at most once per process
//! - The seen set only grows; there is no expiry
//! - Ids are recorded before the notification is returned

use std::collections::HashSet;

use chrono::{DateTime, TimeDelta, Utc};
use flowdeck_core::log_notification;
use flowdeck_core::types::{DashboardPayload, Execution};
use tracing::debug;

/// Workflow name used when an execution's workflow is not in the payload.
pub const UNKNOWN_WORKFLOW: &str = "Unknown workflow";

/// Notifier lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotifierPhase {
    /// Waiting for the first payload
    #[default]
    Priming,
    /// Announcing new errors
    Steady,
}

/// Execution ids already surfaced (or present at startup).
#[derive(Debug, Clone, Default)]
pub struct NotifiedErrorSet {
    ids: HashSet<String>,
}

impl NotifiedErrorSet {
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Record an id; returns false if it was already present.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.ids.insert(id.into())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// One notification event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorNotification {
    /// Exactly one new error
    Single {
        execution_id: String,
        workflow_name: String,
        /// Deep link into the workflow editor, when a base URL is known
        link: Option<String>,
    },
    /// Several new errors at once
    Batch { count: usize },
}

impl ErrorNotification {
    /// Toast text.
    pub fn message(&self) -> String {
        match self {
            ErrorNotification::Single { workflow_name, .. } => format!("Error in: {}", workflow_name),
            ErrorNotification::Batch { count } => format!("{} new errors detected", count),
        }
    }

    pub fn link(&self) -> Option<&str> {
        match self {
            ErrorNotification::Single { link, .. } => link.as_deref(),
            ErrorNotification::Batch { .. } => None,
        }
    }

    pub fn count(&self) -> usize {
        match self {
            ErrorNotification::Single { .. } => 1,
            ErrorNotification::Batch { count } => *count,
        }
    }
}

/// Deduplicating error notifier.
#[derive(Debug, Clone)]
pub struct ErrorNotifier {
    phase: NotifierPhase,
    notified: NotifiedErrorSet,
    /// Recency window; `None` means no error is ever recent
    threshold: Option<TimeDelta>,
}

impl ErrorNotifier {
    pub fn new(threshold: Option<TimeDelta>) -> Self {
        Self {
            phase: NotifierPhase::Priming,
            notified: NotifiedErrorSet::default(),
            threshold,
        }
    }

    pub fn phase(&self) -> NotifierPhase {
        self.phase
    }

    pub fn notified(&self) -> &NotifiedErrorSet {
        &self.notified
    }

    /// Process a freshly fetched payload.
    pub fn observe(
        &mut self,
        payload: &DashboardPayload,
        now: DateTime<Utc>,
    ) -> Option<ErrorNotification> {
        match self.phase {
            NotifierPhase::Priming => {
                for execution in payload.executions.iter().filter(|e| e.is_error()) {
                    self.notified.insert(execution.id.clone());
                }
                self.phase = NotifierPhase::Steady;
                debug!(seeded = self.notified.len(), "error notifier primed");
                None
            }
            NotifierPhase::Steady => self.announce(payload, now),
        }
    }

    fn announce(&mut self, payload: &DashboardPayload, now: DateTime<Utc>) -> Option<ErrorNotification> {
        let threshold = self.threshold?;
        // a window reaching past the representable range covers every error
        let cutoff = match now.checked_sub_signed(threshold) {
            Some(cutoff) => Some(cutoff),
            None if threshold < TimeDelta::zero() => return None,
            None => None,
        };

        let recent: Vec<&Execution> = payload
            .executions
            .iter()
            .filter(|e| e.is_error() && !self.notified.contains(&e.id))
            .filter(|e| {
                e.stopped_at_time()
                    .is_some_and(|stopped| cutoff.is_none_or(|cutoff| stopped > cutoff))
            })
            .collect();

        if recent.is_empty() {
            return None;
        }

        for execution in &recent {
            self.notified.insert(execution.id.clone());
        }

        let notification = match recent.as_slice() {
            [execution] => ErrorNotification::Single {
                execution_id: execution.id.clone(),
                workflow_name: payload
                    .workflow_name(&execution.workflow_id, UNKNOWN_WORKFLOW)
                    .to_string(),
                link: (!payload.dev_profile.n8n_url.is_empty())
                    .then(|| payload.execution_link(execution)),
            },
            many => ErrorNotification::Batch { count: many.len() },
        };

        log_notification!(count = notification.count(), text = %notification.message());
        Some(notification)
    }
}

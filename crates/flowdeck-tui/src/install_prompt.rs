//! One-time hint suggesting a shell alias for launching flowdeck.
//!
//! The hint appears after the configured delay unless it was dismissed in a
//! previous run. Dismissal is persisted under `pwa-install-dismissed`;
//! accepting only hides it for this run.

use std::time::{Duration, Instant};

use flowdeck_core::ClientStateStore;
use tracing::{debug, warn};

/// Suggested alias line.
pub const ALIAS_HINT: &str = "alias n8n-dash='flowdeck'";

/// Install hint lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallPromptState {
    /// Counting down to the first display
    Waiting { since: Instant },
    /// Banner on screen
    Visible,
    /// User accepted; hidden for this run
    Accepted,
    /// User dismissed; hidden for good
    Dismissed,
}

/// Install hint controller.
pub struct InstallPrompt {
    state: InstallPromptState,
    delay: Duration,
    store: Option<ClientStateStore>,
}

impl InstallPrompt {
    /// Create the prompt; `dismissed` is the persisted flag.
    pub fn new(dismissed: bool, delay: Duration, now: Instant) -> Self {
        let state = if dismissed {
            InstallPromptState::Dismissed
        } else {
            InstallPromptState::Waiting { since: now }
        };
        Self {
            state,
            delay,
            store: None,
        }
    }

    /// Create the prompt from persisted client state.
    pub fn load(store: ClientStateStore, delay: Duration, now: Instant) -> Self {
        let dismissed = store.load().install_prompt_dismissed;
        Self {
            store: Some(store),
            ..Self::new(dismissed, delay, now)
        }
    }

    pub fn state(&self) -> InstallPromptState {
        self.state
    }

    pub fn is_visible(&self) -> bool {
        self.state == InstallPromptState::Visible
    }

    /// Advance the countdown; returns true when the banner appears.
    pub fn tick(&mut self, now: Instant) -> bool {
        let InstallPromptState::Waiting { since } = self.state else {
            return false;
        };
        if now.saturating_duration_since(since) < self.delay {
            return false;
        }

        // dismissal may have happened in another instance meanwhile
        if self
            .store
            .as_ref()
            .is_some_and(|store| store.load().install_prompt_dismissed)
        {
            self.state = InstallPromptState::Dismissed;
            return false;
        }

        debug!("showing install hint");
        self.state = InstallPromptState::Visible;
        true
    }

    /// Accept the hint; returns the alias to show, if the banner was visible.
    pub fn accept(&mut self) -> Option<&'static str> {
        if !self.is_visible() {
            return None;
        }
        self.state = InstallPromptState::Accepted;
        Some(ALIAS_HINT)
    }

    /// Dismiss the hint and persist the choice.
    pub fn dismiss(&mut self) -> bool {
        if !self.is_visible() {
            return false;
        }
        self.state = InstallPromptState::Dismissed;
        if let Some(store) = &self.store {
            if let Err(e) = store.update(|state| state.install_prompt_dismissed = true) {
                warn!(error = %e, "failed to persist install hint dismissal");
            }
        }
        true
    }
}

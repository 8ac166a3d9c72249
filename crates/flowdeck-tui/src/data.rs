//! Data layer for the flowdeck TUI.
//!
//! [`DataManager`] owns the background [`FeedPoller`] and the receiving end of
//! its event channel. The UI loop calls [`DataManager::poll_updates`] every
//! frame; events are drained without blocking and folded into one
//! [`FeedState`] per feed.

use std::sync::mpsc::{self, Receiver, TryRecvError};

use chrono::{DateTime, Local};
use flowdeck_core::DashboardConfig;
use flowdeck_core::types::DashboardPayload;
use flowdeck_cost::UsagePayload;
use flowdeck_feed::{FeedClient, FeedEvent, FeedKind, FeedPoller, FetchTrigger, PollerConfig};
use tracing::{debug, warn};

/// Request state of one feed.
#[derive(Debug)]
pub struct FeedState<T> {
    /// Latest successful payload; kept across failed fetches
    pub data: Option<T>,
    /// A request is in flight
    pub is_fetching: bool,
    /// Message of the latest failed fetch, cleared on success
    pub error: Option<String>,
    /// Local time of the latest successful fetch
    pub last_updated: Option<DateTime<Local>>,
}

impl<T> Default for FeedState<T> {
    fn default() -> Self {
        Self {
            data: None,
            is_fetching: false,
            error: None,
            last_updated: None,
        }
    }
}

impl<T> FeedState<T> {
    /// Nothing received yet, neither data nor an error.
    pub fn is_loading(&self) -> bool {
        self.data.is_none() && self.error.is_none()
    }

    /// The latest fetch failed.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    fn succeed(&mut self, data: T) {
        self.data = Some(data);
        self.error = None;
        self.is_fetching = false;
        self.last_updated = Some(Local::now());
    }

    fn fail(&mut self, message: String) {
        self.error = Some(message);
        self.is_fetching = false;
    }
}

/// What changed after draining feed events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataChange {
    /// A fetch started; only the fetching indicator changed
    Fetching(FeedKind),
    DashboardUpdated(FetchTrigger),
    DashboardFailed(FetchTrigger),
    UsageUpdated(FetchTrigger),
    UsageFailed(FetchTrigger),
    /// The poller went away
    Disconnected,
}

/// Feed state plus the poller producing it.
pub struct DataManager {
    events: Receiver<FeedEvent>,
    poller: Option<FeedPoller>,
    disconnected: bool,
    pub dashboard: FeedState<DashboardPayload>,
    pub usage: FeedState<UsagePayload>,
}

impl DataManager {
    /// Start polling both feeds as configured.
    pub fn new(config: &DashboardConfig) -> flowdeck_feed::Result<Self> {
        let client = FeedClient::from_config(config)?;
        let (tx, rx) = mpsc::channel();
        let poller = FeedPoller::spawn(client, PollerConfig::from_dashboard_config(config), tx)?;
        Ok(Self {
            poller: Some(poller),
            ..Self::from_receiver(rx)
        })
    }

    /// Manager fed by an arbitrary event source, without a poller.
    pub fn from_receiver(events: Receiver<FeedEvent>) -> Self {
        Self {
            events,
            poller: None,
            disconnected: false,
            dashboard: FeedState::default(),
            usage: FeedState::default(),
        }
    }

    /// Ask the poller for an immediate fetch.
    pub fn refresh(&self, kind: Option<FeedKind>) {
        let Some(poller) = &self.poller else {
            debug!("refresh requested without a poller");
            return;
        };
        if let Err(e) = poller.refresh(kind) {
            warn!(error = %e, "refresh request failed");
        }
    }

    /// Either feed has a request in flight.
    pub fn is_fetching(&self) -> bool {
        self.dashboard.is_fetching || self.usage.is_fetching
    }

    /// Drain pending feed events without blocking.
    pub fn poll_updates(&mut self) -> Vec<DataChange> {
        let mut changes = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(event) => changes.push(self.apply(event)),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.disconnected {
                        self.disconnected = true;
                        warn!("feed channel closed");
                        changes.push(DataChange::Disconnected);
                    }
                    break;
                }
            }
        }
        changes
    }

    fn apply(&mut self, event: FeedEvent) -> DataChange {
        match event {
            FeedEvent::FetchStarted { kind, .. } => {
                match kind {
                    FeedKind::Dashboard => self.dashboard.is_fetching = true,
                    FeedKind::Usage => self.usage.is_fetching = true,
                }
                DataChange::Fetching(kind)
            }
            FeedEvent::Dashboard { trigger, result } => match result {
                Ok(payload) => {
                    self.dashboard.succeed(payload);
                    DataChange::DashboardUpdated(trigger)
                }
                Err(e) => {
                    self.dashboard.fail(e.friendly_message());
                    DataChange::DashboardFailed(trigger)
                }
            },
            FeedEvent::Usage { trigger, result } => match result {
                Ok(payload) => {
                    self.usage.succeed(payload);
                    DataChange::UsageUpdated(trigger)
                }
                Err(e) => {
                    self.usage.fail(e.friendly_message());
                    DataChange::UsageFailed(trigger)
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowdeck_feed::FeedError;

    #[test]
    fn test_initial_state_is_loading() {
        let (_tx, rx) = mpsc::channel();
        let manager = DataManager::from_receiver(rx);
        assert!(manager.dashboard.is_loading());
        assert!(manager.usage.is_loading());
        assert!(!manager.is_fetching());
    }

    #[test]
    fn test_events_update_state() {
        let (tx, rx) = mpsc::channel();
        let mut manager = DataManager::from_receiver(rx);

        tx.send(FeedEvent::FetchStarted {
            kind: FeedKind::Dashboard,
            trigger: FetchTrigger::Initial,
        })
        .unwrap();
        assert_eq!(
            manager.poll_updates(),
            vec![DataChange::Fetching(FeedKind::Dashboard)]
        );
        assert!(manager.dashboard.is_fetching);

        tx.send(FeedEvent::Dashboard {
            trigger: FetchTrigger::Initial,
            result: Ok(DashboardPayload::default()),
        })
        .unwrap();
        assert_eq!(
            manager.poll_updates(),
            vec![DataChange::DashboardUpdated(FetchTrigger::Initial)]
        );
        assert!(!manager.dashboard.is_loading());
        assert!(!manager.dashboard.is_fetching);
        assert!(manager.dashboard.last_updated.is_some());
    }

    #[test]
    fn test_failure_keeps_previous_data() {
        let (tx, rx) = mpsc::channel();
        let mut manager = DataManager::from_receiver(rx);

        tx.send(FeedEvent::Usage {
            trigger: FetchTrigger::Initial,
            result: Ok(UsagePayload::default()),
        })
        .unwrap();
        tx.send(FeedEvent::Usage {
            trigger: FetchTrigger::Timer,
            result: Err(FeedError::from_http_status(502, "bad gateway")),
        })
        .unwrap();

        let changes = manager.poll_updates();
        assert_eq!(changes.last(), Some(&DataChange::UsageFailed(FetchTrigger::Timer)));
        assert!(manager.usage.is_error());
        assert!(manager.usage.data.is_some());
    }

    #[test]
    fn test_disconnect_reported_once() {
        let (tx, rx) = mpsc::channel::<FeedEvent>();
        let mut manager = DataManager::from_receiver(rx);
        drop(tx);

        assert_eq!(manager.poll_updates(), vec![DataChange::Disconnected]);
        assert!(manager.poll_updates().is_empty());
    }
}

//! Background polling of the webhook feeds.
//!
//! [`FeedPoller`] owns a dedicated thread running a single-threaded tokio
//! runtime. Each feed gets its own task that fetches once on start, then on
//! every tick of its interval and on every manual trigger. The two tasks share
//! nothing but the outbound event channel.
//!
//! ```text
//! UI thread ──FeedCommand──▶ poller thread ──┬─ dashboard task ─┐
//!     ▲                                      └─ usage task ─────┤
//!     └──────────────────────FeedEvent──────────────────────────┘
//! ```
//!
//! Shutdown aborts both tasks, so a response still in flight is dropped and
//! never reaches the UI.

use std::fmt;
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread::JoinHandle;
use std::time::Duration;

use flowdeck_core::DashboardConfig;
use flowdeck_core::types::DashboardPayload;
use flowdeck_cost::UsagePayload;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::client::FeedClient;
use crate::error::{FeedError, Result};

/// Which webhook feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedKind {
    /// Executions, workflows, instances and developer profile
    Dashboard,
    /// Token and cost usage
    Usage,
}

impl FeedKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FeedKind::Dashboard => "dashboard",
            FeedKind::Usage => "usage",
        }
    }
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What caused a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchTrigger {
    /// First fetch after the poller starts
    Initial,
    /// Interval tick
    Timer,
    /// Explicit refresh request
    Manual,
}

/// Messages from the poller to the UI.
#[derive(Debug)]
pub enum FeedEvent {
    /// A request for `kind` is in flight
    FetchStarted { kind: FeedKind, trigger: FetchTrigger },
    /// Dashboard fetch finished
    Dashboard {
        trigger: FetchTrigger,
        result: Result<DashboardPayload>,
    },
    /// Usage fetch finished
    Usage {
        trigger: FetchTrigger,
        result: Result<UsagePayload>,
    },
}

impl FeedEvent {
    pub fn kind(&self) -> FeedKind {
        match self {
            FeedEvent::FetchStarted { kind, .. } => *kind,
            FeedEvent::Dashboard { .. } => FeedKind::Dashboard,
            FeedEvent::Usage { .. } => FeedKind::Usage,
        }
    }
}

/// Messages from the UI to the poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedCommand {
    /// Fetch now; `None` refreshes both feeds
    Refresh(Option<FeedKind>),
    /// Stop all polling
    Shutdown,
}

/// Poll intervals per feed. `None` disables the timer for that feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PollerConfig {
    pub dashboard_interval: Option<Duration>,
    pub usage_interval: Option<Duration>,
}

impl PollerConfig {
    /// Both feeds on the configured refresh interval.
    pub fn from_dashboard_config(config: &DashboardConfig) -> Self {
        let interval = config.refresh_interval();
        Self {
            dashboard_interval: interval,
            usage_interval: interval,
        }
    }

    pub fn with_dashboard_interval(mut self, interval: Option<Duration>) -> Self {
        self.dashboard_interval = interval;
        self
    }
}

/// Handle to the background poller thread.
pub struct FeedPoller {
    commands: UnboundedSender<FeedCommand>,
    thread: Option<JoinHandle<()>>,
}

impl FeedPoller {
    /// Start polling; events are delivered on `events`.
    pub fn spawn(client: FeedClient, config: PollerConfig, events: Sender<FeedEvent>) -> Result<Self> {
        let (commands, command_rx) = unbounded_channel();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|_| FeedError::PollerStopped)?;

        info!(
            dashboard_interval_ms = config.dashboard_interval.map(|d| d.as_millis() as u64),
            usage_interval_ms = config.usage_interval.map(|d| d.as_millis() as u64),
            "starting feed poller"
        );

        let thread = std::thread::Builder::new()
            .name("flowdeck-poller".into())
            .spawn(move || runtime.block_on(run(Arc::new(client), config, events, command_rx)))
            .map_err(|_| FeedError::PollerStopped)?;

        Ok(Self {
            commands,
            thread: Some(thread),
        })
    }

    /// Request an immediate fetch of one feed, or both when `kind` is `None`.
    pub fn refresh(&self, kind: Option<FeedKind>) -> Result<()> {
        self.commands
            .send(FeedCommand::Refresh(kind))
            .map_err(|_| FeedError::PollerStopped)
    }

    /// Stop polling and wait for the thread to exit.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let _ = self.commands.send(FeedCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("feed poller thread panicked");
            }
        }
    }
}

impl Drop for FeedPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run(
    client: Arc<FeedClient>,
    config: PollerConfig,
    events: Sender<FeedEvent>,
    mut commands: UnboundedReceiver<FeedCommand>,
) {
    let (dashboard_tx, dashboard_rx) = unbounded_channel();
    let (usage_tx, usage_rx) = unbounded_channel();

    let dashboard = tokio::spawn(feed_loop(
        FeedKind::Dashboard,
        config.dashboard_interval,
        client.clone(),
        events.clone(),
        dashboard_rx,
    ));
    let usage = tokio::spawn(feed_loop(
        FeedKind::Usage,
        config.usage_interval,
        client,
        events,
        usage_rx,
    ));

    while let Some(command) = commands.recv().await {
        match command {
            FeedCommand::Refresh(kind) => {
                debug!(?kind, "manual refresh requested");
                if kind != Some(FeedKind::Usage) {
                    let _ = dashboard_tx.send(());
                }
                if kind != Some(FeedKind::Dashboard) {
                    let _ = usage_tx.send(());
                }
            }
            FeedCommand::Shutdown => break,
        }
    }

    dashboard.abort();
    usage.abort();
    info!("feed poller stopped");
}

async fn feed_loop(
    kind: FeedKind,
    interval: Option<Duration>,
    client: Arc<FeedClient>,
    events: Sender<FeedEvent>,
    mut triggers: UnboundedReceiver<()>,
) {
    if !fetch(kind, FetchTrigger::Initial, &client, &events).await {
        return;
    }

    let mut ticker = interval.map(|period| {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    });

    loop {
        let trigger = tokio::select! {
            _ = tick(&mut ticker) => FetchTrigger::Timer,
            received = triggers.recv() => match received {
                Some(()) => FetchTrigger::Manual,
                None => break,
            },
        };

        if !fetch(kind, trigger, &client, &events).await {
            break;
        }
    }
}

async fn tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Fetch one feed and publish the outcome. Returns false once the UI is gone.
async fn fetch(
    kind: FeedKind,
    trigger: FetchTrigger,
    client: &FeedClient,
    events: &Sender<FeedEvent>,
) -> bool {
    if events.send(FeedEvent::FetchStarted { kind, trigger }).is_err() {
        return false;
    }

    let event = match kind {
        FeedKind::Dashboard => {
            let result = client.fetch_dashboard().await;
            if let Err(e) = &result {
                warn!(feed = "dashboard", network = e.is_network_error(), error = %e, "feed fetch failed");
            }
            FeedEvent::Dashboard { trigger, result }
        }
        FeedKind::Usage => {
            let result = client.fetch_usage().await;
            if let Err(e) = &result {
                warn!(feed = "usage", network = e.is_network_error(), error = %e, "feed fetch failed");
            }
            FeedEvent::Usage { trigger, result }
        }
    };

    events.send(event).is_ok()
}

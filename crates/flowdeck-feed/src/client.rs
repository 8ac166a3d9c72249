//! HTTP client for the dashboard and usage webhooks.
//!
//! Both feeds are plain GET requests with no authentication. Any non-2xx
//! status is a failure; the body is read as text and parsed as JSON before
//! being handed to the positional decoders in [`crate::payload`].

use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use flowdeck_core::DashboardConfig;
use flowdeck_core::log_feed_event;
use flowdeck_core::types::DashboardPayload;
use flowdeck_cost::UsagePayload;

use crate::error::{FeedError, Result};
use crate::payload::{decode_dashboard, decode_usage};
use crate::poller::FeedKind;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Fetches and decodes both webhook feeds.
#[derive(Debug, Clone)]
pub struct FeedClient {
    client: reqwest::Client,
    dashboard_url: String,
    usage_url: String,
}

impl FeedClient {
    /// Create a client for the given webhook URLs.
    pub fn new(dashboard_url: impl Into<String>, usage_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            dashboard_url: dashboard_url.into(),
            usage_url: usage_url.into(),
        })
    }

    /// Create a client from the resolved dashboard configuration.
    pub fn from_config(config: &DashboardConfig) -> Result<Self> {
        Self::new(
            config.dashboard_webhook_url.clone(),
            config.token_usage_webhook_url.clone(),
        )
    }

    /// Fetch executions, workflows, instances and the developer profile.
    pub async fn fetch_dashboard(&self) -> Result<DashboardPayload> {
        let value = self.get_json(FeedKind::Dashboard, &self.dashboard_url).await?;
        let payload = decode_dashboard(&value);
        log_feed_event!(
            "dashboard",
            "fetched",
            executions = payload.executions.len(),
            workflows = payload.workflows.len(),
            instances = payload.instances.len()
        );
        Ok(payload)
    }

    /// Fetch token and cost usage.
    pub async fn fetch_usage(&self) -> Result<UsagePayload> {
        let value = self.get_json(FeedKind::Usage, &self.usage_url).await?;
        let payload = decode_usage(&value);
        log_feed_event!(
            "usage",
            "fetched",
            token_rows = payload.tokens.len(),
            cost_rows = payload.costs.len()
        );
        Ok(payload)
    }

    async fn get_json(&self, feed: FeedKind, url: &str) -> Result<Value> {
        if url.trim().is_empty() {
            return Err(FeedError::NotConfigured { feed });
        }

        debug!(%feed, url, "requesting feed");
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FeedError::from_http_status(status.as_u16(), &body));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|source| FeedError::Decode { feed, source })
    }
}

//! Decoding of the two webhook payloads.
//!
//! Both feeds are positional JSON arrays of single-purpose objects:
//!
//! - dashboard: `[{execs}, {workflows}, {instances, total}, {dados_dev}]`
//! - usage: `[{relatorio_tokens_raw, total_dias_processados},
//!   {relatorio_custos_raw, custo_total_geral, total_dias_processados},
//!   {mapeamento_projetos}]`
//!
//! Missing elements or keys decode to empty defaults. Individual list items
//! that cannot be decoded are skipped with a warning rather than failing the
//! whole payload.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use flowdeck_core::types::{DashboardPayload, DevProfile};
use flowdeck_cost::models::{ProjectMapping, UsagePayload, lenient_number};

/// Decode the dashboard feed.
pub fn decode_dashboard(value: &Value) -> DashboardPayload {
    let parts = elements(value, "dashboard");

    DashboardPayload {
        executions: list_field(parts.first(), "execs"),
        workflows: list_field(parts.get(1), "workflows"),
        instances: list_field(parts.get(2), "instances"),
        total_instances: number_field(parts.get(2), "total")
            .filter(|n| n.is_finite() && *n >= 0.0)
            .map(|n| n as u64)
            .unwrap_or(0),
        dev_profile: object_field::<DevProfile>(parts.get(3), "dados_dev").unwrap_or_default(),
    }
}

/// Decode the usage feed.
pub fn decode_usage(value: &Value) -> UsagePayload {
    let parts = elements(value, "usage");

    UsagePayload {
        tokens: list_field(parts.first(), "relatorio_tokens_raw"),
        costs: list_field(parts.get(1), "relatorio_custos_raw"),
        projects: object_field::<ProjectMapping>(parts.get(2), "mapeamento_projetos")
            .unwrap_or_default(),
        days_processed: number_field(parts.first(), "total_dias_processados")
            .or_else(|| number_field(parts.get(1), "total_dias_processados"))
            .filter(|n| n.is_finite() && *n >= 0.0)
            .map(|n| n as u64)
            .unwrap_or(0),
        reported_total_cost_usd: number_field(parts.get(1), "custo_total_geral").unwrap_or(0.0),
    }
}

fn elements<'a>(value: &'a Value, feed: &str) -> &'a [Value] {
    match value.as_array() {
        Some(items) => items.as_slice(),
        None => {
            warn!(feed, "feed payload is not an array; using empty data");
            &[]
        }
    }
}

fn list_field<T: DeserializeOwned>(element: Option<&Value>, key: &str) -> Vec<T> {
    let Some(items) = element.and_then(|e| e.get(key)).and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(idx, item)| match serde_json::from_value(item.clone()) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!(key, index = idx, error = %e, "skipping undecodable feed item");
                None
            }
        })
        .collect()
}

fn object_field<T: DeserializeOwned>(element: Option<&Value>, key: &str) -> Option<T> {
    let raw = element?.get(key)?;
    match serde_json::from_value(raw.clone()) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            warn!(key, error = %e, "ignoring undecodable feed object");
            None
        }
    }
}

fn number_field(element: Option<&Value>, key: &str) -> Option<f64> {
    element?.get(key).cloned().and_then(lenient_number)
}

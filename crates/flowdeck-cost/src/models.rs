//! Data models for token and cost usage.
//!
//! Field names on the wire are Portuguese (`data`, `id_projeto`, ...); the
//! Rust side uses English names and renames through serde. Numeric fields
//! accept JSON numbers or numeric strings, since the feed is assembled from
//! SQL aggregates that are not always typed consistently.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Tokens consumed by one project on one day.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenUsageRecord {
    /// Day of usage (`YYYY-MM-DD` or a full timestamp)
    #[serde(rename = "data")]
    pub date: String,

    /// Project identifier
    #[serde(rename = "id_projeto")]
    pub project_id: String,

    /// Prompt tokens
    #[serde(rename = "tokens_input", deserialize_with = "lenient_u64")]
    pub input_tokens: u64,

    /// Completion tokens
    #[serde(rename = "tokens_output", deserialize_with = "lenient_u64")]
    pub output_tokens: u64,

    /// Total tokens for the day
    #[serde(rename = "tokens_total_dia", deserialize_with = "lenient_u64")]
    pub total_tokens: u64,
}

impl TokenUsageRecord {
    /// Create a record with input/output split; the total is their sum.
    pub fn new(
        date: impl Into<String>,
        project_id: impl Into<String>,
        input_tokens: u64,
        output_tokens: u64,
    ) -> Self {
        Self {
            date: date.into(),
            project_id: project_id.into(),
            input_tokens,
            output_tokens,
            total_tokens: input_tokens.saturating_add(output_tokens),
        }
    }
}

/// Money spent by one project on one day.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CostRecord {
    /// Day of usage
    #[serde(rename = "data")]
    pub date: String,

    /// Project identifier
    #[serde(rename = "id_projeto")]
    pub project_id: String,

    /// Amount spent in USD
    #[serde(rename = "valor_gasto_usd", deserialize_with = "lenient_f64")]
    pub cost_usd: f64,
}

impl CostRecord {
    pub fn new(date: impl Into<String>, project_id: impl Into<String>, cost_usd: f64) -> Self {
        Self {
            date: date.into(),
            project_id: project_id.into(),
            cost_usd,
        }
    }
}

/// Project display names keyed by name, as the feed sends them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectMapping(pub HashMap<String, String>);

impl ProjectMapping {
    /// Invert `name -> id` into `id -> name`.
    pub fn names_by_id(&self) -> HashMap<String, String> {
        self.0
            .iter()
            .map(|(name, id)| (id.clone(), name.clone()))
            .collect()
    }
}

impl<const N: usize> From<[(&str, &str); N]> for ProjectMapping {
    fn from(pairs: [(&str, &str); N]) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(name, id)| (name.to_string(), id.to_string()))
                .collect(),
        )
    }
}

/// Parsed usage feed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UsagePayload {
    pub tokens: Vec<TokenUsageRecord>,
    pub costs: Vec<CostRecord>,
    pub projects: ProjectMapping,
    /// Days the upstream report says it processed
    pub days_processed: u64,
    /// Upstream all-time cost total in USD
    pub reported_total_cost_usd: f64,
}

fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Ok(lenient_number(serde_json::Value::deserialize(deserializer)?)
        .filter(|n| n.is_finite() && *n >= 0.0)
        .map(|n| n as u64)
        .unwrap_or(0))
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(lenient_number(serde_json::Value::deserialize(deserializer)?).unwrap_or(0.0))
}

/// Number from a JSON number or numeric string.
pub fn lenient_number(value: serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_token_record_wire_names() {
        let record: TokenUsageRecord = serde_json::from_value(json!({
            "data": "2025-03-01",
            "id_projeto": "proj_abc123",
            "tokens_input": 1200,
            "tokens_output": "300",
            "tokens_total_dia": 1500
        }))
        .unwrap();

        assert_eq!(record.project_id, "proj_abc123");
        assert_eq!(record.output_tokens, 300);
        assert_eq!(record.total_tokens, 1500);
    }

    #[test]
    fn test_cost_record_string_amount() {
        let record: CostRecord = serde_json::from_value(json!({
            "data": "2025-03-01",
            "id_projeto": "p1",
            "valor_gasto_usd": "0.42"
        }))
        .unwrap();
        assert!((record.cost_usd - 0.42).abs() < 1e-9);
    }

    #[test]
    fn test_project_mapping_inverts() {
        let mapping = ProjectMapping::from([("Support bot", "p1"), ("Sales", "p2")]);
        let names = mapping.names_by_id();
        assert_eq!(names.get("p1").map(String::as_str), Some("Support bot"));
        assert_eq!(names.get("p2").map(String::as_str), Some("Sales"));
    }
}

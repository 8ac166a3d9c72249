//! Feed data model shared across flowdeck crates.
//!
//! Everything here is produced by the remote webhooks and treated as
//! read-only. Decoding is deliberately forgiving: ids may be strings or
//! numbers, optional sections that fail to decode are dropped, and
//! timestamps are kept as the raw strings the server sent and parsed on use.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};

/// Text shown where a timestamp could not be parsed.
pub const INVALID_DATE: &str = "Invalid Date";

/// Terminal status of a workflow execution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(into = "String")]
pub enum ExecutionStatus {
    Success,
    Error,
    /// Any other status string the server reports (running, waiting, canceled, ...)
    Other(String),
    #[default]
    Unknown,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Other(s) => s.as_str(),
            Self::Unknown => "unknown",
        }
    }
}

impl From<&str> for ExecutionStatus {
    fn from(s: &str) -> Self {
        match s {
            "success" => Self::Success,
            "error" => Self::Error,
            "" => Self::Unknown,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<ExecutionStatus> for String {
    fn from(status: ExecutionStatus) -> Self {
        status.as_str().to_string()
    }
}

impl<'de> Deserialize<'de> for ExecutionStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(ExecutionStatus::from).unwrap_or_default())
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One run of a workflow.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Execution {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "lenient_bool")]
    pub finished: bool,
    pub status: ExecutionStatus,
    #[serde(deserialize_with = "lenient")]
    pub started_at: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub stopped_at: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub workflow_id: String,
}

impl Execution {
    pub fn is_error(&self) -> bool {
        self.status == ExecutionStatus::Error
    }

    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Success
    }

    pub fn started_at_time(&self) -> Option<DateTime<Utc>> {
        self.started_at.as_deref().and_then(parse_timestamp)
    }

    pub fn stopped_at_time(&self) -> Option<DateTime<Utc>> {
        self.stopped_at.as_deref().and_then(parse_timestamp)
    }

    /// Wall time between start and stop, when both parse.
    pub fn duration(&self) -> Option<chrono::TimeDelta> {
        Some(self.stopped_at_time()? - self.started_at_time()?)
    }
}

/// Workflow tag.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tag {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
}

/// A defined automation pipeline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Workflow {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(deserialize_with = "lenient")]
    pub updated_at: Option<String>,
    #[serde(deserialize_with = "lenient_vec")]
    pub tags: Vec<Tag>,
}

/// Message counters reported by the messaging instance manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceCounts {
    pub messages: u64,
    pub contacts: u64,
    pub chats: u64,
}

/// RabbitMQ event forwarding settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RabbitMqSettings {
    pub enabled: bool,
    pub events: Vec<String>,
    pub updated_at: Option<String>,
}

/// Behavior settings of a messaging instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InstanceSettings {
    pub groups_ignore: bool,
    pub always_online: bool,
    pub read_messages: bool,
    pub read_status: bool,
}

/// A connected messaging account being monitored.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Instance {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(deserialize_with = "lenient")]
    pub profile_name: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub number: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub owner_jid: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub token: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub created_at: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub updated_at: Option<String>,
    pub connection_status: String,
    #[serde(deserialize_with = "lenient")]
    pub disconnection_reason_code: Option<i64>,
    pub disconnection_object: Option<serde_json::Value>,
    #[serde(deserialize_with = "lenient")]
    pub disconnection_at: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub counts: Option<InstanceCounts>,
    #[serde(deserialize_with = "lenient")]
    pub has_chatwoot: Option<bool>,
    #[serde(deserialize_with = "lenient")]
    pub rabbitmq: Option<RabbitMqSettings>,
    #[serde(deserialize_with = "lenient")]
    pub settings: Option<InstanceSettings>,
    #[serde(deserialize_with = "lenient")]
    pub profile_pic_url: Option<String>,
}

impl Instance {
    pub fn is_connected(&self) -> bool {
        self.connection_status == "open"
    }

    /// Diagnostic text nested at `error.output.payload.message`, if present.
    pub fn diagnostic_message(&self) -> Option<&str> {
        self.disconnection_object
            .as_ref()?
            .pointer("/error/output/payload/message")?
            .as_str()
    }
}

/// Profile of the developer/company operating the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DevProfile {
    #[serde(rename = "empresa", deserialize_with = "lenient_string")]
    pub company: String,
    #[serde(rename = "nome", deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub whatsapp: String,
    /// Base URL of the n8n editor, used for deep links
    #[serde(rename = "n8nurl", deserialize_with = "lenient_string")]
    pub n8n_url: String,
    #[serde(deserialize_with = "lenient_string")]
    pub instagram: String,
    #[serde(deserialize_with = "lenient_string")]
    pub site: String,
}

/// Parsed dashboard feed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DashboardPayload {
    /// Executions, newest first
    pub executions: Vec<Execution>,
    pub workflows: Vec<Workflow>,
    pub instances: Vec<Instance>,
    /// Total instance count reported by the manager
    pub total_instances: u64,
    pub dev_profile: DevProfile,
}

impl DashboardPayload {
    /// Workflow display name, falling back to `fallback` when unknown or unnamed.
    pub fn workflow_name<'a>(&'a self, workflow_id: &str, fallback: &'a str) -> &'a str {
        self.workflows
            .iter()
            .find(|w| w.id == workflow_id)
            .map(|w| w.name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or(fallback)
    }

    pub fn connected_instances(&self) -> usize {
        self.instances.iter().filter(|i| i.is_connected()).count()
    }

    /// Deep link for one execution.
    pub fn execution_link(&self, execution: &Execution) -> String {
        execution_link(&self.dev_profile.n8n_url, &execution.workflow_id, &execution.id)
    }
}

/// `<base>/workflow/<workflow_id>/executions/<execution_id>`
pub fn execution_link(base_url: &str, workflow_id: &str, execution_id: &str) -> String {
    format!(
        "{}/workflow/{}/executions/{}",
        base_url.trim_end_matches('/'),
        workflow_id,
        execution_id
    )
}

/// Parse the timestamp shapes the feeds produce.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS[.fff]` (UTC), and bare dates
/// (local midnight).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    Local
        .from_local_datetime(&date.and_hms_opt(0, 0, 0)?)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Format a raw timestamp in local time, or [`INVALID_DATE`].
pub fn format_local(raw: &str, fmt: &str) -> String {
    match parse_timestamp(raw) {
        Some(dt) => dt.with_timezone(&Local).format(fmt).to_string(),
        None => INVALID_DATE.to_string(),
    }
}

// -----------------------------------------------------------------------------
// Lenient deserializers
// -----------------------------------------------------------------------------

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_bool().unwrap_or(false))
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

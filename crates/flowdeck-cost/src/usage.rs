//! Usage roll-up by project over a date range.
//!
//! The token and cost series are filtered independently by the inclusive
//! range and accumulated into one record per project, in order of first
//! appearance (token rows first). Day counts come from the token series:
//! a project with only cost rows reports zero days.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, UsageError};
use crate::models::{CostRecord, TokenUsageRecord};

/// Days covered by the default range, counted back from today.
pub const DEFAULT_RANGE_DAYS: i64 = 30;

/// Characters of the project id shown when no display name is known.
const FALLBACK_NAME_LEN: usize = 8;

/// Inclusive range of local calendar days.
///
/// Equivalent to `[start 00:00:00.000, end 23:59:59.999]` in local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Create a range, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(UsageError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// The 30 days before `today` through `today`.
    pub fn last_30_days(today: NaiveDate) -> Self {
        let start = today
            .checked_sub_signed(TimeDelta::days(DEFAULT_RANGE_DAYS))
            .unwrap_or(NaiveDate::MIN);
        Self { start, end: today }
    }

    /// Default range ending at the local current date.
    pub fn ending_today() -> Self {
        Self::last_30_days(Local::now().date_naive())
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of calendar days covered.
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Move the start by `days`, keeping `start <= end`.
    pub fn shift_start(self, days: i64) -> Result<Self> {
        Self::new(shift(self.start, days), self.end)
    }

    /// Move the end by `days`, keeping `start <= end`.
    pub fn shift_end(self, days: i64) -> Result<Self> {
        Self::new(self.start, shift(self.end, days))
    }

    /// Whether a record date falls inside the range.
    ///
    /// Unparseable dates are never inside any range.
    pub fn contains(&self, raw_date: &str) -> bool {
        parse_record_day(raw_date).is_some_and(|day| self.contains_day(day))
    }

    pub fn contains_day(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}

fn shift(date: NaiveDate, days: i64) -> NaiveDate {
    date.checked_add_signed(TimeDelta::days(days)).unwrap_or(date)
}

/// Local calendar day of a record date.
///
/// Accepts `YYYY-MM-DD` (taken as local midnight) or a timestamp, which is
/// converted to local time first.
pub fn parse_record_day(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(day);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Local).date_naive());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc().with_timezone(&Local).date_naive())
}

/// Totals for one project.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ProjectUsage {
    pub id: String,
    pub name: String,
    pub tokens: u64,
    pub input: u64,
    pub output: u64,
    pub cost_usd: f64,
    /// Distinct raw date strings seen in token rows
    pub days: BTreeSet<String>,
}

impl ProjectUsage {
    fn empty(id: &str, names: &HashMap<String, String>) -> Self {
        let name = names
            .get(id)
            .filter(|name| !name.is_empty())
            .cloned()
            .unwrap_or_else(|| id.chars().take(FALLBACK_NAME_LEN).collect());
        Self {
            id: id.to_string(),
            name,
            ..Default::default()
        }
    }

    pub fn day_count(&self) -> usize {
        self.days.len()
    }
}

/// Grand totals across every project.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct UsageTotals {
    pub tokens: u64,
    pub cost_usd: f64,
    pub input: u64,
    pub output: u64,
    /// Size of the union of every project's day-set
    pub days: usize,
}

/// Result of [`aggregate`].
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct UsageSummary {
    /// Projects in order of first appearance
    pub projects: Vec<ProjectUsage>,
    pub totals: UsageTotals,
}

impl UsageSummary {
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

/// Insertion-ordered project accumulator.
#[derive(Default)]
struct ProjectTable {
    rows: Vec<ProjectUsage>,
    index: HashMap<String, usize>,
}

impl ProjectTable {
    fn entry(&mut self, id: &str, names: &HashMap<String, String>) -> &mut ProjectUsage {
        let idx = match self.index.get(id) {
            Some(&idx) => idx,
            None => {
                self.rows.push(ProjectUsage::empty(id, names));
                self.index.insert(id.to_string(), self.rows.len() - 1);
                self.rows.len() - 1
            }
        };
        &mut self.rows[idx]
    }
}

/// Roll up token and cost rows by project within `range`.
///
/// `names` maps project id to display name (see
/// [`ProjectMapping::names_by_id`](crate::models::ProjectMapping::names_by_id)).
pub fn aggregate(
    tokens: &[TokenUsageRecord],
    costs: &[CostRecord],
    names: &HashMap<String, String>,
    range: &DateRange,
) -> UsageSummary {
    let mut table = ProjectTable::default();

    for row in tokens.iter().filter(|t| range.contains(&t.date)) {
        let project = table.entry(&row.project_id, names);
        project.tokens = project.tokens.saturating_add(row.total_tokens);
        project.input = project.input.saturating_add(row.input_tokens);
        project.output = project.output.saturating_add(row.output_tokens);
        project.days.insert(row.date.clone());
    }

    for row in costs.iter().filter(|c| range.contains(&c.date)) {
        table.entry(&row.project_id, names).cost_usd += row.cost_usd;
    }

    let projects = table.rows;
    let mut all_days = BTreeSet::new();
    let mut totals = UsageTotals::default();
    for project in &projects {
        totals.tokens = totals.tokens.saturating_add(project.tokens);
        totals.cost_usd += project.cost_usd;
        totals.input = totals.input.saturating_add(project.input);
        totals.output = totals.output.saturating_add(project.output);
        all_days.extend(project.days.iter().cloned());
    }
    totals.days = all_days.len();

    debug!(
        start = %range.start(),
        end = %range.end(),
        projects = projects.len(),
        days = totals.days,
        "aggregated usage"
    );

    UsageSummary { projects, totals }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn range(start: &str, end: &str) -> DateRange {
        DateRange::new(day(start), day(end)).unwrap()
    }

    fn sample_tokens() -> Vec<TokenUsageRecord> {
        vec![
            TokenUsageRecord::new("2025-03-01", "proj-alpha-001", 1000, 500),
            TokenUsageRecord::new("2025-03-02", "proj-alpha-001", 2000, 100),
            TokenUsageRecord::new("2025-03-02", "proj-beta-0002", 300, 300),
            TokenUsageRecord::new("2025-03-05", "proj-beta-0002", 50, 50),
        ]
    }

    fn sample_costs() -> Vec<CostRecord> {
        vec![
            CostRecord::new("2025-03-01", "proj-alpha-001", 1.25),
            CostRecord::new("2025-03-02", "proj-beta-0002", 0.50),
            CostRecord::new("2025-03-03", "proj-gamma-003", 2.00),
        ]
    }

    #[test]
    fn test_rejects_inverted_range() {
        let err = DateRange::new(day("2025-03-05"), day("2025-03-01")).unwrap_err();
        assert!(matches!(err, UsageError::InvalidRange { .. }));
        assert!(err.friendly_message().contains("05/03/2025"));
    }

    #[test]
    fn test_last_30_days() {
        let r = DateRange::last_30_days(day("2025-03-31"));
        assert_eq!(r.start(), day("2025-03-01"));
        assert_eq!(r.len_days(), 31);
    }

    #[test]
    fn test_range_bounds_inclusive() {
        let r = range("2025-03-01", "2025-03-02");
        assert!(r.contains("2025-03-01"));
        assert!(r.contains("2025-03-02"));
        assert!(!r.contains("2025-03-03"));
        assert!(!r.contains("not a date"));
    }

    #[test]
    fn test_shift_keeps_order() {
        let r = range("2025-03-01", "2025-03-02");
        assert!(r.shift_start(2).is_err());
        assert_eq!(r.shift_start(-1).unwrap().start(), day("2025-02-28"));
        assert_eq!(r.shift_end(1).unwrap().end(), day("2025-03-03"));
    }

    #[test]
    fn test_aggregate_by_project() {
        let names = HashMap::from([("proj-alpha-001".to_string(), "Support bot".to_string())]);
        let summary = aggregate(
            &sample_tokens(),
            &sample_costs(),
            &names,
            &range("2025-03-01", "2025-03-31"),
        );

        assert_eq!(summary.projects.len(), 3);
        let alpha = &summary.projects[0];
        assert_eq!(alpha.name, "Support bot");
        assert_eq!(alpha.tokens, 3600);
        assert_eq!(alpha.input, 3000);
        assert_eq!(alpha.output, 600);
        assert!((alpha.cost_usd - 1.25).abs() < 1e-9);
        assert_eq!(alpha.day_count(), 2);

        assert_eq!(summary.projects[1].name, "proj-bet");
        assert_eq!(summary.totals.tokens, 4300);
        assert_eq!(summary.totals.days, 3);
        assert!((summary.totals.cost_usd - 3.75).abs() < 1e-9);
    }

    #[test]
    fn test_huge_token_counts_saturate() {
        let tokens = vec![
            TokenUsageRecord::new("2025-03-01", "proj-alpha-001", u64::MAX, 1),
            TokenUsageRecord::new("2025-03-02", "proj-alpha-001", u64::MAX, 0),
            TokenUsageRecord::new("2025-03-02", "proj-beta-0002", 10, 10),
        ];
        let summary = aggregate(&tokens, &[], &HashMap::new(), &range("2025-03-01", "2025-03-31"));

        assert_eq!(tokens[0].total_tokens, u64::MAX);
        assert_eq!(summary.projects[0].tokens, u64::MAX);
        assert_eq!(summary.projects[0].input, u64::MAX);
        assert_eq!(summary.projects[0].output, 1);
        assert_eq!(summary.totals.tokens, u64::MAX);
        assert_eq!(summary.totals.input, u64::MAX);
        assert_eq!(summary.totals.output, 11);
    }

    #[test]
    fn test_cost_only_project_has_zero_tokens() {
        let summary = aggregate(
            &sample_tokens(),
            &sample_costs(),
            &HashMap::new(),
            &range("2025-03-01", "2025-03-31"),
        );

        let gamma = summary
            .projects
            .iter()
            .find(|p| p.id == "proj-gamma-003")
            .unwrap();
        assert_eq!(gamma.tokens, 0);
        assert_eq!(gamma.day_count(), 0);
        assert!((gamma.cost_usd - 2.0).abs() < 1e-9);
        // token pass runs first, so the cost-only project comes last
        assert_eq!(summary.projects.last().unwrap().id, "proj-gamma-003");
    }

    #[test]
    fn test_range_split_is_additive() {
        let tokens = sample_tokens();
        let costs = sample_costs();
        let names = HashMap::new();

        let whole = aggregate(&tokens, &costs, &names, &range("2025-03-01", "2025-03-05"));
        let left = aggregate(&tokens, &costs, &names, &range("2025-03-01", "2025-03-02"));
        let right = aggregate(&tokens, &costs, &names, &range("2025-03-03", "2025-03-05"));

        assert_eq!(whole.totals.tokens, left.totals.tokens + right.totals.tokens);
        assert_eq!(whole.totals.input, left.totals.input + right.totals.input);
        assert!(
            (whole.totals.cost_usd - (left.totals.cost_usd + right.totals.cost_usd)).abs() < 1e-9
        );

        let mut union: BTreeSet<String> = BTreeSet::new();
        for p in left.projects.iter().chain(right.projects.iter()) {
            union.extend(p.days.iter().cloned());
        }
        assert_eq!(whole.totals.days, union.len());
    }

    #[test]
    fn test_empty_range_result() {
        let summary = aggregate(
            &sample_tokens(),
            &sample_costs(),
            &HashMap::new(),
            &range("2024-01-01", "2024-01-31"),
        );
        assert!(summary.is_empty());
        assert_eq!(summary.totals, UsageTotals::default());
    }

    #[test]
    fn test_parse_record_day_timestamp() {
        assert!(parse_record_day("2025-03-01T12:00:00Z").is_some());
        assert_eq!(parse_record_day("2025-03-01"), Some(day("2025-03-01")));
        assert_eq!(parse_record_day(""), None);
    }
}

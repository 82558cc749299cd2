use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

/// One assignment row after normalization. When skill expansion is enabled
/// a single source row produces one record per skill tag.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentRecord {
    pub consultant: String,
    pub project: String,
    pub skill: Option<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub effort: f64,
}

/// The part of one assignment that falls inside one calendar week.
#[derive(Debug, Clone)]
pub struct WeekSegment {
    pub consultant: String,
    pub project: String,
    pub skill: Option<String>,
    /// Monday of the week this segment belongs to.
    pub week_start: NaiveDate,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub effort: f64,
}

/// One output row for the timeline renderer: all segments sharing the
/// (consultant, week, period, skill) key, effort summed and project names
/// merged into a single sorted label.
#[derive(Debug, Clone, Serialize)]
pub struct AggregatedSegment {
    pub consultant: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skill: Option<String>,
    pub week_start: NaiveDate,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub effort_total: f64,
    pub projects_label: String,
}

/// Per-consultant totals used by the markdown report.
#[derive(Debug, Clone)]
pub struct ConsultantSummary {
    pub consultant: String,
    pub week_count: usize,
    pub effort_total: f64,
    pub peak_week: NaiveDate,
    pub peak_effort: f64,
}

/// Per-week totals used by the markdown report.
#[derive(Debug, Clone)]
pub struct WeekSummary {
    pub week_start: NaiveDate,
    pub segment_count: usize,
    pub consultant_count: usize,
    pub effort_total: f64,
}

#[derive(Debug, Clone)]
pub struct ProjectSummary {
    pub project: String,
    pub segment_count: usize,
}

/// Declarative filter selection produced by the boundary layer.
///
/// An empty consultant or skill set means "nothing selected" and yields an
/// empty result; it is not the same as "no filter". A `skills` of `None`
/// disables skill filtering entirely.
#[derive(Debug, Clone)]
pub struct FilterSpec {
    /// Inclusive date window applied to `period_start` / `period_end`.
    pub window: (NaiveDate, NaiveDate),
    pub consultants: BTreeSet<String>,
    pub skills: Option<BTreeSet<String>>,
}

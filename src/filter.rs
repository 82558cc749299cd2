use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::models::{AggregatedSegment, FilterSpec};

/// Apply a filter spec to the aggregated rows. Pure subset selection; the
/// input is never mutated or truncated, only included or excluded.
pub fn apply_filter(rows: &[AggregatedSegment], spec: &FilterSpec) -> Vec<AggregatedSegment> {
    rows.iter()
        .filter(|row| matches(row, spec))
        .cloned()
        .collect()
}

fn matches(row: &AggregatedSegment, spec: &FilterSpec) -> bool {
    let (from, to) = spec.window;
    if row.period_start < from || row.period_end > to {
        return false;
    }
    if !spec.consultants.contains(&row.consultant) {
        return false;
    }
    match (&spec.skills, &row.skill) {
        (None, _) => true,
        (Some(selected), Some(skill)) => selected.contains(skill),
        // A skill-less row can never match an active skill selection.
        (Some(_), None) => false,
    }
}

/// Widest window covered by the rows: (min period_start, max period_end).
pub fn full_window(rows: &[AggregatedSegment]) -> Option<(NaiveDate, NaiveDate)> {
    let from = rows.iter().map(|row| row.period_start).min()?;
    let to = rows.iter().map(|row| row.period_end).max()?;
    Some((from, to))
}

/// Every consultant present in the rows, sorted.
pub fn consultant_universe(rows: &[AggregatedSegment]) -> BTreeSet<String> {
    rows.iter().map(|row| row.consultant.clone()).collect()
}

/// Every skill present in the rows, sorted. Skill-less rows contribute
/// nothing.
pub fn skill_universe(rows: &[AggregatedSegment]) -> BTreeSet<String> {
    rows.iter().filter_map(|row| row.skill.clone()).collect()
}

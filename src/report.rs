use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Write;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{AggregatedSegment, ConsultantSummary, ProjectSummary, WeekSummary};
use crate::segment::SegmentMode;

pub fn summarize_by_consultant(rows: &[AggregatedSegment]) -> Vec<ConsultantSummary> {
    let mut weekly: HashMap<String, BTreeMap<NaiveDate, f64>> = HashMap::new();

    for row in rows {
        *weekly
            .entry(row.consultant.clone())
            .or_default()
            .entry(row.week_start)
            .or_insert(0.0) += row.effort_total;
    }

    let mut summaries: Vec<ConsultantSummary> = weekly
        .into_iter()
        .map(|(consultant, weeks)| {
            let effort_total = weeks.values().sum();
            let (peak_week, peak_effort) = weeks
                .iter()
                .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
                .map(|(week, effort)| (*week, *effort))
                .unwrap_or_default();
            ConsultantSummary {
                consultant,
                week_count: weeks.len(),
                effort_total,
                peak_week,
                peak_effort,
            }
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.effort_total
            .partial_cmp(&a.effort_total)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.consultant.cmp(&b.consultant))
    });
    summaries
}

pub fn summarize_by_week(rows: &[AggregatedSegment]) -> Vec<WeekSummary> {
    let mut weeks: BTreeMap<NaiveDate, (usize, BTreeSet<&str>, f64)> = BTreeMap::new();

    for row in rows {
        let entry = weeks
            .entry(row.week_start)
            .or_insert_with(|| (0, BTreeSet::new(), 0.0));
        entry.0 += 1;
        entry.1.insert(row.consultant.as_str());
        entry.2 += row.effort_total;
    }

    weeks
        .into_iter()
        .map(|(week_start, (segment_count, consultants, effort_total))| WeekSummary {
            week_start,
            segment_count,
            consultant_count: consultants.len(),
            effort_total,
        })
        .collect()
}

/// How often each project name appears across the weekly rows. A merged
/// label counts once for every project it names.
pub fn summarize_by_project(rows: &[AggregatedSegment]) -> Vec<ProjectSummary> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();

    for row in rows {
        for project in row.projects_label.split(", ") {
            if !project.is_empty() {
                *counts.entry(project.to_string()).or_insert(0) += 1;
            }
        }
    }

    let mut summaries: Vec<ProjectSummary> = counts
        .into_iter()
        .map(|(project, segment_count)| ProjectSummary {
            project,
            segment_count,
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.segment_count
            .cmp(&a.segment_count)
            .then_with(|| a.project.cmp(&b.project))
    });
    summaries
}

pub fn build_report(
    window: (NaiveDate, NaiveDate),
    mode: SegmentMode,
    rows: &[AggregatedSegment],
) -> String {
    let consultants = summarize_by_consultant(rows);
    let projects = summarize_by_project(rows);

    let mut output = String::new();

    let _ = writeln!(output, "# Weekly Effort Report");
    let _ = writeln!(
        output,
        "Covering {} to {} ({} weeks)",
        window.0,
        window.1,
        mode.label()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Consultant Load");

    if consultants.is_empty() {
        let _ = writeln!(output, "No consultants in the filtered result.");
    } else {
        for summary in consultants.iter() {
            let _ = writeln!(
                output,
                "- {}: {:.1}% across {} week(s), peak {:.1}% in week of {}",
                summary.consultant,
                summary.effort_total,
                summary.week_count,
                summary.peak_effort,
                summary.peak_week
            );
        }
    }

    let mut busiest = summarize_by_week(rows);
    busiest.sort_by(|a, b| {
        b.effort_total
            .partial_cmp(&a.effort_total)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let _ = writeln!(output);
    let _ = writeln!(output, "## Busiest Weeks");

    if busiest.is_empty() {
        let _ = writeln!(output, "No weekly segments in this window.");
    } else {
        for week in busiest.iter().take(5) {
            let _ = writeln!(
                output,
                "- Week of {}: {:.1}% total across {} consultant(s), {} segment(s)",
                week.week_start, week.effort_total, week.consultant_count, week.segment_count
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Project Mix");

    if projects.is_empty() {
        let _ = writeln!(output, "No projects in the filtered result.");
    } else {
        for summary in projects.iter() {
            let _ = writeln!(
                output,
                "- {}: {} weekly segment(s)",
                summary.project, summary.segment_count
            );
        }
    }

    output
}

/// Everything the external timeline renderer consumes: one bar per row,
/// weekly gridline dates, and the caller-supplied today marker.
#[derive(Debug, Serialize)]
pub struct ChartPayload {
    pub today: NaiveDate,
    pub week_marks: Vec<NaiveDate>,
    pub rows: Vec<AggregatedSegment>,
}

pub fn chart_payload(rows: Vec<AggregatedSegment>, today: NaiveDate) -> ChartPayload {
    let week_marks: Vec<NaiveDate> = rows
        .iter()
        .map(|row| row.week_start)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    ChartPayload {
        today,
        week_marks,
        rows,
    }
}

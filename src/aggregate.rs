use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;

use crate::models::{AggregatedSegment, WeekSegment};

type GroupKey = (String, NaiveDate, NaiveDate, NaiveDate, Option<String>);

/// Merge segments sharing a (consultant, week, period, skill) key.
///
/// Effort values add; two projects active the same consultant-week sum, they
/// never overwrite each other. Skill-unaware runs carry `None` in every key,
/// which collapses to the skill-less grouping.
pub fn aggregate(segments: Vec<WeekSegment>) -> Vec<AggregatedSegment> {
    let mut groups: HashMap<GroupKey, (f64, BTreeSet<String>)> = HashMap::new();

    for segment in segments {
        let key = (
            segment.consultant,
            segment.week_start,
            segment.period_start,
            segment.period_end,
            segment.skill,
        );
        let entry = groups.entry(key).or_insert_with(|| (0.0, BTreeSet::new()));
        entry.0 += segment.effort;
        entry.1.insert(segment.project);
    }

    let mut rows: Vec<AggregatedSegment> = groups
        .into_iter()
        .map(|(key, (effort_total, projects))| {
            let (consultant, week_start, period_start, period_end, skill) = key;
            AggregatedSegment {
                consultant,
                skill,
                week_start,
                period_start,
                period_end,
                effort_total,
                // BTreeSet iteration is sorted, so the label never depends on
                // input or hash order.
                projects_label: projects.into_iter().collect::<Vec<_>>().join(", "),
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        (&a.consultant, a.week_start, a.period_start, &a.skill)
            .cmp(&(&b.consultant, b.week_start, b.period_start, &b.skill))
    });
    rows
}

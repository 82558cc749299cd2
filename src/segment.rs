use chrono::{Datelike, Duration, NaiveDate};
use clap::ValueEnum;

use crate::models::{AssignmentRecord, WeekSegment};

/// Week segmentation policy. The two policies are distinct outputs and are
/// never mixed within one run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SegmentMode {
    /// The first and last week are clipped to the record's true range.
    Clipped,
    /// Every touched week spans its full Monday..Sunday range.
    FullWeek,
}

impl SegmentMode {
    pub fn label(&self) -> &'static str {
        match self {
            SegmentMode::Clipped => "clipped",
            SegmentMode::FullWeek => "full-week",
        }
    }
}

impl std::fmt::Display for SegmentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Monday of the week containing `date`.
pub fn week_start_of(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Split one record into per-week segments, ordered by `week_start`.
///
/// The cursor advances one full week per iteration, so the walk terminates
/// for any finite range. A record with `start > end` yields no segments.
pub fn segment_record(record: &AssignmentRecord, mode: SegmentMode) -> Vec<WeekSegment> {
    let mut segments = Vec::new();
    let mut cursor = record.start;

    while cursor <= record.end {
        let week_start = week_start_of(cursor);
        let week_end = week_start + Duration::days(6);
        let (period_start, period_end) = match mode {
            SegmentMode::Clipped => (cursor, record.end.min(week_end)),
            SegmentMode::FullWeek => (week_start, week_end),
        };

        segments.push(WeekSegment {
            consultant: record.consultant.clone(),
            project: record.project.clone(),
            skill: record.skill.clone(),
            week_start,
            period_start,
            period_end,
            // Effort is a rate, not a total: each touched week receives the
            // record's full value.
            effort: record.effort,
        });

        cursor = week_end + Duration::days(1);
    }

    segments
}

/// Segment a whole batch, preserving record order.
pub fn segment_records(records: &[AssignmentRecord], mode: SegmentMode) -> Vec<WeekSegment> {
    records
        .iter()
        .flat_map(|record| segment_record(record, mode))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_record(start: NaiveDate, end: NaiveDate) -> AssignmentRecord {
        AssignmentRecord {
            consultant: "Alice".to_string(),
            project: "P1".to_string(),
            skill: None,
            start,
            end,
            effort: 50.0,
        }
    }

    #[test]
    fn wednesday_to_tuesday_spans_three_weeks() {
        let record = sample_record(date(2024, 1, 3), date(2024, 1, 16));
        let segments = segment_record(&record, SegmentMode::Clipped);

        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].week_start, date(2024, 1, 1));
        assert_eq!(segments[0].period_start, date(2024, 1, 3));
        assert_eq!(segments[0].period_end, date(2024, 1, 7));
        assert_eq!(segments[1].week_start, date(2024, 1, 8));
        assert_eq!(segments[1].period_start, date(2024, 1, 8));
        assert_eq!(segments[1].period_end, date(2024, 1, 14));
        assert_eq!(segments[2].week_start, date(2024, 1, 15));
        assert_eq!(segments[2].period_start, date(2024, 1, 15));
        assert_eq!(segments[2].period_end, date(2024, 1, 16));
    }

    #[test]
    fn periods_cover_the_range_without_gaps_or_overlaps() {
        let record = sample_record(date(2024, 2, 14), date(2024, 4, 2));
        let segments = segment_record(&record, SegmentMode::Clipped);

        assert_eq!(segments[0].period_start, record.start);
        assert_eq!(segments.last().unwrap().period_end, record.end);
        for pair in segments.windows(2) {
            assert_eq!(
                pair[1].period_start,
                pair[0].period_end + Duration::days(1)
            );
        }
    }

    #[test]
    fn every_week_start_is_a_monday_and_bounds_the_period() {
        let record = sample_record(date(2024, 3, 7), date(2024, 5, 19));
        for segment in segment_record(&record, SegmentMode::Clipped) {
            assert_eq!(segment.week_start.weekday(), Weekday::Mon);
            assert!(segment.week_start <= segment.period_start);
            assert!(segment.period_start <= segment.period_end);
            assert!(segment.period_end <= segment.week_start + Duration::days(6));
        }
    }

    #[test]
    fn single_day_record_yields_one_segment() {
        let record = sample_record(date(2024, 1, 10), date(2024, 1, 10));
        let segments = segment_record(&record, SegmentMode::Clipped);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].period_start, date(2024, 1, 10));
        assert_eq!(segments[0].period_end, date(2024, 1, 10));
        assert_eq!(segments[0].week_start, date(2024, 1, 8));
    }

    #[test]
    fn record_inside_one_week_keeps_its_own_bounds() {
        let record = sample_record(date(2024, 1, 9), date(2024, 1, 12));
        let segments = segment_record(&record, SegmentMode::Clipped);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].period_start, record.start);
        assert_eq!(segments[0].period_end, record.end);
    }

    #[test]
    fn full_week_mode_emits_monday_to_sunday_rows() {
        let record = sample_record(date(2024, 1, 3), date(2024, 1, 16));
        let segments = segment_record(&record, SegmentMode::FullWeek);

        assert_eq!(segments.len(), 3);
        for segment in &segments {
            assert_eq!(segment.period_start, segment.week_start);
            assert_eq!(segment.period_end, segment.week_start + Duration::days(6));
        }
        assert_eq!(segments[0].period_start, date(2024, 1, 1));
        assert_eq!(segments[2].period_end, date(2024, 1, 21));
    }

    #[test]
    fn start_after_end_yields_no_segments() {
        let record = sample_record(date(2024, 1, 16), date(2024, 1, 3));
        assert!(segment_record(&record, SegmentMode::Clipped).is_empty());
    }

    #[test]
    fn effort_is_attributed_in_full_to_every_week() {
        let record = sample_record(date(2024, 1, 1), date(2024, 1, 21));
        let segments = segment_record(&record, SegmentMode::Clipped);
        assert_eq!(segments.len(), 3);
        assert!(segments.iter().all(|s| s.effort == 50.0));
    }

    #[test]
    fn monday_start_is_its_own_week_start() {
        assert_eq!(week_start_of(date(2024, 1, 8)), date(2024, 1, 8));
        assert_eq!(week_start_of(date(2024, 1, 14)), date(2024, 1, 8));
    }
}

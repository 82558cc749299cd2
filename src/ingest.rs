use std::collections::HashSet;
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{EngineError, Result};
use crate::models::AssignmentRecord;

/// Columns that must be present in the input header.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    "ConsultantName",
    "ProjectName",
    "Efforts_Percentage",
    "StartDate",
    "EndDate",
];

/// Accepted date renderings, tried in order. Spreadsheet exports disagree.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y"];

/// How skill columns are turned into records.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkillMode {
    /// Ignore skill columns; one record per row with `skill: None`.
    Combined,
    /// One record per skill tag; rows without any tag produce no records.
    Expand,
    /// One record per skill tag; rows without any tag keep `skill: None`.
    ExpandKeepUnskilled,
}

/// Rows dropped during coercion, by 1-based line number in the source file.
#[derive(Debug, Default)]
pub struct DropReport {
    pub lines: Vec<u64>,
}

impl DropReport {
    pub fn dropped(&self) -> usize {
        self.lines.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
struct RawRow {
    #[serde(rename = "ConsultantName")]
    consultant: String,
    #[serde(rename = "ProjectName")]
    project: String,
    #[serde(rename = "Efforts_Percentage", default)]
    effort: Option<String>,
    #[serde(rename = "StartDate", default)]
    start: Option<String>,
    #[serde(rename = "EndDate", default)]
    end: Option<String>,
    #[serde(rename = "CoreSkill", default)]
    core_skill: Option<String>,
    #[serde(rename = "OtherSkills", default)]
    other_skills: Option<String>,
}

/// Read and normalize one CSV batch into assignment records.
///
/// Exact-duplicate rows are removed before coercion. Rows whose dates or
/// effort fail to parse are dropped and reported; a batch that yields no
/// records at all is an [`EngineError::EmptyResult`].
pub fn load_records(
    path: &Path,
    mode: SkillMode,
) -> Result<(Vec<AssignmentRecord>, DropReport)> {
    let reader = csv::Reader::from_path(path)?;
    records_from_reader(reader, mode)
}

fn records_from_reader<R: std::io::Read>(
    mut reader: csv::Reader<R>,
    mode: SkillMode,
) -> Result<(Vec<AssignmentRecord>, DropReport)> {
    check_required_columns(reader.headers()?)?;

    let mut seen: HashSet<RawRow> = HashSet::new();
    let mut rows: Vec<(u64, RawRow)> = Vec::new();
    for (index, result) in reader.deserialize::<RawRow>().enumerate() {
        let row = result?;
        // Line 1 is the header; data rows start at 2.
        let line = index as u64 + 2;
        if seen.insert(row.clone()) {
            rows.push((line, row));
        }
    }

    let mut records = Vec::new();
    let mut report = DropReport::default();
    for (line, row) in &rows {
        match coerce_row(row) {
            Ok((start, end, effort)) => expand_row(row, start, end, effort, mode, &mut records),
            Err(field) => {
                warn!("dropping line {line}: unparsable {field}");
                report.lines.push(*line);
            }
        }
    }

    if records.is_empty() {
        return Err(EngineError::EmptyResult {
            dropped: report.dropped(),
        });
    }

    debug!(
        "normalized {} records from {} distinct rows ({} dropped)",
        records.len(),
        rows.len(),
        report.dropped()
    );
    Ok((records, report))
}

fn check_required_columns(headers: &csv::StringRecord) -> Result<()> {
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(EngineError::Schema {
                column: column.to_string(),
            });
        }
    }
    Ok(())
}

/// Returns the name of the first field that fails coercion.
fn coerce_row(row: &RawRow) -> std::result::Result<(NaiveDate, NaiveDate, f64), &'static str> {
    let start = parse_date(row.start.as_deref()).ok_or("StartDate")?;
    let end = parse_date(row.end.as_deref()).ok_or("EndDate")?;
    let effort = parse_effort(row.effort.as_deref()).ok_or("Efforts_Percentage")?;
    Ok((start, end, effort))
}

fn expand_row(
    row: &RawRow,
    start: NaiveDate,
    end: NaiveDate,
    effort: f64,
    mode: SkillMode,
    records: &mut Vec<AssignmentRecord>,
) {
    let record = |skill: Option<String>| AssignmentRecord {
        consultant: row.consultant.trim().to_string(),
        project: row.project.trim().to_string(),
        skill,
        start,
        end,
        effort,
    };

    match mode {
        SkillMode::Combined => records.push(record(None)),
        SkillMode::Expand | SkillMode::ExpandKeepUnskilled => {
            let skills = extract_skills(row.core_skill.as_deref(), row.other_skills.as_deref());
            if skills.is_empty() {
                if mode == SkillMode::ExpandKeepUnskilled {
                    records.push(record(None));
                } else {
                    debug!("row for {} has no skill tags; excluded", row.consultant);
                }
            } else {
                for skill in skills {
                    records.push(record(Some(skill)));
                }
            }
        }
    }
}

fn parse_date(raw: Option<&str>) -> Option<NaiveDate> {
    let trimmed = raw?.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
}

fn parse_effort(raw: Option<&str>) -> Option<f64> {
    raw?.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Split the core and other skill columns on commas, trim each token, and
/// keep the first occurrence of every distinct token.
fn extract_skills(core: Option<&str>, other: Option<&str>) -> Vec<String> {
    let mut skills: Vec<String> = Vec::new();
    for field in [core, other].into_iter().flatten() {
        for token in field.split(',') {
            let token = token.trim();
            if !token.is_empty() && !skills.iter().any(|s| s == token) {
                skills.push(token.to_string());
            }
        }
    }
    skills
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader_from(data: &str) -> csv::Reader<&[u8]> {
        csv::Reader::from_reader(data.as_bytes())
    }

    const HEADER: &str = "ConsultantName,ProjectName,Efforts_Percentage,StartDate,EndDate,CoreSkill,OtherSkills";

    #[test]
    fn missing_required_column_is_a_schema_error() {
        let data = "ConsultantName,ProjectName,Efforts_Percentage,StartDate\nAlice,P1,50,2024-01-03\n";
        let err = records_from_reader(reader_from(data), SkillMode::Combined).unwrap_err();
        match err {
            EngineError::Schema { column } => assert_eq!(column, "EndDate"),
            other => panic!("expected schema error, got {other}"),
        }
    }

    #[test]
    fn exact_duplicate_rows_collapse_to_one_record() {
        let data = format!(
            "{HEADER}\nAlice,P1,50,2024-01-03,2024-01-16,,\nAlice,P1,50,2024-01-03,2024-01-16,,\n"
        );
        let (records, report) =
            records_from_reader(reader_from(&data), SkillMode::Combined).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(report.dropped(), 0);
    }

    #[test]
    fn unparsable_rows_are_dropped_with_line_numbers() {
        let data = format!(
            "{HEADER}\nAlice,P1,50,2024-01-03,2024-01-16,,\nBob,P2,not-a-number,2024-01-03,2024-01-16,,\nCara,P3,25,soon,2024-01-16,,\n"
        );
        let (records, report) =
            records_from_reader(reader_from(&data), SkillMode::Combined).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(report.lines, vec![3, 4]);
    }

    #[test]
    fn all_rows_invalid_is_an_empty_result() {
        let data = format!("{HEADER}\nAlice,P1,abc,2024-01-03,2024-01-16,,\n");
        let err = records_from_reader(reader_from(&data), SkillMode::Combined).unwrap_err();
        match err {
            EngineError::EmptyResult { dropped } => assert_eq!(dropped, 1),
            other => panic!("expected empty result, got {other}"),
        }
    }

    #[test]
    fn effort_outside_the_percentage_range_passes_through() {
        let data = format!("{HEADER}\nAlice,P1,-20,2024-01-03,2024-01-16,,\n");
        let (records, _) = records_from_reader(reader_from(&data), SkillMode::Combined).unwrap();
        assert_eq!(records[0].effort, -20.0);
    }

    #[test]
    fn slash_date_formats_are_accepted() {
        let data = format!("{HEADER}\nAlice,P1,50,03/01/2024,2024-01-16,,\n");
        let (records, _) = records_from_reader(reader_from(&data), SkillMode::Combined).unwrap();
        assert_eq!(records[0].start, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
    }

    #[test]
    fn expansion_yields_one_record_per_distinct_skill() {
        let data = format!(
            "{HEADER}\nAlice,P1,50,2024-01-03,2024-01-16,\"Rust, SQL\",\" SQL ,Python\"\n"
        );
        let (records, _) = records_from_reader(reader_from(&data), SkillMode::Expand).unwrap();
        let skills: Vec<&str> = records.iter().filter_map(|r| r.skill.as_deref()).collect();
        assert_eq!(skills, vec!["Rust", "SQL", "Python"]);
        assert!(records.iter().all(|r| r.consultant == "Alice" && r.effort == 50.0));
    }

    #[test]
    fn expansion_drops_rows_without_skill_tags() {
        let data = format!(
            "{HEADER}\nAlice,P1,50,2024-01-03,2024-01-16,Rust,\nBob,P2,30,2024-01-03,2024-01-16,,\n"
        );
        let (records, report) =
            records_from_reader(reader_from(&data), SkillMode::Expand).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].consultant, "Alice");
        // Skill-less rows are excluded by the mode, not dropped as invalid.
        assert_eq!(report.dropped(), 0);
    }

    #[test]
    fn keep_unskilled_mode_retains_rows_without_tags() {
        let data = format!(
            "{HEADER}\nAlice,P1,50,2024-01-03,2024-01-16,Rust,\nBob,P2,30,2024-01-03,2024-01-16,,\n"
        );
        let (records, _) =
            records_from_reader(reader_from(&data), SkillMode::ExpandKeepUnskilled).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].consultant, "Bob");
        assert_eq!(records[1].skill, None);
    }

    #[test]
    fn start_after_end_is_not_rejected() {
        let data = format!("{HEADER}\nAlice,P1,50,2024-01-16,2024-01-03,,\n");
        let (records, report) =
            records_from_reader(reader_from(&data), SkillMode::Combined).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(report.dropped(), 0);
        assert!(records[0].start > records[0].end);
    }
}

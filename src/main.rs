use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod aggregate;
mod error;
mod filter;
mod ingest;
mod models;
mod report;
mod segment;

use error::EngineError;
use ingest::SkillMode;
use models::{AggregatedSegment, FilterSpec};
use segment::SegmentMode;

#[derive(Parser)]
#[command(name = "effort-gantt")]
#[command(about = "Weekly effort timeline generator for consultant assignments", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct PipelineArgs {
    /// CSV file of assignment rows
    #[arg(long)]
    csv: PathBuf,
    /// Week segmentation policy
    #[arg(long, value_enum, default_value_t = SegmentMode::Clipped)]
    align: SegmentMode,
    /// Explode skill tags into one record per skill
    #[arg(long)]
    skills: bool,
    /// Keep rows without skill tags when --skills is set
    #[arg(long, requires = "skills")]
    keep_unskilled: bool,
    /// Window start (defaults to the earliest segment)
    #[arg(long)]
    from: Option<NaiveDate>,
    /// Window end (defaults to the latest segment)
    #[arg(long)]
    to: Option<NaiveDate>,
    /// Restrict to these consultants (repeatable; default: everyone)
    #[arg(long = "consultant")]
    consultants: Vec<String>,
    /// Restrict to these skills (repeatable; default: every skill seen)
    #[arg(long = "skill", requires = "skills")]
    skill_filters: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the aggregated weekly segments
    Weekly {
        #[command(flatten)]
        args: PipelineArgs,
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        args: PipelineArgs,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Write the chart renderer payload as JSON
    Export {
        #[command(flatten)]
        args: PipelineArgs,
        #[arg(long, default_value = "chart.json")]
        out: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Weekly { args, limit } => {
            let Some((rows, _)) = run_pipeline(&args)? else {
                return Ok(());
            };
            if rows.is_empty() {
                return Ok(());
            }
            println!("Weekly effort segments:");
            for row in rows.iter().take(limit) {
                match &row.skill {
                    Some(skill) => println!(
                        "- {} [{}] week of {}: {:.1}% on {} ({} to {})",
                        row.consultant,
                        skill,
                        row.week_start,
                        row.effort_total,
                        row.projects_label,
                        row.period_start,
                        row.period_end
                    ),
                    None => println!(
                        "- {} week of {}: {:.1}% on {} ({} to {})",
                        row.consultant,
                        row.week_start,
                        row.effort_total,
                        row.projects_label,
                        row.period_start,
                        row.period_end
                    ),
                }
            }
        }
        Commands::Report { args, out } => {
            let Some((rows, window)) = run_pipeline(&args)? else {
                return Ok(());
            };
            let report = report::build_report(window, args.align, &rows);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Export { args, out } => {
            let Some((rows, _)) = run_pipeline(&args)? else {
                return Ok(());
            };
            // The clock is read here, at the boundary; the engine never
            // touches it.
            let payload = report::chart_payload(rows, Utc::now().date_naive());
            let json = serde_json::to_string_pretty(&payload)?;
            std::fs::write(&out, json)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Chart payload written to {}.", out.display());
        }
    }

    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Normalize, segment, aggregate, and filter one CSV batch.
///
/// Returns `None` when there is nothing to hand downstream; the reason has
/// already been printed. An empty-but-valid filter result is returned as an
/// empty vec so report/export still produce their output.
fn run_pipeline(
    args: &PipelineArgs,
) -> anyhow::Result<Option<(Vec<AggregatedSegment>, (NaiveDate, NaiveDate))>> {
    let (records, drops) = match ingest::load_records(&args.csv, skill_mode(args)) {
        Err(EngineError::EmptyResult { dropped }) => {
            println!(
                "No usable rows in {} ({dropped} dropped); nothing to chart.",
                args.csv.display()
            );
            return Ok(None);
        }
        result => result.with_context(|| format!("failed to read {}", args.csv.display()))?,
    };

    if drops.dropped() > 0 {
        println!("Dropped {} invalid row(s).", drops.dropped());
    }

    let segments = segment::segment_records(&records, args.align);
    let rows = aggregate::aggregate(segments);
    let Some((data_from, data_to)) = filter::full_window(&rows) else {
        println!("No weekly segments could be derived from the input.");
        return Ok(None);
    };
    let window = (
        args.from.unwrap_or(data_from),
        args.to.unwrap_or(data_to),
    );

    let consultants: BTreeSet<String> = if args.consultants.is_empty() {
        filter::consultant_universe(&rows)
    } else {
        args.consultants.iter().cloned().collect()
    };
    if consultants.is_empty() {
        warn!("empty consultant selection");
        println!("Please select at least one consultant.");
    }

    let skills: Option<BTreeSet<String>> = if args.skills {
        Some(if args.skill_filters.is_empty() {
            filter::skill_universe(&rows)
        } else {
            args.skill_filters.iter().cloned().collect()
        })
    } else {
        None
    };
    if let Some(selected) = &skills {
        if selected.is_empty() {
            warn!("empty skill selection");
            println!("Please select at least one skill.");
        }
    }

    let spec = FilterSpec {
        window,
        consultants,
        skills,
    };
    let filtered = filter::apply_filter(&rows, &spec);
    if filtered.is_empty() {
        println!("No segments match the current filters.");
    }

    Ok(Some((filtered, window)))
}

fn skill_mode(args: &PipelineArgs) -> SkillMode {
    if !args.skills {
        SkillMode::Combined
    } else if args.keep_unskilled {
        SkillMode::ExpandKeepUnskilled
    } else {
        SkillMode::Expand
    }
}

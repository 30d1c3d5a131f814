//! Flat-file export of an [`AnalysisResult`].
//!
//! One CSV per table plus `summary_stats.json`. Column names are fixed and
//! every rating is written with four decimals, so exporting the same result
//! twice produces byte-identical files.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use csv::WriterBuilder;
use serde::Serialize;
use tracing::{debug, info};

use audience_core::error::Result;
use audience_core::formatting::{format_rating, round_rating, NO_DATA_LABEL};
use audience_core::models::MonthKey;

use crate::result::{AnalysisResult, DatasetProfile, GenderSkew, Reading};

pub const AGE_PREFERENCES_FILE: &str = "age_preferences.csv";
pub const TIME_DEMOGRAPHICS_FILE: &str = "time_demographics.csv";
pub const GENDER_OVERALL_FILE: &str = "gender_overall.csv";
pub const GENDER_BY_PROGRAM_FILE: &str = "gender_by_program.csv";
pub const GENDER_BY_AGE_BAND_FILE: &str = "gender_by_age_band.csv";
pub const WEEKDAY_WEEKEND_PROGRAMS_FILE: &str = "weekday_weekend_programs.csv";
pub const WEEKDAY_WEEKEND_AGE_BANDS_FILE: &str = "weekday_weekend_age_bands.csv";
pub const MONTHLY_TRENDS_FILE: &str = "monthly_trends.csv";
pub const SUMMARY_FILE: &str = "summary_stats.json";

/// Label used in `time_demographics.csv` for the all-bands row of a slot.
const OVERALL_LABEL: &str = "overall";

/// Files written by one export, in write order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportManifest {
    pub output_dir: PathBuf,
    pub files: Vec<PathBuf>,
}

// ── Row shapes ────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct AgePreferenceRow<'a> {
    rank: usize,
    program_id: &'a str,
    program_observations: usize,
    program_mean: String,
    age_band: &'static str,
    band_mean: String,
    band_observations: usize,
}

#[derive(Serialize)]
struct TimeSlotRow {
    time_slot: &'static str,
    start_hour: u32,
    end_hour: u32,
    age_band: &'static str,
    mean: String,
    observations: usize,
}

#[derive(Serialize)]
struct GroupMeanRow<'a> {
    group: &'a str,
    category: &'static str,
    mean: String,
    observations: usize,
}

#[derive(Serialize)]
struct SummaryExport<'a> {
    dominant_age_band: &'static str,
    dominant_program: &'a str,
    dominant_rating: f64,
    gender_skew: GenderSkew,
    gender_difference: Option<f64>,
    best_time_slot: Option<&'static str>,
    best_time_slot_rating: Option<f64>,
    audience_share: Vec<ShareExport>,
    total_observations: usize,
    total_programs: usize,
    first_date: Option<NaiveDate>,
    last_date: Option<NaiveDate>,
    omitted_months: &'a [MonthKey],
    profile: &'a DatasetProfile,
}

#[derive(Serialize)]
struct ShareExport {
    age_band: &'static str,
    mean: f64,
    observations: usize,
}

fn reading_cell(reading: Reading) -> String {
    match reading {
        Reading::Mean(v) => format_rating(v),
        Reading::NoData => NO_DATA_LABEL.to_string(),
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Write every table of `result` under `output_dir`, creating it if needed.
pub fn export_result(result: &AnalysisResult, output_dir: &Path) -> Result<ExportManifest> {
    fs::create_dir_all(output_dir)?;
    let mut files = Vec::new();

    let rows = result
        .age_preferences
        .programs
        .iter()
        .enumerate()
        .flat_map(|(idx, program)| {
            program.by_band.iter().map(move |cell| AgePreferenceRow {
                rank: idx + 1,
                program_id: &program.program_id,
                program_observations: program.observations,
                program_mean: format_rating(program.overall_mean),
                age_band: cell.age_band.label(),
                band_mean: format_rating(cell.mean),
                band_observations: cell.observations,
            })
        });
    files.push(write_csv(
        output_dir,
        AGE_PREFERENCES_FILE,
        &[
            "rank",
            "program_id",
            "program_observations",
            "program_mean",
            "age_band",
            "band_mean",
            "band_observations",
        ],
        rows,
    )?);

    let rows = result.time_demographics.slots.iter().flat_map(|slot| {
        let (start_hour, end_hour) = slot.slot.hours();
        let overall = TimeSlotRow {
            time_slot: slot.slot.label(),
            start_hour,
            end_hour,
            age_band: OVERALL_LABEL,
            mean: reading_cell(slot.overall),
            observations: slot.observations,
        };
        std::iter::once(overall).chain(slot.by_band.iter().map(move |cell| TimeSlotRow {
            time_slot: slot.slot.label(),
            start_hour,
            end_hour,
            age_band: cell.age_band.label(),
            mean: reading_cell(cell.reading),
            observations: cell.observations,
        }))
    });
    files.push(write_csv(
        output_dir,
        TIME_DEMOGRAPHICS_FILE,
        &["time_slot", "start_hour", "end_hour", "age_band", "mean", "observations"],
        rows,
    )?);

    let gender = &result.gender_differences;
    let rows = gender.overall.iter().map(|g| GroupMeanRow {
        group: OVERALL_LABEL,
        category: g.gender.label(),
        mean: format_rating(g.mean),
        observations: g.observations,
    });
    files.push(write_csv(
        output_dir,
        GENDER_OVERALL_FILE,
        &["scope", "gender", "mean", "observations"],
        rows,
    )?);

    let rows = gender.by_program.iter().map(|g| GroupMeanRow {
        group: &g.program_id,
        category: g.gender.label(),
        mean: format_rating(g.mean),
        observations: g.observations,
    });
    files.push(write_csv(
        output_dir,
        GENDER_BY_PROGRAM_FILE,
        &["program_id", "gender", "mean", "observations"],
        rows,
    )?);

    let rows = gender.by_age_band.iter().map(|g| GroupMeanRow {
        group: g.age_band.label(),
        category: g.gender.label(),
        mean: format_rating(g.mean),
        observations: g.observations,
    });
    files.push(write_csv(
        output_dir,
        GENDER_BY_AGE_BAND_FILE,
        &["age_band", "gender", "mean", "observations"],
        rows,
    )?);

    let split = &result.weekday_weekend;
    let rows = split.by_program.iter().map(|d| GroupMeanRow {
        group: &d.program_id,
        category: d.day_type.label(),
        mean: format_rating(d.mean),
        observations: d.observations,
    });
    files.push(write_csv(
        output_dir,
        WEEKDAY_WEEKEND_PROGRAMS_FILE,
        &["program_id", "day_type", "mean", "observations"],
        rows,
    )?);

    let rows = split.by_age_band.iter().map(|d| GroupMeanRow {
        group: d.age_band.label(),
        category: d.day_type.label(),
        mean: format_rating(d.mean),
        observations: d.observations,
    });
    files.push(write_csv(
        output_dir,
        WEEKDAY_WEEKEND_AGE_BANDS_FILE,
        &["age_band", "day_type", "mean", "observations"],
        rows,
    )?);

    let months: Vec<String> = result
        .monthly_trends
        .rows
        .iter()
        .map(|r| r.month.to_string())
        .collect();
    let rows = result
        .monthly_trends
        .rows
        .iter()
        .zip(&months)
        .map(|(r, month)| GroupMeanRow {
            group: month,
            category: r.age_band.label(),
            mean: format_rating(r.mean),
            observations: r.observations,
        });
    files.push(write_csv(
        output_dir,
        MONTHLY_TRENDS_FILE,
        &["month", "age_band", "mean", "observations"],
        rows,
    )?);

    files.push(write_json(&output_dir.join(SUMMARY_FILE), &summary_export(result))?);

    info!(
        files = files.len(),
        output_dir = %output_dir.display(),
        "exported analysis tables"
    );

    Ok(ExportManifest {
        output_dir: output_dir.to_path_buf(),
        files,
    })
}

/// Write `value` as pretty-printed JSON with a trailing newline.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<PathBuf> {
    let mut text = serde_json::to_string_pretty(value)?;
    text.push('\n');
    fs::write(path, text)?;
    debug!("wrote {}", path.display());
    Ok(path.to_path_buf())
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn write_csv<T, I>(dir: &Path, name: &str, header: &[&str], rows: I) -> Result<PathBuf>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let path = dir.join(name);
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_path(&path)?;

    writer.write_record(header)?;
    let mut count = 0usize;
    for row in rows {
        writer.serialize(row)?;
        count += 1;
    }
    writer.flush()?;

    debug!("wrote {} rows to {}", count, path.display());
    Ok(path)
}

fn summary_export(result: &AnalysisResult) -> SummaryExport<'_> {
    let summary = &result.summary;
    SummaryExport {
        dominant_age_band: summary.dominant_age_band.label(),
        dominant_program: &summary.dominant_program,
        dominant_rating: round_rating(summary.dominant_rating),
        gender_skew: summary.gender_skew,
        gender_difference: summary.gender_difference.map(round_rating),
        best_time_slot: summary.best_time_slot.map(|s| s.label()),
        best_time_slot_rating: summary.best_time_slot_rating.map(round_rating),
        audience_share: summary
            .audience_share
            .iter()
            .map(|b| ShareExport {
                age_band: b.age_band.label(),
                mean: round_rating(b.mean),
                observations: b.observations,
            })
            .collect(),
        total_observations: summary.total_observations,
        total_programs: summary.total_programs,
        first_date: summary.first_date,
        last_date: summary.last_date,
        omitted_months: &result.monthly_trends.omitted_months,
        profile: &result.profile,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! CSV discovery and loading for ratings exports.
//!
//! Accepts a single `.csv` file or a directory searched recursively, and
//! converts every row into a [`ViewershipRecord`]. Header problems and
//! unknown age bands abort the load; individually malformed rows are
//! skipped, counted and logged.

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use tracing::{debug, info, warn};

use audience_core::error::{AnalysisError, Result};
use audience_core::models::{AgeBand, Gender, ViewershipRecord};

use crate::table::RatingTable;

const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMATS: [&str; 2] = ["%H:%M:%S", "%H:%M"];

/// Columns that must appear in every file's header.
const HEADER_COLUMNS: [&str; 4] = ["program_id", "rating", "age_band", "gender"];

/// What a load did, for logging and batch reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub files: Vec<PathBuf>,
    pub rows_read: usize,
    pub rows_loaded: usize,
    pub rows_rejected: usize,
    /// Files whose `weekday` column was derived from the timestamp.
    pub derived_weekday_files: usize,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Find all `.csv` files recursively under `data_path`, sorted by path.
pub fn find_csv_files(data_path: &Path) -> Vec<PathBuf> {
    if !data_path.exists() {
        warn!("Data path does not exist: {}", data_path.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(data_path)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| ext.eq_ignore_ascii_case("csv"))
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Load a ratings file, or every `.csv` below a directory, into one table.
///
/// Files are read in path order and rows keep their file order, so the
/// same input always yields the same record sequence.
///
/// # Errors
/// * [`AnalysisError::DataPathNotFound`] / [`AnalysisError::NoDataFiles`]
///   when there is nothing to read.
/// * [`AnalysisError::Schema`] for a missing header or an unknown age band.
pub fn load_table(path: &Path) -> Result<(RatingTable, LoadReport)> {
    if !path.exists() {
        return Err(AnalysisError::DataPathNotFound(path.to_path_buf()));
    }

    let files = if path.is_dir() {
        let found = find_csv_files(path);
        if found.is_empty() {
            return Err(AnalysisError::NoDataFiles(path.to_path_buf()));
        }
        found
    } else {
        vec![path.to_path_buf()]
    };

    let mut records = Vec::new();
    let mut report = LoadReport::default();
    for file in &files {
        let handle = std::fs::File::open(file).map_err(|source| AnalysisError::FileRead {
            path: file.clone(),
            source,
        })?;
        read_ratings(handle, &file.display().to_string(), &mut records, &mut report)?;
        report.files.push(file.clone());
    }

    info!(
        files = report.files.len(),
        rows_loaded = report.rows_loaded,
        rows_rejected = report.rows_rejected,
        "loaded ratings table"
    );

    Ok((RatingTable::from_records(records)?, report))
}

/// Parse CSV text from any reader into a table. `source` names the input in
/// log messages.
pub fn load_table_from_reader<R: Read>(reader: R, source: &str) -> Result<(RatingTable, LoadReport)> {
    let mut records = Vec::new();
    let mut report = LoadReport::default();
    read_ratings(reader, source, &mut records, &mut report)?;
    Ok((RatingTable::from_records(records)?, report))
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Where each needed field lives in a file's rows.
struct ColumnLayout {
    timestamp: TimestampColumns,
    program_id: usize,
    rating: usize,
    age_band: usize,
    gender: usize,
    weekday: Option<usize>,
}

enum TimestampColumns {
    Combined(usize),
    Split { date: usize, time: usize },
}

impl ColumnLayout {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self> {
        let index: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().trim_start_matches('\u{feff}').to_lowercase(), i))
            .collect();
        let column = |name: &str| {
            index
                .get(name)
                .copied()
                .ok_or_else(|| AnalysisError::missing_column(name))
        };

        let timestamp = match (index.get("timestamp"), index.get("date"), index.get("time")) {
            (Some(&ts), _, _) => TimestampColumns::Combined(ts),
            (None, Some(&date), Some(&time)) => TimestampColumns::Split { date, time },
            _ => return Err(AnalysisError::missing_column("timestamp")),
        };

        let [program_id, rating, age_band, gender] = HEADER_COLUMNS;
        Ok(Self {
            timestamp,
            program_id: column(program_id)?,
            rating: column(rating)?,
            age_band: column(age_band)?,
            gender: column(gender)?,
            weekday: index.get("weekday").copied(),
        })
    }
}

/// Why a row could not be turned into a record.
enum RowError {
    /// Skip the row and keep loading.
    Rejected(String),
    /// Abort the whole load.
    Fatal(AnalysisError),
}

fn read_ratings<R: Read>(
    reader: R,
    source: &str,
    records: &mut Vec<ViewershipRecord>,
    report: &mut LoadReport,
) -> Result<()> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let layout = ColumnLayout::from_headers(csv_reader.headers()?)?;
    if layout.weekday.is_none() {
        debug!("{}: no weekday column, deriving it from timestamps", source);
        report.derived_weekday_files += 1;
    }

    for (line, row) in csv_reader.records().enumerate() {
        report.rows_read += 1;
        // Header is line 1.
        let line = line + 2;
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                warn!("{}:{}: skipping unreadable row: {}", source, line, e);
                report.rows_rejected += 1;
                continue;
            }
        };

        match parse_row(&row, &layout) {
            Ok(record) => {
                records.push(record);
                report.rows_loaded += 1;
            }
            Err(RowError::Rejected(reason)) => {
                warn!("{}:{}: skipping row: {}", source, line, reason);
                report.rows_rejected += 1;
            }
            Err(RowError::Fatal(err)) => return Err(err),
        }
    }

    debug!(
        "{}: {} rows read, {} rejected so far",
        source, report.rows_read, report.rows_rejected
    );
    Ok(())
}

fn parse_row(row: &csv::StringRecord, layout: &ColumnLayout) -> std::result::Result<ViewershipRecord, RowError> {
    let field = |idx: usize| row.get(idx).unwrap_or("");

    let timestamp = match layout.timestamp {
        TimestampColumns::Combined(idx) => parse_timestamp(field(idx)),
        TimestampColumns::Split { date, time } => parse_date_time(field(date), field(time)),
    }
    .ok_or_else(|| RowError::Rejected("unparseable timestamp".to_string()))?;

    let program_id = field(layout.program_id);
    if program_id.is_empty() {
        return Err(RowError::Rejected("empty program_id".to_string()));
    }

    let raw_rating = field(layout.rating);
    let rating = f64::from_str(raw_rating)
        .ok()
        .filter(|r| r.is_finite() && *r >= 0.0)
        .ok_or_else(|| RowError::Rejected(format!("invalid rating '{}'", raw_rating)))?;

    let age_band = AgeBand::from_str(field(layout.age_band)).map_err(RowError::Fatal)?;
    let gender = Gender::parse_lenient(field(layout.gender));

    let mut record = ViewershipRecord::new(timestamp, program_id, rating, age_band, gender);
    if let Some(idx) = layout.weekday {
        let raw = field(idx);
        record.weekday = raw
            .parse::<u8>()
            .ok()
            .filter(|d| *d <= 6)
            .ok_or_else(|| RowError::Fatal(AnalysisError::invalid_value("weekday", raw)))?;
    }
    Ok(record)
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

fn parse_date_time(date: &str, time: &str) -> Option<NaiveDateTime> {
    let date = NaiveDate::parse_from_str(date, DATE_FORMAT).ok()?;
    let time = TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(time, fmt).ok())?;
    Some(date.and_time(time))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

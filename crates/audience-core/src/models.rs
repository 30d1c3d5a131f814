//! Record model and the fixed grouping taxonomies.
//!
//! The age-band, time-slot and day-type taxonomies are `Copy` enums with
//! `const` tables so that every engine invocation sees the same grouping
//! without consulting process state.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

// ── AgeBand ───────────────────────────────────────────────────────────────────

/// Audience age category. Declaration order is the canonical report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AgeBand {
    #[serde(rename = "4+")]
    All4Plus,
    #[serde(rename = "15-44")]
    Age15To44,
    #[serde(rename = "15-24")]
    Age15To24,
    #[serde(rename = "25-34")]
    Age25To34,
    #[serde(rename = "35-44")]
    Age35To44,
    #[serde(rename = "45-54")]
    Age45To54,
    #[serde(rename = "55+")]
    Age55Plus,
}

impl AgeBand {
    /// Every band in canonical order.
    pub const ALL: [AgeBand; 7] = [
        AgeBand::All4Plus,
        AgeBand::Age15To44,
        AgeBand::Age15To24,
        AgeBand::Age25To34,
        AgeBand::Age35To44,
        AgeBand::Age45To54,
        AgeBand::Age55Plus,
    ];

    /// Canonical label, e.g. `"15-24"`.
    pub fn label(self) -> &'static str {
        match self {
            AgeBand::All4Plus => "4+",
            AgeBand::Age15To44 => "15-44",
            AgeBand::Age15To24 => "15-24",
            AgeBand::Age25To34 => "25-34",
            AgeBand::Age35To44 => "35-44",
            AgeBand::Age45To54 => "45-54",
            AgeBand::Age55Plus => "55+",
        }
    }

    /// Buckets a record of this band is counted in: the band itself followed
    /// by every aggregate band that contains it.
    ///
    /// Overlap is intentional. A `15-24` record is reported under `15-24`,
    /// `15-44` and `4+`.
    pub fn contributes_to(self) -> &'static [AgeBand] {
        match self {
            AgeBand::All4Plus => &[AgeBand::All4Plus],
            AgeBand::Age15To44 => &[AgeBand::Age15To44, AgeBand::All4Plus],
            AgeBand::Age15To24 => &[AgeBand::Age15To24, AgeBand::Age15To44, AgeBand::All4Plus],
            AgeBand::Age25To34 => &[AgeBand::Age25To34, AgeBand::Age15To44, AgeBand::All4Plus],
            AgeBand::Age35To44 => &[AgeBand::Age35To44, AgeBand::Age15To44, AgeBand::All4Plus],
            AgeBand::Age45To54 => &[AgeBand::Age45To54, AgeBand::All4Plus],
            AgeBand::Age55Plus => &[AgeBand::Age55Plus, AgeBand::All4Plus],
        }
    }

    /// How narrow the band is: the number of buckets it feeds. A sub-band
    /// ranks above the aggregates that contain it.
    pub fn specificity(self) -> usize {
        self.contributes_to().len()
    }
}

impl fmt::Display for AgeBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AgeBand {
    type Err = AnalysisError;

    /// Accepts canonical labels, en-dash ranges (`15–24`) and the broadcast
    /// export labels (`15-24歲`, `55歲以上`).
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalised = normalise_band_label(raw);
        AgeBand::ALL
            .iter()
            .copied()
            .find(|band| band.label() == normalised)
            .ok_or_else(|| AnalysisError::invalid_value("age_band", raw))
    }
}

fn normalise_band_label(raw: &str) -> String {
    let compact: String = raw
        .trim()
        .replace(|c: char| c == '–' || c == '—', "-")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    if let Some(lower) = compact.strip_suffix("歲以上") {
        format!("{}+", lower)
    } else if let Some(range) = compact.strip_suffix('歲') {
        range.to_string()
    } else {
        compact
    }
}

// ── TimeSlot ──────────────────────────────────────────────────────────────────

/// Named partition of the broadcast day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeSlot {
    /// 00:00 – 05:59
    Dawn,
    /// 06:00 – 11:59
    Morning,
    /// 12:00 – 17:59
    Midday,
    /// 18:00 – 22:59, historically the highest-rated slot.
    Golden,
    /// 23:00 – 23:59
    LateNight,
}

impl TimeSlot {
    /// Every slot in clock order.
    pub const ALL: [TimeSlot; 5] = [
        TimeSlot::Dawn,
        TimeSlot::Morning,
        TimeSlot::Midday,
        TimeSlot::Golden,
        TimeSlot::LateNight,
    ];

    /// First and last hour covered by the slot (both inclusive).
    pub fn hours(self) -> (u32, u32) {
        match self {
            TimeSlot::Dawn => (0, 5),
            TimeSlot::Morning => (6, 11),
            TimeSlot::Midday => (12, 17),
            TimeSlot::Golden => (18, 22),
            TimeSlot::LateNight => (23, 23),
        }
    }

    /// The slot containing `hour`, or `None` when `hour > 23`.
    pub fn from_hour(hour: u32) -> Option<TimeSlot> {
        TimeSlot::ALL.iter().copied().find(|slot| {
            let (start, end) = slot.hours();
            (start..=end).contains(&hour)
        })
    }

    pub fn label(self) -> &'static str {
        match self {
            TimeSlot::Dawn => "dawn",
            TimeSlot::Morning => "morning",
            TimeSlot::Midday => "midday",
            TimeSlot::Golden => "golden",
            TimeSlot::LateNight => "late_night",
        }
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── DayType ───────────────────────────────────────────────────────────────────

/// Weekday (Mon–Fri) versus weekend (Sat–Sun) partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayType {
    Weekday,
    Weekend,
}

impl DayType {
    pub const ALL: [DayType; 2] = [DayType::Weekday, DayType::Weekend];

    /// Classify a weekday index where 0 is Monday and 6 is Sunday.
    pub fn from_weekday(weekday: u8) -> Option<DayType> {
        match weekday {
            0..=4 => Some(DayType::Weekday),
            5 | 6 => Some(DayType::Weekend),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DayType::Weekday => "weekday",
            DayType::Weekend => "weekend",
        }
    }
}

impl fmt::Display for DayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── Gender ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::Male, Gender::Female];

    /// Parse a gender marker. Unrecognised or empty values yield `None`
    /// (unknown gender), never an error.
    pub fn parse_lenient(raw: &str) -> Option<Gender> {
        match raw.trim().to_lowercase().as_str() {
            "m" | "male" | "男" | "男性" => Some(Gender::Male),
            "f" | "female" | "女" | "女性" => Some(Gender::Female),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── MonthKey ──────────────────────────────────────────────────────────────────

/// Calendar month, serialised as `"YYYY-MM"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn first_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    pub fn last_day(self) -> Option<NaiveDate> {
        let (year, month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(year, month, 1)?.pred_opt()
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl From<MonthKey> for String {
    fn from(key: MonthKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for MonthKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let (year, month) = value
            .split_once('-')
            .ok_or_else(|| format!("invalid month key: {}", value))?;
        let key = MonthKey {
            year: year.parse().map_err(|_| format!("invalid year: {}", value))?,
            month: month.parse().map_err(|_| format!("invalid month: {}", value))?,
        };
        key.first_day()
            .map(|_| key)
            .ok_or_else(|| format!("month out of range: {}", value))
    }
}

// ── ViewershipRecord ──────────────────────────────────────────────────────────

/// One broadcast-level viewership observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewershipRecord {
    /// Local broadcast date and time.
    pub timestamp: NaiveDateTime,
    /// Cleaned program (series) identifier.
    pub program_id: String,
    /// Audience rating; never negative.
    pub rating: f64,
    /// Age band the rating was measured for.
    pub age_band: AgeBand,
    /// `None` when the gender is missing or unknown.
    #[serde(default)]
    pub gender: Option<Gender>,
    /// Day of week, 0 = Monday … 6 = Sunday.
    pub weekday: u8,
}

impl ViewershipRecord {
    /// Build a record, deriving `weekday` from the timestamp.
    pub fn new(
        timestamp: NaiveDateTime,
        program_id: impl Into<String>,
        rating: f64,
        age_band: AgeBand,
        gender: Option<Gender>,
    ) -> Self {
        Self {
            timestamp,
            program_id: program_id.into(),
            rating,
            age_band,
            gender,
            weekday: timestamp.weekday().num_days_from_monday() as u8,
        }
    }

    /// Zero-rated rows are non-observations and never enter an aggregate.
    pub fn is_observation(&self) -> bool {
        self.rating > 0.0
    }

    pub fn hour(&self) -> u32 {
        self.timestamp.hour()
    }

    pub fn time_slot(&self) -> Option<TimeSlot> {
        TimeSlot::from_hour(self.hour())
    }

    pub fn day_type(&self) -> Option<DayType> {
        DayType::from_weekday(self.weekday)
    }

    pub fn month(&self) -> MonthKey {
        MonthKey::of(self.timestamp.date())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! Result model shared by every analysis function and every consumer.
//!
//! All types are plain immutable values. Equality is exact field-by-field
//! comparison, including `f64` fields, which is what makes "two consumers
//! produced the same numbers" a checkable statement.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use audience_core::error::Result;
use audience_core::formatting::NO_DATA_LABEL;
use audience_core::models::{AgeBand, DayType, Gender, MonthKey, TimeSlot};

use crate::aggregator::MeanAccumulator;
use crate::engine;

// ── Reading ───────────────────────────────────────────────────────────────────

/// A mean rating, or the explicit marker for a cell with no observations.
///
/// Serialised as the bare number or the string `"no data"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    Mean(f64),
    NoData,
}

impl Reading {
    pub fn from_accumulator(acc: Option<&MeanAccumulator>) -> Self {
        match acc.and_then(MeanAccumulator::mean) {
            Some(mean) => Reading::Mean(mean),
            None => Reading::NoData,
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            Reading::Mean(v) => Some(v),
            Reading::NoData => None,
        }
    }

    pub fn is_no_data(self) -> bool {
        matches!(self, Reading::NoData)
    }
}

impl Serialize for Reading {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Reading::Mean(v) => serializer.serialize_f64(*v),
            Reading::NoData => serializer.serialize_str(NO_DATA_LABEL),
        }
    }
}

impl<'de> Deserialize<'de> for Reading {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Value(f64),
            Marker(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Value(v) => Ok(Reading::Mean(v)),
            Repr::Marker(s) if s == NO_DATA_LABEL => Ok(Reading::NoData),
            Repr::Marker(s) => Err(serde::de::Error::custom(format!(
                "expected a number or \"{}\", got \"{}\"",
                NO_DATA_LABEL, s
            ))),
        }
    }
}

// ── Age preferences ───────────────────────────────────────────────────────────

/// Mean rating of one age band within some group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandMean {
    pub age_band: AgeBand,
    pub mean: f64,
    pub observations: usize,
}

/// One ranked program with its per-band means.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramPreference {
    pub program_id: String,
    /// Positive-rating records for the program.
    pub observations: usize,
    /// Mean over all of the program's observations; the ranking key.
    pub overall_mean: f64,
    /// Overlapping-band means in taxonomy order. Bands without observations
    /// are absent.
    pub by_band: Vec<BandMean>,
}

/// Output of `analyze_age_preferences`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgePreferenceTable {
    pub min_observations: usize,
    pub top_n: usize,
    /// Programs that passed the observation threshold, before the top-N cut.
    pub eligible_programs: usize,
    /// Ranked programs, best first.
    pub programs: Vec<ProgramPreference>,
}

impl AgePreferenceTable {
    /// Every `(program, band)` cell in ranking order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &BandMean)> {
        self.programs
            .iter()
            .flat_map(|p| p.by_band.iter().map(move |b| (p.program_id.as_str(), b)))
    }
}

// ── Time demographics ─────────────────────────────────────────────────────────

/// A slot × band cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandReading {
    pub age_band: AgeBand,
    pub reading: Reading,
    pub observations: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotDemographics {
    pub slot: TimeSlot,
    pub observations: usize,
    pub overall: Reading,
    /// One cell per band in taxonomy order.
    pub by_band: Vec<BandReading>,
}

/// Output of `analyze_time_demographics`: every slot in clock order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeDemographicsTable {
    pub slots: Vec<SlotDemographics>,
}

impl TimeDemographicsTable {
    pub fn slot(&self, slot: TimeSlot) -> Option<&SlotDemographics> {
        self.slots.iter().find(|s| s.slot == slot)
    }
}

// ── Gender ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenderMean {
    pub gender: Gender,
    pub mean: f64,
    pub observations: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramGenderMean {
    pub program_id: String,
    pub gender: Gender,
    pub mean: f64,
    pub observations: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandGenderMean {
    pub age_band: AgeBand,
    pub gender: Gender,
    pub mean: f64,
    pub observations: usize,
}

/// Output of `analyze_gender_differences`. Unknown gender is excluded from
/// every table and only counted in `unknown_gender_observations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenderDifferences {
    pub overall: Vec<GenderMean>,
    pub by_program: Vec<ProgramGenderMean>,
    pub by_age_band: Vec<BandGenderMean>,
    pub unknown_gender_observations: usize,
}

impl GenderDifferences {
    pub fn overall_mean(&self, gender: Gender) -> Option<f64> {
        self.overall
            .iter()
            .find(|g| g.gender == gender)
            .map(|g| g.mean)
    }
}

// ── Weekday / weekend ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramDayTypeMean {
    pub program_id: String,
    pub day_type: DayType,
    pub mean: f64,
    pub observations: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandDayTypeMean {
    pub age_band: AgeBand,
    pub day_type: DayType,
    pub mean: f64,
    pub observations: usize,
}

/// Output of `analyze_weekday_weekend`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekdayWeekendSplit {
    pub by_program: Vec<ProgramDayTypeMean>,
    pub by_age_band: Vec<BandDayTypeMean>,
}

// ── Monthly trends ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTrendRow {
    pub month: MonthKey,
    pub age_band: AgeBand,
    pub mean: f64,
    pub observations: usize,
}

/// Output of `analyze_monthly_trends`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTrendTable {
    /// Rows for complete months, ascending by month then band.
    pub rows: Vec<MonthlyTrendRow>,
    /// Months with observations that did not cover the whole calendar month.
    pub omitted_months: Vec<MonthKey>,
}

impl MonthlyTrendTable {
    /// Distinct reported months, ascending.
    pub fn months(&self) -> Vec<MonthKey> {
        let mut months: Vec<MonthKey> = self.rows.iter().map(|r| r.month).collect();
        months.dedup();
        months
    }
}

// ── Summary ───────────────────────────────────────────────────────────────────

/// Which gender rates higher overall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenderSkew {
    Female,
    Male,
    /// Both genders observed with equal means.
    Balanced,
    /// At least one gender has no observations.
    Unknown,
}

/// Headline statistics derived from the detailed tables only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    /// Band of the highest-mean cell in the age-preference table.
    pub dominant_age_band: AgeBand,
    pub dominant_program: String,
    pub dominant_rating: f64,
    pub gender_skew: GenderSkew,
    /// `|male - female|`, `None` unless both genders were observed.
    pub gender_difference: Option<f64>,
    pub best_time_slot: Option<TimeSlot>,
    pub best_time_slot_rating: Option<f64>,
    /// Observation-weighted band means across the ranked programs.
    pub audience_share: Vec<BandMean>,
    pub total_observations: usize,
    pub total_programs: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

// ── DatasetProfile ────────────────────────────────────────────────────────────

/// Shape of the input table, captured once per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetProfile {
    pub total_rows: usize,
    pub observations: usize,
    /// Rows excluded because their rating was zero.
    pub zero_rated_rows: usize,
    /// `observations / total_rows`, or 0 for an empty table.
    pub observation_share: f64,
    /// Distinct programs with at least one observation.
    pub programs: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

// ── AnalysisResult ────────────────────────────────────────────────────────────

/// Every table computed by one `run_complete_analysis` call.
///
/// Built once and never mutated; share it by reference or clone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub age_preferences: AgePreferenceTable,
    pub time_demographics: TimeDemographicsTable,
    pub gender_differences: GenderDifferences,
    pub weekday_weekend: WeekdayWeekendSplit,
    pub monthly_trends: MonthlyTrendTable,
    pub summary: SummaryStats,
    pub profile: DatasetProfile,
}

impl AnalysisResult {
    /// Re-derive the summary from this result's own tables.
    pub fn recompute_summary(&self) -> Result<SummaryStats> {
        engine::get_summary_stats(
            &self.age_preferences,
            &self.time_demographics,
            &self.gender_differences,
            &self.profile,
        )
    }

    /// `true` when the stored summary matches the detailed tables exactly.
    pub fn is_summary_consistent(&self) -> bool {
        self.recompute_summary()
            .map(|summary| summary == self.summary)
            .unwrap_or(false)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_serialises_no_data_marker() {
        assert_eq!(serde_json::to_string(&Reading::NoData).unwrap(), "\"no data\"");
        assert_eq!(serde_json::to_string(&Reading::Mean(0.38)).unwrap(), "0.38");
    }

    #[test]
    fn test_reading_deserialises_both_forms() {
        let r: Reading = serde_json::from_str("0.25").unwrap();
        assert_eq!(r, Reading::Mean(0.25));
        let r: Reading = serde_json::from_str("\"no data\"").unwrap();
        assert_eq!(r, Reading::NoData);
        assert!(serde_json::from_str::<Reading>("\"zero\"").is_err());
    }

    #[test]
    fn test_reading_from_accumulator() {
        assert_eq!(Reading::from_accumulator(None), Reading::NoData);
        let empty = MeanAccumulator::default();
        assert_eq!(Reading::from_accumulator(Some(&empty)), Reading::NoData);
        let acc = MeanAccumulator { sum: 0.9, count: 3 };
        assert_eq!(Reading::from_accumulator(Some(&acc)), Reading::Mean(0.9 / 3.0));
    }

    #[test]
    fn test_age_preference_entries_flatten_in_order() {
        let table = AgePreferenceTable {
            min_observations: 1,
            top_n: 2,
            eligible_programs: 2,
            programs: vec![
                ProgramPreference {
                    program_id: "A".into(),
                    observations: 2,
                    overall_mean: 0.3,
                    by_band: vec![
                        BandMean { age_band: AgeBand::All4Plus, mean: 0.3, observations: 2 },
                        BandMean { age_band: AgeBand::Age55Plus, mean: 0.3, observations: 2 },
                    ],
                },
                ProgramPreference {
                    program_id: "B".into(),
                    observations: 1,
                    overall_mean: 0.1,
                    by_band: vec![BandMean {
                        age_band: AgeBand::All4Plus,
                        mean: 0.1,
                        observations: 1,
                    }],
                },
            ],
        };
        let entries: Vec<(&str, AgeBand)> =
            table.entries().map(|(p, b)| (p, b.age_band)).collect();
        assert_eq!(
            entries,
            vec![
                ("A", AgeBand::All4Plus),
                ("A", AgeBand::Age55Plus),
                ("B", AgeBand::All4Plus)
            ]
        );
    }

    #[test]
    fn test_monthly_months_dedup() {
        let jan = MonthKey { year: 2024, month: 1 };
        let feb = MonthKey { year: 2024, month: 2 };
        let row = |month, age_band| MonthlyTrendRow {
            month,
            age_band,
            mean: 0.1,
            observations: 1,
        };
        let table = MonthlyTrendTable {
            rows: vec![
                row(jan, AgeBand::All4Plus),
                row(jan, AgeBand::Age55Plus),
                row(feb, AgeBand::All4Plus),
            ],
            omitted_months: vec![],
        };
        assert_eq!(table.months(), vec![jan, feb]);
    }
}

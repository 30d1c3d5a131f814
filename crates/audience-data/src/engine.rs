//! The unified analysis engine.
//!
//! Every function here is a pure reduction over a borrowed [`RatingTable`].
//! Both the interactive explorer and the batch pipeline call
//! [`run_complete_analysis`]; nothing else computes statistics.
//!
//! Numeric policy:
//! * zero-rated rows never enter a reduction;
//! * samples are stable-sorted by group key and summed in that order
//!   (see [`GroupedMeans::reduce`]);
//! * no rounding happens here.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use tracing::{debug, info};

use audience_core::config::{validate_thresholds, EngineConfig};
use audience_core::error::{AnalysisError, Result};
use audience_core::models::{AgeBand, Gender, MonthKey, TimeSlot, ViewershipRecord};

use crate::aggregator::{GroupedMeans, MeanAccumulator};
use crate::result::{
    AgePreferenceTable, AnalysisResult, BandDayTypeMean, BandGenderMean, BandMean, BandReading,
    DatasetProfile, GenderDifferences, GenderMean, GenderSkew, MonthlyTrendRow,
    MonthlyTrendTable, ProgramDayTypeMean, ProgramGenderMean, ProgramPreference, Reading,
    SlotDemographics, SummaryStats, TimeDemographicsTable, WeekdayWeekendSplit,
};
use crate::table::{RatingTable, REQUIRED_COLUMNS};

// ── Age preferences ───────────────────────────────────────────────────────────

/// Rank programs by overall mean rating and break each one down by
/// overlapping age band.
///
/// Programs with fewer than `min_observations` positive ratings are dropped.
/// Survivors are ordered by overall mean descending, ties by program id
/// ascending, and cut to `top_n`.
///
/// # Errors
/// * [`AnalysisError::Configuration`] when either threshold is zero.
/// * [`AnalysisError::InsufficientData`] when no program survives the filter.
pub fn analyze_age_preferences(
    table: &RatingTable,
    min_observations: usize,
    top_n: usize,
) -> Result<AgePreferenceTable> {
    validate_thresholds(min_observations, top_n)?;
    table.ensure_columns(&["program_id", "rating", "age_band"])?;
    info!(min_observations, top_n, "analysing age preferences");

    let per_program = GroupedMeans::reduce(
        table
            .observations()
            .map(|r| (r.program_id.as_str(), r.rating))
            .collect(),
    );
    let per_program_band = GroupedMeans::reduce(
        table
            .observations()
            .flat_map(|r| {
                r.age_band
                    .contributes_to()
                    .iter()
                    .map(move |band| ((r.program_id.as_str(), *band), r.rating))
            })
            .collect(),
    );

    let mut ranked: Vec<ProgramPreference> = per_program
        .iter()
        .filter(|(_, acc)| acc.count >= min_observations)
        .filter_map(|(program, acc)| {
            Some(ProgramPreference {
                program_id: (*program).to_string(),
                observations: acc.count,
                overall_mean: acc.mean()?,
                by_band: band_means_for(&per_program_band, program),
            })
        })
        .collect();

    if ranked.is_empty() {
        return Err(AnalysisError::InsufficientData(format!(
            "no program has at least {} positive-rating observations ({} programs observed)",
            min_observations,
            per_program.len()
        )));
    }

    let eligible_programs = ranked.len();
    ranked.sort_by(|a, b| {
        b.overall_mean
            .total_cmp(&a.overall_mean)
            .then_with(|| a.program_id.cmp(&b.program_id))
    });
    ranked.truncate(top_n);

    debug!(
        eligible_programs,
        reported = ranked.len(),
        "age preference ranking complete"
    );

    Ok(AgePreferenceTable {
        min_observations,
        top_n,
        eligible_programs,
        programs: ranked,
    })
}

/// Band means of one program, taken from the `(program, band)` reduction.
fn band_means_for(groups: &[((&str, AgeBand), MeanAccumulator)], program: &str) -> Vec<BandMean> {
    groups
        .iter()
        .filter(|((p, _), _)| *p == program)
        .filter_map(|((_, band), acc)| {
            Some(BandMean {
                age_band: *band,
                mean: acc.mean()?,
                observations: acc.count,
            })
        })
        .collect()
}

// ── Time demographics ─────────────────────────────────────────────────────────

/// Mean rating per time slot and per slot × age band.
///
/// Every slot is reported in clock order; slots and cells without
/// observations carry [`Reading::NoData`].
pub fn analyze_time_demographics(table: &RatingTable) -> Result<TimeDemographicsTable> {
    table.ensure_columns(&["timestamp", "rating", "age_band"])?;
    info!("analysing time-slot demographics");

    let per_slot = GroupedMeans::reduce(
        table
            .observations()
            .filter_map(|r| r.time_slot().map(|slot| (slot, r.rating)))
            .collect(),
    );
    let per_slot_band = GroupedMeans::reduce(
        table
            .observations()
            .filter_map(|r| r.time_slot().map(|slot| (slot, r)))
            .flat_map(|(slot, r)| {
                r.age_band
                    .contributes_to()
                    .iter()
                    .map(move |band| ((slot, *band), r.rating))
            })
            .collect(),
    );

    let slots: Vec<SlotDemographics> = TimeSlot::ALL
        .iter()
        .map(|&slot| {
            let acc = GroupedMeans::find(&per_slot, &slot);
            let by_band = AgeBand::ALL
                .iter()
                .map(|&band| {
                    let cell = GroupedMeans::find(&per_slot_band, &(slot, band));
                    BandReading {
                        age_band: band,
                        reading: Reading::from_accumulator(cell),
                        observations: cell.map_or(0, |c| c.count),
                    }
                })
                .collect();
            SlotDemographics {
                slot,
                observations: acc.map_or(0, |a| a.count),
                overall: Reading::from_accumulator(acc),
                by_band,
            }
        })
        .collect();

    debug!(
        slots_with_data = slots.iter().filter(|s| !s.overall.is_no_data()).count(),
        "time-slot demographics complete"
    );

    Ok(TimeDemographicsTable { slots })
}

// ── Gender ────────────────────────────────────────────────────────────────────

/// Mean rating per gender overall, per program and per age band.
///
/// Records with an unknown gender are excluded from all three tables.
pub fn analyze_gender_differences(table: &RatingTable) -> Result<GenderDifferences> {
    table.ensure_columns(&["program_id", "rating", "age_band", "gender"])?;
    info!("analysing gender differences");

    let known: Vec<(&ViewershipRecord, Gender)> = table
        .observations()
        .filter_map(|r| r.gender.map(|g| (r, g)))
        .collect();
    let unknown_gender_observations = table.observations().count() - known.len();

    let overall = GroupedMeans::reduce(known.iter().map(|&(r, g)| (g, r.rating)).collect())
        .into_iter()
        .filter_map(|(gender, acc)| {
            Some(GenderMean {
                gender,
                mean: acc.mean()?,
                observations: acc.count,
            })
        })
        .collect();

    let by_program = GroupedMeans::reduce(
        known
            .iter()
            .map(|&(r, g)| ((r.program_id.as_str(), g), r.rating))
            .collect(),
    )
    .into_iter()
    .filter_map(|((program, gender), acc)| {
        Some(ProgramGenderMean {
            program_id: program.to_string(),
            gender,
            mean: acc.mean()?,
            observations: acc.count,
        })
    })
    .collect();

    let by_age_band = GroupedMeans::reduce(
        known
            .iter()
            .flat_map(|&(r, g)| {
                r.age_band
                    .contributes_to()
                    .iter()
                    .map(move |band| ((*band, g), r.rating))
            })
            .collect(),
    )
    .into_iter()
    .filter_map(|((age_band, gender), acc)| {
        Some(BandGenderMean {
            age_band,
            gender,
            mean: acc.mean()?,
            observations: acc.count,
        })
    })
    .collect();

    if unknown_gender_observations > 0 {
        debug!(
            unknown_gender_observations,
            "excluded observations without a known gender"
        );
    }

    Ok(GenderDifferences {
        overall,
        by_program,
        by_age_band,
        unknown_gender_observations,
    })
}

// ── Weekday / weekend ─────────────────────────────────────────────────────────

/// Mean rating per program and per age band, split into weekday (Mon–Fri)
/// and weekend (Sat–Sun) using the `weekday` column.
pub fn analyze_weekday_weekend(table: &RatingTable) -> Result<WeekdayWeekendSplit> {
    table.ensure_columns(&["program_id", "rating", "age_band", "weekday"])?;
    info!("analysing weekday versus weekend");

    let by_program = GroupedMeans::reduce(
        table
            .observations()
            .filter_map(|r| {
                r.day_type()
                    .map(|day| ((r.program_id.as_str(), day), r.rating))
            })
            .collect(),
    )
    .into_iter()
    .filter_map(|((program, day_type), acc)| {
        Some(ProgramDayTypeMean {
            program_id: program.to_string(),
            day_type,
            mean: acc.mean()?,
            observations: acc.count,
        })
    })
    .collect();

    let by_age_band = GroupedMeans::reduce(
        table
            .observations()
            .filter_map(|r| r.day_type().map(|day| (day, r)))
            .flat_map(|(day, r)| {
                r.age_band
                    .contributes_to()
                    .iter()
                    .map(move |band| ((*band, day), r.rating))
            })
            .collect(),
    )
    .into_iter()
    .filter_map(|((age_band, day_type), acc)| {
        Some(BandDayTypeMean {
            age_band,
            day_type,
            mean: acc.mean()?,
            observations: acc.count,
        })
    })
    .collect();

    Ok(WeekdayWeekendSplit {
        by_program,
        by_age_band,
    })
}

// ── Monthly trends ────────────────────────────────────────────────────────────

/// Mean rating per calendar month × age band.
///
/// A month is reported only when every calendar day of it has at least one
/// observation; other months are listed in `omitted_months` and produce no
/// rows.
pub fn analyze_monthly_trends(table: &RatingTable) -> Result<MonthlyTrendTable> {
    table.ensure_columns(&["timestamp", "rating", "age_band"])?;
    info!("analysing monthly trends");

    let mut observed_days: BTreeMap<MonthKey, BTreeSet<NaiveDate>> = BTreeMap::new();
    for record in table.observations() {
        observed_days
            .entry(record.month())
            .or_default()
            .insert(record.timestamp.date());
    }

    let complete: BTreeSet<MonthKey> = observed_days
        .iter()
        .filter(|(month, days)| days_in_month(**month) == Some(days.len()))
        .map(|(month, _)| *month)
        .collect();
    let omitted_months: Vec<MonthKey> = observed_days
        .keys()
        .filter(|month| !complete.contains(*month))
        .copied()
        .collect();

    let rows: Vec<MonthlyTrendRow> = GroupedMeans::reduce(
        table
            .observations()
            .filter(|r| complete.contains(&r.month()))
            .flat_map(|r| {
                let month = r.month();
                r.age_band
                    .contributes_to()
                    .iter()
                    .map(move |band| ((month, *band), r.rating))
            })
            .collect(),
    )
    .into_iter()
    .filter_map(|((month, age_band), acc)| {
        Some(MonthlyTrendRow {
            month,
            age_band,
            mean: acc.mean()?,
            observations: acc.count,
        })
    })
    .collect();

    debug!(
        reported_months = complete.len(),
        omitted_months = omitted_months.len(),
        "monthly trends complete"
    );

    Ok(MonthlyTrendTable {
        rows,
        omitted_months,
    })
}

/// Tie-break order for equal dominant-cell means; smaller wins.
fn dominance_key(band: AgeBand, program: &str) -> (Reverse<usize>, AgeBand, &str) {
    (Reverse(band.specificity()), band, program)
}

/// Number of calendar days in `month`.
fn days_in_month(month: MonthKey) -> Option<usize> {
    let first = month.first_day()?;
    let last = month.last_day()?;
    usize::try_from((last - first).num_days() + 1).ok()
}

// ── Dataset profile ───────────────────────────────────────────────────────────

/// Row counts and date coverage of `table`.
pub fn profile_dataset(table: &RatingTable) -> DatasetProfile {
    let mut programs: BTreeSet<&str> = BTreeSet::new();
    let mut first_date: Option<NaiveDate> = None;
    let mut last_date: Option<NaiveDate> = None;
    let mut observations = 0usize;

    for record in table.observations() {
        observations += 1;
        programs.insert(record.program_id.as_str());
        let date = record.timestamp.date();
        first_date = Some(first_date.map_or(date, |d| d.min(date)));
        last_date = Some(last_date.map_or(date, |d| d.max(date)));
    }

    let observation_share = if table.is_empty() {
        0.0
    } else {
        observations as f64 / table.len() as f64
    };

    DatasetProfile {
        total_rows: table.len(),
        observations,
        zero_rated_rows: table.len() - observations,
        observation_share,
        programs: programs.len(),
        first_date,
        last_date,
    }
}

// ── Summary ───────────────────────────────────────────────────────────────────

/// Derive headline statistics from already-computed tables.
///
/// Never touches the raw table, so the summary cannot disagree with the
/// tables it summarises:
/// * the dominant age band is the band of the highest-mean age-preference
///   cell (ties: most specific band, then taxonomy order, then program id);
/// * the gender skew compares the overall gender means, and is
///   [`GenderSkew::Unknown`] unless both genders were observed;
/// * the best time slot is the slot with the highest overall reading (ties:
///   clock order).
///
/// # Errors
/// [`AnalysisError::InsufficientData`] when the age-preference table is empty.
pub fn get_summary_stats(
    age_preferences: &AgePreferenceTable,
    time_demographics: &TimeDemographicsTable,
    gender_differences: &GenderDifferences,
    profile: &DatasetProfile,
) -> Result<SummaryStats> {
    let mut dominant: Option<(&str, &BandMean)> = None;
    for (program, cell) in age_preferences.entries() {
        let replaces = match dominant {
            None => true,
            Some((best_program, best)) => {
                cell.mean > best.mean
                    || (cell.mean == best.mean
                        && dominance_key(cell.age_band, program)
                            < dominance_key(best.age_band, best_program))
            }
        };
        if replaces {
            dominant = Some((program, cell));
        }
    }
    let (dominant_program, dominant_cell) = dominant.ok_or_else(|| {
        AnalysisError::InsufficientData("age-preference table has no entries".to_string())
    })?;

    let male = gender_differences.overall_mean(Gender::Male);
    let female = gender_differences.overall_mean(Gender::Female);
    let (gender_skew, gender_difference) = match (male, female) {
        (Some(m), Some(f)) => {
            let skew = if f > m {
                GenderSkew::Female
            } else if m > f {
                GenderSkew::Male
            } else {
                GenderSkew::Balanced
            };
            (skew, Some((m - f).abs()))
        }
        _ => (GenderSkew::Unknown, None),
    };

    let mut best_slot: Option<(TimeSlot, f64)> = None;
    for slot in &time_demographics.slots {
        if let Some(value) = slot.overall.value() {
            if best_slot.map_or(true, |(_, best)| value > best) {
                best_slot = Some((slot.slot, value));
            }
        }
    }

    Ok(SummaryStats {
        dominant_age_band: dominant_cell.age_band,
        dominant_program: dominant_program.to_string(),
        dominant_rating: dominant_cell.mean,
        gender_skew,
        gender_difference,
        best_time_slot: best_slot.map(|(slot, _)| slot),
        best_time_slot_rating: best_slot.map(|(_, value)| value),
        audience_share: pooled_band_means(age_preferences),
        total_observations: profile.observations,
        total_programs: profile.programs,
        first_date: profile.first_date,
        last_date: profile.last_date,
    })
}

/// Observation-weighted mean of each band across the ranked programs.
fn pooled_band_means(age_preferences: &AgePreferenceTable) -> Vec<BandMean> {
    AgeBand::ALL
        .iter()
        .filter_map(|&band| {
            let mut weighted = 0.0;
            let mut observations = 0usize;
            for (_, cell) in age_preferences.entries().filter(|(_, c)| c.age_band == band) {
                weighted += cell.mean * cell.observations as f64;
                observations += cell.observations;
            }
            (observations > 0).then(|| BandMean {
                age_band: band,
                mean: weighted / observations as f64,
                observations,
            })
        })
        .collect()
}

// ── Complete analysis ─────────────────────────────────────────────────────────

/// Run every analysis in a fixed order and assemble one [`AnalysisResult`].
///
/// This is the single entry point for consumers. Any failing stage aborts the
/// whole run; no partial result is ever returned.
pub fn run_complete_analysis(table: &RatingTable, config: &EngineConfig) -> Result<AnalysisResult> {
    config.validate()?;
    table.ensure_columns(&REQUIRED_COLUMNS)?;

    info!(
        rows = table.len(),
        min_observations = config.min_observations(),
        top_n = config.top_n(),
        "running complete analysis"
    );

    let age_preferences =
        analyze_age_preferences(table, config.min_observations(), config.top_n())?;
    let time_demographics = analyze_time_demographics(table)?;
    let gender_differences = analyze_gender_differences(table)?;
    let weekday_weekend = analyze_weekday_weekend(table)?;
    let monthly_trends = analyze_monthly_trends(table)?;
    let profile = profile_dataset(table);
    let summary = get_summary_stats(
        &age_preferences,
        &time_demographics,
        &gender_differences,
        &profile,
    )?;

    info!(
        programs_ranked = age_preferences.programs.len(),
        dominant_age_band = %summary.dominant_age_band,
        "complete analysis finished"
    );

    Ok(AnalysisResult {
        age_preferences,
        time_demographics,
        gender_differences,
        weekday_weekend,
        monthly_trends,
        summary,
        profile,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use audience_core::models::DayType;
    use chrono::{Duration, NaiveDateTime};

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn rec(
        at: &str,
        program: &str,
        rating: f64,
        band: AgeBand,
        gender: Option<Gender>,
    ) -> ViewershipRecord {
        ViewershipRecord::new(ts(at), program, rating, band, gender)
    }

    fn table(records: Vec<ViewershipRecord>) -> RatingTable {
        RatingTable::from_records(records).unwrap()
    }

    /// `n` records for `program` at 20:00 on consecutive days from 2024-01-01.
    fn series(program: &str, n: usize, rating: f64, band: AgeBand) -> Vec<ViewershipRecord> {
        let start = ts("2024-01-01 20:00:00");
        (0..n)
            .map(|i| {
                ViewershipRecord::new(
                    start + Duration::days(i as i64),
                    program,
                    rating,
                    band,
                    None,
                )
            })
            .collect()
    }

    fn mixed_table() -> RatingTable {
        let mut records = Vec::new();
        for day in 1..=31 {
            let date = format!("2024-01-{:02}", day);
            records.push(rec(
                &format!("{} 20:00:00", date),
                "Drama A",
                0.40,
                AgeBand::Age25To34,
                Some(Gender::Female),
            ));
            records.push(rec(
                &format!("{} 08:00:00", date),
                "Drama B",
                0.10,
                AgeBand::Age55Plus,
                Some(Gender::Male),
            ));
        }
        records.push(rec("2024-02-03 21:00:00", "Drama A", 0.50, AgeBand::Age15To24, None));
        records.push(rec("2024-02-04 21:00:00", "Drama A", 0.0, AgeBand::Age15To24, None));
        table(records)
    }

    // ── analyze_age_preferences ───────────────────────────────────────────

    #[test]
    fn test_min_observations_filters_out_small_program() {
        let mut records = series("A", 60, 0.27, AgeBand::All4Plus);
        records.extend(series("B", 40, 0.15, AgeBand::All4Plus));
        let prefs = analyze_age_preferences(&table(records), 50, 5).unwrap();

        assert_eq!(prefs.programs.len(), 1);
        assert_eq!(prefs.eligible_programs, 1);
        assert_eq!(prefs.programs[0].program_id, "A");
        assert_eq!(prefs.programs[0].observations, 60);
        assert!((prefs.programs[0].overall_mean - 0.27).abs() < 1e-12);
    }

    #[test]
    fn test_zero_only_program_is_insufficient_data() {
        let records = series("A", 80, 0.0, AgeBand::All4Plus);
        let err = analyze_age_preferences(&table(records), 1, 5).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData(_)));
    }

    #[test]
    fn test_zero_ratings_do_not_count_towards_threshold() {
        let mut records = series("A", 3, 0.2, AgeBand::All4Plus);
        records.extend(series("A", 5, 0.0, AgeBand::All4Plus));
        assert!(analyze_age_preferences(&table(records.clone()), 4, 5).is_err());
        let prefs = analyze_age_preferences(&table(records), 3, 5).unwrap();
        assert_eq!(prefs.programs[0].observations, 3);
        assert!((prefs.programs[0].overall_mean - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_sub_band_record_counts_toward_aggregate_band() {
        let records = vec![rec(
            "2024-01-01 20:00:00",
            "A",
            0.3,
            AgeBand::Age15To24,
            None,
        )];
        let prefs = analyze_age_preferences(&table(records), 1, 1).unwrap();
        let bands: Vec<AgeBand> = prefs.programs[0].by_band.iter().map(|b| b.age_band).collect();

        assert!(bands.contains(&AgeBand::Age15To24));
        assert!(bands.contains(&AgeBand::Age15To44));
        assert!(bands.contains(&AgeBand::All4Plus));
        assert!(!bands.contains(&AgeBand::Age25To34));
        for cell in &prefs.programs[0].by_band {
            assert_eq!(cell.mean, 0.3);
        }
    }

    #[test]
    fn test_by_band_listed_in_taxonomy_order() {
        let records = vec![
            rec("2024-01-01 20:00:00", "A", 0.3, AgeBand::Age55Plus, None),
            rec("2024-01-01 20:00:00", "A", 0.5, AgeBand::Age15To24, None),
        ];
        let prefs = analyze_age_preferences(&table(records), 1, 1).unwrap();
        let bands: Vec<AgeBand> = prefs.programs[0].by_band.iter().map(|b| b.age_band).collect();
        assert_eq!(
            bands,
            vec![
                AgeBand::All4Plus,
                AgeBand::Age15To44,
                AgeBand::Age15To24,
                AgeBand::Age55Plus
            ]
        );
        // 4+ pools both records.
        assert_eq!(prefs.programs[0].by_band[0].observations, 2);
        assert!((prefs.programs[0].by_band[0].mean - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_ranking_ties_broken_by_program_id() {
        let mut records = series("Zeta", 2, 0.3, AgeBand::All4Plus);
        records.extend(series("Alpha", 2, 0.3, AgeBand::All4Plus));
        records.extend(series("Mid", 2, 0.5, AgeBand::All4Plus));
        let prefs = analyze_age_preferences(&table(records), 1, 10).unwrap();

        let order: Vec<&str> = prefs.programs.iter().map(|p| p.program_id.as_str()).collect();
        assert_eq!(order, vec!["Mid", "Alpha", "Zeta"]);
    }

    #[test]
    fn test_top_n_truncates_after_ranking() {
        let mut records = series("A", 2, 0.1, AgeBand::All4Plus);
        records.extend(series("B", 2, 0.3, AgeBand::All4Plus));
        records.extend(series("C", 2, 0.2, AgeBand::All4Plus));
        let prefs = analyze_age_preferences(&table(records), 1, 2).unwrap();

        assert_eq!(prefs.eligible_programs, 3);
        let order: Vec<&str> = prefs.programs.iter().map(|p| p.program_id.as_str()).collect();
        assert_eq!(order, vec!["B", "C"]);
    }

    #[test]
    fn test_zero_thresholds_are_configuration_errors() {
        let t = table(series("A", 2, 0.1, AgeBand::All4Plus));
        assert!(matches!(
            analyze_age_preferences(&t, 0, 1),
            Err(AnalysisError::Configuration(_))
        ));
        assert!(matches!(
            analyze_age_preferences(&t, 1, 0),
            Err(AnalysisError::Configuration(_))
        ));
    }

    // ── analyze_time_demographics ─────────────────────────────────────────

    #[test]
    fn test_single_golden_record_others_no_data() {
        let records = vec![rec("2024-01-01 20:00:00", "A", 0.38, AgeBand::All4Plus, None)];
        let demographics = analyze_time_demographics(&table(records)).unwrap();

        assert_eq!(demographics.slots.len(), 5);
        let golden = demographics.slot(TimeSlot::Golden).unwrap();
        assert_eq!(golden.overall, Reading::Mean(0.38));
        assert_eq!(golden.observations, 1);
        assert_eq!(golden.by_band[0].reading, Reading::Mean(0.38));
        assert!(golden.by_band[1..].iter().all(|c| c.reading.is_no_data()));

        for slot in demographics.slots.iter().filter(|s| s.slot != TimeSlot::Golden) {
            assert_eq!(slot.overall, Reading::NoData);
            assert_eq!(slot.observations, 0);
            assert!(slot.by_band.iter().all(|c| c.reading.is_no_data()));
        }
    }

    #[test]
    fn test_zero_rated_slot_reports_no_data_not_zero() {
        let records = vec![
            rec("2024-01-01 03:00:00", "A", 0.0, AgeBand::All4Plus, None),
            rec("2024-01-01 19:00:00", "A", 0.2, AgeBand::All4Plus, None),
        ];
        let demographics = analyze_time_demographics(&table(records)).unwrap();
        assert_eq!(
            demographics.slot(TimeSlot::Dawn).unwrap().overall,
            Reading::NoData
        );
    }

    #[test]
    fn test_slots_reported_in_clock_order() {
        let demographics = analyze_time_demographics(&table(Vec::new())).unwrap();
        let order: Vec<TimeSlot> = demographics.slots.iter().map(|s| s.slot).collect();
        assert_eq!(order, TimeSlot::ALL.to_vec());
    }

    // ── analyze_gender_differences ────────────────────────────────────────

    #[test]
    fn test_unknown_gender_excluded_everywhere() {
        let records = vec![
            rec("2024-01-01 20:00:00", "A", 0.2, AgeBand::All4Plus, Some(Gender::Male)),
            rec("2024-01-01 20:00:00", "A", 0.4, AgeBand::All4Plus, Some(Gender::Female)),
            rec("2024-01-01 20:00:00", "A", 0.9, AgeBand::All4Plus, None),
        ];
        let gender = analyze_gender_differences(&table(records)).unwrap();

        assert_eq!(gender.overall.len(), 2);
        assert_eq!(gender.overall_mean(Gender::Male), Some(0.2));
        assert_eq!(gender.overall_mean(Gender::Female), Some(0.4));
        assert_eq!(gender.unknown_gender_observations, 1);
        assert_eq!(gender.by_program.len(), 2);
        assert!(gender.by_program.iter().all(|p| p.mean < 0.9));
        assert_eq!(
            gender.by_age_band.iter().map(|b| b.observations).sum::<usize>(),
            2
        );
    }

    #[test]
    fn test_gender_by_band_uses_overlap() {
        let records = vec![rec(
            "2024-01-01 20:00:00",
            "A",
            0.2,
            AgeBand::Age35To44,
            Some(Gender::Male),
        )];
        let gender = analyze_gender_differences(&table(records)).unwrap();
        let bands: Vec<AgeBand> = gender.by_age_band.iter().map(|b| b.age_band).collect();
        assert_eq!(
            bands,
            vec![AgeBand::All4Plus, AgeBand::Age15To44, AgeBand::Age35To44]
        );
    }

    // ── analyze_weekday_weekend ───────────────────────────────────────────

    #[test]
    fn test_weekday_weekend_partition() {
        // 2024-01-05 is a Friday, 2024-01-06 a Saturday, 2024-01-07 a Sunday.
        let records = vec![
            rec("2024-01-05 20:00:00", "A", 0.2, AgeBand::All4Plus, None),
            rec("2024-01-06 20:00:00", "A", 0.4, AgeBand::All4Plus, None),
            rec("2024-01-07 20:00:00", "A", 0.6, AgeBand::All4Plus, None),
        ];
        let split = analyze_weekday_weekend(&table(records)).unwrap();

        assert_eq!(split.by_program.len(), 2);
        assert_eq!(split.by_program[0].day_type, DayType::Weekday);
        assert_eq!(split.by_program[0].mean, 0.2);
        assert_eq!(split.by_program[1].day_type, DayType::Weekend);
        assert_eq!(split.by_program[1].observations, 2);
        assert!((split.by_program[1].mean - 0.5).abs() < 1e-12);
        assert_eq!(split.by_age_band.len(), 2);
    }

    #[test]
    fn test_weekday_weekend_uses_weekday_column() {
        // The weekday column is authoritative even if it disagrees with the date.
        let mut record = rec("2024-01-05 20:00:00", "A", 0.3, AgeBand::All4Plus, None);
        record.weekday = 6;
        let split = analyze_weekday_weekend(&table(vec![record])).unwrap();
        assert_eq!(split.by_program[0].day_type, DayType::Weekend);
    }

    // ── analyze_monthly_trends ────────────────────────────────────────────

    #[test]
    fn test_partial_month_omitted() {
        let monthly = analyze_monthly_trends(&mixed_table()).unwrap();

        assert_eq!(monthly.months(), vec![MonthKey { year: 2024, month: 1 }]);
        assert_eq!(monthly.omitted_months, vec![MonthKey { year: 2024, month: 2 }]);
        assert!(monthly.rows.iter().all(|r| r.month.month == 1));
    }

    #[test]
    fn test_full_month_rows_per_band() {
        let monthly = analyze_monthly_trends(&mixed_table()).unwrap();
        let four_plus = monthly
            .rows
            .iter()
            .find(|r| r.age_band == AgeBand::All4Plus)
            .unwrap();
        assert_eq!(four_plus.observations, 62);
        let senior = monthly
            .rows
            .iter()
            .find(|r| r.age_band == AgeBand::Age55Plus)
            .unwrap();
        assert_eq!(senior.observations, 31);
        assert!((senior.mean - 0.10).abs() < 1e-12);
    }

    #[test]
    fn test_month_without_last_day_is_omitted() {
        let records = (1..=30)
            .map(|day| {
                rec(
                    &format!("2024-01-{:02} 20:00:00", day),
                    "A",
                    0.2,
                    AgeBand::All4Plus,
                    None,
                )
            })
            .collect();
        let monthly = analyze_monthly_trends(&table(records)).unwrap();
        assert!(monthly.rows.is_empty());
        assert_eq!(monthly.omitted_months.len(), 1);
    }

    #[test]
    fn test_month_with_gap_is_omitted() {
        // First and last day present, 2024-01-02 to 2024-01-30 missing.
        let records = vec![
            rec("2024-01-01 20:00:00", "A", 0.2, AgeBand::All4Plus, None),
            rec("2024-01-31 20:00:00", "A", 0.4, AgeBand::All4Plus, None),
        ];
        let monthly = analyze_monthly_trends(&table(records)).unwrap();
        assert!(monthly.rows.is_empty());
        assert_eq!(monthly.omitted_months, vec![MonthKey { year: 2024, month: 1 }]);
    }

    #[test]
    fn test_single_missing_day_omits_month() {
        let records = (1..=29)
            .filter(|day| *day != 14)
            .map(|day| {
                rec(
                    &format!("2024-02-{:02} 20:00:00", day),
                    "A",
                    0.2,
                    AgeBand::All4Plus,
                    None,
                )
            })
            .collect();
        let monthly = analyze_monthly_trends(&table(records)).unwrap();
        assert!(monthly.rows.is_empty());
        assert_eq!(monthly.omitted_months, vec![MonthKey { year: 2024, month: 2 }]);
    }

    #[test]
    fn test_zero_rated_day_does_not_complete_month() {
        let mut records: Vec<ViewershipRecord> = (1..=30)
            .map(|day| {
                rec(
                    &format!("2024-04-{:02} 20:00:00", day),
                    "A",
                    0.2,
                    AgeBand::All4Plus,
                    None,
                )
            })
            .collect();
        records[9].rating = 0.0;
        let monthly = analyze_monthly_trends(&table(records)).unwrap();
        assert!(monthly.rows.is_empty());
        assert_eq!(monthly.omitted_months.len(), 1);
    }

    // ── profile / summary ─────────────────────────────────────────────────

    #[test]
    fn test_profile_counts_zero_rated_rows() {
        let profile = profile_dataset(&mixed_table());
        assert_eq!(profile.total_rows, 64);
        assert_eq!(profile.observations, 63);
        assert_eq!(profile.zero_rated_rows, 1);
        assert_eq!(profile.programs, 2);
        assert_eq!(profile.first_date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(profile.last_date, NaiveDate::from_ymd_opt(2024, 2, 3));
    }

    #[test]
    fn test_summary_names_max_cell_band() {
        let config = EngineConfig::new(1, 10).unwrap();
        let result = run_complete_analysis(&mixed_table(), &config).unwrap();

        let max_cell = result
            .age_preferences
            .entries()
            .map(|(_, c)| c.mean)
            .fold(f64::MIN, f64::max);
        assert_eq!(result.summary.dominant_rating, max_cell);
        assert!(result
            .age_preferences
            .entries()
            .any(|(_, c)| c.age_band == result.summary.dominant_age_band && c.mean == max_cell));
        // Drama A's 15-24 cell holds the single 0.50 observation.
        assert_eq!(result.summary.dominant_age_band, AgeBand::Age15To24);
        assert_eq!(result.summary.dominant_program, "Drama A");
    }

    #[test]
    fn test_summary_gender_skew_and_best_slot() {
        let config = EngineConfig::new(1, 10).unwrap();
        let result = run_complete_analysis(&mixed_table(), &config).unwrap();

        assert_eq!(result.summary.gender_skew, GenderSkew::Female);
        assert!((result.summary.gender_difference.unwrap() - 0.30).abs() < 1e-12);
        assert_eq!(result.summary.best_time_slot, Some(TimeSlot::Golden));
        assert_eq!(result.summary.total_observations, 63);
        assert_eq!(result.summary.total_programs, 2);
    }

    #[test]
    fn test_summary_skew_unknown_when_gender_missing() {
        let records = series("A", 3, 0.2, AgeBand::All4Plus);
        let config = EngineConfig::new(1, 1).unwrap();
        let result = run_complete_analysis(&table(records), &config).unwrap();
        assert_eq!(result.summary.gender_skew, GenderSkew::Unknown);
        assert_eq!(result.summary.gender_difference, None);
    }

    #[test]
    fn test_summary_skew_unknown_for_single_gender() {
        let records = (1..=4)
            .map(|day| {
                rec(
                    &format!("2024-01-0{} 20:00:00", day),
                    "A",
                    0.3,
                    AgeBand::Age25To34,
                    Some(Gender::Female),
                )
            })
            .collect();
        let config = EngineConfig::new(1, 1).unwrap();
        let result = run_complete_analysis(&table(records), &config).unwrap();
        assert_eq!(result.summary.gender_skew, GenderSkew::Unknown);
        assert_eq!(result.summary.gender_difference, None);
    }

    #[test]
    fn test_summary_balanced_when_gender_means_equal() {
        let records = vec![
            rec("2024-01-01 20:00:00", "A", 0.3, AgeBand::All4Plus, Some(Gender::Male)),
            rec("2024-01-01 20:00:00", "A", 0.3, AgeBand::All4Plus, Some(Gender::Female)),
        ];
        let config = EngineConfig::new(1, 1).unwrap();
        let result = run_complete_analysis(&table(records), &config).unwrap();
        assert_eq!(result.summary.gender_skew, GenderSkew::Balanced);
        assert_eq!(result.summary.gender_difference, Some(0.0));
    }

    #[test]
    fn test_dominant_tie_prefers_most_specific_band() {
        // 25-34 only: the 25-34, 15-44 and 4+ cells all carry the same mean.
        let records = series("A", 3, 0.25, AgeBand::Age25To34);
        let config = EngineConfig::new(1, 1).unwrap();
        let result = run_complete_analysis(&table(records), &config).unwrap();
        assert_eq!(result.summary.dominant_age_band, AgeBand::Age25To34);
        assert_eq!(result.summary.dominant_rating, 0.25);
    }

    #[test]
    fn test_profile_observation_share() {
        let profile = profile_dataset(&mixed_table());
        assert_eq!(profile.observation_share, 63.0 / 64.0);
        assert_eq!(profile_dataset(&table(Vec::new())).observation_share, 0.0);
    }

    #[test]
    fn test_summary_rejects_empty_age_preferences() {
        let empty = AgePreferenceTable {
            min_observations: 1,
            top_n: 1,
            eligible_programs: 0,
            programs: Vec::new(),
        };
        let t = table(Vec::new());
        let err = get_summary_stats(
            &empty,
            &analyze_time_demographics(&t).unwrap(),
            &analyze_gender_differences(&t).unwrap(),
            &profile_dataset(&t),
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData(_)));
    }

    #[test]
    fn test_audience_share_is_observation_weighted() {
        let mut records = series("A", 3, 0.3, AgeBand::All4Plus);
        records.extend(series("B", 1, 0.7, AgeBand::All4Plus));
        let config = EngineConfig::new(1, 5).unwrap();
        let result = run_complete_analysis(&table(records), &config).unwrap();

        let share = &result.summary.audience_share;
        assert_eq!(share.len(), 1);
        assert_eq!(share[0].observations, 4);
        assert!((share[0].mean - 0.4).abs() < 1e-12);
    }

    // ── run_complete_analysis ─────────────────────────────────────────────

    #[test]
    fn test_complete_analysis_is_deterministic() {
        let config = EngineConfig::new(1, 10).unwrap();
        let t = mixed_table();
        let first = run_complete_analysis(&t, &config).unwrap();
        let second = run_complete_analysis(&t, &config).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            first.summary.dominant_rating.to_bits(),
            second.summary.dominant_rating.to_bits()
        );
        assert!(first.is_summary_consistent());
    }

    #[test]
    fn test_complete_analysis_missing_column_is_schema_error() {
        let t = RatingTable::with_columns(
            ["timestamp", "program_id", "rating", "age_band", "weekday"],
            series("A", 3, 0.2, AgeBand::All4Plus),
        )
        .unwrap();
        let config = EngineConfig::new(1, 1).unwrap();
        let err = run_complete_analysis(&t, &config).unwrap_err();
        assert!(matches!(err, AnalysisError::Schema { ref column, .. } if column == "gender"));
    }

    #[test]
    fn test_complete_analysis_fails_whole_when_threshold_unmet() {
        let config = EngineConfig::new(1_000, 10).unwrap();
        let err = run_complete_analysis(&mixed_table(), &config).unwrap_err();
        assert!(err.is_recoverable());
    }
}

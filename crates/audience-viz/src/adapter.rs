//! Mapping from an [`AnalysisResult`] to chart specifications.
//!
//! The adapter only rearranges values that are already in the result. It
//! never aggregates, filters or rounds, so every number a chart shows is
//! bit-identical to the corresponding table entry.

use audience_core::formatting::format_count;
use audience_core::models::{AgeBand, DayType, Gender, MonthKey, TimeSlot};
use audience_data::result::{AnalysisResult, GenderSkew};

use crate::chart::{ChartKind, ChartSpec, GridLayout, Series};
use crate::themes::{age_band_color, day_type_color, gender_color};

pub const AGE_PREFERENCE_HEATMAP: &str = "age_preference_heatmap";
pub const TIME_SLOT_DEMOGRAPHICS: &str = "time_slot_demographics";
pub const GENDER_BY_AGE_BAND: &str = "gender_by_age_band";
pub const PROGRAM_GENDER_PREFERENCE: &str = "program_gender_preference";
pub const WEEKDAY_WEEKEND_PROGRAMS: &str = "weekday_weekend_programs";
pub const WEEKDAY_WEEKEND_AGE_BANDS: &str = "weekday_weekend_age_bands";
pub const MONTHLY_TRENDS: &str = "monthly_trends";
pub const AUDIENCE_SHARE: &str = "audience_share";
pub const SUMMARY_PANEL: &str = "summary";
pub const REPORT_FIGURE: &str = "report_figure";

const RATING_AXIS: &str = "Mean rating";

pub const SUMMARY_DOMINANT_RATING: &str = "Dominant rating";
pub const SUMMARY_GENDER_DIFFERENCE: &str = "Gender difference";
pub const SUMMARY_BEST_SLOT_RATING: &str = "Best slot rating";
pub const SUMMARY_OBSERVATION_SHARE: &str = "Observation share";

/// Build the eight dashboard charts in fixed order.
///
/// Calling it twice on the same result yields equal specs; the caller
/// decides how many to render.
pub fn build_dashboard_charts(result: &AnalysisResult) -> Vec<ChartSpec> {
    vec![
        age_preference_heatmap(result),
        time_slot_demographics(result),
        gender_by_age_band(result),
        program_gender_preference(result),
        weekday_weekend_programs(result),
        weekday_weekend_age_bands(result),
        monthly_trends(result),
        audience_share(result),
    ]
}

/// Build one composite figure: the dashboard charts plus a summary panel on
/// a 3×3 grid.
pub fn build_static_report_figure(result: &AnalysisResult) -> ChartSpec {
    let mut figure = ChartSpec::new(
        REPORT_FIGURE,
        "Audience Demographics Report",
        ChartKind::Composite,
    );
    figure.grid = Some(GridLayout { rows: 3, columns: 3 });
    figure.panels = build_dashboard_charts(result);
    figure.panels.push(summary_panel(result));
    figure
}

// ── Individual charts ─────────────────────────────────────────────────────────

fn age_preference_heatmap(result: &AnalysisResult) -> ChartSpec {
    let programs = &result.age_preferences.programs;
    let mut chart = ChartSpec::new(
        AGE_PREFERENCE_HEATMAP,
        "Program Preference by Age Band",
        ChartKind::Heatmap,
    )
    .with_axes("Age band", "Program");
    chart.categories = programs.iter().map(|p| p.program_id.clone()).collect();
    chart.series = AgeBand::ALL
        .iter()
        .map(|&band| Series {
            name: band.label().to_string(),
            color: None,
            values: programs
                .iter()
                .map(|p| {
                    p.by_band
                        .iter()
                        .find(|cell| cell.age_band == band)
                        .map(|cell| cell.mean)
                })
                .collect(),
        })
        .collect();
    chart
}

fn time_slot_demographics(result: &AnalysisResult) -> ChartSpec {
    let slots = &result.time_demographics.slots;
    let mut chart = ChartSpec::new(
        TIME_SLOT_DEMOGRAPHICS,
        "Time Slot Viewing by Age Band",
        ChartKind::GroupedBar,
    )
    .with_axes("Time slot", RATING_AXIS);
    chart.categories = slots.iter().map(|s| slot_category(s.slot)).collect();
    chart.series = AgeBand::ALL
        .iter()
        .map(|&band| Series {
            name: band.label().to_string(),
            color: Some(age_band_color(band).to_string()),
            values: slots
                .iter()
                .map(|s| {
                    s.by_band
                        .iter()
                        .find(|cell| cell.age_band == band)
                        .and_then(|cell| cell.reading.value())
                })
                .collect(),
        })
        .collect();
    chart
}

fn gender_by_age_band(result: &AnalysisResult) -> ChartSpec {
    let rows = &result.gender_differences.by_age_band;
    let bands = distinct(rows.iter().map(|r| r.age_band));
    let mut chart = ChartSpec::new(
        GENDER_BY_AGE_BAND,
        "Gender Difference by Age Band",
        ChartKind::GroupedBar,
    )
    .with_axes("Age band", RATING_AXIS);
    chart.categories = bands.iter().map(|b| b.label().to_string()).collect();
    chart.series = Gender::ALL
        .iter()
        .map(|&gender| Series {
            name: gender.label().to_string(),
            color: Some(gender_color(gender).to_string()),
            values: bands
                .iter()
                .map(|&band| {
                    rows.iter()
                        .find(|r| r.age_band == band && r.gender == gender)
                        .map(|r| r.mean)
                })
                .collect(),
        })
        .collect();
    chart
}

fn program_gender_preference(result: &AnalysisResult) -> ChartSpec {
    let rows = &result.gender_differences.by_program;
    let programs = distinct(rows.iter().map(|r| r.program_id.as_str()));
    let mut chart = ChartSpec::new(
        PROGRAM_GENDER_PREFERENCE,
        "Program Preference by Gender",
        ChartKind::HorizontalBar,
    )
    .with_axes(RATING_AXIS, "Program");
    chart.categories = programs.iter().map(|p| p.to_string()).collect();
    chart.series = Gender::ALL
        .iter()
        .map(|&gender| Series {
            name: gender.label().to_string(),
            color: Some(gender_color(gender).to_string()),
            values: programs
                .iter()
                .map(|&program| {
                    rows.iter()
                        .find(|r| r.program_id == program && r.gender == gender)
                        .map(|r| r.mean)
                })
                .collect(),
        })
        .collect();
    chart
}

fn weekday_weekend_programs(result: &AnalysisResult) -> ChartSpec {
    let rows = &result.weekday_weekend.by_program;
    let programs = distinct(rows.iter().map(|r| r.program_id.as_str()));
    let mut chart = ChartSpec::new(
        WEEKDAY_WEEKEND_PROGRAMS,
        "Weekday vs Weekend by Program",
        ChartKind::GroupedBar,
    )
    .with_axes("Program", RATING_AXIS);
    chart.categories = programs.iter().map(|p| p.to_string()).collect();
    chart.series = DayType::ALL
        .iter()
        .map(|&day| Series {
            name: day.label().to_string(),
            color: Some(day_type_color(day).to_string()),
            values: programs
                .iter()
                .map(|&program| {
                    rows.iter()
                        .find(|r| r.program_id == program && r.day_type == day)
                        .map(|r| r.mean)
                })
                .collect(),
        })
        .collect();
    chart
}

fn weekday_weekend_age_bands(result: &AnalysisResult) -> ChartSpec {
    let rows = &result.weekday_weekend.by_age_band;
    let bands = distinct(rows.iter().map(|r| r.age_band));
    let mut chart = ChartSpec::new(
        WEEKDAY_WEEKEND_AGE_BANDS,
        "Weekday vs Weekend by Age Band",
        ChartKind::GroupedBar,
    )
    .with_axes("Age band", RATING_AXIS);
    chart.categories = bands.iter().map(|b| b.label().to_string()).collect();
    chart.series = DayType::ALL
        .iter()
        .map(|&day| Series {
            name: day.label().to_string(),
            color: Some(day_type_color(day).to_string()),
            values: bands
                .iter()
                .map(|&band| {
                    rows.iter()
                        .find(|r| r.age_band == band && r.day_type == day)
                        .map(|r| r.mean)
                })
                .collect(),
        })
        .collect();
    chart
}

fn monthly_trends(result: &AnalysisResult) -> ChartSpec {
    let rows = &result.monthly_trends.rows;
    let months: Vec<MonthKey> = result.monthly_trends.months();
    let bands = distinct(rows.iter().map(|r| r.age_band));
    let mut chart = ChartSpec::new(
        MONTHLY_TRENDS,
        "Monthly Rating Trend by Age Band",
        ChartKind::Line,
    )
    .with_axes("Month", RATING_AXIS);
    chart.categories = months.iter().map(MonthKey::to_string).collect();
    chart.series = bands
        .iter()
        .map(|&band| Series {
            name: band.label().to_string(),
            color: Some(age_band_color(band).to_string()),
            values: months
                .iter()
                .map(|&month| {
                    rows.iter()
                        .find(|r| r.month == month && r.age_band == band)
                        .map(|r| r.mean)
                })
                .collect(),
        })
        .collect();
    chart
}

fn audience_share(result: &AnalysisResult) -> ChartSpec {
    let share = &result.summary.audience_share;
    let mut chart = ChartSpec::new(
        AUDIENCE_SHARE,
        "Audience Distribution by Age Band",
        ChartKind::Pie,
    )
    .with_axes("Age band", RATING_AXIS);
    chart.categories = share.iter().map(|b| b.age_band.label().to_string()).collect();
    chart.category_colors = share
        .iter()
        .map(|b| age_band_color(b.age_band).to_string())
        .collect();
    chart.series = vec![Series {
        name: RATING_AXIS.to_string(),
        color: None,
        values: share.iter().map(|b| Some(b.mean)).collect(),
    }];
    chart
}

fn summary_panel(result: &AnalysisResult) -> ChartSpec {
    let summary = &result.summary;
    let mut panel = ChartSpec::new(SUMMARY_PANEL, "Summary", ChartKind::Summary);

    let skew = match summary.gender_skew {
        GenderSkew::Female => "female",
        GenderSkew::Male => "male",
        GenderSkew::Balanced => "balanced",
        GenderSkew::Unknown => "unknown",
    };
    let period = match (summary.first_date, summary.last_date) {
        (Some(first), Some(last)) => format!("{} to {}", first, last),
        _ => "n/a".to_string(),
    };

    panel.text = vec![
        format!(
            "Dominant age band: {} on {}",
            summary.dominant_age_band, summary.dominant_program
        ),
        format!("Gender skew: {}", skew),
        format!(
            "Best time slot: {}",
            summary
                .best_time_slot
                .map(slot_category)
                .unwrap_or_else(|| "n/a".to_string())
        ),
        format!(
            "Observations: {} of {} rows",
            format_count(summary.total_observations),
            format_count(result.profile.total_rows)
        ),
        format!("Programs: {}", format_count(summary.total_programs)),
        format!("Period: {}", period),
    ];
    if !result.monthly_trends.omitted_months.is_empty() {
        let omitted: Vec<String> = result
            .monthly_trends
            .omitted_months
            .iter()
            .map(MonthKey::to_string)
            .collect();
        panel
            .text
            .push(format!("Partial months omitted: {}", omitted.join(", ")));
    }

    // Figures travel unformatted; renderers and exporters round them.
    let figures = [
        (SUMMARY_DOMINANT_RATING, Some(summary.dominant_rating)),
        (SUMMARY_GENDER_DIFFERENCE, summary.gender_difference),
        (SUMMARY_BEST_SLOT_RATING, summary.best_time_slot_rating),
        (SUMMARY_OBSERVATION_SHARE, Some(result.profile.observation_share)),
    ];
    panel.categories = figures.iter().map(|(label, _)| label.to_string()).collect();
    panel.series = vec![Series {
        name: "Value".to_string(),
        color: None,
        values: figures.iter().map(|(_, value)| *value).collect(),
    }];
    panel
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn slot_category(slot: TimeSlot) -> String {
    let (start, end) = slot.hours();
    format!("{} ({:02}-{:02})", slot.label(), start, end)
}

/// Distinct values in first-seen order.
fn distinct<T: PartialEq + Copy>(values: impl Iterator<Item = T>) -> Vec<T> {
    let mut seen: Vec<T> = Vec::new();
    for v in values {
        if !seen.contains(&v) {
            seen.push(v);
        }
    }
    seen
}

// ── Tests ─────────────────────────────────────────────────────────────────────

use ratatui::style::{Color, Modifier, Style};

use audience_core::models::{AgeBand, DayType, Gender};

// ── Series palette ────────────────────────────────────────────────────────────

/// Hex colour of an age band, stable across every chart.
pub fn age_band_color(band: AgeBand) -> &'static str {
    match band {
        AgeBand::All4Plus => "#1f77b4",
        AgeBand::Age15To44 => "#ff7f0e",
        AgeBand::Age15To24 => "#2ca02c",
        AgeBand::Age25To34 => "#d62728",
        AgeBand::Age35To44 => "#9467bd",
        AgeBand::Age45To54 => "#8c564b",
        AgeBand::Age55Plus => "#e377c2",
    }
}

pub fn gender_color(gender: Gender) -> &'static str {
    match gender {
        Gender::Male => "#add8e6",
        Gender::Female => "#f08080",
    }
}

pub fn day_type_color(day: DayType) -> &'static str {
    match day {
        DayType::Weekday => "#87ceeb",
        DayType::Weekend => "#ffa500",
    }
}

/// Parse `"#rrggbb"` into a terminal colour.
pub fn hex_to_color(hex: &str) -> Option<Color> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(digits.get(range)?, 16).ok();
    Some(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

// ── Terminal theme ────────────────────────────────────────────────────────────

/// Terminal background type detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackgroundType {
    Dark,
    Light,
}

/// Detect terminal background type from the `COLORFGBG` environment variable.
///
/// The variable has the format `"foreground;background"`. Background values
/// 0–6 are dark, 7–15 light. Anything else is treated as dark.
pub fn detect_background() -> BackgroundType {
    std::env::var("COLORFGBG")
        .ok()
        .and_then(|val| val.split(';').next_back()?.parse::<u8>().ok())
        .map(|bg| {
            if bg <= 6 {
                BackgroundType::Dark
            } else {
                BackgroundType::Light
            }
        })
        .unwrap_or(BackgroundType::Dark)
}

/// Styles used by the chart tables and the explorer chrome.
#[derive(Debug, Clone)]
pub struct Theme {
    pub title: Style,
    pub text: Style,
    pub dim: Style,
    pub value: Style,
    pub status: Style,
    pub warning: Style,

    // ── Table ────────────────────────────────────────────────────────────────
    pub table_header: Style,
    pub table_border: Style,
    pub table_row: Style,
    pub table_row_alt: Style,
    pub no_data: Style,
}

impl Theme {
    /// Dark-background terminal theme (default).
    pub fn dark() -> Self {
        Self {
            title: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            text: Style::default().fg(Color::White),
            dim: Style::default().fg(Color::DarkGray),
            value: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            status: Style::default().fg(Color::Gray),
            warning: Style::default().fg(Color::Yellow),

            table_header: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            table_border: Style::default().fg(Color::DarkGray),
            table_row: Style::default().fg(Color::White),
            table_row_alt: Style::default().fg(Color::Gray),
            no_data: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        }
    }

    /// Light-background terminal theme.
    pub fn light() -> Self {
        Self {
            title: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            text: Style::default().fg(Color::Black),
            dim: Style::default().fg(Color::Gray),
            value: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            status: Style::default().fg(Color::DarkGray),
            warning: Style::default().fg(Color::Red),

            table_header: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            table_border: Style::default().fg(Color::Gray),
            table_row: Style::default().fg(Color::Black),
            table_row_alt: Style::default().fg(Color::DarkGray),
            no_data: Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),
        }
    }

    /// Pick a theme from the terminal background.
    pub fn auto_detect() -> Self {
        match detect_background() {
            BackgroundType::Light => Self::light(),
            BackgroundType::Dark => Self::dark(),
        }
    }

    /// Construct a theme by name. Unknown names fall back to `auto_detect`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "light" => Self::light(),
            "dark" => Self::dark(),
            _ => Self::auto_detect(),
        }
    }

    /// Header style for a series, tinted with its colour when it has one.
    pub fn series_header(&self, color: Option<&str>) -> Style {
        match color.and_then(hex_to_color) {
            Some(c) => self.table_header.fg(c),
            None => self.table_header,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

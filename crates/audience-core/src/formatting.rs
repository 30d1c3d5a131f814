//! Presentation-time formatting.
//!
//! Rounding lives here and nowhere else: the engine keeps full `f64`
//! precision, and only exporters and renderers call into this module.

/// Decimal places used whenever a rating is written or displayed.
pub const RATING_DECIMALS: usize = 4;

/// Marker shown for a cell with no surviving observations.
pub const NO_DATA_LABEL: &str = "no data";

/// Format a rating with [`RATING_DECIMALS`] fixed decimals.
///
/// # Examples
///
/// ```
/// use audience_core::formatting::format_rating;
///
/// assert_eq!(format_rating(0.27), "0.2700");
/// assert_eq!(format_rating(0.123456), "0.1235");
/// ```
pub fn format_rating(value: f64) -> String {
    format!("{:.prec$}", value, prec = RATING_DECIMALS)
}

/// Round a rating to [`RATING_DECIMALS`] places for numeric output.
pub fn round_rating(value: f64) -> f64 {
    let factor = 10_f64.powi(RATING_DECIMALS as i32);
    (value * factor).round() / factor
}

/// Format an optional rating, using [`NO_DATA_LABEL`] for `None`.
pub fn format_optional_rating(value: Option<f64>) -> String {
    match value {
        Some(v) => format_rating(v),
        None => NO_DATA_LABEL.to_string(),
    }
}

/// Format a count with thousands separators.
///
/// # Examples
///
/// ```
/// use audience_core::formatting::format_count;
///
/// assert_eq!(format_count(1_234_567), "1,234,567");
/// assert_eq!(format_count(42), "42");
/// ```
pub fn format_count(value: usize) -> String {
    group_thousands(&value.to_string())
}

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = chars.len() % 3;
    for (i, &c) in chars.iter().enumerate() {
        if i != 0 && (i % 3 == remainder) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

//! Number rendering for emitted G-code.
//!
//! Controllers reject exponent notation, so every coordinate goes through
//! [`number`].

/// Fractional digits kept when rendering a coordinate.
pub const DECIMALS: usize = 5;

/// Render `value` in fixed notation with at most [`DECIMALS`] fractional
/// digits, trailing zeros removed and `.` as separator.
pub fn number(value: f64) -> String {
    let mut text = format!("{:.*}", DECIMALS, value);
    if text.contains('.') {
        let trimmed = text.trim_end_matches('0').trim_end_matches('.').len();
        text.truncate(trimmed);
    }
    if text == "-0" {
        text.remove(0);
    }
    text
}

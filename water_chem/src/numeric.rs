/// Decimal token parsing shared by the daily and monthly readers.
///
/// Report text is full of tokens that look almost numeric: unit suffixes,
/// "<0.1" detection limits, "N/A" placeholders. Only plain decimal notation
/// is accepted; anything else is treated as "not a number" rather than an
/// error.

use rust_decimal::Decimal;
use std::str::FromStr;

/// Parses `token` as a decimal number.
///
/// Accepts an optional leading sign, digits, and an optional fractional
/// part (`"7.8"`, `"-0.5"`, `".25"`, `"180"`). Surrounding whitespace is
/// ignored. Returns `None` for blanks, placeholders, detection-limit
/// markers, scientific notation and values outside `Decimal` range.
pub fn parse_decimal(token: &str) -> Option<Decimal> {
    let trimmed = token.trim();
    if !is_plain_decimal(trimmed) {
        return None;
    }
    Decimal::from_str(trimmed).ok()
}

/// Returns `true` if `token` would parse with [`parse_decimal`].
pub fn is_numeric(token: &str) -> bool {
    parse_decimal(token).is_some()
}

fn is_plain_decimal(s: &str) -> bool {
    let digits = s.strip_prefix(['-', '+']).unwrap_or(s);
    let mut seen_digit = false;
    let mut seen_point = false;
    for c in digits.chars() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_point => seen_point = true,
            _ => return false,
        }
    }
    seen_digit
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_integers_and_fractions() {
        assert_eq!(parse_decimal("180"), Some(Decimal::new(180, 0)));
        assert_eq!(parse_decimal("7.8"), Some(Decimal::new(78, 1)));
        assert_eq!(parse_decimal(" 95.0\n"), Some(Decimal::new(950, 1)));
        assert_eq!(parse_decimal(".25"), Some(Decimal::new(25, 2)));
        assert_eq!(parse_decimal("-0.5"), Some(Decimal::new(-5, 1)));
    }

    #[test]
    fn test_rejects_placeholders_and_blanks() {
        for token in ["", "   ", "N/A", "-", "pending", ".", "+"] {
            assert_eq!(parse_decimal(token), None, "token {:?} should not parse", token);
        }
    }

    #[test]
    fn test_rejects_units_and_detection_limits() {
        for token in ["<0.1", "mg/L", "30mg", "1.2.3", "1e5", "1,000"] {
            assert!(!is_numeric(token), "token {:?} should not parse", token);
        }
    }

    #[test]
    fn test_out_of_range_is_not_numeric() {
        assert!(!is_numeric("99999999999999999999999999999999999"));
    }
}

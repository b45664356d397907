//! Decoding of Excellon coordinate tokens.
//!
//! Coordinates are either written with an explicit decimal point, in which
//! case they are plain decimals, or as bare digit strings whose decimal
//! point is implied by the zero suppression mode and the coordinate format
//! of the active unit system.

use crate::error::ExcellonError;

use super::types::{DigitFormats, Units, ZeroSuppression};

/// Decodes a single coordinate token into a value in the active units.
///
/// - A token containing `.` is parsed literally.
/// - Under [`ZeroSuppression::Leading`] the decimal point sits `upper` digits
///   from the left: `value / 10^(digits - upper)`.
/// - Under [`ZeroSuppression::Trailing`] it sits `lower` digits from the
///   right: `value / 10^lower`.
///
/// A leading sign is kept and does not count as a digit.
///
/// # Errors
///
/// Returns [`ExcellonError::Format`] for empty tokens, tokens with anything
/// other than digits after the sign, and values that overflow `f64`.
pub fn decode(
    token: &str,
    zeros: ZeroSuppression,
    units: Units,
    formats: &DigitFormats,
) -> Result<f64, ExcellonError> {
    let token = token.trim();

    if token.contains('.') {
        return parse_literal(token);
    }

    let (negative, digits) = split_sign(token);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ExcellonError::Format(format!(
            "`{token}` is not a coordinate"
        )));
    }

    let magnitude: f64 = digits
        .parse()
        .map_err(|err| ExcellonError::Format(format!("`{token}`: {err}")))?;

    let format = formats.for_units(units);
    let shift = match zeros {
        ZeroSuppression::Leading => {
            let digit_count = i32::try_from(digits.len())
                .map_err(|_| ExcellonError::Format(format!("`{token}` has too many digits")))?;
            digit_count - i32::from(format.upper)
        }
        ZeroSuppression::Trailing => i32::from(format.lower),
    };

    let value = magnitude / 10f64.powi(shift);
    if !value.is_finite() {
        return Err(ExcellonError::Format(format!("`{token}` is out of range")));
    }

    Ok(if negative { -value } else { value })
}

/// Parses a token with an explicit decimal point.
///
/// # Errors
///
/// Returns [`ExcellonError::Format`] if the token is not a finite decimal.
pub fn parse_literal(token: &str) -> Result<f64, ExcellonError> {
    let value: f64 = token
        .trim()
        .parse()
        .map_err(|err| ExcellonError::Format(format!("`{token}`: {err}")))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ExcellonError::Format(format!("`{token}` is out of range")))
    }
}

fn split_sign(token: &str) -> (bool, &str) {
    if let Some(rest) = token.strip_prefix('-') {
        (true, rest)
    } else if let Some(rest) = token.strip_prefix('+') {
        (false, rest)
    } else {
        (false, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::excellon::types::CoordinateFormat;

    const EPSILON: f64 = 1e-9;

    fn formats() -> DigitFormats {
        DigitFormats {
            metric: CoordinateFormat::new(3, 3),
            inch: CoordinateFormat::new(2, 4),
        }
    }

    fn decode_ok(token: &str, zeros: ZeroSuppression, units: Units) -> f64 {
        let result = decode(token, zeros, units, &formats());
        assert!(result.is_ok(), "expected `{token}` to decode: {result:?}");
        result.unwrap_or(f64::NAN)
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < EPSILON,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn ut_num_001_leading_zeros_metric() {
        assert_close(decode_ok("010000", ZeroSuppression::Leading, Units::Metric), 10.0);
        assert_close(decode_ok("0105", ZeroSuppression::Leading, Units::Metric), 10.5);
        assert_close(decode_ok("12", ZeroSuppression::Leading, Units::Metric), 120.0);
    }

    #[test]
    fn ut_num_002_trailing_zeros_inch() {
        assert_close(decode_ok("12345", ZeroSuppression::Trailing, Units::Inch), 1.2345);
        assert_close(decode_ok("500", ZeroSuppression::Trailing, Units::Inch), 0.05);
    }

    #[test]
    fn ut_num_003_leading_zeros_inch_uses_inch_format() {
        assert_close(decode_ok("012500", ZeroSuppression::Leading, Units::Inch), 1.25);
    }

    #[test]
    fn ut_num_004_explicit_decimal_is_literal() {
        assert_close(decode_ok("1.5", ZeroSuppression::Leading, Units::Metric), 1.5);
        assert_close(decode_ok("-0.25", ZeroSuppression::Trailing, Units::Inch), -0.25);
        assert_close(decode_ok(".5", ZeroSuppression::Leading, Units::Inch), 0.5);
    }

    #[test]
    fn ut_num_005_sign_is_not_a_digit() {
        assert_close(decode_ok("-010000", ZeroSuppression::Leading, Units::Metric), -10.0);
        assert_close(decode_ok("+12345", ZeroSuppression::Trailing, Units::Inch), 1.2345);
    }

    #[test]
    fn bc_num_001_malformed_tokens_are_format_errors() {
        for token in ["", "-", "12a", "1.2.3", "X10"] {
            let result = decode(token, ZeroSuppression::Leading, Units::Metric, &formats());
            assert!(
                matches!(result, Err(ExcellonError::Format(_))),
                "expected format error for `{token}`, got {result:?}"
            );
        }
    }

    #[test]
    fn bc_num_002_huge_values_are_rejected() {
        let token = "9".repeat(400);
        let result = decode(&token, ZeroSuppression::Trailing, Units::Metric, &formats());
        assert!(matches!(result, Err(ExcellonError::Format(_))));
    }
}

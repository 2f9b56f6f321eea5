//! Conversions between the `value(digits)` shorthand used by evaluated nuclear data
//! and explicit `(value, standard deviation)` pairs.
//!
//! The digits of a shorthand uncertainty apply to the least significant places of the
//! value as it is written, so `12.34(5)` is `12.34 ± 0.05` and `13369(13)` is
//! `13369 ± 13`. Digits containing a decimal point (`12.5(1.3)`) are absolute.

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UncertaintyError {
    #[error("shorthand value must be finite, got {value}")]
    NonFiniteValue { value: f64 },
    #[error("shorthand digits must be finite and >= 0, got {digits}")]
    InvalidDigits { digits: f64 },
    #[error("malformed shorthand notation '{text}'")]
    Malformed { text: String },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub value: f64,
    /// `None` when the notation carries no uncertainty.
    pub std_dev: Option<f64>,
}

/// Number of decimal places in the shortest representation of `value`.
pub fn decimal_places(value: f64) -> i32 {
    let text = format!("{}", value.abs());
    match text.find('.') {
        Some(position) => (text.len() - position - 1) as i32,
        None => 0,
    }
}

/// Standard deviation of `value(digits)` where `value` is a stored number.
pub fn shorthand_to_std(value: f64, digits: f64) -> Result<f64, UncertaintyError> {
    if !value.is_finite() {
        return Err(UncertaintyError::NonFiniteValue { value });
    }
    if !digits.is_finite() || digits < 0.0 {
        return Err(UncertaintyError::InvalidDigits { digits });
    }

    Ok(digits * 10f64.powi(-decimal_places(value)))
}

/// Shorthand digits that reproduce `std_dev` against the stored representation of `value`.
///
/// Rounded to nine decimals to drop the noise of the power-of-ten scaling.
pub fn std_to_digits(value: f64, std_dev: f64) -> f64 {
    let digits = std_dev * 10f64.powi(decimal_places(value));
    (digits * 1.0e9).round() / 1.0e9
}

/// Parse `value(unc)`, `value(unc)e±N` or a bare `value`.
pub fn parse_shorthand(text: &str) -> Result<Measurement, UncertaintyError> {
    let trimmed = text.trim();
    let malformed = || UncertaintyError::Malformed {
        text: trimmed.to_string(),
    };

    let Some(open) = trimmed.find('(') else {
        let value = trimmed.parse::<f64>().map_err(|_| malformed())?;
        return Ok(Measurement {
            value,
            std_dev: None,
        });
    };
    let close = trimmed[open..].find(')').map(|offset| open + offset).ok_or_else(malformed)?;

    let mantissa_text = &trimmed[..open];
    let uncertainty_text = trimmed[open + 1..close].trim();
    let suffix = trimmed[close + 1..].trim();

    let (mantissa_digits, mantissa_exponent) = split_exponent(mantissa_text).ok_or_else(malformed)?;
    let suffix_exponent = if suffix.is_empty() {
        0
    } else {
        let exponent = suffix
            .strip_prefix(['e', 'E'])
            .ok_or_else(malformed)?;
        exponent.parse::<i32>().map_err(|_| malformed())?
    };

    let mantissa = mantissa_digits.parse::<f64>().map_err(|_| malformed())?;
    let decimals = mantissa_digits
        .find('.')
        .map(|position| (mantissa_digits.len() - position - 1) as i32)
        .unwrap_or(0);
    let uncertainty = uncertainty_text.parse::<f64>().map_err(|_| malformed())?;
    if uncertainty < 0.0 {
        return Err(malformed());
    }

    let scaled = if uncertainty_text.contains('.') {
        uncertainty
    } else {
        uncertainty * 10f64.powi(-decimals)
    };
    let scale = 10f64.powi(mantissa_exponent + suffix_exponent);

    Ok(Measurement {
        value: mantissa * scale,
        std_dev: Some(scaled * scale),
    })
}

fn split_exponent(text: &str) -> Option<(&str, i32)> {
    let text = text.trim();
    match text.find(['e', 'E']) {
        Some(position) => {
            let exponent = text[position + 1..].parse::<i32>().ok()?;
            Some((&text[..position], exponent))
        }
        None => Some((text, 0)),
    }
}

/// Format `value ± std_dev` as an ENSDF `(value, digits)` pair with two significant
/// uncertainty digits, dropping a trailing zero digit (`98.2(3)` rather than `98.20(30)`).
///
/// A zero or non-finite uncertainty yields an empty digits field.
pub fn std_to_shorthand(value: f64, std_dev: f64) -> Result<(String, String), UncertaintyError> {
    if !value.is_finite() {
        return Err(UncertaintyError::NonFiniteValue { value });
    }
    if !std_dev.is_finite() || std_dev <= 0.0 {
        return Ok((format!("{value}"), String::new()));
    }

    let mut place = std_dev.log10().floor() as i32 - 1;
    let mut digits = (std_dev / 10f64.powi(place)).round() as u64;
    if digits >= 100 {
        place += 1;
        digits = (std_dev / 10f64.powi(place)).round() as u64;
    }
    if digits >= 10 && digits % 10 == 0 {
        place += 1;
        digits /= 10;
    }

    if place < 0 {
        let decimals = (-place) as usize;
        Ok((format!("{value:.decimals$}"), digits.to_string()))
    } else {
        let unit = 10f64.powi(place);
        let rounded = (value / unit).round() * unit;
        let uncertainty = digits * 10u64.pow(place as u32);
        Ok((format!("{rounded:.0}"), uncertainty.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::{
        decimal_places, parse_shorthand, shorthand_to_std, std_to_digits, std_to_shorthand,
        UncertaintyError,
    };

    fn assert_close(expected: f64, actual: f64) {
        assert!(
            (expected - actual).abs() <= 1.0e-12 * expected.abs().max(1.0),
            "expected={expected:e} actual={actual:e}"
        );
    }

    #[test]
    fn digits_apply_to_the_last_written_place() {
        assert_close(0.05, shorthand_to_std(12.34, 5.0).expect("valid"));
        assert_close(0.028, shorthand_to_std(98.216, 28.0).expect("valid"));
        assert_close(13.0, shorthand_to_std(13369.0, 13.0).expect("valid"));
        assert_close(3.0e-5, shorthand_to_std(0.00005, 3.0).expect("valid"));
    }

    #[test]
    fn absent_digits_are_rejected() {
        assert!(matches!(
            shorthand_to_std(12.0, f64::NAN),
            Err(UncertaintyError::InvalidDigits { .. })
        ));
        assert_eq!(
            shorthand_to_std(f64::INFINITY, 2.0),
            Err(UncertaintyError::NonFiniteValue {
                value: f64::INFINITY
            })
        );
    }

    #[test]
    fn parse_handles_relative_absolute_and_exponent_forms() {
        let plain = parse_shorthand("12.34(5)").expect("parse");
        assert_close(12.34, plain.value);
        assert_close(0.05, plain.std_dev.expect("uncertainty"));

        let absolute = parse_shorthand("12.5(1.3)").expect("parse");
        assert_close(1.3, absolute.std_dev.expect("uncertainty"));

        let exponent = parse_shorthand("1.5(12)e-3").expect("parse");
        assert_close(1.5e-3, exponent.value);
        assert_close(1.2e-3, exponent.std_dev.expect("uncertainty"));

        let bare = parse_shorthand(" 7.2 ").expect("parse");
        assert_eq!(bare.std_dev, None);

        assert!(parse_shorthand("12.3(4").is_err());
        assert!(parse_shorthand("abc(4)").is_err());
    }

    #[test]
    fn digits_roundtrip_against_stored_values() {
        let measurement = parse_shorthand("12.0(5)").expect("parse");
        let digits = std_to_digits(measurement.value, measurement.std_dev.expect("std"));
        assert_eq!(decimal_places(measurement.value), 0);
        assert_close(0.5, shorthand_to_std(measurement.value, digits).expect("valid"));

        let measurement = parse_shorthand("98.216(28)").expect("parse");
        assert_eq!(std_to_digits(measurement.value, measurement.std_dev.expect("std")), 28.0);
    }

    #[test]
    fn std_to_shorthand_uses_two_significant_digits() {
        assert_eq!(
            std_to_shorthand(13369.4, 13.0).expect("format"),
            ("13369".to_string(), "13".to_string())
        );
        assert_eq!(
            std_to_shorthand(98.216, 0.28).expect("format"),
            ("98.22".to_string(), "28".to_string())
        );
        assert_eq!(
            std_to_shorthand(98.216, 0.3).expect("format"),
            ("98.2".to_string(), "3".to_string())
        );
        assert_eq!(
            std_to_shorthand(13369.4, 130.0).expect("format"),
            ("13370".to_string(), "130".to_string())
        );
        assert_eq!(
            std_to_shorthand(12.5, 0.0).expect("format"),
            ("12.5".to_string(), String::new())
        );
    }
}

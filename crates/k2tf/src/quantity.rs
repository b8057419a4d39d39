//! Kubernetes resource quantities (`500m`, `1Gi`, `2e3`).

use core::fmt;
use core::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuantityError {
    #[error("empty quantity")]
    Empty,
    #[error("quantity '{0}' has no digits")]
    NoDigits(String),
    #[error("quantity '{input}' has an unknown suffix '{suffix}'")]
    UnknownSuffix { input: String, suffix: String },
    #[error("quantity '{0}' has too many digits")]
    TooLarge(String),
    #[error("quantity '{0}' has an exponent out of range")]
    ExponentOutOfRange(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    DecimalSi,
    DecimalExponent,
    /// Power of 1024 given by the suffix, 1 for `Ki` up to 6 for `Ei`.
    BinarySi(u32),
}

const DECIMAL_SUFFIXES: [(&str, i32); 9] = [
    ("n", -9),
    ("u", -6),
    ("m", -3),
    ("k", 3),
    ("M", 6),
    ("G", 9),
    ("T", 12),
    ("P", 15),
    ("E", 18),
];

const BINARY_SUFFIXES: [&str; 7] = ["", "Ki", "Mi", "Gi", "Ti", "Pi", "Ei"];

/// Largest power of ten accepted in either direction.
const MAX_EXPONENT: i32 = 1 << 20;

/// A parsed quantity. Renders in canonical form through [`fmt::Display`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quantity {
    raw: String,
    negative: bool,
    /// Digits with the decimal point removed.
    mantissa: i128,
    /// Power of ten applied to `mantissa`, before any binary multiplier.
    exponent: i32,
    format: Format,
}

impl Quantity {
    pub fn parse(input: &str) -> Result<Self, QuantityError> {
        input.parse()
    }

    /// The text the quantity was parsed from.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Canonical rendering, or `None` when the value cannot be represented
    /// without losing precision.
    pub fn canonical(&self) -> Option<String> {
        let digits = match self.format {
            Format::DecimalSi | Format::DecimalExponent => self.canonical_decimal()?,
            Format::BinarySi(power) => self.canonical_binary(power)?,
        };
        if self.negative && digits != "0" {
            Some(format!("-{digits}"))
        } else {
            Some(digits)
        }
    }

    fn canonical_decimal(&self) -> Option<String> {
        let (mut mantissa, mut exponent) = strip_zeros(self.mantissa, self.exponent);
        if mantissa == 0 {
            return Some("0".to_string());
        }
        // Anything below nano precision rounds up.
        if exponent < -9 {
            let divisor = 10i128.checked_pow((-9 - exponent) as u32);
            mantissa = match divisor {
                Some(divisor) => (mantissa + divisor - 1) / divisor,
                None => 1,
            };
            (mantissa, exponent) = strip_zeros(mantissa, -9);
        }

        let scale = (exponent.div_euclid(3) * 3).min(18);
        let mantissa = mantissa.checked_mul(10i128.checked_pow((exponent - scale) as u32)?)?;
        let suffix = match self.format {
            Format::DecimalExponent if scale == 0 => String::new(),
            Format::DecimalExponent => format!("e{scale}"),
            _ => DECIMAL_SUFFIXES
                .iter()
                .find(|(_, exp)| *exp == scale)
                .map(|(suffix, _)| suffix.to_string())
                .unwrap_or_default(),
        };
        Some(format!("{mantissa}{suffix}"))
    }

    fn canonical_binary(&self, power: u32) -> Option<String> {
        let multiplier = 1024i128.checked_pow(power)?;
        let scaled = self.mantissa.checked_mul(multiplier)?;
        let bytes = if self.exponent >= 0 {
            scaled.checked_mul(10i128.checked_pow(self.exponent as u32)?)?
        } else {
            let divisor = 10i128.checked_pow((-self.exponent) as u32)?;
            if scaled % divisor != 0 {
                return None;
            }
            scaled / divisor
        };
        if bytes == 0 {
            return Some("0".to_string());
        }
        let (power, unit) = (0..BINARY_SUFFIXES.len() as u32)
            .rev()
            .filter_map(|p| 1024i128.checked_pow(p).map(|unit| (p, unit)))
            .find(|(_, unit)| bytes % unit == 0)?;
        Some(format!("{}{}", bytes / unit, BINARY_SUFFIXES[power as usize]))
    }
}

fn strip_zeros(mut mantissa: i128, mut exponent: i32) -> (i128, i32) {
    if mantissa == 0 {
        return (0, 0);
    }
    while mantissa % 10 == 0 {
        mantissa /= 10;
        exponent += 1;
    }
    (mantissa, exponent)
}

impl FromStr for Quantity {
    type Err = QuantityError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let s = input.trim();
        if s.is_empty() {
            return Err(QuantityError::Empty);
        }

        let (negative, rest) = match s.as_bytes()[0] {
            b'-' => (true, &s[1..]),
            b'+' => (false, &s[1..]),
            _ => (false, s),
        };
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, suffix) = rest.split_at(number_len);

        let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
        if whole.is_empty() && fraction.is_empty() {
            return Err(QuantityError::NoDigits(input.to_string()));
        }
        let digits = format!("{whole}{fraction}");
        let significant = digits.trim_start_matches('0');
        if significant.len() > 36 {
            return Err(QuantityError::TooLarge(input.to_string()));
        }
        let mantissa = if significant.is_empty() {
            0
        } else {
            significant
                .parse::<i128>()
                .map_err(|_| QuantityError::TooLarge(input.to_string()))?
        };
        let scale = -(fraction.len() as i32);

        let out_of_range = || QuantityError::ExponentOutOfRange(input.to_string());
        let unknown = || QuantityError::UnknownSuffix {
            input: input.to_string(),
            suffix: suffix.to_string(),
        };
        let (exponent, format) = if suffix.is_empty() {
            (scale, Format::DecimalSi)
        } else if let Some(power) = BINARY_SUFFIXES.iter().skip(1).position(|s| *s == suffix) {
            (scale, Format::BinarySi(power as u32 + 1))
        } else if let Some((_, exp)) = DECIMAL_SUFFIXES.iter().find(|(s, _)| *s == suffix) {
            (scale + exp, Format::DecimalSi)
        } else if let Some(exp) = suffix.strip_prefix(['e', 'E']) {
            let exp: i32 = exp.parse().map_err(|_| unknown())?;
            let exponent = scale.checked_add(exp).ok_or_else(out_of_range)?;
            (exponent, Format::DecimalExponent)
        } else {
            return Err(unknown());
        };
        if !(-MAX_EXPONENT..=MAX_EXPONENT).contains(&exponent) {
            return Err(out_of_range());
        }

        Ok(Self {
            raw: input.to_string(),
            negative,
            mantissa,
            exponent,
            format,
        })
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.canonical() {
            Some(canonical) => f.write_str(&canonical),
            None => f.write_str(self.raw.trim()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical(s: &str) -> String {
        Quantity::parse(s).unwrap().to_string()
    }

    #[test]
    fn test_decimal_canonical_forms() {
        assert_eq!(canonical("1"), "1");
        assert_eq!(canonical("1000m"), "1");
        assert_eq!(canonical("0.5"), "500m");
        assert_eq!(canonical("1.5"), "1500m");
        assert_eq!(canonical("2000"), "2k");
        assert_eq!(canonical("100M"), "100M");
        assert_eq!(canonical("250m"), "250m");
        assert_eq!(canonical("+3"), "3");
        assert_eq!(canonical("-0.25"), "-250m");
        assert_eq!(canonical("0"), "0");
        assert_eq!(canonical("0.000"), "0");
    }

    #[test]
    fn test_sub_nano_rounds_up() {
        assert_eq!(canonical("0.0000000001"), "1n");
    }

    #[test]
    fn test_binary_canonical_forms() {
        assert_eq!(canonical("512Mi"), "512Mi");
        assert_eq!(canonical("1Gi"), "1Gi");
        assert_eq!(canonical("1024Mi"), "1Gi");
        assert_eq!(canonical("1.5Gi"), "1536Mi");
        assert_eq!(canonical("1000Mi"), "1000Mi");
    }

    #[test]
    fn test_exponent_format() {
        assert_eq!(canonical("12e6"), "12e6");
        assert_eq!(canonical("1E3"), "1e3");
        assert_eq!(canonical("1000e0"), "1e3");
    }

    #[test]
    fn test_inexact_binary_keeps_raw_text() {
        let q = Quantity::parse("0.1Ki").unwrap();
        assert_eq!(q.canonical(), None);
        assert_eq!(q.to_string(), "0.1Ki");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Quantity::parse(""), Err(QuantityError::Empty));
        assert!(matches!(
            Quantity::parse("Gi"),
            Err(QuantityError::NoDigits(_))
        ));
        assert!(matches!(
            Quantity::parse("10GB"),
            Err(QuantityError::UnknownSuffix { .. })
        ));
    }

    #[test]
    fn test_huge_exponents() {
        assert!(matches!(
            Quantity::parse("10e2147483647"),
            Err(QuantityError::ExponentOutOfRange(_))
        ));
        assert!(matches!(
            Quantity::parse("1.5e-2147483648"),
            Err(QuantityError::ExponentOutOfRange(_))
        ));
        // in range but too large for the canonical form
        assert_eq!(canonical("1e100"), "1e100");
    }
}

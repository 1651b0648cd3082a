//! VOTABLE `precision` attribute values
//!
//! `F?(\d+)` limits decimal places, `E(\d+)` limits significant digits.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::SyntaxError;

/// Pattern quoted in syntax error messages
pub const PRECISION_PATTERN: &str = r"F?(\d+)|E(\d+)";

/// A parsed precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Precision {
    /// Digits after the decimal point
    DecimalPlaces(u32),
    /// Significant digits
    SignificantDigits(u32),
}

impl Precision {
    /// Returns the number of places or digits
    pub fn degree(&self) -> u32 {
        match self {
            Precision::DecimalPlaces(n) | Precision::SignificantDigits(n) => *n,
        }
    }

    pub fn kind_description(&self) -> &'static str {
        match self {
            Precision::DecimalPlaces(_) => "decimal places",
            Precision::SignificantDigits(_) => "significant digits",
        }
    }

    /// Human readable form, e.g. `3 decimal places`
    pub fn description(&self) -> String {
        format!("{} {}", self.degree(), self.kind_description())
    }

    /// Returns true if both precisions count the same kind of digit
    pub fn comparable_to(&self, other: &Precision) -> bool {
        matches!(
            (self, other),
            (Precision::DecimalPlaces(_), Precision::DecimalPlaces(_))
                | (Precision::SignificantDigits(_), Precision::SignificantDigits(_))
        )
    }

    /// Returns `None` when the two precisions are not comparable
    pub fn is_more_precise_than(&self, other: &Precision) -> Option<bool> {
        if self.comparable_to(other) {
            Some(self.degree() > other.degree())
        } else {
            None
        }
    }

    /// Returns true if the numeric literal carries more precision than allowed
    pub fn exceeded_by(&self, value: &str) -> bool {
        let mantissa = value
            .trim()
            .split(|c| c == 'e' || c == 'E')
            .next()
            .unwrap_or_default();

        match self {
            Precision::DecimalPlaces(max) => {
                let places = mantissa
                    .split_once('.')
                    .map(|(_, fraction)| fraction.chars().count())
                    .unwrap_or(0);
                places > *max as usize
            }
            Precision::SignificantDigits(max) => significant_digits(mantissa) > *max as usize,
        }
    }
}

/// Counts significant digits the way a decimal's unscaled value would.
///
/// Leading zeros never count; trailing zeros always do. Zero has one digit.
fn significant_digits(mantissa: &str) -> usize {
    let digits: String = mantissa.chars().filter(|c| c.is_ascii_digit()).collect();
    let count = digits.trim_start_matches('0').len();
    count.max(1)
}

impl FromStr for Precision {
    type Err = SyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let error = || SyntaxError::new("precision", s, PRECISION_PATTERN);

        let (digits, significant) = if let Some(rest) = s.strip_prefix('E') {
            (rest, true)
        } else if let Some(rest) = s.strip_prefix('F') {
            (rest, false)
        } else {
            (s, false)
        };

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(error());
        }
        let degree = digits.parse::<u32>().map_err(|_| error())?;

        Ok(if significant {
            Precision::SignificantDigits(degree)
        } else {
            Precision::DecimalPlaces(degree)
        })
    }
}

impl TryFrom<String> for Precision {
    type Error = SyntaxError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Precision> for String {
    fn from(value: Precision) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precision::DecimalPlaces(n) => write!(f, "{}", n),
            Precision::SignificantDigits(n) => write!(f, "E{}", n),
        }
    }
}

//! VOTABLE `arraysize` attribute values
//!
//! Syntax is `(\d+)?(\*)?`:
//! - `18` is a fixed size of 18
//! - `18*` is variable up to 18
//! - `*` is variable and unbounded

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::SyntaxError;

/// Pattern quoted in syntax error messages
pub const ARRAYSIZE_PATTERN: &str = r"(\d+)?(\*)?";

/// A parsed arraysize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Arraysize {
    maximum: Option<u32>,
    variable: bool,
}

impl Arraysize {
    /// A fixed arraysize of exactly `n`
    pub fn fixed(n: u32) -> Self {
        Self {
            maximum: Some(n),
            variable: false,
        }
    }

    /// A variable arraysize, optionally bounded
    pub fn variable(maximum: Option<u32>) -> Self {
        Self {
            maximum,
            variable: true,
        }
    }

    /// Returns the maximum number of elements, if bounded
    pub fn maximum(&self) -> Option<u32> {
        self.maximum
    }

    /// Returns true if a maximum is present
    pub fn has_maximum(&self) -> bool {
        self.maximum.is_some()
    }

    /// Returns true if the `*` marker is present
    pub fn is_variable(&self) -> bool {
        self.variable
    }

    /// Returns true when both sides are bounded and this maximum is larger.
    ///
    /// An unbounded side never "definitely" exceeds anything.
    pub fn exceeds(&self, limit: &Arraysize) -> bool {
        match (self.maximum, limit.maximum) {
            (Some(ours), Some(theirs)) => ours > theirs,
            _ => false,
        }
    }

    /// Returns true if `value` has more characters than the maximum
    pub fn exceeded_by(&self, value: &str) -> bool {
        match self.maximum {
            Some(max) => value.chars().count() > max as usize,
            None => false,
        }
    }

    /// Combines two limits, keeping the smaller maximum.
    ///
    /// The result is variable if either input is.
    pub fn tighten(self, other: Arraysize) -> Arraysize {
        let maximum = match (self.maximum, other.maximum) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        Arraysize {
            maximum,
            variable: self.variable || other.variable,
        }
    }
}

impl FromStr for Arraysize {
    type Err = SyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let error = || SyntaxError::new("arraysize", s, ARRAYSIZE_PATTERN);

        if s.is_empty() {
            return Err(error());
        }

        let (digits, variable) = match s.strip_suffix('*') {
            Some(rest) => (rest, true),
            None => (s, false),
        };

        let maximum = if digits.is_empty() {
            None
        } else if digits.bytes().all(|b| b.is_ascii_digit()) {
            Some(digits.parse::<u32>().map_err(|_| error())?)
        } else {
            return Err(error());
        };

        Ok(Self { maximum, variable })
    }
}

impl TryFrom<String> for Arraysize {
    type Error = SyntaxError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Arraysize> for String {
    fn from(value: Arraysize) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Arraysize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(max) = self.maximum {
            write!(f, "{}", max)?;
        }
        if self.variable {
            write!(f, "*")?;
        }
        Ok(())
    }
}

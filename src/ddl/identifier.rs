//! Escaped SQL fragments
//!
//! Renderers only accept `SqlIdentifier` for names and `SqlText` for free
//! text, so unchecked input cannot reach a statement.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Pattern every identifier must match
pub const IDENTIFIER_PATTERN: &str = "^[A-Za-z0-9_]+$";

static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(IDENTIFIER_PATTERN).expect("valid regex"));

/// True if `value` is usable as an identifier
pub fn is_safe_identifier(value: &str) -> bool {
    IDENTIFIER_RE.is_match(value)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Identifier '{0}' contains forbidden characters (it must contain only letters, numbers and underscores)")]
pub struct IdentifierError(String);

/// A schema, table or column name known to match `^[A-Za-z0-9_]+$`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SqlIdentifier(String);

impl SqlIdentifier {
    pub fn parse(value: impl Into<String>) -> Result<Self, IdentifierError> {
        let value = value.into();
        if is_safe_identifier(&value) {
            Ok(Self(value))
        } else {
            Err(IdentifierError(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SqlIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Free text, rendered as a quoted literal with single quotes doubled
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SqlText(String);

impl SqlText {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The unescaped text
    pub fn raw(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The quoted literal, e.g. `'it''s'`
    pub fn literal(&self) -> String {
        escape_literal(&self.0)
    }
}

impl From<&str> for SqlText {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SqlText {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for SqlText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.literal())
    }
}

/// Quotes `value` as a string literal
pub fn escape_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

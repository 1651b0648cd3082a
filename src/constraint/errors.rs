//! Configuration error types
//!
//! Error codes:
//! - VOT_CONSTRAINTS_MALFORMED (FATAL)
//! - VOT_CONSTRAINTS_AMBIGUOUS (FATAL)
//! - VOT_CONSTRAINTS_CONFLICTING (FATAL)
//! - VOT_WIDTH_UNRESOLVABLE (FATAL)
//! - VOT_CONFIG_INVALID (FATAL)
//!
//! A configuration error is never a per-file validation error: it aborts
//! pipeline construction, or the traversal that tripped over it.

use std::fmt;

/// Configuration error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorCode {
    /// Constraint specification could not be read or parsed
    ConstraintsMalformed,
    /// Two constraints claim the same identifying keys
    ConstraintsAmbiguous,
    /// Constraints that apply to one element disagree
    ConstraintsConflicting,
    /// A char column has no width source
    WidthUnresolvable,
    /// Settings file is unreadable or out of range
    ConfigInvalid,
}

impl ConfigErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            ConfigErrorCode::ConstraintsMalformed => "VOT_CONSTRAINTS_MALFORMED",
            ConfigErrorCode::ConstraintsAmbiguous => "VOT_CONSTRAINTS_AMBIGUOUS",
            ConfigErrorCode::ConstraintsConflicting => "VOT_CONSTRAINTS_CONFLICTING",
            ConfigErrorCode::WidthUnresolvable => "VOT_WIDTH_UNRESOLVABLE",
            ConfigErrorCode::ConfigInvalid => "VOT_CONFIG_INVALID",
        }
    }
}

impl fmt::Display for ConfigErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Configuration error with context
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigError {
    code: ConfigErrorCode,
    message: String,
    /// Source file if the error came from disk
    path: Option<String>,
}

impl ConfigError {
    /// Create an error for an unreadable or unparsable constraint file
    pub fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            code: ConfigErrorCode::ConstraintsMalformed,
            message: format!("Malformed constraint specification '{}': {}", path, reason.into()),
            path: Some(path),
        }
    }

    /// Create an error for two constraints with the same identifying keys
    pub fn ambiguous(kind: &str, description: impl Into<String>) -> Self {
        Self {
            code: ConfigErrorCode::ConstraintsAmbiguous,
            message: format!(
                "More than one {} constraint matches {}",
                kind,
                description.into()
            ),
            path: None,
        }
    }

    /// Create an error for merged constraints that disagree on an attribute
    pub fn conflicting(kind: &str, element: &str, attribute: &str) -> Self {
        Self {
            code: ConfigErrorCode::ConstraintsConflicting,
            message: format!(
                "Multiple constraints matching {} '{}' have incompatible {} attributes",
                kind, element, attribute
            ),
            path: None,
        }
    }

    /// Create an error for a char column that cannot be sized
    pub fn width_unresolvable(message: impl Into<String>) -> Self {
        Self {
            code: ConfigErrorCode::WidthUnresolvable,
            message: message.into(),
            path: None,
        }
    }

    /// Create an error for a bad settings file
    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            code: ConfigErrorCode::ConfigInvalid,
            message: message.into(),
            path: None,
        }
    }

    /// Attach the file the error came from
    pub fn at_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn code(&self) -> ConfigErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[FATAL] {}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            ConfigError::malformed("a.json", "bad").code().code(),
            "VOT_CONSTRAINTS_MALFORMED"
        );
        assert_eq!(
            ConfigError::width_unresolvable("x").code(),
            ConfigErrorCode::WidthUnresolvable
        );
    }

    #[test]
    fn test_display_includes_code_and_message() {
        let err = ConfigError::conflicting("FIELD", "ra", "unit");
        let display = err.to_string();
        assert!(display.starts_with("[FATAL] VOT_CONSTRAINTS_CONFLICTING"));
        assert!(display.contains("FIELD 'ra' have incompatible unit attributes"));
    }

    #[test]
    fn test_malformed_keeps_path() {
        let err = ConfigError::malformed("/etc/constraints.json", "Invalid JSON");
        assert_eq!(err.path(), Some("/etc/constraints.json"));
        assert!(err.message().contains("Invalid JSON"));
    }
}

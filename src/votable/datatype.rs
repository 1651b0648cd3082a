//! Datatypes and typed cell values

use std::fmt;

use serde::{Deserialize, Serialize};

/// The VOTABLE datatypes this crate can validate and store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldDatatype {
    Char,
    Boolean,
    Short,
    Int,
    Long,
    Float,
    Double,
    Bit,
    UnsignedByte,
}

impl FieldDatatype {
    /// Parses a `datatype` attribute, ignoring case
    pub fn parse(value: &str) -> Option<Self> {
        let datatype = match value.to_ascii_lowercase().as_str() {
            "char" => FieldDatatype::Char,
            "boolean" => FieldDatatype::Boolean,
            "short" => FieldDatatype::Short,
            "int" => FieldDatatype::Int,
            "long" => FieldDatatype::Long,
            "float" => FieldDatatype::Float,
            "double" => FieldDatatype::Double,
            "bit" => FieldDatatype::Bit,
            "unsignedbyte" => FieldDatatype::UnsignedByte,
            _ => return None,
        };
        Some(datatype)
    }

    /// Returns the attribute spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldDatatype::Char => "char",
            FieldDatatype::Boolean => "boolean",
            FieldDatatype::Short => "short",
            FieldDatatype::Int => "int",
            FieldDatatype::Long => "long",
            FieldDatatype::Float => "float",
            FieldDatatype::Double => "double",
            FieldDatatype::Bit => "bit",
            FieldDatatype::UnsignedByte => "unsignedByte",
        }
    }

    /// Lower-case name used in value error messages
    pub fn type_name(&self) -> String {
        self.as_str().to_ascii_lowercase()
    }

    /// Only char columns may carry an arraysize
    pub fn accepts_arraysize(&self) -> bool {
        matches!(self, FieldDatatype::Char)
    }

    pub fn is_whole_number(&self) -> bool {
        matches!(
            self,
            FieldDatatype::Short | FieldDatatype::Int | FieldDatatype::Long | FieldDatatype::UnsignedByte
        )
    }

    pub fn is_real_number(&self) -> bool {
        matches!(self, FieldDatatype::Float | FieldDatatype::Double)
    }
}

impl fmt::Display for FieldDatatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A converted cell or param value
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    /// Absent, blank or explicit VOTABLE null
    Null,
    Text(String),
    Boolean(bool),
    Integer(i64),
    Real(f64),
    /// Bit string with separators removed
    Bits(String),
}

impl TypedValue {
    pub fn is_null(&self) -> bool {
        matches!(self, TypedValue::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            TypedValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            TypedValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Whole numbers widen to reals
    pub fn as_real(&self) -> Option<f64> {
        match self {
            TypedValue::Real(n) => Some(*n),
            TypedValue::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }
}

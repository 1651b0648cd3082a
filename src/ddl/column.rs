//! Column descriptors and SQL values

use std::fmt;

use super::identifier::{escape_literal, SqlIdentifier, SqlText};
use crate::constraint::{ConfigError, ConfigResult};
use crate::votable::{FieldDatatype, TypedValue};

/// Message for a char column whose width cannot be resolved
pub const UNRESOLVED_CHAR_WIDTH: &str =
    "Missing maxarraysize definition of char. Won't be able to create sensibly-sized VARCHAR columns.";

/// Storage type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Varchar(u32),
    Boolean,
    SmallInt,
    Integer,
    BigInt,
    Real,
    DoublePrecision,
    BitVarying(Option<u32>),
}

impl SqlType {
    /// Maps a VOTABLE datatype to its column type.
    ///
    /// `size` is the arraysize maximum; char columns require one.
    pub fn for_datatype(datatype: FieldDatatype, size: Option<u32>) -> ConfigResult<Self> {
        let sql_type = match datatype {
            FieldDatatype::Char => match size {
                Some(width) => SqlType::Varchar(width),
                None => return Err(ConfigError::width_unresolvable(UNRESOLVED_CHAR_WIDTH)),
            },
            FieldDatatype::Boolean => SqlType::Boolean,
            FieldDatatype::Short | FieldDatatype::UnsignedByte => SqlType::SmallInt,
            FieldDatatype::Int => SqlType::Integer,
            FieldDatatype::Long => SqlType::BigInt,
            FieldDatatype::Float => SqlType::Real,
            FieldDatatype::Double => SqlType::DoublePrecision,
            FieldDatatype::Bit => SqlType::BitVarying(size),
        };
        Ok(sql_type)
    }

    /// Declared size, for types that carry one
    pub fn size(&self) -> Option<u32> {
        match self {
            SqlType::Varchar(width) => Some(*width),
            SqlType::BitVarying(width) => *width,
            _ => None,
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlType::Varchar(width) => write!(f, "VARCHAR({})", width),
            SqlType::Boolean => write!(f, "BOOLEAN"),
            SqlType::SmallInt => write!(f, "SMALLINT"),
            SqlType::Integer => write!(f, "INTEGER"),
            SqlType::BigInt => write!(f, "BIGINT"),
            SqlType::Real => write!(f, "REAL"),
            SqlType::DoublePrecision => write!(f, "DOUBLE PRECISION"),
            SqlType::BitVarying(Some(width)) => write!(f, "BIT VARYING({})", width),
            SqlType::BitVarying(None) => write!(f, "BIT VARYING"),
        }
    }
}

/// Definition of one derived column
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    pub source_name: SqlIdentifier,
    pub datatype: FieldDatatype,
    pub sql_type: SqlType,
    pub nullable: bool,
    pub indexed: bool,
    pub principal: bool,
    pub description: SqlText,
    pub ucd: SqlText,
    pub unit: SqlText,
    pub utype: SqlText,
}

impl ColumnDescriptor {
    /// A nullable, unflagged column with no metadata
    pub fn new(source_name: SqlIdentifier, datatype: FieldDatatype, sql_type: SqlType) -> Self {
        Self {
            source_name,
            datatype,
            sql_type,
            nullable: true,
            indexed: false,
            principal: false,
            description: SqlText::default(),
            ucd: SqlText::default(),
            unit: SqlText::default(),
            utype: SqlText::default(),
        }
    }

    pub fn sql_size(&self) -> Option<u32> {
        self.sql_type.size()
    }
}

/// A value ready to be rendered into an INSERT
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Text(SqlText),
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Bits(String),
}

impl From<&TypedValue> for SqlValue {
    fn from(value: &TypedValue) -> Self {
        match value {
            TypedValue::Null => SqlValue::Null,
            TypedValue::Text(text) => SqlValue::Text(SqlText::new(text.as_str())),
            TypedValue::Boolean(flag) => SqlValue::Boolean(*flag),
            TypedValue::Integer(n) => SqlValue::Integer(*n),
            TypedValue::Real(n) => SqlValue::Real(*n),
            TypedValue::Bits(bits) => SqlValue::Bits(bits.clone()),
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::Text(text) => write!(f, "{}", text),
            SqlValue::Boolean(true) => write!(f, "TRUE"),
            SqlValue::Boolean(false) => write!(f, "FALSE"),
            SqlValue::Integer(n) => write!(f, "{}", n),
            SqlValue::Real(n) if n.is_nan() => write!(f, "'NaN'"),
            SqlValue::Real(n) if n.is_infinite() && *n > 0.0 => write!(f, "'Infinity'"),
            SqlValue::Real(n) if n.is_infinite() => write!(f, "'-Infinity'"),
            SqlValue::Real(n) => write!(f, "{}", n),
            SqlValue::Bits(bits) => {
                let digits: String = bits.chars().filter(|c| matches!(c, '0' | '1')).collect();
                write!(f, "B{}", escape_literal(&digits))
            }
        }
    }
}

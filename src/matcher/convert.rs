//! Value conversion
//!
//! Converts raw PARAM values and TD cells into typed values, enforcing the
//! width and precision limits that apply to the element. Limits come from the
//! element's own attributes first, then from its merged constraint; messages
//! say "maximum" when the constraint supplied the limit.

use crate::constraint::Constraint;
use crate::votable::{Arraysize, Declared, FieldDatatype, FieldKey, Precision, TypedValue};

/// A limit and whether it came from the constraint rather than the element
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limit<T> {
    pub value: T,
    pub from_constraint: bool,
}

impl<T> Limit<T> {
    fn declared(value: T) -> Self {
        Self {
            value,
            from_constraint: false,
        }
    }

    fn constrained(value: T) -> Self {
        Self {
            value,
            from_constraint: true,
        }
    }

    fn prefix(&self) -> &'static str {
        if self.from_constraint {
            "maximum "
        } else {
            ""
        }
    }
}

/// Size limits resolved for one PARAM or FIELD
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ValueLimits {
    pub arraysize: Option<Limit<Arraysize>>,
    pub width: Option<Limit<u32>>,
    pub precision: Option<Limit<Precision>>,
}

impl ValueLimits {
    /// Resolves limits from an element and its merged constraint.
    ///
    /// A declared arraysize without a maximum (`*`) defers to the constraint.
    /// Malformed declarations are ignored here; attribute checks report them.
    pub fn resolve(element: &dyn Declared, constraint: &Constraint) -> Self {
        let declared_arraysize = element
            .attribute(FieldKey::Arraysize)
            .and_then(|a| a.parse::<Arraysize>().ok())
            .filter(Arraysize::has_maximum);

        let arraysize = match (declared_arraysize, constraint.max_arraysize) {
            (Some(declared), _) => Some(Limit::declared(declared)),
            (None, Some(limit)) => Some(Limit::constrained(limit)),
            (None, None) => None,
        };

        let width = match (
            element.attribute(FieldKey::Width).and_then(|w| w.parse::<u32>().ok()),
            constraint.max_width,
        ) {
            (Some(declared), _) => Some(Limit::declared(declared)),
            (None, Some(limit)) => Some(Limit::constrained(limit)),
            (None, None) => None,
        };

        let precision = match (
            element
                .attribute(FieldKey::Precision)
                .and_then(|p| p.parse::<Precision>().ok()),
            constraint.max_precision,
        ) {
            (Some(declared), _) => Some(Limit::declared(declared)),
            (None, Some(limit)) => Some(Limit::constrained(limit)),
            (None, None) => None,
        };

        Self {
            arraysize,
            width,
            precision,
        }
    }

    /// Number of characters a char value may hold, if bounded
    pub fn char_width(&self) -> Option<u32> {
        self.arraysize.and_then(|limit| limit.value.maximum())
    }

    fn check_arraysize(&self, value: &str) -> Result<(), String> {
        match &self.arraysize {
            Some(limit) if limit.value.exceeded_by(value) => Err(format!(
                "Value '{}' is wider than {}{} chars",
                value,
                limit.prefix(),
                limit.value.maximum().unwrap_or_default()
            )),
            _ => Ok(()),
        }
    }

    fn check_width(&self, value: &str) -> Result<(), String> {
        match &self.width {
            Some(limit) if value.chars().count() > limit.value as usize => Err(format!(
                "Value '{}' is wider than {}{} chars",
                value,
                limit.prefix(),
                limit.value
            )),
            _ => Ok(()),
        }
    }

    fn check_precision(&self, value: &str) -> Result<(), String> {
        match &self.precision {
            Some(limit) if limit.value.exceeded_by(value) => Err(format!(
                "Value '{}' is more precise than {}{}",
                value,
                limit.prefix(),
                limit.value.description()
            )),
            _ => Ok(()),
        }
    }
}

/// Converts a raw value to its typed form.
///
/// Blank values convert to `Null` without validation. The error is the bare
/// message; callers attach the position.
pub fn convert(raw: &str, datatype: FieldDatatype, limits: &ValueLimits) -> Result<TypedValue, String> {
    if raw.trim().is_empty() {
        return Ok(TypedValue::Null);
    }

    let value = raw.trim();
    let not_a = || format!("Value '{}' is not a '{}'", value, datatype.type_name());

    match datatype {
        FieldDatatype::Char => {
            limits.check_arraysize(value)?;
            Ok(TypedValue::Text(value.to_string()))
        }
        FieldDatatype::Boolean => convert_boolean(value).ok_or_else(not_a),
        FieldDatatype::Short => {
            let n = value.parse::<i16>().map_err(|_| not_a())?;
            limits.check_width(value)?;
            Ok(TypedValue::Integer(i64::from(n)))
        }
        FieldDatatype::Int => {
            let n = value.parse::<i32>().map_err(|_| not_a())?;
            limits.check_width(value)?;
            Ok(TypedValue::Integer(i64::from(n)))
        }
        FieldDatatype::Long => {
            let n = value.parse::<i64>().map_err(|_| not_a())?;
            limits.check_width(value)?;
            Ok(TypedValue::Integer(n))
        }
        FieldDatatype::UnsignedByte => {
            let n = parse_unsigned_byte(value).ok_or_else(not_a)?;
            limits.check_width(value)?;
            Ok(TypedValue::Integer(i64::from(n)))
        }
        FieldDatatype::Float => {
            value.parse::<f32>().map_err(|_| not_a())?;
            let n = value.parse::<f64>().map_err(|_| not_a())?;
            limits.check_width(value)?;
            limits.check_precision(value)?;
            Ok(TypedValue::Real(n))
        }
        FieldDatatype::Double => {
            let n = value.parse::<f64>().map_err(|_| not_a())?;
            limits.check_width(value)?;
            limits.check_precision(value)?;
            Ok(TypedValue::Real(n))
        }
        FieldDatatype::Bit => {
            if value.chars().all(|c| matches!(c, '0' | '1' | ' ')) {
                Ok(TypedValue::Bits(value.replace(' ', "")))
            } else {
                Err(not_a())
            }
        }
    }
}

/// `1`/`t`/`true` and `0`/`f`/`false` in any case; `?` and NUL are null
fn convert_boolean(raw: &str) -> Option<TypedValue> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "t" | "true" => Some(TypedValue::Boolean(true)),
        "0" | "f" | "false" => Some(TypedValue::Boolean(false)),
        " " | "?" | "\u{0}" => Some(TypedValue::Null),
        _ => None,
    }
}

fn parse_unsigned_byte(value: &str) -> Option<u8> {
    let parsed = match value.strip_prefix("0x") {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => value.parse::<u32>().ok()?,
    };
    u8::try_from(parsed).ok()
}

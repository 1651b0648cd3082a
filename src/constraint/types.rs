//! Constraint definitions

use serde::{Deserialize, Serialize};

use crate::votable::{Arraysize, FieldKey, Precision};

/// One PARAM or FIELD constraint.
///
/// Identifying keys (`name`, `ID`, `ucd`, `datatype`) select the elements the
/// constraint applies to; the remaining keys limit those elements. A constraint
/// with no keys at all applies to every element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Constraint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "ID", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ucd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, rename = "maxarraysize", skip_serializing_if = "Option::is_none")]
    pub max_arraysize: Option<Arraysize>,
    #[serde(default, rename = "maxwidth", skip_serializing_if = "Option::is_none")]
    pub max_width: Option<u32>,
    #[serde(default, rename = "maxprecision", skip_serializing_if = "Option::is_none")]
    pub max_precision: Option<Precision>,
    /// Optional constraints never report a missing match
    #[serde(default)]
    pub optional: bool,
}

/// Constraint on a declared PARAM
pub type ParamConstraint = Constraint;

/// Constraint on a declared FIELD
pub type FieldConstraint = Constraint;

impl Constraint {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_ucd(ucd: impl Into<String>) -> Self {
        Self {
            ucd: Some(ucd.into()),
            ..Self::default()
        }
    }

    /// A catch-all for every element of the given datatype
    pub fn for_datatype(datatype: impl Into<String>) -> Self {
        Self {
            datatype: Some(datatype.into()),
            ..Self::default()
        }
    }

    pub fn datatype(mut self, datatype: impl Into<String>) -> Self {
        self.datatype = Some(datatype.into());
        self
    }

    pub fn max_arraysize(mut self, arraysize: Arraysize) -> Self {
        self.max_arraysize = Some(arraysize);
        self
    }

    pub fn max_width(mut self, width: u32) -> Self {
        self.max_width = Some(width);
        self
    }

    pub fn max_precision(mut self, precision: Precision) -> Self {
        self.max_precision = Some(precision);
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Returns the constraint value for a key in attribute form
    pub fn value(&self, key: FieldKey) -> Option<String> {
        let value = match key {
            FieldKey::Name => self.name.clone(),
            FieldKey::Id => self.id.clone(),
            FieldKey::Ucd => self.ucd.clone(),
            FieldKey::Datatype => self.datatype.clone(),
            FieldKey::Unit => self.unit.clone(),
            FieldKey::Ref => self.reference.clone(),
            FieldKey::Arraysize => self.max_arraysize.map(|a| a.to_string()),
            FieldKey::Width => self.max_width.map(|w| w.to_string()),
            FieldKey::Precision => self.max_precision.map(|p| p.to_string()),
        };
        value.filter(|v| !v.trim().is_empty())
    }

    /// Returns true if no key carries a value
    pub fn is_empty(&self) -> bool {
        FieldKey::ALL.iter().all(|key| self.value(*key).is_none())
    }

    /// Returns true if any required identifying key is set.
    ///
    /// Such a constraint only applies to elements matching all of those keys,
    /// and reports an error when no element does.
    pub fn requires_match(&self) -> bool {
        FieldKey::ALL
            .iter()
            .any(|key| key.is_required() && self.value(*key).is_some())
    }

    /// The required identifying values, used to detect ambiguous catalogs
    pub fn identity(&self) -> Vec<(FieldKey, String)> {
        FieldKey::ALL
            .iter()
            .filter(|key| key.is_required())
            .filter_map(|key| self.value(*key).map(|v| (*key, v)))
            .collect()
    }

    /// Describes the identifying keys, e.g. `name: 'X', datatype: 'char'`
    pub fn describe(&self) -> String {
        FieldKey::ALL
            .iter()
            .filter(|key| key.is_identifying())
            .filter_map(|key| {
                self.value(*key)
                    .map(|value| format!("{}: '{}'", key.as_str(), value))
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

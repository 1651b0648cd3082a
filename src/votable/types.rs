//! Declared table elements
//!
//! These mirror the already-parsed VOTABLE structure handed to the engine:
//! - `Table`: description, PARAMs, FIELDs and TABLEDATA rows
//! - `DeclaredParam`: a PARAM and its value
//! - `DeclaredField`: a FIELD (column definition)
//! - `Row`: positional raw cells
//!
//! All types deserialize from JSON so callers can feed the engine from any
//! upstream unmarshaller.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Attributes a constraint can match or limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldKey {
    Name,
    Id,
    Ucd,
    Datatype,
    Unit,
    Ref,
    Arraysize,
    Width,
    Precision,
}

impl FieldKey {
    /// Keys in the order they are checked and described
    pub const ALL: [FieldKey; 9] = [
        FieldKey::Name,
        FieldKey::Id,
        FieldKey::Ucd,
        FieldKey::Datatype,
        FieldKey::Unit,
        FieldKey::Ref,
        FieldKey::Arraysize,
        FieldKey::Width,
        FieldKey::Precision,
    ];

    /// Attribute spelling used in messages
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKey::Name => "name",
            FieldKey::Id => "id",
            FieldKey::Ucd => "ucd",
            FieldKey::Datatype => "datatype",
            FieldKey::Unit => "unit",
            FieldKey::Ref => "ref",
            FieldKey::Arraysize => "arraysize",
            FieldKey::Width => "width",
            FieldKey::Precision => "precision",
        }
    }

    /// Identifying keys select which elements a constraint applies to
    pub fn is_identifying(&self) -> bool {
        matches!(
            self,
            FieldKey::Name | FieldKey::Id | FieldKey::Ucd | FieldKey::Datatype
        )
    }

    /// A constraint using a required key must find a matching element
    pub fn is_required(&self) -> bool {
        matches!(self, FieldKey::Name | FieldKey::Id | FieldKey::Ucd)
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which kind of element is being described
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Param,
    Field,
}

impl ElementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Param => "PARAM",
            ElementKind::Field => "FIELD",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Common attribute access for PARAMs and FIELDs
pub trait Declared {
    fn kind(&self) -> ElementKind;

    fn name(&self) -> &str;

    /// Returns the raw attribute value, `None` when absent
    fn attribute(&self, key: FieldKey) -> Option<String>;
}

/// A declared PARAM
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeclaredParam {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "ID")]
    pub id: Option<String>,
    #[serde(default)]
    pub ucd: Option<String>,
    #[serde(default)]
    pub datatype: String,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default, rename = "ref")]
    pub reference: Option<String>,
    #[serde(default)]
    pub arraysize: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub precision: Option<String>,
    #[serde(default)]
    pub value: String,
}

impl DeclaredParam {
    pub fn new(name: impl Into<String>, datatype: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            datatype: datatype.into(),
            value: value.into(),
            ..Self::default()
        }
    }

    /// A variable-length char PARAM
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            arraysize: Some("*".into()),
            ..Self::new(name, "char", value)
        }
    }
}

impl Declared for DeclaredParam {
    fn kind(&self) -> ElementKind {
        ElementKind::Param
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn attribute(&self, key: FieldKey) -> Option<String> {
        element_attribute(
            key,
            &self.name,
            self.id.as_deref(),
            self.ucd.as_deref(),
            &self.datatype,
            self.unit.as_deref(),
            self.reference.as_deref(),
            self.arraysize.as_deref(),
            self.width,
            self.precision.as_deref(),
        )
    }
}

/// A declared FIELD
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeclaredField {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "ID")]
    pub id: Option<String>,
    #[serde(default)]
    pub ucd: Option<String>,
    #[serde(default)]
    pub datatype: String,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default, rename = "ref")]
    pub reference: Option<String>,
    #[serde(default)]
    pub arraysize: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub precision: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl DeclaredField {
    pub fn new(name: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            datatype: datatype.into(),
            ..Self::default()
        }
    }

    pub fn with_ucd(mut self, ucd: impl Into<String>) -> Self {
        self.ucd = Some(ucd.into());
        self
    }

    pub fn with_arraysize(mut self, arraysize: impl Into<String>) -> Self {
        self.arraysize = Some(arraysize.into());
        self
    }

    pub fn with_width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn with_precision(mut self, precision: impl Into<String>) -> Self {
        self.precision = Some(precision.into());
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl Declared for DeclaredField {
    fn kind(&self) -> ElementKind {
        ElementKind::Field
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn attribute(&self, key: FieldKey) -> Option<String> {
        element_attribute(
            key,
            &self.name,
            self.id.as_deref(),
            self.ucd.as_deref(),
            &self.datatype,
            self.unit.as_deref(),
            self.reference.as_deref(),
            self.arraysize.as_deref(),
            self.width,
            self.precision.as_deref(),
        )
    }
}

#[allow(clippy::too_many_arguments)]
fn element_attribute(
    key: FieldKey,
    name: &str,
    id: Option<&str>,
    ucd: Option<&str>,
    datatype: &str,
    unit: Option<&str>,
    reference: Option<&str>,
    arraysize: Option<&str>,
    width: Option<u32>,
    precision: Option<&str>,
) -> Option<String> {
    let value = match key {
        FieldKey::Name => Some(name),
        FieldKey::Id => id,
        FieldKey::Ucd => ucd,
        FieldKey::Datatype => Some(datatype),
        FieldKey::Unit => unit,
        FieldKey::Ref => reference,
        FieldKey::Arraysize => arraysize,
        FieldKey::Width => return width.map(|w| w.to_string()),
        FieldKey::Precision => precision,
    };
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

/// One TABLEDATA row of positional cells.
///
/// `None` is an empty `<TD/>`; a missing trailing cell is a shorter vector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    pub cells: Vec<Option<String>>,
}

impl Row {
    pub fn new(cells: Vec<Option<String>>) -> Self {
        Self { cells }
    }

    /// Builds a row where every cell is present
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cells: values.into_iter().map(|v| Some(v.into())).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// A parsed table ready for traversal
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub params: Vec<DeclaredParam>,
    #[serde(default)]
    pub fields: Vec<DeclaredField>,
    #[serde(default)]
    pub rows: Vec<Row>,
}

impl Table {
    /// Parses a table from its JSON form
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_keys_are_identifying() {
        for key in FieldKey::ALL {
            if key.is_required() {
                assert!(key.is_identifying(), "{} must be identifying", key);
            }
        }
        assert!(FieldKey::Datatype.is_identifying());
        assert!(!FieldKey::Datatype.is_required());
    }

    #[test]
    fn test_blank_attributes_read_as_absent() {
        let field = DeclaredField::new("ra", "double").with_unit("");
        assert_eq!(field.attribute(FieldKey::Unit), None);
        assert_eq!(field.attribute(FieldKey::Datatype), Some("double".to_string()));

        let field = field.with_width(8);
        assert_eq!(field.attribute(FieldKey::Width), Some("8".to_string()));
    }

    #[test]
    fn test_table_from_json() {
        let table = Table::from_json(
            r#"{
                "description": "sources",
                "params": [{"name": "Catalogue Name", "datatype": "char", "value": "abc"}],
                "fields": [{"name": "ra", "datatype": "double", "ucd": "pos.eq.ra;meta.main"}],
                "rows": [["1.5"], [null], []]
            }"#,
        )
        .unwrap();

        assert_eq!(table.params[0].value, "abc");
        assert_eq!(table.fields[0].ucd.as_deref(), Some("pos.eq.ra;meta.main"));
        assert_eq!(table.rows[0].cells, vec![Some("1.5".to_string())]);
        assert_eq!(table.rows[1].cells, vec![None]);
        assert!(table.rows[2].is_empty());
    }
}

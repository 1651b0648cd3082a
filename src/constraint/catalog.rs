//! Constraint catalog loading
//!
//! A catalog is read once per pipeline variant from a JSON specification:
//!
//! ```json
//! {
//!   "params": [{"name": "Catalogue Name", "datatype": "char"}],
//!   "fields": [{"ucd": "meta.id;meta.main"}, {"datatype": "char", "maxarraysize": "1024"}]
//! }
//! ```
//!
//! Loading is deterministic and the result is immutable, so one catalog can
//! be shared by every traversal through an `Arc`.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::errors::{ConfigError, ConfigResult};
use super::types::{Constraint, FieldConstraint, ParamConstraint};
use crate::votable::FieldDatatype;

const COLLECTION_CATALOGUE: &str = include_str!("../../constraints/collection_catalogue.json");
const VALIDATION_METRIC: &str = include_str!("../../constraints/validation_metric.json");

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogSpec {
    #[serde(default)]
    params: Vec<ParamConstraint>,
    #[serde(default)]
    fields: Vec<FieldConstraint>,
}

/// Immutable set of PARAM and FIELD constraints
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintCatalog {
    name: String,
    params: Vec<ParamConstraint>,
    fields: Vec<FieldConstraint>,
}

impl ConstraintCatalog {
    /// Builds a catalog from constraint lists, checking it is unambiguous
    pub fn new(
        name: impl Into<String>,
        params: Vec<ParamConstraint>,
        fields: Vec<FieldConstraint>,
    ) -> ConfigResult<Self> {
        let catalog = Self {
            name: name.into(),
            params,
            fields,
        };
        catalog.validate_structure()?;
        Ok(catalog)
    }

    /// Parses a catalog from its JSON specification
    pub fn from_json_str(name: &str, json: &str) -> ConfigResult<Self> {
        let spec: CatalogSpec = serde_json::from_str(json)
            .map_err(|e| ConfigError::malformed(name, format!("Invalid JSON: {}", e)))?;
        Self::new(name, spec.params, spec.fields)
    }

    /// Loads a catalog from a JSON file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let display = path.display().to_string();
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::malformed(display.clone(), format!("Failed to read file: {}", e))
        })?;
        Self::from_json_str(&display, &content).map_err(|e| e.at_path(display.clone()))
    }

    /// The built-in catalog for collection catalogue deposits
    pub fn collection_catalogue() -> ConfigResult<Self> {
        Self::from_json_str("collection_catalogue", COLLECTION_CATALOGUE)
    }

    /// The built-in catalog for validation metric files
    pub fn validation_metric() -> ConfigResult<Self> {
        Self::from_json_str("validation_metric", VALIDATION_METRIC)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// PARAM constraints in declaration order
    pub fn params(&self) -> &[ParamConstraint] {
        &self.params
    }

    /// FIELD constraints in declaration order
    pub fn fields(&self) -> &[FieldConstraint] {
        &self.fields
    }

    /// Width every char FIELD falls back to when it declares no maximum.
    ///
    /// Taken from the tightest catch-all constraint on datatype `char`.
    pub fn char_width_fallback(&self) -> Option<u32> {
        self.fields
            .iter()
            .filter(|c| !c.requires_match())
            .filter(|c| {
                c.datatype
                    .as_deref()
                    .and_then(FieldDatatype::parse)
                    .map_or(false, |d| d == FieldDatatype::Char)
            })
            .filter_map(|c| c.max_arraysize.and_then(|a| a.maximum()))
            .min()
    }

    fn validate_structure(&self) -> ConfigResult<()> {
        check_unambiguous("PARAM", &self.params)?;
        check_unambiguous("FIELD", &self.fields)?;

        for constraint in self.params.iter().chain(self.fields.iter()) {
            if let Some(datatype) = &constraint.datatype {
                if FieldDatatype::parse(datatype).is_none() {
                    return Err(ConfigError::malformed(
                        self.name.clone(),
                        format!("Datatype '{}' is not supported", datatype),
                    ));
                }
            }
        }
        Ok(())
    }
}

fn check_unambiguous(kind: &str, constraints: &[Constraint]) -> ConfigResult<()> {
    let identities: Vec<_> = constraints
        .iter()
        .filter(|c| c.requires_match())
        .map(|c| (c.identity(), c))
        .collect();

    for (i, (identity, constraint)) in identities.iter().enumerate() {
        if identities[i + 1..].iter().any(|(other, _)| other == identity) {
            return Err(ConfigError::ambiguous(kind, constraint.describe()));
        }
    }
    Ok(())
}

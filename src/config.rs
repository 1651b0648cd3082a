//! Ingest configuration
//!
//! Loaded from a JSON file. Every setting has a default, so `{}` is a valid
//! configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constraint::{ConfigError, ConfigResult, ConstraintCatalog};
use crate::ddl::is_safe_identifier;
use crate::observability::{log_event_with_fields, Event};

/// Configuration shared by every pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IngestConfig {
    /// Database schema holding catalogue and metadata tables
    #[serde(default = "default_schema")]
    pub schema: String,

    /// Longest accepted TABLE or FIELD description, in characters
    #[serde(default = "default_description_max_length")]
    pub description_max_length: usize,

    /// Replaces the built-in collection catalogue constraints
    #[serde(default)]
    pub collection_constraints: Option<PathBuf>,

    /// Replaces the built-in validation metric constraints
    #[serde(default)]
    pub metric_constraints: Option<PathBuf>,
}

fn default_schema() -> String {
    "casda".to_string()
}

fn default_description_max_length() -> usize {
    255
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            schema: default_schema(),
            description_max_length: default_description_max_length(),
            collection_constraints: None,
            metric_constraints: None,
        }
    }
}

impl IngestConfig {
    /// Loads and validates configuration from a file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let display = path.display().to_string();
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::invalid(format!("Failed to read config: {}", e)).at_path(&display))?;

        let config: IngestConfig = serde_json::from_str(&content)
            .map_err(|e| ConfigError::invalid(format!("Invalid config JSON: {}", e)).at_path(&display))?;

        config.validate().map_err(|e| e.at_path(&display))?;

        log_event_with_fields(
            Event::ConfigLoaded,
            &[("path", display.as_str()), ("schema", config.schema.as_str())],
        );
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if !is_safe_identifier(&self.schema) {
            return Err(ConfigError::invalid(format!(
                "Invalid schema: '{}'. It must contain only letters, numbers and underscores.",
                self.schema
            )));
        }

        if self.description_max_length == 0 {
            return Err(ConfigError::invalid("description_max_length must be > 0"));
        }

        Ok(())
    }

    /// Constraints for collection catalogues
    pub fn collection_catalog(&self) -> ConfigResult<ConstraintCatalog> {
        let catalog = match &self.collection_constraints {
            Some(path) => ConstraintCatalog::load(path)?,
            None => ConstraintCatalog::collection_catalogue()?,
        };
        log_loaded(&catalog, self.collection_constraints.as_deref());
        Ok(catalog)
    }

    /// Constraints for validation metric files
    pub fn metric_catalog(&self) -> ConfigResult<ConstraintCatalog> {
        let catalog = match &self.metric_constraints {
            Some(path) => ConstraintCatalog::load(path)?,
            None => ConstraintCatalog::validation_metric()?,
        };
        log_loaded(&catalog, self.metric_constraints.as_deref());
        Ok(catalog)
    }
}

fn log_loaded(catalog: &ConstraintCatalog, path: Option<&Path>) {
    let source = path.map_or_else(|| "built-in".to_string(), |p| p.display().to_string());
    let params = catalog.params().len().to_string();
    let fields = catalog.fields().len().to_string();
    log_event_with_fields(
        Event::ConstraintsLoaded,
        &[
            ("catalog", catalog.name()),
            ("fields", fields.as_str()),
            ("params", params.as_str()),
            ("source", source.as_str()),
        ],
    );
}

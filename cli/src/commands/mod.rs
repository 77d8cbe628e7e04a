pub mod check;
pub mod map_errors;
pub mod validate;

use anyhow::{Context, Result};
use forms::{FormDefinition, FormDefinitionLoader};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Load a single form definition for a command
pub(crate) fn load_form(path: &Path) -> Result<FormDefinition> {
    FormDefinitionLoader::load_from_file(path)
        .with_context(|| format!("Failed to load form definition {}", path.display()))
}

/// Read and parse a JSON input file
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

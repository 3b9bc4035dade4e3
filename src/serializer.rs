//! Serialization of Swagger documents to YAML or JSON.
//!
//! Both formats come from the same serde model, so a document written as
//! YAML and one written as JSON describe the same API.

use crate::swagger::Swagger;
use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::Path;

/// Serializes a Swagger document to YAML.
///
/// # Errors
///
/// Returns an error if serialization fails.
///
/// # Example
///
/// ```
/// use swagger_from_routes::serializer::serialize_yaml;
/// use swagger_from_routes::swagger::{Info, Swagger};
///
/// let yaml = serialize_yaml(&Swagger::new(Info::default())).unwrap();
/// assert!(yaml.contains("swagger:"));
/// ```
pub fn serialize_yaml(doc: &Swagger) -> Result<String> {
    debug!("Serializing Swagger document to YAML");
    serde_yaml::to_string(doc).context("Failed to serialize Swagger document to YAML")
}

/// Serializes a Swagger document to pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_json(doc: &Swagger) -> Result<String> {
    debug!("Serializing Swagger document to JSON");
    serde_json::to_string_pretty(doc).context("Failed to serialize Swagger document to JSON")
}

/// Writes string content to a file, creating parent directories as needed.
///
/// An existing file is overwritten.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write to file: {}", path.display()))?;

    debug!("Wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

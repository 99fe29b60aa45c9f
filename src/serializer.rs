//! Serialization of OpenAPI documents to YAML or JSON.
//!
//! Both formats serialize the same document tree, so key order (sorted paths and
//! components, fixed field order inside objects) is identical across formats.

use crate::openapi_builder::OpenApiDocument;
use anyhow::{Context, Result};
use clap::ValueEnum;
use log::debug;
use std::fs;
use std::path::Path;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Yaml,
    Json,
}

/// Serialize `doc` in the requested format
pub fn serialize(doc: &OpenApiDocument, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Yaml => serialize_yaml(doc),
        OutputFormat::Json => serialize_json(doc),
    }
}

/// Serializes an OpenAPI document to YAML format.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_yaml(doc: &OpenApiDocument) -> Result<String> {
    debug!("Serializing OpenAPI document to YAML");
    serde_yaml::to_string(doc).context("Failed to serialize OpenAPI document to YAML")
}

/// Serializes an OpenAPI document to pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_json(doc: &OpenApiDocument) -> Result<String> {
    debug!("Serializing OpenAPI document to JSON");
    serde_json::to_string_pretty(doc).context("Failed to serialize OpenAPI document to JSON")
}

/// Writes string content to a file, creating parent directories as needed.
///
/// # Errors
///
/// Returns an error if a directory or the file cannot be created or written to.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write to file: {}", path.display()))?;

    debug!("Successfully wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openapi_builder::{Components, Info, Operation, PathItem, Response};
    use crate::schema::SchemaNode;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn create_test_document() -> OpenApiDocument {
        let mut paths = BTreeMap::new();
        paths.insert(
            "/users".to_string(),
            PathItem {
                get: Some(Operation {
                    operation_id: "list_users".to_string(),
                    summary: "GET /users".to_string(),
                    parameters: Vec::new(),
                    request_body: None,
                    responses: BTreeMap::from([(
                        "200".to_string(),
                        Response {
                            description: "OK".to_string(),
                            content: None,
                        },
                    )]),
                }),
                ..Default::default()
            },
        );
        OpenApiDocument {
            openapi: "3.0.3".to_string(),
            info: Info {
                title: "Test API".to_string(),
                version: "1.0.0".to_string(),
            },
            paths,
            components: Some(Components {
                schemas: BTreeMap::from([
                    ("Zed".to_string(), SchemaNode::string()),
                    ("Alpha".to_string(), SchemaNode::empty_object()),
                ]),
            }),
        }
    }

    #[test]
    fn test_serialize_yaml() {
        let yaml = serialize_yaml(&create_test_document()).unwrap();
        assert!(yaml.contains("openapi: 3.0.3"));
        assert!(yaml.contains("title: Test API"));
        assert!(yaml.contains("/users:"));
        assert!(yaml.contains("operationId: list_users"));

        let value: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(value["paths"]["/users"]["get"]["responses"]["200"]["description"], "OK");
    }

    #[test]
    fn test_serialize_json() {
        let json = serialize_json(&create_test_document()).unwrap();
        assert!(json.contains('\n'));
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["openapi"], "3.0.3");
        assert_eq!(parsed["info"]["title"], "Test API");
        assert_eq!(parsed["components"]["schemas"]["Zed"]["type"], "string");
    }

    #[test]
    fn test_key_order_is_stable() {
        let doc = create_test_document();
        let json = serialize_json(&doc).unwrap();
        let yaml = serialize_yaml(&doc).unwrap();
        for text in [&json, &yaml] {
            let openapi = text.find("openapi").unwrap();
            let paths = text.find("paths").unwrap();
            let alpha = text.find("Alpha").unwrap();
            let zed = text.find("Zed").unwrap();
            assert!(openapi < paths);
            assert!(alpha < zed, "components must be sorted");
        }
        assert_eq!(json, serialize_json(&doc).unwrap());
    }

    #[test]
    fn test_serialize_dispatches_on_format() {
        let doc = create_test_document();
        assert_eq!(
            serialize(&doc, OutputFormat::Json).unwrap(),
            serialize_json(&doc).unwrap()
        );
        assert_eq!(
            serialize(&doc, OutputFormat::Yaml).unwrap(),
            serialize_yaml(&doc).unwrap()
        );
    }

    #[test]
    fn test_write_to_file_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("subdir").join("nested").join("openapi.yaml");

        write_to_file("initial content", &file_path).unwrap();
        write_to_file("new content", &file_path).unwrap();

        let read_content = fs::read_to_string(&file_path).unwrap();
        assert_eq!(read_content, "new content");
    }
}

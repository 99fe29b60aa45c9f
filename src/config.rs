//! Run configuration.
//!
//! Loaded once from a YAML (or JSON) file and read-only for the rest of the run. Every key
//! is optional; missing keys fall back to the defaults documented on each field.

use crate::error::{Error, Result};
use clap::ValueEnum;
use glob::Pattern;
use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Top-level configuration consumed by the schema compiler and document builder
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct CompilerConfig {
    /// Document title
    pub title: String,
    /// Document version
    pub version: String,
    /// Media type of responses and JSON request bodies
    pub media_type: String,
    pub naming: NamingConfig,
    pub limits: LimitsConfig,
    /// Ordered envelope patterns; order is significant, first match wins per pass
    pub wrappers: Vec<WrapperPattern>,
    pub polymorphism: PolymorphismConfig,
    /// Glob patterns, relative to the project root, of source files left out of the scan
    pub excludes: Vec<String>,
    pub ignore: IgnoreConfig,
    pub media_type_normalize: MediaTypeNormalize,
}

/// Endpoints and parameters dropped from the document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default, rename_all = "kebab-case")]
pub struct IgnoreConfig {
    /// Glob patterns matched against the normalized endpoint path; `/**` matches any suffix
    pub paths: Vec<String>,
    /// Parameter names matched exactly
    pub parameters: Vec<String>,
}

impl IgnoreConfig {
    pub fn is_parameter_ignored(&self, name: &str) -> bool {
        self.parameters.iter().any(|p| p == name)
    }
}

/// Rewrites applied to every emitted media type, keyed by the raw value
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct MediaTypeNormalize(pub IndexMap<String, String>);

impl Default for MediaTypeNormalize {
    fn default() -> Self {
        let mut map = IndexMap::new();
        map.insert("*/*".to_string(), "application/json".to_string());
        Self(map)
    }
}

impl MediaTypeNormalize {
    /// Trimmed media type, replaced by its mapping when one exists
    pub fn normalize(&self, media_type: &str) -> String {
        let trimmed = media_type.trim();
        self.0
            .get(trimmed)
            .cloned()
            .unwrap_or_else(|| trimmed.to_string())
    }
}

/// Compile glob patterns, skipping (and logging) any that do not parse.
///
/// `CompilerConfig::validate` rejects bad patterns up front, so the skip only matters for
/// configurations built in code.
pub fn glob_patterns(patterns: &[String]) -> Vec<Pattern> {
    patterns
        .iter()
        .filter_map(|raw| match Pattern::new(raw) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                warn!("Ignoring invalid glob {}: {}", raw, e);
                None
            }
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default, rename_all = "kebab-case")]
pub struct NamingConfig {
    pub strategy: NamingStrategy,
    pub collision: CollisionPolicy,
}

/// How a schema base name is derived from a type identity
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum NamingStrategy {
    /// Fully-qualified path
    Fqn,
    /// Last path segment only
    Simple,
    /// Last path segment plus short names of the type arguments
    SimpleWithArgs,
    /// Fully-qualified path plus short names of the type arguments
    #[default]
    FqnWithArgs,
}

/// What to do when two distinct types compute the same base name
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CollisionPolicy {
    /// Reuse the existing name and log a warning
    #[default]
    FirstWinsLog,
    /// Append `_1`, `_2`, ... until the name is free
    SuffixNumber,
    /// Abort the run
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct LimitsConfig {
    /// Deepest nesting lowered before degrading to an opaque object
    pub max_depth: usize,
    /// Properties kept per object before truncating
    pub max_properties: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_depth: 30,
            max_properties: 2000,
        }
    }
}

/// A generic envelope whose payload is one of its type arguments
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct WrapperPattern {
    /// Envelope type name; generic arguments, if written, are ignored
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub payload_arg_index: usize,
    /// Free-form metadata carried to the document as `x-envelope`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    /// Schema of the envelope with a placeholder where the payload schema goes
    #[serde(default, rename = "as-schema", skip_serializing_if = "Option::is_none")]
    pub schema_template: Option<serde_json::Value>,
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
}

fn default_placeholder() -> String {
    "T".to_string()
}

impl WrapperPattern {
    /// Create a pattern with no metadata or template
    pub fn new(type_name: impl Into<String>, payload_arg_index: usize) -> Self {
        Self {
            type_name: type_name.into(),
            payload_arg_index,
            metadata: None,
            schema_template: None,
            placeholder: default_placeholder(),
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_template(mut self, template: serde_json::Value) -> Self {
        self.schema_template = Some(template);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct PolymorphismConfig {
    pub strategy: PolymorphismStrategy,
    pub discriminator_property: String,
}

impl Default for PolymorphismConfig {
    fn default() -> Self {
        Self {
            strategy: PolymorphismStrategy::Disabled,
            discriminator_property: "type".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PolymorphismStrategy {
    /// No discriminator; a data enum becomes a plain `oneOf` of its variants
    #[default]
    Disabled,
    /// Base types become `oneOf` unions with a discriminator
    Discriminated,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            title: "Generated API".to_string(),
            version: "1.0.0".to_string(),
            media_type: "application/json".to_string(),
            naming: NamingConfig::default(),
            limits: LimitsConfig::default(),
            wrappers: vec![WrapperPattern::new("Result", 0), WrapperPattern::new("Json", 0)],
            polymorphism: PolymorphismConfig::default(),
            excludes: Vec::new(),
            ignore: IgnoreConfig::default(),
            media_type_normalize: MediaTypeNormalize::default(),
        }
    }
}

impl CompilerConfig {
    /// Load a configuration file.
    ///
    /// YAML is a superset of JSON, so both formats go through `serde_yaml`. An empty file
    /// yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_yaml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from YAML or JSON text
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Reject settings the compiler cannot honor
    pub fn validate(&self) -> Result<()> {
        if self.limits.max_properties == 0 {
            return Err(Error::Config("limits.max-properties must be positive".into()));
        }
        for wrapper in &self.wrappers {
            if wrapper.type_name.trim().is_empty() {
                return Err(Error::Config("wrapper type must not be empty".into()));
            }
            if wrapper.placeholder.is_empty() {
                return Err(Error::Config(format!(
                    "wrapper {} has an empty placeholder",
                    wrapper.type_name
                )));
            }
        }
        for raw in self.excludes.iter().chain(&self.ignore.paths) {
            Pattern::new(raw).map_err(|e| Error::Config(format!("invalid glob {}: {}", raw, e)))?;
        }
        Ok(())
    }
}

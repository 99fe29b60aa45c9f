//! Envelope unwrapping.
//!
//! Handlers commonly return their payload inside a generic envelope
//! (`Result<Json<User>, Error>`, `ApiResponse<Page<User>>`). Configured wrapper patterns
//! peel those layers off so the payload type is what gets compiled, while the outermost
//! envelope's metadata and schema template are carried along to the document.

use crate::config::WrapperPattern;
use crate::schema::{PayloadSchema, SchemaNode};
use crate::types::TypeIdentity;
use log::{debug, warn};
use serde_json::Value;

/// What was peeled off a payload type
#[derive(Debug, Clone, PartialEq)]
pub struct EnvelopeMeta {
    /// Raw type name of the matching pattern
    pub wrapper_type: String,
    /// The type as it was before this envelope was removed
    pub original_type: TypeIdentity,
    pub metadata: Option<Value>,
    pub schema_template: Option<Value>,
    pub placeholder: String,
}

/// A request or response payload after unwrapping
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    pub ty: TypeIdentity,
    pub required: bool,
    pub envelope: Option<EnvelopeMeta>,
}

struct CompiledPattern {
    raw_type: String,
    pattern: WrapperPattern,
}

pub struct WrapperStripper {
    patterns: Vec<CompiledPattern>,
}

impl WrapperStripper {
    pub fn new(patterns: &[WrapperPattern]) -> Self {
        let patterns = patterns
            .iter()
            .map(|pattern| CompiledPattern {
                raw_type: raw_type(&pattern.type_name),
                pattern: pattern.clone(),
            })
            .collect();
        Self { patterns }
    }

    /// Strip envelopes until no pattern matches.
    ///
    /// Each pass applies the first matching pattern; the meta of the last pass wins.
    pub fn unwrap(&self, ty: &TypeIdentity) -> (TypeIdentity, Option<EnvelopeMeta>) {
        let mut current = ty.clone();
        let mut last_meta = None;
        loop {
            let matched = self
                .patterns
                .iter()
                .find_map(|compiled| compiled.payload_of(&current).map(|p| (compiled, p.clone())));
            let Some((compiled, payload)) = matched else {
                break;
            };
            debug!(
                "Unwrapped {} via {} to {}",
                current.describe(),
                compiled.raw_type,
                payload.describe()
            );
            last_meta = Some(EnvelopeMeta {
                wrapper_type: compiled.raw_type.clone(),
                original_type: current.clone(),
                metadata: compiled.pattern.metadata.clone(),
                schema_template: compiled.pattern.schema_template.clone(),
                placeholder: compiled.pattern.placeholder.clone(),
            });
            current = payload;
        }
        (current, last_meta)
    }

    /// Build the payload for an optional type; `None` and `()` carry no content
    pub fn payload(&self, ty: Option<&TypeIdentity>, required: bool) -> Option<Payload> {
        let ty = ty?;
        if ty.is_unit() {
            return None;
        }
        let (inner, envelope) = self.unwrap(ty);
        if inner.is_unit() {
            return None;
        }
        Some(Payload {
            ty: inner,
            required,
            envelope,
        })
    }
}

impl CompiledPattern {
    fn payload_of<'a>(&self, ty: &'a TypeIdentity) -> Option<&'a TypeIdentity> {
        let path = ty.qualified_name()?;
        if !paths_match(path, &self.raw_type) {
            return None;
        }
        ty.type_argument(self.pattern.payload_arg_index)
    }
}

/// Pattern name with any written generic arguments removed
fn raw_type(type_name: &str) -> String {
    let trimmed = type_name.trim();
    match trimmed.find('<') {
        Some(idx) if idx > 0 => trimmed[..idx].trim().to_string(),
        _ => trimmed.to_string(),
    }
}

/// Equal paths, or one is a whole-segment suffix of the other
fn paths_match(path: &str, pattern: &str) -> bool {
    path == pattern
        || is_segment_suffix(path, pattern)
        || is_segment_suffix(pattern, path)
}

fn is_segment_suffix(long: &str, short: &str) -> bool {
    long.strip_suffix(short)
        .map(|prefix| prefix.ends_with("::"))
        .unwrap_or(false)
}

/// Splice the payload schema into the envelope's template.
///
/// Without a template the payload schema is used as-is. A template that is not an
/// object or never mentions the placeholder is reported and ignored.
pub fn apply_template(meta: &EnvelopeMeta, inner: &SchemaNode) -> PayloadSchema {
    let Some(template) = &meta.schema_template else {
        return PayloadSchema::Node(inner.clone());
    };
    if !template.is_object() {
        warn!(
            "Failed to apply wrapper schema for {}: template is not an object",
            meta.wrapper_type
        );
        return PayloadSchema::Node(inner.clone());
    }

    let inner_json = inner.to_json();
    let mut replaced = 0;
    let merged = replace_placeholders(template, &meta.placeholder, &inner_json, &mut replaced);
    if replaced == 0 {
        warn!(
            "Failed to apply wrapper schema for {}: placeholder {} not found",
            meta.wrapper_type, meta.placeholder
        );
        return PayloadSchema::Node(inner.clone());
    }
    PayloadSchema::Raw(merged)
}

fn replace_placeholders(node: &Value, placeholder: &str, inner: &Value, count: &mut usize) -> Value {
    match node {
        Value::Object(map) => {
            if map.len() == 1 && map.get("$ref").and_then(Value::as_str) == Some(placeholder) {
                *count += 1;
                return inner.clone();
            }
            Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), replace_placeholders(v, placeholder, inner, count)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|v| replace_placeholders(v, placeholder, inner, count))
                .collect(),
        ),
        Value::String(s) if s == placeholder => {
            *count += 1;
            inner.clone()
        }
        other => other.clone(),
    }
}

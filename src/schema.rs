//! Schema intermediate representation.
//!
//! [`SchemaNode`] is what the compiler produces and the registry stores. It serializes
//! straight to OpenAPI 3.0 JSON Schema, so documents never go through an untyped
//! `serde_json::Value` except where an envelope template is spliced in.

use indexmap::{IndexMap, IndexSet};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// Prefix of every component reference
pub const COMPONENTS_PREFIX: &str = "#/components/schemas/";

/// Build the `$ref` target for a component name
pub fn ref_path(name: &str) -> String {
    format!("{}{}", COMPONENTS_PREFIX, name)
}

/// A schema node with its nullability and validation constraints
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SchemaNode {
    pub kind: SchemaKind,
    pub nullable: bool,
    pub constraints: Constraints,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SchemaKind {
    Primitive {
        kind: PrimitiveKind,
        format: Option<String>,
    },
    /// A string restricted to a fixed set of values
    StringEnum { values: Vec<String> },
    Array { items: Box<SchemaNode> },
    /// An object with arbitrary keys and uniform values
    Map { value: Box<SchemaNode> },
    Object {
        properties: IndexMap<String, SchemaNode>,
        required: IndexSet<String>,
    },
    Composed {
        all_of: Vec<SchemaNode>,
        one_of: Vec<SchemaNode>,
        discriminator: Option<Discriminator>,
    },
    /// Reference to a named component
    Reference { name: String },
    /// "object, no shape": the fallback for anything that could not be resolved
    #[default]
    Opaque,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    String,
    Integer,
    Number,
    Boolean,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Discriminator {
    pub property_name: String,
    /// Discriminator value to component reference
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub mapping: IndexMap<String, String>,
}

/// Validation constraints attached to any node
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Constraints {
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub pattern: Option<String>,
}

impl Constraints {
    pub fn is_empty(&self) -> bool {
        *self == Constraints::default()
    }
}

impl PrimitiveKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveKind::String => "string",
            PrimitiveKind::Integer => "integer",
            PrimitiveKind::Number => "number",
            PrimitiveKind::Boolean => "boolean",
        }
    }

    /// Parse an OpenAPI type name; unknown names yield `None`
    pub fn parse(schema_type: &str) -> Option<Self> {
        match schema_type {
            "string" => Some(PrimitiveKind::String),
            "integer" => Some(PrimitiveKind::Integer),
            "number" => Some(PrimitiveKind::Number),
            "boolean" => Some(PrimitiveKind::Boolean),
            _ => None,
        }
    }
}

impl SchemaNode {
    pub fn new(kind: SchemaKind) -> Self {
        Self {
            kind,
            nullable: false,
            constraints: Constraints::default(),
        }
    }

    pub fn opaque() -> Self {
        Self::new(SchemaKind::Opaque)
    }

    pub fn reference(name: impl Into<String>) -> Self {
        Self::new(SchemaKind::Reference { name: name.into() })
    }

    pub fn primitive(kind: PrimitiveKind, format: Option<&str>) -> Self {
        Self::new(SchemaKind::Primitive {
            kind,
            format: format.map(str::to_string),
        })
    }

    pub fn string() -> Self {
        Self::primitive(PrimitiveKind::String, None)
    }

    pub fn string_enum(values: Vec<String>) -> Self {
        Self::new(SchemaKind::StringEnum { values })
    }

    pub fn array(items: SchemaNode) -> Self {
        Self::new(SchemaKind::Array {
            items: Box::new(items),
        })
    }

    pub fn map(value: SchemaNode) -> Self {
        Self::new(SchemaKind::Map {
            value: Box::new(value),
        })
    }

    /// An object with no properties yet
    pub fn empty_object() -> Self {
        Self::object(IndexMap::new(), IndexSet::new())
    }

    pub fn object(properties: IndexMap<String, SchemaNode>, required: IndexSet<String>) -> Self {
        Self::new(SchemaKind::Object {
            properties,
            required,
        })
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Whether the node is a string schema (plain or enumerated)
    pub fn is_string(&self) -> bool {
        matches!(
            self.kind,
            SchemaKind::Primitive {
                kind: PrimitiveKind::String,
                ..
            } | SchemaKind::StringEnum { .. }
        )
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, SchemaKind::Array { .. })
    }

    pub fn is_opaque(&self) -> bool {
        matches!(self.kind, SchemaKind::Opaque)
    }

    /// Component name of a reference node
    pub fn reference_name(&self) -> Option<&str> {
        match &self.kind {
            SchemaKind::Reference { name } => Some(name),
            _ => None,
        }
    }

    /// Properties of an object node
    pub fn properties(&self) -> Option<&IndexMap<String, SchemaNode>> {
        match &self.kind {
            SchemaKind::Object { properties, .. } => Some(properties),
            _ => None,
        }
    }

    /// Required property names of an object node
    pub fn required(&self) -> Option<&IndexSet<String>> {
        match &self.kind {
            SchemaKind::Object { required, .. } => Some(required),
            _ => None,
        }
    }

    /// Whether the node is an object with at least one property
    pub fn has_properties(&self) -> bool {
        self.properties().map(|p| !p.is_empty()).unwrap_or(false)
    }

    /// Render the node as a JSON value
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl Serialize for SchemaNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        match &self.kind {
            SchemaKind::Primitive { kind, format } => {
                map.serialize_entry("type", kind.as_str())?;
                if let Some(format) = format {
                    map.serialize_entry("format", format)?;
                }
            }
            SchemaKind::StringEnum { values } => {
                map.serialize_entry("type", "string")?;
                map.serialize_entry("enum", values)?;
            }
            SchemaKind::Array { items } => {
                map.serialize_entry("type", "array")?;
                map.serialize_entry("items", items)?;
            }
            SchemaKind::Map { value } => {
                map.serialize_entry("type", "object")?;
                map.serialize_entry("additionalProperties", value)?;
            }
            SchemaKind::Object {
                properties,
                required,
            } => {
                map.serialize_entry("type", "object")?;
                if !properties.is_empty() {
                    map.serialize_entry("properties", properties)?;
                }
                if !required.is_empty() {
                    map.serialize_entry("required", required)?;
                }
            }
            SchemaKind::Composed {
                all_of,
                one_of,
                discriminator,
            } => {
                if !all_of.is_empty() {
                    map.serialize_entry("allOf", all_of)?;
                }
                if !one_of.is_empty() {
                    map.serialize_entry("oneOf", one_of)?;
                }
                if let Some(discriminator) = discriminator {
                    map.serialize_entry("discriminator", discriminator)?;
                }
            }
            SchemaKind::Reference { name } => {
                map.serialize_entry("$ref", &ref_path(name))?;
            }
            SchemaKind::Opaque => {
                map.serialize_entry("type", "object")?;
            }
        }

        if self.nullable {
            map.serialize_entry("nullable", &true)?;
        }

        let c = &self.constraints;
        if let Some(v) = c.min_length {
            map.serialize_entry("minLength", &v)?;
        }
        if let Some(v) = c.max_length {
            map.serialize_entry("maxLength", &v)?;
        }
        if let Some(v) = c.min_items {
            map.serialize_entry("minItems", &v)?;
        }
        if let Some(v) = c.max_items {
            map.serialize_entry("maxItems", &v)?;
        }
        if let Some(v) = c.minimum {
            map.serialize_entry("minimum", &Number(v))?;
        }
        if let Some(v) = c.maximum {
            map.serialize_entry("maximum", &Number(v))?;
        }
        if let Some(pattern) = &c.pattern {
            map.serialize_entry("pattern", pattern)?;
        }
        map.end()
    }
}

/// Numeric bound that serializes integral values without a fractional part
struct Number(f64);

impl Serialize for Number {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let v = self.0;
        if v.fract() == 0.0 && v >= i64::MIN as f64 && v <= i64::MAX as f64 {
            serializer.serialize_i64(v as i64)
        } else {
            serializer.serialize_f64(v)
        }
    }
}

/// Schema placed in a request or response media type.
///
/// Usually a compiled node; an envelope template splice produces raw JSON instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PayloadSchema {
    Node(SchemaNode),
    Raw(serde_json::Value),
}

impl From<SchemaNode> for PayloadSchema {
    fn from(node: SchemaNode) -> Self {
        PayloadSchema::Node(node)
    }
}

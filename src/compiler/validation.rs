//! Maps field validation facts onto property schemas.

use crate::catalog::ValidationFacts;
use crate::schema::{PrimitiveKind, SchemaKind, SchemaNode};
use indexmap::IndexSet;

/// Apply the validation facts of one property.
///
/// Literals that do not parse are ignored; the rest of the facts still apply.
pub fn apply(
    property: &str,
    facts: &ValidationFacts,
    schema: &mut SchemaNode,
    required: &mut IndexSet<String>,
) {
    if facts.not_null {
        required.insert(property.to_string());
    }
    if facts.not_blank {
        required.insert(property.to_string());
        if schema.is_string() {
            schema.constraints.min_length = Some(1);
        }
    }
    if facts.not_empty {
        required.insert(property.to_string());
        if schema.is_array() {
            schema.constraints.min_items = Some(1);
        }
    }

    if let Some(size) = &facts.size {
        let min = size.min.as_deref().and_then(parse_count);
        let max = size.max.as_deref().and_then(parse_count);
        if schema.is_string() {
            if min.is_some() {
                schema.constraints.min_length = min;
            }
            if max.is_some() {
                schema.constraints.max_length = max;
            }
        } else if schema.is_array() {
            if min.is_some() {
                schema.constraints.min_items = min;
            }
            if max.is_some() {
                schema.constraints.max_items = max;
            }
        }
    }

    if let Some(minimum) = facts.minimum.as_deref().and_then(parse_bound) {
        schema.constraints.minimum = Some(minimum);
    }
    if let Some(maximum) = facts.maximum.as_deref().and_then(parse_bound) {
        schema.constraints.maximum = Some(maximum);
    }
    if let Some(pattern) = &facts.pattern {
        schema.constraints.pattern = Some(pattern.clone());
    }
    if let Some(format) = &facts.format {
        if let SchemaKind::Primitive {
            kind: PrimitiveKind::String,
            format: slot,
        } = &mut schema.kind
        {
            *slot = Some(format.clone());
        }
    }
}

fn parse_count(raw: &str) -> Option<u64> {
    raw.trim().parse().ok()
}

fn parse_bound(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SizeBounds;
    use serde_json::json;

    fn int_schema() -> SchemaNode {
        SchemaNode::primitive(PrimitiveKind::Integer, Some("int32"))
    }

    #[test]
    fn test_not_null_marks_required() {
        let facts = ValidationFacts {
            not_null: true,
            ..Default::default()
        };
        let mut schema = int_schema();
        let mut required = IndexSet::new();
        apply("age", &facts, &mut schema, &mut required);
        assert!(required.contains("age"));
        assert!(schema.constraints.is_empty());
    }

    #[test]
    fn test_not_blank_on_string() {
        let facts = ValidationFacts {
            not_blank: true,
            ..Default::default()
        };
        let mut schema = SchemaNode::string();
        let mut required = IndexSet::new();
        apply("name", &facts, &mut schema, &mut required);
        assert!(required.contains("name"));
        assert_eq!(schema.constraints.min_length, Some(1));
    }

    #[test]
    fn test_not_blank_on_non_string_only_requires() {
        let facts = ValidationFacts {
            not_blank: true,
            ..Default::default()
        };
        let mut schema = int_schema();
        let mut required = IndexSet::new();
        apply("count", &facts, &mut schema, &mut required);
        assert!(required.contains("count"));
        assert_eq!(schema.constraints.min_length, None);
    }

    #[test]
    fn test_not_empty_on_array() {
        let facts = ValidationFacts {
            not_empty: true,
            ..Default::default()
        };
        let mut schema = SchemaNode::array(SchemaNode::string());
        let mut required = IndexSet::new();
        apply("tags", &facts, &mut schema, &mut required);
        assert!(required.contains("tags"));
        assert_eq!(schema.constraints.min_items, Some(1));
    }

    #[test]
    fn test_size_on_string_and_array() {
        let facts = ValidationFacts {
            size: Some(SizeBounds {
                min: Some("2".into()),
                max: Some("10".into()),
            }),
            ..Default::default()
        };
        let mut required = IndexSet::new();

        let mut text = SchemaNode::string();
        apply("code", &facts, &mut text, &mut required);
        assert_eq!(text.constraints.min_length, Some(2));
        assert_eq!(text.constraints.max_length, Some(10));

        let mut list = SchemaNode::array(int_schema());
        apply("ids", &facts, &mut list, &mut required);
        assert_eq!(list.constraints.min_items, Some(2));
        assert_eq!(list.constraints.max_items, Some(10));

        assert!(required.is_empty());
    }

    #[test]
    fn test_size_ignored_on_other_kinds() {
        let facts = ValidationFacts {
            size: Some(SizeBounds {
                min: Some("1".into()),
                max: None,
            }),
            ..Default::default()
        };
        let mut schema = int_schema();
        apply("n", &facts, &mut schema, &mut IndexSet::new());
        assert!(schema.constraints.is_empty());
    }

    #[test]
    fn test_range_and_pattern() {
        let facts = ValidationFacts {
            minimum: Some("-5".into()),
            maximum: Some("99.5".into()),
            pattern: Some("^[0-9]+$".into()),
            ..Default::default()
        };
        let mut schema = int_schema();
        apply("score", &facts, &mut schema, &mut IndexSet::new());
        assert_eq!(schema.constraints.minimum, Some(-5.0));
        assert_eq!(schema.constraints.maximum, Some(99.5));
        assert_eq!(schema.constraints.pattern.as_deref(), Some("^[0-9]+$"));
    }

    #[test]
    fn test_not_blank_with_size_bound() {
        let facts = ValidationFacts {
            not_blank: true,
            size: Some(SizeBounds {
                min: None,
                max: Some("10".into()),
            }),
            ..Default::default()
        };
        let mut schema = SchemaNode::string();
        let mut required = IndexSet::new();
        apply("nickname", &facts, &mut schema, &mut required);
        assert_eq!(
            schema.to_json(),
            json!({"type": "string", "minLength": 1, "maxLength": 10})
        );
        assert_eq!(required.into_iter().collect::<Vec<_>>(), vec!["nickname"]);
    }

    #[test]
    fn test_email_and_url_set_string_format() {
        let email = ValidationFacts {
            format: Some("email".into()),
            ..Default::default()
        };
        let mut contact = SchemaNode::string().nullable();
        apply("contact", &email, &mut contact, &mut IndexSet::new());
        assert_eq!(
            contact.to_json(),
            json!({"type": "string", "format": "email", "nullable": true})
        );

        let url = ValidationFacts {
            format: Some("uri".into()),
            ..Default::default()
        };
        let mut link = SchemaNode::string();
        apply("link", &url, &mut link, &mut IndexSet::new());
        assert_eq!(link.to_json(), json!({"type": "string", "format": "uri"}));

        let mut count = int_schema();
        apply("count", &email, &mut count, &mut IndexSet::new());
        assert_eq!(count.to_json(), json!({"type": "integer", "format": "int32"}));
    }

    #[test]
    fn test_malformed_literals_are_skipped() {
        let facts = ValidationFacts {
            not_null: true,
            size: Some(SizeBounds {
                min: Some("abc".into()),
                max: Some("4".into()),
            }),
            minimum: Some("MIN_AGE".into()),
            maximum: Some("NaN".into()),
            ..Default::default()
        };
        let mut schema = SchemaNode::string();
        let mut required = IndexSet::new();
        apply("label", &facts, &mut schema, &mut required);
        assert!(required.contains("label"));
        assert_eq!(schema.constraints.min_length, None);
        assert_eq!(schema.constraints.max_length, Some(4));
        assert_eq!(schema.constraints.minimum, None);
        assert_eq!(schema.constraints.maximum, None);
    }
}

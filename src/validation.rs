//! Schema validation helpers.
//!
//! This module validates a `serde_json::Value` against a [`Schema`] and holds
//! the CircleCI-specific value checks resources apply on top of it.
//!
//! # Example
//!
//! ```
//! use circleci_provider::schema::{Schema, Attribute};
//! use circleci_provider::validation::validate;
//! use serde_json::json;
//!
//! let schema = Schema::v0()
//!     .with_attribute("project", Attribute::required_string())
//!     .with_attribute("name", Attribute::required_string());
//!
//! let diagnostics = validate(&schema, &json!({"project": "widgets", "name": "API_KEY"}));
//! assert!(diagnostics.is_empty());
//!
//! // Wrong type for name
//! let diagnostics = validate(&schema, &json!({"project": "widgets", "name": 42}));
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].attribute, Some("name".to_string()));
//! ```

use crate::schema::{Attribute, AttributeType, Diagnostic, Schema};
use serde_json::Value;

/// Validate a JSON value against a schema.
///
/// Returns a list of diagnostics for any validation errors found.
/// An empty list means the value is valid.
///
/// # Validation Rules
///
/// - The value must be an object
/// - Required attributes must be present and non-null
/// - Optional attributes may be absent or null
/// - Computed attributes are skipped (provider sets these)
/// - Attribute types must match the schema
pub fn validate(schema: &Schema, value: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    let obj = match value {
        Value::Object(map) => map,
        _ => {
            diagnostics.push(
                Diagnostic::error("Expected object")
                    .with_detail(format!("Got {}", value_type_name(value))),
            );
            return diagnostics;
        }
    };

    for (name, attr) in &schema.attributes {
        validate_attribute(attr, obj.get(name), name, &mut diagnostics);
    }

    diagnostics
}

/// Validate a JSON value against a schema, returning Ok if valid or Err with diagnostics.
pub fn validate_result(schema: &Schema, value: &Value) -> Result<(), Vec<Diagnostic>> {
    let diagnostics = validate(schema, value);
    if diagnostics.is_empty() {
        Ok(())
    } else {
        Err(diagnostics)
    }
}

/// Check if a JSON value is valid against a schema.
pub fn is_valid(schema: &Schema, value: &Value) -> bool {
    validate(schema, value).is_empty()
}

/// Whether `name` is accepted by CircleCI as an environment variable name.
///
/// The first character must be an ASCII letter or `_`; the rest ASCII
/// letters, digits or `_`.
pub fn validate_env_var_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

fn validate_attribute(
    attr: &Attribute,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if attr.flags.is_computed_only() {
        return;
    }

    match value {
        None | Some(Value::Null) => {
            if attr.flags.required {
                diagnostics.push(
                    Diagnostic::error(format!("Missing required attribute '{}'", path))
                        .with_detail("This attribute is required and must be provided")
                        .with_attribute(path),
                );
            }
        }
        Some(v) => {
            let matches = match attr.attr_type {
                AttributeType::String => v.is_string(),
                AttributeType::Int64 => v.as_i64().is_some(),
                AttributeType::Bool => v.is_boolean(),
            };
            if !matches {
                diagnostics.push(type_error(path, attr.attr_type, v));
            }
        }
    }
}

fn type_error(path: &str, expected: AttributeType, value: &Value) -> Diagnostic {
    let expected = match expected {
        AttributeType::String => "string",
        AttributeType::Int64 => "int64",
        AttributeType::Bool => "bool",
    };
    Diagnostic::error(format!("Invalid type for '{}'", path))
        .with_detail(format!("Expected {}, got {}", expected, value_type_name(value)))
        .with_attribute(path)
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::AttributeFlags;
    use serde_json::json;

    fn env_var_schema() -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("project", Attribute::required_string())
            .with_attribute("name", Attribute::required_string())
            .with_attribute("value", Attribute::required_string().sensitive())
    }

    #[test]
    fn test_validate_required_string() {
        let schema = env_var_schema();

        let valid = json!({"project": "widgets", "name": "FOO", "value": "bar"});
        assert!(validate(&schema, &valid).is_empty());

        let missing = json!({"project": "widgets", "name": "FOO"});
        let diagnostics = validate(&schema, &missing);
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Missing required attribute 'value'"));
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("value"));

        let null = json!({"project": "widgets", "name": null, "value": "bar"});
        assert_eq!(validate(&schema, &null).len(), 1);
    }

    #[test]
    fn test_validate_optional_attribute() {
        let schema = Schema::v0().with_attribute("url", Attribute::optional_string());

        assert!(validate(&schema, &json!({})).is_empty());
        assert!(validate(&schema, &json!({"url": null})).is_empty());
        assert!(validate(&schema, &json!({"url": "https://circleci.example"})).is_empty());
    }

    #[test]
    fn test_validate_computed_attribute_skipped() {
        let schema = env_var_schema();
        let value = json!({"id": 12, "project": "widgets", "name": "FOO", "value": "bar"});
        assert!(validate(&schema, &value).is_empty());
    }

    #[test]
    fn test_validate_types() {
        let schema = Schema::v0()
            .with_attribute(
                "count",
                Attribute::new(AttributeType::Int64, AttributeFlags::optional()),
            )
            .with_attribute(
                "enabled",
                Attribute::new(AttributeType::Bool, AttributeFlags::optional()),
            );

        assert!(validate(&schema, &json!({"count": 3, "enabled": true})).is_empty());

        let diagnostics = validate(&schema, &json!({"count": 1.5, "enabled": "yes"}));
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics
            .iter()
            .any(|d| d.detail.as_deref() == Some("Expected int64, got number")));
        assert!(diagnostics
            .iter()
            .any(|d| d.detail.as_deref() == Some("Expected bool, got string")));
    }

    #[test]
    fn test_validate_root_not_object() {
        let diagnostics = validate(&env_var_schema(), &json!("widgets"));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].summary, "Expected object");
        assert_eq!(diagnostics[0].detail.as_deref(), Some("Got string"));
    }

    #[test]
    fn test_helpers() {
        let schema = env_var_schema();
        let valid = json!({"project": "widgets", "name": "FOO", "value": "bar"});
        assert!(is_valid(&schema, &valid));
        assert!(validate_result(&schema, &valid).is_ok());

        let errors = validate_result(&schema, &json!({})).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_env_var_names() {
        for name in ["FOO", "_FOO", "foo_bar", "A1", "_"] {
            assert!(validate_env_var_name(name), "{} should be valid", name);
        }
        for name in ["", "1FOO", "FOO-BAR", "FOO BAR", "ÉTÉ", "$FOO"] {
            assert!(!validate_env_var_name(name), "{} should be invalid", name);
        }
    }
}

//! Structural validation of metadata payloads.
//!
//! The generator ships a JSON schema next to each metadata file. Only the
//! structural keywords are enforced: `type`, `enum`, `required`,
//! `properties`, `additionalProperties`, `items` and local `$ref`s. Other
//! keywords are accepted and ignored.

use crate::error::{MetadataError, Result};
use serde::Deserialize;
use serde_json::{Map, Value};

/// How strictly a payload is checked against its schema on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Validation {
    /// Only require well-formed JSON.
    Off,
    /// Enforce the structural subset of the schema.
    #[default]
    Structural,
}

const MAX_REF_HOPS: usize = 32;

/// A parsed metadata schema.
#[derive(Debug, Clone)]
pub struct Schema {
    root: Value,
}

impl Schema {
    /// Parse schema text. The root must be a JSON object or boolean.
    pub fn parse(text: &str) -> Result<Self> {
        let root: Value = serde_json::from_str(text).map_err(|source| {
            MetadataError::MalformedInput {
                input: "schema",
                source,
            }
        })?;
        if !(root.is_object() || root.is_boolean()) {
            return Err(MetadataError::MalformedInput {
                input: "schema",
                source: serde::de::Error::custom("schema root must be an object or a boolean"),
            });
        }
        Ok(Self { root })
    }

    /// Check `instance` against the schema, reporting the first violation.
    pub fn validate(&self, instance: &Value) -> Result<()> {
        let mut pointer = String::new();
        self.check(&self.root, instance, &mut pointer, 0)
    }

    fn check(&self, schema: &Value, instance: &Value, pointer: &mut String, hops: usize) -> Result<()> {
        let schema = match schema {
            Value::Bool(true) => return Ok(()),
            Value::Bool(false) => {
                return Err(MetadataError::mismatch(pointer.clone(), "no value is allowed here"))
            }
            Value::Object(schema) => schema,
            // Not a schema; nothing to enforce.
            _ => return Ok(()),
        };

        if let Some(Value::String(reference)) = schema.get("$ref") {
            if hops >= MAX_REF_HOPS {
                return Err(MetadataError::mismatch(
                    pointer.clone(),
                    format!("schema reference '{}' does not terminate", reference),
                ));
            }
            let target = reference
                .strip_prefix('#')
                .and_then(|path| self.root.pointer(path));
            return match target {
                Some(target) => self.check(target, instance, pointer, hops + 1),
                None => {
                    tracing::warn!(reference = %reference, "ignoring unresolvable schema reference");
                    Ok(())
                }
            };
        }

        if let Some(expected) = schema.get("type") {
            if !type_matches(expected, instance) {
                return Err(MetadataError::mismatch(
                    pointer.clone(),
                    format!("expected {}, found {}", describe_type(expected), kind_of(instance)),
                ));
            }
        }

        if let Some(Value::Array(allowed)) = schema.get("enum") {
            if !allowed.contains(instance) {
                return Err(MetadataError::mismatch(
                    pointer.clone(),
                    format!("{} is not one of the allowed values", instance),
                ));
            }
        }

        match instance {
            Value::Object(object) => self.check_object(schema, object, pointer),
            Value::Array(items) => {
                if let Some(item_schema) = schema.get("items").filter(|s| !s.is_array()) {
                    for (index, item) in items.iter().enumerate() {
                        let len = pointer.len();
                        pointer.push('/');
                        pointer.push_str(&index.to_string());
                        self.check(item_schema, item, pointer, 0)?;
                        pointer.truncate(len);
                    }
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn check_object(
        &self,
        schema: &Map<String, Value>,
        object: &Map<String, Value>,
        pointer: &mut String,
    ) -> Result<()> {
        if let Some(Value::Array(required)) = schema.get("required") {
            for name in required.iter().filter_map(Value::as_str) {
                if !object.contains_key(name) {
                    return Err(MetadataError::mismatch(
                        pointer.clone(),
                        format!("missing required property '{}'", name),
                    ));
                }
            }
        }

        let properties = schema.get("properties").and_then(Value::as_object);
        let additional = schema.get("additionalProperties");

        for (name, value) in object {
            let len = pointer.len();
            pointer.push('/');
            push_escaped(pointer, name);

            if let Some(property_schema) = properties.and_then(|p| p.get(name)) {
                self.check(property_schema, value, pointer, 0)?;
            } else if let Some(additional) = additional {
                if additional == &Value::Bool(false) {
                    return Err(MetadataError::mismatch(
                        pointer.clone(),
                        format!("property '{}' is not allowed", name),
                    ));
                }
                self.check(additional, value, pointer, 0)?;
            }

            pointer.truncate(len);
        }
        Ok(())
    }
}

fn type_matches(expected: &Value, instance: &Value) -> bool {
    match expected {
        Value::String(name) => is_type(name, instance),
        Value::Array(names) => names
            .iter()
            .filter_map(Value::as_str)
            .any(|name| is_type(name, instance)),
        _ => true,
    }
}

fn is_type(name: &str, instance: &Value) -> bool {
    match name {
        "object" => instance.is_object(),
        "array" => instance.is_array(),
        "string" => instance.is_string(),
        "boolean" => instance.is_boolean(),
        "null" => instance.is_null(),
        "number" => instance.is_number(),
        "integer" => {
            instance.is_i64()
                || instance.is_u64()
                || instance.as_f64().is_some_and(|f| f.fract() == 0.0)
        }
        // Unknown type names never reject.
        _ => true,
    }
}

fn describe_type(expected: &Value) -> String {
    match expected {
        Value::String(name) => name.clone(),
        Value::Array(names) => names
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(" or "),
        other => other.to_string(),
    }
}

fn kind_of(instance: &Value) -> &'static str {
    match instance {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Append a JSON pointer reference token.
fn push_escaped(pointer: &mut String, token: &str) {
    for c in token.chars() {
        match c {
            '~' => pointer.push_str("~0"),
            '/' => pointer.push_str("~1"),
            c => pointer.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mismatch_pointer(result: Result<()>) -> String {
        match result {
            Err(MetadataError::SchemaMismatch { pointer, .. }) => pointer,
            other => panic!("expected schema mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_required_and_types() {
        let schema = Schema::parse(
            r#"{
                "type": "object",
                "required": ["targets"],
                "properties": {
                    "targets": {
                        "type": "object",
                        "additionalProperties": {
                            "type": "object",
                            "properties": {
                                "object_sources_cxx": { "type": "array", "items": { "type": "string" } }
                            }
                        }
                    }
                }
            }"#,
        )
        .unwrap();

        assert!(schema.validate(&json!({ "targets": {} })).is_ok());
        assert_eq!(mismatch_pointer(schema.validate(&json!({}))), "");

        let bad = json!({ "targets": { "main": { "object_sources_cxx": ["/a.cpp", 3] } } });
        assert_eq!(
            mismatch_pointer(schema.validate(&bad)),
            "/targets/main/object_sources_cxx/1"
        );
    }

    #[test]
    fn test_pointer_escapes_path_keys() {
        let schema = Schema::parse(
            r#"{ "additionalProperties": { "type": "object" } }"#,
        )
        .unwrap();

        let bad = json!({ "/src/a.cpp": "nope" });
        assert_eq!(mismatch_pointer(schema.validate(&bad)), "/~1src~1a.cpp");
    }

    #[test]
    fn test_additional_properties_false() {
        let schema = Schema::parse(
            r#"{ "properties": { "a": {} }, "additionalProperties": false }"#,
        )
        .unwrap();

        assert!(schema.validate(&json!({ "a": 1 })).is_ok());
        assert_eq!(mismatch_pointer(schema.validate(&json!({ "b": 1 }))), "/b");
    }

    #[test]
    fn test_local_refs_and_enum() {
        let schema = Schema::parse(
            r##"{
                "definitions": {
                    "kind": { "type": "string", "enum": ["EXECUTABLE", "STATIC_LIBRARY"] }
                },
                "properties": { "type": { "$ref": "#/definitions/kind" } }
            }"##,
        )
        .unwrap();

        assert!(schema.validate(&json!({ "type": "EXECUTABLE" })).is_ok());
        assert_eq!(mismatch_pointer(schema.validate(&json!({ "type": "BOGUS" }))), "/type");
    }

    #[test]
    fn test_self_reference_terminates() {
        let schema = Schema::parse(r##"{ "$ref": "#" }"##).unwrap();
        assert_eq!(mismatch_pointer(schema.validate(&json!({}))), "");
    }

    #[test]
    fn test_malformed_schema() {
        let err = Schema::parse("{ not json").unwrap_err();
        assert!(matches!(err, MetadataError::MalformedInput { input: "schema", .. }));

        let err = Schema::parse("[1, 2]").unwrap_err();
        assert!(matches!(err, MetadataError::MalformedInput { input: "schema", .. }));
    }

    #[test]
    fn test_integer_type() {
        let schema = Schema::parse(r#"{ "type": "integer" }"#).unwrap();
        assert!(schema.validate(&json!(3)).is_ok());
        assert!(schema.validate(&json!(3.5)).is_err());
    }
}

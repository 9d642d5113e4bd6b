//! Structural payload validation against OpenAPI component schemas
//!
//! Covers the subset of JSON Schema used by the OTG models: `$ref` into
//! `components.schemas`, `type`, `required`, `enum`, `properties`,
//! `items`, `minimum` and `maximum`. Objects that declare `properties`
//! reject unknown keys, matching how OTG SDKs treat unknown fields.

use serde_json::Value;

/// Nesting depth after which validation stops descending
const MAX_DEPTH: usize = 64;

const REF_PREFIX: &str = "#/components/schemas/";

/// A single schema violation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Location of the offending value, e.g. `/flows/0/rate/pps`
    pub path: String,
    /// What went wrong
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let path = if self.path.is_empty() { "/" } else { &self.path };
        write!(f, "{}: {}", path, self.message)
    }
}

/// Validate `value` against `schema`, resolving references within `root`.
///
/// Returns the first violation found.
pub fn validate_value(root: &Value, schema: &Value, value: &Value) -> Result<(), Violation> {
    Walker { root }.walk(schema, value, &mut String::new(), 0)
}

struct Walker<'a> {
    root: &'a Value,
}

impl<'a> Walker<'a> {
    fn walk(&self, schema: &'a Value, value: &Value, path: &mut String, depth: usize) -> Result<(), Violation> {
        if depth > MAX_DEPTH {
            return Ok(());
        }

        let schema = self.resolve(schema, path)?;

        let Some(schema_obj) = schema.as_object() else {
            return Ok(());
        };

        if let Some(expected) = schema_obj.get("type").and_then(|t| t.as_str()) {
            if !type_matches(expected, value) {
                return Err(violation(
                    path,
                    format!("expected {}, found {}", expected, type_name(value)),
                ));
            }
        }

        if let Some(allowed) = schema_obj.get("enum").and_then(|e| e.as_array()) {
            if !allowed.contains(value) {
                let names: Vec<String> = allowed.iter().map(|v| v.to_string()).collect();
                return Err(violation(
                    path,
                    format!("value {} is not one of [{}]", value, names.join(", ")),
                ));
            }
        }

        if let Some(n) = value.as_f64() {
            if let Some(min) = schema_obj.get("minimum").and_then(|m| m.as_f64()) {
                if n < min {
                    return Err(violation(path, format!("{} is less than minimum {}", n, min)));
                }
            }
            if let Some(max) = schema_obj.get("maximum").and_then(|m| m.as_f64()) {
                if n > max {
                    return Err(violation(path, format!("{} is greater than maximum {}", n, max)));
                }
            }
        }

        match value {
            Value::Object(map) => {
                if let Some(required) = schema_obj.get("required").and_then(|r| r.as_array()) {
                    for key in required.iter().filter_map(|k| k.as_str()) {
                        if !map.contains_key(key) {
                            return Err(violation(
                                path,
                                format!("missing required property '{}'", key),
                            ));
                        }
                    }
                }

                let Some(properties) = schema_obj.get("properties").and_then(|p| p.as_object()) else {
                    return Ok(());
                };

                for (key, child) in map {
                    let Some(child_schema) = properties.get(key) else {
                        return Err(violation(path, format!("unknown property '{}'", key)));
                    };
                    let len = path.len();
                    path.push('/');
                    path.push_str(key);
                    self.walk(child_schema, child, path, depth + 1)?;
                    path.truncate(len);
                }
                Ok(())
            }
            Value::Array(items) => {
                let Some(item_schema) = schema_obj.get("items") else {
                    return Ok(());
                };
                for (i, item) in items.iter().enumerate() {
                    let len = path.len();
                    path.push('/');
                    path.push_str(&i.to_string());
                    self.walk(item_schema, item, path, depth + 1)?;
                    path.truncate(len);
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn resolve(&self, schema: &'a Value, path: &str) -> Result<&'a Value, Violation> {
        let mut current = schema;
        // Bounded so that a self-referencing alias cannot loop forever
        for _ in 0..MAX_DEPTH {
            let Some(reference) = current.get("$ref").and_then(|r| r.as_str()) else {
                return Ok(current);
            };
            current = lookup_ref(self.root, reference)
                .ok_or_else(|| violation(path, format!("unresolvable reference {}", reference)))?;
        }
        Ok(current)
    }
}

/// Resolve `#/components/schemas/<Name>` within a document
pub fn lookup_ref<'a>(root: &'a Value, reference: &str) -> Option<&'a Value> {
    let name = reference.strip_prefix(REF_PREFIX)?;
    root.get("components")?.get("schemas")?.get(name)
}

fn violation(path: &str, message: String) -> Violation {
    Violation {
        path: path.to_string(),
        message,
    }
}

fn type_matches(expected: &str, value: &Value) -> bool {
    match expected {
        "object" => value.is_object(),
        "array" => value.is_array(),
        "string" => value.is_string(),
        "boolean" => value.is_boolean(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        _ => true,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> Value {
        json!({
            "components": {
                "schemas": {
                    "Config": {
                        "type": "object",
                        "properties": {
                            "ports": {"type": "array", "items": {"$ref": "#/components/schemas/Port"}},
                            "flows": {"type": "array", "items": {"$ref": "#/components/schemas/Flow"}}
                        }
                    },
                    "Port": {
                        "type": "object",
                        "required": ["name"],
                        "properties": {
                            "name": {"type": "string"},
                            "location": {"type": "string"}
                        }
                    },
                    "Flow": {
                        "type": "object",
                        "required": ["name"],
                        "properties": {
                            "name": {"type": "string"},
                            "rate": {"$ref": "#/components/schemas/Flow.Rate"}
                        }
                    },
                    "Flow.Rate": {
                        "type": "object",
                        "properties": {
                            "choice": {"type": "string", "enum": ["pps", "percentage"]},
                            "pps": {"type": "integer", "minimum": 1},
                            "percentage": {"type": "number", "minimum": 0, "maximum": 100}
                        }
                    },
                    "Loop": {"$ref": "#/components/schemas/Loop"}
                }
            }
        })
    }

    fn check(value: Value) -> Result<(), Violation> {
        let root = doc();
        let schema = json!({"$ref": "#/components/schemas/Config"});
        validate_value(&root, &schema, &value)
    }

    #[test]
    fn test_valid_config() {
        let value = json!({
            "ports": [{"name": "p1", "location": "localhost:5555"}],
            "flows": [{"name": "f1", "rate": {"choice": "pps", "pps": 100}}]
        });
        assert!(check(value).is_ok());
        assert!(check(json!({})).is_ok());
    }

    #[test]
    fn test_wrong_type() {
        let err = check(json!({"ports": {"name": "p1"}})).unwrap_err();
        assert_eq!(err.path, "/ports");
        assert!(err.message.contains("expected array"));
    }

    #[test]
    fn test_missing_required() {
        let err = check(json!({"ports": [{"location": "x"}]})).unwrap_err();
        assert_eq!(err.path, "/ports/0");
        assert!(err.message.contains("'name'"));
    }

    #[test]
    fn test_unknown_property() {
        let err = check(json!({"portz": []})).unwrap_err();
        assert!(err.message.contains("unknown property 'portz'"));
    }

    #[test]
    fn test_enum_and_bounds() {
        let err = check(json!({"flows": [{"name": "f1", "rate": {"choice": "lightspeed"}}]}))
            .unwrap_err();
        assert_eq!(err.path, "/flows/0/rate/choice");

        let err = check(json!({"flows": [{"name": "f1", "rate": {"percentage": 150.0}}]}))
            .unwrap_err();
        assert!(err.message.contains("maximum"));

        let err = check(json!({"flows": [{"name": "f1", "rate": {"pps": 2.5}}]})).unwrap_err();
        assert!(err.message.contains("expected integer"));
    }

    #[test]
    fn test_self_reference_terminates() {
        let root = doc();
        let schema = json!({"$ref": "#/components/schemas/Loop"});
        assert!(validate_value(&root, &schema, &json!({"anything": 1})).is_ok());
    }

    #[test]
    fn test_unresolvable_reference() {
        let root = doc();
        let schema = json!({"$ref": "#/components/schemas/Missing"});
        let err = validate_value(&root, &schema, &json!({})).unwrap_err();
        assert!(err.message.contains("unresolvable"));
    }

    #[test]
    fn test_violation_display() {
        let v = Violation {
            path: String::new(),
            message: "expected object, found array".into(),
        };
        assert_eq!(v.to_string(), "/: expected object, found array");
    }
}

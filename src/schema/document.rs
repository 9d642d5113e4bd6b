//! Parsed OpenAPI document for one OTG API version

use serde_json::Value;
use std::sync::Arc;

use super::validate::{lookup_ref, validate_value};
use crate::error::{Error, Result};

const COMPONENTS_SCHEMAS: &str = "components.schemas.";

/// An immutable, cheaply clonable OpenAPI schema document
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    version: String,
    root: Arc<Value>,
}

impl SchemaDocument {
    /// Wrap an already parsed document
    pub fn new(version: impl Into<String>, root: Value) -> Self {
        SchemaDocument {
            version: version.into(),
            root: Arc::new(root),
        }
    }

    /// Parse a YAML (or JSON) OpenAPI document
    pub fn from_yaml(version: impl Into<String>, text: &str) -> Result<Self> {
        let root: Value = serde_yaml::from_str(text)?;
        if !root.is_object() {
            return Err(Error::InvalidInput(
                "OpenAPI document must be a mapping".to_string(),
            ));
        }
        Ok(SchemaDocument::new(version, root))
    }

    /// Dotted version this document describes
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The whole document
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Top-level keys of the document
    pub fn top_level_keys(&self) -> Vec<String> {
        self.root
            .as_object()
            .map(|o| o.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Names under `components.schemas`; empty when the section is absent
    pub fn schema_names(&self) -> Vec<String> {
        self.root
            .get("components")
            .and_then(|c| c.get("schemas"))
            .and_then(|s| s.as_object())
            .map(|o| o.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Look up a component by dotted path.
    ///
    /// `components.schemas.<Name>` resolves `<Name>` directly so that schema
    /// names containing dots (`Flow.Router`) are addressable.
    pub fn component(&self, path: &str) -> Result<&Value> {
        if let Some(name) = path.strip_prefix(COMPONENTS_SCHEMAS) {
            return self
                .root
                .get("components")
                .and_then(|c| c.get("schemas"))
                .and_then(|s| s.get(name))
                .ok_or_else(|| {
                    Error::SchemaNotFound(format!("Schema {} not found in components.schemas", name))
                });
        }

        let mut current: &Value = &self.root;
        for segment in path.split('.') {
            current = current.get(segment).ok_or_else(|| {
                Error::SchemaNotFound(format!("Component {} not found in path {}", segment, path))
            })?;
        }
        Ok(current)
    }

    /// Look up a schema by simple (`Flow`) or qualified
    /// (`components.schemas.Flow`) name
    pub fn named_schema(&self, name: &str) -> Result<&Value> {
        if name.starts_with(COMPONENTS_SCHEMAS) || name.starts_with("components.") {
            self.component(name)
        } else {
            self.component(&format!("{}{}", COMPONENTS_SCHEMAS, name))
        }
    }

    /// Validate a payload against the named component schema
    pub fn validate(&self, schema_name: &str, payload: &Value) -> Result<()> {
        let reference = format!("#/components/schemas/{}", schema_name);
        if lookup_ref(&self.root, &reference).is_none() {
            return Err(Error::SchemaNotFound(format!(
                "Schema {} not found in components.schemas",
                schema_name
            )));
        }

        let schema = serde_json::json!({ "$ref": reference });
        validate_value(&self.root, &schema, payload).map_err(|v| {
            Error::SchemaValidation(format!(
                "{} (schema {}, version {})",
                v, schema_name, self.version
            ))
        })
    }
}

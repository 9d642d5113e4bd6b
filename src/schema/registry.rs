//! Schema registry - OpenAPI documents keyed by OTG API version

use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, error, info, warn};

use super::document::SchemaDocument;
use crate::error::{Error, Result};

/// Schemas compiled into the binary, keyed by normalized version
const BUNDLED: &[(&str, &str)] = &[
    ("1_28_0", include_str!("../../schemas/1_28_0/openapi.yaml")),
    ("1_30_0", include_str!("../../schemas/1_30_0/openapi.yaml")),
];

/// File name expected inside each version directory
const SCHEMA_FILE: &str = "openapi.yaml";

/// Normalize a version string to registry key form (`1.30.0` -> `1_30_0`)
pub fn normalize_version(version: &str) -> String {
    version.trim().trim_start_matches('v').replace('.', "_")
}

/// Convert a registry key back to dotted form (`1_30_0` -> `1.30.0`)
pub fn display_version(key: &str) -> String {
    key.replace('_', ".")
}

/// Numeric ordering key; non-numeric components sort first
fn version_order(key: &str) -> Vec<u64> {
    key.split('_').map(|c| c.parse().unwrap_or(0)).collect()
}

enum SchemaSource {
    Bundled(&'static str),
    Inline(String),
    File(PathBuf),
}

struct SchemaEntry {
    source: SchemaSource,
    document: OnceLock<SchemaDocument>,
}

impl SchemaEntry {
    fn new(source: SchemaSource) -> Self {
        SchemaEntry {
            source,
            document: OnceLock::new(),
        }
    }

    /// Parse on first use; later calls return the cached document
    fn load(&self, key: &str) -> Result<SchemaDocument> {
        if let Some(doc) = self.document.get() {
            return Ok(doc.clone());
        }

        let version = display_version(key);
        let parsed = match &self.source {
            SchemaSource::Bundled(text) => SchemaDocument::from_yaml(&version, text),
            SchemaSource::Inline(text) => SchemaDocument::from_yaml(&version, text),
            SchemaSource::File(path) => {
                info!("Loading schema from {}", path.display());
                let text = std::fs::read_to_string(path)?;
                SchemaDocument::from_yaml(&version, &text)
            }
        }
        .map_err(|e| {
            error!("Error loading schema {}: {}", key, e);
            e
        })?;

        info!("Successfully loaded schema version {}", version);
        Ok(self.document.get_or_init(|| parsed).clone())
    }
}

/// Registry of OTG OpenAPI schemas.
///
/// The set of versions is fixed at construction. Documents are parsed
/// lazily on first lookup and shared read-only afterwards, so lookups are
/// safe from any number of tasks.
pub struct SchemaRegistry {
    entries: BTreeMap<String, SchemaEntry>,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::bundled()
    }
}

impl SchemaRegistry {
    /// Registry with no schemas
    pub fn empty() -> Self {
        SchemaRegistry {
            entries: BTreeMap::new(),
        }
    }

    /// Registry holding the schemas compiled into the binary
    pub fn bundled() -> Self {
        let mut registry = Self::empty();
        for (key, text) in BUNDLED {
            registry
                .entries
                .insert((*key).to_string(), SchemaEntry::new(SchemaSource::Bundled(text)));
        }
        debug!("Schema registry initialized with {} bundled versions", registry.entries.len());
        registry
    }

    /// Bundled schemas plus `<dir>/<version>/openapi.yaml` entries.
    ///
    /// Directory entries override bundled versions with the same key.
    pub fn with_schema_dir(dir: &Path) -> Result<Self> {
        let mut registry = Self::bundled();

        if !dir.exists() {
            warn!("Schemas directory does not exist: {}", dir.display());
            return Ok(registry);
        }

        info!("Scanning schemas directory for available versions: {}", dir.display());
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path().join(SCHEMA_FILE);
            if !entry.file_type()?.is_dir() || !path.exists() {
                continue;
            }
            let key = normalize_version(&entry.file_name().to_string_lossy());
            if registry.entries.contains_key(&key) {
                info!("Schema directory overrides bundled version {}", key);
            }
            registry
                .entries
                .insert(key, SchemaEntry::new(SchemaSource::File(path)));
        }

        info!(
            "Found {} available schemas: {:?}",
            registry.entries.len(),
            registry.list_versions()
        );
        Ok(registry)
    }

    /// Add a schema from text, replacing any existing entry for the version
    pub fn register(&mut self, version: &str, text: impl Into<String>) {
        self.entries.insert(
            normalize_version(version),
            SchemaEntry::new(SchemaSource::Inline(text.into())),
        );
    }

    /// Available versions in dotted form, oldest first
    pub fn list_versions(&self) -> Vec<String> {
        let mut keys: Vec<&String> = self.entries.keys().collect();
        keys.sort_by_key(|k| version_order(k));
        keys.into_iter().map(|k| display_version(k)).collect()
    }

    /// Check if a schema version exists (dotted or underscore form)
    pub fn schema_exists(&self, version: &str) -> bool {
        self.entries.contains_key(&normalize_version(version))
    }

    /// Newest available version
    pub fn latest_version(&self) -> Option<String> {
        self.entries
            .keys()
            .max_by_key(|k| version_order(k))
            .map(|k| display_version(k))
    }

    /// Get the schema document for a version.
    ///
    /// Fails with `UnknownVersion` when the version was not bundled or
    /// provided; there is no fallback.
    pub fn get_schema(&self, version: &str) -> Result<SchemaDocument> {
        let key = normalize_version(version);
        let entry = self.entries.get(&key).ok_or_else(|| {
            error!("Schema version not found: {}", version);
            Error::UnknownVersion(version.to_string())
        })?;
        entry.load(&key)
    }

    /// Get a component of a version's schema by dotted path
    pub fn get_component(&self, version: &str, path: &str) -> Result<Value> {
        let doc = self.get_schema(version)?;
        doc.component(path).cloned()
    }

    /// Names under `components.schemas` for a version
    pub fn list_components(&self, version: &str) -> Result<Vec<String>> {
        Ok(self.get_schema(version)?.schema_names())
    }

    /// Validate a payload against a named component of a version's schema
    pub fn validate(&self, version: &str, schema_name: &str, payload: &Value) -> Result<()> {
        self.get_schema(version)?.validate(schema_name, payload)
    }
}

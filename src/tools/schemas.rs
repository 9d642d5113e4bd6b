//! Schema inspection tools

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use super::targets::TargetArgs;
use super::traits::{parse_args, schema_of, Tool, ToolResult};
use crate::error::Result;
use crate::otg::TargetRegistry;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetSchemasArgs {
    /// Name of the traffic generator target
    pub target: String,
    /// Schema names, simple ("Flow") or qualified ("components.schemas.Flow").
    /// A summary of the target's schema is returned when omitted.
    #[serde(default)]
    pub schema_names: Option<Vec<String>>,
}

/// Looks up component schemas in the version a target is pinned to
pub struct GetSchemasForTargetTool {
    targets: Arc<TargetRegistry>,
}

impl GetSchemasForTargetTool {
    pub fn new(targets: Arc<TargetRegistry>) -> Self {
        Self { targets }
    }
}

#[async_trait]
impl Tool for GetSchemasForTargetTool {
    fn name(&self) -> &str {
        "get_schemas_for_target"
    }

    fn description(&self) -> &str {
        "Get OpenAPI component schemas for a target's API version. Names may be simple (Flow) or qualified (components.schemas.Flow)."
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<GetSchemasArgs>()
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let args: GetSchemasArgs = parse_args(args)?;
        let schema = self.targets.schema_for_target(&args.target)?;

        let Some(names) = args.schema_names.filter(|n| !n.is_empty()) else {
            return ToolResult::success(json!({
                "version": schema.version(),
                "top_level": schema.top_level_keys(),
                "schemas": schema.schema_names(),
            }));
        };

        let mut result = Map::new();
        for name in names {
            let entry = match schema.named_schema(&name) {
                Ok(found) => found.clone(),
                Err(e) => {
                    warn!("Schema {} not found for target {}: {}", name, args.target, e);
                    json!({ "error": format!("Schema {} not found", name) })
                }
            };
            result.insert(name, entry);
        }
        debug!("Returning {} schemas for target {}", result.len(), args.target);
        ToolResult::success(Value::Object(result))
    }
}

/// Names under `components.schemas` for a target's version
pub struct ListSchemasForTargetTool {
    targets: Arc<TargetRegistry>,
}

impl ListSchemasForTargetTool {
    pub fn new(targets: Arc<TargetRegistry>) -> Self {
        Self { targets }
    }
}

#[async_trait]
impl Tool for ListSchemasForTargetTool {
    fn name(&self) -> &str {
        "list_schemas_for_target"
    }

    fn description(&self) -> &str {
        "List the component schema names available for a target's API version."
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<TargetArgs>()
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let args: TargetArgs = parse_args(args)?;
        let schema = self.targets.schema_for_target(&args.target)?;
        ToolResult::success(schema.schema_names())
    }
}

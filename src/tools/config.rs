//! Configuration tools

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use super::targets::TargetArgs;
use super::traits::{parse_args, schema_of, Tool, ToolResult};
use crate::error::{Error, Result};
use crate::otg::TargetRegistry;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SetConfigArgs {
    /// Name of the traffic generator target
    pub target: String,
    /// Complete OTG configuration object (ports, flows, devices, ...)
    pub config: Value,
}

/// Reads the configuration currently applied on a target
pub struct GetConfigTool {
    targets: Arc<TargetRegistry>,
}

impl GetConfigTool {
    pub fn new(targets: Arc<TargetRegistry>) -> Self {
        Self { targets }
    }
}

#[async_trait]
impl Tool for GetConfigTool {
    fn name(&self) -> &str {
        "get_config"
    }

    fn description(&self) -> &str {
        "Get the current OTG configuration of a traffic generator target."
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<TargetArgs>()
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let args: TargetArgs = parse_args(args)?;
        let client = self.targets.resolve_target(&args.target).await?;
        ToolResult::success(client.get_config().await?)
    }
}

/// Pushes a full configuration after validating it against the target's schema
pub struct SetConfigTool {
    targets: Arc<TargetRegistry>,
}

impl SetConfigTool {
    pub fn new(targets: Arc<TargetRegistry>) -> Self {
        Self { targets }
    }
}

#[async_trait]
impl Tool for SetConfigTool {
    fn name(&self) -> &str {
        "set_config"
    }

    fn description(&self) -> &str {
        "Apply an OTG configuration to a traffic generator target. The configuration is validated against the target's API version before it is sent."
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<SetConfigArgs>()
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let args: SetConfigArgs = parse_args(args)?;
        if !args.config.is_object() {
            return Err(Error::InvalidInput("config must be a JSON object".into()));
        }

        let client = self.targets.resolve_target(&args.target).await?;
        let response = client.set_config(args.config.clone()).await?;
        info!(otg_target = %args.target, "Configuration applied");

        let mut result = json!({ "status": "success", "config": args.config });
        if let Some(warnings) = response.get("warnings").filter(|w| w.as_array().is_some_and(|a| !a.is_empty())) {
            result["warnings"] = warnings.clone();
        }
        ToolResult::success(result)
    }
}

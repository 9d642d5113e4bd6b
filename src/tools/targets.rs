//! Target discovery and health tools

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use super::traits::{parse_args, schema_of, Tool, ToolResult};
use crate::error::Result;
use crate::otg::TargetRegistry;

/// Arguments for tools that take no input
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct NoArgs {}

/// Arguments for tools addressing a single target
#[derive(Debug, Deserialize, JsonSchema)]
pub struct TargetArgs {
    /// Name of the traffic generator target, as listed by get_available_targets
    pub target: String,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct HealthArgs {
    /// Check only this target; all targets when omitted
    #[serde(default)]
    pub target: Option<String>,
}

/// Lists configured targets with their ports and schema availability
pub struct GetAvailableTargetsTool {
    targets: Arc<TargetRegistry>,
}

impl GetAvailableTargetsTool {
    pub fn new(targets: Arc<TargetRegistry>) -> Self {
        Self { targets }
    }
}

#[async_trait]
impl Tool for GetAvailableTargetsTool {
    fn name(&self) -> &str {
        "get_available_targets"
    }

    fn description(&self) -> &str {
        "List all configured traffic generator targets with their API version, address and port mappings."
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<NoArgs>()
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let _: NoArgs = parse_args(args)?;
        let summaries = self.targets.target_summaries();
        info!("Listing {} available targets", summaries.len());
        ToolResult::success(summaries)
    }
}

/// Reports the controller's capabilities/version
pub struct GetTargetVersionTool {
    targets: Arc<TargetRegistry>,
}

impl GetTargetVersionTool {
    pub fn new(targets: Arc<TargetRegistry>) -> Self {
        Self { targets }
    }
}

#[async_trait]
impl Tool for GetTargetVersionTool {
    fn name(&self) -> &str {
        "get_target_version"
    }

    fn description(&self) -> &str {
        "Get the API spec, SDK and application versions reported by a traffic generator."
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<TargetArgs>()
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let args: TargetArgs = parse_args(args)?;
        let client = self.targets.resolve_target(&args.target).await?;
        ToolResult::success(client.get_version().await?)
    }
}

/// Reachability check across targets
pub struct HealthTool {
    targets: Arc<TargetRegistry>,
}

impl HealthTool {
    pub fn new(targets: Arc<TargetRegistry>) -> Self {
        Self { targets }
    }
}

#[async_trait]
impl Tool for HealthTool {
    fn name(&self) -> &str {
        "health"
    }

    fn description(&self) -> &str {
        "Check health of one or all traffic generator targets by querying their version endpoint."
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<HealthArgs>()
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let args: HealthArgs = parse_args(args)?;
        let status = self.targets.health(args.target.as_deref()).await;
        info!(status = %status.status, "Health check complete");
        ToolResult::success(status)
    }
}

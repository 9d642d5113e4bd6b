//! Metrics, states and capture retrieval tools

use async_trait::async_trait;
use base64::Engine;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use super::traits::{parse_args, schema_of, Tool, ToolResult};
use crate::error::Result;
use crate::otg::TargetRegistry;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct MetricsArgs {
    /// Name of the traffic generator target
    pub target: String,
    /// OTG Metrics.Request object; all port metrics when omitted
    #[serde(default)]
    pub request: Option<Value>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct StatesArgs {
    /// Name of the traffic generator target
    pub target: String,
    /// OTG States.Request object, e.g. {"choice": "ipv4_neighbors"}
    pub request: Value,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetCaptureArgs {
    /// Name of the traffic generator target
    pub target: String,
    /// Port whose captured packets are returned
    pub port_name: String,
}

pub struct GetMetricsTool {
    targets: Arc<TargetRegistry>,
}

impl GetMetricsTool {
    pub fn new(targets: Arc<TargetRegistry>) -> Self {
        Self { targets }
    }
}

#[async_trait]
impl Tool for GetMetricsTool {
    fn name(&self) -> &str {
        "get_metrics"
    }

    fn description(&self) -> &str {
        "Get metrics from a traffic generator target. Pass an OTG metrics request to select flow or protocol metrics; defaults to all port metrics."
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<MetricsArgs>()
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let args: MetricsArgs = parse_args(args)?;
        let client = self.targets.resolve_target(&args.target).await?;
        ToolResult::success(client.get_metrics(args.request).await?)
    }
}

pub struct GetStatesTool {
    targets: Arc<TargetRegistry>,
}

impl GetStatesTool {
    pub fn new(targets: Arc<TargetRegistry>) -> Self {
        Self { targets }
    }
}

#[async_trait]
impl Tool for GetStatesTool {
    fn name(&self) -> &str {
        "get_states"
    }

    fn description(&self) -> &str {
        "Get protocol states (neighbors, LSPs, leases, ...) from a traffic generator target."
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<StatesArgs>()
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let args: StatesArgs = parse_args(args)?;
        let client = self.targets.resolve_target(&args.target).await?;
        ToolResult::success(client.get_states(args.request).await?)
    }
}

/// Returns a port's capture as base64-encoded pcap
pub struct GetCaptureTool {
    targets: Arc<TargetRegistry>,
}

impl GetCaptureTool {
    pub fn new(targets: Arc<TargetRegistry>) -> Self {
        Self { targets }
    }
}

#[async_trait]
impl Tool for GetCaptureTool {
    fn name(&self) -> &str {
        "get_capture"
    }

    fn description(&self) -> &str {
        "Retrieve captured packets for a port as a base64-encoded pcap file."
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<GetCaptureArgs>()
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let args: GetCaptureArgs = parse_args(args)?;
        let client = self.targets.resolve_target(&args.target).await?;
        let pcap = client.get_capture(&args.port_name).await?;
        info!(otg_target = %args.target, port = %args.port_name, size = pcap.len(), "Capture retrieved");
        ToolResult::success(json!({
            "port": args.port_name,
            "size_bytes": pcap.len(),
            "pcap_base64": base64::engine::general_purpose::STANDARD.encode(&pcap),
        }))
    }
}

//! Traffic and capture control tools

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use super::traits::{parse_args, schema_of, Tool, ToolResult};
use crate::error::Result;
use crate::otg::TargetRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    Start,
    Stop,
}

impl Transition {
    fn as_str(self) -> &'static str {
        match self {
            Transition::Start => "start",
            Transition::Stop => "stop",
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct TrafficArgs {
    /// Name of the traffic generator target
    pub target: String,
    /// Flows to act on; all configured flows when omitted
    #[serde(default)]
    pub flow_names: Vec<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CaptureArgs {
    /// Name of the traffic generator target
    pub target: String,
    /// Ports to act on; all configured ports when omitted
    #[serde(default)]
    pub port_names: Vec<String>,
}

/// `start_traffic` / `stop_traffic`
pub struct TrafficTool {
    targets: Arc<TargetRegistry>,
    transition: Transition,
}

impl TrafficTool {
    pub fn start(targets: Arc<TargetRegistry>) -> Self {
        Self {
            targets,
            transition: Transition::Start,
        }
    }

    pub fn stop(targets: Arc<TargetRegistry>) -> Self {
        Self {
            targets,
            transition: Transition::Stop,
        }
    }
}

#[async_trait]
impl Tool for TrafficTool {
    fn name(&self) -> &str {
        match self.transition {
            Transition::Start => "start_traffic",
            Transition::Stop => "stop_traffic",
        }
    }

    fn description(&self) -> &str {
        match self.transition {
            Transition::Start => "Start transmitting traffic flows on a target.",
            Transition::Stop => "Stop transmitting traffic flows on a target.",
        }
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<TrafficArgs>()
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let args: TrafficArgs = parse_args(args)?;
        let client = self.targets.resolve_target(&args.target).await?;
        match self.transition {
            Transition::Start => client.start_traffic(&args.flow_names).await?,
            Transition::Stop => client.stop_traffic(&args.flow_names).await?,
        };
        info!(otg_target = %args.target, action = self.transition.as_str(), "Traffic state changed");
        ToolResult::success(json!({
            "status": "success",
            "action": self.transition.as_str(),
        }))
    }
}

/// `start_capture` / `stop_capture`
pub struct CaptureTool {
    targets: Arc<TargetRegistry>,
    transition: Transition,
}

impl CaptureTool {
    pub fn start(targets: Arc<TargetRegistry>) -> Self {
        Self {
            targets,
            transition: Transition::Start,
        }
    }

    pub fn stop(targets: Arc<TargetRegistry>) -> Self {
        Self {
            targets,
            transition: Transition::Stop,
        }
    }
}

#[async_trait]
impl Tool for CaptureTool {
    fn name(&self) -> &str {
        match self.transition {
            Transition::Start => "start_capture",
            Transition::Stop => "stop_capture",
        }
    }

    fn description(&self) -> &str {
        match self.transition {
            Transition::Start => "Start packet capture on ports of a target.",
            Transition::Stop => "Stop packet capture on ports of a target.",
        }
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<CaptureArgs>()
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let args: CaptureArgs = parse_args(args)?;
        let client = self.targets.resolve_target(&args.target).await?;
        match self.transition {
            Transition::Start => client.start_capture(&args.port_names).await?,
            Transition::Stop => client.stop_capture(&args.port_names).await?,
        };

        let ports = if args.port_names.is_empty() {
            client.config().port_names()
        } else {
            args.port_names
        };
        info!(otg_target = %args.target, action = self.transition.as_str(), ?ports, "Capture state changed");
        ToolResult::success(json!({
            "status": "success",
            "action": self.transition.as_str(),
            "ports": ports,
        }))
    }
}

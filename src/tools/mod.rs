//! Tools module - OTG operations exposed as MCP tools
//!
//! Each tool implements the `Tool` trait and is registered into a
//! `ToolRegistry`, which the MCP server lists and calls.
//!
//! ## Built-in Tools
//!
//! - **targets**: get_available_targets, get_target_version, health
//! - **config**: get_config, set_config
//! - **control**: start_traffic, stop_traffic, start_capture, stop_capture
//! - **monitor**: get_metrics, get_states, get_capture
//! - **schemas**: get_schemas_for_target, list_schemas_for_target
//!
//! Every failure is returned as a structured `{kind, message}` result
//! rather than an MCP protocol error.

mod config;
mod control;
mod monitor;
mod registry;
mod schemas;
mod targets;
mod traits;

use std::sync::Arc;

use crate::otg::TargetRegistry;

// Core trait and types
pub use traits::{parse_args, schema_of, Tool, ToolCall, ToolDefinition, ToolResult};

// Registry
pub use registry::ToolRegistry;

// Built-in tools
pub use config::{GetConfigTool, SetConfigTool};
pub use control::{CaptureTool, TrafficTool};
pub use monitor::{GetCaptureTool, GetMetricsTool, GetStatesTool};
pub use schemas::{GetSchemasForTargetTool, ListSchemasForTargetTool};
pub use targets::{GetAvailableTargetsTool, GetTargetVersionTool, HealthTool};

/// Registry holding every OTG tool bound to `targets`
pub fn otg_tools(targets: Arc<TargetRegistry>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(GetAvailableTargetsTool::new(targets.clone()));
    registry.register(GetTargetVersionTool::new(targets.clone()));
    registry.register(HealthTool::new(targets.clone()));
    registry.register(GetConfigTool::new(targets.clone()));
    registry.register(SetConfigTool::new(targets.clone()));
    registry.register(TrafficTool::start(targets.clone()));
    registry.register(TrafficTool::stop(targets.clone()));
    registry.register(CaptureTool::start(targets.clone()));
    registry.register(CaptureTool::stop(targets.clone()));
    registry.register(GetMetricsTool::new(targets.clone()));
    registry.register(GetStatesTool::new(targets.clone()));
    registry.register(GetCaptureTool::new(targets.clone()));
    registry.register(GetSchemasForTargetTool::new(targets.clone()));
    registry.register(ListSchemasForTargetTool::new(targets));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, RetryConfig, TargetConfig};
    use crate::otg::testing::{ScriptedConnector, ScriptedTransport, Step};
    use crate::schema::SchemaRegistry;
    use serde_json::{json, Value};

    fn setup(steps: Vec<Step>, fallback: Step) -> (ToolRegistry, Arc<ScriptedTransport>) {
        let mut config = Config::default();
        config.retry = RetryConfig::immediate(2);
        config.targets.insert(
            "lab1".into(),
            TargetConfig::new("lab1", "1.30.0", 443)
                .with_port("p1", "10.0.0.1:5555")
                .with_port("p2", "10.0.0.2:5555"),
        );
        let transport = ScriptedTransport::new(steps, fallback);
        let connector = ScriptedConnector::new(transport.clone());
        let targets = Arc::new(crate::otg::TargetRegistry::with_connector(
            config,
            Arc::new(SchemaRegistry::bundled()),
            connector,
        ));
        (otg_tools(targets), transport)
    }

    async fn call(tools: &ToolRegistry, name: &str, args: Value) -> ToolResult {
        tools.execute(&ToolCall::new(name, args)).await
    }

    #[test]
    fn test_all_tools_registered() {
        let (tools, _) = setup(vec![], Step::Json(json!({})));
        assert_eq!(
            tools.names(),
            vec![
                "get_available_targets",
                "get_capture",
                "get_config",
                "get_metrics",
                "get_schemas_for_target",
                "get_states",
                "get_target_version",
                "health",
                "list_schemas_for_target",
                "set_config",
                "start_capture",
                "start_traffic",
                "stop_capture",
                "stop_traffic",
            ]
        );
        for def in tools.definitions() {
            assert_eq!(def.input_schema["type"], "object", "{}", def.name);
        }
    }

    #[tokio::test]
    async fn test_available_targets() {
        let (tools, transport) = setup(vec![], Step::Json(json!({})));
        let result = call(&tools, "get_available_targets", json!({})).await;
        let content = result.content.unwrap();
        assert_eq!(content["lab1"]["apiVersion"], "1.30.0");
        assert_eq!(content["lab1"]["ports"]["p2"]["location"], "10.0.0.2:5555");
        assert_eq!(content["lab1"]["available"], true);
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_target_is_structured_failure() {
        let (tools, _) = setup(vec![], Step::Json(json!({})));
        let result = call(&tools, "get_config", json!({"target": "lab9"})).await;
        assert!(!result.success);
        let failure = result.error.unwrap();
        assert_eq!(failure.kind, "unknown_target");
        assert!(failure.message.contains("lab9"));
    }

    #[tokio::test]
    async fn test_missing_argument() {
        let (tools, _) = setup(vec![], Step::Json(json!({})));
        let result = call(&tools, "get_config", json!({})).await;
        assert_eq!(result.error.unwrap().kind, "invalid_input");
    }

    #[tokio::test]
    async fn test_set_config() {
        let (tools, transport) = setup(vec![], Step::Json(json!({"warnings": ["port p2 unused"]})));
        let config = json!({"ports": [{"name": "p1", "location": "10.0.0.1:5555"}]});
        let result = call(&tools, "set_config", json!({"target": "lab1", "config": config})).await;
        let content = result.content.unwrap();
        assert_eq!(content["status"], "success");
        assert_eq!(content["config"], config);
        assert_eq!(content["warnings"], json!(["port p2 unused"]));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_set_config_invalid_payload() {
        let (tools, transport) = setup(vec![], Step::Json(json!({})));
        let result = call(
            &tools,
            "set_config",
            json!({"target": "lab1", "config": {"flows": [{"name": "f1"}]}}),
        )
        .await;
        let failure = result.error.unwrap();
        assert_eq!(failure.kind, "schema_validation_error");
        assert!(failure.message.contains("tx_rx"));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_capture_tools() {
        let (tools, _) = setup(vec![Step::Json(json!({})), Step::Bytes(b"pcap".to_vec())], Step::Json(json!({})));

        let started = call(&tools, "start_capture", json!({"target": "lab1"})).await;
        let content = started.content.unwrap();
        assert_eq!(content["action"], "start");
        assert_eq!(content["ports"], json!(["p1", "p2"]));

        let capture = call(&tools, "get_capture", json!({"target": "lab1", "port_name": "p1"})).await;
        let content = capture.content.unwrap();
        assert_eq!(content["size_bytes"], 4);
        assert_eq!(content["pcap_base64"], "cGNhcA==");
    }

    #[tokio::test]
    async fn test_traffic_tools() {
        let (tools, transport) = setup(vec![], Step::Json(json!({})));
        let result = call(&tools, "stop_traffic", json!({"target": "lab1", "flow_names": ["f1"]})).await;
        assert_eq!(result.content.unwrap(), json!({"status": "success", "action": "stop"}));
        let body = transport.requests()[0].body.clone().unwrap();
        assert_eq!(body["traffic"]["flow_transmit"]["state"], "stop");
    }

    #[tokio::test]
    async fn test_get_schemas_for_target() {
        let (tools, _) = setup(vec![], Step::Json(json!({})));
        let result = call(
            &tools,
            "get_schemas_for_target",
            json!({"target": "lab1", "schema_names": ["Flow", "components.schemas.Port", "NonExistentSchema"]}),
        )
        .await;
        let content = result.content.unwrap();
        assert!(content["Flow"]["description"].is_string());
        assert!(content["components.schemas.Port"]["description"].is_string());
        assert!(content["NonExistentSchema"]["error"]
            .as_str()
            .unwrap()
            .contains("not found"));

        let summary = call(&tools, "get_schemas_for_target", json!({"target": "lab1"})).await;
        let content = summary.content.unwrap();
        assert_eq!(content["version"], "1.30.0");
        assert!(content["top_level"].as_array().unwrap().contains(&json!("components")));
    }

    #[tokio::test]
    async fn test_list_schemas_for_target() {
        let (tools, _) = setup(vec![], Step::Json(json!({})));
        let result = call(&tools, "list_schemas_for_target", json!({"target": "lab1"})).await;
        let names = result.content.unwrap();
        let names = names.as_array().unwrap();
        assert!(names.contains(&json!("Flow.Router")));
        assert!(!names.contains(&json!("info")));
    }

    #[tokio::test]
    async fn test_health_tool() {
        let (tools, _) = setup(vec![], Step::Transient);
        let result = call(&tools, "health", json!({})).await;
        let content = result.content.unwrap();
        assert_eq!(content["status"], "error");
        assert_eq!(content["targets"]["lab1"]["healthy"], false);
    }
}

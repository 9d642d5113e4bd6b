//! Core tool trait and result types

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::otg::ToolFailure;

/// A tool exposed to MCP clients
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool name
    fn name(&self) -> &str;

    /// Get the tool description
    fn description(&self) -> &str;

    /// Get the JSON Schema for tool parameters
    fn parameters_schema(&self) -> Value;

    /// Execute the tool with given arguments
    async fn execute(&self, args: Value) -> Result<ToolResult>;

    /// Convert to an MCP tool definition
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.parameters_schema(),
        }
    }
}

/// Tool definition as listed by `tools/list`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Result of a tool execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the execution was successful
    pub success: bool,
    /// Result payload (for successful execution)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    /// Structured failure (for failed execution)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolFailure>,
}

impl ToolResult {
    /// Create a successful result
    pub fn success(content: impl Serialize) -> Result<Self> {
        Ok(ToolResult {
            success: true,
            content: Some(serde_json::to_value(content)?),
            error: None,
        })
    }

    /// Create a failed result
    pub fn failure(kind: impl Into<String>, message: impl Into<String>) -> Self {
        ToolResult {
            success: false,
            content: None,
            error: Some(ToolFailure {
                kind: kind.into(),
                message: message.into(),
            }),
        }
    }

    /// Failed result carrying the error's kind tag
    pub fn from_error(err: &Error) -> Self {
        ToolResult {
            success: false,
            content: None,
            error: Some(ToolFailure::from(err)),
        }
    }

    /// Text rendering sent back in MCP content blocks
    pub fn to_text(&self) -> String {
        let value = if self.success {
            self.content.clone().unwrap_or(Value::Null)
        } else {
            serde_json::to_value(&self.error).unwrap_or(Value::Null)
        };
        serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
    }
}

/// A tool call request from the client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Tool name
    pub name: String,
    /// Tool arguments as JSON
    #[serde(default)]
    pub arguments: Value,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        ToolCall {
            name: name.into(),
            arguments,
        }
    }

    /// Parse arguments into a specific type
    pub fn parse_arguments<T: DeserializeOwned>(&self) -> Result<T> {
        parse_args(self.arguments.clone())
    }
}

/// Deserialize tool arguments; a missing argument object counts as `{}`
pub fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T> {
    let args = if args.is_null() {
        Value::Object(Default::default())
    } else {
        args
    };
    serde_json::from_value(args)
        .map_err(|e| Error::InvalidInput(format!("Invalid tool arguments: {}", e)))
}

/// JSON Schema for an argument struct
pub fn schema_of<T: JsonSchema>() -> Value {
    let mut schema = serde_json::to_value(schemars::schema_for!(T)).unwrap_or_default();
    if let Some(obj) = schema.as_object_mut() {
        obj.remove("$schema");
        obj.remove("title");
    }
    schema
}

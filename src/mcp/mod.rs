//! MCP (Model Context Protocol) module
//!
//! Exposes the OTG tool registry to MCP clients over JSON-RPC 2.0.
//!
//! ## Architecture
//!
//! - **protocol**: Wire protocol types (JSON-RPC based)
//! - **server**: Request dispatch, cancellation, and the stdio/HTTP transports
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use otg_mcp::mcp::McpServer;
//! use otg_mcp::otg::TargetRegistry;
//! use otg_mcp::schema::SchemaRegistry;
//! use otg_mcp::tools::otg_tools;
//!
//! # async fn example() -> otg_mcp::Result<()> {
//! let config = otg_mcp::config::load_config(None)?;
//! let targets = Arc::new(TargetRegistry::new(config, Arc::new(SchemaRegistry::bundled())));
//! let server = Arc::new(McpServer::new(otg_tools(targets)));
//! server.run_stdio().await?;
//! # Ok(())
//! # }
//! ```

mod protocol;
mod server;

pub use protocol::{
    methods, CallToolParams, CancelledParams, McpContent, McpError, McpRequest, McpResponse,
    McpToolResult, RequestId, JSONRPC_VERSION, PROTOCOL_VERSION,
};
pub use server::McpServer;

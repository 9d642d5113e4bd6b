//! # OTG MCP
//!
//! A Model Context Protocol server that exposes Open Traffic Generator
//! (OTG) targets as tools.
//!
//! ## Features
//!
//! - **Multi-target:** Any number of named traffic generators, each pinned to an API version
//! - **Versioned schemas:** Bundled OTG OpenAPI schemas validate payloads before they hit the wire
//! - **Resilient calls:** Bounded exponential backoff on transient connection failures
//! - **Two transports:** Newline-delimited JSON-RPC over stdio, or HTTP POST
//! - **Cancellation:** In-flight tool calls can be aborted through `notifications/cancelled`

pub mod config;
pub mod error;
pub mod mcp;
pub mod otg;
pub mod schema;
pub mod tools;

pub use config::Config;
pub use error::{Error, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const NAME: &str = env!("CARGO_PKG_NAME");

//! OTG target access
//!
//! - **operation**: the closed set of OTG REST calls
//! - **transport**: HTTP session to a controller, and the connector seam
//! - **retry**: bounded exponential backoff
//! - **client**: per-target session with schema validation and config cache
//! - **dispatcher**: owned registry of target clients

mod client;
mod dispatcher;
mod operation;
mod retry;
mod transport;
mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use client::TargetClient;
pub use dispatcher::TargetRegistry;
pub use operation::OtgOperation;
pub use retry::RetryPolicy;
pub use transport::{Connector, HttpConnector, HttpMethod, HttpTransport, OtgOutput, OtgRequest, OtgTransport};
pub use types::{CapabilitiesVersion, HealthStatus, TargetHealth, TargetSummary, ToolFailure};

//! Client for a single traffic generator target

use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::operation::OtgOperation;
use super::retry::RetryPolicy;
use super::transport::{OtgOutput, OtgTransport};
use super::types::CapabilitiesVersion;
use crate::config::TargetConfig;
use crate::error::{Error, Result};
use crate::schema::SchemaDocument;

/// Mutable session state, guarded by the per-target lock
#[derive(Debug, Default)]
struct Session {
    /// Last config applied to or read from the device
    last_config: Option<Value>,
}

/// A target's network session plus the schema it is pinned to.
///
/// Operations on one client run one at a time. Dropping an in-flight
/// operation releases the lock and leaves the cached config untouched.
pub struct TargetClient {
    config: TargetConfig,
    schema: SchemaDocument,
    transport: Arc<dyn OtgTransport>,
    retry: RetryPolicy,
    session: Mutex<Session>,
    attempts: AtomicU64,
}

impl TargetClient {
    pub fn new(
        config: TargetConfig,
        schema: SchemaDocument,
        transport: Arc<dyn OtgTransport>,
        retry: RetryPolicy,
    ) -> Self {
        TargetClient {
            config,
            schema,
            transport,
            retry,
            session: Mutex::new(Session::default()),
            attempts: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &TargetConfig {
        &self.config
    }

    /// Schema this client validates against
    pub fn schema(&self) -> &SchemaDocument {
        &self.schema
    }

    /// Network attempts made over the client's lifetime
    pub fn attempts_made(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Last config successfully applied or fetched
    pub async fn last_config(&self) -> Option<Value> {
        self.session.lock().await.last_config.clone()
    }

    /// Validate and run one operation with retry
    pub async fn execute(&self, op: OtgOperation) -> Result<OtgOutput> {
        if let (Some(schema), Some(body)) = (op.request_schema(), op.body()) {
            self.schema.validate(schema, body).map_err(|e| {
                warn!(otg_target = %self.config.name, operation = op.name(), "Rejected request: {}", e);
                e
            })?;
        }

        let request = op.to_request();
        let mut session = self.session.lock().await;
        debug!(otg_target = %self.config.name, "{}", op);

        let transport = &self.transport;
        let total = &self.attempts;
        let (result, attempts) = self
            .retry
            .run(op.name(), |_| {
                total.fetch_add(1, Ordering::SeqCst);
                let transport = transport.clone();
                let request = request.clone();
                async move { transport.send(&request).await }
            })
            .await;

        let output = result.map_err(|e| {
            error!(
                otg_target = %self.config.name,
                operation = op.name(),
                attempts,
                "OTG operation failed: {}",
                e
            );
            e
        })?;

        if let (Some(schema), OtgOutput::Json(body)) = (op.response_schema(), &output) {
            if let Err(e) = self.schema.validate(schema, body) {
                warn!(otg_target = %self.config.name, operation = op.name(), "Unexpected response shape: {}", e);
            }
        }

        match (&op, &output) {
            (OtgOperation::SetConfig(config), _) => session.last_config = Some(config.clone()),
            (OtgOperation::GetConfig, OtgOutput::Json(config)) => {
                session.last_config = Some(config.clone())
            }
            _ => {}
        }

        info!(otg_target = %self.config.name, operation = op.name(), attempts, "OTG operation succeeded");
        Ok(output)
    }

    async fn execute_json(&self, op: OtgOperation) -> Result<Value> {
        Ok(self.execute(op).await?.into_json())
    }

    /// Push a full configuration; returns the controller's warnings body
    pub async fn set_config(&self, config: Value) -> Result<Value> {
        self.execute_json(OtgOperation::SetConfig(config)).await
    }

    /// Current configuration held by the device
    pub async fn get_config(&self) -> Result<Value> {
        self.execute_json(OtgOperation::GetConfig).await
    }

    pub async fn set_control_state(&self, state: Value) -> Result<Value> {
        self.execute_json(OtgOperation::SetControlState(state)).await
    }

    pub async fn set_control_action(&self, action: Value) -> Result<Value> {
        self.execute_json(OtgOperation::SetControlAction(action)).await
    }

    /// Metrics for `request`, or all port metrics when `None`
    pub async fn get_metrics(&self, request: Option<Value>) -> Result<Value> {
        let op = match request {
            Some(request) => OtgOperation::GetMetrics(request),
            None => OtgOperation::all_port_metrics(),
        };
        self.execute_json(op).await
    }

    pub async fn get_states(&self, request: Value) -> Result<Value> {
        self.execute_json(OtgOperation::GetStates(request)).await
    }

    /// Captured packets of one port as pcap bytes
    pub async fn get_capture(&self, port_name: &str) -> Result<Vec<u8>> {
        Ok(self.execute(OtgOperation::capture_for(port_name)).await?.into_bytes())
    }

    pub async fn get_version(&self) -> Result<CapabilitiesVersion> {
        let body = self.execute_json(OtgOperation::GetVersion).await?;
        serde_json::from_value(body).map_err(Error::from)
    }

    pub async fn start_traffic(&self, flow_names: &[String]) -> Result<Value> {
        self.execute_json(OtgOperation::flow_transmit("start", flow_names)).await
    }

    pub async fn stop_traffic(&self, flow_names: &[String]) -> Result<Value> {
        self.execute_json(OtgOperation::flow_transmit("stop", flow_names)).await
    }

    pub async fn start_capture(&self, port_names: &[String]) -> Result<Value> {
        self.execute_json(OtgOperation::port_capture("start", port_names)).await
    }

    pub async fn stop_capture(&self, port_names: &[String]) -> Result<Value> {
        self.execute_json(OtgOperation::port_capture("stop", port_names)).await
    }
}

impl std::fmt::Debug for TargetClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetClient")
            .field("name", &self.config.name)
            .field("api_version", &self.schema.version())
            .finish()
    }
}

//! Target registry - resolves target names to clients and dispatches
//! OTG operations to them

use futures::future::join_all;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use super::client::TargetClient;
use super::operation::OtgOperation;
use super::retry::RetryPolicy;
use super::transport::{Connector, HttpConnector, OtgOutput};
use super::types::{HealthStatus, TargetHealth, TargetSummary};
use crate::config::{Config, TargetConfig};
use crate::error::{Error, Result};
use crate::schema::{SchemaDocument, SchemaRegistry};

/// Owns every target client for the life of the process.
///
/// Clients are created on first use and shared afterwards; a name always
/// resolves to the same client until `shutdown`.
pub struct TargetRegistry {
    config: Config,
    schemas: Arc<SchemaRegistry>,
    connector: Arc<dyn Connector>,
    clients: RwLock<HashMap<String, Arc<TargetClient>>>,
}

impl TargetRegistry {
    /// Registry that reaches targets over HTTP
    pub fn new(config: Config, schemas: Arc<SchemaRegistry>) -> Self {
        let connector = Arc::new(HttpConnector::new(config.connection.clone()));
        Self::with_connector(config, schemas, connector)
    }

    /// Registry with a custom transport connector
    pub fn with_connector(
        config: Config,
        schemas: Arc<SchemaRegistry>,
        connector: Arc<dyn Connector>,
    ) -> Self {
        info!(
            "Target registry initialized with {} targets",
            config.targets.len()
        );
        TargetRegistry {
            config,
            schemas,
            connector,
            clients: RwLock::new(HashMap::new()),
        }
    }

    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    /// Configured target names, sorted
    pub fn list_targets(&self) -> Vec<String> {
        self.config.targets.keys().cloned().collect()
    }

    pub fn target_config(&self, name: &str) -> Result<&TargetConfig> {
        self.config
            .targets
            .get(name)
            .ok_or_else(|| Error::UnknownTarget(name.to_string()))
    }

    /// Per-target summary; `available` reflects whether a schema exists
    pub fn target_summaries(&self) -> BTreeMap<String, TargetSummary> {
        self.config
            .targets
            .iter()
            .map(|(name, target)| {
                let summary = TargetSummary {
                    api_version: target.api_version.clone(),
                    host: target.host.clone(),
                    port: target.port,
                    ports: target.ports.clone(),
                    available: self.schemas.schema_exists(&target.api_version),
                };
                (name.clone(), summary)
            })
            .collect()
    }

    /// Schema document for a target without opening a session
    pub fn schema_for_target(&self, name: &str) -> Result<SchemaDocument> {
        let target = self.target_config(name)?;
        debug!("Target {} uses API version {}", name, target.api_version);
        self.schemas.get_schema(&target.api_version)
    }

    /// Return the client for `name`, creating it on first use
    pub async fn resolve_target(&self, name: &str) -> Result<Arc<TargetClient>> {
        if let Some(client) = self.clients.read().await.get(name) {
            return Ok(client.clone());
        }

        let mut clients = self.clients.write().await;
        if let Some(client) = clients.get(name) {
            return Ok(client.clone());
        }

        let target = self.target_config(name).map_err(|e| {
            error!("Target {} not found in configuration", name);
            e
        })?;
        let schema = self.schemas.get_schema(&target.api_version)?;
        let transport = self.connector.connect(target)?;

        let client = Arc::new(TargetClient::new(
            target.clone(),
            schema,
            transport,
            RetryPolicy::new(self.config.retry.clone()),
        ));
        info!(otg_target = name, api_version = %target.api_version, "Created target client");
        clients.insert(name.to_string(), client.clone());
        Ok(client)
    }

    /// Run an operation against a target
    pub async fn dispatch(&self, target: &str, op: OtgOperation) -> Result<OtgOutput> {
        let client = self.resolve_target(target).await?;
        client.execute(op).await
    }

    /// Check reachability of one target, or every target concurrently
    pub async fn health(&self, target: Option<&str>) -> HealthStatus {
        let names = match target {
            Some(name) => vec![name.to_string()],
            None => self.list_targets(),
        };
        info!("Checking health of {} targets", names.len());

        let checks = names.into_iter().map(|name| async move {
            let result = match self.resolve_target(&name).await {
                Ok(client) => client.get_version().await,
                Err(e) => Err(e),
            };
            match result {
                Ok(version) => TargetHealth::healthy(name, version),
                Err(e) => {
                    error!(otg_target = %name, "Health check failed: {}", e);
                    TargetHealth::unhealthy(name, e.to_string())
                }
            }
        });

        HealthStatus::from_targets(join_all(checks).await)
    }

    /// Number of live clients
    pub async fn active_clients(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Drop every client and its session
    pub async fn shutdown(&self) {
        let mut clients = self.clients.write().await;
        info!("Closing {} target sessions", clients.len());
        clients.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryConfig;
    use crate::otg::testing::{ScriptedConnector, ScriptedTransport, Step};
    use crate::otg::transport::HttpMethod;
    use serde_json::json;
    use std::time::Duration;

    fn config() -> Config {
        let mut config = Config::default();
        config.retry = RetryConfig::immediate(2);
        for (name, version) in [("lab1", "1.30.0"), ("lab2", "1.28.0"), ("future", "9.0.0")] {
            config.targets.insert(
                name.to_string(),
                TargetConfig::new(name, version, 443).with_port("p1", "10.0.0.1:5555"),
            );
        }
        config
    }

    fn registry(step: Step) -> (TargetRegistry, Arc<ScriptedConnector>) {
        let connector = ScriptedConnector::new(ScriptedTransport::always(step));
        let registry = TargetRegistry::with_connector(
            config(),
            Arc::new(SchemaRegistry::bundled()),
            connector.clone(),
        );
        (registry, connector)
    }

    #[tokio::test]
    async fn test_resolve_is_idempotent() {
        let (registry, connector) = registry(Step::Json(json!({})));
        let a = registry.resolve_target("lab1").await.unwrap();
        let b = registry.resolve_target("lab1").await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(connector.connects(), 1);
        assert_eq!(a.schema().version(), "1.30.0");
    }

    #[tokio::test]
    async fn test_concurrent_resolve_creates_one_client() {
        let (registry, connector) = registry(Step::Json(json!({})));
        let registry = Arc::new(registry);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                tokio::spawn(async move { registry.resolve_target("lab2").await.unwrap() })
            })
            .collect();
        let clients: Vec<_> = join_all(handles).await.into_iter().map(|r| r.unwrap()).collect();
        assert!(clients.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(connector.connects(), 1);
    }

    #[tokio::test]
    async fn test_unknown_target() {
        let (registry, connector) = registry(Step::Json(json!({})));
        let err = registry.resolve_target("lab9").await.unwrap_err();
        assert!(matches!(err, Error::UnknownTarget(ref name) if name == "lab9"));
        assert_eq!(connector.connects(), 0);
    }

    #[tokio::test]
    async fn test_unknown_version() {
        let (registry, connector) = registry(Step::Json(json!({})));
        let err = registry.resolve_target("future").await.unwrap_err();
        assert!(matches!(err, Error::UnknownVersion(_)));
        assert_eq!(connector.connects(), 0);
        assert_eq!(registry.active_clients().await, 0);
    }

    #[tokio::test]
    async fn test_dispatch() {
        let (registry, connector) = registry(Step::Json(json!({"ports": []})));
        let out = registry.dispatch("lab1", OtgOperation::GetConfig).await.unwrap();
        assert_eq!(out.into_json(), json!({"ports": []}));
        assert_eq!(connector.transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_validates_against_target_version() {
        let (registry, connector) = registry(Step::Json(json!({})));
        let config = json!({
            "flows": [{
                "name": "f1",
                "tx_rx": {"choice": "port", "port": {"tx_name": "p1", "rx_names": ["p1"]}}
            }]
        });
        assert!(registry
            .dispatch("lab1", OtgOperation::SetConfig(config.clone()))
            .await
            .is_ok());
        let err = registry
            .dispatch("lab2", OtgOperation::SetConfig(config))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SchemaValidation(_)));
        assert_eq!(connector.transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_calls_to_one_target_are_serialized() {
        let (registry, connector) =
            registry(Step::Delayed(Duration::from_millis(30), json!({})));
        let registry = Arc::new(registry);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let registry = registry.clone();
                tokio::spawn(async move { registry.dispatch("lab1", OtgOperation::GetConfig).await })
            })
            .collect();
        for result in join_all(handles).await {
            assert!(result.unwrap().is_ok());
        }

        assert_eq!(connector.transport.calls(), 4);
        assert_eq!(connector.transport.peak_concurrency(), 1);
    }

    #[tokio::test]
    async fn test_calls_to_different_targets_overlap() {
        let (registry, connector) =
            registry(Step::Delayed(Duration::from_millis(100), json!({})));
        let (a, b) = tokio::join!(
            registry.dispatch("lab1", OtgOperation::GetConfig),
            registry.dispatch("lab2", OtgOperation::GetConfig),
        );
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(connector.transport.peak_concurrency(), 2);
    }

    #[tokio::test]
    async fn test_dispatch_control_action() {
        let (registry, connector) = registry(Step::Json(json!({"warnings": []})));

        let action = json!({"choice": "protocol", "protocol": {"choice": "ipv4"}});
        let out = registry
            .dispatch("lab1", OtgOperation::SetControlAction(action.clone()))
            .await
            .unwrap();
        assert_eq!(out.into_json(), json!({"warnings": []}));

        let requests = connector.transport.requests();
        assert_eq!(requests[0].method, HttpMethod::Post);
        assert_eq!(requests[0].path, "/control/action");
        assert_eq!(requests[0].body, Some(action));

        let err = registry
            .dispatch("lab1", OtgOperation::SetControlAction(json!({"choice": "reboot"})))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SchemaValidation(_)));
        assert_eq!(connector.transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_health_reports_each_target() {
        let (registry, _) = registry(Step::Json(json!({
            "api_spec_version": "1.30.0", "sdk_version": "1.30.0", "app_version": "1.0"
        })));
        let status = registry.health(None).await;
        assert_eq!(status.status, "error");
        assert!(status.targets["lab1"].healthy);
        assert!(status.targets["lab2"].healthy);
        assert!(!status.targets["future"].healthy);

        let status = registry.health(Some("lab1")).await;
        assert!(status.is_success());
        assert_eq!(status.targets.len(), 1);
    }

    #[tokio::test]
    async fn test_health_unconfigured_target() {
        let (registry, connector) = registry(Step::Json(json!({})));
        let status = registry.health(Some("lab9")).await;
        assert_eq!(status.status, "error");
        assert!(status.targets["lab9"]
            .error
            .as_deref()
            .unwrap()
            .contains("not found in configuration"));
        assert_eq!(connector.connects(), 0);
    }

    #[tokio::test]
    async fn test_health_unreachable_target() {
        let (registry, _) = registry(Step::Transient);
        let status = registry.health(Some("lab1")).await;
        assert_eq!(status.status, "error");
        assert!(status.targets["lab1"]
            .error
            .as_deref()
            .unwrap()
            .contains("connection reset"));
    }

    #[tokio::test]
    async fn test_summaries_and_shutdown() {
        let (registry, _) = registry(Step::Json(json!({})));
        let summaries = registry.target_summaries();
        assert!(summaries["lab1"].available);
        assert!(!summaries["future"].available);
        assert_eq!(summaries["lab1"].host, "lab1");

        registry.resolve_target("lab1").await.unwrap();
        assert_eq!(registry.active_clients().await, 1);
        registry.shutdown().await;
        assert_eq!(registry.active_clients().await, 0);
    }
}

//! HTTP transport to a traffic generator controller

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::config::{ConnectionConfig, TargetConfig};
use crate::error::{Error, Result};

/// HTTP method of an OTG endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
        }
    }
}

/// A single request against an OTG REST endpoint
#[derive(Debug, Clone)]
pub struct OtgRequest {
    pub method: HttpMethod,
    pub path: &'static str,
    pub body: Option<Value>,
    /// Response is a binary file rather than JSON
    pub binary: bool,
}

/// Decoded body of a successful OTG response
#[derive(Debug, Clone, PartialEq)]
pub enum OtgOutput {
    Json(Value),
    Binary(Vec<u8>),
}

impl OtgOutput {
    /// JSON body; binary bodies yield `Null`
    pub fn into_json(self) -> Value {
        match self {
            OtgOutput::Json(v) => v,
            OtgOutput::Binary(_) => Value::Null,
        }
    }

    /// Raw bytes; JSON bodies are re-serialized
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            OtgOutput::Binary(b) => b,
            OtgOutput::Json(v) => v.to_string().into_bytes(),
        }
    }
}

/// A session with one traffic generator controller
#[async_trait]
pub trait OtgTransport: Send + Sync {
    /// Send one request; no retries happen at this layer
    async fn send(&self, request: &OtgRequest) -> Result<OtgOutput>;
}

/// Opens transports for targets
pub trait Connector: Send + Sync {
    fn connect(&self, target: &TargetConfig) -> Result<Arc<dyn OtgTransport>>;
}

/// Statuses that indicate a controller that is busy or restarting
fn is_transient_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

/// Pull the `errors` list out of an OTG error body, falling back to raw text
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("errors").and_then(|e| e.as_array()).map(|errors| {
                errors
                    .iter()
                    .map(|e| e.as_str().map(str::to_string).unwrap_or_else(|| e.to_string()))
                    .collect::<Vec<_>>()
                    .join("; ")
            })
        })
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.trim().to_string())
}

/// Map a failed send to a retryable or terminal error
fn classify_send_error(url: &str, err: reqwest::Error) -> Error {
    if err.is_connect() || err.is_timeout() {
        Error::TransientConnection(format!("{}: {}", url, err))
    } else {
        Error::Http(err)
    }
}

/// reqwest-backed transport
pub struct HttpTransport {
    client: Client,
    base_url: url::Url,
}

impl HttpTransport {
    /// Create a transport for a controller base URL
    pub fn new(base_url: url::Url, connection: &ConnectionConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(connection.timeout)
            .danger_accept_invalid_certs(connection.accept_invalid_certs)
            .build()?;
        Ok(HttpTransport { client, base_url })
    }

    /// Controller base URL
    pub fn base_url(&self) -> &url::Url {
        &self.base_url
    }
}

#[async_trait]
impl OtgTransport for HttpTransport {
    async fn send(&self, request: &OtgRequest) -> Result<OtgOutput> {
        let url = self
            .base_url
            .join(request.path)
            .map_err(|e| Error::Internal(format!("Invalid OTG path {}: {}", request.path, e)))?;

        debug!(method = %request.method, %url, "Sending OTG request");

        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(url.clone()),
            HttpMethod::Post => self.client.post(url.clone()),
        };
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| classify_send_error(url.as_str(), e))?;

        let status = response.status();
        debug!(%url, status = status.as_u16(), "OTG response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if is_transient_status(status) {
                return Err(Error::TransientConnection(format!(
                    "{} returned {}",
                    url, status
                )));
            }
            return Err(Error::Otg {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| classify_send_error(url.as_str(), e))?;

        if request.binary {
            return Ok(OtgOutput::Binary(bytes.to_vec()));
        }
        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(OtgOutput::Json(Value::Object(Default::default())));
        }
        Ok(OtgOutput::Json(serde_json::from_slice(&bytes)?))
    }
}

/// Connector that opens one reqwest session per target
#[derive(Debug, Clone, Default)]
pub struct HttpConnector {
    connection: ConnectionConfig,
}

impl HttpConnector {
    pub fn new(connection: ConnectionConfig) -> Self {
        HttpConnector { connection }
    }
}

impl Connector for HttpConnector {
    fn connect(&self, target: &TargetConfig) -> Result<Arc<dyn OtgTransport>> {
        let base_url = target.base_url(&self.connection.scheme)?;
        debug!(otg_target = %target.name, %base_url, "Opening OTG session");
        Ok(Arc::new(HttpTransport::new(base_url, &self.connection)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport(server: &MockServer) -> HttpTransport {
        let url = url::Url::parse(&server.uri()).unwrap();
        HttpTransport::new(url, &ConnectionConfig::default()).unwrap()
    }

    fn get(path: &'static str) -> OtgRequest {
        OtgRequest {
            method: HttpMethod::Get,
            path,
            body: None,
            binary: false,
        }
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(r#"{"code": 400, "kind": "validation", "errors": ["bad port", "bad flow"]}"#),
            "bad port; bad flow"
        );
        assert_eq!(error_message("plain failure\n"), "plain failure");
        assert_eq!(error_message(r#"{"errors": []}"#), r#"{"errors": []}"#);
    }

    #[test]
    fn test_transient_statuses() {
        assert!(is_transient_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(is_transient_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_transient_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(!is_transient_status(StatusCode::BAD_REQUEST));
    }

    #[tokio::test]
    async fn test_get_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/capabilities/version"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"api_spec_version": "1.30.0"})))
            .mount(&server)
            .await;

        let out = transport(&server).send(&get("/capabilities/version")).await.unwrap();
        assert_eq!(out.into_json()["api_spec_version"], "1.30.0");
    }

    #[tokio::test]
    async fn test_post_body_and_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/control/state"))
            .and(body_json(json!({"choice": "traffic"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let request = OtgRequest {
            method: HttpMethod::Post,
            path: "/control/state",
            body: Some(json!({"choice": "traffic"})),
            binary: false,
        };
        let out = transport(&server).send(&request).await.unwrap();
        assert_eq!(out, OtgOutput::Json(json!({})));
    }

    #[tokio::test]
    async fn test_status_classification() {
        let server = MockServer::start().await;
        Mock::given(path("/busy"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        Mock::given(path("/bad"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"code": 400, "errors": ["invalid flow"]})),
            )
            .mount(&server)
            .await;

        let t = transport(&server);
        let err = t.send(&get("/busy")).await.unwrap_err();
        assert!(err.is_retryable());

        match t.send(&get("/bad")).await.unwrap_err() {
            Error::Otg { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "invalid flow");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_binary_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/monitor/capture"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xd4, 0xc3, 0xb2, 0xa1]))
            .mount(&server)
            .await;

        let request = OtgRequest {
            method: HttpMethod::Post,
            path: "/monitor/capture",
            body: Some(json!({"port_name": "p1"})),
            binary: true,
        };
        let out = transport(&server).send(&request).await.unwrap();
        assert_eq!(out.into_bytes(), vec![0xd4, 0xc3, 0xb2, 0xa1]);
    }

    #[tokio::test]
    async fn test_connection_refused_is_transient() {
        let url = url::Url::parse("http://127.0.0.1:9").unwrap();
        let t = HttpTransport::new(url, &ConnectionConfig::default()).unwrap();
        let err = t.send(&get("/config")).await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_connector_builds_url() {
        let connector = HttpConnector::new(ConnectionConfig::default());
        let target = TargetConfig::new("lab1:8443", "1.30.0", 443);
        assert!(connector.connect(&target).is_ok());
    }
}

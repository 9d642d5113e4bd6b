//! The closed set of OTG operations a target client can perform

use serde_json::{json, Value};

use super::transport::{HttpMethod, OtgRequest};

/// One OTG REST call together with its payload
#[derive(Debug, Clone, PartialEq)]
pub enum OtgOperation {
    /// `POST /config`
    SetConfig(Value),
    /// `GET /config`
    GetConfig,
    /// `POST /control/state`
    SetControlState(Value),
    /// `POST /control/action`
    SetControlAction(Value),
    /// `POST /monitor/metrics`
    GetMetrics(Value),
    /// `POST /monitor/states`
    GetStates(Value),
    /// `POST /monitor/capture`, answered with a pcap file
    GetCapture(Value),
    /// `GET /capabilities/version`
    GetVersion,
}

impl OtgOperation {
    /// Operation id as named in the OTG API
    pub fn name(&self) -> &'static str {
        match self {
            OtgOperation::SetConfig(_) => "set_config",
            OtgOperation::GetConfig => "get_config",
            OtgOperation::SetControlState(_) => "set_control_state",
            OtgOperation::SetControlAction(_) => "set_control_action",
            OtgOperation::GetMetrics(_) => "get_metrics",
            OtgOperation::GetStates(_) => "get_states",
            OtgOperation::GetCapture(_) => "get_capture",
            OtgOperation::GetVersion => "get_version",
        }
    }

    pub fn method(&self) -> HttpMethod {
        match self {
            OtgOperation::GetConfig | OtgOperation::GetVersion => HttpMethod::Get,
            _ => HttpMethod::Post,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            OtgOperation::SetConfig(_) | OtgOperation::GetConfig => "/config",
            OtgOperation::SetControlState(_) => "/control/state",
            OtgOperation::SetControlAction(_) => "/control/action",
            OtgOperation::GetMetrics(_) => "/monitor/metrics",
            OtgOperation::GetStates(_) => "/monitor/states",
            OtgOperation::GetCapture(_) => "/monitor/capture",
            OtgOperation::GetVersion => "/capabilities/version",
        }
    }

    /// Request payload, if the endpoint takes one
    pub fn body(&self) -> Option<&Value> {
        match self {
            OtgOperation::SetConfig(body)
            | OtgOperation::SetControlState(body)
            | OtgOperation::SetControlAction(body)
            | OtgOperation::GetMetrics(body)
            | OtgOperation::GetStates(body)
            | OtgOperation::GetCapture(body) => Some(body),
            OtgOperation::GetConfig | OtgOperation::GetVersion => None,
        }
    }

    /// Component schema the request payload must satisfy
    pub fn request_schema(&self) -> Option<&'static str> {
        match self {
            OtgOperation::SetConfig(_) => Some("Config"),
            OtgOperation::SetControlState(_) => Some("Control.State"),
            OtgOperation::SetControlAction(_) => Some("Control.Action"),
            OtgOperation::GetMetrics(_) => Some("Metrics.Request"),
            OtgOperation::GetStates(_) => Some("States.Request"),
            OtgOperation::GetCapture(_) => Some("Capture.Request"),
            OtgOperation::GetConfig | OtgOperation::GetVersion => None,
        }
    }

    /// Component schema a successful response is expected to match
    pub fn response_schema(&self) -> Option<&'static str> {
        match self {
            OtgOperation::SetConfig(_) | OtgOperation::SetControlState(_) => Some("Warning"),
            OtgOperation::GetConfig => Some("Config"),
            OtgOperation::SetControlAction(_) => Some("Control.ActionResponse"),
            OtgOperation::GetMetrics(_) => Some("Metrics.Response"),
            OtgOperation::GetStates(_) => Some("States.Response"),
            OtgOperation::GetVersion => Some("Version"),
            OtgOperation::GetCapture(_) => None,
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, OtgOperation::GetCapture(_))
    }

    /// Build the HTTP request for this operation
    pub fn to_request(&self) -> OtgRequest {
        OtgRequest {
            method: self.method(),
            path: self.path(),
            body: self.body().cloned(),
            binary: self.is_binary(),
        }
    }

    /// Start or stop transmission of the named flows (all flows when empty)
    pub fn flow_transmit(state: &str, flow_names: &[String]) -> Self {
        let mut transmit = json!({ "state": state });
        if !flow_names.is_empty() {
            transmit["flow_names"] = json!(flow_names);
        }
        OtgOperation::SetControlState(json!({
            "choice": "traffic",
            "traffic": {
                "choice": "flow_transmit",
                "flow_transmit": transmit
            }
        }))
    }

    /// Start or stop packet capture on the named ports (all ports when empty)
    pub fn port_capture(state: &str, port_names: &[String]) -> Self {
        let mut capture = json!({ "state": state });
        if !port_names.is_empty() {
            capture["port_names"] = json!(port_names);
        }
        OtgOperation::SetControlState(json!({
            "choice": "port",
            "port": {
                "choice": "capture",
                "capture": capture
            }
        }))
    }

    /// Metrics request for all ports
    pub fn all_port_metrics() -> Self {
        OtgOperation::GetMetrics(json!({
            "choice": "port",
            "port": { "port_names": [] }
        }))
    }

    /// Capture retrieval for one port
    pub fn capture_for(port_name: &str) -> Self {
        OtgOperation::GetCapture(json!({ "port_name": port_name }))
    }
}

impl std::fmt::Display for OtgOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} ({})", self.method(), self.path(), self.name())
    }
}

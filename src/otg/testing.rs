//! Scripted transport for unit tests

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::transport::{Connector, OtgOutput, OtgRequest, OtgTransport};
use crate::config::TargetConfig;
use crate::error::{Error, Result};

/// One scripted reply
#[derive(Debug, Clone)]
pub enum Step {
    Json(Value),
    Bytes(Vec<u8>),
    Transient,
    Status(u16, String),
    /// Replies with the value after a pause
    Delayed(Duration, Value),
    /// Never completes
    Hang,
}

/// Replies with scripted steps in order, then repeats `fallback`
pub struct ScriptedTransport {
    steps: Mutex<VecDeque<Step>>,
    fallback: Step,
    calls: AtomicUsize,
    active: AtomicUsize,
    peak: AtomicUsize,
    requests: Mutex<Vec<OtgRequest>>,
}

/// Counts a send as active until dropped, including on abort
struct ActiveSend<'a>(&'a AtomicUsize);

impl Drop for ActiveSend<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ScriptedTransport {
    pub fn new(steps: Vec<Step>, fallback: Step) -> Arc<Self> {
        Arc::new(ScriptedTransport {
            steps: Mutex::new(steps.into()),
            fallback,
            calls: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn always(step: Step) -> Arc<Self> {
        Self::new(Vec::new(), step)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of sends that were running at the same time
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<OtgRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl OtgTransport for ScriptedTransport {
    async fn send(&self, request: &OtgRequest) -> Result<OtgOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let running = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        let _active = ActiveSend(&self.active);
        self.peak.fetch_max(running, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        let step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        match step {
            Step::Json(v) => Ok(OtgOutput::Json(v)),
            Step::Bytes(b) => Ok(OtgOutput::Binary(b)),
            Step::Transient => Err(Error::TransientConnection("connection reset".into())),
            Step::Status(status, message) => Err(Error::Otg { status, message }),
            Step::Delayed(pause, v) => {
                tokio::time::sleep(pause).await;
                Ok(OtgOutput::Json(v))
            }
            Step::Hang => std::future::pending().await,
        }
    }
}

/// Hands out one shared scripted transport and counts connects
pub struct ScriptedConnector {
    pub transport: Arc<ScriptedTransport>,
    connects: AtomicUsize,
}

impl ScriptedConnector {
    pub fn new(transport: Arc<ScriptedTransport>) -> Arc<Self> {
        Arc::new(ScriptedConnector {
            transport,
            connects: AtomicUsize::new(0),
        })
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

impl Connector for ScriptedConnector {
    fn connect(&self, _target: &TargetConfig) -> Result<Arc<dyn OtgTransport>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(self.transport.clone())
    }
}

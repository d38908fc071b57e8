//! In-memory camera for tests and demos.
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::time;

use super::{CcapiClient, CcapiError, Payload};
use crate::capability::{ApiVersion, CapabilityMap, Endpoint, EndpointGroup};

/// Scripted answer of a [`LoopbackCamera`] endpoint.
#[derive(Debug, Clone)]
pub struct Reply {
    delay: Duration,
    result: Result<Payload, CcapiError>,
}

impl Reply {
    /// Answers with a JSON object; non-object values answer with an empty one.
    pub fn payload(value: Value) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Ok(value.as_object().cloned().unwrap_or_default()),
        }
    }

    pub fn error(err: CcapiError) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Err(err),
        }
    }

    /// Holds the answer back for `delay`.
    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Debug, Default)]
struct LoopbackState {
    capabilities: CapabilityMap,
    reachable: bool,
    discover_delay: Duration,
    discoveries: usize,
    queued: HashMap<String, VecDeque<Reply>>,
    standing: HashMap<String, Reply>,
    hits: HashMap<String, usize>,
}

/// Simplified in-memory camera useful for unit tests and examples.
///
/// Endpoints are registered per version and group; each answers with a
/// standing reply, or with queued one-shot replies first. Latency is
/// simulated with `tokio::time`, so paused-clock tests run instantly.
#[derive(Debug)]
pub struct LoopbackCamera {
    address: String,
    port: u16,
    state: Mutex<LoopbackState>,
}

impl LoopbackCamera {
    /// A reachable camera with an empty capability map.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            port: 8080,
            state: Mutex::new(LoopbackState {
                reachable: true,
                ..LoopbackState::default()
            }),
        }
    }

    /// A camera offering device information, movie mode (off) and polling
    /// under `ver100`, without the network-setting api.
    pub fn standard(address: impl Into<String>, model: &str) -> Self {
        let version = ApiVersion::from("ver100");
        Self::new(address)
            .with_endpoint(
                &version,
                EndpointGroup::DeviceInformation,
                Reply::payload(json!({
                    "manufacturer": "Canon Inc.",
                    "productname": model,
                    "firmwareversion": "1.0.0",
                })),
            )
            .with_endpoint(
                &version,
                EndpointGroup::MovieMode,
                Reply::payload(json!({"status": "off"})),
            )
            .with_endpoint(&version, EndpointGroup::Polling, Reply::payload(json!({})))
    }

    /// Lists the `group` endpoint under `version` and sets its standing reply.
    pub fn with_endpoint(self, version: &ApiVersion, group: EndpointGroup, reply: Reply) -> Self {
        let endpoint = self.endpoint(version, group);
        {
            let mut state = self.state.lock();
            state.capabilities.extend(version, [endpoint.clone()]);
            state.standing.insert(endpoint.path, reply);
        }
        self
    }

    /// Lists a raw endpoint entry without any reply behind it.
    pub fn with_listing(self, version: &ApiVersion, endpoint: Endpoint) -> Self {
        self.state.lock().capabilities.extend(version, [endpoint]);
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// URL the loopback uses for `group` under `version`.
    pub fn endpoint(&self, version: &ApiVersion, group: EndpointGroup) -> Endpoint {
        Endpoint::for_group(&self.address, self.port, version, group)
    }

    pub fn set_reply(&self, version: &ApiVersion, group: EndpointGroup, reply: Reply) {
        let path = self.endpoint(version, group).path;
        self.state.lock().standing.insert(path, reply);
    }

    /// Queues a one-shot reply served before the standing one.
    pub fn push_reply(&self, version: &ApiVersion, group: EndpointGroup, reply: Reply) {
        let path = self.endpoint(version, group).path;
        self.state
            .lock()
            .queued
            .entry(path)
            .or_default()
            .push_back(reply);
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.state.lock().reachable = reachable;
    }

    pub fn set_discover_delay(&self, delay: Duration) {
        self.state.lock().discover_delay = delay;
    }

    /// Number of GETs issued against `group` under `version`.
    pub fn hits(&self, version: &ApiVersion, group: EndpointGroup) -> usize {
        let path = self.endpoint(version, group).path;
        self.state.lock().hits.get(&path).copied().unwrap_or(0)
    }

    pub fn discoveries(&self) -> usize {
        self.state.lock().discoveries
    }
}

#[async_trait]
impl CcapiClient for LoopbackCamera {
    async fn discover(&self, address: &str) -> Result<CapabilityMap, CcapiError> {
        let (delay, result) = {
            let mut state = self.state.lock();
            state.discoveries += 1;
            let result = if state.reachable && address == self.address {
                Ok(state.capabilities.clone())
            } else {
                Err(CcapiError::Unreachable(format!("no route to {}", address)))
            };
            (state.discover_delay, result)
        };
        if !delay.is_zero() {
            time::sleep(delay).await;
        }
        result
    }

    async fn get(&self, endpoint: &Endpoint) -> Result<Payload, CcapiError> {
        let reply = {
            let mut state = self.state.lock();
            *state.hits.entry(endpoint.path.clone()).or_default() += 1;
            if !state.reachable {
                Reply::error(CcapiError::Unreachable(endpoint.path.clone()))
            } else if let Some(reply) = state
                .queued
                .get_mut(&endpoint.path)
                .and_then(VecDeque::pop_front)
            {
                reply
            } else {
                state.standing.get(&endpoint.path).cloned().unwrap_or_else(|| {
                    Reply::error(CcapiError::Rejected {
                        status: 404,
                        message: "Not found".into(),
                    })
                })
            }
        };
        if !reply.delay.is_zero() {
            time::sleep(reply.delay).await;
        }
        reply.result
    }
}

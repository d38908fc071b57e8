//! Boundary to the device protocol client.
//!
//! The session layer only ever talks to a camera through [`CcapiClient`]:
//! one call to discover the capability map, one call to fetch any endpoint
//! listed in it. Deadlines are applied by the caller, not the client.
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::capability::{CapabilityMap, Endpoint};

pub mod http;
pub mod loopback;

pub use http::HttpCcapiClient;
pub use loopback::{LoopbackCamera, Reply};

/// JSON object returned by an endpoint, keyed by field name.
pub type Payload = Map<String, Value>;

/// Failure classes shared by every error in the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The device could not be contacted.
    Unreachable,
    /// A deadline elapsed before the call completed.
    Timeout,
    /// The device answered, but not with what was expected.
    ProtocolMismatch,
    /// An optional API is absent; callers skip rather than fail.
    Unsupported,
}

/// Errors raised by protocol clients.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CcapiError {
    #[error("unreachable: {0}")]
    Unreachable(String),
    #[error("deadline of {0:?} elapsed")]
    Timeout(Duration),
    #[error("request rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("client fault: {0}")]
    Fault(String),
}

impl CcapiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CcapiError::Unreachable(_) | CcapiError::Fault(_) => ErrorKind::Unreachable,
            CcapiError::Timeout(_) => ErrorKind::Timeout,
            CcapiError::Rejected { .. } | CcapiError::Malformed(_) => ErrorKind::ProtocolMismatch,
        }
    }
}

/// Request/response exchange with a CCAPI device.
#[async_trait]
pub trait CcapiClient: Send + Sync {
    /// Fetches the root capability document of the device at `address`.
    async fn discover(&self, address: &str) -> Result<CapabilityMap, CcapiError>;

    /// Issues a GET against an endpoint previously listed by `discover`.
    async fn get(&self, endpoint: &Endpoint) -> Result<Payload, CcapiError>;
}

/// Reads `parent.field` as a string, tolerating a missing or non-object parent.
pub(crate) fn nested_str<'a>(payload: &'a Payload, parent: &str, field: &str) -> Option<&'a str> {
    payload
        .get(parent)
        .and_then(Value::as_object)
        .and_then(|inner| inner.get(field))
        .and_then(Value::as_str)
}

//! Session handshake with a CCAPI camera.
//!
//! The handshake runs four sequential steps against a candidate address:
//! capability probe, optional network-setting extension, device identity and
//! initial movie mode. Any step failing ends the handshake with a fixed,
//! user-facing reason; a session is only assembled once every step passed.
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::capability::{ApiVersion, CapabilityMap, Endpoint, EndpointGroup, SelectError};
use crate::client::{CcapiClient, CcapiError, ErrorKind, Payload};
use crate::config::ConnectorConfig;
use crate::deadline::with_deadline;
use crate::outcome::{attempt, Outcome};
use crate::session::{CameraMode, Session};

/// Result of [`connect`]: a fresh session or the reason it was refused.
pub type SessionResult = Result<Session, HandshakeError>;

/// Terminal handshake failures. `Display` yields the text shown to the user.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HandshakeError {
    #[error("camera couldn't be reached")]
    Unreachable(#[source] CcapiError),
    /// The camera lists network-setting sub-resources but no version offers
    /// the network-setting endpoint itself.
    #[error("network setting versions is empty")]
    NetworkSettingVersionsEmpty,
    #[error("network version is undefined")]
    NetworkVersionUndefined,
    #[error("failed to get network settings")]
    NetworkSettings(#[source] CcapiError),
    #[error("device information version is undefined")]
    DeviceInformationVersionUndefined,
    #[error("failed to get device information")]
    DeviceInformation(#[source] CcapiError),
    #[error("movie mode version is undefined")]
    MovieModeVersionUndefined,
    #[error("failed to get movie mode")]
    MovieMode(#[source] CcapiError),
}

impl HandshakeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            HandshakeError::Unreachable(err)
            | HandshakeError::NetworkSettings(err)
            | HandshakeError::DeviceInformation(err)
            | HandshakeError::MovieMode(err) => err.kind(),
            HandshakeError::NetworkSettingVersionsEmpty
            | HandshakeError::NetworkVersionUndefined
            | HandshakeError::DeviceInformationVersionUndefined
            | HandshakeError::MovieModeVersionUndefined => ErrorKind::ProtocolMismatch,
        }
    }

    /// Underlying client error, when the failure came from a device call.
    pub fn cause(&self) -> Option<&CcapiError> {
        match self {
            HandshakeError::Unreachable(err)
            | HandshakeError::NetworkSettings(err)
            | HandshakeError::DeviceInformation(err)
            | HandshakeError::MovieMode(err) => Some(err),
            _ => None,
        }
    }
}

/// Negotiates a session with the camera at `address`.
///
/// `address` must already be a valid IPv4 address. No state outside the
/// returned session is touched, so a failure leaves any existing session as
/// it was.
pub async fn connect<C>(client: &C, address: &str, config: &ConnectorConfig) -> SessionResult
where
    C: CcapiClient + ?Sized,
{
    let handshake = ClientHandshake {
        client,
        address,
        config,
    };
    match handshake.run().await {
        Ok(session) => {
            info!(
                address,
                session = %session.id(),
                model = session.device_model(),
                mode = %session.mode(),
                "camera reached"
            );
            Ok(session)
        }
        Err(err) => {
            match err.cause() {
                Some(cause) => warn!(address, reason = %err, error = %cause, "handshake failed"),
                None => warn!(address, reason = %err, "handshake failed"),
            }
            Err(err)
        }
    }
}

struct ClientHandshake<'a, C: ?Sized> {
    client: &'a C,
    address: &'a str,
    config: &'a ConnectorConfig,
}

impl<C> ClientHandshake<'_, C>
where
    C: CcapiClient + ?Sized,
{
    async fn run(self) -> SessionResult {
        debug!(address = self.address, "probing capabilities");
        let probe = attempt(with_deadline(
            self.config.probe_timeout(),
            self.client.discover(self.address),
        ))
        .await;
        let mut capabilities = match probe {
            Outcome::Succeeded(map) => map,
            Outcome::Failed(err) => return Err(HandshakeError::Unreachable(err)),
        };

        if capabilities.supports(EndpointGroup::NetworkSetting) {
            self.extend_network_settings(&mut capabilities).await?;
        } else {
            debug!(address = self.address, "network setting api not offered; skipping");
        }

        let device_model = self.device_model(&capabilities).await?;
        let mode = self.movie_mode(&capabilities).await?;

        Ok(Session::new(
            self.address.to_string(),
            capabilities,
            device_model,
            mode,
        ))
    }

    async fn fetch(&self, endpoint: &Endpoint) -> Outcome<Payload> {
        attempt(with_deadline(
            self.config.step_timeout(),
            self.client.get(endpoint),
        ))
        .await
    }

    async fn extend_network_settings(
        &self,
        capabilities: &mut CapabilityMap,
    ) -> Result<(), HandshakeError> {
        let (version, endpoint) = match capabilities.latest(EndpointGroup::NetworkSetting) {
            Ok(selected) => selected,
            Err(SelectError::Empty) => return Err(HandshakeError::NetworkSettingVersionsEmpty),
            Err(SelectError::Undefined(_)) => return Err(HandshakeError::NetworkVersionUndefined),
        };
        debug!(address = self.address, %version, "fetching network settings");
        let payload = match self.fetch(&endpoint).await {
            Outcome::Succeeded(payload) => payload,
            Outcome::Failed(err) => return Err(HandshakeError::NetworkSettings(err)),
        };
        let extra = network_endpoints(&payload, &version).map_err(HandshakeError::NetworkSettings)?;
        debug!(address = self.address, %version, added = extra.len(), "merged network endpoints");
        capabilities.extend(&version, extra);
        Ok(())
    }

    async fn device_model(&self, capabilities: &CapabilityMap) -> Result<String, HandshakeError> {
        let (version, endpoint) = capabilities
            .latest(EndpointGroup::DeviceInformation)
            .map_err(|_| HandshakeError::DeviceInformationVersionUndefined)?;
        debug!(address = self.address, %version, "fetching device information");
        let payload = match self.fetch(&endpoint).await {
            Outcome::Succeeded(payload) => payload,
            Outcome::Failed(err) => return Err(HandshakeError::DeviceInformation(err)),
        };
        match payload.get("productname").and_then(Value::as_str) {
            Some(name) => Ok(name.to_string()),
            None => Err(HandshakeError::DeviceInformation(CcapiError::Malformed(
                "productname missing".into(),
            ))),
        }
    }

    async fn movie_mode(&self, capabilities: &CapabilityMap) -> Result<CameraMode, HandshakeError> {
        let (version, endpoint) = capabilities
            .latest(EndpointGroup::MovieMode)
            .map_err(|_| HandshakeError::MovieModeVersionUndefined)?;
        debug!(address = self.address, %version, "fetching movie mode");
        match self.fetch(&endpoint).await {
            Outcome::Succeeded(payload) => Ok(initial_mode(&payload)),
            Outcome::Failed(err) => Err(HandshakeError::MovieMode(err)),
        }
    }
}

/// Endpoints listed under `version` in a network-setting response.
fn network_endpoints(payload: &Payload, version: &ApiVersion) -> Result<Vec<Endpoint>, CcapiError> {
    match payload.get(version.as_str()) {
        Some(listed) => serde_json::from_value(listed.clone())
            .map_err(|e| CcapiError::Malformed(format!("network endpoints: {}", e))),
        None => Ok(Vec::new()),
    }
}

/// Only an explicit `on` means video; anything else starts as still.
fn initial_mode(payload: &Payload) -> CameraMode {
    match payload.get("status").and_then(Value::as_str) {
        Some("on") => CameraMode::Video,
        _ => CameraMode::Still,
    }
}

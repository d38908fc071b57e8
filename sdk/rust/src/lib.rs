//! High-level Rust SDK built on top of the session layer.
use std::fmt;
use std::sync::Arc;

use ccapi::{
    CameraMode, CameraMonitor, ConfigError, ConnectorConfig, HttpCcapiClient, Session,
    SubmitError,
};
use tokio::sync::watch;

/// SDK error wraps the session layer's submit error but keeps the layering clear.
pub type SdkError = SubmitError;

/// Snapshot of what the camera card shows: model and current mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraStatus {
    pub address: String,
    pub model: String,
    pub mode: CameraMode,
}

impl CameraStatus {
    fn of(session: &Session) -> Self {
        Self {
            address: session.address().to_string(),
            model: session.device_model().to_string(),
            mode: session.mode(),
        }
    }
}

impl fmt::Display for CameraStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) [{}]", self.model, self.address, self.mode)
    }
}

/// SDK client exposes a simplified lifecycle over HTTP.
pub struct CcapiSdkClient {
    inner: CameraMonitor<HttpCcapiClient>,
}

impl CcapiSdkClient {
    pub fn new(config: ConnectorConfig) -> Result<Self, ConfigError> {
        let client = Arc::new(HttpCcapiClient::new(config.port));
        let inner = CameraMonitor::new(client, config)?;
        Ok(Self { inner })
    }

    /// Connects to the camera at `address`, replacing any current camera on success.
    pub async fn connect(&self, address: &str) -> Result<CameraStatus, SdkError> {
        let session = self.inner.submit(address).await?;
        Ok(CameraStatus::of(&session))
    }

    pub fn status(&self) -> Option<CameraStatus> {
        self.inner.session().map(|session| CameraStatus::of(&session))
    }

    /// Mode updates of the current camera, if one is connected.
    pub fn watch_mode(&self) -> Option<watch::Receiver<CameraMode>> {
        self.inner.session().map(|session| session.subscribe())
    }

    pub fn disconnect(&self) {
        self.inner.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_renders_model_and_mode() {
        let status = CameraStatus {
            address: "192.168.1.20".into(),
            model: "Canon EOS R6".into(),
            mode: CameraMode::Video,
        };
        assert_eq!(status.to_string(), "Canon EOS R6 (192.168.1.20) [video]");
    }

    #[test]
    fn fresh_client_has_no_camera() {
        let client = CcapiSdkClient::new(ConnectorConfig::default()).unwrap();
        assert!(client.status().is_none());
        assert!(client.watch_mode().is_none());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = ConnectorConfig {
            port: 0,
            ..ConnectorConfig::default()
        };
        assert_eq!(
            CcapiSdkClient::new(config).err(),
            Some(ConfigError::ZeroPort)
        );
    }

    #[tokio::test]
    async fn malformed_address_is_refused_locally() {
        let client = CcapiSdkClient::new(ConnectorConfig::default()).unwrap();
        assert!(matches!(
            client.connect("camera.local").await,
            Err(SubmitError::InvalidAddress(_))
        ));
    }
}

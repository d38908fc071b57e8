//! Established camera sessions and their live shooting mode.
use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use uuid::Uuid;

use crate::capability::CapabilityMap;

/// Shooting mode reported by the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraMode {
    #[default]
    Unknown,
    Still,
    Video,
}

impl CameraMode {
    /// Maps a movie-mode status field; values other than `on`/`off` carry no
    /// information and yield `None`.
    pub fn from_status(status: &str) -> Option<Self> {
        match status {
            "on" => Some(CameraMode::Video),
            "off" => Some(CameraMode::Still),
            _ => None,
        }
    }
}

impl fmt::Display for CameraMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CameraMode::Unknown => "unknown",
            CameraMode::Still => "still",
            CameraMode::Video => "video",
        };
        f.write_str(label)
    }
}

/// Live record of a reachable camera.
///
/// Everything except the mode is fixed when the handshake builds the session.
/// The mode has a single writer path, [`Session::apply_status`], and can be
/// observed through [`Session::subscribe`].
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    address: String,
    capabilities: CapabilityMap,
    device_model: String,
    mode: watch::Sender<CameraMode>,
}

impl Session {
    pub(crate) fn new(
        address: String,
        capabilities: CapabilityMap,
        device_model: String,
        mode: CameraMode,
    ) -> Self {
        let (mode, _) = watch::channel(mode);
        Self {
            id: Uuid::new_v4(),
            address,
            capabilities,
            device_model,
            mode,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn capabilities(&self) -> &CapabilityMap {
        &self.capabilities
    }

    pub fn device_model(&self) -> &str {
        &self.device_model
    }

    pub fn mode(&self) -> CameraMode {
        *self.mode.borrow()
    }

    /// Receiver that wakes whenever the mode changes.
    pub fn subscribe(&self) -> watch::Receiver<CameraMode> {
        self.mode.subscribe()
    }

    /// Applies a movie-mode status read from the device.
    ///
    /// Returns the new mode when it changed. Unrecognised statuses leave the
    /// mode as it was.
    pub(crate) fn apply_status(&self, status: &str) -> Option<CameraMode> {
        let next = CameraMode::from_status(status)?;
        let changed = self.mode.send_if_modified(|mode| {
            if *mode == next {
                return false;
            }
            *mode = next;
            true
        });
        changed.then_some(next)
    }

    /// Compares the handshake-derived fields, ignoring id and live mode.
    pub fn same_device(&self, other: &Session) -> bool {
        self.address == other.address
            && self.capabilities == other.capabilities
            && self.device_model == other.device_model
    }
}

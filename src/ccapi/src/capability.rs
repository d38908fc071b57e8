//! Capability map discovered from the device's root CCAPI document.
//!
//! The root document lists, per API version, every endpoint the camera
//! serves. Endpoint groups (device information, movie mode, polling, network
//! settings) are located by path suffix, and callers always use the most
//! recent version that lists a group. The device lists versions oldest
//! first, so that is the last one in listing order.
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque API revision identifier such as `ver100`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiVersion(String);

impl ApiVersion {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ApiVersion {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// One endpoint entry of the root document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub path: String,
    #[serde(default)]
    pub get: bool,
    #[serde(default)]
    pub put: bool,
    #[serde(default)]
    pub post: bool,
    #[serde(default)]
    pub delete: bool,
}

impl Endpoint {
    /// GET-only endpoint at an absolute path.
    pub fn readable(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            get: true,
            put: false,
            post: false,
            delete: false,
        }
    }

    /// Builds the canonical URL of `group` under `version` for a device.
    pub fn for_group(address: &str, port: u16, version: &ApiVersion, group: EndpointGroup) -> Self {
        Self::readable(format!(
            "http://{address}:{port}/ccapi/{version}/{}",
            group.path()
        ))
    }

    /// Whether this entry is the `group` endpoint of `version`.
    pub fn belongs_to(&self, version: &ApiVersion, group: EndpointGroup) -> bool {
        let path = self.path.split('?').next().unwrap_or_default();
        let path = path.trim_end_matches('/');
        path.ends_with(&format!("/{}/{}", version, group.path()))
    }

    /// Whether this entry is the `group` endpoint of `version` or one of its
    /// sub-resources.
    pub fn within(&self, version: &ApiVersion, group: EndpointGroup) -> bool {
        let path = self.path.split('?').next().unwrap_or_default();
        let path = path.trim_end_matches('/');
        let prefix = format!("/{}/{}", version, group.path());
        match path.find(&prefix) {
            Some(at) => {
                let rest = &path[at + prefix.len()..];
                rest.is_empty() || rest.starts_with('/')
            }
            None => false,
        }
    }
}

/// Endpoint families the session layer relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointGroup {
    /// Optional sub-API that lists additional network endpoints.
    NetworkSetting,
    DeviceInformation,
    MovieMode,
    /// Event polling endpoint used for live status.
    Polling,
}

impl EndpointGroup {
    pub fn path(&self) -> &'static str {
        match self {
            EndpointGroup::NetworkSetting => "functions/networksetting",
            EndpointGroup::DeviceInformation => "deviceinformation",
            EndpointGroup::MovieMode => "shooting/control/moviemode",
            EndpointGroup::Polling => "event/polling",
        }
    }
}

impl fmt::Display for EndpointGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Why no endpoint could be selected for a group.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SelectError {
    #[error("no version lists this endpoint")]
    Empty,
    #[error("version {0} lists this endpoint but it cannot be read")]
    Undefined(ApiVersion),
}

/// Per-version listing of supported endpoints, in the order the device
/// listed the versions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilityMap(IndexMap<ApiVersion, Vec<Endpoint>>);

impl CapabilityMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, version: ApiVersion, endpoints: Vec<Endpoint>) {
        self.0.insert(version, endpoints);
    }

    /// Appends endpoints to a version's list, creating the list if needed.
    /// A version already listed keeps its position.
    pub fn extend(&mut self, version: &ApiVersion, endpoints: impl IntoIterator<Item = Endpoint>) {
        self.0.entry(version.clone()).or_default().extend(endpoints);
    }

    pub fn endpoints(&self, version: &ApiVersion) -> &[Endpoint] {
        self.0.get(version).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ApiVersion, &[Endpoint])> {
        self.0.iter().map(|(v, e)| (v, e.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Versions listing the `group` endpoint itself, in listing order.
    pub fn versions(&self, group: EndpointGroup) -> Vec<ApiVersion> {
        self.0
            .iter()
            .filter(|(version, endpoints)| endpoints.iter().any(|e| e.belongs_to(version, group)))
            .map(|(version, _)| version.clone())
            .collect()
    }

    /// Whether any version lists the group or one of its sub-resources.
    pub fn supports(&self, group: EndpointGroup) -> bool {
        self.0
            .iter()
            .any(|(version, endpoints)| endpoints.iter().any(|e| e.within(version, group)))
    }

    /// Selects the readable `group` endpoint of the last listed version.
    pub fn latest(&self, group: EndpointGroup) -> Result<(ApiVersion, Endpoint), SelectError> {
        let version = self.versions(group).pop().ok_or(SelectError::Empty)?;
        let endpoint = self
            .endpoints(&version)
            .iter()
            .find(|e| e.get && e.belongs_to(&version, group))
            .cloned()
            .ok_or_else(|| SelectError::Undefined(version.clone()))?;
        Ok((version, endpoint))
    }
}

impl FromIterator<(ApiVersion, Vec<Endpoint>)> for CapabilityMap {
    fn from_iter<I: IntoIterator<Item = (ApiVersion, Vec<Endpoint>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

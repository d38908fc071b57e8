//! Canon Camera Control API (CCAPI) session layer.
//!
//! Implements the session handshake (capability discovery, optional network
//! setting extension, device identity, initial shooting mode) and the periodic
//! polling loop that keeps the camera's still/video mode current. All device
//! calls are bounded by a deadline and reported as explicit outcomes.

pub mod address;
pub mod capability;
pub mod client;
pub mod config;
pub mod deadline;
pub mod handshake;
pub mod monitor;
pub mod outcome;
pub mod poll;
pub mod session;

pub use address::is_valid_address;
pub use capability::{ApiVersion, CapabilityMap, Endpoint, EndpointGroup, SelectError};
pub use client::{
    CcapiClient, CcapiError, ErrorKind, HttpCcapiClient, LoopbackCamera, Payload, Reply,
};
pub use config::{ConfigError, ConnectorConfig};
pub use deadline::with_deadline;
pub use handshake::{connect, HandshakeError, SessionResult};
pub use monitor::{CameraMonitor, MonitorState, SubmitError};
pub use outcome::{attempt, Outcome};
pub use poll::{start_polling, PollHandle};
pub use session::{CameraMode, Session};

//! Owner of the current camera session.
//!
//! [`CameraMonitor`] is what a front end drives: it validates the address the
//! user typed, runs the handshake, and swaps the polled session in one step.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info};

use crate::address::is_valid_address;
use crate::client::{CcapiClient, ErrorKind};
use crate::config::{ConfigError, ConnectorConfig};
use crate::handshake::{connect, HandshakeError};
use crate::poll::{start_polling, PollHandle};
use crate::session::{CameraMode, Session};

/// Errors returned by [`CameraMonitor::submit`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SubmitError {
    /// The address is not a dotted-quad IPv4 address; no request was made.
    #[error("invalid camera address: {0:?}")]
    InvalidAddress(String),
    /// Another submission is still negotiating.
    #[error("a connection attempt is already in progress")]
    Busy,
    /// The handshake refused the camera; the reason is user-facing.
    #[error(transparent)]
    Handshake(#[from] HandshakeError),
}

impl SubmitError {
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            SubmitError::Handshake(err) => Some(err.kind()),
            SubmitError::InvalidAddress(_) | SubmitError::Busy => None,
        }
    }
}

/// Whether a session is being polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Polling,
}

#[derive(Debug)]
struct ActiveSession {
    session: Arc<Session>,
    poller: PollHandle,
}

/// Owns the current camera session and its polling loop.
///
/// # Guarantees
/// * At most one session exists; a successful submit replaces it whole and
///   cancels the previous polling loop.
/// * A failed submit leaves the current session and its loop untouched.
/// * Only one submit negotiates at a time; overlapping calls get `Busy`.
#[derive(Debug)]
pub struct CameraMonitor<C> {
    client: Arc<C>,
    config: ConnectorConfig,
    active: Mutex<Option<ActiveSession>>,
    connecting: AtomicBool,
}

impl<C> CameraMonitor<C>
where
    C: CcapiClient + 'static,
{
    pub fn new(client: Arc<C>, config: ConnectorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            client,
            config,
            active: Mutex::new(None),
            connecting: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    /// Validates `address`, runs the handshake and, on success, publishes the
    /// new session and starts polling it.
    ///
    /// # Errors
    /// `InvalidAddress` and `Busy` are returned before any network call;
    /// `Handshake` carries the reason the camera was refused.
    ///
    /// A [`clear`](Self::clear) issued while the handshake is still running
    /// does not abort it: once it succeeds, the new session is published and
    /// polled anyway. Call `clear` again after `submit` returns to stay idle.
    pub async fn submit(&self, address: &str) -> Result<Arc<Session>, SubmitError> {
        if !is_valid_address(address) {
            return Err(SubmitError::InvalidAddress(address.to_string()));
        }
        let _guard = ConnectingGuard::acquire(&self.connecting).ok_or(SubmitError::Busy)?;

        let session = Arc::new(connect(self.client.as_ref(), address, &self.config).await?);
        let poller = start_polling(self.client.clone(), session.clone(), &self.config);
        let previous = self.active.lock().replace(ActiveSession {
            session: session.clone(),
            poller,
        });
        if let Some(previous) = previous {
            previous.poller.cancel();
            debug!(
                previous = %previous.session.id(),
                current = %session.id(),
                "session superseded"
            );
        }
        Ok(session)
    }

    /// Drops the current session and stops its polling loop.
    pub fn clear(&self) {
        let previous = self.active.lock().take();
        if let Some(previous) = previous {
            previous.poller.cancel();
            info!(session = %previous.session.id(), address = previous.session.address(), "session cleared");
        }
    }

    pub fn session(&self) -> Option<Arc<Session>> {
        self.active.lock().as_ref().map(|active| active.session.clone())
    }

    pub fn mode(&self) -> Option<CameraMode> {
        self.active.lock().as_ref().map(|active| active.session.mode())
    }

    pub fn state(&self) -> MonitorState {
        match self.active.lock().as_ref() {
            Some(active) if !active.poller.is_cancelled() => MonitorState::Polling,
            _ => MonitorState::Idle,
        }
    }

    pub fn is_connecting(&self) -> bool {
        self.connecting.load(Ordering::SeqCst)
    }
}

struct ConnectingGuard<'a>(&'a AtomicBool);

impl<'a> ConnectingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for ConnectingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

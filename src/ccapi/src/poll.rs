//! Periodic movie-mode polling for an established session.
//!
//! Every tick is dispatched as its own task, so a slow device never delays
//! the schedule. Two ticks may therefore be in flight at once when latency
//! approaches the period; whichever answers last sets the mode. Failed ticks
//! are dropped without a trace beyond a debug log.
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use crate::capability::{EndpointGroup, SelectError};
use crate::client::{nested_str, CcapiClient};
use crate::config::ConnectorConfig;
use crate::deadline::with_deadline;
use crate::outcome::{attempt, Outcome};
use crate::session::Session;

/// Handle to a running polling loop.
///
/// Cancelling (or dropping) the handle stops new ticks. Ticks already
/// dispatched are left to finish and may still update the mode.
#[derive(Debug)]
pub struct PollHandle {
    session: Uuid,
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    pub fn session_id(&self) -> Uuid {
        self.session
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cancels the loop and waits until it has stopped scheduling ticks.
    pub async fn shutdown(&mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Starts polling `session` every `poll_interval`; the first tick fires one
/// full period after the call. Must be called from within a tokio runtime.
pub fn start_polling<C>(client: Arc<C>, session: Arc<Session>, config: &ConnectorConfig) -> PollHandle
where
    C: CcapiClient + 'static,
{
    let token = CancellationToken::new();
    let id = session.id();
    let task = tokio::spawn(run(
        client,
        session,
        config.poll_interval(),
        config.poll_timeout(),
        token.clone(),
    ));
    PollHandle {
        session: id,
        token,
        task: Some(task),
    }
}

async fn run<C>(
    client: Arc<C>,
    session: Arc<Session>,
    period: Duration,
    limit: Duration,
    token: CancellationToken,
) where
    C: CcapiClient + 'static,
{
    debug!(session = %session.id(), ?period, "polling started");
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                let client = client.clone();
                let session = session.clone();
                tokio::spawn(async move { poll_once(client.as_ref(), &session, limit).await });
            }
        }
    }
    debug!(session = %session.id(), "polling stopped");
}

/// One tick: read the polling endpoint and fold any movie-mode status into
/// the session.
pub(crate) async fn poll_once<C>(client: &C, session: &Session, limit: Duration)
where
    C: CcapiClient + ?Sized,
{
    let endpoint = match session.capabilities().latest(EndpointGroup::Polling) {
        Ok((_, endpoint)) => endpoint,
        Err(SelectError::Empty) => {
            debug!(session = %session.id(), "polling versions is empty");
            return;
        }
        Err(SelectError::Undefined(version)) => {
            debug!(session = %session.id(), %version, "polling version is undefined");
            return;
        }
    };
    match attempt(with_deadline(limit, client.get(&endpoint))).await {
        Outcome::Succeeded(payload) => {
            let Some(status) = nested_str(&payload, "moviemode", "status") else {
                return;
            };
            if let Some(mode) = session.apply_status(status) {
                info!(session = %session.id(), address = session.address(), %mode, "camera mode changed");
            }
        }
        Outcome::Failed(err) => {
            debug!(session = %session.id(), error = %err, "poll tick dropped");
        }
    }
}

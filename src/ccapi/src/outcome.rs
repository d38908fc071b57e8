//! Explicit two-variant results for device calls.
//!
//! The handshake and the polling loop never propagate client failures with
//! `?`; they run each call through [`attempt`] and branch on the returned
//! [`Outcome`]. Panics raised while driving the call are captured as well, so
//! a misbehaving client cannot take a session down with it.
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use crate::client::CcapiError;

/// Result of an attempted device call.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Outcome<T> {
    Succeeded(T),
    Failed(CcapiError),
}

impl<T> Outcome<T> {
    pub fn succeeded(&self) -> bool {
        matches!(self, Outcome::Succeeded(_))
    }

    pub fn into_result(self) -> Result<T, CcapiError> {
        match self {
            Outcome::Succeeded(value) => Ok(value),
            Outcome::Failed(err) => Err(err),
        }
    }
}

impl<T> From<Result<T, CcapiError>> for Outcome<T> {
    fn from(res: Result<T, CcapiError>) -> Self {
        match res {
            Ok(value) => Outcome::Succeeded(value),
            Err(err) => Outcome::Failed(err),
        }
    }
}

/// Drives `operation` to completion and reports how it ended.
pub async fn attempt<F, T>(operation: F) -> Outcome<T>
where
    F: Future<Output = Result<T, CcapiError>>,
{
    match AssertUnwindSafe(operation).catch_unwind().await {
        Ok(res) => res.into(),
        Err(panic) => Outcome::Failed(CcapiError::Fault(panic_message(panic.as_ref()))),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "operation panicked".to_string()
    }
}

//! # Service Errors
//!
//! This module defines the error types used throughout the service. Failures captured on
//! the worker thread ([`Failure`]) are kept apart from per-request outcomes
//! ([`RequestError`]) so that a caller never sees a failure raised by someone else's
//! operation as its own error.

use crate::health::Health;

/// Boxed error produced by a [`ResourceFactory`](crate::ResourceFactory).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The failure that moved a service into [`Health::Failed`].
///
/// Captured on the worker thread and exposed through
/// [`Service::last_failure`](crate::Service::last_failure).
#[derive(Debug, thiserror::Error)]
pub enum Failure {
    #[error("Resource creation failed: {0}")]
    Create(#[source] BoxError),
    #[error("Resource creation panicked: {0}")]
    CreatePanicked(String),
    #[error("Worker start hook panicked: {0}")]
    HookPanicked(String),
    #[error("Request {id} panicked: {message}")]
    OperationPanicked { id: u64, message: String },
}

/// Why a single request produced no result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    /// The worker did not accept the request within the timeout. Nothing was executed.
    #[error("Service busy")]
    Busy,
    /// The request was accepted but no response arrived within the timeout.
    /// The operation may still run to completion on the worker.
    #[error("Service timed out waiting for response")]
    Timeout,
    /// The service is permanently unusable.
    #[error("Service failed")]
    Failed,
    /// The wait was cut short by worker termination.
    #[error("Service terminated while waiting")]
    Interrupted,
}

impl RequestError {
    /// Whether resubmitting the same request is safe.
    ///
    /// Only `Busy` guarantees that nothing ran.
    pub fn is_retryable(self) -> bool {
        matches!(self, RequestError::Busy)
    }
}

/// Errors returned by [`Service::start`](crate::Service::start).
#[derive(Debug, thiserror::Error)]
pub enum StartError {
    #[error("Service already started")]
    AlreadyStarted,
    #[error("Service has been shut down")]
    ShutDown,
    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// A health write rejected by the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Invalid health transition {from} -> {to}")]
pub struct InvalidTransition {
    pub from: Health,
    pub to: Health,
}

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[derive(Debug, thiserror::Error)]
    #[error("no device")]
    struct NoDevice;

    #[test]
    fn test_create_failure_keeps_source() {
        let failure = Failure::Create(Box::new(NoDevice));
        assert_eq!(failure.to_string(), "Resource creation failed: no device");
        let source = failure.source().expect("source");
        assert!(source.downcast_ref::<NoDevice>().is_some());
    }

    #[test]
    fn test_only_busy_is_retryable() {
        assert!(RequestError::Busy.is_retryable());
        assert!(!RequestError::Timeout.is_retryable());
        assert!(!RequestError::Failed.is_retryable());
        assert!(!RequestError::Interrupted.is_retryable());
    }

    #[test]
    fn test_panic_message_from_payloads() {
        let payload = std::panic::catch_unwind(|| panic!("boom")).unwrap_err();
        assert_eq!(panic_message(&*payload), "boom");

        let payload = std::panic::catch_unwind(|| panic!("code {}", 7)).unwrap_err();
        assert_eq!(panic_message(&*payload), "code 7");

        let payload = std::panic::catch_unwind(|| std::panic::panic_any(42u8)).unwrap_err();
        assert_eq!(panic_message(&*payload), "non-string panic payload");
    }
}

//! # Async Adapter
//!
//! [`AsyncService`] lets async code submit requests without blocking a runtime worker:
//! each request runs on Tokio's blocking pool and the caller awaits the outcome.

use crate::{RequestError, ResourceFactory, Service};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{self, JoinError};

/// A cloneable async handle to a shared [`Service`].
pub struct AsyncService<F: ResourceFactory> {
    inner: Arc<Service<F>>,
}

impl<F: ResourceFactory> Clone for AsyncService<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F: ResourceFactory> AsyncService<F> {
    pub fn new(service: Arc<Service<F>>) -> Self {
        Self { inner: service }
    }

    pub fn service(&self) -> &Arc<Service<F>> {
        &self.inner
    }

    pub async fn query<T, Q>(&self, query: Q) -> Result<T, RequestError>
    where
        Q: FnOnce(&mut F::Resource) -> T + Send + 'static,
        T: Send + 'static,
    {
        let service = Arc::clone(&self.inner);
        flatten(task::spawn_blocking(move || service.try_query(query)).await)
    }

    pub async fn query_with_timeout<T, Q>(
        &self,
        query: Q,
        timeout: Duration,
    ) -> Result<T, RequestError>
    where
        Q: FnOnce(&mut F::Resource) -> T + Send + 'static,
        T: Send + 'static,
    {
        let service = Arc::clone(&self.inner);
        flatten(task::spawn_blocking(move || service.try_query_with_timeout(query, timeout)).await)
    }

    pub async fn command<C>(&self, command: C) -> Result<(), RequestError>
    where
        C: FnOnce(&mut F::Resource) + Send + 'static,
    {
        let service = Arc::clone(&self.inner);
        flatten(task::spawn_blocking(move || service.try_command(command)).await)
    }
}

/// Re-raises panics from the blocking task; a cancelled task counts as interrupted.
fn flatten<T>(joined: Result<Result<T, RequestError>, JoinError>) -> Result<T, RequestError> {
    match joined {
        Ok(outcome) => outcome,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(_) => Err(RequestError::Interrupted),
    }
}

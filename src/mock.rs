//! # Mock Factory & Testing Guide
//!
//! [`MockFactory`] is a scripted [`ResourceFactory`] for tests. It records every lifecycle
//! call together with the thread it ran on, and can be told to fail or panic on creation.
//!
//! ## Testing Strategies
//!
//! | Goal | Tool |
//! |------|------|
//! | Resource is only touched on the worker thread | [`Journal::threads`] |
//! | Teardown runs after a failure | [`Journal::events`] after `Service::join` |
//! | Creation failure handling | [`MockFactory::fail_with`], [`MockFactory::panic_with`] |
//! | Thread setup failure | [`MockFactory::panic_on_start`] |
//!
//! ```rust
//! use sta_actor::mock::{LifecycleEvent, MockFactory};
//! use sta_actor::{Health, Service};
//!
//! let factory = MockFactory::new(|| 0u32).fail_with("no device");
//! let journal = factory.journal();
//! let service = Service::new(factory);
//! service.start().unwrap();
//! service.join();
//!
//! assert_eq!(service.health(), Health::Failed);
//! assert_eq!(
//!     journal.events(),
//!     vec![LifecycleEvent::WorkerStart, LifecycleEvent::Create, LifecycleEvent::WorkerStop]
//! );
//! ```

use crate::factory::ResourceFactory;
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, ThreadId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    WorkerStart,
    Create,
    Destroy,
    WorkerStop,
}

/// Error returned by a [`MockFactory`] scripted to fail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Mock resource creation failed: {0}")]
pub struct MockCreateError(pub String);

enum Script {
    Succeed,
    Fail(String),
    Panic(String),
}

/// Shared record of the lifecycle calls made on a [`MockFactory`].
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<(LifecycleEvent, ThreadId)>>>,
}

impl Journal {
    fn record(&self, event: LifecycleEvent) {
        self.entries.lock().push((event, thread::current().id()));
    }

    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.entries.lock().iter().map(|(event, _)| *event).collect()
    }

    /// Threads the calls ran on, in call order.
    pub fn threads(&self) -> Vec<ThreadId> {
        self.entries.lock().iter().map(|(_, thread)| *thread).collect()
    }
}

/// A [`ResourceFactory`] whose behavior is set up by the test.
pub struct MockFactory<R> {
    make: Box<dyn FnMut() -> R + Send>,
    script: Script,
    start_panic: Option<String>,
    journal: Journal,
}

impl<R: 'static> MockFactory<R> {
    /// Creates a factory that builds resources with `make`.
    pub fn new(make: impl FnMut() -> R + Send + 'static) -> Self {
        Self {
            make: Box::new(make),
            script: Script::Succeed,
            start_panic: None,
            journal: Journal::default(),
        }
    }

    /// Makes `create` return [`MockCreateError`].
    pub fn fail_with(mut self, message: impl Into<String>) -> Self {
        self.script = Script::Fail(message.into());
        self
    }

    /// Makes `create` panic.
    pub fn panic_with(mut self, message: impl Into<String>) -> Self {
        self.script = Script::Panic(message.into());
        self
    }

    /// Makes `on_worker_start` panic, so `create` is never reached.
    pub fn panic_on_start(mut self, message: impl Into<String>) -> Self {
        self.start_panic = Some(message.into());
        self
    }

    pub fn journal(&self) -> Journal {
        self.journal.clone()
    }
}

impl<R: 'static> ResourceFactory for MockFactory<R> {
    type Resource = R;
    type Error = MockCreateError;

    fn on_worker_start(&mut self) {
        self.journal.record(LifecycleEvent::WorkerStart);
        if let Some(message) = &self.start_panic {
            panic!("{message}");
        }
    }

    fn create(&mut self) -> Result<R, MockCreateError> {
        self.journal.record(LifecycleEvent::Create);
        match &self.script {
            Script::Succeed => Ok((self.make)()),
            Script::Fail(message) => Err(MockCreateError(message.clone())),
            Script::Panic(message) => panic!("{message}"),
        }
    }

    fn destroy(&mut self, resource: R) {
        self.journal.record(LifecycleEvent::Destroy);
        drop(resource);
    }

    fn on_worker_stop(&mut self) {
        self.journal.record(LifecycleEvent::WorkerStop);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_journal_records_calls_in_order() {
        let mut factory = MockFactory::new(|| 1u8);
        let journal = factory.journal();

        factory.on_worker_start();
        let resource = factory.create().unwrap();
        factory.destroy(resource);
        factory.on_worker_stop();

        assert_eq!(
            journal.events(),
            vec![
                LifecycleEvent::WorkerStart,
                LifecycleEvent::Create,
                LifecycleEvent::Destroy,
                LifecycleEvent::WorkerStop,
            ]
        );
        let here = thread::current().id();
        assert!(journal.threads().iter().all(|t| *t == here));
    }

    #[test]
    fn test_scripted_failure() {
        let mut factory = MockFactory::new(|| 1u8).fail_with("absent");
        assert_eq!(factory.create(), Err(MockCreateError("absent".into())));
    }

    #[test]
    #[should_panic(expected = "exploded")]
    fn test_scripted_panic() {
        let mut factory = MockFactory::new(|| 1u8).panic_with("exploded");
        let _ = factory.create();
    }
}

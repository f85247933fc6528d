//! # Service Facade
//!
//! [`Service`] is the synchronous API that caller threads use to run operations against a
//! thread-affine resource. It is `Send + Sync`; share it behind an `Arc` or a reference.
//!
//! A request is two bounded handoffs:
//!
//! 1. **Submission** - the envelope is offered to the worker. If the worker does not take
//!    it within the timeout the request returns [`RequestError::Busy`]; nothing ran.
//! 2. **Completion** - the caller waits for the same envelope to come back. If it does not
//!    arrive within the timeout the request returns [`RequestError::Timeout`]. The worker
//!    may still finish the operation; its result is then dropped.
//!
//! Only one caller is between the two handoffs at a time. Others wait for their turn
//! within the same timeout and report [`RequestError::Busy`] if it does not come.
//!
//! Every outcome is also recorded in [`Service::health`].

use crate::channel::{self, Missed, Receiver, Sender};
use crate::config::ServiceConfig;
use crate::envelope::{Completion, Envelope};
use crate::error::{Failure, RequestError, StartError};
use crate::factory::ResourceFactory;
use crate::health::Health;
use crate::worker::{Shared, Worker, WorkerPhase, WorkerSettings};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// Serialized, timeout-bounded access to a resource built by `F`.
///
/// # Example
///
/// ```rust
/// use sta_actor::{from_fn, Health, Service, ServiceConfig};
/// use std::time::Duration;
///
/// let config = ServiceConfig::default().with_timeout(Duration::from_millis(500));
/// let factory = from_fn(|| Ok::<_, std::io::Error>(Vec::<u32>::new()));
/// let service = Service::with_config(factory, config);
/// service.start().unwrap();
///
/// service.command(|log| log.push(1));
/// let len = service.query(|log| log.len());
/// assert_eq!(len, Some(1));
/// assert_eq!(service.health(), Health::Ok);
///
/// service.stop();
/// service.join();
/// assert_eq!(service.health(), Health::Failed);
/// ```
pub struct Service<F: ResourceFactory> {
    name: String,
    shared: Arc<Shared>,
    submissions: Sender<Envelope<F::Resource>>,
    completions: Receiver<Completion<F::Resource>>,
    timeout_nanos: AtomicU64,
    next_id: AtomicU64,
    /// Held from submission until the completion is received.
    in_flight: Mutex<()>,
    control: Mutex<Control<F>>,
}

/// Worker ownership, guarded by the facade.
struct Control<F: ResourceFactory> {
    /// Present until `start()` spawns it.
    worker: Option<Worker<F>>,
    handle: Option<JoinHandle<()>>,
    /// Dropping this sender cancels the worker.
    shutdown: Option<Sender<()>>,
}

impl<F: ResourceFactory> Service<F> {
    /// Creates a service with the default configuration. Call [`start`](Self::start) to
    /// spawn its worker.
    pub fn new(factory: F) -> Self {
        Self::with_config(factory, ServiceConfig::default())
    }

    pub fn with_config(factory: F, config: ServiceConfig) -> Self {
        let shared = Arc::new(Shared::default());
        let (submit_tx, submit_rx) = channel::rendezvous();
        let (complete_tx, complete_rx) = channel::rendezvous();
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(0);

        let settings = WorkerSettings {
            name: config.name.clone(),
            publish_timeout: config.publish_timeout,
            drain_timeout: config.drain_timeout,
        };
        let worker = Worker::new(
            factory,
            settings,
            Arc::clone(&shared),
            submit_rx,
            complete_tx,
            shutdown_rx,
        );

        Self {
            name: config.name,
            shared,
            submissions: submit_tx,
            completions: complete_rx,
            timeout_nanos: AtomicU64::new(duration_to_nanos(config.timeout)),
            next_id: AtomicU64::new(0),
            in_flight: Mutex::new(()),
            control: Mutex::new(Control {
                worker: Some(worker),
                handle: None,
                shutdown: Some(shutdown_tx),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Spawns the worker thread.
    pub fn start(&self) -> Result<(), StartError> {
        let mut control = self.control.lock();
        if control.shutdown.is_none() {
            return Err(StartError::ShutDown);
        }
        let worker = control.worker.take().ok_or(StartError::AlreadyStarted)?;

        let spawned = thread::Builder::new()
            .name(self.name.clone())
            .spawn(move || worker.run());
        match spawned {
            Ok(handle) => {
                control.handle = Some(handle);
                info!(service = %self.name, "Service started");
                Ok(())
            }
            Err(e) => {
                control.shutdown = None;
                warn!(service = %self.name, error = %e, "Worker spawn failed");
                Err(StartError::Spawn(e))
            }
        }
    }

    /// Cancels the worker. Idempotent.
    ///
    /// The worker finishes the operation it is executing, tears the resource down and
    /// wakes every blocked caller. Use [`join`](Self::join) to wait for that to happen.
    pub fn stop(&self) {
        let mut control = self.control.lock();
        if control.shutdown.take().is_some() {
            // A worker that never ran owns the other channel ends; release them.
            control.worker = None;
            info!(service = %self.name, "Stop requested");
        }
    }

    /// Waits for the worker thread to exit. Returns immediately if it was never started.
    ///
    /// Blocks until [`stop`](Self::stop) is called or the worker fails.
    pub fn join(&self) {
        let handle = self.control.lock().handle.take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!(service = %self.name, "Worker thread panicked");
            }
        }
    }

    pub fn health(&self) -> Health {
        self.shared.health.get()
    }

    /// The failure that terminated the worker, if any.
    pub fn last_failure(&self) -> Option<Arc<Failure>> {
        self.shared.last_failure()
    }

    pub fn phase(&self) -> WorkerPhase {
        self.shared.phase()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_nanos(self.timeout_nanos.load(Ordering::Relaxed))
    }

    pub fn set_timeout(&self, timeout: Duration) {
        self.timeout_nanos
            .store(duration_to_nanos(timeout), Ordering::Relaxed);
    }

    /// Runs `query` on the worker thread and returns its value, or `None` if the request
    /// did not complete. See [`health`](Self::health) for the reason.
    pub fn query<T, Q>(&self, query: Q) -> Option<T>
    where
        Q: FnOnce(&mut F::Resource) -> T + Send + 'static,
        T: Send + 'static,
    {
        self.try_query(query).ok()
    }

    pub fn query_with_timeout<T, Q>(&self, query: Q, timeout: Duration) -> Option<T>
    where
        Q: FnOnce(&mut F::Resource) -> T + Send + 'static,
        T: Send + 'static,
    {
        self.try_query_with_timeout(query, timeout).ok()
    }

    pub fn try_query<T, Q>(&self, query: Q) -> Result<T, RequestError>
    where
        Q: FnOnce(&mut F::Resource) -> T + Send + 'static,
        T: Send + 'static,
    {
        self.try_query_with_timeout(query, self.timeout())
    }

    pub fn try_query_with_timeout<T, Q>(
        &self,
        query: Q,
        timeout: Duration,
    ) -> Result<T, RequestError>
    where
        Q: FnOnce(&mut F::Resource) -> T + Send + 'static,
        T: Send + 'static,
    {
        let envelope = Envelope::query(self.next_request_id(), query);
        let id = envelope.id();
        let envelope = self.request(envelope, timeout)?;
        match envelope.into_result::<T>() {
            Some(value) => Ok(value),
            None => panic!("Request {id} completed without a result"),
        }
    }

    /// Runs `command` on the worker thread. The outcome is only visible through
    /// [`health`](Self::health); use [`try_command`](Self::try_command) to observe it.
    pub fn command<C>(&self, command: C)
    where
        C: FnOnce(&mut F::Resource) + Send + 'static,
    {
        let _ = self.try_command(command);
    }

    pub fn command_with_timeout<C>(&self, command: C, timeout: Duration)
    where
        C: FnOnce(&mut F::Resource) + Send + 'static,
    {
        let _ = self.try_command_with_timeout(command, timeout);
    }

    pub fn try_command<C>(&self, command: C) -> Result<(), RequestError>
    where
        C: FnOnce(&mut F::Resource) + Send + 'static,
    {
        self.try_command_with_timeout(command, self.timeout())
    }

    pub fn try_command_with_timeout<C>(
        &self,
        command: C,
        timeout: Duration,
    ) -> Result<(), RequestError>
    where
        C: FnOnce(&mut F::Resource) + Send + 'static,
    {
        let envelope = Envelope::command(self.next_request_id(), command);
        self.request(envelope, timeout).map(|_| ())
    }

    fn next_request_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn request(
        &self,
        envelope: Envelope<F::Resource>,
        timeout: Duration,
    ) -> Result<Envelope<F::Resource>, RequestError> {
        let id = envelope.id();
        let outcome = self.round_trip(envelope, timeout);
        if let Err(e) = &outcome {
            debug!(service = %self.name, id, error = %e, "Request not completed");
        }
        outcome
    }

    fn round_trip(
        &self,
        envelope: Envelope<F::Resource>,
        timeout: Duration,
    ) -> Result<Envelope<F::Resource>, RequestError> {
        if self.health() == Health::Failed {
            return Err(RequestError::Failed);
        }

        let id = envelope.id();
        let queued_at = Instant::now();
        let Some(_turn) = self.in_flight.try_lock_for(timeout) else {
            return Err(self.settle(Health::Busy, RequestError::Busy));
        };
        if self.health() == Health::Failed {
            return Err(RequestError::Failed);
        }

        trace!(service = %self.name, id, "Submit");
        let remaining = timeout.saturating_sub(queued_at.elapsed());
        match channel::offer(&self.submissions, envelope, remaining) {
            Ok(()) => {}
            Err(Missed::TimedOut) => return Err(self.settle(Health::Busy, RequestError::Busy)),
            Err(Missed::Closed) => return Err(self.interrupted()),
        }
        if self.health() == Health::Failed {
            // Taken by the worker's drain, not executed.
            return Err(RequestError::Failed);
        }

        trace!(service = %self.name, id, "Wait");
        match channel::poll(&self.completions, timeout) {
            Ok(Completion::Done(envelope)) if envelope.id() == id => {
                if self.shared.health.set(Health::Ok).is_err() {
                    debug!(service = %self.name, id, "Completed after service failure");
                }
                trace!(service = %self.name, id, "Completed");
                Ok(envelope)
            }
            Ok(Completion::Done(other)) => {
                panic!("Request lost: waiting for request {id}, received request {}", other.id())
            }
            Ok(Completion::Terminated) | Err(Missed::Closed) => Err(self.interrupted()),
            Err(Missed::TimedOut) => Err(self.settle(Health::Timeout, RequestError::Timeout)),
        }
    }

    /// Records a caller-side outcome. Losing the race against the worker's `Failed`
    /// reports `Failed` instead.
    fn settle(&self, health: Health, error: RequestError) -> RequestError {
        match self.shared.health.set(health) {
            Ok(_) => error,
            Err(_) => RequestError::Failed,
        }
    }

    fn interrupted(&self) -> RequestError {
        if self.health() == Health::Failed {
            RequestError::Failed
        } else {
            RequestError::Interrupted
        }
    }
}

impl<F: ResourceFactory> std::fmt::Debug for Service<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Service")
            .field("name", &self.name)
            .field("health", &self.health())
            .field("phase", &self.phase())
            .field("timeout", &self.timeout())
            .finish()
    }
}

fn duration_to_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

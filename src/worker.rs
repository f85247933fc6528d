//! # Worker Loop
//!
//! The `Worker` is the server half of a service. It runs on one dedicated thread, owns the
//! resource for the whole run, and is the only code that ever touches it.
//!
//! ```text
//! Starting ──▶ Running ──▶ Draining ──▶ Terminated
//!     │                       ▲
//!     └───────────────────────┘  (start hook or create failed)
//! ```
//!
//! - **Starting**: calls [`ResourceFactory::on_worker_start`] and [`ResourceFactory::create`].
//! - **Running**: takes one envelope at a time (blocking without a timeout), executes it,
//!   and offers it back on the completion channel for `publish_timeout`. If nobody takes
//!   it the result is dropped.
//! - **Draining**: destroys the resource, calls [`ResourceFactory::on_worker_stop`],
//!   stores [`Health::Failed`], drops pending submissions unexecuted, and answers every
//!   waiting caller with [`Completion::Terminated`] before closing both channels.
//!
//! Panics raised by the factory or by caller operations are caught here and stored as the
//! service's [`Failure`]; they never unwind into a caller's thread.

use crate::channel::{self, Receiver, Sender};
use crate::envelope::{Completion, Envelope};
use crate::error::{panic_message, Failure};
use crate::factory::ResourceFactory;
use crate::health::{Health, HealthCell};
use arc_swap::ArcSwapOption;
use crossbeam_channel::{select_biased, TryRecvError};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WorkerPhase {
    /// The worker thread has not been spawned.
    Idle = 0,
    Starting = 1,
    Running = 2,
    Draining = 3,
    Terminated = 4,
}

impl WorkerPhase {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => WorkerPhase::Idle,
            1 => WorkerPhase::Starting,
            2 => WorkerPhase::Running,
            3 => WorkerPhase::Draining,
            _ => WorkerPhase::Terminated,
        }
    }
}

/// State read by callers and written by the worker.
#[derive(Debug, Default)]
pub(crate) struct Shared {
    pub(crate) health: HealthCell,
    last_failure: ArcSwapOption<Failure>,
    phase: AtomicU8,
}

impl Shared {
    pub(crate) fn last_failure(&self) -> Option<Arc<Failure>> {
        self.last_failure.load_full()
    }

    pub(crate) fn phase(&self) -> WorkerPhase {
        WorkerPhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    fn set_phase(&self, phase: WorkerPhase) {
        self.phase.store(phase as u8, Ordering::Release);
    }
}

/// Why the running phase ended.
enum Exit {
    /// `stop()` was called.
    Cancelled,
    /// The service was dropped.
    Disconnected,
    Failed(Failure),
}

pub(crate) struct Worker<F: ResourceFactory> {
    name: String,
    factory: F,
    shared: Arc<Shared>,
    submissions: Receiver<Envelope<F::Resource>>,
    completions: Sender<Completion<F::Resource>>,
    shutdown: Receiver<()>,
    publish_timeout: Duration,
    drain_timeout: Duration,
}

pub(crate) struct WorkerSettings {
    pub(crate) name: String,
    pub(crate) publish_timeout: Duration,
    pub(crate) drain_timeout: Duration,
}

impl<F: ResourceFactory> Worker<F> {
    pub(crate) fn new(
        factory: F,
        settings: WorkerSettings,
        shared: Arc<Shared>,
        submissions: Receiver<Envelope<F::Resource>>,
        completions: Sender<Completion<F::Resource>>,
        shutdown: Receiver<()>,
    ) -> Self {
        Self {
            name: settings.name,
            factory,
            shared,
            submissions,
            completions,
            shutdown,
            publish_timeout: settings.publish_timeout,
            drain_timeout: settings.drain_timeout,
        }
    }

    /// Runs the worker to termination. Blocks the calling thread.
    pub(crate) fn run(mut self) {
        self.shared.set_phase(WorkerPhase::Starting);
        info!(service = %self.name, "Worker started");

        let (resource, exit) = match self.start() {
            Ok(mut resource) => {
                let exit = self.serve(&mut resource);
                (Some(resource), exit)
            }
            Err(failure) => (None, Exit::Failed(failure)),
        };

        self.shared.set_phase(WorkerPhase::Draining);
        self.teardown(resource);
        match exit {
            Exit::Cancelled => info!(service = %self.name, "Worker cancelled"),
            Exit::Disconnected => info!(service = %self.name, "Service dropped"),
            Exit::Failed(failure) => {
                warn!(service = %self.name, error = %failure, "Worker failed");
                self.shared.last_failure.store(Some(Arc::new(failure)));
            }
        }
        if let Err(e) = self.shared.health.set(Health::Failed) {
            error!(service = %self.name, error = %e, "Health already terminal");
        }
        self.drain();

        // Dropping the channel ends fails every later submission immediately.
        let Self { name, shared, .. } = self;
        shared.set_phase(WorkerPhase::Terminated);
        info!(service = %name, "Worker terminated");
    }

    fn start(&mut self) -> Result<F::Resource, Failure> {
        let factory = &mut self.factory;
        catch_unwind(AssertUnwindSafe(|| factory.on_worker_start()))
            .map_err(|payload| Failure::HookPanicked(panic_message(&*payload)))?;

        match catch_unwind(AssertUnwindSafe(|| factory.create())) {
            Ok(Ok(resource)) => {
                debug!(service = %self.name, "Resource created");
                Ok(resource)
            }
            Ok(Err(e)) => Err(Failure::Create(Box::new(e))),
            Err(payload) => Err(Failure::CreatePanicked(panic_message(&*payload))),
        }
    }

    fn serve(&mut self, resource: &mut F::Resource) -> Exit {
        if let Err(e) = self.shared.health.set(Health::Ok) {
            error!(service = %self.name, error = %e, "Cannot enter service");
            return Exit::Cancelled;
        }
        self.shared.set_phase(WorkerPhase::Running);
        debug!(service = %self.name, "Start request processing");

        loop {
            // Cancellation wins over a submitter that is already waiting.
            if self.is_cancelled() {
                return Exit::Cancelled;
            }
            let mut envelope = select_biased! {
                recv(self.shutdown) -> _ => return Exit::Cancelled,
                recv(self.submissions) -> msg => match msg {
                    Ok(envelope) => envelope,
                    Err(_) => return Exit::Disconnected,
                },
            };

            let id = envelope.id();
            trace!(service = %self.name, id, kind = ?envelope.kind(), "Process");
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| envelope.execute(resource))) {
                let message = panic_message(&*payload);
                return Exit::Failed(Failure::OperationPanicked { id, message });
            }

            if self.is_cancelled() {
                return Exit::Cancelled;
            }
            let responded = channel::offer(
                &self.completions,
                Completion::Done(envelope),
                self.publish_timeout,
            )
            .is_ok();
            trace!(service = %self.name, id, responded, "Responded");
        }
    }

    fn is_cancelled(&self) -> bool {
        matches!(self.shutdown.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// The caller-facing channel ends, for tests that stand in for the worker.
    #[cfg(test)]
    pub(crate) fn channels(
        &self,
    ) -> (Receiver<Envelope<F::Resource>>, Sender<Completion<F::Resource>>) {
        (self.submissions.clone(), self.completions.clone())
    }

    fn teardown(&mut self, resource: Option<F::Resource>) {
        let factory = &mut self.factory;
        if let Some(resource) = resource {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| factory.destroy(resource))) {
                let panic = panic_message(&*payload);
                error!(service = %self.name, %panic, "Resource destroy panicked");
            }
        }
        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| factory.on_worker_stop())) {
            let panic = panic_message(&*payload);
            error!(service = %self.name, %panic, "Worker stop hook panicked");
        }
        debug!(service = %self.name, "Resources released");
    }

    /// Rejects pending submissions and wakes blocked callers until a pass finds neither.
    fn drain(&self) {
        loop {
            let mut dropped = 0usize;
            while channel::poll(&self.submissions, self.drain_timeout).is_ok() {
                dropped += 1;
            }
            let mut woken = 0usize;
            while channel::offer(&self.completions, Completion::Terminated, self.drain_timeout)
                .is_ok()
            {
                woken += 1;
            }
            debug!(service = %self.name, dropped, woken, "Drain pass");
            if dropped == 0 && woken == 0 {
                break;
            }
        }
    }
}

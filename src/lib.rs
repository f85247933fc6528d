//! # STA Actor
//!
//! > **Serialized, timeout-bounded access to thread-affine resources.**
//!
//! Some resources must be created, used and destroyed on one thread: COM objects in a
//! single-threaded apartment, GUI handles, driver sessions, `Rc`-based object graphs. This
//! crate wraps such a resource in a [`Service`]: one dedicated worker thread owns it, and
//! any number of caller threads run operations against it through a synchronous API with
//! a bounded wait.
//!
//! ## 🏗️ Architecture Overview
//!
//! The crate separates concerns into three layers, like a client/server actor:
//!
//! 1. **Resource Layer** ([`ResourceFactory`]) - builds and tears down the resource and
//!    registers the worker thread with its environment.
//! 2. **Runtime Layer** ([`worker`]) - the single thread that owns the resource and executes
//!    one request at a time, in submission order.
//! 3. **Interface Layer** ([`Service`], [`ServiceClient`], [`AsyncService`]) - the API
//!    caller threads use.
//!
//! ```text
//!  caller ──Envelope──▶ [submission rendezvous] ──▶ worker ──▶ &mut Resource
//!  caller ◀──Envelope── [completion rendezvous] ◀── worker
//! ```
//!
//! ## 🚀 Quick Start
//!
//! ```rust
//! use sta_actor::{from_fn, Health, Service, ServiceConfig};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use std::time::Duration;
//!
//! // `Rc<RefCell<_>>` is not `Send`; it never leaves the worker thread.
//! let factory = from_fn(|| Ok::<_, std::io::Error>(Rc::new(RefCell::new(Vec::<String>::new()))));
//! let config = ServiceConfig::default().with_timeout(Duration::from_millis(200));
//! let service = Service::with_config(factory, config);
//! service.start().unwrap();
//!
//! service.command(|log| log.borrow_mut().push("hello".into()));
//! assert_eq!(service.query(|log| log.borrow().len()), Some(1));
//! assert_eq!(service.health(), Health::Ok);
//! ```
//!
//! ## Failure Model
//!
//! | Outcome | Meaning | [`Health`] |
//! |---------|---------|------------|
//! | [`RequestError::Busy`] | Worker did not accept the request in time; nothing ran. Retryable. | `Busy` |
//! | [`RequestError::Timeout`] | Accepted, but no response in time. The operation may still run. | `Timeout` |
//! | [`RequestError::Failed`] | Worker terminated. The service must be discarded. | `Failed` |
//!
//! Errors and panics raised while creating the resource or running an operation are caught
//! on the worker thread and stored as [`Service::last_failure`]; the service then becomes
//! permanently `Failed`. They are never re-raised in a caller's thread.
//!
//! ## Testing
//!
//! The [`mock`] module provides [`MockFactory`](mock::MockFactory), a scripted factory that
//! records which lifecycle hooks ran and on which thread.

pub mod async_service;
mod channel;
pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod factory;
pub mod health;
pub mod mock;
pub mod service;
pub mod tracing;
pub mod worker;

// Re-export core types for convenience
pub use async_service::AsyncService;
pub use client::ServiceClient;
pub use config::ServiceConfig;
pub use envelope::{Completion, Envelope, RequestKind};
pub use error::{BoxError, Failure, InvalidTransition, RequestError, StartError};
pub use factory::{from_fn, FnFactory, ResourceFactory};
pub use health::{Health, HealthCell};
pub use service::Service;
pub use worker::WorkerPhase;

//! # ResourceFactory Trait
//!
//! The `ResourceFactory` trait is the contract between a [`Service`](crate::Service) and the
//! thread-affine object it guards. Every method is called on the service's worker thread,
//! in this order:
//!
//! 1. [`on_worker_start`](ResourceFactory::on_worker_start) - register the thread with
//!    whatever environment the resource needs.
//! 2. [`create`](ResourceFactory::create) - build the resource.
//! 3. *requests are served*
//! 4. [`destroy`](ResourceFactory::destroy) - tear the resource down (only if `create`
//!    succeeded).
//! 5. [`on_worker_stop`](ResourceFactory::on_worker_stop) - release the thread
//!    registration. Always called, even when an earlier step failed.
//!
//! The resource itself never leaves the worker thread, so it does not need to be `Send`.

/// Builds and tears down the resource owned by a service's worker thread.
///
/// # Example
///
/// ```rust
/// use sta_actor::ResourceFactory;
/// use std::rc::Rc;
///
/// struct Handle(Rc<String>); // not Send
///
/// struct HandleFactory;
///
/// impl ResourceFactory for HandleFactory {
///     type Resource = Handle;
///     type Error = std::io::Error;
///
///     fn create(&mut self) -> Result<Handle, Self::Error> {
///         Ok(Handle(Rc::new("device-0".into())))
///     }
/// }
/// ```
pub trait ResourceFactory: Send + 'static {
    /// The thread-affine resource.
    type Resource: 'static;

    /// The error returned when the resource cannot be created.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Called first on the worker thread.
    fn on_worker_start(&mut self) {}

    /// Called once per worker run, after [`on_worker_start`](Self::on_worker_start).
    fn create(&mut self) -> Result<Self::Resource, Self::Error>;

    /// Called with the resource when the worker stops serving requests.
    fn destroy(&mut self, resource: Self::Resource) {
        drop(resource);
    }

    /// Called last on the worker thread.
    fn on_worker_stop(&mut self) {}
}

/// A [`ResourceFactory`] backed by a closure, with no lifecycle hooks.
pub struct FnFactory<C> {
    create: C,
}

/// Wraps a closure as a [`ResourceFactory`].
///
/// ```rust
/// use sta_actor::{from_fn, Service};
///
/// let service = Service::new(from_fn(|| Ok::<_, std::io::Error>(Vec::<u8>::new())));
/// ```
pub fn from_fn<C, R, E>(create: C) -> FnFactory<C>
where
    C: FnMut() -> Result<R, E> + Send + 'static,
    R: 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    FnFactory { create }
}

impl<C, R, E> ResourceFactory for FnFactory<C>
where
    C: FnMut() -> Result<R, E> + Send + 'static,
    R: 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    type Resource = R;
    type Error = E;

    fn create(&mut self) -> Result<R, E> {
        (self.create)()
    }
}

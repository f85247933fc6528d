//! # ServiceClient Trait
//!
//! Provides a common interface for resource-specific clients, adding default forwarding
//! methods on top of a generic [`Service`].
use crate::{Failure, Health, RequestError, ResourceFactory, Service};
use std::sync::Arc;

/// Trait for resource-specific clients to inherit the generic request API.
///
/// Implementors expose domain methods (`read_voltage`, `set_range`, ...) and build them
/// from [`query`](ServiceClient::query) and [`command`](ServiceClient::command).
///
/// # Example
///
/// ```rust
/// use sta_actor::{from_fn, FnFactory, Service, ServiceClient};
///
/// type Counter = u64;
/// type CounterFactory = FnFactory<fn() -> Result<Counter, std::io::Error>>;
///
/// struct CounterClient {
///     service: Service<CounterFactory>,
/// }
///
/// impl ServiceClient<CounterFactory> for CounterClient {
///     fn service(&self) -> &Service<CounterFactory> {
///         &self.service
///     }
/// }
///
/// impl CounterClient {
///     fn increment(&self) -> Option<u64> {
///         self.query(|count| {
///             *count += 1;
///             *count
///         })
///     }
/// }
///
/// let create: fn() -> Result<Counter, std::io::Error> = || Ok(0);
/// let client = CounterClient { service: Service::new(from_fn(create)) };
/// client.service().start().unwrap();
/// assert_eq!(client.increment(), Some(1));
/// ```
pub trait ServiceClient<F: ResourceFactory>: Send + Sync {
    /// Access the inner generic service.
    fn service(&self) -> &Service<F>;

    fn query<T, Q>(&self, query: Q) -> Option<T>
    where
        Q: FnOnce(&mut F::Resource) -> T + Send + 'static,
        T: Send + 'static,
    {
        self.service().query(query)
    }

    fn try_query<T, Q>(&self, query: Q) -> Result<T, RequestError>
    where
        Q: FnOnce(&mut F::Resource) -> T + Send + 'static,
        T: Send + 'static,
    {
        self.service().try_query(query)
    }

    fn command<C>(&self, command: C)
    where
        C: FnOnce(&mut F::Resource) + Send + 'static,
    {
        self.service().command(command)
    }

    fn try_command<C>(&self, command: C) -> Result<(), RequestError>
    where
        C: FnOnce(&mut F::Resource) + Send + 'static,
    {
        self.service().try_command(command)
    }

    fn health(&self) -> Health {
        self.service().health()
    }

    fn last_failure(&self) -> Option<Arc<Failure>> {
        self.service().last_failure()
    }

    /// Whether requests can still be served. `false` once the service has failed.
    fn is_available(&self) -> bool {
        !self.health().is_terminal()
    }
}

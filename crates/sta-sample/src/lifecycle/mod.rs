//! # System Lifecycle
//!
//! [`InstrumentSystem`] builds the instrument service, starts its worker, and hands out the
//! blocking [`InstrumentClient`] and the async [`AsyncService`] handle.
//!
//! ## Shutdown
//!
//! 1. **Stop** - [`Service::stop`] cancels the worker after its current request.
//! 2. **Teardown** - the worker destroys the instrument and closes its driver session,
//!    on the worker thread.
//! 3. **Join** - [`Service::join`] waits for the thread to exit.

use crate::clients::InstrumentClient;
use crate::model::InstrumentFactory;
use sta_actor::{AsyncService, Health, Service, ServiceConfig, StartError};
use std::sync::Arc;
use tracing::info;

pub struct InstrumentSystem {
    pub client: InstrumentClient,
    pub async_service: AsyncService<InstrumentFactory>,
    service: Arc<Service<InstrumentFactory>>,
}

impl InstrumentSystem {
    /// Starts a service for the instrument with the given serial number.
    pub fn start(serial: &str, config: ServiceConfig) -> Result<Self, StartError> {
        Self::start_with(InstrumentFactory::new(serial), config)
    }

    pub fn start_with(
        factory: InstrumentFactory,
        config: ServiceConfig,
    ) -> Result<Self, StartError> {
        let service = Arc::new(Service::with_config(factory, config));
        service.start()?;
        info!(service = service.name(), "Instrument system started");

        Ok(Self {
            client: InstrumentClient::new(Arc::clone(&service)),
            async_service: AsyncService::new(Arc::clone(&service)),
            service,
        })
    }

    pub fn health(&self) -> Health {
        self.service.health()
    }

    /// Stops the service and waits for its worker thread. Blocks.
    pub fn shutdown(self) {
        self.service.stop();
        self.service.join();
        info!(
            service = self.service.name(),
            health = %self.service.health(),
            "Instrument system stopped"
        );
    }
}

//! # Instrument Client
//!
//! Provides a high-level API for the instrument service.
//! It wraps a `Service<InstrumentFactory>` and exposes domain-specific methods.
use crate::model::{InstrumentFactory, Range, Reading};
use sta_actor::{RequestError, Service, ServiceClient};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Client for the instrument service.
#[derive(Clone)]
pub struct InstrumentClient {
    service: Arc<Service<InstrumentFactory>>,
}

impl InstrumentClient {
    pub fn new(service: Arc<Service<InstrumentFactory>>) -> Self {
        Self { service }
    }

    #[instrument(skip(self))]
    pub fn serial(&self) -> Option<String> {
        debug!("Sending request");
        self.query(|instrument| instrument.serial().to_string())
    }

    #[instrument(skip(self))]
    pub fn measure(&self) -> Option<Reading> {
        debug!("Sending request");
        self.query(|instrument| instrument.measure())
    }

    /// Takes `count` readings in one request, so no other caller can interleave.
    #[instrument(skip(self))]
    pub fn measure_burst(&self, count: usize) -> Option<Vec<Reading>> {
        debug!("Sending request");
        self.query(move |instrument| (0..count).map(|_| instrument.measure()).collect())
    }

    #[instrument(skip(self))]
    pub fn set_range(&self, range: Range) -> Result<(), RequestError> {
        debug!("Sending request");
        self.try_command(move |instrument| instrument.set_range(range))
    }

    #[instrument(skip(self))]
    pub fn reset(&self) {
        debug!("Sending request");
        self.command(|instrument| instrument.reset())
    }
}

impl ServiceClient<InstrumentFactory> for InstrumentClient {
    fn service(&self) -> &Service<InstrumentFactory> {
        &self.service
    }
}

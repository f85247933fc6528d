//! Type-safe wrappers around the generic [`Service`](sta_actor::Service).

pub mod instrument_client;

pub use instrument_client::InstrumentClient;

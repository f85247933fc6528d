//! # STA Sample
//!
//! A reference application for `sta-actor`: a simulated measurement instrument whose
//! driver handle must stay on the thread that connected it.
//!
//! - **[model]**: the [`Instrument`](model::Instrument) resource and its factory.
//! - **[clients]**: [`InstrumentClient`](clients::InstrumentClient), the domain API.
//! - **[lifecycle]**: [`InstrumentSystem`](lifecycle::InstrumentSystem), which starts and
//!   shuts the service down.

pub mod clients;
pub mod lifecycle;
pub mod model;

//! # Observability & Tracing
//!
//! The service logs with the `tracing` crate. Every event carries a `service` field with
//! the configured service name, and per-request events carry the request `id`.
//!
//! | Level | Events |
//! |-------|--------|
//! | `info` | Service started, stop requested, worker started / cancelled / terminated |
//! | `warn` | Worker failed (with the captured failure) |
//! | `debug` | Resource created / released, drain passes, requests that did not complete |
//! | `trace` | Submit, Wait, Process, Responded, Completed, health transitions |
//!
//! ```bash
//! RUST_LOG=info cargo run -p sta-sample
//! RUST_LOG=sta_actor=trace cargo run -p sta-sample
//! ```
//!
//! [`setup_tracing`] installs a compact subscriber filtered by `RUST_LOG`.

/// Initializes the global tracing subscriber.
///
/// Panics if a global subscriber is already installed.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}

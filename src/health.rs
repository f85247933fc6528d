//! # Health State
//!
//! Availability of a service as seen by callers and monitors.
//!
//! ```text
//! Uninitialized ──▶ Ok ◀──▶ { Busy, Timeout }
//!       │            │              │
//!       └────────────┴──────────────┴──▶ Failed (terminal)
//! ```
//!
//! Every write goes through [`Health::can_transition`]. A rejected write is returned as
//! [`InvalidTransition`] and leaves the state untouched, so `Failed` can never be
//! overwritten once it has been stored.

use crate::error::InvalidTransition;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Health {
    /// The worker has not finished starting.
    Uninitialized = 0,
    /// The last round-trip completed.
    Ok = 1,
    /// The last submission was not accepted within the timeout.
    Busy = 2,
    /// The last submission was accepted but its response did not arrive in time.
    Timeout = 3,
    /// The worker has terminated. Terminal.
    Failed = 4,
}

impl Health {
    /// The transition table.
    pub fn can_transition(self, to: Health) -> bool {
        use Health::*;
        match (self, to) {
            (Failed, _) => false,
            (_, Uninitialized) => false,
            (Uninitialized | Ok | Busy | Timeout, Ok | Busy | Timeout | Failed) => true,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Health::Failed
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => Health::Uninitialized,
            1 => Health::Ok,
            2 => Health::Busy,
            3 => Health::Timeout,
            _ => Health::Failed,
        }
    }
}

impl fmt::Display for Health {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Health::Uninitialized => "uninitialized",
            Health::Ok => "ok",
            Health::Busy => "busy",
            Health::Timeout => "timeout",
            Health::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Atomic cell holding a [`Health`], guarded by the transition table.
#[derive(Debug)]
pub struct HealthCell {
    state: AtomicU8,
}

impl Default for HealthCell {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthCell {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(Health::Uninitialized as u8),
        }
    }

    pub fn get(&self) -> Health {
        Health::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Moves to `to`, returning the previous state.
    ///
    /// The check and the write are a single compare-and-swap, so a concurrent `Failed`
    /// cannot be overwritten by a write that observed an older state.
    pub fn set(&self, to: Health) -> Result<Health, InvalidTransition> {
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            let from = Health::from_u8(current);
            if !from.can_transition(to) {
                return Err(InvalidTransition { from, to });
            }
            match self.state.compare_exchange_weak(
                current,
                to as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    trace!(%from, %to, "Health");
                    return Ok(from);
                }
                Err(actual) => current = actual,
            }
        }
    }
}

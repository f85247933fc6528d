//! # Rendezvous Channels
//!
//! Single-slot handoff points built on zero-capacity `crossbeam-channel` channels. An
//! offer completes only when a receiver takes the value, and both sides wait at most
//! the given timeout. Dropping every receiver (or sender) closes the channel and wakes
//! the other side immediately.

use crossbeam_channel::{RecvTimeoutError, SendTimeoutError};
use std::time::Duration;

pub(crate) use crossbeam_channel::{Receiver, Sender};

/// Why a handoff did not happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Missed {
    TimedOut,
    Closed,
}

/// Creates a rendezvous channel.
pub(crate) fn rendezvous<T>() -> (Sender<T>, Receiver<T>) {
    crossbeam_channel::bounded(0)
}

/// Hands `value` to a receiver, waiting at most `timeout`. The value is dropped on failure.
pub(crate) fn offer<T>(sender: &Sender<T>, value: T, timeout: Duration) -> Result<(), Missed> {
    sender.send_timeout(value, timeout).map_err(|e| match e {
        SendTimeoutError::Timeout(_) => Missed::TimedOut,
        SendTimeoutError::Disconnected(_) => Missed::Closed,
    })
}

/// Takes a value from a sender, waiting at most `timeout`.
pub(crate) fn poll<T>(receiver: &Receiver<T>, timeout: Duration) -> Result<T, Missed> {
    receiver.recv_timeout(timeout).map_err(|e| match e {
        RecvTimeoutError::Timeout => Missed::TimedOut,
        RecvTimeoutError::Disconnected => Missed::Closed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_offer_without_taker_times_out() {
        let (tx, _rx) = rendezvous::<u32>();
        let started = Instant::now();
        assert_eq!(offer(&tx, 1, Duration::from_millis(30)), Err(Missed::TimedOut));
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_poll_without_giver_times_out() {
        let (_tx, rx) = rendezvous::<u32>();
        assert_eq!(poll(&rx, Duration::from_millis(10)), Err(Missed::TimedOut));
    }

    #[test]
    fn test_handoff_completes_when_both_sides_ready() {
        let (tx, rx) = rendezvous::<u32>();
        let taker = thread::spawn(move || poll(&rx, Duration::from_secs(5)));
        assert_eq!(offer(&tx, 7, Duration::from_secs(5)), Ok(()));
        assert_eq!(taker.join().unwrap(), Ok(7));
    }

    #[test]
    fn test_closed_channel_fails_fast() {
        let (tx, rx) = rendezvous::<u32>();
        drop(rx);
        let started = Instant::now();
        assert_eq!(offer(&tx, 1, Duration::from_secs(5)), Err(Missed::Closed));

        let (tx, rx) = rendezvous::<u32>();
        drop(tx);
        assert_eq!(poll(&rx, Duration::from_secs(5)), Err(Missed::Closed));
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}

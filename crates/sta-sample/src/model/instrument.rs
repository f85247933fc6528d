use serde::{Deserialize, Serialize};
use sta_actor::ResourceFactory;
use std::cell::Cell;
use std::marker::PhantomData;
use std::rc::Rc;
use std::thread::{self, ThreadId};

thread_local! {
    static SESSION: Cell<bool> = const { Cell::new(false) };
}

/// Registers the current thread with the (simulated) driver runtime.
pub fn open_session() {
    SESSION.with(|session| session.set(true));
}

pub fn close_session() {
    SESSION.with(|session| session.set(false));
}

pub fn session_open() -> bool {
    SESSION.with(|session| session.get())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Range {
    Millivolts,
    Volts,
    Kilovolts,
}

impl Range {
    fn scale(self) -> f64 {
        match self {
            Range::Millivolts => 1_000.0,
            Range::Volts => 1.0,
            Range::Kilovolts => 0.001,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub serial: String,
    pub sequence: u64,
    pub range: Range,
    pub value: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum InstrumentError {
    #[error("No driver session on this thread")]
    NoSession,
    #[error("Instrument {0} not connected")]
    NotConnected(String),
}

/// A simulated driver handle. Usable only on the thread that connected it.
#[derive(Debug)]
pub struct Instrument {
    serial: String,
    range: Range,
    readings: u64,
    owner: ThreadId,
    _affine: PhantomData<Rc<()>>,
}

impl Instrument {
    /// Connects on the current thread, which must hold a driver session.
    pub fn connect(serial: &str) -> Result<Self, InstrumentError> {
        if !session_open() {
            return Err(InstrumentError::NoSession);
        }
        Ok(Self {
            serial: serial.to_string(),
            range: Range::Volts,
            readings: 0,
            owner: thread::current().id(),
            _affine: PhantomData,
        })
    }

    fn check_thread(&self) {
        assert_eq!(
            thread::current().id(),
            self.owner,
            "instrument {} used off its owning thread",
            self.serial
        );
    }

    pub fn serial(&self) -> &str {
        self.check_thread();
        &self.serial
    }

    pub fn range(&self) -> Range {
        self.check_thread();
        self.range
    }

    pub fn set_range(&mut self, range: Range) {
        self.check_thread();
        self.range = range;
    }

    /// Takes a reading. The simulated source sits at 1.5 V plus 1 mV per reading taken.
    pub fn measure(&mut self) -> Reading {
        self.check_thread();
        let volts = 1.5 + self.readings as f64 * 0.001;
        let reading = Reading {
            serial: self.serial.clone(),
            sequence: self.readings,
            range: self.range,
            value: volts * self.range.scale(),
        };
        self.readings += 1;
        reading
    }

    pub fn readings(&self) -> u64 {
        self.check_thread();
        self.readings
    }

    pub fn reset(&mut self) {
        self.check_thread();
        self.readings = 0;
        self.range = Range::Volts;
    }
}

/// Connects an [`Instrument`] on a service's worker thread.
#[derive(Debug, Clone)]
pub struct InstrumentFactory {
    serial: String,
    connected: bool,
}

impl InstrumentFactory {
    pub fn new(serial: impl Into<String>) -> Self {
        Self {
            serial: serial.into(),
            connected: true,
        }
    }

    /// A factory for an instrument that is not plugged in.
    pub fn disconnected(serial: impl Into<String>) -> Self {
        Self {
            serial: serial.into(),
            connected: false,
        }
    }
}

impl ResourceFactory for InstrumentFactory {
    type Resource = Instrument;
    type Error = InstrumentError;

    fn on_worker_start(&mut self) {
        open_session();
    }

    fn create(&mut self) -> Result<Instrument, InstrumentError> {
        if !self.connected {
            return Err(InstrumentError::NotConnected(self.serial.clone()));
        }
        Instrument::connect(&self.serial)
    }

    fn on_worker_stop(&mut self) {
        close_session();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_requires_session() {
        close_session();
        assert!(matches!(Instrument::connect("A1"), Err(InstrumentError::NoSession)));

        open_session();
        let instrument = Instrument::connect("A1").unwrap();
        assert_eq!(instrument.serial(), "A1");
        close_session();
    }

    #[test]
    fn test_measure_scales_with_range() {
        open_session();
        let mut instrument = Instrument::connect("A2").unwrap();
        let first = instrument.measure();
        assert_eq!(first.sequence, 0);
        assert!((first.value - 1.5).abs() < 1e-9);

        instrument.set_range(Range::Millivolts);
        let second = instrument.measure();
        assert_eq!(second.range, Range::Millivolts);
        assert!((second.value - 1501.0).abs() < 1e-6);
        assert_eq!(instrument.readings(), 2);

        instrument.reset();
        assert_eq!(instrument.readings(), 0);
        assert_eq!(instrument.range(), Range::Volts);
        close_session();
    }

    #[test]
    fn test_reading_serializes() {
        let reading = Reading {
            serial: "A3".into(),
            sequence: 4,
            range: Range::Volts,
            value: 1.504,
        };
        let json = serde_json::to_value(&reading).unwrap();
        assert_eq!(json["range"], "Volts");
        assert_eq!(json["sequence"], 4);
    }
}

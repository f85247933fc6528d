use sta_actor::{Failure, Health, RequestError, ServiceClient, ServiceConfig};
use sta_sample::lifecycle::InstrumentSystem;
use sta_sample::model::{InstrumentError, InstrumentFactory, Range};
use std::thread;
use std::time::Duration;

fn config() -> ServiceConfig {
    ServiceConfig::default()
        .with_name("dmm-test")
        .with_timeout(Duration::from_secs(2))
}

/// Full flow through the real service: the instrument asserts on every call that it is
/// used on its owning thread, so any leak off the worker would fail the service.
#[test]
fn test_instrument_system_round_trip() {
    let system = InstrumentSystem::start("DMM-1", config()).expect("start");

    assert_eq!(system.client.serial().as_deref(), Some("DMM-1"));
    assert_eq!(system.client.set_range(Range::Millivolts), Ok(()));

    let reading = system.client.measure().expect("reading");
    assert_eq!(reading.sequence, 0);
    assert_eq!(reading.range, Range::Millivolts);
    assert!((reading.value - 1500.0).abs() < 1e-6);

    let burst = system.client.measure_burst(3).expect("burst");
    let sequences: Vec<_> = burst.iter().map(|r| r.sequence).collect();
    assert_eq!(sequences, vec![1, 2, 3]);

    system.client.reset();
    assert_eq!(system.client.query(|instrument| instrument.readings()), Some(0));
    assert_eq!(system.health(), Health::Ok);
    assert!(system.client.is_available());

    system.shutdown();
}

#[test]
fn test_readings_from_many_threads_are_sequenced() {
    let system = InstrumentSystem::start("DMM-2", config()).expect("start");

    let callers: Vec<_> = (0..4)
        .map(|_| {
            let client = system.client.clone();
            thread::spawn(move || {
                (0..10)
                    .map(|_| client.measure().expect("reading").sequence)
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut all = Vec::new();
    for caller in callers {
        let sequences = caller.join().unwrap();
        assert!(sequences.windows(2).all(|w| w[0] < w[1]));
        all.extend(sequences);
    }
    all.sort_unstable();
    assert_eq!(all, (0..40).collect::<Vec<u64>>());

    system.shutdown();
}

#[test]
fn test_disconnected_instrument_fails_service() {
    let factory = InstrumentFactory::disconnected("DMM-404");
    let system = InstrumentSystem::start_with(factory, config()).expect("start");
    let client = system.client.clone();

    let outcome = client.try_query(|instrument| instrument.readings());
    assert_eq!(outcome, Err(RequestError::Failed));
    assert!(!client.is_available());

    let failure = client.last_failure().expect("failure");
    match &*failure {
        Failure::Create(source) => {
            let error = source.downcast_ref::<InstrumentError>().expect("InstrumentError");
            assert!(matches!(error, InstrumentError::NotConnected(serial) if serial == "DMM-404"));
        }
        other => panic!("unexpected failure: {other}"),
    }

    system.shutdown();
    assert_eq!(client.health(), Health::Failed);
}

#[tokio::test]
async fn test_async_readings() {
    let system = InstrumentSystem::start("DMM-3", config()).expect("start");

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let service = system.async_service.clone();
            tokio::spawn(async move { service.query(|instrument| instrument.measure()).await })
        })
        .collect();

    let mut sequences = Vec::new();
    for task in tasks {
        sequences.push(task.await.unwrap().expect("reading").sequence);
    }
    sequences.sort_unstable();
    assert_eq!(sequences, (0..8).collect::<Vec<u64>>());

    tokio::task::spawn_blocking(move || system.shutdown())
        .await
        .unwrap();
}

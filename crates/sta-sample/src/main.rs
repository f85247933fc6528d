//! Runs the instrument sample: a few blocking requests, then concurrent async readings.

use sta_actor::tracing::setup_tracing;
use sta_actor::ServiceConfig;
use sta_sample::lifecycle::InstrumentSystem;
use sta_sample::model::Range;
use std::time::Duration;
use tracing::{error, info, Instrument};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_tracing();

    let config = ServiceConfig::default()
        .with_name("dmm-0")
        .with_timeout(Duration::from_millis(500));
    let system = InstrumentSystem::start("DMM-4711", config)?;

    let serial = system.client.serial();
    info!(?serial, "Connected");

    system.client.set_range(Range::Millivolts)?;
    if let Some(reading) = system.client.measure() {
        info!(value = reading.value, range = ?reading.range, "Single reading");
    }

    let span = tracing::info_span!("async_readings");
    let readings = async {
        let tasks: Vec<_> = (0..4)
            .map(|_| {
                let service = system.async_service.clone();
                tokio::spawn(async move { service.query(|instrument| instrument.measure()).await })
            })
            .collect();

        let mut readings = Vec::new();
        for task in tasks {
            match task.await? {
                Ok(reading) => readings.push(reading),
                Err(e) => error!(error = %e, "Reading failed"),
            }
        }
        Ok::<_, tokio::task::JoinError>(readings)
    }
    .instrument(span)
    .await?;
    info!(count = readings.len(), "Async readings collected");

    tokio::task::spawn_blocking(move || system.shutdown()).await?;
    info!("Application completed successfully");
    Ok(())
}

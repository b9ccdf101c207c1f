// Main entry point - Dependency injection and ingest wiring
mod domain;
mod protocol;
mod application;
mod infrastructure;
mod presentation;

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};

use crate::application::batcher::ReadingBatcher;
use crate::application::reading_store::ReadingStore;
use crate::application::session::{IngestSession, run_session};
use crate::infrastructure::config::load_telemetry_config;
use crate::infrastructure::serial_transport;
use crate::infrastructure::supabase_store::SupabaseStore;
use crate::presentation::live::{LiveFeed, mirror_events};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = load_telemetry_config()?;

    // Create store (infrastructure layer)
    let store = Arc::new(SupabaseStore::new(
        config.supabase.url.clone(),
        config.supabase.api_key.clone(),
        config.supabase.table.clone(),
        config.supabase.user_id.clone(),
    ));

    // Read back the newest row so a bad URL or key shows up before
    // readings start flowing
    match store.fetch_recent(1).await {
        Ok(rows) => match rows.first() {
            Some(last) => info!(last_persisted = %last.captured_at, "reading store reachable"),
            None => info!("reading store reachable, table empty"),
        },
        Err(err) => warn!(error = %err, "reading store not reachable at startup"),
    }

    // Consumer-facing channels (presentation layer)
    let (live, mut live_rx) = LiveFeed::channel();
    let (events, events_rx) = broadcast::channel(16);

    // Echo each completed reading to the console for the operator
    tokio::spawn(async move {
        while live_rx.changed().await.is_ok() {
            let current = live_rx.borrow_and_update().clone();
            if let Some(reading) = current {
                let fields = reading.reading.fields;
                info!(
                    valid = reading.is_valid,
                    lat = ?fields.latitude,
                    lon = ?fields.longitude,
                    ph = ?fields.ph,
                    moisture = ?fields.moisture,
                    "live reading"
                );
            }
        }
    });

    // Surface persistence outcomes; a lost batch is gone, so say so loudly
    tokio::spawn(mirror_events(events_rx));

    // Open the sensor link and start pumping fragments (infrastructure layer)
    let port = serial_transport::open_port(&config.device.port, config.device.baud_rate)?;
    let (tx, rx) = mpsc::channel(64);
    let reader = serial_transport::spawn_reader(port, tx);

    // Assemble the ingest session (application layer)
    let batcher = ReadingBatcher::new(config.ingest.batch_size, config.ingest.policy());
    let session = IngestSession::new(config.device.info(), batcher, store, live, events);

    println!(
        "Starting verdex-telemetry ingest from {} at {} baud",
        config.device.port, config.device.baud_rate
    );

    let mut drive = tokio::spawn(run_session(ReceiverStream::new(rx), session));

    // Ctrl-C stops the reader only; the closed channel then drains the
    // session through its forced-flush shutdown instead of cutting it off.
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown requested, closing serial reader");
            reader.abort();
            drive.await?;
        }
        result = &mut drive => {
            info!("serial link closed, session drained");
            result?;
        }
    }

    Ok(())
}

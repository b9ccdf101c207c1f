// Consumer-facing channels: latest reading cell and session event bus
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch};
use tracing::{error, info, warn};

use crate::domain::reading::ValidatedReading;

/// Single-writer cell holding the most recent completed reading. The
/// ingestion session is the only writer; dashboards, maps and other
/// consumers hold `watch::Receiver`s and observe read-only.
#[derive(Debug)]
pub struct LiveFeed {
    tx: watch::Sender<Option<ValidatedReading>>,
}

impl LiveFeed {
    pub fn channel() -> (Self, watch::Receiver<Option<ValidatedReading>>) {
        let (tx, rx) = watch::channel(None);
        (Self { tx }, rx)
    }

    pub fn publish(&self, reading: ValidatedReading) {
        // Consumers may come and go; publishing with none attached is fine.
        let _ = self.tx.send(Some(reading));
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<ValidatedReading>> {
        self.tx.subscribe()
    }
}

/// Out-of-band notifications from the ingestion session for operator
/// surfaces; these never loop back into pipeline control flow. `BatchLost`
/// means the batch already left memory, so the loss is shown, not retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    BatchPersisted { rows: usize },
    BatchLost { rows: usize, reason: String },
}

pub type EventSender = broadcast::Sender<SessionEvent>;

/// Mirror session events into the operator log until the bus closes. A
/// mirror that falls behind skips what it missed and keeps going; only a
/// closed bus ends it.
pub async fn mirror_events(mut events: broadcast::Receiver<SessionEvent>) {
    loop {
        match events.recv().await {
            Ok(SessionEvent::BatchPersisted { rows }) => info!(rows, "batch persisted"),
            Ok(SessionEvent::BatchLost { rows, reason }) => {
                error!(rows, reason = %reason, "batch lost");
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "event mirror fell behind the bus");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

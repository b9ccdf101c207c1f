// Ingestion session - drives fragments through framing, extraction and batching
use std::sync::Arc;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio::task::JoinSet;
use tracing::{debug, error, info, trace};

use crate::application::batcher::ReadingBatcher;
use crate::application::reading_store::ReadingStore;
use crate::domain::device::DeviceInfo;
use crate::domain::reading::SoilReading;
use crate::presentation::live::{EventSender, LiveFeed, SessionEvent};
use crate::protocol::accumulator::ReadingAccumulator;
use crate::protocol::extractor;
use crate::protocol::framer::LineFramer;

/// One transport connection's worth of ingestion state. The session owns
/// the framer, accumulator and batcher exclusively: fragments enter through
/// `&mut self` and `shutdown` consumes the session, so a second writer or a
/// fragment arriving after teardown is unrepresentable.
pub struct IngestSession {
    framer: LineFramer,
    accumulator: ReadingAccumulator,
    batcher: ReadingBatcher,
    store: Arc<dyn ReadingStore>,
    live: LiveFeed,
    events: EventSender,
    flushes: JoinSet<()>,
}

impl IngestSession {
    pub fn new(
        device: DeviceInfo,
        batcher: ReadingBatcher,
        store: Arc<dyn ReadingStore>,
        live: LiveFeed,
        events: EventSender,
    ) -> Self {
        Self {
            framer: LineFramer::new(),
            accumulator: ReadingAccumulator::new(device),
            batcher,
            store,
            live,
            events,
            flushes: JoinSet::new(),
        }
    }

    /// Feed one raw transport fragment through the pipeline. Runs
    /// synchronously, which keeps readings in arrival order without any
    /// cross-task coordination.
    pub fn handle_fragment(&mut self, chunk: &[u8]) {
        for line in self.framer.feed(chunk) {
            let fields = extractor::extract(&line);
            if fields.is_empty() {
                trace!(line = %line, "line carried no recognized fields");
                continue;
            }
            let Some(reading) = self.accumulator.observe(fields) else {
                continue;
            };
            let validated = reading.validate();
            // Live consumers see every completed reading, fix or no fix.
            self.live.publish(validated.clone());
            if !validated.is_valid {
                debug!("reading has no usable GPS fix, kept out of persisted history");
                continue;
            }
            if let Some(batch) = self.batcher.push(validated.reading) {
                self.dispatch(batch);
            }
        }
    }

    /// Hand a full batch to the store on its own task. At-most-once: the
    /// batch leaves the buffer before the outcome is known, and a failed
    /// insert is surfaced as `BatchLost` rather than retried.
    fn dispatch(&mut self, batch: Vec<SoilReading>) {
        // Reap finished flush tasks so the set stays bounded on a session
        // that streams for days.
        while self.flushes.try_join_next().is_some() {}

        let rows = batch.len();
        let store = Arc::clone(&self.store);
        let events = self.events.clone();
        info!(rows, "flushing batch to reading store");
        self.flushes.spawn(async move {
            match store.insert_batch(&batch).await {
                Ok(()) => {
                    let _ = events.send(SessionEvent::BatchPersisted { rows });
                }
                Err(err) => {
                    error!(rows, error = %err, "batch lost, store insert failed");
                    let _ = events.send(SessionEvent::BatchLost {
                        rows,
                        reason: err.to_string(),
                    });
                }
            }
        });
    }

    /// Tear the session down after the transport closed. Buffered readings
    /// are force-flushed even mid-batch; a half-assembled reading is
    /// dropped; in-flight store calls are awaited, never cancelled.
    pub async fn shutdown(mut self) {
        if !self.batcher.is_empty() {
            let rest = self.batcher.drain();
            info!(rows = rest.len(), "transport closed with readings buffered, forcing flush");
            self.dispatch(rest);
        }
        if self.accumulator.has_partial() {
            debug!("discarding half-assembled reading at disconnect");
            self.accumulator.reset();
        }
        if self.framer.pending_len() > 0 {
            debug!(
                bytes = self.framer.pending_len(),
                "discarding unterminated partial line at disconnect"
            );
            self.framer.reset();
        }
        while self.flushes.join_next().await.is_some() {}
        info!("ingest session closed");
    }
}

/// Drive a session from a fragment stream until the transport closes; the
/// stream ending is the disconnect signal.
pub async fn run_session<S>(mut fragments: S, mut session: IngestSession)
where
    S: Stream<Item = Bytes> + Unpin,
{
    while let Some(chunk) = fragments.next().await {
        session.handle_fragment(&chunk);
    }
    session.shutdown().await;
}

// Store port for persisted soil readings
use async_trait::async_trait;
use thiserror::Error;

use crate::domain::reading::SoilReading;

/// Failure modes of the persistence backend. Delivery is at-most-once per
/// batch: by the time a call fails the batch has already left the buffer,
/// so callers surface the loss instead of retrying.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be reached at all (DNS, TCP, TLS, timeout).
    #[error("reading store unreachable: {0}")]
    Unreachable(String),

    /// The backend answered but refused the request.
    #[error("reading store rejected the request (status {status}): {detail}")]
    Rejected { status: u16, detail: String },

    /// The backend answered with rows this client cannot interpret.
    #[error("reading store returned an unreadable row: {0}")]
    InvalidRow(String),
}

#[async_trait]
pub trait ReadingStore: Send + Sync {
    /// Durably append one ordered batch of readings
    async fn insert_batch(&self, batch: &[SoilReading]) -> Result<(), StoreError>;

    /// Fetch the most recently persisted readings, newest first (for
    /// history consumers; the ingestion path never reads)
    async fn fetch_recent(&self, limit: usize) -> Result<Vec<SoilReading>, StoreError>;
}

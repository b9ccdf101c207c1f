// Batch buffer - bounded accumulation of validated readings
use crate::domain::reading::SoilReading;

/// What happens after a full batch is handed off. `Continuous` keeps
/// cycling; `SingleBatch` collects one batch and ignores further readings
/// until `reset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlushPolicy {
    #[default]
    Continuous,
    SingleBatch,
}

/// In-memory bounded queue of readings awaiting persistence. Between
/// flushes the length stays below the threshold; the append that reaches it
/// drains the buffer and returns the batch. The sensor streams even when
/// physically idle, so unchanged consecutive readings are suppressed.
#[derive(Debug)]
pub struct ReadingBatcher {
    buffer: Vec<SoilReading>,
    threshold: usize,
    policy: FlushPolicy,
    completed: bool,
    last_key: Option<[Option<f64>; 7]>,
}

impl ReadingBatcher {
    pub fn new(threshold: usize, policy: FlushPolicy) -> Self {
        let threshold = threshold.max(1);
        Self {
            buffer: Vec::with_capacity(threshold),
            threshold,
            policy,
            completed: false,
            last_key: None,
        }
    }

    /// Append one valid reading. Returns the full batch when this append
    /// reached the threshold, `None` otherwise (also when the reading was
    /// suppressed as a duplicate or the buffer is completed).
    pub fn push(&mut self, reading: SoilReading) -> Option<Vec<SoilReading>> {
        if self.completed {
            tracing::debug!("sample batch already collected, ignoring reading");
            return None;
        }

        let key = reading.fields.sample_key();
        if self.last_key == Some(key) {
            tracing::trace!("suppressing unchanged telemetry burst");
            return None;
        }
        self.last_key = Some(key);

        self.buffer.push(reading);
        if self.buffer.len() < self.threshold {
            return None;
        }
        if self.policy == FlushPolicy::SingleBatch {
            self.completed = true;
        }
        Some(std::mem::take(&mut self.buffer))
    }

    /// Take whatever is buffered, however little; the forced flush on
    /// disconnect. May return an empty vec.
    pub fn drain(&mut self) -> Vec<SoilReading> {
        std::mem::take(&mut self.buffer)
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// True once a `SingleBatch` buffer has collected its sample.
    #[allow(dead_code)]
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Re-arm a completed buffer and forget the duplicate-suppression state.
    #[allow(dead_code)]
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.completed = false;
        self.last_key = None;
    }
}

// Reading accumulator - merges per-line fields into whole readings
use chrono::Utc;

use crate::domain::device::DeviceInfo;
use crate::domain::reading::{FieldSet, SoilReading};

/// Builds one reading at a time from the fields extracted line by line.
/// The firmware has no explicit burst framing but always emits pH last, so
/// observing pH is the reading boundary.
#[derive(Debug)]
pub struct ReadingAccumulator {
    device: DeviceInfo,
    current: FieldSet,
}

impl ReadingAccumulator {
    pub fn new(device: DeviceInfo) -> Self {
        Self {
            device,
            current: FieldSet::default(),
        }
    }

    /// Fold one line's fields into the in-progress reading, last seen wins.
    /// When the merged set contains pH, snapshot with capture time and
    /// device identity, clear, and return the completed reading.
    pub fn observe(&mut self, fields: FieldSet) -> Option<SoilReading> {
        self.current.merge(&fields);
        if self.current.ph.is_none() {
            return None;
        }
        let completed = SoilReading::new(self.current, &self.device, Utc::now());
        self.current = FieldSet::default();
        Some(completed)
    }

    pub fn has_partial(&self) -> bool {
        !self.current.is_empty()
    }

    /// Discard the in-progress reading; one whose pH never arrived before
    /// disconnect is dropped, not persisted.
    pub fn reset(&mut self) {
        self.current = FieldSet::default();
    }
}

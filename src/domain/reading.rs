// Soil reading domain models
use chrono::{DateTime, Utc};

use crate::domain::device::DeviceInfo;

/// Measurement kinds the sensor protocol can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Latitude,
    Longitude,
    Bearing,
    Satellites,
    Nitrogen,
    Phosphorus,
    Potassium,
    Ph,
    Moisture,
    Temperature,
    Humidity,
    Conductivity,
}

/// One optional slot per recognized field kind. `None` means the sensor
/// never reported the field; absence and zero stay distinguishable.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FieldSet {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub bearing: Option<f64>,
    pub satellites: Option<u32>,
    pub nitrogen: Option<f64>,
    pub phosphorus: Option<f64>,
    pub potassium: Option<f64>,
    pub ph: Option<f64>,
    pub moisture: Option<f64>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub conductivity: Option<f64>,
}

impl FieldSet {
    pub fn set(&mut self, kind: FieldKind, value: f64) {
        match kind {
            FieldKind::Latitude => self.latitude = Some(value),
            FieldKind::Longitude => self.longitude = Some(value),
            FieldKind::Bearing => self.bearing = Some(value),
            // Satellite counts arrive as plain integers; noise is clamped.
            FieldKind::Satellites => self.satellites = Some(value.round().max(0.0) as u32),
            FieldKind::Nitrogen => self.nitrogen = Some(value),
            FieldKind::Phosphorus => self.phosphorus = Some(value),
            FieldKind::Potassium => self.potassium = Some(value),
            FieldKind::Ph => self.ph = Some(value),
            FieldKind::Moisture => self.moisture = Some(value),
            FieldKind::Temperature => self.temperature = Some(value),
            FieldKind::Humidity => self.humidity = Some(value),
            FieldKind::Conductivity => self.conductivity = Some(value),
        }
    }

    /// Overlay `other` on top of `self`: present fields win, absent fields
    /// keep whatever `self` had.
    pub fn merge(&mut self, other: &FieldSet) {
        self.latitude = other.latitude.or(self.latitude);
        self.longitude = other.longitude.or(self.longitude);
        self.bearing = other.bearing.or(self.bearing);
        self.satellites = other.satellites.or(self.satellites);
        self.nitrogen = other.nitrogen.or(self.nitrogen);
        self.phosphorus = other.phosphorus.or(self.phosphorus);
        self.potassium = other.potassium.or(self.potassium);
        self.ph = other.ph.or(self.ph);
        self.moisture = other.moisture.or(self.moisture);
        self.temperature = other.temperature.or(self.temperature);
        self.humidity = other.humidity.or(self.humidity);
        self.conductivity = other.conductivity.or(self.conductivity);
    }

    pub fn is_empty(&self) -> bool {
        *self == FieldSet::default()
    }

    /// The displayed fields compared for duplicate suppression, in a fixed
    /// order. `None` compares equal to `None`.
    pub fn sample_key(&self) -> [Option<f64>; 7] {
        [
            self.latitude,
            self.longitude,
            self.nitrogen,
            self.phosphorus,
            self.potassium,
            self.ph,
            self.moisture,
        ]
    }
}

/// A completed telemetry reading, snapshotted when the terminal pH field
/// was observed.
#[derive(Debug, Clone, PartialEq)]
pub struct SoilReading {
    pub fields: FieldSet,
    pub captured_at: DateTime<Utc>,
    pub device_id: String,
    pub device_name: String,
}

impl SoilReading {
    pub fn new(fields: FieldSet, device: &DeviceInfo, captured_at: DateTime<Utc>) -> Self {
        Self {
            fields,
            captured_at,
            device_id: device.id.clone(),
            device_name: device.name.clone(),
        }
    }

    /// A GPS module without satellite lock reports exactly (0, 0) or omits
    /// the coordinates entirely; both count as "no fix".
    pub fn has_gps_fix(&self) -> bool {
        match (self.fields.latitude, self.fields.longitude) {
            (Some(lat), Some(lon)) => !(lat == 0.0 && lon == 0.0),
            _ => false,
        }
    }

    pub fn validate(self) -> ValidatedReading {
        let is_valid = self.has_gps_fix();
        ValidatedReading {
            reading: self,
            is_valid,
        }
    }
}

/// A reading tagged with its GPS validity. Readings without a fix still
/// reach the live surface; they are only kept out of persisted history.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedReading {
    pub reading: SoilReading,
    pub is_valid: bool,
}

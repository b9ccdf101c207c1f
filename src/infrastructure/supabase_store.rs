// Supabase REST repository implementation
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::reading_store::{ReadingStore, StoreError};
use crate::domain::reading::{FieldSet, SoilReading};

#[derive(Debug, Clone)]
pub struct SupabaseStore {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    table: String,
    user_id: Option<String>,
}

/// One row of the readings table, column names matching the backing schema.
/// Every sensor column is nullable: a field the device never reported is
/// stored as NULL, never coerced to zero.
#[derive(Debug, Serialize, Deserialize)]
struct ReadingRow {
    latitude: Option<f64>,
    longitude: Option<f64>,
    satellite_count: Option<u32>,
    bearing: Option<f64>,
    nitrogen: Option<f64>,
    phosphorus: Option<f64>,
    potassium: Option<f64>,
    ph: Option<f64>,
    moisture: Option<f64>,
    temperature: Option<f64>,
    humidity: Option<f64>,
    soil_conductivity: Option<f64>,
    #[serde(default)]
    device_id: Option<String>,
    #[serde(default)]
    device_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl ReadingRow {
    fn from_reading(reading: &SoilReading, user_id: Option<&str>) -> Self {
        let fields = reading.fields;
        Self {
            latitude: fields.latitude,
            longitude: fields.longitude,
            satellite_count: fields.satellites,
            bearing: fields.bearing,
            nitrogen: fields.nitrogen,
            phosphorus: fields.phosphorus,
            potassium: fields.potassium,
            ph: fields.ph,
            // The dashboard shows moisture as a whole percentage.
            moisture: fields.moisture.map(|m| m.round()),
            temperature: fields.temperature,
            humidity: fields.humidity,
            soil_conductivity: fields.conductivity,
            device_id: Some(reading.device_id.clone()),
            device_name: Some(reading.device_name.clone()),
            user_id: user_id.map(|u| u.to_string()),
            created_at: reading.captured_at,
        }
    }

    fn into_reading(self) -> SoilReading {
        let fields = FieldSet {
            latitude: self.latitude,
            longitude: self.longitude,
            bearing: self.bearing,
            satellites: self.satellite_count,
            nitrogen: self.nitrogen,
            phosphorus: self.phosphorus,
            potassium: self.potassium,
            ph: self.ph,
            moisture: self.moisture,
            temperature: self.temperature,
            humidity: self.humidity,
            conductivity: self.soil_conductivity,
        };
        SoilReading {
            fields,
            captured_at: self.created_at,
            device_id: self.device_id.unwrap_or_default(),
            device_name: self.device_name.unwrap_or_default(),
        }
    }
}

impl SupabaseStore {
    pub fn new(url: String, api_key: String, table: String, user_id: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: url.trim_end_matches('/').to_string(),
            api_key,
            table,
            user_id,
        }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }
}

#[async_trait]
impl ReadingStore for SupabaseStore {
    async fn insert_batch(&self, batch: &[SoilReading]) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }

        let rows: Vec<ReadingRow> = batch
            .iter()
            .map(|reading| ReadingRow::from_reading(reading, self.user_id.as_deref()))
            .collect();

        let response = self
            .http
            .post(self.table_url())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=minimal")
            .json(&rows)
            .send()
            .await
            .map_err(|err| StoreError::Unreachable(err.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let detail = response.text().await.unwrap_or_default();
            return Err(StoreError::Rejected { status, detail });
        }

        Ok(())
    }

    async fn fetch_recent(&self, limit: usize) -> Result<Vec<SoilReading>, StoreError> {
        let response = self
            .http
            .get(self.table_url())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .query(&[
                ("select", "*".to_string()),
                ("order", "created_at.desc".to_string()),
                ("limit", limit.to_string()),
            ])
            .send()
            .await
            .map_err(|err| StoreError::Unreachable(err.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let detail = response.text().await.unwrap_or_default();
            return Err(StoreError::Rejected { status, detail });
        }

        let rows = response
            .json::<Vec<ReadingRow>>()
            .await
            .map_err(|err| StoreError::InvalidRow(err.to_string()))?;

        Ok(rows.into_iter().map(ReadingRow::into_reading).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::device::DeviceInfo;
    use crate::domain::reading::FieldKind;

    fn reading() -> SoilReading {
        let mut fields = FieldSet::default();
        fields.set(FieldKind::Latitude, 18.4967);
        fields.set(FieldKind::Longitude, 80.8866);
        fields.set(FieldKind::Satellites, 6.0);
        fields.set(FieldKind::Nitrogen, 23.0);
        fields.set(FieldKind::Ph, 7.5);
        fields.set(FieldKind::Moisture, 85.6);
        SoilReading::new(
            fields,
            &DeviceInfo::new("hc-05".to_string(), "Field Probe".to_string()),
            Utc::now(),
        )
    }

    #[test]
    fn test_row_uses_sink_column_names() {
        let row = ReadingRow::from_reading(&reading(), Some("farmer-7"));
        let json = serde_json::to_value(&row).unwrap();

        assert_eq!(json["latitude"], 18.4967);
        assert_eq!(json["satellite_count"], 6);
        assert_eq!(json["nitrogen"], 23.0);
        assert_eq!(json["ph"], 7.5);
        assert_eq!(json["device_id"], "hc-05");
        assert_eq!(json["user_id"], "farmer-7");
        assert!(json.get("created_at").is_some());
    }

    #[test]
    fn test_absent_fields_become_null_not_zero() {
        let row = ReadingRow::from_reading(&reading(), None);
        let json = serde_json::to_value(&row).unwrap();

        assert!(json["phosphorus"].is_null());
        assert!(json["humidity"].is_null());
        assert!(json["soil_conductivity"].is_null());
        assert_ne!(json["phosphorus"], 0.0);
    }

    #[test]
    fn test_moisture_rounds_to_whole_percent() {
        let row = ReadingRow::from_reading(&reading(), None);
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["moisture"], 86.0);
    }

    #[test]
    fn test_user_id_omitted_when_unset() {
        let row = ReadingRow::from_reading(&reading(), None);
        let json = serde_json::to_value(&row).unwrap();
        assert!(json.get("user_id").is_none());
    }

    #[test]
    fn test_table_url_trims_trailing_slash() {
        let store = SupabaseStore::new(
            "https://abc.supabase.co/".to_string(),
            "anon-key".to_string(),
            "raw_sensor_readings".to_string(),
            None,
        );
        assert_eq!(
            store.table_url(),
            "https://abc.supabase.co/rest/v1/raw_sensor_readings"
        );
    }

    #[test]
    fn test_fetched_row_maps_back_to_reading() {
        let json = serde_json::json!({
            "latitude": 18.49,
            "longitude": 80.88,
            "satellite_count": 5,
            "bearing": null,
            "nitrogen": 20.0,
            "phosphorus": null,
            "potassium": 31.0,
            "ph": 6.9,
            "moisture": 82.0,
            "temperature": null,
            "humidity": null,
            "soil_conductivity": null,
            "device_id": "hc-05",
            "device_name": "Field Probe",
            "user_id": null,
            "created_at": "2026-08-25T07:31:02+00:00"
        });

        let row: ReadingRow = serde_json::from_value(json).unwrap();
        let reading = row.into_reading();
        assert_eq!(reading.fields.satellites, Some(5));
        assert_eq!(reading.fields.phosphorus, None);
        assert_eq!(reading.device_name, "Field Probe");
        assert!(reading.has_gps_fix());
    }

    #[tokio::test]
    async fn test_fetch_recent_maps_connection_failure_to_unreachable() {
        // Nothing listens on the discard port.
        let store = SupabaseStore::new(
            "http://127.0.0.1:9".to_string(),
            "anon-key".to_string(),
            "raw_sensor_readings".to_string(),
            None,
        );

        let err = store.fetch_recent(3).await.expect_err("no backend to reach");
        assert!(matches!(err, StoreError::Unreachable(_)));
    }

    #[tokio::test]
    async fn test_fetch_recent_requests_newest_rows_and_decodes_them() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let served = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                if n == 0 || request.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }

            let body = serde_json::json!([{
                "latitude": 18.49,
                "longitude": 80.88,
                "satellite_count": 5,
                "bearing": null,
                "nitrogen": 20.0,
                "phosphorus": null,
                "potassium": 31.0,
                "ph": 6.9,
                "moisture": 82.0,
                "temperature": null,
                "humidity": null,
                "soil_conductivity": null,
                "device_id": "hc-05",
                "device_name": "Field Probe",
                "user_id": null,
                "created_at": "2026-08-25T07:31:02+00:00"
            }])
            .to_string();
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });

        let store = SupabaseStore::new(
            format!("http://{addr}"),
            "anon-key".to_string(),
            "raw_sensor_readings".to_string(),
            None,
        );

        let readings = store.fetch_recent(5).await.unwrap();
        let request = served.await.unwrap();

        assert!(request.starts_with("GET /rest/v1/raw_sensor_readings?"));
        assert!(request.contains("order=created_at.desc"));
        assert!(request.contains("limit=5"));
        assert!(request.contains("apikey: anon-key"));
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].fields.latitude, Some(18.49));
        assert_eq!(readings[0].fields.phosphorus, None);
        assert_eq!(readings[0].device_id, "hc-05");
    }
}

use serde::Deserialize;

use crate::application::batcher::FlushPolicy;
use crate::domain::device::DeviceInfo;

#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    pub supabase: SupabaseSettings,
    pub device: DeviceSettings,
    #[serde(default)]
    pub ingest: IngestSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SupabaseSettings {
    pub url: String,
    pub api_key: String,
    #[serde(default = "default_table")]
    pub table: String,
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DeviceSettings {
    pub port: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestSettings {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_flush_policy")]
    pub flush_policy: String,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            flush_policy: default_flush_policy(),
        }
    }
}

fn default_table() -> String {
    "raw_sensor_readings".to_string()
}

fn default_baud_rate() -> u32 {
    9600
}

fn default_batch_size() -> usize {
    10
}

fn default_flush_policy() -> String {
    "continuous".to_string()
}

impl DeviceSettings {
    pub fn info(&self) -> DeviceInfo {
        DeviceInfo::new(self.id.clone(), self.name.clone())
    }
}

impl IngestSettings {
    /// Unknown policy names fall back to continuous batching.
    pub fn policy(&self) -> FlushPolicy {
        match self.flush_policy.as_str() {
            "single-batch" => FlushPolicy::SingleBatch,
            _ => FlushPolicy::Continuous,
        }
    }
}

pub fn load_telemetry_config() -> anyhow::Result<TelemetryConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/telemetry"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

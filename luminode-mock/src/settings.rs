use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logger {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Broker {
    pub host: String,
    pub port: u16,
    pub keep_alive_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topics {
    pub stream: String,
    pub control: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mock {
    pub client_prefix: String,
    pub nodes: usize,
    pub interval_ms: u64,
    pub origin_lat: f64,
    pub origin_lng: f64,
    /// Share of ON readings that report a failed lamp, 0.0..=1.0.
    pub fault_ratio: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub logger: Logger,
    pub broker: Broker,
    pub topics: Topics,
    pub mock: Mock,
}

impl Settings {
    pub fn new() -> Result<Self, toml::de::Error> {
        toml::from_str(include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../",
            "configs/default.toml"
        )))
    }
}

use std::env;

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logger {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Broker {
    pub host: String,
    pub port: u16,
    /// A random `_XXXX` suffix is appended per session.
    pub client_prefix: String,
    pub keep_alive_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topics {
    /// Telemetry published by the nodes.
    pub stream: String,
    /// Commands published by the console.
    pub control: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Billing {
    pub tariff_per_kwh: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub logger: Logger,
    pub broker: Broker,
    pub topics: Topics,
    pub billing: Billing,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or("development".into());

        Config::builder()
            .add_source(File::with_name("configs/default"))
            .add_source(File::with_name(&format!("configs/{run_mode}")).required(false))
            .add_source(Environment::with_prefix("LUMINODE").separator("__"))
            .build()?
            .try_deserialize()
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::from_toml(include_str!("../../../configs/default.toml")).unwrap();

        assert_eq!(settings.broker.port, 1883);
        assert_eq!(settings.broker.keep_alive_secs, 60);
        assert_eq!(settings.topics.stream, "luminode/v4/stream");
        assert_eq!(settings.topics.control, "luminode/v4/control");
        assert_eq!(settings.billing.tariff_per_kwh, 1600.0);
    }

    #[test]
    fn test_missing_section_is_rejected() {
        assert!(Settings::from_toml("[logger]\nlevel = \"debug\"\n").is_err());
    }
}

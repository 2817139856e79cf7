use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Node id given to telemetry that arrives without one.
pub const UNKNOWN_NODE: &str = "Unknown";

/// Most recent record per node, ordered by node id.
pub type LatestStateMap = BTreeMap<String, TelemetryRecord>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeStatus {
    On,
    #[default]
    Off,
    /// Any status string the console does not interpret.
    Other(String),
}

impl NodeStatus {
    pub fn as_str(&self) -> &str {
        match self {
            NodeStatus::On => "ON",
            NodeStatus::Off => "OFF",
            NodeStatus::Other(status) => status,
        }
    }
}

impl From<String> for NodeStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "ON" => NodeStatus::On,
            "OFF" => NodeStatus::Off,
            _ => NodeStatus::Other(value),
        }
    }
}

impl From<&str> for NodeStatus {
    fn from(value: &str) -> Self {
        NodeStatus::from(value.to_string())
    }
}

impl From<NodeStatus> for String {
    fn from(value: NodeStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum FaultCode {
    #[default]
    Nominal,
    /// Lamp reports ON while drawing negligible power.
    LampFailure,
}

impl FaultCode {
    pub fn code(self) -> u8 {
        match self {
            FaultCode::Nominal => 0,
            FaultCode::LampFailure => 4,
        }
    }

    pub fn is_fault(self) -> bool {
        self != FaultCode::Nominal
    }
}

impl From<FaultCode> for u8 {
    fn from(value: FaultCode) -> Self {
        value.code()
    }
}

impl TryFrom<u8> for FaultCode {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(FaultCode::Nominal),
            4 => Ok(FaultCode::LampFailure),
            other => Err(format!("unknown fault code {other}")),
        }
    }
}

/// One message from one node at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryRecord {
    /// Reporting node.
    pub node_id: String,
    /// Sample time, or ingestion time when the node sent none.
    pub timestamp: OffsetDateTime,
    /// Supply voltage in V.
    pub voltage: f64,
    /// Lamp current in A.
    pub current: f64,
    /// Lamp power in W.
    pub power: f64,
    /// Ambient illuminance in lx.
    pub lux: f64,
    /// Lamp state reported by the node.
    pub status: NodeStatus,
    /// Cumulative energy in kWh.
    pub energy_total: f64,
    /// Derived on ingestion.
    pub fault_code: FaultCode,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl TelemetryRecord {
    pub fn new(node_id: impl Into<String>, timestamp: OffsetDateTime) -> Self {
        Self {
            node_id: node_id.into(),
            timestamp,
            voltage: 0.0,
            current: 0.0,
            power: 0.0,
            lux: 0.0,
            status: NodeStatus::default(),
            energy_total: 0.0,
            fault_code: FaultCode::default(),
            lat: None,
            lng: None,
        }
    }

    pub fn with_status(mut self, status: NodeStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_power(mut self, power: f64) -> Self {
        self.power = power;
        self
    }

    pub fn position(&self) -> Option<(f64, f64)> {
        self.lat.zip(self.lng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_string() {
        assert_eq!(NodeStatus::from("ON"), NodeStatus::On);
        assert_eq!(NodeStatus::from("OFF"), NodeStatus::Off);
        assert_eq!(NodeStatus::from("on"), NodeStatus::Other("on".to_string()));
        assert_eq!(NodeStatus::from("DIMMED").as_str(), "DIMMED");
    }

    #[test]
    fn test_fault_code_wire_value() {
        assert_eq!(serde_json::to_string(&FaultCode::LampFailure).unwrap(), "4");
        assert_eq!(serde_json::from_str::<FaultCode>("0").unwrap(), FaultCode::Nominal);
        assert!(serde_json::from_str::<FaultCode>("2").is_err());
    }
}

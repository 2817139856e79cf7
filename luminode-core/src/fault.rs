use crate::models::{FaultCode, NodeStatus, TelemetryRecord};

/// Below this draw (W) a lit lamp is considered failed.
pub const MIN_ON_POWER: f64 = 0.5;

pub fn classify(record: &TelemetryRecord) -> FaultCode {
    if record.status == NodeStatus::On && record.power < MIN_ON_POWER {
        FaultCode::LampFailure
    } else {
        FaultCode::Nominal
    }
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use super::*;
    use crate::decoder;

    fn record(status: NodeStatus, power: f64) -> TelemetryRecord {
        TelemetryRecord::new("N1", OffsetDateTime::UNIX_EPOCH)
            .with_status(status)
            .with_power(power)
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(&record(NodeStatus::On, 0.2)), FaultCode::LampFailure);
        assert_eq!(classify(&record(NodeStatus::On, 5.0)), FaultCode::Nominal);
        assert_eq!(classify(&record(NodeStatus::Off, 0.0)), FaultCode::Nominal);
        assert_eq!(classify(&record(NodeStatus::On, 0.5)), FaultCode::Nominal);
        assert_eq!(classify(&record(NodeStatus::Other("DIM".into()), 0.0)), FaultCode::Nominal);
    }

    #[test]
    fn test_missing_power_on_lit_lamp_is_fault() {
        let lit = decoder::decode(br#"{"node_id": "N1", "status": "ON"}"#).unwrap();
        assert_eq!(classify(&lit).code(), 4);

        let garbled = decoder::decode(br#"{"node_id": "N1", "status": "ON", "power": "??"}"#).unwrap();
        assert_eq!(classify(&garbled).code(), 4);
    }
}

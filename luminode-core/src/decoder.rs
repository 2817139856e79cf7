use serde::Deserialize;
use serde_json::Value;
use time::format_description::well_known::{Iso8601, Rfc3339};
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

use crate::error::DecodeError;
use crate::models::{FaultCode, NodeStatus, TelemetryRecord, UNKNOWN_NODE};

/// Wire shape of a telemetry message. Every field is optional and loosely typed.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TelemetryPayload {
    node_id: Option<Value>,
    timestamp: Option<Value>,
    voltage: Option<Value>,
    current: Option<Value>,
    power: Option<Value>,
    lux: Option<Value>,
    status: Option<Value>,
    energy_total: Option<Value>,
    lat: Option<Value>,
    lng: Option<Value>,
}

/// Decode a raw payload, stamping it with the current instant when it carries no usable timestamp.
pub fn decode(payload: &[u8]) -> Result<TelemetryRecord, DecodeError> {
    decode_at(payload, OffsetDateTime::now_utc())
}

pub fn decode_at(payload: &[u8], received_at: OffsetDateTime) -> Result<TelemetryRecord, DecodeError> {
    let text = std::str::from_utf8(payload)?;
    let value: Value = serde_json::from_str(text)?;

    if !value.is_object() {
        return Err(DecodeError::NotAnObject);
    }

    let payload: TelemetryPayload = serde_json::from_value(value)?;

    Ok(TelemetryRecord {
        node_id: node_id(payload.node_id),
        timestamp: payload.timestamp
            .as_ref()
            .and_then(timestamp)
            .unwrap_or(received_at),
        voltage: number(payload.voltage.as_ref()).unwrap_or_default(),
        current: number(payload.current.as_ref()).unwrap_or_default(),
        power: number(payload.power.as_ref()).unwrap_or_default(),
        lux: number(payload.lux.as_ref()).unwrap_or_default(),
        status: match payload.status {
            Some(Value::String(status)) => NodeStatus::from(status),
            Some(Value::Null) | None => NodeStatus::Off,
            Some(other) => NodeStatus::Other(other.to_string()),
        },
        energy_total: number(payload.energy_total.as_ref()).unwrap_or_default(),
        fault_code: FaultCode::Nominal,
        lat: number(payload.lat.as_ref()),
        lng: number(payload.lng.as_ref()),
    })
}

/// Parse a textual timestamp in any of the accepted layouts. Offset-less times are taken as UTC.
pub fn parse_timestamp(text: &str) -> Option<OffsetDateTime> {
    let text = text.trim();

    let canonical = format_description!("[year]-[month]-[day] [hour]:[minute]:[second][optional [.[subsecond]]]");
    if let Ok(datetime) = PrimitiveDateTime::parse(text, canonical) {
        return Some(datetime.assume_utc());
    }

    OffsetDateTime::parse(text, &Rfc3339)
        .or_else(|_| OffsetDateTime::parse(text, &Iso8601::DEFAULT))
        .ok()
        .or_else(|| PrimitiveDateTime::parse(text, &Iso8601::DEFAULT).ok().map(PrimitiveDateTime::assume_utc))
        .or_else(|| Date::parse(text, &Iso8601::DEFAULT).ok().map(|date| date.midnight().assume_utc()))
}

fn timestamp(value: &Value) -> Option<OffsetDateTime> {
    match value {
        Value::String(text) => parse_timestamp(text),
        Value::Number(seconds) => {
            let seconds = seconds.as_f64().filter(|s| s.is_finite())?;
            OffsetDateTime::from_unix_timestamp_nanos((seconds * 1e9) as i128).ok()
        }
        _ => None,
    }
}

fn node_id(value: Option<Value>) -> String {
    match value {
        Some(Value::String(id)) => id,
        Some(Value::Null) | None => UNKNOWN_NODE.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Lenient numeric coercion: numbers and numeric strings pass, everything else is absent.
fn number(value: Option<&Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        _ => None,
    };

    number.filter(|n| n.is_finite())
}

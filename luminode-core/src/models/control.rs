use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const DEFAULT_LUX_THRESHOLD: u16 = 300;
pub const MAX_LUX_THRESHOLD: u16 = 1000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlMode {
    /// Lamp follows ambient light against the lux threshold.
    #[default]
    #[serde(rename = "AUTO", alias = "AUTO (Lux)")]
    Auto,
    /// Lamp follows explicit ON/OFF commands.
    #[serde(rename = "MANUAL")]
    Manual,
    /// Lamp is lit inside the schedule window.
    #[serde(rename = "SCHEDULED")]
    Scheduled,
}

impl ControlMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ControlMode::Auto => "AUTO",
            ControlMode::Manual => "MANUAL",
            ControlMode::Scheduled => "SCHEDULED",
        }
    }
}

impl fmt::Display for ControlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ControlMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AUTO" | "AUTO (LUX)" => Ok(ControlMode::Auto),
            "MANUAL" => Ok(ControlMode::Manual),
            "SCHEDULED" => Ok(ControlMode::Scheduled),
            other => Err(format!("unknown control mode: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwitchState {
    #[serde(rename = "ON")]
    On,
    #[serde(rename = "OFF")]
    Off,
}

impl SwitchState {
    pub fn as_str(self) -> &'static str {
        match self {
            SwitchState::On => "ON",
            SwitchState::Off => "OFF",
        }
    }
}

/// Whole hour of the day, rendered as `HH:00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ScheduleHour(u8);

impl ScheduleHour {
    pub fn new(hour: u8) -> Option<Self> {
        (hour < 24).then_some(Self(hour))
    }

    pub fn hour(self) -> u8 {
        self.0
    }
}

impl fmt::Display for ScheduleHour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:00", self.0)
    }
}

impl FromStr for ScheduleHour {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let hour = match s.split_once(':') {
            Some((hour, "00")) => hour,
            Some(_) => return Err(format!("schedule must be on the hour: {s}")),
            None => s,
        };

        hour.parse::<u8>()
            .ok()
            .and_then(ScheduleHour::new)
            .ok_or_else(|| format!("invalid schedule hour: {s}"))
    }
}

impl TryFrom<String> for ScheduleHour {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ScheduleHour> for String {
    fn from(value: ScheduleHour) -> Self {
        value.to_string()
    }
}

/// Operator-configured control parameters of one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlState {
    pub mode: ControlMode,
    /// Lux level below which an AUTO lamp lights, 0..=1000.
    pub lux_threshold: u16,
    pub schedule_start: ScheduleHour,
    pub schedule_end: ScheduleHour,
}

impl ControlState {
    /// Whether `hour` falls inside the schedule window; windows may wrap past midnight.
    pub fn schedule_active(&self, hour: u8) -> bool {
        let start = self.schedule_start.hour();
        let end = self.schedule_end.hour();

        if start <= end {
            (start..end).contains(&hour)
        } else {
            hour >= start || hour < end
        }
    }
}

impl Default for ControlState {
    fn default() -> Self {
        Self {
            mode: ControlMode::Auto,
            lux_threshold: DEFAULT_LUX_THRESHOLD,
            schedule_start: ScheduleHour(18),
            schedule_end: ScheduleHour(6),
        }
    }
}

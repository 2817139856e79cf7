use std::time::Duration;

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::Serialize;

use luminode_core::models::{ControlMode, ControlState, MAX_LUX_THRESHOLD, NodeCommand, SwitchState};

use crate::simulate::{NOMINAL_VOLTAGE, RATED_POWER};

const VOLTAGE_SIGMA: f64 = 1.5;

/// One telemetry message, in the shape the console decodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeReading {
    pub node_id: String,
    pub timestamp: String,
    pub voltage: f64,
    pub current: f64,
    pub power: f64,
    pub lux: f64,
    pub status: SwitchState,
    pub energy_total: f64,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone)]
pub struct SimulatedNode {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    pub control: ControlState,
    /// Last ON/OFF command, used in MANUAL mode.
    pub switch: SwitchState,
    /// Cumulative consumption in kWh.
    pub energy_total: f64,
}

impl SimulatedNode {
    pub fn new(id: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            id: id.into(),
            lat,
            lng,
            control: ControlState::default(),
            switch: SwitchState::Off,
            energy_total: 0.0,
        }
    }

    pub fn apply(&mut self, command: &NodeCommand) {
        if let Some(mode) = command.mode_update.or(command.mode) {
            self.control.mode = mode;
        }
        if let Some(threshold) = command.lux_threshold {
            self.control.lux_threshold = threshold.min(MAX_LUX_THRESHOLD);
        }
        if let Some(switch) = command.command {
            self.switch = switch;
        }
        if let Some(start) = command.schedule_start {
            self.control.schedule_start = start;
        }
        if let Some(end) = command.schedule_end {
            self.control.schedule_end = end;
        }

        tracing::info!(node = %self.id, mode = %self.control.mode, "applied command");
    }

    pub fn lamp_state(&self, ambient_lux: f64, hour: u8) -> SwitchState {
        let on = match self.control.mode {
            ControlMode::Auto => ambient_lux < f64::from(self.control.lux_threshold),
            ControlMode::Manual => self.switch == SwitchState::On,
            ControlMode::Scheduled => self.control.schedule_active(hour),
        };

        if on { SwitchState::On } else { SwitchState::Off }
    }

    /// Produce the next reading. A `failing` lamp that is ON draws next to nothing.
    pub fn sample<R: Rng + ?Sized>(
        &mut self,
        timestamp: &str,
        hour: u8,
        elapsed: Duration,
        ambient_lux: f64,
        failing: bool,
        rng: &mut R,
    ) -> NodeReading {
        let status = self.lamp_state(ambient_lux, hour);
        let voltage = Normal::new(NOMINAL_VOLTAGE, VOLTAGE_SIGMA)
            .map(|normal| normal.sample(rng))
            .unwrap_or(NOMINAL_VOLTAGE);

        let power = match status {
            SwitchState::On if failing => rng.random_range(0.0..0.3),
            SwitchState::On => RATED_POWER * rng.random_range(0.95..1.05),
            SwitchState::Off => 0.0,
        };

        self.energy_total += power * elapsed.as_secs_f64() / 3600.0 / 1000.0;

        NodeReading {
            node_id: self.id.clone(),
            timestamp: timestamp.to_string(),
            voltage: round_to(voltage, 1),
            current: round_to(power / voltage, 3),
            power: round_to(power, 2),
            lux: round_to(ambient_lux, 1),
            status,
            energy_total: round_to(self.energy_total, 4),
            lat: self.lat,
            lng: self.lng,
        }
    }
}

fn round_to(value: f64, digits: i32) -> f64 {
    let scale = 10f64.powi(digits);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use luminode_core::models::ScheduleHour;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn command(json: &str) -> NodeCommand {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_auto_follows_threshold() {
        let node = SimulatedNode::new("NODE-01", 0.0, 0.0);

        assert_eq!(node.lamp_state(120.0, 12), SwitchState::On);
        assert_eq!(node.lamp_state(450.0, 12), SwitchState::Off);
    }

    #[test]
    fn test_manual_switch() {
        let mut node = SimulatedNode::new("NODE-01", 0.0, 0.0);
        node.apply(&command(r#"{"node_id":"NODE-01","command":"ON","mode":"MANUAL"}"#));

        assert_eq!(node.control.mode, ControlMode::Manual);
        assert_eq!(node.lamp_state(800.0, 12), SwitchState::On);

        node.apply(&command(r#"{"node_id":"NODE-01","command":"OFF","mode":"MANUAL"}"#));
        assert_eq!(node.lamp_state(0.0, 12), SwitchState::Off);
    }

    #[test]
    fn test_schedule_wraps_midnight() {
        let mut node = SimulatedNode::new("NODE-01", 0.0, 0.0);
        node.apply(&command(
            r#"{"node_id":"NODE-01","mode":"SCHEDULED","schedule_start":"19:00","schedule_end":"05:00"}"#,
        ));

        assert_eq!(node.control.schedule_start, ScheduleHour::new(19).unwrap());
        assert_eq!(node.lamp_state(800.0, 23), SwitchState::On);
        assert_eq!(node.lamp_state(800.0, 3), SwitchState::On);
        assert_eq!(node.lamp_state(0.0, 12), SwitchState::Off);
    }

    #[test]
    fn test_threshold_is_clamped() {
        let mut node = SimulatedNode::new("NODE-01", 0.0, 0.0);
        node.apply(&command(r#"{"node_id":"NODE-01","lux_threshold":5000}"#));

        assert_eq!(node.control.lux_threshold, MAX_LUX_THRESHOLD);
    }

    #[test]
    fn test_sample_accumulates_energy() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut node = SimulatedNode::new("NODE-01", -6.2, 106.8);

        let reading = node.sample("2024-01-01 20:00:00", 20, Duration::from_secs(3600), 2.0, false, &mut rng);
        assert_eq!(reading.status, SwitchState::On);
        assert!(reading.power >= 57.0 && reading.power <= 63.0);
        assert!(reading.energy_total > 0.05 && reading.energy_total < 0.07);

        let failed = node.sample("2024-01-01 20:00:02", 20, Duration::from_secs(2), 2.0, true, &mut rng);
        assert!(failed.power < 0.5);

        let off = node.sample("2024-01-01 12:00:00", 12, Duration::from_secs(2), 800.0, false, &mut rng);
        assert_eq!(off.status, SwitchState::Off);
        assert_eq!(off.power, 0.0);
    }
}

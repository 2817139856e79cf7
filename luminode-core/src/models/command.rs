use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use super::{ControlMode, ScheduleHour, SwitchState};

/// Operator intent addressed to one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Switch the node to another control mode.
    ModeUpdate(ControlMode),
    /// Change the AUTO mode lux threshold.
    LuxThreshold(u16),
    /// Force the lamp on or off; implies MANUAL mode.
    Switch(SwitchState),
    /// Enable SCHEDULED mode with the given window.
    Schedule {
        start: ScheduleHour,
        end: ScheduleHour,
    },
}

/// Wire form of a command: `node_id` first, then the command fields.
#[derive(Debug, Clone, Copy)]
pub struct CommandMessage<'a> {
    pub node_id: &'a str,
    pub command: &'a Command,
}

impl Serialize for CommandMessage<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("node_id", self.node_id)?;

        match self.command {
            Command::ModeUpdate(mode) => {
                map.serialize_entry("mode_update", mode)?;
            }
            Command::LuxThreshold(threshold) => {
                map.serialize_entry("lux_threshold", threshold)?;
            }
            Command::Switch(state) => {
                map.serialize_entry("command", state)?;
                map.serialize_entry("mode", &ControlMode::Manual)?;
            }
            Command::Schedule { start, end } => {
                map.serialize_entry("mode", &ControlMode::Scheduled)?;
                map.serialize_entry("schedule_start", start)?;
                map.serialize_entry("schedule_end", end)?;
            }
        }

        map.end()
    }
}

/// Command as seen by a node on the control channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NodeCommand {
    pub node_id: String,
    #[serde(default)]
    pub mode_update: Option<ControlMode>,
    #[serde(default)]
    pub lux_threshold: Option<u16>,
    #[serde(default)]
    pub command: Option<SwitchState>,
    #[serde(default)]
    pub mode: Option<ControlMode>,
    #[serde(default)]
    pub schedule_start: Option<ScheduleHour>,
    #[serde(default)]
    pub schedule_end: Option<ScheduleHour>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(node_id: &str, command: Command) -> String {
        serde_json::to_string(&CommandMessage { node_id, command: &command }).unwrap()
    }

    #[test]
    fn test_command_wire_shapes() {
        assert_eq!(
            encode("N1", Command::ModeUpdate(ControlMode::Scheduled)),
            r#"{"node_id":"N1","mode_update":"SCHEDULED"}"#
        );
        assert_eq!(
            encode("N1", Command::LuxThreshold(450)),
            r#"{"node_id":"N1","lux_threshold":450}"#
        );
        assert_eq!(
            encode("N1", Command::Switch(SwitchState::Off)),
            r#"{"node_id":"N1","command":"OFF","mode":"MANUAL"}"#
        );
        assert_eq!(
            encode("N1", Command::Schedule {
                start: ScheduleHour::new(19).unwrap(),
                end: ScheduleHour::new(5).unwrap(),
            }),
            r#"{"node_id":"N1","mode":"SCHEDULED","schedule_start":"19:00","schedule_end":"05:00"}"#
        );
    }

    #[test]
    fn test_node_command_parse() {
        let command: NodeCommand = serde_json::from_str(
            r#"{"node_id":"N2","mode":"SCHEDULED","schedule_start":"20:00","schedule_end":"04:00"}"#,
        ).unwrap();

        assert_eq!(command.node_id, "N2");
        assert_eq!(command.mode, Some(ControlMode::Scheduled));
        assert_eq!(command.schedule_start, ScheduleHour::new(20));
        assert_eq!(command.command, None);

        let legacy: NodeCommand = serde_json::from_str(r#"{"node_id":"N2","mode_update":"AUTO (Lux)"}"#).unwrap();
        assert_eq!(legacy.mode_update, Some(ControlMode::Auto));
    }
}

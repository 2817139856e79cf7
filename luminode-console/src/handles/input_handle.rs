use std::str::FromStr;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use luminode_core::models::{ControlMode, ScheduleHour, SwitchState};
use luminode_core::view::{AnalyticsPeriod, NodeFilter, Page};

/// One operator action, typed on stdin as a single line.
#[derive(Debug, Clone, PartialEq)]
pub enum OperatorAction {
    ShowPage(Page),
    Filter(NodeFilter),
    Period(AnalyticsPeriod),
    Select(String),
    SetMode { node_id: String, mode: ControlMode },
    SetThreshold { node_id: String, threshold: u16 },
    Switch { node_id: String, state: SwitchState },
    SetSchedule { node_id: String, start: ScheduleHour, end: ScheduleHour },
    Quit,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Missing argument: {0}")]
    MissingArgument(&'static str),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl FromStr for OperatorAction {
    type Err = InputError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let verb = words.next().ok_or(InputError::Empty)?.to_ascii_lowercase();
        let mut arg = |name: &'static str| words.next().ok_or(InputError::MissingArgument(name));

        let action = match verb.as_str() {
            "page" => OperatorAction::ShowPage(arg("page")?.parse().map_err(InputError::InvalidArgument)?),
            "filter" => OperatorAction::Filter(match arg("node")? {
                all if all.eq_ignore_ascii_case("all") => NodeFilter::All,
                node => NodeFilter::Node(node.to_string()),
            }),
            "period" => OperatorAction::Period(arg("period")?.parse().map_err(InputError::InvalidArgument)?),
            "select" => OperatorAction::Select(arg("node")?.to_string()),
            "mode" => OperatorAction::SetMode {
                node_id: arg("node")?.to_string(),
                mode: arg("mode")?.parse().map_err(InputError::InvalidArgument)?,
            },
            "threshold" => {
                let node_id = arg("node")?.to_string();
                let value = arg("threshold")?;
                let threshold = value
                    .parse::<u16>()
                    .map_err(|_| InputError::InvalidArgument(format!("lux threshold: {value}")))?;
                OperatorAction::SetThreshold { node_id, threshold }
            }
            "on" => OperatorAction::Switch { node_id: arg("node")?.to_string(), state: SwitchState::On },
            "off" => OperatorAction::Switch { node_id: arg("node")?.to_string(), state: SwitchState::Off },
            "schedule" => OperatorAction::SetSchedule {
                node_id: arg("node")?.to_string(),
                start: arg("start")?.parse().map_err(InputError::InvalidArgument)?,
                end: arg("end")?.parse().map_err(InputError::InvalidArgument)?,
            },
            "quit" | "exit" => OperatorAction::Quit,
            other => return Err(InputError::UnknownCommand(other.to_string())),
        };

        Ok(action)
    }
}

/// Read operator actions from stdin until EOF or until the console stops listening.
pub fn spawn_input_reader(tx: UnboundedSender<OperatorAction>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            match lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => match line.parse::<OperatorAction>() {
                    Ok(action) => {
                        if tx.send(action).is_err() {
                            break;
                        }
                    }
                    Err(e) => tracing::warn!(input = %line.trim(), "{}", e),
                },
                Ok(None) => break,
                Err(e) => {
                    tracing::error!("Failed to read operator input: {}", e);
                    break;
                }
            }
        }

        tracing::debug!("operator input closed");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<OperatorAction, InputError> {
        line.parse()
    }

    #[test]
    fn test_parse_navigation() {
        assert_eq!(parse("page analytics"), Ok(OperatorAction::ShowPage(Page::Analytics)));
        assert_eq!(parse("  PAGE   map "), Ok(OperatorAction::ShowPage(Page::AssetMap)));
        assert_eq!(parse("filter all"), Ok(OperatorAction::Filter(NodeFilter::All)));
        assert_eq!(parse("filter N3"), Ok(OperatorAction::Filter(NodeFilter::Node("N3".into()))));
        assert_eq!(parse("period week"), Ok(OperatorAction::Period(AnalyticsPeriod::PastWeek)));
        assert_eq!(parse("select N1"), Ok(OperatorAction::Select("N1".into())));
        assert_eq!(parse("quit"), Ok(OperatorAction::Quit));
    }

    #[test]
    fn test_parse_controls() {
        assert_eq!(
            parse("mode N1 manual"),
            Ok(OperatorAction::SetMode { node_id: "N1".into(), mode: ControlMode::Manual })
        );
        assert_eq!(
            parse("threshold N1 450"),
            Ok(OperatorAction::SetThreshold { node_id: "N1".into(), threshold: 450 })
        );
        assert_eq!(
            parse("on N1"),
            Ok(OperatorAction::Switch { node_id: "N1".into(), state: SwitchState::On })
        );
        assert_eq!(
            parse("schedule N1 19 05:00"),
            Ok(OperatorAction::SetSchedule {
                node_id: "N1".into(),
                start: ScheduleHour::new(19).unwrap(),
                end: ScheduleHour::new(5).unwrap(),
            })
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse("   "), Err(InputError::Empty));
        assert_eq!(parse("reboot N1"), Err(InputError::UnknownCommand("reboot".into())));
        assert_eq!(parse("mode N1"), Err(InputError::MissingArgument("mode")));
        assert!(matches!(parse("threshold N1 bright"), Err(InputError::InvalidArgument(_))));
        assert!(matches!(parse("schedule N1 25 06"), Err(InputError::InvalidArgument(_))));
        assert!(matches!(parse("page settings"), Err(InputError::InvalidArgument(_))));
    }
}

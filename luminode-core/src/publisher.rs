use std::cell::RefCell;

use crate::error::PublishError;
use crate::models::{Command, CommandMessage, ControlMode, MAX_LUX_THRESHOLD, ScheduleHour, SwitchState};
use crate::store::StateStore;

/// Outbound side of the command channel.
pub trait CommandSink {
    fn send(&self, topic: &str, payload: Vec<u8>) -> Result<(), PublishError>;
}

impl<S: CommandSink + ?Sized> CommandSink for &S {
    fn send(&self, topic: &str, payload: Vec<u8>) -> Result<(), PublishError> {
        (**self).send(topic, payload)
    }
}

/// Sink that keeps every payload in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    sent: RefCell<Vec<(String, Vec<u8>)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(String, Vec<u8>)> {
        self.sent.borrow().clone()
    }

    /// Payloads decoded as UTF-8 text, in publish order.
    pub fn payloads(&self) -> Vec<String> {
        self.sent
            .borrow()
            .iter()
            .map(|(_, payload)| String::from_utf8_lossy(payload).into_owned())
            .collect()
    }
}

impl CommandSink for MemorySink {
    fn send(&self, topic: &str, payload: Vec<u8>) -> Result<(), PublishError> {
        self.sent.borrow_mut().push((topic.to_string(), payload));
        Ok(())
    }
}

/// Best-effort, at-most-once command publishing.
#[derive(Debug, Clone)]
pub struct CommandPublisher<S> {
    sink: S,
    topic: String,
}

impl<S: CommandSink> CommandPublisher<S> {
    pub fn new(sink: S, topic: impl Into<String>) -> Self {
        Self {
            sink,
            topic: topic.into(),
        }
    }

    /// Serialize and publish. Failures are logged and reported as `false`, never raised.
    pub fn publish_command(&self, node_id: &str, command: &Command) -> bool {
        match self.try_publish(node_id, command) {
            Ok(()) => {
                tracing::debug!(node_id, ?command, "Command published");
                true
            }
            Err(e) => {
                tracing::error!(node_id, ?command, "Failed to publish command: {}", e);
                false
            }
        }
    }

    pub fn try_publish(&self, node_id: &str, command: &Command) -> Result<(), PublishError> {
        let payload = serde_json::to_vec(&CommandMessage { node_id, command })?;

        self.sink.send(&self.topic, payload)
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

/// Operator intents: update control state, then tell the node.
#[derive(Debug, Clone)]
pub struct ControlCenter<S> {
    publisher: CommandPublisher<S>,
}

impl<S: CommandSink> ControlCenter<S> {
    pub fn new(publisher: CommandPublisher<S>) -> Self {
        Self { publisher }
    }

    /// Returns whether a command was published.
    pub fn set_mode(&self, store: &mut StateStore, node_id: &str, mode: ControlMode) -> bool {
        let control = store.ensure_control_defaults(node_id);
        if control.mode == mode {
            return false;
        }

        control.mode = mode;
        self.publisher.publish_command(node_id, &Command::ModeUpdate(mode))
    }

    /// Threshold is clamped to `0..=1000`.
    pub fn set_lux_threshold(&self, store: &mut StateStore, node_id: &str, threshold: u16) -> bool {
        let threshold = threshold.min(MAX_LUX_THRESHOLD);
        let control = store.ensure_control_defaults(node_id);
        if control.lux_threshold == threshold {
            return false;
        }

        control.lux_threshold = threshold;
        self.publisher.publish_command(node_id, &Command::LuxThreshold(threshold))
    }

    /// Switching carries `mode: MANUAL`, so the node leaves AUTO or SCHEDULED.
    pub fn switch(&self, store: &mut StateStore, node_id: &str, state: SwitchState) -> bool {
        store.ensure_control_defaults(node_id).mode = ControlMode::Manual;

        self.publisher.publish_command(node_id, &Command::Switch(state))
    }

    pub fn set_schedule(&self, store: &mut StateStore, node_id: &str, start: ScheduleHour, end: ScheduleHour) -> bool {
        let control = store.ensure_control_defaults(node_id);
        if control.mode == ControlMode::Scheduled && control.schedule_start == start && control.schedule_end == end {
            return false;
        }

        control.mode = ControlMode::Scheduled;
        control.schedule_start = start;
        control.schedule_end = end;
        self.publisher.publish_command(node_id, &Command::Schedule { start, end })
    }

    pub fn publisher(&self) -> &CommandPublisher<S> {
        &self.publisher
    }
}

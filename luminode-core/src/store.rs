use std::collections::{BTreeMap, VecDeque};

use crate::models::{ControlState, LatestStateMap, TelemetryRecord};

/// Maximum number of records kept in the rolling history.
pub const HISTORY_CAPACITY: usize = 2000;

/// Arrival-ordered log of records across all nodes, trimmed from the front.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    records: VecDeque<TelemetryRecord>,
    capacity: usize,
}

impl HistoryBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::new(),
            capacity,
        }
    }

    pub fn push(&mut self, record: TelemetryRecord) {
        self.records.push_back(record);

        if self.records.len() > self.capacity {
            let excess = self.records.len() - self.capacity;
            self.records.drain(..excess);
        }
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &TelemetryRecord> + ExactSizeIterator {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(HISTORY_CAPACITY)
    }
}

/// Latest snapshot per node, rolling history and per-node control state.
#[derive(Debug, Clone, Default)]
pub struct StateStore {
    latest: LatestStateMap,
    history: HistoryBuffer,
    controls: BTreeMap<String, ControlState>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history_capacity(capacity: usize) -> Self {
        Self {
            history: HistoryBuffer::new(capacity),
            ..Self::default()
        }
    }

    pub fn upsert_latest(&mut self, record: TelemetryRecord) {
        self.latest.insert(record.node_id.clone(), record);
    }

    pub fn append_history(&mut self, record: TelemetryRecord) {
        self.history.push(record);
    }

    /// Create the default control state for `node_id` unless one exists.
    pub fn ensure_control_defaults(&mut self, node_id: &str) -> &mut ControlState {
        if !self.controls.contains_key(node_id) {
            tracing::debug!(node_id, "Create default control state");
        }

        self.controls.entry(node_id.to_string()).or_default()
    }

    pub fn latest(&self) -> &LatestStateMap {
        &self.latest
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    pub fn controls(&self) -> &BTreeMap<String, ControlState> {
        &self.controls
    }

    pub fn control(&self, node_id: &str) -> Option<&ControlState> {
        self.controls.get(node_id)
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.latest.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use time::{Duration, OffsetDateTime};

    use super::*;
    use crate::models::ControlMode;

    fn record(node_id: &str, second: i64) -> TelemetryRecord {
        TelemetryRecord::new(node_id, OffsetDateTime::UNIX_EPOCH + Duration::seconds(second))
    }

    #[test]
    fn test_history_evicts_oldest_in_order() {
        let mut store = StateStore::new();

        for i in 0..2005 {
            store.append_history(record("N1", i));
        }

        let history = store.history();
        assert_eq!(history.len(), HISTORY_CAPACITY);

        let seconds: Vec<i64> = history.iter().map(|r| r.timestamp.unix_timestamp()).collect();
        let expected: Vec<i64> = (5..2005).collect();
        assert_eq!(seconds, expected);
    }

    #[test]
    fn test_small_history_capacity() {
        let mut history = HistoryBuffer::new(3);

        for i in 0..5 {
            history.push(record("N1", i));
            assert!(history.len() <= 3);
        }

        let first = history.iter().next().unwrap();
        assert_eq!(first.timestamp.unix_timestamp(), 2);
    }

    #[test]
    fn test_upsert_latest_overwrites() {
        let mut store = StateStore::new();

        store.upsert_latest(record("N1", 1));
        store.upsert_latest(record("N2", 1));
        store.upsert_latest(record("N1", 9));

        assert_eq!(store.latest().len(), 2);
        assert_eq!(store.latest()["N1"].timestamp.unix_timestamp(), 9);
        assert_eq!(store.node_ids().collect::<Vec<_>>(), vec!["N1", "N2"]);
    }

    #[test]
    fn test_control_defaults_are_idempotent() {
        let mut store = StateStore::new();

        store.ensure_control_defaults("N1").mode = ControlMode::Manual;
        store.ensure_control_defaults("N1");

        assert_eq!(store.controls().len(), 1);
        assert_eq!(store.control("N1").unwrap().mode, ControlMode::Manual);
        assert_eq!(store.control("N2"), None);
    }
}

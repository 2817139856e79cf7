use crate::fault;
use crate::models::TelemetryRecord;
use crate::signature::{ChangeTracker, RenderDecision, compute_signature};
use crate::store::StateStore;
use crate::view::Page;

/// Session state of one console: the store plus the trackers from the last render.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    store: StateStore,
    tracker: ChangeTracker,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(store: StateStore) -> Self {
        Self {
            store,
            tracker: ChangeTracker::new(),
        }
    }

    /// Classify a record and fold it into latest state, history and control defaults.
    pub fn ingest(&mut self, mut record: TelemetryRecord) {
        record.fault_code = fault::classify(&record);

        if record.fault_code.is_fault() {
            tracing::debug!(node_id = %record.node_id, power = record.power, "Lamp on with negligible power");
        }

        self.store.ensure_control_defaults(&record.node_id);
        self.store.upsert_latest(record.clone());
        self.store.append_history(record);
    }

    /// Decide whether the view must be re-rendered for `page`.
    pub fn observe(&mut self, page: Page) -> RenderDecision {
        let count = self.store.history().len();
        let signature = compute_signature(self.store.latest());

        self.tracker.observe(count, signature, page)
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut StateStore {
        &mut self.store
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::models::{ControlState, FaultCode, NodeStatus};

    #[test]
    fn test_ingest_classifies_and_creates_controls() {
        let mut pipeline = Pipeline::new();
        let record = TelemetryRecord::new("N1", datetime!(2024-01-01 00:00:00 UTC))
            .with_status(NodeStatus::On)
            .with_power(0.1);

        pipeline.ingest(record);

        let store = pipeline.store();
        assert_eq!(store.latest()["N1"].fault_code, FaultCode::LampFailure);
        assert_eq!(store.history().len(), 1);
        assert_eq!(store.history().iter().next().unwrap().fault_code, FaultCode::LampFailure);
        assert_eq!(store.control("N1"), Some(&ControlState::default()));
    }

    #[test]
    fn test_reingesting_same_record_changes_count_only() {
        let mut pipeline = Pipeline::new();
        let record = TelemetryRecord::new("N1", datetime!(2024-01-01 00:00:00 UTC));

        pipeline.ingest(record.clone());
        assert!(pipeline.observe(Page::Dashboard).should_render());

        pipeline.ingest(record);
        assert_eq!(
            pipeline.observe(Page::Dashboard),
            RenderDecision::Render { history_changed: true, signature_changed: false, page_changed: false }
        );
        assert_eq!(pipeline.observe(Page::Dashboard), RenderDecision::Idle);
    }
}

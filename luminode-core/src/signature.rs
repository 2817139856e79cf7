use time::{OffsetDateTime, UtcOffset};
use time::format_description::well_known::Rfc3339;

use crate::models::LatestStateMap;
use crate::view::Page;

/// Fingerprint of the latest-state map: `node:timestamp` pairs in ascending node order, joined by `|`.
pub fn compute_signature(latest: &LatestStateMap) -> String {
    let mut entries: Vec<(&str, &OffsetDateTime)> = latest
        .iter()
        .map(|(node_id, record)| (node_id.as_str(), &record.timestamp))
        .collect();
    entries.sort_unstable_by(|a, b| a.0.cmp(b.0));

    entries
        .into_iter()
        .map(|(node_id, timestamp)| format!("{node_id}:{}", canonical_timestamp(timestamp)))
        .collect::<Vec<_>>()
        .join("|")
}

/// RFC 3339 in UTC, so one instant always has one form.
pub fn canonical_timestamp(timestamp: &OffsetDateTime) -> String {
    timestamp
        .to_offset(UtcOffset::UTC)
        .format(&Rfc3339)
        .unwrap_or_else(|_| timestamp.unix_timestamp_nanos().to_string())
}

/// Why a render was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderDecision {
    Idle,
    Render {
        history_changed: bool,
        signature_changed: bool,
        page_changed: bool,
    },
}

impl RenderDecision {
    pub fn should_render(self) -> bool {
        matches!(self, RenderDecision::Render { .. })
    }
}

/// Values observed at the end of the previous render cycle.
#[derive(Debug, Clone, Default)]
pub struct ChangeTracker {
    last_count: usize,
    last_signature: String,
    last_page: Option<Page>,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare against the previous cycle and, on any change, remember the new values.
    pub fn observe(&mut self, count: usize, signature: String, page: Page) -> RenderDecision {
        let history_changed = count != self.last_count;
        let signature_changed = signature != self.last_signature;
        let page_changed = self.last_page != Some(page);

        if !(history_changed || signature_changed || page_changed) {
            return RenderDecision::Idle;
        }

        self.last_count = count;
        self.last_signature = signature;
        self.last_page = Some(page);

        RenderDecision::Render { history_changed, signature_changed, page_changed }
    }

    pub fn last_signature(&self) -> &str {
        &self.last_signature
    }
}

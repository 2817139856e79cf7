use time::OffsetDateTime;
use time::macros::format_description;

use luminode_core::models::ControlMode;
use luminode_core::store::StateStore;
use luminode_core::view::{
    AnalyticsPeriod, AnalyticsSummary, AssetMap, ControlPanel, DashboardSummary, NodeFilter, Page, SeriesPoint,
};

use crate::services::subscriber_service::LinkStatus;

const TREND_ROWS: usize = 8;

/// What the operator is currently looking at.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub page: Page,
    pub filter: NodeFilter,
    pub period: AnalyticsPeriod,
    pub selected: Option<String>,
}

/// Renders pages as plain text frames.
#[derive(Debug, Clone)]
pub struct TextView {
    tariff_per_kwh: f64,
}

impl TextView {
    pub fn new(tariff_per_kwh: f64) -> Self {
        Self { tariff_per_kwh }
    }

    pub fn render(&self, state: &ViewState, store: &StateStore, link: &LinkStatus, now: OffsetDateTime) -> String {
        let mut lines = Vec::new();

        match link {
            LinkStatus::Connecting => lines.push("(connecting to broker...)".to_string()),
            LinkStatus::Connected => {}
            LinkStatus::Disconnected(reason) => lines.push(format!("!! MQTT Error: {reason}")),
        }

        lines.push(format!("== {} ==", state.page.title()));

        match state.page {
            Page::Dashboard => self.dashboard(&mut lines, state, store),
            Page::ControlCenter => self.control(&mut lines, state, store),
            Page::Analytics => self.analytics(&mut lines, state, store, now),
            Page::AssetMap => self.map(&mut lines, store),
        }

        lines.join("\n")
    }

    fn dashboard(&self, lines: &mut Vec<String>, state: &ViewState, store: &StateStore) {
        if store.latest().is_empty() {
            lines.push("Waiting for data...".to_string());
            return;
        }

        let summary = DashboardSummary::build(store, &state.filter);

        lines.push(format!("Node filter: {}", state.filter));
        lines.push(format!("Total Load   {:.1} W", summary.total_power));
        lines.push(format!("Total Nodes  {}", summary.node_count));
        lines.push(format!("Healthy      {}", summary.healthy));
        lines.push(format!("Faults       {}", summary.faults));
        lines.push("Power trend:".to_string());
        push_trend(lines, &summary.power_trend);
    }

    fn control(&self, lines: &mut Vec<String>, state: &ViewState, store: &StateStore) {
        let Some(panel) = ControlPanel::build(store, state.selected.as_deref()) else {
            lines.push("Waiting for nodes...".to_string());
            return;
        };

        lines.push(format!("Nodes: {}", panel.nodes.join(", ")));
        lines.push(format!("Node {} | Status: {} | Lux: {}", panel.node_id, panel.status, panel.lux));
        lines.push(format!("Mode: {}", panel.control.mode));

        match panel.control.mode {
            ControlMode::Auto => lines.push(format!("Threshold: {} lx", panel.control.lux_threshold)),
            ControlMode::Manual => lines.push(format!("Switch with `on {0}` or `off {0}`", panel.node_id)),
            ControlMode::Scheduled => lines.push(format!(
                "Schedule window: {} -> {}",
                panel.control.schedule_start, panel.control.schedule_end
            )),
        }
    }

    fn analytics(&self, lines: &mut Vec<String>, state: &ViewState, store: &StateStore, now: OffsetDateTime) {
        lines.push(format!("Node filter: {} | Period: {}", state.filter, state.period.label()));

        if store.history().is_empty() {
            lines.push("No data yet.".to_string());
            return;
        }

        let summary = AnalyticsSummary::build(store, &state.filter, state.period, self.tariff_per_kwh, now);

        lines.push(format!("Total Energy  {:.4} kWh", summary.total_energy));
        lines.push(format!("Total Cost    Rp {}", group_thousands(summary.total_cost)));
        lines.push(format!("Fault Events  {}", summary.fault_events));
        lines.push("Power trend:".to_string());
        push_trend(lines, &summary.power_trend);

        if let Some(point) = summary.electrical_trend.last() {
            lines.push(format!(
                "Latest V/I: {:.1} V / {:.3} A at {}",
                point.voltage,
                point.current,
                clock_time(&point.timestamp)
            ));
        }

        lines.push("Fault Logs:".to_string());
        if summary.fault_log.is_empty() {
            lines.push("  No critical faults detected.".to_string());
        }
        for record in &summary.fault_log {
            lines.push(format!(
                "  {}  {:<10} {:<4} {:>7.1} W {:>6.1} V",
                clock_time(&record.timestamp),
                record.node_id,
                record.status,
                record.power,
                record.voltage
            ));
        }
    }

    fn map(&self, lines: &mut Vec<String>, store: &StateStore) {
        if store.latest().is_empty() {
            lines.push("Waiting GPS...".to_string());
            return;
        }

        let map = AssetMap::build(store);
        let Some((lat, lng)) = map.center else {
            lines.push("No node reports a position yet.".to_string());
            return;
        };

        lines.push(format!("Center: {lat:.5}, {lng:.5}"));
        for point in &map.points {
            lines.push(format!(
                "  [{}] {:<10} {:>9.5}, {:>10.5}  {:<4} {:>7.1} W {:>9.4} kWh",
                if point.healthy { "ok" } else { "!!" },
                point.node_id,
                point.lat,
                point.lng,
                point.status,
                point.power,
                point.energy_total
            ));
        }
    }
}

fn push_trend(lines: &mut Vec<String>, trend: &[SeriesPoint]) {
    if trend.is_empty() {
        lines.push("  (no samples)".to_string());
    }

    let skip = trend.len().saturating_sub(TREND_ROWS);
    for point in &trend[skip..] {
        lines.push(format!("  {}  {:<10} {:>7.1} W", clock_time(&point.timestamp), point.node_id, point.value));
    }
}

fn clock_time(timestamp: &OffsetDateTime) -> String {
    timestamp
        .format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))
        .unwrap_or_else(|_| timestamp.to_string())
}

/// Round to a whole amount and group digits by thousands, e.g. `6400.4` -> `6,400`.
fn group_thousands(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);

    if rounded < 0.0 {
        grouped.push('-');
    }

    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    grouped
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use luminode_core::Pipeline;
    use luminode_core::models::{NodeStatus, TelemetryRecord};

    use super::*;

    fn pipeline() -> Pipeline {
        let mut pipeline = Pipeline::new();
        let t = datetime!(2024-01-01 18:00:00 UTC);

        let mut lit = TelemetryRecord::new("N1", t).with_status(NodeStatus::On).with_power(72.5);
        lit.energy_total = 4.0;
        lit.lat = Some(-6.2);
        lit.lng = Some(106.8);
        pipeline.ingest(lit);
        pipeline.ingest(TelemetryRecord::new("N2", t).with_status(NodeStatus::On).with_power(0.0));

        pipeline
    }

    fn render(state: &ViewState, pipeline: &Pipeline, link: &LinkStatus) -> String {
        TextView::new(1600.0).render(state, pipeline.store(), link, datetime!(2024-01-01 18:30:00 UTC))
    }

    #[test]
    fn test_dashboard_frame() {
        let frame = render(&ViewState::default(), &pipeline(), &LinkStatus::Connected);

        assert!(frame.starts_with("== Main Dashboard =="));
        assert!(frame.contains("Total Load   72.5 W"));
        assert!(frame.contains("Total Nodes  2"));
        assert!(frame.contains("Faults       1"));
    }

    #[test]
    fn test_empty_pages() {
        let empty = Pipeline::new();
        let link = LinkStatus::Connected;

        let mut state = ViewState::default();
        assert!(render(&state, &empty, &link).contains("Waiting for data..."));

        state.page = Page::ControlCenter;
        assert!(render(&state, &empty, &link).contains("Waiting for nodes..."));

        state.page = Page::Analytics;
        assert!(render(&state, &empty, &link).contains("No data yet."));

        state.page = Page::AssetMap;
        assert!(render(&state, &empty, &link).contains("Waiting GPS..."));
    }

    #[test]
    fn test_analytics_frame() {
        let state = ViewState { page: Page::Analytics, ..ViewState::default() };
        let frame = render(&state, &pipeline(), &LinkStatus::Connected);

        assert!(frame.contains("Total Energy  4.0000 kWh"));
        assert!(frame.contains("Total Cost    Rp 6,400"));
        assert!(frame.contains("Fault Events  1"));
        assert!(frame.contains("2024-01-01 18:00:00  N2"));
    }

    #[test]
    fn test_control_frame_follows_selection() {
        let state = ViewState {
            page: Page::ControlCenter,
            selected: Some("N2".to_string()),
            ..ViewState::default()
        };
        let frame = render(&state, &pipeline(), &LinkStatus::Connected);

        assert!(frame.contains("Nodes: N1, N2"));
        assert!(frame.contains("Node N2 | Status: ON"));
        assert!(frame.contains("Threshold: 300 lx"));
    }

    #[test]
    fn test_map_frame_and_error_banner() {
        let state = ViewState { page: Page::AssetMap, ..ViewState::default() };
        let frame = render(&state, &pipeline(), &LinkStatus::Disconnected("connection refused".to_string()));

        assert!(frame.starts_with("!! MQTT Error: connection refused"));
        assert!(frame.contains("Center: -6.20000, 106.80000"));
        assert!(frame.contains("[ok] N1"));
        assert!(!frame.contains("N2"));
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0.0), "0");
        assert_eq!(group_thousands(999.4), "999");
        assert_eq!(group_thousands(6400.0), "6,400");
        assert_eq!(group_thousands(1234567.8), "1,234,568");
        assert_eq!(group_thousands(-2500.0), "-2,500");
    }
}

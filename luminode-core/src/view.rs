//! Read-only view models derived from the state store.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use time::{Duration, OffsetDateTime};

use crate::models::{ControlState, FaultCode, NodeStatus, TelemetryRecord};
use crate::store::StateStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Page {
    #[default]
    Dashboard,
    ControlCenter,
    Analytics,
    AssetMap,
}

impl Page {
    pub fn title(self) -> &'static str {
        match self {
            Page::Dashboard => "Main Dashboard",
            Page::ControlCenter => "Smart Control",
            Page::Analytics => "Analytics",
            Page::AssetMap => "Asset Map",
        }
    }
}

impl FromStr for Page {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dashboard" | "dash" => Ok(Page::Dashboard),
            "control" | "controls" => Ok(Page::ControlCenter),
            "analytics" => Ok(Page::Analytics),
            "map" => Ok(Page::AssetMap),
            other => Err(format!("unknown page: {other}")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NodeFilter {
    #[default]
    All,
    Node(String),
}

impl NodeFilter {
    pub fn matches(&self, node_id: &str) -> bool {
        match self {
            NodeFilter::All => true,
            NodeFilter::Node(id) => id == node_id,
        }
    }

    /// Latest records selected by the filter; an unknown node selects nothing.
    pub fn select<'a>(&self, store: &'a StateStore) -> Vec<&'a TelemetryRecord> {
        match self {
            NodeFilter::All => store.latest().values().collect(),
            NodeFilter::Node(id) => store.latest().get(id).into_iter().collect(),
        }
    }
}

impl fmt::Display for NodeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeFilter::All => f.write_str("All Nodes"),
            NodeFilter::Node(id) => f.write_str(id),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AnalyticsPeriod {
    #[default]
    PastHour,
    PastDay,
    PastWeek,
    PastMonth,
}

impl AnalyticsPeriod {
    pub fn span(self) -> Duration {
        match self {
            AnalyticsPeriod::PastHour => Duration::hours(1),
            AnalyticsPeriod::PastDay => Duration::days(1),
            AnalyticsPeriod::PastWeek => Duration::days(7),
            AnalyticsPeriod::PastMonth => Duration::days(30),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AnalyticsPeriod::PastHour => "Past 1 Hour",
            AnalyticsPeriod::PastDay => "Past 24 Hours",
            AnalyticsPeriod::PastWeek => "Past Week",
            AnalyticsPeriod::PastMonth => "Past Month",
        }
    }
}

impl FromStr for AnalyticsPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hour" | "1h" => Ok(AnalyticsPeriod::PastHour),
            "day" | "24h" => Ok(AnalyticsPeriod::PastDay),
            "week" | "7d" => Ok(AnalyticsPeriod::PastWeek),
            "month" | "30d" => Ok(AnalyticsPeriod::PastMonth),
            other => Err(format!("unknown period: {other}")),
        }
    }
}

/// One point of a per-node time series.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    pub timestamp: OffsetDateTime,
    pub node_id: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSummary {
    /// Sum of latest power over the selected nodes, in W.
    pub total_power: f64,
    pub node_count: usize,
    pub healthy: usize,
    pub faults: usize,
    pub power_trend: Vec<SeriesPoint>,
}

impl DashboardSummary {
    pub fn build(store: &StateStore, filter: &NodeFilter) -> Self {
        let selected = filter.select(store);
        let faults = selected.iter().filter(|r| r.fault_code.is_fault()).count();

        Self {
            total_power: selected.iter().map(|r| r.power).sum(),
            node_count: selected.len(),
            healthy: selected.len().saturating_sub(faults),
            faults,
            power_trend: power_series(store.history().iter().filter(|r| filter.matches(&r.node_id))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElectricalPoint {
    pub timestamp: OffsetDateTime,
    pub voltage: f64,
    pub current: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsSummary {
    /// Accumulated meter reading over the selected nodes, in kWh.
    pub total_energy: f64,
    /// `total_energy` priced at the configured tariff.
    pub total_cost: f64,
    pub fault_events: usize,
    /// Lamp failures in the period, newest first.
    pub fault_log: Vec<TelemetryRecord>,
    pub power_trend: Vec<SeriesPoint>,
    pub electrical_trend: Vec<ElectricalPoint>,
}

impl AnalyticsSummary {
    pub fn build(
        store: &StateStore,
        filter: &NodeFilter,
        period: AnalyticsPeriod,
        tariff_per_kwh: f64,
        now: OffsetDateTime,
    ) -> Self {
        let cutoff = now - period.span();
        let window: Vec<&TelemetryRecord> = store
            .history()
            .iter()
            .filter(|r| r.timestamp >= cutoff && filter.matches(&r.node_id))
            .collect();

        let total_energy: f64 = filter.select(store).iter().map(|r| r.energy_total).sum();

        let mut fault_log: Vec<TelemetryRecord> = window
            .iter()
            .filter(|r| r.fault_code == FaultCode::LampFailure)
            .map(|r| (*r).clone())
            .collect();
        fault_log.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let electrical_trend = match filter {
            NodeFilter::All => averaged_electrical(&window),
            NodeFilter::Node(_) => window
                .iter()
                .map(|r| ElectricalPoint { timestamp: r.timestamp, voltage: r.voltage, current: r.current })
                .collect(),
        };

        Self {
            total_energy,
            total_cost: total_energy * tariff_per_kwh,
            fault_events: window.iter().filter(|r| r.fault_code.is_fault()).count(),
            fault_log,
            power_trend: power_series(window.iter().copied()),
            electrical_trend,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapPoint {
    pub node_id: String,
    pub lat: f64,
    pub lng: f64,
    pub status: NodeStatus,
    pub power: f64,
    pub energy_total: f64,
    pub healthy: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssetMap {
    pub points: Vec<MapPoint>,
    /// Mean position of all located nodes.
    pub center: Option<(f64, f64)>,
}

impl AssetMap {
    pub fn build(store: &StateStore) -> Self {
        let points: Vec<MapPoint> = store
            .latest()
            .values()
            .filter_map(|r| {
                let (lat, lng) = r.position()?;
                Some(MapPoint {
                    node_id: r.node_id.clone(),
                    lat,
                    lng,
                    status: r.status.clone(),
                    power: r.power,
                    energy_total: r.energy_total,
                    healthy: !r.fault_code.is_fault(),
                })
            })
            .collect();

        let center = (!points.is_empty()).then(|| {
            let n = points.len() as f64;
            (
                points.iter().map(|p| p.lat).sum::<f64>() / n,
                points.iter().map(|p| p.lng).sum::<f64>() / n,
            )
        });

        Self { points, center }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ControlPanel {
    /// Every known node, sorted.
    pub nodes: Vec<String>,
    pub node_id: String,
    pub control: ControlState,
    pub status: NodeStatus,
    pub lux: f64,
}

impl ControlPanel {
    /// Panel for `selected`, or for the first known node. `None` until a node has reported.
    pub fn build(store: &StateStore, selected: Option<&str>) -> Option<Self> {
        let node_id = selected
            .filter(|id| store.latest().contains_key(*id))
            .or_else(|| store.node_ids().next())?;
        let latest = &store.latest()[node_id];

        Some(Self {
            nodes: store.node_ids().map(str::to_string).collect(),
            node_id: node_id.to_string(),
            control: store.control(node_id).copied().unwrap_or_default(),
            status: latest.status.clone(),
            lux: latest.lux,
        })
    }
}

fn power_series<'a>(records: impl Iterator<Item = &'a TelemetryRecord>) -> Vec<SeriesPoint> {
    records
        .map(|r| SeriesPoint { timestamp: r.timestamp, node_id: r.node_id.clone(), value: r.power })
        .collect()
}

fn averaged_electrical(records: &[&TelemetryRecord]) -> Vec<ElectricalPoint> {
    let mut groups: BTreeMap<OffsetDateTime, (f64, f64, usize)> = BTreeMap::new();

    for record in records {
        let entry = groups.entry(record.timestamp).or_insert((0.0, 0.0, 0));
        entry.0 += record.voltage;
        entry.1 += record.current;
        entry.2 += 1;
    }

    groups
        .into_iter()
        .map(|(timestamp, (voltage, current, n))| ElectricalPoint {
            timestamp,
            voltage: voltage / n as f64,
            current: current / n as f64,
        })
        .collect()
}

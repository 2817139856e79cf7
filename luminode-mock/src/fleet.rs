use std::time::Duration;

use rand::Rng;
use time::OffsetDateTime;
use time::macros::format_description;

use luminode_core::models::NodeCommand;

use crate::node::{NodeReading, SimulatedNode};
use crate::settings::Mock;
use crate::simulate::{day_fraction, simulation_lux};

const POSITION_JITTER: f64 = 0.01;

pub struct Fleet<R> {
    nodes: Vec<SimulatedNode>,
    fault_ratio: f64,
    rng: R,
}

impl<R: Rng> Fleet<R> {
    /// Nodes `NODE-01`.. scattered around the configured origin.
    pub fn new(mock: &Mock, mut rng: R) -> Self {
        let nodes = (1..=mock.nodes)
            .map(|index| {
                SimulatedNode::new(
                    format!("NODE-{index:02}"),
                    mock.origin_lat + rng.random_range(-POSITION_JITTER..POSITION_JITTER),
                    mock.origin_lng + rng.random_range(-POSITION_JITTER..POSITION_JITTER),
                )
            })
            .collect();

        Self {
            nodes,
            fault_ratio: mock.fault_ratio.clamp(0.0, 1.0),
            rng,
        }
    }

    pub fn nodes(&self) -> &[SimulatedNode] {
        &self.nodes
    }

    /// Route a control payload to its node. Returns `false` when it was ignored.
    pub fn handle_command(&mut self, payload: &[u8]) -> bool {
        let command = match serde_json::from_slice::<NodeCommand>(payload) {
            Ok(command) => command,
            Err(e) => {
                tracing::warn!("Malformed command: {}", e);
                return false;
            }
        };

        match self.nodes.iter_mut().find(|node| node.id == command.node_id) {
            Some(node) => {
                node.apply(&command);
                true
            }
            None => {
                tracing::debug!("Command for unknown node {}", command.node_id);
                false
            }
        }
    }

    pub fn tick(&mut self, now: OffsetDateTime, elapsed: Duration) -> Result<Vec<NodeReading>, time::error::Format> {
        let now = now.to_offset(time::UtcOffset::UTC);
        let timestamp = now.format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))?;
        let ambient = simulation_lux(day_fraction(now));

        let readings = self
            .nodes
            .iter_mut()
            .map(|node| {
                let lux = (ambient + self.rng.random_range(-2.0..2.0)).max(0.0);
                let failing = self.rng.random_bool(self.fault_ratio);

                node.sample(&timestamp, now.hour(), elapsed, lux, failing, &mut self.rng)
            })
            .collect();

        Ok(readings)
    }
}

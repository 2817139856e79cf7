use std::time::Duration;

use rand::Rng;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use luminode_core::IngressSender;

use crate::configs::settings::Broker;

const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Broker connectivity as shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkStatus {
    Connecting,
    Connected,
    Disconnected(String),
}

pub fn client_id(prefix: &str) -> String {
    format!("{prefix}_{}", rand::rng().random_range(1000..=9999))
}

pub fn create_client(broker: &Broker) -> (AsyncClient, EventLoop) {
    let mut options = MqttOptions::new(client_id(&broker.client_prefix), &broker.host, broker.port);
    options.set_keep_alive(Duration::from_secs(broker.keep_alive_secs));

    AsyncClient::new(options, 10)
}

/// Producer side of the console: polls the MQTT event loop and feeds the ingress queue.
pub struct TelemetrySubscriber {
    client: AsyncClient,
    event_loop: EventLoop,
    topic: String,
    ingress: IngressSender,
    link: watch::Sender<LinkStatus>,
}

impl TelemetrySubscriber {
    pub fn new(
        client: AsyncClient,
        event_loop: EventLoop,
        topic: &str,
        ingress: IngressSender,
        link: watch::Sender<LinkStatus>,
    ) -> Self {
        Self {
            client,
            event_loop,
            topic: topic.to_string(),
            ingress,
            link,
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        while !self.ingress.is_closed() {
            match self.event_loop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => self.on_connected(),
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    self.ingress.ingest(&publish.payload);
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!("MQTT error: {}", e);
                    self.link.send_replace(LinkStatus::Disconnected(e.to_string()));
                    tokio::time::sleep(RECONNECT_DELAY).await;
                }
            }
        }

        tracing::debug!("ingress closed, telemetry subscriber stopped");
    }

    // Sessions are clean, so the subscription is renewed on every connect.
    fn on_connected(&self) {
        match self.client.try_subscribe(&self.topic, QoS::AtMostOnce) {
            Ok(()) => tracing::info!(topic = %self.topic, "subscribed to telemetry"),
            Err(e) => tracing::error!(topic = %self.topic, "Failed to subscribe: {}", e),
        }

        self.link.send_replace(LinkStatus::Connected);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_id_suffix() {
        for _ in 0..100 {
            let id = client_id("dash");
            let suffix: u32 = id.strip_prefix("dash_").unwrap().parse().unwrap();
            assert!((1000..=9999).contains(&suffix));
        }
    }
}

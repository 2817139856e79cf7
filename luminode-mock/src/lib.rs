use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use serde_json::to_vec;
use time::OffsetDateTime;
use tokio::time::{Instant, interval, sleep};

use crate::fleet::Fleet;
use crate::settings::Settings;

pub mod fleet;
pub mod node;
pub mod settings;
mod simulate;

pub async fn run(settings: &Arc<Settings>) {
    let client_id = format!("{}_{}", settings.mock.client_prefix, rand::rng().random_range(1000..10000));
    let mut options = MqttOptions::new(client_id, &settings.broker.host, settings.broker.port);
    options.set_keep_alive(Duration::from_secs(settings.broker.keep_alive_secs));

    let (client, mut event_loop) = AsyncClient::new(options, 32);
    let mut fleet = Fleet::new(&settings.mock, StdRng::from_os_rng());

    tracing::info!(nodes = fleet.nodes().len(), host = %settings.broker.host, "starting mock fleet");

    let mut ticker = interval(Duration::from_millis(settings.mock.interval_ms));
    let mut last_tick = Instant::now();
    loop {
        tokio::select! {
            event = event_loop.poll() => match event {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    if let Err(e) = client.try_subscribe(&settings.topics.control, QoS::AtMostOnce) {
                        tracing::error!("Failed to subscribe {}: {}", settings.topics.control, e);
                    }
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    fleet.handle_command(&publish.payload);
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!("Connection error: {}", e);
                    sleep(Duration::from_secs(1)).await;
                }
            },
            now = ticker.tick() => {
                let elapsed = now.duration_since(last_tick);
                last_tick = now;

                match fleet.tick(OffsetDateTime::now_utc(), elapsed) {
                    Ok(readings) => {
                        for reading in readings {
                            publish_reading(&client, &settings.topics.stream, &reading);
                        }
                    }
                    Err(e) => tracing::error!("Failed to stamp readings: {}", e),
                }
            }
        }
    }
}

fn publish_reading(client: &AsyncClient, topic: &str, reading: &node::NodeReading) {
    let payload = match to_vec(reading) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::error!("Failed to encode reading: {}", e);
            return;
        }
    };

    tracing::debug!("Send: {} {} W", reading.node_id, reading.power);

    if let Err(e) = client.try_publish(topic, QoS::AtMostOnce, false, payload) {
        tracing::warn!("Dropped reading of {}: {}", reading.node_id, e);
    }
}

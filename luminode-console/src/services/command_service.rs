use rumqttc::{AsyncClient, QoS};

use luminode_core::PublishError;
use luminode_core::publisher::CommandSink;

/// Publishes commands through the console's MQTT client without waiting for the event loop.
#[derive(Clone)]
pub struct MqttCommandSink {
    client: AsyncClient,
}

impl MqttCommandSink {
    pub fn new(client: AsyncClient) -> Self {
        Self { client }
    }
}

impl CommandSink for MqttCommandSink {
    fn send(&self, topic: &str, payload: Vec<u8>) -> Result<(), PublishError> {
        self.client
            .try_publish(topic, QoS::AtMostOnce, false, payload)
            .map_err(|e| PublishError::Transport(e.to_string()))
    }
}

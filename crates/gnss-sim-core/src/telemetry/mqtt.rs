//! MQTT publishing
//!
//! [`MqttSink`] queues frames on the client's bounded request channel and
//! never waits on the network. [`MqttConnection`] drives the event loop that
//! drains that channel, reconnecting after failures until shutdown.

use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio_util::sync::CancellationToken;

use super::{PublishError, TelemetryFrame, TelemetrySink};
use crate::config::MqttConfig;

/// Publishes frames to an MQTT topic at QoS 0
#[derive(Debug, Clone)]
pub struct MqttSink {
    client: AsyncClient,
    topic: String,
}

impl MqttSink {
    /// Create the sink and the connection that must be run for frames to
    /// leave the process
    pub fn new(config: &MqttConfig, topic: impl Into<String>) -> (Self, MqttConnection) {
        let mut options = MqttOptions::new(config.client_id.clone(), config.host.clone(), config.port);
        options.set_keep_alive(config.keep_alive());

        let (client, eventloop) = AsyncClient::new(options, config.queue_capacity.max(1));
        let sink = Self {
            client,
            topic: topic.into(),
        };
        let connection = MqttConnection {
            eventloop,
            broker: format!("{}:{}", config.host, config.port),
            reconnect_delay: config.reconnect_delay(),
        };
        (sink, connection)
    }

    /// Topic frames are published under
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

impl TelemetrySink for MqttSink {
    fn publish(&self, frame: &TelemetryFrame) -> Result<(), PublishError> {
        let payload = frame.to_json()?;
        self.client
            .try_publish(self.topic.as_str(), QoS::AtMostOnce, false, payload)
            .map_err(|e| PublishError::Broker(e.to_string()))
    }
}

/// Event loop of an [`MqttSink`]'s broker connection
pub struct MqttConnection {
    eventloop: EventLoop,
    broker: String,
    reconnect_delay: Duration,
}

impl MqttConnection {
    /// Broker address as `host:port`
    pub fn broker(&self) -> &str {
        &self.broker
    }

    /// Drive the connection until `shutdown` is cancelled
    pub async fn run(mut self, shutdown: CancellationToken) {
        tracing::info!("Connecting to MQTT broker {}", self.broker);
        let mut failures: u32 = 0;

        loop {
            let event = tokio::select! {
                _ = shutdown.cancelled() => break,
                event = self.eventloop.poll() => event,
            };

            match event {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    tracing::info!("Connected to MQTT broker {}", self.broker);
                    failures = 0;
                }
                Ok(_) => {}
                Err(e) => {
                    // Only the first failure of an outage is worth a warning
                    if failures == 0 {
                        tracing::warn!("MQTT broker {} unavailable: {}", self.broker, e);
                    } else {
                        tracing::debug!("MQTT reconnect to {} failed: {}", self.broker, e);
                    }
                    failures = failures.saturating_add(1);

                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(self.reconnect_delay) => {}
                    }
                }
            }
        }

        tracing::info!("MQTT connection to {} closed", self.broker);
    }
}

//! [`MqttTransport`] – broker-backed event source.
//!
//! Wraps a `rumqttc` client.  Subscriptions are (re)issued on every
//! `ConnAck`, so a broker restart or network drop does not silently stop
//! delivery.  Connection errors are logged and retried after
//! `retry_delay`; they never end the stream.

use std::time::Duration;

use async_trait::async_trait;
use rsu_types::RsuError;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use tracing::{debug, info, warn};

use crate::adapter::Transport;
use crate::message::InboundMessage;

/// Capacity of the request channel between the client handle and the event
/// loop.
const REQUEST_CAPACITY: usize = 16;

/// Broker connection parameters.
#[derive(Debug, Clone)]
pub struct MqttSettings {
    pub broker: String,
    pub port: u16,
    pub client_id: String,
    pub keep_alive: Duration,
    pub retry_delay: Duration,
}

impl Default for MqttSettings {
    fn default() -> Self {
        Self {
            broker: "localhost".to_string(),
            port: 1883,
            client_id: "rsu-crossroad-1552".to_string(),
            keep_alive: Duration::from_secs(60),
            retry_delay: Duration::from_secs(2),
        }
    }
}

pub struct MqttTransport {
    client: AsyncClient,
    eventloop: EventLoop,
    topics: Vec<String>,
    retry_delay: Duration,
}

impl MqttTransport {
    /// Build the client.  No connection is attempted until the first call to
    /// [`Transport::next_message`].
    pub fn new(settings: &MqttSettings) -> Self {
        let mut options =
            MqttOptions::new(&settings.client_id, &settings.broker, settings.port);
        options.set_keep_alive(settings.keep_alive);
        let (client, eventloop) = AsyncClient::new(options, REQUEST_CAPACITY);
        Self {
            client,
            eventloop,
            topics: Vec::new(),
            retry_delay: settings.retry_delay,
        }
    }

    /// Topics that will be subscribed on every connection.
    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    fn resubscribe(&self) {
        for topic in &self.topics {
            if let Err(e) = self.client.try_subscribe(topic.clone(), QoS::AtLeastOnce) {
                warn!(topic = %topic, error = %e, "mqtt subscribe request failed");
            }
        }
    }
}

#[async_trait]
impl Transport for MqttTransport {
    fn name(&self) -> &str {
        "mqtt"
    }

    async fn subscribe(&mut self, topic: &str) -> Result<(), RsuError> {
        if topic.is_empty() {
            return Err(RsuError::Transport("empty topic".into()));
        }
        if !self.topics.iter().any(|t| t == topic) {
            self.topics.push(topic.to_string());
        }
        Ok(())
    }

    async fn next_message(&mut self) -> Option<InboundMessage> {
        loop {
            match self.eventloop.poll().await {
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    return Some(InboundMessage::new(
                        "mqtt",
                        publish.topic,
                        publish.payload.to_vec(),
                    ));
                }
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    info!(code = ?ack.code, "mqtt connected");
                    self.resubscribe();
                }
                Ok(event) => debug!(?event, "mqtt event"),
                Err(e) => {
                    warn!(error = %e, retry_in = ?self.retry_delay, "mqtt connection error");
                    tokio::time::sleep(self.retry_delay).await;
                }
            }
        }
    }
}

//! The transport pattern.
//!
//! The controller never speaks directly to a broker or a keyboard.  Every
//! event source implements [`Transport`], and [`pump`] forwards whatever it
//! receives onto the internal [`EventBus`], where the controller service is
//! the single subscriber.

use async_trait::async_trait;
use rsu_types::RsuError;
use tracing::{info, warn};

use crate::bus::EventBus;
use crate::message::InboundMessage;

/// Every inbound event source must implement this trait.
///
/// # Contract
///
/// * `subscribe` – register interest in `topic`.  Sources that reconnect must
///   re-establish their subscriptions themselves.
/// * `next_message` – wait for the next inbound message; `None` means the
///   source is exhausted and will not produce again.
#[async_trait]
pub trait Transport: Send {
    /// Short name used in logs and as [`InboundMessage::source`].
    fn name(&self) -> &str;

    async fn subscribe(&mut self, topic: &str) -> Result<(), RsuError>;

    async fn next_message(&mut self) -> Option<InboundMessage>;
}

/// Subscribe `transport` to `topic` and forward every message onto `bus`
/// until the transport is exhausted or the bus's subscriber is gone.
///
/// Forwarding waits while the bus is full, so a slow controller slows the
/// transport down instead of losing messages.
///
/// # Errors
///
/// Returns the transport's error if the subscription is refused.
pub async fn pump(
    mut transport: Box<dyn Transport>,
    topic: String,
    bus: EventBus,
) -> Result<(), RsuError> {
    transport.subscribe(&topic).await?;
    info!(transport = transport.name(), topic = %topic, "transport subscribed");
    while let Some(message) = transport.next_message().await {
        if let Err(e) = bus.publish(message).await {
            warn!(transport = transport.name(), error = %e, "bus closed; stopping transport");
            break;
        }
    }
    info!(transport = transport.name(), "transport closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;

    struct ScriptedTransport {
        topic: Option<String>,
        payloads: VecDeque<&'static str>,
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn subscribe(&mut self, topic: &str) -> Result<(), RsuError> {
            self.topic = Some(topic.to_string());
            Ok(())
        }

        async fn next_message(&mut self) -> Option<InboundMessage> {
            let topic = self.topic.clone()?;
            let payload = self.payloads.pop_front()?;
            Some(InboundMessage::new("scripted", topic, payload.as_bytes().to_vec()))
        }
    }

    #[tokio::test]
    async fn pump_forwards_every_message_in_order() {
        let bus = EventBus::default();
        let mut sub = bus.subscribe_topic("crossroad/1").unwrap();
        let transport = ScriptedTransport {
            topic: None,
            payloads: VecDeque::from(["one", "two"]),
        };

        pump(Box::new(transport), "crossroad/1".into(), bus.clone())
            .await
            .unwrap();

        assert_eq!(sub.recv().await.unwrap().payload, b"one");
        assert_eq!(sub.recv().await.unwrap().payload, b"two");
    }

    #[tokio::test]
    async fn pump_stops_when_subscriber_is_gone() {
        let bus = EventBus::default();
        drop(bus.subscribe_topic("crossroad/1").unwrap());
        let transport = ScriptedTransport {
            topic: None,
            payloads: VecDeque::from(["one", "two", "three"]),
        };

        let result = pump(Box::new(transport), "crossroad/1".into(), bus).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn pump_surfaces_subscribe_failure() {
        struct Refusing;

        #[async_trait]
        impl Transport for Refusing {
            fn name(&self) -> &str {
                "refusing"
            }
            async fn subscribe(&mut self, _topic: &str) -> Result<(), RsuError> {
                Err(RsuError::Transport("not authorised".into()))
            }
            async fn next_message(&mut self) -> Option<InboundMessage> {
                None
            }
        }

        let bus = EventBus::default();
        let _sub = bus.subscribe_topic("t").unwrap();
        let result = pump(Box::new(Refusing), "t".into(), bus).await;
        assert!(matches!(result, Err(RsuError::Transport(_))));
    }
}

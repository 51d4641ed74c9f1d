//! In-process queue from every event source to the controller service.
//!
//! Uses a bounded [`tokio::sync::mpsc`] channel.  The bus has exactly one
//! consumer, the controller service, and no message is ever dropped to make
//! room: when the queue is full, [`EventBus::publish`] waits until the
//! service has taken a message.  A burst arriving during a yellow dwell is
//! therefore delayed, never lost.
//!
//! # Topic filters
//!
//! [`EventBus::subscribe_topic`] accepts MQTT-style filters:
//!
//! | Filter | Matches |
//! |---|---|
//! | `ambulance/web/crossroad/1552` | exactly that topic |
//! | `ambulance/web/crossroad/+` | one level below `crossroad` |
//! | `ambulance/#` | everything under `ambulance` |

use std::sync::{Arc, Mutex};

use rsu_types::RsuError;
use tokio::sync::mpsc;
use tracing::debug;

use crate::message::InboundMessage;

/// Default queue capacity (messages buffered before publishers wait).
const DEFAULT_CAPACITY: usize = 64;

/// Shared message bus.  Clone it cheaply – all clones feed one queue.
#[derive(Clone, Debug)]
pub struct EventBus {
    sender: mpsc::Sender<InboundMessage>,
    receiver: Arc<Mutex<Option<mpsc::Receiver<InboundMessage>>>>,
}

impl EventBus {
    /// Create a new bus that buffers up to `capacity` messages.
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        Self {
            sender,
            receiver: Arc::new(Mutex::new(Some(receiver))),
        }
    }

    /// Queue `message` for the subscriber, waiting while the queue is full.
    ///
    /// # Errors
    ///
    /// Returns [`RsuError::Channel`] when the subscriber has gone away.
    pub async fn publish(&self, message: InboundMessage) -> Result<(), RsuError> {
        self.sender
            .send(message)
            .await
            .map_err(|e| RsuError::Channel(format!("no subscriber for topic {}", e.0.topic)))
    }

    /// Take the bus's only subscription, delivering messages whose topic
    /// matches `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`RsuError::Channel`] if the bus already has a subscriber.
    pub fn subscribe_topic(&self, filter: impl Into<String>) -> Result<TopicSubscriber, RsuError> {
        let receiver = self
            .receiver
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
            .ok_or_else(|| RsuError::Channel("event bus already has a subscriber".to_string()))?;
        Ok(TopicSubscriber {
            filter: filter.into(),
            receiver,
        })
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// The consuming end of an [`EventBus`].  Only delivers messages matching its
/// topic filter.
pub struct TopicSubscriber {
    filter: String,
    receiver: mpsc::Receiver<InboundMessage>,
}

impl TopicSubscriber {
    /// Wait for the next matching message.
    ///
    /// Returns `None` once every clone of the bus has been dropped and the
    /// queue is drained.
    pub async fn recv(&mut self) -> Option<InboundMessage> {
        while let Some(message) = self.receiver.recv().await {
            if topic_matches(&self.filter, &message.topic) {
                return Some(message);
            }
            debug!(filter = %self.filter, topic = %message.topic, "message outside filter");
        }
        None
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }
}

/// MQTT topic-filter matching with `+` and `#` wildcards.
pub fn topic_matches(filter: &str, topic: &str) -> bool {
    let mut filter_levels = filter.split('/');
    let mut topic_levels = topic.split('/');
    loop {
        match (filter_levels.next(), topic_levels.next()) {
            (Some("#"), _) => return true,
            (Some("+"), Some(_)) => continue,
            (Some(f), Some(t)) if f == t => continue,
            (None, None) => return true,
            _ => return false,
        }
    }
}

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A raw message as delivered by a transport.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub id: Uuid,
    pub received_at: DateTime<Utc>,
    /// Transport that produced the message, e.g. `"mqtt"`.
    pub source: String,
    pub topic: String,
    pub payload: Vec<u8>,
}

impl InboundMessage {
    pub fn new(source: impl Into<String>, topic: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            id: Uuid::new_v4(),
            received_at: Utc::now(),
            source: source.into(),
            topic: topic.into(),
            payload,
        }
    }
}

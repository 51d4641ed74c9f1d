//! [`ManualTrigger`] – operator keypress event source.
//!
//! Every line read from the input toggles between an `approach` and a
//! `passed` notification, published on the subscribed topic exactly like a
//! broker message.  Used at the roadside when the dispatch network is down,
//! and for bench testing the lights.
//!
//! A trigger built with [`ManualTrigger::following`] toggles against the
//! actual right of way instead of its own last keypress, so a broker event in
//! between never costs the operator an extra press.

use async_trait::async_trait;
use rsu_types::RsuError;
use serde_json::json;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::adapter::Transport;
use crate::message::InboundMessage;

const EXPLAIN: &str = "manual trigger";

pub struct ManualTrigger<R> {
    lines: Lines<R>,
    topic: Option<String>,
    emergency: bool,
    granted: Option<watch::Receiver<bool>>,
}

impl ManualTrigger<BufReader<Stdin>> {
    /// Trigger driven by lines on standard input.
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin> ManualTrigger<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            topic: None,
            emergency: false,
            granted: None,
        }
    }

    /// Toggle against `granted`, which reports whether the emergency vehicle
    /// currently holds the right of way.
    pub fn following(mut self, granted: watch::Receiver<bool>) -> Self {
        self.granted = Some(granted);
        self
    }

    fn next_payload(&mut self) -> Vec<u8> {
        self.emergency = match &self.granted {
            Some(granted) => !*granted.borrow(),
            None => !self.emergency,
        };
        let event = if self.emergency { "approach" } else { "passed" };
        json!({ "event": event, "explain": EXPLAIN })
            .to_string()
            .into_bytes()
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> Transport for ManualTrigger<R> {
    fn name(&self) -> &str {
        "manual"
    }

    async fn subscribe(&mut self, topic: &str) -> Result<(), RsuError> {
        self.topic = Some(topic.to_string());
        Ok(())
    }

    async fn next_message(&mut self) -> Option<InboundMessage> {
        let Some(topic) = self.topic.clone() else {
            warn!("manual trigger used before subscribe");
            return None;
        };
        match self.lines.next_line().await {
            Ok(Some(_)) => {
                let payload = self.next_payload();
                info!(emergency = self.emergency, "manual trigger pressed");
                Some(InboundMessage::new("manual", topic, payload))
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "manual trigger input failed");
                None
            }
        }
    }
}

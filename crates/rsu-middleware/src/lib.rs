//! `rsu-middleware` – Messaging
//!
//! Routes raw inbound messages from every event source to the controller
//! without caring about their meaning.
//!
//! # Modules
//!
//! - [`message`] – [`InboundMessage`]: one `(topic, payload)` pair.
//! - [`bus`] – bounded single-consumer queue with MQTT-style topic
//!   filters.
//! - [`adapter`] – the [`Transport`] trait every event source implements,
//!   and [`pump`][adapter::pump], which forwards a transport onto the bus.
//! - [`mqtt`] – [`MqttTransport`]: broker-backed source.
//! - [`manual`] – [`ManualTrigger`]: operator keypress source.

pub mod adapter;
pub mod bus;
pub mod manual;
pub mod message;
pub mod mqtt;

pub use adapter::{Transport, pump};
pub use bus::{EventBus, TopicSubscriber, topic_matches};
pub use manual::ManualTrigger;
pub use message::InboundMessage;
pub use mqtt::{MqttSettings, MqttTransport};

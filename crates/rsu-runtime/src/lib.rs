//! `rsu-runtime` – Event controller
//!
//! Turns inbound messages into signal transitions and display frames, one
//! message at a time.
//!
//! # Modules
//!
//! - [`decode`] – [`decode_payload`][decode::decode_payload]: strict JSON
//!   schema for dispatch payloads, producing a typed
//!   [`Notification`][rsu_types::Notification].
//! - [`frame`] – [`DisplayFrame`][frame::DisplayFrame] and
//!   [`center`][frame::center]: fixed-width, centred two-line frames.
//! - [`controller`] – [`EventController`][controller::EventController]: owns
//!   the signal state machine and the display, and drives both for each
//!   event.
//! - [`service`] – [`Service`][service::Service]: the serialized
//!   bus-to-controller loop with scoped shutdown.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: initialises
//!   the global `tracing` subscriber with an optional OTLP span exporter.

pub mod controller;
pub mod decode;
pub mod frame;
pub mod service;
pub mod telemetry;

pub use controller::{EventController, IntersectionContext, Outcome, Timing};
pub use decode::decode_payload;
pub use frame::{DisplayFrame, center};
pub use service::{RunSummary, Service};
pub use telemetry::{LogFormat, TracerProviderGuard, init_tracing};

//! [`Service`] – the long-running bus-to-controller loop.
//!
//! The service is the single consumer of the intersection's topic.  It pulls
//! one message at a time from the [`EventBus`] and awaits
//! [`EventController::handle_payload`] to completion before pulling the
//! next, so an `approach` can never interrupt a yellow dwell.  Per-message
//! failures are logged and counted; they never end the loop.
//!
//! After every message the service publishes whether the emergency vehicle
//! currently holds the right of way, so a local trigger can follow the real
//! light state rather than its own guess.
//!
//! The loop ends when the shutdown signal fires or every publisher is gone.
//! Either way the controller's scoped release runs before `run` returns.

use rsu_middleware::{EventBus, TopicSubscriber};
use rsu_signal::Mode;
use rsu_types::RsuError;
use tokio::sync::watch;
use tracing::{error, info};

use crate::controller::{EventController, Outcome};

/// Counters reported when [`Service::run`] returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub transitions: u64,
    pub already_in_state: u64,
    pub unsupported: u64,
    pub discarded: u64,
    pub faults: u64,
}

impl RunSummary {
    fn record(&mut self, result: &Result<Outcome, RsuError>) {
        match result {
            Ok(Outcome::Transitioned) => self.transitions += 1,
            Ok(Outcome::AlreadyInState) => self.already_in_state += 1,
            Ok(Outcome::Unsupported) => self.unsupported += 1,
            Ok(Outcome::Discarded) => self.discarded += 1,
            Err(_) => self.faults += 1,
        }
    }

    /// Total messages handled.
    pub fn messages(&self) -> u64 {
        self.transitions + self.already_in_state + self.unsupported + self.discarded + self.faults
    }
}

pub struct Service {
    controller: EventController,
    subscriber: TopicSubscriber,
    granted: watch::Sender<bool>,
}

impl Service {
    /// Take the subscription on `bus` now, so nothing published after this
    /// call is missed.
    ///
    /// # Errors
    ///
    /// Returns [`RsuError::Channel`] if `bus` already has a subscriber.
    pub fn new(
        controller: EventController,
        bus: &EventBus,
        topic: impl Into<String>,
    ) -> Result<Self, RsuError> {
        let (granted, _) = watch::channel(controller.mode() == Mode::EmergencyGranted);
        Ok(Self {
            controller,
            subscriber: bus.subscribe_topic(topic)?,
            granted,
        })
    }

    /// `true` while the emergency vehicle holds the right of way.  Updated
    /// after every handled message.
    pub fn granted(&self) -> watch::Receiver<bool> {
        self.granted.subscribe()
    }

    /// Handle messages until `shutdown` becomes `true` (or its sender is
    /// dropped) or the bus closes, then release the outputs.
    ///
    /// # Errors
    ///
    /// Returns the output-release error if the final release failed.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<RunSummary, RsuError> {
        let mut summary = RunSummary::default();
        info!(topic = self.subscriber.filter(), "service started");

        loop {
            if *shutdown.borrow_and_update() {
                info!("shutdown requested");
                break;
            }
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        info!("shutdown sender dropped");
                        break;
                    }
                }
                message = self.subscriber.recv() => {
                    let Some(message) = message else {
                        info!("event bus closed");
                        break;
                    };
                    let result = self.controller.handle_payload(&message.payload).await;
                    if let Err(e) = &result {
                        error!(
                            message_id = %message.id,
                            source = %message.source,
                            error = %e,
                            "event handling failed"
                        );
                    }
                    summary.record(&result);
                    self.granted
                        .send_replace(self.controller.mode() == Mode::EmergencyGranted);
                }
            }
        }

        self.controller.shutdown()?;
        info!(?summary, "service stopped");
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use rsu_hal::{FaultSwitch, OutputLog, SimBank, SimDisplay};
    use rsu_middleware::InboundMessage;
    use rsu_signal::{IntersectionLayout, NoWait, TokioWaiter, Waiter};

    use crate::controller::{IntersectionContext, Timing};

    const TOPIC: &str = "ambulance/web/crossroad/1552";

    fn controller_with(
        log: &OutputLog,
        display: &SimDisplay,
        fault: Option<FaultSwitch>,
        waiter: Arc<dyn Waiter>,
        timing: Timing,
    ) -> EventController {
        let layout = IntersectionLayout::default();
        let mut bank = SimBank::new().with_log(log.clone()).with_lines([17, 27, 22, 14, 18]);
        bank = match fault {
            Some(f) => bank.with_faulty_line(15, f),
            None => bank.with_line(15),
        };
        EventController::new(
            IntersectionContext {
                outputs: bank.build(),
                layout,
                display: Box::new(display.clone()),
                waiter,
            },
            timing,
        )
        .unwrap()
    }

    fn controller(log: &OutputLog, display: &SimDisplay, fault: Option<FaultSwitch>) -> EventController {
        controller_with(log, display, fault, Arc::new(NoWait::new()), Timing::default())
    }

    fn message(topic: &str, payload: &str) -> InboundMessage {
        InboundMessage::new("test", topic, payload.as_bytes().to_vec())
    }

    #[tokio::test]
    async fn drains_bus_in_order_then_releases() -> Result<(), Box<dyn std::error::Error>> {
        let log = OutputLog::new();
        let display = SimDisplay::new(16, 2);
        let bus = EventBus::default();
        let service = Service::new(controller(&log, &display, None), &bus, TOPIC)?;
        let (_tx, rx) = watch::channel(false);

        bus.publish(message(TOPIC, r#"{"event":"approach","in_dir":"동","out_dir":"서"}"#)).await?;
        bus.publish(message(TOPIC, r#"{"event":"arrived"}"#)).await?;
        bus.publish(message("ambulance/web/crossroad/9", r#"{"event":"passed"}"#)).await?;
        bus.publish(message(TOPIC, "garbage")).await?;
        bus.publish(message(TOPIC, r#"{"event":"passed"}"#)).await?;
        drop(bus);

        let summary = service.run(rx).await?;
        assert_eq!(
            summary,
            RunSummary {
                transitions: 2,
                unsupported: 1,
                discarded: 1,
                ..RunSummary::default()
            }
        );
        assert_eq!(summary.messages(), 4);

        // Scoped release: every line ends low and the display is blank.
        let mut last = std::collections::BTreeMap::new();
        for (line, high) in log.entries() {
            last.insert(line, high);
        }
        assert!(last.values().all(|high| !high));
        assert!(display.is_blank());
        Ok(())
    }

    #[tokio::test]
    async fn burst_during_dwell_keeps_every_lifecycle_event() -> Result<(), Box<dyn std::error::Error>> {
        let log = OutputLog::new();
        let display = SimDisplay::new(16, 2);
        let bus = EventBus::default();
        let timing = Timing {
            dwell: Duration::from_millis(50),
            settle: Duration::ZERO,
        };
        let service = Service::new(
            controller_with(&log, &display, None, Arc::new(TokioWaiter), timing),
            &bus,
            TOPIC,
        )?;
        let granted = service.granted();
        let (_tx, rx) = watch::channel(false);

        // Far more than the queue holds arrives while the approach dwell runs.
        let producer = tokio::spawn(async move {
            bus.publish(message(TOPIC, r#"{"event":"approach"}"#)).await?;
            bus.publish(message(TOPIC, r#"{"event":"passed"}"#)).await?;
            for _ in 0..100 {
                bus.publish(message(TOPIC, r#"{"event":"arrived"}"#)).await?;
            }
            Ok::<_, RsuError>(())
        });

        let summary = service.run(rx).await?;
        producer.await??;
        assert_eq!(
            summary,
            RunSummary {
                transitions: 2,
                unsupported: 100,
                ..RunSummary::default()
            }
        );
        assert!(!*granted.borrow());
        Ok(())
    }

    #[tokio::test]
    async fn granted_follows_light_state() -> Result<(), Box<dyn std::error::Error>> {
        let log = OutputLog::new();
        let display = SimDisplay::new(16, 2);
        let bus = EventBus::default();
        let service = Service::new(controller(&log, &display, None), &bus, TOPIC)?;
        let mut granted = service.granted();
        assert!(!*granted.borrow_and_update());
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(service.run(rx));

        bus.publish(message(TOPIC, r#"{"event":"approach"}"#)).await?;
        granted.changed().await?;
        assert!(*granted.borrow_and_update());

        bus.publish(message(TOPIC, r#"{"event":"passed"}"#)).await?;
        granted.changed().await?;
        assert!(!*granted.borrow_and_update());

        tx.send(true)?;
        handle.await??;
        Ok(())
    }

    #[tokio::test]
    async fn shutdown_signal_stops_idle_service() -> Result<(), Box<dyn std::error::Error>> {
        let log = OutputLog::new();
        let display = SimDisplay::new(16, 2);
        let bus = EventBus::default();
        let service = Service::new(controller(&log, &display, None), &bus, TOPIC)?;
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(service.run(rx));
        tx.send(true)?;
        let summary = handle.await??;
        assert_eq!(summary.messages(), 0);
        // bus is still open; the loop ended on the signal
        drop(bus);
        Ok(())
    }

    #[tokio::test]
    async fn second_service_on_one_bus_is_refused() {
        let log = OutputLog::new();
        let display = SimDisplay::new(16, 2);
        let bus = EventBus::default();
        let _first = Service::new(controller(&log, &display, None), &bus, TOPIC).unwrap();
        let second = Service::new(controller(&OutputLog::new(), &SimDisplay::new(16, 2), None), &bus, TOPIC);
        assert!(matches!(second, Err(RsuError::Channel(_))));
    }

    #[tokio::test]
    async fn hardware_fault_does_not_stop_the_loop() -> Result<(), Box<dyn std::error::Error>> {
        let log = OutputLog::new();
        let display = SimDisplay::new(16, 2);
        let fault = FaultSwitch::new();
        let bus = EventBus::default();
        let service = Service::new(controller(&log, &display, Some(fault.clone())), &bus, TOPIC)?;
        let (_tx, rx) = watch::channel(false);

        fault.fail_next(1);
        bus.publish(message(TOPIC, r#"{"event":"approach"}"#)).await?;
        bus.publish(message(TOPIC, r#"{"event":"approach"}"#)).await?;
        drop(bus);

        let summary = service.run(rx).await?;
        assert_eq!(summary.faults, 1);
        assert_eq!(summary.transitions, 1);
        Ok(())
    }
}

//! [`EventController`] – turns decoded events into light transitions and
//! display frames.
//!
//! The controller is the only caller of the [`SignalStateMachine`] and the
//! only writer to the display.  It takes `&mut self` for every event, so
//! events are handled strictly one at a time, dwell and settle delays
//! included.
//!
//! | Event | Display | Lights |
//! |---|---|---|
//! | `approach` | `!!EMERGENCY!!` + route | [`SignalStateMachine::to_emergency`] |
//! | `passed` | settle delay, then `CLEAR` | [`SignalStateMachine::to_default`] |
//! | `arrived` / other | – | – |
//!
//! Display writes are best-effort: a failure is logged and the light
//! transition still runs.  Light failures are returned to the caller after
//! the state machine has forced all-red.

use std::sync::Arc;
use std::time::Duration;

use rsu_hal::{CharDisplay, OutputBank};
use rsu_signal::{IntersectionLayout, IntersectionState, Mode, SignalStateMachine, Transition, Waiter};
use rsu_types::{EmergencyEvent, RsuError};
use tracing::{debug, error, info, instrument, warn};

use crate::decode::decode_payload;
use crate::frame::DisplayFrame;

/// What [`EventController::handle`] did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A full light sequence ran.
    Transitioned,
    /// The lights were already in the requested mode.
    AlreadyInState,
    /// The event was understood but is not actionable.
    Unsupported,
    /// The payload could not be decoded and was dropped.
    Discarded,
}

impl From<Transition> for Outcome {
    fn from(t: Transition) -> Self {
        match t {
            Transition::Completed => Outcome::Transitioned,
            Transition::AlreadyInState => Outcome::AlreadyInState,
        }
    }
}

/// Delays applied by the controller and its state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// How long the yielding head shows yellow.
    pub dwell: Duration,
    /// Pause between a `passed` event and the display update.
    pub settle: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            dwell: Duration::from_secs(1),
            settle: Duration::from_millis(200),
        }
    }
}

/// Everything the controller takes ownership of.
pub struct IntersectionContext {
    pub outputs: OutputBank,
    pub layout: IntersectionLayout,
    pub display: Box<dyn CharDisplay>,
    pub waiter: Arc<dyn Waiter>,
}

pub struct EventController {
    signals: SignalStateMachine,
    display: Box<dyn CharDisplay>,
    waiter: Arc<dyn Waiter>,
    settle: Duration,
    frame: Option<DisplayFrame>,
    released: bool,
}

impl EventController {
    /// Claim the outputs, put the lights in their default mode and blank the
    /// display.
    ///
    /// # Errors
    ///
    /// Any error here is a startup failure: the lines could not be claimed,
    /// the initial state could not be applied, or the display could not be
    /// opened.
    pub fn new(ctx: IntersectionContext, timing: Timing) -> Result<Self, RsuError> {
        let IntersectionContext {
            outputs,
            layout,
            mut display,
            waiter,
        } = ctx;
        let (columns, rows) = (display.columns(), display.rows());
        if rows < 2 || columns == 0 {
            return Err(RsuError::Config(format!(
                "display must be at least 1x2, got {columns}x{rows}"
            )));
        }
        let signals = SignalStateMachine::new(outputs, layout, timing.dwell, Arc::clone(&waiter))?;
        display.clear()?;
        info!(
            columns,
            rows,
            dwell_ms = timing.dwell.as_millis() as u64,
            settle_ms = timing.settle.as_millis() as u64,
            "event controller ready"
        );
        Ok(Self {
            signals,
            display,
            waiter,
            settle: timing.settle,
            frame: None,
            released: false,
        })
    }

    pub fn mode(&self) -> Mode {
        self.signals.mode()
    }

    pub fn state(&self) -> IntersectionState {
        self.signals.state()
    }

    /// The frame most recently sent to the display, if any.
    pub fn frame(&self) -> Option<&DisplayFrame> {
        self.frame.as_ref()
    }

    pub fn signals(&self) -> &SignalStateMachine {
        &self.signals
    }

    /// Decode `payload` and handle the event it carries.
    ///
    /// Undecodable payloads are logged and reported as
    /// [`Outcome::Discarded`]; they never change state.
    ///
    /// # Errors
    ///
    /// Same as [`handle`][Self::handle].
    pub async fn handle_payload(&mut self, payload: &[u8]) -> Result<Outcome, RsuError> {
        let note = match decode_payload(payload) {
            Ok(note) => note,
            Err(e) => {
                warn!(error = %e, bytes = payload.len(), "discarding message");
                return Ok(Outcome::Discarded);
            }
        };
        info!(
            event = note.event.kind(),
            explain = note.explain.as_deref().unwrap_or(""),
            "event received"
        );
        self.handle(note.event).await
    }

    /// Apply one event.
    ///
    /// # Errors
    ///
    /// Returns [`RsuError::HardwareFault`] when an output write failed.  The
    /// lights have then been forced red and the controller is ready for the
    /// next event.
    #[instrument(skip(self), fields(mode = ?self.signals.mode()))]
    pub async fn handle(&mut self, event: EmergencyEvent) -> Result<Outcome, RsuError> {
        match event {
            EmergencyEvent::Approach {
                in_direction,
                out_direction,
                turn,
            } => {
                let frame = DisplayFrame::emergency(
                    self.display.columns(),
                    in_direction.as_ref(),
                    out_direction.as_ref(),
                    turn.as_ref(),
                );
                self.show(frame);
                Ok(self.signals.to_emergency().await?.into())
            }
            EmergencyEvent::Passed => {
                self.waiter.wait(self.settle).await;
                self.show(DisplayFrame::clear(self.display.columns()));
                Ok(self.signals.to_default().await?.into())
            }
            other => {
                let e = RsuError::UnsupportedEvent(other.kind().to_string());
                debug!(error = %e, "event ignored");
                Ok(Outcome::Unsupported)
            }
        }
    }

    /// Blank the display and drive every output line low.
    ///
    /// Runs at most once; [`Drop`] calls it if the owner did not.
    ///
    /// # Errors
    ///
    /// Returns the first output-line error.  Display errors are logged only.
    pub fn shutdown(&mut self) -> Result<(), RsuError> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        if let Err(e) = self.display.clear() {
            warn!(error = %e, "display could not be cleared on shutdown");
        }
        self.frame = None;
        let result = self.signals.release();
        match &result {
            Ok(()) => info!("outputs released"),
            Err(e) => error!(error = %e, "output release incomplete"),
        }
        result
    }

    fn show(&mut self, frame: DisplayFrame) {
        let [top, bottom] = frame.lines();
        info!(top = top.trim(), bottom = bottom.trim(), "display frame");
        if let Err(e) = frame.render(self.display.as_mut()) {
            warn!(error = %e, "display update failed; continuing with lights");
        }
        self.frame = Some(frame);
    }
}

impl Drop for EventController {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

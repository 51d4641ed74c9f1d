//! [`SignalStateMachine`] – the two-head right-of-way state machine.
//!
//! Two steady modes alternate indefinitely:
//!
//! | Mode | head 1 | head 2 |
//! |---|---|---|
//! | [`Mode::Default`] | red | green |
//! | [`Mode::EmergencyGranted`] | green | red |
//!
//! Every transition runs the same sequence with the head roles swapped: the
//! yielding head shows yellow for the dwell interval, then red, and only then
//! is the granted head raised to green.  Driving a head always forces all of
//! its lines low before raising the target line, so at most one colour per
//! head is ever lit.
//!
//! If any output write fails the transition stops, both heads are driven to
//! red as far as the hardware allows, and the machine reports
//! [`Mode::Unknown`] until the next transition completes.

use std::sync::Arc;
use std::time::Duration;

use rsu_hal::OutputBank;
use rsu_types::{Color, HeadId, RsuError};
use tracing::{error, info, instrument};

use crate::head::IntersectionLayout;
use crate::interlock;
use crate::waiter::Waiter;

/// Right-of-way mode of the intersection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Head 1 red, head 2 green.  Initial mode.
    Default,
    /// Head 1 green, head 2 red.
    EmergencyGranted,
    /// A transition failed or the outputs were released.
    Unknown,
}

/// Colour currently lit on each head.  `None` means dark or undefined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntersectionState {
    pub head1: Option<Color>,
    pub head2: Option<Color>,
}

impl IntersectionState {
    pub const DEFAULT: Self = Self {
        head1: Some(Color::Red),
        head2: Some(Color::Green),
    };

    pub const EMERGENCY_GRANTED: Self = Self {
        head1: Some(Color::Green),
        head2: Some(Color::Red),
    };

    pub const DARK: Self = Self {
        head1: None,
        head2: None,
    };

    pub fn head(&self, head: HeadId) -> Option<Color> {
        match head {
            HeadId::Head1 => self.head1,
            HeadId::Head2 => self.head2,
        }
    }
}

/// Result of a successful transition request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The full light sequence ran.
    Completed,
    /// The machine was already in the requested mode; no line was touched.
    AlreadyInState,
}

/// Owns the output lines of both heads and sequences every change to them.
pub struct SignalStateMachine {
    bank: OutputBank,
    layout: IntersectionLayout,
    state: IntersectionState,
    mode: Mode,
    dwell: Duration,
    waiter: Arc<dyn Waiter>,
}

impl SignalStateMachine {
    /// Claim the layout's lines from `bank` and drive the intersection into
    /// [`Mode::Default`].
    ///
    /// # Errors
    ///
    /// - [`RsuError::Config`] – the layout reuses a line.
    /// - [`RsuError::HardwareFault`] – a line is missing or the initial
    ///   state could not be applied.  Both are fatal at startup.
    pub fn new(
        bank: OutputBank,
        layout: IntersectionLayout,
        dwell: Duration,
        waiter: Arc<dyn Waiter>,
    ) -> Result<Self, RsuError> {
        layout.validate()?;
        bank.claim(&layout.line_ids())?;

        let mut machine = Self {
            bank,
            layout,
            state: IntersectionState::DARK,
            mode: Mode::Unknown,
            dwell,
            waiter,
        };
        for line in machine.layout.line_ids() {
            machine.bank.set_output(line, false)?;
        }
        machine.drive(HeadId::Head1, Color::Red)?;
        machine.drive(HeadId::Head2, Color::Green)?;
        machine.mode = Mode::Default;
        info!("signal heads initialised: head1 red / head2 green");
        Ok(machine)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn state(&self) -> IntersectionState {
        self.state
    }

    pub fn dwell(&self) -> Duration {
        self.dwell
    }

    pub fn layout(&self) -> &IntersectionLayout {
        &self.layout
    }

    /// Read-only view of the output lines.
    pub fn bank(&self) -> &OutputBank {
        &self.bank
    }

    /// Give head 1 the right of way: head 2 yellow, dwell, head 2 red,
    /// head 1 green.
    ///
    /// # Errors
    ///
    /// Returns [`RsuError::HardwareFault`] after attempting the all-red
    /// fail-safe; the machine is then in [`Mode::Unknown`].
    #[instrument(skip(self), fields(from = ?self.mode))]
    pub async fn to_emergency(&mut self) -> Result<Transition, RsuError> {
        if self.mode == Mode::EmergencyGranted {
            return Ok(Transition::AlreadyInState);
        }
        self.run_sequence(HeadId::Head2, HeadId::Head1, Mode::EmergencyGranted)
            .await
    }

    /// Return to the default right of way: head 1 yellow, dwell, head 1 red,
    /// head 2 green.
    ///
    /// # Errors
    ///
    /// Same as [`to_emergency`][Self::to_emergency].
    #[instrument(skip(self), fields(from = ?self.mode))]
    pub async fn to_default(&mut self) -> Result<Transition, RsuError> {
        if self.mode == Mode::Default {
            return Ok(Transition::AlreadyInState);
        }
        self.run_sequence(HeadId::Head1, HeadId::Head2, Mode::Default)
            .await
    }

    /// Force every output line low.  The machine is [`Mode::Unknown`]
    /// afterwards.
    pub fn release(&mut self) -> Result<(), RsuError> {
        self.state = IntersectionState::DARK;
        self.mode = Mode::Unknown;
        self.bank.release_all()
    }

    async fn run_sequence(
        &mut self,
        yielding: HeadId,
        granted: HeadId,
        target: Mode,
    ) -> Result<Transition, RsuError> {
        match self.sequence(yielding, granted).await {
            Ok(()) => {
                self.mode = target;
                info!(mode = ?target, "signal transition complete");
                Ok(Transition::Completed)
            }
            Err(e) => {
                error!(error = %e, "signal transition failed; forcing all-red");
                self.fail_safe();
                Err(e)
            }
        }
    }

    async fn sequence(&mut self, yielding: HeadId, granted: HeadId) -> Result<(), RsuError> {
        self.drive(yielding, Color::Yellow)?;
        self.waiter.wait(self.dwell).await;
        self.drive(yielding, Color::Red)?;
        self.drive(granted, Color::Green)
    }

    /// All of `head`'s lines low, then the `color` line high.
    fn drive(&mut self, head: HeadId, color: Color) -> Result<(), RsuError> {
        if color == Color::Green {
            let opposing = head.opposing();
            interlock::check_green(&self.bank, opposing, self.layout.lines(opposing))?;
        }
        let lines = *self.layout.lines(head);
        self.set_lit(head, None);
        for line in lines.all() {
            self.bank.set_output(line, false)?;
        }
        self.bank.set_output(lines.line(color), true)?;
        self.set_lit(head, Some(color));
        info!(head = %head, color = %color, "head driven");
        Ok(())
    }

    fn fail_safe(&mut self) {
        self.mode = Mode::Unknown;
        for head in [HeadId::Head1, HeadId::Head2] {
            if let Err(e) = self.force_red(head) {
                error!(head = %head, error = %e, "fail-safe could not force head red");
            }
        }
    }

    /// Lower yellow and green, then raise red even if lowering failed.
    fn force_red(&mut self, head: HeadId) -> Result<(), RsuError> {
        let lines = *self.layout.lines(head);
        self.set_lit(head, None);
        let mut first_err = None;
        for line in [lines.green, lines.yellow] {
            if let Err(e) = self.bank.set_output(line, false) {
                first_err.get_or_insert(e);
            }
        }
        self.bank.set_output(lines.red, true)?;
        match first_err {
            Some(e) => Err(e),
            None => {
                self.set_lit(head, Some(Color::Red));
                Ok(())
            }
        }
    }

    fn set_lit(&mut self, head: HeadId, color: Option<Color>) {
        match head {
            HeadId::Head1 => self.state.head1 = color,
            HeadId::Head2 => self.state.head2 = color,
        }
    }
}

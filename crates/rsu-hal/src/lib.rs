//! `rsu-hal` – Output and display abstractions.
//!
//! The signal controller never touches GPIO or I²C directly.  It talks to the
//! traits in this crate, so drivers can be swapped without touching the state
//! machine.
//!
//! # Modules
//!
//! - [`output`] – [`OutputLine`][output::OutputLine]: one binary output line.
//! - [`bank`] – [`OutputBank`][bank::OutputBank]: registry of output lines
//!   addressed by [`LineId`][rsu_types::LineId].
//! - [`display`] – [`CharDisplay`][display::CharDisplay]: fixed-size
//!   character grid with cursor addressing.
//! - [`sim`] – in-process simulated drivers for headless runs and tests.

pub mod bank;
pub mod display;
pub mod output;
pub mod sim;

pub use bank::OutputBank;
pub use display::CharDisplay;
pub use output::OutputLine;
pub use sim::{FaultSwitch, OutputLog, SimBank, SimDisplay, SimLine};

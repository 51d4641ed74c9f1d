//! `rsu-signal` – Signal state machine
//!
//! Owns the output lines of both traffic-light heads and is the only code that
//! writes to them.
//!
//! # Modules
//!
//! - [`head`] – [`HeadLines`][head::HeadLines] and
//!   [`IntersectionLayout`][head::IntersectionLayout]: which output line
//!   drives which colour of which head.
//! - [`interlock`] – refuses to raise a green while the opposing head is not
//!   solidly red.
//! - [`machine`] – [`SignalStateMachine`][machine::SignalStateMachine]: the
//!   `Default` ⇄ `EmergencyGranted` transitions with yellow dwell and all-red
//!   fail-safe.
//! - [`waiter`] – [`Waiter`][waiter::Waiter]: injectable time source used for
//!   every delay, so tests never sleep.

pub mod head;
pub mod interlock;
pub mod machine;
pub mod waiter;

pub use head::{HeadLines, IntersectionLayout};
pub use machine::{IntersectionState, Mode, SignalStateMachine, Transition};
pub use waiter::{NoWait, TokioWaiter, Waiter};

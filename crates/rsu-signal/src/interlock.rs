//! Green interlock.
//!
//! Before a head is allowed to show green, the opposing head must be solidly
//! red on the physical lines: red high, yellow and green low.  The check reads
//! the levels the [`OutputBank`] last applied rather than the state machine's
//! bookkeeping, so a bookkeeping bug cannot produce a dual green.

use rsu_hal::OutputBank;
use rsu_types::{HeadId, RsuError};

use crate::head::HeadLines;

/// Verify that `opposing` (wired to `lines`) is showing red only.
///
/// Unregistered lines count as unsafe.
///
/// # Errors
///
/// Returns [`RsuError::HardwareFault`] with component `"interlock"` when the
/// opposing head is not solidly red.
pub fn check_green(bank: &OutputBank, opposing: HeadId, lines: &HeadLines) -> Result<(), RsuError> {
    let red = bank.level(lines.red).unwrap_or(false);
    let yellow = bank.level(lines.yellow).unwrap_or(true);
    let green = bank.level(lines.green).unwrap_or(true);
    if red && !yellow && !green {
        return Ok(());
    }
    Err(RsuError::hardware(
        "interlock",
        format!("{opposing} is not red (red={red}, yellow={yellow}, green={green})"),
    ))
}

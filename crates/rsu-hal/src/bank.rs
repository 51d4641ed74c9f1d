//! [`OutputBank`] – registry of binary output lines.
//!
//! The bank stores every registered [`OutputLine`] driver keyed by its
//! [`LineId`] and exposes the single `set_output(line, level)` operation the
//! signal state machine uses.  At startup [`OutputBank::claim`] verifies that
//! every line the intersection layout needs is actually present; a missing
//! line is a fatal bring-up error.

use std::collections::BTreeMap;

use rsu_types::{LineId, RsuError};
use tracing::{debug, warn};

use crate::output::OutputLine;

/// Registry of output-line drivers addressed by [`LineId`].
#[derive(Default)]
pub struct OutputBank {
    lines: BTreeMap<LineId, Box<dyn OutputLine>>,
}

impl OutputBank {
    /// Create an empty bank.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a line driver.  Any previously registered driver with the
    /// same id is replaced.
    pub fn register_line(&mut self, line: Box<dyn OutputLine>) {
        self.lines.insert(line.id(), line);
    }

    /// Verify that every id in `ids` is registered.
    ///
    /// # Errors
    ///
    /// Returns [`RsuError::HardwareFault`] naming the first missing line.
    pub fn claim(&self, ids: &[LineId]) -> Result<(), RsuError> {
        for id in ids {
            if !self.lines.contains_key(id) {
                return Err(RsuError::hardware(
                    format!("line {id}"),
                    "line is not registered",
                ));
            }
        }
        Ok(())
    }

    /// Drive `line` high or low.
    ///
    /// # Errors
    ///
    /// Returns [`RsuError::HardwareFault`] when the line is not registered or
    /// the driver rejects the write.
    pub fn set_output(&mut self, line: LineId, high: bool) -> Result<(), RsuError> {
        match self.lines.get_mut(&line) {
            Some(driver) => {
                driver.set_level(high)?;
                debug!(line, high, "output line set");
                Ok(())
            }
            None => Err(RsuError::hardware(
                format!("line {line}"),
                "line is not registered",
            )),
        }
    }

    /// Most recently applied level of `line`, or `None` if unregistered.
    pub fn level(&self, line: LineId) -> Option<bool> {
        self.lines.get(&line).map(|driver| driver.level())
    }

    /// Force every registered line low.
    ///
    /// Every line is attempted even if an earlier one fails; the first error
    /// is returned.
    pub fn release_all(&mut self) -> Result<(), RsuError> {
        let mut first_err = None;
        for (id, driver) in self.lines.iter_mut() {
            if let Err(e) = driver.set_level(false) {
                warn!(line = *id, error = %e, "failed to release output line");
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockLine {
        id: LineId,
        high: bool,
        broken: bool,
    }

    impl MockLine {
        fn new(id: LineId) -> Box<Self> {
            Box::new(Self {
                id,
                high: false,
                broken: false,
            })
        }

        fn broken(id: LineId) -> Box<Self> {
            Box::new(Self {
                id,
                high: false,
                broken: true,
            })
        }
    }

    impl OutputLine for MockLine {
        fn id(&self) -> LineId {
            self.id
        }
        fn set_level(&mut self, high: bool) -> Result<(), RsuError> {
            if self.broken {
                return Err(RsuError::hardware(format!("line {}", self.id), "stuck"));
            }
            self.high = high;
            Ok(())
        }
        fn level(&self) -> bool {
            self.high
        }
    }

    #[test]
    fn set_output_drives_registered_line() {
        let mut bank = OutputBank::new();
        bank.register_line(MockLine::new(17));

        bank.set_output(17, true).unwrap();
        assert_eq!(bank.level(17), Some(true));

        bank.set_output(17, false).unwrap();
        assert_eq!(bank.level(17), Some(false));
    }

    #[test]
    fn set_output_missing_line_returns_error() {
        let mut bank = OutputBank::new();
        let result = bank.set_output(99, true);
        assert!(matches!(result, Err(RsuError::HardwareFault { .. })));
    }

    #[test]
    fn claim_reports_missing_line() {
        let mut bank = OutputBank::new();
        bank.register_line(MockLine::new(17));
        bank.register_line(MockLine::new(27));

        assert!(bank.claim(&[17, 27]).is_ok());
        let err = bank.claim(&[17, 22]).unwrap_err();
        assert!(err.to_string().contains("line 22"));
    }

    #[test]
    fn release_all_attempts_every_line() {
        let mut bank = OutputBank::new();
        bank.register_line(MockLine::new(14));
        bank.register_line(MockLine::broken(15));
        bank.register_line(MockLine::new(18));
        bank.set_output(14, true).unwrap();
        bank.set_output(18, true).unwrap();

        assert!(bank.release_all().is_err());
        // The healthy lines on either side of the broken one were still released.
        assert_eq!(bank.level(14), Some(false));
        assert_eq!(bank.level(18), Some(false));
    }

    #[test]
    fn re_registering_line_replaces_old_driver() {
        let mut bank = OutputBank::new();
        bank.register_line(MockLine::new(22));
        bank.set_output(22, true).unwrap();

        bank.register_line(MockLine::new(22));
        assert_eq!(bank.level(22), Some(false));
        assert_eq!(bank.lines.len(), 1);
    }

    #[test]
    fn unregistered_line_has_no_level() {
        let bank = OutputBank::new();
        assert_eq!(bank.level(5), None);
    }
}

//! Generic `OutputLine` trait for binary output hardware (lamp drivers, GPIO
//! pins, relay boards).

use rsu_types::{LineId, RsuError};

/// A single binary output line.
///
/// Drivers implement this trait and register themselves with an
/// [`OutputBank`][crate::bank::OutputBank].
pub trait OutputLine: Send + Sync {
    /// Stable identifier for this line, e.g. BCM pin `17`.
    fn id(&self) -> LineId;

    /// Drive the line `high` (`true`) or low (`false`).
    ///
    /// # Errors
    ///
    /// Returns [`RsuError::HardwareFault`] if the level cannot be applied.
    fn set_level(&mut self, high: bool) -> Result<(), RsuError>;

    /// Return the most recently applied level.
    fn level(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockLine {
        id: LineId,
        high: bool,
    }

    impl OutputLine for MockLine {
        fn id(&self) -> LineId {
            self.id
        }

        fn set_level(&mut self, high: bool) -> Result<(), RsuError> {
            self.high = high;
            Ok(())
        }

        fn level(&self) -> bool {
            self.high
        }
    }

    #[test]
    fn mock_line_toggle() {
        let mut line = MockLine { id: 17, high: false };
        assert_eq!(line.id(), 17);
        assert!(!line.level());

        line.set_level(true).unwrap();
        assert!(line.level());

        line.set_level(false).unwrap();
        assert!(!line.level());
    }
}

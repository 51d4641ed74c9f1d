//! Generic `CharDisplay` trait for fixed-size character displays (HD44780
//! style LCDs behind an I²C expander, VFDs, terminal mock-ups).

use rsu_types::RsuError;

/// A fixed-size character grid with cursor addressing.
///
/// Text written past the last column is dropped; the display never scrolls.
pub trait CharDisplay: Send {
    /// Number of character columns per row.
    fn columns(&self) -> usize;

    /// Number of rows.
    fn rows(&self) -> usize;

    /// Blank every cell.
    ///
    /// # Errors
    ///
    /// Returns [`RsuError::HardwareFault`] when the device rejects the write.
    fn clear(&mut self) -> Result<(), RsuError>;

    /// Write `text` starting at (`row`, `col`).
    ///
    /// # Errors
    ///
    /// Returns [`RsuError::HardwareFault`] when the position is outside the
    /// grid or the device rejects the write.
    fn write_at(&mut self, row: usize, col: usize, text: &str) -> Result<(), RsuError>;
}

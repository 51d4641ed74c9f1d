//! In-process simulated drivers for running the controller without a board.
//!
//! [`SimBank`] builds an [`OutputBank`] pre-populated with [`SimLine`]
//! drivers.  Lines can share an [`OutputLog`] that records every write in
//! order, and a [`FaultSwitch`] can be armed to make the next writes fail.
//! [`SimDisplay`] is a character grid whose clones share one buffer, so a
//! test can keep a handle after giving the display to the controller.
//!
//! # Example
//!
//! ```rust
//! use rsu_hal::sim::{OutputLog, SimBank};
//!
//! let log = OutputLog::new();
//! let mut bank = SimBank::new().with_log(log.clone()).with_lines([17, 27, 22]).build();
//!
//! bank.set_output(17, true).expect("sim line must succeed");
//! assert_eq!(log.entries(), vec![(17, true)]);
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use rsu_types::{LineId, RsuError};
use tracing::debug;

use crate::bank::OutputBank;
use crate::display::CharDisplay;
use crate::output::OutputLine;

// ────────────────────────────────────────────────────────────────────────────
// Shared recorders
// ────────────────────────────────────────────────────────────────────────────

/// Ordered record of every `(line, level)` write made through [`SimLine`]s
/// that share it.
#[derive(Clone, Default, Debug)]
pub struct OutputLog(Arc<Mutex<Vec<(LineId, bool)>>>);

impl OutputLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(LineId, bool)>> {
        // A panicking writer cannot leave a Vec half-pushed.
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, line: LineId, high: bool) {
        self.lock().push((line, high));
    }

    /// Snapshot of every write so far.
    pub fn entries(&self) -> Vec<(LineId, bool)> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

/// Arms a simulated driver to fail its next `n` writes.
#[derive(Clone, Default, Debug)]
pub struct FaultSwitch(Arc<AtomicUsize>);

impl FaultSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` writes through this switch fail.
    pub fn fail_next(&self, n: usize) {
        self.0.store(n, Ordering::SeqCst);
    }

    /// Consume one pending failure.  Returns `true` if the write must fail.
    fn trip(&self) -> bool {
        self.0
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Simulated output line
// ────────────────────────────────────────────────────────────────────────────

/// A simulated output line that records its level.  Succeeds unless its
/// [`FaultSwitch`] is armed.
pub struct SimLine {
    id: LineId,
    high: bool,
    log: Option<OutputLog>,
    fault: FaultSwitch,
}

impl SimLine {
    /// Create a new simulated line, initially low.
    pub fn new(id: LineId) -> Box<Self> {
        Box::new(Self {
            id,
            high: false,
            log: None,
            fault: FaultSwitch::new(),
        })
    }

    /// Record every successful write in `log`.
    pub fn with_log(mut self: Box<Self>, log: OutputLog) -> Box<Self> {
        self.log = Some(log);
        self
    }

    /// Fail writes while `fault` is armed.
    pub fn with_fault(mut self: Box<Self>, fault: FaultSwitch) -> Box<Self> {
        self.fault = fault;
        self
    }
}

impl OutputLine for SimLine {
    fn id(&self) -> LineId {
        self.id
    }

    fn set_level(&mut self, high: bool) -> Result<(), RsuError> {
        if self.fault.trip() {
            return Err(RsuError::hardware(
                format!("line {}", self.id),
                "simulated write failure",
            ));
        }
        self.high = high;
        if let Some(log) = &self.log {
            log.record(self.id, high);
        }
        Ok(())
    }

    fn level(&self) -> bool {
        self.high
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Simulated character display
// ────────────────────────────────────────────────────────────────────────────

/// A simulated character display.  Clones share the same grid.
#[derive(Clone)]
pub struct SimDisplay {
    columns: usize,
    rows: usize,
    grid: Arc<Mutex<Vec<Vec<char>>>>,
    fault: FaultSwitch,
}

impl SimDisplay {
    /// Create a blank `columns` × `rows` display.
    pub fn new(columns: usize, rows: usize) -> Self {
        Self {
            columns,
            rows,
            grid: Arc::new(Mutex::new(vec![vec![' '; columns]; rows])),
            fault: FaultSwitch::new(),
        }
    }

    /// Fail writes while `fault` is armed.
    pub fn with_fault(mut self, fault: FaultSwitch) -> Self {
        self.fault = fault;
        self
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Vec<char>>> {
        self.grid.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Current text of every row, each exactly `columns` characters.
    pub fn lines(&self) -> Vec<String> {
        self.lock().iter().map(|row| row.iter().collect()).collect()
    }

    /// `true` when every cell is blank.
    pub fn is_blank(&self) -> bool {
        self.lock().iter().flatten().all(|c| *c == ' ')
    }

    fn check_fault(&self) -> Result<(), RsuError> {
        if self.fault.trip() {
            return Err(RsuError::hardware("display", "simulated write failure"));
        }
        Ok(())
    }
}

impl CharDisplay for SimDisplay {
    fn columns(&self) -> usize {
        self.columns
    }

    fn rows(&self) -> usize {
        self.rows
    }

    fn clear(&mut self) -> Result<(), RsuError> {
        self.check_fault()?;
        for row in self.lock().iter_mut() {
            row.fill(' ');
        }
        debug!("display cleared");
        Ok(())
    }

    fn write_at(&mut self, row: usize, col: usize, text: &str) -> Result<(), RsuError> {
        self.check_fault()?;
        if row >= self.rows || col >= self.columns {
            return Err(RsuError::hardware(
                "display",
                format!("cursor ({row}, {col}) outside {}x{} grid", self.columns, self.rows),
            ));
        }
        let mut grid = self.lock();
        for (cell, ch) in grid[row][col..].iter_mut().zip(text.chars()) {
            *cell = ch;
        }
        debug!(row, col, text, "display write");
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SimBank builder
// ────────────────────────────────────────────────────────────────────────────

/// Builder that constructs an [`OutputBank`] pre-populated with [`SimLine`]
/// drivers.
#[derive(Default)]
pub struct SimBank {
    log: Option<OutputLog>,
    lines: Vec<Box<SimLine>>,
}

impl SimBank {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Share `log` with every line added after this call.
    pub fn with_log(mut self, log: OutputLog) -> Self {
        self.log = Some(log);
        self
    }

    /// Add one simulated line.
    pub fn with_line(mut self, id: LineId) -> Self {
        let line = self.make_line(id);
        self.lines.push(line);
        self
    }

    /// Add one simulated line per id.
    pub fn with_lines(mut self, ids: impl IntoIterator<Item = LineId>) -> Self {
        for id in ids {
            let line = self.make_line(id);
            self.lines.push(line);
        }
        self
    }

    /// Add a simulated line whose writes fail while `fault` is armed.
    pub fn with_faulty_line(mut self, id: LineId, fault: FaultSwitch) -> Self {
        let line = self.make_line(id).with_fault(fault);
        self.lines.push(line);
        self
    }

    fn make_line(&self, id: LineId) -> Box<SimLine> {
        match &self.log {
            Some(log) => SimLine::new(id).with_log(log.clone()),
            None => SimLine::new(id),
        }
    }

    /// Consume the builder and return the configured [`OutputBank`].
    pub fn build(self) -> OutputBank {
        let mut bank = OutputBank::new();
        for line in self.lines {
            bank.register_line(line);
        }
        bank
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

//! Log-backed character display.
//!
//! Keeps a 16x2 text buffer and implements [`DisplayPort`] on it.  Each
//! write is echoed to the log; [`row`](LogDisplay::row) exposes the buffer
//! for tests.  An LCD1602 driver would implement the same port.

use log::debug;

use crate::app::ports::DisplayPort;
use crate::error::ActuatorError;

pub const COLS: usize = 16;
pub const ROWS: usize = 2;

pub struct LogDisplay {
    cells: [[char; COLS]; ROWS],
}

impl Default for LogDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl LogDisplay {
    pub fn new() -> Self {
        Self {
            cells: [[' '; COLS]; ROWS],
        }
    }

    /// Current contents of `row`, trailing blanks included.
    pub fn row(&self, row: usize) -> String {
        self.cells.get(row).map(|r| r.iter().collect()).unwrap_or_default()
    }
}

impl DisplayPort for LogDisplay {
    /// Text past the last column is clipped; an off-screen origin fails.
    fn write_at(&mut self, col: u8, row: u8, text: &str) -> Result<(), ActuatorError> {
        let (col, row) = (usize::from(col), usize::from(row));
        if row >= ROWS || col >= COLS {
            return Err(ActuatorError::DisplayWriteFailed);
        }
        for (cell, ch) in self.cells[row][col..].iter_mut().zip(text.chars()) {
            *cell = ch;
        }
        debug!("lcd[{}]: {}", row, self.row(row));
        Ok(())
    }
}

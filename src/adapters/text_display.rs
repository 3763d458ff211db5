//! In-memory 2×16 character display.
//!
//! Implements [`CharacterDisplay`] on a framebuffer so the host build can
//! render screens and tests can read them back as text. Writes past the
//! end of a line are dropped, like a real HD44780 in 2-line mode with the
//! shift disabled.

use crate::app::ports::CharacterDisplay;

pub const ROWS: usize = 2;
pub const COLS: usize = 16;

#[derive(Debug, Clone)]
pub struct TextDisplay {
    cells: [[char; COLS]; ROWS],
    row: usize,
    col: usize,
    clears: u32,
}

impl Default for TextDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl TextDisplay {
    pub fn new() -> Self {
        Self {
            cells: [[' '; COLS]; ROWS],
            row: 0,
            col: 0,
            clears: 0,
        }
    }

    /// Contents of `row` with trailing blanks removed.
    pub fn line(&self, row: usize) -> String {
        let Some(cells) = self.cells.get(row) else {
            return String::new();
        };
        let text: String = cells.iter().collect();
        text.trim_end().to_owned()
    }

    /// Number of `clear()` calls since construction.
    pub fn clears(&self) -> u32 {
        self.clears
    }

    fn put(&mut self, c: char) {
        if self.col < COLS {
            self.cells[self.row][self.col] = c;
        }
        self.col = self.col.saturating_add(1);
    }
}

impl CharacterDisplay for TextDisplay {
    fn clear(&mut self) {
        self.cells = [[' '; COLS]; ROWS];
        self.row = 0;
        self.col = 0;
        self.clears = self.clears.wrapping_add(1);
    }

    fn new_line(&mut self) {
        self.row = 1;
        self.col = 0;
    }

    fn move_cursor(&mut self) {
        self.col = self.col.saturating_add(1);
    }

    fn write_char(&mut self, c: char) {
        self.put(c);
    }

    fn write_digit(&mut self, n: u8) {
        self.put(char::from(b'0' + n.min(9)));
    }
}

//! Field module - the fumen board
//!
//! A 10x23 grid of cells plus one garbage ("sent line") row under it.
//! Uses flat arrays so copies are plain memcpy and equality is cell-by-cell.
//! Coordinates: (x, y) where x ranges 0..9 (left to right) and y ranges 0..22
//! (bottom to top). `y = -1` addresses the garbage row.

use std::fmt;

use crate::error::FormatError;
use crate::pieces::get_cells;
use crate::types::{Move, Piece, FIELD_BLOCKS, FIELD_TOP, FIELD_WIDTH};

/// The fumen board - 10 columns x 23 rows plus a garbage row
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    /// Flat array of cells, row-major order from the bottom (y * WIDTH + x)
    cells: [Piece; FIELD_BLOCKS],
    garbage: [Piece; FIELD_WIDTH],
}

impl Field {
    /// Create a new empty field
    pub fn new() -> Self {
        Self {
            cells: [Piece::Empty; FIELD_BLOCKS],
            garbage: [Piece::Empty; FIELD_WIDTH],
        }
    }

    /// Parse a field string
    ///
    /// Rows are written top-first, 10 characters each, and are aligned to the
    /// bottom of the field. Characters are `_`, `X` and the mino letters.
    ///
    /// ```
    /// use fumen_core::Field;
    /// use fumen_core::types::Piece;
    ///
    /// let field = Field::from_str("T_________TTT_______").unwrap();
    /// assert_eq!(field.get(0, 1), Some(Piece::T));
    /// assert_eq!(field.get(2, 0), Some(Piece::T));
    /// assert!(Field::from_str("TTT").is_err());
    /// ```
    pub fn from_str(field: &str) -> Result<Self, FormatError> {
        Self::with_garbage(field, "")
    }

    /// Parse a field string and a garbage row string (empty or 10 characters)
    pub fn with_garbage(field: &str, garbage: &str) -> Result<Self, FormatError> {
        let rows = parse_rows(field)?;
        if rows.len() > FIELD_TOP {
            return Err(FormatError::FieldTooTall(rows.len()));
        }

        let mut result = Self::new();
        let height = rows.len();
        for (i, row) in rows.iter().enumerate() {
            let y = height - 1 - i;
            result.cells[y * FIELD_WIDTH..(y + 1) * FIELD_WIDTH].copy_from_slice(row);
        }

        let garbage_rows = parse_rows(garbage)?;
        match garbage_rows.as_slice() {
            [] => {}
            [row] => result.garbage = *row,
            _ => return Err(FormatError::FieldTooTall(garbage_rows.len())),
        }
        Ok(result)
    }

    /// Calculate flat index from (x, y) coordinates
    #[inline(always)]
    fn index(x: i32, y: i32) -> Option<usize> {
        if x < 0 || x >= FIELD_WIDTH as i32 || y < 0 || y >= FIELD_TOP as i32 {
            return None;
        }
        Some(y as usize * FIELD_WIDTH + x as usize)
    }

    fn slot_mut(&mut self, x: i32, y: i32) -> Option<&mut Piece> {
        if y == -1 && (0..FIELD_WIDTH as i32).contains(&x) {
            return Some(&mut self.garbage[x as usize]);
        }
        Self::index(x, y).map(|idx| &mut self.cells[idx])
    }

    /// Get cell at position (x, y); `y = -1` reads the garbage row
    /// Returns None if out of bounds
    pub fn get(&self, x: i32, y: i32) -> Option<Piece> {
        if y == -1 && (0..FIELD_WIDTH as i32).contains(&x) {
            return Some(self.garbage[x as usize]);
        }
        Self::index(x, y).map(|idx| self.cells[idx])
    }

    /// Set cell at position (x, y)
    /// Returns false if out of bounds
    pub fn set(&mut self, x: i32, y: i32, piece: Piece) -> bool {
        match self.slot_mut(x, y) {
            Some(slot) => {
                *slot = piece;
                true
            }
            None => false,
        }
    }

    /// Add a raw difference to a cell's piece value
    ///
    /// The result must land on a valid piece value (0..=8).
    pub fn add(&mut self, x: i32, y: i32, delta: i32) -> Result<(), FormatError> {
        let Some(slot) = self.slot_mut(x, y) else {
            return Err(FormatError::InvalidCell { x, y, value: delta });
        };
        let value = slot.value() as i32 + delta;
        let piece = u8::try_from(value)
            .ok()
            .and_then(Piece::from_value)
            .ok_or(FormatError::InvalidCell { x, y, value })?;
        *slot = piece;
        Ok(())
    }

    /// Stamp a placement's four cells
    ///
    /// Cells outside the visible field are dropped. Non-mino moves stamp nothing.
    pub fn put(&mut self, mv: &Move) {
        let Some(cells) = get_cells(mv) else {
            return;
        };
        for (x, y) in cells {
            if let Some(idx) = Self::index(x, y) {
                self.cells[idx] = mv.piece;
            }
        }
    }

    /// Whether every cell of a placement is inside the field and empty
    pub fn can_put(&self, mv: &Move) -> bool {
        match get_cells(mv) {
            Some(cells) => cells
                .iter()
                .all(|&(x, y)| Self::index(x, y).is_some_and(|i| self.cells[i] == Piece::Empty)),
            None => false,
        }
    }

    /// Check if a row is completely filled
    pub fn is_row_full(&self, y: usize) -> bool {
        if y >= FIELD_TOP {
            return false;
        }
        let start = y * FIELD_WIDTH;
        self.cells[start..start + FIELD_WIDTH]
            .iter()
            .all(|&cell| cell != Piece::Empty)
    }

    /// Remove every full row in one pass and return how many were removed
    ///
    /// Remaining rows keep their order and settle to the bottom; vacated rows
    /// at the top are refilled with `Empty`. The garbage row is not touched.
    pub fn clear_line(&mut self) -> usize {
        let mut write_y = 0usize;
        for read_y in 0..FIELD_TOP {
            if self.is_row_full(read_y) {
                continue;
            }
            if write_y != read_y {
                let src = read_y * FIELD_WIDTH;
                self.cells
                    .copy_within(src..src + FIELD_WIDTH, write_y * FIELD_WIDTH);
            }
            write_y += 1;
        }

        let cleared = FIELD_TOP - write_y;
        self.cells[write_y * FIELD_WIDTH..].fill(Piece::Empty);
        cleared
    }

    /// Shift the field up one row, inserting `row` at the bottom
    ///
    /// The top row is discarded.
    pub fn up(&mut self, row: &[Piece; FIELD_WIDTH]) {
        self.cells
            .copy_within(0..FIELD_BLOCKS - FIELD_WIDTH, FIELD_WIDTH);
        self.cells[..FIELD_WIDTH].copy_from_slice(row);
    }

    /// Raise the garbage row into the field and empty it
    pub fn rise_garbage(&mut self) {
        let row = self.garbage;
        self.up(&row);
        self.garbage = [Piece::Empty; FIELD_WIDTH];
    }

    /// Reverse every visible row
    pub fn mirror(&mut self) {
        for row in self.cells.chunks_exact_mut(FIELD_WIDTH) {
            row.reverse();
        }
    }

    pub fn shift_to_left(&mut self) {
        for row in self.cells.chunks_exact_mut(FIELD_WIDTH) {
            row.rotate_left(1);
            row[FIELD_WIDTH - 1] = Piece::Empty;
        }
    }

    pub fn shift_to_right(&mut self) {
        for row in self.cells.chunks_exact_mut(FIELD_WIDTH) {
            row.rotate_right(1);
            row[0] = Piece::Empty;
        }
    }

    pub fn shift_to_up(&mut self) {
        self.up(&[Piece::Empty; FIELD_WIDTH]);
    }

    pub fn shift_to_bottom(&mut self) {
        self.cells.copy_within(FIELD_WIDTH.., 0);
        self.cells[FIELD_BLOCKS - FIELD_WIDTH..].fill(Piece::Empty);
    }

    /// Deep copy
    ///
    /// Same as `clone`; kept as a named operation for callers that snapshot
    /// resolved fields.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Visible cells, bottom row first
    pub fn cells(&self) -> &[Piece] {
        &self.cells
    }

    pub fn garbage(&self) -> &[Piece; FIELD_WIDTH] {
        &self.garbage
    }

    pub fn is_empty(&self) -> bool {
        self.cells
            .iter()
            .chain(self.garbage.iter())
            .all(|&c| c == Piece::Empty)
    }

    /// Field string of all 23 rows, top row first
    pub fn to_field_string(&self) -> String {
        self.cells
            .chunks_exact(FIELD_WIDTH)
            .rev()
            .flat_map(|row| row.iter().map(|p| p.as_char()))
            .collect()
    }

    pub fn garbage_string(&self) -> String {
        self.garbage.iter().map(|p| p.as_char()).collect()
    }
}

impl Default for Field {
    fn default() -> Self {
        Self::new()
    }
}

/// Rows from the highest non-empty one down, then the garbage row after `--`
impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let height = (0..FIELD_TOP)
            .rev()
            .find(|&y| {
                self.cells[y * FIELD_WIDTH..(y + 1) * FIELD_WIDTH]
                    .iter()
                    .any(|&c| c != Piece::Empty)
            })
            .map_or(0, |y| y + 1);

        for y in (0..height).rev() {
            let row = &self.cells[y * FIELD_WIDTH..(y + 1) * FIELD_WIDTH];
            let line: String = row.iter().map(|p| p.as_char()).collect();
            writeln!(f, "{}", line)?;
        }
        writeln!(f, "{}", "-".repeat(FIELD_WIDTH))?;
        write!(f, "{}", self.garbage_string())
    }
}

fn parse_rows(s: &str) -> Result<Vec<[Piece; FIELD_WIDTH]>, FormatError> {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() % FIELD_WIDTH != 0 {
        return Err(FormatError::FieldLength(chars.len()));
    }

    chars
        .chunks_exact(FIELD_WIDTH)
        .map(|chunk| {
            let mut row = [Piece::Empty; FIELD_WIDTH];
            for (slot, &c) in row.iter_mut().zip(chunk) {
                *slot = Piece::from_char(c).ok_or(FormatError::InvalidFieldChar(c))?;
            }
            Ok(row)
        })
        .collect()
}

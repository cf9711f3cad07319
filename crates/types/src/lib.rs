//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used by every fumen crate.
//! All types are pure data with no external dependencies, so they can be used
//! by the codec, the page engine, and any renderer alike.
//!
//! # Field Dimensions
//!
//! A fumen field is taller than a standard playfield:
//!
//! - **Width**: 10 columns (indexed 0-9, left to right)
//! - **Height**: 23 visible rows (indexed 0-22, row 0 is the bottom)
//! - **Garbage**: one "sent line" row below the field (y = -1)
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `FIELD_WIDTH` | 10 | Columns per row |
//! | `FIELD_TOP` | 23 | Visible rows |
//! | `FIELD_BLOCKS` | 230 | Visible cells |
//! | `TOTAL_BLOCKS` | 240 | Visible cells plus the garbage row |
//!
//! # Piece Values
//!
//! Cells and actions store pieces as small integers:
//!
//! | Piece | Value | Letter |
//! |-------|-------|--------|
//! | Empty | 0 | `_` |
//! | I | 1 | `I` |
//! | L | 2 | `L` |
//! | O | 3 | `O` |
//! | Z | 4 | `Z` |
//! | T | 5 | `T` |
//! | J | 6 | `J` |
//! | S | 7 | `S` |
//! | Gray | 8 | `X` |
//!
//! # Examples
//!
//! ```
//! use fumen_types::{Piece, Rotation, FIELD_TOP, FIELD_WIDTH};
//!
//! let piece = Piece::from_str("t").unwrap();
//! assert_eq!(piece, Piece::T);
//! assert!(piece.is_mino());
//! assert!(!Piece::Gray.is_mino());
//!
//! assert_eq!(Rotation::Spawn.rotate_cw(), Rotation::Right);
//!
//! assert_eq!(FIELD_WIDTH, 10);
//! assert_eq!(FIELD_TOP, 23);
//! ```

/// Field width in cells (10 columns)
pub const FIELD_WIDTH: usize = 10;

/// Visible field height in rows (23 rows)
pub const FIELD_TOP: usize = 23;

/// Number of garbage ("sent line") rows under the field
pub const GARBAGE_LINES: usize = 1;

/// Visible cells (230)
pub const FIELD_BLOCKS: usize = FIELD_WIDTH * FIELD_TOP;

/// Visible cells plus the garbage row (240)
pub const TOTAL_BLOCKS: usize = FIELD_WIDTH * (FIELD_TOP + GARBAGE_LINES);

/// Longest comment (after escaping) a page can carry
pub const MAX_COMMENT_LENGTH: usize = 4095;

/// Number of upcoming pieces reported by a text comment lookahead
pub const NEXT_PIECES: usize = 5;

/// Cell contents and placeable piece kinds
///
/// The seven minos plus `Empty` and `Gray` (garbage fill). Only minos can be
/// placed as a page's piece; `Gray` only ever appears in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Piece {
    #[default]
    Empty,
    I,
    L,
    O,
    Z,
    T,
    J,
    S,
    Gray,
}

impl Piece {
    /// The seven tetromino kinds in value order
    pub const MINOS: [Piece; 7] = [
        Piece::I,
        Piece::L,
        Piece::O,
        Piece::Z,
        Piece::T,
        Piece::J,
        Piece::S,
    ];

    /// Numeric value used by the field diff and action codecs
    pub fn value(self) -> u8 {
        match self {
            Piece::Empty => 0,
            Piece::I => 1,
            Piece::L => 2,
            Piece::O => 3,
            Piece::Z => 4,
            Piece::T => 5,
            Piece::J => 6,
            Piece::S => 7,
            Piece::Gray => 8,
        }
    }

    /// Inverse of [`Piece::value`]
    ///
    /// ```
    /// use fumen_types::Piece;
    ///
    /// assert_eq!(Piece::from_value(5), Some(Piece::T));
    /// assert_eq!(Piece::from_value(8), Some(Piece::Gray));
    /// assert_eq!(Piece::from_value(9), None);
    /// ```
    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            0 => Some(Piece::Empty),
            1 => Some(Piece::I),
            2 => Some(Piece::L),
            3 => Some(Piece::O),
            4 => Some(Piece::Z),
            5 => Some(Piece::T),
            6 => Some(Piece::J),
            7 => Some(Piece::S),
            8 => Some(Piece::Gray),
            _ => None,
        }
    }

    /// True for the seven tetrominoes
    pub fn is_mino(self) -> bool {
        !matches!(self, Piece::Empty | Piece::Gray)
    }

    /// Parse piece from a letter (case-insensitive)
    ///
    /// Accepts the mino letters, `X`/`gray` for garbage and `_`/`empty`.
    ///
    /// ```
    /// use fumen_types::Piece;
    ///
    /// assert_eq!(Piece::from_str("i"), Some(Piece::I));
    /// assert_eq!(Piece::from_str("X"), Some(Piece::Gray));
    /// assert_eq!(Piece::from_str("_"), Some(Piece::Empty));
    /// assert_eq!(Piece::from_str("unknown"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "_" | "empty" => Some(Piece::Empty),
            "i" => Some(Piece::I),
            "l" => Some(Piece::L),
            "o" => Some(Piece::O),
            "z" => Some(Piece::Z),
            "t" => Some(Piece::T),
            "j" => Some(Piece::J),
            "s" => Some(Piece::S),
            "x" | "gray" => Some(Piece::Gray),
            _ => None,
        }
    }

    /// Parse a single field-string character
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            '_' => Some(Piece::Empty),
            'I' => Some(Piece::I),
            'L' => Some(Piece::L),
            'O' => Some(Piece::O),
            'Z' => Some(Piece::Z),
            'T' => Some(Piece::T),
            'J' => Some(Piece::J),
            'S' => Some(Piece::S),
            'X' => Some(Piece::Gray),
            _ => None,
        }
    }

    /// Single-letter representation used by field strings and quizzes
    pub fn as_char(self) -> char {
        match self {
            Piece::Empty => '_',
            Piece::I => 'I',
            Piece::L => 'L',
            Piece::O => 'O',
            Piece::Z => 'Z',
            Piece::T => 'T',
            Piece::J => 'J',
            Piece::S => 'S',
            Piece::Gray => 'X',
        }
    }
}

/// Rotation states as named by the fumen format
///
/// - **Spawn**: initial orientation
/// - **Right**: rotated 90° clockwise
/// - **Reverse**: rotated 180°
/// - **Left**: rotated 90° counter-clockwise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Rotation {
    Spawn,
    Right,
    #[default]
    Reverse,
    Left,
}

impl Rotation {
    /// Rotate clockwise (90°)
    ///
    /// ```
    /// use fumen_types::Rotation;
    ///
    /// assert_eq!(Rotation::Spawn.rotate_cw(), Rotation::Right);
    /// assert_eq!(Rotation::Left.rotate_cw(), Rotation::Spawn);
    /// ```
    pub fn rotate_cw(&self) -> Self {
        match self {
            Rotation::Spawn => Rotation::Right,
            Rotation::Right => Rotation::Reverse,
            Rotation::Reverse => Rotation::Left,
            Rotation::Left => Rotation::Spawn,
        }
    }

    /// Rotate counter-clockwise (-90°)
    pub fn rotate_ccw(&self) -> Self {
        match self {
            Rotation::Spawn => Rotation::Left,
            Rotation::Left => Rotation::Reverse,
            Rotation::Reverse => Rotation::Right,
            Rotation::Right => Rotation::Spawn,
        }
    }

    /// Parse rotation from string
    ///
    /// Accepts full names or single letters (case-insensitive):
    /// "spawn" | "0", "right" | "r", "reverse" | "2", "left" | "l"
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "spawn" | "0" => Some(Rotation::Spawn),
            "right" | "r" => Some(Rotation::Right),
            "reverse" | "2" => Some(Rotation::Reverse),
            "left" | "l" => Some(Rotation::Left),
            _ => None,
        }
    }

    /// Convert to lowercase string
    pub fn as_str(&self) -> &'static str {
        match self {
            Rotation::Spawn => "spawn",
            Rotation::Right => "right",
            Rotation::Reverse => "reverse",
            Rotation::Left => "left",
        }
    }
}

/// A piece placement: kind, rotation and the logical origin cell
///
/// `x` grows to the right and `y` grows upward, with `y = 0` the bottom row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub piece: Piece,
    pub rotation: Rotation,
    pub x: i32,
    pub y: i32,
}

impl Move {
    pub fn new(piece: Piece, rotation: Rotation, x: i32, y: i32) -> Self {
        Self {
            piece,
            rotation,
            x,
            y,
        }
    }

    /// Placeholder action written for pages without a piece
    pub fn empty() -> Self {
        Self::new(Piece::Empty, Rotation::Reverse, 0, FIELD_TOP as i32 - 1)
    }
}

/// How a locked piece was taken from a quiz queue
///
/// - **Direct**: the current piece was placed
/// - **Swap**: the held piece was placed, current went to hold
/// - **Stock**: hold was empty; current went to hold and the next piece was placed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Direct,
    Swap,
    Stock,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Direct => "direct",
            Operation::Swap => "swap",
            Operation::Stock => "stock",
        }
    }
}

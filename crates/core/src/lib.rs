//! Fumen core - field, pieces, quiz, and the per-page binary pieces
//!
//! Everything here is pure data manipulation with no I/O, so the codec and the
//! page engine can build on it without caring how pages are stored.
//!
//! # Module Structure
//!
//! - [`values`]: base-64 value stream every encoded part is read from
//! - [`field`]: 23-row playfield plus one garbage row, line clears, rise, mirror
//! - [`pieces`]: mino shapes per rotation
//! - [`action`]: piece placement and page flags packed into one number
//! - [`comment`]: escaped comment text packed into the value stream
//! - [`quiz`]: hold/current/next annotations and their operations
//! - [`page`]: the page model with key and reference slots
//! - [`primitive`]: serializable page snapshots
//! - [`error`]: format and consistency errors
//!
//! # Example
//!
//! ```
//! use fumen_core::{Field, Page};
//! use fumen_core::types::{Move, Piece, Rotation};
//!
//! let mut field = Field::from_str("IIII_IIIII").unwrap();
//! let mut page = Page::key(0, Field::new(), "");
//! page.piece = Some(Move::new(Piece::T, Rotation::Right, 4, 1));
//! page.apply_lock(&mut field);
//!
//! // the T fills the hole and the bottom row clears
//! assert_eq!(field.get(4, 0), Some(Piece::T));
//! assert_eq!(field.get(0, 0), Some(Piece::Empty));
//! ```

pub mod action;
pub mod comment;
pub mod error;
pub mod field;
pub mod page;
pub mod pieces;
pub mod primitive;
pub mod quiz;
pub mod values;

pub use fumen_types as types;

// Re-export commonly used types for convenience
pub use error::{ConsistencyError, FormatError, FumenError, Result};
pub use field::Field;
pub use page::{CommandKey, Commands, CommentSource, FieldSource, Flags, Page};
pub use primitive::PrimitivePage;
pub use quiz::{Quiz, Unclassified};
pub use values::Values;

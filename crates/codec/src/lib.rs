//! Fumen codec - text form of a page list
//!
//! A fumen is `v115@` followed by a base-64 value stream. Each page in the
//! stream is:
//!
//! 1. the field as a run-length diff against the previous page's locked
//!    field, or nothing while a repeat counter is pending
//! 2. one 3-symbol action (piece placement and flags)
//! 3. the comment, when the action's comment bit is set
//!
//! Decoding also tracks quiz comments so each page knows whether it is part
//! of a quiz. Both directions work one page at a time; the async variants
//! yield to the tokio runtime between pages.
//!
//! # Example
//!
//! ```
//! use fumen_codec::{decode, encode};
//!
//! let pages = decode("https://fumen.zui.jp/?v115@vhAAgH").unwrap();
//! assert_eq!(pages.len(), 1);
//! assert_eq!(encode(&pages).unwrap(), "v115@vhAAgH");
//! ```

pub mod decoder;
pub mod encoder;
pub mod extract;

pub use fumen_core as core;
pub use fumen_core::types;

pub use decoder::{decode, decode_async, Decoder};
pub use encoder::{encode, encode_async, Encoder};
pub use extract::{extract, PREFIX, VERSION};

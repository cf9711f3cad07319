//! Fumen editor (workspace facade crate).
//!
//! Re-exports the crates under `crates/` as `fumen_editor::{types,core,codec,engine}`
//! so tools and tests depend on one package.

pub use fumen_codec as codec;
pub use fumen_core as core;
pub use fumen_engine as engine;
pub use fumen_types as types;

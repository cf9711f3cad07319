//! Fumen engine - page resolution, structural edits, and undo history
//!
//! [`PageStore`] owns the decoded pages. Reading resolves fields and comments
//! through their reference chains; writing goes through edits that keep
//! every reference pointing backwards. Edits wrapped in history tasks can be
//! undone and redone through [`History`].
//!
//! # Example
//!
//! ```
//! use fumen_engine::{FieldMode, History, OperationTask, PageStore};
//!
//! # tokio_test::block_on(async {
//! let mut store = PageStore::from_fumen("v115@vhCAgHAgHAgH").unwrap();
//! let mut history = History::default();
//!
//! history.execute(OperationTask::remove(1, 1), &mut store).await.unwrap();
//! assert_eq!(store.len(), 2);
//!
//! history.undo(&mut store).await.unwrap();
//! assert_eq!(store.len(), 3);
//! assert!(store.get_field(2, FieldMode::All).unwrap().is_empty());
//! # });
//! ```

pub mod comment;
pub mod config;
pub mod edit;
pub mod history;
pub mod store;
pub mod task;

pub use fumen_codec as codec;
pub use fumen_core as core;
pub use fumen_core::types;

pub use comment::PageComment;
pub use config::EditorConfig;
pub use history::{History, HistoryStep};
pub use store::{FieldMode, PageStore, ResolvedPage};
pub use task::{FixedTask, HistoryTask, Operation, OperationTask};

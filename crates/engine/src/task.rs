//! History tasks - reversible edits
//!
//! An [`OperationTask`] runs synchronously against the page store. Structural
//! edits remember the pages they are about to change when they are replayed,
//! so reverting restores exactly what was there. A [`FixedTask`] swaps in a
//! whole new document and is async because it decodes a fumen on the way.

use fumen_codec::decode_async;
use fumen_core::{ConsistencyError, FumenError, Page, PrimitivePage};

use crate::store::PageStore;

/// Edit recorded by an [`OperationTask`]
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Replace one page
    Single {
        index: usize,
        prev: PrimitivePage,
        next: PrimitivePage,
    },
    Insert {
        index: usize,
        pages: Vec<PrimitivePage>,
    },
    Remove {
        index: usize,
        count: usize,
    },
    KeyPage {
        index: usize,
    },
    RefPage {
        index: usize,
    },
    FreezeComment {
        index: usize,
    },
    UnfreezeComment {
        index: usize,
    },
    /// Replay in order, revert in reverse
    Stack(Vec<OperationTask>),
    /// `inner` then `outer`, under `inner`'s key
    Decorator {
        inner: Box<OperationTask>,
        outer: Box<OperationTask>,
    },
}

/// A synchronous, reversible edit
#[derive(Debug, Clone, PartialEq)]
pub struct OperationTask {
    key: String,
    operation: Operation,
    /// Pages from the edit point on, as they were before the last replay
    undo: Option<Vec<PrimitivePage>>,
}

impl OperationTask {
    pub fn new(key: impl Into<String>, operation: Operation) -> Self {
        Self {
            key: key.into(),
            operation,
            undo: None,
        }
    }

    /// Replace page `index`, `prev` with `next`
    ///
    /// Both pages are stored at `index` whatever their own `index` says.
    pub fn single(index: usize, prev: &Page, next: &Page) -> Self {
        Self::new(
            format!("update-page-{}", index),
            Operation::Single {
                index,
                prev: PrimitivePage::from(prev),
                next: PrimitivePage::from(next),
            },
        )
    }

    pub fn insert(index: usize, pages: &[Page]) -> Self {
        Self::new(
            format!("insert-pages-{}", index),
            Operation::Insert {
                index,
                pages: pages.iter().map(PrimitivePage::from).collect(),
            },
        )
    }

    pub fn remove(index: usize, count: usize) -> Self {
        Self::new(
            format!("remove-pages-{}", index),
            Operation::Remove { index, count },
        )
    }

    pub fn key_page(index: usize) -> Self {
        Self::new(format!("key-page-{}", index), Operation::KeyPage { index })
    }

    pub fn ref_page(index: usize) -> Self {
        Self::new(format!("ref-page-{}", index), Operation::RefPage { index })
    }

    pub fn freeze_comment(index: usize) -> Self {
        Self::new(
            format!("freeze-comment-{}", index),
            Operation::FreezeComment { index },
        )
    }

    pub fn unfreeze_comment(index: usize) -> Self {
        Self::new(
            format!("unfreeze-comment-{}", index),
            Operation::UnfreezeComment { index },
        )
    }

    /// Several tasks acting as one
    pub fn stack(key: impl Into<String>, tasks: Vec<OperationTask>) -> Self {
        Self::new(key, Operation::Stack(tasks))
    }

    /// Attach `outer` to `inner` so both replay and revert together
    pub fn decorate(inner: OperationTask, outer: OperationTask) -> Self {
        Self::new(
            inner.key.clone(),
            Operation::Decorator {
                inner: Box::new(inner),
                outer: Box::new(outer),
            },
        )
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    /// Page from which this task's structural edit changes the store
    fn edit_point(&self) -> Option<usize> {
        match &self.operation {
            Operation::Insert { index, .. }
            | Operation::Remove { index, .. }
            | Operation::KeyPage { index }
            | Operation::RefPage { index }
            | Operation::FreezeComment { index }
            | Operation::UnfreezeComment { index } => Some(*index),
            Operation::Single { .. } | Operation::Stack(_) | Operation::Decorator { .. } => None,
        }
    }

    /// Run the edit; returns the page to show afterwards
    pub fn replay(&mut self, store: &mut PageStore) -> Result<usize, FumenError> {
        if let Some(index) = self.edit_point() {
            let snapshot = store.snapshot_from(index);
            let shown = self.apply(store)?;
            self.undo = Some(snapshot);
            return Ok(shown);
        }
        self.apply(store)
    }

    fn apply(&mut self, store: &mut PageStore) -> Result<usize, FumenError> {
        let shown = match &mut self.operation {
            Operation::Single { index, next, .. } => {
                let mut page = Page::try_from(next.clone())?;
                page.index = *index;
                store.replace_page(page)?;
                *index
            }
            Operation::Insert { index, pages } => {
                let pages = pages
                    .iter()
                    .cloned()
                    .map(Page::try_from)
                    .collect::<Result<Vec<_>, _>>()?;
                store.insert_pages(*index, pages)?;
                *index
            }
            Operation::Remove { index, count } => {
                store.delete_pages(*index, *count)?;
                *index
            }
            Operation::KeyPage { index } => {
                store.to_key_page(*index)?;
                *index
            }
            Operation::RefPage { index } => {
                store.to_ref_page(*index)?;
                *index
            }
            Operation::FreezeComment { index } => {
                store.freeze_comment(*index)?;
                *index
            }
            Operation::UnfreezeComment { index } => {
                store.unfreeze_comment(*index)?;
                *index
            }
            Operation::Stack(tasks) => {
                let mut shown = 0;
                for done in 0..tasks.len() {
                    match tasks[done].replay(store) {
                        Ok(index) => shown = index,
                        Err(e) => {
                            // roll back what already ran so the stack stays atomic
                            for task in tasks[..done].iter_mut().rev() {
                                task.revert(store)?;
                            }
                            return Err(e);
                        }
                    }
                }
                shown
            }
            Operation::Decorator { inner, outer } => {
                inner.replay(store)?;
                match outer.replay(store) {
                    Ok(index) => index,
                    Err(e) => {
                        inner.revert(store)?;
                        return Err(e);
                    }
                }
            }
        };
        Ok(last_page(store, shown))
    }

    /// Undo the last replay; returns the page to show afterwards
    pub fn revert(&mut self, store: &mut PageStore) -> Result<usize, FumenError> {
        if let Some(index) = self.edit_point() {
            let Some(snapshot) = self.undo.clone() else {
                return Err(ConsistencyError::MissingSnapshot { index }.into());
            };
            store.restore_from(index, snapshot)?;
            return Ok(last_page(store, index));
        }

        let shown = match &mut self.operation {
            Operation::Single { index, prev, .. } => {
                let mut page = Page::try_from(prev.clone())?;
                page.index = *index;
                store.replace_page(page)?;
                *index
            }
            Operation::Stack(tasks) => {
                let mut shown = 0;
                for task in tasks.iter_mut().rev() {
                    shown = task.revert(store)?;
                }
                shown
            }
            Operation::Decorator { inner, outer } => {
                outer.revert(store)?;
                inner.revert(store)?
            }
            _ => 0,
        };
        Ok(last_page(store, shown))
    }
}

/// Clamp a page index to the store
fn last_page(store: &PageStore, index: usize) -> usize {
    index.min(store.len().saturating_sub(1))
}

/// Replaces the whole document with a decoded fumen
#[derive(Debug, Clone, PartialEq)]
pub struct FixedTask {
    key: String,
    prev: Vec<PrimitivePage>,
    /// Page shown before the load, shown again on revert
    prev_index: usize,
    next: String,
    yield_every: usize,
}

impl FixedTask {
    /// Capture the current document and the page on screen, to be replaced by `next`
    pub fn new(
        store: &PageStore,
        current_index: usize,
        next: impl Into<String>,
        yield_every: usize,
    ) -> Self {
        Self {
            key: "load-fumen".to_string(),
            prev: store.snapshot_from(0),
            prev_index: current_index,
            next: next.into(),
            yield_every,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load the new document; shows its first page
    pub async fn replay(&self, store: &mut PageStore) -> Result<usize, FumenError> {
        let pages = decode_async(&self.next, self.yield_every).await?;
        store.replace_all(pages)?;
        Ok(0)
    }

    pub async fn revert(&self, store: &mut PageStore) -> Result<usize, FumenError> {
        let mut pages = Vec::with_capacity(self.prev.len());
        for (i, page) in self.prev.iter().enumerate() {
            pages.push(Page::try_from(page.clone())?);
            if self.yield_every > 0 && (i + 1) % self.yield_every == 0 {
                tokio::task::yield_now().await;
            }
        }
        store.replace_all(pages)?;
        Ok(last_page(store, self.prev_index))
    }
}

/// Any task the history can hold
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryTask {
    Operation(OperationTask),
    Fixed(FixedTask),
}

impl HistoryTask {
    pub fn key(&self) -> &str {
        match self {
            HistoryTask::Operation(task) => task.key(),
            HistoryTask::Fixed(task) => task.key(),
        }
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self, HistoryTask::Fixed(_))
    }

    pub async fn replay(&mut self, store: &mut PageStore) -> Result<usize, FumenError> {
        match self {
            HistoryTask::Operation(task) => task.replay(store),
            HistoryTask::Fixed(task) => task.replay(store).await,
        }
    }

    pub async fn revert(&mut self, store: &mut PageStore) -> Result<usize, FumenError> {
        match self {
            HistoryTask::Operation(task) => task.revert(store),
            HistoryTask::Fixed(task) => task.revert(store).await,
        }
    }
}

impl From<OperationTask> for HistoryTask {
    fn from(task: OperationTask) -> Self {
        HistoryTask::Operation(task)
    }
}

impl From<FixedTask> for HistoryTask {
    fn from(task: FixedTask) -> Self {
        HistoryTask::Fixed(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fumen_core::types::{Move, Piece, Rotation};
    use fumen_core::Field;

    fn store() -> PageStore {
        PageStore::new(vec![
            Page::key(0, Field::new(), "start"),
            Page::reference(1, 0, 0),
            Page::reference(2, 0, 0),
        ])
        .unwrap()
    }

    #[test]
    fn single_is_an_inverse() {
        let mut store = store();
        let before = store.clone();
        let prev = store.pages()[1].clone();
        let mut next = prev.clone();
        next.piece = Some(Move::new(Piece::T, Rotation::Spawn, 4, 0));

        let mut task = OperationTask::single(1, &prev, &next);
        assert_eq!(task.replay(&mut store), Ok(1));
        assert_eq!(store.pages()[1].piece, next.piece);
        assert_eq!(task.revert(&mut store), Ok(1));
        assert_eq!(store, before);
    }

    #[test]
    fn single_targets_its_own_index() {
        let mut store = store();
        let before = store.clone();
        // page 2's content edited into page 1's slot
        let prev = store.pages()[1].clone();
        let mut next = store.pages()[2].clone();
        next.comment = fumen_core::CommentSource::Text("moved".to_string());

        let mut task = OperationTask::single(1, &prev, &next);
        task.replay(&mut store).unwrap();
        assert_eq!(store.pages()[1].index, 1);
        assert!(store.pages()[1].is_key_comment());
        assert!(!store.pages()[2].is_key_comment());

        task.revert(&mut store).unwrap();
        assert_eq!(store, before);
    }

    #[test]
    fn tasks_report_the_page_to_show() {
        let mut store = store();
        let mut remove_tail = OperationTask::remove(2, 1);
        // the removed page was last, so the new last page is shown
        assert_eq!(remove_tail.replay(&mut store), Ok(1));
        assert_eq!(remove_tail.revert(&mut store), Ok(2));

        let mut insert = OperationTask::insert(1, &[Page::reference(1, 0, 0)]);
        assert_eq!(insert.replay(&mut store), Ok(1));
        assert_eq!(insert.revert(&mut store), Ok(1));

        let mut stack = OperationTask::stack(
            "stack",
            vec![OperationTask::key_page(2), OperationTask::freeze_comment(1)],
        );
        assert_eq!(stack.replay(&mut store), Ok(1));
        // reverted last is the first task
        assert_eq!(stack.revert(&mut store), Ok(2));
    }

    #[test]
    fn structural_tasks_are_inverses() {
        let tasks = [
            OperationTask::insert(1, &[Page::key(1, Field::from_str("X_________").unwrap(), "x")]),
            OperationTask::remove(0, 1),
            OperationTask::key_page(2),
            OperationTask::ref_page(0),
            OperationTask::freeze_comment(1),
            OperationTask::unfreeze_comment(0),
        ];
        for mut task in tasks {
            let mut store = store();
            let before = store.clone();
            // ref_page(0) and unfreeze_comment(0) fail and must leave no trace
            if task.replay(&mut store).is_ok() {
                assert_ne!(task.key(), "");
                task.revert(&mut store).unwrap();
            }
            assert_eq!(store, before, "{}", task.key());
        }
    }

    #[test]
    fn revert_without_replay_is_an_error() {
        let mut store = store();
        let mut task = OperationTask::remove(1, 1);
        assert_eq!(
            task.revert(&mut store),
            Err(ConsistencyError::MissingSnapshot { index: 1 }.into())
        );
    }

    #[test]
    fn stack_reverts_in_reverse_order() {
        let mut store = store();
        let before = store.clone();
        let mut task = OperationTask::stack(
            "stack",
            vec![
                OperationTask::key_page(1),
                OperationTask::remove(0, 1),
                OperationTask::freeze_comment(1),
            ],
        );
        task.replay(&mut store).unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.pages()[0].is_key_field());
        task.revert(&mut store).unwrap();
        assert_eq!(store, before);
    }

    #[test]
    fn failing_stack_rolls_back() {
        let mut store = store();
        let before = store.clone();
        let mut task = OperationTask::stack(
            "stack",
            vec![OperationTask::key_page(1), OperationTask::remove(7, 1)],
        );
        assert!(task.replay(&mut store).is_err());
        assert_eq!(store, before);
    }

    #[test]
    fn decorator_keeps_inner_key() {
        let mut store = store();
        let before = store.clone();
        let mut task =
            OperationTask::decorate(OperationTask::key_page(2), OperationTask::freeze_comment(2));
        assert_eq!(task.key(), "key-page-2");
        task.replay(&mut store).unwrap();
        assert!(store.pages()[2].is_key_field());
        assert!(store.pages()[2].is_key_comment());
        task.revert(&mut store).unwrap();
        assert_eq!(store, before);
    }

    #[tokio::test]
    async fn fixed_task_swaps_documents() {
        let mut store = store();
        let before = store.clone();
        let mut task: HistoryTask = FixedTask::new(&store, 2, "v115@vhAAgH", 1).into();
        assert!(task.is_fixed());

        assert_eq!(task.replay(&mut store).await, Ok(0));
        assert_eq!(store, PageStore::new_document());
        // back on the page that was on screen before the load
        assert_eq!(task.revert(&mut store).await, Ok(2));
        assert_eq!(store, before);
    }

    #[tokio::test]
    async fn fixed_task_with_bad_fumen_leaves_store() {
        let mut store = store();
        let before = store.clone();
        let mut task: HistoryTask = FixedTask::new(&store, 0, "v110@vhAAgH", 1).into();
        assert!(task.replay(&mut store).await.is_err());
        assert_eq!(store, before);
    }
}

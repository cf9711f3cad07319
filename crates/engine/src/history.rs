//! Bounded undo/redo history
//!
//! Registering a task clears the redo stack. The undo stack keeps at most
//! `capacity` tasks and drops the oldest first. A task whose undo or redo
//! fails goes back where it came from.

use std::collections::VecDeque;

use fumen_core::FumenError;

use crate::config::EditorConfig;
use crate::store::PageStore;
use crate::task::HistoryTask;

/// What an undo or redo did: the task's key and the page to show
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryStep {
    pub key: String,
    pub index: usize,
}

#[derive(Debug, Clone)]
pub struct History {
    undo: VecDeque<HistoryTask>,
    redo: Vec<HistoryTask>,
    capacity: usize,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn from_config(config: &EditorConfig) -> Self {
        Self::new(config.history_capacity)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Record a task that has already been replayed
    pub fn register(&mut self, task: impl Into<HistoryTask>) {
        self.undo.push_back(task.into());
        while self.undo.len() > self.capacity {
            self.undo.pop_front();
        }
        self.redo.clear();
    }

    /// Replay a task and record it; nothing is recorded if it fails
    ///
    /// Returns the page to show.
    pub async fn execute(
        &mut self,
        task: impl Into<HistoryTask>,
        store: &mut PageStore,
    ) -> Result<usize, FumenError> {
        let mut task = task.into();
        let index = task.replay(store).await?;
        self.register(task);
        Ok(index)
    }

    /// Revert the newest task, or None if there is nothing to undo
    pub async fn undo(
        &mut self,
        store: &mut PageStore,
    ) -> Result<Option<HistoryStep>, FumenError> {
        let Some(mut task) = self.undo.pop_back() else {
            return Ok(None);
        };
        let index = match task.revert(store).await {
            Ok(index) => index,
            Err(e) => {
                self.undo.push_back(task);
                return Err(e);
            }
        };
        let key = task.key().to_string();
        self.redo.push(task);
        Ok(Some(HistoryStep { key, index }))
    }

    /// Replay the newest undone task, or None if there is nothing to redo
    pub async fn redo(
        &mut self,
        store: &mut PageStore,
    ) -> Result<Option<HistoryStep>, FumenError> {
        let Some(mut task) = self.redo.pop() else {
            return Ok(None);
        };
        let index = match task.replay(store).await {
            Ok(index) => index,
            Err(e) => {
                self.redo.push(task);
                return Err(e);
            }
        };
        let key = task.key().to_string();
        self.undo.push_back(task);
        Ok(Some(HistoryStep { key, index }))
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

impl Default for History {
    fn default() -> Self {
        Self::from_config(&EditorConfig::default())
    }
}

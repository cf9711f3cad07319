//! Page model
//!
//! A page is one frame of a fumen: a field that is either stored ("key") or
//! derived from an earlier page ("reference"), an optional piece placement, a
//! comment that is likewise stored or referenced, optional manual cell edits,
//! and the flags controlling what happens when the page's piece locks.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::field::Field;
use crate::types::{Move, Piece};

/// Where a page's field comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSource {
    /// Stored snapshot, before this page's commands
    Key(Field),
    /// Derived by replaying from an earlier page
    Ref(usize),
}

/// Where a page's comment comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentSource {
    Text(String),
    Ref(usize),
}

/// Cell addressed by a manual edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CommandKey {
    Block { x: i32, y: i32 },
    SentBlock { x: i32 },
}

/// Manual cell overrides applied before the page's piece locks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Commands {
    pub pre: BTreeMap<CommandKey, Piece>,
}

impl Commands {
    pub fn is_empty(&self) -> bool {
        self.pre.is_empty()
    }

    pub fn apply(&self, field: &mut Field) {
        for (key, &piece) in &self.pre {
            match *key {
                CommandKey::Block { x, y } => field.set(x, y, piece),
                CommandKey::SentBlock { x } => field.set(x, -1, piece),
            };
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Flags {
    pub lock: bool,
    pub mirror: bool,
    pub colorize: bool,
    pub rise: bool,
    pub quiz: bool,
}

/// Flags of a freshly created page: locking, colorized
impl Default for Flags {
    fn default() -> Self {
        Self {
            lock: true,
            mirror: false,
            colorize: true,
            rise: false,
            quiz: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub index: usize,
    pub field: FieldSource,
    pub piece: Option<Move>,
    pub comment: CommentSource,
    pub commands: Option<Commands>,
    pub flags: Flags,
}

impl Page {
    /// A page storing both its field and its comment
    pub fn key(index: usize, field: Field, comment: impl Into<String>) -> Self {
        Self {
            index,
            field: FieldSource::Key(field),
            piece: None,
            comment: CommentSource::Text(comment.into()),
            commands: None,
            flags: Flags::default(),
        }
    }

    /// A page deriving both field and comment from earlier pages
    pub fn reference(index: usize, field_ref: usize, comment_ref: usize) -> Self {
        Self {
            index,
            field: FieldSource::Ref(field_ref),
            piece: None,
            comment: CommentSource::Ref(comment_ref),
            commands: None,
            flags: Flags::default(),
        }
    }

    pub fn field_ref(&self) -> Option<usize> {
        match self.field {
            FieldSource::Ref(r) => Some(r),
            FieldSource::Key(_) => None,
        }
    }

    pub fn comment_ref(&self) -> Option<usize> {
        match self.comment {
            CommentSource::Ref(r) => Some(r),
            CommentSource::Text(_) => None,
        }
    }

    pub fn is_key_field(&self) -> bool {
        matches!(self.field, FieldSource::Key(_))
    }

    pub fn is_key_comment(&self) -> bool {
        matches!(self.comment, CommentSource::Text(_))
    }

    /// Apply this page's manual cell edits
    pub fn apply_commands(&self, field: &mut Field) {
        if let Some(commands) = &self.commands {
            commands.apply(field);
        }
    }

    /// Apply what happens after this page: stamp, clear, rise, mirror
    ///
    /// No-op unless the page locks.
    pub fn apply_lock(&self, field: &mut Field) {
        if !self.flags.lock {
            return;
        }
        if let Some(piece) = &self.piece {
            field.put(piece);
        }
        field.clear_line();
        if self.flags.rise {
            field.rise_garbage();
        }
        if self.flags.mirror {
            field.mirror();
        }
    }
}

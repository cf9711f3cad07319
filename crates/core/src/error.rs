//! Error types shared by the codec and the page engine.
//!
//! Two families: [`FormatError`] for malformed input or illegal requests, and
//! [`ConsistencyError`] for a page graph that cannot be resolved. Both roll up
//! into [`FumenError`].

use thiserror::Error;

/// Malformed data or an illegal request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("unsupported fumen version: {0}")]
    UnsupportedVersion(String),
    #[error("unexpected end of data: needed {needed} symbols, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },
    #[error("invalid symbol {0:?} in fumen data")]
    InvalidSymbol(char),
    #[error("invalid cell value {value} at ({x}, {y})")]
    InvalidCell { x: i32, y: i32, value: i32 },
    #[error("invalid comment character code {0}")]
    InvalidCommentChar(u32),
    #[error("invalid action value {0}")]
    InvalidAction(u32),
    #[error("malformed quiz: {0}")]
    InvalidQuiz(String),
    #[error("illegal quiz operation: {piece} in {quiz}")]
    IllegalQuizOperation { quiz: String, piece: char },
    #[error("field string length {0} is not a multiple of 10")]
    FieldLength(usize),
    #[error("field string has {0} rows, at most 23 fit")]
    FieldTooTall(usize),
    #[error("invalid field character {0:?}")]
    InvalidFieldChar(char),
    #[error("index {index} out of range for {len} pages")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("page {index} references missing target {target}")]
    MissingReference { index: usize, target: usize },
    #[error("page {index} must set exactly one of {slot} value or reference")]
    AmbiguousSlot { index: usize, slot: &'static str },
    #[error("invalid {kind} value {value:?}")]
    InvalidValue { kind: &'static str, value: String },
}

impl FormatError {
    pub fn code(&self) -> &'static str {
        match self {
            FormatError::UnsupportedVersion(_) => "unsupported_version",
            FormatError::Truncated { .. } => "truncated",
            FormatError::InvalidSymbol(_)
            | FormatError::InvalidCell { .. }
            | FormatError::InvalidCommentChar(_)
            | FormatError::InvalidAction(_) => "invalid_data",
            FormatError::InvalidQuiz(_) => "invalid_quiz",
            FormatError::IllegalQuizOperation { .. } => "illegal_quiz_operation",
            FormatError::FieldLength(_)
            | FormatError::FieldTooTall(_)
            | FormatError::InvalidFieldChar(_) => "invalid_field",
            FormatError::IndexOutOfRange { .. } => "index_out_of_range",
            FormatError::MissingReference { .. } | FormatError::AmbiguousSlot { .. } => {
                "invalid_reference"
            }
            FormatError::InvalidValue { .. } => "invalid_value",
        }
    }
}

/// A page graph that cannot be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsistencyError {
    #[error("reference chain from page {index} does not terminate")]
    NonTerminatingChain { index: usize },
    #[error("page {index} has no {slot} ancestor holding a value")]
    MissingAncestor { index: usize, slot: &'static str },
    #[error("{piece} is not a mino")]
    NotMino { piece: char },
    #[error("task at page {index} was reverted before it was replayed")]
    MissingSnapshot { index: usize },
}

impl ConsistencyError {
    pub fn code(&self) -> &'static str {
        match self {
            ConsistencyError::NonTerminatingChain { .. } => "non_terminating_chain",
            ConsistencyError::MissingAncestor { .. } => "missing_ancestor",
            ConsistencyError::NotMino { .. } => "not_mino",
            ConsistencyError::MissingSnapshot { .. } => "missing_snapshot",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FumenError {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Consistency(#[from] ConsistencyError),
}

impl FumenError {
    pub fn code(&self) -> &'static str {
        match self {
            FumenError::Format(e) => e.code(),
            FumenError::Consistency(e) => e.code(),
        }
    }
}

pub type Result<T, E = FumenError> = std::result::Result<T, E>;

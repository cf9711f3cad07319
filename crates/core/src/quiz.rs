//! Quiz module - hold/current/next annotations carried in comments
//!
//! Grammar: `#Q=[H](C)REST` where `H` and `C` are empty or one piece letter and
//! `REST` is a run of piece letters. A current piece must exist while any rest
//! piece remains. Whitespace is ignored and letters are case-insensitive.
//!
//! Every operation returns a new [`Quiz`]; values never change in place.

use std::fmt;

use crate::error::FormatError;
use crate::types::{Operation, Piece};

/// Prefix marking a comment as a quiz
pub const QUIZ_PREFIX: &str = "#Q=";

/// A piece could not be matched against the quiz queue
///
/// Recoverable: the decoder records "no operation" and moves on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unclassified {
    pub piece: Piece,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Quiz {
    hold: Option<Piece>,
    current: Option<Piece>,
    rest: Vec<Piece>,
}

impl Quiz {
    /// Whether a comment should be read as a quiz
    pub fn is_quiz_comment(comment: &str) -> bool {
        comment.trim_start().starts_with(QUIZ_PREFIX)
    }

    /// Parse a quiz string
    ///
    /// ```
    /// use fumen_core::Quiz;
    ///
    /// let quiz = Quiz::new("#Q=[T](I)SZOJL").unwrap();
    /// assert_eq!(quiz.to_string(), "#Q=[T](I)SZOJL");
    /// assert!(Quiz::new("#Q=[T]()SZ").is_err());
    /// ```
    pub fn new(quiz: &str) -> Result<Self, FormatError> {
        let invalid = || FormatError::InvalidQuiz(quiz.to_string());
        let trimmed: String = quiz.chars().filter(|c| !c.is_whitespace()).collect();

        let body = trimmed.strip_prefix(QUIZ_PREFIX).ok_or_else(invalid)?;
        let body = body.strip_prefix('[').ok_or_else(invalid)?;
        let (hold, body) = body.split_once(']').ok_or_else(invalid)?;
        let body = body.strip_prefix('(').ok_or_else(invalid)?;
        let (current, rest) = body.split_once(')').ok_or_else(invalid)?;

        let slot = |s: &str| -> Result<Option<Piece>, FormatError> {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (None, _) => Ok(None),
                (Some(c), None) => mino(c).map(Some).ok_or_else(invalid),
                _ => Err(invalid()),
            }
        };
        let hold = slot(hold)?;
        let current = slot(current)?;
        let rest = rest
            .chars()
            .map(|c| mino(c).ok_or_else(invalid))
            .collect::<Result<Vec<_>, _>>()?;

        if current.is_none() && !rest.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            hold,
            current,
            rest,
        })
    }

    pub fn hold(&self) -> Option<Piece> {
        self.hold
    }

    pub fn current(&self) -> Option<Piece> {
        self.current
    }

    /// Pieces after the current one
    pub fn rest(&self) -> &[Piece] {
        &self.rest
    }

    /// Current piece followed by the rest, at most `max` entries
    pub fn next_pieces(&self, max: usize) -> Vec<Piece> {
        self.current
            .iter()
            .chain(self.rest.iter())
            .take(max)
            .copied()
            .collect()
    }

    fn build(hold: Option<Piece>, current: Option<Piece>, rest: &[Piece]) -> Self {
        Self {
            hold,
            current,
            rest: rest.to_vec(),
        }
    }

    fn split_rest(&self) -> (Option<Piece>, &[Piece]) {
        match self.rest.split_first() {
            Some((head, tail)) => (Some(*head), tail),
            None => (None, &[]),
        }
    }

    /// Place the current piece
    pub fn direct(&self) -> Result<Self, FormatError> {
        if self.current.is_none() {
            return Err(FormatError::InvalidQuiz(format!(
                "no current piece to place: {}",
                self
            )));
        }
        let (head, tail) = self.split_rest();
        Ok(Self::build(self.hold, head, tail))
    }

    /// Place the held piece; the current piece goes to hold
    pub fn swap(&self) -> Result<Self, FormatError> {
        if self.hold.is_none() {
            return Err(FormatError::InvalidQuiz(format!(
                "no hold piece to swap: {}",
                self
            )));
        }
        let (head, tail) = self.split_rest();
        Ok(Self::build(self.current, head, tail))
    }

    /// Hold the current piece and place the next one
    pub fn stock(&self) -> Result<Self, FormatError> {
        if self.hold.is_some() || self.current.is_none() || self.rest.is_empty() {
            return Err(FormatError::InvalidQuiz(format!("cannot stock: {}", self)));
        }
        let after_next = &self.rest[1..];
        let (head, tail) = match after_next.split_first() {
            Some((head, tail)) => (Some(*head), tail),
            None => (None, &[][..]),
        };
        Ok(Self::build(self.current, head, tail))
    }

    pub fn operate(&self, operation: Operation) -> Result<Self, FormatError> {
        match operation {
            Operation::Direct => self.direct(),
            Operation::Swap => self.swap(),
            Operation::Stock => self.stock(),
        }
    }

    /// Match a placed piece against the queue without failing hard
    pub fn classify(&self, piece: Piece) -> Result<Operation, Unclassified> {
        if !piece.is_mino() {
            return Err(Unclassified { piece });
        }
        if self.current == Some(piece) {
            return Ok(Operation::Direct);
        }
        if self.hold == Some(piece) {
            return Ok(Operation::Swap);
        }
        if self.hold.is_none() && self.rest.first() == Some(&piece) {
            return Ok(Operation::Stock);
        }
        Err(Unclassified { piece })
    }

    /// Which operation places `piece`
    pub fn get_operation(&self, piece: Piece) -> Result<Operation, FormatError> {
        self.classify(piece)
            .map_err(|e| FormatError::IllegalQuizOperation {
                quiz: self.to_string(),
                piece: e.piece.as_char(),
            })
    }

    /// Canonical display form
    ///
    /// When the current piece is exhausted the held piece is shown as current.
    pub fn format(&self) -> Self {
        match (self.hold, self.current) {
            (Some(hold), None) => Self::build(None, Some(hold), &self.rest),
            _ => self.clone(),
        }
    }

    /// False only for the fully exhausted quiz `#Q=[]()`
    pub fn can_operate(&self) -> bool {
        self.hold.is_some() || self.current.is_some() || !self.rest.is_empty()
    }

    /// Advance past one page
    ///
    /// Only a locked page moves the quiz. An unclassifiable mino, or a locked
    /// non-mino, leaves the quiz in its display form.
    pub fn advance(&self, piece: Option<Piece>, lock: bool) -> Self {
        if !self.can_operate() || !lock {
            return self.clone();
        }
        match piece.filter(|p| p.is_mino()) {
            Some(piece) => self
                .classify(piece)
                .ok()
                .and_then(|op| self.operate(op).ok())
                .unwrap_or_else(|| self.format()),
            None => self.format(),
        }
    }
}

fn mino(c: char) -> Option<Piece> {
    Piece::from_char(c).filter(|p| p.is_mino())
}

impl fmt::Display for Quiz {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = |p: Option<Piece>| p.map(|p| p.as_char().to_string()).unwrap_or_default();
        write!(
            f,
            "{}[{}]({})",
            QUIZ_PREFIX,
            letter(self.hold),
            letter(self.current)
        )?;
        for piece in &self.rest {
            write!(f, "{}", piece.as_char())?;
        }
        Ok(())
    }
}

//! Comment resolution
//!
//! A page shows either plain text with a preview of the upcoming pieces, or,
//! on quiz pages, the quiz state reached by replaying every placement since
//! the quiz was written.

use arrayvec::ArrayVec;
use fumen_core::types::{Piece, NEXT_PIECES};
use fumen_core::{CommentSource, ConsistencyError, FumenError, Quiz};

use crate::store::PageStore;

/// Resolved comment of one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageComment {
    Text {
        text: String,
        /// Distinct pieces placed on the following pages
        next: ArrayVec<Piece, NEXT_PIECES>,
    },
    Quiz {
        /// State when the page is shown
        quiz: Quiz,
        /// State after the page's own placement
        after_operation: Quiz,
    },
}

impl PageComment {
    /// Text a renderer shows, quizzes in their display form
    pub fn text(&self) -> String {
        match self {
            PageComment::Text { text, .. } => text.clone(),
            PageComment::Quiz { quiz, .. } => quiz.format().to_string(),
        }
    }

    pub fn is_quiz(&self) -> bool {
        matches!(self, PageComment::Quiz { .. })
    }
}

impl PageStore {
    /// Nearest explicit comment: (page holding it, its text)
    pub fn comment_text(&self, index: usize) -> Result<(usize, &str), FumenError> {
        self.check_index(index)?;
        let mut i = index;
        loop {
            match &self.pages[i].comment {
                CommentSource::Text(text) => return Ok((i, text)),
                CommentSource::Ref(target) if *target >= i => {
                    return Err(ConsistencyError::NonTerminatingChain { index: i }.into())
                }
                CommentSource::Ref(_) if i == 0 => {
                    return Err(ConsistencyError::MissingAncestor {
                        index,
                        slot: "comment",
                    }
                    .into())
                }
                CommentSource::Ref(_) => i -= 1,
            }
        }
    }

    /// Resolve the comment of a page
    ///
    /// The quiz form is used when the page is flagged as a quiz page and the
    /// nearest explicit comment parses as one; anything else is plain text.
    pub fn get_comment(&self, index: usize) -> Result<PageComment, FumenError> {
        let (key, text) = self.comment_text(index)?;

        let page = &self.pages[index];
        let quiz = if page.flags.quiz && Quiz::is_quiz_comment(text) {
            Quiz::new(text).ok()
        } else {
            None
        };

        match quiz {
            Some(quiz) => {
                let quiz = self.pages[key..index]
                    .iter()
                    .fold(quiz, |q, p| q.advance(p.piece.map(|mv| mv.piece), p.flags.lock));
                let after_operation =
                    quiz.advance(page.piece.map(|mv| mv.piece), page.flags.lock);
                Ok(PageComment::Quiz {
                    quiz,
                    after_operation,
                })
            }
            None => Ok(PageComment::Text {
                text: text.to_string(),
                next: self.next_pieces(index),
            }),
        }
    }

    /// Up to five distinct upcoming pieces after `index`
    ///
    /// A run of pages moving the same unlocked piece counts once.
    pub fn next_pieces(&self, index: usize) -> ArrayVec<Piece, NEXT_PIECES> {
        let mut next = ArrayVec::new();
        let Some(page) = self.pages.get(index) else {
            return next;
        };

        let mut current = match page.piece {
            Some(mv) if !page.flags.lock => mv.piece,
            _ => Piece::Empty,
        };
        for page in &self.pages[index + 1..] {
            match page.piece {
                Some(mv) => {
                    if mv.piece != current && mv.piece.is_mino() {
                        next.push(mv.piece);
                        if next.is_full() {
                            break;
                        }
                    }
                    current = mv.piece;
                }
                None => current = Piece::Empty,
            }
            if page.flags.lock {
                current = Piece::Empty;
            }
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fumen_core::types::{Move, Rotation};
    use fumen_core::{Field, Page};

    fn placed(index: usize, piece: Piece, lock: bool) -> Page {
        let mut page = Page::reference(index, 0, 0);
        page.piece = Some(Move::new(piece, Rotation::Spawn, 4, 0));
        page.flags.lock = lock;
        page
    }

    #[test]
    fn text_comment_with_lookahead() {
        let store = PageStore::new(vec![
            Page::key(0, Field::new(), "hello"),
            placed(1, Piece::T, true),
            placed(2, Piece::I, false),
            placed(3, Piece::I, true),
            placed(4, Piece::I, true),
        ])
        .unwrap();

        let comment = store.get_comment(0).unwrap();
        let PageComment::Text { text, next } = comment else {
            panic!("plain comment expected");
        };
        assert_eq!(text, "hello");
        assert_eq!(next.as_slice(), &[Piece::T, Piece::I, Piece::I]);
        assert_eq!(store.get_comment(4).unwrap().text(), "hello");
    }

    #[test]
    fn lookahead_stops_at_five() {
        let mut pages = vec![Page::key(0, Field::new(), "")];
        for (i, piece) in Piece::MINOS.iter().enumerate() {
            pages.push(placed(i + 1, *piece, true));
        }
        let store = PageStore::new(pages).unwrap();
        assert_eq!(store.next_pieces(0).len(), 5);
        assert_eq!(store.next_pieces(7).len(), 0);
    }

    #[test]
    fn unlocked_current_piece_is_not_repeated() {
        let mut first = Page::key(0, Field::new(), "");
        first.piece = Some(Move::new(Piece::S, Rotation::Spawn, 4, 0));
        first.flags.lock = false;
        let store = PageStore::new(vec![first, placed(1, Piece::S, true), placed(2, Piece::Z, true)])
            .unwrap();
        assert_eq!(store.next_pieces(0).as_slice(), &[Piece::Z]);
    }

    #[test]
    fn quiz_chain_advances_through_pages() {
        let mut first = Page::key(0, Field::new(), "#Q=[](T)IS");
        first.flags.quiz = true;
        first.piece = Some(Move::new(Piece::T, Rotation::Spawn, 4, 0));
        let mut second = placed(1, Piece::I, true);
        second.flags.quiz = true;
        let store = PageStore::new(vec![first, second]).unwrap();

        let PageComment::Quiz {
            quiz,
            after_operation,
        } = store.get_comment(1).unwrap()
        else {
            panic!("quiz comment expected");
        };
        assert_eq!(quiz.to_string(), "#Q=[](I)S");
        assert_eq!(after_operation.to_string(), "#Q=[](S)");
    }

    #[test]
    fn quiz_text_without_flag_stays_text() {
        let store = PageStore::new(vec![Page::key(0, Field::new(), "#Q=[](T)")]).unwrap();
        assert!(!store.get_comment(0).unwrap().is_quiz());
    }

    #[test]
    fn malformed_quiz_falls_back_to_text() {
        let mut page = Page::key(0, Field::new(), "#Q=[](T");
        page.flags.quiz = true;
        let store = PageStore::new(vec![page]).unwrap();
        assert_eq!(store.get_comment(0).unwrap().text(), "#Q=[](T");
    }
}

//! Page-by-page decoder
//!
//! [`Decoder`] is an iterator: each `next()` reads exactly one page from the
//! value stream, so callers can stop, interleave other work, or (in
//! [`decode_async`]) yield to the runtime between pages.

use fumen_core::action::{decode_action, ACTION_SYMBOLS};
use fumen_core::comment::decode_comment;
use fumen_core::types::{Piece, FIELD_TOP, FIELD_WIDTH, TOTAL_BLOCKS};
use fumen_core::{CommentSource, Field, FieldSource, Flags, FormatError, Page, Quiz, Values};

use crate::extract::extract;

/// Symbols per field diff run
pub(crate) const RUN_SYMBOLS: usize = 2;

/// Symbols of the repeat count following an unchanged field
pub(crate) const REPEAT_SYMBOLS: usize = 1;

/// Diff value meaning "cell unchanged"
pub(crate) const NEUTRAL_DIFF: u32 = 8;

/// Streaming decoder over one fumen
pub struct Decoder {
    values: Values,
    index: usize,
    /// Field the next page's diff applies to
    prev_field: Field,
    /// Pages still to reuse the last field without a diff
    repeat: u32,
    field_ref: usize,
    comment_ref: usize,
    quiz: Option<Quiz>,
    failed: bool,
}

impl Decoder {
    /// Prepare to decode `input`; prefix, URL noise and version are checked here
    pub fn new(input: &str) -> Result<Self, FormatError> {
        let data = extract(input)?;
        Ok(Self {
            values: Values::parse(&data)?,
            index: 0,
            prev_field: Field::new(),
            repeat: 0,
            field_ref: 0,
            comment_ref: 0,
            quiz: None,
            failed: false,
        })
    }

    /// Index of the next page to be produced
    pub fn index(&self) -> usize {
        self.index
    }

    /// Read the next field; returns it with whether it differs from the last one
    fn read_field(&mut self) -> Result<(Field, bool), FormatError> {
        if self.repeat > 0 {
            self.repeat -= 1;
            return Ok((self.prev_field.clone(), false));
        }

        let mut field = self.prev_field.clone();
        let mut changed = true;
        let mut index = 0;
        while index < TOTAL_BLOCKS {
            let block = self.values.poll(RUN_SYMBOLS)?;
            let diff = block / TOTAL_BLOCKS as u32;
            let run = (block % TOTAL_BLOCKS as u32) as usize + 1;
            if diff == NEUTRAL_DIFF && run == TOTAL_BLOCKS {
                changed = false;
            }

            for _ in 0..run {
                let x = (index % FIELD_WIDTH) as i32;
                let y = FIELD_TOP as i32 - (index / FIELD_WIDTH) as i32 - 1;
                field.add(x, y, diff as i32 - NEUTRAL_DIFF as i32)?;
                index += 1;
            }
        }

        if !changed {
            self.repeat = self.values.poll(REPEAT_SYMBOLS)?;
        }
        Ok((field, changed))
    }

    fn read_page(&mut self) -> Result<Page, FormatError> {
        let index = self.index;
        let (field, changed) = self.read_field()?;
        let action = decode_action(self.values.poll(ACTION_SYMBOLS)?)?;

        let comment = if action.comment {
            let text = decode_comment(&mut self.values)?;
            self.quiz = if Quiz::is_quiz_comment(&text) {
                Quiz::new(&text).ok()
            } else {
                None
            };
            self.comment_ref = index;
            CommentSource::Text(text)
        } else if index == 0 {
            CommentSource::Text(String::new())
        } else {
            CommentSource::Ref(self.comment_ref)
        };

        let quiz = self.quiz.is_some();
        if let Some(current) = &self.quiz {
            self.quiz = Some(current.advance(Some(action.piece.piece), action.lock));
        }

        let field = if changed || index == 0 {
            self.field_ref = index;
            FieldSource::Key(field)
        } else {
            FieldSource::Ref(self.field_ref)
        };

        let page = Page {
            index,
            field,
            piece: (action.piece.piece != Piece::Empty).then_some(action.piece),
            comment,
            commands: None,
            flags: Flags {
                lock: action.lock,
                mirror: action.mirror,
                colorize: action.colorize,
                rise: action.rise,
                quiz,
            },
        };

        let mut next = match &page.field {
            FieldSource::Key(field) => field.clone(),
            FieldSource::Ref(_) => self.prev_field.clone(),
        };
        page.apply_lock(&mut next);
        self.prev_field = next;
        self.index += 1;
        Ok(page)
    }
}

impl Iterator for Decoder {
    type Item = Result<Page, FormatError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.values.is_empty() {
            return None;
        }
        let page = self.read_page();
        self.failed = page.is_err();
        Some(page)
    }
}

/// Decode every page of a fumen
pub fn decode(input: &str) -> Result<Vec<Page>, FormatError> {
    Decoder::new(input)?.collect()
}

/// Decode every page, yielding to the runtime every `yield_every` pages
///
/// `yield_every == 0` never yields.
pub async fn decode_async(input: &str, yield_every: usize) -> Result<Vec<Page>, FormatError> {
    let mut pages = Vec::new();
    for page in Decoder::new(input)? {
        pages.push(page?);
        if yield_every > 0 && pages.len() % yield_every == 0 {
            tokio::task::yield_now().await;
        }
    }
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fumen_core::types::{Move, Rotation};

    #[test]
    fn empty_document() {
        let pages = decode("v115@vhAAgH").unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0], Page::key(0, Field::new(), ""));
    }

    #[test]
    fn repeat_count_turns_pages_into_refs() {
        let pages = decode("v115@vhCAgHAgHAgH").unwrap();
        assert_eq!(pages.len(), 3);
        assert!(pages[0].is_key_field());
        assert_eq!(pages[1].field_ref(), Some(0));
        assert_eq!(pages[2].field_ref(), Some(0));
        assert_eq!(pages[2].comment_ref(), Some(0));
    }

    #[test]
    fn comment_bit_reads_text() {
        let pages = decode("v115@vhAAgWBABBAAA").unwrap();
        assert_eq!(pages[0].comment, CommentSource::Text("a".to_string()));
    }

    #[test]
    fn truncated_stream_stops_iteration() {
        let mut decoder = Decoder::new("v115@vhAAg").unwrap();
        assert!(matches!(decoder.next(), Some(Err(FormatError::Truncated { .. }))));
        assert!(decoder.next().is_none());
    }

    #[test]
    fn empty_body_has_no_pages() {
        assert!(decode("v115@").unwrap().is_empty());
    }

    #[test]
    fn invalid_symbol_is_rejected() {
        assert_eq!(decode("v115@vh!AgH"), Err(FormatError::InvalidSymbol('!')));
    }

    #[test]
    fn locked_piece_carries_into_following_pages() {
        let mut encoder = crate::Encoder::new();
        let mut first = Page::key(0, Field::new(), "");
        first.piece = Some(Move::new(Piece::I, Rotation::Spawn, 4, 0));
        encoder.push(&first).unwrap();
        encoder.push(&Page::reference(1, 0, 0)).unwrap();
        encoder.push(&Page::key(2, Field::new(), "")).unwrap();
        let pages = decode(&encoder.finish()).unwrap();

        assert_eq!(pages[0].piece, first.piece);
        // the stamped I is the baseline, so page 1 needs no diff
        assert_eq!(pages[1].field_ref(), Some(0));
        // page 2 wipes it again and must be stored
        assert_eq!(pages[2].field, FieldSource::Key(Field::new()));
    }

    #[tokio::test]
    async fn async_matches_sync() {
        let data = "v115@vhCAgHAgHAgH";
        assert_eq!(decode_async(data, 1).await.unwrap(), decode(data).unwrap());
        assert_eq!(decode_async(data, 0).await.unwrap(), decode(data).unwrap());
    }
}

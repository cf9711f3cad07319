//! Page-by-page encoder
//!
//! The field of each page is diffed against the previous page's field after
//! its lock. Runs of unchanged pages share one repeat counter symbol, which
//! is bumped in place until it saturates.

use fumen_core::action::{encode_action, Action, ACTION_SYMBOLS};
use fumen_core::comment::encode_comment;
use fumen_core::types::{Move, FIELD_TOP, FIELD_WIDTH, TOTAL_BLOCKS};
use fumen_core::values::TABLE_LENGTH;
use fumen_core::{
    CommentSource, ConsistencyError, Field, FieldSource, FormatError, FumenError, Page, Values,
};

use crate::decoder::{NEUTRAL_DIFF, REPEAT_SYMBOLS, RUN_SYMBOLS};
use crate::extract::PREFIX;

fn cell_value(field: &Field, index: usize) -> u32 {
    let x = (index % FIELD_WIDTH) as i32;
    let y = FIELD_TOP as i32 - (index / FIELD_WIDTH) as i32 - 1;
    field.get(x, y).map_or(0, |p| p.value() as u32)
}

/// Diff `current` against `prev`; returns the runs and whether anything changed
fn encode_field(prev: &Field, current: &Field) -> (Values, bool) {
    let mut values = Values::new();
    let mut changed = false;

    let diff_at = |index: usize| cell_value(current, index) + NEUTRAL_DIFF - cell_value(prev, index);
    let mut run_diff = diff_at(0);
    let mut run = 0u32;
    for index in 0..TOTAL_BLOCKS {
        let diff = diff_at(index);
        changed |= diff != NEUTRAL_DIFF;
        if diff != run_diff {
            values.push(run_diff * TOTAL_BLOCKS as u32 + run - 1, RUN_SYMBOLS);
            run_diff = diff;
            run = 0;
        }
        run += 1;
    }
    values.push(run_diff * TOTAL_BLOCKS as u32 + run - 1, RUN_SYMBOLS);
    (values, changed)
}

/// Streaming encoder; push pages in order, then [`Encoder::finish`]
#[derive(Debug, Default)]
pub struct Encoder {
    values: Values,
    index: usize,
    prev_field: Field,
    /// Position of the repeat counter that can still absorb unchanged pages
    last_repeat: Option<usize>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pages pushed so far
    pub fn len(&self) -> usize {
        self.index
    }

    pub fn is_empty(&self) -> bool {
        self.index == 0
    }

    fn update_field(&mut self, field: &Field) {
        let (diff, changed) = encode_field(&self.prev_field, field);
        if changed {
            self.values.merge(diff);
            self.last_repeat = None;
            return;
        }

        let counter = self
            .last_repeat
            .and_then(|at| self.values.get(at).map(|count| (at, count)))
            .filter(|&(_, count)| (count as u32) < TABLE_LENGTH - 1);
        match counter {
            Some((at, count)) => {
                self.values.set(at, count + 1);
            }
            None => {
                self.values.merge(diff);
                self.values.push(0, REPEAT_SYMBOLS);
                self.last_repeat = Some(self.values.len() - 1);
            }
        }
    }

    /// Append one page
    ///
    /// On error nothing is written and the encoder can keep going with a
    /// corrected page.
    pub fn push(&mut self, page: &Page) -> Result<(), FumenError> {
        let index = self.index;
        let mut field = match &page.field {
            FieldSource::Key(field) => field.clone(),
            FieldSource::Ref(_) if index == 0 => {
                return Err(ConsistencyError::MissingAncestor { index, slot: "field" }.into())
            }
            FieldSource::Ref(target) if *target >= index => {
                return Err(FormatError::MissingReference {
                    index,
                    target: *target,
                }
                .into())
            }
            FieldSource::Ref(_) => self.prev_field.clone(),
        };
        page.apply_commands(&mut field);

        let comment = match &page.comment {
            CommentSource::Text(text) if index > 0 || !text.is_empty() => Some(text.as_str()),
            CommentSource::Text(_) => None,
            CommentSource::Ref(_) if index == 0 => {
                return Err(ConsistencyError::MissingAncestor {
                    index,
                    slot: "comment",
                }
                .into())
            }
            CommentSource::Ref(target) if *target >= index => {
                return Err(FormatError::MissingReference {
                    index,
                    target: *target,
                }
                .into())
            }
            CommentSource::Ref(_) => None,
        };

        let action = Action {
            piece: page.piece.unwrap_or_else(Move::empty),
            rise: page.flags.rise,
            mirror: page.flags.mirror,
            colorize: page.flags.colorize,
            comment: comment.is_some(),
            lock: page.flags.lock,
        };
        let action_value = encode_action(&action)?;
        let mut comment_values = Values::new();
        if let Some(text) = comment {
            encode_comment(text, &mut comment_values)?;
        }

        self.update_field(&field);
        self.values.push(action_value, ACTION_SYMBOLS);
        self.values.merge(comment_values);

        page.apply_lock(&mut field);
        self.prev_field = field;
        self.index += 1;
        Ok(())
    }

    /// The encoded fumen with its version prefix
    pub fn finish(self) -> String {
        format!("{}{}", PREFIX, self.values)
    }
}

/// Encode pages into a fumen string
///
/// ```
/// use fumen_codec::encode;
/// use fumen_core::{Field, Page};
///
/// assert_eq!(encode(&[Page::key(0, Field::new(), "")]).unwrap(), "v115@vhAAgH");
/// ```
pub fn encode(pages: &[Page]) -> Result<String, FumenError> {
    let mut encoder = Encoder::new();
    for page in pages {
        encoder.push(page)?;
    }
    Ok(encoder.finish())
}

/// Encode pages, yielding to the runtime every `yield_every` pages
pub async fn encode_async(pages: &[Page], yield_every: usize) -> Result<String, FumenError> {
    let mut encoder = Encoder::new();
    for page in pages {
        encoder.push(page)?;
        if yield_every > 0 && encoder.len() % yield_every == 0 {
            tokio::task::yield_now().await;
        }
    }
    Ok(encoder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fumen_core::types::{Piece, Rotation};

    #[test]
    fn unchanged_pages_share_one_counter() {
        let pages: Vec<Page> = std::iter::once(Page::key(0, Field::new(), ""))
            .chain((1..3).map(|i| Page::reference(i, 0, 0)))
            .collect();
        assert_eq!(encode(&pages).unwrap(), "v115@vhCAgHAgHAgH");
    }

    #[test]
    fn saturated_counter_starts_a_new_run() {
        let pages: Vec<Page> = std::iter::once(Page::key(0, Field::new(), ""))
            .chain((1..65).map(|i| Page::reference(i, 0, 0)))
            .collect();
        let expected = format!("v115@vh/AgH{}vhAAgH", "AgH".repeat(63));
        assert_eq!(encode(&pages).unwrap(), expected);
    }

    #[test]
    fn changed_field_resets_the_counter() {
        let mut field = Field::new();
        field.set(0, 0, Piece::T);
        let pages = vec![
            Page::key(0, Field::new(), ""),
            Page::key(1, field, ""),
            Page::reference(2, 1, 1),
        ];
        let encoded = encode(&pages).unwrap();
        let decoded = crate::decode(&encoded).unwrap();
        assert_eq!(decoded.len(), 3);
        assert!(decoded[1].is_key_field());
        assert_eq!(decoded[2].field_ref(), Some(1));
    }

    #[test]
    fn comment_sets_action_bit() {
        assert_eq!(
            encode(&[Page::key(0, Field::new(), "a")]).unwrap(),
            "v115@vhAAgWBABBAAA"
        );
    }

    #[test]
    fn gray_piece_is_not_encodable() {
        let mut page = Page::key(0, Field::new(), "");
        page.piece = Some(Move::new(Piece::Gray, Rotation::Spawn, 4, 0));
        let err = encode(&[page]).unwrap_err();
        assert_eq!(err, FumenError::Consistency(ConsistencyError::NotMino { piece: 'X' }));
    }

    #[test]
    fn dangling_refs_are_rejected() {
        assert!(matches!(
            encode(&[Page::reference(0, 0, 0)]),
            Err(FumenError::Consistency(ConsistencyError::MissingAncestor { .. }))
        ));
        let pages = vec![Page::key(0, Field::new(), ""), Page::reference(1, 1, 0)];
        assert!(matches!(
            encode(&pages),
            Err(FumenError::Format(FormatError::MissingReference { index: 1, target: 1 }))
        ));
    }

    #[test]
    fn failed_push_leaves_encoder_untouched() {
        let mut encoder = Encoder::new();
        let mut bad = Page::key(0, Field::new(), "");
        bad.piece = Some(Move::new(Piece::Gray, Rotation::Spawn, 4, 0));
        assert!(encoder.push(&bad).is_err());
        assert!(encoder.is_empty());
        encoder.push(&Page::key(0, Field::new(), "")).unwrap();
        assert_eq!(encoder.finish(), "v115@vhAAgH");
    }

    #[test]
    fn commands_fold_into_the_field() {
        let mut page = Page::reference(1, 0, 0);
        let mut commands = fumen_core::Commands::default();
        commands
            .pre
            .insert(fumen_core::CommandKey::Block { x: 0, y: 0 }, Piece::Gray);
        page.commands = Some(commands);
        let pages = vec![Page::key(0, Field::new(), ""), page];
        let decoded = crate::decode(&encode(&pages).unwrap()).unwrap();
        let FieldSource::Key(field) = &decoded[1].field else {
            panic!("page 1 should be stored");
        };
        assert_eq!(field.get(0, 0), Some(Piece::Gray));
    }

    #[tokio::test]
    async fn async_matches_sync() {
        let pages = vec![Page::key(0, Field::new(), "x"), Page::reference(1, 0, 0)];
        assert_eq!(encode_async(&pages, 1).await.unwrap(), encode(&pages).unwrap());
    }
}

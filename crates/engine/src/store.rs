//! Page store - the live page list and lazy field resolution
//!
//! Pages only store a field when it is a key page; every other page derives
//! its field by walking back to the nearest key page and replaying the pages
//! in between. Replays are cached per page so scrolling through a long
//! document stays linear. Any mutation at page `i` drops the caches of `i`
//! and everything after it.

use fumen_codec::{decode, encode};
use fumen_core::types::Move;
use fumen_core::{
    ConsistencyError, Field, FieldSource, Flags, FormatError, FumenError, Page, PrimitivePage,
};

use crate::comment::PageComment;

/// How much of a page to apply when resolving its field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldMode {
    /// Field as the page starts, before its cell commands
    None,
    /// After the page's cell commands; what the page shows
    Command,
    /// After the commands and the lock; what the next page starts from
    All,
}

/// Everything a renderer needs for one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPage {
    pub index: usize,
    /// Field with the page's cell commands applied
    pub field: Field,
    pub piece: Option<Move>,
    pub comment: PageComment,
    pub flags: Flags,
}

/// A page list with resolution caches
///
/// Two stores are equal when their pages are; caches are not compared.
#[derive(Debug, Clone)]
pub struct PageStore {
    pub(crate) pages: Vec<Page>,
    /// Field after page `i` is fully applied
    pub(crate) cache: Vec<Option<Field>>,
}

impl PageStore {
    /// Take ownership of decoded or hand-built pages
    ///
    /// Page indices are renumbered to their positions; references must point
    /// strictly backwards and page 0 must hold a field and a comment.
    pub fn new(mut pages: Vec<Page>) -> Result<Self, FumenError> {
        if pages.is_empty() {
            return Err(FormatError::IndexOutOfRange { index: 0, len: 0 }.into());
        }
        for (index, page) in pages.iter_mut().enumerate() {
            page.index = index;
        }
        check_refs(&pages, 0)?;
        let cache = vec![None; pages.len()];
        Ok(Self { pages, cache })
    }

    /// One empty key page with an empty comment
    pub fn new_document() -> Self {
        Self {
            pages: vec![Page::key(0, Field::new(), "")],
            cache: vec![None],
        }
    }

    pub fn from_fumen(data: &str) -> Result<Self, FumenError> {
        Self::new(decode(data)?)
    }

    pub fn to_fumen(&self) -> Result<String, FumenError> {
        encode(&self.pages)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Always false; a store holds at least one page
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn into_pages(self) -> Vec<Page> {
        self.pages
    }

    pub fn page(&self, index: usize) -> Result<&Page, FormatError> {
        self.pages.get(index).ok_or(FormatError::IndexOutOfRange {
            index,
            len: self.pages.len(),
        })
    }

    pub(crate) fn check_index(&self, index: usize) -> Result<(), FormatError> {
        self.page(index).map(|_| ())
    }

    /// Drop cached fields of `index` and every later page
    pub fn invalidate_from(&mut self, index: usize) {
        for slot in self.cache.iter_mut().skip(index) {
            *slot = None;
        }
    }

    pub(crate) fn reset_cache(&mut self) {
        self.cache = vec![None; self.pages.len()];
    }

    /// Resolve the field of a page
    ///
    /// ```
    /// use fumen_engine::{FieldMode, PageStore};
    ///
    /// let mut store = PageStore::from_fumen("v115@vhCAgHAgHAgH").unwrap();
    /// assert!(store.get_field(2, FieldMode::Command).unwrap().is_empty());
    /// ```
    pub fn get_field(&mut self, index: usize, mode: FieldMode) -> Result<Field, FumenError> {
        self.check_index(index)?;

        let (start, mut field) = self.field_base(index)?;
        for i in start..index {
            let page = &self.pages[i];
            page.apply_commands(&mut field);
            page.apply_lock(&mut field);
            self.cache[i] = Some(field.clone());
        }

        let page = &self.pages[index];
        if mode == FieldMode::None {
            return Ok(field);
        }
        page.apply_commands(&mut field);
        if mode == FieldMode::Command {
            return Ok(field);
        }
        page.apply_lock(&mut field);
        self.cache[index] = Some(field.clone());
        Ok(field)
    }

    pub fn resolved_page(&mut self, index: usize) -> Result<ResolvedPage, FumenError> {
        let field = self.get_field(index, FieldMode::Command)?;
        let comment = self.get_comment(index)?;
        let page = &self.pages[index];
        Ok(ResolvedPage {
            index,
            field,
            piece: page.piece,
            comment,
            flags: page.flags,
        })
    }

    /// Find where replay for `index` starts: (first page to replay, its starting field)
    fn field_base(&self, index: usize) -> Result<(usize, Field), ConsistencyError> {
        let mut i = index;
        loop {
            match &self.pages[i].field {
                FieldSource::Key(field) => return Ok((i, field.clone())),
                FieldSource::Ref(target) if *target >= i => {
                    return Err(ConsistencyError::NonTerminatingChain { index: i })
                }
                FieldSource::Ref(_) if i == 0 => {
                    return Err(ConsistencyError::MissingAncestor {
                        index,
                        slot: "field",
                    })
                }
                FieldSource::Ref(_) => {}
            }
            if let Some(Some(field)) = self.cache.get(i - 1) {
                return Ok((i, field.clone()));
            }
            i -= 1;
        }
    }

    /// Nearest page at or before `index` holding its own field
    pub fn field_key_index(&self, index: usize) -> Result<usize, FumenError> {
        self.check_index(index)?;
        (0..=index)
            .rev()
            .find(|&i| self.pages[i].is_key_field())
            .ok_or_else(|| {
                ConsistencyError::MissingAncestor {
                    index,
                    slot: "field",
                }
                .into()
            })
    }

    /// Nearest page at or before `index` holding its own comment text
    pub fn comment_key_index(&self, index: usize) -> Result<usize, FumenError> {
        self.check_index(index)?;
        (0..=index)
            .rev()
            .find(|&i| self.pages[i].is_key_comment())
            .ok_or_else(|| {
                ConsistencyError::MissingAncestor {
                    index,
                    slot: "comment",
                }
                .into()
            })
    }

    /// Serializable copies of `index` and every later page
    pub fn snapshot_from(&self, index: usize) -> Vec<PrimitivePage> {
        self.pages
            .iter()
            .skip(index)
            .map(PrimitivePage::from)
            .collect()
    }

    /// Replace `index..` with a snapshot taken by [`PageStore::snapshot_from`]
    ///
    /// The store is unchanged if any snapshot page fails to convert.
    pub fn restore_from(
        &mut self,
        index: usize,
        snapshot: Vec<PrimitivePage>,
    ) -> Result<(), FumenError> {
        if index > self.pages.len() || (index == 0 && snapshot.is_empty()) {
            return Err(FormatError::IndexOutOfRange {
                index,
                len: self.pages.len(),
            }
            .into());
        }
        let mut restored = snapshot
            .into_iter()
            .map(Page::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        for (offset, page) in restored.iter_mut().enumerate() {
            page.index = index + offset;
        }

        let mut pages = self.pages[..index].to_vec();
        pages.append(&mut restored);
        check_refs(&pages, index)?;

        self.pages = pages;
        self.reset_cache();
        Ok(())
    }

    /// Swap in a whole new document
    pub fn replace_all(&mut self, pages: Vec<Page>) -> Result<(), FumenError> {
        *self = Self::new(pages)?;
        Ok(())
    }
}

impl PartialEq for PageStore {
    fn eq(&self, other: &Self) -> bool {
        self.pages == other.pages
    }
}

impl Eq for PageStore {}

impl Default for PageStore {
    fn default() -> Self {
        Self::new_document()
    }
}

/// Check every reference from `from` on points strictly backwards
pub(crate) fn check_refs(pages: &[Page], from: usize) -> Result<(), ConsistencyError> {
    for page in pages.iter().skip(from) {
        let index = page.index;
        for (target, slot) in [(page.field_ref(), "field"), (page.comment_ref(), "comment")] {
            match target {
                Some(_) if index == 0 => {
                    return Err(ConsistencyError::MissingAncestor { index, slot })
                }
                Some(target) if target >= index => {
                    return Err(ConsistencyError::NonTerminatingChain { index })
                }
                _ => {}
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fumen_core::types::{Move, Piece, Rotation};
    use fumen_core::{CommandKey, Commands};

    fn store_with_lock() -> PageStore {
        let mut first = Page::key(0, Field::from_str("XXXXXXXXX_").unwrap(), "");
        first.piece = Some(Move::new(Piece::I, Rotation::Left, 9, 1));
        let mut second = Page::reference(1, 0, 0);
        let mut commands = Commands::default();
        commands.pre.insert(CommandKey::Block { x: 0, y: 0 }, Piece::T);
        second.commands = Some(commands);
        PageStore::new(vec![first, second, Page::reference(2, 0, 0)]).unwrap()
    }

    #[test]
    fn modes_stop_at_each_stage() {
        let mut store = store_with_lock();
        let none = store.get_field(1, FieldMode::None).unwrap();
        // the I cleared the bottom row, leaving three I cells in column 9
        assert_eq!(none.get(9, 0), Some(Piece::I));
        assert_eq!(none.get(0, 0), Some(Piece::Empty));

        let command = store.get_field(1, FieldMode::Command).unwrap();
        assert_eq!(command.get(0, 0), Some(Piece::T));

        let all = store.get_field(1, FieldMode::All).unwrap();
        assert_eq!(all, command);
        assert_eq!(store.get_field(2, FieldMode::None).unwrap(), all);
    }

    #[test]
    fn resolution_fills_and_uses_the_cache() {
        let mut store = store_with_lock();
        let field = store.get_field(2, FieldMode::None).unwrap();
        assert!(store.cache[0].is_some());
        assert!(store.cache[1].is_some());

        store.invalidate_from(1);
        assert!(store.cache[0].is_some());
        assert!(store.cache[1].is_none());
        assert_eq!(store.get_field(2, FieldMode::None).unwrap(), field);
    }

    #[test]
    fn forward_reference_does_not_terminate() {
        let mut store = PageStore::new_document();
        store.pages.push(Page::reference(1, 1, 0));
        store.cache.push(None);
        assert_eq!(
            store.get_field(1, FieldMode::None),
            Err(ConsistencyError::NonTerminatingChain { index: 1 }.into())
        );
    }

    #[test]
    fn construction_validates_references() {
        assert_eq!(
            PageStore::new(vec![Page::reference(0, 0, 0)]),
            Err(ConsistencyError::MissingAncestor {
                index: 0,
                slot: "field"
            }
            .into())
        );
        assert!(PageStore::new(Vec::new()).is_err());
    }

    #[test]
    fn out_of_range_index() {
        let mut store = PageStore::new_document();
        assert_eq!(
            store.get_field(3, FieldMode::None).unwrap_err().code(),
            "index_out_of_range"
        );
    }

    #[test]
    fn resolved_page_bundles_field_and_comment() {
        let mut store = store_with_lock();
        let resolved = store.resolved_page(1).unwrap();
        assert_eq!(resolved.field.get(0, 0), Some(Piece::T));
        assert_eq!(resolved.comment.text(), "");
        assert!(resolved.flags.lock);
    }

    #[test]
    fn equality_ignores_the_cache() {
        let mut resolved = store_with_lock();
        resolved.get_field(2, FieldMode::All).unwrap();
        assert!(resolved.cache[0].is_some());
        assert_eq!(resolved, store_with_lock());
    }

    #[test]
    fn snapshot_restore_roundtrip() {
        let mut store = store_with_lock();
        let snapshot = store.snapshot_from(1);
        store.pages.truncate(1);
        store.restore_from(1, snapshot).unwrap();
        assert_eq!(store, store_with_lock());
    }
}

//! Structural edits on a [`PageStore`]
//!
//! Every edit keeps references pointing strictly backwards and renumbers the
//! pages it moves. Anything that can fail is computed before the first write,
//! so a failed edit leaves the store as it was.

use fumen_core::{
    CommentSource, ConsistencyError, FieldSource, FormatError, FumenError, Page,
};

use crate::comment::PageComment;
use crate::store::{FieldMode, PageStore};

fn nearest<F>(pages: &[Page], before: usize, is_key: F) -> Option<usize>
where
    F: Fn(&Page) -> bool,
{
    (0..before).rev().find(|&i| is_key(&pages[i]))
}

impl PageStore {
    /// Replace one page in place; returns the page it replaced
    pub fn replace_page(&mut self, mut page: Page) -> Result<Page, FumenError> {
        let index = page.index;
        self.check_index(index)?;
        check_new_page(&page, index)?;
        page.index = index;
        let prev = std::mem::replace(&mut self.pages[index], page);
        self.invalidate_from(index);
        Ok(prev)
    }

    pub fn insert_page(&mut self, index: usize, page: Page) -> Result<(), FumenError> {
        self.insert_pages(index, vec![page])
    }

    /// Insert pages so the first lands at `index` (`0..=len`)
    ///
    /// References inside `pages` are read as final positions. Later pages that
    /// referenced something before `index` now derive from the inserted run.
    pub fn insert_pages(&mut self, index: usize, mut pages: Vec<Page>) -> Result<(), FumenError> {
        let len = self.pages.len();
        if index > len {
            return Err(FormatError::IndexOutOfRange { index, len }.into());
        }
        let count = pages.len();
        if count == 0 {
            return Ok(());
        }
        for (offset, page) in pages.iter_mut().enumerate() {
            page.index = index + offset;
            check_new_page(page, page.index)?;
        }

        let mut merged: Vec<Page> = self.pages[..index].to_vec();
        merged.extend(pages);
        let last = index + count;
        let field_key = nearest(&merged, last, Page::is_key_field);
        let comment_key = nearest(&merged, last, Page::is_key_comment);

        for mut page in self.pages.drain(index..) {
            page.index += count;
            if let FieldSource::Ref(r) = &mut page.field {
                *r = if *r >= index { *r + count } else { field_key.unwrap_or(*r) };
            }
            if let CommentSource::Ref(r) = &mut page.comment {
                *r = if *r >= index { *r + count } else { comment_key.unwrap_or(*r) };
            }
            merged.push(page);
        }

        self.pages = merged;
        self.reset_cache();
        Ok(())
    }

    pub fn delete_page(&mut self, index: usize) -> Result<(), FumenError> {
        self.delete_pages(index, 1)
    }

    /// Delete `count` pages starting at `index`
    ///
    /// The first surviving page after the range gets its own field and comment
    /// when it depended on a deleted page. At least one page must remain.
    pub fn delete_pages(&mut self, index: usize, count: usize) -> Result<(), FumenError> {
        let len = self.pages.len();
        let end = index.saturating_add(count);
        if count == 0 || end > len || count >= len {
            return Err(FormatError::IndexOutOfRange { index, len }.into());
        }

        let mut promoted_field = None;
        let mut promoted_comment = None;
        if end < len {
            let next = &self.pages[end];
            if !next.is_key_field() && self.field_key_index(end)? >= index {
                promoted_field = Some(self.get_field(end, FieldMode::None)?);
            }
            let next = &self.pages[end];
            if !next.is_key_comment() && self.comment_key_index(end)? >= index {
                promoted_comment = Some(self.get_comment(end)?.text());
            }
        }

        if let Some(field) = promoted_field {
            self.pages[end].field = FieldSource::Key(field);
        }
        if let Some(text) = promoted_comment {
            self.pages[end].comment = CommentSource::Text(text);
        }

        self.pages.drain(index..end);
        let renumber = |r: &mut usize| {
            if *r >= end {
                *r -= count;
            } else if *r >= index {
                *r = index;
            }
        };
        for page in self.pages.iter_mut().skip(index) {
            page.index -= count;
            if let FieldSource::Ref(r) = &mut page.field {
                renumber(r);
            }
            if let CommentSource::Ref(r) = &mut page.comment {
                renumber(r);
            }
        }

        self.reset_cache();
        Ok(())
    }

    /// Store the page's resolved field on the page itself
    ///
    /// The following reference pages are repointed here.
    pub fn to_key_page(&mut self, index: usize) -> Result<(), FumenError> {
        if self.page(index)?.is_key_field() {
            return Ok(());
        }
        let field = self.get_field(index, FieldMode::None)?;
        self.pages[index].field = FieldSource::Key(field);
        for page in self.pages.iter_mut().skip(index + 1) {
            match &mut page.field {
                FieldSource::Ref(r) => *r = index,
                FieldSource::Key(_) => break,
            }
        }
        self.invalidate_from(index);
        Ok(())
    }

    /// Drop the page's stored field so it derives from the previous key page
    pub fn to_ref_page(&mut self, index: usize) -> Result<(), FumenError> {
        if !self.page(index)?.is_key_field() {
            return Ok(());
        }
        let Some(target) = nearest(&self.pages, index, Page::is_key_field) else {
            return Err(ConsistencyError::MissingAncestor {
                index,
                slot: "field",
            }
            .into());
        };
        self.pages[index].field = FieldSource::Ref(target);
        for page in self.pages.iter_mut().skip(index + 1) {
            if let FieldSource::Ref(r) = &mut page.field {
                if *r == index {
                    *r = target;
                }
            }
        }
        self.invalidate_from(index);
        Ok(())
    }

    /// Store the page's resolved comment on the page itself
    ///
    /// Quiz pages store the quiz as it stands on this page.
    pub fn freeze_comment(&mut self, index: usize) -> Result<(), FumenError> {
        if self.page(index)?.is_key_comment() {
            return Ok(());
        }
        let text = match self.get_comment(index)? {
            PageComment::Text { text, .. } => text,
            PageComment::Quiz { quiz, .. } => quiz.format().to_string(),
        };
        self.pages[index].comment = CommentSource::Text(text);
        for page in self.pages.iter_mut().skip(index + 1) {
            match &mut page.comment {
                CommentSource::Ref(r) => *r = index,
                CommentSource::Text(_) => break,
            }
        }
        Ok(())
    }

    /// Drop the page's stored comment so it shows the previous one
    pub fn unfreeze_comment(&mut self, index: usize) -> Result<(), FumenError> {
        if !self.page(index)?.is_key_comment() {
            return Ok(());
        }
        let Some(target) = nearest(&self.pages, index, Page::is_key_comment) else {
            return Err(ConsistencyError::MissingAncestor {
                index,
                slot: "comment",
            }
            .into());
        };
        self.pages[index].comment = CommentSource::Ref(target);
        for page in self.pages.iter_mut().skip(index + 1) {
            if let CommentSource::Ref(r) = &mut page.comment {
                if *r == index {
                    *r = target;
                }
            }
        }
        Ok(())
    }

    /// Append another document after the last page
    ///
    /// Its first page is given its own field and comment, so it looks the
    /// same as it did on its own.
    pub fn append_document(&mut self, other: PageStore) -> Result<(), FumenError> {
        let mut other = other;
        other.to_key_page(0)?;
        other.freeze_comment(0)?;
        let offset = self.pages.len();
        let pages = other
            .pages
            .into_iter()
            .map(|mut page| {
                if let FieldSource::Ref(r) = &mut page.field {
                    *r += offset;
                }
                if let CommentSource::Ref(r) = &mut page.comment {
                    *r += offset;
                }
                page
            })
            .collect();
        self.insert_pages(offset, pages)
    }
}

/// References of a page about to be stored at `index`
fn check_new_page(page: &Page, index: usize) -> Result<(), FumenError> {
    for (target, slot) in [(page.field_ref(), "field"), (page.comment_ref(), "comment")] {
        match target {
            Some(_) if index == 0 => {
                return Err(ConsistencyError::MissingAncestor { index, slot }.into())
            }
            Some(target) if target >= index => {
                return Err(FormatError::MissingReference { index, target }.into())
            }
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fumen_core::types::{Move, Piece, Rotation};
    use fumen_core::Field;

    fn t_page(index: usize) -> Page {
        let mut page = Page::reference(index, 0, 0);
        page.piece = Some(Move::new(Piece::T, Rotation::Spawn, 4, 0));
        page
    }

    fn three_pages() -> PageStore {
        PageStore::new(vec![
            Page::key(0, Field::new(), "first"),
            t_page(1),
            Page::reference(2, 0, 0),
        ])
        .unwrap()
    }

    #[test]
    fn delete_key_page_promotes_successor() {
        let mut store = three_pages();
        let field = store.get_field(1, FieldMode::None).unwrap();
        store.delete_page(0).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.pages()[0].index, 0);
        assert_eq!(store.pages()[0].field, FieldSource::Key(field));
        assert_eq!(store.pages()[0].comment, CommentSource::Text("first".into()));
        assert_eq!(store.pages()[1].field_ref(), Some(0));
        assert_eq!(store.get_comment(1).unwrap().text(), "first");
    }

    #[test]
    fn delete_ref_page_renumbers() {
        let mut store = three_pages();
        store.delete_page(1).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.pages()[1].index, 1);
        assert_eq!(store.pages()[1].field_ref(), Some(0));
        // the T went with the deleted page
        assert!(store.get_field(1, FieldMode::None).unwrap().is_empty());
    }

    #[test]
    fn delete_last_remaining_page_fails() {
        let mut store = PageStore::new_document();
        assert_eq!(
            store.delete_page(0),
            Err(FormatError::IndexOutOfRange { index: 0, len: 1 }.into())
        );
        assert_eq!(store, PageStore::new_document());
    }

    #[test]
    fn insert_shifts_later_refs() {
        let mut store = PageStore::new(vec![
            Page::key(0, Field::new(), "a"),
            Page::key(1, Field::from_str("X_________").unwrap(), "b"),
            Page::reference(2, 1, 1),
        ])
        .unwrap();
        store.insert_page(1, Page::reference(1, 0, 0)).unwrap();

        assert_eq!(store.len(), 4);
        assert_eq!(store.pages()[2].index, 2);
        assert_eq!(store.pages()[3].field_ref(), Some(2));
        assert_eq!(store.pages()[3].comment_ref(), Some(2));
        assert_eq!(store.get_comment(3).unwrap().text(), "b");
    }

    #[test]
    fn insert_collapses_refs_before_the_insertion_point() {
        let mut store = three_pages();
        store
            .insert_page(2, Page::key(2, Field::from_str("XX________").unwrap(), "new"))
            .unwrap();
        assert_eq!(store.pages()[3].field_ref(), Some(2));
        assert_eq!(store.pages()[3].comment_ref(), Some(2));
        assert_eq!(store.get_comment(3).unwrap().text(), "new");
    }

    #[test]
    fn insert_rejects_forward_refs() {
        let mut store = three_pages();
        let err = store.insert_page(1, Page::reference(1, 1, 0)).unwrap_err();
        assert_eq!(err, FormatError::MissingReference { index: 1, target: 1 }.into());
        assert_eq!(store, three_pages());
        assert!(store.insert_page(9, Page::reference(9, 0, 0)).is_err());
    }

    #[test]
    fn key_and_ref_conversion() {
        let mut store = three_pages();
        let resolved = store.get_field(2, FieldMode::None).unwrap();
        store.to_key_page(1).unwrap();
        assert!(store.pages()[1].is_key_field());
        assert_eq!(store.pages()[2].field_ref(), Some(1));
        assert_eq!(store.get_field(2, FieldMode::None).unwrap(), resolved);

        store.to_ref_page(1).unwrap();
        assert_eq!(store.pages()[1].field_ref(), Some(0));
        assert_eq!(store.pages()[2].field_ref(), Some(0));
        assert_eq!(store.get_field(2, FieldMode::None).unwrap(), resolved);

        assert!(store.to_ref_page(0).is_err());
    }

    #[test]
    fn freeze_and_unfreeze_comment() {
        let mut store = three_pages();
        store.freeze_comment(1).unwrap();
        assert_eq!(store.pages()[1].comment, CommentSource::Text("first".into()));
        assert_eq!(store.pages()[2].comment_ref(), Some(1));

        store.unfreeze_comment(1).unwrap();
        assert_eq!(store.pages()[1].comment_ref(), Some(0));
        assert_eq!(store.pages()[2].comment_ref(), Some(0));
        assert!(store.unfreeze_comment(0).is_err());
    }

    #[test]
    fn append_keeps_the_other_document_intact() {
        let mut store = three_pages();
        let other = PageStore::new(vec![
            Page::key(0, Field::from_str("XXXX______").unwrap(), "other"),
            Page::reference(1, 0, 0),
        ])
        .unwrap();
        store.append_document(other).unwrap();
        assert_eq!(store.len(), 5);
        assert_eq!(store.pages()[4].field_ref(), Some(3));
        assert_eq!(store.get_comment(4).unwrap().text(), "other");
        assert_eq!(store.get_field(4, FieldMode::None).unwrap().get(3, 0), Some(Piece::Gray));
    }

    #[test]
    fn delete_range() {
        let mut store = three_pages();
        store.delete_pages(0, 2).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.pages()[0].is_key_field());
        assert_eq!(store.get_comment(0).unwrap().text(), "first");
        assert!(store.delete_pages(0, 0).is_err());
    }
}

#![forbid(unsafe_code)]

//! The scroll anchor: the pad's cursor into the element store.
//!
//! The anchor names one element (by sort key), a row inside it, and the
//! number of rows before and after that element. All movement is
//! incremental: walking `n` rows touches only the elements crossed, and a
//! jump to either end uses the store's running row total instead of a scan.
//! The one exception is [`ScrollAnchor::recount`], used for explicit jumps
//! to an arbitrary element.
//!
//! # Invariants
//!
//! With `h` the rows of the anchored element and `T` the store's row total:
//!
//! 1. `h > 0` and `offset < h`
//! 2. `rows_before + h + rows_after == T`

use crate::element::PadElement;
use crate::error::{PadError, Result};
use crate::glue::AnchorRows;
use crate::store::ElementStore;

/// Cursor into an [`ElementStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollAnchor<K> {
    pub(crate) key: K,
    pub(crate) offset: usize,
    pub(crate) rows_before: usize,
    pub(crate) rows_after: usize,
}

/// Where an anchor went after its element lost its rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Reseat {
    /// Landed on the last row of the previous element.
    Prev,
    /// Landed on the first row of the next element.
    Next,
}

impl<K: Ord + Clone + std::fmt::Debug> ScrollAnchor<K> {
    /// Sort key of the anchored element.
    #[must_use]
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Row inside the anchored element.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Rows of visible elements before the anchored element.
    #[must_use]
    pub fn rows_before(&self) -> usize {
        self.rows_before
    }

    /// Rows of visible elements after the anchored element.
    #[must_use]
    pub fn rows_after(&self) -> usize {
        self.rows_after
    }

    /// Anchor on the first row of the first laid-out element.
    pub(crate) fn at_first<E>(store: &ElementStore<E>) -> Option<Self>
    where
        E: PadElement<SortKey = K>,
    {
        let (key, height) = store.first_laid_out()?;
        Some(Self {
            key: key.clone(),
            offset: 0,
            rows_before: 0,
            rows_after: store.total_rows() - height,
        })
    }

    /// Anchor on the last row of the last laid-out element.
    pub(crate) fn at_last<E>(store: &ElementStore<E>) -> Option<Self>
    where
        E: PadElement<SortKey = K>,
    {
        let (key, height) = store.last_laid_out()?;
        Some(Self {
            key: key.clone(),
            offset: height - 1,
            rows_before: store.total_rows() - height,
            rows_after: 0,
        })
    }

    /// Anchor on `key` with both sides summed from the store.
    ///
    /// Returns `None` if the element is absent or takes no rows.
    pub(crate) fn recount<E>(store: &ElementStore<E>, key: &K, offset: usize) -> Option<Self>
    where
        E: PadElement<SortKey = K>,
    {
        let height = store.rows_at(key);
        if height == 0 {
            return None;
        }
        Some(Self {
            key: key.clone(),
            offset: offset.min(height - 1),
            rows_before: store.rows_before(key),
            rows_after: store.rows_after(key),
        })
    }

    /// Row counts in the shape the glue arithmetic wants.
    pub(crate) fn rows<E>(&self, store: &ElementStore<E>) -> AnchorRows
    where
        E: PadElement<SortKey = K>,
    {
        AnchorRows {
            rows_before: self.rows_before,
            offset: self.offset,
            height: store.rows_at(&self.key),
            rows_after: self.rows_after,
        }
    }

    /// Move the cursor `n` rows towards the end. Returns the rows moved.
    pub(crate) fn walk_down<E>(&mut self, store: &ElementStore<E>, n: usize) -> usize
    where
        E: PadElement<SortKey = K>,
    {
        let mut left = n;
        let mut moved = 0;
        loop {
            let height = store.rows_at(&self.key);
            let room = height - 1 - self.offset;
            if left <= room {
                self.offset += left;
                return moved + left;
            }
            let Some((next, next_height)) = store.next_laid_out(&self.key) else {
                self.offset = height - 1;
                return moved + room;
            };
            left -= room + 1;
            moved += room + 1;
            self.rows_before += height;
            self.rows_after -= next_height;
            self.key = next.clone();
            self.offset = 0;
        }
    }

    /// Move the cursor `n` rows towards the start. Returns the rows moved.
    pub(crate) fn walk_up<E>(&mut self, store: &ElementStore<E>, n: usize) -> usize
    where
        E: PadElement<SortKey = K>,
    {
        let mut left = n;
        let mut moved = 0;
        loop {
            if left <= self.offset {
                self.offset -= left;
                return moved + left;
            }
            let height = store.rows_at(&self.key);
            let Some((prev, prev_height)) = store.prev_laid_out(&self.key) else {
                moved += self.offset;
                self.offset = 0;
                return moved;
            };
            left -= self.offset + 1;
            moved += self.offset + 1;
            self.rows_after += height;
            self.rows_before -= prev_height;
            self.key = prev.clone();
            self.offset = prev_height - 1;
        }
    }

    /// Jump to the first row of the next laid-out element.
    ///
    /// Returns the rows moved, or `None` if this is the last element.
    pub(crate) fn step_next<E>(&mut self, store: &ElementStore<E>) -> Option<usize>
    where
        E: PadElement<SortKey = K>,
    {
        let height = store.rows_at(&self.key);
        let (next, next_height) = store.next_laid_out(&self.key)?;
        let moved = height - self.offset;
        self.rows_before += height;
        self.rows_after -= next_height;
        self.key = next.clone();
        self.offset = 0;
        Some(moved)
    }

    /// Jump to the last row of the previous laid-out element.
    ///
    /// Returns the rows moved, or `None` if this is the first element.
    pub(crate) fn step_prev<E>(&mut self, store: &ElementStore<E>) -> Option<usize>
    where
        E: PadElement<SortKey = K>,
    {
        let height = store.rows_at(&self.key);
        let (prev, prev_height) = store.prev_laid_out(&self.key)?;
        let moved = self.offset + 1;
        self.rows_after += height;
        self.rows_before -= prev_height;
        self.key = prev.clone();
        self.offset = prev_height - 1;
        Some(moved)
    }

    /// Move forward to the first row of the nearest later element matching
    /// `pred`. Returns the rows moved.
    pub(crate) fn seek_next<E>(
        &mut self,
        store: &ElementStore<E>,
        mut pred: impl FnMut(&E) -> bool,
    ) -> Option<usize>
    where
        E: PadElement<SortKey = K>,
    {
        let height = store.rows_at(&self.key);
        let mut crossed = 0;
        for (key, entry) in store.after(&self.key) {
            let rows = entry.rows();
            if rows > 0 && pred(&entry.element) {
                let moved = height - self.offset + crossed;
                self.rows_before += height + crossed;
                self.rows_after -= crossed + rows;
                self.key = key.clone();
                self.offset = 0;
                return Some(moved);
            }
            crossed += rows;
        }
        None
    }

    /// Move back to the first row of the nearest earlier element matching
    /// `pred`. Returns the rows moved.
    pub(crate) fn seek_prev<E>(
        &mut self,
        store: &ElementStore<E>,
        mut pred: impl FnMut(&E) -> bool,
    ) -> Option<usize>
    where
        E: PadElement<SortKey = K>,
    {
        let height = store.rows_at(&self.key);
        let mut crossed = 0;
        for (key, entry) in store.before(&self.key) {
            let rows = entry.rows();
            if rows > 0 && pred(&entry.element) {
                let moved = self.offset + crossed + rows;
                self.rows_after += height + crossed;
                self.rows_before -= crossed + rows;
                self.key = key.clone();
                self.offset = 0;
                return Some(moved);
            }
            crossed += rows;
        }
        None
    }

    /// Re-anchor after the anchored element lost its rows (deleted or
    /// hidden). `lost` is the sort key it had.
    ///
    /// Prefers the previous element's last row, then the next element's
    /// first row. `rows_before`/`rows_after` of `self` must already exclude
    /// the lost element. Returns `None` if no element has rows left.
    pub(crate) fn reseat<E>(self, store: &ElementStore<E>, lost: &K) -> Option<(Self, Reseat)>
    where
        E: PadElement<SortKey = K>,
    {
        if let Some((prev, prev_height)) = store.prev_laid_out(lost) {
            return Some((
                Self {
                    key: prev.clone(),
                    offset: prev_height - 1,
                    rows_before: self.rows_before - prev_height,
                    rows_after: self.rows_after,
                },
                Reseat::Prev,
            ));
        }
        let (next, next_height) = store.next_laid_out(lost)?;
        Some((
            Self {
                key: next.clone(),
                offset: 0,
                rows_before: self.rows_before,
                rows_after: self.rows_after - next_height,
            },
            Reseat::Next,
        ))
    }

    /// Proportionally rescale the offset after the anchored element changed
    /// height from `old` to `new` rows (both non-zero).
    pub(crate) fn rescale(&mut self, old: usize, new: usize) {
        debug_assert!(old > 0 && new > 0);
        self.offset = (self.offset * new / old).min(new - 1);
    }

    /// O(1) consistency check against the store.
    pub(crate) fn check<E>(&self, store: &ElementStore<E>) -> Result<()>
    where
        E: PadElement<SortKey = K>,
    {
        let height = store.rows_at(&self.key);
        if height == 0 {
            return Err(PadError::invariant(format!(
                "anchor {:?} has no rows",
                self.key
            )));
        }
        if self.offset >= height {
            return Err(PadError::invariant(format!(
                "anchor offset {} outside element of {} rows",
                self.offset, height
            )));
        }
        let sum = self.rows_before + height + self.rows_after;
        if sum != store.total_rows() {
            return Err(PadError::invariant(format!(
                "rows_before {} + height {} + rows_after {} != pad height {}",
                self.rows_before,
                height,
                self.rows_after,
                store.total_rows()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::RowSlice;
    use crate::surface::Surface;

    #[derive(Debug, Clone)]
    struct Block {
        key: u32,
        tagged: bool,
    }

    impl PadElement for Block {
        type Id = u32;
        type SortKey = u32;
        type Context = ();

        fn id(&self) -> u32 {
            self.key
        }

        fn sort_key(&self) -> u32 {
            self.key
        }

        fn measure(&self, _width: u16, _ctx: &()) -> u16 {
            1
        }

        fn render(&self, _surface: &mut dyn Surface, _slice: RowSlice, _is_anchor: bool, _ctx: &()) {}
    }

    /// Store with keys 1.. and the given heights.
    fn store(heights: &[u16]) -> ElementStore<Block> {
        let mut store = ElementStore::new();
        for (i, &h) in heights.iter().enumerate() {
            let key = u32::try_from(i + 1).expect("small");
            store
                .insert(
                    Block {
                        key,
                        tagged: key % 2 == 0,
                    },
                    h,
                )
                .expect("insert");
        }
        store
    }

    #[test]
    fn ends_use_the_row_total() {
        let s = store(&[2, 3, 1]);
        let first = ScrollAnchor::at_first(&s).expect("rows");
        assert_eq!((first.key, first.offset, first.rows_before, first.rows_after), (1, 0, 0, 4));
        let last = ScrollAnchor::at_last(&s).expect("rows");
        assert_eq!((last.key, last.offset, last.rows_before, last.rows_after), (3, 0, 5, 0));
        first.check(&s).expect("consistent");
        last.check(&s).expect("consistent");
    }

    #[test]
    fn empty_store_has_no_anchor() {
        let s = store(&[0, 0]);
        assert!(ScrollAnchor::at_first(&s).is_none());
        assert!(ScrollAnchor::at_last(&s).is_none());
    }

    #[test]
    fn walk_down_crosses_elements() {
        let s = store(&[2, 3, 1]);
        let mut a = ScrollAnchor::at_first(&s).expect("rows");
        assert_eq!(a.walk_down(&s, 3), 3);
        assert_eq!((a.key, a.offset, a.rows_before, a.rows_after), (2, 1, 2, 1));
        a.check(&s).expect("consistent");
    }

    #[test]
    fn walk_down_clamps_at_last_row() {
        let s = store(&[2, 3, 1]);
        let mut a = ScrollAnchor::at_first(&s).expect("rows");
        assert_eq!(a.walk_down(&s, 100), 5);
        assert_eq!((a.key, a.offset), (3, 0));
        a.check(&s).expect("consistent");
    }

    #[test]
    fn walk_up_clamps_at_first_row() {
        let s = store(&[2, 3, 1]);
        let mut a = ScrollAnchor::at_last(&s).expect("rows");
        assert_eq!(a.walk_up(&s, 2), 2);
        assert_eq!((a.key, a.offset), (2, 1));
        assert_eq!(a.walk_up(&s, 100), 3);
        assert_eq!((a.key, a.offset, a.rows_before), (1, 0, 0));
        a.check(&s).expect("consistent");
    }

    #[test]
    fn walks_skip_zero_row_elements() {
        let s = store(&[1, 0, 1]);
        let mut a = ScrollAnchor::at_first(&s).expect("rows");
        assert_eq!(a.walk_down(&s, 1), 1);
        assert_eq!(a.key, 3);
        assert_eq!(a.walk_up(&s, 1), 1);
        assert_eq!(a.key, 1);
    }

    #[test]
    fn step_next_and_prev() {
        let s = store(&[2, 3, 1]);
        let mut a = ScrollAnchor::at_first(&s).expect("rows");
        assert_eq!(a.step_next(&s), Some(2));
        assert_eq!((a.key, a.offset), (2, 0));
        assert_eq!(a.step_next(&s), Some(3));
        assert_eq!(a.step_next(&s), None);
        assert_eq!(a.step_prev(&s), Some(1));
        assert_eq!((a.key, a.offset), (2, 2));
        a.check(&s).expect("consistent");
    }

    #[test]
    fn seek_matches_by_predicate() {
        let s = store(&[2, 1, 3, 1, 2]);
        let mut a = ScrollAnchor::at_first(&s).expect("rows");
        // Elements with even keys are tagged: 2 and 4.
        assert_eq!(a.seek_next(&s, |b| b.tagged), Some(2));
        assert_eq!(a.key, 2);
        assert_eq!(a.seek_next(&s, |b| b.tagged), Some(4));
        assert_eq!((a.key, a.rows_before, a.rows_after), (4, 6, 2));
        assert_eq!(a.seek_next(&s, |b| b.tagged), None);
        assert_eq!(a.seek_prev(&s, |b| b.tagged), Some(4));
        assert_eq!((a.key, a.offset, a.rows_before), (2, 0, 2));
        a.check(&s).expect("consistent");
    }

    #[test]
    fn recount_sums_both_sides() {
        let s = store(&[2, 3, 1]);
        let a = ScrollAnchor::recount(&s, &2, 7).expect("rows");
        assert_eq!((a.offset, a.rows_before, a.rows_after), (2, 2, 1));
        assert!(ScrollAnchor::recount(&s, &9, 0).is_none());
    }

    #[test]
    fn rescale_is_proportional_and_clamped() {
        let mut a = ScrollAnchor {
            key: 1u32,
            offset: 3,
            rows_before: 0,
            rows_after: 0,
        };
        a.rescale(4, 8);
        assert_eq!(a.offset, 6);
        a.rescale(8, 2);
        assert_eq!(a.offset, 1);
        a.rescale(2, 1);
        assert_eq!(a.offset, 0);
    }

    #[test]
    fn check_reports_mismatch() {
        let s = store(&[2, 3]);
        let a = ScrollAnchor {
            key: 1u32,
            offset: 0,
            rows_before: 0,
            rows_after: 1,
        };
        assert!(matches!(a.check(&s), Err(PadError::Invariant(_))));
    }
}

#![forbid(unsafe_code)]

//! Ordered element storage with cached heights.
//!
//! Elements live in a `BTreeMap` keyed by their sort key, with an identity
//! index on the side so the mutation API can address them by id. Each entry
//! caches the last measured height and visibility; the sum of rows over all
//! entries is kept up to date on every change so the anchor can be checked
//! against it in O(1).
//!
//! # Complexity
//!
//! | Operation | Cost |
//! |-----------|------|
//! | insert / remove / find | O(log n) |
//! | first / last / neighbors | O(log n) plus skipped zero-row entries |
//! | rows before / after a key | O(n) |

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::ops::Bound;

use ahash::AHashMap;

use crate::element::PadElement;
use crate::error::{PadError, Result};

/// One stored element and its last measurement.
#[derive(Debug, Clone)]
pub(crate) struct Entry<E> {
    pub element: E,
    pub height: u16,
    pub visible: bool,
}

impl<E> Entry<E> {
    /// Rows this entry contributes to the pad.
    pub fn rows(&self) -> usize {
        if self.visible {
            usize::from(self.height)
        } else {
            0
        }
    }
}

/// Elements in sort-key order, each with its cached height.
#[derive(Debug, Clone)]
pub struct ElementStore<E: PadElement> {
    entries: BTreeMap<E::SortKey, Entry<E>>,
    keys: AHashMap<E::Id, E::SortKey>,
    total_rows: usize,
}

impl<E: PadElement> Default for ElementStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: PadElement> ElementStore<E> {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            keys: AHashMap::new(),
            total_rows: 0,
        }
    }

    /// Number of stored elements, visible or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of rows over all visible elements.
    #[must_use]
    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    /// Whether an element with this identity is stored.
    #[must_use]
    pub fn contains(&self, id: &E::Id) -> bool {
        self.keys.contains_key(id)
    }

    /// Look up an element by identity.
    #[must_use]
    pub fn find(&self, id: &E::Id) -> Option<&E> {
        let key = self.keys.get(id)?;
        self.entries.get(key).map(|entry| &entry.element)
    }

    /// Cached height of an element, as last measured.
    #[must_use]
    pub fn height(&self, id: &E::Id) -> Option<u16> {
        let key = self.keys.get(id)?;
        self.entries.get(key).map(|entry| entry.height)
    }

    /// First element in sort order.
    #[must_use]
    pub fn first(&self) -> Option<&E> {
        self.entries.values().next().map(|entry| &entry.element)
    }

    /// Last element in sort order.
    #[must_use]
    pub fn last(&self) -> Option<&E> {
        self.entries.values().next_back().map(|entry| &entry.element)
    }

    /// Elements immediately before and after `id` in sort order.
    #[must_use]
    pub fn neighbors(&self, id: &E::Id) -> (Option<&E>, Option<&E>) {
        let Some(key) = self.keys.get(id) else {
            return (None, None);
        };
        let prev = self
            .entries
            .range::<E::SortKey, _>(..key)
            .next_back()
            .map(|(_, entry)| &entry.element);
        let next = self
            .entries
            .range::<E::SortKey, _>((Bound::Excluded(key), Bound::Unbounded))
            .next()
            .map(|(_, entry)| &entry.element);
        (prev, next)
    }

    /// All elements in sort order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &E> + '_ {
        self.entries.values().map(|entry| &entry.element)
    }

    // ── crate-internal access by sort key ───────────────────────────────

    pub(crate) fn key_of(&self, id: &E::Id) -> Option<&E::SortKey> {
        self.keys.get(id)
    }

    pub(crate) fn entry(&self, key: &E::SortKey) -> Option<&Entry<E>> {
        self.entries.get(key)
    }

    /// Mutable access to an element. Measurements must go through
    /// [`set_measurement`](Self::set_measurement).
    pub(crate) fn element_mut(&mut self, key: &E::SortKey) -> Option<&mut E> {
        self.entries.get_mut(key).map(|entry| &mut entry.element)
    }

    /// Rows of the entry at `key`, 0 if absent.
    pub(crate) fn rows_at(&self, key: &E::SortKey) -> usize {
        self.entries.get(key).map_or(0, Entry::rows)
    }

    /// Insert an element with its measured height.
    ///
    /// Fails without touching the store if the identity or the sort key is
    /// already taken.
    pub(crate) fn insert(&mut self, element: E, height: u16) -> Result<E::SortKey> {
        let id = element.id();
        if self.keys.contains_key(&id) {
            return Err(PadError::duplicate(&id));
        }
        let key = element.sort_key();
        if let Some(holder) = self.entries.get(&key) {
            return Err(PadError::conflict(&key, &holder.element.id()));
        }
        let visible = element.is_visible();
        let entry = Entry {
            element,
            height,
            visible,
        };
        self.total_rows += entry.rows();
        self.keys.insert(id, key.clone());
        self.entries.insert(key.clone(), entry);
        Ok(key)
    }

    /// Remove an element by identity, returning its key and entry.
    pub(crate) fn remove(&mut self, id: &E::Id) -> Option<(E::SortKey, Entry<E>)> {
        let key = self.keys.remove(id)?;
        let entry = self.entries.remove(&key)?;
        self.total_rows -= entry.rows();
        Some((key, entry))
    }

    /// Move an entry to a new sort key. Fails if the new key is taken.
    pub(crate) fn rekey(&mut self, old: &E::SortKey, new: E::SortKey) -> Result<()> {
        if let Some(holder) = self.entries.get(&new) {
            return Err(PadError::conflict(&new, &holder.element.id()));
        }
        let Some(entry) = self.entries.remove(old) else {
            return Err(PadError::invariant(format!("no entry at sort key {old:?}")));
        };
        self.keys.insert(entry.element.id(), new.clone());
        self.entries.insert(new, entry);
        Ok(())
    }

    /// Record a new measurement, returning `(old_rows, new_rows)`.
    pub(crate) fn set_measurement(
        &mut self,
        key: &E::SortKey,
        height: u16,
        visible: bool,
    ) -> Option<(usize, usize)> {
        let entry = self.entries.get_mut(key)?;
        let old_rows = entry.rows();
        entry.height = height;
        entry.visible = visible;
        let new_rows = entry.rows();
        self.total_rows = self.total_rows - old_rows + new_rows;
        Some((old_rows, new_rows))
    }

    /// First entry with rows, with its height.
    pub(crate) fn first_laid_out(&self) -> Option<(&E::SortKey, usize)> {
        laid_out(self.entries.iter())
    }

    /// Last entry with rows, with its height.
    pub(crate) fn last_laid_out(&self) -> Option<(&E::SortKey, usize)> {
        laid_out(self.entries.iter().rev())
    }

    /// Nearest entry with rows strictly before `key`.
    pub(crate) fn prev_laid_out(&self, key: &E::SortKey) -> Option<(&E::SortKey, usize)> {
        laid_out(self.entries.range::<E::SortKey, _>(..key).rev())
    }

    /// Nearest entry with rows strictly after `key`.
    pub(crate) fn next_laid_out(&self, key: &E::SortKey) -> Option<(&E::SortKey, usize)> {
        laid_out(self.after(key))
    }

    /// Sum of rows strictly before `key`.
    pub(crate) fn rows_before(&self, key: &E::SortKey) -> usize {
        self.entries.range::<E::SortKey, _>(..key).map(|(_, entry)| entry.rows()).sum()
    }

    /// Sum of rows strictly after `key`.
    pub(crate) fn rows_after(&self, key: &E::SortKey) -> usize {
        self.after(key).map(|(_, entry)| entry.rows()).sum()
    }

    /// Entries strictly before `key`, nearest first.
    pub(crate) fn before(
        &self,
        key: &E::SortKey,
    ) -> std::iter::Rev<btree_map::Range<'_, E::SortKey, Entry<E>>> {
        self.entries.range::<E::SortKey, _>(..key).rev()
    }

    /// Entries strictly after `key`, nearest first.
    pub(crate) fn after(&self, key: &E::SortKey) -> btree_map::Range<'_, E::SortKey, Entry<E>> {
        self.entries
            .range::<E::SortKey, _>((Bound::Excluded(key), Bound::Unbounded))
    }

    /// Entries from `key` (inclusive) onward.
    pub(crate) fn from_key(&self, key: &E::SortKey) -> btree_map::Range<'_, E::SortKey, Entry<E>> {
        self.entries.range::<E::SortKey, _>(key..)
    }

    pub(crate) fn entries(&self) -> btree_map::Iter<'_, E::SortKey, Entry<E>> {
        self.entries.iter()
    }

    pub(crate) fn entries_mut(&mut self) -> btree_map::IterMut<'_, E::SortKey, Entry<E>> {
        self.entries.iter_mut()
    }

    /// Recompute the row total after a bulk measurement pass.
    pub(crate) fn recompute_total(&mut self) {
        self.total_rows = self.entries.values().map(Entry::rows).sum();
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.keys.clear();
        self.total_rows = 0;
    }
}

fn laid_out<'a, K: 'a, E: 'a>(
    mut entries: impl Iterator<Item = (&'a K, &'a Entry<E>)>,
) -> Option<(&'a K, usize)> {
    entries.find_map(|(key, entry)| {
        let rows = entry.rows();
        (rows > 0).then_some((key, rows))
    })
}

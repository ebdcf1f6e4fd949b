#![forbid(unsafe_code)]

//! The pad: an ordered, lazily populated column of elements behind a
//! fixed-size viewport.
//!
//! # State
//!
//! - an [`ElementStore`] holding every element with its cached height,
//! - an optional [`ScrollAnchor`] (the cursor) that is set iff the store has
//!   rows,
//! - a [`GlueState`] deciding how the viewport follows content changes,
//! - `viewport_offset`: the screen row the anchor's current row is drawn on.
//!
//! # Settle pass
//!
//! Every mutation, scroll and resize ends in the same six steps:
//!
//! 1. `Top` glue: anchor on the first row of the pad.
//! 2. `Bottom` glue: anchor on the last row of the pad.
//! 3. `RelativeTop` / `RelativeBottom`: pin the viewport to that edge while
//!    the anchor fits next to it, otherwise degrade to `Free`.
//! 4. Clamp `viewport_offset` to the viewport.
//! 5. Apply the pad-to rule (no stray blank rows).
//! 6. Fire backfill hooks for sides with fewer rows than the threshold.
//!
//! Row bookkeeping is incremental: a mutation adds or subtracts exactly the
//! rows it changed on the side of the anchor it happened on. Only
//! [`Pad::scroll_to_element`] and width changes touch the whole store.

use std::cmp::Ordering;

use crate::anchor::{Reseat, ScrollAnchor};
use crate::backfill::{BackfillHooks, BackfillPolicy, NoBackfill};
use crate::config::PadConfig;
use crate::element::PadElement;
use crate::error::{PadError, Result};
use crate::glue::{self, GlueState, PadTo, Pin};
use crate::input::{InputOutcome, Navigation, PadKey, page_rows};
use crate::store::ElementStore;

/// A virtualized scroll pad over elements of type `E`.
///
/// # Example
///
/// ```
/// use ftui_pad::{Directory, Pad, PadConfig, PadTo, TextItem, TimelineItem};
///
/// let ctx = Directory::default();
/// let mut pad: Pad<TimelineItem> = Pad::new(PadConfig::new(PadTo::Bottom));
/// pad.set_viewport(20, 5, &ctx)?;
/// for i in 0..3 {
///     pad.add_element(TextItem::new(i, i as i64, format!("message {i}")).into(), &ctx)?;
/// }
/// assert_eq!(pad.active_element().map(|e| e.order()), Some(2));
/// # Ok::<(), ftui_pad::PadError>(())
/// ```
#[derive(Debug)]
pub struct Pad<E: PadElement, B: BackfillHooks = NoBackfill> {
    pub(crate) config: PadConfig,
    pub(crate) store: ElementStore<E>,
    pub(crate) anchor: Option<ScrollAnchor<E::SortKey>>,
    pub(crate) glue: GlueState,
    pub(crate) width: u16,
    pub(crate) height: u16,
    pub(crate) viewport_offset: u16,
    policy: BackfillPolicy,
    hooks: B,
}

impl<E: PadElement> Pad<E, NoBackfill> {
    /// Create an empty pad without backfill hooks.
    #[must_use]
    pub fn new(config: PadConfig) -> Self {
        Self::with_backfill(config, NoBackfill)
    }
}

impl<E: PadElement, B: BackfillHooks> Pad<E, B> {
    /// Create an empty pad that calls `hooks` when it runs low on rows.
    ///
    /// The viewport starts at 0x0; call [`set_viewport`](Self::set_viewport)
    /// before rendering.
    #[must_use]
    pub fn with_backfill(config: PadConfig, hooks: B) -> Self {
        Self {
            glue: GlueState::initial(config.pad_to),
            policy: BackfillPolicy::new(config.backfill_threshold),
            config,
            store: ElementStore::new(),
            anchor: None,
            width: 0,
            height: 0,
            viewport_offset: 0,
            hooks,
        }
    }

    // ── queries ─────────────────────────────────────────────────────────

    /// The configuration this pad was built with.
    #[must_use]
    pub fn config(&self) -> &PadConfig {
        &self.config
    }

    /// Read access to the element store.
    #[must_use]
    pub fn store(&self) -> &ElementStore<E> {
        &self.store
    }

    /// The backfill hooks.
    #[must_use]
    pub fn hooks(&self) -> &B {
        &self.hooks
    }

    /// Mutable access to the backfill hooks.
    pub fn hooks_mut(&mut self) -> &mut B {
        &mut self.hooks
    }

    /// Number of stored elements, visible or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Whether no elements are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Look up an element by identity.
    #[must_use]
    pub fn get(&self, id: &E::Id) -> Option<&E> {
        self.store.find(id)
    }

    /// Whether an element with this identity is stored.
    #[must_use]
    pub fn contains(&self, id: &E::Id) -> bool {
        self.store.contains(id)
    }

    /// All elements in order, including invisible ones.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &E> + '_ {
        self.store.iter()
    }

    /// The element under the cursor.
    #[must_use]
    pub fn active_element(&self) -> Option<&E> {
        let anchor = self.anchor.as_ref()?;
        self.store.entry(&anchor.key).map(|entry| &entry.element)
    }

    /// The cursor, if the pad has rows.
    #[must_use]
    pub fn anchor(&self) -> Option<&ScrollAnchor<E::SortKey>> {
        self.anchor.as_ref()
    }

    /// Row of the anchored element under the cursor (0 when empty).
    #[must_use]
    pub fn anchor_offset(&self) -> usize {
        self.anchor.as_ref().map_or(0, |a| a.offset)
    }

    /// Rows before the anchored element (0 when empty).
    #[must_use]
    pub fn rows_before(&self) -> usize {
        self.anchor.as_ref().map_or(0, |a| a.rows_before)
    }

    /// Rows after the anchored element (0 when empty).
    #[must_use]
    pub fn rows_after(&self) -> usize {
        self.anchor.as_ref().map_or(0, |a| a.rows_after)
    }

    /// Total rows of all visible elements.
    #[must_use]
    pub fn total_rows(&self) -> usize {
        self.store.total_rows()
    }

    /// Current glue state.
    #[must_use]
    pub fn glue(&self) -> GlueState {
        self.glue
    }

    /// Edge short content sticks to.
    #[must_use]
    pub fn pad_to(&self) -> PadTo {
        self.config.pad_to
    }

    /// Screen row the cursor row is drawn on.
    #[must_use]
    pub fn viewport_offset(&self) -> u16 {
        self.viewport_offset
    }

    /// Viewport `(width, height)`.
    #[must_use]
    pub fn viewport_size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    // ── mutation ────────────────────────────────────────────────────────

    /// Insert an element.
    ///
    /// Fails without changing the pad if the identity or sort key is taken
    /// or the element measures taller than `max_item_height`.
    pub fn add_element(&mut self, element: E, ctx: &E::Context) -> Result<()> {
        let height = self.measure(&element, ctx)?;
        let key = self.store.insert(element, height)?;
        let rows = self.store.rows_at(&key);
        self.account_added(&key, rows);
        self.settle();
        Ok(())
    }

    /// Mutate an element in place and re-measure it.
    ///
    /// Returns `Ok(false)` if no element has this identity. If `mutate`
    /// changes the sort key, the element moves to its new position.
    ///
    /// On error (the new sort key is taken, the new height is over the
    /// limit, or the identity changed) the element is restored to its state
    /// before `mutate` ran and the pad is unchanged.
    pub fn change_element<F>(&mut self, id: &E::Id, ctx: &E::Context, mutate: F) -> Result<bool>
    where
        E: Clone,
        F: FnOnce(&mut E),
    {
        let Some(key) = self.store.key_of(id).cloned() else {
            return Ok(false);
        };
        let Some(element) = self.store.element_mut(&key) else {
            return Ok(false);
        };
        let snapshot = element.clone();
        mutate(element);
        self.commit_or_restore(key, snapshot, ctx)?;
        Ok(true)
    }

    /// Remove an element, returning it. Unknown identities are a no-op.
    pub fn delete_element(&mut self, id: &E::Id) -> Option<E> {
        let (key, entry) = self.store.remove(id)?;
        let rows = entry.rows();
        let mut requested = i64::from(self.viewport_offset);
        if let Some(mut anchor) = self.anchor.take() {
            match key.cmp(&anchor.key) {
                Ordering::Less => {
                    anchor.rows_before -= rows;
                    self.anchor = Some(anchor);
                }
                Ordering::Greater => {
                    anchor.rows_after -= rows;
                    self.anchor = Some(anchor);
                }
                Ordering::Equal => requested = self.reseat(anchor, &key, requested),
            }
        }
        self.settle_at(requested);
        Some(entry.element)
    }

    /// Drop every element and return to the initial glue.
    pub fn clear(&mut self) {
        self.store.clear();
        self.anchor = None;
        self.glue = GlueState::initial(self.config.pad_to);
        self.viewport_offset = 0;
        self.settle();
    }

    // ── viewport ────────────────────────────────────────────────────────

    /// Resize the viewport.
    ///
    /// A width change re-measures every element and adjusts both sides of
    /// the anchor by the height deltas; a height change only re-settles.
    /// If any element fails to measure, the pad is left untouched.
    pub fn set_viewport(&mut self, width: u16, height: u16, ctx: &E::Context) -> Result<()> {
        let mut requested = i64::from(self.viewport_offset);
        if width != self.width {
            requested = self.remeasure(width, ctx)?;
        }
        self.height = height;
        self.settle_at(requested);
        Ok(())
    }

    // ── navigation ──────────────────────────────────────────────────────

    /// Move the cursor `rows` rows down. Returns the rows actually moved.
    ///
    /// Running off the last row glues the pad to the bottom.
    pub fn scroll_down(&mut self, rows: usize) -> usize {
        if rows == 0 {
            return 0;
        }
        let Some(anchor) = self.anchor.as_mut() else {
            return 0;
        };
        let moved = anchor.walk_down(&self.store, rows);
        self.glue = if moved < rows {
            GlueState::Bottom
        } else {
            GlueState::Free
        };
        self.settle_at(i64::from(self.viewport_offset) + glue::as_i64(moved));
        moved
    }

    /// Move the cursor `rows` rows up. Returns the rows actually moved.
    ///
    /// Running off the first row glues the pad to the top.
    pub fn scroll_up(&mut self, rows: usize) -> usize {
        if rows == 0 {
            return 0;
        }
        let Some(anchor) = self.anchor.as_mut() else {
            return 0;
        };
        let moved = anchor.walk_up(&self.store, rows);
        self.glue = if moved < rows {
            GlueState::Top
        } else {
            GlueState::Free
        };
        self.settle_at(i64::from(self.viewport_offset) - glue::as_i64(moved));
        moved
    }

    /// Glue to the top and put the cursor on the first row.
    pub fn scroll_first_line(&mut self) {
        self.glue = GlueState::Top;
        self.settle();
    }

    /// Glue to the bottom and put the cursor on the last row.
    pub fn scroll_last_line(&mut self) {
        self.glue = GlueState::Bottom;
        self.settle();
    }

    /// Move the cursor to the first row of the next element.
    ///
    /// Returns `false` (and glues to the bottom) if there is none.
    pub fn scroll_next_element(&mut self) -> bool {
        let Some(anchor) = self.anchor.as_mut() else {
            return false;
        };
        match anchor.step_next(&self.store) {
            Some(moved) => {
                self.glue = GlueState::Free;
                self.settle_at(i64::from(self.viewport_offset) + glue::as_i64(moved));
                true
            }
            None => {
                self.scroll_last_line();
                false
            }
        }
    }

    /// Move the cursor to the last row of the previous element.
    ///
    /// Returns `false` (and glues to the top) if there is none.
    pub fn scroll_prev_element(&mut self) -> bool {
        let Some(anchor) = self.anchor.as_mut() else {
            return false;
        };
        match anchor.step_prev(&self.store) {
            Some(moved) => {
                self.glue = GlueState::Free;
                self.settle_at(i64::from(self.viewport_offset) - glue::as_i64(moved));
                true
            }
            None => {
                self.scroll_first_line();
                false
            }
        }
    }

    /// Move the cursor to the nearest later element matching `pred`.
    ///
    /// Returns `false` and leaves the pad alone if nothing matches.
    pub fn scroll_next_matching(&mut self, pred: impl FnMut(&E) -> bool) -> bool {
        let Some(anchor) = self.anchor.as_mut() else {
            return false;
        };
        let Some(moved) = anchor.seek_next(&self.store, pred) else {
            return false;
        };
        self.glue = GlueState::Free;
        self.settle_at(i64::from(self.viewport_offset) + glue::as_i64(moved));
        true
    }

    /// Move the cursor to the nearest earlier element matching `pred`.
    ///
    /// Returns `false` and leaves the pad alone if nothing matches.
    pub fn scroll_prev_matching(&mut self, pred: impl FnMut(&E) -> bool) -> bool {
        let Some(anchor) = self.anchor.as_mut() else {
            return false;
        };
        let Some(moved) = anchor.seek_prev(&self.store, pred) else {
            return false;
        };
        self.glue = GlueState::Free;
        self.settle_at(i64::from(self.viewport_offset) - glue::as_i64(moved));
        true
    }

    /// Put the cursor on the first row of `id`.
    ///
    /// Rows on both sides are summed from the store. The pad glues relatively
    /// to whichever edge the element fits next to, or floats with the element
    /// at the top of the viewport. Returns `false` for unknown or invisible
    /// elements.
    pub fn scroll_to_element(&mut self, id: &E::Id) -> bool {
        let Some(key) = self.store.key_of(id) else {
            return false;
        };
        let Some(anchor) = ScrollAnchor::recount(&self.store, key, 0) else {
            return false;
        };
        let height = self.store.rows_at(&anchor.key);
        let vh = usize::from(self.height);
        let fits_top = anchor.rows_before + height <= vh;
        let fits_bottom = anchor.rows_after + height <= vh;
        self.glue = match (fits_top, fits_bottom) {
            (true, true) => match self.config.pad_to {
                PadTo::Top => GlueState::RelativeTop,
                PadTo::Bottom => GlueState::RelativeBottom,
            },
            (true, false) => GlueState::RelativeTop,
            (false, true) => GlueState::RelativeBottom,
            (false, false) => GlueState::Free,
        };
        #[cfg(feature = "tracing")]
        tracing::debug!(?id, glue = ?self.glue, "scroll to element");
        self.anchor = Some(anchor);
        self.settle_at(0);
        true
    }

    // ── input ───────────────────────────────────────────────────────────

    /// Route a key: the active element first, then pad navigation.
    pub fn handle_key(&mut self, key: PadKey, ctx: &E::Context) -> Result<InputOutcome>
    where
        E: Clone,
    {
        if let Some(anchor_key) = self.anchor.as_ref().map(|a| a.key.clone()) {
            if let Some(element) = self.store.element_mut(&anchor_key) {
                let snapshot = element.clone();
                if element.handle_key(&key) {
                    self.commit_or_restore(anchor_key, snapshot, ctx)?;
                    return Ok(InputOutcome::Element);
                }
            }
        }
        let Some(navigation) = Navigation::for_key(&key) else {
            return Ok(InputOutcome::Ignored);
        };
        match navigation {
            Navigation::LineUp => {
                self.scroll_up(1);
            }
            Navigation::LineDown => {
                self.scroll_down(1);
            }
            Navigation::PageUp => {
                self.scroll_up(page_rows(self.height));
            }
            Navigation::PageDown => {
                self.scroll_down(page_rows(self.height));
            }
            Navigation::First => self.scroll_first_line(),
            Navigation::Last => self.scroll_last_line(),
            Navigation::PrevElement => {
                self.scroll_prev_element();
            }
            Navigation::NextElement => {
                self.scroll_next_element();
            }
        }
        Ok(InputOutcome::Navigated)
    }

    // ── verification ────────────────────────────────────────────────────

    /// Recompute all bookkeeping from the store and compare.
    ///
    /// O(n). Checks the row total, that every element still reports the
    /// sort key it is stored under, the anchor's sides and offset, and the
    /// viewport offset range.
    pub fn verify(&self) -> Result<()> {
        let mut total = 0;
        for (key, entry) in self.store.entries() {
            let reported = entry.element.sort_key();
            if reported != *key {
                return Err(PadError::invariant(format!(
                    "element {:?} reports sort key {reported:?} but is stored at {key:?}",
                    entry.element.id()
                )));
            }
            if entry.height > self.config.max_item_height {
                return Err(PadError::invariant(format!(
                    "cached height {} of {:?} exceeds {}",
                    entry.height,
                    entry.element.id(),
                    self.config.max_item_height
                )));
            }
            total += entry.rows();
        }
        if total != self.store.total_rows() {
            return Err(PadError::invariant(format!(
                "running row total {} != recounted {total}",
                self.store.total_rows()
            )));
        }
        match &self.anchor {
            None if total == 0 => {}
            None => {
                return Err(PadError::invariant(format!(
                    "{total} rows stored but no anchor"
                )));
            }
            Some(anchor) => {
                anchor.check(&self.store)?;
                let before = self.store.rows_before(&anchor.key);
                let after = self.store.rows_after(&anchor.key);
                if (before, after) != (anchor.rows_before, anchor.rows_after) {
                    return Err(PadError::invariant(format!(
                        "anchor sides ({}, {}) != recounted ({before}, {after})",
                        anchor.rows_before, anchor.rows_after
                    )));
                }
            }
        }
        if self.height > 0 && self.viewport_offset >= self.height {
            return Err(PadError::invariant(format!(
                "viewport offset {} outside viewport of {} rows",
                self.viewport_offset, self.height
            )));
        }
        Ok(())
    }

    // ── internals ───────────────────────────────────────────────────────

    fn measure(&self, element: &E, ctx: &E::Context) -> Result<u16> {
        checked_height(element, self.width, self.config.max_item_height, ctx)
    }

    /// Anchor for a pad that just gained its first rows.
    fn establish(&self) -> Option<ScrollAnchor<E::SortKey>> {
        if self.glue.lands_on_last_row(self.config.pad_to) {
            ScrollAnchor::at_last(&self.store)
        } else {
            ScrollAnchor::at_first(&self.store)
        }
    }

    /// Account for `rows` new rows at `key`.
    fn account_added(&mut self, key: &E::SortKey, rows: usize) {
        if let Some(anchor) = self.anchor.as_mut() {
            if *key < anchor.key {
                anchor.rows_before += rows;
            } else {
                anchor.rows_after += rows;
            }
            return;
        }
        if rows > 0 {
            self.anchor = self.establish();
        }
    }

    /// Commit a change to the element at `key`, or put `snapshot` back if
    /// the change is rejected.
    fn commit_or_restore(&mut self, key: E::SortKey, snapshot: E, ctx: &E::Context) -> Result<()> {
        let id = snapshot.id();
        let Err(err) = self.commit_change(key.clone(), &id, ctx) else {
            return Ok(());
        };
        if let Some(element) = self.store.element_mut(&key) {
            *element = snapshot;
        }
        Err(err)
    }

    /// Re-measure the element at `key` after its content changed.
    ///
    /// Every rejection happens before the store is touched.
    fn commit_change(&mut self, key: E::SortKey, id: &E::Id, ctx: &E::Context) -> Result<()> {
        let Some(entry) = self.store.entry(&key) else {
            return Ok(());
        };
        let element = &entry.element;
        let new_id = element.id();
        if new_id != *id {
            #[cfg(feature = "tracing")]
            tracing::warn!(?id, ?new_id, "element changed its identity, change rejected");
            return Err(PadError::invariant(format!(
                "element {id:?} changed its identity to {new_id:?}"
            )));
        }
        let height = checked_height(element, self.width, self.config.max_item_height, ctx)?;
        let visible = element.is_visible();
        let new_key = element.sort_key();
        if new_key != key {
            return self.relocate(key, new_key, height, visible);
        }
        let Some((old_rows, new_rows)) = self.store.set_measurement(&key, height, visible) else {
            return Ok(());
        };
        let requested = self.account_resized(&key, old_rows, new_rows);
        self.settle_at(requested);
        Ok(())
    }

    /// Account for the element at `key` going from `old` to `new` rows.
    /// Returns the viewport offset to settle at.
    fn account_resized(&mut self, key: &E::SortKey, old: usize, new: usize) -> i64 {
        let requested = i64::from(self.viewport_offset);
        let Some(mut anchor) = self.anchor.take() else {
            if new > 0 {
                self.anchor = self.establish();
            }
            return requested;
        };
        match key.cmp(&anchor.key) {
            Ordering::Less => anchor.rows_before = anchor.rows_before - old + new,
            Ordering::Greater => anchor.rows_after = anchor.rows_after - old + new,
            Ordering::Equal if new > 0 => anchor.rescale(old, new),
            Ordering::Equal => return self.reseat(anchor, key, requested),
        }
        self.anchor = Some(anchor);
        requested
    }

    /// Move an element whose sort key changed to its new slot.
    fn relocate(
        &mut self,
        old_key: E::SortKey,
        new_key: E::SortKey,
        height: u16,
        visible: bool,
    ) -> Result<()> {
        if let Err(err) = self.store.rekey(&old_key, new_key.clone()) {
            #[cfg(feature = "tracing")]
            tracing::warn!(?old_key, ?new_key, "sort key change collides, element kept in place");
            return Err(err);
        }
        let old_rows = self.store.rows_at(&new_key);
        let Some((_, new_rows)) = self.store.set_measurement(&new_key, height, visible) else {
            return Ok(());
        };
        let requested = i64::from(self.viewport_offset);
        match self.anchor.take() {
            Some(anchor) if anchor.key == old_key && new_rows == 0 => {
                let requested = self.reseat(anchor, &old_key, requested);
                self.settle_at(requested);
                return Ok(());
            }
            Some(anchor) if anchor.key == old_key => {
                let offset = (anchor.offset * new_rows / old_rows).min(new_rows - 1);
                self.anchor = ScrollAnchor::recount(&self.store, &new_key, offset);
            }
            Some(mut anchor) => {
                if old_key < anchor.key {
                    anchor.rows_before -= old_rows;
                } else {
                    anchor.rows_after -= old_rows;
                }
                if new_key < anchor.key {
                    anchor.rows_before += new_rows;
                } else {
                    anchor.rows_after += new_rows;
                }
                self.anchor = Some(anchor);
            }
            None => {
                if new_rows > 0 {
                    self.anchor = self.establish();
                }
            }
        }
        self.settle_at(requested);
        Ok(())
    }

    /// Re-measure everything at a new width. Returns the offset to settle at.
    fn remeasure(&mut self, width: u16, ctx: &E::Context) -> Result<i64> {
        let max = self.config.max_item_height;
        let mut fresh = Vec::with_capacity(self.store.len());
        for (_, entry) in self.store.entries() {
            let height = checked_height(&entry.element, width, max, ctx)?;
            fresh.push((height, entry.element.is_visible()));
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(from = self.width, to = width, elements = fresh.len(), "re-measuring pad");

        self.width = width;
        let anchor_key = self.anchor.as_ref().map(|a| a.key.clone());
        let (mut grow_before, mut shrink_before) = (0usize, 0usize);
        let (mut grow_after, mut shrink_after) = (0usize, 0usize);
        let (mut anchor_old, mut anchor_new) = (0usize, 0usize);
        for ((key, entry), (height, visible)) in self.store.entries_mut().zip(fresh) {
            let old = entry.rows();
            entry.height = height;
            entry.visible = visible;
            let new = entry.rows();
            match anchor_key.as_ref().map(|anchor| key.cmp(anchor)) {
                Some(Ordering::Less) => {
                    grow_before += new;
                    shrink_before += old;
                }
                Some(Ordering::Greater) => {
                    grow_after += new;
                    shrink_after += old;
                }
                Some(Ordering::Equal) => {
                    anchor_old = old;
                    anchor_new = new;
                }
                None => {}
            }
        }
        self.store.recompute_total();

        let requested = i64::from(self.viewport_offset);
        let Some(mut anchor) = self.anchor.take() else {
            self.anchor = self.establish();
            return Ok(requested);
        };
        anchor.rows_before = anchor.rows_before + grow_before - shrink_before;
        anchor.rows_after = anchor.rows_after + grow_after - shrink_after;
        if anchor_new > 0 {
            anchor.rescale(anchor_old, anchor_new);
            self.anchor = Some(anchor);
            return Ok(requested);
        }
        let key = anchor.key.clone();
        Ok(self.reseat(anchor, &key, requested))
    }

    /// Re-anchor after the anchored element at `lost` lost its rows, keeping
    /// the rows above it in place. Returns the offset to settle at.
    fn reseat(&mut self, anchor: ScrollAnchor<E::SortKey>, lost: &E::SortKey, requested: i64) -> i64 {
        let old_offset = glue::as_i64(anchor.offset);
        match anchor.reseat(&self.store, lost) {
            Some((anchor, side)) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(?lost, to = ?anchor.key, ?side, "anchor reseated");
                self.anchor = Some(anchor);
                match side {
                    Reseat::Prev => requested - old_offset - 1,
                    Reseat::Next => requested - old_offset,
                }
            }
            None => {
                self.anchor = None;
                requested
            }
        }
    }

    fn settle(&mut self) {
        self.settle_at(i64::from(self.viewport_offset));
    }

    /// Run the settle pass with `requested` as the desired viewport offset.
    fn settle_at(&mut self, requested: i64) {
        let mut requested = requested;

        // Steps 1 and 2.
        match self.glue {
            GlueState::Top => self.anchor = ScrollAnchor::at_first(&self.store),
            GlueState::Bottom => self.anchor = ScrollAnchor::at_last(&self.store),
            _ => {}
        }
        if let Some(edge) = glue::edge_offset(self.glue, self.height) {
            requested = edge;
        }

        // Step 3.
        let rows = self.anchor.as_ref().map(|a| a.rows(&self.store));
        if let Some(rows) = rows {
            match glue::relative_pin(self.glue, rows, self.height) {
                Some(Pin::Offset(pinned)) => requested = pinned,
                Some(Pin::Downgrade) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(from = ?self.glue, "anchor no longer fits, glue degraded to free");
                    self.glue = GlueState::Free;
                }
                None => {}
            }
        }

        // Steps 4 and 5.
        self.viewport_offset = glue::clamp_offset(requested, rows, self.height, self.config.pad_to);

        #[cfg(feature = "tracing")]
        tracing::trace!(
            glue = ?self.glue,
            viewport_offset = self.viewport_offset,
            rows_before = self.rows_before(),
            rows_after = self.rows_after(),
            total = self.store.total_rows(),
            "pad settled"
        );

        self.assert_consistent();

        // Step 6.
        let (before, after) = (self.rows_before(), self.rows_after());
        self.policy.fire(&mut self.hooks, before, after);
    }

    /// O(1) anchor check; a failure is a bug in the pad itself.
    fn assert_consistent(&self) {
        let outcome = match &self.anchor {
            Some(anchor) => anchor.check(&self.store),
            None if self.store.total_rows() == 0 => Ok(()),
            None => Err(PadError::invariant("pad has rows but no anchor")),
        };
        if let Err(err) = outcome {
            panic!("{err}");
        }
    }
}

/// Measure `element` and enforce the height limit.
fn checked_height<E: PadElement>(element: &E, width: u16, max: u16, ctx: &E::Context) -> Result<u16> {
    let height = element.measure(width, ctx);
    if height > max {
        #[cfg(feature = "tracing")]
        tracing::warn!(id = ?element.id(), height, max, "element exceeds max item height");
        return Err(PadError::HeightOutOfRange {
            id: format!("{:?}", element.id()),
            height,
            max,
        });
    }
    Ok(height)
}

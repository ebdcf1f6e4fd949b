#![forbid(unsafe_code)]

//! The capability every pad item implements.

use std::fmt::Debug;
use std::hash::Hash;

use crate::input::PadKey;
use crate::surface::Surface;

/// Part of an element that is on screen during a render pass.
///
/// The element draws its rows `first_row .. first_row + rows` onto screen
/// rows `y .. y + rows`. Rows above `first_row` are scrolled off the top;
/// rows past the slice are clipped at the bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowSlice {
    /// Screen row of the first drawn row.
    pub y: u16,
    /// First element row to draw.
    pub first_row: u16,
    /// Number of rows to draw.
    pub rows: u16,
    /// Columns available.
    pub width: u16,
}

impl RowSlice {
    /// Element rows covered by this slice.
    #[must_use]
    pub fn element_rows(&self) -> std::ops::Range<u16> {
        self.first_row..self.first_row.saturating_add(self.rows)
    }

    /// Screen row for element row `row`, if it is inside the slice.
    #[must_use]
    pub fn screen_row(&self, row: u16) -> Option<u16> {
        self.element_rows()
            .contains(&row)
            .then(|| self.y + (row - self.first_row))
    }
}

/// An item stored in a [`Pad`](crate::Pad).
///
/// Elements are ordered by [`sort_key`](PadElement::sort_key), which must
/// stay constant while the element is stored unless it is changed through
/// [`Pad::change_element`](crate::Pad::change_element) (the pad then moves
/// the element). Two distinct elements must never share a sort key; break
/// ties with a secondary id.
///
/// [`id`](PadElement::id) must never change while the element is stored. A
/// change that alters it is rejected and rolled back.
///
/// Measurement and rendering receive an explicit read-only `Context`
/// (user directory, theme, clock) instead of looking anything up globally.
pub trait PadElement {
    /// Stable identity used by the mutation API.
    type Id: Clone + Eq + Hash + Debug;
    /// Total order of elements in the pad.
    type SortKey: Ord + Clone + Debug;
    /// Shared read-only state needed to measure and draw.
    type Context: ?Sized;

    /// Identity of this element.
    fn id(&self) -> Self::Id;

    /// Position of this element in the pad.
    fn sort_key(&self) -> Self::SortKey;

    /// Height in rows when laid out at `width` columns.
    ///
    /// Must be a pure function of the content and the width, and must not
    /// exceed the configured `max_item_height`.
    fn measure(&self, width: u16, ctx: &Self::Context) -> u16;

    /// Draw the rows described by `slice`.
    ///
    /// `is_anchor` is true for the active element (the cursor).
    fn render(&self, surface: &mut dyn Surface, slice: RowSlice, is_anchor: bool, ctx: &Self::Context);

    /// Invisible elements stay stored but take no rows.
    fn is_visible(&self) -> bool {
        true
    }

    /// Offer a key to the element while it is active.
    ///
    /// Return `true` if the key was consumed. The element may change its
    /// content; the pad re-measures it afterwards.
    fn handle_key(&mut self, _key: &PadKey) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_maps_element_rows_to_screen_rows() {
        let slice = RowSlice {
            y: 4,
            first_row: 2,
            rows: 3,
            width: 10,
        };
        assert_eq!(slice.element_rows(), 2..5);
        assert_eq!(slice.screen_row(1), None);
        assert_eq!(slice.screen_row(2), Some(4));
        assert_eq!(slice.screen_row(4), Some(6));
        assert_eq!(slice.screen_row(5), None);
    }
}

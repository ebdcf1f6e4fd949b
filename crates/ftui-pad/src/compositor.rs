#![forbid(unsafe_code)]

//! Mapping the pad onto the screen.
//!
//! The anchor's element top sits at screen row `viewport_offset - offset`.
//! From there the compositor walks backwards over just enough earlier
//! elements to cover the rows above it, then yields elements forward until
//! the viewport is full. Nothing outside the viewport is visited.

use std::collections::btree_map;

use crate::backfill::BackfillHooks;
use crate::element::{PadElement, RowSlice};
use crate::glue::as_i64;
use crate::pad::Pad;
use crate::store::Entry;
use crate::surface::Surface;

/// An element on screen and the part of it that shows.
#[derive(Debug)]
pub struct VisibleElement<'a, E> {
    pub element: &'a E,
    pub slice: RowSlice,
    /// This element holds the cursor.
    pub is_anchor: bool,
}

/// Where the viewport sits in the pad, for drawing a scrollbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollMetrics {
    /// Rows of content.
    pub total_rows: usize,
    /// Pad row shown on the first screen row (0 when content is short).
    pub top_row: usize,
    /// Viewport height.
    pub viewport_rows: u16,
}

impl ScrollMetrics {
    /// Whether the content is taller than the viewport.
    #[must_use]
    pub fn is_scrollable(&self) -> bool {
        self.total_rows > usize::from(self.viewport_rows)
    }

    /// Scroll position in `[0.0, 1.0]`; 0.0 when not scrollable.
    #[must_use]
    pub fn progress(&self) -> f64 {
        let range = self.total_rows.saturating_sub(usize::from(self.viewport_rows));
        if range == 0 {
            return 0.0;
        }
        (self.top_row.min(range) as f64) / (range as f64)
    }
}

/// Lazy iterator over the elements intersecting the viewport.
pub struct VisibleElements<'a, E: PadElement> {
    entries: Option<btree_map::Range<'a, E::SortKey, Entry<E>>>,
    anchor: Option<&'a E::SortKey>,
    y: usize,
    skip: usize,
    height: usize,
    width: u16,
}

impl<'a, E: PadElement> VisibleElements<'a, E> {
    fn empty(height: u16, width: u16) -> Self {
        Self {
            entries: None,
            anchor: None,
            y: 0,
            skip: 0,
            height: usize::from(height),
            width,
        }
    }

    /// Screen row the next element would start on.
    #[must_use]
    pub fn next_row(&self) -> u16 {
        to_u16(self.y)
    }
}

impl<'a, E: PadElement> Iterator for VisibleElements<'a, E> {
    type Item = VisibleElement<'a, E>;

    fn next(&mut self) -> Option<Self::Item> {
        let entries = self.entries.as_mut()?;
        while self.y < self.height {
            let (key, entry) = entries.next()?;
            let rows = entry.rows();
            if rows == 0 {
                continue;
            }
            let skip = std::mem::take(&mut self.skip);
            let shown = (rows - skip).min(self.height - self.y);
            let slice = RowSlice {
                y: to_u16(self.y),
                first_row: to_u16(skip),
                rows: to_u16(shown),
                width: self.width,
            };
            self.y += shown;
            return Some(VisibleElement {
                element: &entry.element,
                slice,
                is_anchor: self.anchor == Some(key),
            });
        }
        None
    }
}

fn to_u16(value: usize) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

impl<E: PadElement, B: BackfillHooks> Pad<E, B> {
    /// Elements intersecting the viewport, top to bottom.
    ///
    /// Walks only the elements on screen plus the zero-row elements between
    /// them.
    pub fn visible_elements(&self) -> VisibleElements<'_, E> {
        let Some(anchor) = self.anchor.as_ref() else {
            return VisibleElements::empty(self.height, self.width);
        };
        if self.height == 0 {
            return VisibleElements::empty(0, self.width);
        }

        // Screen row of the anchored element's first row.
        let top = i64::from(self.viewport_offset) - as_i64(anchor.offset);
        let mut start = &anchor.key;
        let mut y = top;
        if top > 0 {
            for (key, entry) in self.store.before(&anchor.key) {
                let rows = entry.rows();
                if rows == 0 {
                    continue;
                }
                start = key;
                y -= as_i64(rows);
                if y <= 0 {
                    break;
                }
            }
        }
        let (y, skip) = if y < 0 {
            (0, usize::try_from(-y).unwrap_or(0))
        } else {
            (usize::try_from(y).unwrap_or(0), 0)
        };

        VisibleElements {
            entries: Some(self.store.from_key(start)),
            anchor: Some(&anchor.key),
            y,
            skip,
            height: usize::from(self.height),
            width: self.width,
        }
    }

    /// Scroll position for a scrollbar.
    #[must_use]
    pub fn scroll_metrics(&self) -> ScrollMetrics {
        let top_row = self.anchor.as_ref().map_or(0, |anchor| {
            (anchor.rows_before + anchor.offset).saturating_sub(usize::from(self.viewport_offset))
        });
        ScrollMetrics {
            total_rows: self.store.total_rows(),
            top_row,
            viewport_rows: self.height,
        }
    }

    /// Draw the viewport onto `surface`.
    ///
    /// Each visible element gets its rows blanked and is then asked to draw
    /// its slice; screen rows without content are blanked.
    pub fn render(&self, surface: &mut dyn Surface, ctx: &E::Context) {
        let height = self.height.min(surface.height());

        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!(
            "pad_render",
            width = self.width,
            height,
            total_rows = self.store.total_rows()
        )
        .entered();

        let mut y = 0;
        for visible in self.visible_elements() {
            let slice = visible.slice;
            if slice.y >= height {
                break;
            }
            if slice.y > y {
                surface.erase_rows(y, slice.y - y);
            }
            surface.erase_rows(slice.y, slice.rows);
            visible.element.render(surface, slice, visible.is_anchor, ctx);
            y = slice.y + slice.rows;
        }
        if y < height {
            surface.erase_rows(y, height - y);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::PadConfig;
    use crate::glue::PadTo;
    use crate::items::{Directory, TextItem, TimelineItem};
    use crate::pad::Pad;
    use crate::surface::TextSurface;

    fn timeline(pad_to: PadTo, height: u16, bodies: &[&str]) -> Pad<TimelineItem> {
        let dir = Directory::default();
        let mut pad = Pad::new(PadConfig::new(pad_to));
        pad.set_viewport(10, height, &dir).expect("resize");
        for (i, body) in bodies.iter().enumerate() {
            let id = u64::try_from(i).expect("small");
            let order = i64::try_from(i).expect("small");
            pad.add_element(TextItem::new(id, order, *body).into(), &dir).expect("add");
        }
        pad
    }

    fn screen(pad: &Pad<TimelineItem>) -> Vec<String> {
        let (width, height) = pad.viewport_size();
        let mut surface = TextSurface::new(width, height);
        pad.render(&mut surface, &Directory::default());
        surface.lines()
    }

    #[test]
    fn short_content_padded_to_bottom() {
        let pad = timeline(PadTo::Bottom, 4, &["a", "b"]);
        assert_eq!(screen(&pad), vec!["", "", "a", "b"]);
        let slices: Vec<_> = pad.visible_elements().map(|v| (v.slice.y, v.is_anchor)).collect();
        assert_eq!(slices, vec![(2, false), (3, true)]);
    }

    #[test]
    fn short_content_padded_to_top() {
        let pad = timeline(PadTo::Top, 4, &["a", "b"]);
        assert_eq!(screen(&pad), vec!["a", "b", "", ""]);
    }

    #[test]
    fn tall_content_fills_viewport_at_bottom() {
        let pad = timeline(PadTo::Bottom, 3, &["a", "b", "c", "d", "e"]);
        assert_eq!(screen(&pad), vec!["c", "d", "e"]);
        let metrics = pad.scroll_metrics();
        assert_eq!((metrics.total_rows, metrics.top_row), (5, 2));
        assert!(metrics.is_scrollable());
        assert!((metrics.progress() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn partially_visible_elements_are_clipped() {
        // Two 4-row elements in a 3-row viewport, cursor on row 2 of the second
        // drawn on the last screen row.
        let mut pad = timeline(PadTo::Top, 3, &["1 2 3 4", "5 6 7 8"]);
        pad.set_viewport(1, 3, &Directory::default()).expect("resize");
        pad.scroll_down(6);
        let visible: Vec<_> = pad
            .visible_elements()
            .map(|v| (v.slice.y, v.slice.first_row, v.slice.rows))
            .collect();
        assert_eq!(visible, vec![(0, 0, 3)]);
        assert_eq!(screen(&pad), vec!["5", "6", "7"]);

        pad.scroll_up(4);
        let visible: Vec<_> = pad
            .visible_elements()
            .map(|v| (v.slice.y, v.slice.first_row, v.slice.rows))
            .collect();
        assert_eq!(visible, vec![(0, 2, 2), (2, 0, 1)]);
        assert_eq!(screen(&pad), vec!["3", "4", "5"]);
    }

    #[test]
    fn hidden_elements_are_skipped() {
        let dir = Directory::default();
        let mut pad = timeline(PadTo::Top, 3, &["a", "b", "c"]);
        pad.change_element(&1, &dir, |item| {
            if let TimelineItem::Text(text) = item {
                text.set_hidden(true);
            }
        })
        .expect("hide");
        assert_eq!(screen(&pad), vec!["a", "c", ""]);
    }

    #[test]
    fn empty_pad_renders_blank() {
        let pad = timeline(PadTo::Bottom, 2, &[]);
        assert_eq!(pad.visible_elements().count(), 0);
        assert_eq!(screen(&pad), vec!["", ""]);
        assert_eq!(pad.scroll_metrics().top_row, 0);
        assert!(!pad.scroll_metrics().is_scrollable());
    }

    #[test]
    fn render_overwrites_previous_frame() {
        let mut pad = timeline(PadTo::Top, 2, &["a", "b", "c"]);
        let dir = Directory::default();
        let mut surface = TextSurface::new(10, 2);
        pad.render(&mut surface, &dir);
        assert_eq!(surface.lines(), vec!["a", "b"]);
        pad.scroll_last_line();
        pad.render(&mut surface, &dir);
        assert_eq!(surface.lines(), vec!["b", "c"]);
    }
}

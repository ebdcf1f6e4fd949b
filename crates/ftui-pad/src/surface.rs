#![forbid(unsafe_code)]

//! Render targets for pad elements.
//!
//! The pad never draws cells itself; it hands each visible element a
//! [`RowSlice`](crate::RowSlice) and a [`Surface`] and lets the element put
//! its text there. Any cell buffer can implement [`Surface`]; the crate
//! ships [`TextSurface`], a plain grapheme grid that tests and demos read
//! back with [`TextSurface::row_text`].

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// A rectangular grid of terminal cells addressed from the top-left corner.
pub trait Surface {
    /// Width in columns.
    fn width(&self) -> u16;

    /// Height in rows.
    fn height(&self) -> u16;

    /// Draw `text` starting at column `x` of row `y`, clipped to the surface.
    ///
    /// Returns the number of columns written.
    fn put_str(&mut self, x: u16, y: u16, text: &str) -> u16;

    /// Blank `count` rows starting at row `y`.
    fn erase_rows(&mut self, y: u16, count: u16);
}

/// Display width of a grapheme cluster, at least one column for printable text.
pub(crate) fn grapheme_width(grapheme: &str) -> usize {
    if grapheme.chars().all(char::is_control) {
        return 0;
    }
    grapheme.width().max(1)
}

/// Grapheme grid backed by strings, one entry per cell.
///
/// A wide grapheme occupies its first cell; the following cell holds an
/// empty continuation marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSurface {
    width: u16,
    height: u16,
    cells: Vec<String>,
}

impl TextSurface {
    /// Create a blank surface.
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![" ".to_string(); usize::from(width) * usize::from(height)],
        }
    }

    /// Blank the whole surface.
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
            cell.push(' ');
        }
    }

    /// Row `y` as a string with trailing blanks removed.
    #[must_use]
    pub fn row_text(&self, y: u16) -> String {
        if y >= self.height {
            return String::new();
        }
        let start = usize::from(y) * usize::from(self.width);
        let row: String = self.cells[start..start + usize::from(self.width)].concat();
        row.trim_end().to_string()
    }

    /// All rows, trailing blanks removed.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        (0..self.height).map(|y| self.row_text(y)).collect()
    }

    fn cell_mut(&mut self, x: u16, y: u16) -> &mut String {
        let idx = usize::from(y) * usize::from(self.width) + usize::from(x);
        &mut self.cells[idx]
    }
}

impl Surface for TextSurface {
    fn width(&self) -> u16 {
        self.width
    }

    fn height(&self) -> u16 {
        self.height
    }

    fn put_str(&mut self, x: u16, y: u16, text: &str) -> u16 {
        if y >= self.height {
            return 0;
        }
        let mut col = x;
        for grapheme in text.graphemes(true) {
            let w = grapheme_width(grapheme);
            if w == 0 {
                continue;
            }
            let w = u16::try_from(w).unwrap_or(u16::MAX);
            if col.saturating_add(w) > self.width {
                break;
            }
            let cell = self.cell_mut(col, y);
            cell.clear();
            cell.push_str(grapheme);
            for cont in 1..w {
                self.cell_mut(col + cont, y).clear();
            }
            col += w;
        }
        col - x
    }

    fn erase_rows(&mut self, y: u16, count: u16) {
        let end = y.saturating_add(count).min(self.height);
        for row in y..end {
            for col in 0..self.width {
                let cell = self.cell_mut(col, row);
                cell.clear();
                cell.push(' ');
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_surface_is_blank() {
        let surface = TextSurface::new(4, 2);
        assert_eq!(surface.lines(), vec!["", ""]);
    }

    #[test]
    fn put_str_clips_at_right_edge() {
        let mut surface = TextSurface::new(5, 1);
        assert_eq!(surface.put_str(2, 0, "hello"), 3);
        assert_eq!(surface.row_text(0), "  hel");
    }

    #[test]
    fn put_str_outside_rows_is_ignored() {
        let mut surface = TextSurface::new(5, 1);
        assert_eq!(surface.put_str(0, 3, "x"), 0);
    }

    #[test]
    fn wide_graphemes_take_two_cells() {
        let mut surface = TextSurface::new(6, 1);
        assert_eq!(surface.put_str(0, 0, "日本x"), 5);
        assert_eq!(surface.row_text(0), "日本x");
    }

    #[test]
    fn wide_grapheme_that_does_not_fit_is_dropped() {
        let mut surface = TextSurface::new(3, 1);
        assert_eq!(surface.put_str(0, 0, "a日本"), 3);
        assert_eq!(surface.row_text(0), "a日");
    }

    #[test]
    fn erase_rows_blanks_range() {
        let mut surface = TextSurface::new(3, 3);
        for y in 0..3 {
            surface.put_str(0, y, "abc");
        }
        surface.erase_rows(1, 5);
        assert_eq!(surface.lines(), vec!["abc", "", ""]);
    }
}

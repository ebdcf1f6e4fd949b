#![forbid(unsafe_code)]

//! Ready-made timeline elements.
//!
//! [`TextItem`] is a word-wrapped message, [`Divider`] a one-row separator,
//! and [`TimelineItem`] lets both live in the same pad. All three sort by
//! `(order, id)` so items with the same timestamp still get distinct keys,
//! and all measure against a shared [`Directory`] that resolves author ids to
//! display names.

use ahash::AHashMap;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::element::{PadElement, RowSlice};
use crate::input::PadKey;
use crate::surface::{Surface, grapheme_width};

/// Columns reserved by [`TextItem::with_cursor_gutter`].
const GUTTER: u16 = 2;

/// Author names shared by every item in a pad.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directory {
    names: AHashMap<u64, String>,
}

impl Directory {
    /// Register or rename an author.
    pub fn insert(&mut self, user: u64, name: impl Into<String>) {
        self.names.insert(user, name.into());
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, user: u64, name: impl Into<String>) -> Self {
        self.insert(user, name);
        self
    }

    /// Name to show for `user`.
    #[must_use]
    pub fn display_name(&self, user: u64) -> &str {
        self.names.get(&user).map_or("unknown", String::as_str)
    }
}

/// Split `text` into lines of at most `width` columns.
///
/// Breaks at word boundaries, falls back to grapheme boundaries for words
/// wider than a line, and keeps explicit newlines. A width of 0 disables
/// wrapping. Always returns at least one line.
#[must_use]
pub fn wrap_lines(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for raw_paragraph in text.split('\n') {
        let paragraph = raw_paragraph.strip_suffix('\r').unwrap_or(raw_paragraph);
        if width == 0 {
            lines.push(paragraph.to_string());
            continue;
        }
        let len_before = lines.len();
        let mut line = String::new();
        let mut line_width = 0;
        for word in paragraph.split_word_bounds() {
            let word_width = word.width();
            if line_width + word_width <= width {
                line.push_str(word);
                line_width += word_width;
                continue;
            }
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line).trim_end().to_string());
                line_width = 0;
                if word.trim().is_empty() {
                    continue;
                }
            }
            if word_width <= width {
                line.push_str(word);
                line_width = word_width;
                continue;
            }
            for grapheme in word.graphemes(true) {
                let w = grapheme_width(grapheme);
                if line_width + w > width && !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                    line_width = 0;
                }
                line.push_str(grapheme);
                line_width += w;
            }
        }
        if !line.is_empty() || lines.len() == len_before {
            lines.push(line.trim_end().to_string());
        }
    }
    lines
}

fn rows_of(lines: usize) -> u16 {
    u16::try_from(lines).unwrap_or(u16::MAX)
}

/// A word-wrapped text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextItem {
    id: u64,
    order: i64,
    author: Option<u64>,
    body: String,
    hidden: bool,
    collapsed: bool,
    gutter: bool,
}

impl TextItem {
    /// Create a message at position `order` (typically a timestamp).
    #[must_use]
    pub fn new(id: u64, order: i64, body: impl Into<String>) -> Self {
        Self {
            id,
            order,
            author: None,
            body: body.into(),
            hidden: false,
            collapsed: false,
            gutter: false,
        }
    }

    /// Prefix the message with the author's display name.
    #[must_use]
    pub fn with_author(mut self, user: u64) -> Self {
        self.author = Some(user);
        self
    }

    /// Reserve two columns on the left and mark the active item there.
    #[must_use]
    pub fn with_cursor_gutter(mut self) -> Self {
        self.gutter = true;
        self
    }

    /// Message identity.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Timeline position; ties are broken by `id`.
    #[must_use]
    pub fn order(&self) -> i64 {
        self.order
    }

    /// Raw message text, before wrapping.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Replace the message text (an edit).
    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = body.into();
    }

    /// Move the message to a new position.
    pub fn set_order(&mut self, order: i64) {
        self.order = order;
    }

    /// Filter the message out. Hidden messages stay stored but take no rows.
    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    #[must_use]
    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    /// Show only the first line.
    pub fn set_collapsed(&mut self, collapsed: bool) {
        self.collapsed = collapsed;
    }

    fn content_width(&self, width: u16) -> usize {
        let reserved = if self.gutter { GUTTER } else { 0 };
        usize::from(width.saturating_sub(reserved))
    }

    fn lines(&self, width: u16, directory: &Directory) -> Vec<String> {
        let text = match self.author {
            Some(user) => format!("{}: {}", directory.display_name(user), self.body),
            None => self.body.clone(),
        };
        let mut lines = wrap_lines(&text, self.content_width(width));
        if self.collapsed {
            lines.truncate(1);
        }
        lines
    }
}

impl PadElement for TextItem {
    type Id = u64;
    type SortKey = (i64, u64);
    type Context = Directory;

    fn id(&self) -> u64 {
        self.id
    }

    fn sort_key(&self) -> (i64, u64) {
        (self.order, self.id)
    }

    fn measure(&self, width: u16, ctx: &Directory) -> u16 {
        rows_of(self.lines(width, ctx).len())
    }

    fn render(&self, surface: &mut dyn Surface, slice: RowSlice, is_anchor: bool, ctx: &Directory) {
        let lines = self.lines(slice.width, ctx);
        let x = if self.gutter { GUTTER } else { 0 };
        for row in slice.element_rows() {
            let Some(y) = slice.screen_row(row) else {
                continue;
            };
            if self.gutter && is_anchor && row == 0 {
                surface.put_str(0, y, ">");
            }
            if let Some(line) = lines.get(usize::from(row)) {
                surface.put_str(x, y, line);
            }
        }
    }

    fn is_visible(&self) -> bool {
        !self.hidden
    }

    fn handle_key(&mut self, key: &PadKey) -> bool {
        match key {
            PadKey::Enter => {
                self.collapsed = !self.collapsed;
                true
            }
            _ => false,
        }
    }
}

/// A one-row separator such as a date line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Divider {
    id: u64,
    order: i64,
    label: String,
}

impl Divider {
    #[must_use]
    pub fn new(id: u64, order: i64, label: impl Into<String>) -> Self {
        Self {
            id,
            order,
            label: label.into(),
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl PadElement for Divider {
    type Id = u64;
    type SortKey = (i64, u64);
    type Context = Directory;

    fn id(&self) -> u64 {
        self.id
    }

    fn sort_key(&self) -> (i64, u64) {
        (self.order, self.id)
    }

    fn measure(&self, _width: u16, _ctx: &Directory) -> u16 {
        1
    }

    fn render(&self, surface: &mut dyn Surface, slice: RowSlice, _is_anchor: bool, _ctx: &Directory) {
        let Some(y) = slice.screen_row(0) else {
            return;
        };
        let mut line = format!("── {} ", self.label);
        let used = line.width();
        line.extend(std::iter::repeat_n('─', usize::from(slice.width).saturating_sub(used)));
        surface.put_str(0, y, &line);
    }
}

/// Any element a chat-style timeline holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimelineItem {
    Text(TextItem),
    Divider(Divider),
}

impl TimelineItem {
    #[must_use]
    pub fn order(&self) -> i64 {
        match self {
            Self::Text(item) => item.order,
            Self::Divider(item) => item.order,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&TextItem> {
        match self {
            Self::Text(item) => Some(item),
            Self::Divider(_) => None,
        }
    }

    #[must_use]
    pub fn is_divider(&self) -> bool {
        matches!(self, Self::Divider(_))
    }
}

impl From<TextItem> for TimelineItem {
    fn from(item: TextItem) -> Self {
        Self::Text(item)
    }
}

impl From<Divider> for TimelineItem {
    fn from(item: Divider) -> Self {
        Self::Divider(item)
    }
}

impl PadElement for TimelineItem {
    type Id = u64;
    type SortKey = (i64, u64);
    type Context = Directory;

    fn id(&self) -> u64 {
        match self {
            Self::Text(item) => item.id,
            Self::Divider(item) => item.id,
        }
    }

    fn sort_key(&self) -> (i64, u64) {
        match self {
            Self::Text(item) => item.sort_key(),
            Self::Divider(item) => item.sort_key(),
        }
    }

    fn measure(&self, width: u16, ctx: &Directory) -> u16 {
        match self {
            Self::Text(item) => item.measure(width, ctx),
            Self::Divider(item) => item.measure(width, ctx),
        }
    }

    fn render(&self, surface: &mut dyn Surface, slice: RowSlice, is_anchor: bool, ctx: &Directory) {
        match self {
            Self::Text(item) => item.render(surface, slice, is_anchor, ctx),
            Self::Divider(item) => item.render(surface, slice, is_anchor, ctx),
        }
    }

    fn is_visible(&self) -> bool {
        match self {
            Self::Text(item) => item.is_visible(),
            Self::Divider(item) => item.is_visible(),
        }
    }

    fn handle_key(&mut self, key: &PadKey) -> bool {
        match self {
            Self::Text(item) => item.handle_key(key),
            Self::Divider(item) => item.handle_key(key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::TextSurface;

    fn slice(y: u16, first_row: u16, rows: u16, width: u16) -> RowSlice {
        RowSlice {
            y,
            first_row,
            rows,
            width,
        }
    }

    #[test]
    fn wrap_breaks_at_words() {
        assert_eq!(wrap_lines("hello world", 5), vec!["hello", "world"]);
        assert_eq!(wrap_lines("hello world", 11), vec!["hello world"]);
    }

    #[test]
    fn wrap_splits_long_words() {
        assert_eq!(wrap_lines("abcdefgh", 3), vec!["abc", "def", "gh"]);
    }

    #[test]
    fn wrap_keeps_newlines_and_empty_text() {
        assert_eq!(wrap_lines("a\nb", 10), vec!["a", "b"]);
        assert_eq!(wrap_lines("", 10), vec![""]);
        assert_eq!(wrap_lines("a\r\n\nb", 10), vec!["a", "", "b"]);
    }

    #[test]
    fn wrap_counts_wide_graphemes() {
        assert_eq!(wrap_lines("日本語", 4), vec!["日本", "語"]);
    }

    #[test]
    fn zero_width_disables_wrapping() {
        assert_eq!(wrap_lines("one two three", 0), vec!["one two three"]);
    }

    #[test]
    fn author_prefix_comes_from_directory() {
        let dir = Directory::default().with(7, "ana");
        let item = TextItem::new(1, 10, "hi there").with_author(7);
        assert_eq!(item.measure(20, &dir), 1);
        assert_eq!(item.measure(8, &dir), 2);
        let mut surface = TextSurface::new(20, 1);
        item.render(&mut surface, slice(0, 0, 1, 20), false, &dir);
        assert_eq!(surface.row_text(0), "ana: hi there");

        let unknown = TextItem::new(2, 10, "x").with_author(9);
        let mut surface = TextSurface::new(20, 1);
        unknown.render(&mut surface, slice(0, 0, 1, 20), false, &dir);
        assert_eq!(surface.row_text(0), "unknown: x");
    }

    #[test]
    fn partial_slice_draws_requested_rows() {
        let dir = Directory::default();
        let item = TextItem::new(1, 0, "aa bb cc dd");
        assert_eq!(item.measure(2, &dir), 4);
        let mut surface = TextSurface::new(2, 2);
        item.render(&mut surface, slice(0, 1, 2, 2), false, &dir);
        assert_eq!(surface.lines(), vec!["bb", "cc"]);
    }

    #[test]
    fn gutter_marks_the_anchor() {
        let dir = Directory::default();
        let item = TextItem::new(1, 0, "abcd").with_cursor_gutter();
        assert_eq!(item.measure(4, &dir), 2);
        let mut surface = TextSurface::new(4, 2);
        item.render(&mut surface, slice(0, 0, 2, 4), true, &dir);
        assert_eq!(surface.lines(), vec!["> ab", "  cd"]);
    }

    #[test]
    fn enter_toggles_collapse() {
        let dir = Directory::default();
        let mut item = TextItem::new(1, 0, "one\ntwo\nthree");
        assert_eq!(item.measure(10, &dir), 3);
        assert!(item.handle_key(&PadKey::Enter));
        assert!(item.is_collapsed());
        assert_eq!(item.measure(10, &dir), 1);
        assert!(!item.handle_key(&PadKey::Char('x')));
    }

    #[test]
    fn hidden_items_are_invisible() {
        let mut item = TextItem::new(1, 0, "x");
        assert!(item.is_visible());
        item.set_hidden(true);
        assert!(!item.is_visible());
    }

    #[test]
    fn divider_fills_the_row() {
        let divider = Divider::new(3, 5, "today");
        let mut surface = TextSurface::new(12, 1);
        divider.render(&mut surface, slice(0, 0, 1, 12), false, &Directory::default());
        assert_eq!(surface.row_text(0), "── today ───");
    }

    #[test]
    fn timeline_sorts_by_order_then_id() {
        let a: TimelineItem = TextItem::new(9, 1, "a").into();
        let b: TimelineItem = Divider::new(2, 1, "b").into();
        let c: TimelineItem = TextItem::new(1, 2, "c").into();
        assert!(b.sort_key() < a.sort_key());
        assert!(a.sort_key() < c.sort_key());
        assert!(b.is_divider());
        assert_eq!(a.as_text().map(TextItem::body), Some("a"));
    }
}

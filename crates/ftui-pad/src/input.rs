#![forbid(unsafe_code)]

//! Keys understood by the pad.
//!
//! [`Pad::handle_key`](crate::Pad::handle_key) first offers a key to the
//! active element, then falls back to the navigation table below.
//!
//! | Key | Action |
//! |-----|--------|
//! | `Up` / `k` | one row up |
//! | `Down` / `j` | one row down |
//! | `PageUp` / `PageDown` | half a viewport |
//! | `Home` / `g` | first line |
//! | `End` / `G` | last line |
//! | `BackTab` / `Tab` | previous / next element |

/// A key press delivered to a pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PadKey {
    Up,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
    Tab,
    BackTab,
    Enter,
    Escape,
    Char(char),
}

/// Whether a key had an effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    /// The active element consumed the key.
    Element,
    /// The pad scrolled or moved its cursor.
    Navigated,
    /// Nobody wanted the key.
    Ignored,
}

impl InputOutcome {
    /// Whether the key was used.
    #[must_use]
    pub fn is_handled(self) -> bool {
        !matches!(self, Self::Ignored)
    }
}

/// Navigation a key maps to when the active element declines it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Navigation {
    LineUp,
    LineDown,
    PageUp,
    PageDown,
    First,
    Last,
    PrevElement,
    NextElement,
}

impl Navigation {
    pub(crate) fn for_key(key: &PadKey) -> Option<Self> {
        Some(match key {
            PadKey::Up | PadKey::Char('k') => Self::LineUp,
            PadKey::Down | PadKey::Char('j') => Self::LineDown,
            PadKey::PageUp => Self::PageUp,
            PadKey::PageDown => Self::PageDown,
            PadKey::Home | PadKey::Char('g') => Self::First,
            PadKey::End | PadKey::Char('G') => Self::Last,
            PadKey::BackTab => Self::PrevElement,
            PadKey::Tab => Self::NextElement,
            _ => return None,
        })
    }
}

/// Rows a page key moves for a viewport of `height` rows.
pub(crate) fn page_rows(height: u16) -> usize {
    usize::from(height / 2).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vi_keys_alias_arrows() {
        assert_eq!(Navigation::for_key(&PadKey::Char('j')), Some(Navigation::LineDown));
        assert_eq!(Navigation::for_key(&PadKey::Char('G')), Some(Navigation::Last));
        assert_eq!(Navigation::for_key(&PadKey::Char('x')), None);
        assert_eq!(Navigation::for_key(&PadKey::Enter), None);
    }

    #[test]
    fn page_is_half_a_viewport() {
        assert_eq!(page_rows(20), 10);
        assert_eq!(page_rows(1), 1);
        assert_eq!(page_rows(0), 1);
    }

    #[test]
    fn outcome_handled() {
        assert!(InputOutcome::Element.is_handled());
        assert!(InputOutcome::Navigated.is_handled());
        assert!(!InputOutcome::Ignored.is_handled());
    }
}

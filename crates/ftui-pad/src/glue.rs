#![forbid(unsafe_code)]

//! Glue states and the viewport clamp arithmetic.
//!
//! The viewport is described by a single number, `viewport_offset`: the
//! screen row on which the anchor's current row is drawn. Everything else
//! (which pad row sits at the top of the screen, whether blank rows show) is
//! derived from it together with the anchor's absolute row and the pad
//! height.
//!
//! ```text
//!   pad row  0 ┐
//!            … │ rows_before
//!   anchor row ┼──────────── drawn at screen row `viewport_offset`
//!            … │ rows_after
//!   pad row T-1┘
//! ```
//!
//! The functions here are pure so the settle pass in [`Pad`](crate::Pad)
//! stays a short sequence of steps.

#[cfg(feature = "pad-config")]
use serde::{Deserialize, Serialize};

/// Which edge short content sticks to, and the default glue edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "pad-config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "pad-config", serde(rename_all = "snake_case"))]
pub enum PadTo {
    /// Content starts at the top row; blank rows collect below it.
    #[default]
    Top,
    /// Content ends at the bottom row; blank rows collect above it.
    Bottom,
}

/// How the viewport reacts to content changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlueState {
    /// Always show the first row of the pad.
    Top,
    /// Keep the top of the pad on screen while the anchor still fits below it.
    RelativeTop,
    /// Keep the bottom of the pad on screen while the anchor still fits above it.
    RelativeBottom,
    /// Always show the last row of the pad.
    Bottom,
    /// The viewport offset is independent and only clamped.
    Free,
}

impl GlueState {
    /// Glue a freshly constructed (or cleared) pad starts with.
    #[must_use]
    pub const fn initial(pad_to: PadTo) -> Self {
        match pad_to {
            PadTo::Top => Self::Top,
            PadTo::Bottom => Self::Bottom,
        }
    }

    /// Whether an anchor established on an empty pad starts on its last row.
    #[must_use]
    pub const fn lands_on_last_row(self, pad_to: PadTo) -> bool {
        match self {
            Self::Top | Self::RelativeTop => false,
            Self::Bottom | Self::RelativeBottom => true,
            Self::Free => matches!(pad_to, PadTo::Bottom),
        }
    }

    /// Whether this state pins the anchor to an absolute edge.
    #[must_use]
    pub const fn is_edge(self) -> bool {
        matches!(self, Self::Top | Self::Bottom)
    }
}

/// Where the anchor sits in the pad, in rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AnchorRows {
    pub rows_before: usize,
    pub offset: usize,
    pub height: usize,
    pub rows_after: usize,
}

impl AnchorRows {
    /// Absolute pad row of the anchor's current row.
    pub fn row(self) -> usize {
        self.rows_before + self.offset
    }

    pub fn total(self) -> usize {
        self.rows_before + self.height + self.rows_after
    }
}

/// Outcome of pinning a relative glue state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Pin {
    /// Viewport offset that keeps the pinned edge on screen.
    Offset(i64),
    /// The anchor no longer fits next to its edge.
    Downgrade,
}

/// Viewport offset keeping the relatively glued edge on screen.
///
/// Only meaningful for `RelativeTop` / `RelativeBottom`; other states return
/// `None`.
pub(crate) fn relative_pin(glue: GlueState, rows: AnchorRows, viewport_height: u16) -> Option<Pin> {
    let vh = usize::from(viewport_height);
    match glue {
        GlueState::RelativeTop => Some(if rows.rows_before + rows.height <= vh {
            Pin::Offset(as_i64(rows.rows_before + rows.offset))
        } else {
            Pin::Downgrade
        }),
        GlueState::RelativeBottom => Some(if rows.rows_after + rows.height <= vh {
            Pin::Offset(as_i64(vh) - as_i64(rows.height + rows.rows_after) + as_i64(rows.offset))
        } else {
            Pin::Downgrade
        }),
        _ => None,
    }
}

/// Viewport offset an absolute edge glue asks for before clamping.
pub(crate) fn edge_offset(glue: GlueState, viewport_height: u16) -> Option<i64> {
    match glue {
        GlueState::Top => Some(0),
        GlueState::Bottom => Some(i64::from(viewport_height) - 1),
        _ => None,
    }
}

/// Clamp a requested viewport offset (settle steps 4 and 5).
///
/// Step 4 keeps the anchor row on screen. Step 5 applies the pad-to rule:
/// content shorter than the viewport is pushed against `pad_to`, and taller
/// content never leaves blank rows on either side.
pub(crate) fn clamp_offset(requested: i64, rows: Option<AnchorRows>, viewport_height: u16, pad_to: PadTo) -> u16 {
    if viewport_height == 0 {
        return 0;
    }
    let vh = i64::from(viewport_height);
    let offset = requested.clamp(0, vh - 1);

    let Some(rows) = rows else {
        return 0;
    };
    let row = as_i64(rows.row());
    let total = as_i64(rows.total());

    let offset = if total < vh {
        match pad_to {
            PadTo::Top => row,
            PadTo::Bottom => vh - total + row,
        }
    } else {
        let lo = (row + vh - total).max(0);
        let hi = row.min(vh - 1);
        offset.clamp(lo, hi)
    };
    // Both branches stay inside [0, vh - 1], which fits u16.
    u16::try_from(offset).unwrap_or(viewport_height - 1)
}

pub(crate) fn as_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#![forbid(unsafe_code)]

//! Error types for the pad engine.
//!
//! Two families live here:
//!
//! - [`PadError`]: contract failures reported by mutations (a duplicate
//!   identity, a sort-key collision, an out-of-range measured height) and
//!   the result of the full [`Pad::verify`](crate::Pad::verify) pass.
//! - [`PadConfigError`]: failures while loading a [`PadConfig`](crate::PadConfig).
//!
//! Unknown identities are not errors: `change_element`, `delete_element` and
//! `scroll_to_element` report them through their `bool`/`Option` returns.

use thiserror::Error;

/// Result alias for pad operations.
pub type Result<T> = std::result::Result<T, PadError>;

/// Contract failures detected by the pad.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PadError {
    /// An element with the same identity is already stored.
    #[error("element {id} is already in the pad")]
    DuplicateElement { id: String },

    /// Another element already occupies this sort key. Ties between distinct
    /// elements must be broken by the caller (e.g. a secondary id).
    #[error("sort key {key} is already held by element {holder}")]
    OrderingConflict { key: String, holder: String },

    /// `measure` returned a height above the configured maximum.
    #[error("element {id} measured {height} rows, limit is {max}")]
    HeightOutOfRange { id: String, height: u16, max: u16 },

    /// The anchor bookkeeping disagrees with the store.
    #[error("pad invariant violated: {0}")]
    Invariant(String),
}

impl PadError {
    pub(crate) fn duplicate(id: &impl std::fmt::Debug) -> Self {
        Self::DuplicateElement {
            id: format!("{id:?}"),
        }
    }

    pub(crate) fn conflict(key: &impl std::fmt::Debug, holder: &impl std::fmt::Debug) -> Self {
        Self::OrderingConflict {
            key: format!("{key:?}"),
            holder: format!("{holder:?}"),
        }
    }

    pub(crate) fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant(message.into())
    }
}

/// Errors that can occur when loading a pad configuration.
#[derive(Debug, Error)]
pub enum PadConfigError {
    /// I/O error reading a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error.
    #[cfg(feature = "pad-config")]
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON parse error.
    #[cfg(feature = "pad-config")]
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The parsed values are out of range.
    #[error("validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}

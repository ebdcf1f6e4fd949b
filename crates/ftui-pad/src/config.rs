#![forbid(unsafe_code)]

//! Pad configuration.
//!
//! [`PadConfig`] groups the few tunables of the engine. It can be built in
//! code or, with the `pad-config` feature, loaded from TOML or JSON:
//!
//! ```toml
//! pad_to = "bottom"
//! backfill_threshold = 200
//! max_item_height = 4096
//! ```
//!
//! ```rust,ignore
//! let config = PadConfig::from_toml_file("chat-pad.toml")?;
//! ```
//!
//! Loaded configs are validated before they are returned.

#[cfg(feature = "pad-config")]
use std::path::Path;

#[cfg(feature = "pad-config")]
use serde::{Deserialize, Serialize};

use crate::error::PadConfigError;
use crate::glue::PadTo;

/// Rows-before/after level under which a backfill hook fires.
pub const DEFAULT_BACKFILL_THRESHOLD: usize = 100;

/// Largest height an element may report.
pub const DEFAULT_MAX_ITEM_HEIGHT: u16 = 10_000;

/// Tunables for a [`Pad`](crate::Pad).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "pad-config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "pad-config", serde(default))]
pub struct PadConfig {
    /// Edge short content sticks to; also the initial glue edge.
    pub pad_to: PadTo,
    /// Backfill fires when rows before/after the anchor drop below this.
    /// Zero disables backfill.
    pub backfill_threshold: usize,
    /// Upper bound for a measured element height.
    pub max_item_height: u16,
}

impl Default for PadConfig {
    fn default() -> Self {
        Self {
            pad_to: PadTo::Top,
            backfill_threshold: DEFAULT_BACKFILL_THRESHOLD,
            max_item_height: DEFAULT_MAX_ITEM_HEIGHT,
        }
    }
}

impl PadConfig {
    /// Default config with the given pad edge.
    #[must_use]
    pub fn new(pad_to: PadTo) -> Self {
        Self {
            pad_to,
            ..Self::default()
        }
    }

    /// Set the pad edge.
    #[must_use]
    pub fn pad_to(mut self, pad_to: PadTo) -> Self {
        self.pad_to = pad_to;
        self
    }

    /// Set the backfill threshold.
    #[must_use]
    pub fn backfill_threshold(mut self, rows: usize) -> Self {
        self.backfill_threshold = rows;
        self
    }

    /// Set the maximum element height.
    #[must_use]
    pub fn max_item_height(mut self, rows: u16) -> Self {
        self.max_item_height = rows;
        self
    }

    /// Validate all parameters are within acceptable ranges.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.max_item_height == 0 {
            errors.push("max_item_height must be > 0".into());
        }
        errors
    }

    /// Return `self` if valid, or the collected validation errors.
    pub fn validated(self) -> Result<Self, PadConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(PadConfigError::Validation(errors))
        }
    }

    /// Load from a TOML string.
    #[cfg(feature = "pad-config")]
    pub fn from_toml_str(s: &str) -> Result<Self, PadConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validated()
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "pad-config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, PadConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "pad-config")]
    pub fn from_json_str(s: &str) -> Result<Self, PadConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validated()
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "pad-config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PadConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = PadConfig::default();
        assert_eq!(config.pad_to, PadTo::Top);
        assert_eq!(config.backfill_threshold, 100);
        assert_eq!(config.max_item_height, 10_000);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn builder_setters() {
        let config = PadConfig::new(PadTo::Bottom)
            .backfill_threshold(5)
            .max_item_height(64);
        assert_eq!(config.pad_to, PadTo::Bottom);
        assert_eq!(config.backfill_threshold, 5);
        assert_eq!(config.max_item_height, 64);
    }

    #[test]
    fn zero_max_height_is_rejected() {
        let err = PadConfig::default().max_item_height(0).validated();
        assert!(matches!(err, Err(PadConfigError::Validation(ref e)) if e.len() == 1));
    }

    #[test]
    fn zero_threshold_is_allowed() {
        assert!(PadConfig::default().backfill_threshold(0).validated().is_ok());
    }

    #[cfg(feature = "pad-config")]
    #[test]
    fn toml_round_trip_with_partial_fields() {
        let config = PadConfig::from_toml_str("pad_to = \"bottom\"\nbackfill_threshold = 7\n")
            .expect("valid toml");
        assert_eq!(config.pad_to, PadTo::Bottom);
        assert_eq!(config.backfill_threshold, 7);
        assert_eq!(config.max_item_height, DEFAULT_MAX_ITEM_HEIGHT);
    }

    #[cfg(feature = "pad-config")]
    #[test]
    fn json_validation_failure() {
        let err = PadConfig::from_json_str(r#"{"max_item_height": 0}"#);
        assert!(matches!(err, Err(PadConfigError::Validation(_))));
    }

    #[cfg(feature = "pad-config")]
    #[test]
    fn toml_file_loading() {
        use std::io::Write as _;
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "pad_to = \"top\"\nmax_item_height = 12").expect("write");
        let config = PadConfig::from_toml_file(file.path()).expect("load");
        assert_eq!(config.max_item_height, 12);
    }

    #[cfg(feature = "pad-config")]
    #[test]
    fn missing_file_is_io_error() {
        let err = PadConfig::from_json_file("/definitely/not/here.json");
        assert!(matches!(err, Err(PadConfigError::Io(_))));
    }
}

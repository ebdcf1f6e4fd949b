#![forbid(unsafe_code)]

//! Virtualized, anchor-preserving scroll pad.
//!
//! A [`Pad`] holds an ordered set of variable-height elements (messages,
//! separators, anything implementing [`PadElement`]) and shows a window of
//! them in a fixed-size viewport. It keeps a cursor ([`ScrollAnchor`]) on one
//! row of one element and keeps that row at the same screen position while
//! content is inserted, edited, hidden, deleted or re-measured around it.
//!
//! Row bookkeeping is incremental, so a pad over a very long history costs
//! roughly the same per operation as a short one; only the elements on
//! screen are visited when rendering. When the rows on either side of the
//! cursor run low the pad calls [`BackfillHooks`] so the caller can load
//! more.
//!
//! # Quick start
//!
//! ```
//! use ftui_pad::{Directory, Pad, PadConfig, PadTo, TextItem, TextSurface};
//!
//! let dir = Directory::default().with(1, "ana");
//! let mut pad = Pad::new(PadConfig::new(PadTo::Bottom));
//! pad.set_viewport(16, 3, &dir)?;
//! pad.add_element(TextItem::new(1, 100, "hello").with_author(1), &dir)?;
//! pad.add_element(TextItem::new(2, 101, "how are you?").with_author(1), &dir)?;
//!
//! let mut screen = TextSurface::new(16, 3);
//! pad.render(&mut screen, &dir);
//! assert_eq!(screen.lines(), vec!["ana: hello", "ana: how are you", "?"]);
//! # Ok::<(), ftui_pad::PadError>(())
//! ```
//!
//! # Feature flags
//!
//! - `tracing`: structured logs for glue changes, anchor reseats, backfill
//!   requests and render passes.
//! - `pad-config`: load [`PadConfig`] from TOML or JSON.

pub mod anchor;
pub mod backfill;
pub mod compositor;
pub mod config;
pub mod element;
pub mod error;
pub mod glue;
pub mod input;
pub mod items;
pub mod pad;
pub mod store;
pub mod surface;

pub use anchor::ScrollAnchor;
pub use backfill::{BackfillHooks, BackfillPolicy, Edge, EdgeDemand, FnBackfill, LoadGate, NoBackfill};
pub use compositor::{ScrollMetrics, VisibleElement, VisibleElements};
pub use config::PadConfig;
pub use element::{PadElement, RowSlice};
pub use error::{PadConfigError, PadError, Result};
pub use glue::{GlueState, PadTo};
pub use input::{InputOutcome, PadKey};
pub use items::{Directory, Divider, TextItem, TimelineItem, wrap_lines};
pub use pad::Pad;
pub use store::ElementStore;
pub use surface::{Surface, TextSurface};

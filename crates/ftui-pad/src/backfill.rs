#![forbid(unsafe_code)]

//! Lazy loading at the edges of the known data.
//!
//! After every mutation, scroll and resize the pad compares the rows it
//! holds on each side of the anchor with a threshold and pokes the matching
//! [`BackfillHooks`] method when a side runs low. Both sides may fire in the
//! same pass.
//!
//! The hooks are fire-and-forget. The loader answers later by calling
//! [`Pad::add_element`](crate::Pad::add_element), and it owns the
//! de-duplication: a hook fires on every low pass, so the loader must ignore
//! requests while one is in flight or once an edge is known to be exhausted.
//! [`LoadGate`] is a ready-made implementation of that bookkeeping.

/// Side of the pad that needs more data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    /// Older items, before the first loaded element.
    Before,
    /// Newer items, after the last loaded element.
    After,
}

/// Callbacks the pad invokes when it runs low on rows.
pub trait BackfillHooks {
    /// Fewer than the threshold rows remain before the anchor.
    fn request_more_before(&mut self) {}

    /// Fewer than the threshold rows remain after the anchor.
    fn request_more_after(&mut self) {}
}

/// Hooks that never load anything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoBackfill;

impl BackfillHooks for NoBackfill {}

/// Adapts a closure taking the [`Edge`] to [`BackfillHooks`].
#[derive(Debug, Clone, Copy)]
pub struct FnBackfill<F>(pub F);

impl<F: FnMut(Edge)> BackfillHooks for FnBackfill<F> {
    fn request_more_before(&mut self) {
        (self.0)(Edge::Before)
    }

    fn request_more_after(&mut self) {
        (self.0)(Edge::After)
    }
}

/// Which edges are low after a pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeDemand {
    /// Rows before the anchor are below the threshold.
    pub before: bool,
    /// Rows after the anchor are below the threshold.
    pub after: bool,
}

/// Threshold policy deciding when the hooks fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackfillPolicy {
    threshold: usize,
}

impl BackfillPolicy {
    /// Fire when a side holds fewer than `threshold` rows. Zero disables.
    #[must_use]
    pub const fn new(threshold: usize) -> Self {
        Self { threshold }
    }

    /// Configured threshold.
    #[must_use]
    pub const fn threshold(&self) -> usize {
        self.threshold
    }

    /// Evaluate both sides.
    #[must_use]
    pub const fn demand(&self, rows_before: usize, rows_after: usize) -> EdgeDemand {
        EdgeDemand {
            before: rows_before < self.threshold,
            after: rows_after < self.threshold,
        }
    }

    /// Evaluate both sides and invoke the hooks for the low ones.
    pub fn fire<B: BackfillHooks + ?Sized>(
        &self,
        hooks: &mut B,
        rows_before: usize,
        rows_after: usize,
    ) -> EdgeDemand {
        let demand = self.demand(rows_before, rows_after);
        if demand.before {
            #[cfg(feature = "tracing")]
            tracing::debug!(rows_before, threshold = self.threshold, "requesting backfill before anchor");
            hooks.request_more_before();
        }
        if demand.after {
            #[cfg(feature = "tracing")]
            tracing::debug!(rows_after, threshold = self.threshold, "requesting backfill after anchor");
            hooks.request_more_after();
        }
        demand
    }
}

/// Loader-side de-duplication for one edge.
///
/// ```
/// use ftui_pad::LoadGate;
///
/// let mut gate = LoadGate::default();
/// assert!(gate.try_begin());
/// assert!(!gate.try_begin()); // still in flight
/// gate.finish(0);             // nothing came back
/// assert!(gate.is_exhausted());
/// assert!(!gate.try_begin());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadGate {
    pending: bool,
    exhausted: bool,
}

impl LoadGate {
    /// Start a request unless one is in flight or the edge is exhausted.
    pub fn try_begin(&mut self) -> bool {
        if self.pending || self.exhausted {
            return false;
        }
        self.pending = true;
        true
    }

    /// Record the response. An empty response marks the edge exhausted.
    pub fn finish(&mut self, received: usize) {
        self.pending = false;
        if received == 0 {
            self.exhausted = true;
        }
    }

    /// Forget a pending request whose result will be ignored.
    pub fn abandon(&mut self) {
        self.pending = false;
    }

    /// Allow loading again, e.g. after the data source reports new items.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// A request is in flight.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// The edge returned nothing last time.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

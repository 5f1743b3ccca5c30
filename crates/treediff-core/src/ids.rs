use std::sync::atomic::{AtomicU64, Ordering};

/// Identifier attached to nodes of a generic-mode diff.
pub type NodeId = u64;

/// Source of unique [`NodeId`]s for generic-mode comparisons.
///
/// The caller owns the source, so repeated comparisons are reproducible when a
/// fresh [`NodeIds`] is used and unique across calls when one is reused.
///
/// ```
/// # use treediff_core::{IdSource, NodeIds};
/// let mut ids = NodeIds::new();
/// assert_eq!(ids.next_id(), 1);
/// assert_eq!(ids.next_id(), 2);
/// ```
pub trait IdSource {
    /// Returns the next identifier.
    fn next_id(&mut self) -> NodeId;
}

/// Plain monotonically increasing counter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeIds {
    next: NodeId,
}

impl NodeIds {
    /// Creates a counter that starts at 1.
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Creates a counter that starts at `first`, e.g. to continue a previous run.
    #[must_use]
    pub fn starting_at(first: NodeId) -> Self {
        Self { next: first }
    }

    /// Returns the identifier the next call will produce.
    #[must_use]
    pub fn peek(&self) -> NodeId {
        self.next
    }
}

impl Default for NodeIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdSource for NodeIds {
    fn next_id(&mut self) -> NodeId {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// Shared counter for hosts that compare from several threads at once.
///
/// ```
/// # use std::sync::atomic::AtomicU64;
/// # use treediff_core::IdSource;
/// static COUNTER: AtomicU64 = AtomicU64::new(100);
/// let mut shared = &COUNTER;
/// assert_eq!(shared.next_id(), 100);
/// ```
impl IdSource for &AtomicU64 {
    fn next_id(&mut self) -> NodeId {
        self.fetch_add(1, Ordering::Relaxed)
    }
}

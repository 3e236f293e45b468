//! Observer hooks for progress reporting and diagnostics.

use ts_core::{CellId, Timestamp};

use crate::{FanOutReport, SimError, TickOutcome};

/// Callbacks invoked by [`CellSimulator`][crate::CellSimulator] at key
/// points of a cell tick.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.  Cell ticks run on many threads at
/// once, so hooks take `&self`; use atomics or a mutex for counters.
///
/// # Example — conflict counter
///
/// ```rust,ignore
/// #[derive(Default)]
/// struct Conflicts(AtomicUsize);
///
/// impl TickObserver for Conflicts {
///     fn on_conflict(&self, _cell: CellId, _attempt: u32) {
///         self.0.fetch_add(1, Ordering::Relaxed);
///     }
/// }
/// ```
pub trait TickObserver: Send + Sync {
    /// Called before the cell lock is requested.
    fn on_tick_start(&self, _cell: CellId, _now: Timestamp) {}

    /// Called after a tick committed or found the lock held.
    fn on_tick_end(&self, _cell: CellId, _outcome: &TickOutcome) {}

    /// Called when a tick gives up.  `error` is the internal cause; the
    /// caller only sees [`SimError::RetryLater`].
    fn on_tick_failed(&self, _cell: CellId, _error: &SimError) {}

    /// Called for every optimistic-concurrency conflict, whether or not the
    /// transaction is retried.
    fn on_conflict(&self, _cell: CellId, _attempt: u32) {}

    /// Called once per fan-out round after every job has returned.
    fn on_fan_out_end(&self, _report: &FanOutReport) {}
}

/// A [`TickObserver`] that does nothing.
pub struct NoopObserver;

impl TickObserver for NoopObserver {}

//! Fluent builder for constructing a [`CellSimulator`].

use std::sync::Arc;
use std::sync::atomic::AtomicU64;

use ts_behavior::BehaviorStep;
use ts_core::{Clock, SystemClock, WorldConfig};
use ts_nav::Navigator;
use ts_store::Store;
use ts_terrain::TerrainGenerator;

use crate::{CellSimulator, NoopObserver, SimResult, TickObserver};

/// Fluent builder for [`CellSimulator<S, B, N>`].
///
/// # Required inputs
///
/// - [`WorldConfig`] — world seed, cell size, terrain and scheduler settings
/// - `S: Store` — where documents live (e.g. [`ts_store::MemoryStore`])
/// - `B: BehaviorStep` — the game rules
/// - `N: Navigator` — the path planner (e.g. [`ts_nav::DirectionMapNavigator`])
///
/// # Optional inputs (have defaults)
///
/// | Method          | Default          |
/// |-----------------|------------------|
/// | `.clock(c)`     | `SystemClock`    |
/// | `.observer(o)`  | `NoopObserver`   |
/// | `.worker_id(s)` | `"worker"`       |
///
/// Lock tokens also carry a random per-instance nonce, so simulators that
/// share a worker id never mistake each other's locks for their own.
///
/// # Example
///
/// ```rust,ignore
/// let sim = CellSimulatorBuilder::new(config, MemoryStore::new(), NoopBehavior, navigator)
///     .clock(Arc::new(ManualClock::new(Timestamp(0))))
///     .build()?;
/// sim.tick(CellId::new(0, 0))?;
/// ```
pub struct CellSimulatorBuilder<S: Store, B: BehaviorStep, N: Navigator> {
    config:    WorldConfig,
    store:     S,
    behavior:  B,
    navigator: N,
    clock:     Option<Arc<dyn Clock>>,
    observer:  Option<Arc<dyn TickObserver>>,
    worker:    Option<String>,
}

impl<S: Store, B: BehaviorStep, N: Navigator> CellSimulatorBuilder<S, B, N> {
    /// Create a builder with all required inputs.
    pub fn new(config: WorldConfig, store: S, behavior: B, navigator: N) -> Self {
        Self {
            config,
            store,
            behavior,
            navigator,
            clock:    None,
            observer: None,
            worker:   None,
        }
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn observer(mut self, observer: Arc<dyn TickObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Name written into the cell locks this simulator takes.
    pub fn worker_id(mut self, id: impl Into<String>) -> Self {
        self.worker = Some(id.into());
        self
    }

    /// Validate the configuration and return a ready [`CellSimulator`].
    pub fn build(self) -> SimResult<CellSimulator<S, B, N>> {
        self.config.validate()?;
        let terrain = TerrainGenerator::new(self.config.world_seed, self.config.terrain.clone())?;

        Ok(CellSimulator {
            terrain,
            config:    self.config,
            store:     self.store,
            behavior:  self.behavior,
            navigator: self.navigator,
            clock:     self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            observer:  self.observer.unwrap_or_else(|| Arc::new(NoopObserver)),
            worker:    self.worker.unwrap_or_else(|| "worker".to_owned()),
            instance:  rand::random(),
            next_lock: AtomicU64::new(0),
        })
    }
}

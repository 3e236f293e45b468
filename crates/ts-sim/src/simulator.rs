//! The `CellSimulator` and its per-cell tick.
//!
//! # Tick state machine
//!
//! ```text
//! IDLE ─► LOCKING ─► LOADED ─► COMPUTED ─► COMMITTED
//!            │           └──────────┴─────► ABORTED (conflict: retry from LOADED)
//!            └─► lock fresh elsewhere: LockHeld, no effect
//! ```
//!
//! The lock is taken in its own short transaction so other workers can see
//! it while this one computes.  Everything after that (terrain generation,
//! interval cleanup, the behavior step, path planning, write-back and lock
//! release) is one transaction: it commits completely or not at all.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info, warn};

use ts_behavior::{BehaviorStep, CellState, TickContext};
use ts_core::{AgentId, CellId, Clock, Path, Timestamp, WorldConfig, cell_of};
use ts_nav::Navigator;
use ts_occupancy::{OccupancyInterval, decompose_into_cell_intervals};
use ts_store::{
    AgentDoc, CellLock, ObjectDoc, Query, ResourceDoc, Store, Transaction, TransactionExt,
};
use ts_terrain::{TerrainGenerator, TerrainTileRecord};

use crate::{SimError, SimResult, TickObserver, TickOutcome, TickReport};

enum Acquire {
    Acquired(String),
    Held(CellLock),
}

/// Runs cell ticks against a shared store.
///
/// One simulator is shared by every worker thread; all methods take `&self`.
/// Create via [`CellSimulatorBuilder`][crate::CellSimulatorBuilder].
pub struct CellSimulator<S: Store, B: BehaviorStep, N: Navigator> {
    pub(crate) config:    WorldConfig,
    pub(crate) store:     S,
    pub(crate) behavior:  B,
    pub(crate) navigator: N,
    pub(crate) terrain:   TerrainGenerator,
    pub(crate) clock:     Arc<dyn Clock>,
    pub(crate) observer:  Arc<dyn TickObserver>,
    pub(crate) worker:    String,
    pub(crate) instance:  u64,
    pub(crate) next_lock: AtomicU64,
}

impl<S: Store, B: BehaviorStep, N: Navigator> CellSimulator<S, B, N> {
    // ── Public API ────────────────────────────────────────────────────────

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    /// Simulate `cell` for the configured tick duration.
    pub fn tick(&self, cell: CellId) -> SimResult<TickOutcome> {
        self.run_cell_tick(cell, self.config.scheduler.tick_duration_ms)
    }

    /// Simulate `cell` over `[now, now + duration_ms)`.
    ///
    /// Returns [`TickOutcome::LockHeld`] if another worker owns the cell.
    /// Any failure, after internal retries, is reported as
    /// [`SimError::RetryLater`]; nothing from the failed attempt persists.
    pub fn run_cell_tick(&self, cell: CellId, duration_ms: i64) -> SimResult<TickOutcome> {
        let now = self.clock.now();
        self.observer.on_tick_start(cell, now);

        match self.try_tick(cell, now, duration_ms) {
            Ok(outcome) => {
                self.observer.on_tick_end(cell, &outcome);
                Ok(outcome)
            }
            Err(e) => {
                warn!(%cell, error = %e, "cell tick abandoned");
                self.observer.on_tick_failed(cell, &e);
                Err(SimError::RetryLater { cell })
            }
        }
    }

    // ── LOCKING ───────────────────────────────────────────────────────────

    fn try_tick(&self, cell: CellId, now: Timestamp, duration_ms: i64) -> SimResult<TickOutcome> {
        let token = match self.acquire(cell, now)? {
            Acquire::Held(lock) => {
                return Ok(TickOutcome::LockHeld { cell, holder: lock.holder });
            }
            Acquire::Acquired(token) => token,
        };

        match self.commit_with_retry(cell, now, duration_ms, &token) {
            Ok(report) => {
                info!(
                    %cell,
                    agents    = report.agents,
                    rerouted  = report.rerouted,
                    intervals = report.intervals_written,
                    resources = report.resources_written,
                    attempts  = report.attempts,
                    "cell tick committed"
                );
                Ok(TickOutcome::Committed(report))
            }
            Err(e) => {
                self.release(cell, &token);
                Err(e)
            }
        }
    }

    fn acquire(&self, cell: CellId, now: Timestamp) -> SimResult<Acquire> {
        let stale_after = self.config.scheduler.lock_stale_after_ms;
        let token = self.lock_token();

        for attempt in 1..=self.config.scheduler.max_attempts {
            let mut tx = self.store.begin()?;
            if let Some(lock) = tx.get::<CellLock>(&cell.key())? {
                if lock.is_fresh(now, stale_after) {
                    debug!(%cell, holder = %lock.holder, "cell lock held");
                    return Ok(Acquire::Held(lock));
                }
                warn!(
                    %cell,
                    holder = %lock.holder,
                    age_ms = now.millis_since(lock.acquired_at),
                    "taking over stale cell lock"
                );
            }
            tx.put(&CellLock { cell, holder: token.clone(), acquired_at: now })?;
            match tx.commit() {
                Ok(()) => {
                    debug!(%cell, %token, "cell lock acquired");
                    return Ok(Acquire::Acquired(token));
                }
                Err(e) if e.is_conflict() => {
                    debug!(%cell, attempt, "lock acquisition conflicted");
                    self.observer.on_conflict(cell, attempt);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(SimError::RetryLater { cell })
    }

    /// `"{worker}-{instance}#{n}"`: unique per acquisition across simulators.
    fn lock_token(&self) -> String {
        let n = self.next_lock.fetch_add(1, Ordering::Relaxed);
        format!("{}-{:016x}#{}", self.worker, self.instance, n)
    }

    /// Best-effort release after a failed tick.  A lock that cannot be
    /// removed goes stale after `lock_stale_after_ms`.
    fn release(&self, cell: CellId, token: &str) {
        let released = (|| -> SimResult<()> {
            let mut tx = self.store.begin()?;
            let ours = tx.get::<CellLock>(&cell.key())?.is_some_and(|l| l.holder == token);
            if ours {
                tx.delete::<CellLock>(&cell.key())?;
                tx.commit()?;
            }
            Ok(())
        })();
        if let Err(e) = released {
            warn!(%cell, error = %e, "could not release cell lock");
        }
    }

    // ── LOADED → COMPUTED → COMMITTED ─────────────────────────────────────

    fn commit_with_retry(
        &self,
        cell:        CellId,
        now:         Timestamp,
        duration_ms: i64,
        token:       &str,
    ) -> SimResult<TickReport> {
        let max_attempts = self.config.scheduler.max_attempts;
        let mut attempt = 1;
        loop {
            match self.attempt(cell, now, duration_ms, token) {
                Ok(mut report) => {
                    report.attempts = attempt;
                    return Ok(report);
                }
                Err(e) if e.is_conflict() => {
                    self.observer.on_conflict(cell, attempt);
                    if attempt >= max_attempts {
                        return Err(e);
                    }
                    debug!(%cell, attempt, "tick conflicted; retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn attempt(&self, cell: CellId, now: Timestamp, duration_ms: i64, token: &str) -> SimResult<TickReport> {
        let cell_size = self.config.cell_size;
        let ctx = TickContext::new(self.config.world_seed, cell, now, duration_ms, cell_size);
        let tick_end = ctx.tick_end();
        let mut report = TickReport::new(cell, now, tick_end);

        let mut tx = self.store.begin()?;

        match tx.get::<CellLock>(&cell.key())? {
            Some(lock) if lock.holder == token => {}
            _ => return Err(SimError::LockLost { cell }),
        }

        report.tiles_generated = self.ensure_terrain(tx.as_mut(), cell, now)?;

        // ── Load ──────────────────────────────────────────────────────────
        let here = Query::InCell(cell);
        let agents: Vec<AgentDoc> = tx.query(&here)?;
        let objects: Vec<ObjectDoc> = tx.query(&here)?;
        let stored_resources: Vec<ResourceDoc> = tx.query(&here)?;

        let intervals: Vec<OccupancyInterval> = tx.query(&here)?;
        let stale: Vec<&OccupancyInterval> = intervals.iter().filter(|iv| iv.is_stale(now)).collect();
        for iv in &stale {
            tx.delete::<OccupancyInterval>(&iv.key())?;
        }
        report.intervals_removed = stale.len();

        let during = Query::InCellDuring { cell, from: now, to: tick_end };
        let mut passing: Vec<OccupancyInterval> = tx.query(&during)?;
        passing.retain(|iv| !iv.expired);

        let mut resources = stored_resources.clone();
        for r in &mut resources {
            if r.node.respawn_if_due(now) {
                report.respawned += 1;
            }
        }

        report.agents = agents.len();
        report.objects = objects.len();
        report.resources = resources.len();

        let loaded = CellState { cell, agents, objects, resources, passing };
        let stored_agents: BTreeMap<AgentId, AgentDoc> =
            loaded.agents.iter().map(|a| (a.id, a.clone())).collect();
        let stored_objects = loaded.objects.clone();

        // ── Compute ───────────────────────────────────────────────────────
        let mut next = self.behavior.step(loaded, &ctx)?;

        for agent in &mut next.agents {
            let mut routed = false;
            if let Some(destination) = agent.destination.take() {
                if let Some(origin) = agent.location_at(now) {
                    let path = self.navigator.plan(origin, destination, now)?;
                    report.intervals_written += self.replace_intervals(tx.as_mut(), agent.id, &path, now)?;
                    agent.path = path;
                    report.rerouted += 1;
                    routed = true;
                }
            }
            if !routed {
                report.intervals_written += self.ensure_indexed(tx.as_mut(), agent, now)?;
            }
            if let Some(p) = agent.location_at(tick_end) {
                agent.cell = cell_of(p, cell_size);
            }
        }

        // ── Commit ────────────────────────────────────────────────────────
        for agent in &next.agents {
            if stored_agents.get(&agent.id) != Some(agent) {
                tx.put(agent)?;
                report.agents_written += 1;
            }
        }

        for object in &next.objects {
            if !stored_objects.contains(object) {
                tx.put(object)?;
                report.objects_written += 1;
            }
        }
        for gone in stored_objects.iter().filter(|o| next.objects.iter().all(|n| n.id != o.id)) {
            tx.delete::<ObjectDoc>(&gone.id.key())?;
            report.objects_deleted += 1;
        }

        for resource in &next.resources {
            if !stored_resources.contains(resource) {
                tx.put(resource)?;
                report.resources_written += 1;
            }
        }

        tx.delete::<CellLock>(&cell.key())?;
        tx.commit()?;
        Ok(report)
    }

    /// Generate every terrain tile under `cell` that has no marker yet.
    /// Resources and marker are written in the tick's transaction.
    fn ensure_terrain(&self, tx: &mut dyn Transaction, cell: CellId, now: Timestamp) -> SimResult<usize> {
        let cell_size = self.config.cell_size;
        let mut generated = 0;
        for tile in self.terrain.tiles_covering(cell.bounds(cell_size)) {
            if tx.get::<TerrainTileRecord>(&tile.key())?.is_some() {
                continue;
            }
            let nodes = self.terrain.generate(tile)?;
            for node in &nodes {
                tx.put(&ResourceDoc::new(node.clone(), cell_size))?;
            }
            tx.put(&TerrainTileRecord { tile, generated_at: now, resource_count: nodes.len() })?;
            debug!(%cell, %tile, resources = nodes.len(), "terrain tile staged");
            generated += 1;
        }
        Ok(generated)
    }

    /// Expire `agent`'s current intervals and write the new route's.
    ///
    /// The route departs after the planning lead time; the agent waits in
    /// its first cell until then, so the first interval starts at `now`.
    /// New keys overwrite old ones with the same sequence number; leftovers
    /// stay expired until their cell's next tick deletes them.
    fn replace_intervals(
        &self,
        tx:    &mut dyn Transaction,
        agent: AgentId,
        path:  &Path,
        now:   Timestamp,
    ) -> SimResult<usize> {
        let old: Vec<OccupancyInterval> = tx.query(&Query::OwnedBy(agent))?;
        for mut iv in old.into_iter().filter(|iv| !iv.expired) {
            iv.expired = true;
            tx.put(&iv)?;
        }
        let mut fresh = decompose_into_cell_intervals(agent, path, self.config.cell_size);
        if let Some(first) = fresh.first_mut() {
            first.start = first.start.min(now);
        }
        for iv in &fresh {
            tx.put(iv)?;
        }
        Ok(fresh.len())
    }

    /// Index an agent that has no live interval, such as one placed in the
    /// world without ever being routed.  Its current path is decomposed and
    /// the parts still current are written; a still agent gets one interval
    /// running to `FAR_FUTURE`.
    fn ensure_indexed(&self, tx: &mut dyn Transaction, agent: &AgentDoc, now: Timestamp) -> SimResult<usize> {
        let owned: Vec<OccupancyInterval> = tx.query(&Query::OwnedBy(agent.id))?;
        if owned.iter().any(|iv| !iv.is_stale(now)) {
            return Ok(0);
        }
        let fresh: Vec<OccupancyInterval> = decompose_into_cell_intervals(agent.id, &agent.path, self.config.cell_size)
            .into_iter()
            .filter(|iv| !iv.is_stale(now))
            .collect();
        for iv in &fresh {
            tx.put(iv)?;
        }
        debug!(agent = %agent.id, intervals = fresh.len(), "indexed unrouted agent");
        Ok(fresh.len())
    }
}

//! village — a small foraging town on the townsim core.
//!
//! Six villagers in three huts gather from procedurally generated terrain
//! and carry their haul home.  Each round ticks every populated cell plus
//! every cell a villager currently stands in, on Rayon's pool, then moves
//! the manual clock forward by one tick.
//!
//! Pass a JSON world config as the first argument to override the defaults.
//! `RUST_LOG=debug` shows per-tick detail.

mod village;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use anyhow::Result;
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ts_behavior::{BehaviorResult, BehaviorStep, CellState, TickContext};
use ts_core::{AgentId, CellId, ManualClock, ObjectId, Point, Rect, Timestamp, WorldConfig};
use ts_nav::{CostTable, DirectionMapNavigator};
use ts_sim::{CellSimulatorBuilder, RayonDispatcher, TickObserver, populated_cells};
use ts_store::{AgentDoc, MemoryStore, ObjectDoc, ObjectKind, Query, StoreExt};

use village::{MAP_HEIGHT, MAP_WIDTH};

// ── Constants ─────────────────────────────────────────────────────────────────

const ROUNDS:        u32 = 40;
const TICK_MS:       i64 = 5_000;
const START:         Timestamp = Timestamp(1_700_000_000_000);
const CARRY_LIMIT:   u32 = 3;
const REACH:         f64 = 60.0;

// ── Behavior ──────────────────────────────────────────────────────────────────

/// Gather from the nearest reachable resource in the cell until the load is
/// full, then walk home and drop it into the dwelling's stock.
struct Forager {
    bounds: Rect,
    homes:  BTreeMap<ObjectId, Point>,
}

impl Forager {
    fn act(&self, state: &mut CellState, id: AgentId, ctx: &TickContext) {
        let Some(agent) = state.agent(id) else { return };
        let Some(here) = agent.location_at(ctx.now) else { return };
        let load: u32 = agent.inventory.values().sum();
        let home = agent.home;

        if load < CARRY_LIMIT {
            let target = state
                .resources
                .iter()
                .filter(|r| !r.node.is_depleted() && self.bounds.contains(r.node.position))
                .min_by(|a, b| {
                    let (da, db) = (a.node.position.distance(here), b.node.position.distance(here));
                    da.total_cmp(&db).then(a.node.id.cmp(&b.node.id))
                })
                .map(|r| (r.node.id, r.node.kind, r.node.position));

            match target {
                Some((rid, kind, at)) if at.distance(here) <= REACH => {
                    let taken = state.resource_mut(rid).map_or(0, |r| r.node.deplete(1, ctx.now));
                    if let Some(agent) = state.agent_mut(id) {
                        *agent.inventory.entry(kind).or_insert(0) += taken;
                    }
                    return;
                }
                Some((_, _, at)) => {
                    if let Some(agent) = state.agent_mut(id) {
                        agent.travel_to(at);
                    }
                    return;
                }
                None if load == 0 => return,
                None => {}
            }
        }

        let Some((home, home_at)) = home.and_then(|h| self.homes.get(&h).map(|p| (h, *p))) else {
            return;
        };
        if home_at.distance(here) > REACH {
            if let Some(agent) = state.agent_mut(id) {
                agent.travel_to(home_at);
            }
            return;
        }
        // Unloading needs the dwelling in this cell's state.
        let Some(haul) = state.agent_mut(id).map(|a| std::mem::take(&mut a.inventory)) else { return };
        match state.object_mut(home) {
            Some(dwelling) => {
                for (kind, n) in haul {
                    *dwelling.stock.entry(kind).or_insert(0) += n;
                }
            }
            None => {
                if let Some(agent) = state.agent_mut(id) {
                    agent.inventory = haul;
                }
            }
        }
    }
}

impl BehaviorStep for Forager {
    fn step(&self, mut state: CellState, ctx: &TickContext) -> BehaviorResult<CellState> {
        let idle: Vec<AgentId> = state.agents.iter().filter(|a| a.is_idle(ctx.now)).map(|a| a.id).collect();
        for id in idle {
            self.act(&mut state, id, ctx);
        }
        Ok(state)
    }
}

// ── Observer ──────────────────────────────────────────────────────────────────

#[derive(Default)]
struct ConflictCounter {
    conflicts: AtomicUsize,
    failures:  AtomicUsize,
}

impl TickObserver for ConflictCounter {
    fn on_conflict(&self, _cell: CellId, _attempt: u32) {
        self.conflicts.fetch_add(1, Ordering::Relaxed);
    }

    fn on_tick_failed(&self, _cell: CellId, _error: &ts_sim::SimError) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).compact().init();
}

fn main() -> Result<()> {
    init_tracing();

    let mut config = match std::env::args().nth(1) {
        Some(path) => WorldConfig::load_json(Path::new(&path))?,
        None => WorldConfig::default(),
    };
    config.scheduler.tick_duration_ms = TICK_MS;

    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(START));
    let village = village::populate(&*store, &config, START)?;
    println!("{}", village.map);

    let unit = config.nav.tile_unit;
    let bounds = Rect::from_origin(config.nav.origin, MAP_WIDTH as f64 * unit, MAP_HEIGHT as f64 * unit);
    let forager = Forager { bounds, homes: village.homes.clone() };
    let navigator = DirectionMapNavigator::new(village.map, CostTable::standard(), config.nav.clone());
    let observer = Arc::new(ConflictCounter::default());

    let sim = CellSimulatorBuilder::new(config, Arc::clone(&store), forager, navigator)
        .clock(clock.clone())
        .observer(observer.clone())
        .worker_id("village")
        .build()?;

    let wall = Instant::now();
    let mut committed = 0;
    let mut lock_held = 0;
    for round in 1..=ROUNDS {
        let mut cells = populated_cells(&*store)?;
        let agents: Vec<AgentDoc> = store.snapshot(&Query::All)?;
        cells.extend(agents.iter().map(|a| a.cell));
        cells.sort_unstable();
        cells.dedup();

        let report = sim.tick_cells(&cells, &RayonDispatcher);
        committed += report.committed;
        lock_held += report.lock_held;
        if !report.failed.is_empty() {
            info!(round, failed = ?report.failed, "cells to retry next round");
        }
        clock.advance(TICK_MS);
    }

    let objects: Vec<ObjectDoc> = store.snapshot(&Query::All)?;
    let stock: BTreeMap<String, _> = objects
        .iter()
        .filter(|o| o.kind == ObjectKind::Dwelling)
        .map(|o| (o.id.to_string(), o.stock.clone()))
        .collect();
    let agents: Vec<AgentDoc> = store.snapshot(&Query::All)?;
    let carrying: BTreeMap<String, _> = agents.iter().map(|a| (a.name.clone(), a.inventory.clone())).collect();
    let (cache_hits, cache_misses) = sim.navigator().cache().stats();
    let stats = store.stats();

    let summary = json!({
        "rounds":        ROUNDS,
        "tick_ms":       TICK_MS,
        "cell_ticks":    committed,
        "lock_held":     lock_held,
        "conflicts":     observer.conflicts.load(Ordering::Relaxed),
        "failures":      observer.failures.load(Ordering::Relaxed),
        "dwelling_stock": stock,
        "carrying":      carrying,
        "store": {
            "commits":   stats.commits,
            "conflicts": stats.conflicts,
            "documents": stats.documents,
        },
        "direction_maps": { "hits": cache_hits, "misses": cache_misses },
        "wall_ms":       wall.elapsed().as_millis() as u64,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

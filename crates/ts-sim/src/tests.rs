//! Integration tests for ts-sim.

use std::sync::Arc;

use ts_behavior::{BehaviorResult, BehaviorStep, CellState, NoopBehavior, TickContext};
use ts_core::{AgentId, CellId, ManualClock, ObjectId, Point, Timestamp, WorldConfig};
use ts_nav::StraightLineNavigator;
use ts_store::{AgentDoc, MemoryStore, ObjectDoc, ObjectKind, StoreExt};

use crate::{CellSimulator, CellSimulatorBuilder};

// ── Helpers ───────────────────────────────────────────────────────────────────

const T0: Timestamp = Timestamp(1_000_000);
const HOME: CellId = CellId::new(0, 0);

type TestSim<B> = CellSimulator<Arc<MemoryStore>, B, StraightLineNavigator>;

struct Harness {
    store: Arc<MemoryStore>,
    clock: Arc<ManualClock>,
}

fn harness() -> Harness {
    Harness { store: Arc::new(MemoryStore::new()), clock: Arc::new(ManualClock::new(T0)) }
}

fn build<B: BehaviorStep>(h: &Harness, behavior: B) -> TestSim<B> {
    let config = WorldConfig::default();
    let nav = StraightLineNavigator { config: config.nav.clone() };
    CellSimulatorBuilder::new(config, Arc::clone(&h.store), behavior, nav)
        .clock(h.clock.clone())
        .worker_id("test")
        .build()
        .unwrap()
}

/// Pins down closure signatures for use as a behavior.
fn step<F>(f: F) -> F
where
    F: Fn(CellState, &TickContext) -> BehaviorResult<CellState> + Send + Sync,
{
    f
}

/// A dwelling at the origin with one resident standing next to it.
fn seed_village(store: &MemoryStore) {
    let mut hut = ObjectDoc::new(ObjectId(1), ObjectKind::Dwelling, Point::new(0.0, 0.0), 1000.0);
    hut.residents.push(AgentId(1));
    store.insert(&hut).unwrap();

    let mut ada = AgentDoc::new(AgentId(1), "Ada", Point::new(0.0, 0.0), T0, 1000.0);
    ada.home = Some(ObjectId(1));
    store.insert(&ada).unwrap();
}

fn agent(store: &MemoryStore, id: u64) -> AgentDoc {
    store.read(&AgentId(id).key()).unwrap().unwrap()
}

// ── Builder ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod builder {
    use super::*;
    use crate::SimError;

    #[test]
    fn builds_with_defaults() {
        let h = harness();
        let sim = build(&h, NoopBehavior);
        assert_eq!(sim.config().cell_size, 1000.0);
    }

    #[test]
    fn invalid_config_rejected() {
        let h = harness();
        let mut config = WorldConfig::default();
        config.cell_size = 0.0;
        let nav = StraightLineNavigator { config: config.nav.clone() };
        let result = CellSimulatorBuilder::new(config, Arc::clone(&h.store), NoopBehavior, nav).build();
        assert!(matches!(result, Err(SimError::Config(_))));
    }
}

// ── Locking ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod locking {
    use std::sync::mpsc;
    use std::sync::Mutex;
    use std::thread;

    use ts_store::{CellLock, Collection};

    use super::*;
    use crate::{SimError, TickOutcome};

    /// Leaves the worker id at its default.
    fn build_unnamed<B: BehaviorStep>(h: &Harness, behavior: B) -> TestSim<B> {
        let config = WorldConfig::default();
        let nav = StraightLineNavigator { config: config.nav.clone() };
        CellSimulatorBuilder::new(config, Arc::clone(&h.store), behavior, nav)
            .clock(h.clock.clone())
            .build()
            .unwrap()
    }

    #[test]
    fn commit_releases_lock() {
        let h = harness();
        seed_village(&h.store);
        let sim = build(&h, NoopBehavior);
        let outcome = sim.tick(HOME).unwrap();
        assert!(outcome.is_committed());
        assert_eq!(outcome.cell(), HOME);
        assert_eq!(h.store.len(Collection::Locks), 0);
    }

    #[test]
    fn fresh_lock_skips_without_effect() {
        let h = harness();
        seed_village(&h.store);
        h.store
            .insert(&CellLock { cell: HOME, holder: "other#0".into(), acquired_at: T0 })
            .unwrap();
        let sim = build(&h, NoopBehavior);

        let outcome = sim.tick(HOME).unwrap();
        assert_eq!(outcome, TickOutcome::LockHeld { cell: HOME, holder: "other#0".into() });
        assert_eq!(h.store.len(Collection::TerrainTiles), 0);
        assert_eq!(h.store.len(Collection::Locks), 1);
    }

    #[test]
    fn stale_lock_is_taken_over() {
        let h = harness();
        seed_village(&h.store);
        let stale = WorldConfig::default().scheduler.lock_stale_after_ms;
        h.store
            .insert(&CellLock { cell: HOME, holder: "crashed#0".into(), acquired_at: T0 + -stale })
            .unwrap();
        let sim = build(&h, NoopBehavior);

        assert!(sim.tick(HOME).unwrap().is_committed());
        assert_eq!(h.store.len(Collection::Locks), 0);
    }

    #[test]
    fn concurrent_tick_on_same_cell_is_skipped() {
        let h = harness();
        seed_village(&h.store);

        let (entered_tx, entered_rx) = mpsc::channel::<()>();
        let (go_tx, go_rx) = mpsc::channel::<()>();
        let go_rx = Mutex::new(go_rx);
        let sim = build(&h, step(move |s, _ctx| {
            entered_tx.send(()).unwrap();
            go_rx.lock().unwrap().recv().unwrap();
            Ok(s)
        }));

        thread::scope(|scope| {
            let first = scope.spawn(|| sim.tick(HOME));
            entered_rx.recv().unwrap();

            let commits_before = h.store.stats().commits;
            let second = sim.tick(HOME);
            let commits_after = h.store.stats().commits;
            go_tx.send(()).unwrap();

            let second = second.unwrap();
            assert!(matches!(second, TickOutcome::LockHeld { cell, .. } if cell == HOME));
            assert_eq!(commits_before, commits_after);
            assert!(first.join().unwrap().unwrap().is_committed());
        });
        assert_eq!(h.store.len(Collection::Locks), 0);
    }

    #[test]
    fn taken_over_lock_is_not_mistaken_for_own() {
        let h = harness();
        seed_village(&h.store);
        let stale = WorldConfig::default().scheduler.lock_stale_after_ms;

        let (go_tx, go_rx) = mpsc::channel::<()>();
        let (inside_tx, inside_rx) = mpsc::channel::<()>();
        let (done_tx, done_rx) = mpsc::channel::<()>();
        let inside_rx = Mutex::new(inside_rx);
        let done_rx = Mutex::new(done_rx);

        // The first worker stalls until its lock has gone stale and a second
        // worker with the same id has taken the cell over.
        let clock = h.clock.clone();
        let slow = build_unnamed(&h, step(move |s, _ctx| {
            clock.advance(stale);
            go_tx.send(()).unwrap();
            inside_rx.lock().unwrap().recv().unwrap();
            Ok(s)
        }));
        let rescuer = build_unnamed(&h, step(move |s, _ctx| {
            inside_tx.send(()).unwrap();
            done_rx.lock().unwrap().recv().unwrap();
            Ok(s)
        }));

        thread::scope(|scope| {
            let first = scope.spawn(|| slow.tick(HOME));
            let second = scope.spawn(move || {
                go_rx.recv().unwrap();
                rescuer.tick(HOME)
            });

            let first = first.join().unwrap();
            assert!(matches!(first, Err(SimError::RetryLater { cell }) if cell == HOME));
            let lock: CellLock = h.store.read(&HOME.key()).unwrap().unwrap();
            assert_eq!(lock.acquired_at, T0 + stale);
            assert!(lock.holder.starts_with("worker-"));

            done_tx.send(()).unwrap();
            assert!(second.join().unwrap().unwrap().is_committed());
        });
        assert_eq!(h.store.len(Collection::Locks), 0);
    }
}

// ── Load / compute / commit ───────────────────────────────────────────────────

#[cfg(test)]
mod tick {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use ts_core::{Rect, ResourceId, ResourceKind};
    use ts_occupancy::{OccupancyInterval, is_contiguous};
    use ts_store::{Collection, Query, ResourceDoc};
    use ts_terrain::{ResourceNode, TerrainTileId};

    use super::*;

    fn send_idle_to(target: Point) -> impl BehaviorStep {
        step(move |mut s, ctx| {
            for a in &mut s.agents {
                if a.is_idle(ctx.now) && a.location_at(ctx.now) != Some(target) {
                    a.travel_to(target);
                }
            }
            Ok(s)
        })
    }

    #[test]
    fn first_tick_generates_terrain_once() {
        let h = harness();
        seed_village(&h.store);
        let sim = build(&h, NoopBehavior);

        let first = sim.tick(HOME).unwrap();
        // Cell (0,0) spans [-500, 500]² and touches four 2000-unit tiles.
        assert_eq!(first.report().unwrap().tiles_generated, 4);
        assert_eq!(h.store.len(Collection::TerrainTiles), 4);
        assert!(h.store.len(Collection::Resources) > 0);

        let again = sim.tick(HOME).unwrap();
        assert_eq!(again.report().unwrap().tiles_generated, 0);

        // Cell (1,0) lies under tiles already generated for (0,0).
        let neighbour = sim.tick(CellId::new(1, 0)).unwrap();
        assert_eq!(neighbour.report().unwrap().tiles_generated, 0);
    }

    #[test]
    fn new_destination_plans_path_and_intervals() {
        let h = harness();
        seed_village(&h.store);
        let sim = build(&h, send_idle_to(Point::new(2500.0, 0.0)));

        let report = sim.tick(HOME).unwrap().report().cloned().unwrap();
        assert_eq!(report.rerouted, 1);
        assert_eq!(report.intervals_written, 3);
        assert_eq!(report.agents_written, 1);

        let ada = agent(&h.store, 1);
        assert!(ada.destination.is_none());
        assert_eq!(ada.path.len(), 2);
        assert_eq!(ada.path.arrival(), Some(T0 + 26_000));
        // Departure is after the tick ends, so she is still indexed at home.
        assert_eq!(ada.cell, HOME);

        let ivs: Vec<OccupancyInterval> = h.store.snapshot(&Query::OwnedBy(AgentId(1))).unwrap();
        assert!(is_contiguous(&ivs));
        let cells: Vec<CellId> = ivs.iter().map(|iv| iv.cell).collect();
        assert_eq!(cells, vec![CellId::new(0, 0), CellId::new(1, 0), CellId::new(2, 0)]);
        // She waits at home through the planning lead, and stays indexed there.
        assert_eq!(ivs[0].start, T0);
        assert!(ivs[2].end.is_far_future());
        let waiting = Query::InCellDuring { cell: HOME, from: T0, to: T0 + 500 };
        let at_home: Vec<OccupancyInterval> = h.store.snapshot(&waiting).unwrap();
        assert_eq!(at_home.iter().map(|iv| iv.agent).collect::<Vec<_>>(), vec![AgentId(1)]);
    }

    #[test]
    fn still_agent_is_indexed_where_it_stands() {
        let h = harness();
        seed_village(&h.store);
        let sim = build(&h, NoopBehavior);

        let report = sim.tick(HOME).unwrap().report().cloned().unwrap();
        assert_eq!(report.intervals_written, 1);
        let ivs: Vec<OccupancyInterval> = h.store.snapshot(&Query::InCell(HOME)).unwrap();
        assert_eq!(ivs.len(), 1);
        assert_eq!((ivs[0].agent, ivs[0].seq), (AgentId(1), 0));
        assert_eq!(ivs[0].start, T0);
        assert!(ivs[0].end.is_far_future());

        h.clock.advance(5_000);
        assert_eq!(sim.tick(HOME).unwrap().report().unwrap().intervals_written, 0);
        assert_eq!(h.store.len(Collection::Intervals), 1);
    }

    #[test]
    fn passing_holds_only_intervals_during_the_tick() {
        let h = harness();
        seed_village(&h.store);
        let visit = |agent: u64, start: Timestamp, end: Timestamp| OccupancyInterval {
            agent: AgentId(agent),
            seq: 0,
            cell: HOME,
            start,
            end,
            expired: false,
        };
        h.store.insert(&visit(8, T0 + -100, T0 + 500)).unwrap();
        h.store.insert(&visit(9, T0 + 36_000_000, Timestamp::FAR_FUTURE)).unwrap();
        h.store.insert(&OccupancyInterval { expired: true, ..visit(10, T0, T0 + 900) }).unwrap();

        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen_in_step = Arc::clone(&seen);
        let sim = build(&h, step(move |s, _ctx| {
            seen_in_step.lock().unwrap().extend(s.visitors());
            Ok(s)
        }));

        let report = sim.tick(HOME).unwrap().report().cloned().unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![AgentId(8)]);
        // The later arrival stays in the index; the expired entry is removed.
        assert_eq!(report.intervals_removed, 1);
        assert!(h.store.read::<OccupancyInterval>("agent-9/0").unwrap().is_some());
    }

    #[test]
    fn agent_is_reindexed_where_the_tick_ends() {
        let h = harness();
        seed_village(&h.store);
        let sent = AtomicUsize::new(0);
        let sim = build(&h, step(move |mut s, _ctx| {
            if sent.fetch_add(1, Ordering::SeqCst) == 0 {
                for a in &mut s.agents {
                    a.travel_to(Point::new(2500.0, 0.0));
                }
            }
            Ok(s)
        }));

        sim.tick(HOME).unwrap();
        h.clock.advance(30_000);
        let report = sim.tick(HOME).unwrap().report().cloned().unwrap();
        assert_eq!(report.agents_written, 1);

        assert_eq!(agent(&h.store, 1).cell, CellId::new(2, 0));
        let home: Vec<AgentDoc> = h.store.snapshot(&Query::InCell(HOME)).unwrap();
        assert!(home.is_empty());
    }

    #[test]
    fn reroute_expires_leftover_intervals() {
        let h = harness();
        seed_village(&h.store);
        let calls = AtomicUsize::new(0);
        let sim = build(&h, step(move |mut s, _ctx| {
            let target = match calls.fetch_add(1, Ordering::SeqCst) {
                0 => Some(Point::new(4500.0, 0.0)),
                1 => Some(Point::new(0.0, 1400.0)),
                _ => None,
            };
            if let Some(t) = target {
                for a in &mut s.agents {
                    a.travel_to(t);
                }
            }
            Ok(s)
        }));

        assert_eq!(sim.tick(HOME).unwrap().report().unwrap().intervals_written, 5);
        h.clock.advance(1_000);
        assert_eq!(sim.tick(HOME).unwrap().report().unwrap().intervals_written, 2);

        let ivs: Vec<OccupancyInterval> = h.store.snapshot(&Query::OwnedBy(AgentId(1))).unwrap();
        let state: Vec<(u32, bool)> = ivs.iter().map(|iv| (iv.seq, iv.expired)).collect();
        assert_eq!(state, vec![(0, false), (1, false), (2, true), (3, true), (4, true)]);
        assert_eq!(ivs[1].cell, CellId::new(0, 1));

        // The expired interval in (3,0) is cleaned up by that cell's tick.
        let cleanup = sim.tick(CellId::new(3, 0)).unwrap().report().cloned().unwrap();
        assert_eq!(cleanup.intervals_removed, 1);
        assert_eq!(h.store.len(Collection::Intervals), 4);
    }

    #[test]
    fn wide_objects_load_in_every_cell_they_cover() {
        let h = harness();
        let yard = ObjectDoc::new(ObjectId(9), ObjectKind::Stockpile, Point::new(450.0, 0.0), 1000.0)
            .with_footprint(Rect::new(Point::new(300.0, -100.0), Point::new(700.0, 100.0)), 1000.0);
        h.store.insert(&yard).unwrap();
        let sim = build(&h, NoopBehavior);
        for cell in [HOME, CellId::new(1, 0)] {
            assert_eq!(sim.tick(cell).unwrap().report().unwrap().objects, 1);
        }
        assert_eq!(sim.tick(CellId::new(2, 0)).unwrap().report().unwrap().objects, 0);
    }

    #[test]
    fn ended_intervals_are_deleted() {
        let h = harness();
        seed_village(&h.store);
        h.store
            .insert(&OccupancyInterval {
                agent:   AgentId(99),
                seq:     0,
                cell:    HOME,
                start:   T0 + -5_000,
                end:     T0 + -1_000,
                expired: false,
            })
            .unwrap();
        let sim = build(&h, NoopBehavior);
        let report = sim.tick(HOME).unwrap().report().cloned().unwrap();
        assert_eq!(report.intervals_removed, 1);
        let left: Vec<OccupancyInterval> = h.store.snapshot(&Query::All).unwrap();
        assert_eq!(left.iter().map(|iv| iv.agent).collect::<Vec<_>>(), vec![AgentId(1)]);
    }

    fn spring(remaining: u32, respawn_at: Option<Timestamp>) -> ResourceDoc {
        let node = ResourceNode {
            id:         ResourceId(7),
            kind:       ResourceKind::BerryBush,
            tile:       TerrainTileId::new(0, 0),
            position:   Point::new(10.0, 10.0),
            capacity:   3,
            remaining,
            respawn_ms: 500,
            respawn_at,
        };
        ResourceDoc::new(node, 1000.0)
    }

    #[test]
    fn due_resources_respawn_before_the_step() {
        let h = harness();
        seed_village(&h.store);
        h.store.insert(&spring(0, Some(T0 + -1))).unwrap();

        let seen = Arc::new(AtomicUsize::new(usize::MAX));
        let seen_in_step = Arc::clone(&seen);
        let sim = build(&h, step(move |s, _ctx| {
            if let Some(r) = s.resources.iter().find(|r| r.node.id == ResourceId(7)) {
                seen_in_step.store(r.node.remaining as usize, Ordering::SeqCst);
            }
            Ok(s)
        }));

        let report = sim.tick(HOME).unwrap().report().cloned().unwrap();
        assert_eq!(report.respawned, 1);
        assert_eq!(report.resources_written, 1);
        assert_eq!(seen.load(Ordering::SeqCst), 3);

        let stored: ResourceDoc = h.store.read("resource-7").unwrap().unwrap();
        assert_eq!(stored.node.remaining, 3);
        assert!(stored.node.respawn_at.is_none());
    }

    #[test]
    fn harvest_is_persisted_with_the_agent() {
        let h = harness();
        seed_village(&h.store);
        h.store.insert(&spring(1, None)).unwrap();
        let sim = build(&h, step(|mut s, ctx| {
            let taken = match s.resource_mut(ResourceId(7)) {
                Some(r) => r.node.deplete(2, ctx.now),
                None => 0,
            };
            if let Some(a) = s.agent_mut(AgentId(1)) {
                *a.inventory.entry(ResourceKind::BerryBush).or_insert(0) += taken;
            }
            Ok(s)
        }));

        let report = sim.tick(HOME).unwrap().report().cloned().unwrap();
        assert_eq!(report.resources_written, 1);
        assert_eq!(agent(&h.store, 1).carried(ResourceKind::BerryBush), 1);

        let stored: ResourceDoc = h.store.read("resource-7").unwrap().unwrap();
        assert!(stored.node.is_depleted());
        assert_eq!(stored.node.respawn_at, Some(T0 + 500));
    }

    #[test]
    fn removed_objects_are_deleted() {
        let h = harness();
        seed_village(&h.store);
        h.store
            .insert(&ObjectDoc::new(ObjectId(5), ObjectKind::DroppedItem, Point::new(20.0, 20.0), 1000.0))
            .unwrap();
        let sim = build(&h, step(|mut s, _ctx| {
            s.objects.retain(|o| o.kind != ObjectKind::DroppedItem);
            Ok(s)
        }));

        let report = sim.tick(HOME).unwrap().report().cloned().unwrap();
        assert_eq!(report.objects, 2);
        assert_eq!(report.objects_deleted, 1);
        assert_eq!(report.objects_written, 0);
        assert!(h.store.read::<ObjectDoc>("object-5").unwrap().is_none());
        assert!(h.store.read::<ObjectDoc>("object-1").unwrap().is_some());
    }
}

// ── Failures and retries ──────────────────────────────────────────────────────

#[cfg(test)]
mod retries {
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

    use ts_behavior::BehaviorError;
    use ts_store::Collection;

    use super::*;
    use crate::{SimError, TickObserver};

    #[derive(Default)]
    struct Counting {
        conflicts: AtomicUsize,
        failed:    AtomicUsize,
    }

    impl TickObserver for Counting {
        fn on_conflict(&self, _cell: CellId, _attempt: u32) {
            self.conflicts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_tick_failed(&self, _cell: CellId, _error: &SimError) {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn build_observed<B: BehaviorStep>(h: &Harness, behavior: B, observer: Arc<Counting>) -> TestSim<B> {
        let config = WorldConfig::default();
        let nav = StraightLineNavigator { config: config.nav.clone() };
        CellSimulatorBuilder::new(config, Arc::clone(&h.store), behavior, nav)
            .clock(h.clock.clone())
            .observer(observer)
            .build()
            .unwrap()
    }

    #[test]
    fn conflict_reruns_the_whole_tick() {
        let h = harness();
        seed_village(&h.store);
        let observer = Arc::new(Counting::default());
        let store = Arc::clone(&h.store);
        let interfered = AtomicUsize::new(0);
        let sim = build_observed(&h, step(move |s, _ctx| {
            if interfered.fetch_add(1, Ordering::SeqCst) == 0 {
                // Another writer lands a new agent in this cell mid-tick.
                store.insert(&AgentDoc::new(AgentId(2), "Bo", Point::new(50.0, 0.0), T0, 1000.0)).unwrap();
            }
            Ok(s)
        }), observer.clone());

        let report = sim.tick(HOME).unwrap().report().cloned().unwrap();
        assert_eq!(report.attempts, 2);
        assert_eq!(report.agents, 2);
        assert_eq!(observer.conflicts.load(Ordering::SeqCst), 1);
        assert_eq!(h.store.len(Collection::TerrainTiles), 4);
        assert_eq!(h.store.len(Collection::Locks), 0);
    }

    #[test]
    fn exhausted_retries_surface_retry_later() {
        let h = harness();
        seed_village(&h.store);
        let observer = Arc::new(Counting::default());
        let store = Arc::clone(&h.store);
        let next_id = AtomicU64::new(100);
        let sim = build_observed(&h, step(move |s, _ctx| {
            let id = next_id.fetch_add(1, Ordering::SeqCst);
            store.insert(&AgentDoc::new(AgentId(id), "noise", Point::ORIGIN, T0, 1000.0)).unwrap();
            Ok(s)
        }), observer.clone());

        let err = sim.tick(HOME).unwrap_err();
        assert!(matches!(err, SimError::RetryLater { cell } if cell == HOME));
        let max = WorldConfig::default().scheduler.max_attempts as usize;
        assert_eq!(observer.conflicts.load(Ordering::SeqCst), max);
        assert_eq!(observer.failed.load(Ordering::SeqCst), 1);
        // Nothing from the failed tick persisted, and the cell is free again.
        assert_eq!(h.store.len(Collection::TerrainTiles), 0);
        assert_eq!(h.store.len(Collection::Locks), 0);
    }

    #[test]
    fn behavior_failure_aborts_and_unlocks() {
        let h = harness();
        seed_village(&h.store);
        let sim = build(&h, step(|s, _ctx| {
            Err(BehaviorError::Step { cell: s.cell, reason: "bad rules".into() })
        }));
        let before = agent(&h.store, 1);

        assert!(matches!(sim.tick(HOME), Err(SimError::RetryLater { .. })));
        assert_eq!(h.store.len(Collection::Locks), 0);
        assert_eq!(h.store.len(Collection::TerrainTiles), 0);
        assert_eq!(agent(&h.store, 1), before);
    }
}

// ── Fan-out ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod fan_out {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::{FanOutReport, InlineDispatcher, TickObserver, TickOutcome, populated_cells};

    fn dwelling(id: u64, kind: ObjectKind, x: f64, y: f64, residents: &[u64]) -> ObjectDoc {
        let mut o = ObjectDoc::new(ObjectId(id), kind, Point::new(x, y), 1000.0);
        o.residents = residents.iter().map(|&r| AgentId(r)).collect();
        o
    }

    fn seed_town(store: &MemoryStore) {
        store.insert(&dwelling(1, ObjectKind::Dwelling, 0.0, 0.0, &[1])).unwrap();
        store.insert(&dwelling(2, ObjectKind::Dwelling, 100.0, 0.0, &[2])).unwrap();
        store.insert(&dwelling(3, ObjectKind::Dwelling, 3000.0, 0.0, &[3])).unwrap();
        store.insert(&dwelling(4, ObjectKind::Dwelling, 5000.0, 5000.0, &[])).unwrap();
        store.insert(&dwelling(5, ObjectKind::Workshop, 7000.0, 7000.0, &[4])).unwrap();
    }

    #[test]
    fn populated_cells_are_sorted_and_unique() {
        let h = harness();
        seed_town(&h.store);
        assert_eq!(populated_cells(&*h.store).unwrap(), vec![CellId::new(0, 0), CellId::new(3, 0)]);
    }

    #[test]
    fn inline_fan_out_ticks_each_cell() {
        #[derive(Default)]
        struct Rounds {
            ends:   AtomicUsize,
            rounds: AtomicUsize,
        }
        impl TickObserver for Rounds {
            fn on_tick_end(&self, _cell: CellId, _outcome: &TickOutcome) {
                self.ends.fetch_add(1, Ordering::SeqCst);
            }
            fn on_fan_out_end(&self, _report: &FanOutReport) {
                self.rounds.fetch_add(1, Ordering::SeqCst);
            }
        }

        let h = harness();
        seed_town(&h.store);
        let observer = Arc::new(Rounds::default());
        let config = WorldConfig::default();
        let nav = StraightLineNavigator { config: config.nav.clone() };
        let sim = CellSimulatorBuilder::new(config, Arc::clone(&h.store), NoopBehavior, nav)
            .clock(h.clock.clone())
            .observer(observer.clone())
            .build()
            .unwrap();

        let report = sim.fan_out(&InlineDispatcher).unwrap();
        assert_eq!(report, FanOutReport { dispatched: 2, committed: 2, lock_held: 0, failed: vec![] });
        assert_eq!(observer.ends.load(Ordering::SeqCst), 2);
        assert_eq!(observer.rounds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn explicit_batch_includes_empty_cells() {
        let h = harness();
        seed_town(&h.store);
        let sim = build(&h, NoopBehavior);
        let cells = [CellId::new(0, 0), CellId::new(9, 9), CellId::new(0, 0)];
        let report = sim.tick_cells(&cells, &InlineDispatcher);
        // Sequential duplicates both commit: the lock is released in between.
        assert_eq!(report.dispatched, 3);
        assert_eq!(report.committed, 3);
        assert_eq!(h.store.len(ts_store::Collection::Locks), 0);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn rayon_fan_out_ticks_each_cell() {
        let h = harness();
        seed_town(&h.store);
        let sim = build(&h, NoopBehavior);
        let report = sim.fan_out(&crate::RayonDispatcher).unwrap();
        assert_eq!(report.committed, 2);
        assert!(report.failed.is_empty());
    }
}

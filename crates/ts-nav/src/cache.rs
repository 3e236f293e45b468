//! Shared cache of direction maps keyed by destination tile.
//!
//! The tile map is static between invalidations, so a direction map computed
//! for one agent heading to the well serves every other agent heading there.
//! The cache is `Sync` and is shared by all cell workers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info};

use crate::direction::{DirectionMap, compute_direction_map};
use crate::tile_map::{CostTable, TileCoord, TileMap};

#[cfg(feature = "fx-hash")]
type CacheMap<K, V> = rustc_hash::FxHashMap<K, V>;
#[cfg(not(feature = "fx-hash"))]
type CacheMap<K, V> = std::collections::HashMap<K, V>;

struct Inner {
    map:     Arc<TileMap>,
    entries: CacheMap<TileCoord, Arc<DirectionMap>>,
}

/// Memoizes [`compute_direction_map`] per destination.
pub struct DirectionMapCache {
    costs:  CostTable,
    inner:  RwLock<Inner>,
    hits:   AtomicU64,
    misses: AtomicU64,
}

impl DirectionMapCache {
    pub fn new(map: TileMap, costs: CostTable) -> Self {
        Self {
            costs,
            inner: RwLock::new(Inner { map: Arc::new(map), entries: CacheMap::default() }),
            hits:   AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// The direction map for `destination`, computing it on first use.
    ///
    /// Computation happens outside the lock; two workers racing on the same
    /// destination both compute and the first insert wins.
    pub fn get(&self, destination: TileCoord) -> Arc<DirectionMap> {
        let map = {
            let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(dm) = inner.entries.get(&destination) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Arc::clone(dm);
            }
            Arc::clone(&inner.map)
        };

        self.misses.fetch_add(1, Ordering::Relaxed);
        let computed = Arc::new(compute_direction_map(&map, &self.costs, destination));
        debug!(%destination, reachable = computed.has_destination(), "direction map computed");

        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if !Arc::ptr_eq(&inner.map, &map) {
            // The tile map was replaced while computing; don't cache a stale result.
            return computed;
        }
        Arc::clone(inner.entries.entry(destination).or_insert(computed))
    }

    /// Drop every cached map.
    pub fn invalidate(&self) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let dropped = inner.entries.len();
        inner.entries.clear();
        info!(dropped, "direction-map cache invalidated");
    }

    /// Install a new tile map and drop every cached map.
    pub fn replace_map(&self, map: TileMap) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let dropped = inner.entries.len();
        inner.map = Arc::new(map);
        inner.entries.clear();
        info!(dropped, "tile map replaced; direction-map cache invalidated");
    }

    /// The tile map currently in use.
    pub fn tile_map(&self) -> Arc<TileMap> {
        Arc::clone(&self.inner.read().unwrap_or_else(PoisonError::into_inner).map)
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(hits, misses)` since construction.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits.load(Ordering::Relaxed), self.misses.load(Ordering::Relaxed))
    }
}

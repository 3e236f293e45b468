//! In-process store: a mutex-guarded map of collections.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::txn::{Backend, OptimisticTx, TxLog, Versioned};
use crate::{Collection, Query, StoreResult, Store, Transaction};

#[derive(Default)]
struct Inner {
    docs:         BTreeMap<Collection, BTreeMap<String, Versioned>>,
    next_version: u64,
    commits:      u64,
    conflicts:    u64,
}

/// Commit counters, for tests and diagnostics.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub commits:   u64,
    pub conflicts: u64,
    pub documents: usize,
}

/// A [`Store`] held entirely in memory.
///
/// Reads take the lock briefly; commits hold it while validating and
/// applying, which serialises commits.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of documents in `collection`.
    pub fn len(&self, collection: Collection) -> usize {
        self.lock().docs.get(&collection).map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.lock().docs.values().all(BTreeMap::is_empty)
    }

    pub fn stats(&self) -> StoreStats {
        let inner = self.lock();
        StoreStats {
            commits:   inner.commits,
            conflicts: inner.conflicts,
            documents: inner.docs.values().map(BTreeMap::len).sum(),
        }
    }
}

fn scan_collection(
    docs:       &BTreeMap<Collection, BTreeMap<String, Versioned>>,
    collection: Collection,
    query:      &Query,
) -> Vec<(String, Versioned)> {
    docs.get(&collection)
        .map(|m| {
            m.iter()
                .filter(|(_, v)| query.matches(&v.doc.index))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        })
        .unwrap_or_default()
}

impl Backend for MemoryStore {
    fn read(&self, collection: Collection, key: &str) -> StoreResult<Option<Versioned>> {
        Ok(self.lock().docs.get(&collection).and_then(|m| m.get(key)).cloned())
    }

    fn scan(&self, collection: Collection, query: &Query) -> StoreResult<Vec<(String, Versioned)>> {
        Ok(scan_collection(&self.lock().docs, collection, query))
    }

    fn apply(&self, log: TxLog) -> StoreResult<()> {
        let mut inner = self.lock();

        let checked = {
            let docs = &inner.docs;
            log.validate(
                |c, k| Ok(docs.get(&c).and_then(|m| m.get(k)).map(|v| v.version)),
                |c, q| {
                    Ok(scan_collection(docs, c, q)
                        .into_iter()
                        .map(|(k, v)| (k, v.version))
                        .collect())
                },
            )
        };
        if let Err(e) = checked {
            inner.conflicts += 1;
            debug!(error = %e, "commit rejected");
            return Err(e);
        }

        let writes = log.writes.len();
        for ((collection, key), pending) in log.writes {
            inner.next_version += 1;
            let version = inner.next_version;
            let docs = inner.docs.entry(collection).or_default();
            match pending {
                Some(doc) => {
                    docs.insert(key, Versioned { version, doc });
                }
                None => {
                    docs.remove(&key);
                }
            }
        }
        inner.commits += 1;
        debug!(writes, "commit applied");
        Ok(())
    }
}

impl Store for MemoryStore {
    fn begin(&self) -> StoreResult<Box<dyn Transaction + '_>> {
        Ok(Box::new(OptimisticTx::new(self)))
    }
}

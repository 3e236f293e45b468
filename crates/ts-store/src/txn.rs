//! Optimistic transaction machinery shared by the store backends.
//!
//! A backend only needs to answer point reads and scans against committed
//! state, and to apply a [`TxLog`] atomically after validating it.

use std::collections::BTreeMap;

use crate::{Collection, Query, RawDoc, StoreError, StoreResult, Transaction};

pub(crate) type DocKey = (Collection, String);

/// A committed document and the version stamped on its last write.
///
/// Versions come from a store-wide counter, so a deleted-then-recreated
/// document never reuses a version.
#[derive(Clone, Debug)]
pub(crate) struct Versioned {
    pub version: u64,
    pub doc:     RawDoc,
}

/// A query evaluated against committed state, and what it returned.
#[derive(Debug)]
pub(crate) struct ScanRecord {
    pub collection: Collection,
    pub query:      Query,
    pub seen:       Vec<(String, u64)>,
}

/// Everything a transaction observed and intends to write.
#[derive(Debug, Default)]
pub(crate) struct TxLog {
    /// Version seen by the first read of each key (`None` = absent).
    pub reads:  BTreeMap<DocKey, Option<u64>>,
    pub scans:  Vec<ScanRecord>,
    /// `None` = delete.
    pub writes: BTreeMap<DocKey, Option<RawDoc>>,
}

impl TxLog {
    /// Re-check every read against the current committed state.
    ///
    /// Must be called under the backend's commit lock.
    pub fn validate<V, S>(&self, mut version_of: V, mut rescan: S) -> StoreResult<()>
    where
        V: FnMut(Collection, &str) -> StoreResult<Option<u64>>,
        S: FnMut(Collection, &Query) -> StoreResult<Vec<(String, u64)>>,
    {
        for ((collection, key), seen) in &self.reads {
            if version_of(*collection, key)? != *seen {
                return Err(StoreError::Conflict { what: format!("{collection}/{key}") });
            }
        }
        for scan in &self.scans {
            if rescan(scan.collection, &scan.query)? != scan.seen {
                return Err(StoreError::Conflict {
                    what: format!("{}?{}", scan.collection, scan.query),
                });
            }
        }
        Ok(())
    }
}

/// Committed-state access a backend provides to [`OptimisticTx`].
pub(crate) trait Backend: Send + Sync {
    fn read(&self, collection: Collection, key: &str) -> StoreResult<Option<Versioned>>;

    /// Matching documents ordered by key.
    fn scan(&self, collection: Collection, query: &Query) -> StoreResult<Vec<(String, Versioned)>>;

    /// Validate `log` and apply its writes, atomically.
    fn apply(&self, log: TxLog) -> StoreResult<()>;
}

/// A transaction over any [`Backend`].
pub(crate) struct OptimisticTx<'a, B: Backend> {
    backend: &'a B,
    log:     TxLog,
}

impl<'a, B: Backend> OptimisticTx<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self { backend, log: TxLog::default() }
    }
}

impl<B: Backend> Transaction for OptimisticTx<'_, B> {
    fn get_raw(&mut self, collection: Collection, key: &str) -> StoreResult<Option<RawDoc>> {
        let k = (collection, key.to_owned());
        if let Some(pending) = self.log.writes.get(&k) {
            return Ok(pending.clone());
        }
        let found = self.backend.read(collection, key)?;
        self.log.reads.entry(k).or_insert(found.as_ref().map(|v| v.version));
        Ok(found.map(|v| v.doc))
    }

    fn query_raw(&mut self, collection: Collection, query: &Query) -> StoreResult<Vec<(String, RawDoc)>> {
        let hits = self.backend.scan(collection, query)?;
        self.log.scans.push(ScanRecord {
            collection,
            query: query.clone(),
            seen:  hits.iter().map(|(k, v)| (k.clone(), v.version)).collect(),
        });

        let mut merged: BTreeMap<String, RawDoc> =
            hits.into_iter().map(|(k, v)| (k, v.doc)).collect();
        for ((c, key), pending) in &self.log.writes {
            if *c != collection {
                continue;
            }
            match pending {
                Some(doc) if query.matches(&doc.index) => {
                    merged.insert(key.clone(), doc.clone());
                }
                _ => {
                    merged.remove(key);
                }
            }
        }
        Ok(merged.into_iter().collect())
    }

    fn put_raw(&mut self, collection: Collection, key: String, doc: RawDoc) -> StoreResult<()> {
        self.log.writes.insert((collection, key), Some(doc));
        Ok(())
    }

    fn delete_raw(&mut self, collection: Collection, key: &str) -> StoreResult<()> {
        self.log.writes.insert((collection, key.to_owned()), None);
        Ok(())
    }

    fn commit(self: Box<Self>) -> StoreResult<()> {
        let this = *self;
        // Read-only transactions have nothing to make atomic.
        if this.log.writes.is_empty() {
            return Ok(());
        }
        this.backend.apply(this.log)
    }
}

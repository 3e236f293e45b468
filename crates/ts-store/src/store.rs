//! The transactional store contract.
//!
//! # Semantics
//!
//! A [`Transaction`] reads committed state, buffers its own writes, and
//! applies them all at once on [`commit`](Transaction::commit).  Reads see
//! the transaction's own buffered writes.
//!
//! Concurrency control is optimistic.  Every point read and every query
//! result is remembered; at commit the store re-checks them under its commit
//! lock and fails with [`StoreError::Conflict`](crate::StoreError::Conflict)
//! if anything changed.  A conflicted commit writes nothing.  Dropping a
//! transaction without committing discards it.

use std::sync::Arc;

use crate::{Collection, Document, Query, RawDoc, StoreResult};

/// One unit of atomic work.  Object-safe so stores can hand out
/// `Box<dyn Transaction>`.
pub trait Transaction {
    fn get_raw(&mut self, collection: Collection, key: &str) -> StoreResult<Option<RawDoc>>;

    /// Documents matching `query`, ordered by key.
    fn query_raw(&mut self, collection: Collection, query: &Query) -> StoreResult<Vec<(String, RawDoc)>>;

    fn put_raw(&mut self, collection: Collection, key: String, doc: RawDoc) -> StoreResult<()>;

    /// Deleting an absent key is not an error.
    fn delete_raw(&mut self, collection: Collection, key: &str) -> StoreResult<()>;

    /// Validate reads and apply every buffered write atomically.
    fn commit(self: Box<Self>) -> StoreResult<()>;
}

/// Typed access on top of [`Transaction`].
pub trait TransactionExt: Transaction {
    fn get<D: Document>(&mut self, key: &str) -> StoreResult<Option<D>> {
        self.get_raw(D::COLLECTION, key)?.map(D::from_raw).transpose()
    }

    fn query<D: Document>(&mut self, query: &Query) -> StoreResult<Vec<D>> {
        self.query_raw(D::COLLECTION, query)?
            .into_iter()
            .map(|(_, raw)| D::from_raw(raw))
            .collect()
    }

    fn put<D: Document>(&mut self, doc: &D) -> StoreResult<()> {
        self.put_raw(D::COLLECTION, doc.key(), doc.to_raw()?)
    }

    fn delete<D: Document>(&mut self, key: &str) -> StoreResult<()> {
        self.delete_raw(D::COLLECTION, key)
    }
}

impl<T: Transaction + ?Sized> TransactionExt for T {}

/// A document store supporting point reads, indexed queries and multi-key
/// atomic commits.
///
/// # Thread safety
///
/// Stores are shared by every cell worker, so they must be `Send + Sync`.
pub trait Store: Send + Sync {
    fn begin(&self) -> StoreResult<Box<dyn Transaction + '_>>;
}

impl<S: Store + ?Sized> Store for Arc<S> {
    fn begin(&self) -> StoreResult<Box<dyn Transaction + '_>> {
        (**self).begin()
    }
}

/// Read-only conveniences that run in a throwaway transaction.
pub trait StoreExt: Store {
    fn read<D: Document>(&self, key: &str) -> StoreResult<Option<D>> {
        self.begin()?.get(key)
    }

    /// A consistent snapshot of the documents matching `query`.
    fn snapshot<D: Document>(&self, query: &Query) -> StoreResult<Vec<D>> {
        self.begin()?.query(query)
    }

    /// Write one document in its own transaction.
    fn insert<D: Document>(&self, doc: &D) -> StoreResult<()> {
        let mut tx = self.begin()?;
        tx.put(doc)?;
        tx.commit()
    }
}

impl<S: Store + ?Sized> StoreExt for S {}

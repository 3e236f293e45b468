//! `ts-store` — documents and the transactional store they live in.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                          |
//! |--------------|-------------------------------------------------------------------|
//! | [`document`] | `Collection`, `DocIndex`, `RawDoc`, `Query`, `Document` trait     |
//! | [`records`]  | `AgentDoc`, `ObjectDoc`, `ResourceDoc`, `CellLock`, and the `Document` impls for terrain markers and intervals |
//! | [`store`]    | `Store` / `Transaction` traits, typed `StoreExt` / `TransactionExt` |
//! | [`memory`]   | `MemoryStore`                                                     |
//! | `sqlite`     | `SqliteStore` (feature `sqlite`)                                  |
//! | [`error`]    | `StoreError`, `StoreResult<T>`                                    |
//!
//! # Feature flags
//!
//! | Flag     | Effect                                 |
//! |----------|----------------------------------------|
//! | `sqlite` | Enables [`SqliteStore`] via `rusqlite`. |
//!
//! # Persisted layout
//!
//! | Collection      | Key                  | Indexed by             |
//! |-----------------|----------------------|------------------------|
//! | `agents`        | `agent-<id>`         | cell                   |
//! | `objects`       | `object-<id>`        | cell or span, owner    |
//! | `resources`     | `resource-<id>`      | cell                   |
//! | `terrain_tiles` | `tile-<x>:<y>`       | —                      |
//! | `intervals`     | `agent-<id>/<seq>`   | cell, owner, time span |
//! | `locks`         | `<x>:<y>`            | cell                   |

pub mod document;
pub mod error;
pub mod memory;
pub mod records;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod store;
mod txn;


pub use document::{Collection, DocIndex, Document, Query, RawDoc};
pub use error::{StoreError, StoreResult};
pub use memory::{MemoryStore, StoreStats};
pub use records::{AgentDoc, CellLock, ObjectDoc, ObjectKind, ResourceDoc};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
pub use store::{Store, StoreExt, Transaction, TransactionExt};
